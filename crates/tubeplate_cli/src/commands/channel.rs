//! Channel connection and maintenance commands.

use console::style;
use tubeplate::store::channel as channel_store;
use tubeplate::{AesGcmCipher, db};
use uuid::Uuid;

use crate::commands::shared::{CommandResult, credential_manager, is_tty, platform, report_error};
use crate::config::Config;

pub(crate) fn handle_keygen() {
    println!("{}", AesGcmCipher::generate_key());
    if is_tty() {
        eprintln!(
            "{}",
            style("Store this as crypto.key (or TUBEPLATE_CRYPTO_KEY). Changing it makes stored credentials unreadable.")
                .dim()
        );
    }
}

/// Clear a stuck sync lease.
pub(crate) async fn handle_reset(channel_id: Uuid, database_url: &str) -> CommandResult {
    let db = db::connect(database_url).await?;
    channel_store::reset_sync_state(&db, channel_id).await?;

    if is_tty() {
        println!("{} Cleared sync state for channel {}", style("✓").green(), channel_id);
    } else {
        tracing::info!(channel_id = %channel_id, "Sync state cleared");
    }
    Ok(())
}

pub(crate) async fn handle_connect(
    user_id: Uuid,
    code: &str,
    redirect_uri: &str,
    config: &Config,
    database_url: &str,
) -> CommandResult {
    let is_tty = is_tty();
    let db = db::connect(database_url).await?;
    let credentials = credential_manager(&db, config)?;
    let platform = platform(config)?;

    let channel = match credentials
        .connect_channel(user_id, code, redirect_uri, &platform)
        .await
    {
        Ok(channel) => channel,
        Err(e) => {
            report_error(&e, is_tty);
            return Err(e.into());
        }
    };

    if is_tty {
        println!(
            "{} Connected {} ({})",
            style("✓").green(),
            style(&channel.title).bold(),
            channel.remote_channel_id
        );
        println!("  Channel id: {}", channel.id);
        println!("  Run `tubeplate sync --channel {} --user {}` to import its videos.", channel.id, user_id);
    } else {
        tracing::info!(
            channel_id = %channel.id,
            remote_channel_id = %channel.remote_channel_id,
            "Channel connected"
        );
    }
    Ok(())
}

pub(crate) async fn handle_disconnect(
    channel_id: Uuid,
    user_id: Uuid,
    config: &Config,
    database_url: &str,
) -> CommandResult {
    let db = db::connect(database_url).await?;
    let credentials = credential_manager(&db, config)?;
    credentials.disconnect_channel(channel_id, user_id).await?;

    if is_tty() {
        println!(
            "{} Removed channel {} with its videos and history",
            style("✓").green(),
            channel_id
        );
    } else {
        tracing::info!(channel_id = %channel_id, "Channel disconnected");
    }
    Ok(())
}
