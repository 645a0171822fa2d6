use std::sync::Arc;
use std::time::Duration;

use console::{Term, style};
use sea_orm::DatabaseConnection;
use tubeplate::retry::{INITIAL_BACKOFF_MS, MAX_BACKOFF_MS, RetryConfig};
use tubeplate::{
    AesGcmCipher, CredentialManager, Error, GoogleOAuthClient, JobRunner, RateLimitedPlatform,
    SyncContext, SyncOptions, YouTubeClient, db,
};

use crate::RunOptions;
use crate::config::Config;
use crate::progress::ProgressReporter;

/// The platform stack every command talks to.
pub(crate) type Platform = RateLimitedPlatform<YouTubeClient>;

pub(crate) type CommandResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Build the credential manager from the `[google]` and `[crypto]` sections.
pub(crate) fn credential_manager(
    db: &DatabaseConnection,
    config: &Config,
) -> CommandResult<CredentialManager> {
    let key = config
        .crypto
        .key
        .as_deref()
        .ok_or("crypto.key is not set; generate one with `tubeplate keygen`")?;
    let cipher = AesGcmCipher::from_base64_key(key)?;

    let client_id = config
        .google
        .client_id
        .as_deref()
        .ok_or("google.client_id is not set")?;
    let client_secret = config
        .google
        .client_secret
        .as_deref()
        .ok_or("google.client_secret is not set")?;
    let oauth = GoogleOAuthClient::new(client_id, client_secret, config.google.token_url.clone())?;

    Ok(CredentialManager::new(
        db.clone(),
        Arc::new(cipher),
        Arc::new(oauth),
    ))
}

pub(crate) fn platform(config: &Config) -> CommandResult<Platform> {
    let client = YouTubeClient::new(config.google.api_base.clone())?;
    Ok(RateLimitedPlatform::new(
        client,
        config.sync.requests_per_second,
    ))
}

/// Merge CLI overrides into the configured sync options.
pub(crate) fn sync_options(config: &Config, run_opts: &RunOptions) -> SyncOptions {
    SyncOptions {
        batch_size: run_opts.batch_size.unwrap_or(config.sync.batch_size).max(1),
        concurrency: run_opts
            .concurrency
            .unwrap_or(config.sync.concurrency)
            .max(1),
        lease: chrono::Duration::seconds(config.sync.lease_secs),
        retry: retry_config(config),
    }
}

pub(crate) fn retry_config(config: &Config) -> RetryConfig {
    RetryConfig::new(
        Duration::from_millis(INITIAL_BACKOFF_MS),
        Duration::from_millis(MAX_BACKOFF_MS),
        config.sync.max_retries,
    )
}

/// Connect, wire up credentials and the YouTube client, and attach progress
/// reporting.
pub(crate) async fn build_runner(
    database_url: &str,
    config: &Config,
    run_opts: &RunOptions,
    reporter: &Arc<ProgressReporter>,
) -> CommandResult<JobRunner<Platform>> {
    let db = db::connect(database_url).await?;
    let credentials = credential_manager(&db, config)?;
    let ctx = SyncContext::new(db, credentials, platform(config)?)
        .with_options(sync_options(config, run_opts))
        .with_progress(reporter.as_callback());

    Ok(JobRunner::new(ctx).with_retry_config(retry_config(config)))
}

/// Explain a failed job to the user.
///
/// Credential failures get a reconnect prompt; everything else is printed as-is.
pub(crate) fn report_error(err: &Error, is_tty: bool) {
    match err {
        Error::CredentialInvalid { channel_id } => {
            if is_tty {
                eprintln!(
                    "{} Channel {} must be reconnected before it can sync again.",
                    style("!").yellow().bold(),
                    channel_id
                );
                eprintln!("  Re-authorize it, then run: tubeplate connect --user <USER_ID> --code <CODE> --redirect-uri <URI>");
            } else {
                tracing::warn!(channel_id = %channel_id, "Channel must be reconnected");
            }
        }
        Error::SyncInProgress { channel_id } => {
            if is_tty {
                eprintln!(
                    "{} Channel {} is already being synced. If a previous run crashed, clear it with: tubeplate reset --channel {}",
                    style("!").yellow().bold(),
                    channel_id,
                    channel_id
                );
            } else {
                tracing::warn!(channel_id = %channel_id, "Channel is already being synced");
            }
        }
        other => {
            if is_tty {
                eprintln!("{} {}", style("error:").red().bold(), other);
            } else {
                tracing::error!(error = %other, "Job failed");
            }
        }
    }
}

pub(crate) fn is_tty() -> bool {
    Term::stdout().is_term()
}
