//! Tubeplate CLI - command-line runner for catalog sync and description pushes.

mod commands;
mod config;
mod progress;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::Term;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "tubeplate")]
#[command(version)]
#[command(about = "Template-composed YouTube descriptions")]
#[command(
    long_about = "Tubeplate keeps a local catalog of your YouTube uploads, composes each \
video's description from an ordered chain of templates plus per-video variables, and \
pushes the results back to YouTube with a versioned history of every change."
)]
#[command(after_long_help = r#"EXAMPLES
    Generate a credential encryption key:
        $ tubeplate keygen

    Reconcile one channel's catalog:
        $ tubeplate sync --channel <CHANNEL_ID> --user <USER_ID>

    Keep every connected channel in sync:
        $ tubeplate sync-all --daemon

    Push descriptions for every video using a template:
        $ tubeplate update --user <USER_ID> --template <TEMPLATE_ID>

    See what a video's description would become:
        $ tubeplate preview --video <VIDEO_ID> --user <USER_ID>

CONFIGURATION
    Tubeplate reads configuration from:
      1. ~/.config/tubeplate/config.toml (or $XDG_CONFIG_HOME/tubeplate/config.toml)
      2. ./tubeplate.toml
      3. Environment variables (TUBEPLATE_* prefix, TUBEPLATE_SYNC__BATCH_SIZE for nested keys)
      4. .env file in current directory

ENVIRONMENT VARIABLES
    TUBEPLATE_DATABASE_URL          Database connection string (default: ~/.local/state/tubeplate/tubeplate.db)
    TUBEPLATE_GOOGLE_CLIENT_ID      Google OAuth client id
    TUBEPLATE_GOOGLE_CLIENT_SECRET  Google OAuth client secret
    TUBEPLATE_CRYPTO_KEY            Base64 AES-256 key for stored credentials
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
    /// Reconcile one channel's catalog with YouTube
    Sync {
        /// Channel to reconcile
        #[arg(short, long)]
        channel: Uuid,

        /// Owner of the channel
        #[arg(short, long)]
        user: Uuid,
    },
    /// Reconcile every connected channel
    SyncAll {
        /// Keep running, syncing every `sync.interval_secs` seconds
        #[arg(short, long)]
        daemon: bool,
    },
    /// Recompose descriptions and push them to YouTube
    Update {
        /// User requesting the update
        #[arg(short, long)]
        user: Uuid,

        #[command(flatten)]
        target: UpdateTarget,

        #[command(flatten)]
        run_opts: RunOptions,
    },
    /// Print a video's composed description without pushing it
    Preview {
        #[arg(short, long)]
        video: Uuid,

        /// Owner of the video
        #[arg(short, long)]
        user: Uuid,
    },
    /// Clear a channel's stuck sync lease
    Reset {
        #[arg(short, long)]
        channel: Uuid,
    },
    /// Complete the OAuth code exchange and store the channel
    Connect {
        /// User who authorized the channel
        #[arg(short, long)]
        user: Uuid,

        /// Authorization code returned to the redirect URI
        #[arg(long)]
        code: String,

        /// Redirect URI used when requesting the code
        #[arg(long)]
        redirect_uri: String,
    },
    /// Remove a channel with its videos and history
    Disconnect {
        #[arg(short, long)]
        channel: Uuid,

        #[arg(short, long)]
        user: Uuid,
    },
    /// Print a fresh credential encryption key
    Keygen,
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
    /// Generate man page(s)
    Man {
        /// Output directory for man pages (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum MigrateAction {
    /// Apply all pending migrations
    Up,
    /// Rollback the last migration
    Down,
    /// Show migration status
    Status,
    /// Fresh install - drop all tables and reapply migrations
    Fresh {
        /// Confirm that all stored channels, videos, and history will be lost
        #[arg(long)]
        yes: bool,
    },
}

/// Which videos an `update` pushes. Exactly one must be given.
#[derive(Debug, Clone, clap::Args)]
#[group(required = true, multiple = false)]
struct UpdateTarget {
    /// Specific videos (repeatable)
    #[arg(short, long = "video")]
    videos: Vec<Uuid>,

    /// Every video whose container includes this template
    #[arg(short, long)]
    template: Option<Uuid>,

    /// Every video assigned to this container
    #[arg(short = 'C', long)]
    container: Option<Uuid>,
}

/// Dispatch pacing overrides.
#[derive(Debug, Clone, Default, clap::Args)]
struct RunOptions {
    /// Videos prepared per batch (default from config or 10)
    #[arg(short, long)]
    batch_size: Option<usize>,

    /// Remote updates in flight at once (default from config or 5)
    #[arg(short = 'j', long)]
    concurrency: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Structured logging only when not attached to a TTY
    if !Term::stdout().is_term() {
        let env_filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::new("tubeplate=info,tubeplate_cli=info"),
        };

        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    let config = config::Config::load();

    let cli = Cli::parse();

    // Commands that don't touch the database
    match &cli.command {
        Commands::Completions { shell } => {
            commands::meta::handle_completions(*shell)?;
            return Ok(());
        }
        Commands::Man { output } => {
            commands::meta::handle_man(output.clone())?;
            return Ok(());
        }
        Commands::Keygen => {
            commands::channel::handle_keygen();
            return Ok(());
        }
        _ => {}
    }

    let database_url = config
        .database_url()
        .ok_or("Could not determine a database URL; set TUBEPLATE_DATABASE_URL")?;

    if database_url.starts_with("sqlite://") {
        let db_path = database_url.trim_start_matches("sqlite://");
        // Strip query parameters (e.g., ?mode=rwc) before path operations
        let db_path = db_path.split('?').next().unwrap_or(db_path);
        let db_path = std::path::Path::new(db_path);

        if db_path.is_relative() && !db_path.as_os_str().is_empty() {
            tracing::warn!(
                "Database path '{}' is relative - behavior depends on current directory. \
                 Consider using an absolute path.",
                db_path.display()
            );
        }

        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
    }

    match cli.command {
        Commands::Migrate { action } => {
            commands::migrate::handle_migrate(action, &database_url).await?;
        }
        Commands::Sync { channel, user } => {
            commands::sync::handle_sync(channel, user, &config, &database_url).await?;
        }
        Commands::SyncAll { daemon } => {
            commands::sync::handle_sync_all(daemon, &config, &database_url).await?;
        }
        Commands::Update {
            user,
            target,
            run_opts,
        } => {
            commands::update::handle_update(user, target, run_opts, &config, &database_url)
                .await?;
        }
        Commands::Preview { video, user } => {
            commands::update::handle_preview(video, user, &database_url).await?;
        }
        Commands::Reset { channel } => {
            commands::channel::handle_reset(channel, &database_url).await?;
        }
        Commands::Connect {
            user,
            code,
            redirect_uri,
        } => {
            commands::channel::handle_connect(user, &code, &redirect_uri, &config, &database_url)
                .await?;
        }
        Commands::Disconnect { channel, user } => {
            commands::channel::handle_disconnect(channel, user, &config, &database_url).await?;
        }
        Commands::Keygen | Commands::Completions { .. } | Commands::Man { .. } => {}
    }

    Ok(())
}
