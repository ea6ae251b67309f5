//! cmig - entry migrations for a headless CMS
//!
//! CLI binary driving the cms-migrate orchestration engine.

use anyhow::Result;
use clap::{Parser, Subcommand};
use cms_migrate::config::{BatchSize, Config};
use cms_migrate::pipeline::PublishMode;
use cms_migrate::types::RuntimeContext;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

mod cli;

#[derive(Parser)]
#[command(name = "cmig")]
#[command(about = "Version-safe entry migrations against a CMS management API")]
#[command(version)]
struct Cli {
    /// Config file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Space id
    #[arg(long, global = true)]
    space: Option<String>,

    /// Environment id
    #[arg(long, global = true)]
    environment: Option<String>,

    /// Dry run - simulate every change without calling the API
    #[arg(long, global = true)]
    dry_run: bool,

    /// Maximum concurrent API calls
    #[arg(long, global = true)]
    concurrency: Option<usize>,

    /// Entries per batch
    #[arg(long, global = true)]
    batch_size: Option<usize>,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or update entries from a JSON file
    Upload {
        /// JSON file with an array of entries
        file: PathBuf,

        /// Publish each entry after saving it
        #[arg(long)]
        publish: bool,
    },

    /// Publish draft entries
    Publish {
        /// Only entries of this content type
        #[arg(long)]
        content_type: Option<String>,

        /// One publish call per entry instead of bulk actions
        #[arg(long)]
        per_entry: bool,
    },

    /// Unpublish published entries
    Unpublish {
        /// Only entries of this content type
        #[arg(long)]
        content_type: Option<String>,

        /// One unpublish call per entry instead of bulk actions
        #[arg(long)]
        per_entry: bool,
    },

    /// Archive entries, unpublishing them first
    Archive {
        /// Only entries of this content type
        #[arg(long)]
        content_type: Option<String>,
    },

    /// Unarchive archived entries
    Unarchive {
        /// Only entries of this content type
        #[arg(long)]
        content_type: Option<String>,
    },

    /// Delete entries, unpublishing or unarchiving them first
    Delete {
        /// Only entries of this content type
        #[arg(long)]
        content_type: Option<String>,

        /// Do not ask for confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Authentication management
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
}

#[derive(Subcommand)]
enum AuthAction {
    /// Test authentication
    Test,
    /// Show authentication setup instructions
    Setup,
}

const fn publish_mode(per_entry: bool) -> PublishMode {
    if per_entry {
        PublishMode::PerEntry
    } else {
        PublishMode::Bulk
    }
}

fn init_tracing(verbose: bool) {
    let default_directives = if verbose {
        "cms_migrate=debug,cmig=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(space) = &cli.space {
        config.api.space_id.clone_from(space);
    }
    if let Some(environment) = &cli.environment {
        config.api.environment_id.clone_from(environment);
    }
    if let Some(limit) = cli.concurrency {
        config.concurrency.concurrency_limit = limit;
    }
    if let Some(size) = cli.batch_size {
        config.batch_size = BatchSize(size);
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(&cli)?;
    let runtime = RuntimeContext {
        dry_run: cli.dry_run,
    };

    // First Ctrl-C stops scheduling new work; in-flight calls are abandoned
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    let command = match cli.command {
        Commands::Auth { action } => {
            let action = match action {
                AuthAction::Test => cli::AuthAction::Test,
                AuthAction::Setup => cli::AuthAction::Setup,
            };
            cli::run_auth(&config, action).await?;
            return Ok(());
        }
        Commands::Upload { file, publish } => cli::EntryCommand::Upload { file, publish },
        Commands::Publish {
            content_type,
            per_entry,
        } => cli::EntryCommand::Publish {
            content_type,
            mode: publish_mode(per_entry),
        },
        Commands::Unpublish {
            content_type,
            per_entry,
        } => cli::EntryCommand::Unpublish {
            content_type,
            mode: publish_mode(per_entry),
        },
        Commands::Archive { content_type } => cli::EntryCommand::Archive { content_type },
        Commands::Unarchive { content_type } => cli::EntryCommand::Unarchive { content_type },
        Commands::Delete { content_type, yes } => cli::EntryCommand::Delete { content_type, yes },
    };

    cli::run_entry_command(&config, runtime, cancel, command).await?;
    Ok(())
}
