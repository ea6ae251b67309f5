//! Entry commands - upload, publish, unpublish, archive, unarchive, delete

use crate::cli::CliProgress;
use crate::cli::style::{Stylize, check, cross};
use anstream::println;
use cms_migrate::api::{ManagementApi, create_management_api};
use cms_migrate::auth::get_management_auth;
use cms_migrate::config::Config;
use cms_migrate::error::{Error, Result};
use cms_migrate::pipeline::{EntryPipeline, PublishMode};
use cms_migrate::source::{EntrySource, fetch_entries, load_entries_file};
use cms_migrate::types::{OperationTrackResult, RuntimeContext};
use dialoguer::Confirm;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// An entry command with its arguments
#[derive(Debug, Clone)]
pub enum EntryCommand {
    /// Create or update entries from a JSON file
    Upload {
        /// Entries file
        file: PathBuf,
        /// Publish after saving
        publish: bool,
    },
    /// Publish draft entries
    Publish {
        /// Restrict to one content type
        content_type: Option<String>,
        /// Bulk actions or one call per entry
        mode: PublishMode,
    },
    /// Unpublish published entries
    Unpublish {
        /// Restrict to one content type
        content_type: Option<String>,
        /// Bulk actions or one call per entry
        mode: PublishMode,
    },
    /// Archive entries
    Archive {
        /// Restrict to one content type
        content_type: Option<String>,
    },
    /// Unarchive archived entries
    Unarchive {
        /// Restrict to one content type
        content_type: Option<String>,
    },
    /// Delete entries
    Delete {
        /// Restrict to one content type
        content_type: Option<String>,
        /// Skip the confirmation prompt
        yes: bool,
    },
}

impl EntryCommand {
    const fn name(&self) -> &'static str {
        match self {
            Self::Upload { .. } => "upload",
            Self::Publish { .. } => "publish",
            Self::Unpublish { .. } => "unpublish",
            Self::Archive { .. } => "archive",
            Self::Unarchive { .. } => "unarchive",
            Self::Delete { .. } => "delete",
        }
    }

    const fn uses_bulk(&self) -> bool {
        matches!(
            self,
            Self::Publish {
                mode: PublishMode::Bulk,
                ..
            } | Self::Unpublish {
                mode: PublishMode::Bulk,
                ..
            }
        )
    }
}

/// Run an entry command
pub async fn run_entry_command(
    config: &Config,
    runtime: RuntimeContext,
    cancel: CancellationToken,
    command: EntryCommand,
) -> Result<()> {
    config.validate(command.uses_bulk())?;
    let auth = get_management_auth(&config.api)?;
    let api = create_management_api(config, &auth, runtime, cancel.clone())?;

    if runtime.dry_run {
        println!("{}", "Dry run: no changes will be made".muted());
    }
    println!(
        "Running {} on space {} ({})",
        command.name().emphasis(),
        config.api.space_id.accent(),
        config.api.environment_id
    );

    let pipeline = EntryPipeline::from_api(
        Arc::clone(&api),
        config,
        Arc::new(CliProgress::new()),
        cancel,
    );
    let name = command.name();

    let result = match command {
        EntryCommand::Upload { file, publish } => {
            let source = load_entries_file(&file)?;
            pipeline.upload(source, publish).await?
        }
        EntryCommand::Publish { content_type, mode } => {
            let source = fetch_entries(api, content_type).await?;
            pipeline.publish(source, mode).await?
        }
        EntryCommand::Unpublish { content_type, mode } => {
            let source = fetch_entries(api, content_type).await?;
            pipeline.unpublish(source, mode).await?
        }
        EntryCommand::Archive { content_type } => {
            let source = fetch_entries(api, content_type).await?;
            pipeline.archive(source).await?
        }
        EntryCommand::Unarchive { content_type } => {
            let source = fetch_entries(api, content_type).await?;
            pipeline.unarchive(source).await?
        }
        EntryCommand::Delete { content_type, yes } => {
            let Some(source) = prepare_delete(api, content_type, yes || runtime.dry_run).await?
            else {
                return Ok(());
            };
            pipeline.delete(source).await?
        }
    };

    print_summary(name, &result, runtime);
    Ok(())
}

/// Buffer the entries to delete and ask for confirmation
async fn prepare_delete(
    api: Arc<dyn ManagementApi>,
    content_type: Option<String>,
    skip_confirm: bool,
) -> Result<Option<EntrySource>> {
    let source = fetch_entries(api, content_type).await?.buffered().await?;
    if source.total == 0 {
        println!("No entries to delete");
        return Ok(None);
    }

    if !skip_confirm
        && !Confirm::new()
            .with_prompt(format!("Delete {} entries?", source.total))
            .default(false)
            .interact()
            .map_err(|e| Error::Internal(format!("Failed to read confirmation: {e}")))?
    {
        println!("Aborted");
        return Ok(None);
    }
    Ok(Some(source))
}

fn print_summary(name: &str, result: &OperationTrackResult, runtime: RuntimeContext) {
    println!();
    let marker = if result.failed_entries() == 0 {
        check()
    } else {
        cross()
    };
    let suffix = if runtime.dry_run { " (dry run)" } else { "" };
    println!(
        "{marker} {}{}: {} of {} entries succeeded",
        name.emphasis(),
        suffix.muted(),
        result.successful_entries.success(),
        result.total_entries
    );

    for (operation, counts) in &result.operations {
        let errors = if counts.error_count == 0 {
            counts.error_count.muted()
        } else {
            counts.error_count.failure()
        };
        println!(
            "  {:<10} {} ok, {} failed",
            operation.to_string(),
            counts.success_count.success(),
            errors
        );
    }
}
