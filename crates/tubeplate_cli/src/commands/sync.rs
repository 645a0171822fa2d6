//! Catalog reconciliation commands.

use std::sync::Arc;
use std::time::Duration;

use console::style;
use tubeplate::{Job, JobOutcome, ReconcileResult};
use uuid::Uuid;

use crate::RunOptions;
use crate::commands::shared::{CommandResult, build_runner, is_tty, report_error};
use crate::config::Config;
use crate::progress::ProgressReporter;
use crate::shutdown::Shutdown;

/// Reconcile one channel.
pub(crate) async fn handle_sync(
    channel_id: Uuid,
    user_id: Uuid,
    config: &Config,
    database_url: &str,
) -> CommandResult {
    let is_tty = is_tty();
    let reporter = Arc::new(ProgressReporter::new());
    let runner = build_runner(database_url, config, &RunOptions::default(), &reporter).await?;

    let outcome = runner
        .run(Job::SyncChannel {
            channel_id,
            user_id,
        })
        .await;
    reporter.finish();

    match outcome {
        Ok(JobOutcome::Synced(result)) => {
            print_reconcile_summary(channel_id, &result, is_tty);
            Ok(())
        }
        Ok(JobOutcome::Dispatched(_)) => Ok(()),
        Err(e) => {
            report_error(&e, is_tty);
            Err(e.into())
        }
    }
}

/// Reconcile every connected channel, once or on an interval.
pub(crate) async fn handle_sync_all(
    daemon: bool,
    config: &Config,
    database_url: &str,
) -> CommandResult {
    let is_tty = is_tty();
    let reporter = Arc::new(ProgressReporter::new());
    let runner = build_runner(database_url, config, &RunOptions::default(), &reporter).await?;
    let shutdown = daemon.then(Shutdown::install);
    let interval = Duration::from_secs(config.sync.interval_secs.max(1));

    loop {
        let results = runner.sync_all().await?;
        reporter.finish();

        let mut failed = 0usize;
        for (channel_id, result) in &results {
            match result {
                Ok(summary) => print_reconcile_summary(*channel_id, summary, is_tty),
                Err(e) => {
                    failed += 1;
                    report_error(e, is_tty);
                }
            }
        }

        if is_tty {
            println!(
                "\n{} {} channel(s) synced, {} failed",
                style("Done:").bold(),
                results.len() - failed,
                failed
            );
        } else {
            tracing::info!(
                channels = results.len(),
                failed,
                "Sync pass complete"
            );
        }

        let Some(shutdown) = &shutdown else {
            return Ok(());
        };
        if shutdown.is_requested() {
            return Ok(());
        }

        tracing::debug!(interval_secs = interval.as_secs(), "Sleeping until next pass");
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown.requested() => {
                tracing::info!("Shutdown requested, stopping scheduler");
                return Ok(());
            }
        }
    }
}

fn print_reconcile_summary(channel_id: Uuid, result: &ReconcileResult, is_tty: bool) {
    if is_tty {
        if result.has_changes() {
            println!(
                "{} {}: {} fetched, {} new, {} updated, {} removed",
                style("✓").green(),
                channel_id,
                result.fetched,
                result.inserted,
                result.updated,
                result.deleted
            );
        } else {
            println!(
                "{} {}: {} videos, already up to date",
                style("✓").green(),
                channel_id,
                result.fetched
            );
        }
    } else {
        tracing::info!(
            channel_id = %channel_id,
            fetched = result.fetched,
            inserted = result.inserted,
            updated = result.updated,
            unchanged = result.unchanged,
            deleted = result.deleted,
            "Channel reconciled"
        );
    }
}
