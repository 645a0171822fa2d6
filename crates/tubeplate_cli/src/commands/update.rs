//! Description push and preview commands.

use std::sync::Arc;

use console::style;
use tubeplate::compose::exceeds_platform_limit;
use tubeplate::store::video as video_store;
use tubeplate::sync::compose_for_video;
use tubeplate::{DispatchResult, Job, JobOutcome, db};
use uuid::Uuid;

use crate::commands::shared::{CommandResult, build_runner, is_tty, report_error};
use crate::config::Config;
use crate::progress::ProgressReporter;
use crate::{RunOptions, UpdateTarget};

/// Resolve the target into a job and run it.
pub(crate) async fn handle_update(
    user_id: Uuid,
    target: UpdateTarget,
    run_opts: RunOptions,
    config: &Config,
    database_url: &str,
) -> CommandResult {
    let is_tty = is_tty();
    let reporter = Arc::new(ProgressReporter::new());
    let runner = build_runner(database_url, config, &run_opts, &reporter).await?;
    let db = runner.context().db();

    let job = if let Some(template_id) = target.template {
        Job::for_template(db, template_id, user_id).await
    } else if let Some(container_id) = target.container {
        Job::for_container(db, container_id, user_id).await
    } else {
        Ok(Job::UpdateDescriptions {
            video_ids: target.videos,
            user_id,
        })
    };
    let job = match job {
        Ok(job) => job,
        Err(e) => {
            report_error(&e, is_tty);
            return Err(e.into());
        }
    };

    let outcome = runner.run(job).await;
    reporter.finish();

    match outcome {
        Ok(JobOutcome::Dispatched(result)) => {
            print_dispatch_summary(&result, is_tty);
            Ok(())
        }
        Ok(JobOutcome::Synced(_)) => Ok(()),
        Err(e) => {
            report_error(&e, is_tty);
            Err(e.into())
        }
    }
}

/// Print the composed description for one video.
pub(crate) async fn handle_preview(
    video_id: Uuid,
    user_id: Uuid,
    database_url: &str,
) -> CommandResult {
    let db = db::connect(database_url).await?;
    let (video, _channel) = video_store::find_for_user(&db, video_id, user_id).await?;

    match compose_for_video(&db, &video).await? {
        Some(description) => {
            println!("{description}");
            if exceeds_platform_limit(&description) {
                eprintln!(
                    "{} composed description exceeds YouTube's length limit and will be rejected",
                    style("warning:").yellow().bold()
                );
            }
            if video.current_description.as_deref() == Some(description.as_str()) {
                eprintln!("{}", style("(matches the current description)").dim());
            }
        }
        None => {
            eprintln!(
                "Video {} ({}) has no container assigned; nothing to compose.",
                video.id, video.remote_video_id
            );
        }
    }

    Ok(())
}

fn print_dispatch_summary(result: &DispatchResult, is_tty: bool) {
    let reconnect = result.channels_needing_reconnect();

    if is_tty {
        println!(
            "\n{} {} updated, {} skipped, {} failed (of {})",
            style("Done:").bold(),
            style(result.updated).green(),
            result.skipped,
            if result.failed > 0 {
                style(result.failed).red()
            } else {
                style(result.failed)
            },
            result.processed
        );

        let display_count = result.failures.len().min(10);
        for (video_id, error) in result.failures.iter().take(display_count) {
            if !error.needs_reconnect() {
                eprintln!("  - {video_id}: {error}");
            }
        }
        if result.failures.len() > display_count {
            eprintln!(
                "  ... and {} more errors",
                result.failures.len() - display_count
            );
        }

        for channel_id in reconnect {
            eprintln!(
                "{} Channel {} must be reconnected; its videos were not updated.",
                style("!").yellow().bold(),
                channel_id
            );
        }
    } else {
        tracing::info!(
            processed = result.processed,
            updated = result.updated,
            skipped = result.skipped,
            failed = result.failed,
            "Descriptions pushed"
        );
        for (video_id, error) in &result.failures {
            tracing::error!(video_id = %video_id, error = %error, "Failed to update video");
        }
        for channel_id in reconnect {
            tracing::warn!(channel_id = %channel_id, "Channel must be reconnected");
        }
    }
}
