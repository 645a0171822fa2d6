use tubeplate::sync::SyncProgress;

/// Logging reporter using tracing for structured output.
pub struct LoggingReporter;

impl LoggingReporter {
    pub fn handle(&self, event: SyncProgress) {
        match event {
            SyncProgress::ReconcileStarted { channel_id, title } => {
                tracing::info!(channel_id = %channel_id, title = %title, "Reconciling channel");
            }
            SyncProgress::FetchedPage {
                channel_id,
                page,
                count,
                total_so_far,
            } => {
                tracing::debug!(channel_id = %channel_id, page, count, total_so_far, "Fetched page");
            }
            SyncProgress::ReconcileComplete {
                channel_id,
                inserted,
                updated,
                deleted,
            } => {
                tracing::info!(channel_id = %channel_id, inserted, updated, deleted, "Catalog reconciled");
            }
            SyncProgress::DispatchStarted {
                pending,
                batches,
                concurrency,
            } => {
                tracing::info!(pending, batches, concurrency, "Pushing descriptions");
            }
            SyncProgress::VideoUpdated { video_id, version } => {
                tracing::info!(video_id = %video_id, version, "Description updated");
            }
            SyncProgress::VideoSkipped { video_id, reason } => {
                tracing::debug!(video_id = %video_id, reason = %reason, "Skipped");
            }
            SyncProgress::VideoFailed { video_id, error } => {
                tracing::warn!(video_id = %video_id, error = %error, "Update failed");
            }
            SyncProgress::BatchComplete {
                batch,
                updated,
                failed,
            } => {
                tracing::debug!(batch, updated, failed, "Batch complete");
            }
            SyncProgress::DispatchComplete {
                updated,
                skipped,
                failed,
            } => {
                tracing::info!(updated, skipped, failed, "Dispatch complete");
            }
            SyncProgress::Warning { message } => {
                tracing::warn!("{}", message);
            }
            _ => {}
        }
    }
}
