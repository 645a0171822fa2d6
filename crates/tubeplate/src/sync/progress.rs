//! Progress events for reconciliation and dispatch.
//!
//! The library never prints; the CLI renders these events.

use uuid::Uuid;

/// Progress events emitted while syncing a channel or pushing descriptions.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum SyncProgress {
    /// Lease acquired, starting to fetch the channel's uploads.
    ReconcileStarted {
        channel_id: Uuid,
        title: String,
    },

    /// Fetched a page of the uploads playlist.
    FetchedPage {
        channel_id: Uuid,
        /// Page number (1-indexed).
        page: u32,
        count: usize,
        /// Running total of videos fetched so far.
        total_so_far: usize,
    },

    /// The catalog diff was applied.
    ReconcileComplete {
        channel_id: Uuid,
        inserted: usize,
        updated: usize,
        deleted: usize,
    },

    /// Starting to push descriptions.
    DispatchStarted {
        /// Videos that need a remote update.
        pending: usize,
        batches: usize,
        concurrency: usize,
    },

    /// A video's description was pushed and recorded.
    VideoUpdated {
        video_id: Uuid,
        version: i32,
    },

    /// A video needed no update.
    VideoSkipped {
        video_id: Uuid,
        reason: SkipReason,
    },

    /// Pushing a video's description failed.
    VideoFailed {
        video_id: Uuid,
        error: String,
    },

    /// One batch finished.
    BatchComplete {
        /// Batch number (1-indexed).
        batch: usize,
        updated: usize,
        failed: usize,
    },

    /// All batches finished.
    DispatchComplete {
        updated: usize,
        skipped: usize,
        failed: usize,
    },

    /// Warning message (non-fatal).
    Warning {
        message: String,
    },
}

/// Why the dispatcher left a video alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No container is assigned.
    NoContainer,
    /// The composed text equals the cached description.
    Unchanged,
    /// The video (or its container) no longer exists or is not the caller's.
    Missing,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoContainer => write!(f, "no container"),
            Self::Unchanged => write!(f, "unchanged"),
            Self::Missing => write!(f, "missing"),
        }
    }
}

/// Callback for progress updates during sync operations.
pub type ProgressCallback = Box<dyn Fn(SyncProgress) + Send + Sync>;

/// Emit a progress event if a callback is provided.
#[inline]
pub fn emit(on_progress: Option<&ProgressCallback>, event: SyncProgress) {
    if let Some(cb) = on_progress {
        cb(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_emit_with_callback() {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = Arc::clone(&count);

        let callback: ProgressCallback = Box::new(move |_event| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        emit(
            Some(&callback),
            SyncProgress::VideoSkipped {
                video_id: Uuid::nil(),
                reason: SkipReason::Unchanged,
            },
        );
        emit(
            Some(&callback),
            SyncProgress::DispatchComplete {
                updated: 1,
                skipped: 1,
                failed: 0,
            },
        );

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_emit_without_callback() {
        emit(
            None,
            SyncProgress::Warning {
                message: "ignored".to_string(),
            },
        );
    }

    #[test]
    fn skip_reasons_display_for_humans() {
        assert_eq!(SkipReason::NoContainer.to_string(), "no container");
        assert_eq!(SkipReason::Unchanged.to_string(), "unchanged");
    }
}
