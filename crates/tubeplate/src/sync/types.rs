//! Sync options, results, and defaults.

use chrono::Duration;
use uuid::Uuid;

use crate::error::Error;
use crate::retry::RetryConfig;

/// Videos pushed per batch. Batches run one after another.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Remote update calls allowed in flight at once.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// How long a sync lease is honored before another run may take it over.
pub const DEFAULT_LEASE_SECS: i64 = 30 * 60;

/// Options shared by reconciliation and dispatch.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub batch_size: usize,
    /// Capped at [`DEFAULT_CONCURRENCY`].
    pub concurrency: usize,
    pub lease: Duration,
    /// Backoff for a single video's remote update.
    pub retry: RetryConfig,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
            lease: Duration::seconds(DEFAULT_LEASE_SECS),
            retry: RetryConfig::default(),
        }
    }
}

/// Outcome of reconciling one channel's catalog.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileResult {
    /// Distinct videos reported by the platform.
    pub fetched: usize,
    pub inserted: usize,
    /// Existing videos whose title or publish time changed.
    pub updated: usize,
    pub unchanged: usize,
    pub deleted: usize,
}

impl ReconcileResult {
    /// Whether the run wrote anything.
    pub fn has_changes(&self) -> bool {
        self.inserted + self.updated + self.deleted > 0
    }
}

/// Outcome of pushing descriptions for a set of videos.
#[derive(Debug, Default)]
pub struct DispatchResult {
    /// Distinct videos requested.
    pub processed: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
    pub failures: Vec<(Uuid, Error)>,
}

impl DispatchResult {
    pub(super) fn record_failure(&mut self, video_id: Uuid, error: Error) {
        self.failed += 1;
        self.failures.push((video_id, error));
    }

    /// Channels whose credentials failed during the run.
    pub fn channels_needing_reconnect(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self
            .failures
            .iter()
            .filter_map(|(_, e)| match e {
                Error::CredentialInvalid { channel_id } => Some(*channel_id),
                _ => None,
            })
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_options_default() {
        let options = SyncOptions::default();
        assert_eq!(options.batch_size, 10);
        assert_eq!(options.concurrency, 5);
        assert_eq!(options.lease, Duration::minutes(30));
    }

    #[test]
    fn reconcile_result_reports_changes() {
        let mut result = ReconcileResult {
            fetched: 3,
            unchanged: 3,
            ..Default::default()
        };
        assert!(!result.has_changes());
        result.deleted = 1;
        assert!(result.has_changes());
    }

    #[test]
    fn reconnect_channels_are_deduplicated() {
        let channel = Uuid::new_v4();
        let mut result = DispatchResult::default();
        result.record_failure(Uuid::new_v4(), Error::CredentialInvalid { channel_id: channel });
        result.record_failure(Uuid::new_v4(), Error::CredentialInvalid { channel_id: channel });
        result.record_failure(Uuid::new_v4(), Error::transient("timeout"));

        assert_eq!(result.failed, 3);
        assert_eq!(result.channels_needing_reconnect(), vec![channel]);
    }
}
