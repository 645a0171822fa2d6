//! Shared dependencies for reconciliation and dispatch.

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::credentials::CredentialManager;
use crate::platform::VideoPlatform;

use super::progress::ProgressCallback;
use super::types::SyncOptions;

/// Everything a sync run needs: storage, credentials, the remote platform.
///
/// Cloning is cheap; spawned per-video tasks each hold a clone of the parts
/// they use.
///
/// # Example
///
/// ```ignore
/// let ctx = SyncContext::new(db, credentials, RateLimitedPlatform::new(client, 10))
///     .with_options(SyncOptions::default())
///     .with_progress(Box::new(|event| println!("{event:?}")));
///
/// let result = ctx.reconcile_channel(channel_id, user_id).await?;
/// ```
#[derive(Clone)]
pub struct SyncContext<P> {
    pub(super) db: DatabaseConnection,
    pub(super) credentials: CredentialManager,
    pub(super) platform: P,
    pub(super) options: SyncOptions,
    pub(super) progress: Option<Arc<ProgressCallback>>,
}

impl<P: VideoPlatform + Clone + 'static> SyncContext<P> {
    pub fn new(db: DatabaseConnection, credentials: CredentialManager, platform: P) -> Self {
        Self {
            db,
            credentials,
            platform,
            options: SyncOptions::default(),
            progress: None,
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: SyncOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(Arc::new(callback));
        self
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn credentials(&self) -> &CredentialManager {
        &self.credentials
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    pub(super) fn on_progress(&self) -> Option<&ProgressCallback> {
        self.progress.as_deref()
    }
}
