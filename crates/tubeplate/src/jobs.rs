//! Background jobs and the runner that executes them.
//!
//! A job step that fails transiently is retried with exponential backoff;
//! terminal errors stop the job immediately.

use uuid::Uuid;

use crate::error::{Error, Result};
use crate::platform::VideoPlatform;
use crate::retry::{RetryConfig, with_retry};
use crate::store::channel as channel_store;
use crate::store::video as video_store;
use crate::sync::{DispatchResult, ReconcileResult, SyncContext};

/// Work the scheduler or an API trigger can enqueue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    /// Reconcile one channel's catalog.
    SyncChannel { channel_id: Uuid, user_id: Uuid },
    /// Recompose and push descriptions for the given videos.
    UpdateDescriptions { video_ids: Vec<Uuid>, user_id: Uuid },
}

impl Job {
    /// Push every video assigned to `container_id`.
    pub async fn for_container(
        db: &sea_orm::DatabaseConnection,
        container_id: Uuid,
        user_id: Uuid,
    ) -> Result<Self> {
        crate::store::template::find_container_for_user(db, container_id, user_id).await?;
        Ok(Self::UpdateDescriptions {
            video_ids: video_store::ids_using_container(db, container_id).await?,
            user_id,
        })
    }

    /// Push every video whose container includes `template_id`.
    pub async fn for_template(
        db: &sea_orm::DatabaseConnection,
        template_id: Uuid,
        user_id: Uuid,
    ) -> Result<Self> {
        crate::store::template::find_template_for_user(db, template_id, user_id).await?;
        Ok(Self::UpdateDescriptions {
            video_ids: video_store::ids_using_template(db, user_id, template_id).await?,
            user_id,
        })
    }
}

#[derive(Debug)]
pub enum JobOutcome {
    Synced(ReconcileResult),
    Dispatched(DispatchResult),
}

/// Executes jobs against a [`SyncContext`].
#[derive(Clone)]
pub struct JobRunner<P> {
    ctx: SyncContext<P>,
    retry: RetryConfig,
}

impl<P: VideoPlatform + Clone + 'static> JobRunner<P> {
    pub fn new(ctx: SyncContext<P>) -> Self {
        Self {
            ctx,
            retry: RetryConfig::default(),
        }
    }

    #[must_use]
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn context(&self) -> &SyncContext<P> {
        &self.ctx
    }

    #[tracing::instrument(skip(self))]
    pub async fn run(&self, job: Job) -> Result<JobOutcome> {
        match job {
            Job::SyncChannel {
                channel_id,
                user_id,
            } => Ok(JobOutcome::Synced(
                self.sync_channel(channel_id, user_id).await?,
            )),
            Job::UpdateDescriptions { video_ids, user_id } => {
                let result = with_retry(
                    || self.ctx.update_descriptions(&video_ids, user_id),
                    Error::is_retryable,
                    ToString::to_string,
                    "update descriptions",
                    &self.retry,
                )
                .await?;
                Ok(JobOutcome::Dispatched(result))
            }
        }
    }

    async fn sync_channel(&self, channel_id: Uuid, user_id: Uuid) -> Result<ReconcileResult> {
        with_retry(
            || self.ctx.reconcile_channel(channel_id, user_id),
            Error::is_retryable,
            ToString::to_string,
            "sync channel",
            &self.retry,
        )
        .await
    }

    /// Reconcile every channel with usable credentials, oldest sync first.
    ///
    /// One channel's failure does not stop the others.
    #[tracing::instrument(skip(self))]
    pub async fn sync_all(&self) -> Result<Vec<(Uuid, Result<ReconcileResult>)>> {
        let channels = channel_store::list_syncable(self.ctx.db()).await?;
        tracing::info!(channels = channels.len(), "syncing all channels");

        let mut results = Vec::with_capacity(channels.len());
        for channel in channels {
            let outcome = self
                .sync_channel(channel.id, channel.user_id)
                .await
                .inspect_err(|e| {
                    tracing::warn!(channel_id = %channel.id, error = %e, "channel sync failed");
                });
            results.push((channel.id, outcome));
        }
        Ok(results)
    }
}
