//! Update dispatch: compose descriptions and push the ones that changed.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use sea_orm::{ConnectionTrait, DatabaseConnection};
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::compose::{Fragment, build_description, exceeds_platform_limit};
use crate::credentials::CredentialManager;
use crate::entity::{channel, video};
use crate::error::{Error, Result};
use crate::platform::{PlatformError, VideoPlatform, short_error_message};
use crate::retry::{RetryConfig, with_retry};
use crate::store::history;
use crate::store::template as template_store;
use crate::store::video as video_store;
use crate::store::StoreError;

use super::context::SyncContext;
use super::progress::{SkipReason, SyncProgress, emit};
use super::types::{DEFAULT_CONCURRENCY, DispatchResult};

/// Compose the description a video's container currently produces.
///
/// Returns `None` when the video has no container.
pub async fn compose_for_video<C: ConnectionTrait>(db: &C, video: &video::Model) -> Result<Option<String>> {
    let Some(container_id) = video.container_id else {
        return Ok(None);
    };
    let Some(container) = template_store::find_container(db, container_id).await? else {
        return Ok(None);
    };

    let fragments: Vec<Fragment> = template_store::resolve_chain(db, &container)
        .await?
        .iter()
        .map(Fragment::from)
        .collect();
    let bindings = video_store::bindings_for_video(db, video.id).await?;

    Ok(Some(build_description(
        &fragments,
        &bindings,
        &container.separator,
        &video.remote_video_id,
    )))
}

#[derive(Debug, Clone)]
struct PendingUpdate {
    video_id: Uuid,
    channel: channel::Model,
    remote_video_id: String,
    description: String,
}

enum Prepared {
    Pending(PendingUpdate),
    Skipped(SkipReason),
}

/// Channels whose credentials failed terminally during this dispatch.
type InvalidChannels = Arc<Mutex<HashSet<Uuid>>>;

impl<P: VideoPlatform + Clone + 'static> SyncContext<P> {
    /// Recompose and push descriptions for `video_ids` owned by `user_id`.
    ///
    /// Videos without a container, or whose composed text already matches
    /// the cached description, are skipped. The rest are pushed in sequential
    /// batches with a bounded number of remote calls in flight. One video's
    /// failure never affects another; each success appends a history
    /// version.
    #[tracing::instrument(skip(self, video_ids), fields(videos = video_ids.len()))]
    pub async fn update_descriptions(&self, video_ids: &[Uuid], user_id: Uuid) -> Result<DispatchResult> {
        let mut seen = HashSet::new();
        let video_ids: Vec<Uuid> = video_ids.iter().copied().filter(|id| seen.insert(*id)).collect();

        let mut result = DispatchResult {
            processed: video_ids.len(),
            ..Default::default()
        };

        let mut pending = Vec::new();
        for video_id in video_ids {
            match self.prepare(video_id, user_id).await {
                Ok(Prepared::Pending(update)) => pending.push(update),
                Ok(Prepared::Skipped(reason)) => {
                    tracing::debug!(%video_id, %reason, "skipping video");
                    result.skipped += 1;
                    emit(self.on_progress(), SyncProgress::VideoSkipped { video_id, reason });
                }
                Err(e) => {
                    emit(
                        self.on_progress(),
                        SyncProgress::VideoFailed {
                            video_id,
                            error: e.to_string(),
                        },
                    );
                    result.record_failure(video_id, e);
                }
            }
        }

        let batch_size = self.options.batch_size.max(1);
        let concurrency = self.options.concurrency.clamp(1, DEFAULT_CONCURRENCY);
        emit(
            self.on_progress(),
            SyncProgress::DispatchStarted {
                pending: pending.len(),
                batches: pending.len().div_ceil(batch_size),
                concurrency,
            },
        );

        let actor = user_id.to_string();
        let semaphore = Arc::new(Semaphore::new(concurrency));
        let invalid_channels: InvalidChannels = Arc::new(Mutex::new(HashSet::new()));

        for (index, batch) in pending.chunks(batch_size).enumerate() {
            let mut handles = Vec::with_capacity(batch.len());

            for update in batch.iter().cloned() {
                let video_id = update.video_id;
                let platform = self.platform.clone();
                let credentials = self.credentials.clone();
                let db = self.db.clone();
                let retry = self.options.retry.clone();
                let semaphore = Arc::clone(&semaphore);
                let invalid_channels = Arc::clone(&invalid_channels);
                let actor = actor.clone();

                let handle = tokio::spawn(async move {
                    let _permit = match semaphore.acquire().await {
                        Ok(permit) => permit,
                        Err(_) => return Err(Error::transient("dispatch semaphore closed")),
                    };
                    push_one(&platform, &credentials, &db, &invalid_channels, &retry, &update, &actor).await
                });
                handles.push((video_id, handle));
            }

            let mut batch_updated = 0;
            let mut batch_failed = 0;
            for (video_id, handle) in handles {
                match handle.await {
                    Ok(Ok(version)) => {
                        batch_updated += 1;
                        result.updated += 1;
                        emit(self.on_progress(), SyncProgress::VideoUpdated { video_id, version });
                    }
                    Ok(Err(e)) => {
                        batch_failed += 1;
                        tracing::debug!(%video_id, error = %e, "description update failed");
                        emit(
                            self.on_progress(),
                            SyncProgress::VideoFailed {
                                video_id,
                                error: e.to_string(),
                            },
                        );
                        result.record_failure(video_id, e);
                    }
                    Err(join) => {
                        batch_failed += 1;
                        result.record_failure(video_id, Error::transient(format!("task panic: {join}")));
                    }
                }
            }

            emit(
                self.on_progress(),
                SyncProgress::BatchComplete {
                    batch: index + 1,
                    updated: batch_updated,
                    failed: batch_failed,
                },
            );
        }

        emit(
            self.on_progress(),
            SyncProgress::DispatchComplete {
                updated: result.updated,
                skipped: result.skipped,
                failed: result.failed,
            },
        );
        tracing::info!(
            processed = result.processed,
            updated = result.updated,
            skipped = result.skipped,
            failed = result.failed,
            "description dispatch finished"
        );
        Ok(result)
    }

    async fn prepare(&self, video_id: Uuid, user_id: Uuid) -> Result<Prepared> {
        let (video, channel) = match video_store::find_for_user(&self.db, video_id, user_id).await {
            Ok(found) => found,
            Err(StoreError::NotFound { .. }) => return Ok(Prepared::Skipped(SkipReason::Missing)),
            Err(e) => return Err(e.into()),
        };

        let Some(description) = compose_for_video(&self.db, &video).await? else {
            return Ok(Prepared::Skipped(SkipReason::NoContainer));
        };
        if video.current_description.as_deref() == Some(description.as_str()) {
            return Ok(Prepared::Skipped(SkipReason::Unchanged));
        }
        if exceeds_platform_limit(&description) {
            tracing::warn!(
                %video_id,
                chars = description.chars().count(),
                "composed description exceeds the platform limit; pushing anyway"
            );
        }

        Ok(Prepared::Pending(PendingUpdate {
            video_id,
            channel,
            remote_video_id: video.remote_video_id,
            description,
        }))
    }
}

/// Push one description and record it. Returns the new history version.
async fn push_one<P: VideoPlatform>(
    platform: &P,
    credentials: &CredentialManager,
    db: &DatabaseConnection,
    invalid_channels: &InvalidChannels,
    retry: &RetryConfig,
    update: &PendingUpdate,
    actor: &str,
) -> Result<i32> {
    let channel_id = update.channel.id;
    if invalid_channels
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .contains(&channel_id)
    {
        return Err(Error::CredentialInvalid { channel_id });
    }

    let token = match credentials.get_valid_access_token(&update.channel).await {
        Ok(token) => token,
        Err(e) => {
            if e.needs_reconnect() {
                invalid_channels
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .insert(channel_id);
            }
            return Err(e);
        }
    };

    with_retry(
        || platform.update_description(&token, &update.remote_video_id, &update.description),
        PlatformError::is_transient,
        short_error_message,
        "update description",
        retry,
    )
    .await?;

    let row = history::record_description(db, update.video_id, &update.description, actor)
        .await
        .inspect_err(|e| {
            tracing::warn!(
                video_id = %update.video_id,
                error = %e,
                "description pushed but history write failed"
            );
        })?;
    Ok(row.version)
}
