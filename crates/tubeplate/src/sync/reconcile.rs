//! Catalog reconciliation: mirror a channel's uploads into local storage.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::Utc;
use sea_orm::TransactionTrait;
use uuid::Uuid;

use crate::entity::channel;
use crate::entity::video;
use crate::error::{Error, Result};
use crate::platform::{RemoteVideo, VideoPlatform, uploads_playlist_for_channel};
use crate::store::channel as channel_store;
use crate::store::history::{self, SYNC_ACTOR};
use crate::store::video as video_store;

use super::context::SyncContext;
use super::progress::{SyncProgress, emit};
use super::types::ReconcileResult;

/// Writes needed to make the local catalog match the remote one.
#[derive(Debug, Default)]
pub(crate) struct CatalogDiff<'a> {
    pub(crate) insert: Vec<&'a RemoteVideo>,
    pub(crate) update: Vec<(Uuid, &'a RemoteVideo)>,
    pub(crate) unchanged: usize,
    pub(crate) delete: Vec<Uuid>,
}

/// Diff by remote video id.
///
/// `remote` must hold each id at most once. Existing rows are updated only
/// when their title or publish time differ; the cached description is never
/// compared.
pub(crate) fn diff_catalog<'a>(
    local: &[video::Model],
    remote: &'a BTreeMap<String, RemoteVideo>,
) -> CatalogDiff<'a> {
    let local_by_remote: HashMap<&str, &video::Model> = local
        .iter()
        .map(|v| (v.remote_video_id.as_str(), v))
        .collect();

    let mut diff = CatalogDiff::default();
    for (remote_id, remote_video) in remote {
        match local_by_remote.get(remote_id.as_str()) {
            None => diff.insert.push(remote_video),
            Some(existing) if catalog_fields_differ(existing, remote_video) => {
                diff.update.push((existing.id, remote_video));
            }
            Some(_) => diff.unchanged += 1,
        }
    }
    diff.delete = local
        .iter()
        .filter(|v| !remote.contains_key(&v.remote_video_id))
        .map(|v| v.id)
        .collect();
    diff
}

fn catalog_fields_differ(local: &video::Model, remote: &RemoteVideo) -> bool {
    local.title != remote.title
        || local.published_at.map(|t| t.with_timezone(&Utc)) != remote.published_at
}

impl<P: VideoPlatform + Clone + 'static> SyncContext<P> {
    /// Reconcile one channel owned by `user_id` against the platform.
    ///
    /// Holds the channel's sync lease for the duration of the run and
    /// releases it on every exit path; `last_synced_at` is set only when the
    /// run succeeds.
    ///
    /// # Errors
    /// - [`Error::NotFound`] if the channel does not exist for this user.
    /// - [`Error::SyncInProgress`] if another run holds a live lease.
    /// - [`Error::CredentialInvalid`] if the channel must be reconnected.
    #[tracing::instrument(skip(self), fields(channel_id = %channel_id))]
    pub async fn reconcile_channel(&self, channel_id: Uuid, user_id: Uuid) -> Result<ReconcileResult> {
        let channel = channel_store::find_for_user(&self.db, channel_id, user_id).await?;
        if channel.needs_reconnect() {
            return Err(Error::CredentialInvalid { channel_id });
        }

        let owner = Uuid::new_v4();
        if !channel_store::try_acquire_lease(&self.db, channel_id, owner, self.options.lease).await? {
            return Err(Error::SyncInProgress { channel_id });
        }

        let outcome = self.reconcile_leased(channel).await;

        match channel_store::release_lease(&self.db, channel_id, owner, outcome.is_ok()).await {
            Ok(true) => {}
            Ok(false) => tracing::warn!("sync lease was taken over before release"),
            Err(e) => tracing::warn!(error = %e, "failed to release sync lease"),
        }

        if let Ok(result) = &outcome {
            tracing::info!(
                fetched = result.fetched,
                inserted = result.inserted,
                updated = result.updated,
                deleted = result.deleted,
                "channel reconciled"
            );
        }
        outcome
    }

    async fn reconcile_leased(&self, mut channel: channel::Model) -> Result<ReconcileResult> {
        emit(
            self.on_progress(),
            SyncProgress::ReconcileStarted {
                channel_id: channel.id,
                title: channel.title.clone(),
            },
        );

        let token = self.credentials.get_valid_access_token(&channel).await?;

        match self.platform.get_own_channel(&token).await {
            Ok(remote) if remote.remote_channel_id == channel.remote_channel_id => {
                match channel_store::update_metadata(&self.db, &channel, &remote).await {
                    Ok(updated) => channel = updated,
                    Err(e) => tracing::warn!(error = %e, "failed to store channel metadata"),
                }
            }
            Ok(remote) => {
                tracing::warn!(
                    remote_channel_id = %remote.remote_channel_id,
                    "token belongs to a different channel; aborting sync"
                );
                return Err(Error::validation(format!(
                    "token for channel {} authenticates as {}",
                    channel.remote_channel_id, remote.remote_channel_id
                )));
            }
            Err(e) => tracing::warn!(error = %e, "channel metadata refresh failed"),
        }

        let playlist_id = channel
            .uploads_playlist_id
            .clone()
            .or_else(|| uploads_playlist_for_channel(&channel.remote_channel_id))
            .ok_or_else(|| {
                Error::validation(format!(
                    "no uploads playlist for channel {}",
                    channel.remote_channel_id
                ))
            })?;

        let remote = self.fetch_catalog(channel.id, &token, &playlist_id).await?;
        let local = video_store::list_for_channel(&self.db, channel.id).await?;
        let diff = diff_catalog(&local, &remote);

        let result = ReconcileResult {
            fetched: remote.len(),
            inserted: diff.insert.len(),
            updated: diff.update.len(),
            unchanged: diff.unchanged,
            deleted: diff.delete.len(),
        };

        if result.has_changes() {
            let txn = self.db.begin().await?;
            for remote_video in &diff.insert {
                let row = video_store::insert_discovered(&txn, channel.id, remote_video).await?;
                history::append_version(
                    &txn,
                    row.id,
                    row.current_description.as_deref().unwrap_or_default(),
                    SYNC_ACTOR,
                )
                .await?;
            }
            for (id, remote_video) in &diff.update {
                video_store::update_catalog_fields(&txn, *id, &remote_video.title, remote_video.published_at)
                    .await?;
            }
            video_store::delete_many(&txn, &diff.delete).await?;
            txn.commit().await?;
        }

        emit(
            self.on_progress(),
            SyncProgress::ReconcileComplete {
                channel_id: channel.id,
                inserted: result.inserted,
                updated: result.updated,
                deleted: result.deleted,
            },
        );
        Ok(result)
    }

    /// Page through the uploads playlist, keyed by remote video id.
    async fn fetch_catalog(
        &self,
        channel_id: Uuid,
        token: &str,
        playlist_id: &str,
    ) -> Result<BTreeMap<String, RemoteVideo>> {
        let mut videos = BTreeMap::new();
        let mut page_token: Option<String> = None;
        let mut seen_tokens = HashSet::new();
        let mut page = 0u32;

        loop {
            page += 1;
            let batch = self
                .platform
                .list_uploads_page(token, playlist_id, page_token.as_deref())
                .await?;
            let count = batch.videos.len();
            for v in batch.videos {
                videos.insert(v.remote_video_id.clone(), v);
            }
            tracing::debug!(page, count, total = videos.len(), "fetched uploads page");
            emit(
                self.on_progress(),
                SyncProgress::FetchedPage {
                    channel_id,
                    page,
                    count,
                    total_so_far: videos.len(),
                },
            );

            match batch.next_page_token {
                Some(next) if !seen_tokens.insert(next.clone()) => {
                    return Err(Error::validation(format!(
                        "uploads pagination repeated page token {next}"
                    )));
                }
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        Ok(videos)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone};

    use super::*;

    fn local(remote_id: &str, title: &str, published: Option<DateTime<Utc>>) -> video::Model {
        let now = Utc::now().fixed_offset();
        video::Model {
            id: Uuid::new_v4(),
            channel_id: Uuid::nil(),
            container_id: None,
            remote_video_id: remote_id.to_string(),
            title: title.to_string(),
            current_description: Some("cached".to_string()),
            published_at: published.map(|t| t.fixed_offset()),
            created_at: now,
            updated_at: now,
        }
    }

    fn remote(id: &str, title: &str, published: Option<DateTime<Utc>>) -> (String, RemoteVideo) {
        (
            id.to_string(),
            RemoteVideo {
                remote_video_id: id.to_string(),
                title: title.to_string(),
                description: Some("remote text".to_string()),
                published_at: published,
            },
        )
    }

    #[test]
    fn diff_inserts_updates_and_deletes_by_identifier() {
        let published = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).single();
        let v2 = local("v2", "Old title", published);
        let v3 = local("v3", "Gone", published);
        let locals = vec![v2.clone(), v3.clone()];
        let remotes: BTreeMap<_, _> = [
            remote("v1", "New", published),
            remote("v2", "New title", published),
        ]
        .into_iter()
        .collect();

        let diff = diff_catalog(&locals, &remotes);

        assert_eq!(diff.insert.len(), 1);
        assert_eq!(diff.insert[0].remote_video_id, "v1");
        assert_eq!(diff.update.len(), 1);
        assert_eq!(diff.update[0].0, v2.id);
        assert_eq!(diff.delete, vec![v3.id]);
        assert_eq!(diff.unchanged, 0);
    }

    #[test]
    fn identical_catalog_fields_are_left_alone() {
        let published = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).single();
        let locals = vec![local("v1", "Same", published)];
        let remotes: BTreeMap<_, _> = [remote("v1", "Same", published)].into_iter().collect();

        let diff = diff_catalog(&locals, &remotes);

        assert!(diff.insert.is_empty());
        assert!(diff.update.is_empty());
        assert!(diff.delete.is_empty());
        assert_eq!(diff.unchanged, 1);
    }

    #[test]
    fn publish_time_change_alone_triggers_update() {
        let before = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).single();
        let after = Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).single();
        let locals = vec![local("v1", "Same", before)];
        let remotes: BTreeMap<_, _> = [remote("v1", "Same", after)].into_iter().collect();

        assert_eq!(diff_catalog(&locals, &remotes).update.len(), 1);
    }

    #[test]
    fn empty_remote_deletes_everything() {
        let locals = vec![local("v1", "a", None), local("v2", "b", None)];
        let remotes = BTreeMap::new();

        let diff = diff_catalog(&locals, &remotes);
        assert_eq!(diff.delete.len(), 2);
    }
}
