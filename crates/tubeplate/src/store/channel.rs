//! Channel persistence: lookup, credentials, and the sync lease.

use chrono::{DateTime, Duration, FixedOffset, Utc};
use sea_orm::sea_query::{Condition, Expr};
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::entity::channel::{ActiveModel, Column, Entity as Channel, Model};
use crate::entity::sync_status::SyncStatus;
use crate::entity::token_status::TokenStatus;
use crate::platform::RemoteChannel;

use super::errors::{Result, StoreError};

/// Encrypted credentials as they are written to a channel row.
#[derive(Debug, Clone)]
pub struct StoredTokens {
    pub access_token: String,
    /// `None` keeps the existing refresh token.
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<FixedOffset>>,
}

pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Model>> {
    Ok(Channel::find_by_id(id).one(db).await?)
}

/// Load a channel owned by `user_id`.
pub async fn find_for_user<C: ConnectionTrait>(db: &C, id: Uuid, user_id: Uuid) -> Result<Model> {
    Channel::find_by_id(id)
        .filter(Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| StoreError::not_found("channel", id))
}

pub async fn find_by_remote_id<C: ConnectionTrait>(db: &C, remote_channel_id: &str) -> Result<Option<Model>> {
    Ok(Channel::find()
        .filter(Column::RemoteChannelId.eq(remote_channel_id))
        .one(db)
        .await?)
}

/// Every channel whose credentials are still usable, oldest sync first.
pub async fn list_syncable<C: ConnectionTrait>(db: &C) -> Result<Vec<Model>> {
    Ok(Channel::find()
        .filter(Column::TokenStatus.eq(TokenStatus::Valid))
        .order_by_asc(Column::LastSyncedAt)
        .all(db)
        .await?)
}

pub async fn list_for_user<C: ConnectionTrait>(db: &C, user_id: Uuid) -> Result<Vec<Model>> {
    Ok(Channel::find()
        .filter(Column::UserId.eq(user_id))
        .order_by_asc(Column::Title)
        .all(db)
        .await?)
}

/// Create a channel row, or re-validate an existing one with the same remote id.
///
/// Reconnecting resets `token_status` to valid and replaces both tokens.
pub async fn upsert_connected<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    remote: &RemoteChannel,
    tokens: StoredTokens,
) -> Result<Model> {
    let now = Utc::now().fixed_offset();

    if let Some(existing) = find_by_remote_id(db, &remote.remote_channel_id).await? {
        if existing.user_id != user_id {
            return Err(StoreError::invalid_input(format!(
                "remote channel {} is connected by another user",
                remote.remote_channel_id
            )));
        }
        let mut model: ActiveModel = existing.into();
        apply_metadata(&mut model, remote);
        model.access_token = Set(tokens.access_token);
        if let Some(refresh) = tokens.refresh_token {
            model.refresh_token = Set(Some(refresh));
        }
        model.token_expires_at = Set(tokens.expires_at);
        model.token_status = Set(TokenStatus::Valid);
        model.updated_at = Set(now);
        return Ok(model.update(db).await?);
    }

    let mut model = ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        remote_channel_id: Set(remote.remote_channel_id.clone()),
        access_token: Set(tokens.access_token),
        refresh_token: Set(tokens.refresh_token),
        token_expires_at: Set(tokens.expires_at),
        token_status: Set(TokenStatus::Valid),
        sync_status: Set(SyncStatus::Idle),
        sync_lease_owner: Set(None),
        sync_lease_expires_at: Set(None),
        last_synced_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    apply_metadata(&mut model, remote);
    Ok(model.insert(db).await?)
}

fn apply_metadata(model: &mut ActiveModel, remote: &RemoteChannel) {
    model.title = Set(remote.title.clone());
    model.thumbnail_url = Set(remote.thumbnail_url.clone());
    model.subscriber_count = Set(remote.subscriber_count);
    if remote.uploads_playlist_id.is_some() {
        model.uploads_playlist_id = Set(remote.uploads_playlist_id.clone());
    }
}

/// Refresh cached metadata from the platform.
pub async fn update_metadata<C: ConnectionTrait>(db: &C, channel: &Model, remote: &RemoteChannel) -> Result<Model> {
    let mut model: ActiveModel = channel.clone().into();
    apply_metadata(&mut model, remote);
    model.updated_at = Set(Utc::now().fixed_offset());
    Ok(model.update(db).await?)
}

/// Persist refreshed credentials and mark them valid.
pub async fn store_tokens<C: ConnectionTrait>(db: &C, id: Uuid, tokens: StoredTokens) -> Result<()> {
    let mut update = Channel::update_many()
        .col_expr(Column::AccessToken, Expr::value(tokens.access_token))
        .col_expr(Column::TokenExpiresAt, Expr::value(tokens.expires_at))
        .col_expr(Column::TokenStatus, Expr::value(TokenStatus::Valid))
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now().fixed_offset()));
    if let Some(refresh) = tokens.refresh_token {
        update = update.col_expr(Column::RefreshToken, Expr::value(Some(refresh)));
    }
    let result = update.filter(Column::Id.eq(id)).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(StoreError::not_found("channel", id));
    }
    Ok(())
}

/// Mark a channel's credentials as permanently unusable.
pub async fn mark_token_invalid<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<()> {
    Channel::update_many()
        .col_expr(Column::TokenStatus, Expr::value(TokenStatus::Invalid))
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now().fixed_offset()))
        .filter(Column::Id.eq(id))
        .exec(db)
        .await?;
    Ok(())
}

// ─── Sync Lease ──────────────────────────────────────────────────────────────

/// Try to take the channel's sync lease for `owner`.
///
/// Succeeds when the channel is idle or the previous holder's lease has
/// lapsed. The check and the write are one conditional `UPDATE`, so two
/// racing runs cannot both win.
pub async fn try_acquire_lease<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
    owner: Uuid,
    lease: Duration,
) -> Result<bool> {
    let now = Utc::now().fixed_offset();
    let result = Channel::update_many()
        .col_expr(Column::SyncStatus, Expr::value(SyncStatus::Syncing))
        .col_expr(Column::SyncLeaseOwner, Expr::value(Some(owner)))
        .col_expr(Column::SyncLeaseExpiresAt, Expr::value(Some(now + lease)))
        .col_expr(Column::UpdatedAt, Expr::value(now))
        .filter(Column::Id.eq(id))
        .filter(
            Condition::any()
                .add(Column::SyncStatus.eq(SyncStatus::Idle))
                .add(Column::SyncLeaseExpiresAt.is_null())
                .add(Column::SyncLeaseExpiresAt.lt(now)),
        )
        .exec(db)
        .await?;
    Ok(result.rows_affected == 1)
}

/// Release a lease held by `owner`, recording completion when `completed`.
///
/// A lease that was taken over after expiring is left alone.
pub async fn release_lease<C: ConnectionTrait>(db: &C, id: Uuid, owner: Uuid, completed: bool) -> Result<bool> {
    let now = Utc::now().fixed_offset();
    let mut update = Channel::update_many()
        .col_expr(Column::SyncStatus, Expr::value(SyncStatus::Idle))
        .col_expr(Column::SyncLeaseOwner, Expr::value(Option::<Uuid>::None))
        .col_expr(
            Column::SyncLeaseExpiresAt,
            Expr::value(Option::<DateTime<FixedOffset>>::None),
        )
        .col_expr(Column::UpdatedAt, Expr::value(now));
    if completed {
        update = update.col_expr(Column::LastSyncedAt, Expr::value(Some(now)));
    }
    let result = update
        .filter(Column::Id.eq(id))
        .filter(Column::SyncLeaseOwner.eq(owner))
        .exec(db)
        .await?;
    Ok(result.rows_affected == 1)
}

/// Clear any lease on the channel regardless of holder.
pub async fn reset_sync_state<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<()> {
    let result = Channel::update_many()
        .col_expr(Column::SyncStatus, Expr::value(SyncStatus::Idle))
        .col_expr(Column::SyncLeaseOwner, Expr::value(Option::<Uuid>::None))
        .col_expr(
            Column::SyncLeaseExpiresAt,
            Expr::value(Option::<DateTime<FixedOffset>>::None),
        )
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now().fixed_offset()))
        .filter(Column::Id.eq(id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(StoreError::not_found("channel", id));
    }
    Ok(())
}

/// Delete a channel. Videos, variables, and history cascade.
pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64> {
    let result = Channel::delete_by_id(id).exec(db).await?;
    Ok(result.rows_affected)
}
