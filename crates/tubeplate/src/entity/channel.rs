//! Channel entity - a connected YouTube channel and its encrypted credentials.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::entity::sync_status::SyncStatus;
use crate::entity::token_status::TokenStatus;

/// Channel model - one row per connected remote channel.
///
/// Credential columns hold ciphertext produced by a [`crate::crypto::TokenCipher`];
/// plaintext tokens are never persisted.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "channels")]
pub struct Model {
    /// Internal UUID primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    // ─── Ownership ───────────────────────────────────────────────────────────
    /// Owning user (issued by the external auth system).
    pub user_id: Uuid,
    /// Remote channel identifier (`UC...`).
    #[sea_orm(unique)]
    pub remote_channel_id: String,

    // ─── Cached Metadata ─────────────────────────────────────────────────────
    /// Channel title as last fetched.
    pub title: String,
    /// Default thumbnail URL.
    #[sea_orm(column_type = "Text", nullable)]
    pub thumbnail_url: Option<String>,
    /// Subscriber count (hidden counts are stored as `None`).
    pub subscriber_count: Option<i64>,
    /// Playlist holding every upload, including private and unlisted videos.
    pub uploads_playlist_id: Option<String>,

    // ─── Credentials ─────────────────────────────────────────────────────────
    /// Encrypted OAuth access token.
    #[serde(skip_serializing)]
    #[sea_orm(column_type = "Text")]
    pub access_token: String,
    /// Encrypted OAuth refresh token.
    #[serde(skip_serializing)]
    #[sea_orm(column_type = "Text", nullable)]
    pub refresh_token: Option<String>,
    /// When the access token expires.
    pub token_expires_at: Option<DateTimeWithTimeZone>,
    /// Whether the credentials are still usable.
    pub token_status: TokenStatus,

    // ─── Sync Lease ──────────────────────────────────────────────────────────
    /// Whether a reconciliation currently holds the lease.
    pub sync_status: SyncStatus,
    /// Run identifier of the lease holder.
    pub sync_lease_owner: Option<Uuid>,
    /// When the current lease lapses if never released.
    pub sync_lease_expires_at: Option<DateTimeWithTimeZone>,
    /// When the last reconciliation finished successfully.
    pub last_synced_at: Option<DateTimeWithTimeZone>,

    // ─── Tracking ────────────────────────────────────────────────────────────
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// A channel has many videos.
    #[sea_orm(has_many = "super::video::Entity")]
    Video,
}

impl Related<super::video::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Video.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether the credentials have been marked unusable.
    pub fn needs_reconnect(&self) -> bool {
        self.token_status == TokenStatus::Invalid
    }
}
