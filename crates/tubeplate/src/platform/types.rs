use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::errors::Result;

/// Page size used for catalog pagination (the API maximum).
pub const UPLOADS_PAGE_SIZE: u32 = 50;

/// The authenticated user's channel as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteChannel {
    pub remote_channel_id: String,
    pub title: String,
    pub thumbnail_url: Option<String>,
    /// `None` when the channel hides its subscriber count.
    pub subscriber_count: Option<i64>,
    /// Playlist holding every upload.
    pub uploads_playlist_id: Option<String>,
}

/// One upload as listed in the channel's uploads playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteVideo {
    pub remote_video_id: String,
    pub title: String,
    pub description: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

/// One page of the uploads playlist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadsPage {
    pub videos: Vec<RemoteVideo>,
    /// Cursor for the next page; `None` on the last page.
    pub next_page_token: Option<String>,
}

/// Trait for video platform clients.
///
/// Every call takes the bearer token explicitly: a single client serves many
/// channels, each with its own credentials.
///
/// Implementors should convert platform-specific errors to `PlatformError`
/// and validate responses at the boundary, reporting missing required fields
/// as [`super::PlatformError::InvalidResponse`].
#[async_trait]
pub trait VideoPlatform: Send + Sync {
    /// Fetch the channel owned by the token's user.
    async fn get_own_channel(&self, access_token: &str) -> Result<RemoteChannel>;

    /// Fetch one page of an uploads playlist.
    async fn list_uploads_page(
        &self,
        access_token: &str,
        playlist_id: &str,
        page_token: Option<&str>,
    ) -> Result<UploadsPage>;

    /// Replace a video's description, preserving every other snippet field.
    async fn update_description(
        &self,
        access_token: &str,
        remote_video_id: &str,
        description: &str,
    ) -> Result<()>;
}

/// Derive the uploads playlist id from a channel id (`UC...` becomes `UU...`).
///
/// Used when the channel metadata lookup is unavailable.
pub fn uploads_playlist_for_channel(remote_channel_id: &str) -> Option<String> {
    remote_channel_id
        .strip_prefix("UC")
        .map(|rest| format!("UU{rest}"))
}
