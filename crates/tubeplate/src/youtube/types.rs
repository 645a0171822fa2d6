//! Wire types for the YouTube Data API responses we consume.
//!
//! Each endpoint gets its own list type. Conversion into the platform types
//! validates required fields.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::error::YouTubeError;
use crate::platform::{RemoteChannel, RemoteVideo, UploadsPage};

// ─── channels.list ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(super) struct ChannelListResponse {
    #[serde(default)]
    pub items: Vec<ChannelItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ChannelItem {
    pub id: Option<String>,
    pub snippet: Option<ChannelSnippet>,
    pub statistics: Option<ChannelStatistics>,
    pub content_details: Option<ChannelContentDetails>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ChannelSnippet {
    pub title: Option<String>,
    #[serde(default)]
    pub thumbnails: Option<Thumbnails>,
}

#[derive(Debug, Deserialize)]
pub(super) struct Thumbnails {
    #[serde(default)]
    pub default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
pub(super) struct Thumbnail {
    pub url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ChannelStatistics {
    /// Encoded as a decimal string.
    #[serde(default)]
    pub subscriber_count: Option<String>,
    #[serde(default)]
    pub hidden_subscriber_count: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ChannelContentDetails {
    pub related_playlists: Option<RelatedPlaylists>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RelatedPlaylists {
    pub uploads: Option<String>,
}

impl TryFrom<ChannelItem> for RemoteChannel {
    type Error = YouTubeError;

    fn try_from(item: ChannelItem) -> Result<Self, Self::Error> {
        let remote_channel_id = item.id.ok_or(YouTubeError::MissingField("channel.id"))?;
        let snippet = item
            .snippet
            .ok_or(YouTubeError::MissingField("channel.snippet"))?;
        let title = snippet
            .title
            .ok_or(YouTubeError::MissingField("channel.snippet.title"))?;

        let subscriber_count = item
            .statistics
            .filter(|s| !s.hidden_subscriber_count)
            .and_then(|s| s.subscriber_count)
            .and_then(|c| c.parse::<i64>().ok());

        Ok(Self {
            remote_channel_id,
            title,
            thumbnail_url: snippet.thumbnails.and_then(|t| t.default).map(|t| t.url),
            subscriber_count,
            uploads_playlist_id: item
                .content_details
                .and_then(|d| d.related_playlists)
                .and_then(|p| p.uploads),
        })
    }
}

// ─── playlistItems.list ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PlaylistItemListResponse {
    #[serde(default)]
    pub next_page_token: Option<String>,
    #[serde(default)]
    pub items: Vec<PlaylistItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PlaylistItem {
    pub snippet: Option<PlaylistItemSnippet>,
    pub content_details: Option<PlaylistItemContentDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PlaylistItemSnippet {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PlaylistItemContentDetails {
    pub video_id: Option<String>,
    /// Absent for private videos.
    #[serde(default)]
    pub video_published_at: Option<DateTime<Utc>>,
}

impl TryFrom<PlaylistItem> for RemoteVideo {
    type Error = YouTubeError;

    fn try_from(item: PlaylistItem) -> Result<Self, Self::Error> {
        let details = item
            .content_details
            .ok_or(YouTubeError::MissingField("playlistItem.contentDetails"))?;
        let remote_video_id = details
            .video_id
            .ok_or(YouTubeError::MissingField("playlistItem.contentDetails.videoId"))?;
        let snippet = item
            .snippet
            .ok_or(YouTubeError::MissingField("playlistItem.snippet"))?;

        Ok(Self {
            remote_video_id,
            title: snippet.title,
            description: snippet.description,
            published_at: details.video_published_at,
        })
    }
}

impl TryFrom<PlaylistItemListResponse> for UploadsPage {
    type Error = YouTubeError;

    fn try_from(resp: PlaylistItemListResponse) -> Result<Self, Self::Error> {
        let videos = resp
            .items
            .into_iter()
            .map(RemoteVideo::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            videos,
            next_page_token: resp.next_page_token.filter(|t| !t.is_empty()),
        })
    }
}

// ─── videos.list ─────────────────────────────────────────────────────────────

/// The snippet is kept as raw JSON so the update writes back every field we
/// do not own (tags, category, language) untouched.
#[derive(Debug, Deserialize)]
pub(super) struct VideoListResponse {
    #[serde(default)]
    pub items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
pub(super) struct VideoItem {
    pub id: String,
    pub snippet: Option<serde_json::Map<String, serde_json::Value>>,
}

// ─── errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(super) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorDetail {
    #[serde(default)]
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_item_converts_with_hidden_subscribers() {
        let json = r#"{
            "id": "UC123",
            "snippet": {"title": "Cooking", "thumbnails": {"default": {"url": "https://i.ytimg.com/a.jpg"}}},
            "statistics": {"subscriberCount": "1200", "hiddenSubscriberCount": true},
            "contentDetails": {"relatedPlaylists": {"uploads": "UU123"}}
        }"#;
        let item: ChannelItem = serde_json::from_str(json).unwrap();
        let channel = RemoteChannel::try_from(item).unwrap();
        assert_eq!(channel.remote_channel_id, "UC123");
        assert_eq!(channel.title, "Cooking");
        assert_eq!(channel.subscriber_count, None);
        assert_eq!(channel.uploads_playlist_id.as_deref(), Some("UU123"));
        assert_eq!(
            channel.thumbnail_url.as_deref(),
            Some("https://i.ytimg.com/a.jpg")
        );
    }

    #[test]
    fn channel_item_without_id_is_rejected() {
        let item: ChannelItem = serde_json::from_str(r#"{"snippet": {"title": "x"}}"#).unwrap();
        let err = RemoteChannel::try_from(item).unwrap_err();
        assert!(matches!(err, YouTubeError::MissingField("channel.id")));
    }

    #[test]
    fn playlist_page_converts_and_drops_empty_cursor() {
        let json = r#"{
            "nextPageToken": "",
            "items": [
                {"snippet": {"title": "Ep 1", "description": "hello"},
                 "contentDetails": {"videoId": "vid1", "videoPublishedAt": "2024-03-01T10:00:00Z"}},
                {"snippet": {"title": "Private video"},
                 "contentDetails": {"videoId": "vid2"}}
            ]
        }"#;
        let resp: PlaylistItemListResponse = serde_json::from_str(json).unwrap();
        let page = UploadsPage::try_from(resp).unwrap();
        assert_eq!(page.next_page_token, None);
        assert_eq!(page.videos.len(), 2);
        assert_eq!(page.videos[0].remote_video_id, "vid1");
        assert_eq!(page.videos[0].description.as_deref(), Some("hello"));
        assert!(page.videos[0].published_at.is_some());
        assert_eq!(page.videos[1].published_at, None);
    }

    #[test]
    fn playlist_item_without_video_id_is_rejected() {
        let json = r#"{"items": [{"snippet": {"title": "x"}, "contentDetails": {}}]}"#;
        let resp: PlaylistItemListResponse = serde_json::from_str(json).unwrap();
        assert!(UploadsPage::try_from(resp).is_err());
    }
}
