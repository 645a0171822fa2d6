//! YouTube Data API client over [`HttpTransport`].

use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use super::error::YouTubeError;
use super::types::{
    ChannelListResponse, ErrorEnvelope, PlaylistItemListResponse, VideoListResponse,
};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
use crate::platform::{
    self, RemoteChannel, UPLOADS_PAGE_SIZE, UploadsPage, VideoPlatform,
};

/// Production API base.
pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// YouTube Data API client.
///
/// Holds no credentials: every call is made with the bearer token of the
/// channel being worked on.
#[derive(Clone)]
pub struct YouTubeClient {
    transport: Arc<dyn HttpTransport>,
    api_base: String,
}

impl YouTubeClient {
    pub fn new(api_base: Option<String>) -> Result<Self, YouTubeError> {
        let transport = ReqwestTransport::with_timeout(StdDuration::from_secs(30))
            .map_err(|e| YouTubeError::Config(e.to_string()))?;
        Ok(Self::new_with_transport(api_base, Arc::new(transport)))
    }

    pub fn new_with_transport(api_base: Option<String>, transport: Arc<dyn HttpTransport>) -> Self {
        let api_base = api_base
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();
        Self {
            transport,
            api_base,
        }
    }

    /// Build an endpoint URL with query parameters.
    pub fn endpoint(&self, resource: &str, params: &[(&str, &str)]) -> Result<String, YouTubeError> {
        let url = url::Url::parse_with_params(&format!("{}/{resource}", self.api_base), params)
            .map_err(|e| YouTubeError::Config(format!("invalid API base: {e}")))?;
        Ok(url.to_string())
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, YouTubeError> {
        let response = self.transport.send(request).await?;
        if response.is_success() {
            Ok(response)
        } else {
            Err(api_error(&response))
        }
    }

    async fn get<T: DeserializeOwned>(&self, url: String, token: &str) -> Result<T, YouTubeError> {
        let request = HttpRequest::get(url)
            .header("Accept", "application/json")
            .bearer(token);
        let response = self.send(request).await?;
        Ok(response.json()?)
    }

    async fn fetch_own_channel(&self, token: &str) -> Result<RemoteChannel, YouTubeError> {
        let url = self.endpoint(
            "channels",
            &[
                ("part", "snippet,statistics,contentDetails"),
                ("mine", "true"),
            ],
        )?;
        let resp: ChannelListResponse = self.get(url, token).await?;
        let item = resp.items.into_iter().next().ok_or(YouTubeError::NoChannel)?;
        RemoteChannel::try_from(item)
    }

    async fn fetch_uploads_page(
        &self,
        token: &str,
        playlist_id: &str,
        page_token: Option<&str>,
    ) -> Result<UploadsPage, YouTubeError> {
        let page_size = UPLOADS_PAGE_SIZE.to_string();
        let mut params = vec![
            ("part", "snippet,contentDetails"),
            ("playlistId", playlist_id),
            ("maxResults", page_size.as_str()),
        ];
        if let Some(cursor) = page_token {
            params.push(("pageToken", cursor));
        }
        let url = self.endpoint("playlistItems", &params)?;
        let resp: PlaylistItemListResponse = self.get(url, token).await?;
        UploadsPage::try_from(resp)
    }

    /// Read the current snippet, swap in the description, and write it back.
    async fn put_description(
        &self,
        token: &str,
        remote_video_id: &str,
        description: &str,
    ) -> Result<(), YouTubeError> {
        let url = self.endpoint("videos", &[("part", "snippet"), ("id", remote_video_id)])?;
        let resp: VideoListResponse = self.get(url, token).await?;
        let item = resp
            .items
            .into_iter()
            .find(|item| item.id == remote_video_id)
            .ok_or_else(|| YouTubeError::VideoNotFound(remote_video_id.to_string()))?;
        let mut snippet = item.snippet.ok_or(YouTubeError::MissingField("video.snippet"))?;

        // videos.update rejects a snippet without these.
        if !snippet.contains_key("title") {
            return Err(YouTubeError::MissingField("video.snippet.title"));
        }
        if !snippet.contains_key("categoryId") {
            return Err(YouTubeError::MissingField("video.snippet.categoryId"));
        }
        snippet.insert(
            "description".to_string(),
            serde_json::Value::String(description.to_string()),
        );

        let body = serde_json::json!({ "id": remote_video_id, "snippet": snippet });
        let url = self.endpoint("videos", &[("part", "snippet")])?;
        let request = HttpRequest::new(HttpMethod::Put, url)
            .header("Accept", "application/json")
            .bearer(token)
            .json(&body)?;
        self.send(request).await?;
        Ok(())
    }
}

/// Build an API error from a non-2xx response.
fn api_error(response: &HttpResponse) -> YouTubeError {
    match response.json::<ErrorEnvelope>() {
        Ok(envelope) => YouTubeError::Api {
            status: response.status,
            reason: envelope
                .error
                .errors
                .into_iter()
                .find_map(|detail| detail.reason),
            message: envelope.error.message,
        },
        Err(_) => YouTubeError::Api {
            status: response.status,
            reason: None,
            message: response.text(),
        },
    }
}

#[async_trait]
impl VideoPlatform for YouTubeClient {
    async fn get_own_channel(&self, access_token: &str) -> platform::Result<RemoteChannel> {
        Ok(self.fetch_own_channel(access_token).await?)
    }

    async fn list_uploads_page(
        &self,
        access_token: &str,
        playlist_id: &str,
        page_token: Option<&str>,
    ) -> platform::Result<UploadsPage> {
        Ok(self
            .fetch_uploads_page(access_token, playlist_id, page_token)
            .await?)
    }

    async fn update_description(
        &self,
        access_token: &str,
        remote_video_id: &str,
        description: &str,
    ) -> platform::Result<()> {
        Ok(self
            .put_description(access_token, remote_video_id, description)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpError, MockTransport, header_get};
    use crate::platform::PlatformError;

    const BASE: &str = "https://yt.test/v3";

    fn client(transport: &MockTransport) -> YouTubeClient {
        YouTubeClient::new_with_transport(Some(format!("{BASE}/")), Arc::new(transport.clone()))
    }

    #[test]
    fn endpoint_encodes_query_parameters() {
        let c = client(&MockTransport::new());
        let url = c
            .endpoint("playlistItems", &[("part", "snippet,contentDetails"), ("playlistId", "UU1")])
            .unwrap();
        assert_eq!(
            url,
            "https://yt.test/v3/playlistItems?part=snippet%2CcontentDetails&playlistId=UU1"
        );
    }

    #[tokio::test]
    async fn get_own_channel_sends_bearer_and_parses() {
        let transport = MockTransport::new();
        let c = client(&transport);
        let url = c
            .endpoint(
                "channels",
                &[("part", "snippet,statistics,contentDetails"), ("mine", "true")],
            )
            .unwrap();
        transport.push_json(
            HttpMethod::Get,
            url,
            200,
            serde_json::json!({"items": [{
                "id": "UC9",
                "snippet": {"title": "Nine"},
                "statistics": {"subscriberCount": "42"},
                "contentDetails": {"relatedPlaylists": {"uploads": "UU9"}}
            }]}),
        );

        let channel = c.get_own_channel("tok").await.unwrap();
        assert_eq!(channel.remote_channel_id, "UC9");
        assert_eq!(channel.subscriber_count, Some(42));
        assert_eq!(channel.uploads_playlist_id.as_deref(), Some("UU9"));

        let requests = transport.requests();
        assert_eq!(
            header_get(&requests[0].headers, "authorization"),
            Some("Bearer tok")
        );
    }

    #[tokio::test]
    async fn get_own_channel_without_items_is_not_found() {
        let transport = MockTransport::new();
        let c = client(&transport);
        let url = c
            .endpoint(
                "channels",
                &[("part", "snippet,statistics,contentDetails"), ("mine", "true")],
            )
            .unwrap();
        transport.push_json(HttpMethod::Get, url, 200, serde_json::json!({"items": []}));

        let err = c.get_own_channel("tok").await.unwrap_err();
        assert!(matches!(err, PlatformError::NotFound { .. }));
    }

    #[tokio::test]
    async fn list_uploads_page_passes_cursor_and_page_size() {
        let transport = MockTransport::new();
        let c = client(&transport);
        let url = c
            .endpoint(
                "playlistItems",
                &[
                    ("part", "snippet,contentDetails"),
                    ("playlistId", "UU9"),
                    ("maxResults", "50"),
                    ("pageToken", "CDIQAA"),
                ],
            )
            .unwrap();
        transport.push_json(
            HttpMethod::Get,
            url,
            200,
            serde_json::json!({
                "nextPageToken": "CGQQAA",
                "items": [{"snippet": {"title": "A"}, "contentDetails": {"videoId": "a1"}}]
            }),
        );

        let page = c.list_uploads_page("tok", "UU9", Some("CDIQAA")).await.unwrap();
        assert_eq!(page.videos.len(), 1);
        assert_eq!(page.next_page_token.as_deref(), Some("CGQQAA"));
    }

    #[tokio::test]
    async fn update_description_preserves_other_snippet_fields() {
        let transport = MockTransport::new();
        let c = client(&transport);
        let read_url = c
            .endpoint("videos", &[("part", "snippet"), ("id", "vid1")])
            .unwrap();
        let write_url = c.endpoint("videos", &[("part", "snippet")]).unwrap();

        transport.push_json(
            HttpMethod::Get,
            read_url,
            200,
            serde_json::json!({"items": [{"id": "vid1", "snippet": {
                "title": "Title",
                "categoryId": "22",
                "tags": ["a", "b"],
                "description": "old"
            }}]}),
        );
        transport.push_json(
            HttpMethod::Put,
            write_url,
            200,
            serde_json::json!({"id": "vid1"}),
        );

        c.update_description("tok", "vid1", "new text").await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        let sent: serde_json::Value = serde_json::from_slice(&requests[1].body).unwrap();
        assert_eq!(sent["id"], "vid1");
        assert_eq!(sent["snippet"]["description"], "new text");
        assert_eq!(sent["snippet"]["title"], "Title");
        assert_eq!(sent["snippet"]["categoryId"], "22");
        assert_eq!(sent["snippet"]["tags"], serde_json::json!(["a", "b"]));
    }

    #[tokio::test]
    async fn update_description_for_unknown_video_is_not_found() {
        let transport = MockTransport::new();
        let c = client(&transport);
        let read_url = c
            .endpoint("videos", &[("part", "snippet"), ("id", "gone")])
            .unwrap();
        transport.push_json(HttpMethod::Get, read_url, 200, serde_json::json!({"items": []}));

        let err = c.update_description("tok", "gone", "x").await.unwrap_err();
        assert!(matches!(err, PlatformError::NotFound { .. }));
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn api_errors_carry_reason() {
        let transport = MockTransport::new();
        let c = client(&transport);
        let read_url = c
            .endpoint("videos", &[("part", "snippet"), ("id", "v")])
            .unwrap();
        transport.push_json(
            HttpMethod::Get,
            read_url,
            403,
            serde_json::json!({"error": {
                "code": 403,
                "message": "Quota exceeded",
                "errors": [{"reason": "quotaExceeded"}]
            }}),
        );

        let err = c.put_description("tok", "v", "x").await.unwrap_err();
        match err {
            YouTubeError::Api {
                status,
                reason,
                message,
            } => {
                assert_eq!(status, 403);
                assert_eq!(reason.as_deref(), Some("quotaExceeded"));
                assert_eq!(message, "Quota exceeded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn transport_timeout_is_transient() {
        let transport = MockTransport::new();
        let c = client(&transport);
        let url = c
            .endpoint(
                "channels",
                &[("part", "snippet,statistics,contentDetails"), ("mine", "true")],
            )
            .unwrap();
        transport.push_error(HttpMethod::Get, url, HttpError::Timeout("30s".into()));

        let err = c.get_own_channel("tok").await.unwrap_err();
        assert!(err.is_transient());
    }
}
