use std::num::NonZeroU32;
use std::sync::Arc;

use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};

use super::errors::Result;
use super::types::{RemoteChannel, UploadsPage, VideoPlatform};

/// Type alias for the governor rate limiter.
type GovernorRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Default request rate for YouTube Data API calls.
///
/// The daily quota is unit-based rather than rate-based; this only smooths
/// bursts from the dispatcher's concurrent updates.
pub const YOUTUBE_DEFAULT_RPS: u32 = 10;

fn quota(requests_per_second: u32) -> Quota {
    Quota::per_second(NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN))
}

/// A standalone API rate limiter using the governor crate.
///
/// # Example
///
/// ```ignore
/// let limiter = ApiRateLimiter::new(10); // 10 requests per second
///
/// // Before each API call:
/// limiter.wait().await;
/// ```
#[derive(Clone)]
pub struct ApiRateLimiter {
    inner: Arc<GovernorRateLimiter>,
}

impl ApiRateLimiter {
    /// Create a new rate limiter. A rate of 0 is treated as 1.
    pub fn new(requests_per_second: u32) -> Self {
        Self {
            inner: Arc::new(RateLimiter::direct(quota(requests_per_second))),
        }
    }

    /// Wait until a request is allowed by the rate limiter.
    pub async fn wait(&self) {
        self.inner.until_ready().await;
    }
}

/// A rate-limited wrapper around any [`VideoPlatform`].
///
/// All trait methods wait for the shared limiter before delegating, so the
/// limit holds across every task that clones the wrapper.
pub struct RateLimitedPlatform<C> {
    inner: C,
    limiter: ApiRateLimiter,
}

impl<C> RateLimitedPlatform<C> {
    pub fn new(inner: C, requests_per_second: u32) -> Self {
        Self {
            inner,
            limiter: ApiRateLimiter::new(requests_per_second),
        }
    }

    /// Get a reference to the inner client.
    pub fn inner(&self) -> &C {
        &self.inner
    }
}

impl<C: Clone> Clone for RateLimitedPlatform<C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            limiter: self.limiter.clone(),
        }
    }
}

#[async_trait]
impl<C: VideoPlatform> VideoPlatform for RateLimitedPlatform<C> {
    async fn get_own_channel(&self, access_token: &str) -> Result<RemoteChannel> {
        self.limiter.wait().await;
        self.inner.get_own_channel(access_token).await
    }

    async fn list_uploads_page(
        &self,
        access_token: &str,
        playlist_id: &str,
        page_token: Option<&str>,
    ) -> Result<UploadsPage> {
        self.limiter.wait().await;
        self.inner
            .list_uploads_page(access_token, playlist_id, page_token)
            .await
    }

    async fn update_description(
        &self,
        access_token: &str,
        remote_video_id: &str,
        description: &str,
    ) -> Result<()> {
        self.limiter.wait().await;
        self.inner
            .update_description(access_token, remote_video_id, description)
            .await
    }
}
