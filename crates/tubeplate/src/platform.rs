//! Platform-agnostic trait for video hosting clients.
//!
//! The sync pipeline talks to the remote catalog only through
//! [`VideoPlatform`]; [`crate::youtube::YouTubeClient`] is the production
//! implementation and tests substitute in-memory fakes.

mod errors;
mod rate_limit;
mod types;

pub use errors::{PlatformError, Result, short_error_message};
pub use rate_limit::{ApiRateLimiter, RateLimitedPlatform, YOUTUBE_DEFAULT_RPS};
pub use types::{
    RemoteChannel, RemoteVideo, UPLOADS_PAGE_SIZE, UploadsPage, VideoPlatform,
    uploads_playlist_for_channel,
};
