//! YouTube Data API v3 client.
//!
//! Implements [`crate::platform::VideoPlatform`] over the crate's
//! [`crate::http::HttpTransport`] boundary:
//!
//! | Operation | Endpoint |
//! |-----------|----------|
//! | own channel | `GET channels?part=snippet,statistics,contentDetails&mine=true` |
//! | uploads page | `GET playlistItems?part=snippet,contentDetails&maxResults=50` |
//! | update | `GET videos?part=snippet`, then `PUT videos?part=snippet` |

mod client;
mod error;
mod types;

pub use client::{DEFAULT_API_BASE, YouTubeClient};
pub use error::{YouTubeError, short_error_message};
