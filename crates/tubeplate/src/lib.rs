//! tubeplate - template-composed YouTube descriptions.
//!
//! Descriptions are built from an ordered chain of reusable templates with
//! per-video `{{placeholder}}` values, pushed to YouTube, and versioned
//! locally. A catalog reconciler keeps the local video list in step with each
//! connected channel's uploads.
//!
//! # Features
//!
//! - `sqlite` / `postgres` - database backends.
//! - `migrate` - Enables database migration support. When enabled, you can use
//!   [`connect_and_migrate`] to automatically run migrations on connection.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tubeplate::{
//!     AesGcmCipher, CredentialManager, GoogleOAuthClient, Job, JobRunner, RateLimitedPlatform,
//!     SyncContext, YouTubeClient, connect_and_migrate,
//! };
//!
//! let db = connect_and_migrate("sqlite://tubeplate.db?mode=rwc").await?;
//! let cipher = Arc::new(AesGcmCipher::from_base64_key(&key)?);
//! let oauth = Arc::new(GoogleOAuthClient::new(client_id, client_secret, None)?);
//! let credentials = CredentialManager::new(db.clone(), cipher, oauth);
//! let platform = RateLimitedPlatform::new(YouTubeClient::new(None)?, 10);
//!
//! let runner = JobRunner::new(SyncContext::new(db, credentials, platform));
//! runner.run(Job::SyncChannel { channel_id, user_id }).await?;
//! ```

pub mod compose;
pub mod credentials;
pub mod crypto;
pub mod db;
pub mod entity;
pub mod error;
pub mod http;
pub mod jobs;
pub mod oauth;
pub mod platform;
pub mod retry;
pub mod store;
pub mod sync;
pub mod youtube;

#[cfg(feature = "migrate")]
pub mod migration;

pub use compose::{VariableBindings, build_description, extract_variables};
pub use credentials::CredentialManager;
pub use crypto::{AesGcmCipher, TokenCipher};
pub use db::connect;
#[cfg(feature = "migrate")]
pub use db::connect_and_migrate;
pub use entity::prelude::*;
pub use error::{Error, Result};
pub use jobs::{Job, JobOutcome, JobRunner};
pub use oauth::{GoogleOAuthClient, TokenRefresher};
pub use platform::{ApiRateLimiter, PlatformError, RateLimitedPlatform, VideoPlatform};
pub use sync::{DispatchResult, ReconcileResult, SyncContext, SyncOptions};
pub use youtube::YouTubeClient;
