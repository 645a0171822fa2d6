//! The sync pipeline: catalog reconciliation and description dispatch.
//!
//! # Module Structure
//!
//! - [`SyncContext`] bundles storage, credentials, and the remote platform.
//! - Reconciliation mirrors a channel's uploads locally under a sync lease.
//! - Dispatch recomposes descriptions and pushes the changed ones.
//!
//! # Example
//!
//! ```ignore
//! use tubeplate::sync::{SyncContext, SyncOptions};
//!
//! let ctx = SyncContext::new(db, credentials, platform).with_options(SyncOptions::default());
//! let reconciled = ctx.reconcile_channel(channel_id, user_id).await?;
//! let dispatched = ctx.update_descriptions(&video_ids, user_id).await?;
//! println!("{} inserted, {} pushed", reconciled.inserted, dispatched.updated);
//! ```

mod context;
mod dispatch;
mod progress;
mod reconcile;
mod types;

pub use context::SyncContext;
pub use dispatch::compose_for_video;
pub use progress::{ProgressCallback, SkipReason, SyncProgress, emit};
pub use types::{
    DEFAULT_BATCH_SIZE, DEFAULT_CONCURRENCY, DEFAULT_LEASE_SECS, DispatchResult, ReconcileResult,
    SyncOptions,
};
