//! Persistence operations for channels, videos, templates, and history.
//!
//! Functions are generic over [`sea_orm::ConnectionTrait`] so they compose
//! inside transactions. Ownership checks (`*_for_user`) report another user's
//! rows as not found.

pub mod channel;
mod errors;
pub mod history;
pub mod template;
pub mod video;

pub use errors::{Result, StoreError};
