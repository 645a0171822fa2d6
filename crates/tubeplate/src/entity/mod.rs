//! SeaORM entity definitions for the tubeplate database schema.

pub mod channel;
pub mod container;
pub mod description_history;
pub mod prelude;
pub mod sync_status;
pub mod template;
pub mod token_status;
pub mod video;
pub mod video_variable;
