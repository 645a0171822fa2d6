//! Common re-exports for convenient entity usage.

pub use super::channel::{
    ActiveModel as ChannelActiveModel, Column as ChannelColumn, Entity as Channel,
    Model as ChannelModel,
};
pub use super::container::{
    ActiveModel as ContainerActiveModel, Column as ContainerColumn, Entity as Container,
    Model as ContainerModel,
};
pub use super::description_history::{
    ActiveModel as DescriptionHistoryActiveModel, Column as DescriptionHistoryColumn,
    Entity as DescriptionHistory, Model as DescriptionHistoryModel,
};
pub use super::sync_status::SyncStatus;
pub use super::template::{
    ActiveModel as TemplateActiveModel, Column as TemplateColumn, Entity as Template,
    Model as TemplateModel,
};
pub use super::token_status::TokenStatus;
pub use super::video::{
    ActiveModel as VideoActiveModel, Column as VideoColumn, Entity as Video, Model as VideoModel,
};
pub use super::video_variable::{
    ActiveModel as VideoVariableActiveModel, Column as VideoVariableColumn,
    Entity as VideoVariable, Model as VideoVariableModel,
};
