//! Video entity - a remote upload mirrored locally.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Video model.
///
/// Rows are created, updated, and deleted only by catalog reconciliation.
/// `current_description` is written only after the remote API confirmed an
/// update (or when reconciliation seeds history version 1).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "videos")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub channel_id: Uuid,
    /// Assigned container, if any. Videos without one are never pushed.
    pub container_id: Option<Uuid>,
    /// Remote video identifier (11-character YouTube id).
    pub remote_video_id: String,
    pub title: String,
    /// Last description known to be live on the remote side.
    #[sea_orm(column_type = "Text", nullable)]
    pub current_description: Option<String>,
    pub published_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::channel::Entity",
        from = "Column::ChannelId",
        to = "super::channel::Column::Id",
        on_delete = "Cascade"
    )]
    Channel,
    #[sea_orm(
        belongs_to = "super::container::Entity",
        from = "Column::ContainerId",
        to = "super::container::Column::Id",
        on_delete = "SetNull"
    )]
    Container,
    #[sea_orm(has_many = "super::video_variable::Entity")]
    VideoVariable,
    #[sea_orm(has_many = "super::description_history::Entity")]
    DescriptionHistory,
}

impl Related<super::channel::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Channel.def()
    }
}

impl Related<super::container::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Container.def()
    }
}

impl Related<super::video_variable::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VideoVariable.def()
    }
}

impl Related<super::description_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DescriptionHistory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Public watch URL for the video.
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.remote_video_id)
    }
}
