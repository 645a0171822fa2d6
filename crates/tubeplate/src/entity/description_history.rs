//! DescriptionHistory entity - append-only description snapshots.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One immutable snapshot per `(video_id, version)`.
///
/// Versions start at 1 and are contiguous per video. Rows are never updated;
/// they disappear only when their video is deleted.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "description_history")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub video_id: Uuid,
    pub version: i32,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    /// Who caused this version (a user id, or `sync` for seeded rows).
    pub actor: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::video::Entity",
        from = "Column::VideoId",
        to = "super::video::Column::Id",
        on_delete = "Cascade"
    )]
    Video,
}

impl Related<super::video::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Video.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
