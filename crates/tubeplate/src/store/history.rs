//! Append-only description history.
//!
//! A video's `current_description` always equals its highest history
//! version. [`record_description`] writes both in one transaction.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::entity::description_history::{ActiveModel, Column, Entity as History, Model};
use crate::entity::video;

use super::errors::{Result, StoreError};

/// Actor recorded for versions seeded by catalog reconciliation.
pub const SYNC_ACTOR: &str = "sync";

/// The version number the next snapshot of `video_id` would get.
pub async fn next_version<C: ConnectionTrait>(db: &C, video_id: Uuid) -> Result<i32> {
    let max: Option<Option<i32>> = History::find()
        .select_only()
        .column_as(Column::Version.max(), "max_version")
        .filter(Column::VideoId.eq(video_id))
        .into_tuple::<Option<i32>>()
        .one(db)
        .await?;
    Ok(max.flatten().unwrap_or(0) + 1)
}

/// Insert the next history row without touching the video.
///
/// Callers that also change `current_description` must do both inside the
/// same transaction.
pub async fn append_version<C: ConnectionTrait>(
    db: &C,
    video_id: Uuid,
    description: &str,
    actor: &str,
) -> Result<Model> {
    let version = next_version(db, video_id).await?;
    let model = ActiveModel {
        id: Set(Uuid::new_v4()),
        video_id: Set(video_id),
        version: Set(version),
        description: Set(description.to_string()),
        actor: Set(actor.to_string()),
        created_at: Set(Utc::now().fixed_offset()),
    };
    Ok(model.insert(db).await?)
}

/// Append a version and make it the video's current description.
pub async fn record_description<C: TransactionTrait>(
    db: &C,
    video_id: Uuid,
    description: &str,
    actor: &str,
) -> Result<Model> {
    let txn = db.begin().await?;

    let result = video::Entity::update_many()
        .col_expr(
            video::Column::CurrentDescription,
            Expr::value(Some(description.to_string())),
        )
        .col_expr(video::Column::UpdatedAt, Expr::value(Utc::now().fixed_offset()))
        .filter(video::Column::Id.eq(video_id))
        .exec(&txn)
        .await?;
    if result.rows_affected == 0 {
        txn.rollback().await?;
        return Err(StoreError::not_found("video", video_id));
    }

    let row = append_version(&txn, video_id, description, actor).await?;
    txn.commit().await?;
    Ok(row)
}

/// Every version of a video, oldest first.
pub async fn list_for_video<C: ConnectionTrait>(db: &C, video_id: Uuid) -> Result<Vec<Model>> {
    Ok(History::find()
        .filter(Column::VideoId.eq(video_id))
        .order_by_asc(Column::Version)
        .all(db)
        .await?)
}

pub async fn latest<C: ConnectionTrait>(db: &C, video_id: Uuid) -> Result<Option<Model>> {
    Ok(History::find()
        .filter(Column::VideoId.eq(video_id))
        .order_by_desc(Column::Version)
        .one(db)
        .await?)
}

/// Look up a specific version, e.g. to restore it.
pub async fn find_version<C: ConnectionTrait>(
    db: &C,
    video_id: Uuid,
    version: i32,
) -> Result<Model> {
    History::find()
        .filter(Column::VideoId.eq(video_id))
        .filter(Column::Version.eq(version))
        .one(db)
        .await?
        .ok_or_else(|| StoreError::NotFound {
            context: format!("version {version} of video {video_id}"),
        })
}
