//! Video rows and their per-template variables.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::compose::VariableBindings;
use crate::entity::channel::{self, Entity as Channel};
use crate::entity::video::{ActiveModel, Column, Entity as Video, Model};
use crate::entity::video_variable::{
    self, ActiveModel as VariableActiveModel, Entity as VideoVariable,
};
use crate::platform::RemoteVideo;

use super::errors::{Result, StoreError};
use super::template;

pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Model>> {
    Ok(Video::find_by_id(id).one(db).await?)
}

/// Load a video together with its channel, if the channel belongs to `user_id`.
pub async fn find_for_user<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
    user_id: Uuid,
) -> Result<(Model, channel::Model)> {
    match Video::find_by_id(id).find_also_related(Channel).one(db).await? {
        Some((video, Some(channel))) if channel.user_id == user_id => Ok((video, channel)),
        _ => Err(StoreError::not_found("video", id)),
    }
}

pub async fn list_for_channel<C: ConnectionTrait>(db: &C, channel_id: Uuid) -> Result<Vec<Model>> {
    Ok(Video::find()
        .filter(Column::ChannelId.eq(channel_id))
        .order_by_asc(Column::RemoteVideoId)
        .all(db)
        .await?)
}

/// Insert a video discovered on the platform.
///
/// `current_description` is set to the platform's description (or empty);
/// the caller seeds the matching history row in the same transaction.
pub async fn insert_discovered<C: ConnectionTrait>(
    db: &C,
    channel_id: Uuid,
    remote: &RemoteVideo,
) -> Result<Model> {
    let now = Utc::now().fixed_offset();
    let model = ActiveModel {
        id: Set(Uuid::new_v4()),
        channel_id: Set(channel_id),
        container_id: Set(None),
        remote_video_id: Set(remote.remote_video_id.clone()),
        title: Set(remote.title.clone()),
        current_description: Set(Some(remote.description.clone().unwrap_or_default())),
        published_at: Set(remote.published_at.map(|t| t.fixed_offset())),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(model.insert(db).await?)
}

/// Overwrite the catalog-owned fields. The cached description is not touched.
pub async fn update_catalog_fields<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
    title: &str,
    published_at: Option<DateTime<Utc>>,
) -> Result<()> {
    Video::update_many()
        .col_expr(Column::Title, Expr::value(title))
        .col_expr(
            Column::PublishedAt,
            Expr::value(published_at.map(|t| t.fixed_offset())),
        )
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now().fixed_offset()))
        .filter(Column::Id.eq(id))
        .exec(db)
        .await?;
    Ok(())
}

/// Delete videos by id. Variables and history cascade.
pub async fn delete_many<C: ConnectionTrait>(db: &C, ids: &[Uuid]) -> Result<u64> {
    if ids.is_empty() {
        return Ok(0);
    }
    let result = Video::delete_many()
        .filter(Column::Id.is_in(ids.iter().copied()))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Assign (or clear) a video's container.
pub async fn set_container<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
    container_id: Option<Uuid>,
) -> Result<()> {
    let result = Video::update_many()
        .col_expr(Column::ContainerId, Expr::value(container_id))
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now().fixed_offset()))
        .filter(Column::Id.eq(id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(StoreError::not_found("video", id));
    }
    Ok(())
}

/// Videos assigned to `container_id`.
pub async fn ids_using_container<C: ConnectionTrait>(db: &C, container_id: Uuid) -> Result<Vec<Uuid>> {
    Ok(Video::find()
        .select_only()
        .column(Column::Id)
        .filter(Column::ContainerId.eq(container_id))
        .into_tuple::<Uuid>()
        .all(db)
        .await?)
}

/// Videos whose container includes `template_id`, across `user_id`'s containers.
pub async fn ids_using_template<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    template_id: Uuid,
) -> Result<Vec<Uuid>> {
    let container_ids: Vec<Uuid> = template::containers_using_template(db, user_id, template_id)
        .await?
        .into_iter()
        .map(|c| c.id)
        .collect();
    if container_ids.is_empty() {
        return Ok(Vec::new());
    }
    Ok(Video::find()
        .select_only()
        .column(Column::Id)
        .filter(Column::ContainerId.is_in(container_ids))
        .into_tuple::<Uuid>()
        .all(db)
        .await?)
}

// ─── Variables ───────────────────────────────────────────────────────────────

pub async fn variables_for_video<C: ConnectionTrait>(
    db: &C,
    video_id: Uuid,
) -> Result<Vec<video_variable::Model>> {
    Ok(VideoVariable::find()
        .filter(video_variable::Column::VideoId.eq(video_id))
        .all(db)
        .await?)
}

/// Load a video's variables as template-scoped bindings.
pub async fn bindings_for_video<C: ConnectionTrait>(db: &C, video_id: Uuid) -> Result<VariableBindings> {
    let mut bindings = VariableBindings::new();
    for var in variables_for_video(db, video_id).await? {
        bindings.bind(var.template_id, var.name, var.value);
    }
    Ok(bindings)
}

/// Set the value of one placeholder for one template on one video.
pub async fn set_variable<C: ConnectionTrait>(
    db: &C,
    video_id: Uuid,
    template_id: Uuid,
    name: &str,
    value: &str,
) -> Result<video_variable::Model> {
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(StoreError::invalid_input(format!(
            "invalid variable name {name:?}"
        )));
    }

    let existing = VideoVariable::find()
        .filter(video_variable::Column::VideoId.eq(video_id))
        .filter(video_variable::Column::TemplateId.eq(template_id))
        .filter(video_variable::Column::Name.eq(name))
        .one(db)
        .await?;

    match existing {
        Some(existing) => {
            let mut model: VariableActiveModel = existing.into();
            model.value = Set(value.to_string());
            Ok(model.update(db).await?)
        }
        None => {
            let model = VariableActiveModel {
                id: Set(Uuid::new_v4()),
                video_id: Set(video_id),
                template_id: Set(template_id),
                name: Set(name.to_string()),
                value: Set(value.to_string()),
            };
            Ok(model.insert(db).await?)
        }
    }
}
