//! Templates, containers, and chain resolution.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::entity::container::{
    self, ActiveModel as ContainerActiveModel, Entity as Container, encode_template_order,
};
use crate::entity::template::{self, ActiveModel as TemplateActiveModel, Entity as Template};

use super::errors::{Result, StoreError};

pub async fn create_template<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    name: &str,
    content: &str,
) -> Result<template::Model> {
    let now = Utc::now().fixed_offset();
    let model = TemplateActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        name: Set(name.to_string()),
        content: Set(content.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(model.insert(db).await?)
}

pub async fn update_template_content<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
    user_id: Uuid,
    content: &str,
) -> Result<template::Model> {
    let existing = Template::find_by_id(id)
        .filter(template::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| StoreError::not_found("template", id))?;
    let mut model: TemplateActiveModel = existing.into();
    model.content = Set(content.to_string());
    model.updated_at = Set(Utc::now().fixed_offset());
    Ok(model.update(db).await?)
}

pub async fn delete_template<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64> {
    Ok(Template::delete_by_id(id).exec(db).await?.rows_affected)
}

pub async fn create_container<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    name: &str,
    template_ids: &[Uuid],
    separator: &str,
) -> Result<container::Model> {
    let now = Utc::now().fixed_offset();
    let model = ContainerActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        name: Set(name.to_string()),
        template_order: Set(encode_template_order(template_ids)),
        separator: Set(separator.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(model.insert(db).await?)
}

/// Delete a container. Videos assigned to it become unassigned.
pub async fn delete_container<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64> {
    Ok(Container::delete_by_id(id).exec(db).await?.rows_affected)
}

pub async fn find_container<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<container::Model>> {
    Ok(Container::find_by_id(id).one(db).await?)
}

pub async fn find_container_for_user<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
    user_id: Uuid,
) -> Result<container::Model> {
    Container::find_by_id(id)
        .filter(container::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| StoreError::not_found("container", id))
}

pub async fn find_template_for_user<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
    user_id: Uuid,
) -> Result<template::Model> {
    Template::find_by_id(id)
        .filter(template::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| StoreError::not_found("template", id))
}

/// Containers owned by `user_id` whose order includes `template_id`.
pub async fn containers_using_template<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    template_id: Uuid,
) -> Result<Vec<container::Model>> {
    let containers = Container::find()
        .filter(container::Column::UserId.eq(user_id))
        .all(db)
        .await?;
    Ok(containers
        .into_iter()
        .filter(|c| c.template_ids().contains(&template_id))
        .collect())
}

/// Resolve a container's template chain in container order.
///
/// Ids that no longer exist, or that belong to a different user than the
/// container, are skipped. A template listed twice appears twice.
pub async fn resolve_chain<C: ConnectionTrait>(
    db: &C,
    container: &container::Model,
) -> Result<Vec<template::Model>> {
    let ids = container.template_ids();
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let found: HashMap<Uuid, template::Model> = Template::find()
        .filter(template::Column::Id.is_in(ids.clone()))
        .filter(template::Column::UserId.eq(container.user_id))
        .all(db)
        .await?
        .into_iter()
        .map(|t| (t.id, t))
        .collect();

    Ok(ids.iter().filter_map(|id| found.get(id).cloned()).collect())
}
