//! Container entity - an ordered chain of templates plus a separator.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Container model - the unit assigned to a video.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "containers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    /// Template UUIDs in composition order (stored as a JSON array of strings).
    ///
    /// Entries may reference templates that no longer exist; those are skipped
    /// when the chain is resolved.
    #[sea_orm(column_type = "Json")]
    pub template_order: serde_json::Value,
    /// Inserted between consecutive composed fragments.
    #[sea_orm(column_type = "Text")]
    pub separator: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::video::Entity")]
    Video,
}

impl Related<super::video::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Video.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Parse `template_order` into template ids.
    ///
    /// Entries that are not valid UUID strings are dropped, matching the
    /// "dangling references are tolerated" rule for missing templates.
    pub fn template_ids(&self) -> Vec<Uuid> {
        self.template_order
            .as_array()
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|v| v.as_str())
                    .filter_map(|s| Uuid::parse_str(s).ok())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Encode template ids as the JSON array stored in `template_order`.
pub fn encode_template_order(ids: &[Uuid]) -> serde_json::Value {
    serde_json::Value::Array(
        ids.iter()
            .map(|id| serde_json::Value::String(id.to_string()))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn container(order: serde_json::Value) -> Model {
        let now = Utc::now().fixed_offset();
        Model {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "default".to_string(),
            template_order: order,
            separator: "\n\n".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn template_ids_round_trip_through_encoding() {
        let ids = vec![Uuid::new_v4(), Uuid::new_v4()];
        let model = container(encode_template_order(&ids));
        assert_eq!(model.template_ids(), ids);
    }

    #[test]
    fn template_ids_skip_malformed_entries() {
        let good = Uuid::new_v4();
        let model = container(serde_json::json!(["not-a-uuid", 42, good.to_string(), null]));
        assert_eq!(model.template_ids(), vec![good]);
    }

    #[test]
    fn template_ids_of_non_array_is_empty() {
        let model = container(serde_json::json!({"oops": true}));
        assert!(model.template_ids().is_empty());
    }
}
