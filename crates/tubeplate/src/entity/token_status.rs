//! Credential validity flag for a connected channel.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Whether a channel's stored OAuth credentials can still be used.
///
/// `Invalid` is terminal until the owner reconnects the channel.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum TokenStatus {
    #[sea_orm(string_value = "valid")]
    #[default]
    Valid,
    #[sea_orm(string_value = "invalid")]
    Invalid,
}

impl std::fmt::Display for TokenStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenStatus::Valid => write!(f, "valid"),
            TokenStatus::Invalid => write!(f, "invalid"),
        }
    }
}
