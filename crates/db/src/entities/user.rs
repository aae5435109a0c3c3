//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Mood color every account starts with.
pub const DEFAULT_MOOD_COLOR: &str = "#FFFFFF";

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Login email, stored lower-cased
    #[sea_orm(unique)]
    pub email: String,

    /// Display name
    pub name: String,

    /// Argon2 password hash
    #[serde(skip_serializing)]
    pub password: String,

    /// Access token
    #[sea_orm(unique, nullable)]
    #[serde(skip_serializing)]
    pub token: Option<String>,

    /// Running blended mood color (`#RRGGBB`)
    pub emotion_color: String,

    /// Monthly emotion tally: `[{year, month, emotions: {label: count}}]`
    #[sea_orm(column_type = "JsonBinary")]
    pub emotion_counts: Json,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
