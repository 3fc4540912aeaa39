use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "contact_channels")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub phone: String,
    #[sea_orm(column_name = "display_name")]
    pub display_name: String,
    pub active: bool,
    pub role: String,
    /// JSON array of raffle ids; empty means every raffle
    #[sea_orm(column_name = "assigned_raffle_ids", column_type = "Json")]
    pub assigned_raffle_ids: Json,
    /// Order within the configured list, stable across rotations
    pub position: i32,
    #[sea_orm(column_name = "created_at")]
    pub created_at: OffsetDateTime,
    #[sea_orm(column_name = "updated_at")]
    pub updated_at: OffsetDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
