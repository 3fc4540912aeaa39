//! One row per ticket number held by a live order.
//!
//! The composite primary key `(raffle_id, ticket_number)` makes a number
//! claimable by at most one order at a time.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ticket_claims")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_name = "raffle_id")]
    pub raffle_id: i64,
    #[sea_orm(primary_key, auto_increment = false, column_name = "ticket_number")]
    pub ticket_number: i32,
    #[sea_orm(column_name = "order_id")]
    pub order_id: i64,
    #[sea_orm(column_name = "created_at")]
    pub created_at: OffsetDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::raffles::Entity",
        from = "Column::RaffleId",
        to = "super::raffles::Column::Id"
    )]
    Raffle,
    #[sea_orm(
        belongs_to = "super::orders::Entity",
        from = "Column::OrderId",
        to = "super::orders::Column::Id"
    )]
    Order,
}

impl Related<super::raffles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Raffle.def()
    }
}

impl Related<super::orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
