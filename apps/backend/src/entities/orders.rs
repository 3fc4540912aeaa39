use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "PAID")]
    Paid,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
    #[sea_orm(string_value = "EXPIRED")]
    Expired,
    #[sea_orm(string_value = "RELEASED")]
    Released,
}

impl OrderStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Paid => "PAID",
            Self::Cancelled => "CANCELLED",
            Self::Expired => "EXPIRED",
            Self::Released => "RELEASED",
        }
    }

    /// Statuses whose orders hold their ticket numbers and count toward `sold`
    pub const LIVE: [OrderStatus; 2] = [OrderStatus::Pending, OrderStatus::Paid];

    pub fn is_live(&self) -> bool {
        matches!(self, Self::Pending | Self::Paid)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub folio: String,
    #[sea_orm(column_name = "raffle_id")]
    pub raffle_id: i64,
    #[sea_orm(column_name = "customer_id")]
    pub customer_id: i64,
    /// JSON array of every number held by the order, base and bonus
    #[sea_orm(column_name = "ticket_numbers", column_type = "Json")]
    pub ticket_numbers: Json,
    /// Purchased (base) numbers; the amount this order contributes to `sold`
    #[sea_orm(column_name = "base_ticket_count")]
    pub base_ticket_count: i32,
    #[sea_orm(column_name = "total_cents")]
    pub total_cents: i64,
    pub status: OrderStatus,
    #[sea_orm(column_name = "payment_method")]
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    #[sea_orm(column_name = "created_at")]
    pub created_at: OffsetDateTime,
    #[sea_orm(column_name = "expires_at")]
    pub expires_at: OffsetDateTime,
    #[sea_orm(column_name = "updated_at")]
    pub updated_at: OffsetDateTime,
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
        belongs_to = "super::customers::Entity",
        from = "Column::CustomerId",
        to = "super::customers::Column::Id"
    )]
    Customer,
    #[sea_orm(has_many = "super::ticket_claims::Entity")]
    TicketClaims,
}

impl Related<super::raffles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Raffle.def()
    }
}

impl Related<super::customers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl Related<super::ticket_claims::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TicketClaims.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
