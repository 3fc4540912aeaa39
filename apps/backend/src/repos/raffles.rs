//! Raffle repository functions for domain layer.

use sea_orm::ConnectionTrait;
use serde::Serialize;

use crate::adapters::raffles_sea as raffles_adapter;
use crate::domain::TicketSpace;
use crate::entities::raffles::{self, RaffleStatus};
use crate::errors::domain::DomainError;

/// Raffle domain model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Raffle {
    pub id: i64,
    pub title: String,
    pub ticket_count: i32,
    pub price_cents: i64,
    /// Purchased base tickets held by live orders
    pub sold: i32,
    pub bonus_enabled: bool,
    pub bonus_multiplier: i32,
    pub status: RaffleStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: time::OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: time::OffsetDateTime,
}

impl Raffle {
    pub fn space(&self) -> TicketSpace {
        TicketSpace::from_stored(self.ticket_count, self.bonus_enabled, self.bonus_multiplier)
    }

    pub fn available(&self) -> i32 {
        self.ticket_count - self.sold
    }
}

impl From<raffles::Model> for Raffle {
    fn from(model: raffles::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            ticket_count: model.ticket_count,
            price_cents: model.price_cents,
            sold: model.sold,
            bonus_enabled: model.bonus_enabled,
            bonus_multiplier: model.bonus_multiplier,
            status: model.status,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

pub async fn find_by_id<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    raffle_id: i64,
) -> Result<Option<Raffle>, DomainError> {
    let raffle = raffles_adapter::find_by_id(conn, raffle_id).await?;
    Ok(raffle.map(Raffle::from))
}

/// Find raffle by ID or fail with `NotFound(Raffle)`.
pub async fn require_raffle<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    raffle_id: i64,
) -> Result<Raffle, DomainError> {
    let raffle = raffles_adapter::require_raffle(conn, raffle_id).await?;
    Ok(Raffle::from(raffle))
}

pub async fn list_all<C: ConnectionTrait + Send + Sync>(conn: &C) -> Result<Vec<Raffle>, DomainError> {
    let raffles = raffles_adapter::list_all(conn).await?;
    Ok(raffles.into_iter().map(Raffle::from).collect())
}

pub async fn create_raffle<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: raffles_adapter::RaffleCreate,
) -> Result<Raffle, DomainError> {
    let raffle = raffles_adapter::create_raffle(conn, dto).await?;
    Ok(Raffle::from(raffle))
}

/// Guarded status move; `None` when the raffle was not in `from`.
pub async fn set_status<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    raffle_id: i64,
    from: RaffleStatus,
    to: RaffleStatus,
) -> Result<Option<Raffle>, DomainError> {
    let dto = raffles_adapter::RaffleSetStatus {
        id: raffle_id,
        from,
        to,
    };
    let raffle = raffles_adapter::set_status(conn, dto).await?;
    Ok(raffle.map(Raffle::from))
}

pub async fn update_details<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: raffles_adapter::RaffleUpdate,
) -> Result<Raffle, DomainError> {
    let raffle = raffles_adapter::update_details(conn, dto).await?;
    Ok(Raffle::from(raffle))
}

/// Atomically move `sold` by `delta` within the raffle's bounds.
pub async fn adjust_sold<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    raffle_id: i64,
    delta: i32,
) -> Result<Raffle, DomainError> {
    let raffle = raffles_adapter::adjust_sold(conn, raffle_id, delta).await?;
    Ok(Raffle::from(raffle))
}

pub async fn count_live_orders<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    raffle_id: i64,
) -> Result<u64, DomainError> {
    Ok(raffles_adapter::count_live_orders(conn, raffle_id).await?)
}

pub async fn live_base_total<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    raffle_id: i64,
) -> Result<i64, DomainError> {
    Ok(raffles_adapter::live_base_total(conn, raffle_id).await?)
}
