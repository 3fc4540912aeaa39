//! Minimal raffle catalog: creation, publish/finish, guarded edits.

use sea_orm::ConnectionTrait;
use serde::Deserialize;
use tracing::info;

use crate::adapters::raffles_sea::{RaffleCreate, RaffleUpdate};
use crate::domain::TicketSpace;
use crate::entities::raffles::RaffleStatus;
use crate::error::AppError;
use crate::errors::domain::{ConflictKind, DomainError};
use crate::repos::raffles::{self, Raffle};

#[derive(Debug, Clone, Deserialize)]
pub struct NewRaffle {
    pub title: String,
    pub ticket_count: i32,
    pub price_cents: i64,
    #[serde(default)]
    pub bonus_enabled: bool,
    #[serde(default = "default_multiplier")]
    pub bonus_multiplier: i32,
}

fn default_multiplier() -> i32 {
    1
}

impl NewRaffle {
    pub fn new(title: impl Into<String>, ticket_count: i32, price_cents: i64) -> Self {
        Self {
            title: title.into(),
            ticket_count,
            price_cents,
            bonus_enabled: false,
            bonus_multiplier: 1,
        }
    }

    pub fn with_bonus(mut self, multiplier: i32) -> Self {
        self.bonus_enabled = true;
        self.bonus_multiplier = multiplier;
        self
    }
}

/// Partial raffle edit. Ticket space and price fields lock once live orders exist.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RafflePatch {
    pub title: Option<String>,
    pub ticket_count: Option<i32>,
    pub price_cents: Option<i64>,
    pub bonus_enabled: Option<bool>,
    pub bonus_multiplier: Option<i32>,
}

fn validate_title(title: &str) -> Result<(), DomainError> {
    if title.trim().is_empty() {
        return Err(DomainError::validation_other("Title must not be empty"));
    }
    Ok(())
}

fn validate_price(price_cents: i64) -> Result<(), DomainError> {
    if price_cents < 0 {
        return Err(DomainError::validation_other("Price must not be negative"));
    }
    Ok(())
}

pub async fn create_raffle<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    new: NewRaffle,
) -> Result<Raffle, AppError> {
    validate_title(&new.title)?;
    validate_price(new.price_cents)?;
    TicketSpace::new(new.ticket_count, new.bonus_enabled, new.bonus_multiplier)?;

    let dto = RaffleCreate {
        title: new.title.trim().to_string(),
        ticket_count: new.ticket_count,
        price_cents: new.price_cents,
        bonus_enabled: new.bonus_enabled,
        bonus_multiplier: new.bonus_multiplier,
    };
    let raffle = raffles::create_raffle(conn, dto).await?;
    info!(
        raffle_id = raffle.id,
        ticket_count = raffle.ticket_count,
        bonus_multiplier = raffle.bonus_multiplier,
        "raffle created"
    );
    Ok(raffle)
}

pub async fn get_raffle<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    raffle_id: i64,
) -> Result<Raffle, AppError> {
    Ok(raffles::require_raffle(conn, raffle_id).await?)
}

pub async fn list_raffles<C: ConnectionTrait + Send + Sync>(conn: &C) -> Result<Vec<Raffle>, AppError> {
    Ok(raffles::list_all(conn).await?)
}

async fn move_status<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    raffle_id: i64,
    from: RaffleStatus,
    to: RaffleStatus,
) -> Result<Raffle, AppError> {
    match raffles::set_status(conn, raffle_id, from, to).await? {
        Some(raffle) => {
            info!(raffle_id, ?from, ?to, "raffle status changed");
            Ok(raffle)
        }
        None => {
            let current = raffles::require_raffle(conn, raffle_id).await?;
            Err(DomainError::conflict(
                ConflictKind::InvalidTransition,
                format!(
                    "Raffle {raffle_id} is {:?}; expected {from:?} to move to {to:?}",
                    current.status
                ),
            )
            .into())
        }
    }
}

/// draft -> active
pub async fn publish_raffle<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    raffle_id: i64,
) -> Result<Raffle, AppError> {
    move_status(conn, raffle_id, RaffleStatus::Draft, RaffleStatus::Active).await
}

/// active -> finished
pub async fn finish_raffle<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    raffle_id: i64,
) -> Result<Raffle, AppError> {
    move_status(conn, raffle_id, RaffleStatus::Active, RaffleStatus::Finished).await
}

/// Apply a partial edit.
///
/// Price and ticket-space fields are immutable while any order on the
/// raffle is PENDING or PAID; changing them then fails with `RaffleLocked`.
pub async fn update_raffle<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    raffle_id: i64,
    patch: RafflePatch,
) -> Result<Raffle, AppError> {
    let raffle = raffles::require_raffle(conn, raffle_id).await?;

    let ticket_count = patch.ticket_count.unwrap_or(raffle.ticket_count);
    let price_cents = patch.price_cents.unwrap_or(raffle.price_cents);
    let bonus_enabled = patch.bonus_enabled.unwrap_or(raffle.bonus_enabled);
    let bonus_multiplier = patch.bonus_multiplier.unwrap_or(raffle.bonus_multiplier);

    let locked_change = ticket_count != raffle.ticket_count
        || price_cents != raffle.price_cents
        || bonus_enabled != raffle.bonus_enabled
        || bonus_multiplier != raffle.bonus_multiplier;

    if locked_change {
        let live = raffles::count_live_orders(conn, raffle_id).await?;
        if live > 0 {
            return Err(DomainError::conflict(
                ConflictKind::RaffleLocked,
                format!("Raffle {raffle_id} has {live} live orders; price and ticket space are locked"),
            )
            .into());
        }
        validate_price(price_cents)?;
        TicketSpace::new(ticket_count, bonus_enabled, bonus_multiplier)?;
    }

    let mut dto = RaffleUpdate::new(raffle_id);
    if let Some(title) = patch.title {
        validate_title(&title)?;
        dto = dto.with_title(title.trim());
    }
    if locked_change {
        dto = dto
            .with_ticket_count(ticket_count)
            .with_price_cents(price_cents)
            .with_bonus(bonus_enabled, bonus_multiplier);
    }

    let updated = raffles::update_details(conn, dto).await?;
    info!(raffle_id, locked_change, "raffle updated");
    Ok(updated)
}
