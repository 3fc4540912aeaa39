//! DTOs for raffles_sea adapter.

use crate::entities::raffles::RaffleStatus;

/// DTO for creating a new raffle (always starts as `draft`).
#[derive(Debug, Clone)]
pub struct RaffleCreate {
    pub title: String,
    pub ticket_count: i32,
    pub price_cents: i64,
    pub bonus_enabled: bool,
    pub bonus_multiplier: i32,
}

impl RaffleCreate {
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

/// DTO for editing raffle details. `None` leaves a column unchanged.
#[derive(Debug, Clone, Default)]
pub struct RaffleUpdate {
    pub id: i64,
    pub title: Option<String>,
    pub ticket_count: Option<i32>,
    pub price_cents: Option<i64>,
    pub bonus_enabled: Option<bool>,
    pub bonus_multiplier: Option<i32>,
}

impl RaffleUpdate {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_ticket_count(mut self, ticket_count: i32) -> Self {
        self.ticket_count = Some(ticket_count);
        self
    }

    pub fn with_price_cents(mut self, price_cents: i64) -> Self {
        self.price_cents = Some(price_cents);
        self
    }

    pub fn with_bonus(mut self, enabled: bool, multiplier: i32) -> Self {
        self.bonus_enabled = Some(enabled);
        self.bonus_multiplier = Some(multiplier);
        self
    }
}

/// Guarded status change: applies only while the row is still in `from`.
#[derive(Debug, Clone, Copy)]
pub struct RaffleSetStatus {
    pub id: i64,
    pub from: RaffleStatus,
    pub to: RaffleStatus,
}
