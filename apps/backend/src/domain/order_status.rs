//! Order status state machine.
//!
//! | From    | Event                     | To                           | Frees tickets |
//! |---------|---------------------------|------------------------------|---------------|
//! | PENDING | mark_paid                 | PAID                         | no            |
//! | PENDING | mark_pending              | PENDING (no-op)              | no            |
//! | PENDING | cancel / expire / release | CANCELLED / EXPIRED / RELEASED | yes         |
//! | PAID    | cancel / release          | CANCELLED / RELEASED         | yes           |
//!
//! Everything else, including any event on a terminal status, is an
//! `InvalidTransition`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entities::orders::OrderStatus;
use crate::errors::domain::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderEvent {
    MarkPaid,
    MarkPending,
    Cancel,
    Expire,
    Release,
}

impl fmt::Display for OrderEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::MarkPaid => "mark_paid",
            Self::MarkPending => "mark_pending",
            Self::Cancel => "cancel",
            Self::Expire => "expire",
            Self::Release => "release",
        };
        f.write_str(s)
    }
}

/// Outcome of applying an event to a status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: OrderStatus,
    pub to: OrderStatus,
    /// The order stops holding its numbers: claims are dropped and its base
    /// count leaves `sold`
    pub frees_tickets: bool,
}

impl Transition {
    pub fn is_noop(&self) -> bool {
        self.from == self.to
    }
}

pub fn apply(from: OrderStatus, event: OrderEvent) -> Result<Transition, DomainError> {
    use OrderEvent as E;
    use OrderStatus as S;

    let (to, frees_tickets) = match (from, event) {
        (S::Pending, E::MarkPaid) => (S::Paid, false),
        (S::Pending, E::MarkPending) => (S::Pending, false),
        (S::Pending, E::Cancel) | (S::Paid, E::Cancel) => (S::Cancelled, true),
        (S::Pending, E::Expire) => (S::Expired, true),
        (S::Pending, E::Release) | (S::Paid, E::Release) => (S::Released, true),
        _ => return Err(DomainError::invalid_transition(from, event)),
    };

    Ok(Transition {
        from,
        to,
        frees_tickets,
    })
}
