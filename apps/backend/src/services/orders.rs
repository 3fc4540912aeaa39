//! Order lifecycle: reservation, status transitions, edits, deletion and expiry.
//!
//! Every operation here is meant to run inside one transaction. The claim
//! rows, the order row and the raffle's `sold` counter move together, so a
//! failure at any step rolls all of them back.

use std::collections::HashSet;

use sea_orm::ConnectionTrait;
use serde::Deserialize;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use super::customers::require_customer;
use super::Engine;
use crate::adapters::orders_sea::{OrderCreate, OrderUpdate};
use crate::domain::folio::generate_folio;
use crate::domain::order_status::{self, OrderEvent};
use crate::domain::{BonusDraw, TicketSpace};
use crate::entities::orders::OrderStatus;
use crate::entities::raffles::RaffleStatus;
use crate::error::AppError;
use crate::errors::domain::{ConflictKind, DomainError, NotFoundKind};
use crate::repos::claims;
use crate::repos::orders::{self, Order};
use crate::repos::raffles::{self, Raffle};

const FOLIO_ATTEMPTS: u32 = 5;
const BONUS_REDRAW_ROUNDS: u32 = 3;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrder {
    pub raffle_id: i64,
    pub customer_id: i64,
    pub tickets: Vec<i32>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
}

impl CreateOrder {
    pub fn new(raffle_id: i64, customer_id: i64, tickets: Vec<i32>) -> Self {
        Self {
            raffle_id,
            customer_id,
            tickets,
            payment_method: None,
            notes: None,
        }
    }
}

/// Partial order edit. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderPatch {
    pub ticket_numbers: Option<Vec<i32>>,
    pub customer_id: Option<i64>,
    pub total_cents: Option<i64>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
}

pub(crate) fn total_for(raffle: &Raffle, base_count: i32) -> Result<i64, DomainError> {
    raffle
        .price_cents
        .checked_mul(i64::from(base_count))
        .ok_or_else(|| DomainError::validation_other("Order total overflows"))
}

/// Insert the order row, regenerating the folio on collision.
pub(crate) async fn insert_with_folio<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    mut dto: OrderCreate,
) -> Result<Order, DomainError> {
    for attempt in 1..=FOLIO_ATTEMPTS {
        dto.folio = generate_folio();
        if let Some(order) = orders::create_order(conn, dto.clone()).await? {
            return Ok(order);
        }
        warn!(attempt, raffle_id = dto.raffle_id, "folio collision, regenerating");
    }
    Err(DomainError::conflict(
        ConflictKind::FolioConflict,
        "Could not allocate a unique folio",
    ))
}

/// Claim every drawn number for `order_id`.
///
/// A purchased number lost to a concurrent order fails the whole reservation
/// with `TicketsAlreadyTaken`. Lost bonus numbers are interchangeable and are
/// redrawn against fresh occupancy for a bounded number of rounds.
async fn reserve<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    engine: &Engine,
    space: &TicketSpace,
    raffle_id: i64,
    order_id: i64,
    draw: &BonusDraw,
) -> Result<Vec<i32>, DomainError> {
    let outcome = claims::claim_numbers(conn, raffle_id, order_id, &draw.all()).await?;
    if outcome.is_complete() {
        return Ok(outcome.claimed);
    }

    let lost_base: Vec<i32> = outcome
        .lost
        .iter()
        .copied()
        .filter(|n| space.is_base(*n))
        .collect();
    if !lost_base.is_empty() {
        return Err(DomainError::tickets_taken(lost_base));
    }

    let mut held = outcome.claimed;
    let mut missing = outcome.lost.len();
    for round in 1..=BONUS_REDRAW_ROUNDS {
        debug!(raffle_id, order_id, round, missing, "redrawing contested bonus numbers");
        let occupied: HashSet<i32> =
            claims::occupied_numbers(conn, raffle_id, Some(space.bonus_range()))
                .await?
                .into_iter()
                .collect();
        let fresh = engine.bonus_allocator().redraw(space, missing, &occupied)?;
        let outcome = claims::claim_numbers(conn, raffle_id, order_id, &fresh).await?;
        held.extend(outcome.claimed);
        missing = outcome.lost.len();
        if missing == 0 {
            return Ok(held);
        }
    }

    Err(DomainError::conflict(
        ConflictKind::CapacityExhausted,
        "Bonus numbers kept being claimed by concurrent orders",
    ))
}

/// Reserve `req.tickets` (plus bonus numbers) on an active raffle as a new
/// PENDING order and add the purchased count to `sold`.
pub async fn create_order<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    engine: &Engine,
    req: CreateOrder,
) -> Result<Order, AppError> {
    let draw = draw_numbers(conn, engine, &req).await?;
    place_order(conn, engine, req, draw).await
}

async fn require_active<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    raffle_id: i64,
) -> Result<Raffle, DomainError> {
    let raffle = raffles::require_raffle(conn, raffle_id).await?;
    if raffle.status != RaffleStatus::Active {
        return Err(DomainError::conflict(
            ConflictKind::RaffleNotActive,
            format!("Raffle {} is not accepting orders", raffle.id),
        ));
    }
    Ok(raffle)
}

/// First half of `create_order`: validate the request and draw bonus
/// numbers against the current occupancy. Nothing is written.
pub async fn draw_numbers<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    engine: &Engine,
    req: &CreateOrder,
) -> Result<BonusDraw, AppError> {
    let raffle = require_active(conn, req.raffle_id).await?;
    let space = raffle.space();
    space.validate_purchase(&req.tickets)?;
    require_customer(conn, req.customer_id).await?;

    // Cheap early answer; the claim insert in `place_order` is what decides
    let held = claims::holders(conn, raffle.id, &req.tickets).await?;
    if !held.is_empty() {
        return Err(
            DomainError::tickets_taken(held.iter().map(|h| h.ticket_number).collect()).into(),
        );
    }

    let occupied: HashSet<i32> = if space.has_bonus() {
        claims::occupied_numbers(conn, raffle.id, Some(space.bonus_range()))
            .await?
            .into_iter()
            .collect()
    } else {
        HashSet::new()
    };
    let draw = engine.bonus_allocator().draw(&space, &req.tickets, &occupied)?;
    if draw.fallback_draws > 0 {
        debug!(
            raffle_id = raffle.id,
            fallback_draws = draw.fallback_draws,
            "bonus draw used the fallback probe"
        );
    }
    Ok(draw)
}

/// Second half of `create_order`: insert the order and claim `draw`.
///
/// The draw may be stale by now. Purchased numbers claimed in the meantime
/// fail with `TicketsAlreadyTaken`; bonus numbers are redrawn.
pub async fn place_order<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    engine: &Engine,
    req: CreateOrder,
    draw: BonusDraw,
) -> Result<Order, AppError> {
    if draw.purchased != req.tickets {
        return Err(DomainError::validation_other("Draw does not match the requested tickets").into());
    }
    let raffle = require_active(conn, req.raffle_id).await?;
    let space = raffle.space();

    let base_count = req.tickets.len() as i32;
    let dto = OrderCreate {
        folio: String::new(),
        raffle_id: raffle.id,
        customer_id: req.customer_id,
        ticket_numbers: draw.all(),
        base_ticket_count: base_count,
        total_cents: total_for(&raffle, base_count)?,
        status: OrderStatus::Pending,
        payment_method: req.payment_method,
        notes: req.notes,
        expires_at: OffsetDateTime::now_utc() + engine.config().order_ttl,
    };
    let mut order = insert_with_folio(conn, dto).await?;

    let held = reserve(conn, engine, &space, raffle.id, order.id, &draw).await?;
    raffles::adjust_sold(conn, raffle.id, base_count).await?;

    if held != order.ticket_numbers {
        order = orders::update_details(
            conn,
            OrderUpdate::new(order.id).with_tickets(held, base_count),
        )
        .await?;
    }

    info!(
        order_id = order.id,
        folio = %order.folio,
        raffle_id = raffle.id,
        base = base_count,
        bonus = order.ticket_numbers.len() as i32 - base_count,
        "order created"
    );
    Ok(order)
}

/// Drop the order's claims and take its purchased count off `sold`.
async fn free_tickets<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    order: &Order,
) -> Result<(), DomainError> {
    claims::release_order(conn, order.id).await?;
    raffles::adjust_sold(conn, order.raffle_id, -order.base_ticket_count).await?;
    Ok(())
}

async fn apply_event<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    order: Order,
    event: OrderEvent,
) -> Result<Order, DomainError> {
    let transition = order_status::apply(order.status, event)?;
    if transition.is_noop() {
        debug!(order_id = order.id, %event, "transition is a no-op");
        return Ok(order);
    }

    // Compare-and-set on the status: a concurrent transition cannot free
    // the same tickets twice.
    let updated = orders::update_status(conn, order.id, transition.from, transition.to).await?;
    if transition.frees_tickets {
        free_tickets(conn, &order).await?;
    }

    info!(
        order_id = order.id,
        folio = %order.folio,
        from = %transition.from,
        to = %transition.to,
        %event,
        "order transitioned"
    );
    Ok(updated)
}

/// Apply a lifecycle event to an order.
pub async fn transition<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    order_id: i64,
    event: OrderEvent,
) -> Result<Order, AppError> {
    let order = orders::lock_order(conn, order_id).await?;
    Ok(apply_event(conn, order, event).await?)
}

pub async fn mark_paid<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    order_id: i64,
) -> Result<Order, AppError> {
    transition(conn, order_id, OrderEvent::MarkPaid).await
}

/// Idempotent on PENDING orders.
pub async fn mark_pending<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    order_id: i64,
) -> Result<Order, AppError> {
    transition(conn, order_id, OrderEvent::MarkPending).await
}

pub async fn cancel<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    order_id: i64,
) -> Result<Order, AppError> {
    transition(conn, order_id, OrderEvent::Cancel).await
}

pub async fn release<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    order_id: i64,
) -> Result<Order, AppError> {
    transition(conn, order_id, OrderEvent::Release).await
}

pub async fn expire<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    order_id: i64,
) -> Result<Order, AppError> {
    transition(conn, order_id, OrderEvent::Expire).await
}

/// Expire every PENDING order whose `expires_at` is at or before `now`.
///
/// Orders that moved on concurrently (paid, cancelled) are skipped. Returns
/// how many orders were expired.
pub async fn expire_overdue<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    now: OffsetDateTime,
) -> Result<u64, AppError> {
    let overdue = orders::find_overdue(conn, now).await?;
    let mut expired = 0;

    for order in overdue {
        let order_id = order.id;
        match apply_event(conn, order, OrderEvent::Expire).await {
            Ok(_) => expired += 1,
            Err(DomainError::Conflict(
                ConflictKind::ConcurrentUpdate | ConflictKind::InvalidTransition,
                detail,
            )) => {
                debug!(order_id, %detail, "skipping order that changed during the sweep");
            }
            Err(e) => return Err(e.into()),
        }
    }

    if expired > 0 {
        info!(expired, "expired overdue orders");
    }
    Ok(expired)
}

/// Edit order details.
///
/// New ticket lists are checked for range and in-order duplicates. On a live
/// order the claim set follows the edit, so numbers held by another live
/// order are rejected with `TicketsAlreadyTaken`, and `sold` moves by the
/// change in purchased count. Terminal orders hold no claims and keep `sold`
/// untouched. The row is locked and the write is guarded on the status that
/// was read; a status change in between fails with `ConcurrentUpdate`.
pub async fn edit_order<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    order_id: i64,
    patch: OrderPatch,
) -> Result<Order, AppError> {
    let order = orders::lock_order(conn, order_id).await?;
    let raffle = raffles::require_raffle(conn, order.raffle_id).await?;
    let space = raffle.space();
    let mut dto = OrderUpdate::new(order.id).expecting(order.status);

    if let Some(customer_id) = patch.customer_id {
        require_customer(conn, customer_id).await?;
        dto = dto.with_customer_id(customer_id);
    }

    if let Some(numbers) = patch.ticket_numbers {
        space.validate_order_tickets(&numbers)?;
        let new_base = space.count_base(&numbers);

        if order.is_live() {
            let old: HashSet<i32> = order.ticket_numbers.iter().copied().collect();
            let new: HashSet<i32> = numbers.iter().copied().collect();
            let removed: Vec<i32> = order
                .ticket_numbers
                .iter()
                .copied()
                .filter(|n| !new.contains(n))
                .collect();
            let added: Vec<i32> = numbers.iter().copied().filter(|n| !old.contains(n)).collect();

            claims::release_numbers(conn, order.id, &removed).await?;
            let outcome = claims::claim_numbers(conn, raffle.id, order.id, &added).await?;
            if !outcome.is_complete() {
                return Err(DomainError::tickets_taken(outcome.lost).into());
            }
            raffles::adjust_sold(conn, raffle.id, new_base - order.base_ticket_count).await?;
        }

        if patch.total_cents.is_none() {
            dto = dto.with_total_cents(total_for(&raffle, new_base)?);
        }
        dto = dto.with_tickets(numbers, new_base);
    }

    if let Some(total) = patch.total_cents {
        if total < 0 {
            return Err(DomainError::validation_other("Total must not be negative").into());
        }
        dto = dto.with_total_cents(total);
    }
    if let Some(method) = patch.payment_method {
        dto = dto.with_payment_method(Some(method));
    }
    if let Some(notes) = patch.notes {
        dto = dto.with_notes(Some(notes));
    }

    let updated = orders::update_details(conn, dto).await?;
    info!(order_id = updated.id, folio = %updated.folio, "order edited");
    Ok(updated)
}

/// Delete an order. A live order first gives back its claims and its
/// purchased count.
///
/// The order row is locked and the delete is guarded on the status that
/// was read, so a concurrent cancel cannot free the same tickets twice.
pub async fn delete_order<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    order_id: i64,
) -> Result<(), AppError> {
    let order = orders::lock_order(conn, order_id).await?;
    if order.is_live() {
        free_tickets(conn, &order).await?;
    }
    orders::delete_order(conn, order.id, order.status).await?;
    info!(order_id, folio = %order.folio, status = %order.status, "order deleted");
    Ok(())
}

pub async fn get_order<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    order_id: i64,
) -> Result<Order, AppError> {
    Ok(orders::require_order(conn, order_id).await?)
}

pub async fn find_by_folio<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    folio: &str,
) -> Result<Order, AppError> {
    orders::find_by_folio(conn, folio).await?.ok_or_else(|| {
        DomainError::not_found(
            NotFoundKind::Order,
            format!("Order {folio} not found"),
        )
        .into()
    })
}

pub async fn list_orders<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    raffle_id: i64,
    status: Option<OrderStatus>,
) -> Result<Vec<Order>, AppError> {
    raffles::require_raffle(conn, raffle_id).await?;
    Ok(orders::list_by_raffle(conn, raffle_id, status).await?)
}
