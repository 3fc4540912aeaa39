//! SeaORM adapter for ticket claims.
//!
//! A claim row is the durable record that a number is held. Inserts use
//! `ON CONFLICT DO NOTHING` against the `(raffle_id, ticket_number)` key, so
//! racing claimants never abort each other's transactions; each one reads
//! back which numbers it actually won.

use std::collections::HashSet;
use std::ops::RangeInclusive;

use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, Order, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use crate::entities::ticket_claims;

pub mod dto;

pub use dto::ClaimOutcome;

/// Bind-parameter friendly chunk size for bulk inserts and IN lists
const CHUNK: usize = 500;

/// Claim `numbers` for `order_id`. Numbers already held by another order
/// are reported in `lost`; numbers already held by this order count as
/// claimed.
pub async fn claim_numbers<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    raffle_id: i64,
    order_id: i64,
    numbers: &[i32],
) -> Result<ClaimOutcome, sea_orm::DbErr> {
    if numbers.is_empty() {
        return Ok(ClaimOutcome::default());
    }

    let now = time::OffsetDateTime::now_utc();
    for chunk in numbers.chunks(CHUNK) {
        let rows = chunk.iter().map(|&n| ticket_claims::ActiveModel {
            raffle_id: Set(raffle_id),
            ticket_number: Set(n),
            order_id: Set(order_id),
            created_at: Set(now),
        });

        ticket_claims::Entity::insert_many(rows)
            .on_conflict(
                OnConflict::columns([
                    ticket_claims::Column::RaffleId,
                    ticket_claims::Column::TicketNumber,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(conn)
            .await?;
    }

    let mine: HashSet<i32> = holders(conn, raffle_id, numbers)
        .await?
        .into_iter()
        .filter(|c| c.order_id == order_id)
        .map(|c| c.ticket_number)
        .collect();

    let (claimed, lost): (Vec<i32>, Vec<i32>) = numbers.iter().copied().partition(|n| mine.contains(n));
    Ok(ClaimOutcome { claimed, lost })
}

/// Claim rows currently holding any of `numbers`.
pub async fn holders<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    raffle_id: i64,
    numbers: &[i32],
) -> Result<Vec<ticket_claims::Model>, sea_orm::DbErr> {
    let mut out = Vec::new();
    for chunk in numbers.chunks(CHUNK) {
        let mut rows = ticket_claims::Entity::find()
            .filter(ticket_claims::Column::RaffleId.eq(raffle_id))
            .filter(ticket_claims::Column::TicketNumber.is_in(chunk.iter().copied()))
            .all(conn)
            .await?;
        out.append(&mut rows);
    }
    out.sort_by_key(|c| c.ticket_number);
    Ok(out)
}

/// Every held number of the raffle, optionally restricted to `range`, ascending.
pub async fn occupied_numbers<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    raffle_id: i64,
    range: Option<RangeInclusive<i32>>,
) -> Result<Vec<i32>, sea_orm::DbErr> {
    let mut query = ticket_claims::Entity::find()
        .select_only()
        .column(ticket_claims::Column::TicketNumber)
        .filter(ticket_claims::Column::RaffleId.eq(raffle_id));
    if let Some(range) = range {
        query = query.filter(
            ticket_claims::Column::TicketNumber.between(*range.start(), *range.end()),
        );
    }
    query
        .order_by_asc(ticket_claims::Column::TicketNumber)
        .into_tuple::<i32>()
        .all(conn)
        .await
}

/// One page of held numbers plus the total held count.
pub async fn occupied_page<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    raffle_id: i64,
    offset: u64,
    limit: u64,
    descending: bool,
) -> Result<(Vec<i32>, u64), sea_orm::DbErr> {
    let total = ticket_claims::Entity::find()
        .filter(ticket_claims::Column::RaffleId.eq(raffle_id))
        .count(conn)
        .await?;

    let numbers = ticket_claims::Entity::find()
        .select_only()
        .column(ticket_claims::Column::TicketNumber)
        .filter(ticket_claims::Column::RaffleId.eq(raffle_id))
        .order_by(
            ticket_claims::Column::TicketNumber,
            if descending { Order::Desc } else { Order::Asc },
        )
        .offset(offset)
        .limit(limit)
        .into_tuple::<i32>()
        .all(conn)
        .await?;

    Ok((numbers, total))
}

/// Numbers held by `order_id`, ascending.
pub async fn numbers_for_order<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    order_id: i64,
) -> Result<Vec<i32>, sea_orm::DbErr> {
    ticket_claims::Entity::find()
        .select_only()
        .column(ticket_claims::Column::TicketNumber)
        .filter(ticket_claims::Column::OrderId.eq(order_id))
        .order_by_asc(ticket_claims::Column::TicketNumber)
        .into_tuple::<i32>()
        .all(conn)
        .await
}

/// Drop every claim held by `order_id`. Returns the number of rows removed.
pub async fn release_order<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    order_id: i64,
) -> Result<u64, sea_orm::DbErr> {
    let result = ticket_claims::Entity::delete_many()
        .filter(ticket_claims::Column::OrderId.eq(order_id))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

/// Drop the claims `order_id` holds on `numbers`; others' claims are untouched.
pub async fn release_numbers<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    order_id: i64,
    numbers: &[i32],
) -> Result<u64, sea_orm::DbErr> {
    let mut removed = 0;
    for chunk in numbers.chunks(CHUNK) {
        let result = ticket_claims::Entity::delete_many()
            .filter(ticket_claims::Column::OrderId.eq(order_id))
            .filter(ticket_claims::Column::TicketNumber.is_in(chunk.iter().copied()))
            .exec(conn)
            .await?;
        removed += result.rows_affected;
    }
    Ok(removed)
}
