//! Ticket claim repository functions for domain layer.

use std::ops::RangeInclusive;

use sea_orm::ConnectionTrait;

use crate::adapters::claims_sea as claims_adapter;
use crate::errors::domain::DomainError;

pub use claims_adapter::ClaimOutcome;

/// A held number and the order holding it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Holder {
    pub ticket_number: i32,
    pub order_id: i64,
}

pub async fn claim_numbers<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    raffle_id: i64,
    order_id: i64,
    numbers: &[i32],
) -> Result<ClaimOutcome, DomainError> {
    Ok(claims_adapter::claim_numbers(conn, raffle_id, order_id, numbers).await?)
}

pub async fn holders<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    raffle_id: i64,
    numbers: &[i32],
) -> Result<Vec<Holder>, DomainError> {
    let rows = claims_adapter::holders(conn, raffle_id, numbers).await?;
    Ok(rows
        .into_iter()
        .map(|c| Holder {
            ticket_number: c.ticket_number,
            order_id: c.order_id,
        })
        .collect())
}

pub async fn occupied_numbers<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    raffle_id: i64,
    range: Option<RangeInclusive<i32>>,
) -> Result<Vec<i32>, DomainError> {
    Ok(claims_adapter::occupied_numbers(conn, raffle_id, range).await?)
}

pub async fn occupied_page<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    raffle_id: i64,
    offset: u64,
    limit: u64,
    descending: bool,
) -> Result<(Vec<i32>, u64), DomainError> {
    Ok(claims_adapter::occupied_page(conn, raffle_id, offset, limit, descending).await?)
}

pub async fn numbers_for_order<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    order_id: i64,
) -> Result<Vec<i32>, DomainError> {
    Ok(claims_adapter::numbers_for_order(conn, order_id).await?)
}

pub async fn release_order<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    order_id: i64,
) -> Result<u64, DomainError> {
    Ok(claims_adapter::release_order(conn, order_id).await?)
}

pub async fn release_numbers<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    order_id: i64,
    numbers: &[i32],
) -> Result<u64, DomainError> {
    Ok(claims_adapter::release_numbers(conn, order_id, numbers).await?)
}
