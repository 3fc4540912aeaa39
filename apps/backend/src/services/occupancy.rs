//! Read views over held ticket numbers.
//!
//! A number is occupied exactly while a PENDING or PAID order holds a claim
//! on it; CANCELLED, EXPIRED and RELEASED orders have no claims.

use sea_orm::ConnectionTrait;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::repos::{claims, raffles};

pub const DEFAULT_PAGE_LIMIT: u64 = 100;
pub const MAX_PAGE_LIMIT: u64 = 1000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageRequest {
    pub offset: Option<u64>,
    pub limit: Option<u64>,
    #[serde(default)]
    pub sort: SortOrder,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OccupiedPage {
    pub raffle_id: i64,
    pub numbers: Vec<i32>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

/// Every held number of the raffle, ascending.
pub async fn occupied_numbers<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    raffle_id: i64,
) -> Result<Vec<i32>, AppError> {
    raffles::require_raffle(conn, raffle_id).await?;
    Ok(claims::occupied_numbers(conn, raffle_id, None).await?)
}

pub async fn is_occupied<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    raffle_id: i64,
    number: i32,
) -> Result<bool, AppError> {
    let held = claims::holders(conn, raffle_id, &[number]).await?;
    Ok(!held.is_empty())
}

/// Paginated listing for the public "taken numbers" view.
pub async fn occupied_page<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    raffle_id: i64,
    page: PageRequest,
) -> Result<OccupiedPage, AppError> {
    raffles::require_raffle(conn, raffle_id).await?;

    let offset = page.offset.unwrap_or(0);
    let limit = page
        .limit
        .unwrap_or(DEFAULT_PAGE_LIMIT)
        .clamp(1, MAX_PAGE_LIMIT);
    let descending = page.sort == SortOrder::Desc;

    let (numbers, total) =
        claims::occupied_page(conn, raffle_id, offset, limit, descending).await?;
    Ok(OccupiedPage {
        raffle_id,
        numbers,
        total,
        offset,
        limit,
    })
}

/// Which of `numbers` are currently held, ascending and de-duplicated.
pub async fn validate_tickets<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    raffle_id: i64,
    numbers: &[i32],
) -> Result<Vec<i32>, AppError> {
    raffles::require_raffle(conn, raffle_id).await?;
    let mut taken: Vec<i32> = claims::holders(conn, raffle_id, numbers)
        .await?
        .into_iter()
        .map(|h| h.ticket_number)
        .collect();
    taken.sort_unstable();
    taken.dedup();
    Ok(taken)
}
