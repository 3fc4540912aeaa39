//! SeaORM -> DomainError translation helpers.
//!
//! Adapters return `sea_orm::DbErr`; it is converted into
//! `crate::errors::domain::DomainError` here, and higher layers map
//! `DomainError` to `AppError` via `From`.

use tracing::{error, warn};

use crate::errors::domain::{ConflictKind, DomainError, InfraErrorKind, NotFoundKind};
use crate::logging::pii::Redacted;
use crate::trace_ctx;

/// Prefixes of structured `DbErr::Custom` payloads raised by the adapters.
pub mod custom {
    pub const RAFFLE_NOT_FOUND: &str = "RAFFLE_NOT_FOUND:";
    pub const ORDER_NOT_FOUND: &str = "ORDER_NOT_FOUND:";
    pub const CAPACITY_EXHAUSTED: &str = "CAPACITY_EXHAUSTED:";
    pub const SOLD_UNDERFLOW: &str = "SOLD_UNDERFLOW:";
    pub const STATUS_CHANGED: &str = "STATUS_CHANGED:";
    pub const CORRUPT_TICKETS: &str = "CORRUPT_TICKETS:";
}

fn mentions_sqlstate(msg: &str, code: &str) -> bool {
    msg.contains(code) || msg.contains(&format!("SQLSTATE({code})"))
}

/// Extract table.column from SQLite "UNIQUE constraint failed: table.column" error messages.
fn extract_sqlite_table_column(error_msg: &str) -> Option<&str> {
    let marker = "UNIQUE constraint failed: ";
    let start = error_msg.find(marker)? + marker.len();
    error_msg[start..]
        .split(|c: char| c.is_whitespace() || c == '"')
        .next()
        .filter(|s| !s.is_empty())
}

fn map_sqlite_table_column_to_conflict(table_column: &str) -> Option<DomainError> {
    match table_column {
        // Composite key reports as "ticket_claims.raffle_id," followed by the second column
        tc if tc.starts_with("ticket_claims.") => Some(DomainError::tickets_taken(Vec::new())),
        "orders.folio" => Some(DomainError::conflict(
            ConflictKind::FolioConflict,
            "Folio already exists",
        )),
        "customers.phone" => Some(DomainError::conflict(
            ConflictKind::UniquePhone,
            "Phone already registered",
        )),
        _ => None,
    }
}

fn map_postgres_constraint_to_conflict(error_msg: &str) -> Option<DomainError> {
    if error_msg.contains("pk_ticket_claims") {
        return Some(DomainError::tickets_taken(Vec::new()));
    }
    if error_msg.contains("ux_orders_folio") {
        return Some(DomainError::conflict(
            ConflictKind::FolioConflict,
            "Folio already exists",
        ));
    }
    if error_msg.contains("ux_customers_phone") {
        return Some(DomainError::conflict(
            ConflictKind::UniquePhone,
            "Phone already registered",
        ));
    }
    None
}

fn parse_id(payload: &str) -> Option<i64> {
    payload.trim().parse::<i64>().ok()
}

fn map_custom(msg: &str) -> Option<DomainError> {
    let trace_id = trace_ctx::trace_id();

    if let Some(rest) = msg.strip_prefix(custom::RAFFLE_NOT_FOUND) {
        return Some(match parse_id(rest) {
            Some(id) => DomainError::not_found(NotFoundKind::Raffle, format!("Raffle {id} not found")),
            None => DomainError::not_found(NotFoundKind::Raffle, "Raffle not found"),
        });
    }
    if let Some(rest) = msg.strip_prefix(custom::ORDER_NOT_FOUND) {
        return Some(match parse_id(rest) {
            Some(id) => DomainError::not_found(NotFoundKind::Order, format!("Order {id} not found")),
            None => DomainError::not_found(NotFoundKind::Order, "Order not found"),
        });
    }
    if let Some(rest) = msg.strip_prefix(custom::CAPACITY_EXHAUSTED) {
        #[derive(serde::Deserialize)]
        struct Capacity {
            raffle_id: i64,
            requested: i32,
        }

        if let Ok(info) = serde_json::from_str::<Capacity>(rest) {
            warn!(
                trace_id = %trace_id,
                raffle_id = info.raffle_id,
                requested = info.requested,
                "Sold counter would exceed ticket count"
            );
            return Some(DomainError::conflict(
                ConflictKind::CapacityExhausted,
                format!(
                    "Raffle {} cannot sell {} more tickets",
                    info.raffle_id, info.requested
                ),
            ));
        }
        return Some(DomainError::conflict(
            ConflictKind::CapacityExhausted,
            "Raffle has no tickets left",
        ));
    }
    if let Some(rest) = msg.strip_prefix(custom::SOLD_UNDERFLOW) {
        error!(trace_id = %trace_id, payload = %rest, "Sold counter would drop below zero");
        return Some(DomainError::infra(
            InfraErrorKind::DataCorruption,
            "Sold counter is inconsistent with live orders",
        ));
    }
    if let Some(rest) = msg.strip_prefix(custom::STATUS_CHANGED) {
        #[derive(serde::Deserialize)]
        struct StatusInfo {
            order_id: i64,
            expected: String,
        }

        if let Ok(info) = serde_json::from_str::<StatusInfo>(rest) {
            warn!(
                trace_id = %trace_id,
                order_id = info.order_id,
                expected = %info.expected,
                "Order status changed concurrently"
            );
            return Some(DomainError::conflict(
                ConflictKind::ConcurrentUpdate,
                format!(
                    "Order {} is no longer {}; please refresh and retry",
                    info.order_id, info.expected
                ),
            ));
        }
        return Some(DomainError::conflict(
            ConflictKind::ConcurrentUpdate,
            "Order was modified by another transaction; please retry",
        ));
    }
    if let Some(rest) = msg.strip_prefix(custom::CORRUPT_TICKETS) {
        error!(trace_id = %trace_id, payload = %rest, "Stored ticket list is not a JSON integer array");
        return Some(DomainError::infra(
            InfraErrorKind::DataCorruption,
            "Stored ticket list is unreadable",
        ));
    }
    None
}

/// Translate a `DbErr` into a `DomainError` with sanitized, PII-safe detail.
pub fn map_db_err(e: sea_orm::DbErr) -> DomainError {
    let error_msg = e.to_string();
    let trace_id = trace_ctx::trace_id();

    match &e {
        sea_orm::DbErr::RecordNotFound(_) => {
            return DomainError::not_found(
                NotFoundKind::Other("Record".into()),
                "Record not found",
            );
        }
        sea_orm::DbErr::Custom(msg) => {
            if let Some(mapped) = map_custom(msg) {
                return mapped;
            }
        }
        sea_orm::DbErr::ConnectionAcquire(_) | sea_orm::DbErr::Conn(_) => {
            warn!(trace_id = %trace_id, raw_error = %Redacted(&error_msg), "Database unavailable");
            return DomainError::infra(InfraErrorKind::DbUnavailable, "Database unavailable");
        }
        _ => {}
    }

    if mentions_sqlstate(&error_msg, "23505")
        || error_msg.contains("duplicate key value violates unique constraint")
        || error_msg.contains("UNIQUE constraint failed")
    {
        warn!(trace_id = %trace_id, raw_error = %Redacted(&error_msg), "Unique constraint violation");

        if let Some(table_column) = extract_sqlite_table_column(&error_msg) {
            if let Some(mapped) = map_sqlite_table_column_to_conflict(table_column) {
                return mapped;
            }
        }

        if let Some(mapped) = map_postgres_constraint_to_conflict(&error_msg) {
            return mapped;
        }

        return DomainError::conflict(
            ConflictKind::Other("Unique".into()),
            "Unique constraint violation",
        );
    }

    if mentions_sqlstate(&error_msg, "23503") || error_msg.contains("FOREIGN KEY constraint failed")
    {
        warn!(trace_id = %trace_id, raw_error = %Redacted(&error_msg), "Foreign key constraint violation");
        return DomainError::validation_other("Foreign key constraint violation");
    }

    if mentions_sqlstate(&error_msg, "23514") || error_msg.contains("CHECK constraint failed") {
        warn!(trace_id = %trace_id, raw_error = %Redacted(&error_msg), "Check constraint violation");
        return DomainError::validation_other("Check constraint violation");
    }

    if error_msg.contains("timeout")
        || error_msg.contains("pool")
        || error_msg.contains("unavailable")
    {
        warn!(trace_id = %trace_id, raw_error = %Redacted(&error_msg), "Database timeout or pool issue");
        return DomainError::infra(InfraErrorKind::Timeout, "Database timeout");
    }

    error!(trace_id = %trace_id, raw_error = %Redacted(&error_msg), "Unhandled database error");
    DomainError::infra(
        InfraErrorKind::Other("DbErr".into()),
        "Database operation failed",
    )
}

impl From<sea_orm::DbErr> for DomainError {
    fn from(e: sea_orm::DbErr) -> Self {
        map_db_err(e)
    }
}
