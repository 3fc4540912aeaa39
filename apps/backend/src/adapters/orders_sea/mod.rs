//! SeaORM adapter for orders - generic over ConnectionTrait.

use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, NotSet, QueryFilter, QueryOrder, QuerySelect, Set,
};
use time::OffsetDateTime;

use crate::entities::orders::{self, OrderStatus};
use crate::infra::db_errors::custom;

pub mod dto;

pub use dto::{OrderCreate, OrderSetStatus, OrderUpdate};

// Adapter functions return DbErr; repos layer maps to DomainError via From<DbErr>.

fn not_found(id: i64) -> sea_orm::DbErr {
    sea_orm::DbErr::Custom(format!("{}{id}", custom::ORDER_NOT_FOUND))
}

fn status_changed(order_id: i64, expected: OrderStatus) -> sea_orm::DbErr {
    let payload = format!(
        "{}{{\"order_id\":{order_id},\"expected\":\"{expected}\"}}",
        custom::STATUS_CHANGED,
    );
    sea_orm::DbErr::Custom(payload)
}

fn tickets_json(numbers: &[i32]) -> serde_json::Value {
    serde_json::Value::from(numbers.to_vec())
}

pub async fn find_by_id<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    order_id: i64,
) -> Result<Option<orders::Model>, sea_orm::DbErr> {
    orders::Entity::find_by_id(order_id).one(conn).await
}

pub async fn require_order<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    order_id: i64,
) -> Result<orders::Model, sea_orm::DbErr> {
    find_by_id(conn, order_id)
        .await?
        .ok_or_else(|| not_found(order_id))
}

/// Read an order and hold its row lock until the transaction ends.
/// SQLite has no row locks; its single writer connection serializes instead.
pub async fn lock_order<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    order_id: i64,
) -> Result<orders::Model, sea_orm::DbErr> {
    orders::Entity::find_by_id(order_id)
        .lock_exclusive()
        .one(conn)
        .await?
        .ok_or_else(|| not_found(order_id))
}

pub async fn find_by_folio<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    folio: &str,
) -> Result<Option<orders::Model>, sea_orm::DbErr> {
    orders::Entity::find()
        .filter(orders::Column::Folio.eq(folio))
        .one(conn)
        .await
}

/// Insert an order unless its folio is already in use.
///
/// Returns `Ok(None)` on a folio collision so the caller can retry with a
/// fresh folio without aborting the surrounding transaction.
pub async fn create_order<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: OrderCreate,
) -> Result<Option<orders::Model>, sea_orm::DbErr> {
    let now = OffsetDateTime::now_utc();
    let folio = dto.folio.clone();

    let order_active = orders::ActiveModel {
        id: NotSet,
        folio: Set(dto.folio),
        raffle_id: Set(dto.raffle_id),
        customer_id: Set(dto.customer_id),
        ticket_numbers: Set(tickets_json(&dto.ticket_numbers)),
        base_ticket_count: Set(dto.base_ticket_count),
        total_cents: Set(dto.total_cents),
        status: Set(dto.status),
        payment_method: Set(dto.payment_method),
        notes: Set(dto.notes),
        created_at: Set(now),
        expires_at: Set(dto.expires_at),
        updated_at: Set(now),
    };

    let rows = orders::Entity::insert(order_active)
        .on_conflict(
            OnConflict::column(orders::Column::Folio)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;

    if rows == 0 {
        return Ok(None);
    }
    find_by_folio(conn, &folio).await
}

/// Compare-and-set on the order status.
///
/// A miss on an existing order means a concurrent writer moved it first and
/// surfaces as a structured `STATUS_CHANGED` payload.
pub async fn update_status<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: OrderSetStatus,
) -> Result<orders::Model, sea_orm::DbErr> {
    let now = OffsetDateTime::now_utc();
    let result = orders::Entity::update_many()
        .col_expr(orders::Column::Status, Expr::val(dto.to).into())
        .col_expr(orders::Column::UpdatedAt, Expr::val(now).into())
        .filter(orders::Column::Id.eq(dto.id))
        .filter(orders::Column::Status.eq(dto.expected))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        // Distinguish a missing order from a lost race
        require_order(conn, dto.id).await?;
        return Err(status_changed(dto.id, dto.expected));
    }

    require_order(conn, dto.id).await
}

pub async fn update_details<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: OrderUpdate,
) -> Result<orders::Model, sea_orm::DbErr> {
    let now = OffsetDateTime::now_utc();
    let mut update = orders::Entity::update_many()
        .col_expr(orders::Column::UpdatedAt, Expr::val(now).into())
        .filter(orders::Column::Id.eq(dto.id));

    if let Some(customer_id) = dto.customer_id {
        update = update.col_expr(orders::Column::CustomerId, Expr::val(customer_id).into());
    }
    if let Some(numbers) = dto.ticket_numbers {
        update = update.col_expr(
            orders::Column::TicketNumbers,
            Expr::val(tickets_json(&numbers)).into(),
        );
    }
    if let Some(base) = dto.base_ticket_count {
        update = update.col_expr(orders::Column::BaseTicketCount, Expr::val(base).into());
    }
    if let Some(total) = dto.total_cents {
        update = update.col_expr(orders::Column::TotalCents, Expr::val(total).into());
    }
    if let Some(method) = dto.payment_method {
        update = update.col_expr(orders::Column::PaymentMethod, Expr::val(method).into());
    }
    if let Some(notes) = dto.notes {
        update = update.col_expr(orders::Column::Notes, Expr::val(notes).into());
    }
    if let Some(expected) = dto.expected_status {
        update = update.filter(orders::Column::Status.eq(expected));
    }

    let result = update.exec(conn).await?;
    if result.rows_affected == 0 {
        require_order(conn, dto.id).await?;
        return Err(match dto.expected_status {
            Some(expected) => status_changed(dto.id, expected),
            None => not_found(dto.id),
        });
    }
    require_order(conn, dto.id).await
}

/// Delete an order that still has status `expected`.
pub async fn delete_order<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    order_id: i64,
    expected: OrderStatus,
) -> Result<(), sea_orm::DbErr> {
    let result = orders::Entity::delete_many()
        .filter(orders::Column::Id.eq(order_id))
        .filter(orders::Column::Status.eq(expected))
        .exec(conn)
        .await?;
    if result.rows_affected == 0 {
        require_order(conn, order_id).await?;
        return Err(status_changed(order_id, expected));
    }
    Ok(())
}

/// PENDING orders whose `expires_at` is at or before `now`, oldest first.
pub async fn find_overdue<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    now: OffsetDateTime,
) -> Result<Vec<orders::Model>, sea_orm::DbErr> {
    orders::Entity::find()
        .filter(orders::Column::Status.eq(OrderStatus::Pending))
        .filter(orders::Column::ExpiresAt.lte(now))
        .order_by_asc(orders::Column::ExpiresAt)
        .order_by_asc(orders::Column::Id)
        .all(conn)
        .await
}

pub async fn list_by_raffle<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    raffle_id: i64,
    status: Option<OrderStatus>,
) -> Result<Vec<orders::Model>, sea_orm::DbErr> {
    let mut query = orders::Entity::find().filter(orders::Column::RaffleId.eq(raffle_id));
    if let Some(status) = status {
        query = query.filter(orders::Column::Status.eq(status));
    }
    query.order_by_asc(orders::Column::Id).all(conn).await
}
