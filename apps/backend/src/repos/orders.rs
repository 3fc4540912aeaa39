//! Order repository functions for domain layer.

use sea_orm::ConnectionTrait;
use serde::Serialize;
use time::OffsetDateTime;

use crate::adapters::orders_sea as orders_adapter;
use crate::entities::orders::{self, OrderStatus};
use crate::errors::domain::DomainError;
use crate::infra::db_errors::custom;

/// Order domain model
///
/// `ticket_numbers` lists every number the order holds, purchased numbers
/// first and bonus numbers after; `base_ticket_count` is what it adds to
/// the raffle's `sold` counter while live.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    pub id: i64,
    pub folio: String,
    pub raffle_id: i64,
    pub customer_id: i64,
    pub ticket_numbers: Vec<i32>,
    pub base_ticket_count: i32,
    pub total_cents: i64,
    pub status: OrderStatus,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Order {
    pub fn is_live(&self) -> bool {
        self.status.is_live()
    }
}

impl TryFrom<orders::Model> for Order {
    type Error = DomainError;

    fn try_from(model: orders::Model) -> Result<Self, Self::Error> {
        let ticket_numbers: Vec<i32> = serde_json::from_value(model.ticket_numbers)
            .map_err(|e| {
                sea_orm::DbErr::Custom(format!(
                    "{}{{\"order_id\":{},\"error\":\"{}\"}}",
                    custom::CORRUPT_TICKETS,
                    model.id,
                    e
                ))
            })?;

        Ok(Self {
            id: model.id,
            folio: model.folio,
            raffle_id: model.raffle_id,
            customer_id: model.customer_id,
            ticket_numbers,
            base_ticket_count: model.base_ticket_count,
            total_cents: model.total_cents,
            status: model.status,
            payment_method: model.payment_method,
            notes: model.notes,
            created_at: model.created_at,
            expires_at: model.expires_at,
            updated_at: model.updated_at,
        })
    }
}

fn convert_all(models: Vec<orders::Model>) -> Result<Vec<Order>, DomainError> {
    models.into_iter().map(Order::try_from).collect()
}

pub async fn find_by_id<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    order_id: i64,
) -> Result<Option<Order>, DomainError> {
    let order = orders_adapter::find_by_id(conn, order_id).await?;
    order.map(Order::try_from).transpose()
}

/// Find order by ID or fail with `NotFound(Order)`.
pub async fn require_order<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    order_id: i64,
) -> Result<Order, DomainError> {
    let order = orders_adapter::require_order(conn, order_id).await?;
    Order::try_from(order)
}

/// Like `require_order`, but the row stays locked until the transaction ends.
pub async fn lock_order<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    order_id: i64,
) -> Result<Order, DomainError> {
    let order = orders_adapter::lock_order(conn, order_id).await?;
    Order::try_from(order)
}

pub async fn find_by_folio<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    folio: &str,
) -> Result<Option<Order>, DomainError> {
    let order = orders_adapter::find_by_folio(conn, folio).await?;
    order.map(Order::try_from).transpose()
}

/// Insert an order; `None` means the folio was already taken.
pub async fn create_order<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: orders_adapter::OrderCreate,
) -> Result<Option<Order>, DomainError> {
    let order = orders_adapter::create_order(conn, dto).await?;
    order.map(Order::try_from).transpose()
}

/// Compare-and-set the status from `expected` to `to`.
pub async fn update_status<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    order_id: i64,
    expected: OrderStatus,
    to: OrderStatus,
) -> Result<Order, DomainError> {
    let dto = orders_adapter::OrderSetStatus {
        id: order_id,
        expected,
        to,
    };
    let order = orders_adapter::update_status(conn, dto).await?;
    Order::try_from(order)
}

pub async fn update_details<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: orders_adapter::OrderUpdate,
) -> Result<Order, DomainError> {
    let order = orders_adapter::update_details(conn, dto).await?;
    Order::try_from(order)
}

/// Delete the order if it still has status `expected`; otherwise
/// `Conflict(ConcurrentUpdate)`.
pub async fn delete_order<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    order_id: i64,
    expected: OrderStatus,
) -> Result<(), DomainError> {
    orders_adapter::delete_order(conn, order_id, expected).await?;
    Ok(())
}

pub async fn find_overdue<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    now: OffsetDateTime,
) -> Result<Vec<Order>, DomainError> {
    convert_all(orders_adapter::find_overdue(conn, now).await?)
}

pub async fn list_by_raffle<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    raffle_id: i64,
    status: Option<OrderStatus>,
) -> Result<Vec<Order>, DomainError> {
    convert_all(orders_adapter::list_by_raffle(conn, raffle_id, status).await?)
}
