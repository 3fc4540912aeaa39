//! Fixture builders over the service layer.

use backend_test_support::unique_helpers::{unique_phone, unique_str};
use raffle_backend::repos::customers::Customer;
use raffle_backend::repos::orders::Order;
use raffle_backend::repos::raffles::Raffle;
use raffle_backend::services::customers::{self, NewCustomer};
use raffle_backend::services::orders::{self, CreateOrder};
use raffle_backend::services::raffles::{self, NewRaffle};
use raffle_backend::db::txn::run_in_txn;
use raffle_backend::{AppError, Engine};
use sea_orm::DatabaseConnection;

pub const PRICE_CENTS: i64 = 5_000;

/// Published raffle without bonuses.
pub async fn active_raffle(db: &DatabaseConnection, ticket_count: i32) -> Result<Raffle, AppError> {
    let raffle = raffles::create_raffle(
        db,
        NewRaffle::new(unique_str("raffle"), ticket_count, PRICE_CENTS),
    )
    .await?;
    raffles::publish_raffle(db, raffle.id).await
}

/// Published raffle where each ticket earns `multiplier - 1` bonus numbers.
pub async fn bonus_raffle(
    db: &DatabaseConnection,
    ticket_count: i32,
    multiplier: i32,
) -> Result<Raffle, AppError> {
    let raffle = raffles::create_raffle(
        db,
        NewRaffle::new(unique_str("bonus"), ticket_count, PRICE_CENTS).with_bonus(multiplier),
    )
    .await?;
    raffles::publish_raffle(db, raffle.id).await
}

pub async fn customer(db: &DatabaseConnection) -> Result<Customer, AppError> {
    customers::ensure_customer(db, NewCustomer::new(unique_str("buyer"), unique_phone())).await
}

/// `create_order` in its own transaction, the way a request runs it.
pub async fn create_in_txn(
    db: &DatabaseConnection,
    engine: &Engine,
    req: CreateOrder,
) -> Result<Order, AppError> {
    let engine = engine.clone();
    run_in_txn(db, move |txn| {
        Box::pin(async move { orders::create_order(txn, &engine, req).await })
    })
    .await
}

/// New PENDING order for a fresh customer.
pub async fn order(
    db: &DatabaseConnection,
    engine: &Engine,
    raffle_id: i64,
    tickets: &[i32],
) -> Result<Order, AppError> {
    let buyer = customer(db).await?;
    create_in_txn(db, engine, CreateOrder::new(raffle_id, buyer.id, tickets.to_vec())).await
}

pub async fn reload_raffle(db: &DatabaseConnection, raffle_id: i64) -> Raffle {
    raffles::get_raffle(db, raffle_id)
        .await
        .expect("raffle should exist")
}

/// Sum of base-ticket counts over PENDING and PAID orders.
pub async fn live_base_total(db: &DatabaseConnection, raffle_id: i64) -> i64 {
    raffle_backend::repos::raffles::live_base_total(db, raffle_id)
        .await
        .expect("live base total")
}
