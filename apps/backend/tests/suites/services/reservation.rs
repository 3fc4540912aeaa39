use std::collections::HashSet;
use std::env;

use futures::future::join_all;
use raffle_backend::entities::orders::OrderStatus;
use raffle_backend::errors::ErrorCode;
use raffle_backend::services::orders::CreateOrder;
use raffle_backend::services::raffles::{self, NewRaffle};
use raffle_backend::config::db::{DbKind, RuntimeEnv};
use raffle_backend::infra::state::build_state;
use raffle_backend::state::app_state::AppState;
use raffle_backend::{AppError, Engine};
use serial_test::serial;
use time::{Duration, OffsetDateTime};
use ulid::Ulid;

use crate::support::build_test_state;
use crate::support::factory::{self, create_in_txn, PRICE_CENTS};

#[tokio::test]
async fn creates_pending_order_and_counts_purchased_tickets() -> Result<(), AppError> {
    let state = build_test_state().await?;
    let db = state.db().expect("db");
    let engine = state.engine();

    let raffle = factory::active_raffle(db, 10).await?;
    let before = OffsetDateTime::now_utc();
    let order = factory::order(db, engine, raffle.id, &[3, 7]).await?;

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.ticket_numbers, vec![3, 7]);
    assert_eq!(order.base_ticket_count, 2);
    assert_eq!(order.total_cents, 2 * PRICE_CENTS);
    assert!(order.folio.starts_with("RF-"));
    let ttl = order.expires_at - before;
    assert!(ttl > Duration::hours(23) && ttl <= Duration::hours(24) + Duration::minutes(1));

    assert_eq!(factory::reload_raffle(db, raffle.id).await.sold, 2);
    Ok(())
}

#[tokio::test]
async fn overlapping_request_names_the_taken_numbers() -> Result<(), AppError> {
    let state = build_test_state().await?;
    let db = state.db().expect("db");
    let engine = state.engine();

    let raffle = factory::active_raffle(db, 10).await?;
    factory::order(db, engine, raffle.id, &[2, 5]).await?;

    let err = factory::order(db, engine, raffle.id, &[5, 6, 2])
        .await
        .unwrap_err();
    assert_eq!(err.taken_numbers(), Some(&[2, 5][..]));
    assert_eq!(err.code(), ErrorCode::TicketsAlreadyTaken);

    // nothing from the failed attempt is left behind
    assert_eq!(factory::reload_raffle(db, raffle.id).await.sold, 2);
    assert_eq!(factory::live_base_total(db, raffle.id).await, 2);
    Ok(())
}

/// N concurrent purchases with overlapping numbers against ticket_count=10:
/// exactly one request of each overlapping pair wins, the disjoint request
/// always wins, and winners never share a number.
#[tokio::test]
async fn concurrent_overlapping_purchases_never_double_allocate() -> Result<(), AppError> {
    let state = build_test_state().await?;
    race_overlapping_purchases(&state).await
}

/// Same race on a file-backed database, where transactions from separate
/// callers contend for the SQLite write lock. Losers must see
/// TICKETS_ALREADY_TAKEN, never a raw database error.
#[tokio::test]
#[serial]
async fn concurrent_purchases_on_sqlite_file_never_surface_busy() -> Result<(), AppError> {
    let path = env::temp_dir().join(format!("raffle-race-{}.db", Ulid::new()));
    env::set_var("SQLITE_PATH", &path);
    let state = build_state()
        .with_env(RuntimeEnv::Test)
        .with_db(DbKind::SqliteFile)
        .build()
        .await?;

    let outcome = race_overlapping_purchases(&state).await;
    drop(state);
    let _ = std::fs::remove_file(&path);
    outcome
}

async fn race_overlapping_purchases(state: &AppState) -> Result<(), AppError> {
    let db = state.db().expect("db");
    let engine = state.engine();

    let raffle = factory::active_raffle(db, 10).await?;
    let requests: Vec<Vec<i32>> = vec![
        vec![1, 2],
        vec![2, 3],
        vec![4, 5],
        vec![5, 6],
        vec![10],
        vec![8, 9],
        vec![9, 8],
    ];
    let mut buyers = Vec::new();
    for _ in &requests {
        buyers.push(factory::customer(db).await?);
    }

    let results = join_all(requests.iter().zip(&buyers).map(|(tickets, buyer)| {
        create_in_txn(db, engine, CreateOrder::new(raffle.id, buyer.id, tickets.clone()))
    }))
    .await;

    let won: Vec<bool> = results.iter().map(Result::is_ok).collect();
    assert!(won[0] ^ won[1]);
    assert!(won[2] ^ won[3]);
    assert!(won[4]);
    assert!(won[5] ^ won[6]);

    let mut seen = HashSet::new();
    let mut sold = 0;
    for result in &results {
        match result {
            Ok(order) => {
                for n in &order.ticket_numbers {
                    assert!(seen.insert(*n), "number {n} allocated twice");
                }
                sold += order.base_ticket_count;
            }
            Err(e) => assert_eq!(e.code(), ErrorCode::TicketsAlreadyTaken, "{e}"),
        }
    }

    let raffle = factory::reload_raffle(db, raffle.id).await;
    assert_eq!(raffle.sold, sold);
    assert_eq!(raffle.sold, 7);
    Ok(())
}

#[tokio::test]
async fn sold_out_raffle_rejects_every_number() -> Result<(), AppError> {
    let state = build_test_state().await?;
    let db = state.db().expect("db");
    let engine = state.engine();

    let raffle = factory::active_raffle(db, 3).await?;
    factory::order(db, engine, raffle.id, &[1, 2, 3]).await?;

    for n in 1..=3 {
        let err = factory::order(db, engine, raffle.id, &[n]).await.unwrap_err();
        assert_eq!(err.taken_numbers(), Some(&[n][..]));
    }
    assert_eq!(factory::reload_raffle(db, raffle.id).await.available(), 0);
    Ok(())
}

#[tokio::test]
async fn request_validation() -> Result<(), AppError> {
    let state = build_test_state().await?;
    let db = state.db().expect("db");
    let engine = state.engine();
    let raffle = factory::active_raffle(db, 10).await?;

    let cases: [(&[i32], ErrorCode); 4] = [
        (&[], ErrorCode::EmptyTicketRequest),
        (&[0], ErrorCode::TicketOutOfRange),
        (&[11], ErrorCode::TicketOutOfRange),
        (&[4, 4], ErrorCode::DuplicateTicketInRequest),
    ];
    for (tickets, code) in cases {
        let err = factory::order(db, engine, raffle.id, tickets).await.unwrap_err();
        assert_eq!(err.code(), code, "{tickets:?}");
    }

    let buyer = factory::customer(db).await?;
    let err = create_in_txn(db, engine, CreateOrder::new(raffle.id + 1000, buyer.id, vec![1]))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::RaffleNotFound);

    let err = create_in_txn(db, engine, CreateOrder::new(raffle.id, buyer.id + 1000, vec![1]))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::CustomerNotFound);
    Ok(())
}

#[tokio::test]
async fn only_active_raffles_sell() -> Result<(), AppError> {
    let state = build_test_state().await?;
    let db = state.db().expect("db");
    let engine = state.engine();

    let draft = raffles::create_raffle(db, NewRaffle::new("draft", 10, 100)).await?;
    let err = factory::order(db, engine, draft.id, &[1]).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::RaffleNotActive);

    let raffle = factory::active_raffle(db, 10).await?;
    raffles::finish_raffle(db, raffle.id).await?;
    let err = factory::order(db, engine, raffle.id, &[1]).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::RaffleNotActive);
    Ok(())
}

#[tokio::test]
async fn order_ttl_follows_engine_config() -> Result<(), AppError> {
    let cfg = raffle_backend::EngineConfig {
        order_ttl: Duration::hours(2),
        ..Default::default()
    };
    let state = crate::support::build_test_state_with(Engine::new(cfg)).await?;
    let db = state.db().expect("db");

    let raffle = factory::active_raffle(db, 5).await?;
    let order = factory::order(db, state.engine(), raffle.id, &[1]).await?;
    assert!(order.expires_at - order.created_at <= Duration::hours(2) + Duration::seconds(5));
    assert!(order.expires_at - order.created_at >= Duration::hours(2) - Duration::seconds(5));
    Ok(())
}
