use raffle_backend::entities::orders::OrderStatus;
use raffle_backend::errors::ErrorCode;
use raffle_backend::services::importer::{import_tickets, ImportRow};
use raffle_backend::services::orders;
use raffle_backend::services::raffles::{self, NewRaffle};
use raffle_backend::services::{customers, occupancy};
use raffle_backend::{AppError, Engine, EngineConfig};
use time::{Duration, OffsetDateTime};

use crate::support::factory::{self, PRICE_CENTS};
use crate::support::{build_test_state, build_test_state_with};

#[tokio::test]
async fn first_group_wins_a_number_repeated_across_groups() -> Result<(), AppError> {
    let state = build_test_state().await?;
    let db = state.db().expect("db");
    let raffle = factory::active_raffle(db, 5).await?;

    let summary = import_tickets(
        db,
        state.engine(),
        raffle.id,
        vec![
            ImportRow::new("Ana", "555", 1),
            ImportRow::new("Ana", "555", 2),
            ImportRow::new("Luis", "777", 1),
        ],
    )
    .await?;

    assert_eq!(summary.success, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.errors.len(), 1);
    assert!(summary.errors[0].starts_with("row 3: ALREADY_TAKEN"), "{:?}", summary.errors);

    let placed = orders::list_orders(db, raffle.id, None).await?;
    assert_eq!(placed.len(), 1);
    let order = &placed[0];
    assert_eq!(order.ticket_numbers, vec![1, 2]);
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total_cents, 2 * PRICE_CENTS);

    let buyer = customers::require_customer(db, order.customer_id).await?;
    assert_eq!(buyer.phone, "555");
    assert_eq!(factory::reload_raffle(db, raffle.id).await.sold, 2);
    Ok(())
}

#[tokio::test]
async fn bad_rows_fail_individually() -> Result<(), AppError> {
    let state = build_test_state().await?;
    let db = state.db().expect("db");
    let engine = state.engine();
    let raffle = factory::active_raffle(db, 5).await?;
    factory::order(db, engine, raffle.id, &[4]).await?;

    let summary = import_tickets(
        db,
        engine,
        raffle.id,
        vec![
            ImportRow::new("No phone", "n/a", 1),
            ImportRow::new("Eve", "(55) 10-20", 9),
            ImportRow::new("Eve", "551020", 4),
            ImportRow::new("Eve", "55-10-20", 3),
            ImportRow::new("Eve", "551020", 3),
        ],
    )
    .await?;

    assert_eq!(summary.success, 1);
    assert_eq!(summary.failed, 4);
    assert!(summary.errors[0].starts_with("row 1: INVALID_PHONE"));
    assert!(summary.errors[1].starts_with("row 2: TICKET_OUT_OF_RANGE"));
    assert!(summary.errors[2].starts_with("row 3: ALREADY_TAKEN"));
    assert!(summary.errors[3].starts_with("row 5: DUPLICATE_TICKET_IN_REQUEST"));

    assert_eq!(occupancy::occupied_numbers(db, raffle.id).await?, vec![3, 4]);
    assert_eq!(factory::reload_raffle(db, raffle.id).await.sold, 2);
    Ok(())
}

#[tokio::test]
async fn groups_run_in_batches_with_the_import_ttl() -> Result<(), AppError> {
    let cfg = EngineConfig {
        import_batch_size: 2,
        ..Default::default()
    };
    let state = build_test_state_with(Engine::new(cfg)).await?;
    let db = state.db().expect("db");
    let raffle = factory::active_raffle(db, 50).await?;

    let rows: Vec<ImportRow> = (1..=10)
        .map(|n| ImportRow::new(format!("buyer {}", n % 5), format!("90000{}", n % 5), n))
        .collect();
    let before = OffsetDateTime::now_utc();
    let summary = import_tickets(db, state.engine(), raffle.id, rows).await?;

    assert_eq!(summary.success, 10);
    assert_eq!(summary.failed, 0);

    let placed = orders::list_orders(db, raffle.id, None).await?;
    assert_eq!(placed.len(), 5);
    for order in &placed {
        assert_eq!(order.base_ticket_count, 2);
        let ttl = order.expires_at - before;
        assert!(ttl > Duration::days(6) && ttl <= Duration::days(7) + Duration::minutes(1));
    }
    assert_eq!(factory::reload_raffle(db, raffle.id).await.sold, 10);
    Ok(())
}

#[tokio::test]
async fn existing_customer_is_reused() -> Result<(), AppError> {
    let state = build_test_state().await?;
    let db = state.db().expect("db");
    let raffle = factory::active_raffle(db, 5).await?;
    let known = factory::customer(db).await?;

    let summary = import_tickets(
        db,
        state.engine(),
        raffle.id,
        vec![ImportRow::new("Someone Else", known.phone.clone(), 2)],
    )
    .await?;
    assert_eq!(summary.success, 1);

    let placed = orders::list_orders(db, raffle.id, None).await?;
    assert_eq!(placed[0].customer_id, known.id);
    Ok(())
}

#[tokio::test]
async fn missing_raffle_fails_the_whole_import() -> Result<(), AppError> {
    let state = build_test_state().await?;
    let db = state.db().expect("db");

    let err = import_tickets(db, state.engine(), 9_999, vec![ImportRow::new("x", "1", 1)])
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::RaffleNotFound);
    Ok(())
}

#[tokio::test]
async fn group_whose_total_overflows_is_not_imported() -> Result<(), AppError> {
    let state = build_test_state().await?;
    let db = state.db().expect("db");
    let raffle = raffles::create_raffle(db, NewRaffle::new("Jackpot", 5, i64::MAX)).await?;
    let raffle = raffles::publish_raffle(db, raffle.id).await?;

    let summary = import_tickets(
        db,
        state.engine(),
        raffle.id,
        vec![
            ImportRow::new("Ana", "555", 1),
            ImportRow::new("Ana", "555", 2),
            ImportRow::new("Luis", "777", 3),
        ],
    )
    .await?;

    assert_eq!(summary.success, 1);
    assert_eq!(summary.failed, 2);
    assert!(summary.errors[0].starts_with("row 1: ORDER_FAILED"), "{:?}", summary.errors);
    assert!(summary.errors[1].starts_with("row 2: ORDER_FAILED"), "{:?}", summary.errors);

    let placed = orders::list_orders(db, raffle.id, None).await?;
    assert_eq!(placed.len(), 1);
    assert_eq!(placed[0].ticket_numbers, vec![3]);
    assert_eq!(placed[0].total_cents, i64::MAX);
    assert_eq!(factory::reload_raffle(db, raffle.id).await.sold, 1);
    Ok(())
}
