use std::collections::HashSet;
use std::sync::Arc;

use raffle_backend::db::txn::run_in_txn;
use raffle_backend::domain::{BonusDraw, EntropySource, FallbackCursor};
use raffle_backend::errors::ErrorCode;
use raffle_backend::repos::orders::Order;
use raffle_backend::services::occupancy;
use raffle_backend::services::orders::{self, CreateOrder, OrderPatch};
use raffle_backend::{AppError, Engine, EngineConfig};
use sea_orm::DatabaseConnection;

use crate::support::factory;
use crate::support::{build_test_state, build_test_state_with};

/// Entropy that keeps landing on the same number.
struct Stuck(i32);

impl EntropySource for Stuck {
    fn next_in(&self, _low: i32, _high: i32) -> i32 {
        self.0
    }
}

fn stuck_engine(number: i32) -> Engine {
    let cfg = EngineConfig {
        bonus_max_attempts: 3,
        ..Default::default()
    };
    Engine::new(cfg)
        .with_entropy(Arc::new(Stuck(number)))
        .with_cursor(FallbackCursor::starting_at(0))
}

async fn place_in_txn(
    db: &DatabaseConnection,
    engine: &Engine,
    req: CreateOrder,
    draw: BonusDraw,
) -> Result<Order, AppError> {
    let engine = engine.clone();
    run_in_txn(db, move |txn| {
        Box::pin(async move { orders::place_order(txn, &engine, req, draw).await })
    })
    .await
}

#[tokio::test]
async fn bonus_numbers_stay_in_range_and_avoid_occupied() -> Result<(), AppError> {
    let state = build_test_state().await?;
    let db = state.db().expect("db");
    let engine = state.engine();
    let raffle = factory::bonus_raffle(db, 100, 3).await?;

    for tickets in [[1, 2], [3, 4], [50, 100]] {
        let occupied_before: HashSet<i32> = occupancy::occupied_numbers(db, raffle.id)
            .await?
            .into_iter()
            .collect();

        let order = factory::order(db, engine, raffle.id, &tickets).await?;

        assert_eq!(&order.ticket_numbers[..2], &tickets[..]);
        let bonus = &order.ticket_numbers[2..];
        assert_eq!(bonus.len(), 4);
        let unique: HashSet<i32> = bonus.iter().copied().collect();
        assert_eq!(unique.len(), 4);
        for n in bonus {
            assert!((101..=300).contains(n), "bonus {n} outside (100, 300]");
            assert!(!occupied_before.contains(n), "bonus {n} was already held");
        }
        // bonus tickets are free
        assert_eq!(order.total_cents, 2 * factory::PRICE_CENTS);
    }

    assert_eq!(factory::reload_raffle(db, raffle.id).await.sold, 6);
    assert_eq!(occupancy::occupied_numbers(db, raffle.id).await?.len(), 18);
    Ok(())
}

#[tokio::test]
async fn forced_fallback_walks_from_the_cursor() -> Result<(), AppError> {
    let cfg = EngineConfig {
        bonus_max_attempts: 3,
        ..Default::default()
    };
    let engine = Engine::new(cfg)
        .with_entropy(Arc::new(Stuck(11)))
        .with_cursor(FallbackCursor::starting_at(0));
    let state = build_test_state_with(engine).await?;
    let db = state.db().expect("db");
    let raffle = factory::bonus_raffle(db, 10, 2).await?;

    // sampling gets 11 while it is free
    let first = factory::order(db, state.engine(), raffle.id, &[1]).await?;
    assert_eq!(first.ticket_numbers, vec![1, 11]);

    // then every sample misses and the probe takes over: cursor 0 -> 11 (held) -> 12
    let second = factory::order(db, state.engine(), raffle.id, &[2]).await?;
    assert_eq!(second.ticket_numbers, vec![2, 12]);

    // cursor 1 -> 12 (held) -> 13
    let third = factory::order(db, state.engine(), raffle.id, &[3]).await?;
    assert_eq!(third.ticket_numbers, vec![3, 13]);
    Ok(())
}

#[tokio::test]
async fn nearly_saturated_bonus_range_still_sells() -> Result<(), AppError> {
    let engine = Engine::default().with_entropy(Arc::new(Stuck(3)));
    let state = build_test_state_with(engine).await?;
    let db = state.db().expect("db");
    let raffle = factory::bonus_raffle(db, 2, 2).await?;

    let a = factory::order(db, state.engine(), raffle.id, &[1]).await?;
    let b = factory::order(db, state.engine(), raffle.id, &[2]).await?;

    assert_eq!(a.ticket_numbers, vec![1, 3]);
    assert_eq!(b.ticket_numbers, vec![2, 4]);
    assert_eq!(occupancy::occupied_numbers(db, raffle.id).await?, vec![1, 2, 3, 4]);
    Ok(())
}

#[tokio::test]
async fn bonus_number_taken_after_the_draw_is_redrawn() -> Result<(), AppError> {
    let state = build_test_state_with(stuck_engine(5)).await?;
    let db = state.db().expect("db");
    let engine = state.engine();
    // bonus range is 4..=6
    let raffle = factory::bonus_raffle(db, 3, 2).await?;

    let buyer = factory::customer(db).await?;
    let req = CreateOrder::new(raffle.id, buyer.id, vec![1]);
    let draw = orders::draw_numbers(db, engine, &req).await?;
    assert_eq!(draw.bonus, vec![5]);

    // another order gets 5 before ours is placed
    let rival = factory::order(db, engine, raffle.id, &[2]).await?;
    assert_eq!(rival.ticket_numbers, vec![2, 5]);

    // 5 is lost at claim time; the redraw misses on 5 and scans from 4
    let placed = place_in_txn(db, engine, req, draw).await?;
    assert_eq!(placed.ticket_numbers, vec![1, 4]);
    assert_eq!(placed.base_ticket_count, 1);
    assert_eq!(orders::get_order(db, placed.id).await?.ticket_numbers, vec![1, 4]);
    assert_eq!(factory::reload_raffle(db, raffle.id).await.sold, 2);
    assert_eq!(occupancy::occupied_numbers(db, raffle.id).await?, vec![1, 2, 4, 5]);
    Ok(())
}

#[tokio::test]
async fn purchased_number_taken_after_the_draw_fails_the_order() -> Result<(), AppError> {
    let state = build_test_state().await?;
    let db = state.db().expect("db");
    let engine = state.engine();
    let raffle = factory::active_raffle(db, 10).await?;

    let buyer = factory::customer(db).await?;
    let req = CreateOrder::new(raffle.id, buyer.id, vec![3, 4]);
    let draw = orders::draw_numbers(db, engine, &req).await?;

    factory::order(db, engine, raffle.id, &[4]).await?;

    let err = place_in_txn(db, engine, req, draw).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::TicketsAlreadyTaken);
    assert_eq!(err.taken_numbers(), Some(&[4][..]));

    // the order row and the claim on 3 were rolled back
    assert_eq!(orders::list_orders(db, raffle.id, None).await?.len(), 1);
    assert_eq!(occupancy::occupied_numbers(db, raffle.id).await?, vec![4]);
    assert_eq!(factory::reload_raffle(db, raffle.id).await.sold, 1);
    Ok(())
}

#[tokio::test]
async fn redraw_into_a_full_bonus_range_is_capacity_exhausted() -> Result<(), AppError> {
    let state = build_test_state_with(stuck_engine(5)).await?;
    let db = state.db().expect("db");
    let engine = state.engine();
    let raffle = factory::bonus_raffle(db, 3, 2).await?;

    let buyer = factory::customer(db).await?;
    let req = CreateOrder::new(raffle.id, buyer.id, vec![1]);
    let draw = orders::draw_numbers(db, engine, &req).await?;
    assert_eq!(draw.bonus, vec![5]);

    // the rival ends up holding the whole bonus range
    let rival = factory::order(db, engine, raffle.id, &[2]).await?;
    orders::edit_order(
        db,
        rival.id,
        OrderPatch {
            ticket_numbers: Some(vec![2, 4, 5, 6]),
            ..Default::default()
        },
    )
    .await?;

    let err = place_in_txn(db, engine, req, draw).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::CapacityExhausted);
    assert_eq!(factory::reload_raffle(db, raffle.id).await.sold, 1);
    assert_eq!(occupancy::occupied_numbers(db, raffle.id).await?, vec![2, 4, 5, 6]);
    Ok(())
}

#[tokio::test]
async fn placing_a_draw_for_other_tickets_is_rejected() -> Result<(), AppError> {
    let state = build_test_state().await?;
    let db = state.db().expect("db");
    let engine = state.engine();
    let raffle = factory::active_raffle(db, 10).await?;
    let buyer = factory::customer(db).await?;

    let draw = orders::draw_numbers(db, engine, &CreateOrder::new(raffle.id, buyer.id, vec![1])).await?;
    let err = place_in_txn(db, engine, CreateOrder::new(raffle.id, buyer.id, vec![2]), draw)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValidationError);
    assert!(occupancy::occupied_numbers(db, raffle.id).await?.is_empty());
    Ok(())
}
