//! SeaORM adapter for raffles - generic over ConnectionTrait.

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, NotSet, PaginatorTrait,
    QueryFilter, Set,
};

use crate::entities::orders::{self, OrderStatus};
use crate::entities::raffles;
use crate::infra::db_errors::custom;

pub mod dto;

pub use dto::{RaffleCreate, RaffleSetStatus, RaffleUpdate};

// Adapter functions return DbErr; repos layer maps to DomainError via From<DbErr>.

fn not_found(id: i64) -> sea_orm::DbErr {
    sea_orm::DbErr::Custom(format!("{}{id}", custom::RAFFLE_NOT_FOUND))
}

pub async fn find_by_id<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    raffle_id: i64,
) -> Result<Option<raffles::Model>, sea_orm::DbErr> {
    raffles::Entity::find_by_id(raffle_id).one(conn).await
}

pub async fn require_raffle<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    raffle_id: i64,
) -> Result<raffles::Model, sea_orm::DbErr> {
    find_by_id(conn, raffle_id)
        .await?
        .ok_or_else(|| not_found(raffle_id))
}

pub async fn list_all<C: ConnectionTrait + Send + Sync>(
    conn: &C,
) -> Result<Vec<raffles::Model>, sea_orm::DbErr> {
    use sea_orm::QueryOrder;

    raffles::Entity::find()
        .order_by_asc(raffles::Column::Id)
        .all(conn)
        .await
}

pub async fn create_raffle<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: RaffleCreate,
) -> Result<raffles::Model, sea_orm::DbErr> {
    let now = time::OffsetDateTime::now_utc();
    let raffle_active = raffles::ActiveModel {
        id: NotSet,
        title: Set(dto.title),
        ticket_count: Set(dto.ticket_count),
        price_cents: Set(dto.price_cents),
        sold: Set(0),
        bonus_enabled: Set(dto.bonus_enabled),
        bonus_multiplier: Set(dto.bonus_multiplier),
        status: Set(raffles::RaffleStatus::Draft),
        created_at: Set(now),
        updated_at: Set(now),
    };

    raffle_active.insert(conn).await
}

/// Move a raffle from `dto.from` to `dto.to`.
///
/// Returns `Ok(None)` when the raffle exists but is no longer in `dto.from`.
pub async fn set_status<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: RaffleSetStatus,
) -> Result<Option<raffles::Model>, sea_orm::DbErr> {
    let now = time::OffsetDateTime::now_utc();
    let result = raffles::Entity::update_many()
        .col_expr(raffles::Column::Status, Expr::val(dto.to).into())
        .col_expr(raffles::Column::UpdatedAt, Expr::val(now).into())
        .filter(raffles::Column::Id.eq(dto.id))
        .filter(raffles::Column::Status.eq(dto.from))
        .exec(conn)
        .await?;

    let raffle = require_raffle(conn, dto.id).await?;
    if result.rows_affected == 0 {
        return Ok(None);
    }
    Ok(Some(raffle))
}

pub async fn update_details<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: RaffleUpdate,
) -> Result<raffles::Model, sea_orm::DbErr> {
    let now = time::OffsetDateTime::now_utc();
    let mut update = raffles::Entity::update_many()
        .col_expr(raffles::Column::UpdatedAt, Expr::val(now).into())
        .filter(raffles::Column::Id.eq(dto.id));

    if let Some(title) = dto.title {
        update = update.col_expr(raffles::Column::Title, Expr::val(title).into());
    }
    if let Some(count) = dto.ticket_count {
        update = update.col_expr(raffles::Column::TicketCount, Expr::val(count).into());
    }
    if let Some(price) = dto.price_cents {
        update = update.col_expr(raffles::Column::PriceCents, Expr::val(price).into());
    }
    if let Some(enabled) = dto.bonus_enabled {
        update = update.col_expr(raffles::Column::BonusEnabled, Expr::val(enabled).into());
    }
    if let Some(multiplier) = dto.bonus_multiplier {
        update = update.col_expr(raffles::Column::BonusMultiplier, Expr::val(multiplier).into());
    }

    let result = update.exec(conn).await?;
    if result.rows_affected == 0 {
        return Err(not_found(dto.id));
    }
    require_raffle(conn, dto.id).await
}

/// Atomically move the `sold` counter by `delta`.
///
/// The update is a single guarded statement: increments apply only while
/// `sold + delta <= ticket_count`, decrements only while `sold >= -delta`.
/// A guard miss on an existing raffle becomes a structured `DbErr::Custom`.
pub async fn adjust_sold<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    raffle_id: i64,
    delta: i32,
) -> Result<raffles::Model, sea_orm::DbErr> {
    if delta == 0 {
        return require_raffle(conn, raffle_id).await;
    }

    let now = time::OffsetDateTime::now_utc();
    let mut update = raffles::Entity::update_many()
        .col_expr(raffles::Column::Sold, Expr::col(raffles::Column::Sold).add(delta))
        .col_expr(raffles::Column::UpdatedAt, Expr::val(now).into())
        .filter(raffles::Column::Id.eq(raffle_id));

    update = if delta > 0 {
        update.filter(
            Expr::expr(Expr::col(raffles::Column::Sold).add(delta))
                .lte(Expr::col(raffles::Column::TicketCount)),
        )
    } else {
        update.filter(raffles::Column::Sold.gte(-delta))
    };

    let result = update.exec(conn).await?;
    if result.rows_affected == 0 {
        let raffle = require_raffle(conn, raffle_id).await?;
        let payload = if delta > 0 {
            format!(
                "{}{{\"raffle_id\":{},\"requested\":{}}}",
                custom::CAPACITY_EXHAUSTED,
                raffle.id,
                delta
            )
        } else {
            format!(
                "{}{{\"raffle_id\":{},\"sold\":{},\"delta\":{}}}",
                custom::SOLD_UNDERFLOW,
                raffle.id,
                raffle.sold,
                delta
            )
        };
        return Err(sea_orm::DbErr::Custom(payload));
    }

    require_raffle(conn, raffle_id).await
}

/// Orders on the raffle that still hold numbers (PENDING or PAID).
pub async fn count_live_orders<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    raffle_id: i64,
) -> Result<u64, sea_orm::DbErr> {
    orders::Entity::find()
        .filter(orders::Column::RaffleId.eq(raffle_id))
        .filter(orders::Column::Status.is_in(OrderStatus::LIVE))
        .count(conn)
        .await
}

/// Sum of `base_ticket_count` over live orders; what `sold` must equal.
pub async fn live_base_total<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    raffle_id: i64,
) -> Result<i64, sea_orm::DbErr> {
    let live = orders::Entity::find()
        .filter(orders::Column::RaffleId.eq(raffle_id))
        .filter(orders::Column::Status.is_in(OrderStatus::LIVE))
        .all(conn)
        .await?;
    Ok(live.iter().map(|o| i64::from(o.base_ticket_count)).sum())
}
