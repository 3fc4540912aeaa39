//! SeaORM adapter for contact channels and their rotation cursor.

use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, NotSet, QueryFilter, QueryOrder, Set,
};

use crate::entities::{channel_rotation, contact_channels};

pub mod dto;

pub use dto::ChannelCreate;

pub async fn list_all<C: ConnectionTrait + Send + Sync>(
    conn: &C,
) -> Result<Vec<contact_channels::Model>, sea_orm::DbErr> {
    contact_channels::Entity::find()
        .order_by_asc(contact_channels::Column::Position)
        .order_by_asc(contact_channels::Column::Id)
        .all(conn)
        .await
}

pub async fn list_by_role<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    role: &str,
) -> Result<Vec<contact_channels::Model>, sea_orm::DbErr> {
    contact_channels::Entity::find()
        .filter(contact_channels::Column::Role.eq(role))
        .order_by_asc(contact_channels::Column::Position)
        .order_by_asc(contact_channels::Column::Id)
        .all(conn)
        .await
}

/// Replace the whole channel list, preserving the given order as `position`.
///
/// The rotation table is deliberately not touched.
pub async fn replace_all<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    channels: Vec<ChannelCreate>,
) -> Result<Vec<contact_channels::Model>, sea_orm::DbErr> {
    contact_channels::Entity::delete_many().exec(conn).await?;

    if !channels.is_empty() {
        let now = time::OffsetDateTime::now_utc();
        let rows = channels
            .into_iter()
            .enumerate()
            .map(|(position, c)| contact_channels::ActiveModel {
                id: NotSet,
                phone: Set(c.phone),
                display_name: Set(c.display_name),
                active: Set(c.active),
                role: Set(c.role),
                assigned_raffle_ids: Set(serde_json::Value::from(c.assigned_raffle_ids)),
                position: Set(position as i32),
                created_at: Set(now),
                updated_at: Set(now),
            });
        contact_channels::Entity::insert_many(rows)
            .exec_without_returning(conn)
            .await?;
    }

    list_all(conn).await
}

/// Create the rotation row for `role` at zero if it does not exist yet.
pub async fn ensure_rotation_row<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    role: &str,
) -> Result<(), sea_orm::DbErr> {
    let row = channel_rotation::ActiveModel {
        role: Set(role.to_string()),
        next_index: Set(0),
        updated_at: Set(time::OffsetDateTime::now_utc()),
    };

    channel_rotation::Entity::insert(row)
        .on_conflict(
            OnConflict::column(channel_rotation::Column::Role)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;
    Ok(())
}

/// Atomically bump `next_index` for `role` and return the value it held
/// before the increment.
///
/// The increment is a single `UPDATE ... SET next_index = next_index + 1`;
/// inside a transaction the row lock serializes concurrent callers, so no two
/// calls observe the same pre-increment value.
pub async fn advance_rotation<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    role: &str,
) -> Result<i64, sea_orm::DbErr> {
    ensure_rotation_row(conn, role).await?;

    let now = time::OffsetDateTime::now_utc();
    channel_rotation::Entity::update_many()
        .col_expr(
            channel_rotation::Column::NextIndex,
            Expr::col(channel_rotation::Column::NextIndex).add(1),
        )
        .col_expr(channel_rotation::Column::UpdatedAt, Expr::val(now).into())
        .filter(channel_rotation::Column::Role.eq(role))
        .exec(conn)
        .await?;

    let row = current_rotation(conn, role).await?.ok_or_else(|| {
        sea_orm::DbErr::RecordNotFound("channel_rotation.role not found".to_string())
    })?;
    Ok(row.next_index - 1)
}

pub async fn current_rotation<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    role: &str,
) -> Result<Option<channel_rotation::Model>, sea_orm::DbErr> {
    channel_rotation::Entity::find_by_id(role.to_string())
        .one(conn)
        .await
}
