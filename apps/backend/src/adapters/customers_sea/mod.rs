//! SeaORM adapter for customers.

use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, NotSet, QueryFilter, Set};

use crate::entities::customers;

pub mod dto;

pub use dto::CustomerCreate;

pub async fn find_by_id<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    customer_id: i64,
) -> Result<Option<customers::Model>, sea_orm::DbErr> {
    customers::Entity::find_by_id(customer_id).one(conn).await
}

pub async fn find_by_phone<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    phone: &str,
) -> Result<Option<customers::Model>, sea_orm::DbErr> {
    customers::Entity::find()
        .filter(customers::Column::Phone.eq(phone))
        .one(conn)
        .await
}

pub async fn find_by_email<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    email: &str,
) -> Result<Option<customers::Model>, sea_orm::DbErr> {
    customers::Entity::find()
        .filter(customers::Column::Email.eq(email))
        .one(conn)
        .await
}

/// Bulk lookup used by the importer to prefetch existing customers.
pub async fn find_by_phones<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    phones: &[String],
) -> Result<Vec<customers::Model>, sea_orm::DbErr> {
    if phones.is_empty() {
        return Ok(Vec::new());
    }
    customers::Entity::find()
        .filter(customers::Column::Phone.is_in(phones.iter().cloned()))
        .all(conn)
        .await
}

/// Insert the customer unless the phone is already registered, then fetch it.
///
/// Returns the stored row and whether this call created it. An existing
/// customer keeps its stored name/email/region.
pub async fn ensure_by_phone<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: CustomerCreate,
) -> Result<(customers::Model, bool), sea_orm::DbErr> {
    let now = time::OffsetDateTime::now_utc();
    let phone = dto.phone.clone();

    let customer_active = customers::ActiveModel {
        id: NotSet,
        name: Set(dto.name),
        phone: Set(dto.phone),
        email: Set(dto.email),
        region: Set(dto.region),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let rows = customers::Entity::insert(customer_active)
        .on_conflict(
            OnConflict::column(customers::Column::Phone)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;

    let inserted = rows == 1;
    let customer = find_by_phone(conn, &phone)
        .await?
        .ok_or_else(|| sea_orm::DbErr::RecordNotFound("customers.phone not found".to_string()))?;

    Ok((customer, inserted))
}
