//! Customer repository functions for domain layer.

use sea_orm::ConnectionTrait;
use serde::Serialize;

use crate::adapters::customers_sea as customers_adapter;
use crate::entities::customers;
use crate::errors::domain::DomainError;

/// Customer domain model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub region: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: time::OffsetDateTime,
}

impl From<customers::Model> for Customer {
    fn from(model: customers::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            phone: model.phone,
            email: model.email,
            region: model.region,
            created_at: model.created_at,
        }
    }
}

pub async fn find_by_id<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    customer_id: i64,
) -> Result<Option<Customer>, DomainError> {
    let customer = customers_adapter::find_by_id(conn, customer_id).await?;
    Ok(customer.map(Customer::from))
}

pub async fn find_by_phone<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    phone: &str,
) -> Result<Option<Customer>, DomainError> {
    let customer = customers_adapter::find_by_phone(conn, phone).await?;
    Ok(customer.map(Customer::from))
}

pub async fn find_by_email<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    email: &str,
) -> Result<Option<Customer>, DomainError> {
    let customer = customers_adapter::find_by_email(conn, email).await?;
    Ok(customer.map(Customer::from))
}

pub async fn find_by_phones<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    phones: &[String],
) -> Result<Vec<Customer>, DomainError> {
    let customers = customers_adapter::find_by_phones(conn, phones).await?;
    Ok(customers.into_iter().map(Customer::from).collect())
}

/// Insert-or-fetch by phone. Returns the customer and whether it was created.
pub async fn ensure_by_phone<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: customers_adapter::CustomerCreate,
) -> Result<(Customer, bool), DomainError> {
    let (customer, inserted) = customers_adapter::ensure_by_phone(conn, dto).await?;
    Ok((Customer::from(customer), inserted))
}
