//! Customer directory sub-routine used by order creation and bulk import.

use sea_orm::ConnectionTrait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::adapters::customers_sea::CustomerCreate;
use crate::domain::phone::require_phone;
use crate::error::AppError;
use crate::errors::domain::{DomainError, NotFoundKind};
use crate::logging::pii::Redacted;
use crate::repos::customers::{self, Customer};

#[derive(Debug, Clone, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub region: Option<String>,
}

impl NewCustomer {
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
            email: None,
            region: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Return the customer matching the phone (normalized) or email, creating
/// one when neither matches.
///
/// Creation is insert-or-ignore on the unique phone followed by a re-fetch,
/// so two concurrent first orders from the same phone share one customer.
pub async fn ensure_customer<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    new: NewCustomer,
) -> Result<Customer, AppError> {
    let phone = require_phone(&new.phone)?;
    let email = new
        .email
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty());

    if let Some(found) = customers::find_by_phone(conn, &phone).await? {
        debug!(customer_id = found.id, phone = %Redacted(&phone), "customer matched by phone");
        return Ok(found);
    }
    if let Some(email) = email.as_deref() {
        if let Some(found) = customers::find_by_email(conn, email).await? {
            debug!(customer_id = found.id, email = %Redacted(email), "customer matched by email");
            return Ok(found);
        }
    }

    let name = new.name.trim();
    let name = if name.is_empty() { phone.clone() } else { name.to_string() };
    let mut dto = CustomerCreate::new(name, phone.clone());
    if let Some(email) = email {
        dto = dto.with_email(email);
    }
    if let Some(region) = new.region.filter(|r| !r.trim().is_empty()) {
        dto = dto.with_region(region);
    }

    let (customer, inserted) = customers::ensure_by_phone(conn, dto).await?;
    if inserted {
        info!(customer_id = customer.id, phone = %Redacted(&phone), "customer created");
    }
    Ok(customer)
}

pub async fn require_customer<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    customer_id: i64,
) -> Result<Customer, DomainError> {
    customers::find_by_id(conn, customer_id).await?.ok_or_else(|| {
        DomainError::not_found(
            NotFoundKind::Customer,
            format!("Customer {customer_id} not found"),
        )
    })
}
