//! DTOs for orders_sea adapter.

use time::OffsetDateTime;

use crate::entities::orders::OrderStatus;

/// DTO for inserting a new order row.
#[derive(Debug, Clone)]
pub struct OrderCreate {
    pub folio: String,
    pub raffle_id: i64,
    pub customer_id: i64,
    pub ticket_numbers: Vec<i32>,
    pub base_ticket_count: i32,
    pub total_cents: i64,
    pub status: OrderStatus,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    pub expires_at: OffsetDateTime,
}

/// Partial update of order details. `None` leaves a column unchanged;
/// `Some(None)` clears a nullable column.
#[derive(Debug, Clone, Default)]
pub struct OrderUpdate {
    pub id: i64,
    pub customer_id: Option<i64>,
    pub ticket_numbers: Option<Vec<i32>>,
    pub base_ticket_count: Option<i32>,
    pub total_cents: Option<i64>,
    pub payment_method: Option<Option<String>>,
    pub notes: Option<Option<String>>,
    /// Apply only while the order still has this status
    pub expected_status: Option<OrderStatus>,
}

impl OrderUpdate {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    pub fn with_tickets(mut self, ticket_numbers: Vec<i32>, base_ticket_count: i32) -> Self {
        self.ticket_numbers = Some(ticket_numbers);
        self.base_ticket_count = Some(base_ticket_count);
        self
    }

    pub fn with_total_cents(mut self, total_cents: i64) -> Self {
        self.total_cents = Some(total_cents);
        self
    }

    pub fn with_customer_id(mut self, customer_id: i64) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    pub fn with_payment_method(mut self, payment_method: Option<String>) -> Self {
        self.payment_method = Some(payment_method);
        self
    }

    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = Some(notes);
        self
    }

    pub fn expecting(mut self, status: OrderStatus) -> Self {
        self.expected_status = Some(status);
        self
    }
}

/// Guarded status change: applies only while the order is still `expected`.
#[derive(Debug, Clone, Copy)]
pub struct OrderSetStatus {
    pub id: i64,
    pub expected: OrderStatus,
    pub to: OrderStatus,
}
