//! Domain layer: pure ticket, bonus and order-status logic (no I/O).

pub mod bonus;
pub mod folio;
pub mod order_status;
pub mod phone;
pub mod ticket_space;

#[cfg(test)]
mod tests_props_bonus;

pub use bonus::{BonusAllocator, BonusDraw, EntropySource, FallbackCursor, ThreadEntropy};
pub use order_status::{OrderEvent, Transition};
pub use ticket_space::TicketSpace;
