//! Adapters for external dependencies.

pub mod channels_sea;
pub mod claims_sea;
pub mod customers_sea;
pub mod orders_sea;
pub mod raffles_sea;
