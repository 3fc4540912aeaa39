//! Logging helpers shared by services and infrastructure.

pub mod pii;
