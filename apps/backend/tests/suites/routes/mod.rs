pub mod channels;
pub mod error_shape;
pub mod healthcheck;
pub mod orders;
pub mod raffles;
