//! Repository functions for the domain layer, generic over ConnectionTrait.

pub mod channels;
pub mod claims;
pub mod customers;
pub mod orders;
pub mod raffles;
