//! Error codes for the raffle backend API.
//!
//! Add new codes here; never pass ad-hoc strings as error codes.
//! All codes are SCREAMING_SNAKE_CASE and map 1:1 to the strings that
//! appear in HTTP responses.

use core::fmt;

/// Centralized error codes for the raffle backend API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Request Validation
    /// Ticket number outside the applicable range
    TicketOutOfRange,
    /// Same ticket number requested twice
    DuplicateTicketInRequest,
    /// Same ticket number listed twice in an order edit
    DuplicateTicketInOrder,
    /// Purchase request without ticket numbers
    EmptyTicketRequest,
    /// Phone number normalizes to nothing
    InvalidPhone,
    /// Raffle parameters out of bounds
    InvalidRaffleConfig,
    /// General validation error
    ValidationError,
    /// General bad request error
    BadRequest,

    // Resource Not Found
    RaffleNotFound,
    OrderNotFound,
    CustomerNotFound,
    /// General not found error
    NotFound,

    // Business Logic Conflicts
    /// Requested numbers are held by another live order
    TicketsAlreadyTaken,
    /// Order status state machine violation
    InvalidTransition,
    /// Raffle is not accepting orders
    RaffleNotActive,
    /// Price or ticket count changed after orders exist
    RaffleLocked,
    /// No room left in the sellable or bonus range
    CapacityExhausted,
    /// Customer phone already registered
    UniquePhone,
    /// Folio collision
    FolioConflict,
    /// Concurrent modification of the same order
    ConcurrentUpdate,
    /// Generic conflict (fallback for unmatched conflicts)
    Conflict,

    // System Errors
    DbError,
    DbUnavailable,
    DbTimeout,
    Internal,
    ConfigError,
    DataCorruption,
}

impl ErrorCode {
    /// Returns the canonical SCREAMING_SNAKE_CASE string for this error code.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::TicketOutOfRange => "TICKET_OUT_OF_RANGE",
            Self::DuplicateTicketInRequest => "DUPLICATE_TICKET_IN_REQUEST",
            Self::DuplicateTicketInOrder => "DUPLICATE_TICKET_IN_ORDER",
            Self::EmptyTicketRequest => "EMPTY_TICKET_REQUEST",
            Self::InvalidPhone => "INVALID_PHONE",
            Self::InvalidRaffleConfig => "INVALID_RAFFLE_CONFIG",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::BadRequest => "BAD_REQUEST",

            Self::RaffleNotFound => "RAFFLE_NOT_FOUND",
            Self::OrderNotFound => "ORDER_NOT_FOUND",
            Self::CustomerNotFound => "CUSTOMER_NOT_FOUND",
            Self::NotFound => "NOT_FOUND",

            Self::TicketsAlreadyTaken => "TICKETS_ALREADY_TAKEN",
            Self::InvalidTransition => "INVALID_TRANSITION",
            Self::RaffleNotActive => "RAFFLE_NOT_ACTIVE",
            Self::RaffleLocked => "RAFFLE_LOCKED",
            Self::CapacityExhausted => "CAPACITY_EXHAUSTED",
            Self::UniquePhone => "UNIQUE_PHONE",
            Self::FolioConflict => "FOLIO_CONFLICT",
            Self::ConcurrentUpdate => "CONCURRENT_UPDATE",
            Self::Conflict => "CONFLICT",

            Self::DbError => "DB_ERROR",
            Self::DbUnavailable => "DB_UNAVAILABLE",
            Self::DbTimeout => "DB_TIMEOUT",
            Self::Internal => "INTERNAL",
            Self::ConfigError => "CONFIG_ERROR",
            Self::DataCorruption => "DATA_CORRUPTION",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
