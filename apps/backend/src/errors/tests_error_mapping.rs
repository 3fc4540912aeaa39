// Unit tests for error mapping - pure domain logic without HTTP or database dependencies
use crate::errors::domain::{
    ConflictKind, DomainError, InfraErrorKind, NotFoundKind, ValidationKind,
};
use crate::errors::ErrorCode;
use crate::AppError;

#[test]
fn maps_validation_to_422() {
    let de = DomainError::validation(ValidationKind::DuplicateTicketInRequest, "ticket 4 twice");
    let app: AppError = de.into();
    assert_eq!(app.code(), ErrorCode::DuplicateTicketInRequest);
    assert_eq!(app.status().as_u16(), 422);

    let other = DomainError::validation_other("bad field");
    let app: AppError = other.into();
    assert_eq!(app.code(), ErrorCode::ValidationError);
}

#[test]
fn maps_tickets_taken_with_numbers() {
    let de = DomainError::tickets_taken(vec![9, 2]);
    let app: AppError = de.into();
    assert_eq!(app.code().as_str(), "TICKETS_ALREADY_TAKEN");
    assert_eq!(app.status().as_u16(), 409);
    assert_eq!(app.taken_numbers(), Some(&[2, 9][..]));
}

#[test]
fn maps_conflicts() {
    let transition = DomainError::conflict(ConflictKind::InvalidTransition, "terminal");
    let app: AppError = transition.into();
    assert_eq!(app.code().as_str(), "INVALID_TRANSITION");
    assert_eq!(app.status().as_u16(), 409);

    let inactive = DomainError::conflict(ConflictKind::RaffleNotActive, "draft");
    let app: AppError = inactive.into();
    assert_eq!(app.code().as_str(), "RAFFLE_NOT_ACTIVE");

    let other = DomainError::conflict(ConflictKind::Other("x".to_string()), "generic conflict");
    let app: AppError = other.into();
    assert_eq!(app.code().as_str(), "CONFLICT");
    assert_eq!(app.status().as_u16(), 409);
}

#[test]
fn maps_not_found() {
    let nf = DomainError::not_found(NotFoundKind::Order, "no order");
    let app: AppError = nf.into();
    assert_eq!(app.code().as_str(), "ORDER_NOT_FOUND");
    assert_eq!(app.status().as_u16(), 404);

    let nf = DomainError::not_found(NotFoundKind::Raffle, "no raffle");
    let app: AppError = nf.into();
    assert_eq!(app.code().as_str(), "RAFFLE_NOT_FOUND");
}

#[test]
fn maps_infra() {
    let t = DomainError::infra(InfraErrorKind::Timeout, "timeout");
    let app: AppError = t.into();
    assert_eq!(app.code().as_str(), "DB_TIMEOUT");
    assert_eq!(app.status().as_u16(), 504);
    assert!(matches!(app, AppError::Timeout { .. }));

    let down = DomainError::infra(InfraErrorKind::DbUnavailable, "down");
    let app: AppError = down.into();
    assert_eq!(app.code().as_str(), "DB_UNAVAILABLE");
    assert_eq!(app.status().as_u16(), 503);

    let corrupt = DomainError::infra(InfraErrorKind::DataCorruption, "bad json");
    let app: AppError = corrupt.into();
    assert_eq!(app.code().as_str(), "DATA_CORRUPTION");
    assert_eq!(app.status().as_u16(), 500);
}
