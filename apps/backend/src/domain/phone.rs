use crate::errors::domain::{DomainError, ValidationKind};

/// Strip everything but ASCII digits; `None` when nothing is left.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    (!digits.is_empty()).then_some(digits)
}

pub fn require_phone(raw: &str) -> Result<String, DomainError> {
    normalize_phone(raw).ok_or_else(|| {
        DomainError::validation(ValidationKind::InvalidPhone, "Phone number has no digits")
    })
}
