//! Test helpers for generating unique test data
//!
//! ULIDs keep test data isolated when several tests share one database.

use ulid::Ulid;

/// Generate a unique string with the given prefix
///
/// # Examples
/// ```
/// use backend_test_support::unique_helpers::unique_str;
///
/// let id1 = unique_str("raffle");
/// let id2 = unique_str("raffle");
/// assert_ne!(id1, id2);
/// assert!(id1.starts_with("raffle-"));
/// ```
pub fn unique_str(prefix: &str) -> String {
    format!("{}-{}", prefix, Ulid::new())
}

/// Generate a unique, digits-only phone number.
///
/// The low 40 bits of a fresh ULID are rendered as a zero-padded
/// 13-digit number behind a fixed country prefix, so values survive
/// phone normalization unchanged.
///
/// # Examples
/// ```
/// use backend_test_support::unique_helpers::unique_phone;
///
/// let p = unique_phone();
/// assert!(p.chars().all(|c| c.is_ascii_digit()));
/// assert_ne!(p, unique_phone());
/// ```
pub fn unique_phone() -> String {
    let raw = Ulid::new().0;
    format!("52{:013}", (raw & 0xFF_FFFF_FFFF) as u64)
}

/// Generate a unique email address with the given prefix
pub fn unique_email(prefix: &str) -> String {
    format!("{}-{}@example.test", prefix, Ulid::new())
}
