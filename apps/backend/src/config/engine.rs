//! Tunables for order lifecycle, bulk import, bonus draws and channel rotation.

use std::env;

use time::Duration;

use crate::error::AppError;

/// Single legacy contact used when no configured channel is eligible
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyContact {
    pub phone: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Lifetime of a PENDING order created through `create_order`
    pub order_ttl: Duration,
    /// Lifetime of a PENDING order materialized by the bulk importer
    pub import_ttl: Duration,
    /// Number of customer groups the importer runs concurrently
    pub import_batch_size: usize,
    /// Rejection-sampling attempts per bonus number before the fallback cursor
    pub bonus_max_attempts: u32,
    pub legacy_contact: Option<LegacyContact>,
    /// Channel role eligible for reservation contact
    pub contact_role: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            order_ttl: Duration::hours(24),
            import_ttl: Duration::days(7),
            import_batch_size: 50,
            bonus_max_attempts: 1000,
            legacy_contact: None,
            contact_role: "reservations".to_string(),
        }
    }
}

impl EngineConfig {
    /// Read the configuration from process environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// Unset keys keep their defaults; set but malformed values are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(hours) = parse_positive::<i64>(&lookup, "RAFFLE_ORDER_TTL_HOURS")? {
            cfg.order_ttl = Duration::hours(hours);
        }
        if let Some(days) = parse_positive::<i64>(&lookup, "RAFFLE_IMPORT_TTL_DAYS")? {
            cfg.import_ttl = Duration::days(days);
        }
        if let Some(size) = parse_positive::<usize>(&lookup, "RAFFLE_IMPORT_BATCH_SIZE")? {
            cfg.import_batch_size = size;
        }
        if let Some(attempts) = parse_positive::<u32>(&lookup, "RAFFLE_BONUS_MAX_ATTEMPTS")? {
            cfg.bonus_max_attempts = attempts;
        }
        if let Some(role) = non_empty(&lookup, "RAFFLE_CONTACT_ROLE") {
            cfg.contact_role = role;
        }

        cfg.legacy_contact = non_empty(&lookup, "RAFFLE_LEGACY_CONTACT_PHONE").map(|phone| {
            let display_name = non_empty(&lookup, "RAFFLE_LEGACY_CONTACT_NAME")
                .unwrap_or_else(|| phone.clone());
            LegacyContact {
                phone,
                display_name,
            }
        });

        Ok(cfg)
    }
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_positive<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>, AppError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    let Some(raw) = non_empty(lookup, key) else {
        return Ok(None);
    };
    match raw.parse::<T>() {
        Ok(v) if v > T::default() => Ok(Some(v)),
        _ => Err(AppError::config(format!(
            "{key} must be a positive integer, got '{raw}'"
        ))),
    }
}
