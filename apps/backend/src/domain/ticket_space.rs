//! Numeric ranges of a raffle's sellable and bonus tickets.

use std::collections::HashSet;
use std::ops::RangeInclusive;

use crate::errors::domain::{join_numbers, DomainError, ValidationKind};

/// What a ticket number is being checked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketPurpose {
    /// Bought by a customer: must be in the base range
    Purchase,
    /// Issued free by a bonus draw: must be strictly above the base range
    Bonus,
    /// Held by an existing order: anywhere in the extended range
    Holding,
}

/// Ticket geometry of one raffle.
///
/// Base numbers are `1..=ticket_count`. With bonuses enabled the extended
/// space is `1..=ticket_count * multiplier` and numbers above
/// `ticket_count` are bonus-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TicketSpace {
    ticket_count: i32,
    multiplier: i32,
}

impl TicketSpace {
    /// Validated constructor used when a raffle is created or edited.
    pub fn new(
        ticket_count: i32,
        bonus_enabled: bool,
        bonus_multiplier: i32,
    ) -> Result<Self, DomainError> {
        if ticket_count <= 0 {
            return Err(DomainError::validation(
                ValidationKind::InvalidRaffleConfig,
                "Ticket count must be positive",
            ));
        }
        if bonus_multiplier < 1 {
            return Err(DomainError::validation(
                ValidationKind::InvalidRaffleConfig,
                "Bonus multiplier must be at least 1",
            ));
        }
        if ticket_count.checked_mul(bonus_multiplier).is_none() {
            return Err(DomainError::validation(
                ValidationKind::InvalidRaffleConfig,
                "Ticket count times bonus multiplier is too large",
            ));
        }
        Ok(Self::from_stored(ticket_count, bonus_enabled, bonus_multiplier))
    }

    /// Build from persisted raffle fields, which the schema already constrains.
    pub fn from_stored(ticket_count: i32, bonus_enabled: bool, bonus_multiplier: i32) -> Self {
        let multiplier = if bonus_enabled {
            bonus_multiplier.max(1)
        } else {
            1
        };
        Self {
            ticket_count: ticket_count.max(0),
            multiplier,
        }
    }

    pub fn ticket_count(&self) -> i32 {
        self.ticket_count
    }

    /// Effective copies per purchased ticket (1 when bonuses are disabled)
    pub fn multiplier(&self) -> i32 {
        self.multiplier
    }

    pub fn has_bonus(&self) -> bool {
        self.multiplier > 1
    }

    pub fn base_range(&self) -> RangeInclusive<i32> {
        1..=self.ticket_count
    }

    pub fn extended_range(&self) -> RangeInclusive<i32> {
        1..=self.extended_max()
    }

    /// `(ticket_count, ticket_count * multiplier]`, empty without bonuses
    pub fn bonus_range(&self) -> RangeInclusive<i32> {
        (self.ticket_count + 1)..=self.extended_max()
    }

    pub fn bonus_range_len(&self) -> i64 {
        i64::from(self.extended_max()) - i64::from(self.ticket_count)
    }

    fn extended_max(&self) -> i32 {
        self.ticket_count.saturating_mul(self.multiplier)
    }

    pub fn is_base(&self, number: i32) -> bool {
        self.base_range().contains(&number)
    }

    pub fn is_valid(&self, number: i32, purpose: TicketPurpose) -> bool {
        match purpose {
            TicketPurpose::Purchase => self.base_range().contains(&number),
            TicketPurpose::Bonus => self.bonus_range().contains(&number),
            TicketPurpose::Holding => self.extended_range().contains(&number),
        }
    }

    /// Count of base numbers in a ticket list, i.e. its weight in `sold`.
    pub fn count_base(&self, numbers: &[i32]) -> i32 {
        numbers.iter().filter(|n| self.is_base(**n)).count() as i32
    }

    /// Validate a purchase request: non-empty, in the base range, no repeats.
    pub fn validate_purchase(&self, requested: &[i32]) -> Result<(), DomainError> {
        if requested.is_empty() {
            return Err(DomainError::validation(
                ValidationKind::EmptyTicketRequest,
                "At least one ticket number is required",
            ));
        }
        self.check_range(requested, TicketPurpose::Purchase)?;
        if let Some(dups) = duplicates(requested) {
            return Err(DomainError::validation(
                ValidationKind::DuplicateTicketInRequest,
                format!("Ticket numbers requested more than once: {}", join_numbers(&dups)),
            ));
        }
        Ok(())
    }

    /// Validate a replacement ticket list for an existing order.
    pub fn validate_order_tickets(&self, numbers: &[i32]) -> Result<(), DomainError> {
        if numbers.is_empty() {
            return Err(DomainError::validation(
                ValidationKind::EmptyTicketRequest,
                "An order must hold at least one ticket number",
            ));
        }
        self.check_range(numbers, TicketPurpose::Holding)?;
        if let Some(dups) = duplicates(numbers) {
            return Err(DomainError::validation(
                ValidationKind::DuplicateTicketInOrder,
                format!("Ticket numbers repeated within the order: {}", join_numbers(&dups)),
            ));
        }
        Ok(())
    }

    fn check_range(&self, numbers: &[i32], purpose: TicketPurpose) -> Result<(), DomainError> {
        let mut bad: Vec<i32> = numbers
            .iter()
            .copied()
            .filter(|n| !self.is_valid(*n, purpose))
            .collect();
        if bad.is_empty() {
            return Ok(());
        }
        bad.sort_unstable();
        bad.dedup();
        let range = match purpose {
            TicketPurpose::Purchase => self.base_range(),
            TicketPurpose::Bonus => self.bonus_range(),
            TicketPurpose::Holding => self.extended_range(),
        };
        Err(DomainError::validation(
            ValidationKind::TicketOutOfRange,
            format!(
                "Ticket numbers outside {}..={}: {}",
                range.start(),
                range.end(),
                join_numbers(&bad)
            ),
        ))
    }
}

/// Sorted repeated values, or `None` when every value is unique.
pub fn duplicates(numbers: &[i32]) -> Option<Vec<i32>> {
    let mut seen = HashSet::with_capacity(numbers.len());
    let mut dups: Vec<i32> = numbers
        .iter()
        .copied()
        .filter(|n| !seen.insert(*n))
        .collect();
    if dups.is_empty() {
        return None;
    }
    dups.sort_unstable();
    dups.dedup();
    Some(dups)
}
