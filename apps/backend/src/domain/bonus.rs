//! Bonus ticket allocation.
//!
//! Each purchased number earns `multiplier - 1` free numbers drawn from the
//! bonus range `(ticket_count, ticket_count * multiplier]`. Draws use
//! rejection sampling against an occupancy snapshot; after `max_attempts`
//! misses for one number the allocator falls back to a linear probe from a
//! monotonic cursor, so a nearly saturated range still makes progress.
//!
//! The result is only as fresh as the snapshot it was given. Callers must
//! claim the numbers atomically afterwards.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use rand::Rng;

use super::ticket_space::TicketSpace;
use crate::errors::domain::{ConflictKind, DomainError};

/// Source of uniform integers for bonus draws.
pub trait EntropySource: Send + Sync {
    /// Uniform integer in `low..=high`; callers guarantee `low <= high`.
    fn next_in(&self, low: i32, high: i32) -> i32;
}

/// Thread-local OS-seeded generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadEntropy;

impl EntropySource for ThreadEntropy {
    fn next_in(&self, low: i32, high: i32) -> i32 {
        rand::rng().random_range(low..=high)
    }
}

/// Process-wide monotonic counter that seeds fallback probes.
#[derive(Debug)]
pub struct FallbackCursor(AtomicU64);

impl FallbackCursor {
    /// Seeded from the wall clock so restarts do not replay the same offsets.
    pub fn new() -> Self {
        let nanos = time::OffsetDateTime::now_utc().unix_timestamp_nanos();
        Self(AtomicU64::new(nanos as u64))
    }

    pub fn starting_at(value: u64) -> Self {
        Self(AtomicU64::new(value))
    }

    fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for FallbackCursor {
    fn default() -> Self {
        Self::new()
    }
}

/// Purchased numbers plus the bonus numbers drawn for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BonusDraw {
    pub purchased: Vec<i32>,
    pub bonus: Vec<i32>,
    /// Bonus numbers that came from the fallback probe rather than sampling
    pub fallback_draws: u32,
}

impl BonusDraw {
    /// Every number the order will hold: purchased first, then bonus.
    pub fn all(&self) -> Vec<i32> {
        let mut all = Vec::with_capacity(self.purchased.len() + self.bonus.len());
        all.extend_from_slice(&self.purchased);
        all.extend_from_slice(&self.bonus);
        all
    }
}

pub struct BonusAllocator<'a> {
    entropy: &'a dyn EntropySource,
    cursor: &'a FallbackCursor,
    max_attempts: u32,
}

impl<'a> BonusAllocator<'a> {
    pub fn new(entropy: &'a dyn EntropySource, cursor: &'a FallbackCursor, max_attempts: u32) -> Self {
        Self {
            entropy,
            cursor,
            max_attempts,
        }
    }

    /// Draw bonus numbers for `purchased`, avoiding `occupied`.
    ///
    /// Fails with `CapacityExhausted` only when the bonus range has fewer
    /// free numbers than the draw needs.
    pub fn draw(
        &self,
        space: &TicketSpace,
        purchased: &[i32],
        occupied: &HashSet<i32>,
    ) -> Result<BonusDraw, DomainError> {
        let mut draw = BonusDraw {
            purchased: purchased.to_vec(),
            bonus: Vec::new(),
            fallback_draws: 0,
        };
        if !space.has_bonus() || purchased.is_empty() {
            return Ok(draw);
        }

        let per_ticket = (space.multiplier() - 1) as usize;
        let needed = purchased.len() * per_ticket;
        let taken: HashSet<i32> = purchased.iter().copied().collect();

        let (bonus, fallback_draws) = self.fill(space, needed, taken, occupied)?;
        draw.bonus = bonus;
        draw.fallback_draws = fallback_draws;
        Ok(draw)
    }

    /// Draw `count` fresh bonus numbers avoiding `occupied`.
    ///
    /// Used to replace bonus numbers that a concurrent order claimed between
    /// the snapshot and the reservation.
    pub fn redraw(
        &self,
        space: &TicketSpace,
        count: usize,
        occupied: &HashSet<i32>,
    ) -> Result<Vec<i32>, DomainError> {
        if !space.has_bonus() || count == 0 {
            return Ok(Vec::new());
        }
        let (bonus, _) = self.fill(space, count, HashSet::new(), occupied)?;
        Ok(bonus)
    }

    fn fill(
        &self,
        space: &TicketSpace,
        needed: usize,
        mut taken: HashSet<i32>,
        occupied: &HashSet<i32>,
    ) -> Result<(Vec<i32>, u32), DomainError> {
        let range = space.bonus_range();
        let (low, high) = (*range.start(), *range.end());

        let occupied_in_range = occupied.iter().filter(|n| range.contains(n)).count() as i64;
        let free = space.bonus_range_len() - occupied_in_range;
        if (needed as i64) > free {
            return Err(DomainError::conflict(
                ConflictKind::CapacityExhausted,
                format!("Bonus range has {free} free numbers but {needed} are required"),
            ));
        }

        let is_free = |n: i32, taken: &HashSet<i32>| !occupied.contains(&n) && !taken.contains(&n);

        let mut bonus = Vec::with_capacity(needed);
        let mut fallback_draws = 0;
        for _ in 0..needed {
            let sampled = (0..self.max_attempts)
                .map(|_| self.entropy.next_in(low, high))
                .find(|n| range.contains(n) && is_free(*n, &taken));

            let number = match sampled {
                Some(n) => n,
                None => {
                    fallback_draws += 1;
                    self.probe(low, high, |n| is_free(n, &taken))?
                }
            };
            taken.insert(number);
            bonus.push(number);
        }

        Ok((bonus, fallback_draws))
    }

    /// Linear probe with wrap-around from a cursor-derived offset.
    fn probe(&self, low: i32, high: i32, is_free: impl Fn(i32) -> bool) -> Result<i32, DomainError> {
        let len = (i64::from(high) - i64::from(low) + 1) as u64;
        let start = self.cursor.next() % len;
        (0..len)
            .map(|step| low + ((start + step) % len) as i32)
            .find(|n| is_free(*n))
            .ok_or_else(|| {
                DomainError::conflict(ConflictKind::CapacityExhausted, "Bonus range is full")
            })
    }
}
