//! Property tests for bonus draws (pure domain, no DB).

use std::collections::HashSet;

use proptest::prelude::*;

use crate::domain::bonus::test_entropy::ConstantEntropy;
use crate::domain::bonus::{BonusAllocator, FallbackCursor, ThreadEntropy};
use crate::domain::ticket_space::TicketSpace;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Every bonus number lands in (100, 300], is unique, and avoids the
    /// occupancy snapshot and the purchased numbers.
    #[test]
    fn prop_bonus_numbers_stay_in_extended_range(
        purchased in prop::collection::hash_set(1i32..=100, 1..20),
        occupied in prop::collection::hash_set(1i32..=300, 0..120),
        cursor_start in any::<u64>(),
    ) {
        let space = TicketSpace::new(100, true, 3).unwrap();
        let purchased: Vec<i32> = purchased.into_iter().collect();
        let cursor = FallbackCursor::starting_at(cursor_start);
        let alloc = BonusAllocator::new(&ThreadEntropy, &cursor, 1000);

        let draw = alloc.draw(&space, &purchased, &occupied).unwrap();

        prop_assert_eq!(draw.bonus.len(), purchased.len() * 2);
        let unique: HashSet<i32> = draw.bonus.iter().copied().collect();
        prop_assert_eq!(unique.len(), draw.bonus.len());
        for n in &draw.bonus {
            prop_assert!((101..=300).contains(n), "bonus {} out of range", n);
            prop_assert!(!occupied.contains(n), "bonus {} was occupied", n);
            prop_assert!(!purchased.contains(n));
        }
    }

    /// The fallback path alone still fills the request whenever room exists.
    #[test]
    fn prop_fallback_always_makes_progress(
        occupied in prop::collection::hash_set(11i32..=40, 0..25),
        tickets in 1usize..=2,
        cursor_start in any::<u64>(),
    ) {
        let space = TicketSpace::new(10, true, 4).unwrap();
        let purchased: Vec<i32> = (1..=tickets as i32).collect();
        let cursor = FallbackCursor::starting_at(cursor_start);
        // zero attempts sends every draw to the fallback probe
        let entropy = ConstantEntropy(11);
        let alloc = BonusAllocator::new(&entropy, &cursor, 0);

        let free = 30 - occupied.len();
        let needed = tickets * 3;
        let result = alloc.draw(&space, &purchased, &occupied);

        if needed <= free {
            let draw = result.unwrap();
            prop_assert_eq!(draw.bonus.len(), needed);
            prop_assert_eq!(draw.fallback_draws as usize, needed);
            prop_assert!(draw.bonus.iter().all(|n| !occupied.contains(n)));
        } else {
            prop_assert!(result.is_err());
        }
    }
}
