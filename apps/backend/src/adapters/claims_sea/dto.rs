//! DTOs for claims_sea adapter.

/// Outcome of a bulk claim: which numbers this order now holds and which
/// were already held by someone else.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimOutcome {
    pub claimed: Vec<i32>,
    pub lost: Vec<i32>,
}

impl ClaimOutcome {
    pub fn is_complete(&self) -> bool {
        self.lost.is_empty()
    }
}
