//! Engine services: raffle catalog, reservations, order lifecycle, bulk
//! import and contact channel rotation.
//!
//! Functions that take a `conn` run on whatever connection or transaction
//! the caller provides; route handlers pass the transaction opened by
//! `with_txn`. The bulk importer owns its transactions and takes the pool.

pub mod channels;
pub mod customers;
pub mod importer;
pub mod occupancy;
pub mod orders;
pub mod raffles;

use std::fmt;
use std::sync::Arc;

use crate::config::engine::EngineConfig;
use crate::domain::{BonusAllocator, EntropySource, FallbackCursor, ThreadEntropy};

/// Shared engine configuration plus the bonus-draw entropy and fallback cursor.
///
/// Cheap to clone; clones share the entropy source and cursor.
#[derive(Clone)]
pub struct Engine {
    config: EngineConfig,
    entropy: Arc<dyn EntropySource>,
    cursor: Arc<FallbackCursor>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            entropy: Arc::new(ThreadEntropy),
            cursor: Arc::new(FallbackCursor::new()),
        }
    }

    /// Replace the entropy source, e.g. to force the fallback path in tests.
    pub fn with_entropy(mut self, entropy: Arc<dyn EntropySource>) -> Self {
        self.entropy = entropy;
        self
    }

    pub fn with_cursor(mut self, cursor: FallbackCursor) -> Self {
        self.cursor = Arc::new(cursor);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn bonus_allocator(&self) -> BonusAllocator<'_> {
        BonusAllocator::new(
            self.entropy.as_ref(),
            self.cursor.as_ref(),
            self.config.bonus_max_attempts,
        )
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
