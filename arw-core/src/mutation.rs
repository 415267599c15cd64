//! Reversible world mutations.
//!
//! Temporary block conversions are recorded here with a wall-clock expiry.
//! Each record is checked once, after it expires: the block is restored only
//! if it still holds the type ARW put there, and the record is deleted either
//! way.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, trace, warn};

use crate::error::HostResult;
use crate::host::Host;
use crate::types::{BlockPos, BlockType, DimensionId};

/// Location key of a mutated block.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MutationKey {
    /// Dimension of the block.
    pub dimension: DimensionId,
    /// Block coordinates.
    pub pos: BlockPos,
}

impl MutationKey {
    /// Create a key.
    #[must_use]
    pub fn new(dimension: DimensionId, pos: BlockPos) -> Self {
        Self { dimension, pos }
    }
}

impl fmt::Display for MutationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.pos, self.dimension)
    }
}

/// A temporary world change awaiting reversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReversibleMutation {
    /// Where.
    pub key: MutationKey,
    /// Block type ARW wrote; reversion requires the block to still be this.
    pub mutated_to: BlockType,
    /// Block type restored on reversion.
    pub original: BlockType,
    /// Wall-clock time at or after which the mutation reverts.
    pub expire_at: DateTime<Utc>,
}

/// Summary of one `advance` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevertReport {
    /// Blocks restored to their original type.
    pub reverted: usize,
    /// Records dropped because the block had changed since.
    pub skipped: usize,
    /// Records dropped because a host call failed.
    pub failed: usize,
}

/// Sole owner of every pending [`ReversibleMutation`].
#[derive(Debug, Default)]
pub struct ReversibleMutationRegistry {
    entries: HashMap<MutationKey, ReversibleMutation>,
}

impl ReversibleMutationRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a mutation, replacing any earlier record for the same key.
    ///
    /// Returns the replaced record, if any.
    pub fn register(&mut self, mutation: ReversibleMutation) -> Option<ReversibleMutation> {
        trace!(key = %mutation.key, expire_at = %mutation.expire_at, "Mutation registered");
        self.entries.insert(mutation.key.clone(), mutation)
    }

    /// Pending record for a key.
    #[must_use]
    pub fn get(&self, key: &MutationKey) -> Option<&ReversibleMutation> {
        self.entries.get(key)
    }

    /// Number of pending records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Revert every record with `expire_at <= now`.
    ///
    /// Expired records are removed before any host call, so each one is
    /// attempted at most once.
    pub fn advance<H: Host + ?Sized>(&mut self, host: &mut H, now: DateTime<Utc>) -> RevertReport {
        let expired: Vec<MutationKey> = self
            .entries
            .iter()
            .filter(|(_, m)| m.expire_at <= now)
            .map(|(k, _)| k.clone())
            .collect();

        let mut report = RevertReport::default();
        for key in expired {
            let Some(mutation) = self.entries.remove(&key) else {
                continue;
            };
            match Self::revert(host, &mutation) {
                Ok(true) => report.reverted += 1,
                Ok(false) => {
                    trace!(key = %key, "Block changed since mutation, left alone");
                    report.skipped += 1;
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "Mutation revert abandoned");
                    report.failed += 1;
                }
            }
        }
        if report.reverted + report.skipped + report.failed > 0 {
            debug!(
                reverted = report.reverted,
                skipped = report.skipped,
                failed = report.failed,
                pending = self.entries.len(),
                "Mutation pass"
            );
        }
        report
    }

    fn revert<H: Host + ?Sized>(host: &mut H, mutation: &ReversibleMutation) -> HostResult<bool> {
        let key = &mutation.key;
        let current = host.block_at(&key.dimension, key.pos)?;
        if current.as_ref() != Some(&mutation.mutated_to) {
            return Ok(false);
        }
        host.set_block(&key.dimension, key.pos, &mutation.original)?;
        Ok(true)
    }
}
