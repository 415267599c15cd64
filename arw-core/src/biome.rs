//! Debounced biome classification.
//!
//! Biome lookups go through the host's block query, which is comparatively
//! expensive. Each actor keeps a [`BiomeMemo`] that is resampled at most once
//! per configured interval; in between, the cached class is reused.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::host::Host;
use crate::types::ActorId;

/// Biome identifiers that count as mountainous.
pub const MOUNTAIN_BIOMES: &[&str] = &[
    "minecraft:windswept_hills",
    "minecraft:windswept_gravelly_hills",
    "minecraft:windswept_forest",
    "minecraft:stony_peaks",
    "minecraft:jagged_peaks",
    "minecraft:frozen_peaks",
    "minecraft:snowy_slopes",
    "minecraft:meadow",
];

/// Coarse environmental category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BiomeClass {
    /// Neither of the categories below.
    #[default]
    None,
    /// Jungle and bamboo variants.
    Jungle,
    /// Hills, peaks, slopes and meadows.
    Mountain,
}

impl BiomeClass {
    /// Classify a raw biome identifier.
    #[must_use]
    pub fn from_biome_id(biome: &str) -> Self {
        if biome.contains("jungle") || biome.contains("bamboo") {
            Self::Jungle
        } else if MOUNTAIN_BIOMES.contains(&biome) {
            Self::Mountain
        } else {
            Self::None
        }
    }
}

/// Per-actor cached biome classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiomeMemo {
    /// Tick of the last host query, `None` before the first one.
    pub last_sampled_tick: Option<u64>,
    /// Classification from the last query.
    pub classification: BiomeClass,
}

impl BiomeMemo {
    /// Whether the memo must be resampled at `tick`.
    #[must_use]
    pub fn is_stale(&self, tick: u64, interval: u64) -> bool {
        match self.last_sampled_tick {
            None => true,
            Some(last) => tick.saturating_sub(last) > interval,
        }
    }

    /// Return the classification, querying the host only if stale.
    ///
    /// A failed host query keeps the previous classification but still
    /// counts as a sample, so a broken chunk is not hammered every tick.
    pub fn sample<H: Host + ?Sized>(
        &mut self,
        host: &H,
        actor: ActorId,
        tick: u64,
        interval: u64,
    ) -> BiomeClass {
        if !self.is_stale(tick, interval) {
            return self.classification;
        }
        self.last_sampled_tick = Some(tick);

        let lookup = host
            .actor_position(actor)
            .and_then(|(dimension, location)| host.biome_at(&dimension, location.block()));
        match lookup {
            Ok(Some(biome)) => self.classification = BiomeClass::from_biome_id(&biome),
            Ok(None) => self.classification = BiomeClass::None,
            Err(e) => debug!(actor = %actor, error = %e, "Biome query failed, keeping cached class"),
        }
        self.classification
    }
}
