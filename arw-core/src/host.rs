//! The boundary to the hosting simulation.
//!
//! ARW never holds live handles into the world. Everything it needs is a
//! synchronous, possibly-failing call on [`Host`], keyed by plain identities.
//! Absence is an `Ok(None)`; failure is an `Err(HostError)`. Neither is ever
//! signalled by panicking.

use chrono::{DateTime, Utc};

use crate::effect::{EffectKind, StatusEffect};
use crate::error::HostResult;
use crate::items::ItemId;
use crate::types::{
    ActorId, BlockPos, BlockType, DamageCause, DimensionId, Direction, Location, Slot, SpawnKind,
};

/// Queries and commands the core issues against the hosting simulation.
pub trait Host {
    /// Actors currently present in the world that ARW should process this tick.
    fn active_actors(&self) -> Vec<ActorId>;

    /// Item identifier in `slot`, `Ok(None)` for an empty slot.
    fn equipped_item(&self, actor: ActorId, slot: Slot) -> HostResult<Option<ItemId>>;

    /// Dimension and position of a live actor.
    fn actor_position(&self, actor: ActorId) -> HostResult<(DimensionId, Location)>;

    /// Look up an entity by identity within a dimension; `Ok(None)` if it is gone.
    fn find_entity(&self, dimension: &DimensionId, actor: ActorId) -> HostResult<Option<Location>>;

    /// Normalised horizontal-ish view direction of an actor.
    fn view_direction(&self, actor: ActorId) -> HostResult<Direction>;

    /// Biome identifier at a block, `Ok(None)` if the host reports none.
    fn biome_at(&self, dimension: &DimensionId, pos: BlockPos) -> HostResult<Option<String>>;

    /// Block type at a position, `Ok(None)` if the chunk is not loaded.
    fn block_at(&self, dimension: &DimensionId, pos: BlockPos) -> HostResult<Option<BlockType>>;

    /// Replace the block at a position.
    fn set_block(&mut self, dimension: &DimensionId, pos: BlockPos, block: &BlockType)
    -> HostResult<()>;

    /// Grant or refresh a status effect.
    fn add_effect(&mut self, actor: ActorId, effect: StatusEffect) -> HostResult<()>;

    /// Remove a status effect if present.
    fn remove_effect(&mut self, actor: ActorId, kind: EffectKind) -> HostResult<()>;

    /// Whether the actor is currently burning.
    fn is_on_fire(&self, actor: ActorId) -> HostResult<bool>;

    /// Current health, `Ok(None)` if the actor has no health component.
    fn health(&self, actor: ActorId) -> HostResult<Option<f32>>;

    /// Set current health; the host clamps to the actor's maximum.
    fn set_health(&mut self, actor: ActorId, value: f32) -> HostResult<()>;

    /// Generic damage through the host's damage pipeline.
    fn apply_damage(&mut self, actor: ActorId, amount: f32, cause: DamageCause) -> HostResult<()>;

    /// Knock an actor back along a horizontal direction.
    fn apply_knockback(
        &mut self,
        actor: ActorId,
        direction_x: f64,
        direction_z: f64,
        horizontal: f64,
        vertical: f64,
    ) -> HostResult<()>;

    /// Spawn a transient entity.
    fn spawn(&mut self, dimension: &DimensionId, kind: SpawnKind, at: Location) -> HostResult<()>;

    /// Add wear to the item in an actor's slot.
    fn damage_item(&mut self, actor: ActorId, slot: Slot, amount: u32) -> HostResult<()>;

    /// Wall-clock time used for real-time expiries.
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
