//! In-memory reference world.
//!
//! [`SandboxHost`] implements [`Host`] over plain maps. It backs the unit and
//! integration tests and the benches, and serves as the reference for what a
//! real host binding must report: absence as `Ok(None)`, failure as
//! `Err(HostError)`.
//!
//! Besides world state it keeps logs of every side effect (spawns, damage,
//! knockback, item wear) and can inject failures per call family.

use chrono::{DateTime, Duration, Utc};
use std::cell::Cell;
use std::collections::{HashMap, HashSet};

use crate::effect::{EffectKind, StatusEffect};
use crate::error::{HostError, HostResult};
use crate::host::Host;
use crate::items::ItemId;
use crate::types::{
    ActorId, ActorKind, BlockPos, BlockType, DamageCause, DimensionId, Direction, Location, Slot,
    SpawnKind,
};

/// Default maximum health of sandbox actors.
pub const DEFAULT_MAX_HEALTH: f32 = 20.0;

/// One actor in the sandbox world.
#[derive(Debug, Clone)]
pub struct SandboxActor {
    /// Player or mob.
    pub kind: ActorKind,
    /// Current dimension.
    pub dimension: DimensionId,
    /// Current position.
    pub location: Location,
    /// View direction.
    pub direction: Direction,
    /// Equipped items by slot.
    pub equipment: HashMap<Slot, ItemId>,
    /// Current health; `None` models a missing health component.
    pub health: Option<f32>,
    /// Upper clamp for `set_health`.
    pub max_health: f32,
    /// Whether the actor is burning.
    pub on_fire: bool,
    /// Active status effects.
    pub effects: HashMap<EffectKind, StatusEffect>,
}

impl SandboxActor {
    fn new(kind: ActorKind, dimension: DimensionId, location: Location) -> Self {
        Self {
            kind,
            dimension,
            location,
            direction: Direction::new(0.0, 0.0, 1.0),
            equipment: HashMap::new(),
            health: Some(DEFAULT_MAX_HEALTH),
            max_health: DEFAULT_MAX_HEALTH,
            on_fire: false,
            effects: HashMap::new(),
        }
    }
}

/// A recorded knockback call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KnockbackRecord {
    /// Who was knocked back.
    pub actor: ActorId,
    /// Horizontal direction X.
    pub direction_x: f64,
    /// Horizontal direction Z.
    pub direction_z: f64,
    /// Horizontal magnitude.
    pub horizontal: f64,
    /// Vertical magnitude.
    pub vertical: f64,
}

/// In-memory [`Host`] implementation.
#[derive(Debug)]
pub struct SandboxHost {
    actors: HashMap<ActorId, SandboxActor>,
    blocks: HashMap<(DimensionId, BlockPos), BlockType>,
    biomes: HashMap<DimensionId, String>,
    clock: DateTime<Utc>,
    next_id: u64,

    biome_queries: Cell<u64>,

    spawned: Vec<(DimensionId, SpawnKind, Location)>,
    damage_log: Vec<(ActorId, f32, DamageCause)>,
    knockbacks: Vec<KnockbackRecord>,
    item_wear: Vec<(ActorId, Slot, u32)>,
    effect_log: Vec<(ActorId, StatusEffect)>,

    failing_equipment: HashSet<ActorId>,
    failing_positions: HashSet<ActorId>,
    fail_spawns: bool,
    fail_block_reads: bool,
    fail_biome: bool,
}

impl Default for SandboxHost {
    fn default() -> Self {
        Self::new()
    }
}

impl SandboxHost {
    /// An empty world whose clock starts at the current wall-clock time.
    #[must_use]
    pub fn new() -> Self {
        Self {
            actors: HashMap::new(),
            blocks: HashMap::new(),
            biomes: HashMap::new(),
            clock: Utc::now(),
            next_id: 1,
            biome_queries: Cell::new(0),
            spawned: Vec::new(),
            damage_log: Vec::new(),
            knockbacks: Vec::new(),
            item_wear: Vec::new(),
            effect_log: Vec::new(),
            failing_equipment: HashSet::new(),
            failing_positions: HashSet::new(),
            fail_spawns: false,
            fail_block_reads: false,
            fail_biome: false,
        }
    }

    // -- actors -------------------------------------------------------------

    /// Add an actor and return its identity.
    pub fn add_actor(&mut self, kind: ActorKind, dimension: DimensionId, location: Location) -> ActorId {
        let id = ActorId(self.next_id);
        self.next_id += 1;
        self.actors.insert(id, SandboxActor::new(kind, dimension, location));
        id
    }

    /// Add a player in the overworld.
    pub fn add_player(&mut self, location: Location) -> ActorId {
        self.add_actor(ActorKind::Player, DimensionId::overworld(), location)
    }

    /// Add a mob in the overworld.
    pub fn add_mob(&mut self, location: Location) -> ActorId {
        self.add_actor(ActorKind::Mob, DimensionId::overworld(), location)
    }

    /// Remove an actor from the world, as on disconnect or death.
    pub fn remove_actor(&mut self, actor: ActorId) -> Option<SandboxActor> {
        self.actors.remove(&actor)
    }

    /// Put a removed actor back under its old identity, as on a rejoin.
    pub fn rejoin(&mut self, actor: ActorId, state: SandboxActor) {
        self.actors.insert(actor, state);
    }

    /// Put an item in a slot; an empty string or `minecraft:air` empties it.
    pub fn equip(&mut self, actor: ActorId, slot: Slot, item: &str) {
        if let Some(a) = self.actors.get_mut(&actor) {
            a.equipment.insert(slot, ItemId::new(item));
        }
    }

    /// Move an actor.
    pub fn move_actor(&mut self, actor: ActorId, location: Location) {
        if let Some(a) = self.actors.get_mut(&actor) {
            a.location = location;
        }
    }

    /// Set current health without clamping, `None` to drop the component.
    pub fn put_health(&mut self, actor: ActorId, health: Option<f32>) {
        if let Some(a) = self.actors.get_mut(&actor) {
            a.health = health;
        }
    }

    /// Set or clear the burning flag.
    pub fn set_on_fire(&mut self, actor: ActorId, on_fire: bool) {
        if let Some(a) = self.actors.get_mut(&actor) {
            a.on_fire = on_fire;
        }
    }

    /// Active effect of a kind on an actor.
    #[must_use]
    pub fn effect(&self, actor: ActorId, kind: EffectKind) -> Option<StatusEffect> {
        self.actors.get(&actor).and_then(|a| a.effects.get(&kind).copied())
    }

    /// Current health of an actor.
    #[must_use]
    pub fn current_health(&self, actor: ActorId) -> Option<f32> {
        self.actors.get(&actor).and_then(|a| a.health)
    }

    // -- world --------------------------------------------------------------

    /// Place a block.
    pub fn put_block(&mut self, dimension: &DimensionId, pos: BlockPos, block: BlockType) {
        self.blocks.insert((dimension.clone(), pos), block);
    }

    /// Fill a horizontal square layer with one block type.
    pub fn fill_layer(&mut self, dimension: &DimensionId, center: BlockPos, radius: i32, block: &BlockType) {
        for dx in -radius..=radius {
            for dz in -radius..=radius {
                let pos = BlockPos::new(center.x + dx, center.y, center.z + dz);
                self.put_block(dimension, pos, block.clone());
            }
        }
    }

    /// Block at a position, if set.
    #[must_use]
    pub fn block(&self, dimension: &DimensionId, pos: BlockPos) -> Option<BlockType> {
        self.blocks.get(&(dimension.clone(), pos)).cloned()
    }

    /// Set the biome reported everywhere in a dimension.
    pub fn set_biome(&mut self, dimension: &DimensionId, biome: &str) {
        self.biomes.insert(dimension.clone(), biome.to_string());
    }

    /// Number of biome queries served.
    #[must_use]
    pub fn biome_queries(&self) -> u64 {
        self.biome_queries.get()
    }

    // -- clock --------------------------------------------------------------

    /// Move the wall clock forward.
    pub fn advance_clock(&mut self, by: Duration) {
        self.clock += by;
    }

    // -- logs ---------------------------------------------------------------

    /// Every spawn, in call order.
    #[must_use]
    pub fn spawned(&self) -> &[(DimensionId, SpawnKind, Location)] {
        &self.spawned
    }

    /// Every generic damage call, in call order.
    #[must_use]
    pub fn damage_log(&self) -> &[(ActorId, f32, DamageCause)] {
        &self.damage_log
    }

    /// Every knockback call, in call order.
    #[must_use]
    pub fn knockbacks(&self) -> &[KnockbackRecord] {
        &self.knockbacks
    }

    /// Every item wear call, in call order.
    #[must_use]
    pub fn item_wear(&self) -> &[(ActorId, Slot, u32)] {
        &self.item_wear
    }

    /// Every effect granted, in call order.
    #[must_use]
    pub fn effect_log(&self) -> &[(ActorId, StatusEffect)] {
        &self.effect_log
    }

    /// Forget every logged side effect.
    pub fn clear_logs(&mut self) {
        self.spawned.clear();
        self.damage_log.clear();
        self.knockbacks.clear();
        self.item_wear.clear();
        self.effect_log.clear();
    }

    // -- failure injection --------------------------------------------------

    /// Make equipment reads for one actor fail.
    pub fn fail_equipment(&mut self, actor: ActorId, fail: bool) {
        if fail {
            self.failing_equipment.insert(actor);
        } else {
            self.failing_equipment.remove(&actor);
        }
    }

    /// Make position reads for `actor` fail (or stop failing).
    pub fn fail_positions(&mut self, actor: ActorId, fail: bool) {
        if fail {
            self.failing_positions.insert(actor);
        } else {
            self.failing_positions.remove(&actor);
        }
    }

    /// Make every spawn fail.
    pub fn fail_spawns(&mut self, fail: bool) {
        self.fail_spawns = fail;
    }

    /// Make every block read fail.
    pub fn fail_block_reads(&mut self, fail: bool) {
        self.fail_block_reads = fail;
    }

    /// Make every biome query fail.
    pub fn fail_biome(&mut self, fail: bool) {
        self.fail_biome = fail;
    }

    fn get(&self, actor: ActorId) -> HostResult<&SandboxActor> {
        self.actors.get(&actor).ok_or(HostError::EntityNotFound(actor))
    }

    fn get_mut(&mut self, actor: ActorId) -> HostResult<&mut SandboxActor> {
        self.actors.get_mut(&actor).ok_or(HostError::EntityNotFound(actor))
    }
}

impl Host for SandboxHost {
    fn active_actors(&self) -> Vec<ActorId> {
        let mut ids: Vec<ActorId> = self
            .actors
            .iter()
            .filter(|(_, a)| a.kind == ActorKind::Player)
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }

    fn equipped_item(&self, actor: ActorId, slot: Slot) -> HostResult<Option<ItemId>> {
        if self.failing_equipment.contains(&actor) {
            return Err(HostError::MissingComponent {
                actor,
                component: "equippable",
            });
        }
        let item = self.get(actor)?.equipment.get(&slot).cloned();
        Ok(item.filter(|i| !i.is_empty_slot()))
    }

    fn actor_position(&self, actor: ActorId) -> HostResult<(DimensionId, Location)> {
        if self.failing_positions.contains(&actor) {
            return Err(HostError::Unavailable(format!("position of {actor}")));
        }
        let a = self.get(actor)?;
        Ok((a.dimension.clone(), a.location))
    }

    fn find_entity(&self, dimension: &DimensionId, actor: ActorId) -> HostResult<Option<Location>> {
        Ok(self
            .actors
            .get(&actor)
            .filter(|a| &a.dimension == dimension)
            .map(|a| a.location))
    }

    fn view_direction(&self, actor: ActorId) -> HostResult<Direction> {
        Ok(self.get(actor)?.direction)
    }

    fn biome_at(&self, dimension: &DimensionId, _pos: BlockPos) -> HostResult<Option<String>> {
        self.biome_queries.set(self.biome_queries.get() + 1);
        if self.fail_biome {
            return Err(HostError::Unavailable(format!("biome in {dimension}")));
        }
        Ok(self.biomes.get(dimension).cloned())
    }

    fn block_at(&self, dimension: &DimensionId, pos: BlockPos) -> HostResult<Option<BlockType>> {
        if self.fail_block_reads {
            return Err(HostError::Unavailable(format!("chunk at {pos}")));
        }
        Ok(self.block(dimension, pos))
    }

    fn set_block(&mut self, dimension: &DimensionId, pos: BlockPos, block: &BlockType) -> HostResult<()> {
        self.put_block(dimension, pos, block.clone());
        Ok(())
    }

    fn add_effect(&mut self, actor: ActorId, effect: StatusEffect) -> HostResult<()> {
        self.get_mut(actor)?.effects.insert(effect.kind, effect);
        self.effect_log.push((actor, effect));
        Ok(())
    }

    fn remove_effect(&mut self, actor: ActorId, kind: EffectKind) -> HostResult<()> {
        self.get_mut(actor)?.effects.remove(&kind);
        Ok(())
    }

    fn is_on_fire(&self, actor: ActorId) -> HostResult<bool> {
        Ok(self.get(actor)?.on_fire)
    }

    fn health(&self, actor: ActorId) -> HostResult<Option<f32>> {
        Ok(self.get(actor)?.health)
    }

    fn set_health(&mut self, actor: ActorId, value: f32) -> HostResult<()> {
        let a = self.get_mut(actor)?;
        let max = a.max_health;
        match a.health.as_mut() {
            Some(h) => {
                *h = value.clamp(0.0, max);
                Ok(())
            }
            None => Err(HostError::MissingComponent {
                actor,
                component: "health",
            }),
        }
    }

    fn apply_damage(&mut self, actor: ActorId, amount: f32, cause: DamageCause) -> HostResult<()> {
        let a = self.get_mut(actor)?;
        if let Some(h) = a.health.as_mut() {
            *h = (*h - amount).max(0.0);
        }
        self.damage_log.push((actor, amount, cause));
        Ok(())
    }

    fn apply_knockback(
        &mut self,
        actor: ActorId,
        direction_x: f64,
        direction_z: f64,
        horizontal: f64,
        vertical: f64,
    ) -> HostResult<()> {
        self.get(actor)?;
        self.knockbacks.push(KnockbackRecord {
            actor,
            direction_x,
            direction_z,
            horizontal,
            vertical,
        });
        Ok(())
    }

    fn spawn(&mut self, dimension: &DimensionId, kind: SpawnKind, at: Location) -> HostResult<()> {
        if self.fail_spawns {
            return Err(HostError::Rejected(format!("{} at {at}", kind.identifier())));
        }
        self.spawned.push((dimension.clone(), kind, at));
        Ok(())
    }

    fn damage_item(&mut self, actor: ActorId, slot: Slot, amount: u32) -> HostResult<()> {
        self.get(actor)?;
        self.item_wear.push((actor, slot, amount));
        Ok(())
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_slots_read_as_none() {
        let mut host = SandboxHost::new();
        let p = host.add_player(Location::default());
        assert_eq!(host.equipped_item(p, Slot::MainHand).unwrap(), None);
        host.equip(p, Slot::MainHand, "minecraft:air");
        assert_eq!(host.equipped_item(p, Slot::MainHand).unwrap(), None);
        host.equip(p, Slot::MainHand, "arw:royal_kris");
        assert_eq!(
            host.equipped_item(p, Slot::MainHand).unwrap(),
            Some(ItemId::new("arw:royal_kris"))
        );
    }

    #[test]
    fn position_failure_is_per_actor() {
        let mut host = SandboxHost::new();
        let a = host.add_player(Location::default());
        let b = host.add_player(Location::default());
        host.fail_positions(a, true);
        assert!(matches!(host.actor_position(a), Err(HostError::Unavailable(_))));
        assert!(host.actor_position(b).is_ok());
        host.fail_positions(a, false);
        assert!(host.actor_position(a).is_ok());
    }

    #[test]
    fn rejoin_keeps_identity_and_effects() {
        let mut host = SandboxHost::new();
        let p = host.add_player(Location::default());
        host.add_effect(p, StatusEffect::new(EffectKind::Wither, 20, 1)).unwrap();
        let saved = host.remove_actor(p).unwrap();
        assert!(host.active_actors().is_empty());
        host.rejoin(p, saved);
        assert_eq!(host.active_actors(), vec![p]);
        assert!(host.effect(p, EffectKind::Wither).is_some());
    }

    #[test]
    fn only_players_are_active() {
        let mut host = SandboxHost::new();
        let p = host.add_player(Location::default());
        let m = host.add_mob(Location::default());
        assert_eq!(host.active_actors(), vec![p]);
        assert!(host.find_entity(&DimensionId::overworld(), m).unwrap().is_some());
    }

    #[test]
    fn missing_actor_is_an_error_but_lookup_is_none() {
        let host = SandboxHost::new();
        assert_eq!(
            host.actor_position(ActorId(5)).unwrap_err(),
            HostError::EntityNotFound(ActorId(5))
        );
        assert_eq!(host.find_entity(&DimensionId::overworld(), ActorId(5)).unwrap(), None);
    }

    #[test]
    fn set_health_clamps_to_max() {
        let mut host = SandboxHost::new();
        let p = host.add_player(Location::default());
        host.set_health(p, 50.0).unwrap();
        assert_eq!(host.current_health(p), Some(DEFAULT_MAX_HEALTH));
        host.put_health(p, None);
        assert!(host.set_health(p, 1.0).is_err());
    }

    #[test]
    fn biome_queries_are_counted() {
        let mut host = SandboxHost::new();
        host.set_biome(&DimensionId::overworld(), "minecraft:jungle");
        let _ = host.biome_at(&DimensionId::overworld(), BlockPos::default());
        let _ = host.biome_at(&DimensionId::overworld(), BlockPos::default());
        assert_eq!(host.biome_queries(), 2);
    }
}
