//! Per-actor state cache.
//!
//! [`ActorStateStore`] holds exactly one [`ActorState`] per active actor. The
//! entry is created lazily on first observation and must be removed when the
//! actor leaves, either through [`ActorStateStore::remove`] or
//! [`ActorStateStore::retain_active`].
//!
//! Equipment is written only by [`EquipmentSampler`]; every other component
//! reads it through [`ActorState::equipment`].

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::HashSet;
use tracing::{debug, trace};

use crate::biome::BiomeMemo;
use crate::config::CurseConfig;
use crate::host::Host;
use crate::items::{ItemClass, ItemId};
use crate::types::{ActorId, Slot};

// ---------------------------------------------------------------------------
// Equipment
// ---------------------------------------------------------------------------

/// Last sampled hand equipment, classified at sample time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment {
    /// Main-hand item identifier.
    pub main_hand: ItemId,
    /// Off-hand item identifier.
    pub off_hand: ItemId,
    /// Classification of `main_hand`.
    pub main_class: ItemClass,
    /// Classification of `off_hand`.
    pub off_class: ItemClass,
}

impl Equipment {
    /// Equipment from raw identifiers.
    #[must_use]
    pub fn new(main_hand: ItemId, off_hand: ItemId) -> Self {
        let main_class = main_hand.classify();
        let off_class = off_hand.classify();
        Self {
            main_hand,
            off_hand,
            main_class,
            off_class,
        }
    }

    /// Whether the off hand holds anything.
    #[must_use]
    pub fn off_hand_occupied(&self) -> bool {
        self.off_class.is_occupied()
    }
}

impl Default for Equipment {
    fn default() -> Self {
        Self::new(ItemId::air(), ItemId::air())
    }
}

// ---------------------------------------------------------------------------
// Curse timer
// ---------------------------------------------------------------------------

/// What happened to a [`CurseTimer`] during one held tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurseTransition {
    /// Nothing changed state.
    None,
    /// The item was picked up; the timer was reset and re-rolled.
    StartedHolding,
    /// The threshold was reached; the permanent debuff must be applied.
    BecameCursed,
}

/// "Held too long without acting" timer of the curse weapon.
///
/// States: not holding → holding → holding + cursed → not holding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurseTimer {
    /// Ticks held since the last reset.
    pub elapsed_ticks: u32,
    /// Ticks after which the holder is cursed.
    pub threshold_ticks: u32,
    /// Whether the permanent debuff is active.
    pub is_cursed: bool,
    /// Whether the weapon was held at the last tick.
    pub is_holding: bool,
}

impl CurseTimer {
    /// A timer in the not-holding state with the given threshold.
    #[must_use]
    pub fn new(threshold_ticks: u32) -> Self {
        Self {
            elapsed_ticks: 0,
            threshold_ticks,
            is_cursed: false,
            is_holding: false,
        }
    }

    /// Roll a threshold uniformly in `[min, max)`.
    pub fn roll_threshold<R: Rng + ?Sized>(rng: &mut R, config: &CurseConfig) -> u32 {
        rng.gen_range(config.min_threshold_ticks..config.max_threshold_ticks)
    }

    /// Advance one tick with the weapon in hand.
    ///
    /// The pick-up tick resets the timer; every later held tick counts.
    pub fn tick_held<R: Rng + ?Sized>(&mut self, rng: &mut R, config: &CurseConfig) -> CurseTransition {
        if !self.is_holding {
            self.is_holding = true;
            self.elapsed_ticks = 0;
            self.threshold_ticks = Self::roll_threshold(rng, config);
            return CurseTransition::StartedHolding;
        }

        self.elapsed_ticks = self.elapsed_ticks.saturating_add(1);
        if self.elapsed_ticks >= self.threshold_ticks && !self.is_cursed {
            self.is_cursed = true;
            return CurseTransition::BecameCursed;
        }
        CurseTransition::None
    }

    /// The weapon left the hand. Returns `true` if the debuff must be removed.
    pub fn release(&mut self) -> bool {
        let was_cursed = self.is_cursed;
        self.is_holding = false;
        self.is_cursed = false;
        self.elapsed_ticks = 0;
        was_cursed
    }

    /// A qualifying hit landed. Returns `true` if the debuff must be removed.
    pub fn qualifying_hit<R: Rng + ?Sized>(&mut self, rng: &mut R, config: &CurseConfig) -> bool {
        let was_cursed = self.is_cursed;
        self.is_cursed = false;
        self.elapsed_ticks = 0;
        self.threshold_ticks = Self::roll_threshold(rng, config);
        was_cursed
    }
}

// ---------------------------------------------------------------------------
// Cooldowns
// ---------------------------------------------------------------------------

/// Abilities gated by a per-actor cooldown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CooldownKey {
    /// Lava-to-basalt terrain scan.
    MagmaWalker,
}

/// Remaining-ticks counters keyed by ability.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cooldowns {
    remaining: HashMap<CooldownKey, u32>,
}

impl Cooldowns {
    /// Count one tick for `key`. Returns `true` when the ability is ready,
    /// which also restarts the countdown at `cooldown_ticks`.
    pub fn tick_ready(&mut self, key: CooldownKey, cooldown_ticks: u32) -> bool {
        let remaining = self.remaining.entry(key).or_insert(cooldown_ticks);
        if *remaining == 0 {
            *remaining = cooldown_ticks;
            true
        } else {
            *remaining -= 1;
            false
        }
    }

    /// Ticks left before `key` is ready, if it was ever counted.
    #[must_use]
    pub fn remaining(&self, key: CooldownKey) -> Option<u32> {
        self.remaining.get(&key).copied()
    }
}

// ---------------------------------------------------------------------------
// Actor state
// ---------------------------------------------------------------------------

/// Everything ARW remembers about one actor between ticks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorState {
    equipment: Equipment,
    /// Tick of the last successful equipment sample.
    last_sampled_tick: Option<u64>,
    /// Curse weapon timer.
    pub curse: CurseTimer,
    /// Cached biome classification.
    pub biome: BiomeMemo,
    /// Ability cooldowns.
    pub cooldowns: Cooldowns,
    /// Tick the actor was first observed.
    pub first_seen_tick: u64,
}

impl ActorState {
    /// Fresh state for an actor first seen at `tick`.
    #[must_use]
    pub fn new(tick: u64, curse_threshold: u32) -> Self {
        Self {
            equipment: Equipment::default(),
            last_sampled_tick: None,
            curse: CurseTimer::new(curse_threshold),
            biome: BiomeMemo::default(),
            cooldowns: Cooldowns::default(),
            first_seen_tick: tick,
        }
    }

    /// Last sampled equipment.
    #[must_use]
    pub fn equipment(&self) -> &Equipment {
        &self.equipment
    }

    /// Whether equipment was ever sampled for this actor.
    #[must_use]
    pub fn has_sampled(&self) -> bool {
        self.last_sampled_tick.is_some()
    }
}

/// Process-wide map from actor identity to [`ActorState`], scoped to one session.
#[derive(Debug, Default)]
pub struct ActorStateStore {
    states: HashMap<ActorId, ActorState>,
}

impl ActorStateStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the state for `actor`, creating it on first observation. Never fails.
    pub fn get_or_create<R: Rng + ?Sized>(
        &mut self,
        actor: ActorId,
        tick: u64,
        rng: &mut R,
        curse: &CurseConfig,
    ) -> &mut ActorState {
        self.states.entry(actor).or_insert_with(|| {
            trace!(actor = %actor, tick, "Tracking new actor");
            ActorState::new(tick, CurseTimer::roll_threshold(rng, curse))
        })
    }

    /// Read-only access.
    #[must_use]
    pub fn get(&self, actor: ActorId) -> Option<&ActorState> {
        self.states.get(&actor)
    }

    /// Mutable access to an existing entry.
    pub fn get_mut(&mut self, actor: ActorId) -> Option<&mut ActorState> {
        self.states.get_mut(&actor)
    }

    /// Drop the entry for `actor`. Idempotent; returns the removed state.
    pub fn remove(&mut self, actor: ActorId) -> Option<ActorState> {
        let removed = self.states.remove(&actor);
        if removed.is_some() {
            debug!(actor = %actor, "Actor departed, state dropped");
        }
        removed
    }

    /// Drop every entry whose actor is not in `active`. Returns the removed
    /// states, ordered by actor id, so callers can undo what they held.
    pub fn retain_active(&mut self, active: &HashSet<ActorId>) -> Vec<(ActorId, ActorState)> {
        let mut departed: Vec<ActorId> = self
            .states
            .keys()
            .filter(|id| !active.contains(id))
            .copied()
            .collect();
        departed.sort();
        departed
            .into_iter()
            .filter_map(|id| self.remove(id).map(|state| (id, state)))
            .collect()
    }

    /// Number of tracked actors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether no actor is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Tracked actor ids.
    pub fn actors(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.states.keys().copied()
    }
}

// ---------------------------------------------------------------------------
// Equipment sampler
// ---------------------------------------------------------------------------

/// Outcome of one equipment refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SampleOutcome {
    /// Slots whose host read failed and kept their cached value.
    pub failed_slots: u8,
}

/// Reads hand equipment from the host into [`ActorState`].
pub struct EquipmentSampler;

impl EquipmentSampler {
    /// Refresh the cached hand equipment of one actor.
    ///
    /// A slot whose host read fails keeps its previously cached value; the
    /// failure is reported in the outcome and never propagated.
    pub fn refresh<H: Host + ?Sized>(
        host: &H,
        actor: ActorId,
        state: &mut ActorState,
        tick: u64,
    ) -> SampleOutcome {
        let mut outcome = SampleOutcome::default();
        let main_hand = Self::read_slot(host, actor, Slot::MainHand, &state.equipment.main_hand, &mut outcome);
        let off_hand = Self::read_slot(host, actor, Slot::OffHand, &state.equipment.off_hand, &mut outcome);

        if main_hand != state.equipment.main_hand || off_hand != state.equipment.off_hand {
            trace!(actor = %actor, main = %main_hand, off = %off_hand, "Equipment changed");
            state.equipment = Equipment::new(main_hand, off_hand);
        }
        if outcome.failed_slots < 2 {
            state.last_sampled_tick = Some(tick);
        }
        outcome
    }

    fn read_slot<H: Host + ?Sized>(
        host: &H,
        actor: ActorId,
        slot: Slot,
        cached: &ItemId,
        outcome: &mut SampleOutcome,
    ) -> ItemId {
        match host.equipped_item(actor, slot) {
            Ok(Some(item)) => item,
            Ok(None) => ItemId::air(),
            Err(e) => {
                debug!(actor = %actor, ?slot, error = %e, "Equipment read failed, keeping cached item");
                outcome.failed_slots += 1;
                cached.clone()
            }
        }
    }
}
