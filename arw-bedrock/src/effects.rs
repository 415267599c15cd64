//! Per-tick effect policy.
//!
//! [`EffectApplier`] runs once per active actor per tick, after the equipment
//! sample. It reads only cached state plus the few host queries a bundle
//! needs (health, burning, biome, position) and writes status effects, the
//! curse timer and, for the magma necklace, temporary terrain.
//!
//! Passive bundles use [`PASSIVE_REFRESH_TICKS`] so they lapse by themselves
//! once the item leaves the hand. The curse is the only permanent effect and
//! is removed explicitly when the dagger is put away.

use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::{debug, info, trace};

use arw_core::biome::BiomeClass;
use arw_core::config::ArwConfig;
use arw_core::effect::{EffectKind, EffectSpec, PASSIVE_REFRESH_TICKS, StatusEffect};
use arw_core::error::HostResult;
use arw_core::host::Host;
use arw_core::items::{ItemClass, KatanaKind, NecklaceKind};
use arw_core::mutation::{MutationKey, ReversibleMutation, ReversibleMutationRegistry};
use arw_core::state::{ActorState, CooldownKey, CurseTransition};
use arw_core::types::{ActorId, BlockPos};

use EffectKind::{
    FireResistance, HealthBoost, Hunger, JumpBoost, NightVision, Resistance, SlowFalling, Speed,
};

// ---------------------------------------------------------------------------
// Bundles
// ---------------------------------------------------------------------------

const JUNGLE_BASE: &[EffectSpec] = &[(Speed, 0), (JumpBoost, 0)];
const JUNGLE_ENHANCED: &[EffectSpec] = &[(Speed, 2), (JumpBoost, 2), (SlowFalling, 3), (NightVision, 0)];
const BREEZE_BASE: &[EffectSpec] = &[(SlowFalling, 0)];
const BREEZE_ENHANCED: &[EffectSpec] = &[(Speed, 1), (JumpBoost, 1), (Resistance, 0)];
const MAGMA: &[EffectSpec] = &[(FireResistance, 0), (Resistance, 1)];
const IMMORTALITY: &[EffectSpec] = &[(HealthBoost, 3)];

const DIAMOND_KATANA: &[EffectSpec] = &[(Hunger, 1), (Speed, 1), (JumpBoost, 1)];
const STEEL_KATANA: &[EffectSpec] = &[(Speed, 2), (JumpBoost, 1)];
const IRON_KATANA: &[EffectSpec] = &[(Hunger, 0), (Speed, 0)];

/// Weakness amplifier while a katana is held with an occupied off hand.
const KATANA_OFFHAND_PENALTY: u8 = 2;
/// Amplifier of the curse debuff.
const CURSE_AMPLIFIER: u8 = 1;
/// Amplifier of the instant heal granted by an immortality rescue.
const RESCUE_HEAL_AMPLIFIER: u8 = 3;
/// Amplifier of the resistance granted by an immortality rescue.
const RESCUE_RESISTANCE_AMPLIFIER: u8 = 2;

fn katana_bundle(kind: KatanaKind) -> &'static [EffectSpec] {
    match kind {
        KatanaKind::Diamond => DIAMOND_KATANA,
        KatanaKind::Steel => STEEL_KATANA,
        KatanaKind::Iron => IRON_KATANA,
    }
}

/// Grant one effect, logging and reporting a host refusal instead of failing.
pub(crate) fn grant<H: Host + ?Sized>(host: &mut H, actor: ActorId, effect: StatusEffect) -> bool {
    match host.add_effect(actor, effect) {
        Ok(()) => true,
        Err(e) => {
            debug!(actor = %actor, effect = effect.kind.identifier(), error = %e, "Effect not applied");
            false
        }
    }
}

// ---------------------------------------------------------------------------
// Applier
// ---------------------------------------------------------------------------

/// What one actor's tick pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Effects the host accepted.
    pub effects_granted: usize,
    /// Effects the host refused.
    pub effects_failed: usize,
    /// The actor became cursed this tick.
    pub cursed: bool,
    /// The curse was lifted this tick.
    pub curse_lifted: bool,
    /// Immortality rescue fired this tick.
    pub rescued: bool,
    /// Reversible mutations registered by the magma walker.
    pub mutations_registered: usize,
}

impl PassReport {
    fn record(&mut self, accepted: bool) {
        if accepted {
            self.effects_granted += 1;
        } else {
            self.effects_failed += 1;
        }
    }
}

/// Applies the per-tick consequences of an actor's cached equipment.
pub struct EffectApplier<'a> {
    config: &'a ArwConfig,
}

impl<'a> EffectApplier<'a> {
    /// Create an applier over a configuration.
    #[must_use]
    pub fn new(config: &'a ArwConfig) -> Self {
        Self { config }
    }

    /// Run one actor's tick pass.
    ///
    /// Effect grants never abort the pass. A failed position read for the
    /// magma walker does, after every other bundle has been applied.
    ///
    /// # Errors
    /// Returns the host error that stopped the terrain scan.
    #[allow(clippy::too_many_arguments)]
    pub fn apply<H, R>(
        &self,
        host: &mut H,
        rng: &mut R,
        actor: ActorId,
        state: &mut ActorState,
        mutations: &mut ReversibleMutationRegistry,
        tick: u64,
        now: DateTime<Utc>,
    ) -> HostResult<PassReport>
    where
        H: Host + ?Sized,
        R: Rng + ?Sized,
    {
        let mut report = PassReport::default();
        let equipment = state.equipment().clone();

        if let Some(necklace) = equipment.off_class.necklace() {
            self.apply_necklace(host, actor, state, necklace, tick, &mut report);
        }
        self.apply_main_hand(host, rng, actor, state, equipment.main_class, equipment.off_hand_occupied(), &mut report);

        if equipment.off_class == ItemClass::Necklace(NecklaceKind::Magma)
            && state
                .cooldowns
                .tick_ready(CooldownKey::MagmaWalker, self.config.magma_walker.cooldown_ticks)
        {
            report.mutations_registered = self.magma_walk(host, actor, mutations, now)?;
        }
        Ok(report)
    }

    fn bundle<H: Host + ?Sized>(host: &mut H, actor: ActorId, bundle: &[EffectSpec], report: &mut PassReport) {
        for &(kind, amplifier) in bundle {
            report.record(grant(host, actor, StatusEffect::passive(kind, amplifier)));
        }
    }

    fn apply_necklace<H: Host + ?Sized>(
        &self,
        host: &mut H,
        actor: ActorId,
        state: &mut ActorState,
        necklace: NecklaceKind,
        tick: u64,
        report: &mut PassReport,
    ) {
        let interval = self.config.biome.check_interval_ticks;
        match necklace {
            NecklaceKind::Jungle => {
                let class = state.biome.sample(&*host, actor, tick, interval);
                Self::bundle(host, actor, JUNGLE_BASE, report);
                if class == BiomeClass::Jungle {
                    Self::bundle(host, actor, JUNGLE_ENHANCED, report);
                }
            }
            NecklaceKind::Breeze => {
                let class = state.biome.sample(&*host, actor, tick, interval);
                Self::bundle(host, actor, BREEZE_BASE, report);
                if class == BiomeClass::Mountain {
                    Self::bundle(host, actor, BREEZE_ENHANCED, report);
                }
            }
            NecklaceKind::Magma => {
                Self::bundle(host, actor, MAGMA, report);
                match host.is_on_fire(actor) {
                    Ok(true) => {
                        let regen = StatusEffect::new(EffectKind::Regeneration, self.config.effects.magma_regen_ticks, 0);
                        report.record(grant(host, actor, regen));
                    }
                    Ok(false) => {}
                    Err(e) => debug!(actor = %actor, error = %e, "Fire state unavailable"),
                }
            }
            NecklaceKind::Immortality => {
                Self::bundle(host, actor, IMMORTALITY, report);
                self.rescue(host, actor, report);
            }
        }
    }

    fn rescue<H: Host + ?Sized>(&self, host: &mut H, actor: ActorId, report: &mut PassReport) {
        let health = match host.health(actor) {
            Ok(Some(h)) => h,
            Ok(None) => {
                debug!(actor = %actor, "Immortality necklace on an actor without health");
                return;
            }
            Err(e) => {
                debug!(actor = %actor, error = %e, "Health unavailable, rescue skipped");
                return;
            }
        };
        if health > self.config.effects.low_health_threshold {
            return;
        }

        // Both effects are re-granted, not stacked, while health stays low.
        let heal = StatusEffect::new(EffectKind::InstantHealth, 1, RESCUE_HEAL_AMPLIFIER);
        let guard = StatusEffect::new(
            EffectKind::Resistance,
            self.config.effects.rescue_resistance_ticks,
            RESCUE_RESISTANCE_AMPLIFIER,
        );
        report.record(grant(host, actor, heal));
        report.record(grant(host, actor, guard));
        report.rescued = true;
        trace!(actor = %actor, health, "Immortality rescue");
    }

    #[allow(clippy::too_many_arguments)]
    fn apply_main_hand<H, R>(
        &self,
        host: &mut H,
        rng: &mut R,
        actor: ActorId,
        state: &mut ActorState,
        main: ItemClass,
        off_occupied: bool,
        report: &mut PassReport,
    ) where
        H: Host + ?Sized,
        R: Rng + ?Sized,
    {
        if main == ItemClass::SacrificialDagger {
            if state.curse.tick_held(rng, &self.config.curse) == CurseTransition::BecameCursed {
                report.record(grant(host, actor, StatusEffect::permanent(EffectKind::Wither, CURSE_AMPLIFIER)));
                report.cursed = true;
                info!(actor = %actor, elapsed = state.curse.elapsed_ticks, "Actor cursed");
            }
            return;
        }

        if state.curse.release() {
            if let Err(e) = host.remove_effect(actor, EffectKind::Wither) {
                debug!(actor = %actor, error = %e, "Curse removal failed");
            }
            report.curse_lifted = true;
            info!(actor = %actor, "Curse lifted, dagger put away");
        }

        match main {
            ItemClass::Poleaxe(_) => {
                let slowness = if off_occupied { 2 } else { 0 };
                report.record(grant(host, actor, StatusEffect::passive(EffectKind::Slowness, slowness)));
                if off_occupied {
                    report.record(grant(host, actor, StatusEffect::passive(EffectKind::Weakness, 1)));
                }
            }
            ItemClass::Katana(kind) => {
                Self::bundle(host, actor, katana_bundle(kind), report);
                if off_occupied {
                    let penalty = StatusEffect::passive(EffectKind::Weakness, KATANA_OFFHAND_PENALTY);
                    report.record(grant(host, actor, penalty));
                }
            }
            _ => {}
        }
    }

    /// Convert hazardous blocks one layer under the actor and schedule their
    /// reversion. Returns how many blocks were converted.
    fn magma_walk<H: Host + ?Sized>(
        &self,
        host: &mut H,
        actor: ActorId,
        mutations: &mut ReversibleMutationRegistry,
        now: DateTime<Utc>,
    ) -> HostResult<usize> {
        let walker = &self.config.magma_walker;
        let (dimension, location) = host.actor_position(actor)?;
        let center = location.block().offset_y(-1);
        let hazard = walker.hazard();
        let safe = walker.safe();
        let expire_at = now + walker.revert_after();

        let mut converted = 0;
        for dx in -walker.radius..=walker.radius {
            for dz in -walker.radius..=walker.radius {
                let pos = BlockPos::new(center.x + dx, center.y, center.z + dz);
                match host.block_at(&dimension, pos) {
                    Ok(Some(block)) if block == hazard => {}
                    Ok(_) => continue,
                    Err(e) => {
                        trace!(actor = %actor, %pos, error = %e, "Block unreadable, skipped");
                        continue;
                    }
                }
                if let Err(e) = host.set_block(&dimension, pos, &safe) {
                    debug!(actor = %actor, %pos, error = %e, "Block conversion rejected");
                    continue;
                }
                mutations.register(ReversibleMutation {
                    key: MutationKey::new(dimension.clone(), pos),
                    mutated_to: safe.clone(),
                    original: hazard.clone(),
                    expire_at,
                });
                converted += 1;
            }
        }
        if converted > 0 {
            debug!(actor = %actor, converted, %dimension, "Magma walker converted blocks");
        }
        Ok(converted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arw_core::sandbox::SandboxHost;
    use arw_core::state::{ActorStateStore, EquipmentSampler};
    use arw_core::types::{BlockType, DimensionId, Location, Slot};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    struct Fixture {
        host: SandboxHost,
        store: ActorStateStore,
        registry: ReversibleMutationRegistry,
        rng: StdRng,
        config: ArwConfig,
        actor: ActorId,
    }

    impl Fixture {
        fn new() -> Self {
            let mut host = SandboxHost::new();
            let actor = host.add_player(Location::new(0.5, 64.0, 0.5));
            Self {
                host,
                store: ActorStateStore::new(),
                registry: ReversibleMutationRegistry::new(),
                rng: StdRng::seed_from_u64(11),
                config: ArwConfig::default(),
                actor,
            }
        }

        fn tick(&mut self, tick: u64) -> PassReport {
            let state = self.store.get_or_create(self.actor, tick, &mut self.rng, &self.config.curse);
            EquipmentSampler::refresh(&self.host, self.actor, state, tick);
            let now = self.host.now();
            EffectApplier::new(&self.config)
                .apply(&mut self.host, &mut self.rng, self.actor, state, &mut self.registry, tick, now)
                .unwrap()
        }

        fn amp(&self, kind: EffectKind) -> Option<u8> {
            self.host.effect(self.actor, kind).map(|e| e.amplifier)
        }
    }

    #[test]
    fn jungle_necklace_enhanced_only_in_jungle() {
        let mut f = Fixture::new();
        f.host.equip(f.actor, Slot::OffHand, "arw:necklace_of_jungle");
        f.host.set_biome(&DimensionId::overworld(), "minecraft:plains");
        f.tick(0);
        assert_eq!(f.amp(Speed), Some(0));
        assert_eq!(f.amp(NightVision), None);

        let mut f = Fixture::new();
        f.host.equip(f.actor, Slot::OffHand, "arw:necklace_of_jungle");
        f.host.set_biome(&DimensionId::overworld(), "minecraft:bamboo_jungle");
        f.tick(0);
        assert_eq!(f.amp(Speed), Some(2));
        assert_eq!(f.amp(SlowFalling), Some(3));
        assert_eq!(f.amp(NightVision), Some(0));
    }

    #[test]
    fn breeze_necklace_mountain_bonus() {
        let mut f = Fixture::new();
        f.host.equip(f.actor, Slot::OffHand, "arw:necklace_of_breeze");
        f.host.set_biome(&DimensionId::overworld(), "minecraft:jagged_peaks");
        f.tick(0);
        assert_eq!(f.amp(SlowFalling), Some(0));
        assert_eq!(f.amp(Speed), Some(1));
        assert_eq!(f.amp(Resistance), Some(0));
    }

    #[test]
    fn magma_necklace_regenerates_while_burning() {
        let mut f = Fixture::new();
        f.host.equip(f.actor, Slot::OffHand, "arw:necklace_of_magma");
        f.tick(0);
        assert_eq!(f.amp(FireResistance), Some(0));
        assert_eq!(f.amp(Resistance), Some(1));
        assert_eq!(f.amp(EffectKind::Regeneration), None);

        f.host.set_on_fire(f.actor, true);
        f.tick(1);
        assert_eq!(
            f.host.effect(f.actor, EffectKind::Regeneration).map(|e| e.duration_ticks),
            Some(10)
        );
    }

    #[test]
    fn immortality_rescues_at_low_health() {
        let mut f = Fixture::new();
        f.host.equip(f.actor, Slot::OffHand, "arw:necklace_of_immortality");
        assert!(!f.tick(0).rescued);
        assert_eq!(f.amp(HealthBoost), Some(3));

        f.host.put_health(f.actor, Some(3.0));
        for tick in 1..4 {
            assert!(f.tick(tick).rescued);
        }
        let resistance = f.host.effect(f.actor, Resistance).unwrap();
        assert_eq!(resistance.amplifier, 2);
        assert_eq!(resistance.duration_ticks, 100);
        assert_eq!(f.amp(EffectKind::InstantHealth), Some(3));
    }

    #[test]
    fn immortality_without_health_component_does_not_fail() {
        let mut f = Fixture::new();
        f.host.equip(f.actor, Slot::OffHand, "arw:necklace_of_immortality");
        f.host.put_health(f.actor, None);
        let report = f.tick(0);
        assert!(!report.rescued);
        assert_eq!(report.effects_granted, 1);
    }

    #[test]
    fn katana_penalty_with_occupied_off_hand() {
        let mut f = Fixture::new();
        f.host.equip(f.actor, Slot::MainHand, "arw:diamond_katana");
        f.tick(0);
        assert_eq!(f.amp(Hunger), Some(1));
        assert_eq!(f.amp(EffectKind::Weakness), None);

        f.host.equip(f.actor, Slot::OffHand, "minecraft:torch");
        f.tick(1);
        assert_eq!(f.amp(EffectKind::Weakness), Some(2));
    }

    #[test]
    fn poleaxe_slows_more_with_occupied_off_hand() {
        let mut f = Fixture::new();
        f.host.equip(f.actor, Slot::MainHand, "arw:steel_poleaxe");
        f.tick(0);
        assert_eq!(f.amp(EffectKind::Slowness), Some(0));

        f.host.equip(f.actor, Slot::OffHand, "arw:necklace_of_magma");
        f.tick(1);
        assert_eq!(f.amp(EffectKind::Slowness), Some(2));
        assert_eq!(f.amp(EffectKind::Weakness), Some(1));
    }

    #[test]
    fn dagger_put_away_lifts_curse_even_for_another_weapon() {
        let mut f = Fixture::new();
        f.host.equip(f.actor, Slot::MainHand, "arw:sacrificial_dagger");
        f.tick(0);
        f.store.get_mut(f.actor).unwrap().curse.threshold_ticks = 3;
        let cursed_at = (1..10).find(|&t| f.tick(t).cursed);
        assert_eq!(cursed_at, Some(3));
        assert!(f.host.effect(f.actor, EffectKind::Wither).unwrap().is_permanent());

        f.host.equip(f.actor, Slot::MainHand, "arw:steel_poleaxe");
        assert!(f.tick(10).curse_lifted);
        assert_eq!(f.host.effect(f.actor, EffectKind::Wither), None);
    }

    #[test]
    fn magma_walker_converts_lava_under_actor() {
        let mut f = Fixture::new();
        let dim = DimensionId::overworld();
        let lava = BlockType::new("minecraft:lava");
        f.host.fill_layer(&dim, BlockPos::new(0, 63, 0), 3, &lava);
        f.host.equip(f.actor, Slot::OffHand, "arw:necklace_of_magma");

        assert_eq!(f.tick(0).mutations_registered, 0);
        assert_eq!(f.tick(1).mutations_registered, 0);
        assert_eq!(f.tick(2).mutations_registered, 25);
        assert_eq!(f.registry.len(), 25);
        assert_eq!(f.host.block(&dim, BlockPos::new(2, 63, -2)), Some(BlockType::new("minecraft:basalt")));
        assert_eq!(f.host.block(&dim, BlockPos::new(3, 63, 0)), Some(lava));

        // nothing left to convert on the next scan
        for t in 3..6 {
            assert_eq!(f.tick(t).mutations_registered, 0);
        }
    }
}
