//! On-hit policy.
//!
//! A hit is resolved in two phases from the attacker's cached equipment:
//! the main-hand weapon (mutually exclusive, first match wins), then the
//! off-hand accessory (independent of the main hand). Random rolls come from
//! the rule's RNG so seeded sessions are reproducible.

use rand::Rng;
use tracing::{debug, trace};

use arw_core::biome::BiomeClass;
use arw_core::config::{ArwConfig, Knockback};
use arw_core::deferred::{DeferredAction, DeferredActionScheduler, DeferredPayload};
use arw_core::effect::{EffectKind, StatusEffect};
use arw_core::host::Host;
use arw_core::items::{DagaKind, ItemClass, NecklaceKind};
use arw_core::state::ActorState;
use arw_core::types::{ActionId, ActorId, DamageCause, Slot};

use crate::effects::grant;
use crate::events::HitEvent;

/// Amplifier of the jade daga disable: the strongest the host accepts.
const DISABLE_AMPLIFIER: u8 = 255;

fn roll<R: Rng + ?Sized>(rng: &mut R, chance: f64) -> bool {
    rng.gen_bool(chance.clamp(0.0, 1.0))
}

/// What a routed hit did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HitReport {
    /// Main-hand class that handled the hit, if any.
    pub weapon: Option<ItemClass>,
    /// Deferred strike scheduled by this hit.
    pub scheduled: Option<ActionId>,
    /// The attacker's curse was lifted.
    pub curse_lifted: bool,
    /// The jade daga disable fired.
    pub disabled_target: bool,
    /// Effects the host accepted.
    pub effects_granted: usize,
    /// Host calls that failed.
    pub host_failures: usize,
}

impl HitReport {
    fn record(&mut self, accepted: bool) {
        if accepted {
            self.effects_granted += 1;
        } else {
            self.host_failures += 1;
        }
    }
}

/// Routes hits to weapon and accessory effects.
pub struct CombatEventRouter<'a> {
    config: &'a ArwConfig,
}

impl<'a> CombatEventRouter<'a> {
    /// Create a router over a configuration.
    #[must_use]
    pub fn new(config: &'a ArwConfig) -> Self {
        Self { config }
    }

    /// Resolve one hit. `attacker_state` must be the attacker's store entry.
    pub fn route<H, R>(
        &self,
        host: &mut H,
        rng: &mut R,
        scheduler: &mut DeferredActionScheduler,
        hit: &HitEvent,
        attacker_state: &mut ActorState,
    ) -> HitReport
    where
        H: Host + ?Sized,
        R: Rng + ?Sized,
    {
        let mut report = HitReport::default();
        self.main_hand(host, rng, scheduler, hit, attacker_state, &mut report);
        self.off_hand(host, rng, hit, attacker_state, &mut report);
        report
    }

    fn main_hand<H, R>(
        &self,
        host: &mut H,
        rng: &mut R,
        scheduler: &mut DeferredActionScheduler,
        hit: &HitEvent,
        state: &mut ActorState,
        report: &mut HitReport,
    ) where
        H: Host + ?Sized,
        R: Rng + ?Sized,
    {
        let combat = &self.config.combat;
        let equipment = state.equipment().clone();
        let (attacker, target) = (hit.attacker, hit.target);

        match equipment.main_class {
            ItemClass::AmethystSpear => {
                let spear = &combat.amethyst_spear;
                report.record(grant(host, target, StatusEffect::new(EffectKind::Weakness, spear.weakness_ticks, 1)));
                if roll(rng, spear.health_reduction_chance) {
                    Self::cut_health(host, target, spear.health_reduction_amount, report);
                }
            }
            ItemClass::SacrificialDagger => {
                if state.curse.qualifying_hit(rng, &self.config.curse) {
                    report.curse_lifted = true;
                    if let Err(e) = host.remove_effect(attacker, EffectKind::Wither) {
                        debug!(actor = %attacker, error = %e, "Curse removal failed");
                        report.host_failures += 1;
                    }
                }
                report.record(grant(host, attacker, StatusEffect::new(EffectKind::InstantHealth, 1, 0)));
                report.record(
                    host.apply_damage(target, combat.sacrificial_dagger_damage, DamageCause::EntityAttack)
                        .is_ok(),
                );
            }
            ItemClass::RoyalKris => {
                let kris = &combat.royal_kris;
                report.record(grant(host, attacker, StatusEffect::new(EffectKind::Speed, kris.speed_ticks, 0)));
                if roll(rng, kris.weakness_chance) {
                    report.record(grant(host, target, StatusEffect::new(EffectKind::Weakness, kris.weakness_ticks, 1)));
                }
                report.record(grant(host, target, StatusEffect::new(EffectKind::Poison, kris.poison_ticks, 0)));
                let strength_chance = if equipment.off_hand_occupied() {
                    kris.strength_chance_occupied_offhand
                } else {
                    kris.strength_chance_empty_offhand
                };
                if roll(rng, strength_chance) {
                    report.record(grant(host, attacker, StatusEffect::new(EffectKind::Strength, kris.strength_ticks, 1)));
                }
            }
            ItemClass::Poleaxe(_) => {
                Self::knock_back(host, attacker, target, combat.poleaxe_knockback, report);
            }
            ItemClass::ShogunKatana => {
                let shogun = &combat.shogun_katana;
                if !equipment.off_hand_occupied() {
                    if roll(rng, shogun.debuff_chance) {
                        report.record(grant(host, target, StatusEffect::new(EffectKind::Slowness, shogun.debuff_ticks, 2)));
                        report.record(grant(host, target, StatusEffect::new(EffectKind::Weakness, shogun.debuff_ticks, 3)));
                    }
                    if roll(rng, shogun.lightning_chance) {
                        let strike = DeferredPayload::LightningStrike {
                            smite_chance: shogun.smite_chance,
                            smite_damage: shogun.smite_damage,
                        };
                        report.scheduled =
                            Self::schedule_strike(host, scheduler, target, shogun.lightning_delay_ticks, strike);
                        if report.scheduled.is_none() {
                            report.host_failures += 1;
                        }
                    }
                }
                Self::knock_back(host, attacker, target, shogun.knockback, report);
            }
            _ => return,
        }
        report.weapon = Some(equipment.main_class);
    }

    fn off_hand<H, R>(&self, host: &mut H, rng: &mut R, hit: &HitEvent, state: &ActorState, report: &mut HitReport)
    where
        H: Host + ?Sized,
        R: Rng + ?Sized,
    {
        let combat = &self.config.combat;
        let equipment = state.equipment();
        let (attacker, target) = (hit.attacker, hit.target);

        match equipment.off_class {
            ItemClass::Daga(DagaKind::Jade) => {
                let jade = &combat.jade_daga;
                if equipment.main_class.pairs_with_jade_daga() && roll(rng, jade.disable_chance) {
                    report.record(grant(host, target, StatusEffect::new(EffectKind::Weakness, jade.disable_ticks, DISABLE_AMPLIFIER)));
                    report.record(grant(host, target, StatusEffect::new(EffectKind::Slowness, jade.disable_ticks, DISABLE_AMPLIFIER)));
                    if let Err(e) = host.damage_item(attacker, Slot::OffHand, jade.durability_cost) {
                        trace!(actor = %attacker, error = %e, "Jade daga wear not applied");
                        report.host_failures += 1;
                    }
                    report.disabled_target = true;
                }
            }
            ItemClass::Necklace(NecklaceKind::Jungle) => {
                let ticks = if state.biome.classification == BiomeClass::Jungle {
                    combat.jungle_venom_ticks
                } else {
                    combat.jungle_venom_outside_ticks
                };
                report.record(grant(host, target, StatusEffect::new(EffectKind::Poison, ticks, 0)));
            }
            ItemClass::Necklace(NecklaceKind::Breeze) => {
                if roll(rng, combat.breeze_launch_chance) {
                    let launch = StatusEffect::new(EffectKind::Levitation, combat.breeze_levitation_ticks, 0);
                    report.record(grant(host, target, launch));
                }
            }
            _ => {}
        }
    }

    /// Lower health by `amount` without killing; fall back to generic damage
    /// when the health component cannot be used. Never raises health.
    fn cut_health<H: Host + ?Sized>(host: &mut H, target: ActorId, amount: f32, report: &mut HitReport) {
        let cut = match host.health(target) {
            Ok(Some(current)) if current > 1.0 => host.set_health(target, (current - amount).max(1.0)),
            Ok(Some(_)) => Ok(()),
            Ok(None) => {
                debug!(actor = %target, "No health component, falling back to damage");
                host.apply_damage(target, amount, DamageCause::EntityAttack)
            }
            Err(e) => {
                debug!(actor = %target, error = %e, "Health unavailable, falling back to damage");
                host.apply_damage(target, amount, DamageCause::EntityAttack)
            }
        };
        report.record(cut.is_ok());
    }

    fn knock_back<H: Host + ?Sized>(
        host: &mut H,
        attacker: ActorId,
        target: ActorId,
        knockback: Knockback,
        report: &mut HitReport,
    ) {
        let result = match host.view_direction(attacker) {
            Ok(dir) => host.apply_knockback(target, dir.x, dir.z, knockback.horizontal, knockback.vertical),
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            debug!(actor = %target, error = %e, "Knockback not applied");
            report.host_failures += 1;
        }
    }

    fn schedule_strike<H: Host + ?Sized>(
        host: &H,
        scheduler: &mut DeferredActionScheduler,
        target: ActorId,
        delay_ticks: u32,
        payload: DeferredPayload,
    ) -> Option<ActionId> {
        match host.actor_position(target) {
            Ok((dimension, _)) => Some(scheduler.schedule(DeferredAction::new(target, dimension, delay_ticks, payload))),
            Err(e) => {
                debug!(actor = %target, error = %e, "Strike target has no position, not scheduled");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arw_core::sandbox::SandboxHost;
    use arw_core::state::{ActorStateStore, EquipmentSampler};
    use arw_core::types::{ActorKind, Location};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    struct Fixture {
        host: SandboxHost,
        store: ActorStateStore,
        scheduler: DeferredActionScheduler,
        rng: StdRng,
        config: ArwConfig,
        attacker: ActorId,
        target: ActorId,
    }

    impl Fixture {
        fn new(config: ArwConfig) -> Self {
            let mut host = SandboxHost::new();
            let attacker = host.add_player(Location::new(0.0, 64.0, 0.0));
            let target = host.add_mob(Location::new(1.0, 64.0, 0.0));
            Self {
                host,
                store: ActorStateStore::new(),
                scheduler: DeferredActionScheduler::new(),
                rng: StdRng::seed_from_u64(21),
                config,
                attacker,
                target,
            }
        }

        fn hit(&mut self) -> HitReport {
            let state = self.store.get_or_create(self.attacker, 0, &mut self.rng, &self.config.curse);
            EquipmentSampler::refresh(&self.host, self.attacker, state, 0);
            let event = HitEvent {
                attacker: self.attacker,
                attacker_kind: ActorKind::Player,
                target: self.target,
                cause: DamageCause::EntityAttack,
            };
            CombatEventRouter::new(&self.config).route(&mut self.host, &mut self.rng, &mut self.scheduler, &event, state)
        }
    }

    fn certain() -> ArwConfig {
        let mut config = ArwConfig::default();
        let c = &mut config.combat;
        c.amethyst_spear.health_reduction_chance = 1.0;
        c.royal_kris.weakness_chance = 1.0;
        c.royal_kris.strength_chance_empty_offhand = 1.0;
        c.royal_kris.strength_chance_occupied_offhand = 0.0;
        c.shogun_katana.debuff_chance = 1.0;
        c.shogun_katana.lightning_chance = 1.0;
        c.jade_daga.disable_chance = 1.0;
        c.breeze_launch_chance = 1.0;
        config
    }

    #[test]
    fn amethyst_spear_cuts_health_with_floor() {
        let mut f = Fixture::new(certain());
        f.host.equip(f.attacker, Slot::MainHand, "arw:amethyst_spear");
        f.host.put_health(f.target, Some(4.0));
        let report = f.hit();
        assert_eq!(report.weapon, Some(ItemClass::AmethystSpear));
        assert_eq!(f.host.current_health(f.target), Some(1.0));
        assert_eq!(f.host.effect(f.target, EffectKind::Weakness).map(|e| e.amplifier), Some(1));
    }

    #[test]
    fn amethyst_spear_never_raises_low_health() {
        let mut f = Fixture::new(certain());
        f.host.equip(f.attacker, Slot::MainHand, "arw:amethyst_spear");
        f.host.put_health(f.target, Some(0.5));
        f.hit();
        assert_eq!(f.host.current_health(f.target), Some(0.5));
        assert!(f.host.damage_log().is_empty());
    }

    #[test]
    fn amethyst_spear_falls_back_to_damage() {
        let mut f = Fixture::new(certain());
        f.host.equip(f.attacker, Slot::MainHand, "arw:amethyst_spear");
        f.host.put_health(f.target, None);
        f.hit();
        assert_eq!(f.host.damage_log(), &[(f.target, 6.0, DamageCause::EntityAttack)]);
    }

    #[test]
    fn royal_kris_strength_depends_on_off_hand() {
        let mut f = Fixture::new(certain());
        f.host.equip(f.attacker, Slot::MainHand, "arw:royal_kris");
        f.hit();
        assert!(f.host.effect(f.attacker, EffectKind::Strength).is_some());
        assert_eq!(f.host.effect(f.target, EffectKind::Poison).map(|e| e.duration_ticks), Some(160));

        let mut f = Fixture::new(certain());
        f.host.equip(f.attacker, Slot::MainHand, "arw:royal_kris");
        f.host.equip(f.attacker, Slot::OffHand, "minecraft:shield");
        f.hit();
        assert!(f.host.effect(f.attacker, EffectKind::Strength).is_none());
    }

    #[test]
    fn shogun_schedules_strike_only_with_empty_off_hand() {
        let mut f = Fixture::new(certain());
        f.host.equip(f.attacker, Slot::MainHand, "arw:shogun_katana");
        let report = f.hit();
        assert!(report.scheduled.is_some());
        assert_eq!(f.scheduler.pending_count(), 1);
        assert_eq!(f.host.effect(f.target, EffectKind::Weakness).map(|e| e.amplifier), Some(3));
        assert_eq!(f.host.knockbacks().len(), 1);
        assert!((f.host.knockbacks()[0].horizontal - 1.125).abs() < f64::EPSILON);

        let mut f = Fixture::new(certain());
        f.host.equip(f.attacker, Slot::MainHand, "arw:shogun_katana");
        f.host.equip(f.attacker, Slot::OffHand, "arw:necklace_of_magma");
        let report = f.hit();
        assert!(report.scheduled.is_none());
        assert_eq!(f.host.knockbacks().len(), 1);
    }

    #[test]
    fn poleaxe_knocks_back_along_view() {
        let mut f = Fixture::new(ArwConfig::default());
        f.host.equip(f.attacker, Slot::MainHand, "arw:netherite_poleaxe");
        f.hit();
        let kb = f.host.knockbacks()[0];
        assert_eq!(kb.actor, f.target);
        assert!((kb.direction_z - 1.0).abs() < f64::EPSILON);
        assert!((kb.horizontal - 1.5).abs() < f64::EPSILON);
        assert!((kb.vertical - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn sacrificial_dagger_heals_and_damages() {
        let mut f = Fixture::new(ArwConfig::default());
        f.host.equip(f.attacker, Slot::MainHand, "arw:sacrificial_dagger");
        let report = f.hit();
        assert!(!report.curse_lifted);
        assert!(f.host.effect(f.attacker, EffectKind::InstantHealth).is_some());
        assert_eq!(f.host.damage_log(), &[(f.target, 4.0, DamageCause::EntityAttack)]);
    }

    #[test]
    fn jade_daga_needs_allowed_main_hand() {
        let mut f = Fixture::new(certain());
        f.host.equip(f.attacker, Slot::MainHand, "minecraft:iron_sword");
        f.host.equip(f.attacker, Slot::OffHand, "arw:jade_daga");
        let report = f.hit();
        assert!(report.disabled_target);
        assert_eq!(report.weapon, None);
        assert_eq!(f.host.effect(f.target, EffectKind::Slowness).map(|e| e.amplifier), Some(255));
        assert_eq!(f.host.item_wear(), &[(f.attacker, Slot::OffHand, 5)]);

        let mut f = Fixture::new(certain());
        f.host.equip(f.attacker, Slot::MainHand, "arw:royal_kris");
        f.host.equip(f.attacker, Slot::OffHand, "arw:jade_daga");
        assert!(!f.hit().disabled_target);
    }

    #[test]
    fn necklaces_add_on_hit_effects_independently() {
        let mut f = Fixture::new(certain());
        f.host.equip(f.attacker, Slot::MainHand, "arw:netherite_poleaxe");
        f.host.equip(f.attacker, Slot::OffHand, "arw:necklace_of_breeze");
        f.hit();
        assert_eq!(f.host.knockbacks().len(), 1);
        assert_eq!(f.host.effect(f.target, EffectKind::Levitation).map(|e| e.duration_ticks), Some(40));

        let mut f = Fixture::new(certain());
        f.host.equip(f.attacker, Slot::OffHand, "arw:necklace_of_jungle");
        f.hit();
        assert_eq!(f.host.effect(f.target, EffectKind::Poison).map(|e| e.duration_ticks), Some(50));
    }
}
