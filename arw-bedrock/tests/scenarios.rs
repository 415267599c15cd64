//! End-to-end scenarios: an `ArwRule` driven tick by tick against the
//! sandbox world, the way a Bedrock binding drives it.

use std::io::Write;

use chrono::Duration;

use arw_bedrock::hooks;
use arw_bedrock::{ArwRule, HitEvent, HostEvent, SharedRule, on_actor_departed, on_hit, on_tick};
use arw_core::config::ArwConfig;
use arw_core::deferred::{DeferredAction, DeferredPayload};
use arw_core::effect::EffectKind;
use arw_core::sandbox::SandboxHost;
use arw_core::types::{ActorId, ActorKind, BlockPos, BlockType, DamageCause, DimensionId, Location, Slot, SpawnKind};

fn seeded(config: ArwConfig) -> ArwRule {
    let mut config = config;
    config.general.seed = Some(0x5EED);
    ArwRule::with_config(config).unwrap()
}

fn melee(attacker: ActorId, target: ActorId) -> HitEvent {
    HitEvent {
        attacker,
        attacker_kind: ActorKind::Player,
        target,
        cause: DamageCause::EntityAttack,
    }
}

// ---------------------------------------------------------------------------
// Curse weapon
// ---------------------------------------------------------------------------

#[test]
fn curse_lands_at_threshold_and_a_hit_lifts_it() {
    let mut rule = seeded(ArwConfig::default());
    let mut host = SandboxHost::new();
    let player = host.add_player(Location::new(0.5, 64.0, 0.5));
    let victim = host.add_mob(Location::new(2.5, 64.0, 0.5));
    host.equip(player, Slot::MainHand, "arw:sacrificial_dagger");

    on_tick(&mut rule, &mut host);
    rule.store.get_mut(player).unwrap().curse.threshold_ticks = 700;

    for _ in 1..700 {
        on_tick(&mut rule, &mut host);
    }
    assert_eq!(rule.current_tick, 700);
    assert!(!rule.store.get(player).unwrap().curse.is_cursed);
    assert_eq!(host.effect(player, EffectKind::Wither), None);

    on_tick(&mut rule, &mut host);
    assert!(rule.store.get(player).unwrap().curse.is_cursed);
    assert!(host.effect(player, EffectKind::Wither).unwrap().is_permanent());

    let report = on_hit(&mut rule, &mut host, &melee(player, victim)).unwrap();
    assert!(report.curse_lifted);
    let curse = rule.store.get(player).unwrap().curse;
    assert!(!curse.is_cursed);
    assert_eq!(curse.elapsed_ticks, 0);
    assert_eq!(host.effect(player, EffectKind::Wither), None);
}

// ---------------------------------------------------------------------------
// Deferred strike
// ---------------------------------------------------------------------------

#[test]
fn shogun_strike_lands_after_delay_at_target() {
    let mut config = ArwConfig::default();
    config.combat.shogun_katana.lightning_chance = 1.0;
    config.combat.shogun_katana.smite_chance = 0.0;
    let mut rule = seeded(config);
    let mut host = SandboxHost::new();
    let player = host.add_player(Location::new(0.0, 64.0, 0.0));
    let target = host.add_mob(Location::new(3.0, 64.0, 0.0));
    host.equip(player, Slot::MainHand, "arw:shogun_katana");

    let report = on_hit(&mut rule, &mut host, &melee(player, target)).unwrap();
    assert!(report.scheduled.is_some());
    host.move_actor(target, Location::new(8.0, 64.0, -4.0));

    for _ in 0..99 {
        on_tick(&mut rule, &mut host);
    }
    assert!(host.spawned().is_empty());
    assert_eq!(rule.scheduler.pending_count(), 1);

    on_tick(&mut rule, &mut host);
    let strikes: Vec<_> = host
        .spawned()
        .iter()
        .filter(|(_, kind, _)| *kind == SpawnKind::LightningBolt)
        .collect();
    assert_eq!(strikes.len(), 1);
    assert_eq!(strikes[0].2, Location::new(8.0, 64.0, -4.0));
    assert_eq!(rule.scheduler.pending_count(), 0);

    let snap = rule.counters.snapshot();
    assert_eq!(snap.deferred_scheduled, 1);
    assert_eq!(snap.deferred_fired, 1);
}

#[test]
fn strike_on_departed_target_is_dropped() {
    let mut config = ArwConfig::default();
    config.combat.shogun_katana.lightning_chance = 1.0;
    let mut rule = seeded(config);
    let mut host = SandboxHost::new();
    let player = host.add_player(Location::default());
    let target = host.add_mob(Location::new(1.0, 64.0, 0.0));
    host.equip(player, Slot::MainHand, "arw:shogun_katana");

    on_hit(&mut rule, &mut host, &melee(player, target)).unwrap();
    host.remove_actor(target);
    for _ in 0..100 {
        on_tick(&mut rule, &mut host);
    }
    assert!(host.spawned().is_empty());
    assert_eq!(rule.counters.snapshot().deferred_dropped, 1);
}

// ---------------------------------------------------------------------------
// Magma walker
// ---------------------------------------------------------------------------

#[test]
fn magma_walker_terrain_reverts_after_ten_seconds() {
    let mut rule = seeded(ArwConfig::default());
    let mut host = SandboxHost::new();
    let dim = DimensionId::overworld();
    let lava = BlockType::new("minecraft:lava");
    let under = BlockPos::new(0, 63, 0);
    let player = host.add_player(Location::new(0.5, 64.0, 0.5));
    host.fill_layer(&dim, under, 2, &lava);
    host.equip(player, Slot::OffHand, "arw:necklace_of_magma");

    for _ in 0..3 {
        on_tick(&mut rule, &mut host);
    }
    assert_eq!(rule.mutations.len(), 25);
    assert_eq!(host.block(&dim, under), Some(BlockType::new("minecraft:basalt")));

    host.advance_clock(Duration::milliseconds(9_900));
    assert_eq!(on_tick(&mut rule, &mut host).mutations_reverted, 0);
    assert_eq!(host.block(&dim, under), Some(BlockType::new("minecraft:basalt")));

    host.advance_clock(Duration::milliseconds(200));
    assert_eq!(on_tick(&mut rule, &mut host).mutations_reverted, 25);
    assert_eq!(host.block(&dim, under), Some(lava));
    assert!(rule.mutations.is_empty());
}

#[test]
fn player_placed_block_survives_revert() {
    let mut rule = seeded(ArwConfig::default());
    let mut host = SandboxHost::new();
    let dim = DimensionId::overworld();
    let under = BlockPos::new(0, 63, 0);
    let player = host.add_player(Location::new(0.5, 64.0, 0.5));
    host.fill_layer(&dim, under, 2, &BlockType::new("minecraft:lava"));
    host.equip(player, Slot::OffHand, "arw:necklace_of_magma");
    for _ in 0..3 {
        on_tick(&mut rule, &mut host);
    }

    host.equip(player, Slot::OffHand, "minecraft:air");
    host.put_block(&dim, under, BlockType::new("minecraft:cobblestone"));
    host.advance_clock(Duration::seconds(11));
    let report = on_tick(&mut rule, &mut host);
    assert_eq!(report.mutations_reverted, 24);
    assert_eq!(host.block(&dim, under), Some(BlockType::new("minecraft:cobblestone")));
    assert_eq!(rule.counters.snapshot().mutations_skipped, 1);
}

// ---------------------------------------------------------------------------
// Lifecycle and isolation
// ---------------------------------------------------------------------------

#[test]
fn departed_actor_state_is_released() {
    let mut rule = seeded(ArwConfig::default());
    let mut host = SandboxHost::new();
    let a = host.add_player(Location::default());
    let b = host.add_player(Location::default());
    on_tick(&mut rule, &mut host);
    assert_eq!(rule.tracked_actors(), 2);

    host.remove_actor(a);
    assert!(on_actor_departed(&mut rule, a));
    on_tick(&mut rule, &mut host);
    assert_eq!(rule.tracked_actors(), 1);
    assert!(rule.store.get(b).is_some());
}

#[test]
fn equipment_read_failure_keeps_cached_loadout() {
    let mut rule = seeded(ArwConfig::default());
    let mut host = SandboxHost::new();
    let flaky = host.add_player(Location::default());
    host.equip(flaky, Slot::MainHand, "arw:iron_katana");
    on_tick(&mut rule, &mut host);

    host.fail_equipment(flaky, true);
    host.clear_logs();
    let report = on_tick(&mut rule, &mut host);
    assert_eq!(report.failed_actors, 0);
    assert!(
        host.effect_log()
            .iter()
            .any(|(actor, effect)| *actor == flaky && effect.kind == EffectKind::Speed)
    );
    assert_eq!(rule.counters.snapshot().host_read_failures, 2);
}

#[test]
fn failing_actor_pass_is_isolated() {
    let mut rule = seeded(ArwConfig::default());
    let mut host = SandboxHost::new();
    let dim = DimensionId::overworld();
    let lava = BlockType::new("minecraft:lava");
    let broken = host.add_player(Location::new(0.5, 64.0, 0.5));
    let healthy = host.add_player(Location::new(10.5, 64.0, 0.5));
    let mob = host.add_mob(Location::new(20.0, 64.0, 0.0));
    host.fill_layer(&dim, BlockPos::new(0, 63, 0), 2, &lava);
    host.fill_layer(&dim, BlockPos::new(10, 63, 0), 2, &lava);
    host.equip(broken, Slot::OffHand, "arw:necklace_of_magma");
    host.equip(healthy, Slot::OffHand, "arw:necklace_of_magma");
    host.fail_positions(broken, true);

    let strike = DeferredPayload::LightningStrike {
        smite_chance: 0.0,
        smite_damage: 0.0,
    };
    rule.scheduler.schedule(DeferredAction::new(mob, dim.clone(), 3, strike));

    for _ in 0..2 {
        assert_eq!(on_tick(&mut rule, &mut host).failed_actors, 0);
    }
    host.clear_logs();
    let report = on_tick(&mut rule, &mut host);

    assert_eq!(report.actors, 2);
    assert_eq!(report.failed_actors, 1);
    assert_eq!(report.deferred_fired, 1);
    assert_eq!(rule.counters.snapshot().actor_pass_failures, 1);

    // the broken actor's bundle still landed before its terrain scan failed
    assert!(host.effect(broken, EffectKind::FireResistance).is_some());
    assert_eq!(host.block(&dim, BlockPos::new(0, 63, 0)), Some(lava));

    // the actor after it was processed in full
    assert!(host.effect(healthy, EffectKind::FireResistance).is_some());
    assert_eq!(host.block(&dim, BlockPos::new(10, 63, 0)), Some(BlockType::new("minecraft:basalt")));
    assert_eq!(rule.mutations.len(), 25);
    assert_eq!(rule.scheduler.pending_count(), 0);
}

// ---------------------------------------------------------------------------
// Curse across departure
// ---------------------------------------------------------------------------

fn cursed_player(rule: &mut ArwRule, host: &mut SandboxHost) -> ActorId {
    let player = host.add_player(Location::new(0.5, 64.0, 0.5));
    host.equip(player, Slot::MainHand, "arw:sacrificial_dagger");
    on_tick(rule, host);
    rule.store.get_mut(player).unwrap().curse.threshold_ticks = 1;
    on_tick(rule, host);
    assert!(rule.store.get(player).unwrap().curse.is_cursed);
    assert!(host.effect(player, EffectKind::Wither).is_some());
    player
}

#[test]
fn curse_cleared_when_departed_actor_returns_unarmed() {
    let mut rule = seeded(ArwConfig::default());
    let mut host = SandboxHost::new();
    let player = cursed_player(&mut rule, &mut host);

    assert!(on_actor_departed(&mut rule, player));
    assert!(rule.pending_uncurse.contains(&player));

    host.equip(player, Slot::MainHand, "minecraft:air");
    for _ in 0..5 {
        on_tick(&mut rule, &mut host);
    }
    assert_eq!(host.effect(player, EffectKind::Wither), None);
    assert!(rule.pending_uncurse.is_empty());
}

#[test]
fn curse_cleared_when_pruned_actor_rejoins_with_dagger() {
    let mut rule = seeded(ArwConfig::default());
    let mut host = SandboxHost::new();
    let player = cursed_player(&mut rule, &mut host);

    let saved = host.remove_actor(player).unwrap();
    assert_eq!(on_tick(&mut rule, &mut host).pruned, 1);
    assert!(rule.pending_uncurse.contains(&player));

    host.rejoin(player, saved);
    on_tick(&mut rule, &mut host);
    assert_eq!(host.effect(player, EffectKind::Wither), None);
    let curse = rule.store.get(player).unwrap().curse;
    assert!(curse.is_holding);
    assert!(!curse.is_cursed);
}

#[test]
fn uncursed_departure_leaves_nothing_pending() {
    let mut rule = seeded(ArwConfig::default());
    let mut host = SandboxHost::new();
    let player = host.add_player(Location::default());
    host.equip(player, Slot::MainHand, "arw:sacrificial_dagger");
    on_tick(&mut rule, &mut host);

    assert!(on_actor_departed(&mut rule, player));
    assert!(rule.pending_uncurse.is_empty());
}

#[test]
fn hooks_feed_the_shared_rule() {
    let shared = SharedRule::new(seeded(ArwConfig::default()));
    let mut host = SandboxHost::new();
    let player = host.add_player(Location::default());
    let mob = host.add_mob(Location::new(1.0, 64.0, 0.0));
    host.equip(player, Slot::MainHand, "arw:royal_kris");

    shared.dispatch(&mut host, hooks::on_tick());
    let hurt = hooks::on_entity_hurt(Some((player, ActorKind::Player)), mob, "entityAttack").unwrap();
    shared.dispatch(&mut host, hurt);
    assert!(host.effect(mob, EffectKind::Poison).is_some());
    assert_eq!(shared.snapshot().hits_routed, 1);

    shared.dispatch(&mut host, HostEvent::Departed(player));
    assert_eq!(shared.with_rule(|r| r.tracked_actors()), 0);
}

#[test]
fn config_file_drives_the_session() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "[general]\nseed = 3\n\n[magma_walker]\nradius = 0\nrevert_after_ms = 500"
    )
    .unwrap();
    let shared = SharedRule::from_config_file(file.path()).unwrap();

    let mut host = SandboxHost::new();
    let dim = DimensionId::overworld();
    let player = host.add_player(Location::new(0.5, 64.0, 0.5));
    host.fill_layer(&dim, BlockPos::new(0, 63, 0), 2, &BlockType::new("minecraft:lava"));
    host.equip(player, Slot::OffHand, "arw:necklace_of_magma");

    for _ in 0..3 {
        shared.tick(&mut host);
    }
    assert_eq!(shared.with_rule(|r| r.mutations.len()), 1);

    host.advance_clock(Duration::milliseconds(600));
    assert_eq!(shared.tick(&mut host).mutations_reverted, 1);
}
