//! ARW Rule: the session context and its entry points.
//!
//! [`ArwRule`] owns everything that must survive between ticks: the actor
//! state store, the deferred action queue, the mutation registry, the RNG and
//! the counters. The host integration calls [`on_tick`] once per simulation
//! step, [`on_hit`] for every hurt event and [`on_actor_departed`] when an
//! actor leaves; none of them ever returns an error to the host.

use std::collections::HashSet;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, info_span, warn};

use arw_core::config::ArwConfig;
use arw_core::deferred::DeferredActionScheduler;
use arw_core::effect::EffectKind;
use arw_core::error::Result;
use arw_core::host::Host;
use arw_core::metrics::{ArwCounters, TickBudgetMonitor, spans};
use arw_core::mutation::ReversibleMutationRegistry;
use arw_core::state::{ActorState, ActorStateStore, EquipmentSampler};
use arw_core::types::ActorId;

use crate::combat::{CombatEventRouter, HitReport};
use crate::effects::EffectApplier;
use crate::events::{HitEvent, HostEvent};

// ---------------------------------------------------------------------------
// Rule State
// ---------------------------------------------------------------------------

/// Central state for one simulation session.
pub struct ArwRule {
    /// Per-actor cached state.
    pub store: ActorStateStore,
    /// Pending deferred actions.
    pub scheduler: DeferredActionScheduler,
    /// Pending reversible mutations.
    pub mutations: ReversibleMutationRegistry,
    /// Configuration.
    pub config: ArwConfig,
    /// Runtime counters.
    pub counters: ArwCounters,
    /// Tick pass timing.
    pub monitor: TickBudgetMonitor,
    /// Tick about to be processed by the next `on_tick`.
    pub current_tick: u64,
    /// Actors that left while cursed. Their wither is removed the next time
    /// they are seen, since a fresh state no longer knows about it.
    pub pending_uncurse: HashSet<ActorId>,
    rng: StdRng,
}

impl ArwRule {
    /// Create a rule with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::build(ArwConfig::default())
    }

    /// Create a rule with a validated configuration.
    ///
    /// # Errors
    /// Returns `ArwError::Config` if the configuration fails validation.
    pub fn with_config(config: ArwConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: ArwConfig) -> Self {
        let rng = match config.general.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            store: ActorStateStore::new(),
            scheduler: DeferredActionScheduler::new(),
            mutations: ReversibleMutationRegistry::new(),
            monitor: TickBudgetMonitor::new(config.performance.tick_budget_ms),
            counters: ArwCounters::new(),
            current_tick: 0,
            pending_uncurse: HashSet::new(),
            rng,
            config,
        }
    }

    /// Number of actors with cached state.
    #[must_use]
    pub fn tracked_actors(&self) -> usize {
        self.store.len()
    }
}

impl Default for ArwRule {
    fn default() -> Self {
        Self::new()
    }
}

/// Remember a dropped state's curse so the wither can be cleared later.
fn note_departure(pending_uncurse: &mut HashSet<ActorId>, actor: ActorId, state: &ActorState) {
    if state.curse.is_cursed {
        debug!(actor = %actor, "Cursed actor departed, wither removal deferred");
        pending_uncurse.insert(actor);
    }
}

/// Remove the wither of a returning actor that left while cursed. The entry
/// stays pending if the host refuses, and is retried on the next sighting.
fn lift_stale_curse<H: Host + ?Sized>(host: &mut H, pending_uncurse: &mut HashSet<ActorId>, actor: ActorId) {
    if !pending_uncurse.contains(&actor) {
        return;
    }
    match host.remove_effect(actor, EffectKind::Wither) {
        Ok(()) => {
            pending_uncurse.remove(&actor);
            info!(actor = %actor, "Curse lifted on return");
        }
        Err(e) => debug!(actor = %actor, error = %e, "Stale curse removal failed, retrying later"),
    }
}

// ---------------------------------------------------------------------------
// Entry Points
// ---------------------------------------------------------------------------

/// Summary of one tick pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// The tick that was processed.
    pub tick: u64,
    /// Actors whose pass ran.
    pub actors: usize,
    /// Actors whose pass stopped on a host error.
    pub failed_actors: usize,
    /// Actors pruned because they were no longer active.
    pub pruned: usize,
    /// Deferred actions that fired.
    pub deferred_fired: usize,
    /// Mutations reverted.
    pub mutations_reverted: usize,
}

/// Run one tick: advance the deferred queue, revert expired mutations, then
/// sample and apply effects for every active actor.
pub fn on_tick<H: Host + ?Sized>(rule: &mut ArwRule, host: &mut H) -> TickReport {
    let tick = rule.current_tick;
    rule.current_tick += 1;
    let mut report = TickReport {
        tick,
        ..TickReport::default()
    };
    if !rule.config.general.enabled {
        return report;
    }

    let ArwRule {
        store,
        scheduler,
        mutations,
        config,
        counters,
        monitor,
        rng,
        pending_uncurse,
        ..
    } = rule;

    let _span = info_span!(spans::TICK, tick).entered();
    let _guard = monitor.begin_tick();

    {
        let _span = info_span!(spans::DEFERRED).entered();
        let advanced = scheduler.advance(host, rng);
        ArwCounters::add(&counters.deferred_fired, advanced.fired as u64);
        ArwCounters::add(&counters.deferred_dropped, advanced.dropped as u64);
        ArwCounters::add(&counters.smites, advanced.smites as u64);
        report.deferred_fired = advanced.fired;
    }

    {
        let _span = info_span!(spans::MUTATIONS).entered();
        let now = host.now();
        let reverted = mutations.advance(host, now);
        ArwCounters::add(&counters.mutations_reverted, reverted.reverted as u64);
        ArwCounters::add(&counters.mutations_skipped, reverted.skipped as u64);
        ArwCounters::add(&counters.mutations_failed, reverted.failed as u64);
        report.mutations_reverted = reverted.reverted;
    }

    let active = host.active_actors();
    let active_set: HashSet<ActorId> = active.iter().copied().collect();
    let pruned = store.retain_active(&active_set);
    for (actor, state) in &pruned {
        note_departure(pending_uncurse, *actor, state);
    }
    report.pruned = pruned.len();
    ArwCounters::add(&counters.actors_evicted, report.pruned as u64);

    let applier = EffectApplier::new(config);
    let now = host.now();
    for actor in active {
        let _span = info_span!(spans::ACTOR_PASS, actor = %actor).entered();
        lift_stale_curse(host, pending_uncurse, actor);
        if store.get(actor).is_none() {
            ArwCounters::add(&counters.actors_tracked, 1);
        }
        let state = store.get_or_create(actor, tick, rng, &config.curse);
        let sample = EquipmentSampler::refresh(&*host, actor, state, tick);
        ArwCounters::add(&counters.host_read_failures, u64::from(sample.failed_slots));

        match applier.apply(host, rng, actor, state, mutations, tick, now) {
            Ok(pass) => {
                ArwCounters::add(&counters.mutations_registered, pass.mutations_registered as u64);
            }
            Err(e) => {
                warn!(actor = %actor, tick, error = %e, "Actor pass stopped");
                ArwCounters::add(&counters.actor_pass_failures, 1);
                report.failed_actors += 1;
            }
        }
        report.actors += 1;
    }

    ArwCounters::add(&counters.ticks, 1);
    report
}

/// Route one hit through the attacker's equipment.
///
/// Returns `None` when the hit is ignored: ARW disabled, or a non-player
/// attacker while `combat.players_only` is set.
pub fn on_hit<H: Host + ?Sized>(rule: &mut ArwRule, host: &mut H, hit: &HitEvent) -> Option<HitReport> {
    if !rule.config.general.enabled || (rule.config.combat.players_only && !hit.by_player()) {
        return None;
    }

    let ArwRule {
        store,
        scheduler,
        config,
        counters,
        rng,
        current_tick,
        pending_uncurse,
        ..
    } = rule;
    let tick = *current_tick;
    let _span = info_span!(spans::HIT, attacker = %hit.attacker, target = %hit.target).entered();

    lift_stale_curse(host, pending_uncurse, hit.attacker);
    if store.get(hit.attacker).is_none() {
        ArwCounters::add(&counters.actors_tracked, 1);
    }
    let state = store.get_or_create(hit.attacker, tick, rng, &config.curse);
    if !state.has_sampled() {
        let sample = EquipmentSampler::refresh(&*host, hit.attacker, state, tick);
        ArwCounters::add(&counters.host_read_failures, u64::from(sample.failed_slots));
    }

    let report = CombatEventRouter::new(config).route(host, rng, scheduler, hit, state);
    if report.weapon.is_some() || report.effects_granted > 0 {
        ArwCounters::add(&counters.hits_routed, 1);
    }
    if let Some(action) = report.scheduled {
        ArwCounters::add(&counters.deferred_scheduled, 1);
        debug!(action = %action, target = %hit.target, "Strike pending");
    }
    if report.curse_lifted {
        info!(actor = %hit.attacker, "Curse lifted by a qualifying hit");
    }
    Some(report)
}

/// Drop everything cached for an actor that left the world. Idempotent.
///
/// A curse held at departure is remembered in [`ArwRule::pending_uncurse`]
/// so its permanent wither is removed when the actor comes back.
pub fn on_actor_departed(rule: &mut ArwRule, actor: ActorId) -> bool {
    match rule.store.remove(actor) {
        Some(state) => {
            note_departure(&mut rule.pending_uncurse, actor, &state);
            ArwCounters::add(&rule.counters.actors_evicted, 1);
            true
        }
        None => false,
    }
}

/// Dispatch a [`HostEvent`] to the matching entry point.
pub fn process_host_event<H: Host + ?Sized>(rule: &mut ArwRule, host: &mut H, event: HostEvent) {
    match event {
        HostEvent::Tick => {
            on_tick(rule, host);
        }
        HostEvent::Hit(hit) => {
            on_hit(rule, host, &hit);
        }
        HostEvent::Departed(actor) => {
            on_actor_departed(rule, actor);
        }
    }
}
