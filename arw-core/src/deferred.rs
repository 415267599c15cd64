//! Deferred action scheduler.
//!
//! A countdown queue of one-shot actions. Each action stores only the
//! identity of its target; the target is resolved against the live world at
//! fire time and a miss is a normal, silent outcome.
//!
//! Every action leaves the queue exactly once, on the call to
//! [`DeferredActionScheduler::advance`] in which its countdown reaches zero,
//! whatever happens while firing it.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::host::Host;
use crate::types::{ActionId, ActorId, DamageCause, DimensionId, SpawnKind};

/// What a deferred action does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DeferredPayload {
    /// Spawn lightning at the target, then independently roll a smite.
    LightningStrike {
        /// Chance of the additional smite.
        smite_chance: f64,
        /// Magic damage dealt by a smite.
        smite_damage: f32,
    },
}

/// A pending one-shot action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeferredAction {
    /// Unique action ID.
    pub id: ActionId,
    /// Identity of the target, resolved at fire time.
    pub target: ActorId,
    /// Dimension the target is looked up in.
    pub dimension: DimensionId,
    /// `advance` calls left before firing.
    pub ticks_remaining: u32,
    /// What to do.
    pub payload: DeferredPayload,
}

impl DeferredAction {
    /// Create an action firing after `delay_ticks` calls to `advance`.
    #[must_use]
    pub fn new(target: ActorId, dimension: DimensionId, delay_ticks: u32, payload: DeferredPayload) -> Self {
        Self {
            id: ActionId::new(),
            target,
            dimension,
            ticks_remaining: delay_ticks,
            payload,
        }
    }
}

/// How a single action ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireOutcome {
    /// The target resolved and the payload ran.
    Fired {
        /// Whether the primary effect (the spawn) succeeded.
        primary_ok: bool,
        /// Whether the secondary roll hit.
        smote: bool,
    },
    /// The target no longer exists or could not be looked up.
    TargetGone,
}

/// Summary of one `advance` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvanceReport {
    /// Actions whose target resolved.
    pub fired: usize,
    /// Actions dropped because the target was gone.
    pub dropped: usize,
    /// Fired actions whose primary effect failed.
    pub primary_failures: usize,
    /// Fired actions whose secondary roll hit.
    pub smites: usize,
}

/// Owns every pending [`DeferredAction`].
#[derive(Debug, Default)]
pub struct DeferredActionScheduler {
    pending: Vec<DeferredAction>,
}

impl DeferredActionScheduler {
    /// Create an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue an action and return its ID.
    ///
    /// A zero delay behaves like a delay of one: the action fires on the
    /// next `advance`.
    pub fn schedule(&mut self, action: DeferredAction) -> ActionId {
        let id = action.id;
        debug!(
            action = %id,
            target = %action.target,
            ticks = action.ticks_remaining,
            "Deferred action scheduled"
        );
        self.pending.push(action);
        id
    }

    /// Number of pending actions.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Whether an action is still pending.
    #[must_use]
    pub fn is_pending(&self, id: ActionId) -> bool {
        self.pending.iter().any(|a| a.id == id)
    }

    /// Count one tick down and fire everything that reached zero.
    ///
    /// Due actions are taken out of the queue before any of them fires, so a
    /// failure in one never leaves it (or any other) behind.
    pub fn advance<H, R>(&mut self, host: &mut H, rng: &mut R) -> AdvanceReport
    where
        H: Host + ?Sized,
        R: Rng + ?Sized,
    {
        let mut due = Vec::new();
        self.pending.retain_mut(|action| {
            action.ticks_remaining = action.ticks_remaining.saturating_sub(1);
            if action.ticks_remaining == 0 {
                due.push(action.clone());
                false
            } else {
                true
            }
        });

        let mut report = AdvanceReport::default();
        for action in due {
            match Self::fire(host, rng, &action) {
                FireOutcome::Fired { primary_ok, smote } => {
                    report.fired += 1;
                    if !primary_ok {
                        report.primary_failures += 1;
                    }
                    if smote {
                        report.smites += 1;
                    }
                }
                FireOutcome::TargetGone => report.dropped += 1,
            }
        }
        report
    }

    fn fire<H, R>(host: &mut H, rng: &mut R, action: &DeferredAction) -> FireOutcome
    where
        H: Host + ?Sized,
        R: Rng + ?Sized,
    {
        let location = match host.find_entity(&action.dimension, action.target) {
            Ok(Some(location)) => location,
            Ok(None) => {
                trace!(action = %action.id, target = %action.target, "Target gone, action dropped");
                return FireOutcome::TargetGone;
            }
            Err(e) => {
                debug!(action = %action.id, error = %e, "Target lookup failed, action dropped");
                return FireOutcome::TargetGone;
            }
        };

        match action.payload {
            DeferredPayload::LightningStrike {
                smite_chance,
                smite_damage,
            } => {
                let primary_ok = match host.spawn(&action.dimension, SpawnKind::LightningBolt, location) {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(action = %action.id, error = %e, "Lightning spawn failed");
                        false
                    }
                };

                let smote = rng.gen_bool(smite_chance.clamp(0.0, 1.0));
                if smote {
                    if let Err(e) = host.apply_damage(action.target, smite_damage, DamageCause::Magic) {
                        warn!(action = %action.id, error = %e, "Smite damage failed");
                    }
                }
                debug!(action = %action.id, at = %location, primary_ok, smote, "Deferred strike fired");
                FireOutcome::Fired { primary_ok, smote }
            }
        }
    }
}
