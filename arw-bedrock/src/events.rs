//! Host events ARW reacts to.
//!
//! Only three things reach the rule from outside: a tick, a hit, and an actor
//! leaving the world. Everything else is read from the host on demand.

use serde::{Deserialize, Serialize};

use arw_core::types::{ActorId, ActorKind, DamageCause};

/// One entity hurting another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitEvent {
    /// The entity that dealt the damage.
    pub attacker: ActorId,
    /// Whether the attacker is a player.
    pub attacker_kind: ActorKind,
    /// The entity that was hurt.
    pub target: ActorId,
    /// Damage source reported by the host.
    pub cause: DamageCause,
}

impl HitEvent {
    /// Whether the attacker is player-controlled.
    #[must_use]
    pub fn by_player(&self) -> bool {
        self.attacker_kind == ActorKind::Player
    }
}

/// An event delivered by the host integration.
///
/// Script bridges that forward events as JSON use the adjacently tagged
/// form, e.g. `{"type":"Departed","data":7}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum HostEvent {
    /// One simulation step elapsed.
    Tick,
    /// An entity hurt another.
    Hit(HitEvent),
    /// An actor left the world (disconnect, death, despawn).
    Departed(ActorId),
}
