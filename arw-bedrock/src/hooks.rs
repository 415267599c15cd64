//! Integration hooks for the Bedrock script events.
//!
//! These turn the raw payloads of `system` tick, `entityHurt` and
//! `playerLeave` notifications into [`HostEvent`]s. A binding calls the hook
//! from its event callback and hands the result to the rule.

use arw_core::types::{ActorId, ActorKind, DamageCause};

use crate::events::{HitEvent, HostEvent};

/// Map a Bedrock damage cause identifier to a [`DamageCause`].
#[must_use]
pub fn damage_cause(id: &str) -> DamageCause {
    match id {
        "entityAttack" | "entity_attack" => DamageCause::EntityAttack,
        "magic" => DamageCause::Magic,
        "lightning" => DamageCause::Lightning,
        _ => DamageCause::Other,
    }
}

/// Create a hit event from an `entityHurt` notification.
///
/// Returns `None` when the damage had no damaging entity, such as fall or
/// fire damage.
#[must_use]
pub fn on_entity_hurt(
    damaging_entity: Option<(ActorId, ActorKind)>,
    hurt_entity: ActorId,
    cause_id: &str,
) -> Option<HostEvent> {
    let (attacker, attacker_kind) = damaging_entity?;
    Some(HostEvent::Hit(HitEvent {
        attacker,
        attacker_kind,
        target: hurt_entity,
        cause: damage_cause(cause_id),
    }))
}

/// Create a departure event from a `playerLeave` or entity removal notification.
#[must_use]
pub fn on_actor_left(actor: ActorId) -> HostEvent {
    HostEvent::Departed(actor)
}

/// Create a tick event.
#[must_use]
pub fn on_tick() -> HostEvent {
    HostEvent::Tick
}
