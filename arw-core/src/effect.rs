//! Status effect model.
//!
//! Passive effects are granted with a short duration and refreshed every
//! tick, so they lapse on their own once the granting item is unequipped.
//! Only effects granted with [`PERMANENT_DURATION_TICKS`] need an explicit
//! removal.

use serde::{Deserialize, Serialize};

/// Duration used for passive effects refreshed every tick.
pub const PASSIVE_REFRESH_TICKS: u32 = 10;

/// Duration treated as "until removed".
pub const PERMANENT_DURATION_TICKS: u32 = 999_999;

/// The status effects ARW grants or inflicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    /// Movement speed.
    Speed,
    /// Movement slowness.
    Slowness,
    /// Higher jumps.
    JumpBoost,
    /// Slow descent.
    SlowFalling,
    /// See in the dark.
    NightVision,
    /// Immune to fire and lava.
    FireResistance,
    /// Reduced incoming damage.
    Resistance,
    /// Regenerates health over time.
    Regeneration,
    /// Raises maximum health.
    HealthBoost,
    /// Heals immediately.
    InstantHealth,
    /// Reduced melee damage.
    Weakness,
    /// Increased melee damage.
    Strength,
    /// Drains hunger.
    Hunger,
    /// Damage over time that can kill.
    Wither,
    /// Damage over time that stops at one health.
    Poison,
    /// Floats upward.
    Levitation,
}

impl EffectKind {
    /// Host effect identifier.
    #[must_use]
    pub fn identifier(self) -> &'static str {
        match self {
            Self::Speed => "minecraft:speed",
            Self::Slowness => "minecraft:slowness",
            Self::JumpBoost => "minecraft:jump_boost",
            Self::SlowFalling => "minecraft:slow_falling",
            Self::NightVision => "minecraft:night_vision",
            Self::FireResistance => "minecraft:fire_resistance",
            Self::Resistance => "minecraft:resistance",
            Self::Regeneration => "minecraft:regeneration",
            Self::HealthBoost => "minecraft:health_boost",
            Self::InstantHealth => "minecraft:instant_health",
            Self::Weakness => "minecraft:weakness",
            Self::Strength => "minecraft:strength",
            Self::Hunger => "minecraft:hunger",
            Self::Wither => "minecraft:wither",
            Self::Poison => "minecraft:poison",
            Self::Levitation => "minecraft:levitation",
        }
    }
}

/// One application of a status effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEffect {
    /// Which effect.
    pub kind: EffectKind,
    /// Duration in ticks.
    pub duration_ticks: u32,
    /// Zero-based amplifier (0 = level I).
    pub amplifier: u8,
    /// Whether the host should render particles.
    pub show_particles: bool,
}

impl StatusEffect {
    /// An effect with visible particles.
    #[must_use]
    pub const fn new(kind: EffectKind, duration_ticks: u32, amplifier: u8) -> Self {
        Self {
            kind,
            duration_ticks,
            amplifier,
            show_particles: true,
        }
    }

    /// A passive effect refreshed every tick.
    #[must_use]
    pub const fn passive(kind: EffectKind, amplifier: u8) -> Self {
        Self::new(kind, PASSIVE_REFRESH_TICKS, amplifier)
    }

    /// An effect that lasts until explicitly removed.
    #[must_use]
    pub const fn permanent(kind: EffectKind, amplifier: u8) -> Self {
        Self::new(kind, PERMANENT_DURATION_TICKS, amplifier)
    }

    /// Whether this application must be removed explicitly.
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        self.duration_ticks >= PERMANENT_DURATION_TICKS
    }
}

/// A compact `(effect, amplifier)` pair used by static effect tables.
pub type EffectSpec = (EffectKind, u8);
