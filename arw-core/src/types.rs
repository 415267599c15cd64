//! Core type definitions shared by every ARW component.
//!
//! Identities are plain values resolved against the host on demand; nothing
//! here holds a live handle into the simulation.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Identity Types
// ---------------------------------------------------------------------------

/// Host-assigned identity of an actor (player or mob).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActorId(pub u64);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether an actor is player-controlled or AI-controlled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorKind {
    /// A connected player.
    Player,
    /// Any AI-controlled entity.
    Mob,
}

/// Named dimension of the world, e.g. `minecraft:overworld`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DimensionId(pub String);

impl DimensionId {
    /// Create a dimension identity from its namespaced name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The overworld.
    #[must_use]
    pub fn overworld() -> Self {
        Self::new("minecraft:overworld")
    }

    /// The nether.
    #[must_use]
    pub fn nether() -> Self {
        Self::new("minecraft:nether")
    }

    /// Namespaced name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DimensionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier of a scheduled deferred action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionId(pub Uuid);

impl ActionId {
    /// Create a new random action ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ActionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Spatial
// ---------------------------------------------------------------------------

/// A continuous position in the world.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate (vertical).
    pub y: f64,
    /// Z coordinate.
    pub z: f64,
}

impl Location {
    /// Create a location.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// The block containing this location.
    #[must_use]
    pub fn block(&self) -> BlockPos {
        BlockPos::new(
            self.x.floor() as i32,
            self.y.floor() as i32,
            self.z.floor() as i32,
        )
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1}, {:.1})", self.x, self.y, self.z)
    }
}

/// Integer block coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BlockPos {
    /// X coordinate.
    pub x: i32,
    /// Y coordinate (vertical).
    pub y: i32,
    /// Z coordinate.
    pub z: i32,
}

impl BlockPos {
    /// Create a block position.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The block `dy` layers above (negative for below).
    #[must_use]
    pub const fn offset_y(self, dy: i32) -> Self {
        Self::new(self.x, self.y + dy, self.z)
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.x, self.y, self.z)
    }
}

/// A direction vector, e.g. an actor's view direction.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Direction {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
}

impl Direction {
    /// Create a direction vector.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

// ---------------------------------------------------------------------------
// World content
// ---------------------------------------------------------------------------

/// Namespaced block type identifier, e.g. `minecraft:lava`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockType(pub String);

impl BlockType {
    /// Create a block type from its namespaced name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Namespaced name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Transient entities the core asks the host to spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpawnKind {
    /// A lightning bolt (visual plus area damage handled by the host).
    LightningBolt,
}

impl SpawnKind {
    /// Host entity identifier.
    #[must_use]
    pub fn identifier(self) -> &'static str {
        match self {
            Self::LightningBolt => "minecraft:lightning_bolt",
        }
    }
}

/// Damage source descriptor passed to generic damage calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageCause {
    /// Melee attack by another entity.
    EntityAttack,
    /// Magic damage (bypasses armour in most hosts).
    Magic,
    /// Lightning strike.
    Lightning,
    /// Anything the core does not distinguish.
    Other,
}

/// Equipment slot of an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slot {
    /// Main hand.
    MainHand,
    /// Off hand.
    OffHand,
    /// Helmet slot.
    Head,
    /// Chestplate slot.
    Chest,
    /// Leggings slot.
    Legs,
    /// Boots slot.
    Feet,
}
