//! Item classification.
//!
//! Item identifiers coming from the host are strings. They are classified
//! once, at sample time, into an [`ItemClass`] through a static lookup table;
//! everything downstream dispatches on the enum.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Identifier of the empty slot as reported by the host.
pub const AIR: &str = "minecraft:air";

/// Namespaced item identifier, e.g. `arw:royal_kris`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ItemId(pub String);

impl ItemId {
    /// Create an item identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The empty slot.
    #[must_use]
    pub fn air() -> Self {
        Self::new(AIR)
    }

    /// Namespaced identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this identifier denotes an empty slot.
    #[must_use]
    pub fn is_empty_slot(&self) -> bool {
        self.0.is_empty() || self.0 == AIR
    }

    /// Classify this identifier.
    #[must_use]
    pub fn classify(&self) -> ItemClass {
        classify(&self.0)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Poleaxe variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PoleaxeKind {
    /// `arw:steel_poleaxe`
    Steel,
    /// `arw:netherite_poleaxe`
    Netherite,
}

/// Katana variants that carry a passive bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KatanaKind {
    /// `arw:diamond_katana`
    Diamond,
    /// `arw:steel_katana`
    Steel,
    /// `arw:iron_katana`
    Iron,
}

/// Necklaces worn in the off hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NecklaceKind {
    /// Biome-reactive, jungle-tuned.
    Jungle,
    /// Fire protection and the magma-walker terrain ability.
    Magma,
    /// Health-gated rescue.
    Immortality,
    /// Biome-reactive, mountain-tuned.
    Breeze,
}

/// Daggers ("dagas").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DagaKind {
    /// `arw:jade_daga`: the off-hand disabling accessory.
    Jade,
    /// `arw:flint_daga`
    Flint,
    /// `arw:iron_daga`
    Iron,
    /// `arw:gold_daga`
    Gold,
    /// `arw:netherite_daga`
    Netherite,
}

/// Vanilla sword materials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SwordMaterial {
    /// Wood.
    Wooden,
    /// Stone.
    Stone,
    /// Iron.
    Iron,
    /// Gold.
    Golden,
    /// Diamond.
    Diamond,
    /// Netherite.
    Netherite,
}

/// Gameplay classification of an item identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemClass {
    /// Nothing in the slot.
    Empty,
    /// Heavy polearm: slows the holder, knocks targets back.
    Poleaxe(PoleaxeKind),
    /// Katana with a passive bundle.
    Katana(KatanaKind),
    /// Shogun katana: on-hit debuffs and delayed lightning.
    ShogunKatana,
    /// The curse weapon.
    SacrificialDagger,
    /// Amethyst spear: weakens and cuts health.
    AmethystSpear,
    /// Royal kris: poison and self-buffs.
    RoyalKris,
    /// Off-hand necklace.
    Necklace(NecklaceKind),
    /// Dagger.
    Daga(DagaKind),
    /// Vanilla sword.
    Sword(SwordMaterial),
    /// Anything else the host reports.
    Unclassified,
}

impl ItemClass {
    /// Whether the slot holds something.
    #[must_use]
    pub fn is_occupied(self) -> bool {
        !matches!(self, Self::Empty)
    }

    /// Main-hand weapons that can be paired with an off-hand jade daga.
    #[must_use]
    pub fn pairs_with_jade_daga(self) -> bool {
        matches!(self, Self::Sword(_) | Self::Daga(_))
    }

    /// The necklace kind, if this is one.
    #[must_use]
    pub fn necklace(self) -> Option<NecklaceKind> {
        match self {
            Self::Necklace(kind) => Some(kind),
            _ => None,
        }
    }
}

static ITEM_TABLE: LazyLock<HashMap<&'static str, ItemClass>> = LazyLock::new(|| {
    use ItemClass as C;
    HashMap::from([
        (AIR, C::Empty),
        ("arw:steel_poleaxe", C::Poleaxe(PoleaxeKind::Steel)),
        ("arw:netherite_poleaxe", C::Poleaxe(PoleaxeKind::Netherite)),
        ("arw:diamond_katana", C::Katana(KatanaKind::Diamond)),
        ("arw:steel_katana", C::Katana(KatanaKind::Steel)),
        ("arw:iron_katana", C::Katana(KatanaKind::Iron)),
        ("arw:shogun_katana", C::ShogunKatana),
        ("arw:sacrificial_dagger", C::SacrificialDagger),
        ("arw:amethyst_spear", C::AmethystSpear),
        ("arw:royal_kris", C::RoyalKris),
        ("arw:necklace_of_jungle", C::Necklace(NecklaceKind::Jungle)),
        ("arw:necklace_of_magma", C::Necklace(NecklaceKind::Magma)),
        ("arw:necklace_of_immortality", C::Necklace(NecklaceKind::Immortality)),
        ("arw:necklace_of_breeze", C::Necklace(NecklaceKind::Breeze)),
        ("arw:jade_daga", C::Daga(DagaKind::Jade)),
        ("arw:flint_daga", C::Daga(DagaKind::Flint)),
        ("arw:iron_daga", C::Daga(DagaKind::Iron)),
        ("arw:gold_daga", C::Daga(DagaKind::Gold)),
        ("arw:netherite_daga", C::Daga(DagaKind::Netherite)),
        ("minecraft:wooden_sword", C::Sword(SwordMaterial::Wooden)),
        ("minecraft:stone_sword", C::Sword(SwordMaterial::Stone)),
        ("minecraft:iron_sword", C::Sword(SwordMaterial::Iron)),
        ("minecraft:golden_sword", C::Sword(SwordMaterial::Golden)),
        ("minecraft:diamond_sword", C::Sword(SwordMaterial::Diamond)),
        ("minecraft:netherite_sword", C::Sword(SwordMaterial::Netherite)),
    ])
});

/// Classify a raw item identifier.
#[must_use]
pub fn classify(id: &str) -> ItemClass {
    if id.is_empty() {
        return ItemClass::Empty;
    }
    ITEM_TABLE.get(id).copied().unwrap_or(ItemClass::Unclassified)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_items() {
        assert_eq!(classify("arw:royal_kris"), ItemClass::RoyalKris);
        assert_eq!(
            classify("arw:netherite_poleaxe"),
            ItemClass::Poleaxe(PoleaxeKind::Netherite)
        );
        assert_eq!(
            classify("arw:necklace_of_breeze"),
            ItemClass::Necklace(NecklaceKind::Breeze)
        );
    }

    #[test]
    fn empty_and_air_are_empty() {
        assert_eq!(classify(""), ItemClass::Empty);
        assert_eq!(classify(AIR), ItemClass::Empty);
        assert!(ItemId::air().is_empty_slot());
        assert!(!ItemClass::Empty.is_occupied());
    }

    #[test]
    fn unknown_items_are_unclassified_but_occupied() {
        let class = classify("minecraft:dirt");
        assert_eq!(class, ItemClass::Unclassified);
        assert!(class.is_occupied());
    }

    #[test]
    fn jade_daga_pairing() {
        assert!(classify("minecraft:iron_sword").pairs_with_jade_daga());
        assert!(classify("arw:flint_daga").pairs_with_jade_daga());
        assert!(!classify("arw:royal_kris").pairs_with_jade_daga());
        assert!(!classify(AIR).pairs_with_jade_daga());
    }
}
