//! Configuration for ARW relics.
//!
//! Maps directly to `arw.toml`. Every field has a default, so an empty file
//! (or no file at all) yields the tuning the add-on ships with.

use serde::{Deserialize, Serialize};

use crate::error::{ArwError, Result};
use crate::types::BlockType;

/// Top-level ARW configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArwConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Curse weapon timer.
    #[serde(default)]
    pub curse: CurseConfig,
    /// Biome classification debounce.
    #[serde(default)]
    pub biome: BiomeConfig,
    /// Passive effect tuning.
    #[serde(default)]
    pub effects: EffectsConfig,
    /// Magma-walker terrain ability.
    #[serde(default)]
    pub magma_walker: MagmaWalkerConfig,
    /// On-hit weapon and accessory tuning.
    #[serde(default)]
    pub combat: CombatConfig,
    /// Tick budget monitoring.
    #[serde(default)]
    pub performance: PerformanceConfig,
}

impl ArwConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `ArwError::Config` if the TOML is invalid or fails validation.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str).map_err(|e| ArwError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Check ranges the runtime relies on.
    ///
    /// # Errors
    /// Returns `ArwError::Config` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.curse.min_threshold_ticks >= self.curse.max_threshold_ticks {
            return Err(ArwError::Config(format!(
                "curse.min_threshold_ticks ({}) must be below curse.max_threshold_ticks ({})",
                self.curse.min_threshold_ticks, self.curse.max_threshold_ticks
            )));
        }
        if self.biome.check_interval_ticks == 0 {
            return Err(ArwError::Config(
                "biome.check_interval_ticks must be positive".to_string(),
            ));
        }
        if self.magma_walker.revert_after_ms == 0 {
            return Err(ArwError::Config(
                "magma_walker.revert_after_ms must be positive".to_string(),
            ));
        }
        for (name, p) in self.combat.probabilities() {
            if !(0.0..=1.0).contains(&p) {
                return Err(ArwError::Config(format!(
                    "{name} must be within [0, 1], got {p}"
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General system settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Whether ARW processes ticks and hits at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Emit JSON log lines instead of human-readable ones.
    #[serde(default)]
    pub json_logs: bool,
    /// Fixed RNG seed; `None` seeds from entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_level: "info".to_string(),
            json_logs: false,
            seed: None,
        }
    }
}

/// Curse weapon timer range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurseConfig {
    /// Lower bound (inclusive) of the rolled threshold.
    #[serde(default = "default_curse_min")]
    pub min_threshold_ticks: u32,
    /// Upper bound (exclusive) of the rolled threshold.
    #[serde(default = "default_curse_max")]
    pub max_threshold_ticks: u32,
}

impl Default for CurseConfig {
    fn default() -> Self {
        Self {
            min_threshold_ticks: default_curse_min(),
            max_threshold_ticks: default_curse_max(),
        }
    }
}

/// Biome classification debounce.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BiomeConfig {
    /// Minimum ticks between two biome queries for the same actor.
    #[serde(default = "default_biome_interval")]
    pub check_interval_ticks: u64,
}

impl Default for BiomeConfig {
    fn default() -> Self {
        Self {
            check_interval_ticks: default_biome_interval(),
        }
    }
}

/// Passive effect tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectsConfig {
    /// Health at or below which the immortality necklace rescues.
    #[serde(default = "default_low_health")]
    pub low_health_threshold: f32,
    /// Regeneration duration granted by the magma necklace while burning.
    #[serde(default = "default_magma_regen")]
    pub magma_regen_ticks: u32,
    /// Resistance duration granted by an immortality rescue.
    #[serde(default = "default_100_u32")]
    pub rescue_resistance_ticks: u32,
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            low_health_threshold: default_low_health(),
            magma_regen_ticks: default_magma_regen(),
            rescue_resistance_ticks: 100,
        }
    }
}

/// Magma-walker terrain ability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MagmaWalkerConfig {
    /// Ticks skipped between two scans.
    #[serde(default = "default_magma_cooldown")]
    pub cooldown_ticks: u32,
    /// Half-width of the square footprint scanned under the actor.
    #[serde(default = "default_magma_radius")]
    pub radius: i32,
    /// Block converted.
    #[serde(default = "default_hazard_block")]
    pub hazard_block: String,
    /// Block it is converted into.
    #[serde(default = "default_safe_block")]
    pub safe_block: String,
    /// Real-time delay before a converted block reverts.
    #[serde(default = "default_revert_ms")]
    pub revert_after_ms: u64,
}

impl MagmaWalkerConfig {
    /// The hazardous block type.
    #[must_use]
    pub fn hazard(&self) -> BlockType {
        BlockType::new(self.hazard_block.clone())
    }

    /// The safe block type.
    #[must_use]
    pub fn safe(&self) -> BlockType {
        BlockType::new(self.safe_block.clone())
    }

    /// Reversion delay as a `chrono` duration.
    #[must_use]
    pub fn revert_after(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(i64::try_from(self.revert_after_ms).unwrap_or(i64::MAX))
    }
}

impl Default for MagmaWalkerConfig {
    fn default() -> Self {
        Self {
            cooldown_ticks: default_magma_cooldown(),
            radius: default_magma_radius(),
            hazard_block: default_hazard_block(),
            safe_block: default_safe_block(),
            revert_after_ms: default_revert_ms(),
        }
    }
}

/// Horizontal and vertical knockback magnitudes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Knockback {
    /// Horizontal strength along the attacker's view direction.
    pub horizontal: f64,
    /// Vertical lift.
    pub vertical: f64,
}

/// On-hit tuning per weapon and accessory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatConfig {
    /// Only route hits whose attacker is a player.
    #[serde(default = "default_true")]
    pub players_only: bool,
    /// Amethyst spear.
    #[serde(default)]
    pub amethyst_spear: AmethystSpearConfig,
    /// Royal kris.
    #[serde(default)]
    pub royal_kris: RoyalKrisConfig,
    /// Shogun katana.
    #[serde(default)]
    pub shogun_katana: ShogunKatanaConfig,
    /// Poleaxe knockback.
    #[serde(default = "default_poleaxe_knockback")]
    pub poleaxe_knockback: Knockback,
    /// Extra damage dealt by a sacrificial dagger hit.
    #[serde(default = "default_dagger_damage")]
    pub sacrificial_dagger_damage: f32,
    /// Jade daga off-hand.
    #[serde(default)]
    pub jade_daga: JadeDagaConfig,
    /// Chance a breeze necklace hit levitates the target.
    #[serde(default = "default_breeze_launch")]
    pub breeze_launch_chance: f64,
    /// Levitation duration of a breeze launch.
    #[serde(default = "default_breeze_levitation")]
    pub breeze_levitation_ticks: u32,
    /// Poison duration of a jungle necklace hit inside a jungle biome.
    #[serde(default = "default_100_u32")]
    pub jungle_venom_ticks: u32,
    /// Poison duration of a jungle necklace hit elsewhere.
    #[serde(default = "default_jungle_venom_outside")]
    pub jungle_venom_outside_ticks: u32,
}

impl CombatConfig {
    /// Every probability in the table, named after its TOML path.
    #[must_use]
    pub fn probabilities(&self) -> Vec<(&'static str, f64)> {
        vec![
            (
                "combat.amethyst_spear.health_reduction_chance",
                self.amethyst_spear.health_reduction_chance,
            ),
            ("combat.royal_kris.weakness_chance", self.royal_kris.weakness_chance),
            (
                "combat.royal_kris.strength_chance_empty_offhand",
                self.royal_kris.strength_chance_empty_offhand,
            ),
            (
                "combat.royal_kris.strength_chance_occupied_offhand",
                self.royal_kris.strength_chance_occupied_offhand,
            ),
            ("combat.shogun_katana.debuff_chance", self.shogun_katana.debuff_chance),
            ("combat.shogun_katana.lightning_chance", self.shogun_katana.lightning_chance),
            ("combat.shogun_katana.smite_chance", self.shogun_katana.smite_chance),
            ("combat.jade_daga.disable_chance", self.jade_daga.disable_chance),
            ("combat.breeze_launch_chance", self.breeze_launch_chance),
        ]
    }
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            players_only: true,
            amethyst_spear: AmethystSpearConfig::default(),
            royal_kris: RoyalKrisConfig::default(),
            shogun_katana: ShogunKatanaConfig::default(),
            poleaxe_knockback: default_poleaxe_knockback(),
            sacrificial_dagger_damage: default_dagger_damage(),
            jade_daga: JadeDagaConfig::default(),
            breeze_launch_chance: default_breeze_launch(),
            breeze_levitation_ticks: default_breeze_levitation(),
            jungle_venom_ticks: 100,
            jungle_venom_outside_ticks: default_jungle_venom_outside(),
        }
    }
}

/// Amethyst spear tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AmethystSpearConfig {
    /// Weakness duration inflicted on every hit.
    pub weakness_ticks: u32,
    /// Chance to cut health directly.
    pub health_reduction_chance: f64,
    /// Health removed by a direct cut.
    pub health_reduction_amount: f32,
}

impl Default for AmethystSpearConfig {
    fn default() -> Self {
        Self {
            weakness_ticks: 100,
            health_reduction_chance: 0.4,
            health_reduction_amount: 6.0,
        }
    }
}

/// Royal kris tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoyalKrisConfig {
    /// Speed granted to the attacker.
    pub speed_ticks: u32,
    /// Chance to weaken the target.
    pub weakness_chance: f64,
    /// Weakness duration.
    pub weakness_ticks: u32,
    /// Poison duration inflicted on every hit.
    pub poison_ticks: u32,
    /// Strength chance with an empty off hand.
    pub strength_chance_empty_offhand: f64,
    /// Strength chance with an occupied off hand.
    pub strength_chance_occupied_offhand: f64,
    /// Strength duration.
    pub strength_ticks: u32,
}

impl Default for RoyalKrisConfig {
    fn default() -> Self {
        Self {
            speed_ticks: 100,
            weakness_chance: 0.6,
            weakness_ticks: 80,
            poison_ticks: 160,
            strength_chance_empty_offhand: 0.7,
            strength_chance_occupied_offhand: 0.3,
            strength_ticks: 100,
        }
    }
}

/// Shogun katana tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShogunKatanaConfig {
    /// Chance of slowness + weakness on the target.
    pub debuff_chance: f64,
    /// Duration of those debuffs.
    pub debuff_ticks: u32,
    /// Chance to schedule a delayed lightning strike.
    pub lightning_chance: f64,
    /// Delay of the strike.
    pub lightning_delay_ticks: u32,
    /// Chance the strike also smites for `smite_damage`.
    pub smite_chance: f64,
    /// Damage of a smite.
    pub smite_damage: f32,
    /// Knockback on every hit.
    pub knockback: Knockback,
}

impl Default for ShogunKatanaConfig {
    fn default() -> Self {
        Self {
            debuff_chance: 0.8,
            debuff_ticks: 100,
            lightning_chance: 0.15,
            lightning_delay_ticks: 100,
            smite_chance: 0.10,
            smite_damage: 1000.0,
            knockback: Knockback {
                horizontal: 1.125,
                vertical: 0.5,
            },
        }
    }
}

/// Jade daga off-hand tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JadeDagaConfig {
    /// Chance to disable the target.
    pub disable_chance: f64,
    /// Duration of the disable.
    pub disable_ticks: u32,
    /// Durability lost by the daga when it triggers.
    pub durability_cost: u32,
}

impl Default for JadeDagaConfig {
    fn default() -> Self {
        Self {
            disable_chance: 0.10,
            disable_ticks: 60,
            durability_cost: 5,
        }
    }
}

/// Tick budget monitoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceConfig {
    /// Milliseconds the tick pass may take before it is reported over budget.
    #[serde(default = "default_tick_budget")]
    pub tick_budget_ms: f64,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            tick_budget_ms: default_tick_budget(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions for serde
// ---------------------------------------------------------------------------

fn default_true() -> bool {
    true
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_curse_min() -> u32 {
    600
}
fn default_curse_max() -> u32 {
    1000
}
fn default_biome_interval() -> u64 {
    100
}
fn default_low_health() -> f32 {
    3.0
}
fn default_magma_regen() -> u32 {
    10
}
fn default_100_u32() -> u32 {
    100
}
fn default_magma_cooldown() -> u32 {
    2
}
fn default_magma_radius() -> i32 {
    2
}
fn default_hazard_block() -> String {
    "minecraft:lava".to_string()
}
fn default_safe_block() -> String {
    "minecraft:basalt".to_string()
}
fn default_revert_ms() -> u64 {
    10_000
}
fn default_poleaxe_knockback() -> Knockback {
    Knockback {
        horizontal: 1.5,
        vertical: 0.5,
    }
}
fn default_dagger_damage() -> f32 {
    4.0
}
fn default_breeze_launch() -> f64 {
    0.3
}
fn default_breeze_levitation() -> u32 {
    40
}
fn default_jungle_venom_outside() -> u32 {
    50
}
fn default_tick_budget() -> f64 {
    2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config = ArwConfig::from_toml("").unwrap();
        assert!(config.general.enabled);
        assert_eq!(config.curse.min_threshold_ticks, 600);
        assert_eq!(config.curse.max_threshold_ticks, 1000);
        assert_eq!(config.biome.check_interval_ticks, 100);
        assert_eq!(config.magma_walker.revert_after_ms, 10_000);
        assert!((config.combat.amethyst_spear.health_reduction_chance - 0.4).abs() < f64::EPSILON);
        assert!((config.combat.shogun_katana.lightning_chance - 0.15).abs() < f64::EPSILON);
    }

    #[test]
    fn partial_override() {
        let config = ArwConfig::from_toml(
            r#"
            [general]
            seed = 7

            [curse]
            min_threshold_ticks = 10
            max_threshold_ticks = 20

            [combat]
            breeze_launch_chance = 1.0
            "#,
        )
        .unwrap();
        assert_eq!(config.general.seed, Some(7));
        assert_eq!(config.curse.min_threshold_ticks, 10);
        assert!((config.combat.breeze_launch_chance - 1.0).abs() < f64::EPSILON);
        // untouched sections keep defaults
        assert_eq!(config.magma_walker.radius, 2);
    }

    #[test]
    fn rejects_out_of_range_probability() {
        let err = ArwConfig::from_toml(
            r#"
            [combat]
            breeze_launch_chance = 1.5
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("breeze_launch_chance"));
    }

    #[test]
    fn rejects_empty_curse_range() {
        let mut config = ArwConfig::default();
        config.curse.min_threshold_ticks = 1000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_invalid_toml() {
        assert!(ArwConfig::from_toml("[general\nenabled = ").is_err());
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arw.toml");
        std::fs::write(&path, "[biome]\ncheck_interval_ticks = 40\n").unwrap();
        let config = ArwConfig::from_file(&path).unwrap();
        assert_eq!(config.biome.check_interval_ticks, 40);
    }

    #[test]
    fn magma_walker_blocks() {
        let config = MagmaWalkerConfig::default();
        assert_eq!(config.hazard().as_str(), "minecraft:lava");
        assert_eq!(config.safe().as_str(), "minecraft:basalt");
        assert_eq!(config.revert_after(), chrono::Duration::seconds(10));
    }
}
