//! Data-driven game balance
//!
//! Weapon configs, the monster roster, spawn/drop tables and cosmetic asset
//! handles. Loaded from JSON; anything missing falls back to the built-in
//! defaults so a partial or broken file never blocks a run.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::sim::entity::{MonsterKind, ProjectileType};
use crate::sim::weapon::WeaponId;

/// Immutable per-weapon configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponConfig {
    pub name: String,
    pub projectile_type: ProjectileType,
    pub base_damage: f32,
    /// Seconds between volleys at level 1
    pub cooldown: f32,
    /// Distinct monsters a shot may damage (`None` = unlimited)
    pub penetration: Option<u32>,
    /// Projectile lifetime in seconds
    pub lifetime: f32,
    pub projectile_count: u32,
    pub speed: f32,
    pub size: f32,
    pub color: String,
    pub description: String,
    /// Whether cooldown shrinks with weapon level
    pub scales_cadence: bool,
}

impl Default for WeaponConfig {
    fn default() -> Self {
        Self {
            name: "Weapon".to_string(),
            projectile_type: ProjectileType::Linear,
            base_damage: 10.0,
            cooldown: 1.0,
            penetration: Some(1),
            lifetime: 2.0,
            projectile_count: 1,
            speed: 400.0,
            size: 10.0,
            color: "#00d2ff".to_string(),
            description: String::new(),
            scales_cadence: false,
        }
    }
}

impl WeaponConfig {
    /// Built-in config for a weapon
    pub fn baseline(id: WeaponId) -> Self {
        match id {
            WeaponId::Dagger => Self {
                name: "Dagger".to_string(),
                projectile_type: ProjectileType::Linear,
                base_damage: 10.0,
                cooldown: 0.8,
                penetration: Some(1),
                lifetime: 2.0,
                projectile_count: 1,
                speed: 500.0,
                size: 10.0,
                color: "#ffffff".to_string(),
                description: "Fires a fast dagger at the nearest enemy.".to_string(),
                scales_cadence: false,
            },
            WeaponId::Flamethrower => Self {
                name: "Flamethrower".to_string(),
                projectile_type: ProjectileType::Flame,
                base_damage: 5.0,
                cooldown: 0.1,
                penetration: None,
                lifetime: 0.5,
                projectile_count: 3,
                speed: 200.0,
                size: 20.0,
                color: "#ff4500".to_string(),
                description: "Releases a stream of fire in front of you.".to_string(),
                scales_cadence: false,
            },
            WeaponId::Bible => Self {
                name: "Rotating Bible".to_string(),
                projectile_type: ProjectileType::Orbital,
                base_damage: 15.0,
                cooldown: 3.0,
                penetration: None,
                lifetime: 5.0,
                projectile_count: 2,
                speed: 0.0,
                size: 15.0,
                color: "#ffd700".to_string(),
                description: "Orbits around the player, damaging enemies.".to_string(),
                scales_cadence: false,
            },
            WeaponId::Pidgeon => Self {
                name: "Pidgeon".to_string(),
                projectile_type: ProjectileType::Area,
                base_damage: 30.0,
                cooldown: 2.0,
                penetration: None,
                lifetime: 0.3,
                projectile_count: 1,
                speed: 0.0,
                size: 40.0,
                color: "#ffffff".to_string(),
                description: "Circles the player and scatters shots at enemies.".to_string(),
                scales_cadence: true,
            },
        }
    }
}

/// Base stats for a monster kind, before level scaling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonsterStats {
    pub name: String,
    pub hp: f32,
    pub speed: f32,
    pub damage: f32,
    pub size: f32,
    pub color: String,
}

impl Default for MonsterStats {
    fn default() -> Self {
        Self::baseline(MonsterKind::Generic)
    }
}

impl MonsterStats {
    fn new(name: &str, hp: f32, speed: f32, damage: f32, size: f32, color: &str) -> Self {
        Self {
            name: name.to_string(),
            hp,
            speed,
            damage,
            size,
            color: color.to_string(),
        }
    }

    /// Built-in stats for a monster kind
    pub fn baseline(kind: MonsterKind) -> Self {
        match kind {
            MonsterKind::Bat => Self::new("Bat", 10.0, 150.0, 1.0, 20.0, "#5d3fd3"),
            MonsterKind::Zombie => Self::new("Zombie", 20.0, 150.0, 2.0, 30.0, "#2ecc71"),
            MonsterKind::Dracula => Self::new("Dracula", 30.0, 110.0, 4.0, 35.0, "#c0392b"),
            MonsterKind::Werewolf => Self::new("Werewolf", 40.0, 110.0, 6.0, 40.0, "#7f8c8d"),
            MonsterKind::Mantis => Self::new("Mantis (Boss)", 200.0, 100.0, 10.0, 60.0, "#f1c40f"),
            MonsterKind::Golem => Self::new("Golem (Boss)", 1000.0, 90.0, 20.0, 80.0, "#34495e"),
            MonsterKind::Generic => Self::new("Monster", 10.0, 100.0, 1.0, 30.0, "#8e44ad"),
        }
    }
}

/// One row of the spawn table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnWeight {
    /// Monster kind name; unknown names spawn the generic monster
    pub kind: String,
    pub weight: u32,
}

impl SpawnWeight {
    fn new(kind: &str, weight: u32) -> Self {
        Self {
            kind: kind.to_string(),
            weight,
        }
    }
}

/// What a monster leaves behind on death
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DropTable {
    pub xp_gem_weight: u32,
    pub gold_weight: u32,
    pub health_weight: u32,
    pub xp_value: u32,
    pub gold_value: u32,
    pub heal_amount: f32,
}

impl Default for DropTable {
    fn default() -> Self {
        Self {
            xp_gem_weight: 90,
            gold_weight: 8,
            health_weight: 2,
            xp_value: 25,
            gold_value: 1,
            heal_amount: 20.0,
        }
    }
}

/// Pickup magnet behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickupTuning {
    pub acceleration: f32,
    pub max_speed: f32,
    /// Collection distance, independent of the player's magnet range
    pub radius: f32,
}

impl Default for PickupTuning {
    fn default() -> Self {
        Self {
            acceleration: PICKUP_ACCELERATION,
            max_speed: PICKUP_MAX_SPEED,
            radius: PICKUP_RADIUS,
        }
    }
}

/// Complete balance data for a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub spawn_interval: f32,
    pub spawn_distance_factor: f32,
    pub starting_weapon: String,
    pub weapons: BTreeMap<String, WeaponConfig>,
    pub monsters: BTreeMap<String, MonsterStats>,
    pub spawn_table: Vec<SpawnWeight>,
    pub drops: DropTable,
    pub pickup: PickupTuning,
    /// Cosmetic asset handles keyed by entity kind name ("player", "bat", "dagger", ...)
    pub assets: BTreeMap<String, String>,
}

impl Default for Tuning {
    fn default() -> Self {
        let weapons = WeaponId::ALL
            .iter()
            .map(|&id| (id.name().to_string(), WeaponConfig::baseline(id)))
            .collect();
        let monsters = MonsterKind::ROSTER
            .iter()
            .map(|&kind| (kind.name().to_string(), MonsterStats::baseline(kind)))
            .collect();

        Self {
            spawn_interval: SPAWN_INTERVAL,
            spawn_distance_factor: SPAWN_DISTANCE_FACTOR,
            starting_weapon: WeaponId::Dagger.name().to_string(),
            weapons,
            monsters,
            spawn_table: vec![
                SpawnWeight::new("bat", 40),
                SpawnWeight::new("zombie", 25),
                SpawnWeight::new("dracula", 15),
                SpawnWeight::new("werewolf", 12),
                SpawnWeight::new("mantis", 6),
                SpawnWeight::new("golem", 2),
            ],
            drops: DropTable::default(),
            pickup: PickupTuning::default(),
            assets: BTreeMap::new(),
        }
    }
}

impl Tuning {
    /// Parse tuning from JSON and clamp out-of-range values
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut tuning: Tuning = serde_json::from_str(json)?;
        tuning.sanitize();
        Ok(tuning)
    }

    /// Load tuning from a JSON file, falling back to defaults on any failure
    pub fn load_or_default(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(tuning) => {
                    log::info!("Loaded tuning from {}", path.display());
                    return tuning;
                }
                Err(e) => log::warn!("Invalid tuning file {}: {}", path.display(), e),
            },
            Err(e) => log::warn!("Could not read tuning file {}: {}", path.display(), e),
        }

        log::info!("Using default tuning");
        Self::default()
    }

    /// Config for a weapon, or its built-in baseline when the table lacks it
    pub fn weapon_config(&self, id: WeaponId) -> WeaponConfig {
        self.weapons
            .get(id.name())
            .cloned()
            .unwrap_or_else(|| WeaponConfig::baseline(id))
    }

    /// Base stats for a monster kind, or its built-in baseline
    pub fn monster_stats(&self, kind: MonsterKind) -> MonsterStats {
        self.monsters
            .get(kind.name())
            .cloned()
            .unwrap_or_else(|| MonsterStats::baseline(kind))
    }

    /// Starting weapon; unknown names fall back to the dagger
    pub fn starting_weapon_id(&self) -> WeaponId {
        WeaponId::from_name(&self.starting_weapon).unwrap_or(WeaponId::Dagger)
    }

    /// Asset handle for an entity kind. Empty handles count as missing.
    pub fn asset(&self, key: &str) -> Option<&str> {
        self.assets
            .get(key)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    /// Clamp values that would make the simulation misbehave
    pub fn sanitize(&mut self) {
        if !(self.spawn_interval.is_finite() && self.spawn_interval > 0.0) {
            log::warn!("spawn_interval {} out of range, using default", self.spawn_interval);
            self.spawn_interval = SPAWN_INTERVAL;
        }
        if !(self.spawn_distance_factor.is_finite() && self.spawn_distance_factor > 0.0) {
            self.spawn_distance_factor = SPAWN_DISTANCE_FACTOR;
        }

        // Re-key by canonical name so aliases ("pigeon") resolve
        self.weapons = std::mem::take(&mut self.weapons)
            .into_iter()
            .filter_map(|(name, config)| match WeaponId::from_name(&name) {
                Some(id) => Some((id.name().to_string(), config)),
                None => {
                    log::warn!("Ignoring unknown weapon '{}' in tuning", name);
                    None
                }
            })
            .collect();
        for config in self.weapons.values_mut() {
            config.cooldown = finite_or(config.cooldown, 1.0).max(0.01);
            config.base_damage = finite_or(config.base_damage, 0.0).max(0.0);
            config.lifetime = finite_or(config.lifetime, 1.0).max(0.0);
            config.size = finite_or(config.size, 10.0).max(1.0);
            config.speed = finite_or(config.speed, 0.0);
        }

        for (name, stats) in self.monsters.iter_mut() {
            if MonsterKind::from_name(name).is_none() {
                log::warn!("Monster '{}' has no kind; it will never be spawned by name", name);
            }
            stats.hp = finite_or(stats.hp, 10.0).max(1.0);
            stats.speed = finite_or(stats.speed, 100.0).max(0.0);
            stats.damage = finite_or(stats.damage, 1.0).max(0.0);
            stats.size = finite_or(stats.size, 30.0).max(1.0);
        }

        self.pickup.acceleration = finite_or(self.pickup.acceleration, PICKUP_ACCELERATION).max(0.0);
        self.pickup.max_speed = finite_or(self.pickup.max_speed, PICKUP_MAX_SPEED).max(0.0);
        self.pickup.radius = finite_or(self.pickup.radius, PICKUP_RADIUS).max(0.0);
        self.drops.heal_amount = finite_or(self.drops.heal_amount, 0.0).max(0.0);
    }
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() { value } else { fallback }
}
