//! Entity kinds: player, monsters, projectiles and pickups
//!
//! Entities are plain data with small self-contained behaviours. Anything
//! that involves two entity kinds at once lives in `collision` or `tick`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::weapon::WeaponId;
use crate::consts::*;
use crate::tuning::{MonsterStats, PickupTuning};
use crate::{direction_to, normalize_angle, polar_to_cartesian};

/// Stable identity of an entity within one session
pub type EntityId = u32;

/// Common surface for anything stored in an `EntityStore`
pub trait Entity {
    fn id(&self) -> EntityId;
    /// False once the entity is dead, expired or collected
    fn is_alive(&self) -> bool;
}

/// Player stats, modified by passive upgrades
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub speed: f32,
    /// 10 = 100% weapon damage
    pub attack_power: f32,
    /// Magnet range for pickups
    pub collection_range: f32,
    pub max_hp: f32,
    pub current_hp: f32,
}

impl Default for PlayerStats {
    fn default() -> Self {
        Self {
            speed: PLAYER_SPEED,
            attack_power: PLAYER_ATTACK_POWER,
            collection_range: PLAYER_COLLECTION_RANGE,
            max_hp: PLAYER_MAX_HP,
            current_hp: PLAYER_MAX_HP,
        }
    }
}

/// The player character
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub stats: PlayerStats,
    pub size: f32,
}

impl Player {
    pub fn new(pos: Vec2) -> Self {
        Self {
            pos,
            stats: PlayerStats::default(),
            size: PLAYER_SIZE,
        }
    }

    /// Move along an input axis vector. Diagonals are normalized so every
    /// direction moves at the same speed.
    pub fn apply_input(&mut self, axis: Vec2, dt: f32) {
        let dir = axis.normalize_or_zero();
        self.pos += dir * self.stats.speed * dt;
    }

    /// Apply damage, returning the amount actually taken
    pub fn take_damage(&mut self, amount: f32) -> f32 {
        let amount = amount.max(0.0);
        let before = self.stats.current_hp;
        self.stats.current_hp = (before - amount).max(0.0);
        before - self.stats.current_hp
    }

    /// Restore HP up to the maximum, returning the amount healed
    pub fn heal(&mut self, amount: f32) -> f32 {
        let before = self.stats.current_hp;
        self.stats.current_hp = (before + amount.max(0.0)).min(self.stats.max_hp);
        self.stats.current_hp - before
    }

    pub fn is_dead(&self) -> bool {
        self.stats.current_hp <= 0.0
    }
}

/// Monster creature types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonsterKind {
    Bat,
    Zombie,
    Dracula,
    Werewolf,
    Mantis,
    Golem,
    /// Fallback for names outside the roster
    Generic,
}

impl MonsterKind {
    /// Kinds with their own stat block
    pub const ROSTER: [MonsterKind; 6] = [
        MonsterKind::Bat,
        MonsterKind::Zombie,
        MonsterKind::Dracula,
        MonsterKind::Werewolf,
        MonsterKind::Mantis,
        MonsterKind::Golem,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MonsterKind::Bat => "bat",
            MonsterKind::Zombie => "zombie",
            MonsterKind::Dracula => "dracula",
            MonsterKind::Werewolf => "werewolf",
            MonsterKind::Mantis => "mantis",
            MonsterKind::Golem => "golem",
            MonsterKind::Generic => "generic",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "bat" => Some(MonsterKind::Bat),
            "zombie" => Some(MonsterKind::Zombie),
            "dracula" => Some(MonsterKind::Dracula),
            "werewolf" => Some(MonsterKind::Werewolf),
            "mantis" => Some(MonsterKind::Mantis),
            "golem" => Some(MonsterKind::Golem),
            "generic" => Some(MonsterKind::Generic),
            _ => None,
        }
    }

    pub fn is_boss(&self) -> bool {
        matches!(self, MonsterKind::Mantis | MonsterKind::Golem)
    }
}

/// A hostile creature chasing the player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Monster {
    pub id: EntityId,
    pub kind: MonsterKind,
    pub pos: Vec2,
    pub hp: f32,
    pub max_hp: f32,
    pub speed: f32,
    /// Contact damage per second
    pub damage: f32,
    pub size: f32,
    pub dead: bool,
}

impl Monster {
    /// Create a monster with hp and damage scaled by the player's level.
    /// Speed does not scale.
    pub fn spawn(id: EntityId, kind: MonsterKind, pos: Vec2, base: &MonsterStats, level: u32) -> Self {
        let scale = level.max(1) as f32;
        let hp = base.hp * scale;
        Self {
            id,
            kind,
            pos,
            hp,
            max_hp: hp,
            speed: base.speed,
            damage: base.damage * scale,
            size: base.size,
            dead: false,
        }
    }

    /// Apply damage; returns true if this hit killed the monster
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if self.dead {
            return false;
        }
        self.hp -= amount;
        if self.hp <= 0.0 {
            self.dead = true;
            return true;
        }
        false
    }

    /// Step toward a target at full speed. Standing on the target is a no-op.
    pub fn steer_toward(&mut self, target: Vec2, dt: f32) {
        self.pos += direction_to(self.pos, target) * self.speed * dt;
    }
}

/// Projectile behaviour families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProjectileType {
    Linear,
    Orbital,
    Flame,
    Area,
}

/// How a projectile moves each tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Motion {
    /// Velocity integration
    Linear { velocity: Vec2 },
    /// Position derived from the player's position every tick
    Orbital {
        angle: f32,
        radius: f32,
        angular_speed: f32,
    },
}

/// Remaining hit budget of a projectile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Penetration {
    Limited(u32),
    /// Never decremented (flames, orbiters)
    Unlimited,
}

impl From<Option<u32>> for Penetration {
    fn from(value: Option<u32>) -> Self {
        match value {
            Some(n) => Penetration::Limited(n),
            None => Penetration::Unlimited,
        }
    }
}

/// What a projectile is for, relative to the weapon that owns it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectileRole {
    /// Fire-and-forget shot
    Shot,
    /// Persistent projectile circling the player
    Orbiter,
    /// Non-damaging carrier that other shots are fired from
    Emitter,
}

/// A projectile entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: EntityId,
    pub source: WeaponId,
    pub role: ProjectileRole,
    pub kind: ProjectileType,
    pub pos: Vec2,
    pub motion: Motion,
    pub damage: f32,
    pub penetration: Penetration,
    /// Seconds left before expiry
    pub lifetime: f32,
    pub size: f32,
    /// Monsters already damaged by this projectile
    pub hit: Vec<EntityId>,
    pub expired: bool,
}

impl Projectile {
    /// A shot travelling in a straight line
    #[allow(clippy::too_many_arguments)]
    pub fn linear(
        id: EntityId,
        source: WeaponId,
        kind: ProjectileType,
        pos: Vec2,
        velocity: Vec2,
        damage: f32,
        penetration: Penetration,
        lifetime: f32,
        size: f32,
    ) -> Self {
        Self {
            id,
            source,
            role: ProjectileRole::Shot,
            kind,
            pos,
            motion: Motion::Linear { velocity },
            damage,
            penetration,
            lifetime,
            size,
            hit: Vec::new(),
            expired: false,
        }
    }

    /// A projectile circling `anchor`
    #[allow(clippy::too_many_arguments)]
    pub fn orbital(
        id: EntityId,
        source: WeaponId,
        role: ProjectileRole,
        anchor: Vec2,
        angle: f32,
        radius: f32,
        angular_speed: f32,
        damage: f32,
        lifetime: f32,
        size: f32,
    ) -> Self {
        Self {
            id,
            source,
            role,
            kind: ProjectileType::Orbital,
            pos: anchor + polar_to_cartesian(radius, angle),
            motion: Motion::Orbital {
                angle,
                radius,
                angular_speed,
            },
            damage,
            penetration: Penetration::Unlimited,
            lifetime,
            size,
            hit: Vec::new(),
            expired: false,
        }
    }

    /// Move the projectile and burn lifetime. Orbitals follow `anchor`.
    pub fn advance(&mut self, anchor: Vec2, dt: f32) {
        match &mut self.motion {
            Motion::Linear { velocity } => {
                self.pos += *velocity * dt;
            }
            Motion::Orbital {
                angle,
                radius,
                angular_speed,
            } => {
                *angle = normalize_angle(*angle + *angular_speed * dt);
                self.pos = anchor + polar_to_cartesian(*radius, *angle);
            }
        }

        self.lifetime -= dt;
        if self.lifetime <= 0.0 {
            self.expired = true;
        }
    }

    /// Current orbit angle, if orbital
    pub fn orbit_angle(&self) -> Option<f32> {
        match self.motion {
            Motion::Orbital { angle, .. } => Some(angle),
            Motion::Linear { .. } => None,
        }
    }

    /// Whether this projectile can damage monsters right now
    pub fn can_hit(&self) -> bool {
        !self.expired && self.role != ProjectileRole::Emitter
    }

    /// Damage `monster` unless it was already hit by this projectile.
    ///
    /// Returns `None` when nothing happened, otherwise whether the monster died.
    pub fn on_hit(&mut self, monster: &mut Monster) -> Option<bool> {
        if !self.can_hit() || monster.dead || self.hit.contains(&monster.id) {
            return None;
        }

        self.hit.push(monster.id);
        let killed = monster.take_damage(self.damage);

        if let Penetration::Limited(n) = &mut self.penetration {
            *n = n.saturating_sub(1);
            if *n == 0 {
                self.expired = true;
            }
        }

        Some(killed)
    }
}

/// Pickup types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickupKind {
    XpGem,
    Gold,
    Health,
}

impl PickupKind {
    pub fn name(&self) -> &'static str {
        match self {
            PickupKind::XpGem => "xp_gem",
            PickupKind::Gold => "gold",
            PickupKind::Health => "health",
        }
    }

    pub fn size(&self) -> f32 {
        match self {
            PickupKind::Health => 18.0,
            _ => 12.0,
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            PickupKind::XpGem => "#2ecc71",
            PickupKind::Gold => "#f1c40f",
            PickupKind::Health => "#ff4b2b",
        }
    }
}

/// A dropped item waiting to be collected
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pickup {
    pub id: EntityId,
    pub kind: PickupKind,
    pub pos: Vec2,
    /// XP, gold or HP granted on collection
    pub value: u32,
    /// Magnet speed, 0 until the player comes within range
    pub speed: f32,
    pub collected: bool,
}

impl Pickup {
    pub fn new(id: EntityId, kind: PickupKind, pos: Vec2, value: u32) -> Self {
        Self {
            id,
            kind,
            pos,
            value,
            speed: 0.0,
            collected: false,
        }
    }

    /// Magnet toward the player and check collection.
    ///
    /// Inside `collection_range` the pickup accelerates toward the player;
    /// it is collected once closer than the (smaller) pickup radius. Both
    /// tests use the distance at the start of the step.
    pub fn update(&mut self, player_pos: Vec2, collection_range: f32, tuning: &PickupTuning, dt: f32) -> bool {
        if self.collected {
            return false;
        }

        let distance = self.pos.distance(player_pos);

        if distance < collection_range {
            self.speed = (self.speed + tuning.acceleration * dt).min(tuning.max_speed);
            self.pos += direction_to(self.pos, player_pos) * self.speed * dt;
        }

        if distance < tuning.radius {
            self.collected = true;
        }
        self.collected
    }
}

impl Entity for Monster {
    fn id(&self) -> EntityId {
        self.id
    }
    fn is_alive(&self) -> bool {
        !self.dead
    }
}

impl Entity for Projectile {
    fn id(&self) -> EntityId {
        self.id
    }
    fn is_alive(&self) -> bool {
        !self.expired
    }
}

impl Entity for Pickup {
    fn id(&self) -> EntityId {
        self.id
    }
    fn is_alive(&self) -> bool {
        !self.collected
    }
}
