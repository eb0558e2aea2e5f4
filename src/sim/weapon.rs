//! Weapons and their fire strategies
//!
//! Each weapon id selects one strategy from a fixed table; there is no
//! per-weapon type hierarchy. Instances carry only mutable state (level and
//! cooldown accumulator) next to a copy of their config.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::{nearest_monster, nearest_monsters};
use super::entity::{Monster, Penetration, Player, Projectile, ProjectileRole, ProjectileType};
use super::store::{EntityStore, IdAllocator};
use crate::consts::*;
use crate::tuning::{Tuning, WeaponConfig};
use crate::{angle_to, polar_to_cartesian};

/// Dagger: candidates considered for targeting, and total spread (radians)
const DAGGER_MIN_CANDIDATES: usize = 5;
const DAGGER_SPREAD: f32 = 0.2;

/// Flamethrower: cone width, per-level size growth
const FLAME_CONE: f32 = 0.6;
const FLAME_SIZE_GROWTH: f32 = 0.2;

/// Bible orbit parameters at level 1 and their per-level growth
const BIBLE_ORBIT_SPEED: f32 = 3.0;
const BIBLE_ORBIT_SPEED_PER_LEVEL: f32 = 0.5;
const BIBLE_ORBIT_RADIUS: f32 = 100.0;
const BIBLE_ORBIT_RADIUS_PER_LEVEL: f32 = 10.0;

/// Pidgeon emitter and scatter shot parameters
const PIDGEON_ORBIT_RADIUS: f32 = 80.0;
const PIDGEON_ORBIT_SPEED: f32 = 2.0;
const PIDGEON_SIZE: f32 = 20.0;
const PIDGEON_LIFETIME: f32 = 9999.0;
const PIDGEON_SCATTER_BASE: u32 = 2;
const PIDGEON_SCATTER_SPREAD: f32 = 0.4;
const PIDGEON_SHOT_SPEED: f32 = 400.0;
const PIDGEON_SHOT_LIFETIME: f32 = 1.5;
const PIDGEON_SHOT_SIZE: f32 = 8.0;

/// Weapon identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeaponId {
    Dagger,
    Flamethrower,
    Bible,
    Pidgeon,
}

impl WeaponId {
    pub const ALL: [WeaponId; 4] = [
        WeaponId::Dagger,
        WeaponId::Flamethrower,
        WeaponId::Bible,
        WeaponId::Pidgeon,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            WeaponId::Dagger => "dagger",
            WeaponId::Flamethrower => "flamethrower",
            WeaponId::Bible => "bible",
            WeaponId::Pidgeon => "pidgeon",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "dagger" => Some(WeaponId::Dagger),
            "flamethrower" => Some(WeaponId::Flamethrower),
            "bible" => Some(WeaponId::Bible),
            "pidgeon" | "pigeon" => Some(WeaponId::Pidgeon),
            _ => None,
        }
    }
}

/// Convert a loadout keyed by weapon name, dropping names we don't know
pub fn parse_loadout(entries: &[(&str, u32)]) -> Vec<(WeaponId, u32)> {
    entries
        .iter()
        .filter_map(|&(name, level)| match WeaponId::from_name(name) {
            Some(id) => Some((id, level)),
            None => {
                log::warn!("Ignoring unknown weapon '{}'", name);
                None
            }
        })
        .collect()
}

/// Everything a fire strategy may read or append to
pub struct FireContext<'a, R: Rng + ?Sized> {
    pub player: &'a Player,
    pub monsters: &'a EntityStore<Monster>,
    pub projectiles: &'a mut EntityStore<Projectile>,
    pub ids: &'a mut IdAllocator,
    pub rng: &'a mut R,
}

/// An owned weapon: config plus level and cooldown state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaponInstance {
    pub id: WeaponId,
    pub config: WeaponConfig,
    pub level: u32,
    /// Seconds since the last volley
    pub since_fire: f32,
}

impl WeaponInstance {
    pub fn new(id: WeaponId, config: WeaponConfig, level: u32) -> Self {
        Self {
            id,
            config,
            level: level.clamp(1, MAX_WEAPON_LEVEL),
            since_fire: 0.0,
        }
    }

    /// Seconds between volleys at the current level
    pub fn cadence(&self) -> f32 {
        if self.config.scales_cadence {
            let discount = CADENCE_DISCOUNT_PER_LEVEL * self.level.saturating_sub(1) as f32;
            self.config.cooldown * (1.0 - discount).max(MIN_CADENCE_FACTOR)
        } else {
            self.config.cooldown
        }
    }

    /// Damage per shot for the given attack power
    pub fn damage(&self, attack_power: f32) -> f32 {
        self.config.base_damage * attack_power / ATTACK_POWER_BASELINE
    }

    /// Advance the cooldown accumulator; true when a volley is due
    pub fn tick(&mut self, dt: f32) -> bool {
        self.since_fire += dt;
        if self.since_fire >= self.cadence() {
            self.since_fire = 0.0;
            return true;
        }
        false
    }

    /// Run this weapon's strategy once. Returns the number of projectiles created.
    pub fn fire<R: Rng + ?Sized>(&self, ctx: &mut FireContext<'_, R>) -> usize {
        let before = ctx.projectiles.len();
        match self.id {
            WeaponId::Dagger => self.fire_dagger(ctx),
            WeaponId::Flamethrower => self.fire_flamethrower(ctx),
            WeaponId::Bible => self.fire_bible(ctx),
            WeaponId::Pidgeon => self.fire_pidgeon(ctx),
        }
        ctx.projectiles.len() - before
    }

    /// `projectile_count + level` daggers at the nearest monsters, cycling
    /// through the candidates when there are fewer targets than daggers.
    fn fire_dagger<R: Rng + ?Sized>(&self, ctx: &mut FireContext<'_, R>) {
        let count = (self.config.projectile_count + self.level) as usize;
        let origin = ctx.player.pos;
        let targets: Vec<Vec2> = nearest_monsters(origin, ctx.monsters, count.max(DAGGER_MIN_CANDIDATES))
            .iter()
            .map(|m| m.pos)
            .collect();
        if targets.is_empty() {
            return;
        }

        let damage = self.damage(ctx.player.stats.attack_power);
        for i in 0..count {
            let target = targets[i % targets.len()];
            let angle = angle_to(origin, target) + (ctx.rng.random::<f32>() - 0.5) * DAGGER_SPREAD;
            let id = ctx.ids.next_id();
            ctx.projectiles.push(Projectile::linear(
                id,
                self.id,
                self.config.projectile_type,
                origin,
                polar_to_cartesian(self.config.speed, angle),
                damage,
                self.config.penetration.into(),
                self.config.lifetime,
                self.config.size,
            ));
        }
    }

    /// A short-lived cone of flames toward the nearest monster
    fn fire_flamethrower<R: Rng + ?Sized>(&self, ctx: &mut FireContext<'_, R>) {
        let origin = ctx.player.pos;
        let base_angle = nearest_monster(origin, ctx.monsters)
            .map(|m| angle_to(origin, m.pos))
            .unwrap_or(0.0);
        let size = self.config.size * (1.0 + self.level.saturating_sub(1) as f32 * FLAME_SIZE_GROWTH);
        let damage = self.damage(ctx.player.stats.attack_power) / 2.0;

        for _ in 0..self.config.projectile_count.max(1) {
            let angle = base_angle + (ctx.rng.random::<f32>() - 0.5) * FLAME_CONE;
            let speed = self.config.speed * ctx.rng.random_range(0.8..1.2);
            let flame_size = size * ctx.rng.random_range(0.5..1.5);
            let id = ctx.ids.next_id();
            ctx.projectiles.push(Projectile::linear(
                id,
                self.id,
                ProjectileType::Flame,
                origin,
                polar_to_cartesian(speed, angle),
                damage,
                Penetration::Unlimited,
                self.config.lifetime,
                flame_size,
            ));
        }
    }

    /// Keep `projectile_count + level` books in orbit. Only missing books are
    /// added; existing ones keep their phase.
    fn fire_bible<R: Rng + ?Sized>(&self, ctx: &mut FireContext<'_, R>) {
        let target = (self.config.projectile_count + self.level) as usize;
        let existing = ctx
            .projectiles
            .iter()
            .filter(|p| p.source == self.id && p.role == ProjectileRole::Orbiter && !p.expired)
            .count();
        if existing >= target {
            return;
        }

        let step = self.level.saturating_sub(1) as f32;
        let angular_speed = BIBLE_ORBIT_SPEED + step * BIBLE_ORBIT_SPEED_PER_LEVEL;
        let radius = BIBLE_ORBIT_RADIUS + step * BIBLE_ORBIT_RADIUS_PER_LEVEL;
        let damage = self.damage(ctx.player.stats.attack_power);

        for i in existing..target {
            let angle = TAU / target as f32 * i as f32;
            let id = ctx.ids.next_id();
            ctx.projectiles.push(Projectile::orbital(
                id,
                self.id,
                ProjectileRole::Orbiter,
                ctx.player.pos,
                angle,
                radius,
                angular_speed,
                damage,
                self.config.lifetime,
                self.config.size,
            ));
        }
    }

    /// Maintain one orbiting emitter; once it exists, each volley scatters
    /// shots from it toward the nearest monster.
    fn fire_pidgeon<R: Rng + ?Sized>(&self, ctx: &mut FireContext<'_, R>) {
        let emitter_pos = ctx
            .projectiles
            .iter()
            .find(|p| p.source == self.id && p.role == ProjectileRole::Emitter && !p.expired)
            .map(|p| p.pos);

        let Some(origin) = emitter_pos else {
            let id = ctx.ids.next_id();
            ctx.projectiles.push(Projectile::orbital(
                id,
                self.id,
                ProjectileRole::Emitter,
                ctx.player.pos,
                0.0,
                PIDGEON_ORBIT_RADIUS,
                PIDGEON_ORBIT_SPEED,
                0.0,
                PIDGEON_LIFETIME,
                PIDGEON_SIZE,
            ));
            return;
        };

        let Some(target) = nearest_monster(ctx.player.pos, ctx.monsters).map(|m| m.pos) else {
            return;
        };

        let base_angle = angle_to(origin, target);
        let damage = self.damage(ctx.player.stats.attack_power);
        for _ in 0..PIDGEON_SCATTER_BASE + self.level {
            let angle = base_angle + (ctx.rng.random::<f32>() - 0.5) * PIDGEON_SCATTER_SPREAD;
            let id = ctx.ids.next_id();
            ctx.projectiles.push(Projectile::linear(
                id,
                self.id,
                ProjectileType::Linear,
                origin,
                polar_to_cartesian(PIDGEON_SHOT_SPEED, angle),
                damage,
                Penetration::Limited(1),
                PIDGEON_SHOT_LIFETIME,
                PIDGEON_SHOT_SIZE,
            ));
        }
    }
}

/// The player's active weapons
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeaponManager {
    instances: Vec<WeaponInstance>,
}

impl WeaponManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn instances(&self) -> &[WeaponInstance] {
        &self.instances
    }

    pub fn is_active(&self, id: WeaponId) -> bool {
        self.instances.iter().any(|w| w.id == id)
    }

    pub fn level_of(&self, id: WeaponId) -> Option<u32> {
        self.instances.iter().find(|w| w.id == id).map(|w| w.level)
    }

    pub fn get(&self, id: WeaponId) -> Option<&WeaponInstance> {
        self.instances.iter().find(|w| w.id == id)
    }

    pub fn clear(&mut self) {
        self.instances.clear();
    }

    /// Match active instances to a loadout of (weapon, level).
    ///
    /// New weapons are added with a fresh cooldown, existing ones keep their
    /// cooldown progress and take the new level, missing ones are dropped.
    pub fn sync(&mut self, loadout: &[(WeaponId, u32)], tuning: &Tuning) {
        self.instances
            .retain(|w| loadout.iter().any(|(id, _)| *id == w.id));

        for &(id, level) in loadout {
            let level = level.clamp(1, MAX_WEAPON_LEVEL);
            match self.instances.iter_mut().find(|w| w.id == id) {
                Some(instance) => instance.level = level,
                None => {
                    log::info!("Weapon unlocked: {} (level {})", id.name(), level);
                    self.instances
                        .push(WeaponInstance::new(id, tuning.weapon_config(id), level));
                }
            }
        }
    }

    /// Drive every cooldown and fire the weapons that are due.
    /// Returns the number of projectiles created.
    pub fn update<R: Rng + ?Sized>(&mut self, dt: f32, ctx: &mut FireContext<'_, R>) -> usize {
        let mut fired = 0;
        for weapon in &mut self.instances {
            if weapon.tick(dt) {
                let n = weapon.fire(ctx);
                log::trace!("{} fired {} projectiles", weapon.id.name(), n);
                fired += n;
            }
        }
        fired
    }

    /// Expire orbiters and emitters whose weapon is no longer equipped
    pub fn retire_orphans(&self, projectiles: &mut EntityStore<Projectile>) {
        for p in projectiles.iter_mut() {
            if p.role != ProjectileRole::Shot && !self.is_active(p.source) {
                p.expired = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::{Motion, MonsterKind};
    use crate::tuning::MonsterStats;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    struct Fixture {
        player: Player,
        monsters: EntityStore<Monster>,
        projectiles: EntityStore<Projectile>,
        ids: IdAllocator,
        rng: Pcg32,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                player: Player::new(Vec2::ZERO),
                monsters: EntityStore::new(),
                projectiles: EntityStore::new(),
                ids: IdAllocator::default(),
                rng: Pcg32::seed_from_u64(7),
            }
        }

        fn add_monster(&mut self, pos: Vec2) {
            let id = self.ids.next_id();
            self.monsters.push(Monster::spawn(
                id,
                MonsterKind::Bat,
                pos,
                &MonsterStats::baseline(MonsterKind::Bat),
                1,
            ));
        }

        fn fire(&mut self, weapon: &WeaponInstance) -> usize {
            let mut ctx = FireContext {
                player: &self.player,
                monsters: &self.monsters,
                projectiles: &mut self.projectiles,
                ids: &mut self.ids,
                rng: &mut self.rng,
            };
            weapon.fire(&mut ctx)
        }

        fn orbiters(&self, id: WeaponId) -> Vec<&Projectile> {
            self.projectiles
                .iter()
                .filter(|p| p.source == id && p.role == ProjectileRole::Orbiter)
                .collect()
        }
    }

    fn instance(id: WeaponId, level: u32) -> WeaponInstance {
        WeaponInstance::new(id, WeaponConfig::baseline(id), level)
    }

    #[test]
    fn test_cadence_scaling_and_clamp() {
        let pidgeon = instance(WeaponId::Pidgeon, 1);
        assert!((pidgeon.cadence() - 2.0).abs() < 1e-5);
        let pidgeon = instance(WeaponId::Pidgeon, 3);
        assert!((pidgeon.cadence() - 1.6).abs() < 1e-5);
        let pidgeon = instance(WeaponId::Pidgeon, 8);
        assert!((pidgeon.cadence() - 1.0).abs() < 1e-5);

        // Non-scaling weapons keep the raw cooldown
        let dagger = instance(WeaponId::Dagger, 8);
        assert!((dagger.cadence() - 0.8).abs() < 1e-5);
    }

    #[test]
    fn test_level_zero_behaves_like_level_one() {
        let mut pidgeon = instance(WeaponId::Pidgeon, 1);
        pidgeon.level = 0;
        assert!((pidgeon.cadence() - 2.0).abs() < 1e-5);

        let mut f = Fixture::new();
        f.add_monster(Vec2::new(0.0, 100.0));
        let mut flame = instance(WeaponId::Flamethrower, 1);
        flame.level = 0;
        assert_eq!(f.fire(&flame), 3);

        let mut bible = instance(WeaponId::Bible, 1);
        bible.level = 0;
        assert_eq!(f.fire(&bible), 2);
        let Motion::Orbital { radius, .. } = f.orbiters(WeaponId::Bible)[0].motion else {
            panic!("bible should orbit");
        };
        assert_eq!(radius, 100.0);
    }

    #[test]
    fn test_damage_scales_with_attack_power() {
        let dagger = instance(WeaponId::Dagger, 1);
        assert_eq!(dagger.damage(10.0), 10.0);
        assert_eq!(dagger.damage(15.0), 15.0);
    }

    #[test]
    fn test_tick_fires_on_cooldown() {
        let mut dagger = instance(WeaponId::Dagger, 1);
        assert!(!dagger.tick(0.5));
        assert!(dagger.tick(0.3));
        assert_eq!(dagger.since_fire, 0.0);
    }

    #[test]
    fn test_dagger_without_targets_does_nothing() {
        let mut f = Fixture::new();
        assert_eq!(f.fire(&instance(WeaponId::Dagger, 3)), 0);
    }

    #[test]
    fn test_dagger_count_and_cycling() {
        let mut f = Fixture::new();
        f.add_monster(Vec2::new(100.0, 0.0));
        // Level 2: 1 + 2 daggers, all at the single target
        assert_eq!(f.fire(&instance(WeaponId::Dagger, 2)), 3);
        for p in f.projectiles.iter() {
            let Motion::Linear { velocity } = p.motion else {
                panic!("dagger should be linear");
            };
            assert!((velocity.length() - 500.0).abs() < 1e-2);
            // Spread is at most ±0.1 rad around +X
            assert!(velocity.y.atan2(velocity.x).abs() <= 0.1 + 1e-5);
            assert_eq!(p.penetration, Penetration::Limited(1));
        }
    }

    #[test]
    fn test_flamethrower_cone() {
        let mut f = Fixture::new();
        f.add_monster(Vec2::new(0.0, 100.0));
        let flame = instance(WeaponId::Flamethrower, 3);
        assert_eq!(f.fire(&flame), 3);
        for p in f.projectiles.iter() {
            assert_eq!(p.kind, ProjectileType::Flame);
            assert_eq!(p.penetration, Penetration::Unlimited);
            // Level 3: base size 20 × 1.4, then ×[0.5, 1.5)
            assert!(p.size >= 14.0 && p.size < 42.0);
            assert_eq!(p.damage, 2.5);
        }
    }

    #[test]
    fn test_bible_population_tops_up_without_reset() {
        let mut f = Fixture::new();
        let bible = instance(WeaponId::Bible, 2);

        assert_eq!(f.fire(&bible), 4);
        assert_eq!(f.orbiters(WeaponId::Bible).len(), 4);

        // A full population is left alone
        assert_eq!(f.fire(&bible), 0);

        // Lose two books, advance the survivors, then top up
        let lost: Vec<_> = f.orbiters(WeaponId::Bible).iter().take(2).map(|p| p.id).collect();
        for id in lost {
            f.projectiles.get_mut(id).unwrap().expired = true;
        }
        f.projectiles.compact();
        for p in f.projectiles.iter_mut() {
            p.advance(Vec2::ZERO, 0.25);
        }
        let before: Vec<_> = f
            .orbiters(WeaponId::Bible)
            .iter()
            .map(|p| (p.id, p.orbit_angle().unwrap()))
            .collect();

        assert_eq!(f.fire(&bible), 2);
        assert_eq!(f.orbiters(WeaponId::Bible).len(), 4);
        for (id, angle) in before {
            assert_eq!(f.projectiles.get(id).unwrap().orbit_angle(), Some(angle));
        }
    }

    #[test]
    fn test_bible_orbit_grows_with_level() {
        let mut f = Fixture::new();
        f.fire(&instance(WeaponId::Bible, 3));
        let p = f.orbiters(WeaponId::Bible)[0];
        let Motion::Orbital {
            radius,
            angular_speed,
            ..
        } = p.motion
        else {
            panic!("bible should orbit");
        };
        assert_eq!(radius, 120.0);
        assert_eq!(angular_speed, 4.0);
    }

    #[test]
    fn test_pidgeon_emitter_then_scatter() {
        let mut f = Fixture::new();
        f.add_monster(Vec2::new(300.0, 0.0));
        let pidgeon = instance(WeaponId::Pidgeon, 2);

        // First volley only creates the emitter
        assert_eq!(f.fire(&pidgeon), 1);
        let emitters = f
            .projectiles
            .iter()
            .filter(|p| p.role == ProjectileRole::Emitter)
            .count();
        assert_eq!(emitters, 1);

        // Then 2 + level shots per volley, still one emitter
        assert_eq!(f.fire(&pidgeon), 4);
        let emitters = f
            .projectiles
            .iter()
            .filter(|p| p.role == ProjectileRole::Emitter)
            .count();
        assert_eq!(emitters, 1);
        let shots: Vec<_> = f
            .projectiles
            .iter()
            .filter(|p| p.role == ProjectileRole::Shot)
            .collect();
        assert!(shots.iter().all(|p| p.penetration == Penetration::Limited(1)));
        assert!(shots.iter().all(|p| p.pos == Vec2::new(80.0, 0.0)));
    }

    #[test]
    fn test_sync_adds_updates_and_drops() {
        let tuning = Tuning::default();
        let mut manager = WeaponManager::new();
        manager.sync(&[(WeaponId::Dagger, 1), (WeaponId::Bible, 2)], &tuning);
        assert_eq!(manager.instances().len(), 2);
        assert_eq!(manager.level_of(WeaponId::Bible), Some(2));

        manager.sync(&[(WeaponId::Bible, 3)], &tuning);
        assert!(!manager.is_active(WeaponId::Dagger));
        assert_eq!(manager.level_of(WeaponId::Bible), Some(3));

        // Levels are clamped
        manager.sync(&[(WeaponId::Bible, 99)], &tuning);
        assert_eq!(manager.level_of(WeaponId::Bible), Some(MAX_WEAPON_LEVEL));
    }

    #[test]
    fn test_retire_orphans() {
        let mut f = Fixture::new();
        f.fire(&instance(WeaponId::Bible, 1));
        let manager = WeaponManager::new();
        manager.retire_orphans(&mut f.projectiles);
        assert!(f.projectiles.iter().all(|p| p.expired));
    }

    #[test]
    fn test_parse_loadout_skips_unknown() {
        let loadout = parse_loadout(&[("dagger", 2), ("laser", 1), ("Bible", 1)]);
        assert_eq!(loadout, vec![(WeaponId::Dagger, 2), (WeaponId::Bible, 1)]);
    }
}
