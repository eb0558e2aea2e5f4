//! Monster spawning
//!
//! Monsters appear on a ring around the player just outside the visible
//! area, on a fixed timer. Kind selection is a weighted roll over the
//! tuning's spawn table.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use serde::{Deserialize, Serialize};

use super::entity::{EntityId, Monster, MonsterKind};
use crate::polar_to_cartesian;
use crate::tuning::{SpawnWeight, Tuning};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spawner {
    /// Seconds accumulated since the last spawn
    pub timer: f32,
    /// Seconds between spawns
    pub interval: f32,
}

impl Spawner {
    pub fn new(interval: f32) -> Self {
        Self {
            timer: 0.0,
            interval,
        }
    }

    /// Accumulate time; true once the timer exceeds the interval
    pub fn tick(&mut self, dt: f32) -> bool {
        self.timer += dt;
        if self.timer > self.interval {
            self.timer = 0.0;
            return true;
        }
        false
    }

    pub fn reset(&mut self) {
        self.timer = 0.0;
    }

    /// Random point on the spawn ring around `center`
    pub fn spawn_position<R: Rng + ?Sized>(center: Vec2, viewport: Vec2, distance_factor: f32, rng: &mut R) -> Vec2 {
        let angle = rng.random_range(0.0..TAU);
        let distance = viewport.x.max(viewport.y) * distance_factor;
        center + polar_to_cartesian(distance, angle)
    }

    /// Weighted roll over the spawn table.
    ///
    /// Names outside the roster, and empty or all-zero tables, give the
    /// generic monster.
    pub fn pick_kind<R: Rng + ?Sized>(table: &[SpawnWeight], rng: &mut R) -> MonsterKind {
        let Ok(dist) = WeightedIndex::<u32>::new(table.iter().map(|w| w.weight)) else {
            return MonsterKind::Generic;
        };
        let entry = &table[dist.sample(rng)];
        MonsterKind::from_name(&entry.kind).unwrap_or_else(|| {
            log::debug!("Unknown monster kind '{}', spawning generic", entry.kind);
            MonsterKind::Generic
        })
    }

    /// Build a monster for the given player level at a random ring position
    pub fn spawn<R: Rng + ?Sized>(
        id: EntityId,
        center: Vec2,
        viewport: Vec2,
        level: u32,
        tuning: &Tuning,
        rng: &mut R,
    ) -> Monster {
        let pos = Self::spawn_position(center, viewport, tuning.spawn_distance_factor, rng);
        let kind = Self::pick_kind(&tuning.spawn_table, rng);
        let base = tuning.monster_stats(kind);
        log::debug!("Spawned {} (level {}) at ({:.0}, {:.0})", kind.name(), level, pos.x, pos.y);
        Monster::spawn(id, kind, pos, &base, level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn weight(kind: &str, weight: u32) -> SpawnWeight {
        SpawnWeight {
            kind: kind.to_string(),
            weight,
        }
    }

    #[test]
    fn test_timer_exceeds_interval() {
        let mut spawner = Spawner::new(1.2);
        assert!(!spawner.tick(0.6));
        assert!(!spawner.tick(0.6));
        assert!(spawner.tick(0.1));
        assert_eq!(spawner.timer, 0.0);
    }

    #[test]
    fn test_spawn_ring_distance() {
        let mut rng = Pcg32::seed_from_u64(1);
        let center = Vec2::new(100.0, -40.0);
        let viewport = Vec2::new(800.0, 600.0);
        for _ in 0..50 {
            let pos = Spawner::spawn_position(center, viewport, 0.7, &mut rng);
            assert!((pos.distance(center) - 560.0).abs() < 1e-2);
        }
    }

    #[test]
    fn test_pick_kind_unknown_names_are_generic() {
        let mut rng = Pcg32::seed_from_u64(3);
        let table = vec![weight("minion", 9), weight("boss", 1)];
        for _ in 0..20 {
            assert_eq!(Spawner::pick_kind(&table, &mut rng), MonsterKind::Generic);
        }
        assert_eq!(Spawner::pick_kind(&[], &mut rng), MonsterKind::Generic);
        assert_eq!(
            Spawner::pick_kind(&[weight("bat", 0)], &mut rng),
            MonsterKind::Generic
        );
    }

    #[test]
    fn test_pick_kind_respects_weights() {
        let mut rng = Pcg32::seed_from_u64(11);
        let table = vec![weight("bat", 1), weight("golem", 0), weight("zombie", 1)];
        for _ in 0..100 {
            assert_ne!(Spawner::pick_kind(&table, &mut rng), MonsterKind::Golem);
        }
    }

    #[test]
    fn test_spawn_scales_with_level() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut tuning = Tuning::default();
        tuning.spawn_table = vec![weight("dracula", 1)];
        let monster = Spawner::spawn(1, Vec2::ZERO, Vec2::new(800.0, 600.0), 2, &tuning, &mut rng);
        assert_eq!(monster.kind, MonsterKind::Dracula);
        assert_eq!(monster.max_hp, 60.0);
        assert_eq!(monster.damage, 8.0);
        assert_eq!(monster.speed, 110.0);
    }
}
