//! Simulation state
//!
//! Everything the per-frame loop reads or writes lives in one owned struct
//! that is passed into `advance`.

use glam::Vec2;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::camera::Camera;
use super::entity::{Monster, MonsterKind, Pickup, Player, Projectile};
use super::spawner::Spawner;
use super::store::{EntityStore, IdAllocator};
use super::weapon::{WeaponId, WeaponManager};
use crate::consts::*;
use crate::tuning::Tuning;

/// RNG state wrapper for serialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
    pub stream: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed, stream: 0 }
    }

    pub fn to_rng(&self) -> Pcg32 {
        Pcg32::new(self.seed, self.stream)
    }
}

/// Complete simulation state for one session
#[derive(Debug, Clone)]
pub struct SimulationState {
    /// Balance data
    pub tuning: Tuning,
    /// Visible area size, used for the camera and the spawn ring
    pub viewport: Vec2,
    pub player: Player,
    /// Player level at the time of the next spawn
    pub player_level: u32,
    pub camera: Camera,
    pub monsters: EntityStore<Monster>,
    pub projectiles: EntityStore<Projectile>,
    pub pickups: EntityStore<Pickup>,
    pub weapons: WeaponManager,
    pub spawner: Spawner,
    /// Simulated seconds since start/reset
    pub elapsed: f32,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub ids: IdAllocator,
    /// Injected random source
    pub rng: Pcg32,
}

impl SimulationState {
    /// Create a new state with an RNG seeded from `seed`
    pub fn new(tuning: Tuning, seed: u64) -> Self {
        Self::with_rng(tuning, RngState::new(seed).to_rng())
    }

    /// Create a new state around an existing random source
    pub fn with_rng(tuning: Tuning, rng: Pcg32) -> Self {
        let spawner = Spawner::new(tuning.spawn_interval);
        let mut state = Self {
            tuning,
            viewport: Vec2::new(VIEWPORT_WIDTH, VIEWPORT_HEIGHT),
            player: Player::new(Vec2::ZERO),
            player_level: 1,
            camera: Camera::default(),
            monsters: EntityStore::new(),
            projectiles: EntityStore::new(),
            pickups: EntityStore::new(),
            weapons: WeaponManager::new(),
            spawner,
            elapsed: 0.0,
            time_ticks: 0,
            ids: IdAllocator::default(),
            rng,
        };
        state.camera.follow(state.player.pos, state.viewport);
        state
    }

    /// Clear every entity and re-center a fresh player. Weapons are emptied;
    /// the caller re-syncs its loadout.
    pub fn reset(&mut self) {
        self.player = Player::new(Vec2::ZERO);
        self.player_level = 1;
        self.monsters.clear();
        self.projectiles.clear();
        self.pickups.clear();
        self.weapons.clear();
        self.spawner = Spawner::new(self.tuning.spawn_interval);
        self.elapsed = 0.0;
        self.time_ticks = 0;
        self.camera.follow(self.player.pos, self.viewport);
        log::info!("Simulation reset");
    }

    /// Replace the random source (tests, replays of a single session)
    pub fn reseed(&mut self, seed: u64) {
        self.rng = RngState::new(seed).to_rng();
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.viewport = Vec2::new(width.max(1.0), height.max(1.0));
        self.camera.follow(self.player.pos, self.viewport);
    }

    /// Level used to scale newly spawned monsters
    pub fn set_player_level(&mut self, level: u32) {
        self.player_level = level.max(1);
    }

    /// Equip the tuning's starting weapon at level 1
    pub fn equip_starting_weapon(&mut self) -> WeaponId {
        let id = self.tuning.starting_weapon_id();
        self.weapons.sync(&[(id, 1)], &self.tuning);
        id
    }

    /// Place a monster of `kind` directly, scaled by the current level
    pub fn spawn_monster_at(&mut self, kind: MonsterKind, pos: Vec2) -> u32 {
        let id = self.ids.next_id();
        let base = self.tuning.monster_stats(kind);
        self.monsters
            .push(Monster::spawn(id, kind, pos, &base, self.player_level));
        id
    }

    /// Total live entities across all collections
    pub fn entity_count(&self) -> usize {
        self.monsters.len() + self.projectiles.len() + self.pickups.len()
    }
}
