//! Run progression: phases, XP and level-ups, upgrade offers, run statistics
//!
//! The controller consumes simulation events and never touches the world
//! directly. Upgrades that change player stats are applied through
//! `select`, which takes the stats to modify.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::sim::entity::PlayerStats;
use crate::sim::tick::{EventSink, SimEvent};
use crate::sim::weapon::WeaponId;

/// Upgrades offered per level-up
pub const OFFER_COUNT: usize = 3;

/// Highest rank any passive can reach
pub const MAX_PASSIVE_RANK: u32 = 5;

/// Current phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Title screen, nothing simulated yet
    Start,
    /// Active gameplay
    Playing,
    /// Game is paused
    Paused,
    /// Waiting for the player to pick an upgrade
    LevelUp,
    /// Run ended
    GameOver,
}

/// Stat-only upgrades
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Passive {
    /// +10% attack power
    Might,
    /// +10% move speed
    Swiftness,
    /// +25% pickup range
    Magnet,
    /// +20 max HP, healed immediately
    Vitality,
}

impl Passive {
    pub const ALL: [Passive; 4] = [Passive::Might, Passive::Swiftness, Passive::Magnet, Passive::Vitality];

    pub fn name(&self) -> &'static str {
        match self {
            Passive::Might => "Might",
            Passive::Swiftness => "Swiftness",
            Passive::Magnet => "Magnet",
            Passive::Vitality => "Vitality",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Passive::Might => "Increases damage by 10%",
            Passive::Swiftness => "Increases move speed by 10%",
            Passive::Magnet => "Increases pickup range by 25%",
            Passive::Vitality => "Increases max HP by 20",
        }
    }

    /// Apply one rank of this passive
    pub fn apply(&self, stats: &mut PlayerStats) {
        match self {
            Passive::Might => stats.attack_power *= 1.1,
            Passive::Swiftness => stats.speed *= 1.1,
            Passive::Magnet => stats.collection_range *= 1.25,
            Passive::Vitality => {
                stats.max_hp += 20.0;
                stats.current_hp = (stats.current_hp + 20.0).min(stats.max_hp);
            }
        }
    }
}

/// One choice in a level-up offer. `level` is the level it grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Upgrade {
    Weapon { id: WeaponId, level: u32 },
    Passive { passive: Passive, level: u32 },
}

impl Upgrade {
    pub fn name(&self) -> &'static str {
        match self {
            Upgrade::Weapon { id, .. } => id.name(),
            Upgrade::Passive { passive, .. } => passive.name(),
        }
    }

    pub fn level(&self) -> u32 {
        match self {
            Upgrade::Weapon { level, .. } | Upgrade::Passive { level, .. } => *level,
        }
    }

    /// True if this upgrade unlocks something new
    pub fn is_new(&self) -> bool {
        self.level() == 1
    }
}

/// Statistics for the game over report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    /// Seconds spent in `Playing`
    pub elapsed: f32,
    pub kills: u32,
    pub gold: u32,
    pub level: u32,
}

impl RunStats {
    pub fn time_label(&self) -> String {
        format_time(self.elapsed)
    }
}

/// Format seconds as `mm:ss`
pub fn format_time(seconds: f32) -> String {
    let total = if seconds.is_finite() { seconds.max(0.0) as u32 } else { 0 };
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// XP needed for the level after one requiring `max_xp`
fn next_max_xp(max_xp: u32) -> u32 {
    ((max_xp as f64 * XP_GROWTH as f64).floor() as u32).max(1)
}

/// Tracks everything about a run that outlives a single tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressionController {
    phase: GamePhase,
    level: u32,
    current_xp: u32,
    max_xp: u32,
    /// Owned weapons with their levels, in unlock order
    loadout: Vec<(WeaponId, u32)>,
    /// Owned passives with their ranks, in unlock order
    passives: Vec<(Passive, u32)>,
    /// Level-ups not yet spent on an upgrade
    pending_levels: u32,
    offers: Vec<Upgrade>,
    stats: RunStats,
}

impl Default for ProgressionController {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressionController {
    pub fn new() -> Self {
        Self {
            phase: GamePhase::Start,
            level: 1,
            current_xp: 0,
            max_xp: BASE_MAX_XP,
            loadout: Vec::new(),
            passives: Vec::new(),
            pending_levels: 0,
            offers: Vec::new(),
            stats: RunStats {
                level: 1,
                ..Default::default()
            },
        }
    }

    /// Begin a run with one starting weapon. No-op unless on the start screen.
    pub fn start(&mut self, starting_weapon: WeaponId) -> bool {
        if self.phase != GamePhase::Start {
            return false;
        }
        self.loadout = vec![(starting_weapon, 1)];
        self.phase = GamePhase::Playing;
        log::info!("Run started with {}", starting_weapon.name());
        true
    }

    /// Discard the run and return to the start screen
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn current_xp(&self) -> u32 {
        self.current_xp
    }

    pub fn max_xp(&self) -> u32 {
        self.max_xp
    }

    /// Progress toward the next level in [0, 1]
    pub fn xp_fraction(&self) -> f32 {
        (self.current_xp as f32 / self.max_xp as f32).min(1.0)
    }

    pub fn loadout(&self) -> &[(WeaponId, u32)] {
        &self.loadout
    }

    pub fn passives(&self) -> &[(Passive, u32)] {
        &self.passives
    }

    pub fn pending_levels(&self) -> u32 {
        self.pending_levels
    }

    pub fn offers(&self) -> &[Upgrade] {
        &self.offers
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    pub fn is_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    /// Add XP, carrying overflow across as many levels as it covers.
    ///
    /// Returns the number of levels gained. Ignored once the run is over.
    pub fn gain_xp(&mut self, amount: u32) -> u32 {
        if matches!(self.phase, GamePhase::GameOver | GamePhase::Start) {
            return 0;
        }

        self.current_xp = self.current_xp.saturating_add(amount);
        let mut gained = 0;
        while self.current_xp >= self.max_xp {
            self.current_xp -= self.max_xp;
            self.level += 1;
            self.max_xp = next_max_xp(self.max_xp);
            gained += 1;
        }

        if gained > 0 {
            self.stats.level = self.level;
            self.pending_levels += gained;
            if self.phase == GamePhase::Playing {
                self.phase = GamePhase::LevelUp;
            }
            log::info!("Level up: now level {} (next at {} xp)", self.level, self.max_xp);
        }
        gained
    }

    pub fn record_kill(&mut self) {
        if !self.is_over() {
            self.stats.kills += 1;
        }
    }

    pub fn add_gold(&mut self, amount: u32) {
        if !self.is_over() {
            self.stats.gold = self.stats.gold.saturating_add(amount);
        }
    }

    /// React to player damage. Returns true the one time the run ends.
    pub fn on_player_damaged(&mut self, remaining_hp: f32) -> bool {
        if remaining_hp > 0.0 || matches!(self.phase, GamePhase::GameOver | GamePhase::Start) {
            return false;
        }
        self.phase = GamePhase::GameOver;
        self.offers.clear();
        self.pending_levels = 0;
        log::info!(
            "Game over at level {} after {} ({} kills)",
            self.level,
            self.stats.time_label(),
            self.stats.kills
        );
        true
    }

    /// Accumulate play time; only counts while playing
    pub fn tick_clock(&mut self, dt: f32) {
        if self.phase == GamePhase::Playing && dt.is_finite() && dt > 0.0 {
            self.stats.elapsed += dt;
        }
    }

    pub fn pause(&mut self) -> bool {
        if self.phase == GamePhase::Playing {
            self.phase = GamePhase::Paused;
            return true;
        }
        false
    }

    pub fn resume(&mut self) -> bool {
        if self.phase == GamePhase::Paused {
            self.phase = GamePhase::Playing;
            return true;
        }
        false
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.pause() || self.resume()
    }

    /// Every upgrade currently available, before shuffling
    pub fn upgrade_pool(&self) -> Vec<Upgrade> {
        let weapons = WeaponId::ALL.iter().filter_map(|&id| {
            match self.loadout.iter().find(|(owned, _)| *owned == id) {
                Some(&(_, level)) if level >= MAX_WEAPON_LEVEL => None,
                Some(&(_, level)) => Some(Upgrade::Weapon { id, level: level + 1 }),
                None => Some(Upgrade::Weapon { id, level: 1 }),
            }
        });
        let passives = Passive::ALL.iter().filter_map(|&passive| {
            match self.passives.iter().find(|(owned, _)| *owned == passive) {
                Some(&(_, rank)) if rank >= MAX_PASSIVE_RANK => None,
                Some(&(_, rank)) => Some(Upgrade::Passive { passive, level: rank + 1 }),
                None => Some(Upgrade::Passive { passive, level: 1 }),
            }
        });
        weapons.chain(passives).collect()
    }

    /// Draw a fresh offer for the pending level-up.
    ///
    /// When everything is maxed out the pending levels are dropped and play
    /// resumes.
    pub fn roll_offers<R: Rng + ?Sized>(&mut self, rng: &mut R) -> &[Upgrade] {
        if self.phase != GamePhase::LevelUp {
            return &[];
        }

        let mut pool = self.upgrade_pool();
        if pool.is_empty() {
            log::debug!("Upgrade pool exhausted, skipping level-up");
            self.pending_levels = 0;
            self.offers.clear();
            self.phase = GamePhase::Playing;
            return &[];
        }

        pool.shuffle(rng);
        pool.truncate(OFFER_COUNT);
        self.offers = pool;
        &self.offers
    }

    /// Take the offer at `index`, applying passive effects to `stats`.
    ///
    /// Play resumes once no level-ups are pending; otherwise the controller
    /// stays in `LevelUp` and a new offer must be rolled.
    pub fn select(&mut self, index: usize, stats: &mut PlayerStats) -> Option<Upgrade> {
        if self.phase != GamePhase::LevelUp {
            return None;
        }
        let upgrade = *self.offers.get(index)?;

        match upgrade {
            Upgrade::Weapon { id, level } => match self.loadout.iter_mut().find(|(owned, _)| *owned == id) {
                Some(entry) => entry.1 = level,
                None => self.loadout.push((id, level)),
            },
            Upgrade::Passive { passive, level } => {
                match self.passives.iter_mut().find(|(owned, _)| *owned == passive) {
                    Some(entry) => entry.1 = level,
                    None => self.passives.push((passive, level)),
                }
                passive.apply(stats);
            }
        }
        log::info!("Upgrade chosen: {} (level {})", upgrade.name(), upgrade.level());

        self.offers.clear();
        self.pending_levels = self.pending_levels.saturating_sub(1);
        if self.pending_levels == 0 {
            self.phase = GamePhase::Playing;
        }
        Some(upgrade)
    }

    /// Final statistics for the game over report
    pub fn report(&self) -> RunStats {
        RunStats {
            level: self.level,
            ..self.stats.clone()
        }
    }
}

impl EventSink for ProgressionController {
    fn emit(&mut self, event: SimEvent) {
        match event {
            SimEvent::PlayerDamaged { remaining_hp, .. } => {
                self.on_player_damaged(remaining_hp);
            }
            SimEvent::MonsterKilled { .. } => self.record_kill(),
            SimEvent::GainXp(amount) => {
                self.gain_xp(amount);
            }
            SimEvent::GoldCollected(amount) => self.add_gold(amount),
            SimEvent::PlayerHealed { .. } => {}
        }
    }
}
