//! Session glue
//!
//! Turns frame callbacks into simulation steps: computes dt from frame
//! timestamps, advances the world only while playing, routes events into
//! progression and pushes level-up results back into the world.

use rand_pcg::Pcg32;

use crate::consts::*;
use crate::progression::{GamePhase, ProgressionController, RunStats, Upgrade};
use crate::sim::snapshot::RenderSnapshot;
use crate::sim::state::{RngState, SimulationState};
use crate::sim::tick::{EventSink, SimEvent, TickInput, advance};
use crate::tuning::Tuning;

/// Converts frame timestamps (milliseconds) into clamped deltas (seconds)
#[derive(Debug, Clone)]
pub struct FrameClock {
    last_time: Option<f64>,
    max_dt: f32,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(MAX_FRAME_DT)
    }
}

impl FrameClock {
    pub fn new(max_dt: f32) -> Self {
        Self {
            last_time: None,
            max_dt,
        }
    }

    /// Forget the previous frame; the next delta is 0
    pub fn reset(&mut self) {
        self.last_time = None;
    }

    /// Seconds since the previous call, clamped to `[0, max_dt]`
    pub fn delta(&mut self, now: f64) -> f32 {
        if !now.is_finite() {
            return 0.0;
        }
        let dt = match self.last_time {
            Some(last) => ((now - last) / 1000.0) as f32,
            None => 0.0,
        };
        self.last_time = Some(now);
        dt.clamp(0.0, self.max_dt)
    }
}

/// Delivers each event to progression and keeps a copy for the caller
struct Tee<'a> {
    progression: &'a mut ProgressionController,
    events: &'a mut Vec<SimEvent>,
}

impl EventSink for Tee<'_> {
    fn emit(&mut self, event: SimEvent) {
        self.progression.emit(event.clone());
        self.events.push(event);
    }
}

/// One game session: world, progression and frame timing
#[derive(Debug, Clone)]
pub struct Session {
    pub state: SimulationState,
    pub progression: ProgressionController,
    clock: FrameClock,
    /// Separate stream so upgrade offers don't perturb the world RNG
    offer_rng: Pcg32,
    /// Events raised by the most recent step
    events: Vec<SimEvent>,
}

impl Session {
    pub fn new(tuning: Tuning, seed: u64) -> Self {
        Self {
            state: SimulationState::new(tuning, seed),
            progression: ProgressionController::new(),
            clock: FrameClock::default(),
            offer_rng: RngState { seed, stream: 1 }.to_rng(),
            events: Vec::new(),
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.progression.phase()
    }

    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    /// Leave the start screen and begin playing
    pub fn start(&mut self) -> bool {
        let weapon = self.state.tuning.starting_weapon_id();
        if !self.progression.start(weapon) {
            return false;
        }
        self.sync_progression();
        self.clock.reset();
        true
    }

    /// Clear the world and progression and return to the start screen
    pub fn reset(&mut self) {
        self.state.reset();
        self.progression.reset();
        self.clock.reset();
        self.events.clear();
    }

    /// Reset and immediately start a new run
    pub fn restart(&mut self) -> bool {
        self.reset();
        self.start()
    }

    /// Handle one display frame. `now` is a monotonic timestamp in
    /// milliseconds; the first frame after start, reset or resume uses dt = 0.
    pub fn frame(&mut self, now: f64, input: &TickInput) -> RenderSnapshot {
        let dt = self.clock.delta(now);
        self.step(dt, input);
        RenderSnapshot::capture(&self.state)
    }

    /// Advance by an explicit dt. Does nothing outside `Playing`.
    pub fn step(&mut self, dt: f32, input: &TickInput) {
        self.events.clear();
        if self.progression.phase() != GamePhase::Playing {
            return;
        }

        self.progression.tick_clock(dt);
        let mut sink = Tee {
            progression: &mut self.progression,
            events: &mut self.events,
        };
        advance(&mut self.state, input, dt, &mut sink);

        if self.progression.phase() == GamePhase::LevelUp {
            self.progression.roll_offers(&mut self.offer_rng);
            self.sync_progression();
        }
    }

    pub fn offers(&self) -> &[Upgrade] {
        self.progression.offers()
    }

    /// Pick one of the current level-up offers
    pub fn choose_upgrade(&mut self, index: usize) -> Option<Upgrade> {
        let upgrade = self.progression.select(index, &mut self.state.player.stats)?;
        if self.progression.phase() == GamePhase::LevelUp {
            self.progression.roll_offers(&mut self.offer_rng);
        }
        self.sync_progression();
        if self.progression.phase() == GamePhase::Playing {
            self.clock.reset();
        }
        Some(upgrade)
    }

    pub fn toggle_pause(&mut self) -> bool {
        let toggled = self.progression.toggle_pause();
        if toggled && self.progression.phase() == GamePhase::Playing {
            self.clock.reset();
        }
        toggled
    }

    pub fn report(&self) -> RunStats {
        self.progression.report()
    }

    pub fn snapshot(&self) -> RenderSnapshot {
        RenderSnapshot::capture(&self.state)
    }

    /// Push weapon levels and spawn level from progression into the world
    fn sync_progression(&mut self) {
        self.state.weapons.sync(self.progression.loadout(), &self.state.tuning);
        self.state.set_player_level(self.progression.level());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::{MonsterKind, Pickup, PickupKind};
    use crate::sim::weapon::WeaponId;
    use glam::Vec2;

    fn quiet_session() -> Session {
        let mut tuning = Tuning::default();
        tuning.spawn_interval = 1_000.0;
        Session::new(tuning, 17)
    }

    #[test]
    fn test_frame_clock() {
        let mut clock = FrameClock::default();
        assert_eq!(clock.delta(1000.0), 0.0);
        assert!((clock.delta(1016.0) - 0.016).abs() < 1e-6);
        // Long stalls are clamped
        assert_eq!(clock.delta(5000.0), MAX_FRAME_DT);
        // Time going backwards yields 0
        assert_eq!(clock.delta(4000.0), 0.0);
        clock.reset();
        assert_eq!(clock.delta(9000.0), 0.0);
    }

    #[test]
    fn test_start_equips_starting_weapon() {
        let mut session = quiet_session();
        assert_eq!(session.phase(), GamePhase::Start);
        assert!(session.start());
        assert!(!session.start());
        assert_eq!(session.phase(), GamePhase::Playing);
        assert!(session.state.weapons.is_active(WeaponId::Dagger));
    }

    #[test]
    fn test_no_advance_before_start() {
        let mut session = quiet_session();
        let input = TickInput {
            right: true,
            ..Default::default()
        };
        session.frame(0.0, &input);
        session.frame(100.0, &input);
        assert_eq!(session.state.time_ticks, 0);
        assert_eq!(session.state.player.pos, Vec2::ZERO);
    }

    #[test]
    fn test_first_frame_is_zero_dt() {
        let mut session = quiet_session();
        session.start();
        let input = TickInput {
            right: true,
            ..Default::default()
        };
        session.frame(5000.0, &input);
        assert_eq!(session.state.player.pos, Vec2::ZERO);
        let snapshot = session.frame(5100.0, &input);
        assert!((snapshot.player.pos.x - 20.0).abs() < 1e-3);
    }

    #[test]
    fn test_level_up_flow() {
        let mut session = quiet_session();
        session.start();
        for _ in 0..4 {
            let id = session.state.ids.next_id();
            session
                .state
                .pickups
                .push(Pickup::new(id, PickupKind::XpGem, Vec2::new(1.0, 0.0), 25));
        }

        session.step(0.016, &TickInput::default());
        assert_eq!(session.phase(), GamePhase::LevelUp);
        assert_eq!(session.progression.level(), 2);
        assert_eq!(session.state.player_level, 2);
        assert_eq!(session.offers().len(), 3);

        // Frozen while choosing
        let ticks = session.state.time_ticks;
        session.step(0.016, &TickInput::default());
        assert_eq!(session.state.time_ticks, ticks);

        let chosen = session.choose_upgrade(0).unwrap();
        assert_eq!(session.phase(), GamePhase::Playing);
        if let Upgrade::Weapon { id, level } = chosen {
            assert_eq!(session.state.weapons.level_of(id), Some(level));
        }
    }

    #[test]
    fn test_game_over_stops_simulation() {
        let mut session = quiet_session();
        session.start();
        let id = session.state.spawn_monster_at(MonsterKind::Golem, Vec2::ZERO);
        session.state.monsters.get_mut(id).unwrap().damage = 1_000.0;

        session.step(0.2, &TickInput::default());
        assert_eq!(session.phase(), GamePhase::GameOver);
        let over_events = session
            .events()
            .iter()
            .filter(|e| matches!(e, SimEvent::PlayerDamaged { remaining_hp, .. } if *remaining_hp <= 0.0))
            .count();
        assert_eq!(over_events, 1);

        let ticks = session.state.time_ticks;
        session.step(0.2, &TickInput::default());
        assert_eq!(session.state.time_ticks, ticks);
        assert!(session.events().is_empty());
    }

    #[test]
    fn test_reset_returns_to_start() {
        let mut session = quiet_session();
        session.start();
        session.state.spawn_monster_at(MonsterKind::Bat, Vec2::new(300.0, 0.0));
        session.step(0.1, &TickInput::default());

        session.reset();
        assert_eq!(session.phase(), GamePhase::Start);
        assert_eq!(session.state.entity_count(), 0);
        assert_eq!(session.state.player.pos, Vec2::ZERO);
        assert_eq!(session.report().kills, 0);

        assert!(session.restart());
        assert_eq!(session.phase(), GamePhase::Playing);
    }

    #[test]
    fn test_pause_freezes_world() {
        let mut session = quiet_session();
        session.start();
        assert!(session.toggle_pause());
        session.step(1.0, &TickInput::default());
        assert_eq!(session.state.time_ticks, 0);
        assert!(session.toggle_pause());
        session.step(1.0, &TickInput::default());
        assert_eq!(session.state.time_ticks, 1);
    }
}
