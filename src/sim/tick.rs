//! Per-frame simulation step
//!
//! `advance` runs the whole game world forward by `dt` seconds in a fixed
//! order. Later steps see what earlier steps did in the same tick.

use glam::Vec2;
use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use serde::{Deserialize, Serialize};

use super::collision::{monster_contact_damage, resolve_projectile_hits};
use super::entity::{EntityId, MonsterKind, Pickup, PickupKind};
use super::spawner::Spawner;
use super::state::SimulationState;
use super::weapon::FireContext;
use crate::tuning::DropTable;

/// Held directions for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickInput {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl TickInput {
    /// Build from the names of currently held keys (arrows or WASD)
    pub fn from_keys<'a, I>(keys: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut input = Self::default();
        for key in keys {
            match key {
                "ArrowUp" | "w" | "W" => input.up = true,
                "ArrowDown" | "s" | "S" => input.down = true,
                "ArrowLeft" | "a" | "A" => input.left = true,
                "ArrowRight" | "d" | "D" => input.right = true,
                _ => {}
            }
        }
        input
    }

    /// Raw direction in screen orientation (+Y is down). Not normalized.
    pub fn axis(&self) -> Vec2 {
        let mut axis = Vec2::ZERO;
        if self.up {
            axis.y -= 1.0;
        }
        if self.down {
            axis.y += 1.0;
        }
        if self.left {
            axis.x -= 1.0;
        }
        if self.right {
            axis.x += 1.0;
        }
        axis
    }
}

/// Events raised while advancing the simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    PlayerDamaged { amount: f32, remaining_hp: f32 },
    MonsterKilled { id: EntityId, kind: MonsterKind, pos: Vec2 },
    GainXp(u32),
    GoldCollected(u32),
    PlayerHealed { amount: f32 },
}

/// Receiver for simulation events, called synchronously during `advance`
pub trait EventSink {
    fn emit(&mut self, event: SimEvent);
}

impl EventSink for Vec<SimEvent> {
    fn emit(&mut self, event: SimEvent) {
        self.push(event);
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn emit(&mut self, event: SimEvent) {
        (**self).emit(event);
    }
}

/// Roll the drop table for a killed monster
fn roll_drop<R: Rng + ?Sized>(drops: &DropTable, rng: &mut R) -> (PickupKind, u32) {
    let weights = [drops.xp_gem_weight, drops.gold_weight, drops.health_weight];
    let kind = match WeightedIndex::<u32>::new(weights) {
        Ok(dist) => match dist.sample(rng) {
            1 => PickupKind::Gold,
            2 => PickupKind::Health,
            _ => PickupKind::XpGem,
        },
        Err(_) => PickupKind::XpGem,
    };
    let value = match kind {
        PickupKind::XpGem => drops.xp_value,
        PickupKind::Gold => drops.gold_value,
        PickupKind::Health => drops.heal_amount.max(0.0).round() as u32,
    };
    (kind, value)
}

/// Advance the simulation by `dt` seconds.
///
/// Non-finite or negative `dt` is treated as zero. Events are delivered to
/// `sink` in the order they happen.
pub fn advance<S: EventSink + ?Sized>(state: &mut SimulationState, input: &TickInput, dt: f32, sink: &mut S) {
    let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };

    // 1. Movement
    state.player.apply_input(input.axis(), dt);

    // 2. Camera
    state.camera.follow(state.player.pos, state.viewport);

    // 3. Spawning
    if state.spawner.tick(dt) {
        let id = state.ids.next_id();
        let monster = Spawner::spawn(
            id,
            state.player.pos,
            state.viewport,
            state.player_level,
            &state.tuning,
            &mut state.rng,
        );
        state.monsters.push(monster);
    }

    // 4. Weapons
    state.weapons.retire_orphans(&mut state.projectiles);
    let mut ctx = FireContext {
        player: &state.player,
        monsters: &state.monsters,
        projectiles: &mut state.projectiles,
        ids: &mut state.ids,
        rng: &mut state.rng,
    };
    state.weapons.update(dt, &mut ctx);

    // 5. Projectile motion and lifetime
    let anchor = state.player.pos;
    for projectile in state.projectiles.iter_mut() {
        projectile.advance(anchor, dt);
    }

    // 6. Projectile hits, kills and drops
    for kill in resolve_projectile_hits(&mut state.projectiles, &mut state.monsters) {
        sink.emit(SimEvent::MonsterKilled {
            id: kill.monster_id,
            kind: kill.kind,
            pos: kill.pos,
        });
        let (kind, value) = roll_drop(&state.tuning.drops, &mut state.rng);
        let id = state.ids.next_id();
        state.pickups.push(Pickup::new(id, kind, kill.pos, value));
    }

    // 7. Monster movement and contact damage
    for monster in state.monsters.iter_mut() {
        if monster.dead {
            continue;
        }
        monster.steer_toward(state.player.pos, dt);
        if let Some(damage) = monster_contact_damage(monster, &state.player, dt) {
            let taken = state.player.take_damage(damage);
            if taken > 0.0 {
                sink.emit(SimEvent::PlayerDamaged {
                    amount: taken,
                    remaining_hp: state.player.stats.current_hp,
                });
            }
        }
    }

    // 8. Pickups
    let range = state.player.stats.collection_range;
    for pickup in state.pickups.iter_mut() {
        if !pickup.update(state.player.pos, range, &state.tuning.pickup, dt) {
            continue;
        }
        match pickup.kind {
            PickupKind::XpGem => sink.emit(SimEvent::GainXp(pickup.value)),
            PickupKind::Gold => sink.emit(SimEvent::GoldCollected(pickup.value)),
            PickupKind::Health => {
                let amount = state.player.heal(pickup.value as f32);
                sink.emit(SimEvent::PlayerHealed { amount });
            }
        }
    }

    // 9. Compaction
    state.monsters.compact();
    state.projectiles.compact();
    state.pickups.compact();

    state.elapsed += dt;
    state.time_ticks += 1;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::PLAYER_MAX_HP;
    use crate::progression::{GamePhase, ProgressionController};
    use crate::sim::entity::{Penetration, Projectile, ProjectileType};
    use crate::sim::weapon::WeaponId;
    use crate::tuning::Tuning;
    use proptest::prelude::*;

    fn quiet_state(seed: u64) -> SimulationState {
        let mut tuning = Tuning::default();
        // Keep the spawner out of the way
        tuning.spawn_interval = 1_000.0;
        SimulationState::new(tuning, seed)
    }

    #[test]
    fn test_from_keys() {
        let input = TickInput::from_keys(["ArrowUp", "d", "x"]);
        assert!(input.up && input.right);
        assert!(!input.down && !input.left);
        assert_eq!(input.axis(), Vec2::new(1.0, -1.0));

        // Opposite keys cancel
        let input = TickInput::from_keys(["a", "D"]);
        assert_eq!(input.axis(), Vec2::ZERO);
    }

    #[test]
    fn test_no_input_no_movement() {
        let mut state = quiet_state(1);
        let mut events: Vec<SimEvent> = Vec::new();
        advance(&mut state, &TickInput::default(), 0.5, &mut events);
        assert_eq!(state.player.pos, Vec2::ZERO);
        assert_eq!(state.time_ticks, 1);
    }

    #[test]
    fn test_bad_dt_is_zero() {
        let mut state = quiet_state(1);
        let input = TickInput {
            right: true,
            ..Default::default()
        };
        let mut events: Vec<SimEvent> = Vec::new();
        for dt in [f32::NAN, f32::INFINITY, -1.0] {
            advance(&mut state, &input, dt, &mut events);
        }
        assert_eq!(state.player.pos, Vec2::ZERO);
        assert_eq!(state.elapsed, 0.0);
    }

    #[test]
    fn test_camera_follows_player() {
        let mut state = quiet_state(1);
        let input = TickInput {
            down: true,
            ..Default::default()
        };
        let mut events: Vec<SimEvent> = Vec::new();
        advance(&mut state, &input, 1.0, &mut events);
        assert_eq!(state.player.pos, Vec2::new(0.0, 200.0));
        assert_eq!(state.camera.offset, Vec2::new(-400.0, -100.0));
    }

    #[test]
    fn test_spawn_after_interval() {
        let mut state = SimulationState::new(Tuning::default(), 3);
        let mut events: Vec<SimEvent> = Vec::new();
        advance(&mut state, &TickInput::default(), 1.0, &mut events);
        assert!(state.monsters.is_empty());
        advance(&mut state, &TickInput::default(), 0.3, &mut events);
        assert_eq!(state.monsters.len(), 1);
        let monster = &state.monsters.as_slice()[0];
        // Monsters move in the same tick they spawn
        let expected = 560.0 - monster.speed * 0.3;
        assert!((monster.pos.length() - expected).abs() < 1e-2);
    }

    /// Feeds a real progression controller and counts how often the run ends
    struct RunWatch {
        progression: ProgressionController,
        game_overs: usize,
        events: Vec<SimEvent>,
    }

    impl EventSink for RunWatch {
        fn emit(&mut self, event: SimEvent) {
            let was_over = self.progression.is_over();
            self.progression.emit(event.clone());
            if !was_over && self.progression.is_over() {
                self.game_overs += 1;
            }
            self.events.push(event);
        }
    }

    #[test]
    fn test_game_over_scenario() {
        let mut state = quiet_state(5);
        let id = state.spawn_monster_at(MonsterKind::Zombie, Vec2::ZERO);
        state.monsters.get_mut(id).unwrap().damage = 100.0;

        let mut progression = ProgressionController::new();
        assert!(progression.start(WeaponId::Dagger));
        let mut watch = RunWatch {
            progression,
            game_overs: 0,
            events: Vec::new(),
        };

        // 100 damage/s for 10 × 0.1 s drains exactly 100 HP
        for _ in 0..9 {
            advance(&mut state, &TickInput::default(), 0.1, &mut watch);
        }
        assert_eq!(state.player.stats.current_hp, 10.0);
        assert_eq!(watch.progression.phase(), GamePhase::Playing);

        advance(&mut state, &TickInput::default(), 0.1, &mut watch);
        assert_eq!(state.player.stats.current_hp, 0.0);
        assert!(state.player.is_dead());
        assert_eq!(watch.progression.phase(), GamePhase::GameOver);
        assert_eq!(watch.game_overs, 1);

        let damaged: Vec<_> = watch
            .events
            .iter()
            .filter_map(|e| match e {
                SimEvent::PlayerDamaged { remaining_hp, .. } => Some(*remaining_hp),
                _ => None,
            })
            .collect();
        assert_eq!(damaged.len(), 10);
        assert_eq!(damaged.iter().filter(|hp| **hp <= 0.0).count(), 1);

        // Further contact at 0 HP raises nothing new
        for _ in 0..5 {
            advance(&mut state, &TickInput::default(), 0.1, &mut watch);
        }
        assert_eq!(watch.events.len(), 10);
        assert_eq!(watch.game_overs, 1);
        assert_eq!(watch.progression.phase(), GamePhase::GameOver);
    }

    #[test]
    fn test_monster_killed_this_tick_deals_no_contact_damage() {
        let mut state = quiet_state(6);
        state.tuning.drops.gold_weight = 0;
        state.tuning.drops.health_weight = 0;
        let monster = state.spawn_monster_at(MonsterKind::Bat, Vec2::ZERO);
        state.monsters.get_mut(monster).unwrap().damage = 50.0;

        // A stationary dagger sitting on the player and the bat
        let shot = state.ids.next_id();
        state.projectiles.push(Projectile::linear(
            shot,
            WeaponId::Dagger,
            ProjectileType::Linear,
            Vec2::ZERO,
            Vec2::ZERO,
            100.0,
            Penetration::Limited(1),
            2.0,
            10.0,
        ));

        let mut events: Vec<SimEvent> = Vec::new();
        advance(&mut state, &TickInput::default(), 0.1, &mut events);

        assert!(events.iter().any(|e| matches!(e, SimEvent::MonsterKilled { id, .. } if *id == monster)));
        assert!(!events.iter().any(|e| matches!(e, SimEvent::PlayerDamaged { .. })));
        assert_eq!(state.player.stats.current_hp, PLAYER_MAX_HP);
        assert!(state.monsters.is_empty());
    }

    #[test]
    fn test_surviving_monster_still_deals_contact_damage() {
        let mut state = quiet_state(6);
        let monster = state.spawn_monster_at(MonsterKind::Bat, Vec2::ZERO);
        state.monsters.get_mut(monster).unwrap().damage = 50.0;

        let mut events: Vec<SimEvent> = Vec::new();
        advance(&mut state, &TickInput::default(), 0.1, &mut events);

        assert!(events.iter().any(|e| matches!(e, SimEvent::PlayerDamaged { .. })));
        assert_eq!(state.player.stats.current_hp, PLAYER_MAX_HP - 5.0);
    }

    #[test]
    fn test_kill_drops_pickup_and_emits() {
        let mut state = quiet_state(8);
        state.tuning.drops.gold_weight = 0;
        state.tuning.drops.health_weight = 0;
        state.weapons.sync(&[(WeaponId::Bible, 1)], &state.tuning);

        // Bible cooldown is 3s; the first volley puts the books in orbit
        let mut events: Vec<SimEvent> = Vec::new();
        advance(&mut state, &TickInput::default(), 3.0, &mut events);
        let book = state.projectiles.as_slice()[0].pos;

        // A stationary bat right on top of a book dies on the next tick
        let id = state.spawn_monster_at(MonsterKind::Bat, book);
        state.monsters.get_mut(id).unwrap().speed = 0.0;
        advance(&mut state, &TickInput::default(), 0.0, &mut events);

        assert!(events.iter().any(|e| matches!(e, SimEvent::MonsterKilled { id: k, .. } if *k == id)));
        assert!(state.monsters.is_empty());
        assert_eq!(state.pickups.len(), 1);
        let pickup = &state.pickups.as_slice()[0];
        assert_eq!(pickup.kind, PickupKind::XpGem);
        assert_eq!(pickup.value, 25);
        assert_eq!(pickup.pos, book);
    }

    #[test]
    fn test_pickup_events() {
        let mut state = quiet_state(2);
        state.player.take_damage(50.0);
        for (kind, value) in [(PickupKind::XpGem, 25), (PickupKind::Gold, 1), (PickupKind::Health, 20)] {
            let id = state.ids.next_id();
            state.pickups.push(Pickup::new(id, kind, Vec2::new(5.0, 0.0), value));
        }

        let mut events: Vec<SimEvent> = Vec::new();
        advance(&mut state, &TickInput::default(), 0.016, &mut events);
        assert_eq!(
            events,
            vec![
                SimEvent::GainXp(25),
                SimEvent::GoldCollected(1),
                SimEvent::PlayerHealed { amount: 20.0 },
            ]
        );
        assert!(state.pickups.is_empty());
        assert_eq!(state.player.stats.current_hp, 70.0);
    }

    #[test]
    fn test_roll_drop_zero_weights_gives_xp() {
        use rand::SeedableRng;
        let drops = DropTable {
            xp_gem_weight: 0,
            gold_weight: 0,
            health_weight: 0,
            ..Default::default()
        };
        let mut rng = rand_pcg::Pcg32::seed_from_u64(1);
        assert_eq!(roll_drop(&drops, &mut rng), (PickupKind::XpGem, drops.xp_value));
    }

    #[test]
    fn test_determinism() {
        let run = |seed| {
            let mut state = SimulationState::new(Tuning::default(), seed);
            state.equip_starting_weapon();
            let mut events: Vec<SimEvent> = Vec::new();
            let input = TickInput {
                left: true,
                up: true,
                ..Default::default()
            };
            for _ in 0..600 {
                advance(&mut state, &input, 1.0 / 60.0, &mut events);
            }
            (state.player.pos, state.monsters.len(), state.projectiles.len(), events.len())
        };
        assert_eq!(run(99), run(99));
    }

    proptest! {
        #[test]
        fn test_advance_terminates_for_any_dt(dt in 0.0f32..100.0, seed in any::<u64>()) {
            let mut state = SimulationState::new(Tuning::default(), seed);
            state.equip_starting_weapon();
            state.spawn_monster_at(MonsterKind::Golem, Vec2::new(30.0, 0.0));
            let mut events: Vec<SimEvent> = Vec::new();
            for _ in 0..5 {
                advance(&mut state, &TickInput::default(), dt, &mut events);
            }
            prop_assert!(state.player.stats.current_hp >= 0.0);
            prop_assert_eq!(state.time_ticks, 5);
            prop_assert!(state.monsters.iter().all(|m| !m.dead));
            prop_assert!(state.projectiles.iter().all(|p| !p.expired));
        }

        #[test]
        fn test_diagonal_speed_matches_axis(dt in 0.001f32..1.0) {
            let mut straight = SimulationState::new(Tuning::default(), 0);
            let mut diagonal = SimulationState::new(Tuning::default(), 0);
            let right = TickInput { right: true, ..Default::default() };
            let down_right = TickInput { right: true, down: true, ..Default::default() };
            let mut events: Vec<SimEvent> = Vec::new();
            advance(&mut straight, &right, dt, &mut events);
            advance(&mut diagonal, &down_right, dt, &mut events);
            let a = straight.player.pos.length();
            let b = diagonal.player.pos.length();
            prop_assert!((a - b).abs() <= a * 1e-5);
        }
    }
}
