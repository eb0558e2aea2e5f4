//! Render snapshot
//!
//! A read-only, serializable view of the world after a tick. Each entity
//! carries either an asset handle or a fallback color; renderers draw
//! whichever is present.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::{EntityId, MonsterKind, PickupKind, ProjectileRole, ProjectileType};
use super::state::SimulationState;
use super::weapon::WeaponId;
use crate::tuning::Tuning;

const PLAYER_COLOR: &str = "#3498db";

/// How to draw an entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appearance {
    /// Sprite handle, if the tuning provides a usable one
    pub asset: Option<String>,
    /// Fallback fill color
    pub color: String,
}

impl Appearance {
    fn resolve(tuning: &Tuning, key: &str, color: &str) -> Self {
        Self {
            asset: tuning.asset(key).map(str::to_string),
            color: color.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    pub pos: Vec2,
    pub size: f32,
    pub hp: f32,
    pub max_hp: f32,
    pub appearance: Appearance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonsterView {
    pub id: EntityId,
    pub kind: MonsterKind,
    pub pos: Vec2,
    pub size: f32,
    /// Remaining health in [0, 1]
    pub health: f32,
    pub appearance: Appearance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileView {
    pub id: EntityId,
    pub source: WeaponId,
    pub kind: ProjectileType,
    pub role: ProjectileRole,
    pub pos: Vec2,
    pub size: f32,
    pub appearance: Appearance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickupView {
    pub id: EntityId,
    pub kind: PickupKind,
    pub pos: Vec2,
    pub size: f32,
    pub appearance: Appearance,
}

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSnapshot {
    /// World position of the viewport's top-left corner
    pub camera_offset: Vec2,
    pub viewport: Vec2,
    pub player: PlayerView,
    pub monsters: Vec<MonsterView>,
    pub projectiles: Vec<ProjectileView>,
    pub pickups: Vec<PickupView>,
}

impl RenderSnapshot {
    pub fn capture(state: &SimulationState) -> Self {
        let tuning = &state.tuning;

        let player = PlayerView {
            pos: state.player.pos,
            size: state.player.size,
            hp: state.player.stats.current_hp,
            max_hp: state.player.stats.max_hp,
            appearance: Appearance::resolve(tuning, "player", PLAYER_COLOR),
        };

        let monsters = state
            .monsters
            .iter()
            .map(|m| MonsterView {
                id: m.id,
                kind: m.kind,
                pos: m.pos,
                size: m.size,
                health: if m.max_hp > 0.0 {
                    (m.hp / m.max_hp).clamp(0.0, 1.0)
                } else {
                    0.0
                },
                appearance: Appearance::resolve(tuning, m.kind.name(), &tuning.monster_stats(m.kind).color),
            })
            .collect();

        let projectiles = state
            .projectiles
            .iter()
            .map(|p| ProjectileView {
                id: p.id,
                source: p.source,
                kind: p.kind,
                role: p.role,
                pos: p.pos,
                size: p.size,
                appearance: Appearance::resolve(tuning, p.source.name(), &tuning.weapon_config(p.source).color),
            })
            .collect();

        let pickups = state
            .pickups
            .iter()
            .map(|p| PickupView {
                id: p.id,
                kind: p.kind,
                pos: p.pos,
                size: p.kind.size(),
                appearance: Appearance::resolve(tuning, p.kind.name(), p.kind.color()),
            })
            .collect();

        Self {
            camera_offset: state.camera.offset,
            viewport: state.viewport,
            player,
            monsters,
            projectiles,
            pickups,
        }
    }

    /// Total number of drawn entities, player included
    pub fn entity_count(&self) -> usize {
        1 + self.monsters.len() + self.projectiles.len() + self.pickups.len()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
