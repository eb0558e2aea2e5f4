//! Circle-circle collision tests and resolution
//!
//! Every overlap test in the game is circle vs circle: two entities touch
//! when the distance between centers is less than the average of their
//! sizes (diameters).

use glam::Vec2;

use super::entity::{EntityId, Monster, MonsterKind, Player, Projectile};
use super::store::EntityStore;

/// Check if two circles given by center and diameter overlap
#[inline]
pub fn circles_overlap(a: Vec2, size_a: f32, b: Vec2, size_b: f32) -> bool {
    a.distance(b) < (size_a + size_b) / 2.0
}

/// A monster killed during projectile resolution
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kill {
    pub monster_id: EntityId,
    pub kind: MonsterKind,
    pub pos: Vec2,
}

/// Nearest live monster to `origin` by squared distance.
/// Ties go to the first monster in iteration order.
pub fn nearest_monster(origin: Vec2, monsters: &EntityStore<Monster>) -> Option<&Monster> {
    let mut closest: Option<&Monster> = None;
    let mut min_dist = f32::INFINITY;
    for monster in monsters.iter().filter(|m| !m.dead) {
        let dist = monster.pos.distance_squared(origin);
        if dist < min_dist {
            min_dist = dist;
            closest = Some(monster);
        }
    }
    closest
}

/// Up to `count` live monsters sorted by squared distance from `origin`.
/// The sort is stable, so ties keep iteration order.
pub fn nearest_monsters(origin: Vec2, monsters: &EntityStore<Monster>, count: usize) -> Vec<&Monster> {
    let mut live: Vec<&Monster> = monsters.iter().filter(|m| !m.dead).collect();
    live.sort_by(|a, b| a.pos.distance_squared(origin).total_cmp(&b.pos.distance_squared(origin)));
    live.truncate(count);
    live
}

/// Resolve every projectile against every live monster.
///
/// Each (projectile, monster) pair can deal damage at most once; a
/// projectile stops hitting as soon as its penetration runs out.
pub fn resolve_projectile_hits(
    projectiles: &mut EntityStore<Projectile>,
    monsters: &mut EntityStore<Monster>,
) -> Vec<Kill> {
    let mut kills = Vec::new();

    for projectile in projectiles.iter_mut() {
        if !projectile.can_hit() {
            continue;
        }

        for monster in monsters.iter_mut() {
            if monster.dead {
                continue;
            }
            if !circles_overlap(projectile.pos, projectile.size, monster.pos, monster.size) {
                continue;
            }

            if let Some(true) = projectile.on_hit(monster) {
                kills.push(Kill {
                    monster_id: monster.id,
                    kind: monster.kind,
                    pos: monster.pos,
                });
            }

            if !projectile.can_hit() {
                break;
            }
        }
    }

    kills
}

/// Contact damage a monster deals to the player this frame, if touching.
/// Damage is continuous: `damage per second × dt`, with no hit cooldown.
pub fn monster_contact_damage(monster: &Monster, player: &Player, dt: f32) -> Option<f32> {
    if monster.dead {
        return None;
    }
    if circles_overlap(monster.pos, monster.size, player.pos, player.size) {
        Some(monster.damage * dt)
    } else {
        None
    }
}
