//! Simulation module
//!
//! All per-frame gameplay lives here:
//! - One owned `SimulationState`, passed into `advance`
//! - Injected, seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod camera;
pub mod collision;
pub mod entity;
pub mod snapshot;
pub mod spawner;
pub mod state;
pub mod store;
pub mod tick;
pub mod weapon;

pub use camera::Camera;
pub use collision::{Kill, circles_overlap, nearest_monster, nearest_monsters};
pub use entity::{
    Entity, EntityId, Monster, MonsterKind, Motion, Penetration, Pickup, PickupKind, Player, PlayerStats,
    Projectile, ProjectileRole, ProjectileType,
};
pub use snapshot::RenderSnapshot;
pub use spawner::Spawner;
pub use state::{RngState, SimulationState};
pub use store::{EntityStore, IdAllocator};
pub use tick::{EventSink, SimEvent, TickInput, advance};
pub use weapon::{WeaponId, WeaponInstance, WeaponManager, parse_loadout};
