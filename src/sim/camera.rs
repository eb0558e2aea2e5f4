//! Camera projection
//!
//! The camera is derived from the player's position each tick and never
//! feeds back into the simulation.

use glam::Vec2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// World position of the viewport's top-left corner
    pub offset: Vec2,
}

impl Camera {
    /// Center the viewport on `target`
    pub fn follow(&mut self, target: Vec2, viewport: Vec2) {
        self.offset = target - viewport / 2.0;
    }

    #[inline]
    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        world - self.offset
    }

    #[inline]
    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        screen + self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_lands_mid_screen() {
        let mut camera = Camera::default();
        let viewport = Vec2::new(800.0, 600.0);
        let player = Vec2::new(1000.0, -250.0);
        camera.follow(player, viewport);
        assert_eq!(camera.offset, Vec2::new(600.0, -550.0));
        assert_eq!(camera.world_to_screen(player), viewport / 2.0);
        assert_eq!(camera.screen_to_world(viewport / 2.0), player);
    }
}
