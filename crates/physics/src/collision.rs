//! Collision groups and filtering.

use rapier3d::prelude::*;

/// Collision groups for the asteroid field.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionGroup {
    /// Asteroids and other static geometry
    Environment = 1 << 0,
    /// Player character
    Player = 1 << 1,
}

impl CollisionGroup {
    /// Static environment: everything collides with it.
    pub fn environment() -> (Group, Group) {
        let membership = Group::from_bits_retain(Self::Environment as u32);
        let filter = Group::ALL;
        (membership, filter)
    }

    /// Player: stands on the environment only.
    pub fn player() -> (Group, Group) {
        let membership = Group::from_bits_retain(Self::Player as u32);
        let filter = Group::from_bits_retain(Self::Environment as u32);
        (membership, filter)
    }
}
