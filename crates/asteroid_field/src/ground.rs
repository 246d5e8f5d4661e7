//! What the player is standing on, and the out-of-bounds floor.

use engine_core::{Entity, Vec3};
use physics::{PhysicsWorld, RaycastHit};

/// Remembers the last game object found beneath the player.
#[derive(Debug, Clone, Copy, Default)]
pub struct GroundTracker {
    last_found: Option<Entity>,
}

impl GroundTracker {
    /// Feed one downward probe. Only counts when the controller grounded this
    /// very frame; returns the new object when it differs from the last one found.
    pub fn observe(
        &mut self,
        physics: &PhysicsWorld,
        hit: Option<&RaycastHit>,
        grounded_at: Option<u64>,
        timestamp: u64,
    ) -> Option<Entity> {
        let hit = hit?;
        if grounded_at != Some(timestamp) {
            return None;
        }
        let object = physics.object_for_collider(hit.collider)?;
        if self.last_found == Some(object) {
            return None;
        }
        log::debug!(
            "Ground object changed to {:?} ({:.2} below the player)",
            object,
            hit.distance
        );
        self.last_found = Some(object);
        Some(object)
    }

    pub fn last_found(&self) -> Option<Entity> {
        self.last_found
    }
}

/// Below `threshold` the player is sent back to `respawn`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloorGuard {
    pub threshold: f32,
    pub respawn: Vec3,
}

impl FloorGuard {
    pub fn new(threshold: f32, respawn: Vec3) -> Self {
        Self { threshold, respawn }
    }

    /// Respawn point if `position` has fallen through the floor.
    pub fn check(&self, position: Vec3) -> Option<Vec3> {
        (position.y < self.threshold).then_some(self.respawn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::World;

    fn world_with_owned_box() -> (PhysicsWorld, Entity) {
        let mut ecs = World::new();
        let owner = ecs.spawn(());
        let mut physics = PhysicsWorld::new();
        let points = [
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(1.0, -1.0, -1.0),
            Vec3::new(-1.0, 1.0, -1.0),
            Vec3::new(1.0, 1.0, -1.0),
            Vec3::new(-1.0, -1.0, 1.0),
            Vec3::new(1.0, -1.0, 1.0),
            Vec3::new(-1.0, 1.0, 1.0),
            Vec3::new(1.0, 1.0, 1.0),
        ];
        physics.add_static_hull(&points, engine_core::Mat4::IDENTITY, owner);
        physics.update_query_pipeline();
        (physics, owner)
    }

    #[test]
    fn reports_only_changes_on_grounded_frames() {
        let (physics, owner) = world_with_owned_box();
        let hit = physics.raycast(Vec3::new(0.0, 3.0, 0.0), Vec3::NEG_Y, 100.0);
        assert!(hit.is_some());

        let mut tracker = GroundTracker::default();
        // Airborne this frame.
        assert_eq!(tracker.observe(&physics, hit.as_ref(), Some(16), 33), None);
        assert_eq!(tracker.last_found(), None);

        assert_eq!(tracker.observe(&physics, hit.as_ref(), Some(33), 33), Some(owner));
        assert_eq!(tracker.observe(&physics, hit.as_ref(), Some(50), 50), None);
        assert_eq!(tracker.last_found(), Some(owner));
    }

    #[test]
    fn ignores_missing_hits_and_foreign_colliders() {
        let mut physics = PhysicsWorld::new();
        physics.add_static_cuboid(Vec3::ZERO, Vec3::splat(1.0));
        physics.update_query_pipeline();
        let hit = physics.raycast(Vec3::new(0.0, 3.0, 0.0), Vec3::NEG_Y, 100.0);

        let mut tracker = GroundTracker::default();
        assert_eq!(tracker.observe(&physics, None, Some(10), 10), None);
        assert_eq!(tracker.observe(&physics, hit.as_ref(), Some(10), 10), None);
    }

    #[test]
    fn floor_guard_triggers_strictly_below_threshold() {
        let guard = FloorGuard::new(-70.0, Vec3::new(0.0, 5.0, 0.0));
        assert_eq!(guard.check(Vec3::new(3.0, -70.0, 1.0)), None);
        assert_eq!(guard.check(Vec3::new(3.0, -75.0, 1.0)), Some(Vec3::new(0.0, 5.0, 0.0)));
    }
}
