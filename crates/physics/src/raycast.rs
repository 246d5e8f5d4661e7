//! Raycasting for ground probes.

use crate::PhysicsWorld;
use engine_core::{Quat, Vec3};
use rapier3d::prelude::*;

/// Result of a raycast query.
#[derive(Debug, Clone, Copy)]
pub struct RaycastHit {
    /// The collider that was hit.
    pub collider: ColliderHandle,
    /// Distance along the ray to the hit point.
    pub distance: f32,
    /// World position of the hit.
    pub point: Vec3,
    /// Surface normal at the hit point.
    pub normal: Vec3,
}

/// Orientation whose forward (-Z) axis points straight down.
pub fn down_orientation() -> Quat {
    Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2)
}

impl PhysicsWorld {
    /// Cast a ray and return the first hit.
    pub fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RaycastHit> {
        self.raycast_excluding(origin, direction, max_distance, None)
    }

    /// Cast a ray, skipping every collider attached to `exclude`.
    pub fn raycast_excluding(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        exclude: Option<RigidBodyHandle>,
    ) -> Option<RaycastHit> {
        let ray = Ray::new(
            point![origin.x, origin.y, origin.z],
            vector![direction.x, direction.y, direction.z],
        );

        let mut filter = QueryFilter::default();
        if let Some(body) = exclude {
            filter = filter.exclude_rigid_body(body);
        }

        self.query_pipeline
            .cast_ray_and_get_normal(
                &self.rigid_body_set,
                &self.collider_set,
                &ray,
                max_distance,
                true,
                filter,
            )
            .map(|(collider, intersection)| {
                let point = ray.point_at(intersection.time_of_impact);
                RaycastHit {
                    collider,
                    distance: intersection.time_of_impact,
                    point: Vec3::new(point.x, point.y, point.z),
                    normal: Vec3::new(
                        intersection.normal.x,
                        intersection.normal.y,
                        intersection.normal.z,
                    ),
                }
            })
    }

    /// Cast along the forward (-Z) axis of `orientation`.
    pub fn raycast_oriented(
        &self,
        origin: Vec3,
        orientation: Quat,
        max_distance: f32,
        exclude: Option<RigidBodyHandle>,
    ) -> Option<RaycastHit> {
        let direction = (orientation * Vec3::NEG_Z).normalize();
        self.raycast_excluding(origin, direction, max_distance, exclude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn down_orientation_points_down() {
        let dir = down_orientation() * Vec3::NEG_Z;
        assert!((dir - Vec3::NEG_Y).length() < 1e-6);
    }

    #[test]
    fn oriented_ray_hits_floor_and_skips_excluded_body() {
        let mut physics = PhysicsWorld::new();
        physics.add_static_cuboid(Vec3::ZERO, Vec3::new(5.0, 0.5, 5.0));
        let (body, _) = physics.add_character_controller(Vec3::new(0.0, 3.0, 0.0), 0.9, 0.3);
        physics.update_query_pipeline();

        let hit = physics
            .raycast_oriented(Vec3::new(0.0, 3.0, 0.0), down_orientation(), 100.0, Some(body))
            .expect("floor below");
        assert!((hit.distance - 2.5).abs() < 1e-3);
        assert!((hit.point.y - 0.5).abs() < 1e-3);

        let miss = physics.raycast_oriented(Vec3::new(50.0, 3.0, 0.0), down_orientation(), 100.0, Some(body));
        assert!(miss.is_none());
    }
}
