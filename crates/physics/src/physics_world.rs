//! Physics world management with Rapier3D.

use crate::collision::CollisionGroup;
use engine_core::{Entity, Mat4, Transform, Vec3};
use rapier3d::na::{self, Isometry3, Point3};
use rapier3d::prelude::*;

fn groups((membership, filter): (Group, Group)) -> InteractionGroups {
    InteractionGroups::new(membership, filter)
}

fn to_isometry(translation: Vec3, rotation: glam::Quat) -> Isometry<Real> {
    let rotation = na::UnitQuaternion::from_quaternion(na::Quaternion::new(
        rotation.w, rotation.x, rotation.y, rotation.z,
    ));
    Isometry3::from_parts(
        na::Translation3::new(translation.x, translation.y, translation.z),
        rotation,
    )
}

/// Main physics world containing all simulation state.
pub struct PhysicsWorld {
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub gravity: Vector<Real>,
    pub integration_parameters: IntegrationParameters,
    pub physics_pipeline: PhysicsPipeline,
    pub island_manager: IslandManager,
    pub broad_phase: DefaultBroadPhase,
    pub narrow_phase: NarrowPhase,
    pub impulse_joint_set: ImpulseJointSet,
    pub multibody_joint_set: MultibodyJointSet,
    pub ccd_solver: CCDSolver,
    pub query_pipeline: QueryPipeline,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    /// Create a new physics world with default gravity.
    pub fn new() -> Self {
        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            gravity: vector![0.0, -9.81, 0.0],
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
        }
    }

    /// Step the physics simulation.
    pub fn step(&mut self) {
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }

    /// Update query pipeline for raycasting. Call after adding or removing colliders.
    pub fn update_query_pipeline(&mut self) {
        self.query_pipeline.update(&self.collider_set);
    }

    /// Add a fixed collision volume approximating `points` placed by `world`.
    ///
    /// Scale is baked into the points (colliders only carry rigid isometries). The volume
    /// is the convex hull of the scaled points, or the box around them when the hull is
    /// degenerate. `owner` is stored in the collider's user data.
    pub fn add_static_hull(&mut self, points: &[Vec3], world: Mat4, owner: Entity) -> ColliderHandle {
        let (scale, rotation, translation) = world.to_scale_rotation_translation();
        let scaled: Vec<Point3<Real>> = points
            .iter()
            .map(|p| {
                let s = *p * scale;
                point![s.x, s.y, s.z]
            })
            .collect();

        let placement = to_isometry(translation, rotation);
        let builder = match ColliderBuilder::convex_hull(&scaled) {
            Some(hull) => hull.position(placement),
            None => {
                let (lo, hi) = scaled.iter().fold(
                    (Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)),
                    |(lo, hi), p| {
                        let p = Vec3::new(p.x, p.y, p.z);
                        (lo.min(p), hi.max(p))
                    },
                );
                let (lo, hi) = if lo.x > hi.x { (Vec3::ZERO, Vec3::ZERO) } else { (lo, hi) };
                let half = ((hi - lo) * 0.5).max(Vec3::splat(1e-3));
                let center = (hi + lo) * 0.5;
                ColliderBuilder::cuboid(half.x, half.y, half.z)
                    .position(placement * Isometry::translation(center.x, center.y, center.z))
            }
        };

        let collider = builder
            .collision_groups(groups(CollisionGroup::environment()))
            .user_data(u128::from(owner.to_bits().get()))
            .build();
        self.collider_set.insert(collider)
    }

    /// Add a fixed box collider (test floors, simple props).
    pub fn add_static_cuboid(&mut self, translation: Vec3, half_extents: Vec3) -> ColliderHandle {
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .translation(vector![translation.x, translation.y, translation.z])
            .collision_groups(groups(CollisionGroup::environment()))
            .build();
        self.collider_set.insert(collider)
    }

    /// Game object that owns a collider, if one was recorded.
    pub fn object_for_collider(&self, handle: ColliderHandle) -> Option<Entity> {
        let collider = self.collider_set.get(handle)?;
        u64::try_from(collider.user_data)
            .ok()
            .and_then(Entity::from_bits)
    }

    /// Remove a collider by its handle. Returns false if it was already gone.
    pub fn remove_collider(&mut self, handle: ColliderHandle) -> bool {
        let removed = self
            .collider_set
            .remove(
                handle,
                &mut self.island_manager,
                &mut self.rigid_body_set,
                true,
            )
            .is_some();
        if !removed {
            log::debug!("Collider {:?} was already removed", handle);
        }
        removed
    }

    pub fn collider_count(&self) -> usize {
        self.collider_set.len()
    }

    /// Kinematic capsule used as a character controller.
    pub fn add_character_controller(
        &mut self,
        position: Vec3,
        half_height: f32,
        radius: f32,
    ) -> (RigidBodyHandle, ColliderHandle) {
        let body = RigidBodyBuilder::kinematic_position_based()
            .translation(vector![position.x, position.y, position.z])
            .build();
        let body = self.rigid_body_set.insert(body);
        let capsule_half = (half_height - radius).max(0.0);
        let collider = ColliderBuilder::capsule_y(capsule_half, radius)
            .collision_groups(groups(CollisionGroup::player()))
            .build();
        let collider = self
            .collider_set
            .insert_with_parent(collider, body, &mut self.rigid_body_set);
        (body, collider)
    }

    /// Teleport a controller body. Takes effect immediately, not at the next step.
    pub fn set_controller_position(&mut self, handle: RigidBodyHandle, position: Vec3) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            let translation = vector![position.x, position.y, position.z];
            body.set_translation(translation, true);
            body.set_next_kinematic_translation(translation);
        }
    }

    /// Get the transform of a rigid body.
    pub fn get_body_transform(&self, handle: RigidBodyHandle) -> Option<Transform> {
        self.rigid_body_set.get(handle).map(|body| {
            let pos = body.translation();
            let rot = body.rotation();
            Transform {
                position: Vec3::new(pos.x, pos.y, pos.z),
                rotation: glam::Quat::from_xyzw(rot.i, rot.j, rot.k, rot.w),
                scale: Vec3::ONE,
            }
        })
    }
}
