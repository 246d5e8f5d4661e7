//! The local player as the field sees it.

use engine_core::{FrameTime, Quat, Transform, Vec3};
use physics::{PhysicsWorld, RigidBodyHandle};

/// Extra probe length below the feet that still counts as standing.
const GROUND_SKIN: f32 = 0.05;

/// Read-only view of the player used by the per-frame hook.
pub trait PlayerView {
    fn position(&self) -> Vec3;

    fn orientation(&self) -> Quat {
        Quat::IDENTITY
    }

    /// False while the player has no avatar in the world.
    fn has_avatar(&self) -> bool;

    /// Physics body moved by the character controller.
    fn controller(&self) -> RigidBodyHandle;

    /// Timestamp (ms) of the last frame the controller touched ground.
    fn last_grounded(&self) -> Option<u64>;
}

/// Gravity-driven kinematic player.
pub struct LocalPlayer {
    pub transform: Transform,
    pub velocity: Vec3,
    pub gravity: f32,
    pub half_height: f32,
    pub radius: f32,
    /// Whether the avatar exists in the world.
    pub embodied: bool,
    body: RigidBodyHandle,
    last_grounded: Option<u64>,
}

impl LocalPlayer {
    pub fn spawn(physics: &mut PhysicsWorld, position: Vec3) -> Self {
        let half_height = 0.9;
        let radius = 0.4;
        let (body, _) = physics.add_character_controller(position, half_height, radius);
        Self {
            transform: Transform::from_position(position),
            velocity: Vec3::ZERO,
            gravity: 20.0,
            half_height,
            radius,
            embodied: true,
            body,
            last_grounded: None,
        }
    }

    /// Integrate gravity and settle on whatever is below.
    pub fn update(&mut self, physics: &mut PhysicsWorld, frame: FrameTime) {
        // Pick up teleports made directly on the body.
        if let Some(body) = physics.get_body_transform(self.body) {
            if body.position.distance_squared(self.transform.position) > 1e-6 {
                self.transform.position = body.position;
                self.velocity = Vec3::ZERO;
            }
        }
        if !self.embodied {
            return;
        }

        let dt = frame.delta;
        self.velocity.y -= self.gravity * dt;
        let step = self.velocity * dt;
        let probe = self.half_height + step.y.abs() + GROUND_SKIN;

        let ground = physics.raycast_excluding(
            self.transform.position,
            Vec3::NEG_Y,
            probe,
            Some(self.body),
        );
        match ground {
            Some(hit) if self.velocity.y <= 0.0 => {
                self.transform.position.x += step.x;
                self.transform.position.z += step.z;
                self.transform.position.y = hit.point.y + self.half_height;
                self.velocity.y = 0.0;
                self.last_grounded = Some(frame.timestamp);
            }
            _ => self.transform.position += step,
        }

        physics.set_controller_position(self.body, self.transform.position);
    }

    pub fn is_grounded_at(&self, timestamp: u64) -> bool {
        self.last_grounded == Some(timestamp)
    }
}

impl PlayerView for LocalPlayer {
    fn position(&self) -> Vec3 {
        self.transform.position
    }

    fn orientation(&self) -> Quat {
        self.transform.rotation
    }

    fn has_avatar(&self) -> bool {
        self.embodied
    }

    fn controller(&self) -> RigidBodyHandle {
        self.body
    }

    fn last_grounded(&self) -> Option<u64> {
        self.last_grounded
    }
}
