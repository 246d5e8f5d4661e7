//! Transform component and utilities for spatial positioning.

use glam::{Mat4, Quat, Vec3};

/// A 3D transform representing position, rotation, and scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Create a new transform at the given position.
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform from all three parts.
    pub fn new(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Decompose an affine matrix. Shear is lost.
    pub fn from_matrix(matrix: Mat4) -> Self {
        let (scale, rotation, position) = matrix.to_scale_rotation_translation();
        Self {
            position,
            rotation: rotation.normalize(),
            scale,
        }
    }

    /// Compose position, rotation and scale into one model matrix.
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Left-multiply this transform by `matrix` and store the decomposed result.
    pub fn apply_matrix(&mut self, matrix: Mat4) {
        *self = Self::from_matrix(matrix * self.to_matrix());
    }

    /// Rotate in world space: `rotation = delta * rotation`.
    ///
    /// Re-normalized every call so long-running accumulation stays a unit quaternion.
    pub fn premultiply_rotation(&mut self, delta: Quat) {
        self.rotation = (delta * self.rotation).normalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_roundtrip_keeps_non_uniform_scale() {
        let t = Transform::new(
            Vec3::new(27.0, -10.0, 5.0),
            Quat::from_xyzw(0.0, 1.0, 0.0, 0.0),
            Vec3::new(0.05, 0.03, 0.05),
        );
        let back = Transform::from_matrix(t.to_matrix());
        assert!((back.position - t.position).length() < 1e-4);
        assert!((back.scale - t.scale).length() < 1e-5);
        assert!(back.rotation.dot(t.rotation).abs() > 0.9999);
    }

    #[test]
    fn apply_matrix_composes_onto_existing_local() {
        let mut t = Transform::from_position(Vec3::new(1.0, 0.0, 0.0));
        t.apply_matrix(Mat4::from_scale_rotation_translation(
            Vec3::splat(2.0),
            Quat::IDENTITY,
            Vec3::new(0.0, 3.0, 0.0),
        ));
        assert!((t.position - Vec3::new(2.0, 3.0, 0.0)).length() < 1e-5);
        assert!((t.scale - Vec3::splat(2.0)).length() < 1e-5);
    }

    #[test]
    fn premultiply_stays_unit_length() {
        let mut t = Transform::default();
        let spin = Quat::from_euler(glam::EulerRot::XYZ, 0.009, 0.004, 0.007);
        for _ in 0..100_000 {
            t.premultiply_rotation(spin);
        }
        assert!((t.rotation.length() - 1.0).abs() < 1e-5);
    }
}
