//! Scene graph components stored on hecs entities.

use glam::Mat4;
use hecs::Entity;

/// Human-readable node name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name(pub String);

/// Parent link for every node except the scene root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parent(pub Entity);

/// Ordered child links.
#[derive(Debug, Clone, Default)]
pub struct Children(pub Vec<Entity>);

/// World matrix, recomputed by `Scene::update_world_transforms`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobalTransform(pub Mat4);

impl Default for GlobalTransform {
    fn default() -> Self {
        Self(Mat4::IDENTITY)
    }
}

impl GlobalTransform {
    pub fn translation(&self) -> glam::Vec3 {
        self.0.w_axis.truncate()
    }
}

/// Kind of GPU-side allocation tracked by the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GpuResourceKind {
    Geometry,
    Material,
    Texture,
}

/// Opaque id of one GPU allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GpuResourceId(pub u32);

/// GPU resources backing one drawable mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshRenderer {
    pub geometry: GpuResourceId,
    pub material: GpuResourceId,
    /// Base-colour map, if the material has one.
    pub texture: Option<GpuResourceId>,
}
