//! Headless scene graph backed by a hecs world.
//!
//! Nodes are hecs entities carrying a local [`Transform`], a [`GlobalTransform`],
//! [`Parent`]/[`Children`] links and a [`Name`]. Drawable nodes also carry a
//! [`MeshRenderer`] whose GPU allocations are tracked in [`GpuResources`] so that
//! teardown can be verified without a renderer.

use crate::components::{
    Children, GlobalTransform, GpuResourceId, GpuResourceKind, MeshRenderer, Name, Parent,
};
use crate::model::{MeshAsset, NodeTemplate, VisualModel};
use crate::transform::Transform;
use glam::{Mat4, Vec3};
use hecs::{Entity, World};
use std::collections::HashMap;

/// Bookkeeping for GPU-side allocations.
#[derive(Debug, Default)]
pub struct GpuResources {
    next_id: u32,
    live: HashMap<GpuResourceId, GpuResourceKind>,
}

impl GpuResources {
    pub fn allocate(&mut self, kind: GpuResourceKind) -> GpuResourceId {
        self.next_id += 1;
        let id = GpuResourceId(self.next_id);
        self.live.insert(id, kind);
        id
    }

    /// Release an allocation. Returns false if it was already released.
    pub fn release(&mut self, id: GpuResourceId) -> bool {
        self.live.remove(&id).is_some()
    }

    pub fn is_live(&self, id: GpuResourceId) -> bool {
        self.live.contains_key(&id)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn live_of(&self, kind: GpuResourceKind) -> usize {
        self.live.values().filter(|k| **k == kind).count()
    }
}

/// A cloned model living in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelInstance {
    /// Root of the cloned hierarchy.
    pub root: Entity,
    /// The drawable node, captured while cloning.
    pub mesh: Option<Entity>,
}

/// The scene graph.
pub struct Scene {
    world: World,
    root: Entity,
    resources: GpuResources,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        let mut world = World::new();
        let root = world.spawn((
            Name("scene".to_string()),
            Transform::default(),
            GlobalTransform::default(),
            Children::default(),
        ));
        Self {
            world,
            root,
            resources: GpuResources::default(),
        }
    }

    pub fn root(&self) -> Entity {
        self.root
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn resources(&self) -> &GpuResources {
        &self.resources
    }

    pub fn contains(&self, node: Entity) -> bool {
        self.world.contains(node)
    }

    /// Number of nodes, root included.
    pub fn node_count(&self) -> u32 {
        self.world.len()
    }

    pub fn name(&self, node: Entity) -> Option<String> {
        self.world.get::<&Name>(node).ok().map(|n| n.0.clone())
    }

    pub fn set_name(&mut self, node: Entity, name: impl Into<String>) {
        if let Ok(mut n) = self.world.get::<&mut Name>(node) {
            n.0 = name.into();
        }
    }

    /// Spawn an empty node under `parent`.
    pub fn spawn_node(&mut self, name: impl Into<String>, transform: Transform, parent: Entity) -> Entity {
        let node = self.world.spawn((
            Name(name.into()),
            transform,
            GlobalTransform::default(),
            Children::default(),
        ));
        self.attach(node, parent);
        node
    }

    /// Re-parent `child` under `parent`.
    pub fn attach(&mut self, child: Entity, parent: Entity) {
        self.unlink_from_parent(child);
        if let Ok(mut children) = self.world.get::<&mut Children>(parent) {
            children.0.push(child);
        }
        let _ = self.world.insert_one(child, Parent(parent));
    }

    pub fn parent(&self, node: Entity) -> Option<Entity> {
        self.world.get::<&Parent>(node).ok().map(|p| p.0)
    }

    pub fn children(&self, node: Entity) -> Vec<Entity> {
        self.world
            .get::<&Children>(node)
            .map(|c| c.0.clone())
            .unwrap_or_default()
    }

    pub fn local_transform(&self, node: Entity) -> Option<Transform> {
        self.world.get::<&Transform>(node).ok().map(|t| *t)
    }

    /// Mutable access to a node's local transform.
    pub fn local_transform_mut(&mut self, node: Entity) -> Option<hecs::RefMut<'_, Transform>> {
        self.world.get::<&mut Transform>(node).ok()
    }

    pub fn world_matrix(&self, node: Entity) -> Option<Mat4> {
        self.world.get::<&GlobalTransform>(node).ok().map(|g| g.0)
    }

    pub fn world_position(&self, node: Entity) -> Option<Vec3> {
        self.world
            .get::<&GlobalTransform>(node)
            .ok()
            .map(|g| g.translation())
    }

    /// Recompute every world matrix from the root down.
    pub fn update_world_transforms(&mut self) {
        let mut stack = vec![(self.root, Mat4::IDENTITY)];
        while let Some((node, parent_world)) = stack.pop() {
            let local = self
                .world
                .get::<&Transform>(node)
                .map(|t| t.to_matrix())
                .unwrap_or(Mat4::IDENTITY);
            let world = parent_world * local;
            if let Ok(mut global) = self.world.get::<&mut GlobalTransform>(node) {
                global.0 = world;
            }
            if let Ok(children) = self.world.get::<&Children>(node) {
                stack.extend(children.0.iter().map(|&c| (c, world)));
            }
        }
    }

    /// Clone `model` under `parent`, applying `placement` on top of the template root's local transform.
    pub fn instantiate(&mut self, model: &VisualModel, parent: Entity, placement: Mat4) -> ModelInstance {
        let mut mesh = None;
        let root = self.spawn_template(&model.root, parent, &mut mesh);
        if let Some(mut local) = self.local_transform_mut(root) {
            local.apply_matrix(placement);
        }
        ModelInstance { root, mesh }
    }

    fn spawn_template(
        &mut self,
        template: &NodeTemplate,
        parent: Entity,
        first_mesh: &mut Option<Entity>,
    ) -> Entity {
        let node = self.spawn_node(template.name.clone(), template.transform, parent);
        if let Some(asset) = &template.mesh {
            let renderer = self.upload_mesh(asset);
            let _ = self.world.insert_one(node, renderer);
            first_mesh.get_or_insert(node);
        }
        for child in &template.children {
            self.spawn_template(child, node, first_mesh);
        }
        node
    }

    /// Allocate GPU resources for a mesh asset.
    pub fn upload_mesh(&mut self, asset: &MeshAsset) -> MeshRenderer {
        MeshRenderer {
            geometry: self.resources.allocate(GpuResourceKind::Geometry),
            material: self.resources.allocate(GpuResourceKind::Material),
            texture: asset
                .textured
                .then(|| self.resources.allocate(GpuResourceKind::Texture)),
        }
    }

    /// Release texture, material and geometry. Already-released ids are skipped.
    pub fn release_mesh(&mut self, renderer: &MeshRenderer) -> usize {
        let mut released = 0;
        if let Some(texture) = renderer.texture {
            released += usize::from(self.resources.release(texture));
        }
        released += usize::from(self.resources.release(renderer.material));
        released += usize::from(self.resources.release(renderer.geometry));
        released
    }

    /// Strip a node's mesh and free its GPU resources. Returns false if there was nothing to free.
    pub fn dispose_mesh(&mut self, node: Entity) -> bool {
        match self.world.remove_one::<MeshRenderer>(node) {
            Ok(renderer) => {
                self.release_mesh(&renderer);
                true
            }
            Err(_) => false,
        }
    }

    pub fn mesh_renderer(&self, node: Entity) -> Option<MeshRenderer> {
        self.world.get::<&MeshRenderer>(node).ok().map(|m| *m)
    }

    /// Remove a node and its subtree. Any meshes still attached are disposed too.
    /// Returns false if the node was already gone. The root cannot be despawned.
    pub fn despawn(&mut self, node: Entity) -> bool {
        if node == self.root || !self.world.contains(node) {
            log::debug!("Skipping despawn of {:?}: root or already gone", node);
            return false;
        }
        self.unlink_from_parent(node);
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            stack.extend(self.children(current));
            self.dispose_mesh(current);
            let _ = self.world.despawn(current);
        }
        true
    }

    fn unlink_from_parent(&mut self, node: Entity) {
        if let Some(parent) = self.parent(node) {
            if let Ok(mut siblings) = self.world.get::<&mut Children>(parent) {
                siblings.0.retain(|&c| c != node);
            }
        }
    }
}
