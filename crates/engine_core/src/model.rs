//! Visual model templates: loaded once, instantiated many times.

use crate::transform::Transform;
use glam::Vec3;
use std::sync::Arc;

/// CPU-side mesh data shared by every instance of a model.
#[derive(Debug, Clone, Default)]
pub struct MeshAsset {
    pub name: String,
    pub positions: Vec<Vec3>,
    pub indices: Vec<[u32; 3]>,
    /// Whether the material samples a base-colour texture.
    pub textured: bool,
}

impl MeshAsset {
    /// Axis-aligned cube centred at the origin. Stand-in rock for headless runs and tests.
    pub fn cube(half: f32) -> Self {
        let positions = (0..8)
            .map(|i| {
                Vec3::new(
                    if i & 1 == 0 { -half } else { half },
                    if i & 2 == 0 { -half } else { half },
                    if i & 4 == 0 { -half } else { half },
                )
            })
            .collect();

        #[rustfmt::skip]
        let indices = vec![
            [0, 2, 1], [1, 2, 3], // -Z
            [4, 5, 6], [5, 7, 6], // +Z
            [0, 1, 4], [1, 5, 4], // -Y
            [2, 6, 3], [3, 6, 7], // +Y
            [0, 4, 2], [2, 4, 6], // -X
            [1, 3, 5], [3, 7, 5], // +X
        ];

        Self {
            name: "cube".to_string(),
            positions,
            indices,
            textured: true,
        }
    }

    /// Min/max corners of the vertex positions.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.positions.first()?;
        Some(self.positions.iter().fold((first, first), |(lo, hi), p| {
            (lo.min(*p), hi.max(*p))
        }))
    }
}

/// One node of a model hierarchy.
#[derive(Debug, Clone, Default)]
pub struct NodeTemplate {
    pub name: String,
    pub transform: Transform,
    pub mesh: Option<Arc<MeshAsset>>,
    pub children: Vec<NodeTemplate>,
}

impl NodeTemplate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_mesh(mut self, mesh: Arc<MeshAsset>) -> Self {
        self.mesh = Some(mesh);
        self
    }

    pub fn with_child(mut self, child: NodeTemplate) -> Self {
        self.children.push(child);
        self
    }

    /// First mesh-bearing node, depth-first, along with its name.
    pub fn primary_mesh(&self) -> Option<(&str, &Arc<MeshAsset>)> {
        if let Some(mesh) = &self.mesh {
            return Some((self.name.as_str(), mesh));
        }
        self.children.iter().find_map(NodeTemplate::primary_mesh)
    }
}

/// A loaded scene-graph fragment.
#[derive(Debug, Clone)]
pub struct VisualModel {
    pub name: String,
    pub root: NodeTemplate,
}

impl VisualModel {
    pub fn new(name: impl Into<String>, root: NodeTemplate) -> Self {
        Self {
            name: name.into(),
            root,
        }
    }

    /// Wrap a single mesh three groups deep, the shape exported glTF rocks usually have.
    pub fn nested_mesh(name: impl Into<String>, mesh: MeshAsset) -> Self {
        let name = name.into();
        let leaf = NodeTemplate::new(format!("{}_mesh", mesh.name)).with_mesh(Arc::new(mesh));
        let root = NodeTemplate::new(name.clone()).with_child(
            NodeTemplate::new("Sketchfab_model")
                .with_child(NodeTemplate::new("RootNode").with_child(leaf)),
        );
        Self::new(name, root)
    }

    pub fn primary_mesh(&self) -> Option<&Arc<MeshAsset>> {
        self.root.primary_mesh().map(|(_, mesh)| mesh)
    }
}
