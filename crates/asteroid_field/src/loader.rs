//! Loading of the shared rock model and sound clip.
//!
//! Both resources are fetched exactly once, model first, before any asteroid
//! exists. Either failure aborts population; nothing is retried.

use crate::config::FieldConfig;
use crate::error::LoadError;
use audio::SoundBuffer;
use engine_core::{MeshAsset, NodeTemplate, Quat, Transform, Vec3, VisualModel};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Everything the generator needs, resolved.
#[derive(Debug, Clone)]
pub struct SharedResources {
    pub model: VisualModel,
    pub audio: SoundBuffer,
}

/// Where models and clips come from.
#[allow(async_fn_in_trait)]
pub trait AssetSource {
    async fn load_model(&self, url: &str) -> Result<VisualModel, LoadError>;
    async fn load_audio(&self, url: &str) -> Result<SoundBuffer, LoadError>;
}

/// Fetch the model, then the clip. Resolves only when both succeed.
pub async fn load_shared_resources<S: AssetSource>(
    source: &S,
    config: &FieldConfig,
) -> Result<SharedResources, LoadError> {
    let model = source.load_model(&config.model_url).await?;
    if model.primary_mesh().is_none() {
        return Err(LoadError::MeshlessModel(config.model_url.clone()));
    }
    log::info!("Loaded model {} from {}", model.name, config.model_url);

    let audio = source.load_audio(&config.audio_url).await?;
    log::info!("Loaded audio clip {}", audio.label());

    Ok(SharedResources { model, audio })
}

/// Serves assets from a directory on disk.
#[derive(Debug, Clone)]
pub struct FileAssetSource {
    root: PathBuf,
}

impl FileAssetSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map a url to a path. Relative paths resolve under the asset root.
    pub fn resolve(&self, url: &str) -> Result<PathBuf, LoadError> {
        let path = match url.split_once("://") {
            Some(("file", rest)) => PathBuf::from(rest),
            Some(_) => return Err(LoadError::UnsupportedScheme(url.to_string())),
            None => PathBuf::from(url),
        };
        Ok(if path.is_absolute() {
            path
        } else {
            self.root.join(path)
        })
    }
}

impl AssetSource for FileAssetSource {
    async fn load_model(&self, url: &str) -> Result<VisualModel, LoadError> {
        let path = self.resolve(url)?;
        let (document, buffers, _images) =
            gltf::import(&path).map_err(|source| LoadError::Model {
                url: url.to_string(),
                source,
            })?;
        Ok(model_from_gltf(&document, &buffers, &path))
    }

    async fn load_audio(&self, url: &str) -> Result<SoundBuffer, LoadError> {
        let path = self.resolve(url)?;
        SoundBuffer::from_file(&path).map_err(|source| LoadError::Audio {
            url: url.to_string(),
            source,
        })
    }
}

/// Build a node template tree from the document's default scene.
fn model_from_gltf(document: &gltf::Document, buffers: &[gltf::buffer::Data], path: &Path) -> VisualModel {
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".to_string());

    let mut meshes = HashMap::new();
    let mut root = NodeTemplate::new(name.clone());
    if let Some(scene) = document.default_scene().or_else(|| document.scenes().next()) {
        for node in scene.nodes() {
            root.children.push(node_template(&node, buffers, &mut meshes));
        }
    }
    VisualModel::new(name, root)
}

fn node_template(
    node: &gltf::Node,
    buffers: &[gltf::buffer::Data],
    meshes: &mut HashMap<usize, Arc<MeshAsset>>,
) -> NodeTemplate {
    let (translation, rotation, scale) = node.transform().decomposed();
    let mut template = NodeTemplate::new(
        node.name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("node_{}", node.index())),
    );
    template.transform = Transform::new(
        Vec3::from(translation),
        Quat::from_array(rotation),
        Vec3::from(scale),
    );
    template.mesh = node.mesh().map(|mesh| {
        meshes
            .entry(mesh.index())
            .or_insert_with(|| Arc::new(mesh_asset(&mesh, buffers)))
            .clone()
    });
    template.children = node
        .children()
        .map(|child| node_template(&child, buffers, meshes))
        .collect();
    template
}

/// First primitive only; rock models ship a single one.
fn mesh_asset(mesh: &gltf::Mesh, buffers: &[gltf::buffer::Data]) -> MeshAsset {
    let mut asset = MeshAsset {
        name: mesh
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("mesh_{}", mesh.index())),
        ..Default::default()
    };
    let Some(primitive) = mesh.primitives().next() else {
        return asset;
    };

    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| &data.0[..]));
    if let Some(positions) = reader.read_positions() {
        asset.positions = positions.map(Vec3::from).collect();
    }
    let flat: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..asset.positions.len() as u32).collect(),
    };
    asset.indices = flat
        .chunks_exact(3)
        .map(|tri| [tri[0], tri[1], tri[2]])
        .collect();
    asset.textured = primitive
        .material()
        .pbr_metallic_roughness()
        .base_color_texture()
        .is_some();
    asset
}
