//! Error types for loading and populating the field.

use thiserror::Error;

/// A shared resource could not be fetched. Population is abandoned; there is no retry.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("unsupported asset url {0:?} (only local paths and file:// are served)")]
    UnsupportedScheme(String),

    #[error("failed to load model {url}")]
    Model {
        url: String,
        #[source]
        source: gltf::Error,
    },

    #[error("model {0} has no mesh to instantiate")]
    MeshlessModel(String),

    #[error("failed to load audio {url}")]
    Audio {
        url: String,
        #[source]
        source: audio::kira::sound::FromFileError,
    },
}

/// Lifecycle violations of the asteroid field.
#[derive(Debug, Error)]
pub enum FieldError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("field has already been populated")]
    AlreadyPopulated,

    #[error("field was torn down")]
    TornDown,

    #[error("shared resources failed to load; field stays empty")]
    LoadFailed,

    #[error("audio: {0}")]
    Audio(String),
}
