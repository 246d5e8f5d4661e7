//! Spatial audio for the asteroid field.
//!
//! [`SpatialAudio`] is the seam the field talks to. [`AudioSystem`] drives a real
//! output device through Kira; [`SilentAudio`] keeps the same bookkeeping without a
//! device, for headless hosts and tests.

mod silent;
mod system;

pub use silent::SilentAudio;
pub use system::AudioSystem;

use engine_core::{Quat, Vec3};
use kira::sound::static_sound::StaticSoundData;
use kira::sound::FromFileError;
use std::path::Path;

/// Identifier of a live emitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EmitterId(pub u32);

/// How loudness falls off with distance from an emitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rolloff {
    Linear,
    #[default]
    Exponential,
}

/// Settings for a positional sound source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmitterParams {
    /// Distance at which attenuation starts.
    pub ref_distance: f32,
    /// Distance past which the source is inaudible (ignored by exponential rolloff).
    pub max_distance: f32,
    pub rolloff: Rolloff,
    pub looping: bool,
}

impl Default for EmitterParams {
    fn default() -> Self {
        Self {
            ref_distance: 5.0,
            max_distance: 5.0,
            rolloff: Rolloff::Exponential,
            looping: true,
        }
    }
}

/// A decoded audio clip, shared by every emitter that plays it.
#[derive(Clone)]
pub struct SoundBuffer {
    label: String,
    data: Option<StaticSoundData>,
}

impl std::fmt::Debug for SoundBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoundBuffer")
            .field("label", &self.label)
            .field("decoded", &self.data.is_some())
            .finish()
    }
}

impl SoundBuffer {
    /// Decode a clip from disk.
    pub fn from_file(path: &Path) -> Result<Self, FromFileError> {
        let data = StaticSoundData::from_file(path)?;
        Ok(Self {
            label: path.display().to_string(),
            data: Some(data),
        })
    }

    /// A buffer with no samples. Emitters created from it are silent.
    pub fn placeholder(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            data: None,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn data(&self) -> Option<&StaticSoundData> {
        self.data.as_ref()
    }
}

/// Listener and emitter operations the field relies on.
pub trait SpatialAudio {
    /// Attach the listener (the player's ears). Replaces any existing listener.
    fn attach_listener(&mut self, position: Vec3, orientation: Quat) -> anyhow::Result<()>;

    /// Detach the listener. Returns false if none was attached.
    fn detach_listener(&mut self) -> bool;

    fn has_listener(&self) -> bool;

    /// Move the listener. No-op without a listener.
    fn update_listener(&mut self, position: Vec3, orientation: Quat);

    /// Start `buffer` playing from a new emitter at `position`.
    fn spawn_emitter(
        &mut self,
        buffer: &SoundBuffer,
        position: Vec3,
        params: EmitterParams,
    ) -> anyhow::Result<EmitterId>;

    fn set_emitter_position(&mut self, id: EmitterId, position: Vec3);

    /// Stop and release an emitter. Returns false if it was unknown or already stopped.
    fn stop_emitter(&mut self, id: EmitterId) -> bool;

    fn active_emitters(&self) -> usize;
}

// Re-export for convenience
pub use kira;
