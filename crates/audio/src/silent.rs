//! Device-free audio backend.

use crate::{EmitterId, EmitterParams, SoundBuffer, SpatialAudio};
use engine_core::{Quat, Vec3};
use std::collections::HashMap;

/// Emitter state kept by [`SilentAudio`].
#[derive(Debug, Clone)]
pub struct SilentEmitter {
    pub position: Vec3,
    pub params: EmitterParams,
    pub clip: String,
}

/// Tracks listener and emitters exactly like a real backend, but produces no sound.
#[derive(Debug, Default)]
pub struct SilentAudio {
    listener: Option<(Vec3, Quat)>,
    emitters: HashMap<EmitterId, SilentEmitter>,
    next_id: u32,
}

impl SilentAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listener(&self) -> Option<(Vec3, Quat)> {
        self.listener
    }

    pub fn emitter(&self, id: EmitterId) -> Option<&SilentEmitter> {
        self.emitters.get(&id)
    }
}

impl SpatialAudio for SilentAudio {
    fn attach_listener(&mut self, position: Vec3, orientation: Quat) -> anyhow::Result<()> {
        self.listener = Some((position, orientation));
        Ok(())
    }

    fn detach_listener(&mut self) -> bool {
        self.listener.take().is_some()
    }

    fn has_listener(&self) -> bool {
        self.listener.is_some()
    }

    fn update_listener(&mut self, position: Vec3, orientation: Quat) {
        if let Some(listener) = &mut self.listener {
            *listener = (position, orientation);
        }
    }

    fn spawn_emitter(
        &mut self,
        buffer: &SoundBuffer,
        position: Vec3,
        params: EmitterParams,
    ) -> anyhow::Result<EmitterId> {
        self.next_id += 1;
        let id = EmitterId(self.next_id);
        self.emitters.insert(
            id,
            SilentEmitter {
                position,
                params,
                clip: buffer.label().to_string(),
            },
        );
        Ok(id)
    }

    fn set_emitter_position(&mut self, id: EmitterId, position: Vec3) {
        if let Some(emitter) = self.emitters.get_mut(&id) {
            emitter.position = position;
        }
    }

    fn stop_emitter(&mut self, id: EmitterId) -> bool {
        self.emitters.remove(&id).is_some()
    }

    fn active_emitters(&self) -> usize {
        self.emitters.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emitters_stop_once() {
        let mut audio = SilentAudio::new();
        let buffer = SoundBuffer::placeholder("white-noise");
        let id = audio
            .spawn_emitter(&buffer, Vec3::ZERO, EmitterParams::default())
            .unwrap();
        audio.set_emitter_position(id, Vec3::X);
        assert_eq!(audio.emitter(id).unwrap().position, Vec3::X);
        assert!(audio.stop_emitter(id));
        assert!(!audio.stop_emitter(id));
        assert_eq!(audio.active_emitters(), 0);
    }

    #[test]
    fn listener_detach_reports_presence() {
        let mut audio = SilentAudio::new();
        assert!(!audio.detach_listener());
        audio.attach_listener(Vec3::ZERO, Quat::IDENTITY).unwrap();
        audio.update_listener(Vec3::Y, Quat::IDENTITY);
        assert_eq!(audio.listener().unwrap().0, Vec3::Y);
        assert!(audio.detach_listener());
        assert!(!audio.has_listener());
    }
}
