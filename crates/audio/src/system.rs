//! Kira-backed spatial audio.

use crate::{EmitterId, EmitterParams, Rolloff, SoundBuffer, SpatialAudio};
use anyhow::Result;
use engine_core::{Quat, Vec3};
use kira::{
    manager::{backend::DefaultBackend, AudioManager, AudioManagerSettings},
    sound::static_sound::{StaticSoundHandle, StaticSoundSettings},
    spatial::{
        emitter::{EmitterDistances, EmitterHandle, EmitterSettings},
        listener::{ListenerHandle, ListenerSettings},
        scene::{SpatialSceneHandle, SpatialSceneSettings},
    },
    tween::{Easing, Tween},
};
use std::collections::HashMap;

fn mint_vec(v: Vec3) -> mint::Vector3<f32> {
    mint::Vector3 { x: v.x, y: v.y, z: v.z }
}

fn mint_quat(q: Quat) -> mint::Quaternion<f32> {
    mint::Quaternion {
        v: mint::Vector3 { x: q.x, y: q.y, z: q.z },
        s: q.w,
    }
}

/// Map web-audio style parameters onto Kira's emitter settings.
///
/// Kira needs `max > min` to build a falloff curve; exponential rolloff never
/// reaches silence at `max_distance`, so it gets a tenfold range instead.
fn emitter_settings(params: EmitterParams) -> EmitterSettings {
    let (max_distance, easing) = match params.rolloff {
        Rolloff::Linear => (params.max_distance.max(params.ref_distance + 0.01), Easing::Linear),
        Rolloff::Exponential => (
            params.max_distance.max(params.ref_distance * 10.0),
            Easing::OutPowi(2),
        ),
    };
    EmitterSettings::new()
        .distances(EmitterDistances {
            min_distance: params.ref_distance,
            max_distance,
        })
        .attenuation_function(Some(easing))
}

struct LiveEmitter {
    emitter: EmitterHandle,
    sound: Option<StaticSoundHandle>,
}

/// Main audio system managing the listener and positional emitters.
pub struct AudioSystem {
    manager: AudioManager,
    spatial_scene: SpatialSceneHandle,
    listener: Option<ListenerHandle>,
    emitters: HashMap<EmitterId, LiveEmitter>,
    next_id: u32,
}

impl AudioSystem {
    /// Open the default output device.
    pub fn new() -> Result<Self> {
        let mut manager = AudioManager::<DefaultBackend>::new(AudioManagerSettings::default())?;
        let spatial_scene = manager.add_spatial_scene(SpatialSceneSettings::default())?;

        Ok(Self {
            manager,
            spatial_scene,
            listener: None,
            emitters: HashMap::new(),
            next_id: 0,
        })
    }
}

impl SpatialAudio for AudioSystem {
    fn attach_listener(&mut self, position: Vec3, orientation: Quat) -> Result<()> {
        let listener = self.spatial_scene.add_listener(
            mint_vec(position),
            mint_quat(orientation),
            ListenerSettings::default(),
        )?;
        self.listener = Some(listener);
        Ok(())
    }

    fn detach_listener(&mut self) -> bool {
        // Kira removes the listener once its handle is dropped.
        self.listener.take().is_some()
    }

    fn has_listener(&self) -> bool {
        self.listener.is_some()
    }

    fn update_listener(&mut self, position: Vec3, orientation: Quat) {
        if let Some(listener) = &mut self.listener {
            listener.set_position(mint_vec(position), Tween::default());
            listener.set_orientation(mint_quat(orientation), Tween::default());
        }
    }

    fn spawn_emitter(
        &mut self,
        buffer: &SoundBuffer,
        position: Vec3,
        params: EmitterParams,
    ) -> Result<EmitterId> {
        let emitter = self
            .spatial_scene
            .add_emitter(mint_vec(position), emitter_settings(params))?;

        let sound = match buffer.data() {
            Some(data) => {
                let mut settings = StaticSoundSettings::new().output_destination(&emitter);
                if params.looping {
                    settings = settings.loop_region(0.0..);
                }
                Some(self.manager.play(data.clone().with_settings(settings))?)
            }
            None => {
                log::debug!("Emitter for {} has no samples; staying silent", buffer.label());
                None
            }
        };

        self.next_id += 1;
        let id = EmitterId(self.next_id);
        self.emitters.insert(id, LiveEmitter { emitter, sound });
        Ok(id)
    }

    fn set_emitter_position(&mut self, id: EmitterId, position: Vec3) {
        if let Some(live) = self.emitters.get_mut(&id) {
            live.emitter.set_position(mint_vec(position), Tween::default());
        }
    }

    fn stop_emitter(&mut self, id: EmitterId) -> bool {
        match self.emitters.remove(&id) {
            Some(mut live) => {
                if let Some(sound) = &mut live.sound {
                    let _ = sound.stop(Tween::default());
                }
                true
            }
            None => false,
        }
    }

    fn active_emitters(&self) -> usize {
        self.emitters.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponential_rolloff_widens_degenerate_range() {
        let settings = emitter_settings(EmitterParams::default());
        assert_eq!(settings.distances.min_distance, 5.0);
        assert_eq!(settings.distances.max_distance, 50.0);
    }

    #[test]
    fn linear_rolloff_keeps_configured_range() {
        let settings = emitter_settings(EmitterParams {
            ref_distance: 2.0,
            max_distance: 30.0,
            rolloff: Rolloff::Linear,
            looping: false,
        });
        assert_eq!(settings.distances.max_distance, 30.0);
    }
}
