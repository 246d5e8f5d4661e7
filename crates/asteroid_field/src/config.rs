//! Field configuration. Loaded from asteroid_field.ron at startup.

use audio::{EmitterParams, Rolloff};
use engine_core::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One hand-authored collidable asteroid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FixedPlacement {
    pub position: [f32; 3],
    /// Quaternion as `[x, y, z, w]`.
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
}

impl FixedPlacement {
    pub fn new(position: [f32; 3], rotation: [f32; 4], scale: [f32; 3]) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::from(self.scale),
            Quat::from_array(self.rotation).normalize(),
            Vec3::from(self.position),
        )
    }
}

/// One procedural scatter wave.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScatterWave {
    pub count: usize,
    /// Radius of the sphere shell positions are drawn on.
    pub radius: f32,
    /// Added to every component of the scattered position.
    pub bias: f32,
    /// Random per-axis scale in `[0, 1)` is divided by this.
    pub scale_divisor: f32,
}

/// Axis moving asteroids travel along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TravelAxis {
    #[default]
    X,
    Y,
    Z,
}

impl TravelAxis {
    pub fn index(self) -> usize {
        match self {
            TravelAxis::X => 0,
            TravelAxis::Y => 1,
            TravelAxis::Z => 2,
        }
    }
}

/// Motion constants shared by every moving asteroid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriftConfig {
    pub axis: TravelAxis,
    /// Crossing this coordinate (checked before moving) triggers the wrap.
    pub bound: f32,
    /// Coordinate written when the wrap fires.
    pub reset: f32,
    /// Euler spin per frame is `random() / spin_divisor` on each axis.
    pub spin_divisor: f32,
    /// Sounding asteroids draw speed uniformly from `[min, max)`.
    pub sounding_speed: [f32; 2],
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            axis: TravelAxis::X,
            bound: 300.0,
            reset: -300.0,
            spin_divisor: 100.0,
            sounding_speed: [0.5, 1.0],
        }
    }
}

/// Emitter settings in serializable form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmitterConfig {
    pub ref_distance: f32,
    pub max_distance: f32,
    pub exponential: bool,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            ref_distance: 5.0,
            max_distance: 5.0,
            exponential: true,
        }
    }
}

impl EmitterConfig {
    pub fn params(&self) -> EmitterParams {
        EmitterParams {
            ref_distance: self.ref_distance,
            max_distance: self.max_distance,
            rolloff: if self.exponential {
                Rolloff::Exponential
            } else {
                Rolloff::Linear
            },
            looping: true,
        }
    }
}

/// Every tunable of the asteroid field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Name given to the field root node.
    pub name: String,
    pub model_url: String,
    pub audio_url: String,
    pub placements: Vec<FixedPlacement>,
    pub statics: ScatterWave,
    pub movers: ScatterWave,
    pub sounders: ScatterWave,
    pub drift: DriftConfig,
    /// Below this height the player is sent back to `respawn`.
    pub floor_threshold: f32,
    pub respawn: [f32; 3],
    /// Length of the per-frame downward ground probe.
    pub ground_ray_length: f32,
    pub emitter: EmitterConfig,
    /// Fixed RNG seed; `None` draws from entropy.
    pub seed: Option<u64>,
}

fn default_placements() -> Vec<FixedPlacement> {
    let half_turn = std::f32::consts::FRAC_1_SQRT_2;
    vec![
        FixedPlacement::new([0.0, 0.0, 0.0], [0.0, 0.0, 0.0, 1.0], [0.04, 0.04, 0.04]),
        FixedPlacement::new([8.0, 0.0, 0.0], [0.0, half_turn, 0.0, half_turn], [0.03, 0.03, 0.03]),
        FixedPlacement::new([16.0, 0.0, 0.0], [0.0, 0.0, 0.0, 1.0], [0.02, 0.02, 0.02]),
        FixedPlacement::new([27.0, -10.0, 5.0], [0.0, 1.0, 0.0, 0.0], [0.05, 0.03, 0.05]),
        FixedPlacement::new([38.0, -30.0, 0.0], [0.0, 0.0, 0.0, 1.0], [0.04, 0.04, 0.04]),
        FixedPlacement::new([48.0, -40.0, -10.0], [0.0, 0.0, 0.0, 1.0], [0.04, 0.04, 0.04]),
        FixedPlacement::new([58.0, -50.0, -15.0], [0.0, 0.0, 0.0, 1.0], [0.06, 0.02, 0.06]),
    ]
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            name: "Asteroid Game".to_string(),
            model_url: "rock/scene.gltf".to_string(),
            audio_url: "audio/white-noise.mp3".to_string(),
            placements: default_placements(),
            statics: ScatterWave {
                count: 100,
                radius: 100.0,
                bias: 30.0,
                scale_divisor: 10.0,
            },
            movers: ScatterWave {
                count: 80,
                radius: 100.0,
                bias: 30.0,
                scale_divisor: 10.0,
            },
            sounders: ScatterWave {
                count: 10,
                radius: 15.0,
                bias: 10.0,
                scale_divisor: 12.0,
            },
            drift: DriftConfig::default(),
            floor_threshold: -70.0,
            respawn: [0.0, 5.0, 0.0],
            ground_ray_length: 100.0,
            emitter: EmitterConfig::default(),
            seed: None,
        }
    }
}

impl FieldConfig {
    /// Load config from `asteroid_field.ron`. If the file is missing or invalid, returns default config.
    pub fn load() -> Self {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &Path) -> Self {
        if let Ok(data) = std::fs::read_to_string(path) {
            match ron::from_str(&data) {
                Ok(c) => return c,
                Err(e) => log::warn!("Invalid config at {:?}: {}, using defaults", path, e),
            }
        }
        Self::default()
    }

    pub fn respawn_point(&self) -> Vec3 {
        Vec3::from(self.respawn)
    }

    /// Entities the generator will create.
    pub fn expected_entities(&self) -> usize {
        self.placements.len() + self.statics.count + self.movers.count + self.sounders.count
    }
}

fn config_path() -> std::path::PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| std::path::PathBuf::from("."))
        .join("asteroid_field.ron")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_constants() {
        let c = FieldConfig::default();
        assert_eq!(c.placements.len(), 7);
        assert_eq!((c.statics.count, c.movers.count, c.sounders.count), (100, 80, 10));
        assert_eq!(c.expected_entities(), 197);
        assert_eq!(c.drift.bound, 300.0);
        assert_eq!(c.drift.reset, -300.0);
        assert_eq!(c.floor_threshold, -70.0);
        assert_eq!(c.respawn_point(), Vec3::new(0.0, 5.0, 0.0));
    }

    #[test]
    fn partial_ron_fills_defaults() {
        let c: FieldConfig = ron::from_str("(name: \"Belt\", seed: Some(7))").unwrap();
        assert_eq!(c.name, "Belt");
        assert_eq!(c.seed, Some(7));
        assert_eq!(c.movers.count, 80);
    }

    #[test]
    fn missing_file_uses_defaults() {
        let c = FieldConfig::load_from(Path::new("/nonexistent/asteroid_field.ron"));
        assert_eq!(c.name, "Asteroid Game");
    }

    #[test]
    fn placement_matrix_composes_scale_rotation_translation() {
        let p = FixedPlacement::new([27.0, -10.0, 5.0], [0.0, 1.0, 0.0, 0.0], [0.05, 0.03, 0.05]);
        let (scale, _, translation) = p.matrix().to_scale_rotation_translation();
        assert!((translation - Vec3::new(27.0, -10.0, 5.0)).length() < 1e-5);
        assert!((scale - Vec3::new(0.05, 0.03, 0.05)).length() < 1e-5);
    }
}
