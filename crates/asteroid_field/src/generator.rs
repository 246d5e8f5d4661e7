//! Procedural placement of the field.
//!
//! Two waves: the hand-authored collidable placements, then a random scatter of
//! static, moving and sounding rocks on sphere shells. Planning is pure (driven
//! by one RNG) so it can be checked without a scene; [`spawn_plan`] turns a plan
//! into live asteroids.

use crate::asteroid::{Asteroid, Drift};
use crate::config::{FieldConfig, ScatterWave};
use crate::field::FieldContext;
use crate::loader::SharedResources;
use audio::{EmitterParams, SpatialAudio};
use engine_core::{Entity, Mat4, Quat, Vec3};
use rand::Rng;
use std::f32::consts::TAU;

/// Uniformly distributed unit vector.
pub fn random_direction<R: Rng>(rng: &mut R) -> Vec3 {
    let theta = rng.gen::<f32>() * TAU;
    let u = rng.gen::<f32>() * 2.0 - 1.0;
    let c = (1.0 - u * u).max(0.0).sqrt();
    Vec3::new(c * theta.cos(), u, c * theta.sin())
}

/// Uniformly distributed rotation (Shoemake's method).
pub fn random_rotation<R: Rng>(rng: &mut R) -> Quat {
    let theta1 = rng.gen::<f32>() * TAU;
    let theta2 = rng.gen::<f32>() * TAU;
    let x0 = rng.gen::<f32>();
    let r1 = (1.0 - x0).sqrt();
    let r2 = x0.sqrt();
    Quat::from_xyzw(
        r1 * theta1.sin(),
        r1 * theta1.cos(),
        r2 * theta2.sin(),
        r2 * theta2.cos(),
    )
    .normalize()
}

/// Point on the wave's sphere shell shifted by its bias, random rotation, random
/// per-axis scale in `(0, 1) / scale_divisor`.
pub fn scatter_placement<R: Rng>(rng: &mut R, wave: &ScatterWave) -> Mat4 {
    let position = random_direction(rng) * wave.radius + Vec3::splat(wave.bias);
    let rotation = random_rotation(rng);
    // A zero axis would make the placement singular.
    let scale = Vec3::new(rng.gen(), rng.gen(), rng.gen()).max(Vec3::splat(f32::EPSILON))
        / wave.scale_divisor;
    Mat4::from_scale_rotation_translation(scale, rotation, position)
}

/// Every placement of one field, in spawn order.
#[derive(Debug, Clone, Default)]
pub struct FieldPlan {
    pub fixed: Vec<Mat4>,
    pub statics: Vec<Mat4>,
    pub movers: Vec<(Mat4, Drift)>,
    pub sounders: Vec<(Mat4, Drift)>,
}

impl FieldPlan {
    pub fn generate<R: Rng>(config: &FieldConfig, rng: &mut R) -> Self {
        let fixed = config.placements.iter().map(|p| p.matrix()).collect();
        let statics = (0..config.statics.count)
            .map(|_| scatter_placement(rng, &config.statics))
            .collect();
        let movers = (0..config.movers.count)
            .map(|_| {
                let placement = scatter_placement(rng, &config.movers);
                (placement, Drift::slow(rng, &config.drift))
            })
            .collect();
        let sounders = (0..config.sounders.count)
            .map(|_| {
                let placement = scatter_placement(rng, &config.sounders);
                (placement, Drift::brisk(rng, &config.drift))
            })
            .collect();
        Self {
            fixed,
            statics,
            movers,
            sounders,
        }
    }

    pub fn len(&self) -> usize {
        self.fixed.len() + self.statics.len() + self.movers.len() + self.sounders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Instantiate a plan under `field_root`, collidables first. World transforms are
/// refreshed before returning.
pub(crate) fn spawn_plan<A: SpatialAudio>(
    plan: &FieldPlan,
    shared: &SharedResources,
    ctx: &mut FieldContext<'_, A>,
    field_root: Entity,
    emitter: EmitterParams,
) -> Vec<Asteroid> {
    let model = &shared.model;
    let mut spawned = Vec::with_capacity(plan.len());

    for &placement in &plan.fixed {
        spawned.push(Asteroid::spawn_collidable(
            ctx.scene,
            ctx.physics,
            field_root,
            model,
            placement,
        ));
    }
    for &placement in &plan.statics {
        spawned.push(Asteroid::spawn_static(ctx.scene, field_root, model, placement));
    }
    for &(placement, drift) in &plan.movers {
        spawned.push(Asteroid::spawn_moving(ctx.scene, field_root, model, placement, drift));
    }
    for &(placement, drift) in &plan.sounders {
        spawned.push(Asteroid::spawn_sounding(
            ctx.scene,
            ctx.audio,
            field_root,
            model,
            placement,
            drift,
            &shared.audio,
            emitter,
        ));
    }

    ctx.physics.update_query_pipeline();
    ctx.scene.update_world_transforms();
    spawned
}
