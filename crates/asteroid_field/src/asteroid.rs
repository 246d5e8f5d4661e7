//! Asteroid entities: one tagged type covering every variant.
//!
//! Each asteroid owns a clone of the shared rock model parented under the field
//! root. Variants differ in what else they own:
//!
//! | Variant    | Extra ownership                         | Per-frame |
//! |------------|-----------------------------------------|-----------|
//! | Static     | nothing                                 | no        |
//! | Collidable | a fixed collision volume                | no        |
//! | Moving     | a [`Drift`]                             | yes       |
//! | Sounding   | a [`Drift`] and a looping emitter       | yes       |

use crate::config::DriftConfig;
use audio::{EmitterId, EmitterParams, SoundBuffer, SpatialAudio};
use engine_core::{Entity, EulerRot, Mat4, Quat, Scene, Transform, VisualModel};
use physics::{ColliderHandle, PhysicsWorld};
use rand::Rng;

/// Constant per-frame motion of a moving asteroid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drift {
    /// Units per frame along the travel axis.
    pub speed: f32,
    /// Rotation pre-multiplied onto the asteroid every frame.
    pub spin: Quat,
}

impl Drift {
    pub fn new(speed: f32, spin: Quat) -> Self {
        Self { speed, spin }
    }

    /// Slow drifter: speed is `random()^2`, so most rocks barely move.
    pub fn slow<R: Rng>(rng: &mut R, config: &DriftConfig) -> Self {
        let speed = rng.gen::<f32>().powi(2);
        Self::new(speed, random_spin(rng, config.spin_divisor))
    }

    /// Sounding drifter: speed uniform in `config.sounding_speed`.
    pub fn brisk<R: Rng>(rng: &mut R, config: &DriftConfig) -> Self {
        let [min, max] = config.sounding_speed;
        let speed = min + rng.gen::<f32>() * (max - min);
        Self::new(speed, random_spin(rng, config.spin_divisor))
    }

    /// Move one frame. The bound is checked *before* moving, so a rock past the
    /// bound is first snapped to `reset` and then moved by its speed.
    pub fn advance(&self, transform: &mut Transform, config: &DriftConfig) {
        let axis = config.axis.index();
        if transform.position[axis] > config.bound {
            transform.position[axis] = config.reset;
        }
        transform.position[axis] += self.speed;
        transform.premultiply_rotation(self.spin);
    }
}

fn random_spin<R: Rng>(rng: &mut R, divisor: f32) -> Quat {
    Quat::from_euler(
        EulerRot::XYZ,
        rng.gen::<f32>() / divisor,
        rng.gen::<f32>() / divisor,
        rng.gen::<f32>() / divisor,
    )
}

/// Capability tag of an asteroid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    Static,
    Collidable,
    Moving,
    Sounding,
}

/// Variant-specific state.
#[derive(Debug, Clone, PartialEq)]
pub enum AsteroidKind {
    Static,
    Collidable { collider: ColliderHandle },
    Moving { drift: Drift },
    Sounding { drift: Drift, emitter: Option<EmitterId> },
}

impl AsteroidKind {
    pub fn variant(&self) -> Variant {
        match self {
            AsteroidKind::Static => Variant::Static,
            AsteroidKind::Collidable { .. } => Variant::Collidable,
            AsteroidKind::Moving { .. } => Variant::Moving,
            AsteroidKind::Sounding { .. } => Variant::Sounding,
        }
    }

    pub fn drift(&self) -> Option<&Drift> {
        match self {
            AsteroidKind::Moving { drift } | AsteroidKind::Sounding { drift, .. } => Some(drift),
            _ => None,
        }
    }
}

/// A single rock in the field.
#[derive(Debug)]
pub struct Asteroid {
    root: Entity,
    mesh: Option<Entity>,
    kind: AsteroidKind,
}

impl Asteroid {
    fn clone_model(scene: &mut Scene, parent: Entity, model: &VisualModel, placement: Mat4) -> (Entity, Option<Entity>) {
        let instance = scene.instantiate(model, parent, placement);
        (instance.root, instance.mesh)
    }

    /// Decorative rock.
    pub fn spawn_static(scene: &mut Scene, parent: Entity, model: &VisualModel, placement: Mat4) -> Self {
        let (root, mesh) = Self::clone_model(scene, parent, model, placement);
        Self {
            root,
            mesh,
            kind: AsteroidKind::Static,
        }
    }

    /// Rock with a collision volume. The collider is owned by the asteroid's root node.
    pub fn spawn_collidable(
        scene: &mut Scene,
        physics: &mut PhysicsWorld,
        parent: Entity,
        model: &VisualModel,
        placement: Mat4,
    ) -> Self {
        let (root, mesh) = Self::clone_model(scene, parent, model, placement);
        scene.update_world_transforms();

        let world = mesh
            .or(Some(root))
            .and_then(|node| scene.world_matrix(node))
            .unwrap_or(placement);
        let points = model
            .primary_mesh()
            .map(|asset| asset.positions.as_slice())
            .unwrap_or_default();
        let collider = physics.add_static_hull(points, world, root);

        Self {
            root,
            mesh,
            kind: AsteroidKind::Collidable { collider },
        }
    }

    /// Drifting rock without collision.
    pub fn spawn_moving(
        scene: &mut Scene,
        parent: Entity,
        model: &VisualModel,
        placement: Mat4,
        drift: Drift,
    ) -> Self {
        let (root, mesh) = Self::clone_model(scene, parent, model, placement);
        Self {
            root,
            mesh,
            kind: AsteroidKind::Moving { drift },
        }
    }

    /// Drifting rock with a looping positional sound bound to its mesh.
    ///
    /// If the emitter cannot be created the rock still spawns, silently.
    #[allow(clippy::too_many_arguments)]
    pub fn spawn_sounding<A: SpatialAudio>(
        scene: &mut Scene,
        audio: &mut A,
        parent: Entity,
        model: &VisualModel,
        placement: Mat4,
        drift: Drift,
        buffer: &SoundBuffer,
        params: EmitterParams,
    ) -> Self {
        let (root, mesh) = Self::clone_model(scene, parent, model, placement);
        scene.update_world_transforms();

        let position = mesh
            .or(Some(root))
            .and_then(|node| scene.world_position(node))
            .unwrap_or_default();
        let emitter = match audio.spawn_emitter(buffer, position, params) {
            Ok(id) => Some(id),
            Err(e) => {
                log::warn!("Asteroid {:?} spawned without sound: {}", root, e);
                None
            }
        };

        Self {
            root,
            mesh,
            kind: AsteroidKind::Sounding { drift, emitter },
        }
    }

    pub fn root(&self) -> Entity {
        self.root
    }

    pub fn mesh(&self) -> Option<Entity> {
        self.mesh
    }

    pub fn kind(&self) -> &AsteroidKind {
        &self.kind
    }

    pub fn variant(&self) -> Variant {
        self.kind.variant()
    }

    pub fn is_moving(&self) -> bool {
        self.kind.drift().is_some()
    }

    pub fn collider(&self) -> Option<ColliderHandle> {
        match self.kind {
            AsteroidKind::Collidable { collider } => Some(collider),
            _ => None,
        }
    }

    pub fn emitter(&self) -> Option<EmitterId> {
        match self.kind {
            AsteroidKind::Sounding { emitter, .. } => emitter,
            _ => None,
        }
    }

    /// Advance one frame. Returns false for non-moving variants or a destroyed rock.
    pub fn advance(&self, scene: &mut Scene, config: &DriftConfig) -> bool {
        let Some(drift) = self.kind.drift() else {
            return false;
        };
        match scene.local_transform_mut(self.root) {
            Some(mut transform) => {
                drift.advance(&mut transform, config);
                true
            }
            None => false,
        }
    }

    /// Keep the emitter on the mesh. Call after world transforms are refreshed.
    pub fn sync_emitter<A: SpatialAudio>(&self, scene: &Scene, audio: &mut A) {
        let Some(id) = self.emitter() else {
            return;
        };
        if let Some(position) = self.mesh.and_then(|mesh| scene.world_position(mesh)) {
            audio.set_emitter_position(id, position);
        }
    }

    /// Detach from the scene and release mesh GPU resources and any emitter.
    ///
    /// Safe to call repeatedly; returns false when there was nothing left to release.
    /// The collision volume is not touched: the field removes colliders in bulk.
    pub fn destroy<A: SpatialAudio>(&mut self, scene: &mut Scene, audio: &mut A) -> bool {
        let mut released = false;
        if let AsteroidKind::Sounding { emitter, .. } = &mut self.kind {
            if let Some(id) = emitter.take() {
                released |= audio.stop_emitter(id);
            }
        }
        if let Some(mesh) = self.mesh.take() {
            released |= scene.dispose_mesh(mesh);
        }
        released |= scene.despawn(self.root);
        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audio::SilentAudio;
    use engine_core::{MeshAsset, Vec3};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rock() -> VisualModel {
        VisualModel::nested_mesh("rock", MeshAsset::cube(1.0))
    }

    #[test]
    fn drift_wraps_after_crossing_bound() {
        let config = DriftConfig::default();
        let drift = Drift::new(1.0, Quat::IDENTITY);
        let mut t = Transform::from_position(Vec3::new(299.5, 0.0, 0.0));

        // 299.5 is not past the bound yet: plain move
        drift.advance(&mut t, &config);
        assert_eq!(t.position.x, 300.5);

        // now past the bound: snap to -300, then move
        drift.advance(&mut t, &config);
        assert_eq!(t.position.x, -299.0);
    }

    #[test]
    fn drift_exactly_on_bound_does_not_wrap() {
        let config = DriftConfig::default();
        let drift = Drift::new(0.25, Quat::IDENTITY);
        let mut t = Transform::from_position(Vec3::new(300.0, 0.0, 0.0));
        drift.advance(&mut t, &config);
        assert_eq!(t.position.x, 300.25);
    }

    #[test]
    fn drift_keeps_unit_rotation_and_stays_in_band() {
        let config = DriftConfig::default();
        let mut rng = StdRng::seed_from_u64(3);
        let drift = Drift::brisk(&mut rng, &config);
        let mut t = Transform::from_position(Vec3::new(250.0, 4.0, -2.0));
        for _ in 0..5_000 {
            drift.advance(&mut t, &config);
            assert!(t.position.x <= config.bound + drift.speed);
            assert!(t.position.x > config.reset);
            assert!((t.rotation.length() - 1.0).abs() < 1e-4);
        }
        // Other axes untouched.
        assert_eq!(t.position.y, 4.0);
        assert_eq!(t.position.z, -2.0);
    }

    #[test]
    fn speeds_fall_in_documented_ranges() {
        let config = DriftConfig::default();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..1_000 {
            let slow = Drift::slow(&mut rng, &config);
            assert!((0.0..1.0).contains(&slow.speed));
            let brisk = Drift::brisk(&mut rng, &config);
            assert!((0.5..1.0).contains(&brisk.speed));
            let (x, y, z) = brisk.spin.to_euler(EulerRot::XYZ);
            assert!(x.abs() < 0.011 && y.abs() < 0.011 && z.abs() < 0.011);
        }
    }

    #[test]
    fn destroy_twice_is_safe() {
        let mut scene = Scene::new();
        let mut audio = SilentAudio::new();
        let model = rock();
        let root = scene.root();
        let mut asteroid = Asteroid::spawn_static(&mut scene, root, &model, Mat4::IDENTITY);
        assert!(asteroid.destroy(&mut scene, &mut audio));
        assert!(!asteroid.destroy(&mut scene, &mut audio));
        assert_eq!(scene.resources().live_count(), 0);
        assert!(!asteroid.advance(&mut scene, &DriftConfig::default()));
    }

    #[test]
    fn collidable_collider_is_owned_by_root() {
        let mut scene = Scene::new();
        let mut physics = PhysicsWorld::new();
        let model = rock();
        let root = scene.root();
        let asteroid = Asteroid::spawn_collidable(
            &mut scene,
            &mut physics,
            root,
            &model,
            Mat4::from_translation(Vec3::new(8.0, 0.0, 0.0)),
        );
        let collider = asteroid.collider().expect("collider");
        assert_eq!(physics.object_for_collider(collider), Some(asteroid.root()));
        assert_eq!(asteroid.variant(), Variant::Collidable);
        assert!(!asteroid.is_moving());
    }

    #[test]
    fn sounding_emitter_follows_mesh_and_stops_on_destroy() {
        let mut scene = Scene::new();
        let mut audio = SilentAudio::new();
        let model = rock();
        let drift = Drift::new(1.0, Quat::IDENTITY);
        let root = scene.root();
        let mut asteroid = Asteroid::spawn_sounding(
            &mut scene,
            &mut audio,
            root,
            &model,
            Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0)),
            drift,
            &SoundBuffer::placeholder("noise"),
            EmitterParams::default(),
        );
        let id = asteroid.emitter().expect("emitter");
        assert_eq!(audio.emitter(id).unwrap().position, Vec3::new(10.0, 0.0, 0.0));

        assert!(asteroid.advance(&mut scene, &DriftConfig::default()));
        scene.update_world_transforms();
        asteroid.sync_emitter(&scene, &mut audio);
        assert_eq!(audio.emitter(id).unwrap().position.x, 11.0);

        assert!(asteroid.destroy(&mut scene, &mut audio));
        assert_eq!(audio.active_emitters(), 0);
        assert!(asteroid.emitter().is_none());
        assert!(!asteroid.destroy(&mut scene, &mut audio));
    }
}
