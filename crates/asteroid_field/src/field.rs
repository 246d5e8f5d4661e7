//! The asteroid field: owns every asteroid, the moving subset and the physics
//! registrations, and guarantees a single full teardown.

use crate::asteroid::{Asteroid, Variant};
use crate::config::FieldConfig;
use crate::error::{FieldError, LoadError};
use crate::generator::{spawn_plan, FieldPlan};
use crate::ground::{FloorGuard, GroundTracker};
use crate::loader::SharedResources;
use crate::player::PlayerView;
use audio::{SoundBuffer, SpatialAudio};
use engine_core::{Entity, MeshRenderer, Scene, Transform};
use physics::{ColliderHandle, PhysicsWorld};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Collaborators borrowed for one field operation.
pub struct FieldContext<'a, A: SpatialAudio> {
    pub scene: &'a mut Scene,
    pub physics: &'a mut PhysicsWorld,
    pub audio: &'a mut A,
}

impl<'a, A: SpatialAudio> FieldContext<'a, A> {
    pub fn new(scene: &'a mut Scene, physics: &'a mut PhysicsWorld, audio: &'a mut A) -> Self {
        Self {
            scene,
            physics,
            audio,
        }
    }
}

/// Population latch. Moves forward only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldState {
    /// Waiting for shared resources; frames see an empty field.
    Pending,
    Populated,
    /// Shared resources failed to load; the field stays empty for the session.
    LoadFailed,
    TornDown,
}

/// Per-variant entity counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldCensus {
    pub collidable: usize,
    pub statics: usize,
    pub moving: usize,
    pub sounding: usize,
}

impl FieldCensus {
    pub fn total(&self) -> usize {
        self.collidable + self.statics + self.moving + self.sounding
    }
}

/// Lifecycle manager of one asteroid field.
pub struct AsteroidField {
    pub(crate) config: FieldConfig,
    pub(crate) root: Entity,
    pub(crate) state: FieldState,
    /// Every asteroid, for teardown.
    pub(crate) asteroids: Vec<Asteroid>,
    /// Indices into `asteroids` updated every frame.
    pub(crate) moving: Vec<usize>,
    /// Collision volumes to remove at teardown.
    pub(crate) colliders: Vec<ColliderHandle>,
    /// GPU resources of the shared model itself.
    pub(crate) shared_mesh: Option<MeshRenderer>,
    pub(crate) shared_audio: Option<SoundBuffer>,
    pub(crate) ground: GroundTracker,
    pub(crate) floor: FloorGuard,
    rng: StdRng,
}

impl AsteroidField {
    /// Create the field root under the scene root and attach the audio listener to the player.
    pub fn new<A: SpatialAudio, P: PlayerView>(
        config: FieldConfig,
        ctx: &mut FieldContext<'_, A>,
        player: &P,
    ) -> Result<Self, FieldError> {
        let scene_root = ctx.scene.root();
        let root = ctx
            .scene
            .spawn_node(config.name.clone(), Transform::default(), scene_root);
        ctx.audio
            .attach_listener(player.position(), player.orientation())
            .map_err(|e| FieldError::Audio(e.to_string()))?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let floor = FloorGuard::new(config.floor_threshold, config.respawn_point());

        Ok(Self {
            config,
            root,
            state: FieldState::Pending,
            asteroids: Vec::new(),
            moving: Vec::new(),
            colliders: Vec::new(),
            shared_mesh: None,
            shared_audio: None,
            ground: GroundTracker::default(),
            floor,
            rng,
        })
    }

    /// Build the field from loaded resources. Accepted once, and only while pending.
    pub fn populate<A: SpatialAudio>(
        &mut self,
        shared: SharedResources,
        ctx: &mut FieldContext<'_, A>,
    ) -> Result<FieldCensus, FieldError> {
        match self.state {
            FieldState::Pending => {}
            FieldState::Populated => return Err(FieldError::AlreadyPopulated),
            FieldState::LoadFailed => return Err(FieldError::LoadFailed),
            FieldState::TornDown => return Err(FieldError::TornDown),
        }

        self.shared_mesh = shared
            .model
            .primary_mesh()
            .map(|mesh| ctx.scene.upload_mesh(mesh));

        let plan = FieldPlan::generate(&self.config, &mut self.rng);
        let emitter = self.config.emitter.params();
        for asteroid in spawn_plan(&plan, &shared, ctx, self.root, emitter) {
            self.track(asteroid);
        }
        self.shared_audio = Some(shared.audio);
        self.state = FieldState::Populated;

        let census = self.census();
        log::info!(
            "Populated {}: {} collidable, {} static, {} moving, {} sounding",
            self.config.name,
            census.collidable,
            census.statics,
            census.moving,
            census.sounding
        );
        Ok(census)
    }

    /// Record that shared resources never arrived. The field stays empty.
    pub fn record_load_failure(&mut self, error: &LoadError) {
        log::error!("Asteroid field not populated: {}", error);
        if self.state == FieldState::Pending {
            self.state = FieldState::LoadFailed;
        }
    }

    fn track(&mut self, asteroid: Asteroid) {
        if asteroid.is_moving() {
            self.moving.push(self.asteroids.len());
        }
        if let Some(collider) = asteroid.collider() {
            self.colliders.push(collider);
        }
        self.asteroids.push(asteroid);
    }

    /// Release everything the field owns. Runs once; later calls return false.
    ///
    /// Order: shared model mesh, every asteroid, every collision volume, the shared
    /// clip, then the player's listener. Safe before population: whatever was never
    /// created is skipped.
    pub fn teardown<A: SpatialAudio>(&mut self, ctx: &mut FieldContext<'_, A>) -> bool {
        if self.state == FieldState::TornDown {
            log::debug!("Ignoring repeated teardown of {}", self.config.name);
            return false;
        }

        if let Some(shared_mesh) = self.shared_mesh.take() {
            ctx.scene.release_mesh(&shared_mesh);
        }

        let destroyed = self.asteroids.len();
        for asteroid in &mut self.asteroids {
            asteroid.destroy(ctx.scene, ctx.audio);
        }
        self.asteroids.clear();
        self.moving.clear();

        let colliders = self.colliders.len();
        for collider in self.colliders.drain(..) {
            ctx.physics.remove_collider(collider);
        }
        ctx.physics.update_query_pipeline();

        self.shared_audio = None;
        ctx.audio.detach_listener();
        self.state = FieldState::TornDown;

        log::info!(
            "Tore down {}: {} asteroids, {} collision volumes",
            self.config.name,
            destroyed,
            colliders
        );
        true
    }

    pub fn state(&self) -> FieldState {
        self.state
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    /// The field root node every asteroid hangs under.
    pub fn root(&self) -> Entity {
        self.root
    }

    pub fn asteroids(&self) -> &[Asteroid] {
        &self.asteroids
    }

    pub fn moving_count(&self) -> usize {
        self.moving.len()
    }

    pub fn moving(&self) -> impl Iterator<Item = &Asteroid> + '_ {
        self.moving.iter().map(move |&i| &self.asteroids[i])
    }

    pub fn colliders(&self) -> &[ColliderHandle] {
        &self.colliders
    }

    pub fn shared_audio(&self) -> Option<&SoundBuffer> {
        self.shared_audio.as_ref()
    }

    /// Last game object found under the player's feet.
    pub fn ground_object(&self) -> Option<Entity> {
        self.ground.last_found()
    }

    pub fn census(&self) -> FieldCensus {
        let mut census = FieldCensus::default();
        for asteroid in &self.asteroids {
            match asteroid.variant() {
                Variant::Collidable => census.collidable += 1,
                Variant::Static => census.statics += 1,
                Variant::Moving => census.moving += 1,
                Variant::Sounding => census.sounding += 1,
            }
        }
        census
    }
}
