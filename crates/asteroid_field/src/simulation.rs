//! Per-frame update of the field.

use crate::field::{AsteroidField, FieldContext};
use crate::player::PlayerView;
use audio::SpatialAudio;
use engine_core::{Entity, FrameTime};
use physics::down_orientation;

/// What happened during one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Moving asteroids that were advanced.
    pub advanced: usize,
    /// Set when the object under the player changed this frame.
    pub new_ground: Option<Entity>,
    /// The player fell through the floor and was moved to the respawn point.
    pub respawned: bool,
}

impl AsteroidField {
    /// Run one frame: drift, ground probe, floor check, then scene and audio sync.
    ///
    /// Without an avatar only the world transforms are refreshed.
    pub fn on_frame<A: SpatialAudio, P: PlayerView>(
        &mut self,
        frame: FrameTime,
        ctx: &mut FieldContext<'_, A>,
        player: &P,
    ) -> FrameReport {
        let mut report = FrameReport::default();
        if !player.has_avatar() {
            ctx.scene.update_world_transforms();
            return report;
        }

        report.advanced = self.advance_moving(ctx);

        let position = player.position();
        let hit = ctx.physics.raycast_oriented(
            position,
            down_orientation(),
            self.config.ground_ray_length,
            Some(player.controller()),
        );
        report.new_ground = self.ground.observe(
            ctx.physics,
            hit.as_ref(),
            player.last_grounded(),
            frame.timestamp,
        );

        let mut listener_at = position;
        if let Some(respawn) = self.floor.check(position) {
            ctx.physics.set_controller_position(player.controller(), respawn);
            report.respawned = true;
            listener_at = respawn;
            log::info!(
                "Player fell below {:.1} at frame {}; respawning at {:?}",
                self.floor.threshold,
                frame.frame,
                respawn
            );
        }

        ctx.scene.update_world_transforms();
        for &index in &self.moving {
            self.asteroids[index].sync_emitter(ctx.scene, ctx.audio);
        }
        ctx.audio.update_listener(listener_at, player.orientation());
        report
    }

    fn advance_moving<A: SpatialAudio>(&mut self, ctx: &mut FieldContext<'_, A>) -> usize {
        let drift = &self.config.drift;
        self.moving
            .iter()
            .filter(|&&index| self.asteroids[index].advance(ctx.scene, drift))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::FrameReport;
    use crate::config::FieldConfig;
    use crate::field::{AsteroidField, FieldContext};
    use crate::loader::SharedResources;
    use crate::player::{LocalPlayer, PlayerView};
    use audio::{SilentAudio, SoundBuffer, SpatialAudio};
    use engine_core::{FrameClock, MeshAsset, Scene, Vec3, VisualModel};
    use audio::{EmitterId, EmitterParams};
    use engine_core::Quat;
    use physics::{PhysicsWorld, RigidBodyHandle};
    use std::cell::RefCell;
    use std::rc::Rc;

    type CallLog = Rc<RefCell<Vec<&'static str>>>;

    /// Player whose accessor calls land in a shared log.
    struct ScriptedPlayer {
        position: Vec3,
        body: RigidBodyHandle,
        log: CallLog,
    }

    impl PlayerView for ScriptedPlayer {
        fn position(&self) -> Vec3 {
            self.log.borrow_mut().push("position");
            self.position
        }

        fn has_avatar(&self) -> bool {
            true
        }

        fn controller(&self) -> RigidBodyHandle {
            self.log.borrow_mut().push("controller");
            self.body
        }

        fn last_grounded(&self) -> Option<u64> {
            self.log.borrow_mut().push("last_grounded");
            None
        }
    }

    /// Silent backend that logs per-frame emitter and listener updates.
    struct LoggingAudio {
        inner: SilentAudio,
        log: CallLog,
    }

    impl SpatialAudio for LoggingAudio {
        fn attach_listener(&mut self, position: Vec3, orientation: Quat) -> anyhow::Result<()> {
            self.inner.attach_listener(position, orientation)
        }

        fn detach_listener(&mut self) -> bool {
            self.inner.detach_listener()
        }

        fn has_listener(&self) -> bool {
            self.inner.has_listener()
        }

        fn update_listener(&mut self, position: Vec3, orientation: Quat) {
            self.log.borrow_mut().push("listener");
            self.inner.update_listener(position, orientation);
        }

        fn spawn_emitter(
            &mut self,
            buffer: &SoundBuffer,
            position: Vec3,
            params: EmitterParams,
        ) -> anyhow::Result<EmitterId> {
            self.inner.spawn_emitter(buffer, position, params)
        }

        fn set_emitter_position(&mut self, id: EmitterId, position: Vec3) {
            self.log.borrow_mut().push("emitter");
            self.inner.set_emitter_position(id, position);
        }

        fn stop_emitter(&mut self, id: EmitterId) -> bool {
            self.inner.stop_emitter(id)
        }

        fn active_emitters(&self) -> usize {
            self.inner.active_emitters()
        }
    }

    fn shared() -> SharedResources {
        SharedResources {
            model: VisualModel::nested_mesh("rock", MeshAsset::cube(1.0)),
            audio: SoundBuffer::placeholder("white-noise"),
        }
    }

    fn config() -> FieldConfig {
        FieldConfig {
            seed: Some(7),
            ..Default::default()
        }
    }

    #[test]
    fn frames_before_population_touch_nothing() {
        let mut scene = Scene::new();
        let mut physics = PhysicsWorld::new();
        let mut audio = SilentAudio::new();
        let player = LocalPlayer::spawn(&mut physics, Vec3::new(0.0, 5.0, 0.0));
        let mut ctx = FieldContext::new(&mut scene, &mut physics, &mut audio);
        let mut field = AsteroidField::new(config(), &mut ctx, &player).unwrap();

        let mut clock = FrameClock::fixed(60.0);
        let report = field.on_frame(clock.tick(), &mut ctx, &player);
        assert_eq!(report.advanced, 0);
        assert_eq!(field.moving_count(), 0);

        field.populate(shared(), &mut ctx).unwrap();
        let report = field.on_frame(clock.tick(), &mut ctx, &player);
        assert_eq!(report.advanced, 90);
    }

    #[test]
    fn falling_player_is_respawned() {
        let mut scene = Scene::new();
        let mut physics = PhysicsWorld::new();
        let mut audio = SilentAudio::new();
        let mut player = LocalPlayer::spawn(&mut physics, Vec3::new(500.0, -75.0, 500.0));
        let mut ctx = FieldContext::new(&mut scene, &mut physics, &mut audio);
        let mut field = AsteroidField::new(config(), &mut ctx, &player).unwrap();

        let mut clock = FrameClock::fixed(60.0);
        let report = field.on_frame(clock.tick(), &mut ctx, &player);
        assert!(report.respawned);
        let body = ctx.physics.get_body_transform(player.controller()).unwrap();
        assert_eq!(body.position, Vec3::new(0.0, 5.0, 0.0));
        // The listener moves with the teleport, not the fall.
        let (listener, _) = ctx.audio.listener().unwrap();
        assert_eq!(listener, Vec3::new(0.0, 5.0, 0.0));

        player.update(ctx.physics, clock.tick());
        assert!(player.position().y > 4.9);
        let report = field.on_frame(clock.tick(), &mut ctx, &player);
        assert!(!report.respawned);
    }

    #[test]
    fn standing_on_an_asteroid_reports_it_once() {
        let mut scene = Scene::new();
        let mut physics = PhysicsWorld::new();
        let mut audio = SilentAudio::new();
        // Directly above the first authored placement.
        let mut player = LocalPlayer::spawn(&mut physics, Vec3::new(0.0, 4.0, 0.0));
        let mut ctx = FieldContext::new(&mut scene, &mut physics, &mut audio);
        let mut cfg = config();
        cfg.placements.truncate(1);
        cfg.placements[0].position = [0.0, 0.0, 0.0];
        cfg.placements[0].scale = [1.0, 1.0, 1.0];
        let mut field = AsteroidField::new(cfg, &mut ctx, &player).unwrap();
        field.populate(shared(), &mut ctx).unwrap();
        let rock = field.asteroids()[0].root();

        let mut clock = FrameClock::fixed(60.0);
        let mut reports = Vec::new();
        for _ in 0..120 {
            let frame = clock.tick();
            player.update(ctx.physics, frame);
            reports.push(field.on_frame(frame, &mut ctx, &player));
        }
        let changes: Vec<_> = reports.iter().filter_map(|r| r.new_ground).collect();
        assert_eq!(changes, vec![rock]);
        assert_eq!(field.ground_object(), Some(rock));
        assert!(reports.iter().all(|r| !r.respawned));
    }

    #[test]
    fn listener_and_emitters_follow_each_frame() {
        let mut scene = Scene::new();
        let mut physics = PhysicsWorld::new();
        let mut audio = SilentAudio::new();
        let mut player = LocalPlayer::spawn(&mut physics, Vec3::new(0.0, 50.0, 0.0));
        let mut ctx = FieldContext::new(&mut scene, &mut physics, &mut audio);
        let mut field = AsteroidField::new(config(), &mut ctx, &player).unwrap();
        field.populate(shared(), &mut ctx).unwrap();

        let mut clock = FrameClock::fixed(60.0);
        let frame = clock.tick();
        player.update(ctx.physics, frame);
        field.on_frame(frame, &mut ctx, &player);

        let (listener, _) = ctx.audio.listener().unwrap();
        assert_eq!(listener, player.position());
        for asteroid in field.moving() {
            let Some(id) = asteroid.emitter() else { continue };
            let mesh = asteroid.mesh().unwrap();
            let expected = ctx.scene.world_position(mesh).unwrap();
            assert_eq!(ctx.audio.emitter(id).unwrap().position, expected);
        }
        assert_eq!(ctx.audio.active_emitters(), 10);
    }

    #[test]
    fn frame_runs_drift_probe_then_audio_sync() {
        let log = CallLog::default();
        let mut scene = Scene::new();
        let mut physics = PhysicsWorld::new();
        let (body, _) = physics.add_character_controller(Vec3::new(0.0, 50.0, 0.0), 0.9, 0.4);
        let mut audio = LoggingAudio {
            inner: SilentAudio::new(),
            log: log.clone(),
        };
        let player = ScriptedPlayer {
            position: Vec3::new(0.0, 50.0, 0.0),
            body,
            log: log.clone(),
        };
        let mut ctx = FieldContext::new(&mut scene, &mut physics, &mut audio);
        let mut field = AsteroidField::new(config(), &mut ctx, &player).unwrap();
        field.populate(shared(), &mut ctx).unwrap();

        let before: Vec<_> = field
            .moving()
            .filter(|a| a.emitter().is_some())
            .map(|a| ctx.scene.world_position(a.mesh().unwrap()).unwrap())
            .collect();
        log.borrow_mut().clear();

        let mut clock = FrameClock::fixed(60.0);
        let report = field.on_frame(clock.tick(), &mut ctx, &player);
        assert_eq!(report.advanced, 90);

        let mut expected = vec!["position", "controller", "last_grounded"];
        expected.extend(std::iter::repeat("emitter").take(10));
        expected.push("listener");
        assert_eq!(*log.borrow(), expected);

        // Emitters were synced to meshes that had already drifted this frame.
        let sounding: Vec<_> = field.moving().filter(|a| a.emitter().is_some()).collect();
        for (asteroid, start) in sounding.iter().zip(&before) {
            let id = asteroid.emitter().unwrap();
            let heard = ctx.audio.inner.emitter(id).unwrap().position;
            assert_eq!(heard, ctx.scene.world_position(asteroid.mesh().unwrap()).unwrap());
            assert!(heard.x > start.x);
        }
    }

    #[test]
    fn disembodied_player_skips_simulation() {
        let mut scene = Scene::new();
        let mut physics = PhysicsWorld::new();
        let mut audio = SilentAudio::new();
        let mut player = LocalPlayer::spawn(&mut physics, Vec3::new(0.0, -100.0, 0.0));
        player.embodied = false;
        let mut ctx = FieldContext::new(&mut scene, &mut physics, &mut audio);
        let mut field = AsteroidField::new(config(), &mut ctx, &player).unwrap();
        field.populate(shared(), &mut ctx).unwrap();

        let mut clock = FrameClock::fixed(60.0);
        let report = field.on_frame(clock.tick(), &mut ctx, &player);
        assert_eq!(report, FrameReport::default());
    }
}
