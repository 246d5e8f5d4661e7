//! Headless host for the asteroid field. Runs a fixed-rate session, then tears down.

use anyhow::Result;
use asteroid_field::{
    load_shared_resources, AsteroidField, FieldConfig, FieldContext, FileAssetSource, LocalPlayer,
};
use audio::{AudioSystem, SilentAudio, SpatialAudio};
use engine_core::{FrameClock, Scene};
use physics::PhysicsWorld;

const TICK_RATE: f64 = 60.0;
const DEFAULT_FRAMES: u64 = 600;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let frames = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(DEFAULT_FRAMES);
    let config = FieldConfig::load();
    log::info!("Starting {} for {} frames", config.name, frames);

    match AudioSystem::new() {
        Ok(mut audio) => run(config, &mut audio, frames),
        Err(e) => {
            log::warn!("No audio device ({}), running silent", e);
            run(config, &mut SilentAudio::new(), frames)
        }
    }
}

fn run<A: SpatialAudio>(config: FieldConfig, audio: &mut A, frames: u64) -> Result<()> {
    let mut scene = Scene::new();
    let mut physics = PhysicsWorld::new();
    let mut player = LocalPlayer::spawn(&mut physics, config.respawn_point());
    let mut ctx = FieldContext::new(&mut scene, &mut physics, audio);
    let mut field = AsteroidField::new(config, &mut ctx, &player)?;

    let source = FileAssetSource::new("assets");
    match pollster::block_on(load_shared_resources(&source, field.config())) {
        Ok(shared) => {
            if let Err(e) = field.populate(shared, &mut ctx) {
                log::error!("Asteroid field not populated: {}", e);
            }
        }
        Err(e) => field.record_load_failure(&e),
    }

    let mut clock = FrameClock::fixed(TICK_RATE);
    while clock.frame_count() < frames {
        let frame = clock.tick();
        player.update(ctx.physics, frame);
        let report = field.on_frame(frame, &mut ctx, &player);
        if let Some(ground) = report.new_ground {
            log::info!("Frame {}: standing on {:?}", frame.frame, ground);
        }
        ctx.physics.step();
    }

    field.teardown(&mut ctx);
    log::info!("Session over after {} frames", clock.frame_count());
    Ok(())
}
