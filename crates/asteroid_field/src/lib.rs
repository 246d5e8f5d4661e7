//! Asteroid field: a procedurally scattered field of rocks around the player.
//!
//! Shared resources are loaded once, the field is populated once, advanced every
//! frame, and torn down once.

pub mod asteroid;
pub mod config;
pub mod error;
pub mod field;
pub mod generator;
pub mod ground;
pub mod loader;
pub mod player;
pub mod simulation;

pub use asteroid::{Asteroid, AsteroidKind, Drift, Variant};
pub use config::FieldConfig;
pub use error::{FieldError, LoadError};
pub use field::{AsteroidField, FieldCensus, FieldContext, FieldState};
pub use generator::FieldPlan;
pub use ground::{FloorGuard, GroundTracker};
pub use loader::{load_shared_resources, AssetSource, FileAssetSource, SharedResources};
pub use player::{LocalPlayer, PlayerView};
pub use simulation::FrameReport;
