//! Core engine types shared by the asteroid field crates.
//!
//! - Transform math
//! - Frame timing
//! - A headless, hecs-backed scene graph with GPU resource bookkeeping
//! - Visual model templates

pub mod components;
pub mod model;
pub mod scene;
pub mod time;
pub mod transform;

pub use components::*;
pub use model::*;
pub use scene::*;
pub use time::*;
pub use transform::*;

// Re-export commonly used types
pub use glam::{EulerRot, Mat4, Quat, Vec3};
pub use hecs::{Entity, World};
