//! Scene description consumed by automatic uniforms, plus ready-made
//! renderables.
//!
//! Scene maths is done in `f64` and narrowed to `f32` when uploaded.

mod camera;
mod state;

pub mod renderables;

pub use camera::Camera;
pub use state::SceneState;
