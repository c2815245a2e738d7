//! Terra engine crate.
//!
//! A small object-model renderer on wgpu: shader programs with change-tracked
//! and automatic uniforms, render state, vertex arrays and textures, plus the
//! scene types and renderables built on them. The runtime modules own the
//! window loop and GPU device.

pub mod core;
pub mod device;
pub mod time;
pub mod window;

pub mod coords;
pub mod logging;
pub mod render;
pub mod scene;
