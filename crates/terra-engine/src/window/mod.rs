//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and the studio window, and wires it to the GPU layer.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};
