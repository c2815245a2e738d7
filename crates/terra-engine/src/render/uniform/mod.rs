//! Change-tracked shader uniforms.
//!
//! A [`Uniform`] remembers its value on the CPU and tells a
//! [`CleanableObserver`] when it first diverges from what was last flushed.
//! [`Uniforms`] groups the uniforms of one program with the dirty list that
//! observes them; cleaning writes only the dirty values into a
//! [`UniformBlock`], whose dirty byte range is then uploaded in one call.

mod block;
mod cleanable;
mod set;
mod typed;
mod value;

pub use block::UniformBlock;
pub use cleanable::{Cleanable, CleanableObserver, DirtyList, UniformSink};
pub use set::{UniformHandle, UniformMember, Uniforms};
pub use typed::{Uniform, UniformLocation};
pub use value::{UniformType, UniformValue};
