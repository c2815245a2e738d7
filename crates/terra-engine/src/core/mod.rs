//! Core engine-facing contracts.
//!
//! This module defines the interface between the runtime (platform loop)
//! and applications, with a consistent per-event and per-frame context.

mod app;
mod ctx;

pub use app::{App, AppControl, EventCtx};
pub use ctx::{FrameCtx, WindowCtx};
