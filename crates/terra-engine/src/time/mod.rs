//! Time subsystem.
//!
//! - one `SimulationClock` per window; `tick()` once per presented frame
//! - `FrameTime` carries both real (clamped) and simulated time

mod frame_clock;
mod simulation_clock;

pub use frame_clock::{FrameClock, FrameTime};
pub use simulation_clock::{ClockConfig, SimulationClock};
