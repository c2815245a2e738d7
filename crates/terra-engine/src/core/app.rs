use winit::event::WindowEvent;
use winit::window::WindowId;

use crate::time::SimulationClock;

use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Per-event context passed to `App::on_window_event`.
pub struct EventCtx<'a> {
    pub window_id: WindowId,
    /// The window's simulation clock, for pause/speed controls.
    pub clock: &'a mut SimulationClock,
}

/// Application contract implemented by higher layers.
pub trait App {
    /// Called for every window event before the runtime handles it.
    fn on_window_event(&mut self, ctx: &mut EventCtx<'_>, event: &WindowEvent) -> AppControl {
        let _ = (ctx, event);
        AppControl::Continue
    }

    /// Called once per rendered frame per window.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;
}
