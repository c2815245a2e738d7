use anyhow::{Context, Result};
use ouroboros::self_referencing;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{App, AppControl, EventCtx, FrameCtx, WindowCtx};
use crate::device::{Gpu, GpuInit};
use crate::time::{ClockConfig, SimulationClock};

/// Settings for the studio window and its simulation clock.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    pub clock: ClockConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "terra".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
            clock: ClockConfig::default(),
        }
    }
}

/// Drives one window and its GPU surface until the app exits or the window closes.
pub struct Runtime;

impl Runtime {
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: 'static + App,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = LoopState {
            config,
            gpu_init,
            app,
            entry: None,
            fatal: None,
        };

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.fatal.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    clock: SimulationClock,

    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

struct LoopState<A: App> {
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,
    /// `None` before `resumed` and after the window closed.
    entry: Option<WindowEntry>,
    /// First error that stopped the loop; returned from `Runtime::run`.
    fatal: Option<anyhow::Error>,
}

impl<A: App> LoopState<A> {
    fn open_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;
        let id = window.id();
        let gpu_init = self.gpu_init.clone();

        let entry = WindowEntryTryBuilder {
            clock: SimulationClock::new(self.config.clock.clone()),
            window,
            gpu_builder: |w| {
                pollster::block_on(Gpu::new(w, gpu_init)).context("GPU initialization failed")
            },
        }
        .try_build()?;

        log::info!("window {id:?} opened");
        entry.with_window(|w| w.request_redraw());
        self.entry = Some(entry);
        Ok(())
    }

    fn stop(&mut self, event_loop: &ActiveEventLoop, err: Option<anyhow::Error>) {
        if let Some(err) = err {
            log::error!("{err:#}");
            self.fatal.get_or_insert(err);
        }
        self.entry = None;
        event_loop.exit();
    }
}

impl<A: App> ApplicationHandler for LoopState<A> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() {
            return;
        }
        if let Err(err) = self.open_window(event_loop) {
            self.stop(event_loop, Some(err));
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Wait);

        // The simulation clock moves every frame.
        if let Some(entry) = &self.entry {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let (app, Some(entry)) = (&mut self.app, self.entry.as_mut()) else {
            return;
        };

        let control = entry.with_clock_mut(|clock| {
            let mut ctx = EventCtx { window_id, clock };
            app.on_window_event(&mut ctx, &event)
        });
        if control == AppControl::Exit {
            self.stop(event_loop, None);
            return;
        }

        let control = match &event {
            WindowEvent::CloseRequested => AppControl::Exit,

            WindowEvent::Resized(size) => {
                log::debug!("window resized to {}x{}", size.width, size.height);
                entry.with_gpu_mut(|gpu| gpu.resize(*size));
                entry.with_window(|w| w.request_redraw());
                AppControl::Continue
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                let size = entry.with_window(|w| w.inner_size());
                entry.with_gpu_mut(|gpu| gpu.resize(size));
                entry.with_window(|w| w.request_redraw());
                AppControl::Continue
            }

            WindowEvent::RedrawRequested => entry.with_mut(|fields| {
                let time = fields.clock.tick();
                let mut ctx = FrameCtx {
                    window: WindowCtx {
                        id: window_id,
                        window: fields.window,
                    },
                    gpu: fields.gpu,
                    time,
                    clock: fields.clock,
                };
                app.on_frame(&mut ctx)
            }),

            _ => AppControl::Continue,
        };

        if control == AppControl::Exit {
            self.stop(event_loop, None);
        }
    }
}
