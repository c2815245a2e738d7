use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context as _, Result};
use image::RgbaImage;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{Key, NamedKey};

use terra_engine::coords::Viewport;
use terra_engine::core::{App, AppControl, EventCtx, FrameCtx};
use terra_engine::render::{Context, RenderCtx, Texture2D, Texture2DDescription};
use terra_engine::scene::renderables::DayNightViewportQuad;
use terra_engine::scene::SceneState;

use crate::config::StudioConfig;
use crate::{sun, textures};

const CLEAR: wgpu::Color = wgpu::Color::BLACK;
const MAX_SPEED: f64 = 1.0e7;
const TITLE_INTERVAL: Duration = Duration::from_millis(500);

/// GPU-side state, created on the first frame.
struct Resources {
    context: Context,
    quad: DayNightViewportQuad,
    blend: Arc<Texture2D>,
    /// Sub-solar point the blend texture was last built for.
    blend_subsolar: (f64, f64),
}

pub struct Studio {
    config: StudioConfig,
    scene: SceneState,
    resources: Option<Resources>,
    last_title: Option<Instant>,
}

impl Studio {
    pub fn new(config: StudioConfig) -> Self {
        Self {
            config,
            scene: SceneState::new(),
            resources: None,
            last_title: None,
        }
    }

    fn create_resources(&self, rctx: &RenderCtx<'_>) -> Result<Resources> {
        let max = rctx.device.limits().max_texture_dimension_2d;
        let (w, h) = self.config.texture_size();
        let (w, h) = (w.min(max), h.min(max));

        let day = textures::load_or_generate(self.config.day.as_deref(), || {
            textures::procedural_day(w, h)
        })?;
        let night = textures::load_or_generate(self.config.night.as_deref(), || {
            textures::procedural_night(w, h)
        })?;
        let day = textures::fit_within(day, max);
        let night = textures::fit_within(night, max);

        let subsolar = sun::subsolar_point(0.0);
        let blend_image = blend_image(w, h, subsolar);

        let context = Context::new(rctx.viewport);
        let mut quad = DayNightViewportQuad::new(rctx, &context)?;

        quad.day_texture = Some(Texture2D::from_image(
            rctx,
            "day",
            &day,
            Texture2DDescription::default(),
        )?);
        quad.night_texture = Some(Texture2D::from_image(
            rctx,
            "night",
            &night,
            Texture2DDescription::default(),
        )?);
        let blend = Texture2D::from_rgba8(
            rctx,
            "blend",
            w,
            h,
            blend_image.as_raw(),
            Texture2DDescription::linear(),
        )?;
        quad.blend_texture = Some(blend.clone());

        log::info!("studio resources ready ({w}x{h} textures)");

        Ok(Resources {
            context,
            quad,
            blend,
            blend_subsolar: subsolar,
        })
    }

    fn frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> Result<AppControl> {
        let (width, height) = ctx.window.physical_size();
        let viewport = Viewport::from_size(width, height);
        if !viewport.is_valid() {
            return Ok(AppControl::Continue);
        }

        if self.resources.is_none() {
            let rctx = RenderCtx::new(
                ctx.gpu.device(),
                ctx.gpu.queue(),
                ctx.gpu.surface_format(),
                ctx.gpu.depth_format(),
                viewport,
            );
            let resources = self
                .create_resources(&rctx)
                .context("failed to create studio resources")?;
            self.resources = Some(resources);
        }
        let Some(res) = self.resources.as_mut() else {
            return Ok(AppControl::Continue);
        };

        let time = ctx.time.simulation_time;
        self.scene.sun_position = sun::sun_position(time);

        let subsolar = sun::subsolar_point(time);
        if needs_new_blend(res.blend_subsolar, subsolar, res.blend.width()) {
            let image = blend_image(res.blend.width(), res.blend.height(), subsolar);
            res.blend.copy_from_rgba8(ctx.gpu.queue(), image.as_raw())?;
            res.blend_subsolar = subsolar;
        }

        res.context.set_viewport(viewport);

        let scene = &self.scene;
        let control = ctx.render(CLEAR, |rctx, target| {
            res.quad.render(rctx, target, &mut res.context, scene)?;
            Ok(())
        })?;

        if self.last_title.is_none_or(|t| t.elapsed() >= TITLE_INTERVAL) {
            ctx.window.set_title(&title(time, ctx.clock.speed(), ctx.clock.is_paused()));
            self.last_title = Some(Instant::now());
        }

        Ok(control)
    }
}

impl App for Studio {
    fn on_window_event(&mut self, ctx: &mut EventCtx<'_>, event: &WindowEvent) -> AppControl {
        let WindowEvent::KeyboardInput { event, .. } = event else {
            return AppControl::Continue;
        };
        if event.state != ElementState::Pressed {
            return AppControl::Continue;
        }

        match &event.logical_key {
            Key::Named(NamedKey::Escape) => return AppControl::Exit,
            Key::Named(NamedKey::Space) => {
                ctx.clock.toggle_paused();
            }
            Key::Character(c) if c.as_str() == "+" || c.as_str() == "=" => {
                ctx.clock.set_speed((ctx.clock.speed() * 2.0).clamp(-MAX_SPEED, MAX_SPEED));
            }
            Key::Character(c) if c.as_str() == "-" => {
                ctx.clock.set_speed(ctx.clock.speed() * 0.5);
            }
            _ => {}
        }
        AppControl::Continue
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        match self.frame(ctx) {
            Ok(control) => control,
            Err(err) => {
                log::error!("{err:#}");
                AppControl::Exit
            }
        }
    }
}

fn blend_image(width: u32, height: u32, (longitude, latitude): (f64, f64)) -> RgbaImage {
    textures::blend(width, height, sun::direction(longitude, latitude))
}

/// True once the sub-solar point has moved at least one texel column (or
/// any amount in latitude worth a row).
fn needs_new_blend(last: (f64, f64), now: (f64, f64), texture_width: u32) -> bool {
    let texel = std::f64::consts::TAU / texture_width.max(1) as f64;
    let dlon = (now.0 - last.0 + std::f64::consts::PI).rem_euclid(std::f64::consts::TAU)
        - std::f64::consts::PI;
    dlon.abs() >= texel || (now.1 - last.1).abs() >= texel
}

fn title(simulation_time: f64, speed: f64, paused: bool) -> String {
    let days = simulation_time / sun::SECONDS_PER_DAY;
    let state = if paused { " (paused)" } else { "" };
    format!("terra studio | day {days:.2} | x{speed}{state}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_rebuilt_after_one_texel() {
        let texel = std::f64::consts::TAU / 1024.0;
        assert!(!needs_new_blend((0.0, 0.0), (texel * 0.5, 0.0), 1024));
        assert!(needs_new_blend((0.0, 0.0), (-texel * 1.5, 0.0), 1024));
    }

    #[test]
    fn blend_longitude_wraps() {
        let pi = std::f64::consts::PI;
        assert!(!needs_new_blend((pi - 0.001, 0.0), (-pi + 0.001, 0.0), 1024));
    }

    #[test]
    fn title_shows_state() {
        assert_eq!(title(43_200.0, 60.0, true), "terra studio | day 0.50 | x60 (paused)");
        assert_eq!(title(0.0, 1.0, false), "terra studio | day 0.00 | x1");
    }
}
