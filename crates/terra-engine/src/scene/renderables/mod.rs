//! Renderables own their draw state and know how to draw themselves
//! through a [`Context`](crate::render::Context).

mod day_night_viewport_quad;

pub use day_night_viewport_quad::DayNightViewportQuad;
