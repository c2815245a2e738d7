//! Automatic uniforms.
//!
//! A program that declares a uniform with a well-known name (`og_*`) gets its
//! value filled in by the renderer. Draw automatic uniforms are recomputed
//! before every draw from the context, render state and scene state; link
//! automatic uniforms are set once when the program is created.

mod camera;
mod link;
mod viewport;

use std::collections::HashMap;
use std::fmt;

use crate::render::uniform::{UniformHandle, UniformValue, Uniforms};
use crate::render::{Context, RenderState, RendererError};
use crate::scene::SceneState;

pub use link::LinkConstant;

/// A per-draw uniform bound to one program.
pub trait DrawAutomaticUniform: Send {
    fn set(
        &self,
        context: &Context,
        render_state: &RenderState,
        scene_state: &SceneState,
        uniforms: &mut Uniforms,
    ) -> Result<(), RendererError>;
}

/// Creates a [`DrawAutomaticUniform`] for programs declaring [`name`](Self::name).
pub trait DrawAutomaticUniformFactory: Send + Sync {
    fn name(&self) -> &str;

    /// Binds to the uniform in `uniforms`. Fails if it is declared with a
    /// type other than the one this factory produces.
    fn create(&self, uniforms: &Uniforms) -> Result<Box<dyn DrawAutomaticUniform>, RendererError>;
}

/// A uniform set once at program creation.
pub trait LinkAutomaticUniform: Send + Sync {
    fn name(&self) -> &str;
    fn set(&self, uniforms: &mut Uniforms) -> Result<(), RendererError>;
}

/// Computes a value from draw inputs.
pub type ComputeFn<T> = fn(&Context, &RenderState, &SceneState) -> T;

/// Factory for uniforms whose value is a pure function of the draw inputs.
pub struct ComputedUniformFactory<T> {
    name: &'static str,
    compute: ComputeFn<T>,
}

impl<T: UniformValue> ComputedUniformFactory<T> {
    pub const fn new(name: &'static str, compute: ComputeFn<T>) -> Self {
        Self { name, compute }
    }
}

struct ComputedUniform<T> {
    handle: UniformHandle<T>,
    compute: ComputeFn<T>,
}

impl<T: UniformValue> DrawAutomaticUniform for ComputedUniform<T> {
    fn set(
        &self,
        context: &Context,
        render_state: &RenderState,
        scene_state: &SceneState,
        uniforms: &mut Uniforms,
    ) -> Result<(), RendererError> {
        let value = (self.compute)(context, render_state, scene_state);
        uniforms.set(self.handle, value)
    }
}

impl<T: UniformValue> DrawAutomaticUniformFactory for ComputedUniformFactory<T> {
    fn name(&self) -> &str {
        self.name
    }

    fn create(&self, uniforms: &Uniforms) -> Result<Box<dyn DrawAutomaticUniform>, RendererError> {
        let handle = uniforms.handle::<T>(self.name)?;
        Ok(Box::new(ComputedUniform {
            handle,
            compute: self.compute,
        }))
    }
}

/// Name-keyed automatic uniform factories.
pub struct AutomaticUniformRegistry {
    draw: HashMap<String, Box<dyn DrawAutomaticUniformFactory>>,
    link: HashMap<String, Box<dyn LinkAutomaticUniform>>,
}

impl Default for AutomaticUniformRegistry {
    /// Registry holding every built-in automatic uniform.
    fn default() -> Self {
        let mut registry = Self::empty();
        for factory in viewport::factories().into_iter().chain(camera::factories()) {
            registry.register_draw(factory);
        }
        for constant in link::constants() {
            registry.register_link(Box::new(constant));
        }
        registry
    }
}

impl AutomaticUniformRegistry {
    pub fn empty() -> Self {
        Self {
            draw: HashMap::new(),
            link: HashMap::new(),
        }
    }

    /// Adds a draw factory, replacing one with the same name.
    pub fn register_draw(&mut self, factory: Box<dyn DrawAutomaticUniformFactory>) {
        let name = factory.name().to_string();
        if self.draw.insert(name.clone(), factory).is_some() {
            log::debug!("automatic uniform `{name}` replaced");
        }
    }

    /// Adds a link uniform, replacing one with the same name.
    pub fn register_link(&mut self, uniform: Box<dyn LinkAutomaticUniform>) {
        let name = uniform.name().to_string();
        if self.link.insert(name.clone(), uniform).is_some() {
            log::debug!("link uniform `{name}` replaced");
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.draw.contains_key(name) || self.link.contains_key(name)
    }

    /// Sets the link uniforms declared in `uniforms` and returns the draw
    /// automatic uniforms bound to the rest. Uniforms matching neither are
    /// left to the application.
    pub fn bind(
        &self,
        uniforms: &mut Uniforms,
    ) -> Result<Vec<Box<dyn DrawAutomaticUniform>>, RendererError> {
        let names: Vec<String> = uniforms.names().map(str::to_string).collect();
        let mut draw = Vec::new();

        for name in &names {
            if let Some(factory) = self.draw.get(name) {
                draw.push(factory.create(uniforms)?);
            } else if let Some(link) = self.link.get(name) {
                link.set(uniforms)?;
            }
        }

        Ok(draw)
    }
}

impl fmt::Debug for AutomaticUniformRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut draw: Vec<_> = self.draw.keys().collect();
        let mut link: Vec<_> = self.link.keys().collect();
        draw.sort();
        link.sort();
        f.debug_struct("AutomaticUniformRegistry")
            .field("draw", &draw)
            .field("link", &link)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use glam::{Mat4, Vec3, Vec4};

    use super::*;
    use crate::coords::Viewport;
    use crate::render::uniform::{UniformLocation, UniformMember, UniformType};

    fn uniforms(decls: &[(&str, UniformType)]) -> Uniforms {
        let mut offset = 0;
        let members: Vec<UniformMember> = decls
            .iter()
            .map(|&(name, ty)| {
                let m = UniformMember {
                    name: name.to_string(),
                    ty,
                    location: UniformLocation(offset),
                };
                offset += 64;
                m
            })
            .collect();
        Uniforms::from_members(&members)
    }

    fn run(draw: &[Box<dyn DrawAutomaticUniform>], context: &Context, scene: &SceneState, u: &mut Uniforms) {
        let state = RenderState::default();
        for d in draw {
            d.set(context, &state, scene, u).unwrap();
        }
    }

    // ── binding ───────────────────────────────────────────────────────────

    #[test]
    fn only_known_names_are_bound() {
        let registry = AutomaticUniformRegistry::default();
        let mut u = uniforms(&[
            ("og_modelViewPerspectiveMatrix", UniformType::FloatMatrix44),
            ("u_userColor", UniformType::FloatVector4),
        ]);

        let draw = registry.bind(&mut u).unwrap();
        assert_eq!(draw.len(), 1);
    }

    #[test]
    fn wrong_declared_type_fails_binding() {
        let registry = AutomaticUniformRegistry::default();
        let mut u = uniforms(&[("og_sunPosition", UniformType::FloatVector4)]);

        assert!(matches!(
            registry.bind(&mut u),
            Err(RendererError::UniformTypeMismatch { .. })
        ));
    }

    #[test]
    fn link_uniforms_are_set_at_bind_time() {
        let registry = AutomaticUniformRegistry::default();
        let mut u = uniforms(&[("og_pi", UniformType::Float), ("og_twoPi", UniformType::Float)]);

        let draw = registry.bind(&mut u).unwrap();

        assert!(draw.is_empty());
        assert_eq!(u.value::<f32>("og_pi").unwrap(), std::f32::consts::PI);
        assert_eq!(u.value::<f32>("og_twoPi").unwrap(), std::f32::consts::TAU);
    }

    #[test]
    fn custom_factories_can_be_registered() {
        let mut registry = AutomaticUniformRegistry::empty();
        registry.register_draw(Box::new(ComputedUniformFactory::<f32>::new(
            "u_viewportWidth",
            |ctx, _, _| ctx.viewport().width as f32,
        )));
        assert!(registry.contains("u_viewportWidth"));
        assert!(!registry.contains("og_pi"));

        let mut context = Context::new(Viewport::from_size(640, 480));
        context.set_viewport(Viewport::from_size(300, 200));
        let mut u = uniforms(&[("u_viewportWidth", UniformType::Float)]);
        let draw = registry.bind(&mut u).unwrap();
        run(&draw, &context, &SceneState::new(), &mut u);

        assert_eq!(u.value::<f32>("u_viewportWidth").unwrap(), 300.0);
    }

    // ── values ────────────────────────────────────────────────────────────

    #[test]
    fn draw_uniforms_follow_scene_state() {
        let registry = AutomaticUniformRegistry::default();
        let mut u = uniforms(&[
            ("og_cameraEye", UniformType::FloatVector3),
            ("og_sunPosition", UniformType::FloatVector3),
            ("og_cameraLightPosition", UniformType::FloatVector3),
            ("og_viewport", UniformType::FloatVector4),
            ("og_modelViewPerspectiveMatrix", UniformType::FloatMatrix44),
        ]);
        let draw = registry.bind(&mut u).unwrap();

        let context = Context::new(Viewport::new(10, 20, 300, 200));
        let mut scene = SceneState::new();
        scene.camera.eye = glam::DVec3::new(0.0, -3.0, 1.0);
        scene.sun_position = glam::DVec3::new(1.0, 2.0, 3.0);
        run(&draw, &context, &scene, &mut u);

        assert_eq!(u.value::<Vec3>("og_cameraEye").unwrap(), Vec3::new(0.0, -3.0, 1.0));
        assert_eq!(u.value::<Vec3>("og_cameraLightPosition").unwrap(), Vec3::new(0.0, -3.0, 1.0));
        assert_eq!(u.value::<Vec3>("og_sunPosition").unwrap(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(u.value::<Vec4>("og_viewport").unwrap(), Vec4::new(10.0, 20.0, 300.0, 200.0));

        let expected = scene.model_view_perspective_matrix(1.5).as_mat4();
        assert_eq!(u.value::<Mat4>("og_modelViewPerspectiveMatrix").unwrap(), expected);
    }

    #[test]
    fn unchanged_inputs_leave_uniforms_clean() {
        let registry = AutomaticUniformRegistry::default();
        let mut u = uniforms(&[("og_viewportOrthographicMatrix", UniformType::FloatMatrix44)]);
        let draw = registry.bind(&mut u).unwrap();
        let context = Context::new(Viewport::from_size(800, 600));
        let scene = SceneState::new();
        let mut block = crate::render::uniform::UniformBlock::new(64);

        run(&draw, &context, &scene, &mut u);
        assert_eq!(u.clean(&mut block), 1);

        run(&draw, &context, &scene, &mut u);
        assert_eq!(u.dirty_count(), 0);
    }
}
