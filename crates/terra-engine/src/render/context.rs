use std::sync::Arc;

use glam::DMat4;

use crate::coords::Viewport;
use crate::render::automatic::AutomaticUniformRegistry;
use crate::render::shader::{PipelineKey, ShaderProgram};
use crate::render::texture::{Texture2D, TextureUnits};
use crate::render::vertex::VertexArray;
use crate::render::{RenderCtx, RenderState, RenderTarget, RendererError};
use crate::scene::SceneState;

/// How vertices are assembled into primitives.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum PrimitiveType {
    Points,
    Lines,
    LineStrip,
    Triangles,
    TriangleStrip,
}

impl PrimitiveType {
    pub fn topology(self) -> wgpu::PrimitiveTopology {
        match self {
            Self::Points => wgpu::PrimitiveTopology::PointList,
            Self::Lines => wgpu::PrimitiveTopology::LineList,
            Self::LineStrip => wgpu::PrimitiveTopology::LineStrip,
            Self::Triangles => wgpu::PrimitiveTopology::TriangleList,
            Self::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
        }
    }
}

/// Everything bound for one draw call besides textures.
#[derive(Debug)]
pub struct DrawState {
    pub render_state: RenderState,
    pub shader_program: ShaderProgram,
    pub vertex_array: VertexArray,
}

impl DrawState {
    pub fn new(render_state: RenderState, shader_program: ShaderProgram, vertex_array: VertexArray) -> Self {
        Self {
            render_state,
            shader_program,
            vertex_array,
        }
    }
}

/// Draw-time state shared by every renderable: the viewport, texture units
/// and the automatic uniform registry.
#[derive(Debug)]
pub struct Context {
    viewport: Viewport,
    /// Part of `viewport` the current draw rasterizes into.
    applied_viewport: Viewport,
    texture_units: TextureUnits,
    registry: AutomaticUniformRegistry,
}

impl Context {
    pub fn new(viewport: Viewport) -> Self {
        Self::with_registry(viewport, AutomaticUniformRegistry::default())
    }

    pub fn with_registry(viewport: Viewport, registry: AutomaticUniformRegistry) -> Self {
        Self {
            viewport,
            applied_viewport: viewport,
            texture_units: TextureUnits::new(),
            registry,
        }
    }

    #[inline]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        if !viewport.is_valid() {
            log::warn!("degenerate viewport {viewport:?}");
        }
        self.viewport = viewport;
        self.applied_viewport = viewport;
    }

    /// The viewport cropped to the render target by the current draw; equal
    /// to [`viewport`](Self::viewport) when it fits.
    #[inline]
    pub fn applied_viewport(&self) -> Viewport {
        self.applied_viewport
    }

    /// Clip-space correction composed into projection uniforms so a cropped
    /// viewport clips instead of squeezing, and an inverted depth range
    /// mirrors depth.
    pub fn clip_space_remap(&self, render_state: &RenderState) -> DMat4 {
        SceneState::compute_clip_remap(
            self.viewport,
            self.applied_viewport,
            render_state.depth_range_inverted(),
        )
    }

    pub fn texture_units(&self) -> &TextureUnits {
        &self.texture_units
    }

    pub fn texture_units_mut(&mut self) -> &mut TextureUnits {
        &mut self.texture_units
    }

    pub fn registry(&self) -> &AutomaticUniformRegistry {
        &self.registry
    }

    /// Programs created afterwards see the change; existing ones keep the
    /// automatic uniforms they were created with.
    pub fn registry_mut(&mut self) -> &mut AutomaticUniformRegistry {
        &mut self.registry
    }

    pub fn create_shader_program(
        &self,
        device: &wgpu::Device,
        label: &str,
        source: &str,
    ) -> Result<ShaderProgram, RendererError> {
        ShaderProgram::new(device, label, source, &self.registry)
    }

    /// Records one draw of `draw_state` into `target`.
    ///
    /// The pass loads existing target contents. Nothing is recorded when the
    /// viewport lies outside the target or no vertices are available.
    pub fn draw(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        primitive_type: PrimitiveType,
        draw_state: &mut DrawState,
        scene_state: &SceneState,
    ) -> Result<(), RendererError> {
        let DrawState {
            render_state,
            shader_program: program,
            vertex_array,
        } = draw_state;

        let bindings = program.vertex_bindings(vertex_array)?;

        let depth = depth_attachment(render_state, target.depth_view, ctx.depth_format)?;

        let textures = self.bound_textures(program.texture_units())?;

        let Some(viewport) = self
            .viewport
            .clamped_to(ctx.viewport.width.max(0) as u32, ctx.viewport.height.max(0) as u32)
        else {
            log::warn!("viewport {:?} lies outside the render target", self.viewport);
            return Ok(());
        };
        if viewport != self.viewport {
            log::trace!("viewport {:?} cropped to {viewport:?}", self.viewport);
        }
        self.applied_viewport = viewport;

        program.set_draw_uniforms(self, render_state, scene_state)?;
        program.clean(ctx.device, target.encoder);

        let vertex_count = bindings
            .iter()
            .map(|(entry, buffer)| (buffer.size_in_bytes() / entry.stride.max(1)).min(u32::MAX as u64) as u32)
            .min()
            .unwrap_or(0);
        if vertex_count == 0 {
            log::debug!("`{}`: nothing to draw", program.label());
            return Ok(());
        }

        let key = PipelineKey {
            state: render_state.pipeline_key(),
            primitive: primitive_type,
            vertex_layout: bindings.iter().map(|(entry, _)| *entry).collect(),
            color_format: ctx.surface_format,
            depth_format: depth.map(|(_, format)| format),
        };
        let (min_depth, max_depth) = render_state.pass_depth_range();
        let blend_constant = render_state.blend_constant();
        let prepared = program.prepare(ctx.device, key, &textures);

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("terra draw pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: depth.map(|(view, _)| wgpu::RenderPassDepthStencilAttachment {
                view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_viewport(
            viewport.x as f32,
            viewport.y as f32,
            viewport.width as f32,
            viewport.height as f32,
            min_depth,
            max_depth,
        );
        rpass.set_blend_constant(blend_constant);
        rpass.set_pipeline(prepared.pipeline);
        rpass.set_bind_group(0, prepared.uniform_bind_group, &[]);
        rpass.set_bind_group(1, prepared.texture_bind_group, &[]);
        for (slot, (_, buffer)) in bindings.iter().enumerate() {
            rpass.set_vertex_buffer(slot as u32, buffer.buffer().slice(..));
        }
        rpass.draw(0..vertex_count, 0..1);

        Ok(())
    }

    fn bound_textures(&self, units: &[u32]) -> Result<Vec<Arc<Texture2D>>, RendererError> {
        units
            .iter()
            .map(|&unit| {
                self.texture_units
                    .get(unit as usize)
                    .cloned()
                    .ok_or(RendererError::TextureUnitUnbound(unit))
            })
            .collect()
    }
}

/// The depth attachment for a draw: the target's depth view when it has one
/// with a known format. Depth testing without one is an error.
fn depth_attachment<V>(
    render_state: &RenderState,
    view: Option<V>,
    format: Option<wgpu::TextureFormat>,
) -> Result<Option<(V, wgpu::TextureFormat)>, RendererError> {
    let depth = view.zip(format);
    if render_state.depth_test.enabled && depth.is_none() {
        return Err(RendererError::MissingDepthTarget);
    }
    Ok(depth)
}

#[cfg(test)]
mod tests {
    use glam::{Mat4, Vec3};

    use super::*;
    use crate::render::automatic::DrawAutomaticUniform;
    use crate::render::uniform::{UniformLocation, UniformMember, UniformType, Uniforms};

    fn draw_uniforms(context: &Context, state: &RenderState) -> Uniforms {
        let members = [
            UniformMember {
                name: "og_viewportOrthographicMatrix".into(),
                ty: UniformType::FloatMatrix44,
                location: UniformLocation(0),
            },
            UniformMember {
                name: "og_viewportTransformationMatrix".into(),
                ty: UniformType::FloatMatrix44,
                location: UniformLocation(64),
            },
        ];
        let mut uniforms = Uniforms::from_members(&members);
        let draw = context.registry().bind(&mut uniforms).unwrap();
        for uniform in &draw {
            uniform
                .set(context, state, &SceneState::new(), &mut uniforms)
                .unwrap();
        }
        uniforms
    }

    #[test]
    fn strips_map_to_strip_topologies() {
        assert_eq!(
            PrimitiveType::TriangleStrip.topology(),
            wgpu::PrimitiveTopology::TriangleStrip
        );
        assert_eq!(PrimitiveType::Lines.topology(), wgpu::PrimitiveTopology::LineList);
    }

    #[test]
    fn viewport_is_replaced() {
        let mut context = Context::new(Viewport::from_size(640, 480));
        context.set_viewport(Viewport::new(10, 10, 100, 50));
        assert_eq!(context.viewport(), Viewport::new(10, 10, 100, 50));
    }

    #[test]
    fn sampling_an_empty_unit_fails() {
        let context = Context::new(Viewport::from_size(64, 64));
        assert_eq!(
            context.bound_textures(&[0, 2]).unwrap_err(),
            RendererError::TextureUnitUnbound(0)
        );
        assert!(context.bound_textures(&[]).unwrap().is_empty());
    }

    #[test]
    fn default_registry_has_builtins() {
        let context = Context::new(Viewport::from_size(64, 64));
        assert!(context.registry().contains("og_viewportOrthographicMatrix"));
        assert!(context.registry().contains("og_oneOverPi"));
    }

    #[test]
    fn depth_test_needs_a_depth_target() {
        let state = RenderState::default();
        assert!(state.depth_test.enabled);
        assert_eq!(
            depth_attachment(&state, None::<()>, Some(wgpu::TextureFormat::Depth32Float)).unwrap_err(),
            RendererError::MissingDepthTarget
        );
        assert_eq!(
            depth_attachment(&state, Some(()), None).unwrap_err(),
            RendererError::MissingDepthTarget
        );
        assert_eq!(
            depth_attachment(&state, Some(()), Some(wgpu::TextureFormat::Depth32Float)).unwrap(),
            Some(((), wgpu::TextureFormat::Depth32Float))
        );
    }

    #[test]
    fn without_depth_test_the_target_may_lack_depth() {
        let mut state = RenderState::default();
        state.depth_test.enabled = false;
        assert_eq!(depth_attachment(&state, None::<()>, None).unwrap(), None);
    }

    // ── viewport cropping ─────────────────────────────────────────────────

    #[test]
    fn applied_viewport_follows_set_viewport() {
        let mut context = Context::new(Viewport::from_size(640, 480));
        context.applied_viewport = Viewport::from_size(100, 100);
        context.set_viewport(Viewport::new(10, 10, 100, 50));
        assert_eq!(context.applied_viewport(), Viewport::new(10, 10, 100, 50));
        assert!(context
            .clip_space_remap(&RenderState::default())
            .abs_diff_eq(DMat4::IDENTITY, 1e-12));
    }

    #[test]
    fn cropped_viewport_clips_projection_uniforms() {
        let mut context = Context::new(Viewport::new(0, 0, 200, 100));
        context.applied_viewport = Viewport::new(0, 0, 100, 100);

        let uniforms = draw_uniforms(&context, &RenderState::default());
        let ortho = uniforms.value::<Mat4>("og_viewportOrthographicMatrix").unwrap();
        let window = uniforms.value::<Mat4>("og_viewportTransformationMatrix").unwrap();

        let p = Vec3::new(80.0, 50.0, 0.0);
        let rasterized = window.transform_point3(ortho.transform_point3(p));
        assert!((rasterized - p).length() < 1e-4, "{p} rasterized at {rasterized}");
    }
}
