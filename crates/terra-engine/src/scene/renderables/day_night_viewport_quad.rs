use std::sync::Arc;

use crate::coords::Viewport;
use crate::render::{
    AttachedVertexBuffer, BufferHint, ComponentDatatype, Context, DrawState, PrimitiveType,
    RenderCtx, RenderState, RenderTarget, RendererError, Texture2D, VertexArray, VertexBuffer,
    HALF_ONE, HALF_ZERO,
};
use crate::scene::SceneState;

const SHADER: &str = include_str!("shaders/day_night_viewport_quad.wgsl");

const DAY_UNIT: usize = 0;
const NIGHT_UNIT: usize = 1;
const BLEND_UNIT: usize = 2;

/// Strip order: bottom-left, bottom-right, top-left, top-right.
const TEXTURE_COORDINATES: [[u16; 2]; 4] = [
    [HALF_ZERO, HALF_ONE],
    [HALF_ONE, HALF_ONE],
    [HALF_ZERO, HALF_ZERO],
    [HALF_ONE, HALF_ZERO],
];

/// Quad corners in framebuffer pixels, in the same order as
/// [`TEXTURE_COORDINATES`].
fn quad_positions(viewport: Viewport) -> [[f32; 2]; 4] {
    let left = viewport.left() as f32;
    let right = viewport.right() as f32;
    let top = viewport.top() as f32;
    let bottom = viewport.bottom() as f32;
    [[left, bottom], [right, bottom], [left, top], [right, top]]
}

/// Remembers which viewport the position buffer was last built for.
#[derive(Debug, Default)]
struct QuadGeometry {
    viewport: Option<Viewport>,
}

impl QuadGeometry {
    /// New corner positions if `viewport` differs from the last one built.
    fn rebuild_for(&mut self, viewport: Viewport) -> Option<[[f32; 2]; 4]> {
        if self.viewport == Some(viewport) {
            return None;
        }
        self.viewport = Some(viewport);
        Some(quad_positions(viewport))
    }
}

fn required<T>(slot: &Option<Arc<T>>, name: &'static str) -> Result<Arc<T>, RendererError> {
    slot.clone().ok_or(RendererError::MissingTexture(name))
}

/// Fills the viewport with a day texture and a night texture, mixed by the
/// red channel of a blend texture.
pub struct DayNightViewportQuad {
    draw_state: DrawState,
    positions: VertexBuffer,
    geometry: QuadGeometry,

    pub day_texture: Option<Arc<Texture2D>>,
    pub night_texture: Option<Arc<Texture2D>>,
    pub blend_texture: Option<Arc<Texture2D>>,
}

impl DayNightViewportQuad {
    pub fn new(ctx: &RenderCtx<'_>, context: &Context) -> Result<Self, RendererError> {
        let mut render_state = RenderState::default();
        render_state.facet_culling.enabled = false;
        render_state.depth_test.enabled = false;

        let program = context.create_shader_program(ctx.device, "day night viewport quad", SHADER)?;

        let positions = VertexBuffer::new(
            ctx,
            "day night quad positions",
            BufferHint::DynamicDraw,
            std::mem::size_of::<[[f32; 2]; 4]>() as u64,
        );
        let texture_coordinates = VertexBuffer::new(
            ctx,
            "day night quad texture coordinates",
            BufferHint::StaticDraw,
            std::mem::size_of::<[[u16; 2]; 4]>() as u64,
        );
        texture_coordinates.copy_from_system_memory(ctx.queue, &TEXTURE_COORDINATES, 0)?;

        let mut vertex_array = VertexArray::new();
        vertex_array.attach(
            program.vertex_attribute("position")?.location,
            AttachedVertexBuffer::new(positions.clone(), ComponentDatatype::Float, 2),
        );
        vertex_array.attach(
            program.vertex_attribute("textureCoordinates")?.location,
            AttachedVertexBuffer::new(texture_coordinates, ComponentDatatype::HalfFloat, 2),
        );

        Ok(Self {
            draw_state: DrawState::new(render_state, program, vertex_array),
            positions,
            geometry: QuadGeometry::default(),
            day_texture: None,
            night_texture: None,
            blend_texture: None,
        })
    }

    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        context: &mut Context,
        scene_state: &SceneState,
    ) -> Result<(), RendererError> {
        let day = required(&self.day_texture, "day_texture")?;
        let night = required(&self.night_texture, "night_texture")?;
        let blend = required(&self.blend_texture, "blend_texture")?;

        if let Some(positions) = self.geometry.rebuild_for(context.viewport()) {
            log::debug!("day night quad: geometry for {:?}", context.viewport());
            self.positions
                .record_copy_from_system_memory(ctx.device, target.encoder, &positions, 0)?;
        }

        let units = context.texture_units_mut();
        units.set(DAY_UNIT, Some(day));
        units.set(NIGHT_UNIT, Some(night));
        units.set(BLEND_UNIT, Some(blend));

        context.draw(
            ctx,
            target,
            PrimitiveType::TriangleStrip,
            &mut self.draw_state,
            scene_state,
        )
    }
}
