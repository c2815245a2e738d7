//! GPU rendering subsystem.
//!
//! A [`Context`] draws a [`DrawState`] (render state, shader program and
//! vertex array) with the textures bound to its units. Programs are WGSL;
//! their uniforms live in one uniform struct at `@group(0) @binding(0)` and
//! are uploaded only when changed.
//!
//! Convention:
//! - Viewports are in framebuffer pixels (top-left origin, +Y down).
//! - Textures are stored top row first.

mod context;
mod ctx;
mod error;
mod state;
mod texture;
mod upload;
mod vertex;

pub mod automatic;
pub mod shader;
pub mod uniform;

use std::sync::atomic::{AtomicU64, Ordering};

pub use context::{Context, DrawState, PrimitiveType};
pub use ctx::{RenderCtx, RenderTarget};
pub use error::RendererError;
pub use shader::ShaderProgram;
pub use state::{
    BlendEquation, BlendKey, Blending, ColorMask, CullFace, DepthRange, DepthTest,
    DepthTestFunction, DestinationBlendingFactor, FacetCulling, PipelineStateKey, RenderState,
    SourceBlendingFactor, WindingOrder,
};
pub use texture::{
    Texture2D, Texture2DDescription, TextureColorSpace, TextureFilter, TextureUnits, TextureWrap,
    TEXTURE_UNIT_COUNT,
};
pub use vertex::{
    AttachedVertexBuffer, AttributeKind, BufferHint, ComponentDatatype, VertexArray, VertexBuffer,
    VertexLayoutEntry, HALF_ONE, HALF_ZERO,
};

static NEXT_RESOURCE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique id for buffers and textures, used to key GPU caches.
pub(crate) fn next_resource_id() -> u64 {
    NEXT_RESOURCE_ID.fetch_add(1, Ordering::Relaxed)
}
