//! Shader programs: WGSL reflection plus per-program GPU state.

mod program;
mod reflect;

pub(crate) use program::PipelineKey;
pub use program::ShaderProgram;
pub use reflect::{
    reflect, ProgramInterface, ShaderVertexAttribute, UniformBlockLayout, FRAGMENT_ENTRY_POINT,
    TEXTURE_GROUP, UNIFORM_BINDING, UNIFORM_GROUP, VERTEX_ENTRY_POINT,
};
