use std::fmt;

use super::uniform::UniformType;

/// Errors raised by the renderer object model.
///
/// Device, surface and window failures are reported through `anyhow` by the
/// runtime; this type covers misuse of programs, vertex arrays and textures.
#[derive(Debug, Clone, PartialEq)]
pub enum RendererError {
    /// WGSL source failed to parse.
    ShaderCompilation { label: String, message: String },
    /// The shader declares something the renderer cannot map (wrong group,
    /// unsupported uniform type, ...).
    UnsupportedShaderInterface { label: String, message: String },
    /// No uniform with this name is declared by the program.
    UnknownUniform(String),
    /// The uniform exists but was requested with a different host type.
    UniformTypeMismatch {
        name: String,
        declared: UniformType,
        requested: UniformType,
    },
    /// The program reads a vertex attribute location with no buffer attached.
    MissingVertexAttribute { name: String, location: u32 },
    /// The attached buffer cannot feed the shader input at this location.
    IncompatibleVertexAttribute { name: String, location: u32 },
    /// No vertex attribute with this name is declared by the program.
    UnknownVertexAttribute(String),
    /// The program samples a texture unit that has no texture bound.
    TextureUnitUnbound(u32),
    /// A renderable was asked to draw before a required texture was assigned.
    MissingTexture(&'static str),
    /// Depth testing is enabled but the render target has no depth attachment.
    MissingDepthTarget,
    /// A write would run past the end of a GPU buffer.
    BufferOverflow { size: u64, offset: u64, len: u64 },
    /// Texture data does not match the declared dimensions.
    InvalidTextureData { expected: usize, actual: usize },
    /// A texture dimension exceeds the device's `max_texture_dimension_2d`.
    TextureTooLarge { width: u32, height: u32, max: u32 },
}

impl fmt::Display for RendererError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShaderCompilation { label, message } => {
                write!(f, "shader `{label}` failed to compile: {message}")
            }
            Self::UnsupportedShaderInterface { label, message } => {
                write!(f, "shader `{label}` has an unsupported interface: {message}")
            }
            Self::UnknownUniform(name) => write!(f, "no uniform named `{name}`"),
            Self::UniformTypeMismatch {
                name,
                declared,
                requested,
            } => write!(
                f,
                "uniform `{name}` is declared as {declared:?} but was accessed as {requested:?}"
            ),
            Self::MissingVertexAttribute { name, location } => write!(
                f,
                "vertex attribute `{name}` (location {location}) has no vertex buffer attached"
            ),
            Self::IncompatibleVertexAttribute { name, location } => write!(
                f,
                "vertex buffer attached at location {location} does not match attribute `{name}`"
            ),
            Self::UnknownVertexAttribute(name) => write!(f, "no vertex attribute named `{name}`"),
            Self::TextureUnitUnbound(unit) => write!(f, "texture unit {unit} has no texture bound"),
            Self::MissingTexture(member) => write!(f, "{member} must be set before rendering"),
            Self::MissingDepthTarget => {
                write!(f, "depth test enabled but the render target has no depth attachment")
            }
            Self::BufferOverflow { size, offset, len } => write!(
                f,
                "write of {len} bytes at offset {offset} overflows a {size} byte buffer"
            ),
            Self::InvalidTextureData { expected, actual } => write!(
                f,
                "texture data has {actual} bytes, expected {expected}"
            ),
            Self::TextureTooLarge { width, height, max } => write!(
                f,
                "texture of {width}x{height} exceeds the device limit of {max} per side"
            ),
        }
    }
}

impl std::error::Error for RendererError {}
