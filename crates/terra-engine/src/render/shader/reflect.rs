//! WGSL reflection.
//!
//! Programs follow a fixed binding convention:
//! - `@group(0) @binding(0) var<uniform>`: one struct holding every uniform
//! - `@group(1) @binding(2n)`: `texture_2d<f32>` for texture unit `n`
//! - `@group(1) @binding(2n + 1)`: `sampler` for texture unit `n`
//! - entry points `vs_main` and `fs_main`

use std::collections::BTreeSet;

use naga::valid::{Capabilities, ValidationFlags};
use naga::{
    AddressSpace, Binding, ImageClass, ImageDimension, Module, ResourceBinding, Scalar,
    ScalarKind, ShaderStage, TypeInner, VectorSize,
};

use crate::render::uniform::{UniformLocation, UniformMember, UniformType};
use crate::render::vertex::AttributeKind;
use crate::render::RendererError;

pub const VERTEX_ENTRY_POINT: &str = "vs_main";
pub const FRAGMENT_ENTRY_POINT: &str = "fs_main";
pub const UNIFORM_GROUP: u32 = 0;
pub const UNIFORM_BINDING: u32 = 0;
pub const TEXTURE_GROUP: u32 = 1;

/// A vertex shader input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderVertexAttribute {
    pub name: String,
    pub location: u32,
    pub kind: AttributeKind,
    pub components: u32,
}

/// Layout of the program's uniform struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformBlockLayout {
    /// Size of the struct in bytes, including trailing padding.
    pub size: u32,
    pub members: Vec<UniformMember>,
}

/// Everything the renderer needs to know about a program's interface.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgramInterface {
    pub uniform_block: Option<UniformBlockLayout>,
    pub vertex_attributes: Vec<ShaderVertexAttribute>,
    /// Texture units sampled by the program, ascending.
    pub texture_units: Vec<u32>,
}

/// Parses and validates `source`, then extracts its [`ProgramInterface`].
pub fn reflect(label: &str, source: &str) -> Result<ProgramInterface, RendererError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| RendererError::ShaderCompilation {
        label: label.to_string(),
        message: e.emit_to_string(source),
    })?;
    naga::valid::Validator::new(ValidationFlags::all(), Capabilities::default())
        .validate(&module)
        .map_err(|e| RendererError::ShaderCompilation {
            label: label.to_string(),
            message: e.emit_to_string(source),
        })?;

    let unsupported = |message: String| RendererError::UnsupportedShaderInterface {
        label: label.to_string(),
        message,
    };

    for (name, stage) in [
        (VERTEX_ENTRY_POINT, ShaderStage::Vertex),
        (FRAGMENT_ENTRY_POINT, ShaderStage::Fragment),
    ] {
        if !module
            .entry_points
            .iter()
            .any(|ep| ep.name == name && ep.stage == stage)
        {
            return Err(unsupported(format!("missing {stage:?} entry point `{name}`")));
        }
    }

    let uniform_block = reflect_uniform_block(&module).map_err(unsupported)?;
    let texture_units = reflect_texture_units(&module).map_err(unsupported)?;
    let vertex_attributes = reflect_vertex_attributes(&module).map_err(unsupported)?;

    Ok(ProgramInterface {
        uniform_block,
        vertex_attributes,
        texture_units,
    })
}

fn reflect_uniform_block(module: &Module) -> Result<Option<UniformBlockLayout>, String> {
    let mut block = None;

    for (_, var) in module.global_variables.iter() {
        if var.space != AddressSpace::Uniform {
            continue;
        }
        let var_name = var.name.as_deref().unwrap_or("<unnamed>");

        match var.binding {
            Some(ResourceBinding { group, binding })
                if group == UNIFORM_GROUP && binding == UNIFORM_BINDING => {}
            _ => {
                return Err(format!(
                    "uniform `{var_name}` must use @group({UNIFORM_GROUP}) @binding({UNIFORM_BINDING})"
                ));
            }
        }
        if block.is_some() {
            return Err(format!("uniform `{var_name}`: only one uniform block is supported"));
        }

        let TypeInner::Struct { members, span } = &module.types[var.ty].inner else {
            return Err(format!("uniform `{var_name}` must be a struct"));
        };

        let members = members
            .iter()
            .map(|m| {
                let name = m.name.clone().unwrap_or_default();
                let ty = uniform_type(&module.types[m.ty].inner)
                    .ok_or_else(|| format!("uniform `{name}` has an unsupported type"))?;
                Ok(UniformMember {
                    name,
                    ty,
                    location: UniformLocation(m.offset),
                })
            })
            .collect::<Result<Vec<_>, String>>()?;

        block = Some(UniformBlockLayout {
            size: *span,
            members,
        });
    }

    Ok(block)
}

fn reflect_texture_units(module: &Module) -> Result<Vec<u32>, String> {
    let mut textures = BTreeSet::new();
    let mut samplers = BTreeSet::new();

    for (_, var) in module.global_variables.iter() {
        if var.space != AddressSpace::Handle {
            continue;
        }
        let var_name = var.name.as_deref().unwrap_or("<unnamed>");
        let Some(ResourceBinding { group, binding }) = var.binding else {
            continue;
        };
        if group != TEXTURE_GROUP {
            return Err(format!("`{var_name}` must be in @group({TEXTURE_GROUP})"));
        }

        match module.types[var.ty].inner {
            TypeInner::Image {
                dim: ImageDimension::D2,
                arrayed: false,
                class:
                    ImageClass::Sampled {
                        kind: ScalarKind::Float,
                        multi: false,
                    },
            } if binding % 2 == 0 => {
                textures.insert(binding / 2);
            }
            TypeInner::Sampler { comparison: false } if binding % 2 == 1 => {
                samplers.insert(binding / 2);
            }
            _ => {
                return Err(format!(
                    "`{var_name}` at @binding({binding}) must be a texture_2d<f32> (even binding) \
                     or a sampler (odd binding)"
                ));
            }
        }
    }

    if textures != samplers {
        return Err(format!(
            "texture units {textures:?} and sampler units {samplers:?} must match"
        ));
    }

    Ok(textures.into_iter().collect())
}

fn reflect_vertex_attributes(module: &Module) -> Result<Vec<ShaderVertexAttribute>, String> {
    let Some(entry) = module
        .entry_points
        .iter()
        .find(|ep| ep.stage == ShaderStage::Vertex && ep.name == VERTEX_ENTRY_POINT)
    else {
        return Ok(Vec::new());
    };

    let mut attributes = Vec::new();
    for arg in &entry.function.arguments {
        match (&arg.binding, &module.types[arg.ty].inner) {
            (Some(binding), inner) => {
                push_attribute(&mut attributes, arg.name.as_deref(), binding, inner)?;
            }
            (None, TypeInner::Struct { members, .. }) => {
                for m in members {
                    if let Some(binding) = &m.binding {
                        push_attribute(
                            &mut attributes,
                            m.name.as_deref(),
                            binding,
                            &module.types[m.ty].inner,
                        )?;
                    }
                }
            }
            (None, _) => {}
        }
    }

    attributes.sort_by_key(|a| a.location);
    Ok(attributes)
}

fn push_attribute(
    out: &mut Vec<ShaderVertexAttribute>,
    name: Option<&str>,
    binding: &Binding,
    inner: &TypeInner,
) -> Result<(), String> {
    let Binding::Location { location, .. } = *binding else {
        return Ok(());
    };
    let name = name.unwrap_or_default().to_string();

    let (scalar, components) = match *inner {
        TypeInner::Scalar(scalar) => (scalar, 1),
        TypeInner::Vector { size, scalar } => (scalar, vector_len(size)),
        _ => return Err(format!("vertex input `{name}` must be a scalar or vector")),
    };
    let kind = match scalar.kind {
        ScalarKind::Float => AttributeKind::Float,
        ScalarKind::Sint => AttributeKind::Sint,
        ScalarKind::Uint => AttributeKind::Uint,
        _ => return Err(format!("vertex input `{name}` has an unsupported scalar type")),
    };

    out.push(ShaderVertexAttribute {
        name,
        location,
        kind,
        components,
    });
    Ok(())
}

fn vector_len(size: VectorSize) -> u32 {
    match size {
        VectorSize::Bi => 2,
        VectorSize::Tri => 3,
        VectorSize::Quad => 4,
    }
}

fn uniform_type(inner: &TypeInner) -> Option<UniformType> {
    use UniformType as U;
    let ty = match *inner {
        TypeInner::Scalar(Scalar::F32) => U::Float,
        TypeInner::Scalar(Scalar::I32) => U::Int,
        TypeInner::Scalar(Scalar::U32) => U::UnsignedInt,
        TypeInner::Vector { size, scalar: Scalar::F32 } => match size {
            VectorSize::Bi => U::FloatVector2,
            VectorSize::Tri => U::FloatVector3,
            VectorSize::Quad => U::FloatVector4,
        },
        TypeInner::Vector { size, scalar: Scalar::I32 } => match size {
            VectorSize::Bi => U::IntVector2,
            VectorSize::Tri => U::IntVector3,
            VectorSize::Quad => U::IntVector4,
        },
        TypeInner::Matrix {
            columns: VectorSize::Quad,
            rows: VectorSize::Quad,
            scalar: Scalar::F32,
        } => U::FloatMatrix44,
        _ => return None,
    };
    Some(ty)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROGRAM: &str = r#"
struct Uniforms {
    og_modelViewPerspectiveMatrix: mat4x4<f32>,
    og_sunPosition: vec3<f32>,
    og_pi: f32,
    u_color: vec4<f32>,
};

@group(0) @binding(0) var<uniform> u: Uniforms;
@group(1) @binding(0) var og_texture0: texture_2d<f32>;
@group(1) @binding(1) var og_sampler0: sampler;
@group(1) @binding(4) var og_texture2: texture_2d<f32>;
@group(1) @binding(5) var og_sampler2: sampler;

struct VertexInput {
    @location(1) normal: vec3<f32>,
    @location(0) position: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip: vec4<f32>,
    @location(0) normal: vec3<f32>,
};

@vertex
fn vs_main(in: VertexInput, @location(3) id: u32, @builtin(vertex_index) vi: u32) -> VertexOutput {
    var out: VertexOutput;
    out.clip = u.og_modelViewPerspectiveMatrix * in.position;
    out.normal = in.normal * f32(id + vi);
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let a = textureSample(og_texture0, og_sampler0, vec2<f32>(0.0));
    let b = textureSample(og_texture2, og_sampler2, vec2<f32>(0.0));
    return a * b * u.u_color * u.og_pi + vec4<f32>(u.og_sunPosition, 0.0);
}
"#;

    fn with_body(decls: &str) -> String {
        format!(
            "{decls}
@vertex fn vs_main(@location(0) p: vec4<f32>) -> @builtin(position) vec4<f32> {{ return p; }}
@fragment fn fs_main() -> @location(0) vec4<f32> {{ return vec4<f32>(1.0); }}"
        )
    }

    // ── uniform block ─────────────────────────────────────────────────────

    #[test]
    fn uniform_members_get_byte_offsets() {
        let iface = reflect("test", PROGRAM).unwrap();
        let block = iface.uniform_block.unwrap();

        let found: Vec<(&str, UniformType, u32)> = block
            .members
            .iter()
            .map(|m| (m.name.as_str(), m.ty, m.location.0))
            .collect();
        assert_eq!(
            found,
            vec![
                ("og_modelViewPerspectiveMatrix", UniformType::FloatMatrix44, 0),
                ("og_sunPosition", UniformType::FloatVector3, 64),
                ("og_pi", UniformType::Float, 76),
                ("u_color", UniformType::FloatVector4, 80),
            ]
        );
        assert_eq!(block.size, 96);
    }

    #[test]
    fn program_without_uniforms_has_no_block() {
        let iface = reflect("bare", &with_body("")).unwrap();
        assert!(iface.uniform_block.is_none());
        assert!(iface.texture_units.is_empty());
    }

    #[test]
    fn unsupported_uniform_type_is_rejected() {
        let src = with_body(
            "struct U { m: mat3x3<f32> };
             @group(0) @binding(0) var<uniform> u: U;",
        );
        let err = reflect("mat3", &src).unwrap_err();
        assert!(matches!(err, RendererError::UnsupportedShaderInterface { .. }));
    }

    #[test]
    fn uniform_block_in_wrong_group_is_rejected() {
        let src = with_body(
            "struct U { x: f32 };
             @group(2) @binding(0) var<uniform> u: U;",
        );
        assert!(matches!(
            reflect("group", &src),
            Err(RendererError::UnsupportedShaderInterface { .. })
        ));
    }

    // ── textures ──────────────────────────────────────────────────────────

    #[test]
    fn texture_units_follow_binding_pairs() {
        let iface = reflect("test", PROGRAM).unwrap();
        assert_eq!(iface.texture_units, vec![0, 2]);
    }

    #[test]
    fn texture_without_sampler_is_rejected() {
        let src = with_body("@group(1) @binding(0) var t: texture_2d<f32>;");
        assert!(reflect("lonely", &src).is_err());
    }

    // ── vertex inputs ─────────────────────────────────────────────────────

    #[test]
    fn vertex_attributes_sorted_by_location() {
        let iface = reflect("test", PROGRAM).unwrap();
        let found: Vec<(&str, u32, AttributeKind, u32)> = iface
            .vertex_attributes
            .iter()
            .map(|a| (a.name.as_str(), a.location, a.kind, a.components))
            .collect();
        assert_eq!(
            found,
            vec![
                ("position", 0, AttributeKind::Float, 4),
                ("normal", 1, AttributeKind::Float, 3),
                ("id", 3, AttributeKind::Uint, 1),
            ]
        );
    }

    // ── errors ────────────────────────────────────────────────────────────

    #[test]
    fn parse_errors_carry_label() {
        let err = reflect("broken", "fn nope( {").unwrap_err();
        match err {
            RendererError::ShaderCompilation { label, message } => {
                assert_eq!(label, "broken");
                assert!(!message.is_empty());
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn missing_fragment_entry_point_is_rejected() {
        let src = "@vertex fn vs_main() -> @builtin(position) vec4<f32> { return vec4<f32>(0.0); }";
        assert!(matches!(
            reflect("vs-only", src),
            Err(RendererError::UnsupportedShaderInterface { .. })
        ));
    }
}
