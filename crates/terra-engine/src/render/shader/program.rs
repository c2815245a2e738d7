use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::render::automatic::{AutomaticUniformRegistry, DrawAutomaticUniform};
use crate::render::state::PipelineStateKey;
use crate::render::texture::Texture2D;
use crate::render::uniform::{UniformBlock, Uniforms};
use crate::render::vertex::{ComponentDatatype, VertexArray, VertexBuffer, VertexLayoutEntry};
use crate::render::{upload, Context, PrimitiveType, RenderState, RendererError};
use crate::scene::SceneState;

use super::reflect::{
    self, ProgramInterface, ShaderVertexAttribute, FRAGMENT_ENTRY_POINT, VERTEX_ENTRY_POINT,
};

/// Bind groups kept per program before the cache is flushed.
const MAX_TEXTURE_BIND_GROUPS: usize = 64;

/// Everything that selects a distinct render pipeline for one program.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct PipelineKey {
    pub state: PipelineStateKey,
    pub primitive: PrimitiveType,
    pub vertex_layout: Vec<VertexLayoutEntry>,
    pub color_format: wgpu::TextureFormat,
    pub depth_format: Option<wgpu::TextureFormat>,
}

/// GPU objects bound for one draw.
pub(crate) struct PreparedDraw<'a> {
    pub pipeline: &'a wgpu::RenderPipeline,
    pub uniform_bind_group: &'a wgpu::BindGroup,
    pub texture_bind_group: &'a wgpu::BindGroup,
}

struct UniformBuffer {
    staging: UniformBlock,
    buffer: wgpu::Buffer,
}

/// A compiled WGSL program with its uniforms and cached pipelines.
pub struct ShaderProgram {
    label: String,
    module: wgpu::ShaderModule,
    interface: ProgramInterface,

    uniforms: Uniforms,
    draw_uniforms: Vec<Box<dyn DrawAutomaticUniform>>,
    uniform_buffer: Option<UniformBuffer>,
    uniform_bind_group: wgpu::BindGroup,

    texture_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,

    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    texture_bind_groups: HashMap<Vec<u64>, wgpu::BindGroup>,
}

impl ShaderProgram {
    /// Compiles `source`, reflects its interface and binds automatic uniforms
    /// from `registry`.
    pub fn new(
        device: &wgpu::Device,
        label: &str,
        source: &str,
        registry: &AutomaticUniformRegistry,
    ) -> Result<Self, RendererError> {
        let interface = reflect::reflect(label, source)?;

        let members = interface
            .uniform_block
            .as_ref()
            .map(|b| b.members.as_slice())
            .unwrap_or_default();
        let mut uniforms = Uniforms::from_members(members);
        let draw_uniforms = registry.bind(&mut uniforms)?;

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        let uniform_size = interface
            .uniform_block
            .as_ref()
            .map(|b| (b.size as u64).next_multiple_of(16))
            .filter(|&size| size > 0);

        let uniform_layout_entries: Vec<wgpu::BindGroupLayoutEntry> = uniform_size
            .map(|size| wgpu::BindGroupLayoutEntry {
                binding: reflect::UNIFORM_BINDING,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(size),
                },
                count: None,
            })
            .into_iter()
            .collect();
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(format!("{label} uniforms bgl").as_str()),
            entries: &uniform_layout_entries,
        });

        let uniform_buffer = uniform_size.map(|size| UniformBuffer {
            staging: UniformBlock::new(size as usize),
            buffer: device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(format!("{label} uniforms").as_str()),
                size,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }),
        });

        let uniform_entries: Vec<wgpu::BindGroupEntry<'_>> = uniform_buffer
            .iter()
            .map(|u| wgpu::BindGroupEntry {
                binding: reflect::UNIFORM_BINDING,
                resource: u.buffer.as_entire_binding(),
            })
            .collect();
        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(format!("{label} uniforms bg").as_str()),
            layout: &uniform_layout,
            entries: &uniform_entries,
        });

        let texture_entries: Vec<wgpu::BindGroupLayoutEntry> = interface
            .texture_units
            .iter()
            .flat_map(|&unit| {
                [
                    wgpu::BindGroupLayoutEntry {
                        binding: unit * 2,
                        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: unit * 2 + 1,
                        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ]
            })
            .collect();
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(format!("{label} textures bgl").as_str()),
            entries: &texture_entries,
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(format!("{label} pipeline layout").as_str()),
            bind_group_layouts: &[&uniform_layout, &texture_layout],
            immediate_size: 0,
        });

        log::debug!(
            "shader program `{label}`: {} uniforms ({} automatic), {} attributes, texture units {:?}",
            uniforms.len(),
            draw_uniforms.len(),
            interface.vertex_attributes.len(),
            interface.texture_units,
        );

        Ok(Self {
            label: label.to_string(),
            module,
            interface,
            uniforms,
            draw_uniforms,
            uniform_buffer,
            uniform_bind_group,
            texture_layout,
            pipeline_layout,
            pipelines: HashMap::new(),
            texture_bind_groups: HashMap::new(),
        })
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn interface(&self) -> &ProgramInterface {
        &self.interface
    }

    /// Vertex shader inputs, ascending by location.
    pub fn vertex_attributes(&self) -> &[ShaderVertexAttribute] {
        &self.interface.vertex_attributes
    }

    pub fn vertex_attribute(&self, name: &str) -> Result<&ShaderVertexAttribute, RendererError> {
        self.interface
            .vertex_attributes
            .iter()
            .find(|a| a.name == name)
            .ok_or_else(|| RendererError::UnknownVertexAttribute(name.to_string()))
    }

    /// Texture units sampled by the program, ascending.
    pub fn texture_units(&self) -> &[u32] {
        &self.interface.texture_units
    }

    pub fn uniforms(&self) -> &Uniforms {
        &self.uniforms
    }

    pub fn uniforms_mut(&mut self) -> &mut Uniforms {
        &mut self.uniforms
    }

    /// Records the upload of dirty uniforms into `encoder`, ahead of the
    /// passes recorded after it. Returns how many uniforms were flushed.
    pub fn clean(&mut self, device: &wgpu::Device, encoder: &mut wgpu::CommandEncoder) -> usize {
        let Some(ub) = self.uniform_buffer.as_mut() else {
            return 0;
        };
        let flushed = self.uniforms.clean(&mut ub.staging);
        if let Some((offset, bytes)) = ub.staging.take_dirty_bytes() {
            upload::record_write(
                device,
                encoder,
                "uniform staging",
                &ub.buffer,
                offset as u64,
                bytes,
            );
            log::trace!(
                "`{}`: flushed {flushed} uniforms ({offset}..{})",
                self.label,
                offset + bytes.len()
            );
        }
        flushed
    }

    pub(crate) fn set_draw_uniforms(
        &mut self,
        context: &Context,
        render_state: &RenderState,
        scene_state: &SceneState,
    ) -> Result<(), RendererError> {
        for uniform in &self.draw_uniforms {
            uniform.set(context, render_state, scene_state, &mut self.uniforms)?;
        }
        Ok(())
    }

    /// Matches the program's inputs against `vertex_array`, in location order.
    pub(crate) fn vertex_bindings<'v>(
        &self,
        vertex_array: &'v VertexArray,
    ) -> Result<Vec<(VertexLayoutEntry, &'v VertexBuffer)>, RendererError> {
        self.interface
            .vertex_attributes
            .iter()
            .map(|attribute| {
                let attached = vertex_array
                    .get(attribute.location)
                    .ok_or_else(|| missing(attribute))?;
                let entry = layout_entry(
                    attribute,
                    Some((attached.component_datatype, attached.number_of_components)),
                )?;
                Ok((entry, &attached.vertex_buffer))
            })
            .collect()
    }

    /// Fetches or creates the pipeline for `key` and the texture bind group
    /// for `textures` (one per sampled unit, in unit order).
    pub(crate) fn prepare(
        &mut self,
        device: &wgpu::Device,
        key: PipelineKey,
        textures: &[Arc<Texture2D>],
    ) -> PreparedDraw<'_> {
        if !self.pipelines.contains_key(&key) {
            let pipeline = self.create_pipeline(device, &key);
            self.pipelines.insert(key.clone(), pipeline);
        }

        let ids: Vec<u64> = textures.iter().map(|t| t.id()).collect();
        if !self.texture_bind_groups.contains_key(&ids) {
            if self.texture_bind_groups.len() >= MAX_TEXTURE_BIND_GROUPS {
                log::debug!("`{}`: texture bind group cache full, clearing", self.label);
                self.texture_bind_groups.clear();
            }
            let bind_group = self.create_texture_bind_group(device, textures);
            self.texture_bind_groups.insert(ids.clone(), bind_group);
        }

        PreparedDraw {
            pipeline: &self.pipelines[&key],
            uniform_bind_group: &self.uniform_bind_group,
            texture_bind_group: &self.texture_bind_groups[&ids],
        }
    }

    fn create_pipeline(&self, device: &wgpu::Device, key: &PipelineKey) -> wgpu::RenderPipeline {
        log::debug!(
            "`{}`: creating pipeline {:?} {:?} (color {:?}, depth {:?})",
            self.label,
            key.primitive,
            key.state,
            key.color_format,
            key.depth_format,
        );

        let attributes: Vec<[wgpu::VertexAttribute; 1]> = key
            .vertex_layout
            .iter()
            .map(|e| {
                [wgpu::VertexAttribute {
                    format: e.format,
                    offset: 0,
                    shader_location: e.location,
                }]
            })
            .collect();
        let buffers: Vec<wgpu::VertexBufferLayout<'_>> = key
            .vertex_layout
            .iter()
            .zip(&attributes)
            .map(|(e, attrs)| wgpu::VertexBufferLayout {
                array_stride: e.stride,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: attrs,
            })
            .collect();

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(self.label.as_str()),
            layout: Some(&self.pipeline_layout),

            vertex: wgpu::VertexState {
                module: &self.module,
                entry_point: Some(VERTEX_ENTRY_POINT),
                compilation_options: Default::default(),
                buffers: &buffers,
            },

            fragment: Some(wgpu::FragmentState {
                module: &self.module,
                entry_point: Some(FRAGMENT_ENTRY_POINT),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: key.color_format,
                    blend: key.state.blend_state(),
                    write_mask: key.state.color_writes(),
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: key.primitive.topology(),
                strip_index_format: None,
                front_face: key.state.front_face(),
                cull_mode: key.state.cull_mode(),
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },

            depth_stencil: key.state.depth_stencil(key.depth_format),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        })
    }

    fn create_texture_bind_group(
        &self,
        device: &wgpu::Device,
        textures: &[Arc<Texture2D>],
    ) -> wgpu::BindGroup {
        log::debug!(
            "`{}`: creating texture bind group for {:?}",
            self.label,
            textures.iter().map(|t| t.id()).collect::<Vec<_>>()
        );

        let entries: Vec<wgpu::BindGroupEntry<'_>> = self
            .interface
            .texture_units
            .iter()
            .zip(textures)
            .flat_map(|(&unit, texture)| {
                [
                    wgpu::BindGroupEntry {
                        binding: unit * 2,
                        resource: wgpu::BindingResource::TextureView(texture.view()),
                    },
                    wgpu::BindGroupEntry {
                        binding: unit * 2 + 1,
                        resource: wgpu::BindingResource::Sampler(texture.sampler()),
                    },
                ]
            })
            .collect();

        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(format!("{} textures bg", self.label).as_str()),
            layout: &self.texture_layout,
            entries: &entries,
        })
    }
}

/// Layout entry for `attribute` fed by `attached` (datatype, components).
fn layout_entry(
    attribute: &ShaderVertexAttribute,
    attached: Option<(ComponentDatatype, u32)>,
) -> Result<VertexLayoutEntry, RendererError> {
    let (datatype, components) = attached.ok_or_else(|| missing(attribute))?;
    let incompatible = || RendererError::IncompatibleVertexAttribute {
        name: attribute.name.clone(),
        location: attribute.location,
    };
    if datatype.attribute_kind() != attribute.kind {
        return Err(incompatible());
    }
    let format = datatype.vertex_format(components).ok_or_else(incompatible)?;

    Ok(VertexLayoutEntry {
        location: attribute.location,
        format,
        stride: datatype.size_in_bytes() * components as u64,
    })
}

fn missing(attribute: &ShaderVertexAttribute) -> RendererError {
    RendererError::MissingVertexAttribute {
        name: attribute.name.clone(),
        location: attribute.location,
    }
}

impl fmt::Debug for ShaderProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShaderProgram")
            .field("label", &self.label)
            .field("interface", &self.interface)
            .field("uniforms", &self.uniforms)
            .field("pipelines", &self.pipelines.len())
            .field("texture_bind_groups", &self.texture_bind_groups.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::AttributeKind;

    fn attribute(name: &str, location: u32, kind: AttributeKind, components: u32) -> ShaderVertexAttribute {
        ShaderVertexAttribute {
            name: name.to_string(),
            location,
            kind,
            components,
        }
    }

    // ── vertex layout ─────────────────────────────────────────────────────

    #[test]
    fn attached_buffer_gives_layout_entry() {
        let position = attribute("position", 0, AttributeKind::Float, 2);
        let entry = layout_entry(&position, Some((ComponentDatatype::HalfFloat, 2))).unwrap();

        assert_eq!(
            entry,
            VertexLayoutEntry {
                location: 0,
                format: wgpu::VertexFormat::Float16x2,
                stride: 4,
            }
        );
    }

    #[test]
    fn unattached_location_is_missing() {
        let normal = attribute("normal", 3, AttributeKind::Float, 3);
        assert_eq!(
            layout_entry(&normal, None).unwrap_err(),
            RendererError::MissingVertexAttribute {
                name: "normal".into(),
                location: 3,
            }
        );
    }

    #[test]
    fn integer_input_rejects_float_buffer() {
        let id = attribute("id", 1, AttributeKind::Uint, 1);
        assert_eq!(
            layout_entry(&id, Some((ComponentDatatype::Float, 1))).unwrap_err(),
            RendererError::IncompatibleVertexAttribute {
                name: "id".into(),
                location: 1,
            }
        );
        assert!(layout_entry(&id, Some((ComponentDatatype::UnsignedInt, 1))).is_ok());
    }

    #[test]
    fn unsupported_component_count_is_incompatible() {
        let color = attribute("color", 2, AttributeKind::Float, 3);
        assert_eq!(
            layout_entry(&color, Some((ComponentDatatype::UnsignedByteNormalized, 3))).unwrap_err(),
            RendererError::IncompatibleVertexAttribute {
                name: "color".into(),
                location: 2,
            }
        );
    }
}
