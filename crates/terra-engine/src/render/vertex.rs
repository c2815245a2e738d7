//! Vertex buffers and vertex arrays.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::render::{upload, RenderCtx, RendererError};

/// Expected update frequency of a buffer's contents.
///
/// wgpu has no usage hints; the hint is kept for diagnostics and to size
/// future staging strategies.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BufferHint {
    StaticDraw,
    DynamicDraw,
    StreamDraw,
}

/// Per-component storage type of a vertex attribute.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ComponentDatatype {
    Float,
    HalfFloat,
    Int,
    UnsignedInt,
    UnsignedShortNormalized,
    UnsignedByteNormalized,
}

/// Kind of data a shader input reads, as far as vertex fetch is concerned.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum AttributeKind {
    Float,
    Sint,
    Uint,
}

impl ComponentDatatype {
    pub const fn size_in_bytes(self) -> u64 {
        match self {
            Self::Float | Self::Int | Self::UnsignedInt => 4,
            Self::HalfFloat | Self::UnsignedShortNormalized => 2,
            Self::UnsignedByteNormalized => 1,
        }
    }

    /// What the shader sees after vertex fetch.
    pub const fn attribute_kind(self) -> AttributeKind {
        match self {
            Self::Int => AttributeKind::Sint,
            Self::UnsignedInt => AttributeKind::Uint,
            _ => AttributeKind::Float,
        }
    }

    /// Vertex format for `components` values of this type.
    ///
    /// wgpu has no 1- or 3-component formats for 8/16-bit types; those
    /// combinations return `None`.
    pub fn vertex_format(self, components: u32) -> Option<wgpu::VertexFormat> {
        use wgpu::VertexFormat as F;
        let format = match (self, components) {
            (Self::Float, 1) => F::Float32,
            (Self::Float, 2) => F::Float32x2,
            (Self::Float, 3) => F::Float32x3,
            (Self::Float, 4) => F::Float32x4,
            (Self::HalfFloat, 2) => F::Float16x2,
            (Self::HalfFloat, 4) => F::Float16x4,
            (Self::Int, 1) => F::Sint32,
            (Self::Int, 2) => F::Sint32x2,
            (Self::Int, 3) => F::Sint32x3,
            (Self::Int, 4) => F::Sint32x4,
            (Self::UnsignedInt, 1) => F::Uint32,
            (Self::UnsignedInt, 2) => F::Uint32x2,
            (Self::UnsignedInt, 3) => F::Uint32x3,
            (Self::UnsignedInt, 4) => F::Uint32x4,
            (Self::UnsignedShortNormalized, 2) => F::Unorm16x2,
            (Self::UnsignedShortNormalized, 4) => F::Unorm16x4,
            (Self::UnsignedByteNormalized, 2) => F::Unorm8x2,
            (Self::UnsignedByteNormalized, 4) => F::Unorm8x4,
            _ => return None,
        };
        Some(format)
    }
}

/// Half-precision bit patterns for values used by generated geometry.
pub const HALF_ZERO: u16 = 0x0000;
pub const HALF_ONE: u16 = 0x3c00;

struct VertexBufferInner {
    id: u64,
    buffer: wgpu::Buffer,
    size: u64,
    hint: BufferHint,
}

/// A fixed-size GPU vertex buffer.
///
/// Cloning shares the underlying buffer.
#[derive(Clone)]
pub struct VertexBuffer {
    inner: Arc<VertexBufferInner>,
}

impl VertexBuffer {
    pub fn new(ctx: &RenderCtx<'_>, label: &str, hint: BufferHint, size_in_bytes: u64) -> Self {
        // Buffer copies must be 4-byte aligned.
        let size = size_in_bytes.next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT).max(wgpu::COPY_BUFFER_ALIGNMENT);
        let buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        log::debug!("vertex buffer `{label}`: {size_in_bytes} bytes ({hint:?})");

        Self {
            inner: Arc::new(VertexBufferInner {
                id: crate::render::next_resource_id(),
                buffer,
                size: size_in_bytes,
                hint,
            }),
        }
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    #[inline]
    pub fn size_in_bytes(&self) -> u64 {
        self.inner.size
    }

    #[inline]
    pub fn hint(&self) -> BufferHint {
        self.inner.hint
    }

    #[inline]
    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.inner.buffer
    }

    /// Copies `data` into the buffer starting at `offset` bytes.
    pub fn copy_from_system_memory<T: bytemuck::Pod>(
        &self,
        queue: &wgpu::Queue,
        data: &[T],
        offset: u64,
    ) -> Result<(), RendererError> {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        let len = bytes.len() as u64;
        check_write(self.inner.size, offset, len)?;
        if len == 0 {
            return Ok(());
        }

        if len % wgpu::COPY_BUFFER_ALIGNMENT == 0 {
            queue.write_buffer(&self.inner.buffer, offset, bytes);
        } else {
            let mut padded = bytes.to_vec();
            padded.resize(len.next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT) as usize, 0);
            queue.write_buffer(&self.inner.buffer, offset, &padded);
        }
        Ok(())
    }

    /// Like [`copy_from_system_memory`](Self::copy_from_system_memory), but
    /// recorded into `encoder` so the write is ordered with the passes
    /// around it.
    pub fn record_copy_from_system_memory<T: bytemuck::Pod>(
        &self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        data: &[T],
        offset: u64,
    ) -> Result<(), RendererError> {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        check_write(self.inner.size, offset, bytes.len() as u64)?;
        upload::record_write(device, encoder, "vertex staging", &self.inner.buffer, offset, bytes);
        Ok(())
    }
}

impl std::fmt::Debug for VertexBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VertexBuffer")
            .field("id", &self.inner.id)
            .field("size", &self.inner.size)
            .field("hint", &self.inner.hint)
            .finish()
    }
}

fn check_write(size: u64, offset: u64, len: u64) -> Result<(), RendererError> {
    let fits = offset % wgpu::COPY_BUFFER_ALIGNMENT == 0
        && offset.checked_add(len).is_some_and(|end| end <= size);
    if fits {
        Ok(())
    } else {
        Err(RendererError::BufferOverflow { size, offset, len })
    }
}

/// A vertex buffer plus the layout of the single attribute it feeds.
#[derive(Debug, Clone)]
pub struct AttachedVertexBuffer {
    pub vertex_buffer: VertexBuffer,
    pub component_datatype: ComponentDatatype,
    pub number_of_components: u32,
}

impl AttachedVertexBuffer {
    pub fn new(
        vertex_buffer: VertexBuffer,
        component_datatype: ComponentDatatype,
        number_of_components: u32,
    ) -> Self {
        Self {
            vertex_buffer,
            component_datatype,
            number_of_components,
        }
    }

    /// Bytes between consecutive vertices (tightly packed).
    #[inline]
    pub fn stride(&self) -> u64 {
        self.component_datatype.size_in_bytes() * self.number_of_components as u64
    }

    /// Whole vertices that fit in the buffer.
    pub fn vertex_count(&self) -> u32 {
        let stride = self.stride();
        if stride == 0 {
            return 0;
        }
        (self.vertex_buffer.size_in_bytes() / stride).min(u32::MAX as u64) as u32
    }
}

/// One vertex buffer layout entry used to key pipelines.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct VertexLayoutEntry {
    pub location: u32,
    pub format: wgpu::VertexFormat,
    pub stride: u64,
}

/// Vertex buffers bound to shader input locations.
#[derive(Debug, Clone, Default)]
pub struct VertexArray {
    attached: BTreeMap<u32, AttachedVertexBuffer>,
}

impl VertexArray {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches `buffer` to shader location `location`, replacing any
    /// previous attachment.
    pub fn attach(&mut self, location: u32, buffer: AttachedVertexBuffer) {
        self.attached.insert(location, buffer);
    }

    pub fn detach(&mut self, location: u32) -> Option<AttachedVertexBuffer> {
        self.attached.remove(&location)
    }

    pub fn get(&self, location: u32) -> Option<&AttachedVertexBuffer> {
        self.attached.get(&location)
    }

    /// Attached buffers in ascending location order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &AttachedVertexBuffer)> {
        self.attached.iter().map(|(&l, b)| (l, b))
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.attached.is_empty()
    }

    /// Number of vertices every attached buffer can supply.
    pub fn vertex_count(&self) -> u32 {
        self.attached
            .values()
            .map(AttachedVertexBuffer::vertex_count)
            .min()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_float_pairs_map_to_float16x2() {
        assert_eq!(
            ComponentDatatype::HalfFloat.vertex_format(2),
            Some(wgpu::VertexFormat::Float16x2)
        );
        assert_eq!(ComponentDatatype::HalfFloat.vertex_format(3), None);
    }

    #[test]
    fn integer_datatypes_feed_integer_inputs() {
        assert_eq!(ComponentDatatype::Int.attribute_kind(), AttributeKind::Sint);
        assert_eq!(ComponentDatatype::UnsignedByteNormalized.attribute_kind(), AttributeKind::Float);
    }

    #[test]
    fn half_constants_decode() {
        // sign 0, exponent 15 (bias 15), mantissa 0 => 1.0
        assert_eq!(HALF_ONE >> 10, 15);
        assert_eq!(HALF_ONE & 0x3ff, 0);
        assert_eq!(HALF_ZERO, 0);
    }

    #[test]
    fn writes_must_fit_and_be_aligned() {
        assert!(check_write(32, 0, 32).is_ok());
        assert!(check_write(32, 16, 16).is_ok());
        assert_eq!(
            check_write(32, 16, 20),
            Err(RendererError::BufferOverflow { size: 32, offset: 16, len: 20 })
        );
        assert!(check_write(32, 2, 4).is_err());
        assert!(check_write(32, u64::MAX, 4).is_err());
    }
}
