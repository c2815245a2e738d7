use glam::{IVec2, IVec3, IVec4, Mat4, Vec2, Vec3, Vec4};

/// Data type of a shader uniform as declared in the program's uniform block.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum UniformType {
    Float,
    FloatVector2,
    FloatVector3,
    FloatVector4,
    Int,
    IntVector2,
    IntVector3,
    IntVector4,
    UnsignedInt,
    FloatMatrix44,
}

impl UniformType {
    /// Number of bytes written for a value of this type.
    ///
    /// This is the value size, not the std140 stride; `vec3` occupies 12 bytes
    /// inside a 16 byte slot.
    pub const fn size_in_bytes(self) -> usize {
        match self {
            Self::Float | Self::Int | Self::UnsignedInt => 4,
            Self::FloatVector2 | Self::IntVector2 => 8,
            Self::FloatVector3 | Self::IntVector3 => 12,
            Self::FloatVector4 | Self::IntVector4 => 16,
            Self::FloatMatrix44 => 64,
        }
    }
}

/// Host type that can be stored in a [`Uniform`](super::Uniform).
///
/// Values are compared with `PartialEq` to decide whether a write makes the
/// uniform dirty, and uploaded as their raw `Pod` bytes.
pub trait UniformValue: bytemuck::Pod + PartialEq + std::fmt::Debug + 'static {
    const TYPE: UniformType;

    #[inline]
    fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

macro_rules! uniform_value {
    ($($host:ty => $ty:ident),* $(,)?) => {
        $(
            impl UniformValue for $host {
                const TYPE: UniformType = UniformType::$ty;
            }
        )*
    };
}

uniform_value! {
    f32 => Float,
    Vec2 => FloatVector2,
    Vec3 => FloatVector3,
    Vec4 => FloatVector4,
    i32 => Int,
    IVec2 => IntVector2,
    IVec3 => IntVector3,
    IVec4 => IntVector4,
    u32 => UnsignedInt,
    Mat4 => FloatMatrix44,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_sizes_match_host_types() {
        assert_eq!(Vec3::ZERO.as_bytes().len(), UniformType::FloatVector3.size_in_bytes());
        assert_eq!(Mat4::IDENTITY.as_bytes().len(), UniformType::FloatMatrix44.size_in_bytes());
        assert_eq!(7u32.as_bytes().len(), UniformType::UnsignedInt.size_in_bytes());
    }

    #[test]
    fn matrices_upload_column_major() {
        let m = Mat4::from_cols_array(&[
            1.0, 2.0, 3.0, 4.0, //
            5.0, 6.0, 7.0, 8.0, //
            9.0, 10.0, 11.0, 12.0, //
            13.0, 14.0, 15.0, 16.0,
        ]);
        let floats: &[f32] = bytemuck::cast_slice(m.as_bytes());
        assert_eq!(floats[0], 1.0);
        assert_eq!(floats[4], 5.0);
        assert_eq!(floats[15], 16.0);
    }
}
