use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

use glam::{IVec2, IVec3, IVec4, Mat4, Vec2, Vec3, Vec4};

use crate::render::RendererError;

use super::typed::ErasedUniform;
use super::{DirtyList, Uniform, UniformLocation, UniformSink, UniformType, UniformValue};

/// A uniform declared by a shader, as found by reflection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformMember {
    pub name: String,
    pub ty: UniformType,
    pub location: UniformLocation,
}

/// Typed index of a uniform inside one program's [`Uniforms`].
pub struct UniformHandle<T> {
    index: usize,
    _ty: PhantomData<fn() -> T>,
}

impl<T> UniformHandle<T> {
    #[inline]
    pub fn index(self) -> usize {
        self.index
    }
}

impl<T> Clone for UniformHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for UniformHandle<T> {}

impl<T> fmt::Debug for UniformHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("UniformHandle").field(&self.index).finish()
    }
}

/// The uniforms of one shader program plus the list of those awaiting upload.
pub struct Uniforms {
    uniforms: Vec<Box<dyn ErasedUniform>>,
    by_name: HashMap<String, usize>,
    dirty: DirtyList,
}

impl Uniforms {
    /// Builds the set from reflected members. Every uniform starts dirty.
    pub fn from_members(members: &[UniformMember]) -> Self {
        let mut dirty = DirtyList::new();
        let mut uniforms: Vec<Box<dyn ErasedUniform>> = Vec::with_capacity(members.len());
        let mut by_name = HashMap::with_capacity(members.len());

        for (id, member) in members.iter().enumerate() {
            let uniform = match member.ty {
                UniformType::Float => erased::<f32>(member, id, &mut dirty),
                UniformType::FloatVector2 => erased::<Vec2>(member, id, &mut dirty),
                UniformType::FloatVector3 => erased::<Vec3>(member, id, &mut dirty),
                UniformType::FloatVector4 => erased::<Vec4>(member, id, &mut dirty),
                UniformType::Int => erased::<i32>(member, id, &mut dirty),
                UniformType::IntVector2 => erased::<IVec2>(member, id, &mut dirty),
                UniformType::IntVector3 => erased::<IVec3>(member, id, &mut dirty),
                UniformType::IntVector4 => erased::<IVec4>(member, id, &mut dirty),
                UniformType::UnsignedInt => erased::<u32>(member, id, &mut dirty),
                UniformType::FloatMatrix44 => erased::<Mat4>(member, id, &mut dirty),
            };
            by_name.insert(member.name.clone(), id);
            uniforms.push(uniform);
        }

        Self {
            uniforms,
            by_name,
            dirty,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.uniforms.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.uniforms.is_empty()
    }

    /// Number of uniforms waiting for the next clean.
    #[inline]
    pub fn dirty_count(&self) -> usize {
        self.dirty.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.uniforms.iter().map(|u| u.name())
    }

    pub fn uniform_type(&self, name: &str) -> Option<UniformType> {
        self.by_name
            .get(name)
            .map(|&index| self.uniforms[index].uniform_type())
    }

    pub fn location(&self, name: &str) -> Option<UniformLocation> {
        self.by_name
            .get(name)
            .map(|&index| self.uniforms[index].location())
    }

    /// Resolves `name` to a handle, checking the declared type against `T`.
    pub fn handle<T: UniformValue>(&self, name: &str) -> Result<UniformHandle<T>, RendererError> {
        let &index = self
            .by_name
            .get(name)
            .ok_or_else(|| RendererError::UnknownUniform(name.to_string()))?;

        let declared = self.uniforms[index].uniform_type();
        if declared != T::TYPE {
            return Err(RendererError::UniformTypeMismatch {
                name: name.to_string(),
                declared,
                requested: T::TYPE,
            });
        }

        Ok(UniformHandle {
            index,
            _ty: PhantomData,
        })
    }

    pub fn set<T: UniformValue>(
        &mut self,
        handle: UniformHandle<T>,
        value: T,
    ) -> Result<(), RendererError> {
        let uniform = typed_mut::<T>(&mut self.uniforms, handle.index)?;
        uniform.set(value, &mut self.dirty);
        Ok(())
    }

    pub fn set_by_name<T: UniformValue>(&mut self, name: &str, value: T) -> Result<(), RendererError> {
        let handle = self.handle::<T>(name)?;
        self.set(handle, value)
    }

    pub fn get<T: UniformValue>(&self, handle: UniformHandle<T>) -> Option<T> {
        self.uniforms
            .get(handle.index)?
            .as_any()
            .downcast_ref::<Uniform<T>>()
            .map(Uniform::value)
    }

    pub fn value<T: UniformValue>(&self, name: &str) -> Result<T, RendererError> {
        let handle = self.handle::<T>(name)?;
        self.get(handle)
            .ok_or_else(|| RendererError::UnknownUniform(name.to_string()))
    }

    /// Flushes every dirty uniform into `sink`, in the order they became dirty.
    ///
    /// Returns the number of uniforms written.
    pub fn clean(&mut self, sink: &mut dyn UniformSink) -> usize {
        let ids = self.dirty.take();
        for &id in &ids {
            self.uniforms[id].clean(sink);
        }
        ids.len()
    }
}

impl fmt::Debug for Uniforms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Uniforms")
            .field("names", &self.names().collect::<Vec<_>>())
            .field("dirty", &self.dirty.len())
            .finish()
    }
}

fn typed_mut<T: UniformValue>(
    uniforms: &mut [Box<dyn ErasedUniform>],
    index: usize,
) -> Result<&mut Uniform<T>, RendererError> {
    let slot = uniforms
        .get_mut(index)
        .ok_or_else(|| RendererError::UnknownUniform(format!("#{index}")))?;

    let declared = slot.uniform_type();
    let name = slot.name().to_string();
    slot.as_any_mut()
        .downcast_mut::<Uniform<T>>()
        .ok_or(RendererError::UniformTypeMismatch {
            name,
            declared,
            requested: T::TYPE,
        })
}

fn erased<T: UniformValue>(
    member: &UniformMember,
    id: usize,
    dirty: &mut DirtyList,
) -> Box<dyn ErasedUniform> {
    Box::new(Uniform::<T>::new(member.name.clone(), member.location, id, dirty))
}
