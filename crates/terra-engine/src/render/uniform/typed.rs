use std::any::Any;

use super::{Cleanable, CleanableObserver, UniformSink, UniformType, UniformValue};

/// Byte offset of a uniform inside its program's uniform block.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct UniformLocation(pub u32);

impl UniformLocation {
    #[inline]
    pub const fn offset(self) -> usize {
        self.0 as usize
    }
}

/// A typed uniform with change tracking.
///
/// The value is kept on the CPU. Writing a different value to a clean uniform
/// marks it dirty and notifies the observer once; the next
/// [`Cleanable::clean`] uploads the value and clears the flag.
#[derive(Debug)]
pub struct Uniform<T: UniformValue> {
    name: String,
    location: UniformLocation,
    id: usize,
    value: T,
    dirty: bool,
}

impl<T: UniformValue> Uniform<T> {
    /// Creates a uniform holding the zero value.
    ///
    /// New uniforms start dirty so the first clean initializes GPU memory.
    pub fn new(
        name: impl Into<String>,
        location: UniformLocation,
        id: usize,
        observer: &mut dyn CleanableObserver,
    ) -> Self {
        observer.notify_dirty(id);
        Self {
            name: name.into(),
            location,
            id,
            value: T::zeroed(),
            dirty: true,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn location(&self) -> UniformLocation {
        self.location
    }

    #[inline]
    pub fn id(&self) -> usize {
        self.id
    }

    #[inline]
    pub fn value(&self) -> T {
        self.value
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn set(&mut self, value: T, observer: &mut dyn CleanableObserver) {
        if !self.dirty && self.value != value {
            self.dirty = true;
            observer.notify_dirty(self.id);
        }
        self.value = value;
    }
}

impl<T: UniformValue> Cleanable for Uniform<T> {
    fn clean(&mut self, sink: &mut dyn UniformSink) {
        sink.write(self.location, self.value.as_bytes());
        self.dirty = false;
    }
}

/// Type-erased view of a [`Uniform`], used by the per-program uniform set.
pub(crate) trait ErasedUniform: Cleanable {
    fn name(&self) -> &str;
    fn uniform_type(&self) -> UniformType;
    fn location(&self) -> UniformLocation;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: UniformValue> ErasedUniform for Uniform<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn uniform_type(&self) -> UniformType {
        T::TYPE
    }

    fn location(&self) -> UniformLocation {
        self.location
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
