use super::UniformLocation;

/// Something holding state that must be flushed to the GPU before a draw.
pub trait Cleanable {
    /// Writes the pending value to `sink` and clears the dirty flag.
    fn clean(&mut self, sink: &mut dyn UniformSink);
}

/// Receives notifications from cleanables that became dirty.
///
/// A cleanable notifies at most once between two cleans; observers may rely
/// on that and keep a plain list.
pub trait CleanableObserver {
    fn notify_dirty(&mut self, id: usize);
}

/// Destination of uniform uploads.
pub trait UniformSink {
    fn write(&mut self, location: UniformLocation, bytes: &[u8]);
}

/// Ordered list of cleanable ids awaiting a flush.
#[derive(Debug, Default, Clone)]
pub struct DirtyList {
    ids: Vec<usize>,
}

impl DirtyList {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: usize) -> bool {
        self.ids.contains(&id)
    }

    /// Removes and returns all pending ids in notification order.
    pub fn take(&mut self) -> Vec<usize> {
        std::mem::take(&mut self.ids)
    }
}

impl CleanableObserver for DirtyList {
    fn notify_dirty(&mut self, id: usize) {
        debug_assert!(!self.ids.contains(&id), "cleanable {id} notified twice");
        self.ids.push(id);
    }
}
