use std::ops::Range;

use super::{UniformLocation, UniformSink};

/// CPU staging copy of a program's uniform block.
///
/// Cleaned uniforms write here; the union of all writes since the last
/// [`take_dirty_range`](Self::take_dirty_range) is what gets sent to the GPU.
#[derive(Debug, Clone)]
pub struct UniformBlock {
    bytes: Vec<u8>,
    dirty: Option<Range<usize>>,
}

impl UniformBlock {
    pub fn new(size: usize) -> Self {
        Self {
            bytes: vec![0; size],
            dirty: None,
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the byte range written since the last call and resets it.
    pub fn take_dirty_range(&mut self) -> Option<Range<usize>> {
        self.dirty.take()
    }

    /// Like [`take_dirty_range`](Self::take_dirty_range), widened to 4-byte
    /// alignment, returning the start offset and the bytes to upload.
    pub fn take_dirty_bytes(&mut self) -> Option<(usize, &[u8])> {
        let range = self.dirty.take()?;
        let start = range.start & !3;
        let end = range.end.next_multiple_of(4).min(self.bytes.len());
        Some((start, &self.bytes[start..end]))
    }
}

impl UniformSink for UniformBlock {
    fn write(&mut self, location: UniformLocation, bytes: &[u8]) {
        let start = location.offset();
        let end = start + bytes.len();
        if end > self.bytes.len() {
            log::warn!(
                "uniform write [{start}, {end}) outside a {} byte block; dropped",
                self.bytes.len()
            );
            return;
        }

        self.bytes[start..end].copy_from_slice(bytes);
        self.dirty = Some(match self.dirty.take() {
            Some(r) => r.start.min(start)..r.end.max(end),
            None => start..end,
        });
    }
}
