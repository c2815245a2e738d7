//! Buffer writes recorded into a command encoder.
//!
//! `queue.write_buffer` lands before anything in the next submission runs.
//! The copies recorded here execute in encoder order instead, between the
//! passes recorded before and after them.

use std::borrow::Cow;

use wgpu::util::DeviceExt;

/// Records a copy of `bytes` into `destination` at `offset`.
///
/// `offset` must be 4-byte aligned. `bytes` is zero-padded to a multiple of
/// 4, so `destination` needs that much room.
pub(crate) fn record_write(
    device: &wgpu::Device,
    encoder: &mut wgpu::CommandEncoder,
    label: &str,
    destination: &wgpu::Buffer,
    offset: u64,
    bytes: &[u8],
) {
    let contents = padded(bytes);
    if contents.is_empty() {
        return;
    }

    let staging = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: &contents,
        usage: wgpu::BufferUsages::COPY_SRC,
    });
    encoder.copy_buffer_to_buffer(&staging, 0, destination, offset, contents.len() as u64);
}

fn padded(bytes: &[u8]) -> Cow<'_, [u8]> {
    let len = (bytes.len() as u64).next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT) as usize;
    if len == bytes.len() {
        Cow::Borrowed(bytes)
    } else {
        let mut owned = bytes.to_vec();
        owned.resize(len, 0);
        Cow::Owned(owned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aligned_bytes_are_not_copied() {
        let bytes = [1u8, 2, 3, 4, 5, 6, 7, 8];
        assert!(matches!(padded(&bytes), Cow::Borrowed(_)));
    }

    #[test]
    fn unaligned_bytes_are_zero_padded() {
        assert_eq!(padded(&[7u8; 6]).as_ref(), &[7, 7, 7, 7, 7, 7, 0, 0]);
        assert!(padded(&[]).is_empty());
    }
}
