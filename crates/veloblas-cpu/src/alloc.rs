//! Aligned backing storage for engine-owned memory objects.

/// Backing store for one allocation.
///
/// Backed by `u64` words so the byte view starts 8-byte aligned, keeping
/// typed views legal for every scalar element type up to `f64` and
/// `Complex32`. The byte length is tracked separately from the word count.
pub(crate) struct HostAlloc {
    words: Vec<u64>,
    len: usize,
}

impl HostAlloc {
    /// Zero-filled storage of `len` bytes.
    pub(crate) fn zeroed(len: usize) -> Self {
        HostAlloc {
            words: vec![0u64; len.div_ceil(8)],
            len,
        }
    }

    /// Length in bytes.
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Byte view of the whole allocation.
    pub(crate) fn as_bytes(&self) -> &[u8] {
        &bytemuck::cast_slice(&self.words)[..self.len]
    }

    /// Mutable byte view of the whole allocation.
    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut bytemuck::cast_slice_mut(&mut self.words)[..self.len]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_length_and_zero_fill() {
        let alloc = HostAlloc::zeroed(13);
        assert_eq!(alloc.len(), 13);
        assert_eq!(alloc.as_bytes().len(), 13);
        assert!(alloc.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_view_is_aligned_for_wide_elements() {
        let alloc = HostAlloc::zeroed(24);
        assert_eq!(alloc.as_bytes().as_ptr() as usize % 8, 0);
    }

    #[test]
    fn test_writes_visible_through_byte_view() {
        let mut alloc = HostAlloc::zeroed(8);
        alloc.as_bytes_mut()[3] = 0xAB;
        assert_eq!(alloc.as_bytes()[3], 0xAB);
    }

    #[test]
    fn test_empty_allocation() {
        let alloc = HostAlloc::zeroed(0);
        assert_eq!(alloc.len(), 0);
        assert!(alloc.as_bytes().is_empty());
    }
}
