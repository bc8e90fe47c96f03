//! Memory object identities and per-submission buffer views.
//!
//! An engine owns its allocations and names them with [`BufferId`]s. Callers
//! usually hold a typed [`BufferHandle`] wrapping the id together with the
//! element type and capacity. At execution time an implementation variant
//! materializes a [`DeviceBuffer`]: the span of an allocation one submission
//! will touch, with its access mode.

use std::fmt;
use std::marker::PhantomData;

/// Opaque identity of an engine-owned memory object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(u64);

impl BufferId {
    /// Wrap a raw id. Engines assign these.
    #[inline]
    pub fn new(raw: u64) -> Self {
        BufferId(raw)
    }

    /// Raw numeric value.
    #[inline]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Typed handle to an engine-owned memory object.
///
/// Carries the element type and the capacity in elements. Handles are plain
/// identifiers: copying one never copies data, and dropping one never frees
/// the allocation.
pub struct BufferHandle<T> {
    id: BufferId,
    len: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> BufferHandle<T> {
    /// Build a handle from an id and a capacity in elements.
    #[inline]
    pub fn new(id: BufferId, len: usize) -> Self {
        BufferHandle {
            id,
            len,
            _marker: PhantomData,
        }
    }

    /// Underlying memory object id.
    #[inline]
    pub fn id(&self) -> BufferId {
        self.id
    }

    /// Capacity in elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True for a zero-capacity handle.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

// Manual impls, kept free of bounds on `T`.
impl<T> Clone for BufferHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for BufferHandle<T> {}

impl<T> PartialEq for BufferHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.len == other.len
    }
}

impl<T> Eq for BufferHandle<T> {}

impl<T> fmt::Debug for BufferHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferHandle")
            .field("id", &self.id)
            .field("len", &self.len)
            .finish()
    }
}

/// How a submission uses a buffer binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Read-only operand.
    Input,
    /// Write-only result.
    Output,
    /// Read and written in place.
    InOut,
}

impl AccessMode {
    /// True if the kernel may read through this binding.
    #[inline]
    pub fn readable(&self) -> bool {
        matches!(self, AccessMode::Input | AccessMode::InOut)
    }

    /// True if the kernel may write through this binding.
    #[inline]
    pub fn writable(&self) -> bool {
        matches!(self, AccessMode::Output | AccessMode::InOut)
    }
}

/// Materialized view of a memory object for one submission.
///
/// Produced by the engine's buffer accessors; the span is the number of
/// elements the kernel may touch, which for a strided operand of length `n`
/// and stride `s` is `n * s`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceBuffer {
    /// Backing memory object.
    pub id: BufferId,
    /// Span of the view in elements.
    pub elements: usize,
    /// Access mode of this binding.
    pub access: AccessMode,
}
