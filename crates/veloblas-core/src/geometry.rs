//! Launch geometry for kernel submissions.

use std::fmt;

/// N-dimensional work size, up to three dimensions.
///
/// Unused dimensions are 1, so [`NdRange::count`] is always the product of
/// the three extents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NdRange {
    /// Extent in the first dimension.
    pub x: usize,
    /// Extent in the second dimension.
    pub y: usize,
    /// Extent in the third dimension.
    pub z: usize,
}

impl NdRange {
    /// One-dimensional range.
    #[inline]
    pub fn d1(x: usize) -> Self {
        NdRange { x, y: 1, z: 1 }
    }

    /// Two-dimensional range.
    #[inline]
    pub fn d2(x: usize, y: usize) -> Self {
        NdRange { x, y, z: 1 }
    }

    /// Three-dimensional range.
    #[inline]
    pub fn d3(x: usize, y: usize, z: usize) -> Self {
        NdRange { x, y, z }
    }

    /// Total number of work items.
    #[inline]
    pub fn count(&self) -> usize {
        self.x * self.y * self.z
    }

    /// True if any extent is zero.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.x == 0 || self.y == 0 || self.z == 0
    }

    /// True if `other` evenly divides this range in every dimension.
    #[inline]
    pub fn divisible_by(&self, other: &NdRange) -> bool {
        !other.is_empty() && self.x % other.x == 0 && self.y % other.y == 0 && self.z % other.z == 0
    }
}

impl fmt::Display for NdRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.x, self.y, self.z)
    }
}

/// Launch options attached to a kernel before submission.
///
/// The global range is derived from the problem size. The local (work-group)
/// range is optional; `None` leaves the split to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelOptions {
    /// Global work size.
    pub global: NdRange,
    /// Work-group size, or `None` for the engine default.
    pub local: Option<NdRange>,
}

impl KernelOptions {
    /// Options with the given global range and an unspecified local range.
    #[inline]
    pub fn new(global: NdRange) -> Self {
        KernelOptions {
            global,
            local: None,
        }
    }

    /// Attach an explicit work-group size.
    #[must_use]
    #[inline]
    pub fn with_local(mut self, local: NdRange) -> Self {
        self.local = Some(local);
        self
    }

    /// Options for a single work item.
    #[inline]
    pub fn single() -> Self {
        KernelOptions::new(NdRange::d1(1))
    }
}
