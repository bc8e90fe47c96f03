//! Host kernel bodies and their typed view of a submission's arguments.

use std::sync::Arc;

use bytemuck::Pod;
use parking_lot::{
    MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLock, RwLockReadGuard, RwLockWriteGuard,
};

use veloblas_core::{AccessMode, BufferId, Error, KernelArg, KernelOptions, NdRange, Result};

use crate::alloc::HostAlloc;

/// A host kernel body.
///
/// Invoked on the engine's worker thread once the submission's dependencies
/// have completed. An error fails the submission's event with the returned
/// reason.
pub type HostKernelFn = Arc<dyn Fn(&KernelInvocation<'_>) -> Result<()> + Send + Sync>;

/// Shared read view of an input binding's elements.
pub type InputView<'a, T> = MappedRwLockReadGuard<'a, [T]>;

/// Exclusive write view of an output or in-out binding's elements.
pub type OutputView<'a, T> = MappedRwLockWriteGuard<'a, [T]>;

/// A buffer binding resolved at submission time.
///
/// Holds its own reference to the backing storage, so a memory object
/// released from the engine's table stays alive for in-flight submissions.
pub(crate) struct ResolvedBuffer {
    pub(crate) id: BufferId,
    pub(crate) storage: Arc<RwLock<HostAlloc>>,
    pub(crate) elements: usize,
    pub(crate) elem_size: usize,
    pub(crate) access: AccessMode,
}

/// One positional argument after resolution.
pub(crate) enum BoundArg {
    /// A non-buffer [`KernelArg`].
    Scalar(KernelArg),
    /// A materialized buffer span.
    Buffer(ResolvedBuffer),
}

/// Everything a host kernel body can see about its submission.
pub struct KernelInvocation<'a> {
    args: &'a [BoundArg],
    options: &'a KernelOptions,
}

impl<'a> KernelInvocation<'a> {
    pub(crate) fn new(args: &'a [BoundArg], options: &'a KernelOptions) -> Self {
        KernelInvocation { args, options }
    }

    /// Global work size the submission was launched with.
    #[inline]
    pub fn global_size(&self) -> NdRange {
        self.options.global
    }

    /// Work-group size, if the submission specified one.
    #[inline]
    pub fn local_size(&self) -> Option<NdRange> {
        self.options.local
    }

    /// Number of bound arguments.
    #[inline]
    pub fn arg_count(&self) -> usize {
        self.args.len()
    }

    fn arg(&self, index: usize) -> Result<&BoundArg> {
        self.args.get(index).ok_or_else(|| Error::InvalidArgument {
            index,
            reason: "index out of range".to_string(),
        })
    }

    /// The size/stride scalar at `index`.
    pub fn size(&self, index: usize) -> Result<usize> {
        match self.arg(index)? {
            BoundArg::Scalar(KernelArg::Size(value)) => Ok(*value),
            _ => Err(Error::InvalidArgument {
                index,
                reason: "expected a size argument".to_string(),
            }),
        }
    }

    /// The 32-bit signed scalar at `index`.
    pub fn int(&self, index: usize) -> Result<i32> {
        match self.arg(index)? {
            BoundArg::Scalar(KernelArg::Int(value)) => Ok(*value),
            _ => Err(Error::InvalidArgument {
                index,
                reason: "expected an int argument".to_string(),
            }),
        }
    }

    /// The 32-bit float scalar at `index`.
    pub fn float(&self, index: usize) -> Result<f32> {
        match self.arg(index)? {
            BoundArg::Scalar(KernelArg::Float(value)) => Ok(*value),
            _ => Err(Error::InvalidArgument {
                index,
                reason: "expected a float argument".to_string(),
            }),
        }
    }

    fn buffer(&self, index: usize) -> Result<&ResolvedBuffer> {
        match self.arg(index)? {
            BoundArg::Buffer(buffer) => Ok(buffer),
            BoundArg::Scalar(_) => Err(Error::InvalidArgument {
                index,
                reason: "expected a buffer argument".to_string(),
            }),
        }
    }

    /// Read view of the buffer binding at `index`.
    ///
    /// The view spans exactly the elements the submission materialized.
    pub fn input<T: Pod>(&self, index: usize) -> Result<InputView<'_, T>> {
        let buffer = self.buffer(index)?;
        if !buffer.access.readable() {
            return Err(Error::InvalidArgument {
                index,
                reason: format!("buffer {} is not readable in this binding", buffer.id),
            });
        }
        let bytes = check_element_size::<T>(index, buffer)?;
        let guard = buffer.storage.read();
        Ok(RwLockReadGuard::map(guard, |alloc| {
            bytemuck::cast_slice(&alloc.as_bytes()[..bytes])
        }))
    }

    /// Write view of the buffer binding at `index`.
    ///
    /// Valid for output and in-out bindings; the lock is exclusive for the
    /// lifetime of the view.
    pub fn output<T: Pod>(&self, index: usize) -> Result<OutputView<'_, T>> {
        let buffer = self.buffer(index)?;
        if !buffer.access.writable() {
            return Err(Error::InvalidArgument {
                index,
                reason: format!("buffer {} is not writable in this binding", buffer.id),
            });
        }
        let bytes = check_element_size::<T>(index, buffer)?;
        let guard = buffer.storage.write();
        Ok(RwLockWriteGuard::map(guard, |alloc| {
            bytemuck::cast_slice_mut(&mut alloc.as_bytes_mut()[..bytes])
        }))
    }
}

fn check_element_size<T: Pod>(index: usize, buffer: &ResolvedBuffer) -> Result<usize> {
    let requested = std::mem::size_of::<T>();
    if requested != buffer.elem_size {
        return Err(Error::InvalidArgument {
            index,
            reason: format!(
                "buffer element size is {} bytes, view requested {}",
                buffer.elem_size, requested
            ),
        });
    }
    Ok(buffer.elements * buffer.elem_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(len: usize, elem_size: usize, access: AccessMode) -> ResolvedBuffer {
        ResolvedBuffer {
            id: BufferId::new(1),
            storage: Arc::new(RwLock::new(HostAlloc::zeroed(len * elem_size))),
            elements: len,
            elem_size,
            access,
        }
    }

    fn options() -> KernelOptions {
        KernelOptions::new(NdRange::d1(4)).with_local(NdRange::d1(2))
    }

    #[test]
    fn test_scalar_accessors() {
        let args = vec![
            BoundArg::Scalar(KernelArg::Size(8)),
            BoundArg::Scalar(KernelArg::Float(2.5)),
            BoundArg::Scalar(KernelArg::Int(-3)),
        ];
        let opts = options();
        let inv = KernelInvocation::new(&args, &opts);
        assert_eq!(inv.arg_count(), 3);
        assert_eq!(inv.size(0).expect("size"), 8);
        assert_eq!(inv.float(1).expect("float"), 2.5);
        assert_eq!(inv.int(2).expect("int"), -3);
        assert_eq!(inv.global_size(), NdRange::d1(4));
        assert_eq!(inv.local_size(), Some(NdRange::d1(2)));
    }

    #[test]
    fn test_kind_mismatch_rejected() {
        let args = vec![BoundArg::Scalar(KernelArg::Float(1.0))];
        let opts = options();
        let inv = KernelInvocation::new(&args, &opts);
        assert!(matches!(
            inv.size(0),
            Err(Error::InvalidArgument { index: 0, .. })
        ));
        assert!(matches!(
            inv.size(5),
            Err(Error::InvalidArgument { index: 5, .. })
        ));
    }

    #[test]
    fn test_write_view_visible_through_read_view() {
        let args = vec![BoundArg::Buffer(resolved(4, 4, AccessMode::InOut))];
        let opts = options();
        let inv = KernelInvocation::new(&args, &opts);
        {
            let mut view = inv.output::<f32>(0).expect("write view");
            view[2] = 7.5;
        }
        let view = inv.input::<f32>(0).expect("read view");
        assert_eq!(view[2], 7.5);
        assert_eq!(view.len(), 4);
    }

    #[test]
    fn test_access_mode_enforced() {
        let args = vec![
            BoundArg::Buffer(resolved(2, 4, AccessMode::Input)),
            BoundArg::Buffer(resolved(2, 4, AccessMode::Output)),
        ];
        let opts = options();
        let inv = KernelInvocation::new(&args, &opts);
        assert!(inv.output::<f32>(0).is_err());
        assert!(inv.input::<f32>(1).is_err());
        assert!(inv.input::<f32>(0).is_ok());
        assert!(inv.output::<f32>(1).is_ok());
    }

    #[test]
    fn test_element_size_mismatch_rejected() {
        let args = vec![BoundArg::Buffer(resolved(2, 4, AccessMode::Input))];
        let opts = options();
        let inv = KernelInvocation::new(&args, &opts);
        let err = inv
            .input::<f64>(0)
            .expect_err("f64 view over f32 buffer");
        assert!(matches!(err, Error::InvalidArgument { index: 0, .. }));
    }
}
