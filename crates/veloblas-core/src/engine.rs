//! Execution engine and kernel configuration interfaces.
//!
//! An [`Engine`] resolves named kernels, owns memory objects, and enqueues
//! kernel submissions asynchronously. Implementation variants consume this
//! interface; they never talk to a device API directly. The interface is
//! object-safe and byte-oriented so backends can live behind `Arc<dyn
//! Engine>`; [`EngineExt`] layers the typed conveniences on top.

use bytemuck::{Pod, Zeroable};

use crate::error::{Error, Result};
use crate::event::Event;
use crate::geometry::KernelOptions;
use crate::memory::{BufferHandle, BufferId, DeviceBuffer};

/// A positional kernel argument.
#[derive(Debug, Clone, PartialEq)]
pub enum KernelArg {
    /// Pointer-width unsigned scalar (sizes, strides).
    Size(usize),
    /// 32-bit signed scalar.
    Int(i32),
    /// 32-bit float scalar.
    Float(f32),
    /// A materialized buffer view.
    Buffer(DeviceBuffer),
}

/// A kernel handle being configured for one submission.
///
/// Obtained from [`Engine::get_kernel`]. Arguments are positional and must
/// cover every index from zero upward with no gaps; launch options must be
/// set before submission. `submit` consumes the handle and enqueues the
/// kernel asynchronously.
pub trait Kernel: Send {
    /// Kernel name this handle was resolved from.
    fn name(&self) -> &str;

    /// Assign the argument at `index`.
    fn set_arg(&mut self, index: usize, arg: KernelArg) -> Result<()>;

    /// Attach the launch geometry.
    fn set_options(&mut self, options: KernelOptions) -> Result<()>;

    /// Enqueue the configured kernel.
    ///
    /// Execution begins only after every event in `deps` has completed. The
    /// returned event completes once the kernel has finished writing its
    /// results, and fails if the kernel fails.
    fn submit(self: Box<Self>, deps: &[Event]) -> Result<Event>;
}

/// Backend-agnostic execution engine.
///
/// Accessor failures (unresolvable kernels, unknown or undersized buffers)
/// are reported as errors and propagate unchanged through the dispatch path;
/// the dispatch core performs no retry on top.
pub trait Engine: Send + Sync {
    /// Human-readable engine name.
    fn name(&self) -> &str;

    /// Resolve a kernel by name within a module.
    ///
    /// Compilation and caching of modules is the engine's concern; callers
    /// only ever see resolved handles or [`Error::KernelNotFound`].
    fn get_kernel(&self, kernel_name: &str, module_name: &str) -> Result<Box<dyn Kernel>>;

    /// Materialize a read-only view spanning `elements`.
    fn get_input_buffer(&self, buffer: BufferId, elements: usize) -> Result<DeviceBuffer>;

    /// Materialize a write-only view spanning `elements`.
    fn get_output_buffer(&self, buffer: BufferId, elements: usize) -> Result<DeviceBuffer>;

    /// Materialize a read-write view spanning `elements`.
    fn get_inout_buffer(&self, buffer: BufferId, elements: usize) -> Result<DeviceBuffer>;

    /// Allocate a zero-filled memory object of `len` elements of
    /// `elem_size` bytes each.
    fn create_buffer(&self, elem_size: usize, len: usize) -> Result<BufferId>;

    /// Drop the engine's table entry for a memory object.
    ///
    /// Submissions that already materialized the object keep its storage
    /// alive until they finish.
    fn release_buffer(&self, buffer: BufferId) -> Result<()>;

    /// Copy host bytes into a memory object, starting at its beginning.
    fn write_buffer_bytes(&self, buffer: BufferId, data: &[u8]) -> Result<()>;

    /// Copy a memory object's leading bytes out to the host.
    fn read_buffer_bytes(&self, buffer: BufferId, out: &mut [u8]) -> Result<()>;
}

/// Typed convenience layer over [`Engine`].
///
/// Blanket-implemented; import it to get element-typed allocation and
/// transfer on any engine.
pub trait EngineExt: Engine {
    /// Allocate a buffer and fill it from a host slice.
    fn buffer_from_slice<T: Pod>(&self, data: &[T]) -> Result<BufferHandle<T>> {
        let id = self.create_buffer(std::mem::size_of::<T>(), data.len())?;
        if !data.is_empty() {
            self.write_buffer_bytes(id, bytemuck::cast_slice(data))?;
        }
        Ok(BufferHandle::new(id, data.len()))
    }

    /// Allocate a zero-filled buffer of `len` elements.
    fn buffer_zeroed<T: Pod>(&self, len: usize) -> Result<BufferHandle<T>> {
        let id = self.create_buffer(std::mem::size_of::<T>(), len)?;
        Ok(BufferHandle::new(id, len))
    }

    /// Overwrite a buffer's leading elements from a host slice.
    fn write_buffer<T: Pod>(&self, handle: BufferHandle<T>, data: &[T]) -> Result<()> {
        if data.len() > handle.len() {
            return Err(Error::BufferOverrun {
                buffer: handle.id(),
                requested: data.len(),
                capacity: handle.len(),
            });
        }
        self.write_buffer_bytes(handle.id(), bytemuck::cast_slice(data))
    }

    /// Read a buffer's full contents into a host vector.
    fn read_buffer<T: Pod>(&self, handle: BufferHandle<T>) -> Result<Vec<T>> {
        let mut out = vec![T::zeroed(); handle.len()];
        if !out.is_empty() {
            self.read_buffer_bytes(handle.id(), bytemuck::cast_slice_mut(&mut out))?;
        }
        Ok(out)
    }

    /// Read the first element of a buffer, for scalar results.
    fn read_scalar<T: Pod>(&self, handle: BufferHandle<T>) -> Result<T> {
        if handle.is_empty() {
            return Err(Error::BufferOverrun {
                buffer: handle.id(),
                requested: 1,
                capacity: 0,
            });
        }
        let mut out = [T::zeroed()];
        self.read_buffer_bytes(handle.id(), bytemuck::cast_slice_mut(&mut out))?;
        Ok(out[0])
    }
}

impl<E: Engine + ?Sized> EngineExt for E {}
