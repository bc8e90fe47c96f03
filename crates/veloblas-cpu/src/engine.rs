//! The host execution engine.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam::channel::{unbounded, Sender};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, trace};

use veloblas_core::{
    AccessMode, BufferId, DeviceBuffer, Engine, Error, Event, Kernel, KernelArg, Result,
};

use crate::alloc::HostAlloc;
use crate::invocation::{BoundArg, HostKernelFn, ResolvedBuffer};
use crate::kernel::CpuKernel;
use crate::worker::{self, Task, WorkerMsg};

/// Counters shared between the submitting side and the worker.
#[derive(Default)]
pub(crate) struct Counters {
    pub(crate) submitted: AtomicU64,
    pub(crate) completed: AtomicU64,
    pub(crate) failed: AtomicU64,
}

/// Snapshot of the engine's submission counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EngineMetrics {
    /// Kernels accepted into the queue.
    pub submitted: u64,
    /// Kernels that ran to completion.
    pub completed: u64,
    /// Kernels that failed, including dependency failures.
    pub failed: u64,
}

struct BufferEntry {
    storage: Arc<RwLock<HostAlloc>>,
    elem_size: usize,
    len: usize,
}

/// Engine state shared with outstanding kernel handles.
pub(crate) struct EngineInner {
    modules: RwLock<HashMap<String, HashMap<String, HostKernelFn>>>,
    buffers: RwLock<HashMap<BufferId, BufferEntry>>,
    next_buffer: AtomicU64,
    sender: Sender<WorkerMsg>,
    worker: Mutex<Option<JoinHandle<()>>>,
    counters: Arc<Counters>,
    shut_down: AtomicBool,
}

/// Host (CPU) reference engine.
///
/// Executes registered host closures on a single in-order worker thread and
/// stores memory objects in aligned host allocations. See the crate docs for
/// the execution model.
pub struct CpuEngine {
    inner: Arc<EngineInner>,
}

impl CpuEngine {
    /// Start the engine and its worker thread.
    pub fn new() -> Result<Self> {
        let (sender, receiver) = unbounded();
        let counters = Arc::new(Counters::default());
        let worker = worker::spawn(receiver, counters.clone())
            .map_err(|err| Error::EngineError(format!("failed to spawn worker thread: {err}")))?;
        info!("CPU engine started");
        Ok(CpuEngine {
            inner: Arc::new(EngineInner {
                modules: RwLock::new(HashMap::new()),
                buffers: RwLock::new(HashMap::new()),
                next_buffer: AtomicU64::new(1),
                sender,
                worker: Mutex::new(Some(worker)),
                counters,
                shut_down: AtomicBool::new(false),
            }),
        })
    }

    /// Register a host kernel body under a `(module, kernel)` identity.
    ///
    /// The identity must be unused; modules come into existence with their
    /// first kernel.
    pub fn register_kernel(&self, module: &str, kernel: &str, body: HostKernelFn) -> Result<()> {
        let mut modules = self.inner.modules.write();
        let entry = modules.entry(module.to_string()).or_default();
        if entry.contains_key(kernel) {
            return Err(Error::DuplicateKernel {
                module: module.to_string(),
                kernel: kernel.to_string(),
            });
        }
        entry.insert(kernel.to_string(), body);
        debug!(module, kernel, "host kernel registered");
        Ok(())
    }

    /// Snapshot of the submission counters.
    pub fn metrics(&self) -> EngineMetrics {
        EngineMetrics {
            submitted: self.inner.counters.submitted.load(Ordering::Relaxed),
            completed: self.inner.counters.completed.load(Ordering::Relaxed),
            failed: self.inner.counters.failed.load(Ordering::Relaxed),
        }
    }

    /// Drain queued submissions and stop the worker.
    ///
    /// Idempotent. Kernels submitted afterwards fail with
    /// [`Error::SubmitFailed`].
    pub fn shutdown(&self) -> Result<()> {
        if self.inner.shut_down.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let _ = self.inner.sender.send(WorkerMsg::Shutdown);
        if let Some(handle) = self.inner.worker.lock().take() {
            handle
                .join()
                .map_err(|_| Error::EngineError("worker thread panicked".to_string()))?;
        }
        let metrics = self.metrics();
        info!(
            submitted = metrics.submitted,
            completed = metrics.completed,
            failed = metrics.failed,
            "CPU engine shut down"
        );
        Ok(())
    }

    fn buffer_view(
        &self,
        buffer: BufferId,
        elements: usize,
        access: AccessMode,
    ) -> Result<DeviceBuffer> {
        let buffers = self.inner.buffers.read();
        let entry = buffers.get(&buffer).ok_or(Error::UnknownBuffer(buffer))?;
        if elements > entry.len {
            return Err(Error::BufferOverrun {
                buffer,
                requested: elements,
                capacity: entry.len,
            });
        }
        Ok(DeviceBuffer {
            id: buffer,
            elements,
            access,
        })
    }

    fn buffer_storage(&self, buffer: BufferId) -> Result<(Arc<RwLock<HostAlloc>>, usize, usize)> {
        let buffers = self.inner.buffers.read();
        let entry = buffers.get(&buffer).ok_or(Error::UnknownBuffer(buffer))?;
        Ok((entry.storage.clone(), entry.elem_size, entry.len))
    }
}

impl Engine for CpuEngine {
    fn name(&self) -> &str {
        "cpu"
    }

    fn get_kernel(&self, kernel_name: &str, module_name: &str) -> Result<Box<dyn Kernel>> {
        let modules = self.inner.modules.read();
        let body = modules
            .get(module_name)
            .and_then(|kernels| kernels.get(kernel_name))
            .cloned()
            .ok_or_else(|| Error::KernelNotFound {
                module: module_name.to_string(),
                kernel: kernel_name.to_string(),
            })?;
        Ok(Box::new(CpuKernel {
            inner: self.inner.clone(),
            module: module_name.to_string(),
            name: kernel_name.to_string(),
            body,
            args: Vec::new(),
            options: None,
        }))
    }

    fn get_input_buffer(&self, buffer: BufferId, elements: usize) -> Result<DeviceBuffer> {
        self.buffer_view(buffer, elements, AccessMode::Input)
    }

    fn get_output_buffer(&self, buffer: BufferId, elements: usize) -> Result<DeviceBuffer> {
        self.buffer_view(buffer, elements, AccessMode::Output)
    }

    fn get_inout_buffer(&self, buffer: BufferId, elements: usize) -> Result<DeviceBuffer> {
        self.buffer_view(buffer, elements, AccessMode::InOut)
    }

    fn create_buffer(&self, elem_size: usize, len: usize) -> Result<BufferId> {
        if elem_size == 0 {
            return Err(Error::AllocationFailed {
                elements: len,
                elem_size,
                reason: "zero element size".to_string(),
            });
        }
        let bytes = elem_size.checked_mul(len).ok_or(Error::AllocationFailed {
            elements: len,
            elem_size,
            reason: "size overflow".to_string(),
        })?;
        let id = BufferId::new(self.inner.next_buffer.fetch_add(1, Ordering::Relaxed));
        self.inner.buffers.write().insert(
            id,
            BufferEntry {
                storage: Arc::new(RwLock::new(HostAlloc::zeroed(bytes))),
                elem_size,
                len,
            },
        );
        trace!(buffer = %id, bytes, "buffer created");
        Ok(id)
    }

    fn release_buffer(&self, buffer: BufferId) -> Result<()> {
        self.inner
            .buffers
            .write()
            .remove(&buffer)
            .ok_or(Error::UnknownBuffer(buffer))?;
        trace!(buffer = %buffer, "buffer released");
        Ok(())
    }

    fn write_buffer_bytes(&self, buffer: BufferId, data: &[u8]) -> Result<()> {
        let (storage, elem_size, len) = self.buffer_storage(buffer)?;
        let mut alloc = storage.write();
        if data.len() > alloc.len() {
            return Err(Error::BufferOverrun {
                buffer,
                requested: data.len().div_ceil(elem_size),
                capacity: len,
            });
        }
        alloc.as_bytes_mut()[..data.len()].copy_from_slice(data);
        Ok(())
    }

    fn read_buffer_bytes(&self, buffer: BufferId, out: &mut [u8]) -> Result<()> {
        let (storage, elem_size, len) = self.buffer_storage(buffer)?;
        let alloc = storage.read();
        if out.len() > alloc.len() {
            return Err(Error::BufferOverrun {
                buffer,
                requested: out.len().div_ceil(elem_size),
                capacity: len,
            });
        }
        out.copy_from_slice(&alloc.as_bytes()[..out.len()]);
        Ok(())
    }
}

impl EngineInner {
    /// Validate, resolve, and enqueue a configured kernel.
    pub(crate) fn submit_kernel(&self, kernel: CpuKernel, deps: &[Event]) -> Result<Event> {
        if self.shut_down.load(Ordering::SeqCst) {
            return Err(Error::SubmitFailed("engine is shut down".to_string()));
        }
        let options = kernel
            .options
            .ok_or_else(|| Error::InvalidLaunch("launch options not set".to_string()))?;

        let mut bound = Vec::with_capacity(kernel.args.len());
        let mut seen: HashMap<BufferId, AccessMode> = HashMap::new();
        for (index, slot) in kernel.args.into_iter().enumerate() {
            let arg = slot.ok_or_else(|| Error::InvalidArgument {
                index,
                reason: "argument never assigned".to_string(),
            })?;
            match arg {
                KernelArg::Buffer(view) => {
                    if let Some(previous) = seen.get(&view.id) {
                        if previous.writable() || view.access.writable() {
                            return Err(Error::InvalidArgument {
                                index,
                                reason: format!(
                                    "buffer {} already bound with conflicting access",
                                    view.id
                                ),
                            });
                        }
                    }
                    seen.insert(view.id, view.access);

                    let buffers = self.buffers.read();
                    let entry = buffers.get(&view.id).ok_or(Error::UnknownBuffer(view.id))?;
                    if view.elements > entry.len {
                        return Err(Error::BufferOverrun {
                            buffer: view.id,
                            requested: view.elements,
                            capacity: entry.len,
                        });
                    }
                    bound.push(BoundArg::Buffer(ResolvedBuffer {
                        id: view.id,
                        storage: entry.storage.clone(),
                        elements: view.elements,
                        elem_size: entry.elem_size,
                        access: view.access,
                    }));
                }
                scalar => bound.push(BoundArg::Scalar(scalar)),
            }
        }

        let label = format!("{}::{}", kernel.module, kernel.name);
        let (event, completion) = Event::new(label.clone());
        let task = Task {
            label,
            body: kernel.body,
            args: bound,
            options,
            deps: deps.to_vec(),
            completion,
        };
        self.sender
            .send(WorkerMsg::Run(task))
            .map_err(|_| Error::SubmitFailed("engine worker is gone".to_string()))?;
        self.counters.submitted.fetch_add(1, Ordering::Relaxed);
        debug!(
            module = %kernel.module,
            kernel = %kernel.name,
            event = %event.id(),
            deps = deps.len(),
            "kernel submitted"
        );
        Ok(event)
    }
}

impl Drop for CpuEngine {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

impl std::fmt::Debug for CpuEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuEngine")
            .field("buffers", &self.inner.buffers.read().len())
            .field("metrics", &self.metrics())
            .finish()
    }
}
