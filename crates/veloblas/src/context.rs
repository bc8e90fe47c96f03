//! Library entry point tying an engine to the function catalog.

use std::sync::Arc;

use bytemuck::Pod;
use tracing::info;

use veloblas_core::{
    BufferHandle, DispatchMetrics, Dispatcher, Engine, EngineExt, Event, Function, Implementation,
    Result, Selection,
};
use veloblas_cpu::CpuEngine;

use crate::functions;

/// Ready-to-use dispatch context.
///
/// Owns the [`Dispatcher`] and its engine. [`Context::new`] builds the
/// default setup: a fresh [`CpuEngine`] loaded with the catalog's host
/// kernels, and every catalog variant registered. Dropping the context
/// drains outstanding submissions.
#[derive(Debug)]
pub struct Context {
    dispatcher: Dispatcher,
}

impl Context {
    /// Context over a fresh [`CpuEngine`] with the full function catalog.
    pub fn new() -> Result<Self> {
        ContextBuilder::default().build()
    }

    /// Start configuring a context.
    pub fn builder() -> ContextBuilder {
        ContextBuilder::default()
    }

    /// The underlying dispatcher.
    #[inline]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// The engine executing this context's submissions.
    #[inline]
    pub fn engine(&self) -> &Arc<dyn Engine> {
        self.dispatcher.engine()
    }

    /// Register an additional implementation variant for `F`.
    ///
    /// Appended after any catalog variants; registration order is the
    /// tie-break order.
    pub fn register<F: Function>(&self, implementation: impl Implementation<F>) {
        self.dispatcher.register(implementation);
    }

    /// Select the best variant of `F` for `params` and execute it.
    pub fn dispatch<F: Function>(&self, params: &F::Params, deps: &[Event]) -> Result<Event> {
        self.dispatcher.dispatch::<F>(params, deps)
    }

    /// Run selection without executing anything.
    pub fn select<F: Function>(&self, params: &F::Params) -> Result<Selection> {
        self.dispatcher.select::<F>(params)
    }

    /// Dispatch counters.
    pub fn metrics(&self) -> DispatchMetrics {
        self.dispatcher.metrics()
    }

    /// Allocate an engine buffer initialized from `data`.
    pub fn buffer_from_slice<T: Pod>(&self, data: &[T]) -> Result<BufferHandle<T>> {
        self.engine().buffer_from_slice(data)
    }

    /// Allocate a zero-filled engine buffer of `len` elements.
    pub fn buffer_zeroed<T: Pod>(&self, len: usize) -> Result<BufferHandle<T>> {
        self.engine().buffer_zeroed(len)
    }

    /// Overwrite the start of `handle` with `data`.
    pub fn write_buffer<T: Pod>(&self, handle: BufferHandle<T>, data: &[T]) -> Result<()> {
        self.engine().write_buffer(handle, data)
    }

    /// Read back the full contents of `handle`.
    pub fn read_buffer<T: Pod>(&self, handle: BufferHandle<T>) -> Result<Vec<T>> {
        self.engine().read_buffer(handle)
    }

    /// Read the first element of `handle`.
    pub fn read_scalar<T: Pod>(&self, handle: BufferHandle<T>) -> Result<T> {
        self.engine().read_scalar(handle)
    }

    /// Release the allocation behind `handle`.
    ///
    /// In-flight submissions that already resolved the buffer finish
    /// undisturbed.
    pub fn release_buffer<T>(&self, handle: BufferHandle<T>) -> Result<()> {
        self.engine().release_buffer(handle.id())
    }
}

/// Configures a [`Context`].
pub struct ContextBuilder {
    engine: Option<Arc<dyn Engine>>,
    default_functions: bool,
}

impl Default for ContextBuilder {
    fn default() -> Self {
        ContextBuilder {
            engine: None,
            default_functions: true,
        }
    }
}

impl ContextBuilder {
    /// Use a caller-provided engine instead of a fresh [`CpuEngine`].
    ///
    /// The engine must resolve the catalog's kernel identities itself; the
    /// builder only installs host kernel bodies into engines it creates.
    #[must_use]
    pub fn engine(mut self, engine: Arc<dyn Engine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Skip registering the built-in function catalog.
    #[must_use]
    pub fn without_default_functions(mut self) -> Self {
        self.default_functions = false;
        self
    }

    /// Build the context.
    pub fn build(self) -> Result<Context> {
        let engine: Arc<dyn Engine> = match self.engine {
            Some(engine) => engine,
            None => {
                let engine = CpuEngine::new()?;
                functions::install_host_kernels(&engine)?;
                Arc::new(engine)
            }
        };
        let dispatcher = Dispatcher::new(engine);
        if self.default_functions {
            functions::register_all(&dispatcher);
        }
        info!(engine = dispatcher.engine().name(), "context ready");
        Ok(Context { dispatcher })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::{Sasum, Saxpy, Scasum, Sdot, Snrm2, Sscal};

    #[test]
    fn test_default_context_registers_catalog() {
        let ctx = Context::new().expect("context builds");
        assert_eq!(
            ctx.dispatcher().variant_names::<Scasum>(),
            vec!["Scasum_naive", "Scasum_naive_noincx"]
        );
        assert_eq!(
            ctx.dispatcher().variant_names::<Sasum>(),
            vec!["Sasum_naive", "Sasum_naive_noincx", "Sasum_two_stage"]
        );
        assert_eq!(
            ctx.dispatcher().variant_names::<Saxpy>(),
            vec!["Saxpy_naive", "Saxpy_naive_noinc"]
        );
        assert_eq!(
            ctx.dispatcher().variant_names::<Sdot>(),
            vec!["Sdot_naive", "Sdot_naive_noinc"]
        );
        assert_eq!(
            ctx.dispatcher().variant_names::<Sscal>(),
            vec!["Sscal_naive", "Sscal_naive_noincx"]
        );
        assert_eq!(
            ctx.dispatcher().variant_names::<Snrm2>(),
            vec!["Snrm2_naive", "Snrm2_naive_noincx"]
        );
    }

    #[test]
    fn test_builder_without_default_functions() {
        let ctx = Context::builder()
            .without_default_functions()
            .build()
            .expect("context builds");
        assert!(ctx.dispatcher().variant_names::<Sasum>().is_empty());
    }

    #[test]
    fn test_custom_engine_is_used() {
        let engine = Arc::new(CpuEngine::new().expect("engine starts"));
        crate::functions::install_host_kernels(&engine).expect("kernels install");
        let ctx = Context::builder()
            .engine(engine)
            .build()
            .expect("context builds");
        assert_eq!(ctx.engine().name(), "cpu");
        assert!(!ctx.dispatcher().variant_names::<Sasum>().is_empty());
    }

    #[test]
    fn test_buffer_helpers_roundtrip() {
        let ctx = Context::new().expect("context builds");
        let handle = ctx
            .buffer_from_slice(&[1.0f32, 2.0, 3.0])
            .expect("allocation");
        assert_eq!(ctx.read_buffer(handle).expect("read"), vec![1.0, 2.0, 3.0]);
        ctx.write_buffer(handle, &[9.0f32]).expect("write");
        assert_eq!(ctx.read_scalar(handle).expect("read"), 9.0);
        ctx.release_buffer(handle).expect("release");
        assert!(ctx.read_buffer(handle).is_err());
    }
}
