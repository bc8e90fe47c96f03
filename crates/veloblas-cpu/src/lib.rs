//! # VeloBLAS CPU Engine
//!
//! Host reference implementation of the VeloBLAS execution engine.
//!
//! Kernels are host closures registered per `(module, kernel)` identity;
//! memory objects are aligned host allocations behind per-buffer read/write
//! locks. Submissions run on a single worker thread in submission order, each
//! waiting on its dependency events before executing. That makes the engine a
//! sequential but faithful model of the asynchronous, dependency-ordered
//! submission contract.
//!
//! This engine exists for development, testing, and as the fallback when no
//! device backend is available.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod alloc;
mod engine;
mod invocation;
mod kernel;
mod worker;

pub use engine::{CpuEngine, EngineMetrics};
pub use invocation::{HostKernelFn, InputView, KernelInvocation, OutputView};
