//! # VeloBLAS
//!
//! GPU-style BLAS with runtime kernel selection.
//!
//! Every BLAS function ships several implementation variants. At each call
//! the dispatcher asks every registered variant whether it accepts the
//! parameters and how well it expects to perform, then submits exactly the
//! best-scoring one to the execution engine. Submissions are asynchronous;
//! completion and ordering are expressed through [`Event`] dependencies.
//!
//! This crate bundles the dispatch core ([`veloblas_core`]), the host
//! reference engine ([`veloblas_cpu`]), and the level-1 function catalog,
//! behind a ready-to-use [`Context`].
//!
//! ## Quickstart
//!
//! ```
//! use veloblas::prelude::*;
//!
//! fn main() -> veloblas::Result<()> {
//!     let ctx = Context::new()?;
//!
//!     let x = ctx.buffer_from_slice(&[1.0f32, -2.0, 3.0, -4.0])?;
//!     let result = ctx.buffer_zeroed::<f32>(1)?;
//!
//!     // Selects the best accepting variant and runs it asynchronously.
//!     let event = sasum(&ctx, 4, x, 1, result, &[])?;
//!     event.wait()?;
//!
//!     assert_eq!(ctx.read_scalar(result)?, 10.0);
//!     Ok(())
//! }
//! ```
//!
//! ## Catalog
//!
//! Level-1 entry points: [`sasum`], [`scasum`], [`saxpy`], [`sdot`],
//! [`snrm2`], [`sscal`]. Each takes operand handles, lengths, and strides,
//! plus the dependency events the call must happen after, and returns the
//! submission's [`Event`].
//!
//! Custom variants and custom functions register through
//! [`Context::register`]; custom engines substitute through
//! [`ContextBuilder::engine`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod context;
pub mod functions;

pub use context::{Context, ContextBuilder};
pub use functions::{sasum, saxpy, scasum, sdot, snrm2, sscal};
pub use num_complex::Complex32;
pub use veloblas_core::{
    wait_all, AccessMode, BufferHandle, BufferId, Completion, DeviceBuffer, DispatchMetrics,
    Dispatcher, Engine, EngineExt, Error, Event, EventId, EventStatus, Function, Implementation,
    Kernel, KernelArg, KernelOptions, NdRange, Result, Score, Selection,
};
pub use veloblas_cpu::{CpuEngine, EngineMetrics, HostKernelFn, KernelInvocation};

/// Common imports for working with VeloBLAS.
pub mod prelude {
    pub use crate::context::{Context, ContextBuilder};
    pub use crate::functions::{sasum, saxpy, scasum, sdot, snrm2, sscal};
    pub use crate::Complex32;
    pub use veloblas_core::prelude::*;
    pub use veloblas_cpu::{CpuEngine, EngineMetrics};
}
