//! # VeloBLAS Core
//!
//! Core dispatch protocol for the VeloBLAS GPU-accelerated BLAS library.
//!
//! This crate provides the foundational abstractions for runtime selection
//! among competing kernel implementations and for asynchronous,
//! dependency-ordered kernel submission.
//!
//! ## Core Abstractions
//!
//! - [`Function`] - A BLAS operation together with its parameter descriptor
//! - [`Implementation`] - One competing algorithm/kernel pairing for a
//!   function, exposing an acceptance test and an execution entry point
//! - [`Score`] - Fitness record a candidate fills during acceptance
//! - [`Dispatcher`] - Registry and selector that picks the best-scoring
//!   accepted candidate and executes exactly that one
//! - [`Engine`] - Backend-agnostic execution engine interface: kernel lookup,
//!   buffer materialization, asynchronous submission
//! - [`Event`] - Completion handle forming the dependency graph between
//!   submissions
//!
//! ## Example
//!
//! ```
//! use veloblas_core::prelude::*;
//!
//! #[derive(Debug, Clone, Copy)]
//! struct ScaleParams {
//!     n: usize,
//!     incx: usize,
//! }
//!
//! struct Scale;
//!
//! impl Function for Scale {
//!     type Params = ScaleParams;
//!     const NAME: &'static str = "Scale";
//! }
//!
//! struct PackedScale;
//!
//! impl Implementation<Scale> for PackedScale {
//!     fn name(&self) -> &'static str {
//!         "Scale_packed"
//!     }
//!
//!     fn accept(&self, params: &ScaleParams, score: &mut Score) -> bool {
//!         if params.incx == 1 {
//!             score.set(1.1);
//!             true
//!         } else {
//!             false
//!         }
//!     }
//!
//!     fn execute(
//!         &self,
//!         _engine: &dyn Engine,
//!         _params: &ScaleParams,
//!         _deps: &[Event],
//!     ) -> Result<Event> {
//!         Ok(Event::completed())
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dispatch;
pub mod engine;
pub mod error;
pub mod event;
pub mod function;
pub mod geometry;
pub mod memory;
pub mod score;

pub use dispatch::{DispatchMetrics, Dispatcher, Selection};
pub use engine::{Engine, EngineExt, Kernel, KernelArg};
pub use error::{Error, Result};
pub use event::{wait_all, Completion, Event, EventId, EventStatus};
pub use function::{Function, Implementation};
pub use geometry::{KernelOptions, NdRange};
pub use memory::{AccessMode, BufferHandle, BufferId, DeviceBuffer};
pub use score::Score;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::dispatch::{DispatchMetrics, Dispatcher, Selection};
    pub use crate::engine::{Engine, EngineExt, Kernel, KernelArg};
    pub use crate::error::{Error, Result};
    pub use crate::event::{wait_all, Completion, Event, EventId, EventStatus};
    pub use crate::function::{Function, Implementation};
    pub use crate::geometry::{KernelOptions, NdRange};
    pub use crate::memory::{AccessMode, BufferHandle, BufferId, DeviceBuffer};
    pub use crate::score::Score;
}
