//! Error types for the VeloBLAS dispatch core.

use crate::memory::BufferId;
use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by dispatch, engine access, and kernel submission.
#[derive(Error, Debug)]
pub enum Error {
    /// No registered implementation accepted the call parameters.
    #[error("no applicable implementation of {function} for parameters {params}")]
    NoImplementation {
        /// Operation name.
        function: &'static str,
        /// Parameter values every candidate rejected.
        params: String,
    },

    /// The operation has no registered implementations at all.
    #[error("function {0} has no registered implementations")]
    UnknownFunction(&'static str),

    /// The named kernel could not be resolved by the engine.
    #[error("kernel {kernel} not found in module {module}")]
    KernelNotFound {
        /// Module name.
        module: String,
        /// Kernel name within the module.
        kernel: String,
    },

    /// A kernel with the same identity is already registered.
    #[error("kernel {kernel} already registered in module {module}")]
    DuplicateKernel {
        /// Module name.
        module: String,
        /// Kernel name within the module.
        kernel: String,
    },

    /// The referenced memory object is not known to the engine.
    #[error("unknown buffer {0}")]
    UnknownBuffer(BufferId),

    /// A requested span exceeds the capacity of the memory object.
    #[error("buffer {buffer}: requested span of {requested} elements exceeds capacity {capacity}")]
    BufferOverrun {
        /// The memory object.
        buffer: BufferId,
        /// Requested span in elements.
        requested: usize,
        /// Registered capacity in elements.
        capacity: usize,
    },

    /// The engine could not allocate backing storage.
    #[error("allocation of {elements} x {elem_size} byte elements failed: {reason}")]
    AllocationFailed {
        /// Requested element count.
        elements: usize,
        /// Element size in bytes.
        elem_size: usize,
        /// Engine-specific reason.
        reason: String,
    },

    /// A kernel argument is missing, out of range, or of the wrong kind.
    #[error("invalid kernel argument at index {index}: {reason}")]
    InvalidArgument {
        /// Positional argument index.
        index: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// The launch geometry is missing or inconsistent.
    #[error("invalid launch configuration: {0}")]
    InvalidLaunch(String),

    /// The engine refused the submission.
    #[error("kernel submission failed: {0}")]
    SubmitFailed(String),

    /// An already-submitted kernel failed during asynchronous execution.
    #[error("{label}: execution failed: {reason}")]
    ExecutionFailed {
        /// Submission label (module and kernel).
        label: String,
        /// Failure reason reported by the engine.
        reason: String,
    },

    /// Engine-specific failure that fits no other variant.
    #[error("engine error: {0}")]
    EngineError(String),
}
