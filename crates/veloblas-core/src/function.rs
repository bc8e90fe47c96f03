//! The operation / implementation-variant protocol.

use std::fmt;

use crate::engine::Engine;
use crate::error::Result;
use crate::event::Event;
use crate::score::Score;

/// A BLAS operation, identified by name and by its parameter descriptor.
///
/// Functions are type-level markers; one dispatch binds a `&F::Params` to the
/// registered implementations of `F`. The descriptor is immutable for the
/// lifetime of one dispatch and the dispatch core only ever reads it.
pub trait Function: 'static {
    /// Parameter descriptor for one invocation: operand handles, length,
    /// strides, scalar coefficients.
    type Params: fmt::Debug + Send + Sync;

    /// Stable operation name, e.g. `"Scasum"`.
    const NAME: &'static str;
}

/// One competing algorithm/kernel pairing for a function.
///
/// Variants are stateless with respect to any single call; their kernel and
/// module names are read-only configuration. They are registered once at
/// initialization and queried many times.
pub trait Implementation<F: Function>: Send + Sync + 'static {
    /// Stable variant name; together with [`Function::NAME`] this is the
    /// variant's identity. By convention it doubles as the kernel and module
    /// name the variant resolves at execution time.
    fn name(&self) -> &'static str;

    /// Decide whether this variant can serve `params`, and how well.
    ///
    /// A pure O(1) inspection of the descriptor: no device work, no
    /// allocation, no shared-state effects. On acceptance the variant writes
    /// its fitness (a constant or a value computed from the descriptor) into
    /// `score` and returns `true`; on rejection it returns `false` and leaves
    /// `score` untouched. Specialization conditions are checked explicitly
    /// even when the caller is known to satisfy them.
    fn accept(&self, params: &F::Params, score: &mut Score) -> bool;

    /// Configure and submit this variant's kernel(s).
    ///
    /// Resolves the kernel through the engine, binds arguments positionally
    /// (scalars and sizes first, operand buffers in descriptor order, result
    /// last), sizes each operand view as length times stride, attaches the
    /// launch geometry, and submits with `deps` as the happens-after set.
    /// Returns the single event representing completion of the whole
    /// submission; engine accessor failures propagate unchanged.
    ///
    /// Contract: callers invoke this only on a variant that most recently
    /// returned `true` from [`accept`](Implementation::accept) for these
    /// parameters. The dispatcher upholds this by construction; calling it
    /// otherwise is a programming error with unspecified selection behavior,
    /// not a recoverable condition.
    fn execute(&self, engine: &dyn Engine, params: &F::Params, deps: &[Event]) -> Result<Event>;
}
