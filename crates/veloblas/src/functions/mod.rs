//! The level-1 BLAS function catalog.
//!
//! One module per function. Each module defines the parameter descriptor,
//! the [`Function`](veloblas_core::Function) marker, the competing
//! implementation variants with their host kernel bodies, and a free entry
//! point mirroring the BLAS call shape.
//!
//! Variant names double as the kernel and module identities the variants
//! resolve at execution time, so a custom engine serves the catalog by
//! answering for the same identities.

pub mod sasum;
pub mod saxpy;
pub mod scasum;
pub mod sdot;
pub mod snrm2;
pub mod sscal;

pub use sasum::{sasum, Sasum, SasumParams};
pub use saxpy::{saxpy, Saxpy, SaxpyParams};
pub use scasum::{scasum, Scasum, ScasumParams};
pub use sdot::{sdot, Sdot, SdotParams};
pub use snrm2::{snrm2, Snrm2, Snrm2Params};
pub use sscal::{sscal, Sscal, SscalParams};

use veloblas_core::{Dispatcher, Result};
use veloblas_cpu::CpuEngine;

/// Register every catalog variant with `dispatcher`.
///
/// Registration order within each function is the catalog order, which is
/// also the tie-break order during selection.
pub fn register_all(dispatcher: &Dispatcher) {
    scasum::register(dispatcher);
    sasum::register(dispatcher);
    saxpy::register(dispatcher);
    sdot::register(dispatcher);
    sscal::register(dispatcher);
    snrm2::register(dispatcher);
}

/// Install the catalog's host kernel bodies into a [`CpuEngine`].
pub fn install_host_kernels(engine: &CpuEngine) -> Result<()> {
    scasum::install(engine)?;
    sasum::install(engine)?;
    saxpy::install(engine)?;
    sdot::install(engine)?;
    sscal::install(engine)?;
    snrm2::install(engine)?;
    Ok(())
}
