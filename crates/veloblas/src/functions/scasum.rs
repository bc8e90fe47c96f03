//! `scasum`: sum of absolute component values of a complex vector.
//!
//! `result ← Σ |re(x_i)| + |im(x_i)|` over the `n` strided elements of `x`.

use std::sync::Arc;

use num_complex::Complex32;

use veloblas_core::{
    BufferHandle, Dispatcher, Engine, Event, Function, Implementation, Kernel, KernelArg,
    KernelOptions, Result, Score,
};
use veloblas_cpu::CpuEngine;

use crate::context::Context;

/// Parameter descriptor for one `scasum` call.
#[derive(Debug, Clone, Copy)]
pub struct ScasumParams {
    /// Logical vector length.
    pub n: usize,
    /// Operand vector.
    pub x: BufferHandle<Complex32>,
    /// Stride between consecutive logical elements of `x`.
    pub incx: usize,
    /// One-element result target.
    pub result: BufferHandle<f32>,
}

/// The `scasum` operation.
pub struct Scasum;

impl Function for Scasum {
    type Params = ScasumParams;
    const NAME: &'static str = "Scasum";
}

/// Strided reference variant.
pub struct ScasumNaive;

impl Implementation<Scasum> for ScasumNaive {
    fn name(&self) -> &'static str {
        "Scasum_naive"
    }

    fn accept(&self, params: &ScasumParams, score: &mut Score) -> bool {
        if params.incx >= 1 {
            score.set(1.0);
            return true;
        }
        false
    }

    fn execute(&self, engine: &dyn Engine, params: &ScasumParams, deps: &[Event]) -> Result<Event> {
        let mut kernel = engine.get_kernel("Scasum_naive", "Scasum_naive")?;
        kernel.set_arg(0, KernelArg::Size(params.n))?;
        kernel.set_arg(1, KernelArg::Size(params.incx))?;
        kernel.set_arg(
            2,
            KernelArg::Buffer(engine.get_input_buffer(params.x.id(), params.n * params.incx)?),
        )?;
        kernel.set_arg(
            3,
            KernelArg::Buffer(engine.get_inout_buffer(params.result.id(), 1)?),
        )?;
        kernel.set_options(KernelOptions::single())?;
        kernel.submit(deps)
    }
}

/// Packed specialization for unit stride.
pub struct ScasumNaiveNoIncx;

impl Implementation<Scasum> for ScasumNaiveNoIncx {
    fn name(&self) -> &'static str {
        "Scasum_naive_noincx"
    }

    fn accept(&self, params: &ScasumParams, score: &mut Score) -> bool {
        if params.incx == 1 {
            score.set(1.1);
            return true;
        }
        false
    }

    fn execute(&self, engine: &dyn Engine, params: &ScasumParams, deps: &[Event]) -> Result<Event> {
        let mut kernel = engine.get_kernel("Scasum_naive_noincx", "Scasum_naive_noincx")?;
        kernel.set_arg(0, KernelArg::Size(params.n))?;
        kernel.set_arg(
            1,
            KernelArg::Buffer(engine.get_input_buffer(params.x.id(), params.n * params.incx)?),
        )?;
        kernel.set_arg(
            2,
            KernelArg::Buffer(engine.get_inout_buffer(params.result.id(), 1)?),
        )?;
        kernel.set_options(KernelOptions::single())?;
        kernel.submit(deps)
    }
}

/// Sum of absolute component values: see the module docs.
pub fn scasum(
    ctx: &Context,
    n: usize,
    x: BufferHandle<Complex32>,
    incx: usize,
    result: BufferHandle<f32>,
    deps: &[Event],
) -> Result<Event> {
    ctx.dispatch::<Scasum>(&ScasumParams { n, x, incx, result }, deps)
}

pub(crate) fn register(dispatcher: &Dispatcher) {
    dispatcher.register::<Scasum>(ScasumNaive);
    dispatcher.register::<Scasum>(ScasumNaiveNoIncx);
}

pub(crate) fn install(engine: &CpuEngine) -> Result<()> {
    engine.register_kernel(
        "Scasum_naive",
        "Scasum_naive",
        Arc::new(|inv| {
            let n = inv.size(0)?;
            let incx = inv.size(1)?;
            let x = inv.input::<Complex32>(2)?;
            let mut result = inv.output::<f32>(3)?;
            let mut acc = 0.0f32;
            let mut idx = 0;
            for _ in 0..n {
                acc += x[idx].re.abs() + x[idx].im.abs();
                idx += incx;
            }
            result[0] = acc;
            Ok(())
        }),
    )?;
    engine.register_kernel(
        "Scasum_naive_noincx",
        "Scasum_naive_noincx",
        Arc::new(|inv| {
            let n = inv.size(0)?;
            let x = inv.input::<Complex32>(1)?;
            let mut result = inv.output::<f32>(2)?;
            result[0] = x[..n].iter().map(|v| v.re.abs() + v.im.abs()).sum();
            Ok(())
        }),
    )?;
    Ok(())
}
