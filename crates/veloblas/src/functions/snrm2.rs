//! `snrm2`: Euclidean norm of a real vector.
//!
//! `result ← √(Σ x_i²)` over the `n` strided elements of `x`.

use std::sync::Arc;

use veloblas_core::{
    BufferHandle, Dispatcher, Engine, Event, Function, Implementation, Kernel, KernelArg,
    KernelOptions, Result, Score,
};
use veloblas_cpu::CpuEngine;

use crate::context::Context;

/// Parameter descriptor for one `snrm2` call.
#[derive(Debug, Clone, Copy)]
pub struct Snrm2Params {
    /// Logical vector length.
    pub n: usize,
    /// Operand vector.
    pub x: BufferHandle<f32>,
    /// Stride between consecutive logical elements of `x`.
    pub incx: usize,
    /// One-element result target.
    pub result: BufferHandle<f32>,
}

/// The `snrm2` operation.
pub struct Snrm2;

impl Function for Snrm2 {
    type Params = Snrm2Params;
    const NAME: &'static str = "Snrm2";
}

/// Strided reference variant.
pub struct Snrm2Naive;

impl Implementation<Snrm2> for Snrm2Naive {
    fn name(&self) -> &'static str {
        "Snrm2_naive"
    }

    fn accept(&self, params: &Snrm2Params, score: &mut Score) -> bool {
        if params.incx >= 1 {
            score.set(1.0);
            return true;
        }
        false
    }

    fn execute(&self, engine: &dyn Engine, params: &Snrm2Params, deps: &[Event]) -> Result<Event> {
        let mut kernel = engine.get_kernel("Snrm2_naive", "Snrm2_naive")?;
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
pub struct Snrm2NaiveNoIncx;

impl Implementation<Snrm2> for Snrm2NaiveNoIncx {
    fn name(&self) -> &'static str {
        "Snrm2_naive_noincx"
    }

    fn accept(&self, params: &Snrm2Params, score: &mut Score) -> bool {
        if params.incx == 1 {
            score.set(1.1);
            return true;
        }
        false
    }

    fn execute(&self, engine: &dyn Engine, params: &Snrm2Params, deps: &[Event]) -> Result<Event> {
        let mut kernel = engine.get_kernel("Snrm2_naive_noincx", "Snrm2_naive_noincx")?;
        kernel.set_arg(0, KernelArg::Size(params.n))?;
        kernel.set_arg(
            1,
            KernelArg::Buffer(engine.get_input_buffer(params.x.id(), params.n)?),
        )?;
        kernel.set_arg(
            2,
            KernelArg::Buffer(engine.get_inout_buffer(params.result.id(), 1)?),
        )?;
        kernel.set_options(KernelOptions::single())?;
        kernel.submit(deps)
    }
}

/// Euclidean norm: see the module docs.
pub fn snrm2(
    ctx: &Context,
    n: usize,
    x: BufferHandle<f32>,
    incx: usize,
    result: BufferHandle<f32>,
    deps: &[Event],
) -> Result<Event> {
    ctx.dispatch::<Snrm2>(&Snrm2Params { n, x, incx, result }, deps)
}

pub(crate) fn register(dispatcher: &Dispatcher) {
    dispatcher.register::<Snrm2>(Snrm2Naive);
    dispatcher.register::<Snrm2>(Snrm2NaiveNoIncx);
}

pub(crate) fn install(engine: &CpuEngine) -> Result<()> {
    engine.register_kernel(
        "Snrm2_naive",
        "Snrm2_naive",
        Arc::new(|inv| {
            let n = inv.size(0)?;
            let incx = inv.size(1)?;
            let x = inv.input::<f32>(2)?;
            let mut result = inv.output::<f32>(3)?;
            let mut acc = 0.0f32;
            let mut idx = 0;
            for _ in 0..n {
                acc += x[idx] * x[idx];
                idx += incx;
            }
            result[0] = acc.sqrt();
            Ok(())
        }),
    )?;
    engine.register_kernel(
        "Snrm2_naive_noincx",
        "Snrm2_naive_noincx",
        Arc::new(|inv| {
            let n = inv.size(0)?;
            let x = inv.input::<f32>(1)?;
            let mut result = inv.output::<f32>(2)?;
            let acc: f32 = x[..n].iter().map(|v| v * v).sum();
            result[0] = acc.sqrt();
            Ok(())
        }),
    )?;
    Ok(())
}
