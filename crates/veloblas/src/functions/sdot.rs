//! `sdot`: dot product of two real vectors.
//!
//! `result ← Σ x_i·y_i` over the `n` strided elements of `x` and `y`.

use std::sync::Arc;

use veloblas_core::{
    BufferHandle, Dispatcher, Engine, Event, Function, Implementation, Kernel, KernelArg,
    KernelOptions, Result, Score,
};
use veloblas_cpu::CpuEngine;

use crate::context::Context;

/// Parameter descriptor for one `sdot` call.
#[derive(Debug, Clone, Copy)]
pub struct SdotParams {
    /// Logical vector length.
    pub n: usize,
    /// Left operand vector.
    pub x: BufferHandle<f32>,
    /// Stride between consecutive logical elements of `x`.
    pub incx: usize,
    /// Right operand vector.
    pub y: BufferHandle<f32>,
    /// Stride between consecutive logical elements of `y`.
    pub incy: usize,
    /// One-element result target.
    pub result: BufferHandle<f32>,
}

/// The `sdot` operation.
pub struct Sdot;

impl Function for Sdot {
    type Params = SdotParams;
    const NAME: &'static str = "Sdot";
}

/// Strided reference variant.
pub struct SdotNaive;

impl Implementation<Sdot> for SdotNaive {
    fn name(&self) -> &'static str {
        "Sdot_naive"
    }

    fn accept(&self, params: &SdotParams, score: &mut Score) -> bool {
        if params.incx >= 1 && params.incy >= 1 {
            score.set(1.0);
            return true;
        }
        false
    }

    fn execute(&self, engine: &dyn Engine, params: &SdotParams, deps: &[Event]) -> Result<Event> {
        let mut kernel = engine.get_kernel("Sdot_naive", "Sdot_naive")?;
        kernel.set_arg(0, KernelArg::Size(params.n))?;
        kernel.set_arg(1, KernelArg::Size(params.incx))?;
        kernel.set_arg(2, KernelArg::Size(params.incy))?;
        kernel.set_arg(
            3,
            KernelArg::Buffer(engine.get_input_buffer(params.x.id(), params.n * params.incx)?),
        )?;
        kernel.set_arg(
            4,
            KernelArg::Buffer(engine.get_input_buffer(params.y.id(), params.n * params.incy)?),
        )?;
        kernel.set_arg(
            5,
            KernelArg::Buffer(engine.get_inout_buffer(params.result.id(), 1)?),
        )?;
        kernel.set_options(KernelOptions::single())?;
        kernel.submit(deps)
    }
}

/// Packed specialization for unit strides on both operands.
pub struct SdotNaiveNoInc;

impl Implementation<Sdot> for SdotNaiveNoInc {
    fn name(&self) -> &'static str {
        "Sdot_naive_noinc"
    }

    fn accept(&self, params: &SdotParams, score: &mut Score) -> bool {
        if params.incx == 1 && params.incy == 1 {
            score.set(1.1);
            return true;
        }
        false
    }

    fn execute(&self, engine: &dyn Engine, params: &SdotParams, deps: &[Event]) -> Result<Event> {
        let mut kernel = engine.get_kernel("Sdot_naive_noinc", "Sdot_naive_noinc")?;
        kernel.set_arg(0, KernelArg::Size(params.n))?;
        kernel.set_arg(
            1,
            KernelArg::Buffer(engine.get_input_buffer(params.x.id(), params.n)?),
        )?;
        kernel.set_arg(
            2,
            KernelArg::Buffer(engine.get_input_buffer(params.y.id(), params.n)?),
        )?;
        kernel.set_arg(
            3,
            KernelArg::Buffer(engine.get_inout_buffer(params.result.id(), 1)?),
        )?;
        kernel.set_options(KernelOptions::single())?;
        kernel.submit(deps)
    }
}

/// Dot product: see the module docs.
#[allow(clippy::too_many_arguments)]
pub fn sdot(
    ctx: &Context,
    n: usize,
    x: BufferHandle<f32>,
    incx: usize,
    y: BufferHandle<f32>,
    incy: usize,
    result: BufferHandle<f32>,
    deps: &[Event],
) -> Result<Event> {
    ctx.dispatch::<Sdot>(
        &SdotParams {
            n,
            x,
            incx,
            y,
            incy,
            result,
        },
        deps,
    )
}

pub(crate) fn register(dispatcher: &Dispatcher) {
    dispatcher.register::<Sdot>(SdotNaive);
    dispatcher.register::<Sdot>(SdotNaiveNoInc);
}

pub(crate) fn install(engine: &CpuEngine) -> Result<()> {
    engine.register_kernel(
        "Sdot_naive",
        "Sdot_naive",
        Arc::new(|inv| {
            let n = inv.size(0)?;
            let incx = inv.size(1)?;
            let incy = inv.size(2)?;
            let x = inv.input::<f32>(3)?;
            let y = inv.input::<f32>(4)?;
            let mut result = inv.output::<f32>(5)?;
            let mut acc = 0.0f32;
            let mut ix = 0;
            let mut iy = 0;
            for _ in 0..n {
                acc += x[ix] * y[iy];
                ix += incx;
                iy += incy;
            }
            result[0] = acc;
            Ok(())
        }),
    )?;
    engine.register_kernel(
        "Sdot_naive_noinc",
        "Sdot_naive_noinc",
        Arc::new(|inv| {
            let n = inv.size(0)?;
            let x = inv.input::<f32>(1)?;
            let y = inv.input::<f32>(2)?;
            let mut result = inv.output::<f32>(3)?;
            result[0] = x[..n].iter().zip(y[..n].iter()).map(|(a, b)| a * b).sum();
            Ok(())
        }),
    )?;
    Ok(())
}
