//! `saxpy`: scaled vector addition.
//!
//! `y ← α·x + y` over the `n` strided elements of `x` and `y`.

use std::sync::Arc;

use veloblas_core::{
    BufferHandle, Dispatcher, Engine, Event, Function, Implementation, Kernel, KernelArg,
    KernelOptions, Result, Score,
};
use veloblas_cpu::CpuEngine;

use crate::context::Context;

/// Parameter descriptor for one `saxpy` call.
#[derive(Debug, Clone, Copy)]
pub struct SaxpyParams {
    /// Logical vector length.
    pub n: usize,
    /// Scale applied to `x`.
    pub alpha: f32,
    /// Left operand vector.
    pub x: BufferHandle<f32>,
    /// Stride between consecutive logical elements of `x`.
    pub incx: usize,
    /// Right operand vector, updated in place.
    pub y: BufferHandle<f32>,
    /// Stride between consecutive logical elements of `y`.
    pub incy: usize,
}

/// The `saxpy` operation.
pub struct Saxpy;

impl Function for Saxpy {
    type Params = SaxpyParams;
    const NAME: &'static str = "Saxpy";
}

/// Strided reference variant.
pub struct SaxpyNaive;

impl Implementation<Saxpy> for SaxpyNaive {
    fn name(&self) -> &'static str {
        "Saxpy_naive"
    }

    fn accept(&self, params: &SaxpyParams, score: &mut Score) -> bool {
        if params.incx >= 1 && params.incy >= 1 {
            score.set(1.0);
            return true;
        }
        false
    }

    fn execute(&self, engine: &dyn Engine, params: &SaxpyParams, deps: &[Event]) -> Result<Event> {
        let mut kernel = engine.get_kernel("Saxpy_naive", "Saxpy_naive")?;
        kernel.set_arg(0, KernelArg::Size(params.n))?;
        kernel.set_arg(1, KernelArg::Size(params.incx))?;
        kernel.set_arg(2, KernelArg::Size(params.incy))?;
        kernel.set_arg(3, KernelArg::Float(params.alpha))?;
        kernel.set_arg(
            4,
            KernelArg::Buffer(engine.get_input_buffer(params.x.id(), params.n * params.incx)?),
        )?;
        kernel.set_arg(
            5,
            KernelArg::Buffer(engine.get_inout_buffer(params.y.id(), params.n * params.incy)?),
        )?;
        kernel.set_options(KernelOptions::single())?;
        kernel.submit(deps)
    }
}

/// Packed specialization for unit strides on both operands.
pub struct SaxpyNaiveNoInc;

impl Implementation<Saxpy> for SaxpyNaiveNoInc {
    fn name(&self) -> &'static str {
        "Saxpy_naive_noinc"
    }

    fn accept(&self, params: &SaxpyParams, score: &mut Score) -> bool {
        if params.incx == 1 && params.incy == 1 {
            score.set(1.1);
            return true;
        }
        false
    }

    fn execute(&self, engine: &dyn Engine, params: &SaxpyParams, deps: &[Event]) -> Result<Event> {
        let mut kernel = engine.get_kernel("Saxpy_naive_noinc", "Saxpy_naive_noinc")?;
        kernel.set_arg(0, KernelArg::Size(params.n))?;
        kernel.set_arg(1, KernelArg::Float(params.alpha))?;
        kernel.set_arg(
            2,
            KernelArg::Buffer(engine.get_input_buffer(params.x.id(), params.n)?),
        )?;
        kernel.set_arg(
            3,
            KernelArg::Buffer(engine.get_inout_buffer(params.y.id(), params.n)?),
        )?;
        kernel.set_options(KernelOptions::single())?;
        kernel.submit(deps)
    }
}

/// Scaled vector addition: see the module docs.
#[allow(clippy::too_many_arguments)]
pub fn saxpy(
    ctx: &Context,
    n: usize,
    alpha: f32,
    x: BufferHandle<f32>,
    incx: usize,
    y: BufferHandle<f32>,
    incy: usize,
    deps: &[Event],
) -> Result<Event> {
    ctx.dispatch::<Saxpy>(
        &SaxpyParams {
            n,
            alpha,
            x,
            incx,
            y,
            incy,
        },
        deps,
    )
}

pub(crate) fn register(dispatcher: &Dispatcher) {
    dispatcher.register::<Saxpy>(SaxpyNaive);
    dispatcher.register::<Saxpy>(SaxpyNaiveNoInc);
}

pub(crate) fn install(engine: &CpuEngine) -> Result<()> {
    engine.register_kernel(
        "Saxpy_naive",
        "Saxpy_naive",
        Arc::new(|inv| {
            let n = inv.size(0)?;
            let incx = inv.size(1)?;
            let incy = inv.size(2)?;
            let alpha = inv.float(3)?;
            let x = inv.input::<f32>(4)?;
            let mut y = inv.output::<f32>(5)?;
            let mut ix = 0;
            let mut iy = 0;
            for _ in 0..n {
                y[iy] += alpha * x[ix];
                ix += incx;
                iy += incy;
            }
            Ok(())
        }),
    )?;
    engine.register_kernel(
        "Saxpy_naive_noinc",
        "Saxpy_naive_noinc",
        Arc::new(|inv| {
            let n = inv.size(0)?;
            let alpha = inv.float(1)?;
            let x = inv.input::<f32>(2)?;
            let mut y = inv.output::<f32>(3)?;
            for (yv, xv) in y.iter_mut().take(n).zip(x.iter()) {
                *yv += alpha * xv;
            }
            Ok(())
        }),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use veloblas_core::Error;

    fn ctx() -> Context {
        Context::new().expect("context builds")
    }

    #[test]
    fn test_unit_strides_prefer_packed_variant() {
        let ctx = ctx();
        let x = ctx.buffer_zeroed::<f32>(4).expect("x");
        let y = ctx.buffer_zeroed::<f32>(4).expect("y");
        let selection = ctx
            .select::<Saxpy>(&SaxpyParams {
                n: 4,
                alpha: 2.0,
                x,
                incx: 1,
                y,
                incy: 1,
            })
            .expect("selection");
        assert_eq!(selection.variant, "Saxpy_naive_noinc");
        assert_eq!(selection.score.fitness(), 1.1);
    }

    #[test]
    fn test_mixed_strides_fall_back_to_reference_variant() {
        let ctx = ctx();
        let x = ctx.buffer_zeroed::<f32>(8).expect("x");
        let y = ctx.buffer_zeroed::<f32>(4).expect("y");
        let selection = ctx
            .select::<Saxpy>(&SaxpyParams {
                n: 4,
                alpha: 2.0,
                x,
                incx: 2,
                y,
                incy: 1,
            })
            .expect("selection");
        assert_eq!(selection.variant, "Saxpy_naive");
        assert_eq!(selection.accepted, 1);
    }

    #[test]
    fn test_zero_stride_has_no_candidate() {
        let ctx = ctx();
        let x = ctx.buffer_zeroed::<f32>(4).expect("x");
        let y = ctx.buffer_zeroed::<f32>(4).expect("y");
        let err = ctx
            .select::<Saxpy>(&SaxpyParams {
                n: 4,
                alpha: 2.0,
                x,
                incx: 1,
                y,
                incy: 0,
            })
            .expect_err("no variant accepts stride 0");
        assert!(matches!(err, Error::NoImplementation { .. }));
    }

    #[test]
    fn test_packed_update() {
        let ctx = ctx();
        let x = ctx.buffer_from_slice(&[1.0f32, 2.0, 3.0]).expect("x");
        let y = ctx.buffer_from_slice(&[10.0f32, 20.0, 30.0]).expect("y");
        let event = saxpy(&ctx, 3, 2.0, x, 1, y, 1, &[]).expect("dispatch");
        event.wait().expect("completion");
        assert_eq!(ctx.read_buffer(y).expect("read"), vec![12.0, 24.0, 36.0]);
    }

    #[test]
    fn test_strided_update_leaves_gaps_untouched() {
        let ctx = ctx();
        let x = ctx.buffer_from_slice(&[1.0f32, 2.0]).expect("x");
        let y = ctx
            .buffer_from_slice(&[10.0f32, -1.0, 20.0, -1.0])
            .expect("y");
        let event = saxpy(&ctx, 2, 3.0, x, 1, y, 2, &[]).expect("dispatch");
        event.wait().expect("completion");
        assert_eq!(
            ctx.read_buffer(y).expect("read"),
            vec![13.0, -1.0, 26.0, -1.0]
        );
    }

    #[test]
    fn test_empty_range_is_a_no_op() {
        let ctx = ctx();
        let x = ctx.buffer_from_slice(&[1.0f32]).expect("x");
        let y = ctx.buffer_from_slice(&[5.0f32]).expect("y");
        let event = saxpy(&ctx, 0, 2.0, x, 1, y, 1, &[]).expect("dispatch");
        event.wait().expect("completion");
        assert_eq!(ctx.read_buffer(y).expect("read"), vec![5.0]);
    }
}
