//! `sscal`: in-place vector scaling.
//!
//! `x ← α·x` over the `n` strided elements of `x`. Elements between strided
//! positions are left untouched.

use std::sync::Arc;

use veloblas_core::{
    BufferHandle, Dispatcher, Engine, Event, Function, Implementation, Kernel, KernelArg,
    KernelOptions, Result, Score,
};
use veloblas_cpu::CpuEngine;

use crate::context::Context;

/// Parameter descriptor for one `sscal` call.
#[derive(Debug, Clone, Copy)]
pub struct SscalParams {
    /// Logical vector length.
    pub n: usize,
    /// Scale factor.
    pub alpha: f32,
    /// Operand vector, updated in place.
    pub x: BufferHandle<f32>,
    /// Stride between consecutive logical elements of `x`.
    pub incx: usize,
}

/// The `sscal` operation.
pub struct Sscal;

impl Function for Sscal {
    type Params = SscalParams;
    const NAME: &'static str = "Sscal";
}

/// Strided reference variant.
pub struct SscalNaive;

impl Implementation<Sscal> for SscalNaive {
    fn name(&self) -> &'static str {
        "Sscal_naive"
    }

    fn accept(&self, params: &SscalParams, score: &mut Score) -> bool {
        if params.incx >= 1 {
            score.set(1.0);
            return true;
        }
        false
    }

    fn execute(&self, engine: &dyn Engine, params: &SscalParams, deps: &[Event]) -> Result<Event> {
        let mut kernel = engine.get_kernel("Sscal_naive", "Sscal_naive")?;
        kernel.set_arg(0, KernelArg::Size(params.n))?;
        kernel.set_arg(1, KernelArg::Size(params.incx))?;
        kernel.set_arg(2, KernelArg::Float(params.alpha))?;
        kernel.set_arg(
            3,
            KernelArg::Buffer(engine.get_inout_buffer(params.x.id(), params.n * params.incx)?),
        )?;
        kernel.set_options(KernelOptions::single())?;
        kernel.submit(deps)
    }
}

/// Packed specialization for unit stride.
pub struct SscalNaiveNoIncx;

impl Implementation<Sscal> for SscalNaiveNoIncx {
    fn name(&self) -> &'static str {
        "Sscal_naive_noincx"
    }

    fn accept(&self, params: &SscalParams, score: &mut Score) -> bool {
        if params.incx == 1 {
            score.set(1.1);
            return true;
        }
        false
    }

    fn execute(&self, engine: &dyn Engine, params: &SscalParams, deps: &[Event]) -> Result<Event> {
        let mut kernel = engine.get_kernel("Sscal_naive_noincx", "Sscal_naive_noincx")?;
        kernel.set_arg(0, KernelArg::Size(params.n))?;
        kernel.set_arg(1, KernelArg::Float(params.alpha))?;
        kernel.set_arg(
            2,
            KernelArg::Buffer(engine.get_inout_buffer(params.x.id(), params.n)?),
        )?;
        kernel.set_options(KernelOptions::single())?;
        kernel.submit(deps)
    }
}

/// In-place scaling: see the module docs.
pub fn sscal(
    ctx: &Context,
    n: usize,
    alpha: f32,
    x: BufferHandle<f32>,
    incx: usize,
    deps: &[Event],
) -> Result<Event> {
    ctx.dispatch::<Sscal>(&SscalParams { n, alpha, x, incx }, deps)
}

pub(crate) fn register(dispatcher: &Dispatcher) {
    dispatcher.register::<Sscal>(SscalNaive);
    dispatcher.register::<Sscal>(SscalNaiveNoIncx);
}

pub(crate) fn install(engine: &CpuEngine) -> Result<()> {
    engine.register_kernel(
        "Sscal_naive",
        "Sscal_naive",
        Arc::new(|inv| {
            let n = inv.size(0)?;
            let incx = inv.size(1)?;
            let alpha = inv.float(2)?;
            let mut x = inv.output::<f32>(3)?;
            let mut idx = 0;
            for _ in 0..n {
                x[idx] *= alpha;
                idx += incx;
            }
            Ok(())
        }),
    )?;
    engine.register_kernel(
        "Sscal_naive_noincx",
        "Sscal_naive_noincx",
        Arc::new(|inv| {
            let n = inv.size(0)?;
            let alpha = inv.float(1)?;
            let mut x = inv.output::<f32>(2)?;
            for value in x.iter_mut().take(n) {
                *value *= alpha;
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
    fn test_unit_stride_prefers_packed_variant() {
        let ctx = ctx();
        let x = ctx.buffer_zeroed::<f32>(4).expect("x");
        let selection = ctx
            .select::<Sscal>(&SscalParams {
                n: 4,
                alpha: 2.0,
                x,
                incx: 1,
            })
            .expect("selection");
        assert_eq!(selection.variant, "Sscal_naive_noincx");
        assert_eq!(selection.score.fitness(), 1.1);
    }

    #[test]
    fn test_zero_stride_has_no_candidate() {
        let ctx = ctx();
        let x = ctx.buffer_zeroed::<f32>(4).expect("x");
        let err = ctx
            .select::<Sscal>(&SscalParams {
                n: 4,
                alpha: 2.0,
                x,
                incx: 0,
            })
            .expect_err("no variant accepts stride 0");
        assert!(matches!(err, Error::NoImplementation { .. }));
    }

    #[test]
    fn test_packed_scaling() {
        let ctx = ctx();
        let x = ctx.buffer_from_slice(&[1.0f32, -2.0, 3.0]).expect("x");
        let event = sscal(&ctx, 3, 2.5, x, 1, &[]).expect("dispatch");
        event.wait().expect("completion");
        assert_eq!(ctx.read_buffer(x).expect("read"), vec![2.5, -5.0, 7.5]);
    }

    #[test]
    fn test_strided_scaling_skips_gaps() {
        let ctx = ctx();
        let x = ctx
            .buffer_from_slice(&[1.0f32, 7.0, 2.0, 7.0])
            .expect("x");
        let event = sscal(&ctx, 2, 10.0, x, 2, &[]).expect("dispatch");
        event.wait().expect("completion");
        assert_eq!(
            ctx.read_buffer(x).expect("read"),
            vec![10.0, 7.0, 20.0, 7.0]
        );
    }

    #[test]
    fn test_scaling_by_zero_clears_strided_positions() {
        let ctx = ctx();
        let x = ctx.buffer_from_slice(&[1.0f32, 2.0, 3.0]).expect("x");
        let event = sscal(&ctx, 3, 0.0, x, 1, &[]).expect("dispatch");
        event.wait().expect("completion");
        assert_eq!(ctx.read_buffer(x).expect("read"), vec![0.0, 0.0, 0.0]);
    }
}
