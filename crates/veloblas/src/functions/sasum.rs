//! `sasum`: sum of absolute values of a real vector.
//!
//! `result ← Σ |x_i|` over the `n` strided elements of `x`. Large packed
//! inputs route to a two-stage reduction pipeline that first folds the input
//! into per-work-group partials and then collapses the partials.

use std::sync::Arc;

use veloblas_core::{
    BufferHandle, BufferId, Dispatcher, Engine, Event, Function, Implementation, Kernel, KernelArg,
    KernelOptions, NdRange, Result, Score,
};
use veloblas_cpu::CpuEngine;

use crate::context::Context;

/// Work-group size of the two-stage reduction kernels.
const TWO_STAGE_WG: usize = 256;
/// Upper bound on partial-sum work groups.
const TWO_STAGE_MAX_GROUPS: usize = 256;
/// Smallest length the two-stage pipeline accepts.
const TWO_STAGE_MIN_N: usize = 65536;

/// Parameter descriptor for one `sasum` call.
#[derive(Debug, Clone, Copy)]
pub struct SasumParams {
    /// Logical vector length.
    pub n: usize,
    /// Operand vector.
    pub x: BufferHandle<f32>,
    /// Stride between consecutive logical elements of `x`.
    pub incx: usize,
    /// One-element result target.
    pub result: BufferHandle<f32>,
}

/// The `sasum` operation.
pub struct Sasum;

impl Function for Sasum {
    type Params = SasumParams;
    const NAME: &'static str = "Sasum";
}

/// Strided reference variant.
pub struct SasumNaive;

impl Implementation<Sasum> for SasumNaive {
    fn name(&self) -> &'static str {
        "Sasum_naive"
    }

    fn accept(&self, params: &SasumParams, score: &mut Score) -> bool {
        if params.incx >= 1 {
            score.set(1.0);
            return true;
        }
        false
    }

    fn execute(&self, engine: &dyn Engine, params: &SasumParams, deps: &[Event]) -> Result<Event> {
        let mut kernel = engine.get_kernel("Sasum_naive", "Sasum_naive")?;
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
pub struct SasumNaiveNoIncx;

impl Implementation<Sasum> for SasumNaiveNoIncx {
    fn name(&self) -> &'static str {
        "Sasum_naive_noincx"
    }

    fn accept(&self, params: &SasumParams, score: &mut Score) -> bool {
        if params.incx == 1 {
            score.set(1.1);
            return true;
        }
        false
    }

    fn execute(&self, engine: &dyn Engine, params: &SasumParams, deps: &[Event]) -> Result<Event> {
        let mut kernel = engine.get_kernel("Sasum_naive_noincx", "Sasum_naive_noincx")?;
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

/// Two-stage reduction pipeline for large packed inputs.
///
/// Stage one folds the input into one partial sum per work group; stage two
/// collapses the partials into the result, gated on stage one's event. The
/// partials live in a scratch buffer released right after the final
/// submission.
pub struct SasumTwoStage;

fn two_stage_groups(n: usize) -> usize {
    n.div_ceil(TWO_STAGE_WG).clamp(1, TWO_STAGE_MAX_GROUPS)
}

impl Implementation<Sasum> for SasumTwoStage {
    fn name(&self) -> &'static str {
        "Sasum_two_stage"
    }

    fn accept(&self, params: &SasumParams, score: &mut Score) -> bool {
        if params.incx == 1 && params.n >= TWO_STAGE_MIN_N {
            score.set(1.5);
            score.annotate("work_groups", two_stage_groups(params.n) as f32);
            return true;
        }
        false
    }

    fn execute(&self, engine: &dyn Engine, params: &SasumParams, deps: &[Event]) -> Result<Event> {
        let groups = two_stage_groups(params.n);
        let partials = engine.create_buffer(std::mem::size_of::<f32>(), groups)?;
        let submitted = submit_two_stage(engine, params, deps, partials, groups);
        engine.release_buffer(partials)?;
        submitted
    }
}

fn submit_two_stage(
    engine: &dyn Engine,
    params: &SasumParams,
    deps: &[Event],
    partials: BufferId,
    groups: usize,
) -> Result<Event> {
    let mut partial = engine.get_kernel("Sasum_two_stage_partial", "Sasum_two_stage")?;
    partial.set_arg(0, KernelArg::Size(params.n))?;
    partial.set_arg(
        1,
        KernelArg::Buffer(engine.get_input_buffer(params.x.id(), params.n)?),
    )?;
    partial.set_arg(
        2,
        KernelArg::Buffer(engine.get_output_buffer(partials, groups)?),
    )?;
    partial.set_options(
        KernelOptions::new(NdRange::d1(groups * TWO_STAGE_WG)).with_local(NdRange::d1(TWO_STAGE_WG)),
    )?;
    let staged = partial.submit(deps)?;

    let mut reduce = engine.get_kernel("Sasum_two_stage_reduce", "Sasum_two_stage")?;
    reduce.set_arg(0, KernelArg::Size(groups))?;
    reduce.set_arg(
        1,
        KernelArg::Buffer(engine.get_input_buffer(partials, groups)?),
    )?;
    reduce.set_arg(
        2,
        KernelArg::Buffer(engine.get_inout_buffer(params.result.id(), 1)?),
    )?;
    reduce.set_options(KernelOptions::single())?;
    reduce.submit(&[staged])
}

/// Sum of absolute values: see the module docs.
pub fn sasum(
    ctx: &Context,
    n: usize,
    x: BufferHandle<f32>,
    incx: usize,
    result: BufferHandle<f32>,
    deps: &[Event],
) -> Result<Event> {
    ctx.dispatch::<Sasum>(&SasumParams { n, x, incx, result }, deps)
}

pub(crate) fn register(dispatcher: &Dispatcher) {
    dispatcher.register::<Sasum>(SasumNaive);
    dispatcher.register::<Sasum>(SasumNaiveNoIncx);
    dispatcher.register::<Sasum>(SasumTwoStage);
}

pub(crate) fn install(engine: &CpuEngine) -> Result<()> {
    engine.register_kernel(
        "Sasum_naive",
        "Sasum_naive",
        Arc::new(|inv| {
            let n = inv.size(0)?;
            let incx = inv.size(1)?;
            let x = inv.input::<f32>(2)?;
            let mut result = inv.output::<f32>(3)?;
            let mut acc = 0.0f32;
            let mut idx = 0;
            for _ in 0..n {
                acc += x[idx].abs();
                idx += incx;
            }
            result[0] = acc;
            Ok(())
        }),
    )?;
    engine.register_kernel(
        "Sasum_naive_noincx",
        "Sasum_naive_noincx",
        Arc::new(|inv| {
            let n = inv.size(0)?;
            let x = inv.input::<f32>(1)?;
            let mut result = inv.output::<f32>(2)?;
            result[0] = x[..n].iter().map(|v| v.abs()).sum();
            Ok(())
        }),
    )?;
    engine.register_kernel(
        "Sasum_two_stage",
        "Sasum_two_stage_partial",
        Arc::new(|inv| {
            let n = inv.size(0)?;
            let x = inv.input::<f32>(1)?;
            let mut partials = inv.output::<f32>(2)?;
            // One contiguous chunk per work group.
            let chunk = n.div_ceil(partials.len().max(1));
            for (group, out) in partials.iter_mut().enumerate() {
                let start = (group * chunk).min(n);
                let end = ((group + 1) * chunk).min(n);
                *out = x[start..end].iter().map(|v| v.abs()).sum();
            }
            Ok(())
        }),
    )?;
    engine.register_kernel(
        "Sasum_two_stage",
        "Sasum_two_stage_reduce",
        Arc::new(|inv| {
            let groups = inv.size(0)?;
            let partials = inv.input::<f32>(1)?;
            let mut result = inv.output::<f32>(2)?;
            result[0] = partials[..groups].iter().sum();
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
    fn test_small_packed_input_prefers_packed_variant() {
        let ctx = ctx();
        let x = ctx.buffer_zeroed::<f32>(1024).expect("x");
        let result = ctx.buffer_zeroed::<f32>(1).expect("result");
        let selection = ctx
            .select::<Sasum>(&SasumParams {
                n: 1024,
                x,
                incx: 1,
                result,
            })
            .expect("selection");
        assert_eq!(selection.variant, "Sasum_naive_noincx");
        assert_eq!(selection.score.fitness(), 1.1);
        assert_eq!(selection.accepted, 2);
    }

    #[test]
    fn test_large_packed_input_prefers_two_stage() {
        let ctx = ctx();
        let x = ctx.buffer_zeroed::<f32>(TWO_STAGE_MIN_N).expect("x");
        let result = ctx.buffer_zeroed::<f32>(1).expect("result");
        let selection = ctx
            .select::<Sasum>(&SasumParams {
                n: TWO_STAGE_MIN_N,
                x,
                incx: 1,
                result,
            })
            .expect("selection");
        assert_eq!(selection.variant, "Sasum_two_stage");
        assert_eq!(selection.index, 2);
        assert_eq!(selection.score.fitness(), 1.5);
        assert_eq!(selection.accepted, 3);
        assert_eq!(selection.score.annotation("work_groups"), Some(256.0));
    }

    #[test]
    fn test_large_strided_input_keeps_reference_variant() {
        let ctx = ctx();
        let x = ctx.buffer_zeroed::<f32>(2 * TWO_STAGE_MIN_N).expect("x");
        let result = ctx.buffer_zeroed::<f32>(1).expect("result");
        let selection = ctx
            .select::<Sasum>(&SasumParams {
                n: TWO_STAGE_MIN_N,
                x,
                incx: 2,
                result,
            })
            .expect("selection");
        assert_eq!(selection.variant, "Sasum_naive");
        assert_eq!(selection.accepted, 1);
    }

    #[test]
    fn test_zero_stride_has_no_candidate() {
        let ctx = ctx();
        let x = ctx.buffer_zeroed::<f32>(8).expect("x");
        let result = ctx.buffer_zeroed::<f32>(1).expect("result");
        let err = ctx
            .select::<Sasum>(&SasumParams {
                n: 8,
                x,
                incx: 0,
                result,
            })
            .expect_err("no variant accepts stride 0");
        assert!(matches!(err, Error::NoImplementation { .. }));
    }

    #[test]
    fn test_packed_sum() {
        let ctx = ctx();
        let x = ctx
            .buffer_from_slice(&[1.0f32, -2.0, 3.0, -4.0])
            .expect("x");
        let result = ctx.buffer_zeroed::<f32>(1).expect("result");
        let event = sasum(&ctx, 4, x, 1, result, &[]).expect("dispatch");
        event.wait().expect("completion");
        assert_eq!(ctx.read_scalar(result).expect("read"), 10.0);
    }

    #[test]
    fn test_strided_sum() {
        let ctx = ctx();
        let x = ctx
            .buffer_from_slice(&[1.0f32, 9.0, -2.0, 9.0, 3.0, 9.0])
            .expect("x");
        let result = ctx.buffer_zeroed::<f32>(1).expect("result");
        let event = sasum(&ctx, 3, x, 2, result, &[]).expect("dispatch");
        event.wait().expect("completion");
        assert_eq!(ctx.read_scalar(result).expect("read"), 6.0);
    }

    #[test]
    fn test_two_stage_matches_naive_result() {
        let ctx = ctx();
        let data = vec![-0.5f32; TWO_STAGE_MIN_N];
        let x = ctx.buffer_from_slice(&data).expect("x");
        let result = ctx.buffer_zeroed::<f32>(1).expect("result");
        let event = sasum(&ctx, TWO_STAGE_MIN_N, x, 1, result, &[]).expect("dispatch");
        event.wait().expect("completion");
        assert_eq!(
            ctx.read_scalar(result).expect("read"),
            TWO_STAGE_MIN_N as f32 * 0.5
        );
        assert_eq!(ctx.metrics().dispatches, 1);
    }

    #[test]
    fn test_group_count_clamped() {
        assert_eq!(two_stage_groups(1), 1);
        assert_eq!(two_stage_groups(TWO_STAGE_WG), 1);
        assert_eq!(two_stage_groups(TWO_STAGE_WG + 1), 2);
        assert_eq!(two_stage_groups(TWO_STAGE_MIN_N), 256);
        assert_eq!(two_stage_groups(100 * TWO_STAGE_MIN_N), 256);
    }
}
