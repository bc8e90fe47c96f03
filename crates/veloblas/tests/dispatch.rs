//! End-to-end dispatch behavior through the public API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use veloblas::functions::{Sasum, SasumParams};
use veloblas::prelude::*;

#[test]
fn test_selection_is_deterministic() {
    let ctx = Context::new().expect("context builds");
    let x = ctx.buffer_zeroed::<f32>(64).expect("x");
    let result = ctx.buffer_zeroed::<f32>(1).expect("result");
    let params = SasumParams {
        n: 64,
        x,
        incx: 1,
        result,
    };
    let first = ctx.select::<Sasum>(&params).expect("selection");
    for _ in 0..10 {
        let repeat = ctx.select::<Sasum>(&params).expect("selection");
        assert_eq!(repeat.variant, first.variant);
        assert_eq!(repeat.index, first.index);
        assert_eq!(repeat.score, first.score);
    }
}

#[test]
fn test_chained_dependencies_compose() {
    let ctx = Context::new().expect("context builds");
    let x = ctx
        .buffer_from_slice(&[1.0f32, 2.0, 3.0, 4.0])
        .expect("x");
    let y = ctx
        .buffer_from_slice(&[1.0f32, 1.0, 1.0, 1.0])
        .expect("y");
    let result = ctx.buffer_zeroed::<f32>(1).expect("result");

    let scaled = veloblas::sscal(&ctx, 4, 2.0, x, 1, &[]).expect("sscal");
    let updated = veloblas::saxpy(&ctx, 4, 1.0, x, 1, y, 1, &[scaled]).expect("saxpy");
    let dotted = veloblas::sdot(&ctx, 4, x, 1, y, 1, result, &[updated]).expect("sdot");
    dotted.wait().expect("pipeline completes");

    // x = [2,4,6,8]; y = [3,5,7,9]; x . y = 140
    assert_eq!(ctx.read_buffer(y).expect("read y"), vec![3.0, 5.0, 7.0, 9.0]);
    assert_eq!(ctx.read_scalar(result).expect("read result"), 140.0);
    assert_eq!(ctx.metrics().dispatches, 3);
}

#[test]
fn test_no_candidate_reports_operation_and_parameters() {
    let ctx = Context::new().expect("context builds");
    let x = ctx.buffer_zeroed::<f32>(8).expect("x");
    let result = ctx.buffer_zeroed::<f32>(1).expect("result");
    let err = veloblas::sasum(&ctx, 8, x, 0, result, &[]).expect_err("stride 0 dispatch");
    assert!(matches!(err, Error::NoImplementation { .. }));
    let message = err.to_string();
    assert!(message.contains("Sasum"));
    assert!(message.contains("n: 8"));
    assert!(message.contains("incx: 0"));
    assert_eq!(ctx.metrics().no_candidate, 1);
    assert_eq!(ctx.metrics().dispatches, 0);
}

struct CountingVariant {
    executions: Arc<AtomicUsize>,
}

impl Implementation<Sasum> for CountingVariant {
    fn name(&self) -> &'static str {
        "Sasum_counting"
    }

    fn accept(&self, _params: &SasumParams, score: &mut Score) -> bool {
        score.set(9.9);
        true
    }

    fn execute(
        &self,
        _engine: &dyn Engine,
        _params: &SasumParams,
        _deps: &[Event],
    ) -> Result<Event> {
        self.executions.fetch_add(1, Ordering::SeqCst);
        Ok(Event::completed())
    }
}

#[test]
fn test_highest_score_wins_and_runs_exclusively() {
    let ctx = Context::new().expect("context builds");
    let executions = Arc::new(AtomicUsize::new(0));
    ctx.register::<Sasum>(CountingVariant {
        executions: executions.clone(),
    });

    let x = ctx.buffer_from_slice(&[1.0f32, 2.0]).expect("x");
    let result = ctx.buffer_zeroed::<f32>(1).expect("result");
    let params = SasumParams {
        n: 2,
        x,
        incx: 1,
        result,
    };

    let selection = ctx.select::<Sasum>(&params).expect("selection");
    assert_eq!(selection.variant, "Sasum_counting");
    assert_eq!(selection.accepted, 3);

    let event = ctx.dispatch::<Sasum>(&params, &[]).expect("dispatch");
    event.wait().expect("completion");
    assert_eq!(executions.load(Ordering::SeqCst), 1);
    // The catalog kernels never ran, so the result target is untouched.
    assert_eq!(ctx.read_scalar(result).expect("read"), 0.0);
}

#[test]
fn test_metrics_accumulate_across_outcomes() {
    let ctx = Context::new().expect("context builds");
    let x = ctx.buffer_from_slice(&[1.0f32, 2.0, 3.0]).expect("x");
    let result = ctx.buffer_zeroed::<f32>(1).expect("result");

    veloblas::sasum(&ctx, 3, x, 1, result, &[])
        .expect("dispatch")
        .wait()
        .expect("completion");
    veloblas::sasum(&ctx, 3, x, 0, result, &[]).expect_err("no candidate");
    ctx.release_buffer(result).expect("release");
    veloblas::sasum(&ctx, 3, x, 1, result, &[]).expect_err("result buffer is gone");

    // The failed execution still selected a variant, so it counts as a
    // dispatch and as a failure.
    let metrics = ctx.metrics();
    assert_eq!(metrics.dispatches, 2);
    assert_eq!(metrics.no_candidate, 1);
    assert_eq!(metrics.failures, 1);
}
