//! Event ordering and failure propagation through the public API.

use std::sync::Arc;
use std::time::Duration;

use veloblas::prelude::*;

#[test]
fn test_wait_all_gathers_independent_dispatches() {
    let ctx = Context::new().expect("context builds");
    let x = ctx
        .buffer_from_slice(&[1.0f32, -2.0, 2.0])
        .expect("x");
    let asum = ctx.buffer_zeroed::<f32>(1).expect("asum");
    let nrm2 = ctx.buffer_zeroed::<f32>(1).expect("nrm2");
    let dot = ctx.buffer_zeroed::<f32>(1).expect("dot");

    let events = vec![
        veloblas::sasum(&ctx, 3, x, 1, asum, &[]).expect("sasum"),
        veloblas::snrm2(&ctx, 3, x, 1, nrm2, &[]).expect("snrm2"),
        veloblas::sdot(&ctx, 3, x, 1, x, 1, dot, &[]).expect("sdot"),
    ];
    wait_all(&events).expect("all complete");

    assert_eq!(ctx.read_scalar(asum).expect("read"), 5.0);
    assert_eq!(ctx.read_scalar(nrm2).expect("read"), 3.0);
    assert_eq!(ctx.read_scalar(dot).expect("read"), 9.0);
}

#[test]
fn test_wait_timeout_on_finished_event() {
    let ctx = Context::new().expect("context builds");
    let x = ctx.buffer_from_slice(&[1.0f32, 2.0]).expect("x");
    let result = ctx.buffer_zeroed::<f32>(1).expect("result");
    let event = veloblas::sasum(&ctx, 2, x, 1, result, &[]).expect("dispatch");
    event.wait().expect("completion");
    assert!(event.wait_timeout(Duration::from_millis(1)).expect("status"));
    assert_eq!(event.status(), EventStatus::Complete);
}

#[test]
fn test_resource_error_surfaces_at_dispatch_time() {
    let ctx = Context::new().expect("context builds");
    let x = ctx.buffer_from_slice(&[1.0f32, 2.0]).expect("x");
    let result = ctx.buffer_zeroed::<f32>(1).expect("result");
    ctx.release_buffer(result).expect("release");
    let err = veloblas::sasum(&ctx, 2, x, 1, result, &[]).expect_err("result is gone");
    assert!(matches!(err, Error::UnknownBuffer(_)));
}

#[test]
fn test_failed_dependency_fails_catalog_dispatch() {
    let engine = Arc::new(CpuEngine::new().expect("engine starts"));
    veloblas::functions::install_host_kernels(&engine).expect("kernels install");
    engine
        .register_kernel(
            "test",
            "explode",
            Arc::new(|_inv| Err(Error::EngineError("forced failure".to_string()))),
        )
        .expect("registration");
    let ctx = Context::builder()
        .engine(engine.clone())
        .build()
        .expect("context builds");

    let mut failing = engine.get_kernel("explode", "test").expect("kernel");
    failing
        .set_options(KernelOptions::single())
        .expect("options");
    let failed = failing.submit(&[]).expect("submit");

    let x = ctx.buffer_from_slice(&[1.0f32, 2.0]).expect("x");
    let result = ctx.buffer_zeroed::<f32>(1).expect("result");
    ctx.write_buffer(result, &[42.0f32]).expect("seed");
    let event = veloblas::sasum(&ctx, 2, x, 1, result, &[failed]).expect("dispatch");

    let err = event.wait().expect_err("dependency failure propagates");
    assert!(err.to_string().contains("dependency"));
    // The gated kernel never ran.
    assert_eq!(ctx.read_scalar(result).expect("read"), 42.0);
}

#[test]
fn test_completed_event_is_a_neutral_dependency() {
    let ctx = Context::new().expect("context builds");
    let x = ctx.buffer_from_slice(&[1.0f32, 2.0]).expect("x");
    let result = ctx.buffer_zeroed::<f32>(1).expect("result");
    let event =
        veloblas::sasum(&ctx, 2, x, 1, result, &[Event::completed()]).expect("dispatch");
    event.wait().expect("completion");
    assert_eq!(ctx.read_scalar(result).expect("read"), 3.0);
}
