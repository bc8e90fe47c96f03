//! Dispatch-path benchmarks: selection overhead and a small end-to-end
//! reduction on the host engine.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use veloblas::functions::{Sasum, SasumParams};
use veloblas::prelude::*;

fn bench_selection(c: &mut Criterion) {
    let ctx = Context::new().expect("context builds");
    let x = ctx.buffer_zeroed::<f32>(1024).expect("x");
    let result = ctx.buffer_zeroed::<f32>(1).expect("result");
    let packed = SasumParams {
        n: 1024,
        x,
        incx: 1,
        result,
    };
    let strided = SasumParams { incx: 2, ..packed };

    c.bench_function("select_sasum_packed", |b| {
        b.iter(|| ctx.select::<Sasum>(black_box(&packed)).expect("selection"))
    });
    c.bench_function("select_sasum_strided", |b| {
        b.iter(|| ctx.select::<Sasum>(black_box(&strided)).expect("selection"))
    });
}

fn bench_dispatch(c: &mut Criterion) {
    let ctx = Context::new().expect("context builds");
    let data = vec![1.0f32; 1024];
    let x = ctx.buffer_from_slice(&data).expect("x");
    let result = ctx.buffer_zeroed::<f32>(1).expect("result");

    c.bench_function("sasum_1k_end_to_end", |b| {
        b.iter(|| {
            let event = veloblas::sasum(&ctx, 1024, x, 1, result, &[]).expect("dispatch");
            event.wait().expect("completion");
        })
    });
}

criterion_group!(benches, bench_selection, bench_dispatch);
criterion_main!(benches);
