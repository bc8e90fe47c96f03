//! Tour of the level-1 catalog on the host engine.
//!
//! Run with `RUST_LOG=veloblas=debug` to watch selection and submission.

use veloblas::prelude::*;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let ctx = Context::new()?;

    let x = ctx.buffer_from_slice(&[1.0f32, -2.0, 3.0, -4.0])?;
    let y = ctx.buffer_from_slice(&[0.5f32, 0.5, 0.5, 0.5])?;
    let asum = ctx.buffer_zeroed::<f32>(1)?;
    let dot = ctx.buffer_zeroed::<f32>(1)?;
    let norm = ctx.buffer_zeroed::<f32>(1)?;

    // Independent reductions over x.
    let events = vec![
        sasum(&ctx, 4, x, 1, asum, &[])?,
        snrm2(&ctx, 4, x, 1, norm, &[])?,
    ];
    wait_all(&events)?;
    println!("asum(x)  = {}", ctx.read_scalar(asum)?);
    println!("nrm2(x)  = {}", ctx.read_scalar(norm)?);

    // A dependent chain: scale x, fold it into y, then take the dot product.
    let scaled = sscal(&ctx, 4, 2.0, x, 1, &[])?;
    let updated = saxpy(&ctx, 4, 1.0, x, 1, y, 1, &[scaled])?;
    sdot(&ctx, 4, x, 1, y, 1, dot, &[updated])?.wait()?;
    println!("x        = {:?}", ctx.read_buffer(x)?);
    println!("y        = {:?}", ctx.read_buffer(y)?);
    println!("x . y    = {}", ctx.read_scalar(dot)?);

    // Complex input routes through the scasum catalog entry.
    let z = ctx.buffer_from_slice(&[
        Complex32::new(1.0, -1.0),
        Complex32::new(-2.0, 2.0),
    ])?;
    let csum = ctx.buffer_zeroed::<f32>(1)?;
    scasum(&ctx, 2, z, 1, csum, &[])?.wait()?;
    println!("scasum(z) = {}", ctx.read_scalar(csum)?);

    // Selection can be inspected without running anything.
    let big = ctx.buffer_zeroed::<f32>(1 << 17)?;
    let selection = ctx.select::<veloblas::functions::Sasum>(&veloblas::functions::SasumParams {
        n: 1 << 17,
        x: big,
        incx: 1,
        result: asum,
    })?;
    println!(
        "sasum n=131072 routes to {} (fitness {}, work groups {:?})",
        selection.variant,
        selection.score.fitness(),
        selection.score.annotation("work_groups")
    );

    println!("dispatch metrics: {:?}", ctx.metrics());
    Ok(())
}
