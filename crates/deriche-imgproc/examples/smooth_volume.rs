use std::time::Instant;

use argh::FromArgs;
use rand::{rngs::StdRng, Rng, SeedableRng};

use deriche_image::Volume;
use deriche_imgproc::filter::{discrete_gaussian, recursive_gaussian_derivative};
use deriche_imgproc::parallel::ExecutionStrategy;
use deriche_imgproc::recursive::GaussianOrder;

/// Smooths a noisy synthetic cube with the recursive and the discrete Gaussian
#[derive(Debug, FromArgs)]
struct Args {
    /// edge length of the cubic volume
    #[argh(option, short = 's', default = "64")]
    size: usize,

    /// standard deviation of the Gaussian, in physical units
    #[argh(option, short = 'g', default = "2.0")]
    sigma: f64,

    /// physical spacing along the slowest axis
    #[argh(option, default = "1.0")]
    slice_spacing: f64,

    /// derivative order along the fastest axis (0, 1 or 2)
    #[argh(option, short = 'o', default = "GaussianOrder::Zero", from_str_fn(to_order))]
    order: GaussianOrder,

    /// number of worker threads, 0 for the global pool
    #[argh(option, short = 't', default = "0")]
    threads: usize,
}

fn to_order(value: &str) -> Result<GaussianOrder, String> {
    match value {
        "0" => Ok(GaussianOrder::Zero),
        "1" => Ok(GaussianOrder::First),
        "2" => Ok(GaussianOrder::Second),
        _ => Err(format!("unsupported derivative order: {value}")),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let strategy = match args.threads {
        0 => ExecutionStrategy::Parallel,
        n => ExecutionStrategy::Fixed(n),
    };

    // bright cube in the middle of a dark, noisy volume
    let n = args.size;
    let mut rng = StdRng::seed_from_u64(0);
    let volume = Volume::<u8, 3>::from_shape_fn([n, n, n], |[z, y, x]| {
        let inside = [z, y, x].iter().all(|&i| i >= n / 4 && i < 3 * n / 4);
        let base = if inside { 180.0 } else { 40.0 };
        let noise: f64 = rng.random_range(-30.0..30.0);
        (base + noise) as u8
    })
    .with_spacing([args.slice_spacing, 1.0, 1.0])?;

    let start = Instant::now();
    let recursive = recursive_gaussian_derivative::<f32, _, 3>(
        &volume.cast::<f32>()?,
        args.sigma,
        [GaussianOrder::Zero, GaussianOrder::Zero, args.order],
        false,
        strategy,
    )?;
    println!("recursive: {:?}", start.elapsed());

    let start = Instant::now();
    let discrete = discrete_gaussian::<f32, _, 3>(
        &volume,
        [args.sigma * args.sigma; 3],
        0.01,
        64,
        strategy,
    )?;
    println!("discrete: {:?}", start.elapsed());

    let center = [n / 2, n / 2, n / 2];
    let edge = [n / 2, n / 2, n / 4];
    println!(
        "center: input {:?} recursive {:?} discrete {:?}",
        volume.get(center),
        recursive.get(center),
        discrete.get(center)
    );
    println!(
        "cube edge: input {:?} recursive {:?} discrete {:?}",
        volume.get(edge),
        recursive.get(edge),
        discrete.get(edge)
    );

    Ok(())
}
