use std::collections::VecDeque;
use std::error::Error;

use rten_tensor::RandomSource;
use tenfac::{Data, Model};

mod layout_file;

use layout_file::LayoutFile;

struct Args {
    /// Layout file to load.
    layout: String,

    /// Number of latent dimensions of the random model.
    num_latent: usize,

    /// Seed for the random model.
    seed: Option<u64>,

    /// Enable debug logging.
    verbose: bool,
}

fn parse_args() -> Result<Args, lexopt::Error> {
    use lexopt::prelude::*;

    let mut values = VecDeque::new();
    let mut num_latent = 4;
    let mut seed = None;
    let mut verbose = false;

    let mut parser = lexopt::Parser::from_env();
    while let Some(arg) = parser.next()? {
        match arg {
            Value(val) => values.push_back(val.string()?),
            Short('k') | Long("num-latent") => num_latent = parser.value()?.parse()?,
            Long("seed") => seed = Some(parser.value()?.parse()?),
            Short('v') | Long("verbose") => verbose = true,
            Short('h') | Long("help") => {
                println!(
                    "Inspect block-composed matrices.

Usage: {bin_name} [OPTIONS] <layout>

  -k, --num-latent <N>  Latent dimensions of the random model [default: 4]
      --seed <N>        Seed for the random model
  -v, --verbose         Enable debug logging
  -h, --help            Print help
",
                    bin_name = parser.bin_name().unwrap_or("tenfac")
                );
                std::process::exit(0);
            }
            _ => return Err(arg.unexpected()),
        }
    }

    let layout = values.pop_front().ok_or("missing `<layout>` arg")?;

    Ok(Args {
        layout,
        num_latent,
        seed,
        verbose,
    })
}

/// Source for [Model::rand] that generates floats in [-0.5, 0.5).
struct FloatRng {
    rng: fastrand::Rng,
}

impl FloatRng {
    fn new(seed: Option<u64>) -> FloatRng {
        FloatRng {
            rng: seed.map(fastrand::Rng::with_seed).unwrap_or_default(),
        }
    }
}

impl RandomSource<f64> for FloatRng {
    fn next(&mut self) -> f64 {
        self.rng.f64() - 0.5
    }
}

/// Tool which loads a JSON block layout, resolves it and prints the geometry
/// and statistics of the composed matrix.
///
/// ```
/// cargo run -p tenfac-cli -- -v layout.json
/// ```
///
/// Train RMSE is reported for a randomly initialized model.
fn main() -> Result<(), Box<dyn Error>> {
    let args = parse_args()?;

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let layout = LayoutFile::load(&args.layout)?;
    let mut data = layout.build()?;
    data.init_pre()?;
    data.init_post()?;

    let mut info = String::new();
    data.info(&mut info, "")?;
    print!("{}", info);

    for mode in 0..data.nmode() {
        let sizes: Vec<usize> = (0..data.nview(mode))
            .map(|v| data.view_size(mode, v))
            .collect();
        println!(
            "Mode {}: {} views, offsets {:?}, sizes {:?}",
            mode,
            data.nview(mode),
            data.mode_dim(mode),
            sizes
        );
    }

    let mut rng = FloatRng::new(args.seed);
    let model = Model::rand(args.num_latent, &data.dim(), &mut rng);
    println!(
        "Train RMSE of random model with {} latent dimensions: {:.4}",
        args.num_latent,
        data.train_rmse(&model.view())?
    );

    let mut status = String::new();
    data.status(&mut status, "")?;
    print!("{}", status);

    Ok(())
}
