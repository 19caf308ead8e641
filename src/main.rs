mod dataset;
mod helpers;
mod math;
mod opts;
mod prelude;
mod trainer;

use std::fs::File;
use std::io::{self, BufReader, BufWriter};

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::dataset::{write_predictions, Dataset};
use crate::helpers::result::InspectErr;
use crate::opts::Opts;
use crate::prelude::*;
use crate::trainer::Trainer;

fn main() -> Result {
    let opts = opts::parse();
    let _sentry_guard = helpers::tracing::init(opts.sentry_dsn.clone(), opts.traces_sample_rate)?;
    run(opts).stable_inspect_err(|error| {
        error!("failed: {:#}", error);
        sentry::integrations::anyhow::capture_anyhow(error);
    })
}

#[instrument(level = "info", skip_all)]
fn run(opts: Opts) -> Result {
    let start_instant = Instant::now();

    let dataset = match &opts.input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open `{}`", path.display()))?;
            Dataset::read(BufReader::new(file), opts.parse_policy(), opts.max_id)?
        }
        None => Dataset::read(io::stdin().lock(), opts.parse_policy(), opts.max_id)?,
    };

    let mut rng = match opts.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let model = Trainer::new(dataset.store, opts.factorization.into()).fit(&mut rng)?;
    let predictions = model.predict_all(&dataset.queries);

    match &opts.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create `{}`", path.display()))?;
            write_predictions(BufWriter::new(file), &predictions)?;
        }
        None => write_predictions(BufWriter::new(io::stdout().lock()), &predictions)?,
    }

    info!(elapsed = helpers::tracing::format_elapsed(start_instant).as_str(), "finished");
    Ok(())
}
