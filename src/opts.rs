//! CLI options.

use std::path::PathBuf;

use clap::{Args, Parser};

use crate::dataset::ParsePolicy;
use crate::trainer::Hyperparameters;

mod parsers;

#[derive(Parser)]
#[command(author, version, about)]
pub struct Opts {
    /// Sentry DSN
    #[arg(long, env = "SENTRY_DSN")]
    pub sentry_dsn: Option<String>,

    /// Performance monitoring sample rate for Sentry
    #[arg(long, env = "TRACES_SAMPLE_RATE", default_value = "0")]
    pub traces_sample_rate: f32,

    /// Input file with the training ratings and the queries, defaults to stdin
    #[arg(short, long, env = "RATINGS_INPUT")]
    pub input: Option<PathBuf>,

    /// Output file for the predictions, defaults to stdout
    #[arg(short, long, env = "RATINGS_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Read malformed fields as zeroes instead of failing
    #[arg(long, env = "RATINGS_LENIENT")]
    pub lenient: bool,

    /// Maximum user and item ID in the training ratings
    #[arg(
        long,
        env = "RATINGS_MAX_ID",
        default_value = "1000000",
        value_parser = parsers::non_zero_u32,
    )]
    pub max_id: u32,

    /// Random seed for the factor initialization, defaults to the system entropy
    #[arg(long, env = "RATINGS_SEED")]
    pub seed: Option<u64>,

    #[command(flatten)]
    pub factorization: FactorizationOpts,
}

impl Opts {
    pub const fn parse_policy(&self) -> ParsePolicy {
        if self.lenient {
            ParsePolicy::Lenient
        } else {
            ParsePolicy::Strict
        }
    }
}

/// Matrix factorization (machine learning) options.
#[derive(Args, Clone, Copy)]
pub struct FactorizationOpts {
    /// Latent factor count
    #[arg(
        long = "factors",
        env = "RATINGS_FACTORS",
        default_value = "9",
        value_parser = parsers::non_zero_usize,
    )]
    pub n_factors: usize,

    /// Number of passes over the training ratings
    #[arg(long = "iterations", env = "RATINGS_ITERATIONS", default_value = "50")]
    pub n_iterations: usize,

    /// SGD learning rate
    #[arg(
        long,
        env = "RATINGS_LEARNING_RATE",
        default_value = "0.015",
        value_parser = parsers::learning_rate,
    )]
    pub learning_rate: f64,

    /// L2 regularization parameter
    #[arg(
        long,
        env = "RATINGS_REGULARIZATION",
        default_value = "0.1",
        value_parser = parsers::regularization,
    )]
    pub regularization: f64,
}

impl From<FactorizationOpts> for Hyperparameters {
    fn from(opts: FactorizationOpts) -> Self {
        Self {
            n_factors: opts.n_factors,
            n_iterations: opts.n_iterations,
            learning_rate: opts.learning_rate,
            regularization: opts.regularization,
        }
    }
}

pub fn parse() -> Opts {
    Opts::parse()
}
