// ============================================================
// Layer 1 - CLI Commands and Arguments
// ============================================================
// Defines the subcommands `forecast`, `autoencode` and
// `inspect` and all their flags. Defaults: site BNF,
// 10000 training steps, 1000 epochs of Adam at lr 0.01,
// a report every 10 epochs.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand, ValueEnum};

use crate::application::{
    autoencode_use_case::{AutoencodeConfig, AutoencodeSource},
    forecast_use_case::ForecastConfig,
};
use crate::data::{dataset::SampleSpec, loader::DEFAULT_PERIOD};
use crate::ml::trainer::FitConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a feed-forward network to forecast w(t+1) from t and q at t
    Forecast(ForecastArgs),

    /// Train an autoencoder on synthetic data or site profiles
    Autoencode(AutoencodeArgs),

    /// Print grid sizes and per-level statistics of a site
    Inspect(InspectArgs),
}

/// Where the profile files live.
#[derive(Args, Debug, Clone)]
pub struct DataArgs {
    /// Root data directory (contains era5hr/climatology/)
    #[arg(long, env = "ERA5_DATA_DIR", default_value = ".")]
    pub data_dir: String,

    /// Site identifier used in the file names
    #[arg(long, default_value = "BNF")]
    pub site: String,

    /// Period suffix of the file names
    #[arg(long, default_value = DEFAULT_PERIOD)]
    pub period: String,
}

/// Optimiser and logging settings shared by both training commands.
#[derive(Args, Debug, Clone)]
pub struct TrainingArgs {
    /// Number of passes over the training samples
    #[arg(long, default_value_t = 1000)]
    pub epochs: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 0.01)]
    pub lr: f64,

    /// Samples per optimizer step; the default covers the
    /// whole training window (full-batch training)
    #[arg(long, default_value_t = 10_000)]
    pub batch_size: usize,

    /// Report loss and accuracy every N epochs
    #[arg(long, default_value_t = 10)]
    pub log_every: usize,

    /// Seed for weight initialisation, shuffling and synthetic data
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

impl From<TrainingArgs> for FitConfig {
    fn from(a: TrainingArgs) -> Self {
        FitConfig {
            epochs:     a.epochs,
            lr:         a.lr,
            batch_size: a.batch_size,
            log_every:  a.log_every,
            seed:       a.seed,
        }
    }
}

#[derive(Args, Debug)]
pub struct ForecastArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub training: TrainingArgs,

    /// Directory for metrics.csv, profile_bias.csv and forecast.csv
    #[arg(long, default_value = "runs/forecast")]
    pub output_dir: String,

    /// Leading samples used for training; the rest is the test period
    #[arg(long, default_value_t = 10_000)]
    pub n_train: usize,

    /// Width of the hidden layer
    #[arg(long, default_value_t = 64)]
    pub hidden_size: usize,

    /// Consecutive time steps fed to the model
    #[arg(long, default_value_t = 1)]
    pub history: usize,

    /// Also use the standardized vertical velocity as a predictor
    #[arg(long)]
    pub include_w: bool,

    /// Share of the training window held out for validation
    #[arg(long, default_value_t = 0.0)]
    pub val_fraction: f64,

    /// Test steps written to forecast.csv
    #[arg(long, default_value_t = 1000)]
    pub report_steps: usize,
}

impl From<ForecastArgs> for ForecastConfig {
    fn from(a: ForecastArgs) -> Self {
        ForecastConfig {
            data_dir:     a.data.data_dir,
            site:         a.data.site,
            period:       a.data.period,
            output_dir:   a.output_dir,
            n_train:      a.n_train,
            hidden_size:  a.hidden_size,
            sample_spec:  SampleSpec { history: a.history, include_w: a.include_w },
            val_fraction: a.val_fraction,
            report_steps: a.report_steps,
            fit:          a.training.into(),
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceArg {
    /// Standard-normal random rows
    Synthetic,
    /// Standardized profiles of one site variable
    Era5,
}

impl From<SourceArg> for AutoencodeSource {
    fn from(s: SourceArg) -> Self {
        match s {
            SourceArg::Synthetic => AutoencodeSource::Synthetic,
            SourceArg::Era5      => AutoencodeSource::Era5,
        }
    }
}

#[derive(Args, Debug)]
pub struct AutoencodeArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub training: TrainingArgs,

    /// Where the training rows come from
    #[arg(long, value_enum, default_value_t = SourceArg::Synthetic)]
    pub source: SourceArg,

    /// Directory for metrics.csv and latent.csv
    #[arg(long, default_value = "runs/autoencode")]
    pub output_dir: String,

    /// Bottleneck width
    #[arg(long, default_value_t = 3)]
    pub latent_size: usize,

    /// Width of the encoder / decoder hidden layers
    #[arg(long, default_value_t = 5)]
    pub hidden_size: usize,

    /// Synthetic rows
    #[arg(long, default_value_t = 10)]
    pub n_samples: usize,

    /// Synthetic features per row
    #[arg(long, default_value_t = 8)]
    pub input_size: usize,

    /// Profile variable for the era5 source (t, q or w)
    #[arg(long, default_value = "w")]
    pub variable: String,

    /// Leading time steps used by the era5 source (0 = all)
    #[arg(long, default_value_t = 10_000)]
    pub n_train: usize,
}

impl From<AutoencodeArgs> for AutoencodeConfig {
    fn from(a: AutoencodeArgs) -> Self {
        AutoencodeConfig {
            source:      a.source.into(),
            output_dir:  a.output_dir,
            latent_size: a.latent_size,
            hidden_size: a.hidden_size,
            n_samples:   a.n_samples,
            input_size:  a.input_size,
            data_dir:    a.data.data_dir,
            site:        a.data.site,
            period:      a.data.period,
            variable:    a.variable,
            n_train:     a.n_train,
            fit:         a.training.into(),
        }
    }
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Print the summary as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}
