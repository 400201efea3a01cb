// ============================================================
// Layer 1 - CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and routes each subcommand to
// its use case. Results are printed here; everything else
// happens in Layer 2.
//
//   1. `forecast`   - train the w(t+1) regressor and report
//   2. `autoencode` - train the autoencoder, write latent codes
//   3. `inspect`    - print a site's grid and climatology

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{AutoencodeArgs, Commands, ForecastArgs, InspectArgs};

#[derive(Parser, Debug)]
#[command(
    name = "era5-ml",
    version,
    about = "Forecast ERA5 vertical velocity profiles with small neural networks."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Forecast(args)   => run_forecast(args),
            Commands::Autoencode(args) => run_autoencode(args),
            Commands::Inspect(args)    => run_inspect(args),
        }
    }
}

fn run_forecast(args: ForecastArgs) -> Result<()> {
    use crate::application::forecast_use_case::ForecastUseCase;

    tracing::info!("Forecasting w for site '{}' from '{}'", args.data.site, args.data.data_dir);
    let output_dir = args.output_dir.clone();
    let summary    = ForecastUseCase::new(args.into()).execute()?;

    println!(
        "Trained on {} samples ({} validation), final loss {:.4}",
        summary.n_train, summary.n_val, summary.final_train_loss,
    );
    if let (Some(epoch), Some(loss)) = (summary.best_val_epoch, summary.best_val_loss) {
        println!("Best validation loss {:.4} at epoch {}", loss, epoch);
    }
    match (summary.test_mse, summary.test_accuracy) {
        (Some(mse), Some(acc)) => println!(
            "Test period ({} samples): mse={:.6e}, accuracy={:.1}%",
            summary.n_test, mse, acc * 100.0,
        ),
        _ => println!("No test period after the training window."),
    }
    println!("Outputs written to '{}'", output_dir);
    Ok(())
}

fn run_autoencode(args: AutoencodeArgs) -> Result<()> {
    use crate::application::autoencode_use_case::AutoencodeUseCase;

    let output_dir = args.output_dir.clone();
    let summary    = AutoencodeUseCase::new(args.into()).execute()?;

    println!(
        "Autoencoder {} → {} on {} samples: reconstruction mse={:.4}",
        summary.input_dim, summary.latent_dim, summary.n_samples, summary.reconstruction_mse,
    );
    println!("Outputs written to '{}'", output_dir);
    Ok(())
}

fn run_inspect(args: InspectArgs) -> Result<()> {
    use crate::application::inspect_use_case::InspectUseCase;
    use crate::data::loader::Era5Loader;

    let loader  = Era5Loader::new(&args.data.data_dir, &args.data.period);
    let summary = InspectUseCase::new(&loader).summarize(&args.data.site)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", summary.render());
    }
    Ok(())
}
