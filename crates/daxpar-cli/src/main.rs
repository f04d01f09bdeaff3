//! Daxpar command-line interface.
//!
//! Run verified AXPY/summation sweeps from TOML configuration files:
//! ```sh
//! daxpar run job.toml
//! daxpar validate job.toml
//! daxpar sums
//! ```

mod config;
mod runner;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "daxpar")]
#[command(about = "Chunk-parallel AXPY and compensated summation benchmarks")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a benchmark sweep from a TOML configuration file.
    Run {
        /// Path to the job configuration file.
        config: PathBuf,
        /// Output directory (overrides config file setting).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file without running anything.
    Validate {
        /// Path to the job configuration file.
        config: PathBuf,
    },
    /// Compare naive, Kahan and Kahan-Babushka-Neumaier summation.
    Sums,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, output } => {
            println!("Daxpar Benchmark");
            println!("================");
            let job = config::load_config(&config)?;
            println!("Configuration: {}", config.display());

            let records = runner::run_benchmark(&job)?;

            let out_dir = output.unwrap_or_else(|| PathBuf::from(&job.output.directory));

            if job.output.save_csv {
                runner::write_timings_csv(&records, &out_dir.join("timings.csv"))?;
            }
            if job.output.save_json {
                runner::write_timings_json(&records, &out_dir.join("timings.json"))?;
            }

            println!("All results verified.");
            Ok(())
        }
        Commands::Validate { config } => {
            let _job = config::load_config(&config)?;
            println!("Configuration is valid: {}", config.display());
            Ok(())
        }
        Commands::Sums => {
            runner::print_sum_comparison();
            Ok(())
        }
    }
}
