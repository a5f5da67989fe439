use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tandem_bisect::{driver, Cli, Config};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("tandem_bisect=debug,tandem_bisect_core=debug")
    } else {
        EnvFilter::new("tandem_bisect=info,tandem_bisect_core=info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    // Load config and apply CLI overrides
    let mut config = Config::load_from(cli.config.as_deref())?;
    cli.apply_to_config(&mut config);
    tracing::debug!("Configuration: {:?}", config);

    let report = driver::run(&config, &cli.projects)?;
    if report.is_aborted() {
        tracing::warn!("Stopped by the user");
    }

    Ok(())
}
