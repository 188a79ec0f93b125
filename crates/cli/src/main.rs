use crate::{
    args::PourArgs,
    error::CliError,
    shutdown::{ExitCode, ShutdownCoordinator},
};
use clap::Parser;
use engine_runtime::{execution, registry::AdapterRegistry};
use std::io::Write;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod args;
mod error;
mod report;
mod shutdown;

#[derive(Parser)]
#[command(
    name = "pour",
    version,
    about = "Pour rows from an input adapter into an output adapter"
)]
pub(crate) struct Cli {
    #[command(flatten)]
    pour: PourArgs,

    #[arg(long, help = "Print the registered adapter references and exit")]
    list_adapters: bool,

    #[arg(short, long, conflicts_with = "verbose", help = "Only log warnings and errors")]
    quiet: bool,

    #[arg(short, long, help = "Log adapter details and steps")]
    verbose: bool,
}

impl Cli {
    fn log_filter(&self) -> EnvFilter {
        if self.quiet {
            EnvFilter::new("warn")
        } else if self.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
        }
    }
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(cli.log_filter())
        .with_writer(std::io::stderr)
        .init();

    let code = match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            error!(step = err.step(), "Run failed");
            eprint!("{}", err.report());
            ExitCode::GeneralError
        }
    };
    code.into()
}

async fn run(cli: Cli) -> Result<ExitCode, CliError> {
    let registry = AdapterRegistry::builtin();

    if cli.list_adapters {
        list_adapters(&registry)?;
        return Ok(ExitCode::Success);
    }

    let coordinator = ShutdownCoordinator::new(CancellationToken::new());
    coordinator.register_handlers();

    let options = cli.pour.into_options()?;
    let summary = execution::run(&registry, &options, coordinator.cancel_token()).await?;
    if summary.interrupted || coordinator.is_shutdown_requested() {
        info!(rows = summary.rows, "Stopped by user");
    }
    Ok(ExitCode::Success)
}

fn list_adapters(registry: &AdapterRegistry) -> Result<(), CliError> {
    let mut out = std::io::stdout().lock();
    for (kind, reference) in registry.references() {
        writeln!(out, "{:<10} {reference}", kind.to_string())?;
    }
    Ok(())
}
