//! webcomp - compile single-file components into custom elements.

use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod cli;
mod config;
mod orchestrator;
mod output;

use cli::Args;
use config::Config;
use orchestrator::Orchestrator;

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Set up miette for nice error output
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))
    .ok();

    match run(args) {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("{:?}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<ExitCode> {
    let cwd = std::env::current_dir().into_diagnostic()?;
    let config = Config::load(&cwd, &args)?;
    let orchestrator = Orchestrator::new(config);

    if orchestrator.config().watch {
        orchestrator.run_watch_mode()?;
        return Ok(ExitCode::SUCCESS);
    }

    let result = orchestrator.run_once()?;
    if result.failed > 0 {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
