use clap::Parser;
use nimsforestpm::cli::Cli;
use nimsforestpm::{commands, ui, Error};
use std::process::ExitCode;

fn main() -> ExitCode {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize tracing
    let default_directive = if cli.verbose {
        "nimsforestpm=debug,info"
    } else {
        "nimsforestpm=info,warn"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    // Execute command
    match commands::execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // A tool that ran and failed has already reported on its own stderr.
            if let Some(code) = err.downcast_ref::<Error>().and_then(Error::exit_code) {
                tracing::debug!(code, "tool exited unsuccessfully");
                return ExitCode::from(u8::try_from(code).unwrap_or(1));
            }

            ui::error(format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}
