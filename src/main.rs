//! Entry point for the `frm` command.

use clap::Parser;
use clap::error::ErrorKind;
use std::io::{Read, Write};
use std::process::ExitCode;
use tracing::{error, info, warn};

use ferrum::{Cli, Config, HttpTransport, logging, pipeline};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => e.exit(),
            _ => {
                let _ = e.print();
                return ExitCode::FAILURE;
            }
        },
    };

    if let Err(e) = logging::init_logging(&cli) {
        eprintln!("Error: failed to initialize logging: {e:#}");
        return ExitCode::FAILURE;
    }

    info!("Ferrum - Fightcade Rom Manager v.{}", env!("CARGO_PKG_VERSION"));
    let code = run(&cli).await;

    if cli.pause {
        pause();
    }
    code
}

async fn run(cli: &Cli) -> ExitCode {
    let config = match Config::from_cli(cli) {
        Ok(config) => config,
        Err(e) => {
            error!("Error: cannot determine the destination folder: {e}");
            return ExitCode::FAILURE;
        }
    };

    let transport = match HttpTransport::new(config.timeout) {
        Ok(transport) => transport,
        Err(e) => {
            error!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match pipeline::run(&config, transport).await {
        Ok(report) => {
            if report.is_clean() {
                info!(
                    "Done: {} downloaded, {} already present.",
                    report.downloaded.len(),
                    report.skipped.len()
                );
            } else {
                warn!(
                    "Done with errors: {} downloaded, {} already present, {} failed ({}).",
                    report.downloaded.len(),
                    report.skipped.len(),
                    report.failed.len(),
                    report
                        .failed
                        .iter()
                        .map(|(id, _)| id.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Keep the console open so a double-clicked run can be read.
fn pause() {
    let mut stdout = std::io::stdout();
    let _ = write!(stdout, "Press any key to continue...");
    let _ = stdout.flush();
    let _ = std::io::stdin().read(&mut [0u8]);
}
