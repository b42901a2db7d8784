//! Logging and tracing initialization

use std::fs::File;
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::cli::Cli;

/// Level used when `RUST_LOG` is not set.
pub fn default_level(verbose: bool, quiet: u8) -> Level {
    match (verbose, quiet) {
        (true, _) => Level::DEBUG,
        (false, 0) => Level::INFO,
        (false, 1) => Level::WARN,
        (false, _) => Level::ERROR,
    }
}

/// Install the global subscriber: compact human output on stderr, plus JSON
/// lines in `--log-file` when given.
pub fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let level = default_level(cli.verbose, cli.quiet);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("ferrum={level},frm={level}")))?;

    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .compact();

    let file_layer = match &cli.log_file {
        Some(path) => {
            let file = File::create(path)?;
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_span_events(FmtSpan::CLOSE)
                    .json(),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .with(file_layer)
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_selection() {
        assert_eq!(default_level(false, 0), Level::INFO);
        assert_eq!(default_level(true, 0), Level::DEBUG);
        assert_eq!(default_level(true, 2), Level::DEBUG);
        assert_eq!(default_level(false, 1), Level::WARN);
        assert_eq!(default_level(false, 3), Level::ERROR);
    }
}
