mod commands;
mod session;

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use strata::Platform;
use strata::domain::config::{AppConfig, LogRotation, LoggingSettings};
use strata::kernel::config::load_config_or_default;
use strata_logger::{LevelFilter, Logger, Rotation};
use tokio::io::BufReader;

/// Line-oriented shell over the Strata user service.
///
/// Reads one command per line from stdin and answers with one JSON line on stdout.
/// Type `help` for the command list.
#[derive(Debug, Parser)]
#[command(name = "strata", version)]
struct Args {
    /// Configuration file (`.toml`, `.yaml` or `.json`). Defaults plus `STRATA__*` overrides
    /// when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Minimum log level, overriding `logging.level`.
    #[arg(long)]
    log_level: Option<LevelFilter>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    json_logs: bool,
}

#[strata_runtime::main(default)]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config: AppConfig = load_config_or_default(args.config.as_deref())
        .context("Critical: Configuration is malformed")?;
    let _log = init_logger(&args, &config.logging)?;

    let platform = Platform::builder().config(config).build()?;

    let input = BufReader::new(tokio::io::stdin());
    let result = session::run(&platform, input, tokio::io::stdout()).await;

    platform.shutdown();
    result
}

fn init_logger(args: &Args, logging: &LoggingSettings) -> anyhow::Result<Logger> {
    let level = match args.log_level {
        Some(level) => level,
        None => logging
            .level
            .parse()
            .with_context(|| format!("Invalid log level '{}'", logging.level))?,
    };

    let mut builder = Logger::builder()
        .name(env!("CARGO_BIN_NAME"))
        .level(level)
        .json(args.json_logs || logging.json);
    if let Some(filter) = &logging.filter {
        builder = builder.env_filter(filter.as_str());
    }

    let logger = match &logging.directory {
        Some(directory) => {
            let mut files = builder.path(directory.clone()).rotation(rotation(logging.rotation));
            if let Some(max) = logging.max_files {
                files = files.max_files(max);
            }
            files.init()?
        }
        None => builder.init()?,
    };
    Ok(logger)
}

const fn rotation(rotation: LogRotation) -> Rotation {
    match rotation {
        LogRotation::Minutely => Rotation::MINUTELY,
        LogRotation::Hourly => Rotation::HOURLY,
        LogRotation::Daily => Rotation::DAILY,
        LogRotation::Never => Rotation::NEVER,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_rotation_maps_onto_the_appender() {
        assert_eq!(rotation(LogRotation::Hourly), Rotation::HOURLY);
        assert_eq!(rotation(LogRotation::Never), Rotation::NEVER);
        assert_eq!(rotation(LogRotation::default()), Rotation::DAILY);
    }
}
