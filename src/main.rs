//! Hey Mic - tab-scoped session and companion panel lifecycle controller
//!
//! Command line entry point: scenario replay, URL classification and
//! configuration checks.

mod cli;
mod replay;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Parser;
use tracing::{info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use heymic_config::{Config, ConfigLoader, ConfigValidator};
use heymic_core::RestrictedSurfaceGuard;
use heymic_host_simulated::Scenario;

use crate::cli::{Cli, Commands};
use crate::replay::Replayer;

/// Initialize tracing with console and file output.
///
/// Console output goes to stderr so replay output on stdout stays parseable.
/// Log files rotate daily under the configured log directory.
fn init_tracing(config: &Config) -> anyhow::Result<()> {
    let log_dir = ConfigLoader::expand_path(&config.logging.log_dir);
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("creating log directory {}", log_dir.display()))?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("heymic")
        .filename_suffix("log")
        .max_log_files(30)
        .build(&log_dir)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Keeps the background writer alive for the whole run.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_ansi(true)
                .with_writer(std::io::stderr),
        )
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

/// The configuration file in effect: explicit flag, else the default location.
fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    explicit
        .map(Path::to_path_buf)
        .or_else(ConfigLoader::default_path)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::load_or_default(cli.config.as_deref())
        .context("loading configuration")?;
    init_tracing(&config)?;

    match cli.command {
        Commands::Replay {
            scenario,
            no_docked_panel,
        } => run_replay(&config, &scenario, !no_docked_panel).await,
        Commands::Classify { urls } => {
            classify(&config, &urls);
            Ok(())
        }
        Commands::Config { path } => check_config(&config, cli.config.as_deref(), path),
    }
}

async fn run_replay(config: &Config, path: &Path, docked_panel: bool) -> anyhow::Result<()> {
    let scenario = Scenario::load(path)
        .with_context(|| format!("reading scenario {}", path.display()))?;

    let mut replayer = Replayer::new(config, docked_panel);
    for line in replayer.run(scenario).await {
        println!("{}", serde_json::to_string(&line)?);
    }
    info!("replay finished");
    Ok(())
}

fn classify(config: &Config, urls: &[String]) {
    let guard =
        RestrictedSurfaceGuard::new().with_extra_schemes(&config.guard.extra_restricted_schemes);
    for url in urls {
        let verdict = if guard.is_restricted(Some(url)) {
            "restricted"
        } else {
            "allowed"
        };
        println!("{verdict}\t{url}");
    }
}

fn check_config(config: &Config, explicit: Option<&Path>, path_only: bool) -> anyhow::Result<()> {
    let path = resolve_config_path(explicit);
    if path_only {
        match &path {
            Some(path) => println!("{}", path.display()),
            None => println!("(no home directory)"),
        }
        return Ok(());
    }

    match &path {
        Some(path) if path.exists() => println!("# {}", path.display()),
        _ => println!("# built-in defaults"),
    }
    print!("{}", toml::to_string_pretty(config)?);

    let result = ConfigValidator::validate(config);
    for warning in &result.warnings {
        warn!(path = %warning.path, "{}", warning.message);
        eprintln!("warning: {}: {}", warning.path, warning.message);
    }
    for error in &result.errors {
        eprintln!("error: {}: {}", error.path, error.message);
    }
    if !result.is_valid() {
        bail!("configuration has {} error(s)", result.errors.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_resolve_config_path_prefers_explicit() {
        let explicit = PathBuf::from("/tmp/custom.toml");
        assert_eq!(resolve_config_path(Some(&explicit)), Some(explicit));
    }

    #[test]
    fn test_check_config_rejects_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[conversation]\nmax_entries = 0").unwrap();

        let config = ConfigLoader::load(file.path()).unwrap();
        assert!(check_config(&config, Some(file.path()), false).is_err());
        assert!(check_config(&config, Some(file.path()), true).is_ok());
    }

    #[test]
    fn test_check_config_accepts_defaults() {
        assert!(check_config(&Config::default(), None, false).is_ok());
    }
}
