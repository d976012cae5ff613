//! Console binary for tickloop.
//!
//! Loads configuration, builds the simulated clock, and runs the bounded
//! loop, printing one interval report per iteration.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `tickloop-config.yaml` (or the path given as
//!    the first argument), falling back to defaults when absent
//! 2. Initialize structured logging (tracing)
//! 3. Build the clock and announce the configured multiplier
//! 4. Run the loop with the console reporter
//! 5. Log the result and print the exit line

mod error;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tickloop_core::config::SimulationConfig;
use tickloop_core::report::{self, ConsoleReporter};
use tickloop_core::runner::{self, LoopDriver};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Config file looked up in the working directory when no path is given.
const DEFAULT_CONFIG_PATH: &str = "tickloop-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration cannot be loaded or the console
/// cannot be written.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let (config, source) = load_config(
        std::env::args_os().nth(1).map(PathBuf::from),
        Path::new(DEFAULT_CONFIG_PATH),
    )?;

    // 2. Initialize structured logging.
    init_logging(&config.logging.level)?;

    match source {
        Some(path) => info!(path = %path.display(), "Configuration loaded"),
        None => info!("Config file not found, using defaults"),
    }
    debug!(
        multiplier = config.clock.multiplier,
        base_step_ms = config.clock.base_step_ms,
        seed = ?config.clock.seed,
        budget_ms = config.run.budget_ms,
        "Effective configuration"
    );

    // 3. Build the clock.
    let clock = config.clock.build();
    let mut stdout = io::stdout().lock();
    writeln!(stdout)?;
    writeln!(stdout, "{}", report::startup_line(clock.multiplier()))?;
    writeln!(stdout, "{}", report::CONTENT_LOADED_LINE)?;
    writeln!(stdout)?;

    // 4. Run the loop.
    let mut driver = LoopDriver::new(clock);
    let mut reporter = ConsoleReporter::new(stdout);
    let summary = driver.run(config.run.budget_ms, &mut reporter);
    let mut stdout = reporter.finish().map_err(EngineError::from)?;

    // 5. Log results.
    runner::log_run_end(&summary);

    writeln!(stdout)?;
    writeln!(stdout, "{}", report::EXIT_LINE)?;

    info!(
        end_reason = ?summary.end_reason,
        iterations = summary.iterations,
        "tickloop-engine shutdown complete"
    );

    Ok(())
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `fallback_level` from the config is
/// used.
fn init_logging(fallback_level: &str) -> Result<(), EngineError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback_level)),
        )
        .with_target(true)
        .with_writer(io::stderr)
        .try_init()
        .map_err(|e| EngineError::Logging {
            message: format!("{e}"),
        })
}

/// Load the configuration file.
///
/// An explicit path must exist. Without one, `default_path` is used when
/// present and defaults (plus environment overrides) otherwise. Returns the
/// path actually read, if any.
fn load_config(
    explicit: Option<PathBuf>,
    default_path: &Path,
) -> Result<(SimulationConfig, Option<PathBuf>), EngineError> {
    if let Some(path) = explicit {
        let config = SimulationConfig::from_file(&path)?;
        return Ok((config, Some(path)));
    }

    if default_path.exists() {
        let config = SimulationConfig::from_file(default_path)?;
        return Ok((config, Some(default_path.to_path_buf())));
    }

    let mut config = SimulationConfig::default();
    config.apply_overrides(|key| std::env::var(key).ok())?;
    config.validate()?;
    Ok((config, None))
}
