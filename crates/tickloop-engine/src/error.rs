//! Error types for the tickloop engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during startup and the console run.

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: tickloop_core::config::ConfigError,
    },

    /// Writing to the console failed.
    #[error("console error: {source}")]
    Console {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The logging subscriber could not be installed.
    #[error("logging error: {message}")]
    Logging {
        /// Description of the subscriber failure.
        message: String,
    },
}
