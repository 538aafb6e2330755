//! Error types for the fallible edges of the core.
//!
//! Combat and targeting never fail: a missing component yields a "no effect"
//! value instead. Errors only exist where a caller asked for something that
//! cannot be done (starting a wave twice) or where outside data is broken
//! (a wave document that cannot be read).

use thiserror::Error;

/// Wave lifecycle errors returned by the [`WaveScheduler`](crate::waves::WaveScheduler).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WaveError {
    /// A wave is already running.
    #[error("wave {active} is already active")]
    AlreadyActive {
        /// Number of the running wave.
        active: u32,
    },

    /// No configuration exists for the requested wave number.
    #[error("no configuration for wave {0}")]
    UnknownWave(u32),

    /// A forced spawn is still running.
    #[error("a forced spawn is already running")]
    ForcedSpawnActive,
}

/// Errors raised while fetching or converting wave configuration.
///
/// These never reach the simulation loop: the loader retries and then falls
/// back to the built-in waves, logging the error.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The source could not be read.
    #[error("failed to read wave source {path}: {source}")]
    Io {
        /// Path that was requested.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The document is not a list of rows.
    #[error("malformed wave document: {0}")]
    Parse(#[from] serde_json::Error),

    /// The source is temporarily unavailable.
    #[error("wave source unavailable: {0}")]
    Unavailable(String),

    /// Rows were read but no wave survived validation.
    #[error("wave source {0} produced no usable waves")]
    NoUsableWaves(String),

    /// One wave could not be assembled from its rows.
    #[error("wave {wave} is invalid: {reason}")]
    InvalidWave {
        /// Wave number.
        wave: u32,
        /// What was wrong.
        reason: String,
    },
}

impl LoadError {
    /// Returns true if another attempt may succeed.
    ///
    /// A malformed document stays malformed, so only read failures and
    /// unavailable sources are retried.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::Unavailable(_))
    }
}

/// Errors raised while reading an [`EngineConfig`](crate::config::EngineConfig) document.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document is not valid JSON for the config schema.
    #[error("invalid engine config: {0}")]
    Parse(#[from] serde_json::Error),
}
