//! Error types for the levelforge core library.

use thiserror::Error;

/// Boxed error returned by caller-supplied award hooks.
pub type HookError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for all progression operations.
#[derive(Error, Debug)]
pub enum ProgressionError {
    /// An XP award was negative.
    #[error("Invalid XP amount: {amount} (awards must be >= 0)")]
    InvalidXpAmount {
        /// The rejected amount.
        amount: i64,
    },

    /// A caller-supplied multiplier was negative, NaN or infinite.
    #[error("Invalid multiplier `{name}`: {value} (must be finite and >= 0)")]
    InvalidMultiplier {
        /// Which multiplier was rejected.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A caller-supplied award hook failed; nothing was committed.
    #[error("Award hook failed for agent {agent}: {source}")]
    HookFailed {
        /// Agent whose award was aborted.
        agent: crate::AgentId,
        /// The hook's error.
        #[source]
        source: HookError,
    },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, ProgressionError>;
