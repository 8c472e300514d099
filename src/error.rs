//! Errors raised by graph construction and pruning
//!
//! Adapters (table files, configuration files, the binary) wrap these in
//! `anyhow` with file context; the core returns them directly.

use thiserror::Error;

/// Errors that can occur while building or pruning a strong-correlation graph
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SelectionError {
    #[error("Malformed {table} table: {reason}")]
    MalformedTable { table: String, reason: String },

    #[error("No degrees of freedom recorded for categorical factor '{0}'")]
    MissingDegreesOfFreedom(String),

    #[error(
        "Degenerate degrees of freedom for pair ({factor_a}, {factor_b}): \
         df({factor_a})={df_a}, df({factor_b})={df_b} (threshold divides by zero)"
    )]
    DegenerateDegreesOfFreedom {
        factor_a: String,
        factor_b: String,
        df_a: u32,
        df_b: u32,
    },

    #[error("Ambiguous tie requires manual resolution: {candidates:?} (degree {degree})")]
    AmbiguousTie {
        candidates: Vec<String>,
        degree: usize,
    },

    #[error("Tie choice '{choice}' is not one of {candidates:?}")]
    InvalidTieChoice {
        choice: String,
        candidates: Vec<String>,
    },

    #[error("Tie resolver failed: {0}")]
    ResolverFailed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("No priority weight left while factors are still correlated: {0:?}")]
    WeightsExhausted(Vec<String>),
}

/// Result type for graph construction and pruning
pub type Result<T> = std::result::Result<T, SelectionError>;
