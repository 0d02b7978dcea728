//! Error types for the RL core library

use std::fmt;

use thiserror::Error;

/// Stage of the per-tick pipeline that produced a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStage {
    /// Observation encoding
    Observation,
    /// Reward shaping
    Reward,
}

impl fmt::Display for OutputStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Observation => f.write_str("observation encoder"),
            Self::Reward => f.write_str("reward shaper"),
        }
    }
}

/// Core error type for RL operations
#[derive(Error, Debug)]
pub enum RLError {
    /// Environment-related errors
    #[error("Environment error: {0}")]
    Environment(String),

    /// Policy-related errors
    #[error("Policy error: {0}")]
    Policy(String),

    /// Invalid action
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected length
        expected: usize,
        /// Observed length
        actual: usize,
    },

    /// The encoding or shaping stage emitted a value the policy cannot consume
    #[error("Malformed output from {stage}: {detail}")]
    MalformedOutput {
        /// Stage that produced the value
        stage: OutputStage,
        /// What was wrong with it
        detail: String,
    },

    /// The simulation collaborator broke one of its own invariants
    #[error("Simulation error: {0}")]
    Simulation(String),

    /// Rejected training configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Checkpoint could not be used
    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    /// A shutdown was requested while the episode was running
    #[error("Interrupted by shutdown request")]
    Interrupted,

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl RLError {
    /// Whether this error is a contract violation from the encoding/shaping stage
    #[must_use]
    pub fn is_malformed_output(&self) -> bool {
        matches!(self, Self::MalformedOutput { .. })
    }
}

/// Result type alias for RL operations
pub type Result<T> = std::result::Result<T, RLError>;
