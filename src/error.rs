use thiserror::Error;

/// Result type for deepq operations
pub type Result<T> = std::result::Result<T, DqnError>;

/// Error type shared by the buffer, the learner, the training loop and persistence.
#[derive(Error, Debug)]
pub enum DqnError {
    /// Sampling asked for more transitions than the buffer holds
    #[error("Insufficient data: requested {requested} transitions, buffer holds {available}")]
    InsufficientData { requested: usize, available: usize },

    /// State, action or parameter dimensionality disagrees with the approximator
    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    /// Checkpoint could not be written, read, decoded or applied
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Invalid hyperparameter value
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// Action index outside the environment's action space
    #[error("Invalid action {action}: must be less than {num_actions}")]
    InvalidAction { action: usize, num_actions: usize },

    /// Failure reported by the environment collaborator
    #[error("Environment error: {0}")]
    Environment(String),

    /// Experiment file could not be read or parsed
    #[error("Config error: {0}")]
    Config(String),
}

impl From<std::io::Error> for DqnError {
    fn from(err: std::io::Error) -> Self {
        DqnError::Persistence(err.to_string())
    }
}

impl From<bincode::Error> for DqnError {
    fn from(err: bincode::Error) -> Self {
        DqnError::Persistence(err.to_string())
    }
}

impl From<csv::Error> for DqnError {
    fn from(err: csv::Error) -> Self {
        DqnError::Persistence(err.to_string())
    }
}

// Helper functions for common error patterns
impl DqnError {
    pub fn shape_mismatch<S: Into<String>>(expected: S, actual: S) -> Self {
        DqnError::ShapeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn invalid_parameter<S: Into<String>>(name: S, reason: S) -> Self {
        DqnError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
