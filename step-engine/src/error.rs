// Error types for step configuration and session control

use thiserror::Error;

pub type StepConfigResult<T> = Result<T, StepConfigError>;
pub type SessionResult<T> = Result<T, SessionError>;

/// Misuse of a [`StepConfigBuilder`](crate::StepConfigBuilder).
///
/// Both variants are programming errors on the caller's side. The builder
/// that produced one is consumed and cannot be recovered; start over with a
/// fresh builder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepConfigError {
    /// A supplied value is structurally invalid (empty list, non-positive count, empty tag).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An option was set twice, or combined with a mutually exclusive one.
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl StepConfigError {
    pub(crate) fn argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub(crate) fn state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Step request rejected: {0}")]
    Config(#[from] StepConfigError),

    #[error("No active step")]
    NoActiveStep,

    #[error("Step loop shut down")]
    LoopClosed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = StepConfigError::argument("Step count must be > 0");
        assert_eq!(err.to_string(), "Invalid argument: Step count must be > 0");

        let err = SessionError::from(StepConfigError::state("twice"));
        assert_eq!(err.to_string(), "Step request rejected: Invalid state: twice");
    }
}
