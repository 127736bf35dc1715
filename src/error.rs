use thiserror::Error;

/// Refusals returned by the appliance controller.
///
/// Neither variant is fatal: the appliance is left exactly as it was and
/// the caller may retry with another command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MicrowaveError {
    /// The action is not allowed in the current door/cook state.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Malformed or out-of-range user input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl MicrowaveError {
    pub fn operation(reason: impl Into<String>) -> Self {
        Self::InvalidOperation(reason.into())
    }

    pub fn input(reason: impl Into<String>) -> Self {
        Self::InvalidInput(reason.into())
    }
}
