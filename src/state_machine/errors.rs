use thiserror::Error;

/// Error types for lifecycle transitions
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateMachineError {
    #[error("Invalid state transition from {from:?} to {to:?}")]
    InvalidTransition { from: Option<String>, to: String },
}

pub type StateMachineResult<T> = Result<T, StateMachineError>;
