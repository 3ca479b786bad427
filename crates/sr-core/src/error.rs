use crate::types::Tier;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RouteError {
    #[error("No candidates available for tier {tier}")]
    NoCandidates { tier: Tier },
    #[error("All {attempts} candidates failed; first error: {first_error}")]
    Exhausted {
        attempts: usize,
        first_error: anyhow::Error,
    },
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RouteError {
    /// The first underlying invocation failure, when every candidate failed.
    pub fn first_error(&self) -> Option<&anyhow::Error> {
        match self {
            RouteError::Exhausted { first_error, .. } => Some(first_error),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, RouteError>;
