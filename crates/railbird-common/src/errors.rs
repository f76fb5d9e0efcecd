//! Error types for the railbird settlement engine

use crate::types::stake::StakeStatus;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Validation failed for {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("Illegal transition: cannot {action} while stake is {status}")]
    IllegalTransition {
        action: &'static str,
        status: StakeStatus,
    },

    #[error("Settlement initiator cannot confirm their own settlement")]
    SelfConfirmation,

    #[error("Session results are frozen once settlement confirmation is pending")]
    StaleResults,

    #[error("Stake {id} was modified concurrently")]
    ConcurrentModification { id: String },

    #[error("Stake {id} not found")]
    NotFound { id: String },

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Error::Validation {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
