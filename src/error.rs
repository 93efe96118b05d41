use thiserror::Error;

use crate::validation::DiscountRejection;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("request to pricing authority failed")]
    Transport(#[from] reqwest::Error),

    #[error("pricing authority returned status {0}")]
    UnexpectedStatus(u16),

    #[error("malformed payload")]
    Decode(#[from] serde_json::Error),

    #[error("cart storage error")]
    Storage(#[from] std::io::Error),

    #[error("{}", .0.message)]
    DiscountRejected(DiscountRejection),

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl EngineError {
    /// Transport and server-side failures, as opposed to domain rejections.
    /// Callers may retry these; previous known-good pricing stays valid.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            EngineError::Transport(_) | EngineError::UnexpectedStatus(_)
        )
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
