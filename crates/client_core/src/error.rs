use shared::error::{StoreError, ValidationError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl BoardError {
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            BoardError::Validation(err) => Some(err),
            BoardError::Store(_) => None,
        }
    }
}
