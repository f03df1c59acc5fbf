//! Service-level error type.

use thiserror::Error;
use uuid::Uuid;

use crate::domain::aggregates::OrderError;
use crate::repository::RepoError;

#[derive(Error, Debug)]
pub enum WashWishError {
    #[error("invalid order input: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("malformed request body: {0}")]
    MalformedBody(String),

    #[error("order {0} not found")]
    NotFound(Uuid),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error("order {0} was modified concurrently, reload and retry")]
    Conflict(Uuid),

    #[error("storage failure: {0}")]
    Storage(RepoError),
}

impl From<RepoError> for WashWishError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Conflict { id, .. } => Self::Conflict(id),
            other => Self::Storage(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, WashWishError>;
