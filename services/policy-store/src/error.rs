//! Adapter-level errors.
//!
//! Codec and filter failures are raised before any store I/O; store failures
//! pass through unchanged as [`PolicyError::Store`].
use crate::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("policy has {len} fields, at most {max} can be stored")]
    ArityExceeded { len: usize, max: usize },
    #[error("policy field {index} is empty; stored rules end at the first empty field")]
    EmptyField { index: usize },
    #[error("malformed policy row {id:?}: {reason}")]
    MalformedRow { id: Option<i32>, reason: String },
    #[error("malformed policy line: {0}")]
    MalformedLine(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type PolicyResult<T> = Result<T, PolicyError>;
