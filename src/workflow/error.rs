use thiserror::Error;

use crate::capture::CaptureError;
use crate::render::DecodeError;
use crate::storage::ResolutionError;

/// Why an acquired resource could not be turned into a displayed photo.
#[derive(Debug, Error)]
pub enum CommitError {
    #[error(transparent)]
    Open(#[from] ResolutionError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

pub type CommitResult<T> = std::result::Result<T, CommitError>;

/// Why a stored reference could not be shown again.
#[derive(Debug, Error)]
pub enum ReloadError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

pub type ReloadResult<T> = std::result::Result<T, ReloadError>;

/// Failure of a user-initiated capture or pick flow.
#[derive(Debug, Error)]
pub enum PhotoError {
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Commit(#[from] CommitError),
}
