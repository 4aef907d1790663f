use hyper::StatusCode;
use thiserror::Error;
use vtfs_store::StoreError;

/// Why a request failed, as reported in the `{"error": ...}` envelope.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("missing parameter `{0}`")]
    MissingParameter(&'static str),
    #[error("invalid parameter `{0}`")]
    InvalidParameter(&'static str),
    #[error("missing or invalid token")]
    AccessDenied,
    #[error("unknown operation")]
    UnknownOperation,
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Store(err) => err.errno_name(),
            Self::MissingParameter(_) | Self::InvalidParameter(_) => "EINVAL",
            Self::AccessDenied => "EACCES",
            Self::UnknownOperation => "ENOSYS",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::UnknownOperation => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}
