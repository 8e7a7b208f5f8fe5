use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;

use super::CoverError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Cover error: {0}")]
    CoverError(#[from] CoverError),

    #[error("Invalid request body: {0}")]
    InvalidBody(#[from] JsonRejection),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::CoverError(e) => e.status_code(),
            ApiError::InvalidBody(rejection) => rejection.status(),
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
