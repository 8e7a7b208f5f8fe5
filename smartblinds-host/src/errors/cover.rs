use axum::http::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum CoverError {
    #[error("Cover not found")]
    CoverNotFound,

    #[error("Invalid tilt position {0}, expected 0-100")]
    InvalidTiltPosition(i64),
}

impl CoverError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            CoverError::CoverNotFound => StatusCode::NOT_FOUND,
            CoverError::InvalidTiltPosition(_) => StatusCode::BAD_REQUEST,
        }
    }
}
