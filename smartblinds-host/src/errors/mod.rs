pub mod api;
pub mod cover;
pub mod device;

pub use api::ApiError;
pub use cover::CoverError;
pub use device::DeviceError;

use axum::Json;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use uuid::Uuid;

#[derive(Serialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: u16,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_id: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Internal details stay in the log, keyed by an id the client can quote.
        let (message, error_id) = match self {
            ApiError::InternalError(e) => {
                let error_id = Uuid::new_v4().to_string();
                tracing::error!(error_id = %error_id, "Request failed: {:#}", e);
                ("Internal server error".to_string(), Some(error_id))
            }
            ApiError::InvalidBody(rejection) => (rejection.body_text(), None),
            ApiError::CoverError(e) => (e.to_string(), None),
        };

        let envelope = ErrorEnvelope {
            error: ErrorBody {
                code: status.as_u16(),
                message,
                error_id,
            },
        };

        (status, Json(envelope)).into_response()
    }
}
