use actix_web::{error, http::StatusCode, HttpResponse};
use thiserror::Error;
use crate::auth::AuthError;
use crate::core::MatchError;
use crate::models::ErrorResponse;

/// Errors returned to HTTP callers as `{ "success": false, "error": ... }`
///
/// The public contract is 401 for authentication failures and 500 for
/// everything else. `BadRequest` departs from it: malformed JSON and
/// out-of-range fields answer 400 with the same body shape.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Authentication(#[from] AuthError),

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Upstream(#[from] MatchError),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Message safe to show callers; upstream detail stays in the logs
    fn public_message(&self) -> String {
        match self {
            ApiError::Authentication(_) | ApiError::BadRequest(_) => self.to_string(),
            ApiError::Upstream(e) if e.is_timeout() => {
                "Match data is temporarily unavailable, please retry".to_string()
            }
            ApiError::Upstream(_) => "Failed to load match data".to_string(),
            ApiError::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl error::ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        HttpResponse::build(self.status_code()).json(ErrorResponse::new(self.public_message()))
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    ApiError::BadRequest(format!("Invalid JSON: {}", err)).into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    ApiError::BadRequest(format!("Invalid query: {}", err)).into()
}
