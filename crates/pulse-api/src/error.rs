use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

/// Everything a handler can fail with. Store and token failures collapse
/// into `Internal` at this boundary; the caller only ever sees the
/// opaque message, details stay in the server log.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(&'static str),

    #[error("Unauthorized")]
    Unauthorized,

    /// Stable message for both unknown email and wrong password, so the
    /// response never reveals whether an account exists.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Forbidden: admins only")]
    Forbidden,

    #[error("Chart not found")]
    ChartNotFound,

    #[error("User already exists")]
    UserExists,

    #[error("Conflicting write, please retry")]
    Conflict,

    #[error("Server error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(err) = &self {
            error!("internal error: {err:#}");
        }

        let status = match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::ChartNotFound => StatusCode::NOT_FOUND,
            ApiError::UserExists | ApiError::Conflict => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = self.to_string();
        (status, Json(serde_json::json!({ "message": message }))).into_response()
    }
}
