use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Handler result type
pub type ApiResult<T> = Result<T, AppError>;

/// Errors surfaced to HTTP clients
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{error}")]
    BadRequest { error: String, message: String },

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    QuotaExceeded(String),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn bad_request(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BadRequest {
            error: error.into(),
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::QuotaExceeded(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => "BAD_REQUEST",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::QuotaExceeded(_) => "QUOTA_EXCEEDED",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn hint(&self) -> &str {
        match self {
            Self::BadRequest { message, .. } => message.as_str(),
            Self::Unauthorized(_) => "Please provide a valid API key to access this endpoint",
            Self::QuotaExceeded(_) => "The request limit for this API key has been reached",
            Self::Internal(_) => "Unexpected server error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = json!({
            "success": false,
            "error": self.to_string(),
            "code": self.code(),
            "message": self.hint(),
        });

        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static(r#"Bearer realm="API Key Required""#),
            );
        }
        response
    }
}
