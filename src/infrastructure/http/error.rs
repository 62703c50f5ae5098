//! HTTP Error Handling
//!
//! 业务错误统一返回 HTTP 200 + errno 信封；认证失败返回真实 401。

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::application::{ApplicationError, AuthError};

/// 统一错误响应格式
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub errno: i32,
    pub error: String,
    pub data: Option<()>,
}

impl ErrorResponse {
    pub fn new(errno: i32, error: impl Into<String>) -> Self {
        Self {
            errno,
            error: error.into(),
            data: None,
        }
    }
}

/// 错误码定义
pub mod errno {
    pub const BAD_REQUEST: i32 = 400;
    pub const UNAUTHORIZED: i32 = 401;
    pub const NOT_FOUND: i32 = 404;
    pub const CONFLICT: i32 = 409;
    pub const INTERNAL_ERROR: i32 = 500;
    pub const SERVICE_UNAVAILABLE: i32 = 503;
}

/// API 错误
#[derive(Debug)]
pub enum ApiError {
    Unauthorized(String),
    NotFound(String),
    BadRequest(String),
    Internal(String),
    Conflict(String),
    ServiceUnavailable(String),
}

impl ApiError {
    /// 对应的 errno
    pub fn errno(&self) -> i32 {
        match self {
            ApiError::Unauthorized(_) => errno::UNAUTHORIZED,
            ApiError::NotFound(_) => errno::NOT_FOUND,
            ApiError::BadRequest(_) => errno::BAD_REQUEST,
            ApiError::Internal(_) => errno::INTERNAL_ERROR,
            ApiError::Conflict(_) => errno::CONFLICT,
            ApiError::ServiceUnavailable(_) => errno::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.errno();
        let (status, message) = match self {
            ApiError::Unauthorized(msg) => {
                tracing::warn!(errno = code, error = %msg, "Unauthenticated request");
                (StatusCode::UNAUTHORIZED, msg)
            }
            ApiError::NotFound(msg) => {
                tracing::warn!(errno = code, error = %msg, "Resource not found");
                (StatusCode::OK, msg)
            }
            ApiError::BadRequest(msg) => {
                tracing::warn!(errno = code, error = %msg, "Bad request");
                (StatusCode::OK, msg)
            }
            ApiError::Conflict(msg) => {
                tracing::warn!(errno = code, error = %msg, "Resource conflict");
                (StatusCode::OK, msg)
            }
            ApiError::Internal(msg) => {
                tracing::error!(errno = code, error = %msg, "Internal server error");
                (StatusCode::OK, msg)
            }
            ApiError::ServiceUnavailable(msg) => {
                tracing::error!(errno = code, error = %msg, "Service unavailable");
                (StatusCode::OK, msg)
            }
        };

        (status, Json(ErrorResponse::new(code, message))).into_response()
    }
}

impl From<ApplicationError> for ApiError {
    fn from(e: ApplicationError) -> Self {
        let message = e.to_string();
        match e {
            ApplicationError::Unauthenticated(_) => ApiError::Unauthorized(message),
            ApplicationError::NotFound { .. } => ApiError::NotFound(message),
            ApplicationError::InvalidArgument(_) | ApplicationError::InvalidState(_) => {
                ApiError::BadRequest(message)
            }
            ApplicationError::Conflict(_) => ApiError::Conflict(message),
            ApplicationError::CapabilityFailure(_) => ApiError::ServiceUnavailable(message),
            ApplicationError::RepositoryError(_) | ApplicationError::InternalError(_) => {
                ApiError::Internal(message)
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        ApiError::Unauthorized(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_business_error_uses_envelope() {
        let err: ApiError = ApplicationError::not_found("Project", "p1").into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["errno"], 404);
        assert!(body["error"].as_str().unwrap().contains("p1"));
        assert!(body["data"].is_null());
    }

    #[tokio::test]
    async fn test_unauthenticated_is_real_401() {
        let err: ApiError = AuthError::MissingToken.into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["errno"], 401);
    }

    #[test]
    fn test_application_error_mapping() {
        let cases = [
            (ApplicationError::invalid_argument("x"), errno::BAD_REQUEST),
            (ApplicationError::invalid_state("x"), errno::BAD_REQUEST),
            (ApplicationError::Conflict("x".into()), errno::CONFLICT),
            (ApplicationError::capability("x"), errno::SERVICE_UNAVAILABLE),
            (ApplicationError::RepositoryError("x".into()), errno::INTERNAL_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).errno(), expected);
        }
    }
}
