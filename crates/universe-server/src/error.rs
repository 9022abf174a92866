//! Server error types
//!
//! Every failure leaves the server as `{success: false, message, error?}`.
//! Bot pipeline failures also carry `code` and `details`. The internal
//! `error` detail is only rendered when dev mode is on, see
//! [`expose_error_detail`].

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use universe_llm::BotGenerationError;
use universe_repository::RepositoryError;

/// Server error type
#[derive(Debug, Error)]
pub enum ServerError {
    /// Malformed or out-of-range request input
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Missing or rejected bearer token
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Persistence layer failure
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Bot pipeline failure
    #[error(transparent)]
    Bot(#[from] BotGenerationError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Rendered error envelope
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Internal detail withheld from the default rendering
#[derive(Debug, Clone)]
struct ErrorDetail(String);

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::Validation(_) => StatusCode::BAD_REQUEST,
            ServerError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Repository(err) => match err {
                RepositoryError::NotFound { .. } => StatusCode::NOT_FOUND,
                RepositoryError::Forbidden { .. } => StatusCode::FORBIDDEN,
                RepositoryError::Validation(_) => StatusCode::BAD_REQUEST,
                RepositoryError::Conflict { .. } => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ServerError::Bot(err) if err.code.is_client_error() => StatusCode::BAD_REQUEST,
            ServerError::Bot(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message and the internal detail, if any
    fn message_and_detail(&self) -> (String, Option<String>) {
        match self {
            ServerError::Validation(msg)
            | ServerError::Unauthorized(msg)
            | ServerError::NotFound(msg) => (msg.clone(), None),
            ServerError::Repository(err) => match err {
                RepositoryError::NotFound { .. }
                | RepositoryError::Forbidden { .. }
                | RepositoryError::Conflict { .. } => (err.to_string(), None),
                RepositoryError::Validation(errors) => {
                    ("Invalid flow".to_string(), Some(errors.join("; ")))
                }
                other => ("Storage operation failed".to_string(), Some(other.to_string())),
            },
            ServerError::Bot(err) => (err.message.clone(), Some(err.to_string())),
            ServerError::Internal(msg) => ("Internal server error".to_string(), Some(msg.clone())),
        }
    }

    fn body(&self) -> (ErrorBody, Option<String>) {
        let (message, detail) = self.message_and_detail();
        let (code, details) = match self {
            ServerError::Bot(err) => (Some(err.code.as_str().to_string()), Some(err.details.clone())),
            // Validation failures list every problem
            ServerError::Repository(RepositoryError::Validation(errors)) => {
                (None, Some(Value::from(errors.clone())))
            }
            _ => (None, None),
        };
        let body = ErrorBody {
            success: false,
            message,
            error: None,
            code,
            details,
        };
        (body, detail)
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
        }

        let (body, detail) = self.body();
        let mut response = (status, Json(body.clone())).into_response();
        response.extensions_mut().insert(body);
        if let Some(detail) = detail {
            response.extensions_mut().insert(ErrorDetail(detail));
        }
        response
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        ServerError::Internal(err.to_string())
    }
}

/// Re-render error responses with their internal detail when `dev_mode` is set
pub async fn expose_error_detail(
    State(dev_mode): State<bool>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    if !dev_mode {
        return response;
    }

    let (Some(body), Some(ErrorDetail(detail))) = (
        response.extensions().get::<ErrorBody>(),
        response.extensions().get::<ErrorDetail>(),
    ) else {
        return response;
    };

    let mut body = body.clone();
    body.error = Some(detail.clone());
    (response.status(), Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use universe_llm::ErrorCode;

    #[test]
    fn test_validation_display() {
        let err = ServerError::Validation("prompt is required".to_string());
        assert_eq!(err.to_string(), "Invalid request: prompt is required");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_repository_status_mapping() {
        let cases = [
            (RepositoryError::project_not_found("p"), StatusCode::NOT_FOUND),
            (
                RepositoryError::Forbidden {
                    project_id: "p".to_string(),
                },
                StatusCode::FORBIDDEN,
            ),
            (
                RepositoryError::Validation(vec!["x".to_string()]),
                StatusCode::BAD_REQUEST,
            ),
            (
                RepositoryError::Other("disk full".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ServerError::from(err).status(), status);
        }
    }

    #[test]
    fn test_bot_error_status_depends_on_code() {
        let short = BotGenerationError::new(ErrorCode::PromptTooShort, "too short");
        assert_eq!(ServerError::from(short).status(), StatusCode::BAD_REQUEST);

        let exhausted = BotGenerationError::new(ErrorCode::AllModelsFailed, "all failed");
        assert_eq!(
            ServerError::from(exhausted).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_detail_is_withheld_by_default() {
        let err = ServerError::Internal("connection reset".to_string());
        let (body, detail) = err.body();

        assert_eq!(body.message, "Internal server error");
        assert!(body.error.is_none());
        assert_eq!(detail.as_deref(), Some("connection reset"));
    }

    #[test]
    fn test_bot_body_carries_code_and_details() {
        let err = ServerError::Bot(
            BotGenerationError::new(ErrorCode::MissingApiKey, "No provider configured")
                .with_details(serde_json::json!({"providers": []})),
        );
        let (body, _) = err.body();
        let value = serde_json::to_value(&body).unwrap();

        assert_eq!(value["success"], false);
        assert_eq!(value["code"], "MISSING_API_KEY");
        assert_eq!(value["details"]["providers"], serde_json::json!([]));
    }

    #[test]
    fn test_anyhow_error_conversion() {
        let server_err: ServerError = anyhow::anyhow!("something went wrong").into();
        assert!(server_err.to_string().contains("something went wrong"));
        assert_eq!(server_err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ServerError>();
    }
}
