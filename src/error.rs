//! Application error taxonomy and its HTTP mapping.
//!
//! Every failure the service can surface maps to exactly one variant of
//! [`AppError`] and one stable HTTP status. Messages are short and never echo
//! internal validation reasons for unresolvable codes.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

/// Serializable error payload returned to clients.
#[derive(Debug, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

/// Errors produced by the service layer and HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Malformed URL, alias or request body. Caller error, not retried.
    #[error("{message}")]
    InvalidInput { message: String, details: Value },

    /// Requested custom alias is already bound to another record.
    #[error("Custom alias '{alias}' is already taken")]
    AliasTaken { alias: String },

    /// Both the primary and the fallback short code collided.
    #[error("Failed to generate a unique short code")]
    GenerationExhausted,

    /// Unknown short code, or a code that is not syntactically valid.
    #[error("URL not found")]
    NotFound,

    /// Known short code whose expiry has passed.
    #[error("URL expired")]
    Expired,

    /// Client exceeded its quota for the current window.
    #[error("Rate limit exceeded")]
    RateLimited { retry_after: u64 },

    /// Durable store unreachable or timed out.
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),
}

impl AppError {
    pub fn invalid_input(message: impl Into<String>, details: Value) -> Self {
        Self::InvalidInput {
            message: message.into(),
            details,
        }
    }

    pub fn backend(reason: impl Into<String>) -> Self {
        Self::BackendUnavailable(reason.into())
    }

    /// Returns the HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            Self::AliasTaken { .. } => StatusCode::CONFLICT,
            Self::GenerationExhausted => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Expired => StatusCode::GONE,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::BackendUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Builds the client-facing payload.
    ///
    /// Backend failure reasons are logged by the caller and replaced with a
    /// generic message here.
    pub fn to_error_info(&self) -> ErrorInfo {
        match self {
            Self::InvalidInput { message, details } => ErrorInfo {
                code: "invalid_input",
                message: message.clone(),
                details: details.clone(),
            },
            Self::AliasTaken { alias } => ErrorInfo {
                code: "alias_taken",
                message: "This custom alias is already taken".to_string(),
                details: json!({ "alias": alias }),
            },
            Self::GenerationExhausted => ErrorInfo {
                code: "generation_exhausted",
                message: "Failed to generate unique short code".to_string(),
                details: json!({}),
            },
            Self::NotFound => ErrorInfo {
                code: "not_found",
                message: "URL not found".to_string(),
                details: json!({}),
            },
            Self::Expired => ErrorInfo {
                code: "expired",
                message: "URL expired".to_string(),
                details: json!({}),
            },
            Self::RateLimited { retry_after } => ErrorInfo {
                code: "rate_limited",
                message: "Rate limit exceeded. Please try again later.".to_string(),
                details: json!({ "retry_after": retry_after }),
            },
            Self::BackendUnavailable(_) => ErrorInfo {
                code: "backend_unavailable",
                message: "Service temporarily unavailable".to_string(),
                details: json!({}),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            Self::BackendUnavailable(reason) => {
                tracing::error!(reason = %reason, "Durable store failure");
            }
            Self::GenerationExhausted => {
                tracing::error!("Short code generation exhausted after fallback");
            }
            _ => {}
        }

        let status = self.status();
        let body = ErrorBody {
            error: self.to_error_info(),
        };

        let mut response = (status, Json(body)).into_response();

        if let Self::RateLimited { retry_after } = self {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
        }

        response
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        Self::BackendUnavailable(e.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = e.field_errors().keys().map(|k| k.to_string()).collect();
        fields.sort();
        Self::invalid_input("Request validation failed", json!({ "fields": fields }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::invalid_input("bad", json!({})).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::AliasTaken {
                alias: "foo".to_string()
            }
            .status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::GenerationExhausted.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(AppError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Expired.status(), StatusCode::GONE);
        assert_eq!(
            AppError::RateLimited { retry_after: 5 }.status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AppError::backend("down").status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_backend_reason_not_leaked() {
        let info = AppError::backend("connection refused at 10.0.0.5:5432").to_error_info();
        assert_eq!(info.code, "backend_unavailable");
        assert!(!info.message.contains("10.0.0.5"));
    }

    #[test]
    fn test_rate_limited_sets_retry_after() {
        let response = AppError::RateLimited { retry_after: 42 }.into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "42");
    }

    #[test]
    fn test_not_found_and_expired_are_distinct() {
        assert_ne!(
            AppError::NotFound.to_error_info().code,
            AppError::Expired.to_error_info().code
        );
    }
}
