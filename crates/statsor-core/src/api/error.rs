use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Unauthorized - token may be expired")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rejected by the store: {0}")]
    Rejected(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Error body shape returned by PostgREST and GoTrue.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
    details: Option<String>,
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let head: String = body.chars().take(MAX_ERROR_BODY_LENGTH).collect();
            format!("{}... (truncated, {} total bytes)", head, body.len())
        }
    }

    /// Pull the human readable message out of a JSON error body, falling back
    /// to the raw (truncated) body.
    fn describe_body(body: &str) -> String {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => {
                let message = parsed
                    .message
                    .or(parsed.error_description)
                    .or(parsed.msg);
                match (message, parsed.details) {
                    (Some(m), Some(d)) => Self::truncate_body(&format!("{} ({})", m, d)),
                    (Some(m), None) => Self::truncate_body(&m),
                    (None, _) => Self::truncate_body(body),
                }
            }
            Err(_) => Self::truncate_body(body),
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let described = Self::describe_body(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(described),
            404 => ApiError::NotFound(described),
            400 | 409 | 422 => ApiError::Rejected(described),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(described),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, described)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_maps_constraint_violation() {
        let body = r#"{"code":"23502","message":"null value in column \"name\"","details":"Failing row contains (...)","hint":null}"#;
        match ApiError::from_status(StatusCode::BAD_REQUEST, body) {
            ApiError::Rejected(msg) => {
                assert!(msg.starts_with("null value in column"));
                assert!(msg.contains("Failing row"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_from_status_auth_errors() {
        assert!(matches!(
            ApiError::from_status(StatusCode::UNAUTHORIZED, ""),
            ApiError::Unauthorized
        ));
        let denied = ApiError::from_status(
            StatusCode::FORBIDDEN,
            r#"{"message":"new row violates row-level security policy"}"#,
        );
        assert!(matches!(denied, ApiError::AccessDenied(ref m) if m.contains("row-level security")));
    }

    #[test]
    fn test_from_status_gotrue_body() {
        let body = r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;
        match ApiError::from_status(StatusCode::BAD_REQUEST, body) {
            ApiError::Rejected(msg) => assert_eq!(msg, "Invalid login credentials"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_truncate_body() {
        let long = "x".repeat(MAX_ERROR_BODY_LENGTH + 10);
        let truncated = ApiError::truncate_body(&long);
        assert!(truncated.contains("truncated"));
        assert!(truncated.starts_with(&"x".repeat(MAX_ERROR_BODY_LENGTH)));
        assert_eq!(ApiError::truncate_body("short"), "short");
    }
}
