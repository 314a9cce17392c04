//! Errors surfaced by the HTTP client.

use std::path::PathBuf;

use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid API endpoint `{0}`")]
    InvalidEndpoint(String),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unauthorized, please log in")]
    Unauthorized,
    #[error("{detail} ({status})")]
    Status { status: StatusCode, detail: String },
    #[error("only PDF files can be uploaded: {}", .0.display())]
    InvalidUpload(PathBuf),
    #[error(transparent)]
    Store(#[from] crate::store::StoreError),
    #[error("could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ApiError {
    /// Build a status error, preferring the server's `{"detail": ...}` message.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        if status == StatusCode::UNAUTHORIZED {
            return ApiError::Unauthorized;
        }
        let detail = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| match v.get("detail") {
                Some(serde_json::Value::String(s)) => Some(s.clone()),
                Some(other) => Some(other.to_string()),
                None => None,
            })
            .unwrap_or_else(|| {
                let body = body.trim();
                if body.is_empty() {
                    status.canonical_reason().unwrap_or("request failed").to_string()
                } else {
                    body.to_string()
                }
            });
        ApiError::Status { status, detail }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_field_is_preferred() {
        let err = ApiError::from_status(StatusCode::BAD_REQUEST, r#"{"detail":"Only PDF files are allowed."}"#);
        assert_eq!(err.to_string(), "Only PDF files are allowed. (400 Bad Request)");
    }

    #[test]
    fn falls_back_to_body_then_reason() {
        let err = ApiError::from_status(StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(err.to_string(), "upstream down (502 Bad Gateway)");
        let err = ApiError::from_status(StatusCode::NOT_FOUND, "");
        assert_eq!(err.to_string(), "Not Found (404 Not Found)");
    }

    #[test]
    fn unauthorized_is_its_own_variant() {
        assert!(ApiError::from_status(StatusCode::UNAUTHORIZED, "{}").is_unauthorized());
    }
}
