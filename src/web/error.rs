use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Client-visible error body.
///
/// `fields` is left out of the JSON entirely when there are no field errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,
}

/// A validation failure tied to one input field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub error: String,
}

/// An error whose message and status are meant for the client.
///
/// Anything that is not a `RequestError` is reported as a bare 500.
#[derive(Debug, Error)]
#[error("{err}")]
pub struct RequestError {
    #[source]
    err: BoxError,
    status: StatusCode,
    fields: Vec<FieldError>,
}

impl RequestError {
    pub fn new(err: impl Into<BoxError>, status: StatusCode) -> Self {
        Self {
            err: err.into(),
            status,
            fields: Vec::new(),
        }
    }

    #[allow(dead_code)]
    pub fn with_fields(mut self, fields: Vec<FieldError>) -> Self {
        self.fields = fields;
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn fields(&self) -> &[FieldError] {
        &self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_the_wrapped_message() {
        let err = RequestError::new("product not found", StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "product not found");
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert!(err.fields().is_empty());
    }

    #[test]
    fn source_is_preserved() {
        use std::error::Error as _;

        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let err = RequestError::new(io, StatusCode::BAD_REQUEST);
        assert_eq!(err.source().unwrap().to_string(), "disk on fire");
    }

    #[test]
    fn empty_fields_are_omitted() {
        let body = ErrorResponse {
            error: "bad".to_string(),
            fields: Vec::new(),
        };
        assert_eq!(serde_json::to_string(&body).unwrap(), r#"{"error":"bad"}"#);
    }
}
