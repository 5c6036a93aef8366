use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use super::error::{ErrorResponse, RequestError};

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Serializes `data` to JSON and builds a response with the given status.
///
/// Serialization happens before anything is built, so a failure leaves no
/// partial response behind.
pub fn respond<T>(data: &T, status: StatusCode) -> Result<Response, serde_json::Error>
where
    T: Serialize + ?Sized,
{
    let body = serde_json::to_vec(data)?;

    Ok((
        status,
        [(header::CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE))],
        body,
    )
        .into_response())
}

/// Translates an error into its client-visible JSON body.
///
/// A [`RequestError`] surfaces its own message, status and field errors.
/// Everything else becomes a generic 500 so internal detail stays server-side.
pub fn respond_error(err: &anyhow::Error) -> Result<Response, serde_json::Error> {
    if let Some(request_err) = err.downcast_ref::<RequestError>() {
        let body = ErrorResponse {
            error: request_err.to_string(),
            fields: request_err.fields().to_vec(),
        };
        return respond(&body, request_err.status());
    }

    let body = ErrorResponse {
        error: StatusCode::INTERNAL_SERVER_ERROR
            .canonical_reason()
            .unwrap_or("Internal Server Error")
            .to_string(),
        fields: Vec::new(),
    };
    respond(&body, StatusCode::INTERNAL_SERVER_ERROR)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use anyhow::anyhow;
    use axum::body::to_bytes;

    use super::*;
    use crate::web::FieldError;

    async fn body_string(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn respond_writes_status_header_and_body() {
        let response = respond(&vec![1, 2, 3], StatusCode::CREATED).unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json; charset=utf-8"
        );
        assert_eq!(body_string(response).await, "[1,2,3]");
    }

    #[test]
    fn respond_fails_without_a_response_for_unserializable_data() {
        // JSON object keys must be strings; tuple keys cannot be encoded.
        let mut data = BTreeMap::new();
        data.insert((1, 2), "pair");

        assert!(respond(&data, StatusCode::OK).is_err());
    }

    #[tokio::test]
    async fn respond_error_surfaces_request_errors() {
        let err = anyhow::Error::new(RequestError::new("not found", StatusCode::NOT_FOUND));
        let response = respond_error(&err).unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_string(response).await, r#"{"error":"not found"}"#);
    }

    #[tokio::test]
    async fn respond_error_includes_field_errors() {
        let err = anyhow::Error::new(
            RequestError::new("field validation error", StatusCode::BAD_REQUEST).with_fields(vec![
                FieldError {
                    field: "quantity".to_string(),
                    error: "must be at least 0".to_string(),
                },
            ]),
        );
        let response = respond_error(&err).unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_string(response).await;
        assert_eq!(
            body,
            r#"{"error":"field validation error","fields":[{"field":"quantity","error":"must be at least 0"}]}"#
        );

        let decoded: ErrorResponse = serde_json::from_str(&body).unwrap();
        assert_eq!(decoded.fields.len(), 1);
        assert_eq!(decoded.fields[0].field, "quantity");
    }

    #[tokio::test]
    async fn untyped_error_body_has_no_fields() {
        let response = respond_error(&anyhow!("boom")).unwrap();
        let decoded: ErrorResponse = serde_json::from_str(&body_string(response).await).unwrap();

        assert_eq!(decoded.error, "Internal Server Error");
        assert!(decoded.fields.is_empty());
    }

    #[tokio::test]
    async fn respond_error_hides_untyped_errors() {
        let err = anyhow!("password authentication failed for user \"postgres\"");
        let response = respond_error(&err).unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_string(response).await,
            r#"{"error":"Internal Server Error"}"#
        );
    }
}
