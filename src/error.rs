use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use crate::web::{self, RequestError};

pub type AppResult<T> = Result<T, AppError>;

/// Handler error: any failure a handler propagates with `?`.
///
/// The response body is decided by [`web::respond_error`]; untyped causes are
/// logged here because the client never sees them.
#[derive(Debug)]
pub struct AppError(anyhow::Error);

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.0.downcast_ref::<RequestError>().is_none() {
            error!(error = %format!("{:#}", self.0), "request failed");
        }

        match web::respond_error(&self.0) {
            Ok(response) => response,
            Err(err) => {
                error!(error = %err, "encoding error response");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_errors_keep_their_status() {
        let err = AppError::from(RequestError::new("gone", StatusCode::GONE));
        assert_eq!(err.into_response().status(), StatusCode::GONE);
    }

    #[test]
    fn database_errors_become_500() {
        let err = AppError::from(sqlx::Error::RowNotFound);
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
