//! API error type with HTTP response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use document_store::StoreError;
use domain::ErrorKind;
use fulfillment::FulfillmentError;

/// Wraps a [`FulfillmentError`] so handlers can return it directly.
#[derive(Debug)]
pub struct ApiError(pub FulfillmentError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        status_for(self.0.kind())
    }
}

/// Maps an error classification onto its HTTP status.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
        ErrorKind::Unauthorized => StatusCode::FORBIDDEN,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        metrics::counter!("http_errors_total", "kind" => self.0.kind().as_str()).increment(1);
        if status.is_server_error() {
            tracing::error!(error = %self.0, "internal server error");
        }
        (status, Json(self.0.to_response())).into_response()
    }
}

impl<E> From<E> for ApiError
where
    FulfillmentError: From<E>,
{
    fn from(err: E) -> Self {
        ApiError(FulfillmentError::from(err))
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
