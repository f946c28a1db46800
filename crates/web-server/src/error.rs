use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use core_types::CoreError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] database::DbError),
    #[error("Validation error: {0}")]
    Validation(#[from] CoreError),
    #[error("Invalid request body: {0}")]
    InvalidBody(#[from] JsonRejection),
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Converts our custom `AppError` into an HTTP response.
///
/// Every body has the shape `{"error": <kind>, "detail": <message>}`; validation
/// failures add the offending `field`.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Validation(err) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({
                    "error": "validation_error",
                    "field": err.field(),
                    "detail": err.to_string(),
                }),
            ),
            AppError::InvalidBody(rejection) => (
                rejection.status(),
                json!({ "error": "invalid_body", "detail": rejection.body_text() }),
            ),
            AppError::NotFound(message) => (
                StatusCode::NOT_FOUND,
                json!({ "error": "not_found", "detail": message }),
            ),
            AppError::Database(database::DbError::NotFound) => (
                StatusCode::NOT_FOUND,
                json!({ "error": "not_found", "detail": "The requested resource was not found" }),
            ),
            AppError::Database(db_err) => {
                tracing::error!(error = ?db_err, "Database error.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": "internal_error",
                        "detail": "An internal database error occurred",
                    }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
