//! Rendering of failures as JSON error responses.
//!
//! Every error body has the shape `{ "error": <code>, "message": <text> }`.
//! Codes are the lower-cased error codes of [`LedgerError`] and [`AppError`].

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use stockledger_core::LedgerError;
use stockledger_shared::AppError;
use tracing::error;

/// A failed request.
#[derive(Debug)]
pub enum ApiError {
    /// A ledger rule or store failure.
    Ledger(LedgerError),
    /// A request-level failure.
    App(AppError),
}

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        Self::Ledger(e)
    }
}

impl From<AppError> for ApiError {
    fn from(e: AppError) -> Self {
        Self::App(e)
    }
}

fn status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            Self::Ledger(e) => (
                status(e.http_status_code()),
                e.error_code(),
                e.to_string(),
            ),
            Self::App(e) => (status(e.status_code()), e.error_code(), e.to_string()),
        };

        if status.is_server_error() {
            error!(error = ?self, "Request failed");
            return (
                status,
                Json(json!({
                    "error": code.to_ascii_lowercase(),
                    "message": "An error occurred"
                })),
            )
                .into_response();
        }

        let mut body = json!({
            "error": code.to_ascii_lowercase(),
            "message": message
        });
        if let Self::Ledger(LedgerError::InsufficientStock {
            item,
            available,
            requested,
            shortfall,
        }) = &self
        {
            body["details"] = json!({
                "item_code": item,
                "available": available,
                "requested": requested,
                "shortfall": shortfall
            });
        }

        (status, Json(body)).into_response()
    }
}
