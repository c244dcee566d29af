//! Gate error taxonomy.
//!
//! # Error Classes
//! - `Validation` / `InvalidInput`: user input errors, 400, caller may resubmit
//! - `RateLimited`: throttling, 429, caller may wait and retry
//! - `SecurityPattern`: heuristic malicious-content match, folded into the
//!   400 class like any other validation failure
//! - `Internal`: unexpected errors, 500, full detail stays server-side
//!
//! # Design Decisions
//! - The gate resolves its own classes locally; nothing here propagates
//!   to handler code
//! - Rejection bodies are structured JSON so callers can machine-read the
//!   violated fields

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::security::patterns::PatternCategory;

/// One field-level violation reported by the validation gate.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Errors the security gate terminates a request with.
#[derive(Debug, Error)]
pub enum GateError {
    /// Schema-level violations (missing/mistyped/oversized fields).
    #[error("validation failed for {} field(s)", .0.len())]
    Validation(Vec<FieldViolation>),

    /// Malformed or heuristically malicious input outside schema shape
    /// (unparseable body, flagged query value).
    #[error("invalid input")]
    InvalidInput(Vec<FieldViolation>),

    /// Per-IP request budget exhausted; the message is policy-configured.
    #[error("{0}")]
    RateLimited(String),

    /// A pattern matcher flagged a field's content.
    #[error("security pattern ({category}) detected in field `{field}`")]
    SecurityPattern {
        field: String,
        category: PatternCategory,
    },

    /// Anything outside the known taxonomy. Logged in full, returned generic.
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct RejectionBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a [FieldViolation]>,
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        match self {
            GateError::Validation(details) => (
                StatusCode::BAD_REQUEST,
                Json(RejectionBody {
                    error: "Validation Error",
                    details: Some(&details),
                }),
            )
                .into_response(),
            GateError::InvalidInput(details) => (
                StatusCode::BAD_REQUEST,
                Json(RejectionBody {
                    error: "Invalid input",
                    details: Some(&details),
                }),
            )
                .into_response(),
            GateError::RateLimited(message) => (
                StatusCode::TOO_MANY_REQUESTS,
                Json(serde_json::json!({ "error": message })),
            )
                .into_response(),
            GateError::SecurityPattern { field, category } => {
                let details = vec![FieldViolation::new(
                    field,
                    format!("content matched a blocked {category} pattern"),
                )];
                (
                    StatusCode::BAD_REQUEST,
                    Json(RejectionBody {
                        error: "Invalid input",
                        details: Some(&details),
                    }),
                )
                    .into_response()
            }
            GateError::Internal(detail) => {
                // Stack-trace-level detail stays out of the response body.
                tracing::error!(detail = %detail, "Unexpected internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({ "error": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}
