//! HTTP-facing error taxonomy for the relay.
//!
//! Every failure path terminates the request; nothing is retried. Mid-stream
//! failures never reach this type: once streaming has begun, the only signal
//! to the caller is a closed connection.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("missing model or messages")]
    InvalidRequest,

    #[error("upstream returned {status}: {detail}")]
    Upstream { status: StatusCode, detail: String },

    #[error("server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Wire shape of every non-streaming error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::InvalidRequest => StatusCode::BAD_REQUEST,
            Self::Upstream { status, .. } => *status,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorBody {
        match self {
            Self::MethodNotAllowed => ErrorBody {
                error: "Method not allowed",
                detail: None,
            },
            Self::InvalidRequest => ErrorBody {
                error: "Missing model or messages",
                detail: None,
            },
            Self::Upstream { detail, .. } => ErrorBody {
                error: "Upstream error",
                detail: Some(detail.clone()),
            },
            Self::Internal(err) => ErrorBody {
                error: "Server error",
                detail: Some(err.to_string()),
            },
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}
