use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::error::ErrorReport;
use crate::application::query::{QueryError, QueryValidationError};

pub mod codes {
    pub const TAGS_REQUIRED: &str = "tags_required";
    pub const SORT_BY_INVALID: &str = "sort_by_invalid";
    pub const DIRECTION_INVALID: &str = "direction_invalid";
    pub const UPSTREAM: &str = "upstream_error";
    pub const INTERNAL: &str = "internal_error";
}

/// JSON error body: `{"error": "<message>", "code": "<code>"}`.
#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: String,
    pub code: &'static str,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    report: ErrorReport,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }
}

impl From<QueryValidationError> for ApiError {
    fn from(err: QueryValidationError) -> Self {
        let status = StatusCode::BAD_REQUEST;
        Self {
            status,
            code: err.code(),
            message: err.to_string(),
            report: ErrorReport::from_error("infra::http::posts::validate", status, &err),
        }
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        let (status, code, message) = match &err {
            QueryError::Upstream(_) => (
                StatusCode::BAD_GATEWAY,
                codes::UPSTREAM,
                "Upstream posts service failed",
            ),
            QueryError::Worker(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::INTERNAL,
                "Internal server error",
            ),
        };
        Self {
            status,
            code,
            message: message.to_string(),
            report: ErrorReport::from_error("infra::http::posts::query", status, &err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: self.message,
            code: self.code,
        };
        let mut response = (self.status, Json(body)).into_response();
        self.report.attach(&mut response);
        response
    }
}
