//! JSON envelope returned by every endpoint

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use procgate_services::ServiceError;
use serde::Serialize;

pub const SUCCESS_MESSAGE: &str = "Success";
pub const INVALID_JSON_MESSAGE: &str = "Invalid JSON format";

/// `{"message": ..., "status": ..., "data": ...}`
#[derive(Debug, Clone, Serialize)]
pub struct HttpResponse {
    pub message: String,
    pub status: bool,
    pub data: serde_json::Value,
}

impl HttpResponse {
    /// Successful envelope; a null payload becomes `{}`
    pub fn success(data: serde_json::Value) -> Self {
        Self {
            message: SUCCESS_MESSAGE.to_string(),
            status: true,
            data: or_empty_object(data),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: false,
            data: empty_object(),
        }
    }
}

impl IntoResponse for HttpResponse {
    fn into_response(self) -> Response {
        let status = if self.status {
            StatusCode::OK
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(self)).into_response()
    }
}

/// An error envelope with its HTTP status
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn invalid_json() -> Self {
        Self::bad_request(INVALID_JSON_MESSAGE)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        let status = match &err {
            ServiceError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServiceError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ServiceError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::CallFailed(_)
            | ServiceError::DescribeFailed(_)
            | ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(HttpResponse::error(self.message))).into_response()
    }
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

fn or_empty_object(data: serde_json::Value) -> serde_json::Value {
    if data.is_null() { empty_object() } else { data }
}
