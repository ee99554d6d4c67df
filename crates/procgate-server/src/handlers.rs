//! HTTP handlers for the procedure endpoints

use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
};
use procgate_core::CallContext;
use procgate_services::ProcedureGateway;
use serde::de::DeserializeOwned;

use crate::request::{CallProcedureRequest, ProcedureInfoRequest};
use crate::response::{ApiError, HttpResponse};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<dyn ProcedureGateway>,
}

impl AppState {
    pub fn new(gateway: Arc<dyn ProcedureGateway>) -> Self {
        Self { gateway }
    }
}

/// Context for one request. Dropping the guard (the client went away and
/// axum dropped the handler future) cancels the in-flight call.
fn request_context() -> (CallContext, tokio_util::sync::DropGuard) {
    let ctx = CallContext::new();
    let guard = ctx.cancellation_token().clone().drop_guard();
    (ctx, guard)
}

fn parse_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::warn!(error = %e, "rejecting malformed request body");
        ApiError::invalid_json()
    })
}

fn to_data<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::internal(format!("failed to encode result: {}", e)))
}

/// `POST /api/v1/procedures/call`
pub async fn call_procedure(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<HttpResponse, ApiError> {
    let request: CallProcedureRequest = parse_json(&body)?;
    request.validate().map_err(|message| {
        tracing::warn!(%message, "invalid call request");
        ApiError::bad_request(message)
    })?;

    let (procedure, params) = request.into_parameters();
    let (ctx, _guard) = request_context();

    let result = state
        .gateway
        .call_procedure(procedure, params, ctx)
        .await
        .map_err(ApiError::from)?;

    Ok(HttpResponse::success(to_data(&result)?))
}

/// `GET /api/v1/procedures/info`
///
/// The name comes from the JSON body when one is sent, otherwise from the
/// `procedure_name` query parameter.
pub async fn procedure_info(
    State(state): State<AppState>,
    Query(query): Query<ProcedureInfoRequest>,
    body: Bytes,
) -> Result<HttpResponse, ApiError> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        query
    } else {
        parse_json::<ProcedureInfoRequest>(&body)?
    };
    request.validate().map_err(ApiError::bad_request)?;

    let (ctx, _guard) = request_context();
    let arguments = state
        .gateway
        .procedure_info(request.procedure_name, ctx)
        .await
        .map_err(ApiError::from)?;

    Ok(HttpResponse::success(to_data(&arguments)?))
}

/// `GET /health`
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
