//! Route handlers

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

use super::error::ApiError;
use super::AppState;
use crate::storage::CallbackId;

const FORM: &str = "application/x-www-form-urlencoded";
const JSON: &str = "application/json";

type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Deserialize)]
pub struct CreateRequest {
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    pub new_name: String,
}

#[derive(Debug, Deserialize)]
pub struct CallQuery {
    pub status: Option<String>,
}

/// Media type of the request body without parameters, lowercased
fn content_type(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::CONTENT_TYPE)?
        .to_str()
        .ok()?
        .split(';')
        .next()
        .map(|mime| mime.trim().to_ascii_lowercase())
}

fn parse_form(body: &[u8]) -> HashMap<String, String> {
    url::form_urlencoded::parse(body).into_owned().collect()
}

fn callback_path(id: &CallbackId) -> String {
    format!("/{}/", id)
}

/// GET /
pub async fn index() -> Json<serde_json::Value> {
    Json(json!({
        "service": "pingboard",
        "version": env!("CARGO_PKG_VERSION"),
        "routes": [
            "POST /",
            "GET /{id}/",
            "POST /{id}/",
            "PUT /{id}/",
            "DELETE /{id}/",
            "GET /{id}/call?status=",
            "GET /{id}/img",
            "GET /{id}/activity",
            "GET /health",
        ],
    }))
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Response {
    match state.storage.health_check().await {
        Ok(status) if status.healthy => (StatusCode::OK, Json(status)).into_response(),
        Ok(status) => (StatusCode::SERVICE_UNAVAILABLE, Json(status)).into_response(),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "healthy": false, "message": e.to_string() })),
        )
            .into_response(),
    }
}

/// POST /
pub async fn create_callback(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Response> {
    match content_type(&headers).as_deref() {
        Some(FORM) => {
            let display_name = parse_form(&body)
                .remove("display_name")
                .ok_or_else(|| ApiError::bad_request("missing display_name"))?;
            let callback = state.callbacks.create(&display_name).await?;
            Ok(Redirect::to(&callback_path(&callback.id)).into_response())
        }
        Some(JSON) => {
            let request: CreateRequest = serde_json::from_slice(&body)
                .map_err(|e| ApiError::bad_request(e.to_string()))?;
            let callback = state.callbacks.create(&request.display_name).await?;
            Ok((StatusCode::CREATED, Json(callback)).into_response())
        }
        _ => Err(ApiError::UnsupportedMediaType),
    }
}

/// GET /{id}/
pub async fn get_callback(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let callback = state.callbacks.get(&CallbackId::from(id)).await?;
    Ok(Json(callback).into_response())
}

/// GET /{id}/call?status=...
pub async fn record_call(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<CallQuery>,
) -> ApiResult<Response> {
    let event_id = state
        .callbacks
        .record_call(&CallbackId::from(id), query.status.as_deref())
        .await?;
    Ok(Json(json!({ "logId": event_id })).into_response())
}

/// POST /{id}/ with a form: `delete` removes the callback, `new_name` renames it
pub async fn manage_callback(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Response> {
    if content_type(&headers).as_deref() != Some(FORM) {
        return Err(ApiError::UnsupportedMediaType);
    }

    let id = CallbackId::from(id);
    let mut form = parse_form(&body);

    if form.contains_key("delete") {
        state.callbacks.delete(&id).await?;
        return Ok(Redirect::to("/").into_response());
    }

    let new_name = form
        .remove("new_name")
        .ok_or_else(|| ApiError::bad_request("missing new_name"))?;
    state.callbacks.rename(&id, &new_name).await?;
    Ok(Redirect::to(&callback_path(&id)).into_response())
}

/// PUT /{id}/
pub async fn rename_callback(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Response> {
    if content_type(&headers).as_deref() != Some(JSON) {
        return Err(ApiError::UnsupportedMediaType);
    }
    let request: RenameRequest =
        serde_json::from_slice(&body).map_err(|e| ApiError::bad_request(e.to_string()))?;

    let callback = state
        .callbacks
        .rename(&CallbackId::from(id), &request.new_name)
        .await?;
    Ok(Json(callback).into_response())
}

/// DELETE /{id}/
pub async fn delete_callback(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.callbacks.delete(&CallbackId::from(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /{id}/img
pub async fn activity_chart(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id = CallbackId::from(id);
    let table = state.activity.activity(&id).await?;
    let image = state.renderer.render(id.as_str(), &table)?;

    Ok((
        [(header::CONTENT_TYPE, state.renderer.content_type())],
        image,
    )
        .into_response())
}

/// GET /{id}/activity
pub async fn activity_table(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let table = state.activity.activity(&CallbackId::from(id)).await?;
    Ok(Json(table).into_response())
}
