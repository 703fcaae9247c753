//! HTTP handlers for the canvas API.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use rusty_canvas_core::types::CanvasSummary;
use rusty_canvas_draw::Element;
use rusty_canvas_draw::export::attachment_filename;

use crate::error::ApiError;
use crate::events::ExportEvent;
use crate::registry::NewCanvas;
use crate::state::GatewayState;

const NO_CACHE: [(header::HeaderName, &str); 3] = [
    (header::CACHE_CONTROL, "no-cache, no-store, must-revalidate"),
    (header::PRAGMA, "no-cache"),
    (header::EXPIRES, "0"),
];

/// Body of `POST /canvas/:id/elements`.
#[derive(Debug, Deserialize)]
pub struct AddElementRequest {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub properties: Option<serde_json::Value>,
}

pub async fn ping() -> impl IntoResponse {
    Json(json!({
        "message": "success",
        "status": "Server is active",
    }))
}

pub async fn create_canvas(
    State(state): State<Arc<GatewayState>>,
    body: Result<Json<NewCanvas>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = body?;
    let summary = state.canvases.create(request).await?;

    Ok(Json(json!({
        "message": "Canvas initialized",
        "id": summary.id,
        "dimensions": summary.dimensions,
        "metadata": summary.metadata,
    })))
}

pub async fn get_canvas(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
) -> Result<Json<CanvasSummary>, ApiError> {
    Ok(Json(state.canvases.get(&id).await?))
}

pub async fn list_canvases(State(state): State<Arc<GatewayState>>) -> Json<Vec<CanvasSummary>> {
    Json(state.canvases.list().await)
}

pub async fn delete_canvas(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.canvases.delete(&id).await?;
    Ok(Json(json!({ "message": "Canvas deleted successfully" })))
}

pub async fn add_element(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
    body: Result<Json<AddElementRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    // An unknown canvas is reported before anything about the body.
    if !state.canvases.contains(&id).await {
        return Err(ApiError::NotFound(id));
    }

    let Json(request) = body?;
    debug!(canvas_id = %id, kind = ?request.kind, "Adding element");
    let element = Element::from_request(request.kind.as_deref(), request.properties)?;
    let metadata = state.canvases.add_element(&id, element).await?;

    Ok(Json(json!({
        "message": "Element added successfully",
        "metadata": metadata,
    })))
}

pub async fn export_canvas(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let (html, metadata) = state.canvases.export_html(&id).await?;

    let disposition = format!("attachment; filename=\"{}\"", attachment_filename(&id));
    let response = (
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8"),
            (header::CONTENT_DISPOSITION, disposition.as_str()),
        ],
        NO_CACHE,
        html,
    )
        .into_response();

    #[cfg(feature = "metrics")]
    crate::metrics::record_export("html");
    state.exports.on_export(&ExportEvent::html(&id, metadata));

    Ok(response)
}

pub async fn preview_canvas(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let png = state.canvases.preview_png(&id).await?;
    Ok(([(header::CONTENT_TYPE, "image/png")], NO_CACHE, png).into_response())
}

pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" })))
}
