use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use contracts::domain::a002_gasto::aggregate::{
    CreateGastoMultipleRequest, CreateGastoRequest, GastoCompleto, GastoUpdate,
};
use contracts::domain::common::{DeleteEnvelope, Envelope, ListEnvelope};

use crate::domain::a002_gasto::service;
use crate::domain::a002_gasto::service::{GastoListQuery, GastoListResult};

use super::{parse_id, status_for};

/// POST /api/gasto
pub async fn create(
    Json(req): Json<CreateGastoRequest>,
) -> (StatusCode, Json<Envelope<GastoCompleto>>) {
    match service::create(req).await {
        Ok(v) => (StatusCode::OK, Json(Envelope::ok(v))),
        Err(e) => (status_for(&e), Json(Envelope::err(&e))),
    }
}

/// POST /api/gasto/multiple
pub async fn create_multiple(
    Json(req): Json<CreateGastoMultipleRequest>,
) -> (StatusCode, Json<ListEnvelope<GastoCompleto>>) {
    match service::create_multiple(req).await {
        Ok(v) => (StatusCode::OK, Json(ListEnvelope::ok(v))),
        Err(e) => (status_for(&e), Json(ListEnvelope::err(&e))),
    }
}

/// GET /api/gasto/:id
pub async fn get_by_id(Path(id): Path<String>) -> (StatusCode, Json<Envelope<GastoCompleto>>) {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(e) => return (status_for(&e), Json(Envelope::err(&e))),
    };
    match service::get_by_id(id).await {
        Ok(v) => (StatusCode::OK, Json(Envelope::ok(v))),
        Err(e) => (status_for(&e), Json(Envelope::err(&e))),
    }
}

/// PUT /api/gasto/:id
pub async fn update(
    Path(id): Path<String>,
    Json(cambios): Json<GastoUpdate>,
) -> (StatusCode, Json<Envelope<GastoCompleto>>) {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(e) => return (status_for(&e), Json(Envelope::err(&e))),
    };
    match service::update(id, cambios).await {
        Ok(v) => (StatusCode::OK, Json(Envelope::ok(v))),
        Err(e) => (status_for(&e), Json(Envelope::err(&e))),
    }
}

/// DELETE /api/gasto/:id
pub async fn delete(Path(id): Path<String>) -> (StatusCode, Json<DeleteEnvelope>) {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(e) => return (status_for(&e), Json(DeleteEnvelope::err(&e))),
    };
    match service::remove(id).await {
        Ok(()) => (StatusCode::OK, Json(DeleteEnvelope::ok())),
        Err(e) => (status_for(&e), Json(DeleteEnvelope::err(&e))),
    }
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub search: Option<String>,
    pub area: Option<String>,
    pub estado: Option<String>,
    #[serde(default = "default_sort_by")]
    pub sort_by: String,
    #[serde(default)]
    pub sort_desc: bool,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_sort_by() -> String {
    "updated_at".to_string()
}

fn default_limit() -> usize {
    50
}

/// GET /api/gasto/list
pub async fn list(
    Query(params): Query<ListParams>,
) -> (StatusCode, Json<Envelope<GastoListResult>>) {
    let query = GastoListQuery {
        search_query: params.search,
        area: params.area,
        estado: params.estado,
        sort_by: params.sort_by,
        sort_desc: params.sort_desc,
        limit: params.limit.min(500),
        offset: params.offset,
    };
    match service::list(query).await {
        Ok(v) => (StatusCode::OK, Json(Envelope::ok(v))),
        Err(e) => (status_for(&e), Json(Envelope::err(&e))),
    }
}
