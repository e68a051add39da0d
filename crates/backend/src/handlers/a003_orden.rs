use axum::extract::Path;
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;

use contracts::domain::a003_orden::aggregate::{
    Orden, OrdenConItems, OrdenDto, SaveOrdenItemsRequest,
};
use contracts::domain::common::{Envelope, ListEnvelope};

use crate::domain::a003_orden::service;

use super::{parse_id, status_for};

/// GET /api/orden
pub async fn list_all() -> (StatusCode, Json<ListEnvelope<Orden>>) {
    match service::list_all().await {
        Ok(v) => (StatusCode::OK, Json(ListEnvelope::ok(v))),
        Err(e) => (status_for(&e), Json(ListEnvelope::err(&e))),
    }
}

/// GET /api/orden/:id
pub async fn get_by_id(Path(id): Path<String>) -> (StatusCode, Json<Envelope<OrdenConItems>>) {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(e) => return (status_for(&e), Json(Envelope::err(&e))),
    };
    match service::get_con_items(id).await {
        Ok(v) => (StatusCode::OK, Json(Envelope::ok(v))),
        Err(e) => (status_for(&e), Json(Envelope::err(&e))),
    }
}

/// POST /api/orden
pub async fn upsert(Json(dto): Json<OrdenDto>) -> (StatusCode, Json<Envelope<serde_json::Value>>) {
    match service::upsert(dto).await {
        Ok(id) => (
            StatusCode::OK,
            Json(Envelope::ok(json!({ "id": id.to_string() }))),
        ),
        Err(e) => (status_for(&e), Json(Envelope::err(&e))),
    }
}

/// PUT /api/orden/:id/items
pub async fn save_items(
    Path(id): Path<String>,
    Json(req): Json<SaveOrdenItemsRequest>,
) -> (StatusCode, Json<Envelope<OrdenConItems>>) {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(e) => return (status_for(&e), Json(Envelope::err(&e))),
    };
    match service::save_items(id, req.items).await {
        Ok(v) => (StatusCode::OK, Json(Envelope::ok(v))),
        Err(e) => (status_for(&e), Json(Envelope::err(&e))),
    }
}
