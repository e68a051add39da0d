use axum::extract::Path;
use axum::http::StatusCode;
use axum::Json;

use contracts::domain::a001_formulario::aggregate::{Formulario, FormularioDetalle};
use contracts::domain::common::{Envelope, ListEnvelope};

use crate::domain::a001_formulario::service;

use super::{parse_id, status_for};

/// GET /api/formulario
pub async fn list_all() -> (StatusCode, Json<ListEnvelope<Formulario>>) {
    match service::list_all().await {
        Ok(v) => (StatusCode::OK, Json(ListEnvelope::ok(v))),
        Err(e) => (status_for(&e), Json(ListEnvelope::err(&e))),
    }
}

/// GET /api/formulario/:id
pub async fn get_detalle(
    Path(id): Path<String>,
) -> (StatusCode, Json<Envelope<FormularioDetalle>>) {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(e) => return (status_for(&e), Json(Envelope::err(&e))),
    };
    match service::get_detalle(id).await {
        Ok(v) => (StatusCode::OK, Json(Envelope::ok(v))),
        Err(e) => (status_for(&e), Json(Envelope::err(&e))),
    }
}
