use contracts::domain::a002_gasto::aggregate::{
    CreateGastoMultipleRequest, CreateGastoRequest, GastoCompleto, GastoUpdate,
};
use contracts::domain::common::DomainError;
use uuid::Uuid;

use crate::shared::data::db::map_store_error;

use super::{coordinator, reader, repository};

pub use repository::{GastoListQuery, GastoListResult, GastoListRow};

pub async fn create(req: CreateGastoRequest) -> Result<GastoCompleto, DomainError> {
    coordinator::create(req.formulario, req.gasto, req.contexto).await
}

pub async fn create_multiple(
    req: CreateGastoMultipleRequest,
) -> Result<Vec<GastoCompleto>, DomainError> {
    coordinator::create_multiple(req.formulario, req.items).await
}

pub async fn get_by_id(id: Uuid) -> Result<GastoCompleto, DomainError> {
    reader::read(id).await
}

pub async fn update(id: Uuid, cambios: GastoUpdate) -> Result<GastoCompleto, DomainError> {
    coordinator::update(id, cambios).await
}

pub async fn remove(id: Uuid) -> Result<(), DomainError> {
    coordinator::remove(id).await
}

pub async fn list(query: GastoListQuery) -> Result<GastoListResult, DomainError> {
    repository::list_sql(query).await.map_err(map_store_error)
}
