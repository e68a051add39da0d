use contracts::domain::a001_formulario::aggregate::{Formulario, FormularioDetalle};
use contracts::domain::a002_gasto::aggregate::GastoCompleto;
use contracts::domain::common::DomainError;
use uuid::Uuid;

use crate::domain::{a002_gasto, a004_contexto};
use crate::shared::data::db::map_store_error;

use super::repository;

pub async fn list_all() -> Result<Vec<Formulario>, DomainError> {
    repository::list_all().await.map_err(map_store_error)
}

/// Header detail: the header plus every composed child record
pub async fn get_detalle(id: Uuid) -> Result<FormularioDetalle, DomainError> {
    let formulario = repository::get_by_id(id)
        .await
        .map_err(map_store_error)?
        .ok_or(DomainError::NotFound {
            entity: "formulario",
            id: id.to_string(),
        })?;

    let contextos = a004_contexto::repository::list_by_formulario(id)
        .await
        .map_err(map_store_error)?;

    let mut gastos = Vec::with_capacity(contextos.len());
    for contexto in contextos {
        // a contexto without its core row would be a partial state; skip it
        // the same way the reader hides it
        if let Some(gasto) = a002_gasto::repository::get_by_id(contexto.gasto_ref)
            .await
            .map_err(map_store_error)?
        {
            gastos.push(GastoCompleto {
                gasto,
                formulario: formulario.clone(),
                contexto,
            });
        }
    }

    Ok(FormularioDetalle { formulario, gastos })
}
