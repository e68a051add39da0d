use chrono::Utc;
use contracts::domain::a001_formulario::aggregate::{Formulario, FormularioEstado, FormularioId};
use contracts::domain::a002_gasto::aggregate::{
    EstadoPago, Gasto, GastoCompleto, GastoEstado, GastoId,
};
use contracts::domain::a004_contexto::aggregate::{Contexto, ContextoArea, ContextoId};
use contracts::domain::common::{DomainError, EntityMetadata};
use sea_orm::{ConnectionTrait, DatabaseBackend, QueryResult, Statement};
use uuid::Uuid;

use crate::shared::data::db::get_connection;

/// Composes the externally visible expense record from the three physical
/// tables. Always called after a coordinator write instead of assembling the
/// result in memory, so the caller sees exactly what the store persisted.
/// The INNER JOINs guarantee a half-written record (gasto without contexto)
/// is never returned.
pub async fn read(gasto_id: Uuid) -> Result<GastoCompleto, DomainError> {
    let db = get_connection();

    let sql = format!(
        "SELECT g.id AS g_id, g.proveedor, g.neto, g.iva_pct, g.importe_total, \
         g.estado AS g_estado, g.estado_pago, g.creado_por, \
         g.created_at AS g_created_at, g.updated_at AS g_updated_at, g.version AS g_version, \
         c.id AS c_id, c.formulario_ref, c.area, c.orden_ref, c.centro_coste, \
         c.mes_imputacion, c.detalle, c.extra_json, \
         c.created_at AS c_created_at, c.updated_at AS c_updated_at, c.version AS c_version, \
         f.campania, f.mes, f.unidad_negocio, f.descripcion, f.estado AS f_estado, \
         f.created_at AS f_created_at, f.updated_at AS f_updated_at, f.version AS f_version \
         FROM a002_gasto g \
         INNER JOIN a004_contexto c ON c.gasto_ref = g.id \
         INNER JOIN a001_formulario f ON f.id = c.formulario_ref \
         WHERE g.id = '{}'",
        gasto_id
    );

    let row = db
        .query_one(Statement::from_string(DatabaseBackend::Sqlite, sql))
        .await
        .map_err(|e| DomainError::Store(e.to_string()))?;

    match row {
        Some(row) => Ok(compose(gasto_id, &row)),
        None => Err(DomainError::NotFound {
            entity: "gasto",
            id: gasto_id.to_string(),
        }),
    }
}

fn metadata(row: &QueryResult, created: &str, updated: &str, version: &str) -> EntityMetadata {
    EntityMetadata {
        created_at: row
            .try_get::<Option<chrono::DateTime<Utc>>>("", created)
            .ok()
            .flatten()
            .unwrap_or_else(Utc::now),
        updated_at: row
            .try_get::<Option<chrono::DateTime<Utc>>>("", updated)
            .ok()
            .flatten()
            .unwrap_or_else(Utc::now),
        version: row.try_get::<i32>("", version).unwrap_or(0),
    }
}

fn uuid_col(row: &QueryResult, name: &str) -> Uuid {
    row.try_get::<String>("", name)
        .ok()
        .and_then(|s| Uuid::parse_str(&s).ok())
        .unwrap_or_else(Uuid::nil)
}

fn compose(gasto_id: Uuid, row: &QueryResult) -> GastoCompleto {
    let formulario_ref = uuid_col(row, "formulario_ref");

    let gasto = Gasto {
        id: GastoId::new(gasto_id),
        proveedor: row.try_get("", "proveedor").unwrap_or_default(),
        neto: row.try_get::<f64>("", "neto").unwrap_or(0.0),
        iva_pct: row.try_get::<f64>("", "iva_pct").unwrap_or(0.0),
        importe_total: row.try_get::<f64>("", "importe_total").unwrap_or(0.0),
        estado: row
            .try_get::<String>("", "g_estado")
            .ok()
            .and_then(|s| GastoEstado::parse(&s))
            .unwrap_or(GastoEstado::Pendiente),
        estado_pago: row
            .try_get::<String>("", "estado_pago")
            .ok()
            .and_then(|s| EstadoPago::parse(&s))
            .unwrap_or(EstadoPago::Creado),
        creado_por: row.try_get("", "creado_por").unwrap_or_default(),
        metadata: metadata(row, "g_created_at", "g_updated_at", "g_version"),
    };

    let contexto = Contexto {
        id: ContextoId::new(uuid_col(row, "c_id")),
        gasto_ref: gasto_id,
        formulario_ref,
        area: row
            .try_get::<String>("", "area")
            .ok()
            .and_then(|s| ContextoArea::parse(&s))
            .unwrap_or(ContextoArea::Implementacion),
        orden_ref: row
            .try_get::<Option<String>>("", "orden_ref")
            .ok()
            .flatten()
            .and_then(|s| Uuid::parse_str(&s).ok()),
        centro_coste: row.try_get::<Option<String>>("", "centro_coste").ok().flatten(),
        mes_imputacion: row
            .try_get::<Option<String>>("", "mes_imputacion")
            .ok()
            .flatten(),
        detalle: row.try_get::<Option<String>>("", "detalle").ok().flatten(),
        extra_json: row.try_get::<Option<String>>("", "extra_json").ok().flatten(),
        metadata: metadata(row, "c_created_at", "c_updated_at", "c_version"),
    };

    let formulario = Formulario {
        id: FormularioId::new(formulario_ref),
        campania: row.try_get("", "campania").unwrap_or_default(),
        mes: row.try_get("", "mes").unwrap_or_default(),
        unidad_negocio: row.try_get("", "unidad_negocio").unwrap_or_default(),
        descripcion: row.try_get::<Option<String>>("", "descripcion").ok().flatten(),
        estado: row
            .try_get::<String>("", "f_estado")
            .ok()
            .and_then(|s| FormularioEstado::parse(&s))
            .unwrap_or(FormularioEstado::Abierto),
        metadata: metadata(row, "f_created_at", "f_updated_at", "f_version"),
    };

    GastoCompleto {
        gasto,
        formulario,
        contexto,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db;

    #[tokio::test]
    async fn read_unknown_id_is_not_found() {
        db::init_test_database().await;
        let err = read(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "gasto", .. }));
    }
}
