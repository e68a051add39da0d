use anyhow::Result;
use chrono::Utc;
use contracts::domain::a004_contexto::aggregate::{
    Contexto, ContextoArea, ContextoId, ContextoPatch,
};
use contracts::domain::common::EntityMetadata;
use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::data::db::get_connection;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a004_contexto")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub gasto_ref: String,
    pub formulario_ref: String,
    pub area: String,
    pub orden_ref: Option<String>,
    pub centro_coste: Option<String>,
    pub mes_imputacion: Option<String>,
    pub detalle: Option<String>,
    pub extra_json: Option<String>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Contexto {
    fn from(m: Model) -> Self {
        let metadata = EntityMetadata {
            created_at: m.created_at.unwrap_or_else(Utc::now),
            updated_at: m.updated_at.unwrap_or_else(Utc::now),
            version: m.version,
        };
        let uuid = Uuid::parse_str(&m.id).unwrap_or_else(|_| Uuid::nil());

        Contexto {
            id: ContextoId::new(uuid),
            gasto_ref: Uuid::parse_str(&m.gasto_ref).unwrap_or_else(|_| Uuid::nil()),
            formulario_ref: Uuid::parse_str(&m.formulario_ref).unwrap_or_else(|_| Uuid::nil()),
            area: ContextoArea::parse(&m.area).unwrap_or(ContextoArea::Implementacion),
            orden_ref: m.orden_ref.and_then(|s| Uuid::parse_str(&s).ok()),
            centro_coste: m.centro_coste,
            mes_imputacion: m.mes_imputacion,
            detalle: m.detalle,
            extra_json: m.extra_json,
            metadata,
        }
    }
}

fn conn() -> &'static DatabaseConnection {
    get_connection()
}

pub async fn insert(contexto: &Contexto) -> Result<Uuid> {
    let uuid = contexto.id.value();
    let active = ActiveModel {
        id: Set(uuid.to_string()),
        gasto_ref: Set(contexto.gasto_ref.to_string()),
        formulario_ref: Set(contexto.formulario_ref.to_string()),
        area: Set(contexto.area.as_str().to_string()),
        orden_ref: Set(contexto.orden_ref.map(|u| u.to_string())),
        centro_coste: Set(contexto.centro_coste.clone()),
        mes_imputacion: Set(contexto.mes_imputacion.clone()),
        detalle: Set(contexto.detalle.clone()),
        extra_json: Set(contexto.extra_json.clone()),
        created_at: Set(Some(contexto.metadata.created_at)),
        updated_at: Set(Some(contexto.metadata.updated_at)),
        version: Set(contexto.metadata.version),
    };
    active.insert(conn()).await?;
    Ok(uuid)
}

pub async fn get_by_gasto(gasto_ref: Uuid) -> Result<Option<Contexto>> {
    let result = Entity::find()
        .filter(Column::GastoRef.eq(gasto_ref.to_string()))
        .one(conn())
        .await?;
    Ok(result.map(Into::into))
}

pub async fn list_by_formulario(formulario_ref: Uuid) -> Result<Vec<Contexto>> {
    let items = Entity::find()
        .filter(Column::FormularioRef.eq(formulario_ref.to_string()))
        .all(conn())
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}

/// Remaining children under a header; drives the orphan-header cleanup
pub async fn count_by_formulario(formulario_ref: Uuid) -> Result<u64> {
    let count = Entity::find()
        .filter(Column::FormularioRef.eq(formulario_ref.to_string()))
        .count(conn())
        .await?;
    Ok(count)
}

/// Column-by-column patch update addressed by the owning gasto row.
/// Returns false when no contexto row exists for that gasto.
pub async fn update_patch_by_gasto(gasto_ref: Uuid, patch: &ContextoPatch) -> Result<bool> {
    use sea_orm::sea_query::Expr;

    let mut update = Entity::update_many().filter(Column::GastoRef.eq(gasto_ref.to_string()));
    if let Some(v) = patch.orden_ref {
        update = update.col_expr(Column::OrdenRef, Expr::value(v.to_string()));
    }
    if let Some(v) = &patch.centro_coste {
        update = update.col_expr(Column::CentroCoste, Expr::value(v.clone()));
    }
    if let Some(v) = &patch.mes_imputacion {
        update = update.col_expr(Column::MesImputacion, Expr::value(v.clone()));
    }
    if let Some(v) = &patch.detalle {
        update = update.col_expr(Column::Detalle, Expr::value(v.clone()));
    }
    if let Some(v) = &patch.extra_json {
        update = update.col_expr(Column::ExtraJson, Expr::value(v.clone()));
    }
    let result = update
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
        .col_expr(Column::Version, Expr::col(Column::Version).add(1))
        .exec(conn())
        .await?;
    Ok(result.rows_affected > 0)
}
