use anyhow::Result;
use chrono::Utc;
use contracts::domain::a001_formulario::aggregate::{
    Formulario, FormularioEstado, FormularioId, FormularioPatch,
};
use contracts::domain::common::EntityMetadata;
use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::data::db::get_connection;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a001_formulario")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub campania: String,
    pub mes: String,
    pub unidad_negocio: String,
    pub descripcion: Option<String>,
    pub estado: String,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Formulario {
    fn from(m: Model) -> Self {
        let metadata = EntityMetadata {
            created_at: m.created_at.unwrap_or_else(Utc::now),
            updated_at: m.updated_at.unwrap_or_else(Utc::now),
            version: m.version,
        };
        let uuid = Uuid::parse_str(&m.id).unwrap_or_else(|_| Uuid::nil());

        Formulario {
            id: FormularioId::new(uuid),
            campania: m.campania,
            mes: m.mes,
            unidad_negocio: m.unidad_negocio,
            descripcion: m.descripcion,
            estado: FormularioEstado::parse(&m.estado).unwrap_or(FormularioEstado::Abierto),
            metadata,
        }
    }
}

fn conn() -> &'static DatabaseConnection {
    get_connection()
}

pub async fn insert(header: &Formulario) -> Result<Uuid> {
    let uuid = header.id.value();
    let active = ActiveModel {
        id: Set(uuid.to_string()),
        campania: Set(header.campania.clone()),
        mes: Set(header.mes.clone()),
        unidad_negocio: Set(header.unidad_negocio.clone()),
        descripcion: Set(header.descripcion.clone()),
        estado: Set(header.estado.as_str().to_string()),
        created_at: Set(Some(header.metadata.created_at)),
        updated_at: Set(Some(header.metadata.updated_at)),
        version: Set(header.metadata.version),
    };
    active.insert(conn()).await?;
    Ok(uuid)
}

pub async fn get_by_id(id: Uuid) -> Result<Option<Formulario>> {
    let result = Entity::find_by_id(id.to_string()).one(conn()).await?;
    Ok(result.map(Into::into))
}

pub async fn find_by_campania(campania: &str) -> Result<Vec<Formulario>> {
    let items = Entity::find()
        .filter(Column::Campania.eq(campania))
        .all(conn())
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}

pub async fn list_all() -> Result<Vec<Formulario>> {
    let items = Entity::find()
        .order_by_desc(Column::UpdatedAt)
        .limit(1000)
        .all(conn())
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}

/// Column-by-column patch update; absent fields stay untouched.
/// Returns false when the row does not exist.
pub async fn update_patch(id: Uuid, patch: &FormularioPatch) -> Result<bool> {
    use sea_orm::sea_query::Expr;

    let mut update = Entity::update_many().filter(Column::Id.eq(id.to_string()));
    if let Some(v) = &patch.campania {
        update = update.col_expr(Column::Campania, Expr::value(v.clone()));
    }
    if let Some(v) = &patch.mes {
        update = update.col_expr(Column::Mes, Expr::value(v.clone()));
    }
    if let Some(v) = &patch.unidad_negocio {
        update = update.col_expr(Column::UnidadNegocio, Expr::value(v.clone()));
    }
    if let Some(v) = &patch.descripcion {
        update = update.col_expr(Column::Descripcion, Expr::value(v.clone()));
    }
    if let Some(v) = patch.estado {
        update = update.col_expr(Column::Estado, Expr::value(v.as_str()));
    }
    let result = update
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
        .col_expr(Column::Version, Expr::col(Column::Version).add(1))
        .exec(conn())
        .await?;
    Ok(result.rows_affected > 0)
}

/// Hard delete. Headers are physically removed by compensation and by the
/// orphan cleanup after the last child disappears.
pub async fn delete(id: Uuid) -> Result<bool> {
    let result = Entity::delete_by_id(id.to_string()).exec(conn()).await?;
    Ok(result.rows_affected > 0)
}
