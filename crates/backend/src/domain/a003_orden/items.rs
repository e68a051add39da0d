use anyhow::Result;
use chrono::Utc;
use contracts::domain::a003_orden::aggregate::{OrdenItem, OrdenItemId, OrdenItemInput};
use contracts::domain::common::EntityMetadata;
use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::data::db::get_connection;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a003_orden_item")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub orden_ref: String,
    pub programa: String,
    pub cadena: Option<String>,
    pub neto: f64,
    pub emisiones: Option<i32>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for OrdenItem {
    fn from(m: Model) -> Self {
        let metadata = EntityMetadata {
            created_at: m.created_at.unwrap_or_else(Utc::now),
            updated_at: m.updated_at.unwrap_or_else(Utc::now),
            version: m.version,
        };
        let uuid = Uuid::parse_str(&m.id).unwrap_or_else(|_| Uuid::nil());

        OrdenItem {
            id: OrdenItemId::new(uuid),
            orden_ref: Uuid::parse_str(&m.orden_ref).unwrap_or_else(|_| Uuid::nil()),
            programa: m.programa,
            cadena: m.cadena,
            neto: m.neto,
            emisiones: m.emisiones,
            metadata,
        }
    }
}

fn conn() -> &'static DatabaseConnection {
    get_connection()
}

pub async fn list_by_orden(orden_ref: Uuid) -> Result<Vec<OrdenItem>> {
    let items = Entity::find()
        .filter(Column::OrdenRef.eq(orden_ref.to_string()))
        .order_by_asc(Column::Programa)
        .all(conn())
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}

/// Inserts one allocation row. The unique index on (orden_ref, programa)
/// rejects a concurrent duplicate of the same program.
pub async fn insert(item: &OrdenItem) -> Result<Uuid> {
    let uuid = item.id.value();
    let active = ActiveModel {
        id: Set(uuid.to_string()),
        orden_ref: Set(item.orden_ref.to_string()),
        programa: Set(item.programa.clone()),
        cadena: Set(item.cadena.clone()),
        neto: Set(item.neto),
        emisiones: Set(item.emisiones),
        created_at: Set(Some(item.metadata.created_at)),
        updated_at: Set(Some(item.metadata.updated_at)),
        version: Set(item.metadata.version),
    };
    active.insert(conn()).await?;
    Ok(uuid)
}

/// Overwrites the caller-editable columns of one allocation row.
/// Returns false when the row does not exist.
pub async fn update_input(id: Uuid, input: &OrdenItemInput) -> Result<bool> {
    use sea_orm::sea_query::Expr;

    let result = Entity::update_many()
        .filter(Column::Id.eq(id.to_string()))
        .col_expr(Column::Programa, Expr::value(input.programa.clone()))
        .col_expr(Column::Cadena, Expr::value(input.cadena.clone()))
        .col_expr(Column::Neto, Expr::value(input.neto))
        .col_expr(Column::Emisiones, Expr::value(input.emisiones))
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
        .col_expr(Column::Version, Expr::col(Column::Version).add(1))
        .exec(conn())
        .await?;
    Ok(result.rows_affected > 0)
}

pub async fn delete(id: Uuid) -> Result<bool> {
    let result = Entity::delete_by_id(id.to_string()).exec(conn()).await?;
    Ok(result.rows_affected > 0)
}

/// Aggregate total recomputed from the current rows on every call; the sum
/// is never stored denormalized on the order header.
pub async fn sum_neto(orden_ref: Uuid) -> Result<f64> {
    use sea_orm::{ConnectionTrait, Statement};

    let sql = format!(
        "SELECT COALESCE(SUM(neto), 0.0) AS total FROM a003_orden_item WHERE orden_ref = '{}'",
        orden_ref
    );
    let row = conn()
        .query_one(Statement::from_string(
            sea_orm::DatabaseBackend::Sqlite,
            sql,
        ))
        .await?;
    Ok(row
        .and_then(|r| r.try_get::<f64>("", "total").ok())
        .unwrap_or(0.0))
}
