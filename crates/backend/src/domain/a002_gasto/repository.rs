use anyhow::Result;
use chrono::Utc;
use contracts::domain::a002_gasto::aggregate::{
    EstadoPago, Gasto, GastoEstado, GastoId, GastoPatch,
};
use contracts::domain::common::EntityMetadata;
use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::data::db::get_connection;
use crate::shared::money;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a002_gasto")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub proveedor: String,
    pub neto: f64,
    pub iva_pct: f64,
    pub importe_total: f64,
    pub estado: String,
    pub estado_pago: String,
    pub creado_por: String,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Gasto {
    fn from(m: Model) -> Self {
        let metadata = EntityMetadata {
            created_at: m.created_at.unwrap_or_else(Utc::now),
            updated_at: m.updated_at.unwrap_or_else(Utc::now),
            version: m.version,
        };
        let uuid = Uuid::parse_str(&m.id).unwrap_or_else(|_| Uuid::nil());

        Gasto {
            id: GastoId::new(uuid),
            proveedor: m.proveedor,
            neto: m.neto,
            iva_pct: m.iva_pct,
            importe_total: m.importe_total,
            estado: GastoEstado::parse(&m.estado).unwrap_or(GastoEstado::Pendiente),
            estado_pago: EstadoPago::parse(&m.estado_pago).unwrap_or(EstadoPago::Creado),
            creado_por: m.creado_por,
            metadata,
        }
    }
}

fn conn() -> &'static DatabaseConnection {
    get_connection()
}

pub async fn insert(gasto: &Gasto) -> Result<Uuid> {
    let uuid = gasto.id.value();
    let active = ActiveModel {
        id: Set(uuid.to_string()),
        proveedor: Set(gasto.proveedor.clone()),
        neto: Set(gasto.neto),
        iva_pct: Set(gasto.iva_pct),
        importe_total: Set(gasto.importe_total),
        estado: Set(gasto.estado.as_str().to_string()),
        estado_pago: Set(gasto.estado_pago.as_str().to_string()),
        creado_por: Set(gasto.creado_por.clone()),
        created_at: Set(Some(gasto.metadata.created_at)),
        updated_at: Set(Some(gasto.metadata.updated_at)),
        version: Set(gasto.metadata.version),
    };
    active.insert(conn()).await?;
    Ok(uuid)
}

pub async fn get_by_id(id: Uuid) -> Result<Option<Gasto>> {
    let result = Entity::find_by_id(id.to_string()).one(conn()).await?;
    Ok(result.map(Into::into))
}

pub async fn find_by_proveedor(proveedor: &str) -> Result<Vec<Gasto>> {
    let items = Entity::find()
        .filter(Column::Proveedor.eq(proveedor))
        .all(conn())
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}

/// Column-by-column patch update; importe_total is re-derived whenever neto
/// or iva_pct change. Returns false when the row does not exist.
pub async fn update_patch(id: Uuid, patch: &GastoPatch) -> Result<bool> {
    use sea_orm::sea_query::Expr;

    let Some(current) = Entity::find_by_id(id.to_string()).one(conn()).await? else {
        return Ok(false);
    };

    let mut update = Entity::update_many().filter(Column::Id.eq(id.to_string()));
    if let Some(v) = &patch.proveedor {
        update = update.col_expr(Column::Proveedor, Expr::value(v.clone()));
    }
    if patch.neto.is_some() || patch.iva_pct.is_some() {
        let neto = patch.neto.unwrap_or(current.neto);
        let iva_pct = patch.iva_pct.unwrap_or(current.iva_pct);
        update = update
            .col_expr(Column::Neto, Expr::value(neto))
            .col_expr(Column::IvaPct, Expr::value(iva_pct))
            .col_expr(
                Column::ImporteTotal,
                Expr::value(money::importe_total(neto, iva_pct)),
            );
    }
    if let Some(v) = patch.estado {
        update = update.col_expr(Column::Estado, Expr::value(v.as_str()));
    }
    if let Some(v) = patch.estado_pago {
        update = update.col_expr(Column::EstadoPago, Expr::value(v.as_str()));
    }
    let result = update
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
        .col_expr(Column::Version, Expr::col(Column::Version).add(1))
        .exec(conn())
        .await?;
    Ok(result.rows_affected > 0)
}

/// Hard delete; the store cascades the contexto row
pub async fn delete(id: Uuid) -> Result<bool> {
    let result = Entity::delete_by_id(id.to_string()).exec(conn()).await?;
    Ok(result.rows_affected > 0)
}

/// Query parameters for the list view
#[derive(Debug, Clone)]
pub struct GastoListQuery {
    pub search_query: Option<String>,
    pub area: Option<String>,
    pub estado: Option<String>,
    pub sort_by: String,
    pub sort_desc: bool,
    pub limit: usize,
    pub offset: usize,
}

/// Flattened row for the list view
#[derive(Debug, Clone, Serialize)]
pub struct GastoListRow {
    pub id: String,
    pub proveedor: String,
    pub neto: f64,
    pub importe_total: f64,
    pub estado: String,
    pub estado_pago: String,
    pub area: String,
    pub campania: String,
    pub mes: String,
    pub unidad_negocio: String,
    pub formulario_ref: String,
}

/// Paginated list result
#[derive(Debug, Clone, Serialize)]
pub struct GastoListResult {
    pub items: Vec<GastoListRow>,
    pub total: usize,
}

/// SQL-based list with pagination, sorting and filtering. The INNER JOINs
/// keep half-written records out of the listing, same as the reader.
pub async fn list_sql(query: GastoListQuery) -> Result<GastoListResult> {
    use sea_orm::{ConnectionTrait, Statement};

    let db = conn();

    let mut conditions = vec!["1 = 1".to_string()];

    if let Some(ref search) = query.search_query {
        if !search.is_empty() {
            let escaped = search.replace('\'', "''");
            conditions.push(format!(
                "(g.proveedor LIKE '%{0}%' OR f.campania LIKE '%{0}%')",
                escaped
            ));
        }
    }
    if let Some(ref area) = query.area {
        if !area.is_empty() {
            let escaped = area.replace('\'', "''");
            conditions.push(format!("c.area = '{}'", escaped));
        }
    }
    if let Some(ref estado) = query.estado {
        if !estado.is_empty() {
            let escaped = estado.replace('\'', "''");
            conditions.push(format!("g.estado = '{}'", escaped));
        }
    }

    let where_clause = conditions.join(" AND ");

    let sort_column = match query.sort_by.as_str() {
        "proveedor" => "g.proveedor",
        "importe_total" => "g.importe_total",
        "campania" => "f.campania",
        "mes" => "f.mes",
        _ => "g.updated_at",
    };
    let sort_dir = if query.sort_desc { "DESC" } else { "ASC" };

    let count_sql = format!(
        "SELECT COUNT(*) as cnt \
         FROM a002_gasto g \
         INNER JOIN a004_contexto c ON c.gasto_ref = g.id \
         INNER JOIN a001_formulario f ON f.id = c.formulario_ref \
         WHERE {}",
        where_clause
    );

    let list_sql = format!(
        "SELECT g.id, g.proveedor, g.neto, g.importe_total, g.estado, g.estado_pago, \
         c.area, c.formulario_ref, f.campania, f.mes, f.unidad_negocio \
         FROM a002_gasto g \
         INNER JOIN a004_contexto c ON c.gasto_ref = g.id \
         INNER JOIN a001_formulario f ON f.id = c.formulario_ref \
         WHERE {} \
         ORDER BY {} {} \
         LIMIT {} OFFSET {}",
        where_clause, sort_column, sort_dir, query.limit, query.offset
    );

    let count_result = db
        .query_one(Statement::from_string(
            sea_orm::DatabaseBackend::Sqlite,
            count_sql,
        ))
        .await?;

    let total = count_result
        .and_then(|row| row.try_get::<i64>("", "cnt").ok())
        .unwrap_or(0) as usize;

    let rows = db
        .query_all(Statement::from_string(
            sea_orm::DatabaseBackend::Sqlite,
            list_sql,
        ))
        .await?;

    let items = rows
        .into_iter()
        .map(|row| GastoListRow {
            id: row.try_get("", "id").unwrap_or_default(),
            proveedor: row.try_get("", "proveedor").unwrap_or_default(),
            neto: row.try_get::<f64>("", "neto").unwrap_or(0.0),
            importe_total: row.try_get::<f64>("", "importe_total").unwrap_or(0.0),
            estado: row.try_get("", "estado").unwrap_or_default(),
            estado_pago: row.try_get("", "estado_pago").unwrap_or_default(),
            area: row.try_get("", "area").unwrap_or_default(),
            campania: row.try_get("", "campania").unwrap_or_default(),
            mes: row.try_get("", "mes").unwrap_or_default(),
            unidad_negocio: row.try_get("", "unidad_negocio").unwrap_or_default(),
            formulario_ref: row.try_get("", "formulario_ref").unwrap_or_default(),
        })
        .collect();

    Ok(GastoListResult { items, total })
}
