use anyhow::Result;
use chrono::Utc;
use contracts::domain::a003_orden::aggregate::{Orden, OrdenEstado, OrdenId};
use contracts::domain::common::EntityMetadata;
use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::data::db::get_connection;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a003_orden")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub numero: String,
    pub anunciante: String,
    pub agencia: Option<String>,
    pub mes: String,
    pub estado: String,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Orden {
    fn from(m: Model) -> Self {
        let metadata = EntityMetadata {
            created_at: m.created_at.unwrap_or_else(Utc::now),
            updated_at: m.updated_at.unwrap_or_else(Utc::now),
            version: m.version,
        };
        let uuid = Uuid::parse_str(&m.id).unwrap_or_else(|_| Uuid::nil());

        Orden {
            id: OrdenId::new(uuid),
            numero: m.numero,
            anunciante: m.anunciante,
            agencia: m.agencia,
            mes: m.mes,
            estado: OrdenEstado::parse(&m.estado).unwrap_or(OrdenEstado::Abierta),
            metadata,
        }
    }
}

fn conn() -> &'static DatabaseConnection {
    get_connection()
}

pub async fn insert(orden: &Orden) -> Result<Uuid> {
    let uuid = orden.id.value();
    let active = ActiveModel {
        id: Set(uuid.to_string()),
        numero: Set(orden.numero.clone()),
        anunciante: Set(orden.anunciante.clone()),
        agencia: Set(orden.agencia.clone()),
        mes: Set(orden.mes.clone()),
        estado: Set(orden.estado.as_str().to_string()),
        created_at: Set(Some(orden.metadata.created_at)),
        updated_at: Set(Some(orden.metadata.updated_at)),
        version: Set(orden.metadata.version),
    };
    active.insert(conn()).await?;
    Ok(uuid)
}

pub async fn update(orden: &Orden) -> Result<()> {
    let active = ActiveModel {
        id: Set(orden.id.value().to_string()),
        numero: Set(orden.numero.clone()),
        anunciante: Set(orden.anunciante.clone()),
        agencia: Set(orden.agencia.clone()),
        mes: Set(orden.mes.clone()),
        estado: Set(orden.estado.as_str().to_string()),
        updated_at: Set(Some(orden.metadata.updated_at)),
        version: Set(orden.metadata.version + 1),
        created_at: sea_orm::ActiveValue::NotSet,
    };
    active.update(conn()).await?;
    Ok(())
}

pub async fn get_by_id(id: Uuid) -> Result<Option<Orden>> {
    let result = Entity::find_by_id(id.to_string()).one(conn()).await?;
    Ok(result.map(Into::into))
}

pub async fn exists(id: Uuid) -> Result<bool> {
    let result = Entity::find_by_id(id.to_string()).one(conn()).await?;
    Ok(result.is_some())
}

pub async fn list_all() -> Result<Vec<Orden>> {
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

pub async fn get_by_numero(numero: &str) -> Result<Option<Orden>> {
    let result = Entity::find()
        .filter(Column::Numero.eq(numero))
        .one(conn())
        .await?;
    Ok(result.map(Into::into))
}
