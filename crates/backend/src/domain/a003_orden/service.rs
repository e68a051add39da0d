use contracts::domain::a003_orden::aggregate::{
    Orden, OrdenConItems, OrdenDto, OrdenItem, OrdenItemId, OrdenItemInput,
};
use contracts::domain::common::{DomainError, EntityMetadata};
use uuid::Uuid;

use crate::shared::data::db::map_store_error;

use super::{items, reconciler, repository};

/// Create or update the order header
pub async fn upsert(dto: OrdenDto) -> Result<Uuid, DomainError> {
    match &dto.id {
        Some(raw) => {
            let id = Uuid::parse_str(raw)
                .map_err(|_| DomainError::Validation(format!("invalid orden id '{}'", raw)))?;
            let mut orden = repository::get_by_id(id)
                .await
                .map_err(map_store_error)?
                .ok_or(DomainError::NotFound {
                    entity: "orden",
                    id: id.to_string(),
                })?;
            orden.update(&dto);
            orden.validate().map_err(DomainError::Validation)?;
            repository::update(&orden).await.map_err(map_store_error)?;
            Ok(id)
        }
        None => {
            let orden = Orden::new_for_insert(&dto);
            orden.validate().map_err(DomainError::Validation)?;
            if repository::get_by_numero(&orden.numero)
                .await
                .map_err(map_store_error)?
                .is_some()
            {
                return Err(DomainError::UniqueViolation(format!(
                    "orden numero '{}' already exists",
                    orden.numero
                )));
            }
            repository::insert(&orden).await.map_err(map_store_error)
        }
    }
}

pub async fn list_all() -> Result<Vec<Orden>, DomainError> {
    repository::list_all().await.map_err(map_store_error)
}

/// Order detail: header, allocations, and the total summed from the current
/// rows on every call
pub async fn get_con_items(id: Uuid) -> Result<OrdenConItems, DomainError> {
    let orden = repository::get_by_id(id)
        .await
        .map_err(map_store_error)?
        .ok_or(DomainError::NotFound {
            entity: "orden",
            id: id.to_string(),
        })?;
    let item_rows = items::list_by_orden(id).await.map_err(map_store_error)?;
    let total_neto = items::sum_neto(id).await.map_err(map_store_error)?;
    Ok(OrdenConItems {
        orden,
        items: item_rows,
        total_neto,
    })
}

/// Replace the allocation collection with the submitted desired state.
///
/// The reconciler runs on the in-memory snapshot before any write is
/// issued; a rejected batch therefore leaves the store untouched. The plan
/// is then applied sequentially (deletes, updates, creates). A concurrent
/// creator of the same programa loses against the store unique index and
/// surfaces as a uniqueness conflict.
pub async fn save_items(
    orden_id: Uuid,
    incoming: Vec<OrdenItemInput>,
) -> Result<OrdenConItems, DomainError> {
    for input in &incoming {
        input.validate().map_err(DomainError::Validation)?;
    }

    let exists = repository::exists(orden_id).await.map_err(map_store_error)?;
    if !exists {
        return Err(DomainError::NotFound {
            entity: "orden",
            id: orden_id.to_string(),
        });
    }

    let existing = items::list_by_orden(orden_id).await.map_err(map_store_error)?;
    let plan = reconciler::reconcile(&existing, &incoming)?;

    for id in &plan.to_delete {
        items::delete(*id).await.map_err(map_store_error)?;
    }
    for (id, input) in &plan.to_update {
        items::update_input(*id, input).await.map_err(map_store_error)?;
    }
    for input in &plan.to_create {
        let row = OrdenItem {
            id: OrdenItemId::new(Uuid::new_v4()),
            orden_ref: orden_id,
            programa: input.programa.clone(),
            cadena: input.cadena.clone(),
            neto: input.neto,
            emisiones: input.emisiones,
            metadata: EntityMetadata::new(),
        };
        items::insert(&row).await.map_err(map_store_error)?;
    }

    get_con_items(orden_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db;

    fn orden_dto(numero: &str) -> OrdenDto {
        OrdenDto {
            id: None,
            numero: numero.to_string(),
            anunciante: "Anunciante Prueba".to_string(),
            agencia: None,
            mes: "2026-07".to_string(),
            estado: None,
        }
    }

    fn input(id: Option<Uuid>, programa: &str, neto: f64) -> OrdenItemInput {
        OrdenItemInput {
            id,
            programa: programa.to_string(),
            cadena: None,
            neto,
            emisiones: None,
        }
    }

    #[tokio::test]
    async fn save_items_reuses_rows_by_natural_key() {
        db::init_test_database().await;

        let orden_id = upsert(orden_dto("ORD-SVC-1")).await.expect("upsert orden");
        let first = save_items(
            orden_id,
            vec![input(None, "Programa A", 1000.0), input(None, "Programa B", 500.0)],
        )
        .await
        .expect("initial save");
        assert_eq!(first.items.len(), 2);
        assert_eq!(first.total_neto, 1500.0);

        let id_a = first.items[0].id.value();
        let id_b = first.items[1].id.value();

        // form resubmitted: A without id, B renamed by id
        let second = save_items(
            orden_id,
            vec![
                input(None, "Programa A", 1500.0),
                input(Some(id_b), "Programa C", 500.0),
            ],
        )
        .await
        .expect("second save");

        assert_eq!(second.items.len(), 2, "no duplicates were created");
        let a = second
            .items
            .iter()
            .find(|i| i.programa == "Programa A")
            .expect("A survives");
        assert_eq!(a.id.value(), id_a, "A matched by natural key keeps its id");
        assert_eq!(a.neto, 1500.0);
        assert!(second.items.iter().any(|i| i.programa == "Programa C"));
        assert_eq!(second.total_neto, 2000.0);
    }

    #[tokio::test]
    async fn save_items_deletes_rows_missing_from_the_batch() {
        db::init_test_database().await;

        let orden_id = upsert(orden_dto("ORD-SVC-2")).await.expect("upsert orden");
        save_items(
            orden_id,
            vec![input(None, "Mañanas", 300.0), input(None, "Tardes", 200.0)],
        )
        .await
        .expect("initial save");

        let after = save_items(orden_id, vec![input(None, "Mañanas", 300.0)])
            .await
            .expect("subset save");

        assert_eq!(after.items.len(), 1);
        assert_eq!(after.items[0].programa, "Mañanas");
        assert_eq!(after.total_neto, 300.0);
    }

    #[tokio::test]
    async fn duplicate_batch_is_rejected_without_touching_the_store() {
        db::init_test_database().await;

        let orden_id = upsert(orden_dto("ORD-SVC-3")).await.expect("upsert orden");
        save_items(orden_id, vec![input(None, "Unico", 100.0)])
            .await
            .expect("seed save");

        let err = save_items(
            orden_id,
            vec![input(None, "Repetido", 50.0), input(None, "Repetido", 60.0)],
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DomainError::UniqueViolation(_)));

        // pre-validation failed before any write: previous state intact
        let detail = get_con_items(orden_id).await.unwrap();
        assert_eq!(detail.items.len(), 1);
        assert_eq!(detail.items[0].programa, "Unico");
    }

    #[tokio::test]
    async fn concurrent_duplicate_is_caught_by_the_store_index() {
        db::init_test_database().await;

        let orden_id = upsert(orden_dto("ORD-SVC-4")).await.expect("upsert orden");

        // two racing writers both inserting "Noche"; the loser hits the
        // unique index and gets the mapped uniqueness error
        let row = |programa: &str| OrdenItem {
            id: OrdenItemId::new(Uuid::new_v4()),
            orden_ref: orden_id,
            programa: programa.to_string(),
            cadena: None,
            neto: 100.0,
            emisiones: None,
            metadata: EntityMetadata::new(),
        };
        items::insert(&row("Noche")).await.expect("winner inserts");
        let err = items::insert(&row("Noche")).await.map_err(map_store_error).unwrap_err();
        assert!(matches!(err, DomainError::UniqueViolation(_)));
    }

    #[tokio::test]
    async fn save_items_on_unknown_orden_is_not_found() {
        db::init_test_database().await;
        let err = save_items(Uuid::new_v4(), vec![input(None, "X", 10.0)])
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "orden", .. }));
    }
}
