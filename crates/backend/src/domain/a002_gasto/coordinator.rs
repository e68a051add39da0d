//! Multi-table write coordination for the logical expense record.
//!
//! One expense is split across three physical tables: the shared formulario
//! header, the core gasto row, and the per-area contexto row. The store
//! offers no cross-table transaction, so creation runs as a strictly
//! sequential insert chain with hand-rolled compensating deletes on
//! mid-sequence failure. Updates apply per-table patches independently and
//! never compensate; removal cascades and cleans up orphaned headers
//! best-effort. Callers receive either a fully composed record re-read from
//! the store, or exactly one typed error.

use contracts::domain::a001_formulario::aggregate::Formulario;
use contracts::domain::a002_gasto::aggregate::{
    EstadoPago, Gasto, GastoCompleto, GastoConContexto, GastoDraft, GastoEstado, GastoId,
    GastoUpdate, FormularioRef,
};
use contracts::domain::a004_contexto::aggregate::{Contexto, ContextoDraft, ContextoId};
use contracts::domain::common::{DomainError, EntityMetadata};
use uuid::Uuid;

use crate::domain::{a001_formulario, a003_orden, a004_contexto};
use crate::shared::data::db::map_store_error;
use crate::shared::money;

use super::{reader, repository};

/// Resolved header selector: the header id plus whether this call created
/// the row (and therefore owns its compensation).
struct HeaderHandle {
    id: Uuid,
    created_here: bool,
}

/// Create one expense record.
///
/// Steps, in order: header insert (skipped for an existing header id), core
/// row insert, contexto insert. A failure at step N deletes what steps
/// 1..N-1 committed, in reverse order, before returning the error.
pub async fn create(
    formulario: FormularioRef,
    gasto: GastoDraft,
    contexto: ContextoDraft,
) -> Result<GastoCompleto, DomainError> {
    gasto.validate().map_err(DomainError::Validation)?;

    let header = resolve_formulario(formulario).await?;

    let row = build_gasto(&gasto);
    let gasto_id = match repository::insert(&row).await {
        Ok(id) => id,
        Err(e) => {
            if header.created_here {
                compensate_formulario(header.id).await;
            }
            return Err(partial_write("gasto", e));
        }
    };

    if let Err(err) = insert_contexto_step(gasto_id, header.id, &contexto).await {
        compensate_gasto(gasto_id).await;
        if header.created_here {
            compensate_formulario(header.id).await;
        }
        return Err(err);
    }

    reader::read(gasto_id).await
}

/// Create N expense records under one shared header.
///
/// Full-rollback policy: a failure at item i undoes the partially written
/// item, every previously created sibling (reverse creation order), and the
/// header when this call created it, then returns the single error.
pub async fn create_multiple(
    formulario: FormularioRef,
    items: Vec<GastoConContexto>,
) -> Result<Vec<GastoCompleto>, DomainError> {
    if items.is_empty() {
        return Err(DomainError::Validation("items must not be empty".into()));
    }
    for item in &items {
        item.gasto.validate().map_err(DomainError::Validation)?;
    }

    let header = resolve_formulario(formulario).await?;
    let mut created: Vec<Uuid> = Vec::with_capacity(items.len());

    for item in &items {
        let row = build_gasto(&item.gasto);
        let gasto_id = match repository::insert(&row).await {
            Ok(id) => id,
            Err(e) => {
                rollback_created(&created, &header).await;
                return Err(partial_write("gasto", e));
            }
        };

        if let Err(err) = insert_contexto_step(gasto_id, header.id, &item.contexto).await {
            compensate_gasto(gasto_id).await;
            rollback_created(&created, &header).await;
            return Err(err);
        }

        created.push(gasto_id);
    }

    let mut result = Vec::with_capacity(created.len());
    for id in &created {
        result.push(reader::read(*id).await?);
    }
    Ok(result)
}

/// Apply a split update across the three tables.
///
/// Patches are validated up front, then applied per table in creation order
/// (header, core, contexto). There is NO compensation here: when a later
/// patch fails, earlier table updates stay committed, and re-issuing the
/// update is the recovery path. Only creation compensates.
pub async fn update(id: Uuid, cambios: GastoUpdate) -> Result<GastoCompleto, DomainError> {
    if cambios.is_empty() {
        return Err(DomainError::Validation("update carries no changes".into()));
    }
    if let Some(patch) = &cambios.formulario {
        patch.validate().map_err(DomainError::Validation)?;
    }
    if let Some(patch) = &cambios.gasto {
        patch.validate().map_err(DomainError::Validation)?;
    }
    if let Some(patch) = &cambios.contexto {
        patch.validate().map_err(DomainError::Validation)?;
    }

    // the contexto row carries the header link
    let contexto = a004_contexto::repository::get_by_gasto(id)
        .await
        .map_err(map_store_error)?
        .ok_or(DomainError::NotFound {
            entity: "gasto",
            id: id.to_string(),
        })?;

    if let Some(patch) = cambios.formulario.as_ref().filter(|p| !p.is_empty()) {
        let updated = a001_formulario::repository::update_patch(contexto.formulario_ref, patch)
            .await
            .map_err(map_store_error)?;
        if !updated {
            return Err(DomainError::NotFound {
                entity: "formulario",
                id: contexto.formulario_ref.to_string(),
            });
        }
    }

    if let Some(patch) = cambios.gasto.as_ref().filter(|p| !p.is_empty()) {
        let updated = repository::update_patch(id, patch)
            .await
            .map_err(map_store_error)?;
        if !updated {
            return Err(DomainError::NotFound {
                entity: "gasto",
                id: id.to_string(),
            });
        }
    }

    if let Some(patch) = cambios.contexto.as_ref().filter(|p| !p.is_empty()) {
        if let Some(orden_ref) = patch.orden_ref {
            check_orden_exists(orden_ref).await?;
        }
        a004_contexto::repository::update_patch_by_gasto(id, patch)
            .await
            .map_err(map_store_error)?;
    }

    reader::read(id).await
}

/// Remove one expense record.
///
/// Deletes the core row (the store cascades the contexto row), then deletes
/// the header when no siblings remain. The cleanup is best-effort: its
/// failure is logged, never surfaced, and the primary deletion is never
/// rolled back because of it.
pub async fn remove(id: Uuid) -> Result<(), DomainError> {
    // capture the header link before the cascade erases it
    let contexto = a004_contexto::repository::get_by_gasto(id)
        .await
        .map_err(map_store_error)?;

    let deleted = repository::delete(id).await.map_err(map_store_error)?;
    if !deleted {
        return Err(DomainError::NotFound {
            entity: "gasto",
            id: id.to_string(),
        });
    }

    if let Some(contexto) = contexto {
        match a004_contexto::repository::count_by_formulario(contexto.formulario_ref).await {
            Ok(0) => {
                if let Err(e) = a001_formulario::repository::delete(contexto.formulario_ref).await {
                    tracing::warn!(
                        "orphan formulario {} cleanup failed: {}",
                        contexto.formulario_ref,
                        e
                    );
                }
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(
                    "orphan check for formulario {} failed: {}",
                    contexto.formulario_ref,
                    e
                );
            }
        }
    }

    Ok(())
}

async fn resolve_formulario(selector: FormularioRef) -> Result<HeaderHandle, DomainError> {
    match selector {
        FormularioRef::Existente(id) => {
            let found = a001_formulario::repository::get_by_id(id)
                .await
                .map_err(map_store_error)?;
            if found.is_none() {
                return Err(DomainError::NotFound {
                    entity: "formulario",
                    id: id.to_string(),
                });
            }
            Ok(HeaderHandle {
                id,
                created_here: false,
            })
        }
        FormularioRef::Nuevo(draft) => {
            draft.validate().map_err(DomainError::Validation)?;
            let header = Formulario::new_for_insert(draft);
            let id = a001_formulario::repository::insert(&header)
                .await
                .map_err(map_store_error)?;
            Ok(HeaderHandle {
                id,
                created_here: true,
            })
        }
    }
}

/// Contexto insert, preceded by the checked orden reference. Runs after the
/// core insert, so any failure here follows the contexto compensation path.
async fn insert_contexto_step(
    gasto_ref: Uuid,
    formulario_ref: Uuid,
    draft: &ContextoDraft,
) -> Result<(), DomainError> {
    if let Some(orden_ref) = draft.orden_ref {
        check_orden_exists(orden_ref).await?;
    }
    let contexto = build_contexto(gasto_ref, formulario_ref, draft);
    a004_contexto::repository::insert(&contexto)
        .await
        .map_err(|e| partial_write("contexto", e))?;
    Ok(())
}

/// The orden reference is optional but checked: a dangling id gets a
/// dedicated error instead of a raw foreign-key violation.
async fn check_orden_exists(orden_ref: Uuid) -> Result<(), DomainError> {
    let exists = a003_orden::repository::exists(orden_ref)
        .await
        .map_err(map_store_error)?;
    if !exists {
        return Err(DomainError::ReferenceNotFound {
            entity: "orden",
            id: orden_ref.to_string(),
        });
    }
    Ok(())
}

fn build_gasto(draft: &GastoDraft) -> Gasto {
    Gasto {
        id: GastoId::new(Uuid::new_v4()),
        proveedor: draft.proveedor.clone(),
        neto: draft.neto,
        iva_pct: draft.iva_pct,
        importe_total: money::importe_total(draft.neto, draft.iva_pct),
        estado: GastoEstado::Pendiente,
        estado_pago: EstadoPago::Creado,
        creado_por: draft.creado_por.clone(),
        metadata: EntityMetadata::new(),
    }
}

fn build_contexto(gasto_ref: Uuid, formulario_ref: Uuid, draft: &ContextoDraft) -> Contexto {
    Contexto {
        id: ContextoId::new(Uuid::new_v4()),
        gasto_ref,
        formulario_ref,
        area: draft.area,
        orden_ref: draft.orden_ref,
        centro_coste: draft.centro_coste.clone(),
        mes_imputacion: draft.mes_imputacion.clone(),
        detalle: draft.detalle.clone(),
        extra_json: draft.extra_json.clone(),
        metadata: EntityMetadata::new(),
    }
}

/// Full-rollback policy for multi-item creation: undo every sibling created
/// so far in reverse creation order, then the header if this call owns it.
async fn rollback_created(created: &[Uuid], header: &HeaderHandle) {
    for id in created.iter().rev() {
        compensate_gasto(*id).await;
    }
    if header.created_here {
        compensate_formulario(header.id).await;
    }
}

/// Compensation is best-effort: a failed compensating delete is logged and
/// swallowed so the original failure reason reaches the caller. The
/// possible orphaned row is an accepted consistency gap.
async fn compensate_gasto(id: Uuid) {
    if let Err(e) = repository::delete(id).await {
        tracing::warn!("compensation failed, orphaned gasto row {}: {}", id, e);
    }
}

async fn compensate_formulario(id: Uuid) {
    if let Err(e) = a001_formulario::repository::delete(id).await {
        tracing::warn!("compensation failed, orphaned formulario row {}: {}", id, e);
    }
}

fn partial_write(step: &'static str, e: anyhow::Error) -> DomainError {
    match map_store_error(e) {
        DomainError::UniqueViolation(m) => DomainError::UniqueViolation(m),
        other => DomainError::PartialWrite {
            step,
            cause: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db;
    use contracts::domain::a001_formulario::aggregate::{FormularioDraft, FormularioPatch};
    use contracts::domain::a002_gasto::aggregate::GastoPatch;
    use contracts::domain::a004_contexto::aggregate::{ContextoArea, ContextoPatch};

    fn formulario_draft(campania: &str) -> FormularioDraft {
        FormularioDraft {
            campania: campania.to_string(),
            mes: "2026-07".to_string(),
            unidad_negocio: "television".to_string(),
            descripcion: None,
        }
    }

    fn gasto_draft(proveedor: &str) -> GastoDraft {
        GastoDraft {
            proveedor: proveedor.to_string(),
            neto: 1000.0,
            iva_pct: 21.0,
            creado_por: "usuario.prueba".to_string(),
        }
    }

    fn contexto_draft(orden_ref: Option<Uuid>) -> ContextoDraft {
        ContextoDraft {
            area: ContextoArea::Implementacion,
            orden_ref,
            centro_coste: Some("CC-100".to_string()),
            mes_imputacion: None,
            detalle: None,
            extra_json: None,
        }
    }

    #[tokio::test]
    async fn create_links_the_three_rows_and_rereads() {
        db::init_test_database().await;

        let result = create(
            FormularioRef::Nuevo(formulario_draft("camp-create-1")),
            gasto_draft("prov-create-1"),
            contexto_draft(None),
        )
        .await
        .expect("create must succeed");

        assert_eq!(result.contexto.gasto_ref, result.gasto.id.value());
        assert_eq!(result.contexto.formulario_ref, result.formulario.id.value());
        assert_eq!(result.formulario.campania, "camp-create-1");
        assert_eq!(result.gasto.importe_total, 1210.0);
        assert_eq!(result.gasto.estado, GastoEstado::Pendiente);
        assert_eq!(result.gasto.estado_pago, EstadoPago::Creado);

        let again = reader::read(result.gasto.id.value())
            .await
            .expect("read after create");
        assert_eq!(again.gasto.id, result.gasto.id);
    }

    #[tokio::test]
    async fn create_under_existing_header_does_not_duplicate_it() {
        db::init_test_database().await;

        let first = create(
            FormularioRef::Nuevo(formulario_draft("camp-existing-1")),
            gasto_draft("prov-existing-1"),
            contexto_draft(None),
        )
        .await
        .expect("first create");

        let second = create(
            FormularioRef::Existente(first.formulario.id.value()),
            gasto_draft("prov-existing-2"),
            contexto_draft(None),
        )
        .await
        .expect("second create under same header");

        assert_eq!(second.formulario.id, first.formulario.id);
        let headers = a001_formulario::repository::find_by_campania("camp-existing-1")
            .await
            .unwrap();
        assert_eq!(headers.len(), 1);
    }

    #[tokio::test]
    async fn create_with_unknown_header_writes_nothing() {
        db::init_test_database().await;

        let err = create(
            FormularioRef::Existente(Uuid::new_v4()),
            gasto_draft("prov-no-header"),
            contexto_draft(None),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, DomainError::NotFound { entity: "formulario", .. }));
        let rows = repository::find_by_proveedor("prov-no-header").await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn failed_contexto_step_rolls_back_core_and_new_header() {
        db::init_test_database().await;

        let err = create(
            FormularioRef::Nuevo(formulario_draft("camp-rollback-1")),
            gasto_draft("prov-rollback-1"),
            contexto_draft(Some(Uuid::new_v4())),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, DomainError::ReferenceNotFound { entity: "orden", .. }));

        let rows = repository::find_by_proveedor("prov-rollback-1").await.unwrap();
        assert!(rows.is_empty(), "core row must be compensated");
        let headers = a001_formulario::repository::find_by_campania("camp-rollback-1")
            .await
            .unwrap();
        assert!(headers.is_empty(), "newly created header must be compensated");
    }

    #[tokio::test]
    async fn failed_contexto_step_keeps_a_preexisting_header() {
        db::init_test_database().await;

        let seed = create(
            FormularioRef::Nuevo(formulario_draft("camp-keep-header")),
            gasto_draft("prov-keep-header-seed"),
            contexto_draft(None),
        )
        .await
        .expect("seed create");

        let err = create(
            FormularioRef::Existente(seed.formulario.id.value()),
            gasto_draft("prov-keep-header-fail"),
            contexto_draft(Some(Uuid::new_v4())),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DomainError::ReferenceNotFound { .. }));

        // the failed sibling is gone, the header it did not create survives
        let rows = repository::find_by_proveedor("prov-keep-header-fail").await.unwrap();
        assert!(rows.is_empty());
        let headers = a001_formulario::repository::find_by_campania("camp-keep-header")
            .await
            .unwrap();
        assert_eq!(headers.len(), 1);
    }

    #[tokio::test]
    async fn create_multiple_composes_every_item() {
        db::init_test_database().await;

        let items = vec![
            GastoConContexto {
                gasto: gasto_draft("prov-multi-ok-1"),
                contexto: contexto_draft(None),
            },
            GastoConContexto {
                gasto: gasto_draft("prov-multi-ok-2"),
                contexto: contexto_draft(None),
            },
        ];
        let result = create_multiple(
            FormularioRef::Nuevo(formulario_draft("camp-multi-ok")),
            items,
        )
        .await
        .expect("create_multiple must succeed");

        assert_eq!(result.len(), 2);
        let header_id = result[0].formulario.id;
        assert!(result.iter().all(|r| r.formulario.id == header_id));
    }

    #[tokio::test]
    async fn create_multiple_failure_rolls_back_all_siblings_and_header() {
        db::init_test_database().await;

        let items = vec![
            GastoConContexto {
                gasto: gasto_draft("prov-multi-rb-1"),
                contexto: contexto_draft(None),
            },
            GastoConContexto {
                gasto: gasto_draft("prov-multi-rb-2"),
                contexto: contexto_draft(Some(Uuid::new_v4())),
            },
            GastoConContexto {
                gasto: gasto_draft("prov-multi-rb-3"),
                contexto: contexto_draft(None),
            },
        ];
        let err = create_multiple(
            FormularioRef::Nuevo(formulario_draft("camp-multi-rb")),
            items,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DomainError::ReferenceNotFound { .. }));

        for proveedor in ["prov-multi-rb-1", "prov-multi-rb-2", "prov-multi-rb-3"] {
            let rows = repository::find_by_proveedor(proveedor).await.unwrap();
            assert!(rows.is_empty(), "{} must be rolled back", proveedor);
        }
        let headers = a001_formulario::repository::find_by_campania("camp-multi-rb")
            .await
            .unwrap();
        assert!(headers.is_empty(), "shared header must be rolled back");
    }

    #[tokio::test]
    async fn remove_non_last_child_keeps_header_and_siblings() {
        db::init_test_database().await;

        let created = create_multiple(
            FormularioRef::Nuevo(formulario_draft("camp-remove-1")),
            vec![
                GastoConContexto {
                    gasto: gasto_draft("prov-remove-1a"),
                    contexto: contexto_draft(None),
                },
                GastoConContexto {
                    gasto: gasto_draft("prov-remove-1b"),
                    contexto: contexto_draft(None),
                },
            ],
        )
        .await
        .expect("seed create_multiple");

        remove(created[0].gasto.id.value()).await.expect("remove first child");

        // cascade removed the contexto of the deleted row
        let ctx = a004_contexto::repository::get_by_gasto(created[0].gasto.id.value())
            .await
            .unwrap();
        assert!(ctx.is_none(), "contexto must cascade with its gasto row");

        // sibling and header survive
        let sibling = reader::read(created[1].gasto.id.value()).await;
        assert!(sibling.is_ok());
        let headers = a001_formulario::repository::find_by_campania("camp-remove-1")
            .await
            .unwrap();
        assert_eq!(headers.len(), 1);
    }

    #[tokio::test]
    async fn remove_last_child_deletes_the_header_too() {
        db::init_test_database().await;

        let created = create(
            FormularioRef::Nuevo(formulario_draft("camp-remove-2")),
            gasto_draft("prov-remove-2"),
            contexto_draft(None),
        )
        .await
        .expect("seed create");

        remove(created.gasto.id.value()).await.expect("remove last child");

        let headers = a001_formulario::repository::find_by_campania("camp-remove-2")
            .await
            .unwrap();
        assert!(headers.is_empty(), "orphaned header must be deleted");
    }

    #[tokio::test]
    async fn remove_unknown_id_is_not_found() {
        db::init_test_database().await;
        let err = remove(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "gasto", .. }));
    }

    #[tokio::test]
    async fn update_patches_each_table() {
        db::init_test_database().await;

        let created = create(
            FormularioRef::Nuevo(formulario_draft("camp-update-1")),
            gasto_draft("prov-update-1"),
            contexto_draft(None),
        )
        .await
        .expect("seed create");

        let cambios = GastoUpdate {
            gasto: Some(GastoPatch {
                neto: Some(2000.0),
                estado_pago: Some(EstadoPago::Aprobado),
                ..Default::default()
            }),
            formulario: Some(FormularioPatch {
                campania: Some("camp-update-1-bis".to_string()),
                ..Default::default()
            }),
            contexto: Some(ContextoPatch {
                centro_coste: Some("CC-200".to_string()),
                ..Default::default()
            }),
        };
        let updated = update(created.gasto.id.value(), cambios)
            .await
            .expect("update must succeed");

        assert_eq!(updated.gasto.neto, 2000.0);
        assert_eq!(updated.gasto.importe_total, 2420.0);
        assert_eq!(updated.gasto.estado_pago, EstadoPago::Aprobado);
        assert_eq!(updated.formulario.campania, "camp-update-1-bis");
        assert_eq!(updated.contexto.centro_coste.as_deref(), Some("CC-200"));
    }

    #[tokio::test]
    async fn update_does_not_roll_back_earlier_tables() {
        db::init_test_database().await;

        let created = create(
            FormularioRef::Nuevo(formulario_draft("camp-asym-1")),
            gasto_draft("prov-asym-1"),
            contexto_draft(None),
        )
        .await
        .expect("seed create");

        let cambios = GastoUpdate {
            gasto: None,
            formulario: Some(FormularioPatch {
                campania: Some("camp-asym-1-changed".to_string()),
                ..Default::default()
            }),
            // dangling orden reference fails after the header patch applied
            contexto: Some(ContextoPatch {
                orden_ref: Some(Uuid::new_v4()),
                ..Default::default()
            }),
        };
        let err = update(created.gasto.id.value(), cambios).await.unwrap_err();
        assert!(matches!(err, DomainError::ReferenceNotFound { .. }));

        let after = reader::read(created.gasto.id.value()).await.unwrap();
        assert_eq!(
            after.formulario.campania, "camp-asym-1-changed",
            "header change stays committed, update has no compensation"
        );
        assert!(after.contexto.orden_ref.is_none());
    }

    #[tokio::test]
    async fn update_with_no_changes_is_rejected() {
        db::init_test_database().await;
        let err = update(Uuid::new_v4(), GastoUpdate::default()).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn create_rejects_invalid_amounts() {
        db::init_test_database().await;

        let mut draft = gasto_draft("prov-invalid");
        draft.iva_pct = 180.0;
        let err = create(
            FormularioRef::Nuevo(formulario_draft("camp-invalid")),
            draft,
            contexto_draft(None),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        // pre-write validation: nothing reached the store
        let headers = a001_formulario::repository::find_by_campania("camp-invalid")
            .await
            .unwrap();
        assert!(headers.is_empty());
    }
}
