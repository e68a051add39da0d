//! Pure reconciliation of the allocation rows under one order against the
//! desired state submitted by the caller. Computed entirely in memory before
//! any store call: a rejected batch has zero side effects.

use contracts::domain::a003_orden::aggregate::{OrdenItem, OrdenItemInput};
use contracts::domain::common::DomainError;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Create/update/delete sets for one reconciliation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcilePlan {
    pub to_create: Vec<OrdenItemInput>,
    pub to_update: Vec<(Uuid, OrdenItemInput)>,
    pub to_delete: Vec<Uuid>,
}

/// Match incoming allocations against the existing rows.
///
/// Matching priority per incoming item:
/// 1. its id names an existing row -> update that row;
/// 2. it has no id but its programa matches an existing row -> reuse that
///    row's id (prevents duplicate creation when the form is resubmitted
///    without ids);
/// 3. otherwise -> create.
///
/// An existing row is deleted only when neither its id nor its programa
/// appears anywhere in the incoming batch.
///
/// Two incoming items sharing one programa reject the whole batch with a
/// uniqueness error and no plan.
pub fn reconcile(
    existing: &[OrdenItem],
    incoming: &[OrdenItemInput],
) -> Result<ReconcilePlan, DomainError> {
    let mut seen: HashSet<&str> = HashSet::new();
    for input in incoming {
        if !seen.insert(input.programa.as_str()) {
            return Err(DomainError::UniqueViolation(format!(
                "duplicate programa '{}' in incoming items",
                input.programa
            )));
        }
    }

    let by_id: HashMap<Uuid, &OrdenItem> =
        existing.iter().map(|i| (i.id.value(), i)).collect();
    let by_programa: HashMap<&str, &OrdenItem> =
        existing.iter().map(|i| (i.programa.as_str(), i)).collect();

    let mut plan = ReconcilePlan::default();

    for input in incoming {
        if let Some(id) = input.id {
            if by_id.contains_key(&id) {
                plan.to_update.push((id, input.clone()));
                continue;
            }
        }
        if input.id.is_none() {
            if let Some(row) = by_programa.get(input.programa.as_str()) {
                plan.to_update.push((row.id.value(), input.clone()));
                continue;
            }
        }
        plan.to_create.push(input.clone());
    }

    let incoming_ids: HashSet<Uuid> = incoming.iter().filter_map(|i| i.id).collect();
    let incoming_keys: HashSet<&str> = incoming.iter().map(|i| i.programa.as_str()).collect();
    for row in existing {
        if !incoming_ids.contains(&row.id.value())
            && !incoming_keys.contains(row.programa.as_str())
        {
            plan.to_delete.push(row.id.value());
        }
    }

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::domain::a003_orden::aggregate::OrdenItemId;
    use contracts::domain::common::EntityMetadata;

    fn item(id: Uuid, programa: &str) -> OrdenItem {
        OrdenItem {
            id: OrdenItemId::new(id),
            orden_ref: Uuid::nil(),
            programa: programa.to_string(),
            cadena: None,
            neto: 100.0,
            emisiones: None,
            metadata: EntityMetadata::new(),
        }
    }

    fn input(id: Option<Uuid>, programa: &str) -> OrdenItemInput {
        OrdenItemInput {
            id,
            programa: programa.to_string(),
            cadena: None,
            neto: 100.0,
            emisiones: None,
        }
    }

    #[test]
    fn matches_by_id_then_by_natural_key() {
        let id_a = Uuid::new_v4();
        let id_b = Uuid::new_v4();
        let existing = vec![item(id_a, "A"), item(id_b, "B")];
        // "A" resubmitted without id, B renamed to "C" by id
        let incoming = vec![input(None, "A"), input(Some(id_b), "C")];

        let plan = reconcile(&existing, &incoming).unwrap();

        assert!(plan.to_create.is_empty());
        assert!(plan.to_delete.is_empty());
        assert_eq!(plan.to_update.len(), 2);
        assert_eq!(plan.to_update[0].0, id_a);
        assert_eq!(plan.to_update[0].1.programa, "A");
        assert_eq!(plan.to_update[1].0, id_b);
        assert_eq!(plan.to_update[1].1.programa, "C");
    }

    #[test]
    fn unmatched_incoming_items_are_created() {
        let existing = vec![item(Uuid::new_v4(), "A")];
        let incoming = vec![input(None, "A"), input(None, "B")];

        let plan = reconcile(&existing, &incoming).unwrap();

        assert_eq!(plan.to_update.len(), 1);
        assert_eq!(plan.to_create.len(), 1);
        assert_eq!(plan.to_create[0].programa, "B");
        assert!(plan.to_delete.is_empty());
    }

    #[test]
    fn rows_absent_from_both_key_sets_are_deleted() {
        let id_a = Uuid::new_v4();
        let id_b = Uuid::new_v4();
        let existing = vec![item(id_a, "A"), item(id_b, "B")];
        let incoming = vec![input(Some(id_a), "A")];

        let plan = reconcile(&existing, &incoming).unwrap();

        assert_eq!(plan.to_delete, vec![id_b]);
        assert!(plan.to_create.is_empty());
    }

    #[test]
    fn row_is_kept_when_only_its_natural_key_reappears() {
        let id_a = Uuid::new_v4();
        let existing = vec![item(id_a, "A")];
        // same programa captured as a fresh row without id
        let incoming = vec![input(None, "A")];

        let plan = reconcile(&existing, &incoming).unwrap();

        assert!(plan.to_delete.is_empty());
        assert_eq!(plan.to_update.len(), 1);
        assert_eq!(plan.to_update[0].0, id_a);
    }

    #[test]
    fn duplicate_natural_keys_reject_the_whole_batch() {
        let existing = vec![item(Uuid::new_v4(), "A")];
        let incoming = vec![input(None, "X"), input(None, "X")];

        let err = reconcile(&existing, &incoming).unwrap_err();
        assert!(matches!(err, DomainError::UniqueViolation(_)));
    }

    #[test]
    fn empty_incoming_deletes_everything() {
        let id_a = Uuid::new_v4();
        let id_b = Uuid::new_v4();
        let existing = vec![item(id_a, "A"), item(id_b, "B")];

        let plan = reconcile(&existing, &[]).unwrap();

        assert_eq!(plan.to_delete, vec![id_a, id_b]);
        assert!(plan.to_create.is_empty());
        assert!(plan.to_update.is_empty());
    }

    #[test]
    fn reconcile_is_idempotent() {
        let id_a = Uuid::new_v4();
        let id_b = Uuid::new_v4();
        let existing = vec![item(id_a, "A"), item(id_b, "B")];
        let incoming = vec![input(None, "A"), input(Some(id_b), "C"), input(None, "D")];

        let first = reconcile(&existing, &incoming).unwrap();
        let second = reconcile(&existing, &incoming).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn stale_id_with_colliding_key_becomes_a_create() {
        // an input carrying an unknown id does not fall back to key matching
        let existing = vec![item(Uuid::new_v4(), "A")];
        let incoming = vec![input(Some(Uuid::new_v4()), "A")];

        let plan = reconcile(&existing, &incoming).unwrap();

        assert_eq!(plan.to_create.len(), 1);
        // the existing row's key is still present in the batch, so it stays
        assert!(plan.to_delete.is_empty());
    }
}
