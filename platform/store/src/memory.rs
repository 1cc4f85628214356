use std::{
    collections::BTreeMap,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use async_trait::async_trait;
use chrono::Utc;
use entity::{Record, RecordId};
use tracing::debug;

use crate::{RecordStore, StoreError, StoreResult};

/// Arena-style store: records keyed by id plus a counter that only grows.
///
/// Clones share the same arena. Ids start at 1 and are never handed out twice,
/// even after a delete.
pub struct InMemoryStore<R: Record> {
    arena: Arc<RwLock<Arena<R>>>,
}

struct Arena<R> {
    records: BTreeMap<RecordId, R>,
    last_id: u64,
}

impl<R: Record> Clone for InMemoryStore<R> {
    fn clone(&self) -> Self {
        Self {
            arena: Arc::clone(&self.arena),
        }
    }
}

impl<R: Record> Default for InMemoryStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> InMemoryStore<R> {
    pub fn new() -> Self {
        Self {
            arena: Arc::new(RwLock::new(Arena {
                records: BTreeMap::new(),
                last_id: 0,
            })),
        }
    }

    pub fn len(&self) -> usize {
        self.read().map(|arena| arena.records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Arena<R>>> {
        self.arena.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Arena<R>>> {
        self.arena.write().map_err(|_| StoreError::Poisoned)
    }
}

#[async_trait]
impl<R: Record> RecordStore<R> for InMemoryStore<R> {
    async fn get_all(&self) -> StoreResult<Vec<R>> {
        Ok(self.read()?.records.values().cloned().collect())
    }

    async fn get_by_id(&self, id: RecordId) -> StoreResult<Option<R>> {
        Ok(self.read()?.records.get(&id).cloned())
    }

    async fn create(&self, draft: R::Draft) -> StoreResult<R> {
        let mut arena = self.write()?;
        let id = arena
            .last_id
            .checked_add(1)
            .and_then(RecordId::new)
            .ok_or_else(|| StoreError::Rejected(format!("{} id space exhausted", R::TABLE)))?;
        let record = R::from_draft(id, draft, Utc::now());
        record.validate()?;
        // The counter only moves once the draft is accepted.
        arena.last_id = id.get();
        arena.records.insert(id, record.clone());
        debug!(table = R::TABLE, %id, "record created");
        Ok(record)
    }

    async fn update(&self, id: RecordId, patch: R::Patch) -> StoreResult<R> {
        let mut arena = self.write()?;
        let current = arena.records.get(&id).ok_or(StoreError::NotFound {
            table: R::TABLE,
            id,
        })?;
        let mut next = current.clone();
        next.apply_patch(patch, Utc::now());
        next.validate()?;
        arena.records.insert(id, next.clone());
        debug!(table = R::TABLE, %id, "record updated");
        Ok(next)
    }

    async fn delete(&self, id: RecordId) -> StoreResult<()> {
        let mut arena = self.write()?;
        arena.records.remove(&id).ok_or(StoreError::NotFound {
            table: R::TABLE,
            id,
        })?;
        debug!(table = R::TABLE, %id, "record deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use entity::{Deal, DealPatch, MAX_AMOUNT_CENTS, NewDeal, Stage};

    #[tokio::test]
    async fn ids_grow_and_are_never_reused() {
        let store = InMemoryStore::<Deal>::new();
        let first = store
            .create(NewDeal::new("First", 100, Stage::Lead))
            .await
            .unwrap();
        let second = store
            .create(NewDeal::new("Second", 100, Stage::Lead))
            .await
            .unwrap();
        assert_eq!(first.id.get(), 1);
        assert_eq!(second.id.get(), 2);

        store.delete(second.id).await.unwrap();
        let third = store
            .create(NewDeal::new("Third", 100, Stage::Lead))
            .await
            .unwrap();
        assert_eq!(third.id.get(), 3);
        let ids: Vec<u64> = store
            .get_all()
            .await
            .unwrap()
            .iter()
            .map(|deal| deal.id.get())
            .collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn rejected_drafts_do_not_consume_ids() {
        let store = InMemoryStore::<Deal>::new();
        let err = store
            .create(NewDeal::new("  ", 100, Stage::Lead))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        let deal = store
            .create(NewDeal::new("Valid", 100, Stage::Lead))
            .await
            .unwrap();
        assert_eq!(deal.id.get(), 1);
    }

    #[tokio::test]
    async fn amounts_over_the_ceiling_are_rejected() {
        let store = InMemoryStore::<Deal>::new();
        let huge = 6_000_000_000_000_000_000;
        for _ in 0..2 {
            let err = store
                .create(NewDeal::new("Too big", huge, Stage::Lead))
                .await
                .unwrap_err();
            assert!(matches!(err, StoreError::Validation(ref e) if e.field == "amount"));
        }
        assert!(store.is_empty());

        let created = store
            .create(NewDeal::new("Largest", MAX_AMOUNT_CENTS, Stage::Lead))
            .await
            .unwrap();
        let patch = DealPatch {
            amount_cents: Some(huge),
            ..DealPatch::default()
        };
        assert!(matches!(
            store.update(created.id, patch).await,
            Err(StoreError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn update_applies_only_the_patch() {
        let store = InMemoryStore::<Deal>::new();
        let created = store
            .create(NewDeal::new("Renewal", 500_00, Stage::Qualified))
            .await
            .unwrap();
        let updated = store
            .update(created.id, DealPatch::stage(Stage::Proposal))
            .await
            .unwrap();
        assert_eq!(updated.stage, Stage::Proposal);
        assert_eq!(updated.name, "Renewal");
        assert_eq!(updated.amount_cents, 500_00);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn invalid_update_leaves_record_unchanged() {
        let store = InMemoryStore::<Deal>::new();
        let created = store
            .create(NewDeal::new("Renewal", 500_00, Stage::Qualified))
            .await
            .unwrap();
        let patch = DealPatch {
            amount_cents: Some(-5),
            stage: Some(Stage::Lead),
            ..DealPatch::default()
        };
        assert!(matches!(
            store.update(created.id, patch).await,
            Err(StoreError::Validation(_))
        ));
        let stored = store.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(stored, created);
    }

    #[tokio::test]
    async fn missing_records_report_not_found() {
        let store = InMemoryStore::<Deal>::new();
        let id = RecordId::new(42).unwrap();
        assert!(store.get_by_id(id).await.unwrap().is_none());
        assert!(matches!(
            store.update(id, DealPatch::stage(Stage::Lead)).await,
            Err(StoreError::NotFound { table: "deal", .. })
        ));
        assert!(matches!(
            store.delete(id).await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn clones_share_state() {
        let store = InMemoryStore::<Deal>::new();
        let handle = store.clone();
        handle
            .create(NewDeal::new("Shared", 1, Stage::Lead))
            .await
            .unwrap();
        assert_eq!(store.len(), 1);
    }
}
