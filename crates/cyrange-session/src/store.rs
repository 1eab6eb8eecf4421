//! Mutex-guarded session store with the pending-id set.
//!
//! The backend re-serializes the whole record set on every save, so any
//! read-modify-write must hold the lock from load to save or updates are
//! lost. Every public method here is one such critical section. The set
//! of ids reserved by in-flight workflows sits behind the same lock, which
//! makes "observe free ids" and "reserve one" a single atomic step.

use std::{collections::BTreeSet, sync::Arc};

use cyrange_core::{
    AllocationError, RangeId, Session, SessionStorage, StorageError, allocate,
};
use thiserror::Error;
use tokio::sync::Mutex;

/// Session store error.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Allocation(#[from] AllocationError),
    #[error("Range id {0} is already recorded")]
    Duplicate(RangeId),
}

/// Working copy of the store inside one critical section.
pub struct Transaction<'a> {
    sessions: Vec<Session>,
    pending: &'a mut BTreeSet<RangeId>,
    dirty: bool,
}

impl Transaction<'_> {
    /// Persisted sessions as loaded.
    #[must_use]
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    /// Ids reserved but not yet committed.
    #[must_use]
    pub fn pending(&self) -> &BTreeSet<RangeId> {
        &*self.pending
    }

    /// Mutable access to the sessions; marks the transaction for saving.
    pub fn sessions_mut(&mut self) -> &mut Vec<Session> {
        self.dirty = true;
        &mut self.sessions
    }

    /// Mutable access to the pending set. Pending ids are never persisted.
    pub fn pending_mut(&mut self) -> &mut BTreeSet<RangeId> {
        &mut *self.pending
    }
}

/// Durable session store.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn SessionStorage>,
    pending: Arc<Mutex<BTreeSet<RangeId>>>,
}

impl SessionStore {
    /// Create a store over a storage backend.
    #[must_use]
    pub fn new(storage: impl SessionStorage + 'static) -> Self {
        Self::from_arc(Arc::new(storage))
    }

    /// Create a store over a shared storage backend.
    #[must_use]
    pub fn from_arc(storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            storage,
            pending: Arc::new(Mutex::new(BTreeSet::new())),
        }
    }

    /// Run `f` as one load-modify-save critical section.
    ///
    /// The record set is saved only if `f` succeeded and touched it.
    ///
    /// # Errors
    /// Returns error if loading or saving fails, or whatever `f` returns.
    pub async fn transaction<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Transaction<'_>) -> Result<T, StoreError>,
    {
        let mut pending = self.pending.lock().await;
        let sessions = self.storage.load().await?;
        let mut txn = Transaction {
            sessions,
            pending: &mut *pending,
            dirty: false,
        };

        let value = f(&mut txn)?;

        if txn.dirty {
            self.storage.save(&txn.sessions).await?;
        }
        Ok(value)
    }

    /// Load every session.
    ///
    /// # Errors
    /// Returns error if the backend is unreadable or corrupt.
    pub async fn load(&self) -> Result<Vec<Session>, StoreError> {
        self.transaction(|txn| Ok(txn.sessions().to_vec())).await
    }

    /// Replace every session.
    ///
    /// # Errors
    /// Returns error if the backend cannot be written.
    pub async fn save(&self, sessions: Vec<Session>) -> Result<(), StoreError> {
        let _guard = self.pending.lock().await;
        self.storage.save(&sessions).await?;
        Ok(())
    }

    /// Append a session.
    ///
    /// # Errors
    /// Returns [`StoreError::Duplicate`] if the id is already recorded.
    pub async fn add(&self, session: Session) -> Result<(), StoreError> {
        self.transaction(|txn| insert(txn, session)).await
    }

    /// Remove the session on `id` owned by `owner`.
    ///
    /// Returns whether a record was removed.
    ///
    /// # Errors
    /// Returns error if the backend fails.
    pub async fn remove(&self, id: RangeId, owner: &str) -> Result<bool, StoreError> {
        self.transaction(|txn| {
            let Some(index) = txn.sessions().iter().position(|s| s.matches(id, owner)) else {
                return Ok(false);
            };
            txn.sessions_mut().remove(index);
            Ok(true)
        })
        .await
    }

    /// Remove the session on `id` owned by `owner` that carries `activity_id`.
    ///
    /// Returns whether a record was removed.
    ///
    /// # Errors
    /// Returns error if the backend fails.
    pub async fn remove_activity(
        &self,
        id: RangeId,
        owner: &str,
        activity_id: &str,
    ) -> Result<bool, StoreError> {
        self.transaction(|txn| {
            let Some(index) = txn.sessions().iter().position(|s| {
                s.matches(id, owner) && s.activity_ids.iter().any(|a| a == activity_id)
            }) else {
                return Ok(false);
            };
            txn.sessions_mut().remove(index);
            Ok(true)
        })
        .await
    }

    /// Whether any session uses `id`.
    ///
    /// # Errors
    /// Returns error if the backend fails.
    pub async fn exists(&self, id: RangeId) -> Result<bool, StoreError> {
        self.transaction(|txn| Ok(txn.sessions().iter().any(|s| s.id == id)))
            .await
    }

    /// Whether `owner` has a session on `id`.
    ///
    /// # Errors
    /// Returns error if the backend fails.
    pub async fn exists_for_owner(&self, id: RangeId, owner: &str) -> Result<bool, StoreError> {
        self.transaction(|txn| Ok(txn.sessions().iter().any(|s| s.matches(id, owner))))
            .await
    }

    /// Activity ids of the session on `id` owned by `owner`, if it exists.
    ///
    /// # Errors
    /// Returns error if the backend fails.
    pub async fn activity_ids_for(
        &self,
        id: RangeId,
        owner: &str,
    ) -> Result<Option<Vec<String>>, StoreError> {
        self.transaction(|txn| {
            let mut found = txn
                .sessions()
                .iter()
                .filter(|s| s.matches(id, owner))
                .peekable();
            if found.peek().is_none() {
                return Ok(None);
            }
            Ok(Some(
                found.flat_map(|s| s.activity_ids.iter().cloned()).collect(),
            ))
        })
        .await
    }

    /// Sessions owned by `owner`, in stored order.
    ///
    /// # Errors
    /// Returns error if the backend fails.
    pub async fn sessions_for_owner(&self, owner: &str) -> Result<Vec<Session>, StoreError> {
        self.transaction(|txn| {
            Ok(txn
                .sessions()
                .iter()
                .filter(|s| s.owner == owner)
                .cloned()
                .collect())
        })
        .await
    }

    /// Allocate a range id from `[1, max]` and add it to the pending set.
    ///
    /// # Errors
    /// Returns [`StoreError::Allocation`] when the pool is exhausted; the
    /// pending set is left untouched in that case.
    pub async fn reserve(&self, max: u32) -> Result<RangeId, StoreError> {
        self.transaction(|txn| {
            let id = allocate(
                txn.sessions().iter().map(|s| s.id),
                txn.pending().iter().copied(),
                max,
            )?;
            txn.pending_mut().insert(id);
            Ok(id)
        })
        .await
    }

    /// Drop a reservation. Returns whether the id was pending.
    pub async fn release(&self, id: RangeId) -> bool {
        self.pending.lock().await.remove(&id)
    }

    /// Turn a reservation into a persisted session.
    ///
    /// The reservation is dropped even if persisting fails.
    ///
    /// # Errors
    /// Returns error if the backend fails or the id is already recorded.
    pub async fn commit(&self, session: Session) -> Result<(), StoreError> {
        let id = session.id;
        let result = self
            .transaction(|txn| {
                txn.pending_mut().remove(&id);
                insert(txn, session)
            })
            .await;
        if result.is_err() {
            self.release(id).await;
        }
        result
    }

    /// Ids currently reserved.
    pub async fn pending_ids(&self) -> Vec<RangeId> {
        self.pending.lock().await.iter().copied().collect()
    }
}

fn insert(txn: &mut Transaction<'_>, session: Session) -> Result<(), StoreError> {
    if txn.sessions().iter().any(|s| s.id == session.id) {
        return Err(StoreError::Duplicate(session.id));
    }
    txn.sessions_mut().push(session);
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::storage::MemoryStorage;

    fn id(v: u32) -> RangeId {
        RangeId::new(v).unwrap()
    }

    fn session(v: u32, owner: &str, activities: &[&str]) -> Session {
        Session {
            name: Session::display_name(id(v)),
            id: id(v),
            owner: owner.to_string(),
            created_at: Utc::now(),
            training_type: "Scenario-Based Training".into(),
            scenarios: vec!["Incident Response".into()],
            levels: vec!["Level 1 (Easy)".into()],
            language: "en".into(),
            instance_count: 1,
            activity_ids: activities.iter().map(ToString::to_string).collect(),
        }
    }

    #[tokio::test]
    async fn test_add_exists_remove() {
        let store = SessionStore::new(MemoryStorage::new());
        tokio_test::assert_ok!(store.add(session(1, "alice", &["a1"])).await);

        assert!(store.exists(id(1)).await.unwrap());
        assert!(store.exists_for_owner(id(1), "alice").await.unwrap());
        assert!(!store.exists_for_owner(id(1), "bob").await.unwrap());
        assert!(!store.exists(id(2)).await.unwrap());

        assert!(!store.remove(id(1), "bob").await.unwrap());
        assert!(store.remove(id(1), "alice").await.unwrap());
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let store = SessionStore::new(MemoryStorage::new());
        store.add(session(1, "alice", &[])).await.unwrap();
        assert!(matches!(
            store.add(session(1, "bob", &[])).await,
            Err(StoreError::Duplicate(_))
        ));
    }

    #[tokio::test]
    async fn test_activity_ids_and_remove_activity() {
        let store = SessionStore::new(MemoryStorage::new());
        store.add(session(2, "alice", &["a1", "a2"])).await.unwrap();

        assert_eq!(
            store.activity_ids_for(id(2), "alice").await.unwrap(),
            Some(vec!["a1".to_string(), "a2".to_string()])
        );
        assert_eq!(store.activity_ids_for(id(2), "bob").await.unwrap(), None);

        assert!(!store.remove_activity(id(2), "alice", "zz").await.unwrap());
        assert!(store.remove_activity(id(2), "alice", "a2").await.unwrap());
        assert!(!store.exists(id(2)).await.unwrap());
    }

    #[tokio::test]
    async fn test_sessions_for_owner() {
        let store = SessionStore::new(MemoryStorage::new());
        store.add(session(1, "alice", &[])).await.unwrap();
        store.add(session(2, "bob", &[])).await.unwrap();
        store.add(session(3, "alice", &[])).await.unwrap();

        let ids: Vec<u32> = store
            .sessions_for_owner("alice")
            .await
            .unwrap()
            .iter()
            .map(|s| s.id.get())
            .collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_reserve_release_commit() {
        let store = SessionStore::new(MemoryStorage::with_sessions(vec![
            session(1, "alice", &[]),
            session(3, "alice", &[]),
        ]));

        let first = store.reserve(5).await.unwrap();
        assert_eq!(first, id(4));
        let second = store.reserve(5).await.unwrap();
        assert_eq!(second, id(5));
        assert_eq!(store.pending_ids().await, vec![id(4), id(5)]);

        assert!(store.release(first).await);
        assert!(!store.release(first).await);

        store.commit(session(5, "bob", &[])).await.unwrap();
        assert!(store.pending_ids().await.is_empty());
        assert!(store.exists_for_owner(id(5), "bob").await.unwrap());

        // 1, 3, 5 taken and 5 is the top of the pool: lowest free id wins.
        assert_eq!(store.reserve(5).await.unwrap(), id(2));
    }

    #[tokio::test]
    async fn test_exhausted_reservation_leaves_pending_untouched() {
        let store = SessionStore::new(MemoryStorage::with_sessions(vec![session(1, "a", &[])]));
        let reserved = store.reserve(2).await.unwrap();
        assert!(matches!(
            store.reserve(2).await,
            Err(StoreError::Allocation(AllocationError::Exhausted { max: 2 }))
        ));
        assert_eq!(store.pending_ids().await, vec![reserved]);
    }

    #[tokio::test]
    async fn test_concurrent_reservations_are_distinct() {
        let store = SessionStore::new(MemoryStorage::new());
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.reserve(16).await.unwrap() })
            })
            .collect();

        let mut ids = BTreeSet::new();
        for handle in handles {
            assert!(ids.insert(handle.await.unwrap()));
        }
        assert_eq!(ids.len(), 16);
    }

    #[tokio::test]
    async fn test_failed_transaction_does_not_save() {
        let store = SessionStore::new(MemoryStorage::new());
        let result: Result<(), StoreError> = store
            .transaction(|txn| {
                txn.sessions_mut().push(session(9, "alice", &[]));
                Err(StoreError::Duplicate(id(9)))
            })
            .await;
        assert!(result.is_err());
        assert!(store.load().await.unwrap().is_empty());
    }
}
