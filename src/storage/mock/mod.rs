//! In-memory repository for testing.

use std::collections::{HashMap, HashSet};
use std::marker::PhantomData;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::helpers::{apply_list_options, matches};
use crate::interfaces::repository::{Repository, Result, StorageError};
use crate::model::{Entity, FilterOptions, Index, ListOptions};

/// Stored entity with insertion order, so unsorted listings are stable.
struct StoredEntity<T> {
    seq: u64,
    entity: T,
}

/// Mock repository that stores one entity kind in memory.
///
/// Failure injection covers whole operations (`set_fail_on_*`) and single
/// keys (`fail_delete_for`), so partial-failure paths can be exercised.
pub struct MemoryRepository<T: Entity> {
    entities: RwLock<HashMap<String, StoredEntity<T>>>,
    next_seq: RwLock<u64>,
    fail_on_get: RwLock<bool>,
    fail_on_list: RwLock<bool>,
    fail_on_put: RwLock<bool>,
    fail_on_delete: RwLock<bool>,
    fail_delete_keys: RwLock<HashSet<String>>,
    _kind: PhantomData<T>,
}

impl<T: Entity> Default for MemoryRepository<T> {
    fn default() -> Self {
        Self {
            entities: RwLock::new(HashMap::new()),
            next_seq: RwLock::new(0),
            fail_on_get: RwLock::new(false),
            fail_on_list: RwLock::new(false),
            fail_on_put: RwLock::new(false),
            fail_on_delete: RwLock::new(false),
            fail_delete_keys: RwLock::new(HashSet::new()),
            _kind: PhantomData,
        }
    }
}

impl<T: Entity> MemoryRepository<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail_on_get(&self, fail: bool) {
        *self.fail_on_get.write().await = fail;
    }

    pub async fn set_fail_on_list(&self, fail: bool) {
        *self.fail_on_list.write().await = fail;
    }

    pub async fn set_fail_on_put(&self, fail: bool) {
        *self.fail_on_put.write().await = fail;
    }

    pub async fn set_fail_on_delete(&self, fail: bool) {
        *self.fail_on_delete.write().await = fail;
    }

    /// Make `delete` of this primary key fail with an infrastructure error.
    pub async fn fail_delete_for(&self, key: impl Into<String>) {
        self.fail_delete_keys.write().await.insert(key.into());
    }

    pub async fn stored_count(&self) -> usize {
        self.entities.read().await.len()
    }

    fn not_found(key: &str) -> StorageError {
        StorageError::NotFound {
            kind: T::KIND,
            key: key.to_string(),
        }
    }

    async fn snapshot(&self) -> Vec<T> {
        let store = self.entities.read().await;
        let mut stored: Vec<&StoredEntity<T>> = store.values().collect();
        stored.sort_by_key(|s| s.seq);
        stored.into_iter().map(|s| s.entity.clone()).collect()
    }
}

fn is_unset(time: &DateTime<Utc>) -> bool {
    *time == DateTime::<Utc>::default()
}

#[async_trait]
impl<T: Entity> Repository<T> for MemoryRepository<T> {
    async fn get(&self, key: &str) -> Result<T> {
        if *self.fail_on_get.read().await {
            return Err(StorageError::Unavailable("injected get failure".to_string()));
        }
        self.entities
            .read()
            .await
            .get(key)
            .map(|s| s.entity.clone())
            .ok_or_else(|| Self::not_found(key))
    }

    async fn add(&self, entity: &mut T) -> Result<()> {
        let key = entity.primary_key();
        let mut store = self.entities.write().await;
        if store.contains_key(&key) {
            return Err(StorageError::AlreadyExists { kind: T::KIND, key });
        }

        let now = Utc::now();
        let base = entity.base_mut();
        if is_unset(&base.create_time) {
            base.create_time = now;
        }
        base.update_time = now;

        let mut next_seq = self.next_seq.write().await;
        store.insert(
            key,
            StoredEntity {
                seq: *next_seq,
                entity: entity.clone(),
            },
        );
        *next_seq += 1;
        Ok(())
    }

    async fn put(&self, entity: &mut T) -> Result<()> {
        if *self.fail_on_put.read().await {
            return Err(StorageError::Unavailable("injected put failure".to_string()));
        }
        let key = entity.primary_key();
        let mut store = self.entities.write().await;
        let stored = store.get_mut(&key).ok_or_else(|| Self::not_found(&key))?;

        let base = entity.base_mut();
        if is_unset(&base.create_time) {
            base.create_time = stored.entity.base().create_time;
        }
        base.update_time = Utc::now();
        stored.entity = entity.clone();
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        if *self.fail_on_delete.read().await || self.fail_delete_keys.read().await.contains(key) {
            return Err(StorageError::Unavailable(format!(
                "injected delete failure for {}",
                key
            )));
        }
        self.entities
            .write()
            .await
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| Self::not_found(key))
    }

    async fn list(&self, filter: &Index, options: &ListOptions) -> Result<Vec<T>> {
        if *self.fail_on_list.read().await {
            return Err(StorageError::Unavailable("injected list failure".to_string()));
        }
        Ok(apply_list_options(self.snapshot().await, filter, options))
    }

    async fn count(&self, filter: &Index, options: Option<&FilterOptions>) -> Result<u64> {
        if *self.fail_on_list.read().await {
            return Err(StorageError::Unavailable("injected count failure".to_string()));
        }
        let store = self.entities.read().await;
        Ok(store
            .values()
            .filter(|s| matches(&s.entity, filter, options))
            .count() as u64)
    }
}

#[cfg(test)]
mod tests;
