use crate::{StoreError, StoreResult, Storer, dir_prefix, validate_key};
use async_trait::async_trait;
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{Arc, PoisonError, RwLock},
};

/// In-process store backed by an ordered map; clones share the same data.
#[derive(Clone, Default)]
pub struct MemStore {
    entries: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl std::fmt::Debug for MemStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemStore")
            .field("entries", &self.len())
            .finish()
    }
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every key currently held, in order.
    pub fn keys(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.read().contains_key(path)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<String, Vec<u8>>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, BTreeMap<String, Vec<u8>>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Storer for MemStore {
    async fn save(&self, path: &str, bytes: Vec<u8>) -> StoreResult<()> {
        validate_key(path)?;
        self.write().insert(path.to_string(), bytes);
        Ok(())
    }

    async fn load(&self, path: &str) -> StoreResult<Vec<u8>> {
        validate_key(path)?;
        self.read()
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                path: path.to_string(),
            })
    }

    async fn delete(&self, path: &str) -> StoreResult<()> {
        validate_key(path)?;
        match self.write().remove(path) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound {
                path: path.to_string(),
            }),
        }
    }

    async fn list(&self, prefix: &str) -> StoreResult<BTreeSet<String>> {
        let prefix = dir_prefix(prefix);
        let guard = self.read();
        let children = guard
            .range(prefix.clone()..)
            .map(|(key, _)| key)
            .take_while(|key| key.starts_with(&prefix))
            .filter_map(|key| key[prefix.len()..].split('/').next())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();
        Ok(children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StorerExt;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Dummy {
        name: String,
        counter: u64,
    }

    #[tokio::test]
    async fn record_round_trip() {
        let store = MemStore::new();
        let value = Dummy {
            name: "demo".into(),
            counter: 42,
        };
        store.save_record("c/cc1", &value).await.unwrap();
        let loaded: Dummy = store.load_record("c/cc1").await.unwrap();
        assert_eq!(value, loaded);
        assert!(store.exists("c/cc1").await.unwrap());
        assert!(!store.exists("c/cc2").await.unwrap());
    }

    #[tokio::test]
    async fn missing_keys_report_not_found() {
        let store = MemStore::new();
        assert!(store.load("c/nope").await.unwrap_err().is_not_found());
        assert!(store.delete("c/nope").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn list_returns_immediate_children() {
        let store = MemStore::new();
        for key in [
            "c/cc1",
            "c/cc1.kek",
            "c/cc2",
            "slugs/alpha/cc1",
            "slugs/alpha/cc3",
            "slugs/alphabet/cc2",
        ] {
            store.save(key, Vec::new()).await.unwrap();
        }

        let cols = store.list("c/").await.unwrap();
        assert_eq!(
            cols.into_iter().collect::<Vec<_>>(),
            vec!["cc1", "cc1.kek", "cc2"]
        );

        let alpha = store.list("slugs/alpha").await.unwrap();
        assert_eq!(alpha.into_iter().collect::<Vec<_>>(), vec!["cc1", "cc3"]);

        let slugs = store.list("slugs").await.unwrap();
        assert_eq!(
            slugs.into_iter().collect::<Vec<_>>(),
            vec!["alpha", "alphabet"]
        );

        assert!(store.list("slugs/beta").await.unwrap().is_empty());
    }
}
