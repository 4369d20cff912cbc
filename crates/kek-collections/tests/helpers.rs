#![allow(dead_code)]

use std::collections::BTreeSet;
use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use kek_collections::{CollectionEngine, EngineConfig, ResourceIds};
use kek_store::{MemStore, StoreError, StoreResult, Storer};

pub fn mem_engine() -> (CollectionEngine, MemStore) {
    let store = MemStore::new();
    let engine = CollectionEngine::open(Arc::new(store.clone()), EngineConfig::default());
    (engine, store)
}

pub fn faulty_engine() -> (CollectionEngine, FaultyStore) {
    let store = FaultyStore::default();
    let engine = CollectionEngine::open(Arc::new(store.clone()), EngineConfig::default());
    (engine, store)
}

pub fn ids(entries: &[(&str, bool)]) -> ResourceIds {
    entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

/// Keys of `store` that start with `prefix`.
pub fn keys_under(store: &MemStore, prefix: &str) -> Vec<String> {
    store
        .keys()
        .into_iter()
        .filter(|key| key.starts_with(prefix))
        .collect()
}

/// `MemStore` that fails saves or deletes on configured paths. A rule ending
/// in `/` matches everything below it, any other rule one exact path.
#[derive(Clone, Default)]
pub struct FaultyStore {
    pub inner: MemStore,
    failing_saves: Arc<Mutex<Vec<String>>>,
    failing_deletes: Arc<Mutex<Vec<String>>>,
}

impl FaultyStore {
    pub fn fail_saves_at(&self, rule: &str) {
        self.failing_saves.lock().unwrap().push(rule.to_string());
    }

    pub fn fail_deletes_at(&self, rule: &str) {
        self.failing_deletes.lock().unwrap().push(rule.to_string());
    }

    fn check(rules: &Mutex<Vec<String>>, path: &str) -> StoreResult<()> {
        let hit = rules.lock().unwrap().iter().any(|rule| {
            if rule.ends_with('/') {
                path.starts_with(rule.as_str())
            } else {
                path == rule
            }
        });
        if hit {
            return Err(StoreError::Io {
                path: path.into(),
                source: io::Error::other("injected fault"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Storer for FaultyStore {
    async fn save(&self, path: &str, bytes: Vec<u8>) -> StoreResult<()> {
        Self::check(&self.failing_saves, path)?;
        self.inner.save(path, bytes).await
    }

    async fn load(&self, path: &str) -> StoreResult<Vec<u8>> {
        self.inner.load(path).await
    }

    async fn delete(&self, path: &str) -> StoreResult<()> {
        Self::check(&self.failing_deletes, path)?;
        self.inner.delete(path).await
    }

    async fn list(&self, prefix: &str) -> StoreResult<BTreeSet<String>> {
        self.inner.list(prefix).await
    }
}
