use std::collections::BTreeMap;

use futures::future::{join_all, try_join_all};
use kek_revchain::{CHAIN_SUFFIX, Chain};
use kek_store::StorerExt;

use super::CollectionEngine;
use crate::id::{ResourceKind, decode_id_time};
use crate::model::{Collection, Doc};
use crate::{CollectionError, CollectionResult};

/// What to attach to a loaded collection besides the stored record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Resolve `resource_ids` into `docs` and `collections`.
    pub with_resources: bool,
    /// Attach the revision chain as `revisions`.
    pub with_revisions: bool,
}

impl LoadOptions {
    pub fn record_only() -> Self {
        Self::default()
    }

    pub fn full() -> Self {
        Self {
            with_resources: true,
            with_revisions: true,
        }
    }
}

/// Whether a record's `rev` matches its chain tail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevisionStatus {
    InSync { rev: String, blocks: usize },
    /// The chain has blocks the record never saw, e.g. after a failed save.
    RecordBehind { record_rev: String, chain_rev: String },
}

enum Resolved {
    Doc(String, Doc),
    Collection(String, Collection),
    Skipped,
}

impl CollectionEngine {
    /// Load a collection by id, optionally hydrating resources and revisions.
    ///
    /// Hydration is best-effort: a resource that cannot be read is left out
    /// and logged, it never fails the load.
    pub async fn load_by_id(&self, id: &str, opts: LoadOptions) -> CollectionResult<Collection> {
        let mut col = self.read_record(id).await?;
        if opts.with_resources {
            self.hydrate(&mut col).await;
        }
        if opts.with_revisions {
            col.revisions = Some(self.history(id).await?);
        }
        Ok(col)
    }

    /// Load the collection registered under `slug`. When the index holds more
    /// than one owner, the earliest-created id wins.
    pub async fn load_by_slug(&self, slug: &str, opts: LoadOptions) -> CollectionResult<Collection> {
        let not_found = || CollectionError::NotFound {
            what: "slug",
            key: slug.to_string(),
        };
        if slug.is_empty() || slug.contains('/') || matches!(slug, "." | "..") {
            return Err(not_found());
        }
        let dir = self.config.slug_dir(slug);
        let owners = self
            .store
            .list(&dir)
            .await
            .map_err(CollectionError::store("list slug owners", &dir))?;
        let earliest = owners
            .iter()
            .filter_map(|id| decode_id_time(id).map(|ms| (ms, id)))
            .min()
            .map(|(_, id)| id.clone())
            .ok_or_else(not_found)?;
        if owners.len() > 1 {
            tracing::debug!(slug, owners = owners.len(), chosen = %earliest, "slug shared by several ids");
        }
        self.load_by_id(&earliest, opts).await
    }

    /// Every collection in the store, keyed by id. One failed load fails the
    /// whole enumeration.
    pub async fn all(&self, opts: LoadOptions) -> CollectionResult<BTreeMap<String, Collection>> {
        let namespace = self.config.collection_path.clone();
        let names = self
            .store
            .list(&namespace)
            .await
            .map_err(CollectionError::store("list collections", &namespace))?;
        let ids: Vec<&String> = names
            .iter()
            .filter(|name| name.starts_with(&self.config.id_prefix) && !name.ends_with(CHAIN_SUFFIX))
            .collect();
        let loaded = try_join_all(ids.iter().map(|id| self.load_by_id(id, opts))).await?;
        Ok(loaded.into_iter().map(|col| (col.id.clone(), col)).collect())
    }

    /// Full revision chain of a collection.
    pub async fn history(&self, id: &str) -> CollectionResult<Chain> {
        self.chain
            .load(id)
            .await
            .map_err(CollectionError::chain("load revisions", id))
    }

    /// Check the chain's integrity and compare its tail with the record's `rev`.
    pub async fn verify(&self, id: &str) -> CollectionResult<RevisionStatus> {
        let col = self.read_record(id).await?;
        let chain = self.history(id).await?;
        chain
            .verify()
            .map_err(CollectionError::chain("verify revisions", id))?;
        let chain_rev = chain.hash_string().to_string();
        if chain_rev == col.rev {
            Ok(RevisionStatus::InSync {
                rev: chain_rev,
                blocks: chain.len(),
            })
        } else {
            tracing::warn!(id, record_rev = %col.rev, chain_rev = %chain_rev, "record lags its revision chain");
            Ok(RevisionStatus::RecordBehind {
                record_rev: col.rev,
                chain_rev,
            })
        }
    }

    async fn hydrate(&self, col: &mut Collection) {
        let lookups = col
            .resource_ids
            .keys()
            .map(|resource_id| self.resolve(resource_id.clone()));
        let mut docs = BTreeMap::new();
        let mut collections = BTreeMap::new();
        for resolved in join_all(lookups).await {
            match resolved {
                Resolved::Doc(id, doc) => {
                    docs.insert(id, doc);
                }
                Resolved::Collection(id, nested) => {
                    collections.insert(id, nested);
                }
                Resolved::Skipped => {}
            }
        }
        col.docs = docs;
        col.collections = collections;
    }

    async fn resolve(&self, resource_id: String) -> Resolved {
        match self.config.resource_kind(&resource_id) {
            ResourceKind::Collection => match self.read_record(&resource_id).await {
                Ok(nested) => Resolved::Collection(resource_id, nested),
                Err(err) => {
                    tracing::warn!(resource = %resource_id, error = %err, "skipping unresolvable collection");
                    Resolved::Skipped
                }
            },
            ResourceKind::Doc => {
                let path = self.config.doc_record_path(&resource_id);
                match self.store.load_record::<Doc>(&path).await {
                    Ok(doc) => Resolved::Doc(resource_id, doc),
                    Err(err) => {
                        tracing::warn!(resource = %resource_id, error = %err, "skipping unresolvable document");
                        Resolved::Skipped
                    }
                }
            }
            ResourceKind::Other => Resolved::Skipped,
        }
    }
}
