//! Lifecycle operations over a [`Storer`] and a [`RevisionChain`].
//!
//! Every operation works on its own copy of the record. Writes to the
//! revision chain, the primary record and the slug index are separate store
//! calls with no transaction around them: the chain append always happens
//! before the record write, so a failure in between leaves the chain one
//! block ahead of the record's `rev` (see [`CollectionEngine::verify`]).

mod delete;
mod load;
mod write;

pub use load::{LoadOptions, RevisionStatus};

use std::sync::Arc;

use kek_revchain::{DynRevisionChain, RevisionChain, StoreChain, now_wallclock_ns};
use kek_store::{DynStorer, Storer, StorerExt};

use crate::id::mint_id;
use crate::model::{Collection, NewCollection, normalize_resource_ids};
use crate::slug::SlugGenerator;
use crate::{CollectionError, CollectionResult, EngineConfig};

/// Owns the collection lifecycle. Cheap to clone; clones share collaborators.
#[derive(Clone)]
pub struct CollectionEngine {
    store: DynStorer,
    chain: DynRevisionChain,
    config: Arc<EngineConfig>,
}

impl std::fmt::Debug for CollectionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CollectionEngine {
    pub fn new(store: DynStorer, chain: DynRevisionChain) -> Self {
        Self::with_config(store, chain, EngineConfig::default())
    }

    pub fn with_config(store: DynStorer, chain: DynRevisionChain, config: EngineConfig) -> Self {
        Self {
            store,
            chain,
            config: Arc::new(config),
        }
    }

    /// Engine whose revision chains are kept in `store` next to the records.
    pub fn open(store: DynStorer, config: EngineConfig) -> Self {
        let chain = Arc::new(StoreChain::new(store.clone(), config.collection_path.clone()));
        Self::with_config(store, chain, config)
    }

    pub fn store(&self) -> &dyn Storer {
        self.store.as_ref()
    }

    pub fn chain(&self) -> &dyn RevisionChain {
        self.chain.as_ref()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub(crate) fn slugs(&self) -> SlugGenerator<'_> {
        SlugGenerator::new(self.store.as_ref(), &self.config)
    }

    /// Create a collection: mint its id, start its revision chain, reserve a
    /// slug and write the record.
    ///
    /// A failure after the slug reservation leaves that index entry behind.
    pub async fn create(&self, new: NewCollection) -> CollectionResult<Collection> {
        let NewCollection {
            name,
            description,
            slug,
            mut resource_ids,
        } = new;
        normalize_resource_ids(&mut resource_ids);

        let now = now_wallclock_ns();
        let mut col = Collection {
            id: mint_id(&self.config.id_prefix),
            name,
            description,
            resource_ids,
            created_at_ns: now,
            updated_at_ns: now,
            ..Collection::default()
        };

        let genesis = kek_cbor::to_canonical_cbor(&col)?;
        let chain = self
            .chain
            .create(&col.id, genesis)
            .await
            .map_err(CollectionError::chain("start revisions", &col.id))?;
        col.rev = chain.hash_string().to_string();

        let preferred = slug
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(Some(col.name.as_str()).filter(|s| !s.is_empty()));
        col.slug = self.slugs().generate(preferred, Some(&col.id)).await?;
        self.slugs().reserve(&col.slug, &col.id).await?;

        self.write_record(&col).await?;
        tracing::info!(id = %col.id, slug = %col.slug, "collection created");
        Ok(col)
    }

    /// Persist `col` as the new state of its collection: append a revision
    /// carrying the record, refresh `updated_at_ns`, then write the record.
    ///
    /// The slug index is left untouched, so the stored slug is kept whatever
    /// `col.slug` says; slug changes go through [`Self::patch`] or
    /// [`Self::replace`].
    pub async fn save(&self, col: Collection) -> CollectionResult<Collection> {
        if col.id.is_empty() {
            return Err(CollectionError::Invalid("collection has no id".into()));
        }
        let stored = self.read_record(&col.id).await?;
        let mut col = col.persisted();
        if col.slug != stored.slug {
            tracing::debug!(id = %col.id, requested = %col.slug, kept = %stored.slug, "save ignores slug change");
            col.slug = stored.slug;
        }
        col.touch(now_wallclock_ns());
        let payload = kek_cbor::to_canonical_cbor(&col)?;
        self.commit(col, payload).await
    }

    /// Append `payload` as the next revision of `col`, record the block hash
    /// as `rev` and write the record. The caller has already refreshed
    /// `updated_at_ns`.
    pub(crate) async fn commit(
        &self,
        mut col: Collection,
        payload: Vec<u8>,
    ) -> CollectionResult<Collection> {
        let block = self
            .chain
            .add_block(&col.id, payload)
            .await
            .map_err(CollectionError::chain("append revision", &col.id))?;
        col.rev = block.hash;
        self.write_record(&col).await?;
        tracing::debug!(id = %col.id, rev = %col.rev, index = block.index, "collection saved");
        Ok(col)
    }

    pub(crate) async fn write_record(&self, col: &Collection) -> CollectionResult<()> {
        let path = self.config.record_path(&col.id);
        self.store
            .save_record(&path, &col.persisted())
            .await
            .map_err(CollectionError::store("save record", &path))
    }

    /// Load the stored record without hydration.
    pub(crate) async fn read_record(&self, id: &str) -> CollectionResult<Collection> {
        let path = self.config.record_path(id);
        match self.store.load_record::<Collection>(&path).await {
            Ok(col) => Ok(col),
            Err(err) if err.is_not_found() => Err(CollectionError::NotFound {
                what: "collection",
                key: id.to_string(),
            }),
            Err(err) => Err(CollectionError::store("load record", &path)(err)),
        }
    }
}
