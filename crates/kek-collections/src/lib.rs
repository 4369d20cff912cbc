//! Collections: named, slug-addressable groupings of resource references
//! with a hash-linked revision history.
//!
//! [`CollectionEngine`] keeps three stores in step: the primary record at
//! `c/<id>`, the slug index at `slugs/<slug>/<id>`, and the revision chain
//! owned by the collection id. None of these writes are transactional;
//! partial failures are reported, not rolled back.
//!
//! ```ignore
//! let store: DynStorer = Arc::new(MemStore::new());
//! let engine = CollectionEngine::open(store, EngineConfig::default());
//! let col = engine
//!     .create(NewCollection::named("Reading list").resource("dd01", true))
//!     .await?;
//! let same = engine.load_by_slug(&col.slug, LoadOptions::default()).await?;
//! ```

pub mod config;
mod engine;
mod error;
pub mod id;
pub mod model;
pub mod slug;

pub use config::EngineConfig;
pub use engine::{CollectionEngine, LoadOptions, RevisionStatus};
pub use error::{CollectionError, CollectionResult, DeleteTarget, ErrorKind};
pub use model::{Collection, CollectionPatch, Doc, NewCollection, ResourceIds};
pub use kek_revchain::{Block, Chain};
