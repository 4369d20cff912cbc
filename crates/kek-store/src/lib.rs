//! Path-addressed record storage with filesystem and in-memory backends.
//!
//! Keys are `/`-separated strings such as `c/<id>` or `slugs/<slug>/<id>`.
//! Values are opaque bytes; [`StorerExt`] layers canonical CBOR records on top.

mod fs_store;
mod mem_store;

pub use fs_store::FsStore;
pub use mem_store::MemStore;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use std::{collections::BTreeSet, io, path::PathBuf, sync::Arc};

pub type StoreResult<T> = Result<T, StoreError>;
pub type DynStorer = Arc<dyn Storer>;

/// Key/value persistence used by the revision chain and the collection engine.
///
/// Implementations must be safe to call concurrently from several tasks.
#[async_trait]
pub trait Storer: Send + Sync {
    /// Create or overwrite the value at `path`.
    async fn save(&self, path: &str, bytes: Vec<u8>) -> StoreResult<()>;

    /// Read the value at `path`, failing with [`StoreError::NotFound`] if absent.
    async fn load(&self, path: &str) -> StoreResult<Vec<u8>>;

    /// Remove the value at `path`, failing with [`StoreError::NotFound`] if absent.
    async fn delete(&self, path: &str) -> StoreResult<()>;

    /// Names of the immediate children below `prefix`. An unknown prefix
    /// yields an empty set.
    async fn list(&self, prefix: &str) -> StoreResult<BTreeSet<String>>;
}

/// Typed record helpers available on every [`Storer`].
#[async_trait]
pub trait StorerExt: Storer {
    async fn save_record<T>(&self, path: &str, record: &T) -> StoreResult<()>
    where
        T: Serialize + Sync,
    {
        let bytes = kek_cbor::to_canonical_cbor(record)?;
        self.save(path, bytes).await
    }

    async fn load_record<T>(&self, path: &str) -> StoreResult<T>
    where
        T: DeserializeOwned + Send,
    {
        let bytes = self.load(path).await?;
        Ok(kek_cbor::from_cbor(&bytes)?)
    }

    async fn exists(&self, path: &str) -> StoreResult<bool> {
        match self.load(path).await {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }
}

impl<S: Storer + ?Sized> StorerExt for S {}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("no record at '{path}'")]
    NotFound { path: String },
    #[error("invalid store path '{path}': {reason}")]
    InvalidPath { path: String, reason: &'static str },
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("CBOR serialization error: {0}")]
    Cbor(#[from] serde_cbor::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

pub(crate) fn io_error(path: impl Into<PathBuf>, err: io::Error) -> StoreError {
    StoreError::Io {
        path: path.into(),
        source: err,
    }
}

/// Reject keys that are empty, absolute, contain empty segments or `..`.
pub(crate) fn validate_key(path: &str) -> StoreResult<()> {
    let invalid = |reason| {
        Err(StoreError::InvalidPath {
            path: path.to_string(),
            reason,
        })
    };
    if path.is_empty() {
        return invalid("empty key");
    }
    for segment in path.split('/') {
        match segment {
            "" => return invalid("empty path segment"),
            "." | ".." => return invalid("relative path segment"),
            _ => {}
        }
    }
    Ok(())
}

/// `prefix` with exactly one trailing `/`, or empty for the root.
pub(crate) fn dir_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}/")
    }
}
