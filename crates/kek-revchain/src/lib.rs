//! Append-only, hash-linked revision chains.
//!
//! Each [`Block`] commits to its index, its predecessor's hash, a timestamp
//! and an opaque payload. A [`Chain`] is the ordered list of blocks owned by a
//! single id; [`RevisionChain`] is the persistence seam used by the collection
//! engine and [`StoreChain`] implements it on top of any [`kek_store::Storer`].

mod block;
mod store_chain;

pub use block::{Block, Chain};
pub use store_chain::{CHAIN_SUFFIX, StoreChain};

use async_trait::async_trait;
use kek_store::StoreError;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

pub type ChainResult<T> = Result<T, ChainError>;
pub type DynRevisionChain = Arc<dyn RevisionChain>;

/// Revision log keyed by an owning id.
#[async_trait]
pub trait RevisionChain: Send + Sync {
    /// Start a chain for `owner` whose genesis block carries `payload`.
    async fn create(&self, owner: &str, payload: Vec<u8>) -> ChainResult<Chain>;

    /// Append a block linked to the current tail and return it.
    async fn add_block(&self, owner: &str, payload: Vec<u8>) -> ChainResult<Block>;

    async fn load(&self, owner: &str) -> ChainResult<Chain>;

    async fn delete(&self, owner: &str) -> ChainResult<()>;

    /// Hash of the newest block.
    async fn tail_hash(&self, owner: &str) -> ChainResult<String> {
        let chain = self.load(owner).await?;
        chain
            .tail()
            .map(|block| block.hash.clone())
            .ok_or_else(|| ChainError::Empty {
                owner: owner.to_string(),
            })
    }
}

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("no revision chain for '{owner}'")]
    NotFound { owner: String },
    #[error("revision chain for '{owner}' already exists")]
    AlreadyExists { owner: String },
    #[error("revision chain for '{owner}' has no blocks")]
    Empty { owner: String },
    #[error("revision chain for '{owner}' is corrupt at block {index}: {reason}")]
    Corrupt {
        owner: String,
        index: u64,
        reason: String,
    },
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("CBOR error: {0}")]
    Cbor(#[from] serde_cbor::Error),
}

impl ChainError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ChainError::NotFound { .. })
    }
}

/// Current wall-clock time in nanoseconds since the Unix epoch.
pub fn now_wallclock_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or_default()
}
