use async_trait::async_trait;
use kek_store::{DynStorer, StoreError, StorerExt};

use crate::{Block, Chain, ChainError, ChainResult, RevisionChain, now_wallclock_ns};

/// Suffix that marks chain artifacts inside a record namespace.
pub const CHAIN_SUFFIX: &str = ".kek";

/// [`RevisionChain`] persisted as one record per owner at
/// `<namespace><owner>.kek`.
///
/// Appends are read-modify-write against the store; two concurrent appends to
/// the same owner can lose one block.
#[derive(Clone)]
pub struct StoreChain {
    store: DynStorer,
    namespace: String,
}

impl std::fmt::Debug for StoreChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreChain")
            .field("namespace", &self.namespace)
            .finish()
    }
}

impl StoreChain {
    pub fn new(store: DynStorer, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
        }
    }

    pub fn path_for(&self, owner: &str) -> String {
        format!("{}{owner}{CHAIN_SUFFIX}", self.namespace)
    }

    async fn read(&self, owner: &str) -> ChainResult<Chain> {
        match self.store.load_record::<Chain>(&self.path_for(owner)).await {
            Ok(chain) => Ok(chain),
            Err(StoreError::NotFound { .. }) => Err(ChainError::NotFound {
                owner: owner.to_string(),
            }),
            Err(err) => Err(err.into()),
        }
    }

    async fn write(&self, chain: &Chain) -> ChainResult<()> {
        self.store
            .save_record(&self.path_for(&chain.owner), chain)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl RevisionChain for StoreChain {
    async fn create(&self, owner: &str, payload: Vec<u8>) -> ChainResult<Chain> {
        if self.store.exists(&self.path_for(owner)).await? {
            return Err(ChainError::AlreadyExists {
                owner: owner.to_string(),
            });
        }
        let chain = Chain::new(owner, payload, now_wallclock_ns())?;
        self.write(&chain).await?;
        tracing::debug!(owner, hash = chain.hash_string(), "revision chain created");
        Ok(chain)
    }

    async fn add_block(&self, owner: &str, payload: Vec<u8>) -> ChainResult<Block> {
        let mut chain = self.read(owner).await?;
        let block = chain.append(payload, now_wallclock_ns())?.clone();
        self.write(&chain).await?;
        tracing::debug!(owner, index = block.index, hash = %block.hash, "revision appended");
        Ok(block)
    }

    async fn load(&self, owner: &str) -> ChainResult<Chain> {
        self.read(owner).await
    }

    async fn delete(&self, owner: &str) -> ChainResult<()> {
        match self.store.delete(&self.path_for(owner)).await {
            Ok(()) => Ok(()),
            Err(StoreError::NotFound { .. }) => Err(ChainError::NotFound {
                owner: owner.to_string(),
            }),
            Err(err) => Err(err.into()),
        }
    }
}
