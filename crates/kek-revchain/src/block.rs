use kek_cbor::{Hash, from_cbor};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{ChainError, ChainResult};

/// One revision. `hash` covers every other field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Block {
    pub index: u64,
    /// Hash of the preceding block; empty for the genesis block.
    pub prev_hash: String,
    pub timestamp_ns: u64,
    #[serde(with = "serde_bytes")]
    pub payload: Vec<u8>,
    pub hash: String,
}

#[derive(Serialize)]
struct Preimage<'a> {
    index: u64,
    prev_hash: &'a str,
    timestamp_ns: u64,
    #[serde(with = "serde_bytes")]
    payload: &'a [u8],
}

impl Block {
    fn seal(
        index: u64,
        prev_hash: String,
        timestamp_ns: u64,
        payload: Vec<u8>,
    ) -> ChainResult<Self> {
        let hash = Self::compute_hash(index, &prev_hash, timestamp_ns, &payload)?;
        Ok(Self {
            index,
            prev_hash,
            timestamp_ns,
            payload,
            hash,
        })
    }

    pub fn genesis(payload: Vec<u8>, timestamp_ns: u64) -> ChainResult<Self> {
        Self::seal(0, String::new(), timestamp_ns, payload)
    }

    /// Block that follows `prev`.
    pub fn after(prev: &Block, payload: Vec<u8>, timestamp_ns: u64) -> ChainResult<Self> {
        Self::seal(prev.index + 1, prev.hash.clone(), timestamp_ns, payload)
    }

    fn compute_hash(
        index: u64,
        prev_hash: &str,
        timestamp_ns: u64,
        payload: &[u8],
    ) -> ChainResult<String> {
        let preimage = Preimage {
            index,
            prev_hash,
            timestamp_ns,
            payload,
        };
        Ok(Hash::of_cbor(&preimage)?.to_hex())
    }

    pub fn hash_string(&self) -> &str {
        &self.hash
    }

    /// Decode the payload as a canonical CBOR record.
    pub fn decode_payload<T: DeserializeOwned>(&self) -> ChainResult<T> {
        Ok(from_cbor(&self.payload)?)
    }

    fn recomputed_hash(&self) -> ChainResult<String> {
        Self::compute_hash(
            self.index,
            &self.prev_hash,
            self.timestamp_ns,
            &self.payload,
        )
    }
}

/// Ordered blocks owned by one id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chain {
    pub owner: String,
    pub blocks: Vec<Block>,
}

impl Chain {
    pub fn new(owner: impl Into<String>, payload: Vec<u8>, timestamp_ns: u64) -> ChainResult<Self> {
        Ok(Self {
            owner: owner.into(),
            blocks: vec![Block::genesis(payload, timestamp_ns)?],
        })
    }

    pub fn tail(&self) -> Option<&Block> {
        self.blocks.last()
    }

    /// Hash of the tail block, or an empty string for an empty chain.
    pub fn hash_string(&self) -> &str {
        self.tail().map(Block::hash_string).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Link a new block onto the tail (or start the chain when empty).
    pub fn append(&mut self, payload: Vec<u8>, timestamp_ns: u64) -> ChainResult<&Block> {
        let block = match self.tail() {
            Some(tail) => Block::after(tail, payload, timestamp_ns)?,
            None => Block::genesis(payload, timestamp_ns)?,
        };
        self.blocks.push(block);
        Ok(&self.blocks[self.blocks.len() - 1])
    }

    /// Recompute every hash and predecessor link.
    pub fn verify(&self) -> ChainResult<()> {
        let mut prev: Option<&Block> = None;
        for (position, block) in self.blocks.iter().enumerate() {
            let corrupt = |reason: String| ChainError::Corrupt {
                owner: self.owner.clone(),
                index: block.index,
                reason,
            };
            if block.index != position as u64 {
                return Err(corrupt(format!("expected index {position}")));
            }
            let expected_prev = prev.map(Block::hash_string).unwrap_or_default();
            if block.prev_hash != expected_prev {
                return Err(corrupt("predecessor link does not match".into()));
            }
            if block.recomputed_hash()? != block.hash {
                return Err(corrupt("content hash does not match".into()));
            }
            prev = Some(block);
        }
        Ok(())
    }
}
