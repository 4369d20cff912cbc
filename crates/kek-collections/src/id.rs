//! Collection ids and resource kind tags.
//!
//! An id is a kind tag followed by the 32-digit hex form of a UUIDv7, so ids
//! sort by creation time and the creation instant can be read back out of the
//! id itself. The tags here are the defaults of [`crate::EngineConfig`].

use uuid::{Uuid, Version};

/// Tag of nested collection resources.
pub const COLLECTION_TAG: &str = "cc";
/// Tag of leaf document resources.
pub const DOC_TAG: &str = "dd";

const TOKEN_LEN: usize = 32;

/// Mint a fresh, time-ordered id starting with `prefix`.
pub fn mint_id(prefix: &str) -> String {
    format!("{prefix}{}", Uuid::now_v7().simple())
}

/// Milliseconds since the Unix epoch encoded in a time-ordered id.
///
/// Accepts a tagged id (`cc0190...`) with any tag, or the bare token. Returns
/// `None` when the trailing 32 characters are not a UUIDv7.
pub fn decode_id_time(id: &str) -> Option<u64> {
    let token = id.get(id.len().checked_sub(TOKEN_LEN)?..)?;
    let uuid = Uuid::try_parse(token).ok()?;
    if uuid.get_version() != Some(Version::SortRand) {
        return None;
    }
    let (secs, nanos) = uuid.get_timestamp()?.to_unix();
    Some(secs * 1_000 + u64::from(nanos) / 1_000_000)
}

/// What a resource id refers to, read from its tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Collection,
    Doc,
    Other,
}

impl ResourceKind {
    pub fn classify(resource_id: &str, collection_tag: &str, doc_tag: &str) -> Self {
        if resource_id.starts_with(collection_tag) {
            ResourceKind::Collection
        } else if resource_id.starts_with(doc_tag) {
            ResourceKind::Doc
        } else {
            ResourceKind::Other
        }
    }
}
