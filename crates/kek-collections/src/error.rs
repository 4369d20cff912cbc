use std::fmt;

use kek_revchain::ChainError;
use kek_store::StoreError;
use thiserror::Error;

pub type CollectionResult<T> = Result<T, CollectionError>;

/// Coarse category of a [`CollectionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Dependency,
    PartialFailure,
}

/// Sub-deletes run by [`crate::CollectionEngine::delete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DeleteTarget {
    Record,
    Revisions,
    SlugIndex,
}

impl fmt::Display for DeleteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeleteTarget::Record => "record",
            DeleteTarget::Revisions => "revisions",
            DeleteTarget::SlugIndex => "slug index",
        })
    }
}

#[derive(Debug, Error)]
pub enum CollectionError {
    #[error("{what} '{key}' not found")]
    NotFound { what: &'static str, key: String },
    #[error(
        "cannot remove resource '{resource}' from collection '{collection}': no association exists"
    )]
    NotAssociated { collection: String, resource: String },
    #[error("no free slug derived from '{base}' after {attempts} attempts")]
    SlugExhausted { base: String, attempts: usize },
    #[error("invalid request: {0}")]
    Invalid(String),
    #[error("{op} failed at '{path}': {source}")]
    Store {
        op: &'static str,
        path: String,
        #[source]
        source: StoreError,
    },
    #[error("{op} failed for revision chain '{owner}': {source}")]
    Chain {
        op: &'static str,
        owner: String,
        #[source]
        source: ChainError,
    },
    #[error("CBOR encoding failed: {0}")]
    Codec(#[from] serde_cbor::Error),
    #[error("delete of '{id}' incomplete (finished: {completed:?}): {source}")]
    PartialDelete {
        id: String,
        completed: Vec<DeleteTarget>,
        #[source]
        source: Box<CollectionError>,
    },
}

impl CollectionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CollectionError::NotFound { .. } => ErrorKind::NotFound,
            CollectionError::Store { source, .. } if source.is_not_found() => ErrorKind::NotFound,
            CollectionError::Chain { source, .. } if source.is_not_found() => ErrorKind::NotFound,
            CollectionError::NotAssociated { .. }
            | CollectionError::SlugExhausted { .. }
            | CollectionError::Invalid(_) => ErrorKind::Conflict,
            CollectionError::Store { .. }
            | CollectionError::Chain { .. }
            | CollectionError::Codec(_) => ErrorKind::Dependency,
            CollectionError::PartialDelete { .. } => ErrorKind::PartialFailure,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub(crate) fn store(op: &'static str, path: impl Into<String>) -> impl FnOnce(StoreError) -> Self {
        let path = path.into();
        move |source| CollectionError::Store { op, path, source }
    }

    pub(crate) fn chain(op: &'static str, owner: impl Into<String>) -> impl FnOnce(ChainError) -> Self {
        let owner = owner.into();
        move |source| CollectionError::Chain { op, owner, source }
    }
}
