//! Engine configuration.

use std::str::FromStr;

use crate::id::{COLLECTION_TAG, DOC_TAG, ResourceKind};

/// Store layout and slug policy for a [`crate::CollectionEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Tag that starts every collection id this engine mints; resource ids
    /// with this tag hydrate as nested collections.
    pub id_prefix: String,
    /// Tag of resource ids that hydrate as documents from `doc_path`.
    pub doc_prefix: String,
    /// Namespace of primary records (`c/<id>`); revision chains live here too.
    pub collection_path: String,
    /// Namespace of the slug index (`slugs/<slug>/<id>`).
    pub slug_path: String,
    /// Namespace of leaf documents resolved during hydration (`d/<id>`).
    pub doc_path: String,
    /// Length of the random slug used when neither slug nor name is given.
    pub slug_seed_len: usize,
    /// Length of the random suffix appended on a slug collision.
    pub slug_suffix_len: usize,
    /// Collision retries before slug generation gives up.
    pub max_slug_attempts: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            id_prefix: COLLECTION_TAG.into(),
            doc_prefix: DOC_TAG.into(),
            collection_path: "c/".into(),
            slug_path: "slugs/".into(),
            doc_path: "d/".into(),
            slug_seed_len: 9,
            slug_suffix_len: 3,
            max_slug_attempts: 64,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `KEK_SLUG_SEED_LEN`, `KEK_SLUG_SUFFIX_LEN` and
    /// `KEK_MAX_SLUG_ATTEMPTS`. Unparseable values are ignored with a warning.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        override_from_env("KEK_SLUG_SEED_LEN", &mut config.slug_seed_len);
        override_from_env("KEK_SLUG_SUFFIX_LEN", &mut config.slug_suffix_len);
        override_from_env("KEK_MAX_SLUG_ATTEMPTS", &mut config.max_slug_attempts);
        config
    }

    pub fn resource_kind(&self, resource_id: &str) -> ResourceKind {
        ResourceKind::classify(resource_id, &self.id_prefix, &self.doc_prefix)
    }

    pub fn record_path(&self, id: &str) -> String {
        format!("{}{id}", self.collection_path)
    }

    pub fn doc_record_path(&self, id: &str) -> String {
        format!("{}{id}", self.doc_path)
    }

    /// Directory holding every id registered under `slug`.
    pub fn slug_dir(&self, slug: &str) -> String {
        format!("{}{slug}/", self.slug_path)
    }

    pub fn slug_entry(&self, slug: &str, id: &str) -> String {
        format!("{}{slug}/{id}", self.slug_path)
    }
}

fn override_from_env<T: FromStr>(var: &str, slot: &mut T) {
    let Ok(raw) = std::env::var(var) else {
        return;
    };
    match raw.trim().parse() {
        Ok(value) => *slot = value,
        Err(_) => tracing::warn!(var, value = %raw, "ignoring unparseable configuration value"),
    }
}
