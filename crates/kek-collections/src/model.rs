//! The collection record and the in-memory rules applied to it.

use std::collections::BTreeMap;

use kek_revchain::Chain;
use serde::{Deserialize, Serialize};

/// Leaf document resolved during hydration; its shape belongs to whoever
/// stored it.
pub type Doc = serde_cbor::Value;

/// Resource id to inclusion flag. Persisted maps only ever hold `true`.
pub type ResourceIds = BTreeMap<String, bool>;

/// A named, slug-addressable grouping of resource references.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub id: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub resource_ids: ResourceIds,
    /// Hash of the newest revision block.
    #[serde(default)]
    pub rev: String,
    pub created_at_ns: u64,
    pub updated_at_ns: u64,

    /// Revision history, attached on request.
    #[serde(skip)]
    pub revisions: Option<Chain>,
    /// Resolved leaf resources, attached on request.
    #[serde(skip)]
    pub docs: BTreeMap<String, Doc>,
    /// Resolved nested collections, attached on request.
    #[serde(skip)]
    pub collections: BTreeMap<String, Collection>,
}

impl Collection {
    /// Whether `resource_id` is currently marked included.
    pub fn includes(&self, resource_id: &str) -> bool {
        self.resource_ids.get(resource_id).copied().unwrap_or(false)
    }

    /// Copy without any hydrated or attached state; this is what gets stored.
    pub fn persisted(&self) -> Collection {
        Collection {
            revisions: None,
            docs: BTreeMap::new(),
            collections: BTreeMap::new(),
            ..self.clone()
        }
    }

    /// Advance `updated_at_ns` to `now_ns`, or one past its current value if
    /// the clock has not moved.
    pub(crate) fn touch(&mut self, now_ns: u64) {
        self.updated_at_ns = now_ns.max(self.updated_at_ns.saturating_add(1));
    }

    /// Apply a sparse patch. Returns the slug the caller asked for when it
    /// differs from the current one; slug changes need the index and are left
    /// to the engine.
    pub(crate) fn merge(&mut self, patch: &CollectionPatch) -> Option<String> {
        if !patch.name.is_empty() && patch.name != self.name {
            self.name.clone_from(&patch.name);
        }
        if !patch.description.is_empty() && patch.description != self.description {
            self.description.clone_from(&patch.description);
        }
        apply_resource_flags(&mut self.resource_ids, &patch.resource_ids);
        (!patch.slug.is_empty() && patch.slug != self.slug).then(|| patch.slug.clone())
    }
}

/// Drop every entry whose flag is `false`.
pub fn normalize_resource_ids(ids: &mut ResourceIds) {
    ids.retain(|_, included| *included);
}

/// Treat `flags` as add (`true`) / remove (`false`) instructions against `target`.
pub fn apply_resource_flags(target: &mut ResourceIds, flags: &ResourceIds) {
    for (resource_id, &include) in flags {
        if include {
            target.insert(resource_id.clone(), true);
        } else {
            target.remove(resource_id);
        }
    }
}

/// Input of [`crate::CollectionEngine::create`].
#[derive(Debug, Clone, Default)]
pub struct NewCollection {
    pub name: String,
    pub description: String,
    /// Preferred slug; falls back to the name, then to a random token.
    pub slug: Option<String>,
    pub resource_ids: ResourceIds,
}

impl NewCollection {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn resource(mut self, resource_id: impl Into<String>, included: bool) -> Self {
        self.resource_ids.insert(resource_id.into(), included);
        self
    }

    pub fn resources(mut self, resource_ids: ResourceIds) -> Self {
        self.resource_ids.extend(resource_ids);
        self
    }
}

/// Sparse update for [`crate::CollectionEngine::patch`]. Empty strings leave
/// the stored value alone; `resource_ids` adds `true` keys and removes
/// `false` ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionPatch {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub resource_ids: ResourceIds,
}

impl CollectionPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = slug.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn include(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_ids.insert(resource_id.into(), true);
        self
    }

    pub fn exclude(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_ids.insert(resource_id.into(), false);
        self
    }
}

/// A partially filled collection works as a patch.
impl From<&Collection> for CollectionPatch {
    fn from(partial: &Collection) -> Self {
        Self {
            name: partial.name.clone(),
            slug: partial.slug.clone(),
            description: partial.description.clone(),
            resource_ids: partial.resource_ids.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(entries: &[(&str, bool)]) -> ResourceIds {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn normalize_drops_excluded() {
        let mut map = ids(&[("afasees", true), ("cceasefe", false), ("ddeasse", true)]);
        normalize_resource_ids(&mut map);
        assert_eq!(map, ids(&[("afasees", true), ("ddeasse", true)]));
    }

    #[test]
    fn flags_add_and_remove() {
        let mut target = ids(&[("B", true), ("C", true)]);
        apply_resource_flags(&mut target, &ids(&[("A", true), ("B", false)]));
        assert_eq!(target, ids(&[("A", true), ("C", true)]));
    }

    #[test]
    fn merge_keeps_fields_the_patch_leaves_empty() {
        let mut col = Collection {
            id: "cc1".into(),
            slug: "old".into(),
            name: "Old".into(),
            description: "kept".into(),
            ..Collection::default()
        };
        let slug_change = col.merge(&CollectionPatch::new().name("New"));
        assert_eq!(slug_change, None);
        assert_eq!(col.name, "New");
        assert_eq!(col.description, "kept");
        assert_eq!(col.slug, "old");

        let slug_change = col.merge(&CollectionPatch::new().slug("fresh"));
        assert_eq!(slug_change.as_deref(), Some("fresh"));
        assert_eq!(col.slug, "old", "slug is applied by the engine");
        assert_eq!(col.merge(&CollectionPatch::new().slug("old")), None);
    }

    #[test]
    fn touch_is_strictly_monotonic() {
        let mut col = Collection {
            updated_at_ns: 100,
            ..Collection::default()
        };
        col.touch(50);
        assert_eq!(col.updated_at_ns, 101);
        col.touch(500);
        assert_eq!(col.updated_at_ns, 500);
    }

    #[test]
    fn touch_saturates_at_the_largest_timestamp() {
        let mut col = Collection {
            updated_at_ns: u64::MAX,
            ..Collection::default()
        };
        col.touch(1);
        assert_eq!(col.updated_at_ns, u64::MAX);
    }

    #[test]
    fn persisted_copy_strips_attachments() {
        let mut col = Collection::default();
        col.docs.insert("dd1".into(), Doc::Null);
        col.collections.insert("cc2".into(), Collection::default());
        let stored = col.persisted();
        assert!(stored.docs.is_empty());
        assert!(stored.collections.is_empty());
    }

    #[test]
    fn partial_collection_converts_to_patch() {
        let partial = Collection {
            name: "n".into(),
            resource_ids: ids(&[("dd1", false)]),
            ..Collection::default()
        };
        let patch = CollectionPatch::from(&partial);
        assert_eq!(patch.name, "n");
        assert_eq!(patch.resource_ids, ids(&[("dd1", false)]));
    }
}
