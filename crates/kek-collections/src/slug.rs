//! URL-safe slugs and collision-free reservation in the slug index.
//!
//! The existence check and the reservation write are separate store calls,
//! so two creators racing on the same name can still both claim a slug.
//! [`crate::CollectionEngine::load_by_slug`] tolerates that by picking the
//! earliest-created owner.

use heck::ToKebabCase;
use kek_store::Storer;
use rand::{Rng, distributions::Alphanumeric};

use crate::{CollectionError, CollectionResult, EngineConfig};

/// Lowercase, `-`-separated ASCII token derived from free text. May be empty
/// when the input has no ASCII letters or digits.
pub fn slugify(input: &str) -> String {
    let kebab = input.to_kebab_case();
    let mut slug = String::with_capacity(kebab.len());
    for ch in kebab.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.truncate(slug.trim_end_matches('-').len());
    slug
}

/// Random lowercase alphanumeric token of `len` characters.
pub fn random_token(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(|byte| char::from(byte).to_ascii_lowercase())
        .collect()
}

/// Picks slugs that are free in the slug index.
pub struct SlugGenerator<'a> {
    store: &'a dyn Storer,
    config: &'a EngineConfig,
}

impl<'a> SlugGenerator<'a> {
    pub fn new(store: &'a dyn Storer, config: &'a EngineConfig) -> Self {
        Self { store, config }
    }

    /// First free slug derived from `preferred`, or from a random seed when
    /// `preferred` yields nothing. Index entries belonging to `owner` do not
    /// count as collisions.
    pub async fn generate(
        &self,
        preferred: Option<&str>,
        owner: Option<&str>,
    ) -> CollectionResult<String> {
        let base = preferred
            .map(slugify)
            .filter(|slug| !slug.is_empty())
            .unwrap_or_else(|| random_token(self.config.slug_seed_len));

        let mut candidate = base.clone();
        for attempt in 0..self.config.max_slug_attempts {
            if !self.is_taken(&candidate, owner).await? {
                return Ok(candidate);
            }
            tracing::debug!(slug = %candidate, attempt, "slug taken; retrying with suffix");
            candidate = format!("{base}-{}", random_token(self.config.slug_suffix_len));
        }
        tracing::warn!(base = %base, "gave up looking for a free slug");
        Err(CollectionError::SlugExhausted {
            base,
            attempts: self.config.max_slug_attempts,
        })
    }

    /// Whether any id other than `owner` is registered under `slug`.
    pub async fn is_taken(&self, slug: &str, owner: Option<&str>) -> CollectionResult<bool> {
        let dir = self.config.slug_dir(slug);
        let owners = self
            .store
            .list(&dir)
            .await
            .map_err(CollectionError::store("check slug", &dir))?;
        Ok(owners.iter().any(|id| Some(id.as_str()) != owner))
    }

    /// Register `id` under `slug`. The entry is empty; its key is the signal.
    pub async fn reserve(&self, slug: &str, id: &str) -> CollectionResult<()> {
        let entry = self.config.slug_entry(slug, id);
        self.store
            .save(&entry, Vec::new())
            .await
            .map_err(CollectionError::store("reserve slug", &entry))
    }

    /// Drop `id`'s entry under `slug`; an already missing entry is fine.
    pub async fn release(&self, slug: &str, id: &str) -> CollectionResult<()> {
        let entry = self.config.slug_entry(slug, id);
        match self.store.delete(&entry).await {
            Ok(()) => Ok(()),
            Err(err) if err.is_not_found() => Ok(()),
            Err(err) => Err(CollectionError::store("release slug", &entry)(err)),
        }
    }
}
