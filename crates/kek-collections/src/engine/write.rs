use kek_revchain::now_wallclock_ns;

use super::CollectionEngine;
use crate::model::{Collection, CollectionPatch, normalize_resource_ids};
use crate::slug::slugify;
use crate::{CollectionError, CollectionResult};

impl CollectionEngine {
    /// Merge `patch` into the stored collection and save the result.
    ///
    /// Non-empty `name`, `slug` and `description` overwrite the stored
    /// values; `resource_ids` adds `true` keys and removes `false` keys. A new
    /// slug is made unique and moved in the index; a collection without any
    /// slug gets one.
    pub async fn patch(&self, id: &str, patch: &CollectionPatch) -> CollectionResult<Collection> {
        let mut col = self.read_record(id).await?;
        let old_slug = col.slug.clone();

        let preferred = match col.merge(patch) {
            Some(requested) if slugify(&requested) != col.slug => Some(requested),
            Some(_) => None,
            None if col.slug.is_empty() => Some(col.name.clone()),
            None => None,
        };
        if let Some(preferred) = preferred {
            col.slug = self.claim_slug(Some(preferred.as_str()), &col.id).await?;
        }

        col.touch(now_wallclock_ns());
        let payload = kek_cbor::to_canonical_cbor(&col)?;
        let col = self.commit(col, payload).await?;
        self.release_old_slug(&old_slug, &col).await;
        Ok(col)
    }

    /// Replace the stored collection with `incoming` wholesale.
    ///
    /// Only `created_at_ns` is kept from the stored record. The slug is
    /// regenerated from `incoming` so its uniqueness is checked again.
    pub async fn replace(&self, incoming: Collection) -> CollectionResult<Collection> {
        if incoming.id.is_empty() {
            return Err(CollectionError::Invalid("collection has no id".into()));
        }
        let stored = self.read_record(&incoming.id).await?;

        let mut col = incoming.persisted();
        normalize_resource_ids(&mut col.resource_ids);
        col.created_at_ns = stored.created_at_ns;
        col.updated_at_ns = stored.updated_at_ns;

        let preferred = [col.slug.as_str(), col.name.as_str()]
            .into_iter()
            .find(|s| !s.is_empty())
            .map(str::to_string);
        col.slug = self.claim_slug(preferred.as_deref(), &col.id).await?;

        col.touch(now_wallclock_ns());
        let payload = kek_cbor::to_canonical_cbor(&col)?;
        let col = self.commit(col, payload).await?;
        self.release_old_slug(&stored.slug, &col).await;
        Ok(col)
    }

    /// Mark `resource_id` as included. Adding a present id only bumps the
    /// revision.
    pub async fn add_resource(&self, id: &str, resource_id: &str) -> CollectionResult<Collection> {
        if resource_id.is_empty() {
            return Err(CollectionError::Invalid("empty resource id".into()));
        }
        let mut col = self.read_record(id).await?;
        col.resource_ids.insert(resource_id.to_string(), true);
        self.commit_resources(col).await
    }

    /// Remove `resource_id`, failing with
    /// [`CollectionError::NotAssociated`] if it is not currently included.
    pub async fn delete_resource(
        &self,
        id: &str,
        resource_id: &str,
    ) -> CollectionResult<Collection> {
        let mut col = self.read_record(id).await?;
        if !col.includes(resource_id) {
            return Err(CollectionError::NotAssociated {
                collection: id.to_string(),
                resource: resource_id.to_string(),
            });
        }
        col.resource_ids.remove(resource_id);
        self.commit_resources(col).await
    }

    /// Resource changes record only the new `resource_ids` map as revision payload.
    async fn commit_resources(&self, mut col: Collection) -> CollectionResult<Collection> {
        col.touch(now_wallclock_ns());
        let payload = kek_cbor::to_canonical_cbor(&col.resource_ids)?;
        self.commit(col, payload).await
    }

    async fn claim_slug(&self, preferred: Option<&str>, id: &str) -> CollectionResult<String> {
        let slugs = self.slugs();
        let slug = slugs.generate(preferred, Some(id)).await?;
        slugs.reserve(&slug, id).await?;
        Ok(slug)
    }

    /// Drop the index entry of a slug the collection no longer uses. The
    /// record is already saved, so a failure here is only logged.
    async fn release_old_slug(&self, old_slug: &str, col: &Collection) {
        if old_slug.is_empty() || old_slug == col.slug {
            return;
        }
        if let Err(err) = self.slugs().release(old_slug, &col.id).await {
            tracing::warn!(id = %col.id, slug = old_slug, error = %err, "stale slug index entry left behind");
        }
    }
}
