use futures::future::{BoxFuture, try_join_all};
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};

use super::CollectionEngine;
use crate::{CollectionError, CollectionResult, DeleteTarget};

type DeleteTask<'a> = BoxFuture<'a, (DeleteTarget, CollectionResult<()>)>;

impl CollectionEngine {
    /// Delete a collection: its record, its slug namespace and, when
    /// `delete_revisions` is set, its revision chain.
    ///
    /// The sub-deletes run concurrently and all of them are awaited. If any
    /// fails, the first failure is returned inside
    /// [`CollectionError::PartialDelete`]; deletions that already finished
    /// stay in effect.
    ///
    /// A chain left behind by an earlier delete without revisions is removed
    /// when `delete_revisions` is set, even though the record is gone.
    pub async fn delete(&self, id: &str, delete_revisions: bool) -> CollectionResult<()> {
        let col = match self.read_record(id).await {
            Ok(col) => col,
            Err(err) if err.is_not_found() && delete_revisions => {
                return self.delete_orphaned_revisions(id, err).await;
            }
            Err(err) => return Err(err),
        };

        let mut tasks: FuturesUnordered<DeleteTask<'_>> = FuturesUnordered::new();
        tasks.push(async { (DeleteTarget::Record, self.delete_record(id).await) }.boxed());
        if delete_revisions {
            tasks.push(async { (DeleteTarget::Revisions, self.delete_revisions(id).await) }.boxed());
        }
        if !col.slug.is_empty() {
            tasks.push(
                async { (DeleteTarget::SlugIndex, self.delete_slug_namespace(&col.slug).await) }
                    .boxed(),
            );
        }

        let mut completed = Vec::new();
        let mut first_error = None;
        while let Some((target, result)) = tasks.next().await {
            match result {
                Ok(()) => completed.push(target),
                Err(err) => {
                    tracing::warn!(id, step = %target, error = %err, "sub-delete failed");
                    first_error.get_or_insert(err);
                }
            }
        }

        match first_error {
            None => {
                tracing::info!(id, slug = %col.slug, delete_revisions, "collection deleted");
                Ok(())
            }
            Some(source) => Err(CollectionError::PartialDelete {
                id: id.to_string(),
                completed,
                source: Box::new(source),
            }),
        }
    }

    async fn delete_record(&self, id: &str) -> CollectionResult<()> {
        let path = self.config.record_path(id);
        self.store
            .delete(&path)
            .await
            .map_err(CollectionError::store("delete record", &path))
    }

    /// `missing` is returned when there is no chain either.
    async fn delete_orphaned_revisions(
        &self,
        id: &str,
        missing: CollectionError,
    ) -> CollectionResult<()> {
        match self.chain.delete(id).await {
            Ok(()) => {
                tracing::info!(id, "orphaned revisions deleted");
                Ok(())
            }
            Err(err) if err.is_not_found() => Err(missing),
            Err(err) => Err(CollectionError::chain("delete revisions", id)(err)),
        }
    }

    async fn delete_revisions(&self, id: &str) -> CollectionResult<()> {
        match self.chain.delete(id).await {
            Ok(()) => Ok(()),
            Err(err) if err.is_not_found() => Ok(()),
            Err(err) => Err(CollectionError::chain("delete revisions", id)(err)),
        }
    }

    /// Remove every index entry under `slug`, whichever id it names.
    async fn delete_slug_namespace(&self, slug: &str) -> CollectionResult<()> {
        let dir = self.config.slug_dir(slug);
        let owners = self
            .store
            .list(&dir)
            .await
            .map_err(CollectionError::store("list slug owners", &dir))?;
        let slugs = self.slugs();
        try_join_all(owners.iter().map(|owner| slugs.release(slug, owner))).await?;
        Ok(())
    }
}
