use crate::{StoreError, StoreResult, Storer, dir_prefix, io_error, validate_key};
use async_trait::async_trait;
use std::{
    collections::BTreeSet,
    fmt,
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tokio::fs;

/// Suffix of in-flight writes; such files never show up in listings.
const PARTIAL_SUFFIX: &str = ".partial";

/// Filesystem-backed store: every key is a file below `root`, every `/` a
/// directory level.
#[derive(Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl fmt::Debug for FsStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FsStore").field("root", &self.root).finish()
    }
}

impl FsStore {
    pub async fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)
            .await
            .map_err(|e| io_error(&root, e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file_path(&self, key: &str) -> StoreResult<PathBuf> {
        validate_key(key)?;
        Ok(key.split('/').fold(self.root.clone(), |acc, seg| acc.join(seg)))
    }

    fn not_found_or_io(key: &str, path: &Path, err: std::io::Error) -> StoreError {
        if err.kind() == ErrorKind::NotFound {
            StoreError::NotFound {
                path: key.to_string(),
            }
        } else {
            io_error(path, err)
        }
    }

    async fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(PARTIAL_SUFFIX);
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, bytes).await?;
        fs::rename(&tmp, path).await
    }

    /// Remove now-empty directories between `path` and the store root.
    async fn prune_empty_parents(&self, path: &Path) {
        let mut current = path.parent();
        while let Some(dir) = current {
            if dir == self.root || !dir.starts_with(&self.root) {
                break;
            }
            if fs::remove_dir(dir).await.is_err() {
                break;
            }
            current = dir.parent();
        }
    }
}

#[async_trait]
impl Storer for FsStore {
    async fn save(&self, key: &str, bytes: Vec<u8>) -> StoreResult<()> {
        let path = self.file_path(key)?;
        let parent = path.parent().unwrap_or(&self.root).to_path_buf();
        fs::create_dir_all(&parent)
            .await
            .map_err(|e| io_error(&parent, e))?;
        match Self::write_atomic(&path, &bytes).await {
            Ok(()) => Ok(()),
            // A concurrent delete may have pruned the parent in between.
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::debug!(key, "parent directory vanished during save; retrying");
                fs::create_dir_all(&parent)
                    .await
                    .map_err(|e| io_error(&parent, e))?;
                Self::write_atomic(&path, &bytes)
                    .await
                    .map_err(|e| io_error(&path, e))
            }
            Err(err) => Err(io_error(&path, err)),
        }
    }

    async fn load(&self, key: &str) -> StoreResult<Vec<u8>> {
        let path = self.file_path(key)?;
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_dir() => {
                return Err(StoreError::NotFound {
                    path: key.to_string(),
                });
            }
            Ok(_) => {}
            Err(err) => return Err(Self::not_found_or_io(key, &path, err)),
        }
        fs::read(&path)
            .await
            .map_err(|e| Self::not_found_or_io(key, &path, e))
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let path = self.file_path(key)?;
        fs::remove_file(&path)
            .await
            .map_err(|e| Self::not_found_or_io(key, &path, e))?;
        self.prune_empty_parents(&path).await;
        Ok(())
    }

    async fn list(&self, prefix: &str) -> StoreResult<BTreeSet<String>> {
        let prefix = dir_prefix(prefix);
        let dir = if prefix.is_empty() {
            self.root.clone()
        } else {
            self.file_path(prefix.trim_end_matches('/'))?
        };
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(err) if matches!(err.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {
                return Ok(BTreeSet::new());
            }
            Err(err) => return Err(io_error(&dir, err)),
        };
        let mut names = BTreeSet::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| io_error(&dir, e))? {
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if name.ends_with(PARTIAL_SUFFIX) {
                continue;
            }
            names.insert(name);
        }
        Ok(names)
    }
}
