use crate::error::{Result, VectorStoreError};
use async_trait::async_trait;
use std::io;
use std::path::Path;

/// Deletion primitive used when a group loses its last document.
///
/// `force_remove` is only tried after `remove` failed.
#[async_trait]
pub trait FileRemover: Send + Sync {
    async fn remove(&self, path: &Path) -> io::Result<()>;

    async fn force_remove(&self, path: &Path) -> io::Result<()>;
}

/// Plain filesystem removal; the forced path clears the read-only bit first
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileRemover;

#[async_trait]
impl FileRemover for OsFileRemover {
    async fn remove(&self, path: &Path) -> io::Result<()> {
        tokio::fs::remove_file(path).await
    }

    #[allow(clippy::permissions_set_readonly_false)]
    async fn force_remove(&self, path: &Path) -> io::Result<()> {
        let metadata = tokio::fs::symlink_metadata(path).await?;
        if metadata.is_dir() {
            return tokio::fs::remove_dir_all(path).await;
        }
        let mut permissions = metadata.permissions();
        if permissions.readonly() {
            permissions.set_readonly(false);
            tokio::fs::set_permissions(path, permissions).await?;
        }
        tokio::fs::remove_file(path).await
    }
}

/// Ordinary delete, then the forced fallback; a missing file counts as removed
pub async fn remove_file_with(remover: &dyn FileRemover, path: &Path) -> Result<()> {
    let first = match remover.remove(path).await {
        Ok(()) => return Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(err) => err,
    };
    log::warn!(
        "Ordinary delete of {} failed ({first}); retrying with forced removal",
        path.display()
    );
    match remover.force_remove(path).await {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(second) => Err(VectorStoreError::IoError(io::Error::new(
            second.kind(),
            format!(
                "failed to delete {}: {first}; forced removal: {second}",
                path.display()
            ),
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct FlakyRemover {
        forced_calls: AtomicUsize,
        forced_fails: bool,
    }

    #[async_trait]
    impl FileRemover for FlakyRemover {
        async fn remove(&self, _path: &Path) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "locked"))
        }

        async fn force_remove(&self, path: &Path) -> io::Result<()> {
            self.forced_calls.fetch_add(1, Ordering::SeqCst);
            if self.forced_fails {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "still locked"));
            }
            tokio::fs::remove_file(path).await
        }
    }

    #[tokio::test]
    async fn falls_back_to_forced_removal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("g.vgs");
        tokio::fs::write(&path, b"x").await.unwrap();

        let remover = FlakyRemover {
            forced_calls: AtomicUsize::new(0),
            forced_fails: false,
        };
        remove_file_with(&remover, &path).await.unwrap();
        assert_eq!(remover.forced_calls.load(Ordering::SeqCst), 1);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn both_failures_are_reported_together() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("g.vgs");
        tokio::fs::write(&path, b"x").await.unwrap();

        let remover = FlakyRemover {
            forced_calls: AtomicUsize::new(0),
            forced_fails: true,
        };
        let err = remove_file_with(&remover, &path).await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("locked"));
        assert!(message.contains("still locked"));
        assert!(path.exists());
    }

    #[tokio::test]
    async fn os_remover_handles_read_only_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("g.vss");
        tokio::fs::write(&path, b"x").await.unwrap();
        let mut permissions = tokio::fs::metadata(&path).await.unwrap().permissions();
        permissions.set_readonly(true);
        tokio::fs::set_permissions(&path, permissions).await.unwrap();

        OsFileRemover.force_remove(&path).await.unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn missing_file_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        remove_file_with(&OsFileRemover, &dir.path().join("nope.vgs"))
            .await
            .unwrap();
    }
}
