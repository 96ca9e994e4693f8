use crate::error::Result;
use crate::paths::group_name_from_file_name;
use crate::types::GroupFileInfo;
use std::path::Path;

/// Every `.vgs` regular file directly under `root`, sorted by group name
pub async fn list_groups(root: impl AsRef<Path>) -> Result<Vec<GroupFileInfo>> {
    let root = root.as_ref();
    let mut entries = tokio::fs::read_dir(root).await?;
    let mut groups = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let Ok(file_name) = entry.file_name().into_string() else {
            continue;
        };
        let Some(group_name) = group_name_from_file_name(&file_name) else {
            continue;
        };
        let metadata = match entry.metadata().await {
            Ok(metadata) => metadata,
            Err(err) => {
                log::warn!("Skipping {file_name}: {err}");
                continue;
            }
        };
        if !metadata.is_file() {
            continue;
        }
        groups.push(GroupFileInfo {
            group_name: group_name.to_string(),
            directory_path: root.to_path_buf(),
            file_name,
            file_mtime: metadata.modified()?,
        });
    }

    groups.sort_by(|a, b| a.group_name.cmp(&b.group_name));
    log::debug!("Found {} groups under {}", groups.len(), root.display());
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VectorStoreError;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[tokio::test]
    async fn lists_only_group_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("zeta.vgs"), b"").unwrap();
        std::fs::write(dir.path().join("alpha.vgs"), b"").unwrap();
        std::fs::write(dir.path().join("alpha.vss"), b"").unwrap();
        std::fs::write(dir.path().join("readme.txt"), b"").unwrap();
        std::fs::create_dir(dir.path().join("dir.vgs")).unwrap();

        let groups = list_groups(dir.path()).await.unwrap();
        let names: Vec<&str> = groups.iter().map(|g| g.group_name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
        assert_eq!(groups[0].file_name, "alpha.vgs");
        assert_eq!(groups[0].file_path(), dir.path().join("alpha.vgs"));
    }

    #[tokio::test]
    async fn missing_root_is_an_io_error() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            list_groups(dir.path().join("missing")).await,
            Err(VectorStoreError::IoError(_))
        ));
    }
}
