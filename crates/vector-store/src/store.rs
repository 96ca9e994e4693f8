use crate::directory;
use crate::error::Result;
use crate::group::Group;
use crate::maintenance::{self, AddDocumentStats};
use crate::paths::{group_file_name, GroupFiles};
use crate::provider::{Embedder, Summarizer};
use crate::remover::{FileRemover, OsFileRemover};
use crate::summary::SummaryStore;
use crate::types::{Chunk, GroupFileInfo};
use dashmap::DashMap;
use mrag_text_chunker::ChunkerConfig;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

type GroupSlot = Arc<Mutex<Option<Group>>>;

/// All groups under one root directory.
///
/// Loaded groups are cached per name. Each group has its own lock, so
/// searches and maintenance on one group are serialized while different
/// groups proceed independently.
pub struct GroupStore {
    root: PathBuf,
    chunking: ChunkerConfig,
    embedder: Arc<dyn Embedder>,
    summarizer: Arc<dyn Summarizer>,
    remover: Arc<dyn FileRemover>,
    groups: DashMap<String, GroupSlot>,
}

impl GroupStore {
    pub fn new(
        root: impl AsRef<Path>,
        chunking: ChunkerConfig,
        embedder: Arc<dyn Embedder>,
        summarizer: Arc<dyn Summarizer>,
    ) -> Result<Self> {
        chunking.validate()?;
        Ok(Self {
            root: root.as_ref().to_path_buf(),
            chunking,
            embedder,
            summarizer,
            remover: Arc::new(OsFileRemover),
            groups: DashMap::new(),
        })
    }

    #[must_use]
    pub fn with_remover(mut self, remover: Arc<dyn FileRemover>) -> Self {
        self.remover = remover;
        self
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub const fn chunking(&self) -> ChunkerConfig {
        self.chunking
    }

    /// Top `top_k` chunks of `group_name` for a query embedding
    pub async fn search(
        &self,
        group_name: &str,
        query: &[f32],
        top_k: usize,
    ) -> Result<Vec<Chunk>> {
        let slot = self.slot(group_name)?;
        let mut guard = slot.lock().await;
        match self.fresh_group(&mut guard, group_name).await {
            Ok(group) => group.search(query, top_k),
            Err(err) => {
                self.forget(group_name, &slot);
                Err(err)
            }
        }
    }

    /// Embed `query_text` with the store's embedder, then [`Self::search`]
    pub async fn search_text(
        &self,
        group_name: &str,
        query_text: &str,
        top_k: usize,
    ) -> Result<Vec<Chunk>> {
        let query = self.embedder.embed(query_text).await?;
        self.search(group_name, &query, top_k).await
    }

    /// Summaries of every document in the group
    pub async fn summary(&self, group_name: &str) -> Result<SummaryStore> {
        let slot = self.slot(group_name)?;
        let mut guard = slot.lock().await;
        match self.fresh_group(&mut guard, group_name).await {
            Ok(group) => Ok(group.summary().clone()),
            Err(err) => {
                self.forget(group_name, &slot);
                Err(err)
            }
        }
    }

    pub async fn add_document(
        &self,
        group_name: &str,
        document_name: &str,
        full_text: &str,
    ) -> Result<AddDocumentStats> {
        let slot = self.slot(group_name)?;
        let mut guard = slot.lock().await;
        *guard = None;
        maintenance::add_document(
            &self.root,
            group_name,
            document_name,
            full_text,
            self.chunking,
            self.embedder.as_ref(),
            self.summarizer.as_ref(),
        )
        .await
    }

    pub async fn remove_document(&self, group_name: &str, document_name: &str) -> Result<bool> {
        let files = GroupFiles::new(&self.root, group_name)?;
        let slot = self.slot(group_name)?;
        let mut guard = slot.lock().await;
        *guard = None;
        let removed = maintenance::remove_document_with(
            self.remover.as_ref(),
            &self.root,
            group_name,
            document_name,
        )
        .await?;
        if !tokio::fs::try_exists(&files.chunk_path).await? {
            self.forget(group_name, &slot);
        }
        Ok(removed)
    }

    pub async fn list_groups(&self) -> Result<Vec<GroupFileInfo>> {
        directory::list_groups(&self.root).await
    }

    /// Drop the cached copy of a group; the next search reloads it
    pub async fn invalidate(&self, group_name: &str) {
        let key = group_name.trim();
        let slot = self.groups.get(key).map(|entry| Arc::clone(entry.value()));
        if let Some(slot) = slot {
            *slot.lock().await = None;
        }
    }

    #[must_use]
    pub fn cached_groups(&self) -> usize {
        self.groups.len()
    }

    fn slot(&self, group_name: &str) -> Result<GroupSlot> {
        group_file_name(group_name)?;
        let slot = self
            .groups
            .entry(group_name.trim().to_string())
            .or_default()
            .clone();
        Ok(slot)
    }

    /// Drop the map entry for a group whose files are gone. Skipped while
    /// another caller still holds the slot.
    fn forget(&self, group_name: &str, slot: &GroupSlot) {
        self.groups.remove_if(group_name.trim(), |_, current| {
            Arc::ptr_eq(current, slot) && Arc::strong_count(current) == 2
        });
    }

    async fn fresh_group<'a>(
        &self,
        slot: &'a mut Option<Group>,
        group_name: &str,
    ) -> Result<&'a mut Group> {
        let group = match slot.take() {
            Some(group) => {
                if group.is_stale().await {
                    log::debug!("Group '{group_name}' changed on disk; reloading");
                    Group::load(&self.root, group_name).await?
                } else {
                    group
                }
            }
            None => Group::load(&self.root, group_name).await?,
        };
        Ok(slot.insert(group))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VectorStoreError;
    use crate::stub::{StubEmbedder, StubSummarizer};
    use tempfile::TempDir;

    fn store(root: &Path) -> GroupStore {
        GroupStore::new(
            root,
            ChunkerConfig::new(40, 8),
            Arc::new(StubEmbedder::default()),
            Arc::new(StubSummarizer::default()),
        )
        .unwrap()
    }

    #[test]
    fn invalid_chunking_is_rejected() {
        let dir = TempDir::new().unwrap();
        let result = GroupStore::new(
            dir.path(),
            ChunkerConfig::new(0, 0),
            Arc::new(StubEmbedder::default()),
            Arc::new(StubSummarizer::default()),
        );
        assert!(matches!(result, Err(VectorStoreError::ChunkerError(_))));
    }

    #[tokio::test]
    async fn search_caches_and_maintenance_evicts() {
        let dir = TempDir::new().unwrap();
        let store = store(dir.path());
        store
            .add_document("pets", "cats", "Cats are mammals. They purr.")
            .await
            .unwrap();

        let first = store.search_text("pets", "Cats are mammals.", 3).await.unwrap();
        assert_eq!(first[0].document_name, "cats");
        assert_eq!(store.cached_groups(), 1);

        store
            .add_document("pets", "dogs", "Dogs are mammals too.")
            .await
            .unwrap();
        let summary = store.summary("pets").await.unwrap();
        assert_eq!(summary.document_names().collect::<Vec<_>>(), vec!["cats", "dogs"]);

        store.invalidate("pets").await;
        let hits = store.search_text("pets", "Dogs are mammals too.", 1).await.unwrap();
        assert_eq!(hits[0].document_name, "dogs");
    }

    #[tokio::test]
    async fn empty_group_name_is_an_argument_error() {
        let dir = TempDir::new().unwrap();
        let store = store(dir.path());
        assert!(matches!(
            store.search("  ", &[1.0], 1).await,
            Err(VectorStoreError::ArgumentError(_))
        ));
        assert_eq!(store.cached_groups(), 0);
    }

    #[tokio::test]
    async fn unknown_group_search_fails() {
        let dir = TempDir::new().unwrap();
        let store = store(dir.path());
        assert!(matches!(
            store.search("missing", &[1.0], 1).await,
            Err(VectorStoreError::IoError(_))
        ));
        assert_eq!(store.cached_groups(), 0);
    }

    #[tokio::test]
    async fn removing_last_document_releases_the_cached_slot() {
        let dir = TempDir::new().unwrap();
        let store = store(dir.path());
        store
            .add_document("pets", "cats", "Cats are mammals. They purr.")
            .await
            .unwrap();
        store.search_text("pets", "Cats are mammals.", 1).await.unwrap();
        assert_eq!(store.cached_groups(), 1);

        assert!(store.remove_document("pets", "cats").await.unwrap());
        assert_eq!(store.cached_groups(), 0);
        assert!(store.list_groups().await.unwrap().is_empty());
    }
}
