use crate::codec;
use crate::error::{Result, VectorStoreError};
use crate::paths::{group_file_name, GroupFiles};
use crate::summary::SummaryStore;
use crate::types::Chunk;
use std::collections::{HashSet, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// One named group: its chunks, their summaries, and the scratch pool used
/// by [`Group::search`].
#[derive(Debug)]
pub struct Group {
    name: String,
    path: PathBuf,
    file_name: String,
    chunk_file_mtime: Option<SystemTime>,
    chunks: Vec<Chunk>,
    summary: SummaryStore,
    pool: VecDeque<Chunk>,
}

impl Group {
    /// An empty group that has not been written yet
    pub fn new(path: impl AsRef<Path>, name: &str) -> Result<Self> {
        let file_name = group_file_name(name)?;
        Ok(Self {
            name: name.trim().to_string(),
            path: path.as_ref().to_path_buf(),
            file_name,
            chunk_file_mtime: None,
            chunks: Vec::new(),
            summary: SummaryStore::new(),
            pool: VecDeque::new(),
        })
    }

    /// Load both files of a group. The chunk file must exist; a missing
    /// summary file loads as an empty summary.
    pub async fn load(path: impl AsRef<Path>, name: &str) -> Result<Self> {
        let mut group = Self::new(path, name)?;
        let files = group.files()?;

        let mtime = tokio::fs::metadata(&files.chunk_path).await?.modified()?;
        let bytes = tokio::fs::read(&files.chunk_path).await?;
        group.chunks = codec::decode_chunks(&bytes)?;
        group.chunk_file_mtime = Some(mtime);

        match tokio::fs::read(&files.summary_path).await {
            Ok(bytes) => group.summary = codec::decode_summary(&bytes)?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                log::warn!(
                    "Group '{}' has no summary file at {}; using an empty summary",
                    group.name,
                    files.summary_path.display()
                );
            }
            Err(err) => return Err(err.into()),
        }

        log::info!(
            "Loaded group '{}' ({} chunks, {} summaries)",
            group.name,
            group.chunks.len(),
            group.summary.len()
        );
        Ok(group)
    }

    /// Load the group when its chunk file exists, otherwise start empty
    pub async fn load_or_empty(path: impl AsRef<Path>, name: &str) -> Result<Self> {
        let files = GroupFiles::new(path.as_ref(), name)?;
        if tokio::fs::try_exists(&files.chunk_path).await? {
            Self::load(path, name).await
        } else {
            Self::new(path, name)
        }
    }

    /// Rewrite the chunk file, then the summary file.
    ///
    /// Both payloads are encoded before anything touches the disk, and each
    /// file is replaced through a temporary sibling.
    pub async fn save(&mut self) -> Result<()> {
        let files = self.files()?;
        let chunk_bytes = codec::encode_chunks(&self.chunks)?;
        let summary_bytes = codec::encode_summary(&self.summary)?;

        tokio::fs::create_dir_all(&self.path).await?;
        replace_file(&files.chunk_path, &chunk_bytes).await?;
        replace_file(&files.summary_path, &summary_bytes).await?;

        self.chunk_file_mtime = Some(tokio::fs::metadata(&files.chunk_path).await?.modified()?);
        log::info!(
            "Saved group '{}' to {} ({} chunks)",
            self.name,
            files.chunk_path.display(),
            self.chunks.len()
        );
        Ok(())
    }

    /// Rank every chunk against `query` by cosine similarity and return
    /// copies of the best `top_k`, highest score first.
    pub fn search(&mut self, query: &[f32], top_k: usize) -> Result<Vec<Chunk>> {
        if let Some(bad) = self
            .chunks
            .iter()
            .find(|chunk| chunk.embedding.len() != query.len())
        {
            return Err(VectorStoreError::argument(format!(
                "query has {} dimensions but chunk {} of '{}' has {}",
                query.len(),
                bad.index,
                bad.document_name,
                bad.embedding.len()
            )));
        }

        let mut scored = Vec::with_capacity(self.chunks.len());
        for stored in &self.chunks {
            let mut scratch = self.pool.pop_front().unwrap_or_default();
            stored.copy_into(&mut scratch);
            scratch.score = Some(cosine_similarity(query, &scratch.embedding));
            scored.push(scratch);
        }
        // NaN scores from corrupt embeddings sort last
        scored.sort_by(|a, b| rank_score(b).total_cmp(&rank_score(a)));

        let results: Vec<Chunk> = scored.iter().take(top_k).cloned().collect();
        self.pool.extend(scored);

        log::debug!(
            "Searched group '{}': {} of {} chunks returned",
            self.name,
            results.len(),
            self.chunks.len()
        );
        Ok(results)
    }

    /// True when the chunk file's mtime no longer matches the one seen at
    /// load or save time. A file that vanished counts as changed.
    pub async fn is_stale(&self) -> bool {
        let current = match self.files() {
            Ok(files) => tokio::fs::metadata(&files.chunk_path)
                .await
                .and_then(|meta| meta.modified())
                .ok(),
            Err(_) => None,
        };
        current != self.chunk_file_mtime
    }

    /// Drop every chunk and the summary of `document_name`.
    /// Returns whether anything was removed.
    pub fn remove_document(&mut self, document_name: &str) -> bool {
        let before = self.chunks.len();
        self.chunks.retain(|chunk| chunk.document_name != document_name);
        let had_summary = self.summary.remove(document_name).is_some();
        had_summary || self.chunks.len() != before
    }

    /// Replace a document's chunks and summary in memory
    pub fn replace_document(
        &mut self,
        document_name: &str,
        summary: impl Into<String>,
        chunks: Vec<Chunk>,
    ) {
        self.remove_document(document_name);
        self.chunks.extend(chunks);
        self.summary.insert(document_name, summary);
    }

    pub fn files(&self) -> Result<GroupFiles> {
        GroupFiles::new(&self.path, &self.name)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    #[must_use]
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    #[must_use]
    pub const fn summary(&self) -> &SummaryStore {
        &self.summary
    }

    #[must_use]
    pub const fn chunk_file_mtime(&self) -> Option<SystemTime> {
        self.chunk_file_mtime
    }

    /// Distinct document names, in chunk order
    #[must_use]
    pub fn document_names(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.chunks
            .iter()
            .map(|chunk| chunk.document_name.as_str())
            .filter(|name| seen.insert(*name))
            .collect()
    }

    #[must_use]
    pub fn pool_len(&self) -> usize {
        self.pool.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

fn rank_score(chunk: &Chunk) -> f32 {
    match chunk.score {
        Some(score) if !score.is_nan() => score,
        _ => f32::NEG_INFINITY,
    }
}

/// `dot(a, b) / (|a| * |b| + 1e-10)`, accumulated in f64.
///
/// Callers guarantee equal lengths; extra elements of the longer slice are
/// ignored.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    #[allow(clippy::cast_possible_truncation)]
    let score = (dot / norm_a.sqrt().mul_add(norm_b.sqrt(), 1e-10)) as f32;
    score
}

async fn replace_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    tokio::fs::write(&tmp, bytes).await?;
    if let Err(err) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(err.into());
    }
    Ok(())
}
