//! Adding and removing documents while keeping a group's two files in step.
//!
//! Both operations build the new group state in memory and only touch the
//! disk once every provider call has succeeded.

use crate::error::{Result, VectorStoreError};
use crate::group::Group;
use crate::paths::GroupFiles;
use crate::provider::{Embedder, Summarizer};
use crate::remover::{remove_file_with, FileRemover, OsFileRemover};
use crate::types::Chunk;
use mrag_text_chunker::{normalize_summary, Chunker, ChunkerConfig};
use std::path::Path;

/// Prepended to the document text before it is handed to the summarizer
pub const SUMMARY_INSTRUCTION: &str = "Summarize the following document. \
Keep names, numbers and facts that someone might ask about, and answer with \
the summary only.\n\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddDocumentStats {
    /// Chunks stored for the document
    pub chunks: usize,
    /// The document was already present and its old chunks were dropped
    pub replaced: bool,
}

/// Summarize, chunk and embed `full_text` as `document_name` in a group,
/// replacing any earlier version of that document.
pub async fn add_document(
    group_path: &Path,
    group_name: &str,
    document_name: &str,
    full_text: &str,
    chunking: ChunkerConfig,
    embedder: &dyn Embedder,
    summarizer: &dyn Summarizer,
) -> Result<AddDocumentStats> {
    if document_name.trim().is_empty() {
        return Err(VectorStoreError::argument("document name is empty"));
    }
    let chunker = Chunker::new(chunking)?;
    let mut group = Group::load_or_empty(group_path, group_name).await?;
    let replaced = group.summary().contains(document_name)
        || group
            .chunks()
            .iter()
            .any(|chunk| chunk.document_name == document_name);

    let prompt = format!("{SUMMARY_INSTRUCTION}{full_text}");
    let summary = normalize_summary(&summarizer.summarize(&prompt).await?);
    let pieces = chunker.split(&summary);
    log::debug!(
        "Document '{document_name}' summarized to {} chars, {} chunks",
        summary.chars().count(),
        pieces.len()
    );

    let mut dimension = group
        .chunks()
        .iter()
        .find(|chunk| chunk.document_name != document_name)
        .map(|chunk| chunk.embedding.len());
    let total = pieces.len();
    let mut chunks = Vec::with_capacity(total);
    for (index, text) in pieces.into_iter().enumerate() {
        let embedding = embedder.embed(&text).await?;
        if embedding.is_empty() {
            return Err(VectorStoreError::provider(format!(
                "empty embedding for chunk {index} of '{document_name}'"
            )));
        }
        match dimension {
            Some(expected) if expected != embedding.len() => {
                return Err(VectorStoreError::provider(format!(
                    "embedding for chunk {index} of '{document_name}' has {} dimensions, \
                     group '{group_name}' uses {expected}",
                    embedding.len()
                )));
            }
            Some(_) => {}
            None => dimension = Some(embedding.len()),
        }
        chunks.push(Chunk::new(text, index, total, document_name, embedding));
    }

    group.replace_document(document_name, summary, chunks);
    group.save().await?;
    log::info!(
        "{} document '{document_name}' in group '{}' ({total} chunks)",
        if replaced { "Replaced" } else { "Added" },
        group.name()
    );
    Ok(AddDocumentStats {
        chunks: total,
        replaced,
    })
}

/// Remove a document from a group using the filesystem remover.
///
/// Returns `false` when the group or the document does not exist. A group
/// left without chunks has both files deleted and reports `true`.
pub async fn remove_document(
    group_path: &Path,
    group_name: &str,
    document_name: &str,
) -> Result<bool> {
    remove_document_with(&OsFileRemover, group_path, group_name, document_name).await
}

pub async fn remove_document_with(
    remover: &dyn FileRemover,
    group_path: &Path,
    group_name: &str,
    document_name: &str,
) -> Result<bool> {
    let files = GroupFiles::new(group_path, group_name)?;
    let chunk_exists = tokio::fs::try_exists(&files.chunk_path).await?;
    let summary_exists = tokio::fs::try_exists(&files.summary_path).await?;
    match (chunk_exists, summary_exists) {
        (false, false) => return Ok(false),
        (true, true) => {}
        (true, false) | (false, true) => {
            return Err(VectorStoreError::format(format!(
                "group '{group_name}' has only one of {} and {}",
                files.chunk_path.display(),
                files.summary_path.display()
            )));
        }
    }

    let mut group = Group::load(group_path, group_name).await?;
    let matched = group.remove_document(document_name);

    // A group without chunks is torn down whether or not the name matched.
    if group.is_empty() {
        remove_file_with(remover, &files.chunk_path).await?;
        remove_file_with(remover, &files.summary_path).await?;
        log::info!("Group '{group_name}' has no chunks left; deleted its files");
        return Ok(true);
    }
    if !matched {
        log::debug!("Document '{document_name}' not found in group '{group_name}'");
        return Ok(false);
    }

    group.save().await?;
    log::info!("Removed document '{document_name}' from group '{group_name}'");
    Ok(true)
}
