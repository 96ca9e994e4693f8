use serde::Serialize;
use std::path::PathBuf;
use std::time::SystemTime;

/// One embedded window of a source document
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Chunk {
    pub text: String,
    pub embedding: Vec<f32>,
    pub document_name: String,
    /// 0-based position within its document
    pub index: usize,
    /// Chunk count of its document (see the codec for how this reloads)
    pub total: usize,
    /// Only set on search results
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl Chunk {
    #[must_use]
    pub fn new(
        text: impl Into<String>,
        index: usize,
        total: usize,
        document_name: impl Into<String>,
        embedding: Vec<f32>,
    ) -> Self {
        Self {
            text: text.into(),
            embedding,
            document_name: document_name.into(),
            index,
            total,
            score: None,
        }
    }

    /// Overwrite `out` with this chunk, reusing its allocations
    pub fn copy_into(&self, out: &mut Self) {
        out.text.clone_from(&self.text);
        out.embedding.clone_from(&self.embedding);
        out.document_name.clone_from(&self.document_name);
        out.index = self.index;
        out.total = self.total;
        out.score = self.score;
    }
}

/// A group file found by a directory scan, without its contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupFileInfo {
    pub group_name: String,
    pub directory_path: PathBuf,
    pub file_name: String,
    pub file_mtime: SystemTime,
}

impl GroupFileInfo {
    #[must_use]
    pub fn file_path(&self) -> PathBuf {
        self.directory_path.join(&self.file_name)
    }
}
