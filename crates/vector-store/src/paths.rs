use crate::error::{Result, VectorStoreError};
use std::path::{Path, PathBuf};

pub const GROUP_FILE_EXTENSION: &str = ".vgs";
pub const SUMMARY_FILE_EXTENSION: &str = ".vss";

/// The two sibling files that back one group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupFiles {
    pub chunk_path: PathBuf,
    pub summary_path: PathBuf,
}

impl GroupFiles {
    pub fn new(dir: &Path, group_name: &str) -> Result<Self> {
        Ok(Self {
            chunk_path: dir.join(group_file_name(group_name)?),
            summary_path: dir.join(summary_file_name(group_name)?),
        })
    }
}

fn checked_group_name(group_name: &str) -> Result<&str> {
    let name = group_name.trim();
    if name.is_empty() {
        return Err(VectorStoreError::argument("group name is empty"));
    }
    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(VectorStoreError::argument(format!(
            "group name {name:?} is not a plain file name"
        )));
    }
    Ok(name)
}

pub fn group_file_name(group_name: &str) -> Result<String> {
    Ok(format!("{}{GROUP_FILE_EXTENSION}", checked_group_name(group_name)?))
}

pub fn summary_file_name(group_name: &str) -> Result<String> {
    Ok(format!(
        "{}{SUMMARY_FILE_EXTENSION}",
        checked_group_name(group_name)?
    ))
}

/// `notes.vgs` -> `notes`; anything else is not a group file
#[must_use]
pub fn group_name_from_file_name(file_name: &str) -> Option<&str> {
    file_name
        .strip_suffix(GROUP_FILE_EXTENSION)
        .filter(|name| !name.is_empty())
}

/// Default document name for a source file: its file name up to the first dot
#[must_use]
pub fn document_name_from_path(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    let stem = file_name.split('.').next().unwrap_or(file_name);
    let name = if stem.is_empty() { file_name } else { stem };
    Some(name.to_string())
}
