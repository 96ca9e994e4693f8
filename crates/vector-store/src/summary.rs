use std::collections::BTreeMap;

/// Per-document summaries of one group, keyed by document name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryStore {
    entries: BTreeMap<String, String>,
}

impl SummaryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite; returns the previous summary
    pub fn insert(
        &mut self,
        document_name: impl Into<String>,
        text: impl Into<String>,
    ) -> Option<String> {
        self.entries.insert(document_name.into(), text.into())
    }

    pub fn remove(&mut self, document_name: &str) -> Option<String> {
        self.entries.remove(document_name)
    }

    #[must_use]
    pub fn get(&self, document_name: &str) -> Option<&str> {
        self.entries.get(document_name).map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, document_name: &str) -> bool {
        self.entries.contains_key(document_name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn document_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for SummaryStore {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_overwrites_and_remove_drops() {
        let mut store = SummaryStore::new();
        assert!(store.insert("a.txt", "first").is_none());
        assert_eq!(store.insert("a.txt", "second").as_deref(), Some("first"));
        store.insert("b.txt", "other");

        assert_eq!(store.len(), 2);
        assert_eq!(store.get("a.txt"), Some("second"));
        assert_eq!(store.remove("a.txt").as_deref(), Some("second"));
        assert!(!store.contains("a.txt"));
        assert_eq!(store.document_names().collect::<Vec<_>>(), vec!["b.txt"]);
    }
}
