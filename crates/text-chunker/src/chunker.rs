use crate::config::ChunkerConfig;
use crate::error::Result;

/// Characters that end a sentence fragment. The terminator stays attached to
/// the fragment it closes.
pub const SENTENCE_TERMINATORS: [char; 8] = ['。', '．', '.', '!', '?', '！', '？', '\n'];

/// Splits text into overlapping windows bounded by `chunk_size` characters
#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkerConfig,
}

impl Chunker {
    /// Create a new chunker, rejecting sizes that cannot make progress
    pub fn new(config: ChunkerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub const fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Split `text` into trimmed, non-empty chunks in source order.
    ///
    /// Sentence fragments are accumulated into a buffer. When the next
    /// fragment would overflow the buffer, the buffer is emitted and the next
    /// one starts with its last `overlap_size` characters. Dropping the first
    /// `overlap_size` characters of every later chunk and concatenating gives
    /// back the text, up to trimmed whitespace. A buffer that is
    /// already larger than `chunk_size` (one long fragment, or a long overlap
    /// carry) is cut hard at `chunk_size`.
    #[must_use]
    pub fn split(&self, text: &str) -> Vec<String> {
        let chunk_size = self.config.chunk_size;
        let overlap_size = self.config.overlap_size;

        let mut chunks = Vec::new();
        let mut buffer: Vec<char> = Vec::new();

        for fragment in text.split_inclusive(SENTENCE_TERMINATORS) {
            self.cut_oversized(&mut buffer, &mut chunks);

            // A buffer no longer than the overlap would be carried whole into
            // the next chunk, so it keeps growing instead of being emitted.
            let fragment_len = fragment.chars().count();
            if buffer.len() > overlap_size && buffer.len() + fragment_len > chunk_size {
                push_trimmed(&buffer, &mut chunks);
                let keep_from = buffer.len().saturating_sub(overlap_size);
                buffer.drain(..keep_from);
            }
            buffer.extend(fragment.chars());
        }

        self.cut_oversized(&mut buffer, &mut chunks);
        push_trimmed(&buffer, &mut chunks);

        log::debug!(
            "Split {} chars into {} chunks (size={}, overlap={})",
            text.chars().count(),
            chunks.len(),
            chunk_size,
            overlap_size
        );
        chunks
    }

    fn cut_oversized(&self, buffer: &mut Vec<char>, chunks: &mut Vec<String>) {
        let chunk_size = self.config.chunk_size;
        let step = chunk_size - self.config.overlap_size;
        while buffer.len() > chunk_size {
            push_trimmed(&buffer[..chunk_size], chunks);
            buffer.drain(..step);
        }
    }
}

/// Split `text` with explicit window sizes
pub fn split_text(text: &str, chunk_size: usize, overlap_size: usize) -> Result<Vec<String>> {
    let chunker = Chunker::new(ChunkerConfig::new(chunk_size, overlap_size))?;
    Ok(chunker.split(text))
}

fn push_trimmed(window: &[char], chunks: &mut Vec<String>) {
    let text: String = window.iter().collect();
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChunkerError;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn chunker(size: usize, overlap: usize) -> Chunker {
        Chunker::new(ChunkerConfig::new(size, overlap)).unwrap()
    }

    #[test]
    fn empty_and_blank_text_yield_nothing() {
        let chunker = chunker(20, 5);
        assert!(chunker.split("").is_empty());
        assert!(chunker.split("   \n\n \t ").is_empty());
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        let chunks = chunker(100, 10).split("  One sentence. Another one!  ");
        assert_eq!(chunks, vec!["One sentence. Another one!".to_string()]);
    }

    #[test]
    fn overflowing_sentence_starts_new_chunk_with_overlap() {
        let chunks = chunker(20, 5).split("Cats are mammals. Dogs are mammals too.");
        assert_eq!(
            chunks,
            vec![
                "Cats are mammals.".to_string(),
                "mals. Dogs are mamma".to_string(),
                "mammals too.".to_string(),
            ]
        );
    }

    #[test]
    fn long_fragment_is_cut_hard_with_overlap() {
        let text = "abcdefghijklmnopqrstuvwxyz";
        let chunks = chunker(10, 2).split(text);
        assert_eq!(
            chunks,
            vec![
                "abcdefghij".to_string(),
                "ijklmnopqr".to_string(),
                "qrstuvwxyz".to_string(),
            ]
        );
    }

    #[test]
    fn fragment_shorter_than_overlap_is_not_emitted_alone() {
        let chunks = chunker(6, 4).split("ab.cccccccc");
        assert_eq!(
            chunks,
            vec![
                "ab.ccc".to_string(),
                ".ccccc".to_string(),
                "cccccc".to_string(),
                "ccccc".to_string(),
            ]
        );
    }

    #[test]
    fn cjk_terminators_split_fragments() {
        let text = "猫は哺乳類です。犬も哺乳類です。鳥は違います！";
        let chunks = chunker(10, 2).split(text);
        assert_eq!(chunks[0], "猫は哺乳類です。");
        assert!(chunks[1].starts_with("す。犬"));
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
    }

    #[test]
    fn sizes_count_characters_not_bytes() {
        let text = "ééééé.ééééé.";
        let chunks = chunker(6, 0).split(text);
        assert_eq!(chunks, vec!["ééééé.".to_string(), "ééééé.".to_string()]);
    }

    #[test]
    fn newline_terminates_fragment() {
        let chunks = chunker(8, 0).split("line one\nline two\n");
        assert_eq!(chunks, vec!["line one".to_string(), "line two".to_string()]);
    }

    #[test]
    fn invalid_sizes_are_rejected() {
        assert!(matches!(
            split_text("text", 5, 5),
            Err(ChunkerError::InvalidConfig(_))
        ));
        assert!(matches!(
            split_text("text", 0, 0),
            Err(ChunkerError::InvalidConfig(_))
        ));
    }

    proptest! {
        #[test]
        fn proptest_chunks_are_bounded_trimmed_substrings(
            text in "[a-zA-Z .!?\n。、あい]{0,400}",
            size in 2usize..60,
            overlap_seed in 0usize..60,
        ) {
            let overlap = overlap_seed % size;
            let chunks = split_text(&text, size, overlap).unwrap();
            for chunk in &chunks {
                prop_assert!(!chunk.is_empty());
                prop_assert!(chunk.chars().count() <= size);
                prop_assert_eq!(chunk.trim(), chunk.as_str());
                prop_assert!(text.contains(chunk.as_str()));
            }
            if text.trim().is_empty() {
                prop_assert!(chunks.is_empty());
            } else {
                prop_assert!(!chunks.is_empty());
            }
        }

        #[test]
        fn proptest_chunks_minus_overlap_rebuild_the_text(
            text in "[a-z.!?。]{0,400}",
            size in 2usize..60,
            overlap_seed in 0usize..60,
        ) {
            let overlap = overlap_seed % size;
            let chunks = split_text(&text, size, overlap).unwrap();
            for pair in chunks.windows(2) {
                let prev: Vec<char> = pair[0].chars().collect();
                let tail: String = prev[prev.len() - overlap..].iter().collect();
                prop_assert!(pair[1].starts_with(&tail), "{:?} then {:?}", pair[0], pair[1]);
            }

            let mut rebuilt = chunks.first().cloned().unwrap_or_default();
            for chunk in chunks.iter().skip(1) {
                rebuilt.extend(chunk.chars().skip(overlap));
            }
            prop_assert_eq!(rebuilt, text);
        }
    }
}
