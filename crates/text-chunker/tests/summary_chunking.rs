use mrag_text_chunker::{normalize_summary, Chunker, ChunkerConfig};

fn chunk_summary(raw: &str, size: usize, overlap: usize) -> Vec<String> {
    let chunker = Chunker::new(ChunkerConfig::new(size, overlap)).expect("valid config");
    chunker.split(&normalize_summary(raw))
}

#[test]
fn markdown_summary_is_cleaned_before_splitting() {
    let raw = "# Overview\n\n**Rust** is a *systems* language.\n\n\n> It has no garbage collector.\n";
    let chunks = chunk_summary(raw, 200, 10);

    assert_eq!(chunks.len(), 1);
    let text = &chunks[0];
    assert!(!text.contains('#'));
    assert!(!text.contains('*'));
    assert!(!text.contains('>'));
    assert!(text.starts_with("Overview\nRust is a systems language."));
}

#[test]
fn long_japanese_summary_respects_window_size() {
    let raw = "要約です。".repeat(40);
    let chunks = chunk_summary(&raw, 32, 4);

    assert!(chunks.len() > 1);
    for chunk in &chunks {
        assert!(chunk.chars().count() <= 32, "chunk too long: {chunk}");
        assert!(!chunk.is_empty());
    }
    assert!(chunks[0].ends_with('。'));
}

#[test]
fn consecutive_chunks_share_the_overlap() {
    let raw = "First sentence is here. Second sentence follows it. Third one closes.";
    let chunks = chunk_summary(raw, 30, 6);

    assert!(chunks.len() >= 2);
    let first = &chunks[0];
    let tail: String = first.chars().rev().take(6).collect::<Vec<_>>().into_iter().rev().collect();
    assert!(
        chunks[1].starts_with(tail.trim_start()),
        "second chunk {:?} should start with tail {:?}",
        chunks[1],
        tail
    );
}
