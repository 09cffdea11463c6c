use serde::{Deserialize, Serialize};

/// A contiguous word window of a source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub source: String,
    pub text: String,
}

impl Chunk {
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingPolicy {
    pub max_words: usize,
    pub overlap: usize,
}

impl Default for ChunkingPolicy {
    fn default() -> Self {
        Self {
            max_words: 1000,
            overlap: 80,
        }
    }
}

impl ChunkingPolicy {
    pub fn step(&self) -> usize {
        self.max_words.saturating_sub(self.overlap).max(1)
    }
}

/// Collapses every whitespace run (newlines and tabs included) into a single
/// space and trims both ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Splits text into windows of at most `max_words` words.
///
/// Windows advance by `max(1, max_words - overlap)` words, so neighbours share
/// `overlap` words. The last window is the first one that reaches the final
/// word; no trailing window made only of overlap is emitted.
pub fn chunk_words(text: &str, max_words: usize, overlap: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() || max_words == 0 {
        return Vec::new();
    }

    let step = ChunkingPolicy { max_words, overlap }.step();
    let mut chunks = Vec::new();
    let mut start = 0;

    loop {
        let end = (start + max_words).min(words.len());
        let chunk = words[start..end].join(" ");
        if !chunk.is_empty() {
            chunks.push(chunk);
        }
        if end == words.len() {
            break;
        }
        start += step;
    }

    chunks
}

pub fn chunk_document(source: &str, text: &str, policy: ChunkingPolicy) -> Vec<Chunk> {
    chunk_words(text, policy.max_words, policy.overlap)
        .into_iter()
        .map(|text| Chunk::new(source, text))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
    }

    fn expected_count(w: usize, m: usize, o: usize) -> usize {
        let step = m.saturating_sub(o).max(1);
        w.saturating_sub(m).div_ceil(step) + 1
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(
            normalize_whitespace("  hello\n\n\tworld   again \r\n"),
            "hello world again"
        );
        assert_eq!(normalize_whitespace(" \n\t "), "");
    }

    #[test]
    fn test_chunk_words_single_chunk() {
        let chunks = chunk_words("Hello world.\n\nThis is a test.", 100, 10);
        assert_eq!(chunks, vec!["Hello world. This is a test."]);
    }

    #[test]
    fn test_chunk_words_empty() {
        assert!(chunk_words("", 10, 2).is_empty());
        assert!(chunk_words("   \n ", 10, 2).is_empty());
    }

    #[test]
    fn test_chunk_count_matches_formula() {
        for (w, m, o) in [(1, 5, 2), (5, 5, 2), (6, 5, 2), (23, 5, 2), (2500, 1000, 80)] {
            let chunks = chunk_words(&words(w), m, o);
            assert_eq!(chunks.len(), expected_count(w, m, o), "w={w} m={m} o={o}");
        }
    }

    #[test]
    fn test_consecutive_chunks_share_overlap() {
        let chunks = chunk_words(&words(20), 6, 2);
        for pair in chunks.windows(2) {
            let prev: Vec<&str> = pair[0].split(' ').collect();
            let next: Vec<&str> = pair[1].split(' ').collect();
            assert_eq!(&prev[prev.len() - 2..], &next[..2]);
        }
        assert_eq!(chunks[0], "w0 w1 w2 w3 w4 w5");
        assert_eq!(chunks[1], "w4 w5 w6 w7 w8 w9");
    }

    #[test]
    fn test_overlap_not_smaller_than_window_still_advances() {
        let chunks = chunk_words(&words(4), 2, 5);
        assert_eq!(chunks, vec!["w0 w1", "w1 w2", "w2 w3"]);
    }

    #[test]
    fn test_chunk_document_tags_source() {
        let policy = ChunkingPolicy {
            max_words: 3,
            overlap: 1,
        };
        let chunks = chunk_document("notes.md", "a b c d e", policy);
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.source == "notes.md"));
        assert_eq!(chunks[1].text, "c d e");
    }
}
