use async_trait::async_trait;

use crate::domain::{ports::EmbeddingService, DomainError, Embedding};

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Offline bag-of-words embedding using the hashing trick.
///
/// Each lowercased word lands in one of `dimension` buckets with a sign taken
/// from the hash, so unrelated words mostly cancel out. Deterministic across
/// platforms and builds.
#[derive(Debug, Clone)]
pub struct HashEmbedding {
    dimension: usize,
}

impl HashEmbedding {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    pub fn embed_sync(&self, text: &str) -> Embedding {
        let mut vec = vec![0.0f32; self.dimension];
        for word in text.split_whitespace() {
            let word: String = word
                .chars()
                .filter(|c| c.is_alphanumeric())
                .flat_map(char::to_lowercase)
                .collect();
            if word.is_empty() {
                continue;
            }

            let hash = fnv1a(word.as_bytes());
            let bucket = (hash % self.dimension as u64) as usize;
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            vec[bucket] += sign;
        }
        Embedding::new(vec)
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, b| {
        (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME)
    })
}

#[async_trait]
impl EmbeddingService for HashEmbedding {
    async fn embed(&self, text: &str) -> Result<Embedding, DomainError> {
        Ok(self.embed_sync(text))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_text_same_vector() {
        let embedder = HashEmbedding::new(64);
        assert_eq!(embedder.embed_sync("Cats purr."), embedder.embed_sync("cats PURR"));
    }

    #[test]
    fn test_shared_words_score_higher() {
        let embedder = HashEmbedding::new(256);
        let query = embedder.embed_sync("how do cats purr");
        let close = embedder.embed_sync("cats purr when content");
        let far = embedder.embed_sync("rust borrow checker");

        assert!(query.dot(close.as_slice()) > query.dot(far.as_slice()));
    }

    #[test]
    fn test_prefix_words_are_embedded_too() {
        let embedder = HashEmbedding::new(32);
        assert_ne!(
            embedder.embed_sync("query: cats"),
            embedder.embed_sync("cats")
        );
    }

    #[tokio::test]
    async fn test_reports_dimension() {
        let embedder = HashEmbedding::new(16);
        assert_eq!(embedder.dimension(), 16);
        assert_eq!(embedder.embed("a b c").await.unwrap().dimension(), 16);
    }
}
