use std::sync::Arc;
use tracing::instrument;

use crate::application::settings::EmbeddingProfile;
use crate::domain::{ports::EmbeddingService, DomainError, Embedding};

/// Applies the query/passage prefixes and normalization around an
/// [`EmbeddingService`].
#[derive(Clone)]
pub struct Embedder {
    service: Arc<dyn EmbeddingService>,
    profile: EmbeddingProfile,
}

impl Embedder {
    pub fn new(service: Arc<dyn EmbeddingService>, profile: EmbeddingProfile) -> Self {
        Self { service, profile }
    }

    pub fn profile(&self) -> &EmbeddingProfile {
        &self.profile
    }

    pub fn dimension(&self) -> usize {
        self.service.dimension()
    }

    #[instrument(skip(self, text), fields(len = text.len()))]
    pub async fn embed_query(&self, text: &str) -> Result<Embedding, DomainError> {
        self.embed_with_prefix(&self.profile.query_prefix, text).await
    }

    #[instrument(skip(self, text), fields(len = text.len()))]
    pub async fn embed_passage(&self, text: &str) -> Result<Embedding, DomainError> {
        self.embed_with_prefix(&self.profile.passage_prefix, text).await
    }

    async fn embed_with_prefix(&self, prefix: &str, text: &str) -> Result<Embedding, DomainError> {
        let input = format!("{prefix}{text}");
        let embedding = self.service.embed(&input).await?;

        let expected = self.service.dimension();
        if embedding.dimension() != expected {
            return Err(DomainError::external(format!(
                "embedding dimension mismatch: expected {expected}, got {}",
                embedding.dimension()
            )));
        }

        Ok(embedding.normalized(self.profile.normalization))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Normalization;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingEmbedding {
        seen: Mutex<Vec<String>>,
        output: Vec<f32>,
        dimension: usize,
    }

    #[async_trait]
    impl EmbeddingService for RecordingEmbedding {
        async fn embed(&self, text: &str) -> Result<Embedding, DomainError> {
            self.seen.lock().unwrap().push(text.to_string());
            Ok(Embedding::new(self.output.clone()))
        }

        fn dimension(&self) -> usize {
            self.dimension
        }
    }

    fn embedder(output: Vec<f32>, dimension: usize) -> (Arc<RecordingEmbedding>, Embedder) {
        let service = Arc::new(RecordingEmbedding {
            seen: Mutex::new(Vec::new()),
            output,
            dimension,
        });
        let profile = EmbeddingProfile {
            query_prefix: "query: ".into(),
            passage_prefix: "passage: ".into(),
            normalization: Normalization::L2,
        };
        (service.clone(), Embedder::new(service, profile))
    }

    #[tokio::test]
    async fn test_prefixes_follow_mode() {
        let (service, embedder) = embedder(vec![3.0, 4.0], 2);

        embedder.embed_query("cats").await.unwrap();
        embedder.embed_passage("dogs").await.unwrap();

        let seen = service.seen.lock().unwrap().clone();
        assert_eq!(seen, vec!["query: cats", "passage: dogs"]);
    }

    #[tokio::test]
    async fn test_output_is_normalized() {
        let (_, embedder) = embedder(vec![3.0, 4.0], 2);
        let e = embedder.embed_query("x").await.unwrap();
        assert!((e.0[0] - 0.6).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_rejected() {
        let (_, embedder) = embedder(vec![1.0, 0.0, 0.0], 2);
        let err = embedder.embed_passage("x").await.unwrap_err();
        assert!(matches!(err, DomainError::ExternalService(_)));
    }
}
