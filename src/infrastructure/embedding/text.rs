use async_trait::async_trait;
use rig::client::{EmbeddingsClient, ProviderClient};
use rig::embeddings::EmbeddingsBuilder;
use rig::providers::openai;
use tracing::debug;

use crate::domain::{ports::EmbeddingService, DomainError, Embedding};
use crate::infrastructure::config::EmbeddingConfig;

const API_KEY_VAR: &str = "OPENAI_API_KEY";

/// Remote embeddings through the OpenAI provider.
///
/// The API key is read from `OPENAI_API_KEY` on every call, so a missing key
/// surfaces as an embedding failure instead of aborting the process.
#[derive(Debug, Clone)]
pub struct TextEmbedding {
    model: String,
    dimension: usize,
}

impl TextEmbedding {
    pub fn new(model: impl Into<String>, dimension: usize) -> Self {
        Self {
            model: model.into(),
            dimension,
        }
    }

    pub fn from_config(config: &EmbeddingConfig) -> Self {
        Self::new(config.model.clone(), config.dimension)
    }

    fn ensure_api_key() -> Result<(), DomainError> {
        if std::env::var(API_KEY_VAR).map_or(true, |key| key.trim().is_empty()) {
            return Err(DomainError::external(format!("{API_KEY_VAR} is not set")));
        }
        Ok(())
    }
}

#[async_trait]
impl EmbeddingService for TextEmbedding {
    async fn embed(&self, text: &str) -> Result<Embedding, DomainError> {
        Self::ensure_api_key()?;
        let client = openai::Client::from_env();
        let model = client.embedding_model(&self.model);

        let embeddings = EmbeddingsBuilder::new(model)
            .document(text)
            .map_err(|e| DomainError::external(format!("openai ({}): {e}", self.model)))?
            .build()
            .await
            .map_err(|e| DomainError::external(format!("openai ({}): {e}", self.model)))?;

        let (_, vectors) = embeddings
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::external("openai returned no embedding"))?;
        let values: Vec<f32> = vectors.first().vec.into_iter().map(|x| x as f32).collect();

        debug!(model = %self.model, dimension = values.len(), "text embedded");
        Ok(Embedding::new(values))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
