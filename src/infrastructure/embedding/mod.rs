mod hashing;
mod text;

pub use hashing::HashEmbedding;
pub use text::TextEmbedding;

use std::sync::Arc;

use crate::domain::ports::EmbeddingService;
use crate::infrastructure::config::{EmbeddingConfig, EmbeddingProvider};

/// Builds the configured embedding backend.
pub fn embedding_service(config: &EmbeddingConfig) -> Arc<dyn EmbeddingService> {
    match config.provider {
        EmbeddingProvider::OpenAi => Arc::new(TextEmbedding::from_config(config)),
        EmbeddingProvider::Hashing => Arc::new(HashEmbedding::new(config.dimension)),
    }
}
