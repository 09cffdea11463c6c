pub mod config;
pub mod embedding;
pub mod generation;
pub mod index_store;
pub mod template;

pub use config::{AppConfig, ConfigError, EmbeddingConfig, EmbeddingProvider, GenerationConfig};
pub use embedding::{embedding_service, HashEmbedding, TextEmbedding};
pub use generation::{build_rag_client, load_engine};
pub use index_store::{FlatFileIndex, FlatFileIndexWriter};
pub use template::{ChatMlTemplate, ChatTemplateKind, Llama3Template};
