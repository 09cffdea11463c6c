mod embedding;
mod generation;
mod index;
mod template;

pub use embedding::EmbeddingService;
pub use generation::{GenerationEngine, TokenId};
pub use index::IndexWriter;
pub use template::ChatTemplate;
