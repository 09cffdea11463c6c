mod conversation;
mod document;
mod embedding;
mod index;

pub use conversation::{Message, MessageRole};
pub use document::{chunk_document, chunk_words, normalize_whitespace, Chunk, ChunkingPolicy};
pub use embedding::{dot, Embedding, Normalization};
pub use index::{IndexRecord, RankedResult, VectorIndex};
