//! Application layer - Use cases and orchestration.
//!
//! Services here depend on domain ports (traits) rather than concrete
//! engines: index building, retrieval, the conversation session, the token
//! generation loop and the `ask` orchestrator that ties them together.

pub mod services;
pub mod settings;

pub use services::{
    AskError, ConversationSession, Embedder, IndexService, IndexStats, RagClient, Retrieval,
    RetrievalService, Sampler, TokenStream,
};
pub use settings::{EmbeddingProfile, Prompts, RagConfig, SamplingParams};
