mod embedder;
pub mod generation;
mod indexing;
mod rag;
pub mod retrieval;
mod sampler;
mod session;

pub use embedder::Embedder;
pub use generation::{generate, TokenStream};
pub use indexing::{discover_documents, IndexService, IndexStats, ACCEPTED_EXTENSIONS};
pub use rag::{AskError, RagClient};
pub use retrieval::{build_context, rank, Retrieval, RetrievalService};
pub use sampler::Sampler;
pub use session::ConversationSession;
