use std::sync::Arc;
use tokio::sync::Mutex;

use crate::application::{RagClient, RetrievalService};
use crate::infrastructure::AppConfig;

/// Shared handler state. Services are optional so the server can start
/// before an index or a generation engine is available.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub retrieval: Option<Arc<RetrievalService>>,
    /// One engine, one conversation: requests take turns.
    pub rag_client: Option<Arc<Mutex<RagClient>>>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config: Arc::new(config),
            retrieval: None,
            rag_client: None,
        }
    }

    pub fn with_retrieval(mut self, service: Arc<RetrievalService>) -> Self {
        self.retrieval = Some(service);
        self
    }

    pub fn with_rag_client(mut self, client: RagClient) -> Self {
        self.rag_client = Some(Arc::new(Mutex::new(client)));
        self
    }
}
