use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use local_rag::api::{create_router, AppState};
use local_rag::application::{Embedder, RetrievalService};
use local_rag::infrastructure::{
    build_rag_client, embedding_service, load_engine, AppConfig, FlatFileIndex,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=debug,local_rag=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;
    let addr = config.socket_addr()?;

    let mut state = AppState::new(config.clone());
    match FlatFileIndex::load(&config.paths.index) {
        Ok(index) => {
            let embedder = Embedder::new(
                embedding_service(&config.embedding),
                config.embedding.profile(),
            );
            let retrieval =
                RetrievalService::new(embedder, Arc::new(index), config.rag.clone());

            match load_engine(&config.generation)? {
                Some(engine) => {
                    let client = build_rag_client(&config, retrieval.clone(), engine);
                    state = state.with_rag_client(client);
                }
                None => warn!("generation.model_path not set, serving retrieval only"),
            }
            state = state.with_retrieval(Arc::new(retrieval));
        }
        Err(e) => warn!(
            error = %e,
            path = %config.paths.index.display(),
            "index not loaded, serving without retrieval"
        ),
    }

    let app = create_router(state);

    info!("API server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
