use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use local_rag::application::{Embedder, IndexService};
use local_rag::infrastructure::{embedding_service, AppConfig, FlatFileIndexWriter};

/// Usage: `indexer [DOCS_DIR] [INDEX_PATH]`; arguments override the config.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "indexer=debug,local_rag=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;
    let mut args = std::env::args().skip(1);
    let docs = args.next().map(PathBuf::from).unwrap_or_else(|| config.paths.docs.clone());
    let output = args.next().map(PathBuf::from).unwrap_or_else(|| config.paths.index.clone());

    anyhow::ensure!(docs.is_dir(), "document root {} is not a directory", docs.display());

    let embedder = Embedder::new(
        embedding_service(&config.embedding),
        config.embedding.profile(),
    );
    let service = IndexService::new(embedder, config.chunking);

    let mut writer = FlatFileIndexWriter::create(&output)?;
    let stats = service.build_index(&docs, &mut writer).await?;

    info!(
        files = stats.files,
        chunks = stats.chunks,
        output = %writer.path().display(),
        "index written"
    );

    Ok(())
}
