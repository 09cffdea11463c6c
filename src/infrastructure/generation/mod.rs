#[cfg(feature = "onnx")]
mod onnx;

#[cfg(feature = "onnx")]
pub use onnx::OnnxEngine;

use std::path::Path;
use tracing::info;

use crate::application::{RagClient, RetrievalService};
use crate::domain::{ports::GenerationEngine, DomainError};
use crate::infrastructure::config::{AppConfig, GenerationConfig};

/// The configured generation engine, or `None` when no model is set.
pub fn load_engine(
    config: &GenerationConfig,
) -> Result<Option<Box<dyn GenerationEngine>>, DomainError> {
    let Some(model_path) = config.model_path.as_deref() else {
        return Ok(None);
    };
    info!(model = %model_path.display(), "loading generation engine");
    open_engine(config, model_path).map(Some)
}

#[cfg(feature = "onnx")]
fn open_engine(
    config: &GenerationConfig,
    model_path: &Path,
) -> Result<Box<dyn GenerationEngine>, DomainError> {
    let engine = OnnxEngine::load(
        model_path,
        &config.tokenizer_path(),
        config.context_size,
        &config.end_tokens,
    )?;
    Ok(Box::new(engine))
}

#[cfg(not(feature = "onnx"))]
fn open_engine(
    _config: &GenerationConfig,
    model_path: &Path,
) -> Result<Box<dyn GenerationEngine>, DomainError> {
    Err(DomainError::validation(format!(
        "{} is configured but this build has no `onnx` feature",
        model_path.display()
    )))
}

/// Answers questions with `engine`, using the configured chat template,
/// sampling parameters and prompt text.
pub fn build_rag_client(
    config: &AppConfig,
    retrieval: RetrievalService,
    engine: Box<dyn GenerationEngine>,
) -> RagClient {
    RagClient::new(
        retrieval,
        config.generation.chat_template.build(),
        engine,
        config.generation.sampling(),
        config.prompts.clone(),
    )
}
