use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::application::services::{generation, ConversationSession, RetrievalService, Sampler};
use crate::application::settings::{Prompts, SamplingParams};
use crate::domain::{
    ports::{ChatTemplate, GenerationEngine},
    DomainError,
};

/// Why `ask` produced no answer. The display form is the bracketed marker a
/// chat loop prints in place of an answer before taking the next question.
#[derive(Debug, Error)]
pub enum AskError {
    #[error("[ERROR] index is empty")]
    IndexEmpty,

    #[error("[ERROR] failed to embed question")]
    Embedding(#[source] DomainError),

    #[error("[WARN] no relevant context found")]
    NoRelevantContext,

    #[error("[ERROR] generation failed: {0}")]
    Generation(#[source] DomainError),
}

/// Question answering over a loaded index with a running conversation.
///
/// Owns the generation engine and the session; callers serialize access.
pub struct RagClient {
    retrieval: RetrievalService,
    session: ConversationSession,
    engine: Box<dyn GenerationEngine>,
    sampler: Sampler,
    prompts: Prompts,
}

impl RagClient {
    pub fn new(
        retrieval: RetrievalService,
        template: Arc<dyn ChatTemplate>,
        engine: Box<dyn GenerationEngine>,
        sampling: SamplingParams,
        prompts: Prompts,
    ) -> Self {
        let mut session = ConversationSession::new(template);
        session.set_system_prompt(prompts.system.clone());

        Self {
            retrieval,
            session,
            engine,
            sampler: Sampler::new(sampling),
            prompts,
        }
    }

    pub fn retrieval(&self) -> &RetrievalService {
        &self.retrieval
    }

    pub fn session(&self) -> &ConversationSession {
        &self.session
    }

    pub fn reset_conversation(&mut self) {
        self.session.reset();
    }

    /// Retrieves context for `question` and generates an answer.
    ///
    /// `top_k` overrides the configured value for this call. When streaming is
    /// enabled, every generated piece is also passed to `on_token`.
    #[instrument(skip(self, question, on_token), fields(question_len = question.len()))]
    pub async fn ask(
        &mut self,
        question: &str,
        top_k: Option<usize>,
        on_token: Option<&mut (dyn FnMut(&str) + Send)>,
    ) -> Result<String, AskError> {
        if self.retrieval.index().is_empty() {
            return Err(AskError::IndexEmpty);
        }

        let retrieval = self
            .retrieval
            .retrieve(question, top_k)
            .await
            .map_err(|e| {
                warn!(error = %e, "question embedding failed");
                AskError::Embedding(e)
            })?;
        if retrieval.ranked.is_empty() {
            return Err(AskError::NoRelevantContext);
        }

        let prompt = self.prompts.question_prompt(&retrieval.context, question);
        let sink = if self.retrieval.config().stream_tokens {
            on_token
        } else {
            None
        };

        match self.run_turn(&prompt, sink) {
            Ok(answer) => {
                info!(
                    candidates = retrieval.ranked.len(),
                    answer_len = answer.len(),
                    "question answered"
                );
                Ok(answer)
            }
            Err(e) => {
                warn!(error = %e, fatal = e.is_fatal(), "generation failed");
                self.session.abandon_turn();
                Err(AskError::Generation(e))
            }
        }
    }

    /// Like [`RagClient::ask`], but folds failures into their marker text.
    pub async fn ask_text(
        &mut self,
        question: &str,
        top_k: Option<usize>,
        on_token: Option<&mut (dyn FnMut(&str) + Send)>,
    ) -> String {
        self.ask(question, top_k, on_token)
            .await
            .unwrap_or_else(|e| e.to_string())
    }

    fn run_turn(
        &mut self,
        prompt: &str,
        on_token: Option<&mut (dyn FnMut(&str) + Send)>,
    ) -> Result<String, DomainError> {
        let delta = self.session.begin_turn(prompt)?;
        let answer =
            generation::generate(self.engine.as_mut(), &mut self.sampler, &delta, on_token)?;
        self.session.end_turn(&answer)?;
        Ok(answer)
    }
}
