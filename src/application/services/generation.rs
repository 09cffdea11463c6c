use tracing::{debug, instrument};

use crate::application::services::Sampler;
use crate::domain::{
    ports::{GenerationEngine, TokenId},
    DomainError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamState {
    Decoding,
    Completed,
    Failed,
}

/// Lazily generated text pieces for one prompt.
///
/// Each `next` runs one decode step and one sample. The stream ends at the
/// end-of-generation token or after yielding its first error; it cannot be
/// restarted.
pub struct TokenStream<'a> {
    engine: &'a mut dyn GenerationEngine,
    sampler: &'a mut Sampler,
    batch: Vec<TokenId>,
    state: StreamState,
    generated: usize,
}

impl<'a> TokenStream<'a> {
    /// Clears engine memory and tokenizes `prompt` as the first batch.
    pub fn start(
        engine: &'a mut dyn GenerationEngine,
        sampler: &'a mut Sampler,
        prompt: &str,
    ) -> Result<Self, DomainError> {
        engine.clear_memory();

        let add_special = engine.context_used() == 0;
        let batch = engine.tokenize(prompt, add_special)?;
        if batch.len() > i32::MAX as usize {
            return Err(DomainError::tokenization(format!(
                "prompt produced {} tokens, beyond the i32 range",
                batch.len()
            )));
        }
        if batch.is_empty() {
            return Err(DomainError::tokenization("prompt produced no tokens"));
        }

        debug!(prompt_tokens = batch.len(), "prompt tokenized");
        Ok(Self {
            engine,
            sampler,
            batch,
            state: StreamState::Decoding,
            generated: 0,
        })
    }

    pub fn is_completed(&self) -> bool {
        self.state == StreamState::Completed
    }

    /// Tokens sampled so far, the end-of-generation token excluded.
    pub fn generated(&self) -> usize {
        self.generated
    }

    fn step(&mut self) -> Result<Option<String>, DomainError> {
        let capacity = self.engine.context_size();
        let used = self.engine.context_used();
        if used + self.batch.len() > capacity {
            return Err(DomainError::ContextOverflow {
                used,
                requested: self.batch.len(),
                capacity,
            });
        }

        self.engine.decode(&self.batch)?;
        let token = self.sampler.sample(self.engine.logits()?)?;
        if self.engine.is_end_of_generation(token) {
            return Ok(None);
        }

        let piece = self.engine.token_to_piece(token)?;
        self.batch.clear();
        self.batch.push(token);
        self.generated += 1;
        Ok(Some(piece))
    }
}

impl Iterator for TokenStream<'_> {
    type Item = Result<String, DomainError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state != StreamState::Decoding {
            return None;
        }

        match self.step() {
            Ok(Some(piece)) => Some(Ok(piece)),
            Ok(None) => {
                self.state = StreamState::Completed;
                None
            }
            Err(e) => {
                self.state = StreamState::Failed;
                Some(Err(e))
            }
        }
    }
}

/// Drains a [`TokenStream`] for `prompt`, handing each piece to `on_token`
/// before appending it to the returned text.
#[instrument(skip_all, fields(prompt_len = prompt.len()))]
pub fn generate(
    engine: &mut dyn GenerationEngine,
    sampler: &mut Sampler,
    prompt: &str,
    mut on_token: Option<&mut (dyn FnMut(&str) + Send)>,
) -> Result<String, DomainError> {
    let mut stream = TokenStream::start(engine, sampler, prompt)?;
    let mut result = String::new();

    for piece in stream.by_ref() {
        let piece = piece?;
        if let Some(sink) = on_token.as_deref_mut() {
            sink(&piece);
        }
        result.push_str(&piece);
    }

    debug!(tokens = stream.generated(), "generation completed");
    Ok(result)
}
