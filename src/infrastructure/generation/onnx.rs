use std::path::Path;
use tokenizers::Tokenizer;
use tracing::{debug, info, instrument};
use tract_onnx::prelude::*;

use crate::domain::{
    ports::{GenerationEngine, TokenId},
    DomainError,
};

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Causal language model exported to ONNX, run on CPU through tract.
///
/// The graph takes `input_ids` (and, when declared, `attention_mask` and
/// `position_ids`) shaped `[1, seq]` and returns logits shaped
/// `[1, seq, vocab]`. There is no KV cache: the context memory is the token
/// sequence itself and every decode re-runs the whole sequence.
pub struct OnnxEngine {
    model: TractModel,
    input_count: usize,
    tokenizer: Tokenizer,
    end_tokens: Vec<TokenId>,
    context_size: usize,
    tokens: Vec<i64>,
    logits: Vec<f32>,
}

fn load_error(path: &Path) -> impl Fn(TractError) -> DomainError + '_ {
    move |e| DomainError::external(format!("failed to load model {}: {e}", path.display()))
}

impl OnnxEngine {
    /// Loads the model graph and its `tokenizer.json`.
    ///
    /// `end_tokens` names the vocabulary entries that stop generation; names
    /// missing from the vocabulary are ignored.
    #[instrument(skip_all, fields(model = %model_path.display()))]
    pub fn load(
        model_path: &Path,
        tokenizer_path: &Path,
        context_size: usize,
        end_tokens: &[String],
    ) -> Result<Self, DomainError> {
        for path in [model_path, tokenizer_path] {
            if !path.is_file() {
                return Err(DomainError::validation(format!(
                    "{} does not exist",
                    path.display()
                )));
            }
        }

        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .map_err(load_error(model_path))?
            .into_optimized()
            .map_err(load_error(model_path))?;
        let input_count = model.inputs.len();
        let model = model.into_runnable().map_err(load_error(model_path))?;

        let tokenizer = Tokenizer::from_file(tokenizer_path).map_err(|e| {
            DomainError::external(format!(
                "failed to load tokenizer {}: {e}",
                tokenizer_path.display()
            ))
        })?;
        let end_tokens: Vec<TokenId> = end_tokens
            .iter()
            .filter_map(|name| tokenizer.token_to_id(name))
            .filter_map(|id| TokenId::try_from(id).ok())
            .collect();
        if end_tokens.is_empty() {
            return Err(DomainError::validation(
                "none of the configured end tokens exist in the vocabulary",
            ));
        }

        info!(
            inputs = input_count,
            vocab = tokenizer.get_vocab_size(true),
            context_size,
            "generation model loaded"
        );
        Ok(Self {
            model,
            input_count,
            tokenizer,
            end_tokens,
            context_size,
            tokens: Vec::new(),
            logits: Vec::new(),
        })
    }

    fn sequence_tensor(&self, values: &[i64]) -> Result<TValue, DomainError> {
        Tensor::from_shape(&[1, values.len()], values)
            .map(TValue::from)
            .map_err(|e| DomainError::internal(format!("input tensor: {e}")))
    }

    fn forward(&self) -> Result<Vec<f32>, DomainError> {
        let len = self.tokens.len();
        let mut inputs: TVec<TValue> = tvec![self.sequence_tensor(&self.tokens)?];
        if self.input_count > 1 {
            inputs.push(self.sequence_tensor(&vec![1i64; len])?);
        }
        if self.input_count > 2 {
            let positions: Vec<i64> = (0..len as i64).collect();
            inputs.push(self.sequence_tensor(&positions)?);
        }

        let outputs = self
            .model
            .run(inputs)
            .map_err(|e| DomainError::external(format!("model inference failed: {e}")))?;
        let logits = outputs
            .first()
            .ok_or_else(|| DomainError::internal("model produced no outputs"))?;
        let data = logits
            .as_slice::<f32>()
            .map_err(|e| DomainError::internal(format!("logits are not f32: {e}")))?;

        last_position_logits(data, logits.shape())
    }
}

/// The vocabulary row for the final sequence position of a row-major
/// `[.., seq, vocab]` logits tensor.
pub fn last_position_logits(data: &[f32], shape: &[usize]) -> Result<Vec<f32>, DomainError> {
    let vocab = shape.last().copied().unwrap_or(0);
    if vocab == 0 || data.len() < vocab || data.len() % vocab != 0 {
        return Err(DomainError::internal(format!(
            "unexpected logits shape {shape:?} for {} values",
            data.len()
        )));
    }
    Ok(data[data.len() - vocab..].to_vec())
}

impl GenerationEngine for OnnxEngine {
    fn context_size(&self) -> usize {
        self.context_size
    }

    fn context_used(&self) -> usize {
        self.tokens.len()
    }

    fn clear_memory(&mut self) {
        self.tokens.clear();
        self.logits.clear();
    }

    fn tokenize(&self, text: &str, add_special: bool) -> Result<Vec<TokenId>, DomainError> {
        let encoding = self
            .tokenizer
            .encode(text, add_special)
            .map_err(|e| DomainError::tokenization(e.to_string()))?;

        encoding
            .get_ids()
            .iter()
            .map(|&id| {
                TokenId::try_from(id)
                    .map_err(|_| DomainError::tokenization(format!("token id {id} out of range")))
            })
            .collect()
    }

    fn decode(&mut self, batch: &[TokenId]) -> Result<(), DomainError> {
        if self.tokens.len() + batch.len() > self.context_size {
            return Err(DomainError::ContextOverflow {
                used: self.tokens.len(),
                requested: batch.len(),
                capacity: self.context_size,
            });
        }

        self.tokens.extend(batch.iter().map(|&t| i64::from(t)));
        match self.forward() {
            Ok(logits) => {
                debug!(positions = self.tokens.len(), "decoded");
                self.logits = logits;
                Ok(())
            }
            Err(e) => {
                self.tokens.truncate(self.tokens.len() - batch.len());
                Err(e)
            }
        }
    }

    fn logits(&self) -> Result<&[f32], DomainError> {
        if self.logits.is_empty() {
            return Err(DomainError::internal("no logits before the first decode"));
        }
        Ok(&self.logits)
    }

    fn is_end_of_generation(&self, token: TokenId) -> bool {
        self.end_tokens.contains(&token)
    }

    fn token_to_piece(&self, token: TokenId) -> Result<String, DomainError> {
        let id = u32::try_from(token)
            .map_err(|_| DomainError::tokenization(format!("negative token id {token}")))?;
        self.tokenizer
            .decode(&[id], false)
            .map_err(|e| DomainError::tokenization(e.to_string()))
    }
}
