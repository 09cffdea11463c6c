use serde::{Deserialize, Serialize};

use crate::domain::Normalization;

/// Retrieval and answering knobs, fixed for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    pub top_k: usize,
    /// Upper bound, in characters, for the assembled context block.
    pub context_budget: usize,
    /// Records scoring below this are dropped. Negative or absent disables it.
    pub min_score_keep: Option<f32>,
    pub stream_tokens: bool,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            top_k: 8,
            context_budget: 3500,
            min_score_keep: None,
            stream_tokens: true,
        }
    }
}

impl RagConfig {
    pub fn min_score(&self) -> Option<f32> {
        self.min_score_keep.filter(|s| *s >= 0.0)
    }
}

/// Natural-language prompt text. Kept out of code so deployments can localize it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Prompts {
    pub system: String,
    pub context_label: String,
    pub question_label: String,
    pub rules_label: String,
    pub rules: String,
}

impl Default for Prompts {
    fn default() -> Self {
        Self {
            system: "You are a retrieval assistant. Answer only from the provided context. \
                     If the context does not contain the answer, say that you do not know."
                .to_string(),
            context_label: "Context:".to_string(),
            question_label: "Question:".to_string(),
            rules_label: "Response requirements:".to_string(),
            rules: "- Answer concisely and clearly.\n".to_string(),
        }
    }
}

impl Prompts {
    pub fn question_prompt(&self, context: &str, question: &str) -> String {
        format!(
            "{}\n\n{}\n{}\n{} {}\n\n{}\n{}",
            self.system,
            self.context_label,
            context,
            self.question_label,
            question,
            self.rules_label,
            self.rules
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingParams {
    /// Tokens with probability below `min_p * p_max` are discarded.
    pub min_p: f32,
    /// `0.0` selects greedy decoding.
    pub temperature: f32,
    /// Fixed seed for reproducible draws; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            min_p: 0.05,
            temperature: 0.3,
            seed: None,
        }
    }
}

/// Text decoration applied around the embedding service.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingProfile {
    pub query_prefix: String,
    pub passage_prefix: String,
    pub normalization: Normalization,
}
