mod chatml;
mod llama3;

pub use chatml::ChatMlTemplate;
pub use llama3::Llama3Template;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::domain::ports::ChatTemplate;

/// Template selected by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatTemplateKind {
    #[default]
    #[serde(rename = "chatml")]
    ChatMl,
    Llama3,
}

impl ChatTemplateKind {
    pub fn build(self) -> Arc<dyn ChatTemplate> {
        match self {
            Self::ChatMl => Arc::new(ChatMlTemplate),
            Self::Llama3 => Arc::new(Llama3Template),
        }
    }
}
