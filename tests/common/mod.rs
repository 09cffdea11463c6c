#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::Arc;

use local_rag::application::{Embedder, EmbeddingProfile, SamplingParams};
use local_rag::domain::ports::{GenerationEngine, TokenId};
use local_rag::domain::DomainError;
use local_rag::infrastructure::HashEmbedding;

const END: TokenId = 256;

/// Byte-token engine that answers every prompt with the same reply.
pub struct ReplyEngine {
    reply: Vec<u8>,
    context_size: usize,
    used: usize,
    produced: usize,
    logits: Vec<f32>,
}

impl ReplyEngine {
    pub fn new(reply: &str, context_size: usize) -> Self {
        Self {
            reply: reply.as_bytes().to_vec(),
            context_size,
            used: 0,
            produced: 0,
            logits: Vec::new(),
        }
    }
}

impl GenerationEngine for ReplyEngine {
    fn context_size(&self) -> usize {
        self.context_size
    }

    fn context_used(&self) -> usize {
        self.used
    }

    fn clear_memory(&mut self) {
        self.used = 0;
        self.produced = 0;
    }

    fn tokenize(&self, text: &str, _add_special: bool) -> Result<Vec<TokenId>, DomainError> {
        Ok(text.bytes().map(TokenId::from).collect())
    }

    fn decode(&mut self, batch: &[TokenId]) -> Result<(), DomainError> {
        self.used += batch.len();
        let next = self
            .reply
            .get(self.produced)
            .map(|b| TokenId::from(*b))
            .unwrap_or(END);
        self.produced += 1;

        self.logits = vec![0.0; 257];
        self.logits[next as usize] = 50.0;
        Ok(())
    }

    fn logits(&self) -> Result<&[f32], DomainError> {
        Ok(&self.logits)
    }

    fn is_end_of_generation(&self, token: TokenId) -> bool {
        token == END
    }

    fn token_to_piece(&self, token: TokenId) -> Result<String, DomainError> {
        Ok((token as u8 as char).to_string())
    }
}

pub fn greedy() -> SamplingParams {
    SamplingParams {
        min_p: 0.05,
        temperature: 0.0,
        seed: Some(7),
    }
}

pub fn hash_embedder() -> Embedder {
    Embedder::new(
        Arc::new(HashEmbedding::new(256)),
        EmbeddingProfile::default(),
    )
}

pub fn write_corpus(root: &Path) {
    fs::write(
        root.join("cats.txt"),
        "Cats are small furry mammals.\nCats purr when they are happy.",
    )
    .unwrap();
    fs::create_dir(root.join("pets")).unwrap();
    fs::write(
        root.join("pets").join("dogs.md"),
        "Dogs bark at strangers and fetch sticks in the park.",
    )
    .unwrap();
    fs::write(root.join("ignored.csv"), "cats,purr,cats,purr").unwrap();
}
