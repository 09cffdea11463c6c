use crate::domain::errors::DomainError;

pub type TokenId = i32;

/// A stateful, token-level inference engine.
///
/// The engine owns its context memory (the KV cache of a llama-style
/// runtime). Resources are released when the value is dropped.
pub trait GenerationEngine: Send {
    /// Total positions the context window can hold.
    fn context_size(&self) -> usize;

    /// Positions already occupied in the context window.
    fn context_used(&self) -> usize;

    fn clear_memory(&mut self);

    fn tokenize(&self, text: &str, add_special: bool) -> Result<Vec<TokenId>, DomainError>;

    /// Runs one forward step over `batch`, appending it to the context.
    fn decode(&mut self, batch: &[TokenId]) -> Result<(), DomainError>;

    /// Logits over the vocabulary for the position after the last decode.
    fn logits(&self) -> Result<&[f32], DomainError>;

    fn is_end_of_generation(&self, token: TokenId) -> bool;

    fn token_to_piece(&self, token: TokenId) -> Result<String, DomainError>;
}
