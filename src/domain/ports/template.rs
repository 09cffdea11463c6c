use crate::domain::{errors::DomainError, Message};

/// Renders a message list into the prompt format a model was trained on.
///
/// Implementations must be prefix-stable: rendering `n` messages without the
/// generation marker yields a prefix of rendering those messages plus any
/// further ones.
pub trait ChatTemplate: Send + Sync {
    fn render(
        &self,
        messages: &[Message],
        add_generation_marker: bool,
    ) -> Result<String, DomainError>;
}
