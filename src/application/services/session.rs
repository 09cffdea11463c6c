use std::sync::Arc;
use tracing::debug;

use crate::domain::{ports::ChatTemplate, DomainError, Message, MessageRole};

/// Multi-turn chat history plus a cursor into the rendered transcript.
///
/// Each turn re-renders the full history and hands out only the text past the
/// cursor, so already-delivered turns are never sent twice. The cursor only
/// moves forward, except on [`ConversationSession::reset`].
pub struct ConversationSession {
    template: Arc<dyn ChatTemplate>,
    messages: Vec<Message>,
    cursor: usize,
}

impl ConversationSession {
    pub fn new(template: Arc<dyn ChatTemplate>) -> Self {
        Self {
            template,
            messages: Vec::new(),
            cursor: 0,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Bytes of the rendered transcript already consumed.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Appends a system message. Meant to be called once before the first turn.
    pub fn set_system_prompt(&mut self, text: impl Into<String>) {
        self.messages.push(Message::system(text));
    }

    /// Appends the user message and returns the unsent tail of the transcript,
    /// ending with the generation marker.
    pub fn begin_turn(&mut self, user_text: &str) -> Result<String, DomainError> {
        if self.pending_user_turn() {
            return Err(DomainError::validation(
                "previous turn has no assistant reply yet",
            ));
        }

        self.messages.push(Message::user(user_text));
        let rendered = self.template.render(&self.messages, true)?;

        let delta = rendered.get(self.cursor..).ok_or_else(|| {
            DomainError::template(format!(
                "rendered transcript ({} bytes) does not extend consumed cursor ({})",
                rendered.len(),
                self.cursor
            ))
        })?;

        debug!(
            cursor = self.cursor,
            rendered = rendered.len(),
            delta = delta.len(),
            "turn started"
        );
        Ok(delta.to_string())
    }

    /// Records the assistant reply and marks the transcript up to it consumed.
    ///
    /// On a render failure the reply stays in history but the cursor does not
    /// move.
    pub fn end_turn(&mut self, assistant_text: &str) -> Result<(), DomainError> {
        if !self.pending_user_turn() {
            return Err(DomainError::validation("no user turn awaiting a reply"));
        }

        self.messages.push(Message::assistant(assistant_text));
        let consumed = self.template.render(&self.messages, false)?.len();

        if consumed < self.cursor {
            return Err(DomainError::template(format!(
                "transcript shrank from {} to {consumed} bytes",
                self.cursor
            )));
        }

        self.cursor = consumed;
        debug!(cursor = self.cursor, "turn completed");
        Ok(())
    }

    /// Drops a trailing user message whose reply never arrived.
    pub fn abandon_turn(&mut self) -> Option<Message> {
        if self.pending_user_turn() {
            self.messages.pop()
        } else {
            None
        }
    }

    /// Forgets all turns, keeping system messages, and rewinds the cursor.
    pub fn reset(&mut self) {
        self.messages.retain(|m| m.role == MessageRole::System);
        self.cursor = 0;
    }

    fn pending_user_turn(&self) -> bool {
        self.messages
            .last()
            .is_some_and(|m| m.role == MessageRole::User)
    }
}
