use crate::domain::{ports::ChatTemplate, DomainError, Message};

const BEGIN: &str = "<|begin_of_text|>";
const END_OF_TURN: &str = "<|eot_id|>";

fn header(role: &str) -> String {
    format!("<|start_header_id|>{role}<|end_header_id|>\n\n")
}

/// Llama 3 instruct turns, opened once with `<|begin_of_text|>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Llama3Template;

impl ChatTemplate for Llama3Template {
    fn render(
        &self,
        messages: &[Message],
        add_generation_marker: bool,
    ) -> Result<String, DomainError> {
        let mut out = String::from(BEGIN);
        for message in messages {
            out.push_str(&header(message.role.as_str()));
            out.push_str(&message.content);
            out.push_str(END_OF_TURN);
        }

        if add_generation_marker {
            out.push_str(&header("assistant"));
        }

        Ok(out)
    }
}
