use crate::domain::{ports::ChatTemplate, DomainError, Message};

const TURN_START: &str = "<|im_start|>";
const TURN_END: &str = "<|im_end|>";

/// ChatML turns: `<|im_start|>role\ncontent<|im_end|>\n`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChatMlTemplate;

impl ChatTemplate for ChatMlTemplate {
    fn render(
        &self,
        messages: &[Message],
        add_generation_marker: bool,
    ) -> Result<String, DomainError> {
        let mut out = String::new();
        for message in messages {
            out.push_str(TURN_START);
            out.push_str(message.role.as_str());
            out.push('\n');
            out.push_str(&message.content);
            out.push_str(TURN_END);
            out.push('\n');
        }

        if add_generation_marker {
            out.push_str(TURN_START);
            out.push_str("assistant\n");
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_with_marker() {
        let messages = vec![Message::system("be brief"), Message::user("hi")];

        let rendered = ChatMlTemplate.render(&messages, true).unwrap();

        assert_eq!(
            rendered,
            "<|im_start|>system\nbe brief<|im_end|>\n\
             <|im_start|>user\nhi<|im_end|>\n\
             <|im_start|>assistant\n"
        );
    }

    #[test]
    fn test_render_is_prefix_stable() {
        let short = vec![Message::system("s"), Message::user("q")];
        let mut long = short.clone();
        long.push(Message::assistant("a"));
        long.push(Message::user("q2"));

        let a = ChatMlTemplate.render(&short, false).unwrap();
        let b = ChatMlTemplate.render(&long, false).unwrap();

        assert!(b.starts_with(&a));
    }

    #[test]
    fn test_empty_conversation_renders_empty() {
        assert_eq!(ChatMlTemplate.render(&[], false).unwrap(), "");
    }
}
