// template.rs
use crate::message::{Message, Performative};

/// Predicate over a message, composable by conjunction.
///
/// Receives use a template to pick one message out of the mailbox without
/// disturbing the others.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageTemplate {
    Any,
    Performative(Performative),
    ConversationId(String),
    InReplyTo(String),
    Content(String),
    And(Vec<MessageTemplate>),
}

impl MessageTemplate {
    pub fn performative(performative: Performative) -> Self {
        MessageTemplate::Performative(performative)
    }

    pub fn conversation(conversation_id: impl Into<String>) -> Self {
        MessageTemplate::ConversationId(conversation_id.into())
    }

    pub fn in_reply_to(token: impl Into<String>) -> Self {
        MessageTemplate::InReplyTo(token.into())
    }

    pub fn content(content: impl Into<String>) -> Self {
        MessageTemplate::Content(content.into())
    }

    /// Conjunction of `self` and `other`. Nested conjunctions are flattened.
    pub fn and(self, other: MessageTemplate) -> Self {
        let mut parts = match self {
            MessageTemplate::And(parts) => parts,
            MessageTemplate::Any => Vec::new(),
            single => vec![single],
        };
        match other {
            MessageTemplate::And(more) => parts.extend(more),
            MessageTemplate::Any => {}
            single => parts.push(single),
        }
        MessageTemplate::And(parts)
    }

    pub fn matches(&self, message: &Message) -> bool {
        match self {
            MessageTemplate::Any => true,
            MessageTemplate::Performative(p) => message.performative == *p,
            MessageTemplate::ConversationId(id) => {
                message.conversation_id.as_deref() == Some(id.as_str())
            }
            MessageTemplate::InReplyTo(token) => {
                message.in_reply_to.as_deref() == Some(token.as_str())
            }
            MessageTemplate::Content(content) => message.content == *content,
            MessageTemplate::And(parts) => parts.iter().all(|part| part.matches(message)),
        }
    }
}
