// message.rs
use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

/// Speech-act tag of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Performative {
    Request,
    Inform,
    Failure,
}

impl fmt::Display for Performative {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let tag = match self {
            Performative::Request => "REQUEST",
            Performative::Inform => "INFORM",
            Performative::Failure => "FAILURE",
        };
        write!(f, "{}", tag)
    }
}

/// Envelope exchanged between agents. Built once, never mutated after sending.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub performative: Performative,
    pub sender: String,
    pub receivers: Vec<String>,
    pub content: String,
    pub conversation_id: Option<String>,
    pub reply_with: Option<String>,
    pub in_reply_to: Option<String>,
}

impl Message {
    /// Creates a message with no receivers and no conversation metadata.
    pub fn new(performative: Performative, sender: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            performative,
            sender: sender.into(),
            receivers: Vec::new(),
            content: String::new(),
            conversation_id: None,
            reply_with: None,
            in_reply_to: None,
        }
    }

    /// Adds a receiver. Adding the same name twice is a no-op.
    pub fn to(mut self, receiver: impl Into<String>) -> Self {
        let receiver = receiver.into();
        if !self.receivers.contains(&receiver) {
            self.receivers.push(receiver);
        }
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    pub fn with_reply_with(mut self, token: impl Into<String>) -> Self {
        self.reply_with = Some(token.into());
        self
    }

    /// Builds the skeleton of a reply: addressed back to the sender, same conversation,
    /// `in_reply_to` echoing this message's `reply_with`.
    ///
    /// # Arguments
    /// * `performative` - The performative of the reply.
    /// * `sender` - Name of the agent answering.
    pub fn create_reply(&self, performative: Performative, sender: impl Into<String>) -> Message {
        let mut reply = Message::new(performative, sender).to(self.sender.clone());
        reply.conversation_id = self.conversation_id.clone();
        reply.in_reply_to = self.reply_with.clone();
        reply
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {} -> {} [{}]: {}",
            self.performative,
            self.sender,
            self.receivers.join(","),
            self.conversation_id.as_deref().unwrap_or("-"),
            self.content
        )
    }
}

/// Returns a fresh correlation token such as `purchase-5f0c...`.
pub fn correlation_token(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_echoes_correlation() {
        let request = Message::new(Performative::Request, "BuyerAgent")
            .to("InventoryAgent")
            .with_content("PURCHASE:LAPTOP001:2")
            .with_conversation("purchase-request")
            .with_reply_with("purchase-1");

        let reply = request.create_reply(Performative::Inform, "InventoryAgent");

        assert_eq!(reply.receivers, vec!["BuyerAgent".to_string()]);
        assert_eq!(reply.sender, "InventoryAgent");
        assert_eq!(reply.conversation_id.as_deref(), Some("purchase-request"));
        assert_eq!(reply.in_reply_to.as_deref(), Some("purchase-1"));
        assert!(reply.reply_with.is_none());
        assert_ne!(reply.id, request.id);
    }

    #[test]
    fn test_receivers_are_a_set() {
        let message = Message::new(Performative::Inform, "a").to("b").to("b").to("c");
        assert_eq!(message.receivers, vec!["b".to_string(), "c".to_string()]);
    }

    #[test]
    fn test_tokens_are_unique() {
        let first = correlation_token("purchase");
        let second = correlation_token("purchase");
        assert!(first.starts_with("purchase-"));
        assert_ne!(first, second);
    }
}
