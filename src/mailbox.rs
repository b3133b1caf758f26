// mailbox.rs
use crate::message::Message;
use crate::template::MessageTemplate;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tokio::sync::Notify;

/// Unbounded FIFO inbox of one agent. Many senders, one reader.
#[derive(Debug, Default)]
pub struct Mailbox {
    queue: Mutex<VecDeque<Message>>,
    notify: Notify,
}

impl Mailbox {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, message: Message) {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(message);
        // Stores a permit when the owner is not parked yet, so a wake-up is never lost.
        self.notify.notify_one();
    }

    /// Removes and returns the oldest message matching `template`, leaving the
    /// others in place. Never blocks.
    pub fn receive(&self, template: &MessageTemplate) -> Option<Message> {
        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        let index = queue.iter().position(|m| template.matches(m))?;
        queue.remove(index)
    }

    pub fn len(&self) -> usize {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolves when a message has been pushed since the last wake-up.
    pub async fn notified(&self) {
        self.notify.notified().await;
    }
}

/// Routes messages to the mailboxes of the agents attached to it.
#[derive(Debug, Default)]
pub struct MessageBus {
    mailboxes: RwLock<HashMap<String, Arc<Mailbox>>>,
}

impl MessageBus {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Makes `mailbox` reachable under `name`.
    pub fn attach(&self, name: &str, mailbox: Arc<Mailbox>) {
        self.mailboxes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), mailbox);
    }

    pub fn detach(&self, name: &str) {
        self.mailboxes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name);
    }

    /// Enqueues `message` into every receiver's mailbox and returns at once.
    /// Returns the receivers that could not be reached.
    pub fn send(&self, message: Message) -> Vec<String> {
        let mailboxes = self.mailboxes.read().unwrap_or_else(PoisonError::into_inner);
        let mut unreachable = Vec::new();
        for receiver in &message.receivers {
            match mailboxes.get(receiver) {
                Some(mailbox) => mailbox.push(message.clone()),
                None => unreachable.push(receiver.clone()),
            }
        }
        unreachable
    }
}
