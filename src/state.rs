use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of an agent's scheduler.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AgentState {
    /// Created, setup done, not scheduled yet.
    Initiated,

    /// At least one behaviour made progress in the last pass.
    Active,

    /// Every behaviour is blocked; parked until mail or the next tick.
    Waiting,

    /// Taken down and deregistered.
    Deleted,
}

impl fmt::Display for AgentState {
    /// Converts an `AgentState` into a human-readable string.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let state_str = match self {
            AgentState::Initiated => "Initiated",
            AgentState::Active => "Active",
            AgentState::Waiting => "Waiting",
            AgentState::Deleted => "Deleted",
        };
        write!(f, "{}", state_str)
    }
}

/// Where a request/reply exchange currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationState {
    /// Nothing sent yet.
    Start,

    /// Request sent, reply not matched yet.
    SentAwaitingReply,

    /// Reply handled (or given up on). Terminal.
    Done,
}
