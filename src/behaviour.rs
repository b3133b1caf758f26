// behaviour.rs
//! Resumable units of agent logic.
//!
//! A behaviour is a step function: every scheduler pass calls [`Behaviour::action`] once and
//! the returned [`Status`] tells the scheduler whether the behaviour did something, found
//! nothing to do yet, or has finished. Nothing in here ever blocks the thread.

use crate::agent::AgentEnv;
use crate::directory::AgentDescriptor;
use crate::logging::Logger;
use crate::message::Message;
use crate::template::MessageTemplate;
use std::marker::PhantomData;

/// Outcome of one `action` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Consumed a message, sent one, or otherwise moved forward.
    Progressed,
    /// Nothing to do right now; try again on a later pass.
    Blocked,
    /// Finished; the scheduler drops the behaviour.
    Done,
}

pub trait Behaviour<S>: Send {
    fn name(&self) -> &str;

    fn action(&mut self, ctx: &mut Context<'_, S>) -> Status;
}

/// What a behaviour can see and do while it runs.
pub struct Context<'a, S> {
    env: &'a mut AgentEnv<S>,
    spawned: &'a mut Vec<Box<dyn Behaviour<S>>>,
}

impl<'a, S> Context<'a, S> {
    pub(crate) fn new(env: &'a mut AgentEnv<S>, spawned: &'a mut Vec<Box<dyn Behaviour<S>>>) -> Self {
        Self { env, spawned }
    }

    /// Name of the agent running this behaviour.
    pub fn name(&self) -> &str {
        &self.env.name
    }

    pub fn role(&self) -> &S {
        &self.env.role
    }

    pub fn role_mut(&mut self) -> &mut S {
        &mut self.env.role
    }

    pub fn logger(&self) -> &Logger {
        &self.env.logger
    }

    /// Takes the first matching message out of the mailbox, if any.
    pub fn receive(&self, template: &MessageTemplate) -> Option<Message> {
        self.env.mailbox.receive(template)
    }

    /// Fire-and-forget send. Unknown receivers are logged and skipped.
    ///
    /// # Returns
    /// `true` when every receiver had a mailbox to take the message.
    pub fn send(&self, message: Message) -> bool {
        self.env.logger.debug(&format!("send {}", message));
        let unreachable = self.env.bus.send(message);
        for receiver in &unreachable {
            self.env
                .logger
                .warn(&format!("No mailbox for '{}', message dropped", receiver));
        }
        unreachable.is_empty()
    }

    /// Agents currently offering `capability`, in registration order.
    pub fn search(&self, capability: &str) -> Vec<AgentDescriptor> {
        self.env.directory.lookup(capability)
    }

    /// Schedules another behaviour on this agent. It runs from the next pass on.
    pub fn add_behaviour<B>(&mut self, behaviour: B)
    where
        B: Behaviour<S> + 'static,
    {
        self.spawned.push(Box::new(behaviour));
    }

    /// Asks the agent to stop once the current pass is over.
    pub fn do_delete(&mut self) {
        self.env.delete_requested = true;
    }
}

/// Runs its step once, then finishes.
pub struct OneShot<S, F> {
    name: String,
    step: Option<F>,
    _role: PhantomData<fn(&mut S)>,
}

impl<S, F> OneShot<S, F>
where
    F: FnOnce(&mut Context<'_, S>) + Send,
{
    pub fn new(name: &str, step: F) -> Self {
        Self {
            name: name.to_string(),
            step: Some(step),
            _role: PhantomData,
        }
    }
}

impl<S, F> Behaviour<S> for OneShot<S, F>
where
    F: FnOnce(&mut Context<'_, S>) + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn action(&mut self, ctx: &mut Context<'_, S>) -> Status {
        if let Some(step) = self.step.take() {
            step(ctx);
        }
        Status::Done
    }
}

/// Runs its step on every pass, forever. A `Done` from the step counts as progress.
pub struct Cyclic<S, F> {
    name: String,
    step: F,
    _role: PhantomData<fn(&mut S)>,
}

impl<S, F> Cyclic<S, F>
where
    F: FnMut(&mut Context<'_, S>) -> Status + Send,
{
    pub fn new(name: &str, step: F) -> Self {
        Self {
            name: name.to_string(),
            step,
            _role: PhantomData,
        }
    }
}

impl<S, F> Behaviour<S> for Cyclic<S, F>
where
    F: FnMut(&mut Context<'_, S>) -> Status + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn action(&mut self, ctx: &mut Context<'_, S>) -> Status {
        match (self.step)(ctx) {
            Status::Blocked => Status::Blocked,
            Status::Progressed | Status::Done => Status::Progressed,
        }
    }
}
