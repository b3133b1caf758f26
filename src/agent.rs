// agent.rs
use crate::behaviour::Behaviour;
use crate::directory::{AgentDescriptor, DirectoryRegistry};
use crate::logging::Logger;
use crate::mailbox::{Mailbox, MessageBus};
use crate::scheduler::{PassReport, Scheduler};
use crate::state::AgentState;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Business state of an agent: buyer, inventory or supplier.
pub trait Role: Send + 'static {
    /// Last chance to flush state before the agent leaves the platform.
    fn take_down(&mut self, _logger: &Logger) {}
}

/// Everything a behaviour may touch while it runs. Owned by exactly one agent.
pub struct AgentEnv<S> {
    pub(crate) name: String,
    pub(crate) role: S,
    pub(crate) mailbox: Arc<Mailbox>,
    pub(crate) bus: Arc<MessageBus>,
    pub(crate) directory: Arc<DirectoryRegistry>,
    pub(crate) logger: Logger,
    pub(crate) delete_requested: bool,
}

impl<S> AgentEnv<S> {
    pub(crate) fn new(
        name: &str,
        role: S,
        mailbox: Arc<Mailbox>,
        bus: Arc<MessageBus>,
        directory: Arc<DirectoryRegistry>,
        logger: Logger,
    ) -> Self {
        Self {
            name: name.to_string(),
            role,
            mailbox,
            bus,
            directory,
            logger,
            delete_requested: false,
        }
    }
}

/// An independently scheduled participant: one mailbox, one behaviour set, one role.
pub struct Agent<S: Role> {
    env: AgentEnv<S>,
    scheduler: Scheduler<S>,
    state: AgentState,
    registered: Vec<String>,
    tick: Duration,
}

impl<S: Role> Agent<S> {
    /// Creates the agent and makes its mailbox reachable on `bus` under `name`.
    pub fn new(
        name: &str,
        role: S,
        bus: Arc<MessageBus>,
        directory: Arc<DirectoryRegistry>,
        logger: Logger,
    ) -> Self {
        let mailbox = Mailbox::new();
        bus.attach(name, mailbox.clone());
        Self {
            env: AgentEnv::new(name, role, mailbox, bus, directory, logger),
            scheduler: Scheduler::new(),
            state: AgentState::Initiated,
            registered: Vec::new(),
            tick: Duration::from_millis(50),
        }
    }

    /// Longest time the agent stays parked without mail before re-running its behaviours.
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    pub fn name(&self) -> &str {
        &self.env.name
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    pub fn role(&self) -> &S {
        &self.env.role
    }

    pub fn role_mut(&mut self) -> &mut S {
        &mut self.env.role
    }

    pub fn mailbox(&self) -> &Arc<Mailbox> {
        &self.env.mailbox
    }

    pub fn behaviour_names(&self) -> Vec<&str> {
        self.scheduler.names()
    }

    /// Advertises `capability` in the directory under this agent's name.
    pub fn register(&mut self, capability: &str, service: &str) {
        self.env
            .directory
            .register(AgentDescriptor::new(&self.env.name, capability, service));
        self.registered.push(capability.to_string());
        self.env.logger.info(&format!(
            "Registered {} ({}) with the directory",
            capability, service
        ));
    }

    pub fn add_behaviour<B>(&mut self, behaviour: B)
    where
        B: Behaviour<S> + 'static,
    {
        self.scheduler.add(Box::new(behaviour));
    }

    /// Runs one scheduling pass and updates the lifecycle state.
    pub fn run_pass(&mut self) -> PassReport {
        if self.state == AgentState::Deleted {
            return PassReport::default();
        }
        let report = self.scheduler.run_pass(&mut self.env);
        self.state = if report.progressed {
            AgentState::Active
        } else {
            AgentState::Waiting
        };
        report
    }

    /// Drives the agent until shutdown is signalled, it deletes itself, or it runs out
    /// of behaviours. Returns the role so its final state can be inspected.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> S {
        self.env
            .logger
            .info(&format!("{} is ready.", self.env.name));

        loop {
            if *shutdown.borrow() {
                break;
            }
            let report = self.run_pass();
            if self.env.delete_requested || report.remaining == 0 {
                break;
            }
            if report.progressed {
                tokio::task::yield_now().await;
                continue;
            }

            let mailbox = self.env.mailbox.clone();
            tokio::select! {
                _ = mailbox.notified() => {}
                _ = tokio::time::sleep(self.tick) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        self.take_down();
        self.env.role
    }

    /// Flushes the role, leaves the directory and the bus. Idempotent.
    pub fn take_down(&mut self) {
        if self.state == AgentState::Deleted {
            return;
        }
        self.env.role.take_down(&self.env.logger);
        if !self.registered.is_empty() {
            self.env.directory.deregister(&self.env.name);
            self.registered.clear();
        }
        self.env.bus.detach(&self.env.name);
        self.state = AgentState::Deleted;
        self.env
            .logger
            .info(&format!("{} terminating.", self.env.name));
    }
}
