// platform.rs
//! Wires the shared directory and message bus, then starts the three agents.

use crate::agent::{Agent, Role};
use crate::buyer;
use crate::config::Config;
use crate::directory::DirectoryRegistry;
use crate::display::{DisplayCommand, DisplayHandle};
use crate::inventory;
use crate::logging::Logger;
use crate::mailbox::MessageBus;
use crate::supplier;
use std::io;
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::thread;
use tokio::runtime::Runtime;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// One coordination domain: a directory, a bus and the agents running on them.
pub struct Platform {
    config: Config,
    directory: Arc<DirectoryRegistry>,
    bus: Arc<MessageBus>,
    runtime: Runtime,
    shutdown: watch::Sender<bool>,
    agents: Vec<(String, JoinHandle<()>)>,
    logger: Logger,
}

impl Platform {
    /// Creates the platform and the multi-threaded runtime its agents run on.
    pub fn new(config: Config) -> io::Result<Self> {
        let runtime = Runtime::new()?;
        let (shutdown, _) = watch::channel(false);
        let logger = Logger::new("platform", config.debug);
        Ok(Self {
            config,
            directory: DirectoryRegistry::new(),
            bus: MessageBus::new(),
            runtime,
            shutdown,
            agents: Vec::new(),
            logger,
        })
    }

    pub fn directory(&self) -> &Arc<DirectoryRegistry> {
        &self.directory
    }

    /// Names of the agents started so far.
    pub fn agents(&self) -> Vec<&str> {
        self.agents.iter().map(|(name, _)| name.as_str()).collect()
    }

    fn agent_logger(&self, tag: &str) -> Logger {
        Logger::new(tag, self.config.debug)
    }

    fn launch<S: Role>(&mut self, agent: Agent<S>) {
        let name = agent.name().to_string();
        let stopped = self.shutdown.subscribe();
        let handle = self.runtime.spawn(async move {
            agent.run(stopped).await;
        });
        self.agents.push((name, handle));
    }

    /// Starts supplier, inventory and buyer in that order, pausing between them so each
    /// one's services are registered before the next one looks them up.
    ///
    /// # Arguments
    /// * `display` - Where the buyer publishes catalog snapshots and activity.
    /// * `commands` - Refresh and purchase requests coming from the display.
    pub fn start(&mut self, display: DisplayHandle, commands: Receiver<DisplayCommand>) {
        let stagger = self.config.startup_stagger();

        let supplier = supplier::create(
            &self.config,
            self.bus.clone(),
            self.directory.clone(),
            self.agent_logger("supplier"),
        );
        self.launch(supplier);
        thread::sleep(stagger);

        let inventory = inventory::create(
            &self.config,
            self.bus.clone(),
            self.directory.clone(),
            self.agent_logger("inventory"),
        );
        self.launch(inventory);
        thread::sleep(stagger);

        let buyer = buyer::create(
            &self.config,
            self.bus.clone(),
            self.directory.clone(),
            self.agent_logger("buyer"),
            display,
            commands,
        );
        self.launch(buyer);

        self.logger
            .info(&format!("Started agents: {}", self.agents().join(", ")));
    }

    /// Signals every agent to stop and waits for their take-down to complete.
    ///
    /// # Returns
    /// Names of the agents whose task ended in a panic instead of a clean take-down.
    pub fn shutdown(self) -> Vec<String> {
        let Platform {
            runtime,
            shutdown,
            agents,
            logger,
            ..
        } = self;

        // No subscribers left just means every agent already stopped
        let _ = shutdown.send(true);
        let failed = runtime.block_on(async {
            let mut failed = Vec::new();
            for (name, handle) in agents {
                if let Err(e) = handle.await {
                    logger.error(&format!("Agent {} did not stop cleanly: {}", name, e));
                    failed.push(name);
                }
            }
            failed
        });
        logger.info("Platform stopped");
        failed
    }
}
