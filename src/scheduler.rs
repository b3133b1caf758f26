// scheduler.rs
use crate::agent::AgentEnv;
use crate::behaviour::{Behaviour, Context, Status};

/// Summary of one scheduling pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Behaviours that ran during the pass.
    pub ran: usize,
    /// Behaviours that finished and were dropped.
    pub finished: usize,
    /// Behaviours left after the pass, including newly added ones.
    pub remaining: usize,
    /// Whether anything moved forward. A pass without progress lets the agent park.
    pub progressed: bool,
}

/// Cooperative round-robin driver of one agent's behaviours.
pub struct Scheduler<S> {
    behaviours: Vec<Box<dyn Behaviour<S>>>,
}

impl<S> Default for Scheduler<S> {
    fn default() -> Self {
        Self {
            behaviours: Vec::new(),
        }
    }
}

impl<S> Scheduler<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, behaviour: Box<dyn Behaviour<S>>) {
        self.behaviours.push(behaviour);
    }

    pub fn is_empty(&self) -> bool {
        self.behaviours.is_empty()
    }

    /// Names of the active behaviours, in scheduling order.
    pub fn names(&self) -> Vec<&str> {
        self.behaviours.iter().map(|b| b.name()).collect()
    }

    /// Runs every active behaviour once, in the order they were added.
    ///
    /// Finished behaviours are dropped. Behaviours added while the pass runs are appended
    /// at the end and first run on the next pass.
    pub fn run_pass(&mut self, env: &mut AgentEnv<S>) -> PassReport {
        let mut spawned: Vec<Box<dyn Behaviour<S>>> = Vec::new();
        let mut report = PassReport::default();

        self.behaviours.retain_mut(|behaviour| {
            let mut ctx = Context::new(&mut *env, &mut spawned);
            let status = behaviour.action(&mut ctx);
            report.ran += 1;
            match status {
                Status::Progressed => {
                    report.progressed = true;
                    true
                }
                Status::Blocked => true,
                Status::Done => {
                    report.progressed = true;
                    report.finished += 1;
                    false
                }
            }
        });

        if !spawned.is_empty() {
            report.progressed = true;
            self.behaviours.append(&mut spawned);
        }
        report.remaining = self.behaviours.len();
        report
    }
}
