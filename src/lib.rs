// lib.rs
//! Buyer, inventory and supplier agents that trade stock purely through correlated messages.

pub mod agent;
pub mod behaviour;
pub mod buyer;
pub mod config;
pub mod directory;
pub mod display;
pub mod error;
pub mod inventory;
pub mod ledger;
pub mod logging;
pub mod mailbox;
pub mod message;
pub mod platform;
pub mod product;
pub mod protocol;
pub mod scheduler;
pub mod state;
pub mod supplier;
pub mod template;
pub mod ui;
