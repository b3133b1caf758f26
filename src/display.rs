// display.rs
//! Boundary between the buyer agent and whatever shows the catalog to a person.

use crate::product::Product;
use std::sync::mpsc::{self, Receiver, Sender};

/// Updates from the buyer to the display.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayEvent {
    Catalog(Vec<Product>),
    Log(String),
    PurchaseOutcome { success: bool, text: String },
}

/// User requests from the display to the buyer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayCommand {
    Refresh,
    Purchase { product_id: String, quantity: u32 },
}

/// Sending half handed to the buyer. A closed display is not an error.
#[derive(Debug, Clone)]
pub struct DisplayHandle {
    tx: Sender<DisplayEvent>,
}

impl DisplayHandle {
    pub fn new(tx: Sender<DisplayEvent>) -> Self {
        Self { tx }
    }

    pub fn catalog(&self, products: Vec<Product>) {
        let _ = self.tx.send(DisplayEvent::Catalog(products));
    }

    pub fn log(&self, line: impl Into<String>) {
        let _ = self.tx.send(DisplayEvent::Log(line.into()));
    }

    pub fn outcome(&self, success: bool, text: impl Into<String>) {
        let _ = self.tx.send(DisplayEvent::PurchaseOutcome {
            success,
            text: text.into(),
        });
    }
}

pub fn channel() -> (DisplayHandle, Receiver<DisplayEvent>) {
    let (tx, rx) = mpsc::channel();
    (DisplayHandle::new(tx), rx)
}
