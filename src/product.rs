// product.rs
use serde::{Deserialize, Serialize};
use std::fmt;

/// A catalog entry held by the inventory ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Unique key.
    pub id: String,

    /// Display name. Must not contain `,` or `|`.
    pub name: String,

    /// Units in stock.
    pub quantity: u32,

    /// Restock trigger point.
    pub threshold: u32,

    /// Unit price.
    pub price: f64,
}

impl Product {
    pub fn new(id: &str, name: &str, quantity: u32, threshold: u32, price: f64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            quantity,
            threshold,
            price,
        }
    }

    /// True once stock has fallen strictly below the threshold.
    pub fn needs_restock(&self) -> bool {
        self.quantity < self.threshold
    }

    /// Number of units ordered from the supplier when restocking.
    pub fn restock_amount(&self) -> u32 {
        self.threshold.saturating_mul(2)
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Product[ID={}, Name={}, Quantity={}, Threshold={}, Price={:.2}]",
            self.id, self.name, self.quantity, self.threshold, self.price
        )
    }
}

/// Catalog used on first start and whenever the persisted one cannot be read.
pub fn default_catalog() -> Vec<Product> {
    vec![
        Product::new("LAPTOP001", "Dell Laptop", 5, 3, 999.99),
        Product::new("MOUSE001", "Logitech Mouse", 15, 5, 29.99),
        Product::new("KEYBOARD001", "Mechanical Keyboard", 8, 4, 89.99),
    ]
}

#[test]
fn test_needs_restock() {
    let mut laptop = Product::new("LAPTOP001", "Dell Laptop", 3, 3, 999.99);
    assert!(!laptop.needs_restock());
    laptop.quantity = 2;
    assert!(laptop.needs_restock());
    assert_eq!(laptop.restock_amount(), 6);
}

#[test]
fn test_display() {
    let mouse = Product::new("MOUSE001", "Logitech Mouse", 15, 5, 29.99);
    assert_eq!(
        mouse.to_string(),
        "Product[ID=MOUSE001, Name=Logitech Mouse, Quantity=15, Threshold=5, Price=29.99]"
    );
}
