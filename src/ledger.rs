// ledger.rs
use crate::error::{PersistenceError, PurchaseError};
use crate::logging::Logger;
use crate::product::Product;
use crate::protocol::Order;
use std::collections::HashSet;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// JSON snapshot of the catalog on disk.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    path: PathBuf,
}

impl CatalogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn load(&self) -> Result<Vec<Product>, PersistenceError> {
        let mut file = File::open(&self.path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn save(&self, products: &[Product]) -> Result<(), PersistenceError> {
        let json = serde_json::to_string_pretty(products)?;
        let mut file = File::create(&self.path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

/// A committed purchase.
#[derive(Debug, Clone, PartialEq)]
pub struct Sale {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub remaining: u32,
    /// Set when this sale left the product below its threshold and no restock is
    /// outstanding for it yet.
    pub restock_due: Option<Order>,
}

impl Sale {
    /// INFORM reply content sent back to the buyer.
    pub fn receipt(&self) -> String {
        format!(
            "Purchase successful! {} x {}. Remaining stock: {}",
            self.quantity, self.product_name, self.remaining
        )
    }
}

/// Stock, thresholds and prices, plus the purchase and restock transactions.
///
/// Owned by the inventory agent alone; every mutation goes through `&mut self`, so a
/// check-then-decrement can never interleave with another transaction.
#[derive(Debug)]
pub struct InventoryLedger {
    products: Vec<Product>,
    restock_pending: HashSet<String>,
    store: Option<CatalogStore>,
    logger: Logger,
}

impl InventoryLedger {
    /// An in-memory ledger, or one backed by `store` without touching the disk yet.
    pub fn new(products: Vec<Product>, store: Option<CatalogStore>, logger: Logger) -> Self {
        Self {
            products,
            restock_pending: HashSet::new(),
            store,
            logger,
        }
    }

    /// Loads the persisted catalog, falling back to `initial` when there is none or it
    /// cannot be read. A fresh catalog is written out straight away.
    pub fn open(store: Option<CatalogStore>, initial: Vec<Product>, logger: Logger) -> Self {
        let Some(store) = store else {
            logger.info("Using in-memory inventory");
            return Self::new(initial, None, logger);
        };

        if store.exists() {
            match store.load() {
                Ok(products) => {
                    logger.info(&format!(
                        "Loaded inventory from {}",
                        store.path().display()
                    ));
                    return Self::new(products, Some(store), logger);
                }
                Err(e) => logger.error(&format!("Error loading inventory: {}", e)),
            }
        }

        let ledger = Self::new(initial, Some(store), logger);
        ledger.logger.info("Initialized new inventory");
        ledger.save();
        ledger
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn get(&self, product_id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == product_id)
    }

    pub fn is_restock_pending(&self, product_id: &str) -> bool {
        self.restock_pending.contains(product_id)
    }

    /// Sells `order.quantity` units, or refuses without touching the stock.
    pub fn purchase(&mut self, order: &Order) -> Result<Sale, PurchaseError> {
        let product = self
            .products
            .iter_mut()
            .find(|p| p.id == order.product_id)
            .ok_or_else(|| PurchaseError::UnknownProduct {
                product_id: order.product_id.clone(),
            })?;

        if product.quantity < order.quantity {
            return Err(PurchaseError::InsufficientStock {
                available: product.quantity,
                requested: order.quantity,
            });
        }

        product.quantity -= order.quantity;
        let restock_due = (product.needs_restock()
            && !self.restock_pending.contains(&product.id))
        .then(|| Order::new(product.id.clone(), product.restock_amount()));
        let sale = Sale {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            quantity: order.quantity,
            remaining: product.quantity,
            restock_due,
        };

        self.save();
        Ok(sale)
    }

    /// Records that a restock request for `product_id` is on its way to a supplier.
    pub fn mark_restock_requested(&mut self, product_id: &str) {
        self.restock_pending.insert(product_id.to_string());
    }

    /// Adds delivered units. Returns the new stock level.
    pub fn restock(&mut self, order: &Order) -> Result<u32, PurchaseError> {
        let product = self
            .products
            .iter_mut()
            .find(|p| p.id == order.product_id)
            .ok_or_else(|| PurchaseError::UnknownProduct {
                product_id: order.product_id.clone(),
            })?;

        product.quantity = product.quantity.saturating_add(order.quantity);
        let quantity = product.quantity;
        self.restock_pending.remove(&order.product_id);
        self.save();
        Ok(quantity)
    }

    /// Writes the catalog out. Failures are logged, never returned.
    pub fn save(&self) {
        let Some(store) = &self.store else {
            return;
        };
        match store.save(&self.products) {
            Ok(()) => self.logger.debug("Saved inventory to file"),
            Err(e) => self
                .logger
                .error(&format!("Error saving inventory: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::default_catalog;
    use tempfile::tempdir;

    fn ledger() -> InventoryLedger {
        InventoryLedger::new(default_catalog(), None, Logger::quiet("inventory"))
    }

    fn stock(ledger: &InventoryLedger, id: &str) -> u32 {
        ledger.get(id).map(|p| p.quantity).unwrap()
    }

    #[test]
    fn test_purchase_decrements() {
        let mut ledger = ledger();
        let sale = ledger.purchase(&Order::new("LAPTOP001", 2)).unwrap();

        assert_eq!(sale.remaining, 3);
        assert_eq!(
            sale.receipt(),
            "Purchase successful! 2 x Dell Laptop. Remaining stock: 3"
        );
        assert!(sale.restock_due.is_none());
        assert_eq!(stock(&ledger, "LAPTOP001"), 3);
    }

    #[test]
    fn test_insufficient_stock_does_not_mutate() {
        let mut ledger = ledger();
        let err = ledger.purchase(&Order::new("LAPTOP001", 100)).unwrap_err();

        assert_eq!(
            err,
            PurchaseError::InsufficientStock {
                available: 5,
                requested: 100
            }
        );
        assert_eq!(stock(&ledger, "LAPTOP001"), 5);
    }

    #[test]
    fn test_unknown_product() {
        let mut ledger = ledger();
        let before = ledger.products().to_vec();
        let err = ledger.purchase(&Order::new("TABLET001", 1)).unwrap_err();

        assert_eq!(err.to_string(), "Product not found: TABLET001");
        assert_eq!(ledger.products(), before.as_slice());
    }

    #[test]
    fn test_selling_out_exactly() {
        let mut ledger = ledger();
        let sale = ledger.purchase(&Order::new("LAPTOP001", 5)).unwrap();
        assert_eq!(sale.remaining, 0);
        assert!(ledger.purchase(&Order::new("LAPTOP001", 1)).is_err());
    }

    #[test]
    fn test_one_restock_per_crossing() {
        let mut ledger = ledger();

        let sale = ledger.purchase(&Order::new("LAPTOP001", 2)).unwrap();
        assert!(sale.restock_due.is_none());

        let sale = ledger.purchase(&Order::new("LAPTOP001", 1)).unwrap();
        assert_eq!(sale.restock_due, Some(Order::new("LAPTOP001", 6)));
        ledger.mark_restock_requested("LAPTOP001");

        let sale = ledger.purchase(&Order::new("LAPTOP001", 1)).unwrap();
        assert!(sale.restock_due.is_none());

        assert_eq!(ledger.restock(&Order::new("LAPTOP001", 6)).unwrap(), 7);
        assert!(!ledger.is_restock_pending("LAPTOP001"));

        let sale = ledger.purchase(&Order::new("LAPTOP001", 5)).unwrap();
        assert_eq!(sale.restock_due, Some(Order::new("LAPTOP001", 6)));
    }

    #[test]
    fn test_unsent_restock_is_offered_again() {
        let mut ledger = ledger();
        let sale = ledger.purchase(&Order::new("LAPTOP001", 3)).unwrap();
        assert!(sale.restock_due.is_some());

        let sale = ledger.purchase(&Order::new("LAPTOP001", 1)).unwrap();
        assert!(sale.restock_due.is_some());
    }

    #[test]
    fn test_restock_unknown_product() {
        let mut ledger = ledger();
        assert!(ledger.restock(&Order::new("TABLET001", 4)).is_err());
    }

    #[test]
    fn test_stock_is_conserved() {
        let mut ledger = ledger();
        let ids = ["LAPTOP001", "MOUSE001", "KEYBOARD001"];
        let initial: Vec<u32> = ids.iter().map(|id| stock(&ledger, id)).collect();
        let mut sold = [0u32; 3];
        let mut delivered = [0u32; 3];

        // Small LCG so the sequence is reproducible.
        let mut seed: u32 = 7;
        for _ in 0..500 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let which = (seed >> 16) as usize % 3;
            let amount = (seed >> 8) % 7 + 1;
            if seed % 4 == 0 {
                ledger.restock(&Order::new(ids[which], amount)).unwrap();
                delivered[which] += amount;
            } else if ledger.purchase(&Order::new(ids[which], amount)).is_ok() {
                sold[which] += amount;
            }
        }

        for (i, id) in ids.iter().enumerate() {
            assert_eq!(stock(&ledger, id), initial[i] + delivered[i] - sold[i]);
        }
    }

    #[test]
    fn test_open_initializes_and_persists() {
        let dir = tempdir().unwrap();
        let store = CatalogStore::new(dir.path().join("inventory.json"));

        let mut ledger = InventoryLedger::open(Some(store.clone()), default_catalog(), Logger::quiet("inventory"));
        assert!(store.exists());
        ledger.purchase(&Order::new("MOUSE001", 4)).unwrap();

        let reopened = InventoryLedger::open(Some(store), Vec::new(), Logger::quiet("inventory"));
        assert_eq!(reopened.get("MOUSE001").unwrap().quantity, 11);
        assert_eq!(reopened.products().len(), 3);
    }

    #[test]
    fn test_open_falls_back_on_corrupt_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("inventory.json");
        std::fs::write(&path, "not json").unwrap();

        let ledger = InventoryLedger::open(Some(CatalogStore::new(&path)), default_catalog(), Logger::quiet("inventory"));
        assert_eq!(ledger.products(), default_catalog().as_slice());
        assert!(CatalogStore::new(&path).load().is_ok());
    }

    #[test]
    fn test_save_failure_is_not_fatal() {
        let dir = tempdir().unwrap();
        let store = CatalogStore::new(dir.path().join("missing").join("inventory.json"));
        let mut ledger = InventoryLedger::new(default_catalog(), Some(store), Logger::quiet("inventory"));

        let sale = ledger.purchase(&Order::new("LAPTOP001", 1)).unwrap();
        assert_eq!(sale.remaining, 4);
    }
}
