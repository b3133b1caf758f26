// protocol.rs
//! Colon/comma delimited payloads carried in `Message::content`.

use crate::error::ProtocolError;
use crate::product::Product;

pub const PURCHASE_CONVERSATION: &str = "purchase-request";
pub const RESTOCK_CONVERSATION: &str = "restock-request";
pub const PRODUCT_LIST_CONVERSATION: &str = "product-list";

pub const INVENTORY_CAPABILITY: &str = "inventory-management";
pub const SUPPLIER_CAPABILITY: &str = "supplier-service";

pub const GET_PRODUCTS: &str = "GET_PRODUCTS";

/// A product/quantity pair as carried by `PURCHASE`, `RESTOCK` and `RESTOCKED`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub product_id: String,
    pub quantity: u32,
}

impl Order {
    pub fn new(product_id: impl Into<String>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

pub fn encode_purchase(order: &Order) -> String {
    encode_order("PURCHASE", order)
}

pub fn decode_purchase(content: &str) -> Result<Order, ProtocolError> {
    decode_order("PURCHASE", content)
}

pub fn encode_restock(order: &Order) -> String {
    encode_order("RESTOCK", order)
}

pub fn decode_restock(content: &str) -> Result<Order, ProtocolError> {
    decode_order("RESTOCK", content)
}

pub fn encode_restocked(order: &Order) -> String {
    encode_order("RESTOCKED", order)
}

pub fn decode_restocked(content: &str) -> Result<Order, ProtocolError> {
    decode_order("RESTOCKED", content)
}

fn encode_order(verb: &str, order: &Order) -> String {
    format!("{}:{}:{}", verb, order.product_id, order.quantity)
}

fn decode_order(verb: &str, content: &str) -> Result<Order, ProtocolError> {
    let parts: Vec<&str> = content.split(':').collect();
    if parts.len() != 3 {
        return Err(ProtocolError::malformed(
            content,
            format!("expected {}:<productId>:<quantity>", verb),
        ));
    }
    if parts[0] != verb {
        return Err(ProtocolError::malformed(
            content,
            format!("expected verb {}", verb),
        ));
    }
    if parts[1].is_empty() {
        return Err(ProtocolError::malformed(content, "empty product id"));
    }
    let quantity: u32 = parts[2]
        .parse()
        .map_err(|_| ProtocolError::malformed(content, "quantity is not a non-negative integer"))?;
    if quantity == 0 {
        return Err(ProtocolError::malformed(content, "quantity must be positive"));
    }
    Ok(Order::new(parts[1], quantity))
}

/// Encodes a catalog snapshot as `id,name,quantity,threshold,price|` records.
pub fn encode_catalog<'a, I>(products: I) -> String
where
    I: IntoIterator<Item = &'a Product>,
{
    let mut out = String::new();
    for p in products {
        out.push_str(&format!(
            "{},{},{},{},{}|",
            p.id, p.name, p.quantity, p.threshold, p.price
        ));
    }
    out
}

/// Decodes a catalog snapshot. Empty records (the trailing separator) are skipped.
pub fn decode_catalog(content: &str) -> Result<Vec<Product>, ProtocolError> {
    let mut products = Vec::new();
    for record in content.split('|') {
        if record.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = record.split(',').collect();
        if fields.len() != 5 {
            return Err(ProtocolError::malformed(record, "expected 5 fields"));
        }
        let quantity = fields[2]
            .parse()
            .map_err(|_| ProtocolError::malformed(record, "bad quantity"))?;
        let threshold = fields[3]
            .parse()
            .map_err(|_| ProtocolError::malformed(record, "bad threshold"))?;
        let price: f64 = fields[4]
            .parse()
            .map_err(|_| ProtocolError::malformed(record, "bad price"))?;
        if !price.is_finite() || price < 0.0 {
            return Err(ProtocolError::malformed(record, "price must be non-negative"));
        }
        products.push(Product {
            id: fields[0].to_string(),
            name: fields[1].to_string(),
            quantity,
            threshold,
            price,
        });
    }
    Ok(products)
}
