// error.rs
use std::io;
use thiserror::Error;

/// Content that does not follow the delimited sub-protocol carried in `Message::content`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("malformed content '{content}': {reason}")]
    Malformed { content: String, reason: String },
}

impl ProtocolError {
    pub fn malformed(content: &str, reason: impl Into<String>) -> Self {
        ProtocolError::Malformed {
            content: content.to_string(),
            reason: reason.into(),
        }
    }
}

/// Business refusals of a purchase. The `Display` text is the FAILURE reply content.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PurchaseError {
    #[error("Product not found: {product_id}")]
    UnknownProduct { product_id: String },

    #[error("Insufficient stock! Available: {available}, Requested: {requested}")]
    InsufficientStock { available: u32, requested: u32 },
}

/// Catalog load/save failures. Never fatal: callers fall back or log.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("catalog I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("catalog encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read configuration: {0}")]
    Io(#[from] io::Error),

    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_texts() {
        let unknown = PurchaseError::UnknownProduct {
            product_id: "TABLET001".to_string(),
        };
        assert_eq!(unknown.to_string(), "Product not found: TABLET001");

        let short = PurchaseError::InsufficientStock {
            available: 5,
            requested: 100,
        };
        assert_eq!(
            short.to_string(),
            "Insufficient stock! Available: 5, Requested: 100"
        );
    }
}
