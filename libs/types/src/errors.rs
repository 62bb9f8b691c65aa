//! Error taxonomy for the matching engine
//!
//! Validation errors surface synchronously at order construction; book
//! errors split into the one recoverable case (cancelling an unknown id)
//! and programming errors that are fatal to the engine.

use crate::ids::OrderId;
use thiserror::Error;

/// Rejections raised while constructing an order, before submission
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    #[error("invalid price {0:?}: expected digits with exactly two decimal places, e.g. \"100.00\"")]
    InvalidPrice(String),

    #[error("invalid quantity: must be positive")]
    InvalidQuantity,
}

/// Failures raised by order book operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookError {
    #[error("order id {0} already exists in the book")]
    DuplicateOrderId(OrderId),

    #[error("order id {0} is not in the book")]
    UnknownOrderId(OrderId),
}

/// Engine lifecycle errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("engine is already running")]
    AlreadyRunning,
}
