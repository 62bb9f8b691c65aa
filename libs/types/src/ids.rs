//! Unique identifier types for engine entities
//!
//! Order ids are assigned by the engine from a monotonically increasing
//! counter, so they double as a total submission order. Zero is reserved as
//! the "no order" sentinel and is never handed to callers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an order
///
/// Strictly increasing, starting at 1. Comparing two ids tells you which
/// order was submitted first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(u64);

impl OrderId {
    /// Reserved sentinel meaning "no order"
    pub const NONE: OrderId = OrderId(0);

    /// Create from a raw id value
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw id value
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Check whether this is the reserved sentinel
    pub fn is_none(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identifier for the trader that placed an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraderId(u32);

impl TraderId {
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for TraderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
