//! Order lifecycle types
//!
//! An order is a tagged record: limit orders carry a price, market orders
//! do not and may never rest on the book. Validation happens in the
//! constructors so the engine only ever sees well-formed orders.

use crate::errors::OrderError;
use crate::ids::{OrderId, TraderId};
use crate::numeric::{Price, Quantity};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Order side (buyer or seller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy order (bid)
    Buy,
    /// Sell order (ask)
    Sell,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Order type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    Limit,
    Market,
}

/// Order status
///
/// Market orders never enter `Accepted`: an unfilled market remainder goes
/// straight from `New` (or `PartiallyFilled`) to `Cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Created, not yet processed by the engine
    New,
    /// Resting on the book (terminal only for the submission pass)
    Accepted,
    /// Matched for part of its quantity
    PartiallyFilled,
    /// Matched completely (terminal)
    Filled,
    /// Removed by explicit cancel or as an unfilled market remainder (terminal)
    Cancelled,
    /// Failed validation (terminal)
    Rejected,
}

impl OrderStatus {
    /// Check if the status admits no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Rejected
        )
    }
}

/// Type-specific payload of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum OrderKind {
    /// Limit order with its fixed-point price
    Limit { price: Price },
    /// Market order; matches at whatever the opposing side offers
    Market,
}

/// A single order
///
/// `quantity` is the remaining quantity: it starts at the submitted size
/// and only ever decreases as the order fills.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub trader_id: TraderId,
    pub symbol: String,
    pub side: Side,
    pub quantity: Quantity,
    pub status: OrderStatus,
    pub timestamp_ms: i64,
    pub kind: OrderKind,
}

impl Order {
    /// Create a new limit order
    ///
    /// The price string must carry exactly two fractional digits
    /// (`"100.00"`); anything else is rejected here, before the engine is
    /// involved.
    pub fn limit(
        symbol: impl Into<String>,
        side: Side,
        price: &str,
        quantity: u32,
        trader_id: TraderId,
    ) -> Result<Self, OrderError> {
        let price: Price = price.parse()?;
        if quantity == 0 {
            return Err(OrderError::InvalidQuantity);
        }
        Ok(Self {
            order_id: OrderId::NONE,
            trader_id,
            symbol: symbol.into(),
            side,
            quantity: Quantity::new(quantity),
            status: OrderStatus::New,
            timestamp_ms: unix_millis(),
            kind: OrderKind::Limit { price },
        })
    }

    /// Create a new market order
    pub fn market(
        symbol: impl Into<String>,
        side: Side,
        quantity: u32,
        trader_id: TraderId,
    ) -> Result<Self, OrderError> {
        if quantity == 0 {
            return Err(OrderError::InvalidQuantity);
        }
        Ok(Self {
            order_id: OrderId::NONE,
            trader_id,
            symbol: symbol.into(),
            side,
            quantity: Quantity::new(quantity),
            status: OrderStatus::New,
            timestamp_ms: unix_millis(),
            kind: OrderKind::Market,
        })
    }

    /// The order type tag for this order's payload
    pub fn order_type(&self) -> OrderType {
        match self.kind {
            OrderKind::Limit { .. } => OrderType::Limit,
            OrderKind::Market => OrderType::Market,
        }
    }

    /// The limit price, if this is a limit order
    pub fn limit_price(&self) -> Option<Price> {
        match self.kind {
            OrderKind::Limit { price } => Some(price),
            OrderKind::Market => None,
        }
    }

    /// Check if the order has no remaining quantity
    pub fn is_filled(&self) -> bool {
        self.quantity.is_zero()
    }
}

/// Current wall-clock time in Unix milliseconds
pub fn unix_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
