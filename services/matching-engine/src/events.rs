//! Event payloads emitted by the matching engine
//!
//! Subscribers receive these by value; prices are integer minor units.

use serde::{Deserialize, Serialize};
use types::ids::{OrderId, TraderId};
use types::numeric::{Price, Quantity};
use types::order::Side;

/// A trade between an aggressing order and a resting order
///
/// Remaining quantities are post-trade. Emitted once per fill, best level
/// first and in time priority within a level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeExecutedEvent {
    pub symbol: String,
    pub price: Price,
    pub quantity: Quantity,
    pub aggressing_order_id: OrderId,
    pub aggressing_trader_id: TraderId,
    pub aggressing_side: Side,
    pub aggressing_remaining_quantity: Quantity,
    pub resting_order_id: OrderId,
    pub resting_trader_id: TraderId,
    pub resting_remaining_quantity: Quantity,
    pub timestamp_ms: i64,
}

/// A limit order's remainder came to rest on the book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderAcceptedEvent {
    pub order_id: OrderId,
    pub price: Price,
    /// Remaining quantity at rest
    pub quantity: Quantity,
}

/// An order left the book unfilled: explicit cancel, or the undischarged
/// remainder of a market order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCancelledEvent {
    pub order_id: OrderId,
    /// Quantity still unfilled at cancellation
    pub quantity: Quantity,
}

/// Last-trade marker for market data consumers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketDataEvent {
    pub symbol: String,
    pub last_price: Price,
    pub timestamp_ms: i64,
}
