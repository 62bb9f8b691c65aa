//! Bid (buy-side) order book
//!
//! Maintains buy levels sorted by price; the best bid is the highest key.
//! Uses BTreeMap so best-price access is O(log P) and iteration order is
//! deterministic.

use std::collections::BTreeMap;
use types::ids::OrderId;
use types::numeric::Price;

use super::price_level::{OrderIndex, PriceLevel};
use super::LevelSnapshot;

/// Bid (buy) side of the book
///
/// At each price level, orders are maintained in FIFO order. A level exists
/// in the map if and only if it holds at least one order.
#[derive(Debug, Default)]
pub struct BidBook {
    levels: BTreeMap<Price, PriceLevel>,
}

impl BidBook {
    /// Create a new empty bid book
    pub fn new() -> Self {
        Self {
            levels: BTreeMap::new(),
        }
    }

    /// Link an indexed order into its price level
    pub(crate) fn insert(&mut self, index: &mut OrderIndex, id: OrderId, price: Price) {
        self.levels.entry(price).or_default().push(index, id);
    }

    /// Unlink an order from its level, deleting the level when it empties
    pub(crate) fn unlink(&mut self, index: &mut OrderIndex, id: OrderId, price: Price) {
        let level = self
            .levels
            .get_mut(&price)
            .expect("bid level missing for indexed order");
        level.unlink(index, id);
        if level.is_empty() {
            self.levels.remove(&price);
        }
    }

    /// Shrink a level's aggregate after a partial fill
    pub(crate) fn reduce(&mut self, price: Price, delta: u64) {
        self.levels
            .get_mut(&price)
            .expect("bid level missing for indexed order")
            .reduce(delta);
    }

    /// Snapshot of the best (highest) bid level
    pub(crate) fn best(&self, index: &OrderIndex) -> Option<LevelSnapshot> {
        // BTreeMap iterates ascending, so the best bid is the last entry
        self.levels.iter().next_back().map(|(price, level)| LevelSnapshot {
            price: *price,
            quantity: level.total_quantity(),
            orders: level.order_ids(index),
        })
    }

    /// Check if the bid side is empty
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Number of populated price levels
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }
}
