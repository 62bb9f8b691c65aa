//! Ask (sell-side) order book
//!
//! Maintains sell levels sorted by price; the best ask is the lowest key.
//! Uses BTreeMap so best-price access is O(log P) and iteration order is
//! deterministic.

use std::collections::BTreeMap;
use types::ids::OrderId;
use types::numeric::Price;

use super::price_level::{OrderIndex, PriceLevel};
use super::LevelSnapshot;

/// Ask (sell) side of the book
///
/// At each price level, orders are maintained in FIFO order. A level exists
/// in the map if and only if it holds at least one order.
#[derive(Debug, Default)]
pub struct AskBook {
    levels: BTreeMap<Price, PriceLevel>,
}

impl AskBook {
    /// Create a new empty ask book
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
            .expect("ask level missing for indexed order");
        level.unlink(index, id);
        if level.is_empty() {
            self.levels.remove(&price);
        }
    }

    /// Shrink a level's aggregate after a partial fill
    pub(crate) fn reduce(&mut self, price: Price, delta: u64) {
        self.levels
            .get_mut(&price)
            .expect("ask level missing for indexed order")
            .reduce(delta);
    }

    /// Snapshot of the best (lowest) ask level
    pub(crate) fn best(&self, index: &OrderIndex) -> Option<LevelSnapshot> {
        // BTreeMap iterates ascending, so the best ask is the first entry
        self.levels.iter().next().map(|(price, level)| LevelSnapshot {
            price: *price,
            quantity: level.total_quantity(),
            orders: level.order_ids(index),
        })
    }

    /// Check if the ask side is empty
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Number of populated price levels
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::super::price_level::OrderNode;
    use super::*;
    use types::ids::TraderId;
    use types::order::{Order, Side};

    fn seed(book: &mut AskBook, index: &mut OrderIndex, id: u64, price: &str, qty: u32) {
        let mut order = Order::limit("AAPL", Side::Sell, price, qty, TraderId::new(1)).unwrap();
        order.order_id = OrderId::new(id);
        let id = order.order_id;
        let price = order.limit_price().unwrap();
        index.insert(id, OrderNode::new(order));
        book.insert(index, id, price);
    }

    #[test]
    fn test_best_ask_is_lowest_price() {
        let mut book = AskBook::new();
        let mut index = OrderIndex::new();

        seed(&mut book, &mut index, 1, "102.00", 10);
        seed(&mut book, &mut index, 2, "101.00", 5);
        seed(&mut book, &mut index, 3, "103.00", 7);

        let best = book.best(&index).unwrap();
        assert_eq!(best.price, "101.00".parse().unwrap());
        assert_eq!(best.quantity, 5);
        assert_eq!(best.orders, vec![OrderId::new(2)]);
    }

    #[test]
    fn test_unlink_deletes_empty_level() {
        let mut book = AskBook::new();
        let mut index = OrderIndex::new();

        seed(&mut book, &mut index, 1, "101.00", 10);
        seed(&mut book, &mut index, 2, "102.00", 4);
        book.unlink(&mut index, OrderId::new(1), "101.00".parse().unwrap());
        index.remove(&OrderId::new(1));

        assert_eq!(book.level_count(), 1);
        let best = book.best(&index).unwrap();
        assert_eq!(best.price, "102.00".parse().unwrap());
    }
}
