//! Two-sided price-time-priority order book
//!
//! `OrderBook` is the public facade: a bid side, an ask side, and a by-id
//! index that owns every resting order record. One mutex guards all of it;
//! every public method holds the lock for its full duration and anything
//! returned to the caller is copied out first, so snapshots stay stable
//! while the book keeps mutating.
//!
//! Cancellation by id is O(1): the index entry carries the order's links in
//! its level queue. Best-price access is O(log P) through the side maps.

pub mod ask_book;
pub mod bid_book;
pub mod price_level;

pub use ask_book::AskBook;
pub use bid_book::BidBook;
pub use price_level::PriceLevel;

use parking_lot::Mutex;
use types::errors::BookError;
use types::ids::OrderId;
use types::numeric::{Price, Quantity};
use types::order::{Order, OrderKind, OrderStatus, Side};

use price_level::{OrderIndex, OrderNode};

/// Copied view of one price level
///
/// `orders` is in time priority. The copy is what lets the matching loop
/// iterate a level while `reduce_quantity` mutates it underneath.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelSnapshot {
    pub price: Price,
    pub quantity: u64,
    pub orders: Vec<OrderId>,
}

#[derive(Default)]
struct BookInner {
    bids: BidBook,
    asks: AskBook,
    orders: OrderIndex,
}

/// Thread-safe order book for a single symbol
#[derive(Default)]
pub struct OrderBook {
    inner: Mutex<BookInner>,
}

impl OrderBook {
    /// Create a new empty book
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a limit order to rest at its price level
    ///
    /// Appends at the tail of the level queue (time priority). Fails with
    /// `DuplicateOrderId` if the id is already present.
    ///
    /// # Panics
    /// Panics if handed a market order or a zero quantity; both are logic
    /// errors on the caller's side.
    pub fn add(&self, order: Order) -> Result<(), BookError> {
        let price = match order.kind {
            OrderKind::Limit { price } => price,
            OrderKind::Market => panic!("market orders may not rest on the book"),
        };
        assert!(
            !order.quantity.is_zero(),
            "resting order must have positive quantity"
        );

        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        if inner.orders.contains_key(&order.order_id) {
            return Err(BookError::DuplicateOrderId(order.order_id));
        }

        let id = order.order_id;
        let side = order.side;
        inner.orders.insert(id, OrderNode::new(order));
        match side {
            Side::Buy => inner.bids.insert(&mut inner.orders, id, price),
            Side::Sell => inner.asks.insert(&mut inner.orders, id, price),
        }
        Ok(())
    }

    /// Remove an order by id, returning the removed record
    ///
    /// O(1) through the index links. Fails with `UnknownOrderId` if absent.
    pub fn remove(&self, order_id: OrderId) -> Result<Order, BookError> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        let node = inner
            .orders
            .get(&order_id)
            .ok_or(BookError::UnknownOrderId(order_id))?;
        let side = node.order.side;
        let price = node
            .order
            .limit_price()
            .expect("book only holds limit orders");

        match side {
            Side::Buy => inner.bids.unlink(&mut inner.orders, order_id, price),
            Side::Sell => inner.asks.unlink(&mut inner.orders, order_id, price),
        }
        let node = inner
            .orders
            .remove(&order_id)
            .expect("unlinked order missing from index");
        Ok(node.order)
    }

    /// Subtract `delta` from an order's remaining quantity and its level
    /// aggregate, removing the order when it reaches zero
    ///
    /// The order's status moves to `PartiallyFilled`, or `Filled` on
    /// removal.
    ///
    /// # Panics
    /// Panics unless `0 < delta <= remaining`; violating the bound is a
    /// logic error in the matching loop.
    pub fn reduce_quantity(&self, order_id: OrderId, delta: Quantity) -> Result<(), BookError> {
        assert!(!delta.is_zero(), "reduction must be positive");

        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        let node = inner
            .orders
            .get_mut(&order_id)
            .ok_or(BookError::UnknownOrderId(order_id))?;
        assert!(
            delta <= node.order.quantity,
            "reduction {} exceeds remaining {} for order {}",
            delta,
            node.order.quantity,
            order_id
        );

        node.order.quantity -= delta;
        let filled = node.order.quantity.is_zero();
        node.order.status = if filled {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
        let side = node.order.side;
        let price = node
            .order
            .limit_price()
            .expect("book only holds limit orders");

        match side {
            Side::Buy => inner.bids.reduce(price, delta.as_u32() as u64),
            Side::Sell => inner.asks.reduce(price, delta.as_u32() as u64),
        }

        if filled {
            match side {
                Side::Buy => inner.bids.unlink(&mut inner.orders, order_id, price),
                Side::Sell => inner.asks.unlink(&mut inner.orders, order_id, price),
            }
            inner.orders.remove(&order_id);
        }
        Ok(())
    }

    /// Copy of a resting order's record, if present
    pub fn get(&self, order_id: OrderId) -> Option<Order> {
        self.inner
            .lock()
            .orders
            .get(&order_id)
            .map(|node| node.order.clone())
    }

    /// Snapshot of the best (highest) bid level
    pub fn best_bid(&self) -> Option<LevelSnapshot> {
        let guard = self.inner.lock();
        guard.bids.best(&guard.orders)
    }

    /// Snapshot of the best (lowest) ask level
    pub fn best_ask(&self) -> Option<LevelSnapshot> {
        let guard = self.inner.lock();
        guard.asks.best(&guard.orders)
    }

    /// Check if both sides are empty
    pub fn is_empty(&self) -> bool {
        let guard = self.inner.lock();
        guard.bids.is_empty() && guard.asks.is_empty()
    }

    /// Check if one side is empty
    pub fn is_side_empty(&self, side: Side) -> bool {
        let guard = self.inner.lock();
        match side {
            Side::Buy => guard.bids.is_empty(),
            Side::Sell => guard.asks.is_empty(),
        }
    }

    /// Number of resting orders across both sides
    pub fn order_count(&self) -> usize {
        self.inner.lock().orders.len()
    }
}
