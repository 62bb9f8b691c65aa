//! Matching engine core
//!
//! Owns the submission interface and the single worker thread that drains
//! the work queue, runs the crossing algorithm against the book, and
//! publishes lifecycle events through the dispatcher.
//!
//! `submit` and `cancel` are fire-and-forget: they enqueue and return
//! immediately, from any thread. Outcomes are observable exclusively
//! through events. Exactly one worker mutates the book, so each item is
//! processed atomically with respect to book state and all observers see
//! the same total processing order.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use types::errors::EngineError;
use types::ids::OrderId;
use types::numeric::Price;
use types::order::{unix_millis, Order, OrderKind, OrderStatus, Side};

use crate::book::OrderBook;
use crate::dispatcher::EventDispatcher;
use crate::events::{MarketDataEvent, OrderAcceptedEvent, OrderCancelledEvent, TradeExecutedEvent};
use crate::matching::crossing;
use crate::queue::{WorkItem, WorkQueue};

/// Single-symbol matching engine
///
/// The engine shares the book and dispatcher with its embedder: the book
/// for read-side observation, the dispatcher for subscriptions. Dropping
/// the engine stops the worker.
pub struct MatchingEngine {
    core: Arc<EngineCore>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

struct EngineCore {
    book: Arc<OrderBook>,
    dispatcher: Arc<EventDispatcher>,
    queue: WorkQueue<WorkItem>,
    next_order_id: AtomicU64,
    running: AtomicBool,
}

impl MatchingEngine {
    /// Create an engine over an existing book and dispatcher
    pub fn new(book: Arc<OrderBook>, dispatcher: Arc<EventDispatcher>) -> Self {
        Self {
            core: Arc::new(EngineCore {
                book,
                dispatcher,
                queue: WorkQueue::new(),
                next_order_id: AtomicU64::new(1),
                running: AtomicBool::new(false),
            }),
            worker: Mutex::new(None),
        }
    }

    /// Enqueue an order for matching and return its assigned id
    ///
    /// The id is stamped here, before enqueue, so the caller's id always
    /// matches the one the worker processes. Ids are strictly increasing
    /// starting at 1; zero is never returned.
    pub fn submit(&self, mut order: Order) -> OrderId {
        let order_id = OrderId::new(self.core.next_order_id.fetch_add(1, Ordering::Relaxed));
        order.order_id = order_id;
        self.core.queue.push(WorkItem::Submit(order));
        order_id
    }

    /// Enqueue a cancellation request
    ///
    /// Unknown ids are logged and dropped by the worker.
    pub fn cancel(&self, order_id: OrderId) {
        self.core.queue.push(WorkItem::Cancel(order_id));
    }

    /// Spawn the worker thread
    pub fn start(&self) -> Result<(), EngineError> {
        if self.core.running.swap(true, Ordering::AcqRel) {
            return Err(EngineError::AlreadyRunning);
        }

        let core = self.core.clone();
        *self.worker.lock() = Some(thread::spawn(move || core.run_loop()));
        tracing::info!("matching engine started");
        Ok(())
    }

    /// Stop the worker and join it
    ///
    /// The item being processed when the flag drops is completed first to
    /// keep book invariants; anything still queued is discarded. Safe to
    /// call repeatedly and from `Drop`.
    pub fn stop(&self) {
        if !self.core.running.swap(false, Ordering::AcqRel) {
            return;
        }

        self.core.queue.push(WorkItem::Shutdown);
        if let Some(worker) = self.worker.lock().take() {
            if worker.join().is_err() {
                tracing::error!("worker thread panicked before shutdown");
            }
        }
        tracing::info!("matching engine stopped");
    }
}

impl Drop for MatchingEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

impl EngineCore {
    fn run_loop(&self) {
        loop {
            match self.queue.pop() {
                WorkItem::Shutdown => break,
                item if !self.running.load(Ordering::Acquire) => {
                    tracing::debug!(?item, "engine stopping; discarding queued item");
                }
                WorkItem::Submit(order) => self.process_submission(order),
                WorkItem::Cancel(order_id) => self.process_cancellation(order_id),
            }
        }
    }

    fn process_submission(&self, mut order: Order) {
        if order.quantity.is_zero() {
            return;
        }
        tracing::debug!(
            order_id = %order.order_id,
            side = ?order.side,
            quantity = %order.quantity,
            "processing submission"
        );

        let symbol = order.symbol.clone();
        let last_price = self.match_incoming(&mut order);

        if !order.quantity.is_zero() {
            match order.kind {
                OrderKind::Limit { price } => {
                    // Surviving limit remainder rests on the book
                    order.status = OrderStatus::Accepted;
                    let event = OrderAcceptedEvent {
                        order_id: order.order_id,
                        price,
                        quantity: order.quantity,
                    };
                    if let Err(e) = self.book.add(order) {
                        tracing::error!(error = %e, "book rejected an engine-assigned order id");
                        panic!("order book precondition violated: {e}");
                    }
                    self.dispatcher.publish(&event);
                }
                OrderKind::Market => {
                    // Market remainders never rest; New -> Cancelled with
                    // no intervening Accepted
                    order.status = OrderStatus::Cancelled;
                    self.dispatcher.publish(&OrderCancelledEvent {
                        order_id: order.order_id,
                        quantity: order.quantity,
                    });
                }
            }
        }

        if let Some(last_price) = last_price {
            self.dispatcher.publish(&MarketDataEvent {
                symbol,
                last_price,
                timestamp_ms: unix_millis(),
            });
        }
    }

    /// The crossing core: fill the incoming order against opposing levels,
    /// best price first, time priority within a level
    ///
    /// Returns the last trade price, if any trades happened.
    fn match_incoming(&self, order: &mut Order) -> Option<Price> {
        let mut last_price = None;

        while !order.quantity.is_zero() {
            let opposing_best = match order.side {
                Side::Buy => self.book.best_ask(),
                Side::Sell => self.book.best_bid(),
            };
            let Some(level) = opposing_best else { break };

            if let OrderKind::Limit { price } = order.kind {
                if !crossing::crosses(order.side, price, level.price) {
                    break;
                }
            }

            // Iterate a copy of the level's ids; fills mutate the live book
            // underneath, and ids gone by the time we reach them are skipped
            for resting_id in level.orders {
                let Some(resting) = self.book.get(resting_id) else {
                    continue;
                };

                let trade_quantity = order.quantity.min(resting.quantity);
                let aggressing_remaining = order.quantity - trade_quantity;
                let resting_remaining = resting.quantity - trade_quantity;

                order.status = if aggressing_remaining.is_zero() {
                    OrderStatus::Filled
                } else {
                    OrderStatus::PartiallyFilled
                };

                // The resting side sets the price
                self.dispatcher.publish(&TradeExecutedEvent {
                    symbol: order.symbol.clone(),
                    price: level.price,
                    quantity: trade_quantity,
                    aggressing_order_id: order.order_id,
                    aggressing_trader_id: order.trader_id,
                    aggressing_side: order.side,
                    aggressing_remaining_quantity: aggressing_remaining,
                    resting_order_id: resting_id,
                    resting_trader_id: resting.trader_id,
                    resting_remaining_quantity: resting_remaining,
                    timestamp_ms: unix_millis(),
                });

                order.quantity = aggressing_remaining;
                if let Err(e) = self.book.reduce_quantity(resting_id, trade_quantity) {
                    tracing::error!(error = %e, "resting order vanished mid-fill");
                    panic!("order book precondition violated: {e}");
                }
                last_price = Some(level.price);

                if order.quantity.is_zero() {
                    return last_price;
                }
            }
        }

        last_price
    }

    fn process_cancellation(&self, order_id: OrderId) {
        match self.book.remove(order_id) {
            Ok(mut removed) => {
                removed.status = OrderStatus::Cancelled;
                tracing::debug!(
                    order_id = %order_id,
                    quantity = %removed.quantity,
                    "order cancelled"
                );
                self.dispatcher.publish(&OrderCancelledEvent {
                    order_id,
                    quantity: removed.quantity,
                });
            }
            Err(e) => {
                tracing::warn!(order_id = %order_id, error = %e, "dropping cancellation");
            }
        }
    }
}
