//! End-to-end engine scenarios
//!
//! Each test drives the full pipeline: submit through the queue, match on
//! the worker thread, observe through the dispatcher. A recording listener
//! waits on a condvar until the expected events arrive (with a timeout so a
//! broken engine fails the test instead of hanging it).

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use matching_engine::events::{
    MarketDataEvent, OrderAcceptedEvent, OrderCancelledEvent, TradeExecutedEvent,
};
use matching_engine::{EventDispatcher, MatchingEngine, OrderBook};
use types::ids::{OrderId, TraderId};
use types::numeric::{Price, Quantity};
use types::order::{Order, OrderStatus, Side};

const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Default, Clone)]
struct Recorded {
    trades: Vec<TradeExecutedEvent>,
    accepts: Vec<OrderAcceptedEvent>,
    cancels: Vec<OrderCancelledEvent>,
    market_data: Vec<MarketDataEvent>,
    /// Arrival order across all event types
    sequence: Vec<&'static str>,
}

#[derive(Default)]
struct Recorder {
    recorded: Mutex<Recorded>,
    changed: Condvar,
}

impl Recorder {
    fn attach(recorder: &Arc<Recorder>, dispatcher: &EventDispatcher) {
        let sink = recorder.clone();
        dispatcher.subscribe(move |event: &TradeExecutedEvent| {
            let mut recorded = sink.recorded.lock();
            recorded.trades.push(event.clone());
            recorded.sequence.push("trade");
            sink.changed.notify_all();
        });

        let sink = recorder.clone();
        dispatcher.subscribe(move |event: &OrderAcceptedEvent| {
            let mut recorded = sink.recorded.lock();
            recorded.accepts.push(event.clone());
            recorded.sequence.push("accept");
            sink.changed.notify_all();
        });

        let sink = recorder.clone();
        dispatcher.subscribe(move |event: &OrderCancelledEvent| {
            let mut recorded = sink.recorded.lock();
            recorded.cancels.push(event.clone());
            recorded.sequence.push("cancel");
            sink.changed.notify_all();
        });

        let sink = recorder.clone();
        dispatcher.subscribe(move |event: &MarketDataEvent| {
            let mut recorded = sink.recorded.lock();
            recorded.market_data.push(event.clone());
            recorded.sequence.push("market_data");
            sink.changed.notify_all();
        });
    }

    /// Block until the predicate holds, or fail the test on timeout
    fn wait_until(&self, predicate: impl Fn(&Recorded) -> bool) -> Recorded {
        let deadline = Instant::now() + WAIT_TIMEOUT;
        let mut recorded = self.recorded.lock();
        while !predicate(&recorded) {
            let timeout = deadline.saturating_duration_since(Instant::now());
            assert!(!timeout.is_zero(), "timed out waiting for expected events");
            let _ = self.changed.wait_for(&mut recorded, timeout);
        }
        recorded.clone()
    }
}

struct Fixture {
    book: Arc<OrderBook>,
    engine: MatchingEngine,
    recorder: Arc<Recorder>,
}

fn fixture() -> Fixture {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let book = Arc::new(OrderBook::new());
    let dispatcher = Arc::new(EventDispatcher::new());
    let recorder = Arc::new(Recorder::default());
    Recorder::attach(&recorder, &dispatcher);

    let engine = MatchingEngine::new(book.clone(), dispatcher);
    engine.start().unwrap();

    Fixture {
        book,
        engine,
        recorder,
    }
}

fn sell_limit(price: &str, qty: u32, trader: u32) -> Order {
    Order::limit("AAPL", Side::Sell, price, qty, TraderId::new(trader)).unwrap()
}

fn buy_limit(price: &str, qty: u32, trader: u32) -> Order {
    Order::limit("AAPL", Side::Buy, price, qty, TraderId::new(trader)).unwrap()
}

fn minor(value: u32) -> Price {
    Price::from_minor(value)
}

#[test]
fn test_limit_orders_that_do_not_cross_rest_on_both_sides() {
    let f = fixture();

    f.engine.submit(sell_limit("101.00", 10, 1));
    f.engine.submit(buy_limit("99.00", 10, 2));

    let recorded = f.recorder.wait_until(|r| r.accepts.len() == 2);
    assert!(recorded.trades.is_empty());
    assert!(recorded.market_data.is_empty());

    let bid = f.book.best_bid().unwrap();
    assert_eq!((bid.price, bid.quantity), (minor(9900), 10));
    let ask = f.book.best_ask().unwrap();
    assert_eq!((ask.price, ask.quantity), (minor(10100), 10));
}

#[test]
fn test_partial_fill_rests_the_remainder() {
    let f = fixture();

    let sell_id = f.engine.submit(sell_limit("100.00", 10, 1));
    f.recorder.wait_until(|r| r.accepts.len() == 1);

    let buy_id = f.engine.submit(buy_limit("100.00", 15, 2));
    let recorded = f.recorder.wait_until(|r| !r.market_data.is_empty());

    assert_eq!(recorded.trades.len(), 1);
    let trade = &recorded.trades[0];
    assert_eq!(trade.price, minor(10000));
    assert_eq!(trade.quantity, Quantity::new(10));
    assert_eq!(trade.aggressing_order_id, buy_id);
    assert_eq!(trade.aggressing_remaining_quantity, Quantity::new(5));
    assert_eq!(trade.resting_order_id, sell_id);
    assert_eq!(trade.resting_remaining_quantity, Quantity::ZERO);

    // Ask fully consumed; the buy remainder rests
    assert!(f.book.best_ask().is_none());
    let bid = f.book.best_bid().unwrap();
    assert_eq!((bid.price, bid.quantity), (minor(10000), 5));
    assert_eq!(f.book.get(buy_id).unwrap().status, OrderStatus::Accepted);

    // Per-submission event order: trades, then the accept, then market data
    assert_eq!(
        recorded.sequence,
        vec!["accept", "trade", "accept", "market_data"]
    );
    assert_eq!(recorded.market_data[0].last_price, minor(10000));
}

#[test]
fn test_aggressor_walks_the_book_best_level_first() {
    let f = fixture();

    f.engine.submit(sell_limit("100.00", 10, 1));
    f.engine.submit(sell_limit("101.00", 10, 1));
    f.recorder.wait_until(|r| r.accepts.len() == 2);

    f.engine.submit(buy_limit("101.00", 15, 2));
    let recorded = f.recorder.wait_until(|r| !r.market_data.is_empty());

    assert_eq!(recorded.trades.len(), 2);
    assert_eq!(recorded.trades[0].price, minor(10000));
    assert_eq!(recorded.trades[0].quantity, Quantity::new(10));
    assert_eq!(recorded.trades[1].price, minor(10100));
    assert_eq!(recorded.trades[1].quantity, Quantity::new(5));
    assert_eq!(
        recorded.trades[1].aggressing_remaining_quantity,
        Quantity::ZERO
    );

    // Aggressor filled: no accept event beyond the two resting sells
    assert_eq!(recorded.accepts.len(), 2);
    let ask = f.book.best_ask().unwrap();
    assert_eq!((ask.price, ask.quantity), (minor(10100), 5));
    assert_eq!(recorded.market_data[0].last_price, minor(10100));
}

#[test]
fn test_market_order_cancels_unfilled_remainder() {
    let f = fixture();

    f.engine.submit(sell_limit("100.00", 10, 1));
    f.engine.submit(sell_limit("101.00", 5, 1));
    f.recorder.wait_until(|r| r.accepts.len() == 2);

    let buy_id = f
        .engine
        .submit(Order::market("AAPL", Side::Buy, 20, TraderId::new(2)).unwrap());
    let recorded = f.recorder.wait_until(|r| r.cancels.len() == 1);

    assert_eq!(recorded.trades.len(), 2);
    assert_eq!(recorded.trades[0].price, minor(10000));
    assert_eq!(recorded.trades[0].quantity, Quantity::new(10));
    assert_eq!(recorded.trades[1].price, minor(10100));
    assert_eq!(recorded.trades[1].quantity, Quantity::new(5));

    let cancel = &recorded.cancels[0];
    assert_eq!(cancel.order_id, buy_id);
    assert_eq!(cancel.quantity, Quantity::new(5));

    // The market order never rested and was never accepted
    assert_eq!(recorded.accepts.len(), 2);
    assert!(f.book.best_ask().is_none());
    assert!(f.book.get(buy_id).is_none());
}

#[test]
fn test_market_order_on_empty_book_cancels_in_full() {
    let f = fixture();

    let buy_id = f
        .engine
        .submit(Order::market("AAPL", Side::Buy, 7, TraderId::new(1)).unwrap());
    let recorded = f.recorder.wait_until(|r| r.cancels.len() == 1);

    assert!(recorded.trades.is_empty());
    assert!(recorded.market_data.is_empty());
    assert_eq!(recorded.cancels[0].order_id, buy_id);
    assert_eq!(recorded.cancels[0].quantity, Quantity::new(7));
    assert!(f.book.is_empty());
}

#[test]
fn test_price_priority_trumps_time_priority() {
    let f = fixture();

    // Worse-priced sell arrives first
    f.engine.submit(sell_limit("101.00", 10, 1));
    f.engine.submit(sell_limit("100.00", 10, 1));
    f.recorder.wait_until(|r| r.accepts.len() == 2);

    f.engine.submit(buy_limit("101.00", 15, 2));
    let recorded = f.recorder.wait_until(|r| r.trades.len() == 2);

    assert_eq!(recorded.trades[0].price, minor(10000));
    assert_eq!(recorded.trades[0].quantity, Quantity::new(10));
    assert_eq!(recorded.trades[1].price, minor(10100));
    assert_eq!(recorded.trades[1].quantity, Quantity::new(5));
}

#[test]
fn test_cancel_removes_resting_order() {
    let f = fixture();

    let sell_id = f.engine.submit(sell_limit("101.00", 10, 1));
    f.recorder.wait_until(|r| r.accepts.len() == 1);

    let ask = f.book.best_ask().unwrap();
    assert_eq!((ask.price, ask.quantity), (minor(10100), 10));

    f.engine.cancel(sell_id);
    let recorded = f.recorder.wait_until(|r| r.cancels.len() == 1);

    assert!(recorded.trades.is_empty());
    assert_eq!(recorded.cancels[0].order_id, sell_id);
    assert_eq!(recorded.cancels[0].quantity, Quantity::new(10));
    assert!(f.book.best_ask().is_none());
}

#[test]
fn test_cancel_of_unknown_id_is_dropped() {
    let f = fixture();

    f.engine.cancel(OrderId::new(999));
    // The cancel precedes this submission in the queue, so once the accept
    // arrives the unknown id has already been processed and dropped
    f.engine.submit(sell_limit("101.00", 10, 1));
    let recorded = f.recorder.wait_until(|r| r.accepts.len() == 1);

    assert!(recorded.cancels.is_empty());
    assert_eq!(f.book.order_count(), 1);
}

#[test]
fn test_concurrent_producers_serialize_onto_one_book() {
    let f = fixture();

    f.engine.submit(sell_limit("100.00", 1000, 1));
    f.recorder.wait_until(|r| r.accepts.len() == 1);

    let engine = Arc::new(f.engine);
    let producers: Vec<_> = (0..10u32)
        .map(|producer| {
            let engine = engine.clone();
            thread::spawn(move || {
                for _ in 0..10 {
                    engine.submit(buy_limit("100.00", 1, 100 + producer));
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }

    let recorded = f.recorder.wait_until(|r| r.trades.len() == 100);
    for trade in &recorded.trades {
        assert_eq!(trade.price, minor(10000));
        assert_eq!(trade.quantity, Quantity::new(1));
    }

    let ask = f.book.best_ask().unwrap();
    assert_eq!((ask.price, ask.quantity), (minor(10000), 900));
    assert!(f.book.is_side_empty(Side::Buy));
}

#[test]
fn test_quantity_is_conserved_across_trades_rests_and_cancels() {
    let f = fixture();

    let ask1 = f.engine.submit(sell_limit("100.00", 10, 1));
    let ask2 = f.engine.submit(sell_limit("101.00", 20, 1));
    f.recorder.wait_until(|r| r.accepts.len() == 2);

    f.engine.submit(buy_limit("101.00", 25, 2));
    f.recorder.wait_until(|r| r.trades.len() == 2);

    f.engine.cancel(ask2);
    let recorded = f.recorder.wait_until(|r| r.cancels.len() == 1);

    let traded_sell: u32 = recorded
        .trades
        .iter()
        .map(|t| t.quantity.as_u32())
        .sum();
    let cancelled: u32 = recorded.cancels.iter().map(|c| c.quantity.as_u32()).sum();

    // Submitted sell quantity = traded + cancelled remainder + still resting
    assert_eq!(traded_sell, 25);
    assert_eq!(cancelled, 5);
    assert_eq!(30, traded_sell + cancelled);
    assert!(f.book.is_empty());
    assert!(f.book.get(ask1).is_none());
}
