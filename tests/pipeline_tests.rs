//! Integration tests for the monitoring pipeline.
//!
//! Drive a full [`Monitor`] with a channel-backed mock stream and verify
//! the delivery guarantees end to end: ordering, idempotency, sink failure
//! isolation, disconnect scoping, and the configuration gates.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use diesel::prelude::*;
use rust_decimal_macros::dec;
use serde_json::json;
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};

use hyperwatch::adapter::sqlite::model::{FillRow, OrderEventRow};
use hyperwatch::adapter::sqlite::schema::{fills, order_events};
use hyperwatch::adapter::sqlite::{DbPool, SqliteTradeStore};
use hyperwatch::app::Monitor;
use hyperwatch::config::{MonitorConfig, Network, ReconnectConfig};
use hyperwatch::domain::{Address, EventFamily, Trade};
use hyperwatch::error::{ConfigError, NotifyError, TransportError};
use hyperwatch::port::{Notifier, RawEvent, StreamEvent, UserEventStream};

// --- Test doubles -----------------------------------------------------------

/// Channel-backed stream: the test injects `StreamEvent`s, the mock records
/// connection and subscription activity, and acknowledges subscriptions the
/// way the real exchange does.
struct MockStream {
    rx: mpsc::UnboundedReceiver<StreamEvent>,
    ack_tx: mpsc::UnboundedSender<StreamEvent>,
    subscribed: Arc<Mutex<Vec<(Address, EventFamily)>>>,
    unsubscribed: Arc<Mutex<Vec<(Address, EventFamily)>>>,
    connects: Arc<AtomicUsize>,
}

#[derive(Clone)]
struct MockStreamProbe {
    events: mpsc::UnboundedSender<StreamEvent>,
    subscribed: Arc<Mutex<Vec<(Address, EventFamily)>>>,
    unsubscribed: Arc<Mutex<Vec<(Address, EventFamily)>>>,
    connects: Arc<AtomicUsize>,
}

impl MockStream {
    fn new() -> (Self, MockStreamProbe) {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscribed = Arc::new(Mutex::new(Vec::new()));
        let unsubscribed = Arc::new(Mutex::new(Vec::new()));
        let connects = Arc::new(AtomicUsize::new(0));

        let probe = MockStreamProbe {
            events: tx.clone(),
            subscribed: subscribed.clone(),
            unsubscribed: unsubscribed.clone(),
            connects: connects.clone(),
        };

        (
            Self {
                rx,
                ack_tx: tx,
                subscribed,
                unsubscribed,
                connects,
            },
            probe,
        )
    }
}

#[async_trait]
impl UserEventStream for MockStream {
    async fn connect(&mut self) -> Result<(), TransportError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn subscribe(
        &mut self,
        address: &Address,
        family: EventFamily,
    ) -> Result<(), TransportError> {
        self.subscribed
            .lock()
            .unwrap()
            .push((address.clone(), family));
        let _ = self.ack_tx.send(StreamEvent::SubscriptionAck {
            address: address.clone(),
            family,
        });
        Ok(())
    }

    async fn unsubscribe(
        &mut self,
        address: &Address,
        family: EventFamily,
    ) -> Result<(), TransportError> {
        self.unsubscribed
            .lock()
            .unwrap()
            .push((address.clone(), family));
        Ok(())
    }

    async fn next_event(&mut self) -> Option<StreamEvent> {
        self.rx.recv().await
    }
}

struct CollectingNotifier {
    trades: Arc<Mutex<Vec<Trade>>>,
}

impl Notifier for CollectingNotifier {
    fn notify(&self, trade: &Trade) -> Result<(), NotifyError> {
        self.trades.lock().unwrap().push(trade.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "collecting"
    }
}

struct AlwaysFailingNotifier;

impl Notifier for AlwaysFailingNotifier {
    fn notify(&self, _trade: &Trade) -> Result<(), NotifyError> {
        Err(NotifyError::SendFailed("broken on purpose".into()))
    }

    fn name(&self) -> &'static str {
        "always-failing"
    }
}

// --- Helpers ----------------------------------------------------------------

fn test_config(addresses: &[&str], db_path: Option<std::path::PathBuf>) -> MonitorConfig {
    MonitorConfig {
        addresses: addresses.iter().map(|s| Address::from(*s)).collect(),
        db_path,
        silent: false,
        network: Network::Mainnet,
        reconnect: ReconnectConfig {
            initial_delay_ms: 10,
            max_delay_ms: 50,
            backoff_multiplier: 2.0,
        },
    }
}

fn fill_event(address: &str, coin: &str, side: &str, sz: &str, px: &str, tx_hash: &str) -> StreamEvent {
    StreamEvent::Payload(RawEvent {
        address: Address::from(address),
        family: EventFamily::Fills,
        payload: json!([{
            "time": 1699457400000_i64,
            "coin": coin,
            "side": side,
            "sz": sz,
            "px": px,
            "dir": "Open Long",
            "hash": tx_hash,
            "fee": "0.05",
            "feeToken": "USDC",
            "startPosition": "0.0",
            "closedPnl": "0.0"
        }]),
    })
}

fn order_placed_event(address: &str, coin: &str, side: &str, sz: &str, px: &str, oid: u64) -> StreamEvent {
    StreamEvent::Payload(RawEvent {
        address: Address::from(address),
        family: EventFamily::OrderUpdates,
        payload: json!([{
            "time": 1699457460000_i64,
            "coin": coin,
            "placed": {"oid": oid, "side": side, "sz": sz, "px": px}
        }]),
    })
}

async fn wait_for(mut condition: impl FnMut() -> bool) {
    for _ in 0..500 {
        if condition() {
            return;
        }
        sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not met within 2.5s");
}

fn query_fills(pool: &DbPool) -> Vec<FillRow> {
    let mut conn = pool.get().unwrap();
    fills::table
        .select(FillRow::as_select())
        .order(fills::id.asc())
        .load(&mut conn)
        .unwrap()
}

fn query_orders(pool: &DbPool) -> Vec<OrderEventRow> {
    let mut conn = pool.get().unwrap();
    order_events::table
        .select(OrderEventRow::as_select())
        .order(order_events::id.asc())
        .load(&mut conn)
        .unwrap()
}

// --- Tests ------------------------------------------------------------------

#[tokio::test]
async fn end_to_end_fill_is_stored_and_notified() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("trades.db");
    let store = SqliteTradeStore::open(&db_path).unwrap();
    let pool = store.pool().clone();

    let (stream, probe) = MockStream::new();
    let trades = Arc::new(Mutex::new(Vec::new()));
    let monitor = Monitor::new(
        &test_config(&["0xABC"], Some(db_path)),
        stream,
        Some(Box::new(store)),
        vec![Box::new(CollectingNotifier {
            trades: trades.clone(),
        })],
    )
    .unwrap();
    let handle = monitor.handle();
    let task = tokio::spawn(monitor.run());

    probe
        .events
        .send(fill_event("0xABC", "BTC", "A", "0.5", "60000", "0xHASH1"))
        .unwrap();

    let trades_probe = trades.clone();
    wait_for(move || trades_probe.lock().unwrap().len() == 1).await;

    handle.stop();
    timeout(Duration::from_secs(1), task).await.unwrap().unwrap().unwrap();

    let rows = query_fills(&pool);
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.address, "0xABC");
    assert_eq!(row.coin, "BTC");
    assert_eq!(row.side, "BUY");
    assert!((row.size - 0.5).abs() < 1e-9);
    assert!((row.price - 60000.0).abs() < 1e-9);
    assert_eq!(row.tx_hash, "0xHASH1");
    assert!(row.closed_pnl.is_none());

    let collected = trades.lock().unwrap();
    assert_eq!(collected.len(), 1);
    let trade = &collected[0];
    assert_eq!(trade.coin(), "BTC");
    assert_eq!(trade.size(), dec!(0.5));
    assert_eq!(trade.price(), dec!(60000));
    assert!(trade.is_fill());
}

#[tokio::test]
async fn end_to_end_order_placed_is_stored_and_notified() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("trades.db");
    let store = SqliteTradeStore::open(&db_path).unwrap();
    let pool = store.pool().clone();

    let (stream, probe) = MockStream::new();
    let trades = Arc::new(Mutex::new(Vec::new()));
    let monitor = Monitor::new(
        &test_config(&["0xABC"], Some(db_path)),
        stream,
        Some(Box::new(store)),
        vec![Box::new(CollectingNotifier {
            trades: trades.clone(),
        })],
    )
    .unwrap();
    let handle = monitor.handle();
    let task = tokio::spawn(monitor.run());

    probe
        .events
        .send(order_placed_event("0xABC", "ETH", "B", "2", "3000", 42))
        .unwrap();

    let trades_probe = trades.clone();
    wait_for(move || trades_probe.lock().unwrap().len() == 1).await;

    handle.stop();
    timeout(Duration::from_secs(1), task).await.unwrap().unwrap().unwrap();

    let rows = query_orders(&pool);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].action, "placed");
    assert_eq!(rows[0].side, "SELL");
    assert_eq!(rows[0].order_id, 42);

    let collected = trades.lock().unwrap();
    assert_eq!(collected[0].kind().label(), "ORDER_PLACED");
    assert_eq!(collected[0].order_id(), Some(42));
}

#[tokio::test]
async fn sequential_fills_keep_their_order() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("trades.db");
    let store = SqliteTradeStore::open(&db_path).unwrap();
    let pool = store.pool().clone();

    let (stream, probe) = MockStream::new();
    let trades = Arc::new(Mutex::new(Vec::new()));
    let monitor = Monitor::new(
        &test_config(&["0xABC"], Some(db_path)),
        stream,
        Some(Box::new(store)),
        vec![Box::new(CollectingNotifier {
            trades: trades.clone(),
        })],
    )
    .unwrap();
    let handle = monitor.handle();
    let task = tokio::spawn(monitor.run());

    probe
        .events
        .send(fill_event("0xABC", "BTC", "A", "1", "60000", "0xAAA1"))
        .unwrap();
    probe
        .events
        .send(fill_event("0xABC", "BTC", "B", "2", "61000", "0xBBB2"))
        .unwrap();

    let trades_probe = trades.clone();
    wait_for(move || trades_probe.lock().unwrap().len() == 2).await;

    handle.stop();
    timeout(Duration::from_secs(1), task).await.unwrap().unwrap().unwrap();

    let rows = query_fills(&pool);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].tx_hash, "0xAAA1");
    assert_eq!(rows[1].tx_hash, "0xBBB2");

    let collected = trades.lock().unwrap();
    assert_eq!(collected[0].tx_hash(), Some("0xAAA1"));
    assert_eq!(collected[1].tx_hash(), Some("0xBBB2"));
}

#[tokio::test]
async fn failing_notifier_never_blocks_storage_or_later_events() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("trades.db");
    let store = SqliteTradeStore::open(&db_path).unwrap();
    let pool = store.pool().clone();

    let (stream, probe) = MockStream::new();
    let trades = Arc::new(Mutex::new(Vec::new()));
    let monitor = Monitor::new(
        &test_config(&["0xABC"], Some(db_path)),
        stream,
        Some(Box::new(store)),
        vec![
            Box::new(AlwaysFailingNotifier),
            Box::new(CollectingNotifier {
                trades: trades.clone(),
            }),
        ],
    )
    .unwrap();
    let handle = monitor.handle();
    let task = tokio::spawn(monitor.run());

    for (i, tx) in ["0x1", "0x2", "0x3"].iter().enumerate() {
        let px = format!("{}", 60000 + i);
        probe
            .events
            .send(fill_event("0xABC", "BTC", "A", "1", &px, tx))
            .unwrap();
    }

    let pool_probe = pool.clone();
    wait_for(move || query_fills(&pool_probe).len() == 3).await;

    handle.stop();
    timeout(Duration::from_secs(1), task).await.unwrap().unwrap().unwrap();

    assert_eq!(query_fills(&pool).len(), 3);
    assert_eq!(trades.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn duplicate_delivery_produces_one_row_and_one_notification() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("trades.db");
    let store = SqliteTradeStore::open(&db_path).unwrap();
    let pool = store.pool().clone();

    let (stream, probe) = MockStream::new();
    let trades = Arc::new(Mutex::new(Vec::new()));
    let monitor = Monitor::new(
        &test_config(&["0xABC"], Some(db_path)),
        stream,
        Some(Box::new(store)),
        vec![Box::new(CollectingNotifier {
            trades: trades.clone(),
        })],
    )
    .unwrap();
    let handle = monitor.handle();
    let task = tokio::spawn(monitor.run());

    let event = || fill_event("0xABC", "BTC", "A", "0.5", "60000", "0xSAME");
    probe.events.send(event()).unwrap();
    probe.events.send(event()).unwrap();
    probe
        .events
        .send(fill_event("0xABC", "BTC", "A", "0.5", "60000", "0xOTHER"))
        .unwrap();

    let trades_probe = trades.clone();
    wait_for(move || trades_probe.lock().unwrap().len() == 2).await;

    handle.stop();
    timeout(Duration::from_secs(1), task).await.unwrap().unwrap().unwrap();

    assert_eq!(query_fills(&pool).len(), 2);
    assert_eq!(trades.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn silent_mode_without_storage_fails_before_any_subscription() {
    let (stream, probe) = MockStream::new();
    let mut config = test_config(&["0xABC"], None);
    config.silent = true;

    let result = Monitor::new(&config, stream, None, vec![]);
    assert!(matches!(result, Err(ConfigError::SilentWithoutStorage)));
    assert!(probe.subscribed.lock().unwrap().is_empty());
    assert_eq!(probe.connects.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn empty_address_list_is_rejected() {
    let (stream, _probe) = MockStream::new();
    let result = Monitor::new(&test_config(&[], None), stream, None, vec![]);
    assert!(matches!(
        result,
        Err(ConfigError::MissingField { field: "addresses" })
    ));
}

#[tokio::test]
async fn scoped_disconnect_resubscribes_only_that_address() {
    let (stream, probe) = MockStream::new();
    let trades = Arc::new(Mutex::new(Vec::new()));
    let monitor = Monitor::new(
        &test_config(&["0xAAA", "0xBBB"], None),
        stream,
        None,
        vec![Box::new(CollectingNotifier {
            trades: trades.clone(),
        })],
    )
    .unwrap();
    let handle = monitor.handle();
    let task = tokio::spawn(monitor.run());

    // Initial subscriptions: two families per address.
    let sub_probe = probe.subscribed.clone();
    wait_for(move || sub_probe.lock().unwrap().len() == 4).await;

    probe
        .events
        .send(StreamEvent::Disconnected {
            address: Some(Address::from("0xAAA")),
            reason: "server closed user stream".into(),
        })
        .unwrap();

    // Only 0xAAA's two subscriptions are re-requested.
    let sub_probe = probe.subscribed.clone();
    wait_for(move || sub_probe.lock().unwrap().len() == 6).await;
    {
        let subs = probe.subscribed.lock().unwrap();
        assert!(subs[4..]
            .iter()
            .all(|(address, _)| address.as_str() == "0xAAA"));
    }

    // The other address keeps delivering events.
    probe
        .events
        .send(fill_event("0xBBB", "ETH", "A", "1", "1850", "0xLIVE"))
        .unwrap();
    let trades_probe = trades.clone();
    wait_for(move || trades_probe.lock().unwrap().len() == 1).await;

    // No reconnect happened for a scoped disconnect.
    assert_eq!(probe.connects.load(Ordering::SeqCst), 1);

    handle.stop();
    timeout(Duration::from_secs(1), task).await.unwrap().unwrap().unwrap();
}

#[tokio::test]
async fn transport_disconnect_reconnects_and_resubscribes() {
    let (stream, probe) = MockStream::new();
    let trades = Arc::new(Mutex::new(Vec::new()));
    let monitor = Monitor::new(
        &test_config(&["0xABC"], None),
        stream,
        None,
        vec![Box::new(CollectingNotifier {
            trades: trades.clone(),
        })],
    )
    .unwrap();
    let handle = monitor.handle();
    let task = tokio::spawn(monitor.run());

    let sub_probe = probe.subscribed.clone();
    wait_for(move || sub_probe.lock().unwrap().len() == 2).await;

    probe
        .events
        .send(StreamEvent::Disconnected {
            address: None,
            reason: "connection reset".into(),
        })
        .unwrap();

    let connects = probe.connects.clone();
    wait_for(move || connects.load(Ordering::SeqCst) == 2).await;
    let sub_probe = probe.subscribed.clone();
    wait_for(move || sub_probe.lock().unwrap().len() == 4).await;

    // Events flow again after the reconnect.
    probe
        .events
        .send(fill_event("0xABC", "BTC", "A", "1", "60000", "0xAFTER"))
        .unwrap();
    let trades_probe = trades.clone();
    wait_for(move || trades_probe.lock().unwrap().len() == 1).await;

    handle.stop();
    timeout(Duration::from_secs(1), task).await.unwrap().unwrap().unwrap();
}

#[tokio::test]
async fn stop_completes_while_stream_is_idle() {
    let (stream, _probe) = MockStream::new();
    let monitor = Monitor::new(&test_config(&["0xABC"], None), stream, None, vec![]).unwrap();
    let handle = monitor.handle();
    let task = tokio::spawn(monitor.run());

    sleep(Duration::from_millis(20)).await;
    handle.stop();

    timeout(Duration::from_secs(1), task).await.unwrap().unwrap().unwrap();
}

#[tokio::test]
async fn address_list_change_closes_removed_and_subscribes_added() {
    let (stream, probe) = MockStream::new();
    let monitor = Monitor::new(&test_config(&["0xAAA"], None), stream, None, vec![]).unwrap();
    let handle = monitor.handle();
    let task = tokio::spawn(monitor.run());

    let sub_probe = probe.subscribed.clone();
    wait_for(move || sub_probe.lock().unwrap().len() == 2).await;

    handle.set_addresses(vec![Address::from("0xBBB")]);

    let unsub_probe = probe.unsubscribed.clone();
    wait_for(move || unsub_probe.lock().unwrap().len() == 2).await;
    {
        let unsubs = probe.unsubscribed.lock().unwrap();
        assert!(unsubs.iter().all(|(address, _)| address.as_str() == "0xAAA"));
    }
    let sub_probe = probe.subscribed.clone();
    wait_for(move || sub_probe.lock().unwrap().len() == 4).await;
    {
        let subs = probe.subscribed.lock().unwrap();
        assert!(subs[2..].iter().all(|(address, _)| address.as_str() == "0xBBB"));
    }

    handle.stop();
    timeout(Duration::from_secs(1), task).await.unwrap().unwrap().unwrap();
}
