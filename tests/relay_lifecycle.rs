//! Lifecycle tests for the push-feed relay against an in-process server.
//!
//! Each test spins up a local WebSocket listener, points a relay at it, and
//! drives the connect → subscribe → drop → reconnect cycle end to end:
//! single live connection, subscription replay, last-write-wins folding,
//! unknown-frame tolerance, and logout-suppressed reconnection.

#![cfg(feature = "ws-native")]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message;

use pricewatch_sdk::auth::SessionGate;
use pricewatch_sdk::domain::watchlist::Watchlist;
use pricewatch_sdk::shared::Symbol;
use pricewatch_sdk::ws::relay::WsClient;
use pricewatch_sdk::ws::{ConnectionState, Kind, WsConfig, WsEvent};

const TEST_TIMEOUT: Duration = Duration::from_secs(5);

// ─── Mock feed server ────────────────────────────────────────────────────────

/// One accepted client connection, as seen by the test.
struct Conn {
    /// URI of the upgrade request (carries the token query parameter).
    uri: oneshot::Receiver<String>,
    /// Frames to push to the client. Dropping this closes the connection.
    outbound: mpsc::UnboundedSender<Message>,
    /// Text frames received from the client, in order.
    inbound: mpsc::UnboundedReceiver<String>,
}

struct MockFeed {
    addr: SocketAddr,
    conns: mpsc::UnboundedReceiver<Conn>,
    live: Arc<AtomicUsize>,
}

impl MockFeed {
    async fn spawn() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let live = Arc::new(AtomicUsize::new(0));
        let (conn_tx, conns) = mpsc::unbounded_channel();

        let live_counter = Arc::clone(&live);
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    return;
                };

                let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Message>();
                let (in_tx, in_rx) = mpsc::unbounded_channel::<String>();
                let (uri_tx, uri_rx) = oneshot::channel::<String>();
                if conn_tx
                    .send(Conn {
                        uri: uri_rx,
                        outbound: out_tx,
                        inbound: in_rx,
                    })
                    .is_err()
                {
                    return;
                }

                let live = Arc::clone(&live_counter);
                tokio::spawn(async move {
                    let callback =
                        move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
                            let _ = uri_tx.send(req.uri().to_string());
                            Ok(resp)
                        };
                    let Ok(ws) = tokio_tungstenite::accept_hdr_async(stream, callback).await
                    else {
                        return;
                    };

                    live.fetch_add(1, Ordering::SeqCst);
                    let (mut sink, mut stream) = ws.split();
                    loop {
                        tokio::select! {
                            frame = stream.next() => match frame {
                                Some(Ok(Message::Text(text))) => {
                                    let _ = in_tx.send(text.to_string());
                                }
                                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                                Some(Ok(_)) => {}
                            },
                            out = out_rx.recv() => match out {
                                Some(msg) => {
                                    if sink.send(msg).await.is_err() {
                                        break;
                                    }
                                }
                                // Test dropped the handle — close on the client.
                                None => {
                                    let _ = sink.send(Message::Close(None)).await;
                                    break;
                                }
                            },
                        }
                    }
                    live.fetch_sub(1, Ordering::SeqCst);
                });
            }
        });

        Self { addr, conns, live }
    }

    fn url(&self) -> String {
        format!("ws://{}/api/v1/ws/connect", self.addr)
    }

    async fn next_conn(&mut self) -> Conn {
        timeout(TEST_TIMEOUT, self.conns.recv())
            .await
            .expect("timed out waiting for a connection")
            .expect("listener task ended")
    }

    fn live_connections(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

impl Conn {
    fn send_json(&self, json: &str) {
        self.outbound
            .send(Message::Text(json.to_string().into()))
            .expect("connection already closed");
    }

    async fn next_text(&mut self) -> String {
        timeout(TEST_TIMEOUT, self.inbound.recv())
            .await
            .expect("timed out waiting for a client frame")
            .expect("connection closed")
    }
}

// ─── Harness helpers ─────────────────────────────────────────────────────────

fn test_config(url: String) -> WsConfig {
    WsConfig {
        url,
        reconnect: true,
        reconnect_delay_ms: 100,
        ping_interval_ms: 60_000,
    }
}

fn generation() -> Arc<AtomicU64> {
    Arc::new(AtomicU64::new(1))
}

fn relay(feed: &MockFeed, counter: &Arc<AtomicU64>) -> WsClient {
    WsClient::new(
        test_config(feed.url()),
        SessionGate::observe(counter),
        "secret-token",
    )
}

async fn wait_for(client: &WsClient, predicate: impl Fn(&WsEvent) -> bool) -> WsEvent {
    let events = client.events();
    tokio::pin!(events);

    timeout(TEST_TIMEOUT, async {
        while let Some(ev) = events.next().await {
            if predicate(&ev) {
                return ev;
            }
        }
        panic!("event stream ended without a matching event");
    })
    .await
    .expect("timed out waiting for matching event")
}

async fn wait_connected(client: &WsClient) {
    wait_for(client, |ev| matches!(ev, WsEvent::Connected)).await;
}

fn parsed(frame: &str) -> serde_json::Value {
    serde_json::from_str(frame).unwrap()
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn connect_carries_token_and_holds_one_connection() {
    let mut feed = MockFeed::spawn().await;
    let counter = generation();
    let mut client = relay(&feed, &counter);

    client.connect().await.unwrap();
    let conn = feed.next_conn().await;
    wait_connected(&client).await;

    let uri = conn.uri.await.unwrap();
    assert!(uri.contains("token=secret-token"), "uri was: {uri}");

    assert!(client.is_connected());
    assert_eq!(feed.live_connections(), 1);

    client.disconnect().await.unwrap();
    assert_eq!(client.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn duplicate_subscribe_still_emits_wire_command() {
    let mut feed = MockFeed::spawn().await;
    let counter = generation();
    let mut client = relay(&feed, &counter);

    client.connect().await.unwrap();
    let mut conn = feed.next_conn().await;
    wait_connected(&client).await;

    client.subscribe("BTC").unwrap();
    client.subscribe("BTC").unwrap();

    // Membership is idempotent, but both commands hit the wire.
    for _ in 0..2 {
        let frame = parsed(&conn.next_text().await);
        assert_eq!(frame["type"], "subscribe");
        assert_eq!(frame["symbol"], "BTC");
    }

    client.disconnect().await.unwrap();
}

#[tokio::test]
async fn reconnect_replays_tracked_subscriptions() {
    let mut feed = MockFeed::spawn().await;
    let counter = generation();
    let mut client = relay(&feed, &counter);

    client.connect().await.unwrap();
    let mut conn = feed.next_conn().await;
    wait_connected(&client).await;

    client.subscribe("BTC").unwrap();
    let frame = parsed(&conn.next_text().await);
    assert_eq!(frame["type"], "subscribe");

    // Server drops the connection.
    drop(conn);
    wait_for(&client, |ev| matches!(ev, WsEvent::Disconnected { .. })).await;

    // After the fixed delay the relay reconnects and replays BTC unprompted.
    let mut conn2 = feed.next_conn().await;
    wait_connected(&client).await;

    let frame = parsed(&conn2.next_text().await);
    assert_eq!(frame["type"], "subscribe");
    assert_eq!(frame["symbol"], "BTC");

    // Still exactly one live connection after the cycle.
    assert_eq!(feed.live_connections(), 1);

    client.disconnect().await.unwrap();
}

#[tokio::test]
async fn subscribe_while_disconnected_is_replayed_on_connect() {
    let mut feed = MockFeed::spawn().await;
    let counter = generation();
    let mut client = relay(&feed, &counter);

    client.connect().await.unwrap();
    let conn = feed.next_conn().await;
    wait_connected(&client).await;

    // Drop the connection, then subscribe during the reconnect window.
    drop(conn);
    wait_for(&client, |ev| matches!(ev, WsEvent::Disconnected { .. })).await;
    client.subscribe("ETH").unwrap();

    // The request was retained, not dropped: it goes out on the next connect.
    let mut conn2 = feed.next_conn().await;
    wait_connected(&client).await;

    let frame = parsed(&conn2.next_text().await);
    assert_eq!(frame["type"], "subscribe");
    assert_eq!(frame["symbol"], "ETH");

    client.disconnect().await.unwrap();
}

#[tokio::test]
async fn price_updates_fold_last_write_wins() {
    let mut feed = MockFeed::spawn().await;
    let counter = generation();
    let mut client = relay(&feed, &counter);

    client.connect().await.unwrap();
    let conn = feed.next_conn().await;
    wait_connected(&client).await;

    let mut watchlist = Watchlist::with_defaults();

    conn.send_json(r#"{"type":"price_update","data":{"symbol":"BTC","price":100,"change":1.5}}"#);
    conn.send_json(r#"{"type":"price_update","data":{"symbol":"BTC","price":105,"change":2.0}}"#);

    // Observe both updates in order and fold them into the watchlist.
    {
        let events = client.events();
        tokio::pin!(events);
        let mut seen = 0;
        timeout(TEST_TIMEOUT, async {
            while let Some(ev) = events.next().await {
                if let WsEvent::Message(Kind::PriceUpdate(p)) = ev {
                    watchlist.apply(&p.data);
                    seen += 1;
                    if seen == 2 {
                        break;
                    }
                }
            }
        })
        .await
        .expect("timed out waiting for price updates");
    }

    let entry = watchlist.get(&Symbol::from("BTC")).unwrap();
    assert_eq!(entry.last_price, Some(105.into()));
    assert_eq!(entry.last_change, Some("2.0".parse().unwrap()));

    // The relay's own latest-value mapping agrees.
    let latest = client.latest(&Symbol::from("BTC")).await.unwrap();
    assert_eq!(latest.price, 105.into());

    client.disconnect().await.unwrap();
}

#[tokio::test]
async fn unrecognized_frame_changes_nothing() {
    let mut feed = MockFeed::spawn().await;
    let counter = generation();
    let mut client = relay(&feed, &counter);

    client.connect().await.unwrap();
    let conn = feed.next_conn().await;
    wait_connected(&client).await;

    // Server-side "ping" is not part of the client's inbound vocabulary.
    conn.send_json(r#"{"type":"ping"}"#);
    conn.send_json(r#"{"type":"server_gossip","data":{"x":1}}"#);
    // A recognizable frame afterwards, to prove the unknown ones emitted nothing.
    conn.send_json(r#"{"type":"pong","timestamp":null}"#);

    let ev = wait_for(&client, |ev| matches!(ev, WsEvent::Message(_))).await;
    assert!(
        matches!(ev, WsEvent::Message(Kind::Pong(_))),
        "unknown frames must not surface as events, got: {ev:?}"
    );
    assert!(client.is_connected());
    assert!(client.latest_all().await.is_empty());

    // Both raw frames were kept for inspection.
    let raw = client.raw_log().await;
    assert_eq!(raw.len(), 2);
    assert!(raw[0].contains("ping"));

    client.disconnect().await.unwrap();
}

#[tokio::test]
async fn logout_suppresses_reconnect() {
    let mut feed = MockFeed::spawn().await;
    let counter = generation();
    let mut client = relay(&feed, &counter);

    client.connect().await.unwrap();
    let conn = feed.next_conn().await;
    wait_connected(&client).await;

    // Logout bumps the session generation, then the connection drops.
    counter.fetch_add(1, Ordering::SeqCst);
    drop(conn);
    wait_for(&client, |ev| matches!(ev, WsEvent::Disconnected { .. })).await;

    // Well past the reconnect delay: no new connection may appear.
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(feed.live_connections(), 0);
    assert!(matches!(
        feed.conns.try_recv(),
        Err(mpsc::error::TryRecvError::Empty)
    ));
    assert_eq!(client.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn explicit_disconnect_does_not_reconnect() {
    let mut feed = MockFeed::spawn().await;
    let counter = generation();
    let mut client = relay(&feed, &counter);

    client.connect().await.unwrap();
    let _conn = feed.next_conn().await;
    wait_connected(&client).await;

    client.disconnect().await.unwrap();

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(matches!(
        feed.conns.try_recv(),
        Err(mpsc::error::TryRecvError::Empty)
    ));
    assert_eq!(client.state(), ConnectionState::Disconnected);
}
