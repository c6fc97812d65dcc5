//! Push-feed relay — `tokio-tungstenite`.
//!
//! Owns the single live connection to the price feed:
//! - Background tokio task for connection management
//! - Fixed-delay reconnection gated on the governing session's generation
//! - Symbol subscription tracking + replay after every (re)connect
//! - Latest-price map (one slot per symbol, last write wins)
//! - Capped raw log of frames with unrecognized tags
//! - Stream-based event delivery to observers

use std::collections::{HashMap, HashSet, VecDeque};
use std::pin::Pin;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_lock::RwLock;
use futures_util::stream::{SplitSink, SplitStream, Stream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::auth::SessionGate;
use crate::error::WsError;
use crate::shared::Symbol;
use crate::ws::{ConnectionState, Kind, MessageOut, PriceUpdate, WsConfig, WsEvent};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Unrecognized frames kept for inspection, newest last.
const RAW_LOG_CAP: usize = 100;

// ─── Commands from public API to background task ─────────────────────────────

enum Command {
    Send(MessageOut),
    Disconnect,
}

// ─── Disconnect reasons for the reconnection decision ────────────────────────

enum DisconnectReason {
    /// `disconnect()` called or the client was dropped — never reconnect.
    UserRequested,
    /// The socket closed or failed. Any close, server-initiated or not,
    /// goes through the same fixed-delay reconnect path.
    ConnectionLost,
}

// ─── Background task state ───────────────────────────────────────────────────

struct TaskState {
    config: WsConfig,
    connect_url: String,
    gate: SessionGate,
    event_tx: mpsc::Sender<WsEvent>,
    cmd_rx: mpsc::Receiver<Command>,
    subscriptions: HashSet<Symbol>,
    pending: Vec<MessageOut>,
    state: Arc<AtomicU8>,
    latest: Arc<RwLock<HashMap<Symbol, PriceUpdate>>>,
    raw_log: Arc<RwLock<VecDeque<String>>>,
}

impl TaskState {
    fn emit(&self, event: WsEvent) {
        // A full event queue drops rather than blocks the feed.
        let _ = self.event_tx.try_send(event);
    }

    fn set_state(&self, state: ConnectionState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }
}

// ─── Public WsClient ─────────────────────────────────────────────────────────

/// The relay: one live push-feed connection, symbol subscriptions, and the
/// latest-price mapping.
///
/// Created via [`crate::client::PriceWatchClient::ws`], which wires in the
/// current session's token and generation gate. A background tokio task owns
/// the socket; the public API talks to it over mpsc channels, so there is at
/// most one live connection per relay at any point in its lifecycle.
pub struct WsClient {
    config: WsConfig,
    connect_url: String,
    gate: SessionGate,
    cmd_tx: Option<mpsc::Sender<Command>>,
    event_rx: tokio::sync::Mutex<mpsc::Receiver<WsEvent>>,
    event_tx: mpsc::Sender<WsEvent>,
    task_handle: Option<JoinHandle<()>>,
    state: Arc<AtomicU8>,
    latest: Arc<RwLock<HashMap<Symbol, PriceUpdate>>>,
    raw_log: Arc<RwLock<VecDeque<String>>>,
}

impl WsClient {
    /// Create a new relay. Does not connect yet.
    ///
    /// `token` is the session's access token, passed to the feed endpoint as
    /// a query parameter; `gate` pins the relay to the session that issued it.
    pub fn new(config: WsConfig, gate: SessionGate, token: &str) -> Self {
        let (event_tx, event_rx) = mpsc::channel(256);
        let connect_url = config.connect_url(token);
        Self {
            config,
            connect_url,
            gate,
            cmd_tx: None,
            event_rx: tokio::sync::Mutex::new(event_rx),
            event_tx,
            task_handle: None,
            state: Arc::new(AtomicU8::new(ConnectionState::Disconnected as u8)),
            latest: Arc::new(RwLock::new(HashMap::new())),
            raw_log: Arc::new(RwLock::new(VecDeque::new())),
        }
    }

    /// Open the connection.
    ///
    /// Spawns the background task that manages the socket, keepalive pings,
    /// subscription replay, and the reconnect loop. Calling this while the
    /// task is already running is a no-op — the relay never holds two
    /// connections.
    pub async fn connect(&mut self) -> Result<(), WsError> {
        if self.cmd_tx.is_some() {
            return Ok(());
        }
        if !self.gate.is_current() {
            return Err(WsError::ConnectionFailed("session ended".into()));
        }

        let (cmd_tx, cmd_rx) = mpsc::channel(64);
        self.cmd_tx = Some(cmd_tx);
        self.state
            .store(ConnectionState::Connecting as u8, Ordering::SeqCst);

        let state = TaskState {
            config: self.config.clone(),
            connect_url: self.connect_url.clone(),
            gate: self.gate.clone(),
            event_tx: self.event_tx.clone(),
            cmd_rx,
            subscriptions: HashSet::new(),
            pending: Vec::new(),
            state: Arc::clone(&self.state),
            latest: Arc::clone(&self.latest),
            raw_log: Arc::clone(&self.raw_log),
        };

        let handle = tokio::spawn(run_task(state));
        self.task_handle = Some(handle);

        Ok(())
    }

    /// Close the connection and stop the background task.
    ///
    /// No reconnect is scheduled after an explicit disconnect.
    pub async fn disconnect(&mut self) -> Result<(), WsError> {
        if let Some(tx) = self.cmd_tx.take() {
            let _ = tx.send(Command::Disconnect).await;
        }

        if let Some(handle) = self.task_handle.take() {
            let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
        }

        self.state
            .store(ConnectionState::Disconnected as u8, Ordering::SeqCst);
        Ok(())
    }

    /// Send a message to the server.
    ///
    /// Subscription commands update the tracked set even while the socket is
    /// down and are replayed on the next connect. Returns
    /// `WsError::NotConnected` when the relay has not been started (or has
    /// been torn down).
    pub fn send(&self, msg: MessageOut) -> Result<(), WsError> {
        match &self.cmd_tx {
            Some(tx) => tx.try_send(Command::Send(msg)).map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => {
                    WsError::SendFailed("Command channel full".into())
                }
                mpsc::error::TrySendError::Closed(_) => WsError::NotConnected,
            }),
            None => Err(WsError::NotConnected),
        }
    }

    /// Subscribe to price updates for a symbol.
    ///
    /// Idempotent on the tracked set; the wire command is emitted every time.
    pub fn subscribe(&self, symbol: impl Into<Symbol>) -> Result<(), WsError> {
        self.send(MessageOut::subscribe(symbol))
    }

    /// Unsubscribe from price updates for a symbol.
    pub fn unsubscribe(&self, symbol: impl Into<Symbol>) -> Result<(), WsError> {
        self.send(MessageOut::unsubscribe(symbol))
    }

    /// Whether the socket is currently open.
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        ConnectionState::from(self.state.load(Ordering::SeqCst))
    }

    /// Latest observed price for a symbol, if any update has arrived.
    pub async fn latest(&self, symbol: &Symbol) -> Option<PriceUpdate> {
        self.latest.read().await.get(symbol).cloned()
    }

    /// Snapshot of the latest price per symbol.
    pub async fn latest_all(&self) -> HashMap<Symbol, PriceUpdate> {
        self.latest.read().await.clone()
    }

    /// Raw frames whose tag the client did not recognize, oldest first.
    pub async fn raw_log(&self) -> Vec<String> {
        self.raw_log.read().await.iter().cloned().collect()
    }

    /// Get a stream of events from the connection.
    ///
    /// The returned stream borrows `self`, so it must be dropped before
    /// calling `disconnect()`.
    pub fn events(&self) -> Pin<Box<dyn Stream<Item = WsEvent> + Send + '_>> {
        Box::pin(futures_util::stream::unfold(
            &self.event_rx,
            |rx| async move {
                let mut guard = rx.lock().await;
                guard.recv().await.map(|event| (event, rx))
            },
        ))
    }
}

impl Drop for WsClient {
    fn drop(&mut self) {
        if let Some(handle) = self.task_handle.take() {
            handle.abort();
        }
    }
}

// ─── Background task ─────────────────────────────────────────────────────────

async fn run_task(mut state: TaskState) {
    loop {
        // ── 1. Attempt connection ────────────────────────────────────────
        state.set_state(ConnectionState::Connecting);
        let (sink, stream) = match attempt_connect(&state.connect_url).await {
            Ok(parts) => parts,
            Err(e) => {
                tracing::error!("Push-feed connection failed: {}", e);
                state.emit(WsEvent::Error(format!("Connection failed: {}", e)));
                state.set_state(ConnectionState::Disconnected);

                if state.config.reconnect && reconnect_delay(&mut state).await {
                    continue;
                }
                return;
            }
        };

        // ── 2. Connected ─────────────────────────────────────────────────
        state.set_state(ConnectionState::Connected);
        state.emit(WsEvent::Connected);

        // ── 3. Flush queued sends and replay tracked subscriptions ───────
        let mut sink = sink;
        flush_pending(&mut sink, &mut state.pending).await;
        resubscribe_all(&mut sink, &state.subscriptions).await;

        // ── 4. Inner select! loop ────────────────────────────────────────
        let reason = run_connected(&mut state, sink, stream).await;

        // ── 5. Post-disconnect decision ──────────────────────────────────
        state.set_state(ConnectionState::Disconnected);

        match reason {
            DisconnectReason::UserRequested => return,
            DisconnectReason::ConnectionLost => {
                if state.config.reconnect && reconnect_delay(&mut state).await {
                    continue;
                }
                return;
            }
        }
    }
}

/// The inner connected loop — runs until the connection breaks.
async fn run_connected(
    state: &mut TaskState,
    mut sink: SplitSink<WsStream, Message>,
    mut stream: SplitStream<WsStream>,
) -> DisconnectReason {
    let mut ping_interval =
        tokio::time::interval(Duration::from_millis(state.config.ping_interval_ms));
    ping_interval.reset(); // skip immediate first tick

    loop {
        tokio::select! {
            // ── a) Incoming frame ────────────────────────────────────────
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        handle_text(state, text.as_ref()).await;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sink.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Pong(_))) => {
                        // WS-level pong — harmless, ignore
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let (code, reason) = extract_close(frame.as_ref());
                        state.emit(WsEvent::Disconnected {
                            code: Some(code),
                            reason,
                        });
                        return DisconnectReason::ConnectionLost;
                    }
                    Some(Ok(_)) => {} // Binary, Frame — ignore
                    Some(Err(e)) => {
                        let reason = e.to_string();
                        tracing::error!("Push-feed error: {}", reason);
                        state.emit(WsEvent::Disconnected { code: None, reason });
                        return DisconnectReason::ConnectionLost;
                    }
                    None => {
                        state.emit(WsEvent::Disconnected {
                            code: None,
                            reason: "Stream ended".into(),
                        });
                        return DisconnectReason::ConnectionLost;
                    }
                }
            }

            // ── b) Command from public API ───────────────────────────────
            cmd = state.cmd_rx.recv() => {
                match cmd {
                    Some(Command::Send(msg_out)) => {
                        track_subscription(&mut state.subscriptions, &msg_out);
                        if let Err(e) = send_msg(&mut sink, &msg_out).await {
                            tracing::warn!("Send failed: {}", e);
                        }
                    }
                    Some(Command::Disconnect) => {
                        let _ = sink.send(Message::Close(Some(CloseFrame {
                            code: CloseCode::Normal,
                            reason: "Client disconnect".into(),
                        }))).await;
                        return DisconnectReason::UserRequested;
                    }
                    None => {
                        // WsClient dropped — clean exit
                        return DisconnectReason::UserRequested;
                    }
                }
            }

            // ── c) Keepalive ping ────────────────────────────────────────
            _ = ping_interval.tick() => {
                if let Err(e) = send_msg(&mut sink, &MessageOut::Ping).await {
                    tracing::warn!("Failed to send ping: {}", e);
                }
            }
        }
    }
}

/// Decode a text frame and fan it out.
///
/// Price updates overwrite the per-symbol slot before observers are
/// notified. Frames with an unrecognized tag go to the raw log and nowhere
/// else; malformed JSON is reported as an `Error` event without touching the
/// connection state.
async fn handle_text(state: &TaskState, text: &str) {
    match serde_json::from_str::<Kind>(text) {
        Ok(Kind::PriceUpdate(payload)) => {
            state
                .latest
                .write()
                .await
                .insert(payload.data.symbol.clone(), payload.data.clone());
            state.emit(WsEvent::Message(Kind::PriceUpdate(payload)));
        }
        Ok(Kind::Unknown) => {
            tracing::debug!("Unrecognized push-feed frame: {}", text);
            let mut log = state.raw_log.write().await;
            if log.len() == RAW_LOG_CAP {
                log.pop_front();
            }
            log.push_back(text.to_string());
        }
        Ok(kind) => {
            state.emit(WsEvent::Message(kind));
        }
        Err(e) => {
            tracing::warn!("Push-feed deserialization error: {} — raw: {}", e, text);
            state.emit(WsEvent::Error(format!("Deserialization error: {}", e)));
        }
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Attempt to establish a connection with a 30-second timeout.
async fn attempt_connect(
    url: &str,
) -> Result<(SplitSink<WsStream, Message>, SplitStream<WsStream>), String> {
    let (ws_stream, _) = tokio::time::timeout(Duration::from_secs(30), connect_async(url))
        .await
        .map_err(|_| "Connection timeout".to_string())?
        .map_err(|e| e.to_string())?;

    Ok(ws_stream.split())
}

/// Serialize and send a MessageOut over the sink.
async fn send_msg(
    sink: &mut SplitSink<WsStream, Message>,
    msg: &MessageOut,
) -> Result<(), String> {
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json.into()))
        .await
        .map_err(|e| e.to_string())
}

/// Extract close code and reason from an optional CloseFrame.
fn extract_close(frame: Option<&CloseFrame>) -> (u16, String) {
    match frame {
        Some(f) => (f.code.into(), f.reason.to_string()),
        None => (1006, "No close frame".into()),
    }
}

/// Wait the fixed reconnect delay, queueing commands that arrive meanwhile.
///
/// Returns `true` if the loop should attempt another connection. The session
/// gate is checked *after* the sleep — the session may have ended while the
/// delay was pending, and a stale relay must not reconnect.
async fn reconnect_delay(state: &mut TaskState) -> bool {
    tracing::info!(
        "Reconnecting to push feed in {}ms",
        state.config.reconnect_delay_ms
    );
    tokio::time::sleep(Duration::from_millis(state.config.reconnect_delay_ms)).await;

    if !drain_commands_to_pending(state) {
        return false;
    }
    if !state.gate.is_current() {
        tracing::info!("Session ended during reconnect delay — relay stopping");
        return false;
    }
    true
}

// ─── Subscription tracking ───────────────────────────────────────────────────

fn track_subscription(subs: &mut HashSet<Symbol>, msg: &MessageOut) {
    match msg {
        MessageOut::Subscribe { symbol } => {
            if subs.insert(symbol.clone()) {
                tracing::debug!("Tracking subscription: {}", symbol);
            }
        }
        MessageOut::Unsubscribe { symbol } => {
            if subs.remove(symbol) {
                tracing::debug!("Dropped subscription: {}", symbol);
            }
        }
        MessageOut::Ping | MessageOut::GetSubscriptions => {}
    }
}

async fn resubscribe_all(sink: &mut SplitSink<WsStream, Message>, subs: &HashSet<Symbol>) {
    if subs.is_empty() {
        return;
    }
    tracing::info!("Resubscribing to {} tracked symbol(s)", subs.len());
    for symbol in subs {
        let msg = MessageOut::Subscribe {
            symbol: symbol.clone(),
        };
        if let Err(e) = send_msg(sink, &msg).await {
            tracing::warn!("Failed to resubscribe {}: {}", symbol, e);
        }
    }
}

// ─── Message queue ───────────────────────────────────────────────────────────

async fn flush_pending(sink: &mut SplitSink<WsStream, Message>, pending: &mut Vec<MessageOut>) {
    if pending.is_empty() {
        return;
    }
    tracing::info!("Flushing {} pending message(s)", pending.len());
    let messages = std::mem::take(pending);
    for msg in &messages {
        if let Err(e) = send_msg(sink, msg).await {
            tracing::warn!("Failed to flush pending message: {}", e);
        }
    }
}

/// Drain commands that arrived while disconnected into the pending queue.
/// Returns `false` if a `Disconnect` command was among them.
fn drain_commands_to_pending(state: &mut TaskState) -> bool {
    while let Ok(cmd) = state.cmd_rx.try_recv() {
        match cmd {
            Command::Send(msg) => {
                track_subscription(&mut state.subscriptions, &msg);
                state.pending.push(msg);
            }
            Command::Disconnect => {
                return false;
            }
        }
    }
    true
}

// ─── Tests ───────────────────────────────────────────────────────────────────
