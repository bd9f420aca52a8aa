//! Realtime channel client.
//!
//! This module contains [`RealtimeChannel`], a single WebSocket client that
//! is parameterized by a [`ChannelProtocol`]. It owns the connection
//! lifecycle, reconnects with backoff, buffers outgoing messages while
//! reconnecting, answers keep-alive pings and dispatches decoded events to
//! registered callbacks.

use futures::{SinkExt, StreamExt};
use futures::stream::{SplitSink, SplitStream};
use parking_lot::RwLock;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, info, warn};

use bytes::Bytes;

use super::callbacks::{ChannelCallback, ChannelHandlers, Dispatch, dispatch, into_callback};
use super::errors::{ChannelError, ChannelResult};
use super::messages::{
    AgentCorrection, AudioEvent, ControlAction, InboundEvent, OutboundMessage, PingEvent,
};
use super::outbox::Outbox;
use super::protocol::ChannelProtocol;
use super::reconnect::{CloseDisposition, ReconnectPolicy, classify_close_code};
use super::state::ConnectionState;
use crate::core::emotion::EmotionSample;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// Close code used when no close frame was received
const NO_STATUS_CODE: u16 = 1005;

// =============================================================================
// Configuration
// =============================================================================

/// Transport-level settings shared by every vendor.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Time allowed for the initial handshake
    pub connect_timeout: Duration,
    pub reconnect: ReconnectPolicy,
    /// Maximum messages buffered while reconnecting
    pub outbox_capacity: usize,
    /// Bounded queue between callers and the socket task
    pub command_buffer: usize,
    /// Time `disconnect()` waits for the socket task before aborting it
    pub shutdown_timeout: Duration,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            reconnect: ReconnectPolicy::default(),
            outbox_capacity: 256,
            command_buffer: 64,
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}

// =============================================================================
// Shared State
// =============================================================================

/// State shared between the public handle, the socket task and the dispatcher.
struct ChannelShared {
    name: &'static str,
    state: RwLock<ConnectionState>,
    handlers: RwLock<ChannelHandlers>,
    session_id: RwLock<Option<String>>,
    /// Lifetime count of reconnect attempts, never reset
    reconnect_attempts: AtomicU32,
    outbound_tx: RwLock<Option<mpsc::Sender<OutboundMessage>>>,
}

impl ChannelShared {
    fn set_state(&self, state: ConnectionState, notify: &mpsc::UnboundedSender<Dispatch>) {
        {
            let mut current = self.state.write();
            if *current == state {
                return;
            }
            debug!("{} channel: {} -> {}", self.name, *current, state);
            *current = state.clone();
        }
        let _ = notify.send(Dispatch::Status(state));
    }
}

/// Task handles owned by the public handle.
#[derive(Default)]
struct ChannelRuntime {
    shutdown_tx: Option<oneshot::Sender<()>>,
    connection_handle: Option<JoinHandle<()>>,
    dispatch_handle: Option<JoinHandle<()>>,
}

// =============================================================================
// RealtimeChannel
// =============================================================================

/// A single logical connection to a vendor's realtime endpoint.
///
/// # Architecture
///
/// ```text
/// ┌──────────────┐    ┌───────────────────┐    ┌──────────────────────┐
/// │   send*()    │───▶│ outbound_tx (mpsc)│───▶│   Socket Task        │──▶ WebSocket
/// └──────────────┘    └───────────────────┘    │ (encode, outbox,     │
///                                              │  pong, reconnect)    │◀── WebSocket
///                                              └──────────┬───────────┘
///                                                         │ Dispatch (mpsc)
///                                              ┌──────────▼───────────┐
///                                              │  Dispatcher Task     │──▶ Callbacks
///                                              └──────────────────────┘
/// ```
///
/// Callbacks run on the dispatcher task, so a slow callback never stalls
/// the socket. Dropping the channel signals the socket task to close.
pub struct RealtimeChannel<P: ChannelProtocol> {
    protocol: Arc<P>,
    config: ChannelConfig,
    shared: Arc<ChannelShared>,
    runtime: Mutex<ChannelRuntime>,
}

impl<P: ChannelProtocol> RealtimeChannel<P> {
    pub fn new(protocol: P, config: ChannelConfig) -> Self {
        let name = protocol.name();
        Self {
            protocol: Arc::new(protocol),
            config,
            shared: Arc::new(ChannelShared {
                name,
                state: RwLock::new(ConnectionState::Disconnected),
                handlers: RwLock::new(ChannelHandlers::default()),
                session_id: RwLock::new(None),
                reconnect_attempts: AtomicU32::new(0),
                outbound_tx: RwLock::new(None),
            }),
            runtime: Mutex::new(ChannelRuntime::default()),
        }
    }

    /// The vendor protocol driving this channel.
    pub fn protocol(&self) -> &P {
        &self.protocol
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.state.read().clone()
    }

    /// Whether messages are sent immediately.
    pub fn is_ready(&self) -> bool {
        matches!(self.state(), ConnectionState::Connected)
    }

    /// Session id reported by the vendor, if any.
    pub fn session_id(&self) -> Option<String> {
        self.shared.session_id.read().clone()
    }

    /// Total reconnect attempts over the lifetime of this channel.
    pub fn reconnect_attempts(&self) -> u32 {
        self.shared.reconnect_attempts.load(Ordering::SeqCst)
    }

    /// Open the connection.
    ///
    /// Does nothing when the channel is already connecting, connected or
    /// reconnecting. Resolves once the socket is open and the vendor
    /// initialization payload has been sent.
    pub async fn connect(&self) -> ChannelResult<()> {
        let mut runtime = self.runtime.lock().await;

        if self.state().is_active() {
            debug!(
                "{} channel already {}, ignoring connect()",
                self.shared.name,
                self.state()
            );
            return Ok(());
        }

        // Leftovers from a previous failed or exhausted session
        Self::abort_tasks(&mut runtime);

        let (dispatch_tx, dispatch_rx) = mpsc::unbounded_channel::<Dispatch>();
        let (outbound_tx, outbound_rx) = mpsc::channel::<OutboundMessage>(self.config.command_buffer);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let (ready_tx, ready_rx) = oneshot::channel::<ChannelResult<()>>();

        let shared = self.shared.clone();
        runtime.dispatch_handle = Some(tokio::spawn(async move {
            run_dispatcher(shared, dispatch_rx).await;
        }));

        *self.shared.session_id.write() = None;
        *self.shared.outbound_tx.write() = Some(outbound_tx);
        self.shared.set_state(ConnectionState::Connecting, &dispatch_tx);

        let task = ConnectionTask {
            protocol: self.protocol.clone(),
            policy: self.config.reconnect.clone(),
            connect_timeout: self.config.connect_timeout,
            shared: self.shared.clone(),
            notify: dispatch_tx.clone(),
            outbound_rx,
            shutdown_rx,
            outbox: Outbox::new(self.config.outbox_capacity),
        };
        runtime.connection_handle = Some(tokio::spawn(task.run(ready_tx)));
        runtime.shutdown_tx = Some(shutdown_tx);

        match timeout(self.config.connect_timeout, ready_rx).await {
            Ok(Ok(Ok(()))) => {
                info!("Connected {} channel", self.shared.name);
                Ok(())
            }
            Ok(Ok(Err(e))) => {
                error!("Failed to connect {} channel: {}", self.shared.name, e);
                *self.shared.outbound_tx.write() = None;
                Err(e)
            }
            Ok(Err(_)) => {
                let err = ChannelError::ConnectionFailed(
                    "Connection task ended before the socket opened".to_string(),
                );
                *self.shared.outbound_tx.write() = None;
                self.shared
                    .set_state(ConnectionState::Error(err.to_string()), &dispatch_tx);
                Err(err)
            }
            Err(_) => {
                let err = ChannelError::Timeout(self.config.connect_timeout);
                error!("{} channel: {}", self.shared.name, err);
                if let Some(handle) = runtime.connection_handle.take() {
                    handle.abort();
                }
                runtime.shutdown_tx = None;
                *self.shared.outbound_tx.write() = None;
                self.shared
                    .set_state(ConnectionState::Error(err.to_string()), &dispatch_tx);
                Err(err)
            }
        }
    }

    /// Close the connection and stop reconnecting.
    ///
    /// Buffered messages are discarded.
    pub async fn disconnect(&self) -> ChannelResult<()> {
        let mut runtime = self.runtime.lock().await;

        if let Some(shutdown_tx) = runtime.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }

        if let Some(handle) = runtime.connection_handle.take() {
            let abort = handle.abort_handle();
            if timeout(self.config.shutdown_timeout, handle).await.is_err() {
                warn!(
                    "{} channel task did not stop within {:?}, aborting",
                    self.shared.name, self.config.shutdown_timeout
                );
                abort.abort();
            }
        }

        *self.shared.outbound_tx.write() = None;

        // The socket task held the last notify sender, so the dispatcher drains and exits
        if let Some(handle) = runtime.dispatch_handle.take() {
            let abort = handle.abort_handle();
            if timeout(Duration::from_secs(1), handle).await.is_err() {
                abort.abort();
            }
        }

        *self.shared.session_id.write() = None;
        let previous =
            std::mem::replace(&mut *self.shared.state.write(), ConnectionState::Disconnected);
        if previous != ConnectionState::Disconnected {
            // Dispatcher is gone, so status observers are called inline
            debug!("{} channel: {} -> {}", self.shared.name, previous, ConnectionState::Disconnected);
            dispatch(
                &self.shared.handlers,
                Dispatch::Status(ConnectionState::Disconnected),
            )
            .await;
        }

        info!("Disconnected {} channel", self.shared.name);
        Ok(())
    }

    /// Send an outgoing message.
    ///
    /// While reconnecting the message is buffered and replayed once the
    /// connection is restored. In any other non-connected state the message
    /// is rejected with [`ChannelError::NotConnected`].
    pub async fn send(&self, message: OutboundMessage) -> ChannelResult<()> {
        let state = self.state();
        if !state.accepts_messages() {
            warn!(
                "{} channel is {}, dropping {} message",
                self.shared.name,
                state,
                message.kind()
            );
            return Err(ChannelError::NotConnected(format!(
                "{} channel is {}",
                self.shared.name, state
            )));
        }

        let sender = self.shared.outbound_tx.read().clone().ok_or_else(|| {
            ChannelError::NotConnected(format!("{} channel has no socket task", self.shared.name))
        })?;

        sender.send(message).await.map_err(|_| {
            ChannelError::NotConnected(format!("{} channel task has stopped", self.shared.name))
        })
    }

    pub async fn send_audio(&self, audio: impl Into<Bytes>) -> ChannelResult<()> {
        self.send(OutboundMessage::AudioChunk(audio.into())).await
    }

    pub async fn send_text(&self, text: impl Into<String>) -> ChannelResult<()> {
        self.send(OutboundMessage::UserText(text.into())).await
    }

    pub async fn send_contextual_update(&self, text: impl Into<String>) -> ChannelResult<()> {
        self.send(OutboundMessage::ContextualUpdate(text.into())).await
    }

    pub async fn send_control(&self, action: ControlAction) -> ChannelResult<()> {
        self.send(OutboundMessage::Control(action)).await
    }

    pub async fn send_media(
        &self,
        mime_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> ChannelResult<()> {
        self.send(OutboundMessage::Media {
            mime_type: mime_type.into(),
            data: data.into(),
        })
        .await
    }

    fn abort_tasks(runtime: &mut ChannelRuntime) {
        runtime.shutdown_tx = None;
        if let Some(handle) = runtime.connection_handle.take() {
            handle.abort();
        }
        if let Some(handle) = runtime.dispatch_handle.take() {
            handle.abort();
        }
    }
}

// =============================================================================
// Callback Registration
// =============================================================================

macro_rules! callback_setter {
    ($(#[$doc:meta])* $method:ident, $slot:ident, $ty:ty) => {
        $(#[$doc])*
        pub fn $method<F, Fut>(&self, callback: F)
        where
            F: Fn($ty) -> Fut + Send + Sync + 'static,
            Fut: Future<Output = ()> + Send + 'static,
        {
            self.shared.handlers.write().$slot = Some(into_callback(callback));
        }
    };
}

impl<P: ChannelProtocol> RealtimeChannel<P> {
    callback_setter!(
        /// Vendor acknowledged the session; receives the session id.
        on_session_started, session_started, Option<String>
    );
    callback_setter!(
        /// Final user transcript.
        on_transcript, transcript, String
    );
    callback_setter!(on_agent_response, agent_response, String);
    callback_setter!(on_agent_correction, agent_correction, AgentCorrection);
    callback_setter!(
        /// Agent audio, already base64-decoded.
        on_audio, audio, AudioEvent
    );
    callback_setter!(
        /// Keep-alive ping. The pong has already been sent when this runs.
        on_ping, ping, PingEvent
    );
    callback_setter!(on_vad_score, vad_score, f32);
    callback_setter!(on_interruption, interruption, Option<u64>);
    callback_setter!(on_turn_complete, turn_complete, ());
    callback_setter!(on_emotion, emotion, Vec<EmotionSample>);
    callback_setter!(
        /// Every connection state change.
        on_status, status, ConnectionState
    );
    callback_setter!(
        /// Streaming errors, in-band vendor errors and reconnect exhaustion.
        on_error, error, ChannelError
    );

    /// Register a pre-built callback for the error slot.
    pub fn set_error_callback(&self, callback: ChannelCallback<ChannelError>) {
        self.shared.handlers.write().error = Some(callback);
    }

    /// Remove every registered callback.
    pub fn clear_callbacks(&self) {
        *self.shared.handlers.write() = ChannelHandlers::default();
    }
}

impl<P: ChannelProtocol> Drop for RealtimeChannel<P> {
    fn drop(&mut self) {
        if let Ok(mut runtime) = self.runtime.try_lock()
            && let Some(shutdown_tx) = runtime.shutdown_tx.take()
        {
            let _ = shutdown_tx.send(());
        }
    }
}

// =============================================================================
// Dispatcher Task
// =============================================================================

async fn run_dispatcher(shared: Arc<ChannelShared>, mut rx: mpsc::UnboundedReceiver<Dispatch>) {
    while let Some(item) = rx.recv().await {
        dispatch(&shared.handlers, item).await;
    }
    debug!("{} channel dispatcher stopped", shared.name);
}

// =============================================================================
// Socket Task
// =============================================================================

/// Why a connected session ended.
#[derive(Debug)]
enum SessionEnd {
    /// Intentional disconnect or the channel handle was dropped
    Shutdown,
    /// Remote sent a close frame
    Closed { code: u16, reason: String },
    /// Socket error or stream ended without a close frame
    Lost(String),
}

struct ConnectionTask<P: ChannelProtocol> {
    protocol: Arc<P>,
    policy: ReconnectPolicy,
    /// Deadline for each reconnect handshake
    connect_timeout: Duration,
    shared: Arc<ChannelShared>,
    notify: mpsc::UnboundedSender<Dispatch>,
    outbound_rx: mpsc::Receiver<OutboundMessage>,
    shutdown_rx: oneshot::Receiver<()>,
    outbox: Outbox,
}

impl<P: ChannelProtocol> ConnectionTask<P> {
    async fn run(mut self, ready_tx: oneshot::Sender<ChannelResult<()>>) {
        let name = self.protocol.name();

        let mut ws = match Self::open(&self.protocol).await {
            Ok(ws) => ws,
            Err(e) => {
                self.set_state(ConnectionState::Error(e.to_string()));
                let _ = ready_tx.send(Err(e));
                return;
            }
        };

        self.set_state(ConnectionState::Connected);
        let _ = ready_tx.send(Ok(()));

        // Retries made during the current outage
        let mut attempt: u32 = 0;

        loop {
            let end = self.pump(ws, &mut attempt).await;

            match end {
                SessionEnd::Shutdown => {
                    info!("{} channel shut down", name);
                    self.set_state(ConnectionState::Disconnected);
                    break;
                }
                SessionEnd::Closed { code, reason }
                    if classify_close_code(code) == CloseDisposition::Terminal =>
                {
                    info!("{} closed the connection ({}): {}", name, code, reason);
                    if code == 1000 {
                        self.set_state(ConnectionState::Disconnected);
                    } else {
                        let err = ChannelError::Closed { code, reason };
                        self.set_state(ConnectionState::Error(err.to_string()));
                        self.report(err);
                    }
                    break;
                }
                SessionEnd::Closed { code, reason } => {
                    warn!("{} connection closed ({}): {}, reconnecting", name, code, reason);
                }
                SessionEnd::Lost(reason) => {
                    warn!("{} connection lost: {}, reconnecting", name, reason);
                }
            }

            match self.reconnect(&mut attempt).await {
                Some(restored) => ws = restored,
                None => break,
            }
        }

        if !self.outbox.is_empty() || self.outbox.dropped() > 0 {
            warn!(
                "{} channel stopped with {} buffered messages discarded ({} dropped on overflow)",
                name,
                self.outbox.len(),
                self.outbox.dropped()
            );
        }
        self.outbox.clear();
        *self.shared.outbound_tx.write() = None;
        debug!("{} channel socket task stopped", name);
    }

    fn set_state(&self, state: ConnectionState) {
        self.shared.set_state(state, &self.notify);
    }

    fn report(&self, error: ChannelError) {
        let _ = self.notify.send(Dispatch::Error(error));
    }

    /// Handshake, then send the vendor initialization payload.
    async fn open(protocol: &P) -> ChannelResult<WsStream> {
        let request = protocol.build_request()?;
        let (mut ws, _response) = connect_async(request).await.map_err(map_connect_error)?;

        protocol.reset();
        for init in protocol.init_messages()? {
            ws.send(Message::Text(init.into())).await.map_err(|e| {
                ChannelError::NetworkError(format!("Failed to send initialization payload: {e}"))
            })?;
        }

        debug!("{} channel opened and initialized", protocol.name());
        Ok(ws)
    }

    /// Run one connected session until it ends.
    async fn pump(&mut self, ws: WsStream, attempt: &mut u32) -> SessionEnd {
        let (mut sink, mut source) = ws.split();

        if let Err(reason) = self.replay(&mut sink).await {
            return SessionEnd::Lost(reason);
        }

        loop {
            tokio::select! {
                biased;

                _ = &mut self.shutdown_rx => {
                    let _ = sink.send(Message::Close(None)).await;
                    return SessionEnd::Shutdown;
                }

                outbound = self.outbound_rx.recv() => {
                    let Some(message) = outbound else {
                        let _ = sink.send(Message::Close(None)).await;
                        return SessionEnd::Shutdown;
                    };
                    if let Err(e) = self.write(&mut sink, &message).await {
                        self.outbox.requeue(message);
                        return SessionEnd::Lost(e.to_string());
                    }
                }

                frame = source.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => {
                            *attempt = 0;
                            if let Err(e) = self.handle_frame(text.as_str(), &mut sink).await {
                                return SessionEnd::Lost(e.to_string());
                            }
                        }
                        Some(Ok(Message::Binary(data))) => {
                            *attempt = 0;
                            match binary_json(&data) {
                                Some(text) => {
                                    if let Err(e) = self.handle_frame(text, &mut sink).await {
                                        return SessionEnd::Lost(e.to_string());
                                    }
                                }
                                None => debug!(
                                    "Ignoring {} byte binary frame from {}",
                                    data.len(),
                                    self.protocol.name()
                                ),
                            }
                        }
                        Some(Ok(Message::Ping(payload))) => {
                            if let Err(e) = sink.send(Message::Pong(payload)).await {
                                return SessionEnd::Lost(format!("Failed to send pong: {e}"));
                            }
                        }
                        Some(Ok(Message::Close(frame))) => {
                            let (code, reason) = frame
                                .map(|f| (u16::from(f.code), f.reason.as_str().to_string()))
                                .unwrap_or((NO_STATUS_CODE, String::new()));
                            return SessionEnd::Closed { code, reason };
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => return SessionEnd::Lost(format!("WebSocket error: {e}")),
                        None => return SessionEnd::Lost("stream ended".to_string()),
                    }
                }
            }
        }
    }

    /// Send everything buffered while the connection was down.
    async fn replay(&mut self, sink: &mut WsSink) -> Result<(), String> {
        if self.outbox.is_empty() {
            return Ok(());
        }

        info!(
            "Replaying {} buffered messages on {} channel",
            self.outbox.len(),
            self.protocol.name()
        );

        while let Some(message) = self.outbox.pop_front() {
            if let Err(e) = self.write(sink, &message).await {
                self.outbox.requeue(message);
                return Err(e.to_string());
            }
        }
        Ok(())
    }

    async fn write(&self, sink: &mut WsSink, message: &OutboundMessage) -> ChannelResult<()> {
        let Some(json) = self.protocol.encode(message)? else {
            debug!(
                "{} has no envelope for {} messages, skipping",
                self.protocol.name(),
                message.kind()
            );
            return Ok(());
        };

        sink.send(Message::Text(json.into()))
            .await
            .map_err(|e| ChannelError::NetworkError(format!("Failed to send {}: {e}", message.kind())))
    }

    /// Decode a frame, answer pings, and queue events for the dispatcher.
    async fn handle_frame(&mut self, text: &str, sink: &mut WsSink) -> ChannelResult<()> {
        let events = match self.protocol.decode(text) {
            Ok(events) => events,
            Err(e) => {
                warn!("Dropping malformed {} frame: {}", self.protocol.name(), e);
                return Ok(());
            }
        };

        for event in events {
            match &event {
                InboundEvent::Ping(ping) => {
                    self.write(sink, &OutboundMessage::Pong { event_id: ping.event_id })
                        .await?;
                }
                InboundEvent::SessionStarted { session_id, .. } => {
                    if let Some(id) = session_id {
                        info!("{} session started: {}", self.protocol.name(), id);
                    }
                    *self.shared.session_id.write() = session_id.clone();
                }
                _ => {}
            }

            let _ = self.notify.send(Dispatch::Event(event));
        }

        Ok(())
    }

    /// Retry until the connection is restored, the policy gives up, or shutdown.
    async fn reconnect(&mut self, attempt: &mut u32) -> Option<WsStream> {
        let name = self.protocol.name();

        loop {
            if !self.policy.should_retry(*attempt) {
                let err = ChannelError::ReconnectExhausted(*attempt);
                error!("{} channel: {}", name, err);
                self.set_state(ConnectionState::Error(err.to_string()));
                self.report(err);
                return None;
            }

            *attempt += 1;
            self.shared.reconnect_attempts.fetch_add(1, Ordering::SeqCst);
            self.set_state(ConnectionState::Reconnecting);

            let delay = self.policy.delay_for(*attempt);
            info!(
                "Reconnecting {} channel in {:?} (attempt {}/{})",
                name, delay, attempt, self.policy.max_attempts
            );

            if !self.wait_buffering(delay).await {
                self.set_state(ConnectionState::Disconnected);
                return None;
            }

            let open = timeout(self.connect_timeout, Self::open(&self.protocol));
            tokio::pin!(open);

            // Keep draining callers into the outbox while the handshake is pending
            let opened = loop {
                tokio::select! {
                    biased;
                    _ = &mut self.shutdown_rx => {
                        self.shared.set_state(ConnectionState::Disconnected, &self.notify);
                        return None;
                    }
                    result = &mut open => {
                        break result.unwrap_or(Err(ChannelError::Timeout(self.connect_timeout)));
                    }
                    outbound = self.outbound_rx.recv() => match outbound {
                        Some(message) => {
                            if !self.outbox.push(message) {
                                debug!("Message not buffered while reconnecting");
                            }
                        }
                        None => {
                            self.shared.set_state(ConnectionState::Disconnected, &self.notify);
                            return None;
                        }
                    },
                }
            };

            match opened {
                Ok(ws) => {
                    info!("Reconnected {} channel on attempt {}", name, attempt);
                    self.set_state(ConnectionState::Connected);
                    return Some(ws);
                }
                Err(e) if e.is_terminal() => {
                    error!("{} reconnect rejected: {}", name, e);
                    self.set_state(ConnectionState::Error(e.to_string()));
                    self.report(e);
                    return None;
                }
                Err(e) => {
                    warn!("{} reconnect attempt {} failed: {}", name, attempt, e);
                }
            }
        }
    }

    /// Sleep for `delay` while moving outgoing messages into the outbox.
    ///
    /// Returns false when shutdown was requested.
    async fn wait_buffering(&mut self, delay: Duration) -> bool {
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                biased;
                _ = &mut self.shutdown_rx => return false,
                _ = &mut sleep => return true,
                outbound = self.outbound_rx.recv() => match outbound {
                    Some(message) => {
                        if !self.outbox.push(message) {
                            debug!("Message not buffered while reconnecting");
                        }
                    }
                    None => return false,
                },
            }
        }
    }
}

/// Interpret a binary frame as JSON text when it looks like JSON.
fn binary_json(data: &[u8]) -> Option<&str> {
    let first = data.iter().find(|b| !b.is_ascii_whitespace())?;
    if *first != b'{' && *first != b'[' {
        return None;
    }
    std::str::from_utf8(data).ok()
}

fn map_connect_error(err: tokio_tungstenite::tungstenite::Error) -> ChannelError {
    use tokio_tungstenite::tungstenite::Error as WsError;

    match err {
        WsError::Http(response) => {
            let status = response.status().as_u16();
            let message = response
                .body()
                .as_ref()
                .map(|body| String::from_utf8_lossy(body).into_owned())
                .unwrap_or_default();
            ChannelError::Rejected { status, message }
        }
        other => ChannelError::ConnectionFailed(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_json_detection() {
        assert_eq!(binary_json(b"{\"a\":1}"), Some("{\"a\":1}"));
        assert_eq!(binary_json(b"  [1,2]"), Some("  [1,2]"));
        assert_eq!(binary_json(&[0u8, 1, 2, 3]), None);
        assert_eq!(binary_json(b""), None);
    }

    #[test]
    fn test_default_config() {
        let config = ChannelConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.reconnect.max_attempts, 3);
        assert_eq!(config.outbox_capacity, 256);
    }
}
