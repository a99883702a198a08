// file: src/client.rs
// description: server-sent-events client with bounded exponential-backoff reconnects

use crate::{
    auth::CredentialSource,
    backoff::ReconnectPolicy,
    client_state::{ClientState, ConnectionState},
    config::StreamConfig,
    error::StreamError,
    events::{ClientEvent, EventSender, emit},
    monitoring::{
        CONNECTED_GAUGE, CONTROL_FRAMES_COUNTER, MALFORMED_FRAMES_COUNTER, RECONNECT_COUNTER,
        STREAM_EVENTS_COUNTER,
    },
    sse::{LineDecoder, data_payload},
    transport::{ByteStream, Transport},
    types::StreamEvent,
};
use futures::{FutureExt, StreamExt, future::BoxFuture};
use parking_lot::Mutex;
use std::{
    panic::{self, AssertUnwindSafe},
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};
use tokio::{
    sync::{OwnedSemaphorePermit, Semaphore},
    task::JoinHandle,
    time,
};
use tracing::{debug, error, info, trace, warn};

pub type EventHandler = Arc<dyn Fn(StreamEvent) + Send + Sync>;
pub type ErrorHandler = Arc<dyn Fn(&StreamError) + Send + Sync>;

/// What happened to a single line read off the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Delivered,
    Control,
    Malformed,
    /// Not a `data: ` line.
    Ignored,
}

/// Parses one stream line and hands application events to `on_event`.
///
/// Control frames are dropped silently and malformed JSON is logged and
/// dropped; neither affects the connection.
pub fn process_data_line(line: &str, on_event: &(dyn Fn(StreamEvent) + Send + Sync)) -> FrameOutcome {
    let Some(payload) = data_payload(line) else {
        return FrameOutcome::Ignored;
    };

    match serde_json::from_str::<StreamEvent>(payload) {
        Ok(event) if event.is_control() => {
            trace!("Control frame: {}", event.event_type);
            CONTROL_FRAMES_COUNTER.increment(1);
            FrameOutcome::Control
        }
        Ok(event) => {
            debug!(event_type = %event.event_type, "Stream event received");
            STREAM_EVENTS_COUNTER.increment(1);
            if panic::catch_unwind(AssertUnwindSafe(|| on_event(event))).is_err() {
                error!("Stream event handler panicked");
            }
            FrameOutcome::Delivered
        }
        Err(e) => {
            MALFORMED_FRAMES_COUNTER.increment(1);
            error!(
                "Failed to parse stream event: {}. Frame: {}",
                e,
                payload.chars().take(100).collect::<String>()
            );
            FrameOutcome::Malformed
        }
    }
}

struct Shared {
    // bumped on every connect/disconnect; a task whose generation is stale
    // must not touch `state`
    generation: u64,
    task: Option<JoinHandle<()>>,
    state: ClientState,
}

/// Single logical notification channel for one base endpoint.
///
/// Must be used from within a tokio runtime: `connect` spawns the connection
/// task.
pub struct StreamClient {
    config: Arc<StreamConfig>,
    credentials: Arc<dyn CredentialSource>,
    transport: Arc<dyn Transport>,
    event_sender: EventSender,
    shared: Arc<Mutex<Shared>>,
    // one permit: at most one episode holds a transport at a time
    transport_slot: Arc<Semaphore>,
}

impl StreamClient {
    pub fn new(
        config: Arc<StreamConfig>,
        credentials: Arc<dyn CredentialSource>,
        transport: Arc<dyn Transport>,
        event_sender: EventSender,
    ) -> Self {
        Self {
            config,
            credentials,
            transport,
            event_sender,
            shared: Arc::new(Mutex::new(Shared {
                generation: 0,
                task: None,
                state: ClientState::new(),
            })),
            transport_slot: Arc::new(Semaphore::new(1)),
        }
    }

    /// Starts a fresh connection episode, replacing any existing one.
    ///
    /// Without a token nothing is opened and `on_error` receives
    /// [`StreamError::AuthUnavailable`].
    pub fn connect(&self, on_event: EventHandler, on_error: Option<ErrorHandler>) {
        let mut shared = self.shared.lock();
        shared.generation += 1;
        let generation = shared.generation;

        if let Some(task) = shared.task.take() {
            debug!("Tearing down existing notification stream");
            task.abort();
        }

        let Some(token) = self.credentials.bearer_token() else {
            let was_disconnected = shared.state.status == ConnectionState::Disconnected;
            shared.state.disconnect();
            drop(shared);

            warn!("No access token found for notification stream");
            if !was_disconnected {
                CONNECTED_GAUGE.set(0.0);
                emit(&self.event_sender, ClientEvent::Disconnected);
            }
            if let Some(on_error) = &on_error {
                on_error(&StreamError::AuthUnavailable);
            }
            return;
        };

        shared.state.mark_connecting();
        let episode = Episode {
            generation,
            shared: self.shared.clone(),
            config: self.config.clone(),
            credentials: self.credentials.clone(),
            transport: self.transport.clone(),
            event_sender: self.event_sender.clone(),
            on_event,
            on_error,
        };

        let slot = self.transport_slot.clone();
        shared.task = Some(tokio::spawn(async move {
            let Ok(permit) = slot.acquire_owned().await else {
                return;
            };
            Leased {
                episode: episode.run(token).boxed(),
                _permit: permit,
            }
            .await;
        }));
    }

    /// Cancels any pending reconnect and releases the transport. Idempotent.
    pub fn disconnect(&self) {
        let mut shared = self.shared.lock();
        shared.generation += 1;
        if let Some(task) = shared.task.take() {
            task.abort();
        }

        let was_disconnected = shared.state.status == ConnectionState::Disconnected;
        shared.state.disconnect();
        drop(shared);

        if !was_disconnected {
            info!("Notification stream disconnected");
            CONNECTED_GAUGE.set(0.0);
            emit(&self.event_sender, ClientEvent::Disconnected);
        }
    }

    pub fn is_connected(&self) -> bool {
        self.shared.lock().state.is_connected()
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.lock().state.status
    }

    /// Read access to the counters, e.g. for a health snapshot.
    pub fn with_state<R>(&self, f: impl FnOnce(&ClientState) -> R) -> R {
        f(&self.shared.lock().state)
    }
}

impl Drop for StreamClient {
    fn drop(&mut self) {
        if let Some(task) = self.shared.lock().task.take() {
            task.abort();
        }
    }
}

/// An episode future that owns the transport slot while it lives.
///
/// Fields drop in order, so an aborted episode releases its transport before
/// the slot opens up for the next one.
struct Leased {
    episode: BoxFuture<'static, ()>,
    _permit: OwnedSemaphorePermit,
}

impl Future for Leased {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        self.episode.poll_unpin(cx)
    }
}

/// One connection episode: open, pump, back off, repeat until success is
/// lost for good or the task is aborted.
struct Episode {
    generation: u64,
    shared: Arc<Mutex<Shared>>,
    config: Arc<StreamConfig>,
    credentials: Arc<dyn CredentialSource>,
    transport: Arc<dyn Transport>,
    event_sender: EventSender,
    on_event: EventHandler,
    on_error: Option<ErrorHandler>,
}

impl Episode {
    async fn run(self, mut token: String) {
        let mut policy = ReconnectPolicy::new(self.config.reconnect_delay, self.config.max_reconnects)
            .with_jitter(self.config.reconnect_jitter);

        loop {
            let failure = self.connect_and_pump(&token, &mut policy).await;

            if !failure.is_retryable() {
                error!("Notification stream failed: {}", failure);
                self.report(&failure);
                self.finish();
                return;
            }

            warn!("Notification stream error: {}", failure);
            self.report(&failure);

            let Some((attempt, delay)) = policy.next_delay() else {
                let attempts = policy.max_attempts();
                error!("Maximum reconnection attempts ({}) reached", attempts);
                if !self.is_current() {
                    return;
                }
                emit(&self.event_sender, ClientEvent::Failed { attempts });
                self.report(&StreamError::MaxReconnectsExceeded { attempts });
                self.finish();
                return;
            };

            if !self.update(|state| state.mark_reconnecting(attempt, delay)) {
                return;
            }
            RECONNECT_COUNTER.increment(1);
            warn!(
                "Reconnecting in {}ms (attempt {}/{})",
                delay.as_millis(),
                attempt,
                policy.max_attempts()
            );
            emit(
                &self.event_sender,
                ClientEvent::Reconnecting { attempt, delay },
            );

            time::sleep(delay).await;

            token = match self.credentials.bearer_token() {
                Some(token) => token,
                None => {
                    warn!("Access token disappeared during reconnect");
                    self.report(&StreamError::AuthUnavailable);
                    self.finish();
                    return;
                }
            };
        }
    }

    /// Always ends in an error: a stream that simply ends is an unexpected
    /// close.
    async fn connect_and_pump(&self, token: &str, policy: &mut ReconnectPolicy) -> StreamError {
        if self.update(ClientState::mark_connecting) {
            emit(
                &self.event_sender,
                ClientEvent::Connecting {
                    url: self.config.stream_url.to_string(),
                },
            );
        }

        let opened = time::timeout(
            self.config.connect_timeout,
            self.transport.open(&self.config.stream_url, token),
        )
        .await;

        let stream = match opened {
            Err(_) => return StreamError::Timeout,
            Ok(Err(e)) => return e,
            Ok(Ok(stream)) => stream,
        };

        let mut connection_id = None;
        self.update(|state| connection_id = Some(state.mark_connected()));
        let Some(connection_id) = connection_id else {
            // superseded while opening
            return StreamError::ConnectionClosed;
        };
        policy.reset();
        CONNECTED_GAUGE.set(1.0);
        info!(
            "Notification stream connected to {} ({})",
            self.config.stream_url, connection_id
        );
        emit(&self.event_sender, ClientEvent::Connected { connection_id });

        let failure = self.pump(stream).await;
        CONNECTED_GAUGE.set(0.0);
        failure
    }

    async fn pump(&self, mut stream: ByteStream) -> StreamError {
        let mut decoder = LineDecoder::new();

        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(bytes) => {
                    for line in decoder.push(&bytes) {
                        self.handle_line(&line);
                    }
                    self.drop_oversized(decoder.take_oversized());
                }
                Err(e) => {
                    error!("Notification stream read error: {}", e);
                    return e;
                }
            }
        }

        if let Some(line) = decoder.finish() {
            self.handle_line(&line);
        }
        info!("Notification stream ended");
        StreamError::ConnectionClosed
    }

    fn handle_line(&self, line: &str) {
        match process_data_line(line, self.on_event.as_ref()) {
            FrameOutcome::Delivered => {
                self.update(ClientState::record_message);
            }
            FrameOutcome::Malformed => {
                self.update(ClientState::record_malformed);
            }
            FrameOutcome::Control | FrameOutcome::Ignored => {}
        }
    }

    fn drop_oversized(&self, count: usize) {
        if count == 0 {
            return;
        }
        warn!("Dropped {} oversized stream line(s)", count);
        MALFORMED_FRAMES_COUNTER.increment(count as u64);
        for _ in 0..count {
            self.update(ClientState::record_malformed);
        }
    }

    /// Superseded episodes stay silent.
    fn report(&self, error: &StreamError) {
        if !self.is_current() {
            return;
        }
        if let Some(on_error) = &self.on_error {
            on_error(error);
        }
    }

    fn finish(&self) {
        if self.update(ClientState::disconnect) {
            emit(&self.event_sender, ClientEvent::Disconnected);
        }
    }

    fn is_current(&self) -> bool {
        self.shared.lock().generation == self.generation
    }

    /// Applies `f` only while this episode is still the current one.
    fn update(&self, f: impl FnOnce(&mut ClientState)) -> bool {
        let mut shared = self.shared.lock();
        if shared.generation != self.generation {
            return false;
        }
        f(&mut shared.state);
        true
    }
}
