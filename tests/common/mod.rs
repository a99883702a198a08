//! Shared fixtures: a scripted transport and collectors for client output.
#![allow(dead_code)]

use async_trait::async_trait;
use clubs_notify::{
    auth::{CredentialSource, SessionToken},
    client::{ErrorHandler, EventHandler, StreamClient},
    config::StreamConfig,
    error::StreamError,
    events::{ClientEvent, EventReceiver, create_event_channel},
    transport::{ByteStream, Transport},
    types::StreamEvent,
};
use futures::{
    Stream, StreamExt,
    channel::mpsc::{UnboundedReceiver, UnboundedSender, unbounded},
    stream,
};
use parking_lot::Mutex;
use std::{
    collections::VecDeque,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
    time::Duration,
};
use tokio::sync::mpsc;
use url::Url;

pub type Chunk = Result<Vec<u8>, StreamError>;

/// What the next `open` call does.
pub enum Step {
    Fail(StreamError),
    /// Never resolves; only a timeout gets past it.
    Stall,
    /// Opens, yields the frames, then the body ends.
    Frames(Vec<String>),
    /// Opens and yields whatever the test pushes until the sender drops.
    Live(UnboundedReceiver<Chunk>),
}

pub fn live() -> (UnboundedSender<Chunk>, Step) {
    let (tx, rx) = unbounded();
    (tx, Step::Live(rx))
}

pub fn frame(json: &str) -> Chunk {
    Ok(format!("data: {json}\n\n").into_bytes())
}

/// Records `open#n` / `close#n` so tests can check transport overlap.
pub struct ScriptedTransport {
    steps: Mutex<VecDeque<Step>>,
    pub log: Arc<Mutex<Vec<String>>>,
    opens: Mutex<usize>,
    pub tokens: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            log: Arc::new(Mutex::new(Vec::new())),
            opens: Mutex::new(0),
            tokens: Mutex::new(Vec::new()),
        })
    }

    pub fn opens(&self) -> usize {
        *self.opens.lock()
    }

    pub fn log(&self) -> Vec<String> {
        self.log.lock().clone()
    }
}

struct Tracked {
    inner: ByteStream,
    id: usize,
    log: Arc<Mutex<Vec<String>>>,
}

impl Stream for Tracked {
    type Item = Chunk;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Chunk>> {
        self.inner.poll_next_unpin(cx)
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.log.lock().push(format!("close#{}", self.id));
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn open(&self, _url: &Url, token: &str) -> Result<ByteStream, StreamError> {
        let id = {
            let mut opens = self.opens.lock();
            *opens += 1;
            *opens
        };
        self.tokens.lock().push(token.to_string());

        let step = self.steps.lock().pop_front();
        let inner: ByteStream = match step {
            None => return Err(StreamError::Transport("script exhausted".into())),
            Some(Step::Fail(e)) => return Err(e),
            Some(Step::Stall) => {
                futures::future::pending::<()>().await;
                unreachable!()
            }
            Some(Step::Frames(frames)) => {
                stream::iter(frames.into_iter().map(|f| Ok(f.into_bytes()))).boxed()
            }
            Some(Step::Live(rx)) => rx.boxed(),
        };

        self.log.lock().push(format!("open#{id}"));
        Ok(Tracked {
            inner,
            id,
            log: self.log.clone(),
        }
        .boxed())
    }
}

pub struct Harness {
    pub client: Arc<StreamClient>,
    pub transport: Arc<ScriptedTransport>,
    pub session: SessionToken,
    pub events: EventReceiver,
}

pub fn harness(steps: Vec<Step>) -> Harness {
    harness_with_token(steps, Some("test-token"))
}

pub fn harness_with_token(steps: Vec<Step>, token: Option<&str>) -> Harness {
    let transport = ScriptedTransport::new(steps);
    let session = SessionToken::new(token.map(str::to_string));
    let credentials: Arc<dyn CredentialSource> = Arc::new(session.clone());
    let (sender, events) = create_event_channel();
    let config = StreamConfig::new("http://clubs.test").expect("valid base url");

    let client = Arc::new(StreamClient::new(
        Arc::new(config),
        credentials,
        transport.clone(),
        sender,
    ));
    Harness {
        client,
        transport,
        session,
        events,
    }
}

/// Handler that forwards every delivered event to a channel.
pub fn event_sink() -> (EventHandler, mpsc::UnboundedReceiver<StreamEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let handler: EventHandler = Arc::new(move |event: StreamEvent| {
        let _ = tx.send(event);
    });
    (handler, rx)
}

pub fn error_sink() -> (ErrorHandler, Arc<Mutex<Vec<StreamError>>>) {
    let errors = Arc::new(Mutex::new(Vec::new()));
    let sink = errors.clone();
    let handler: ErrorHandler = Arc::new(move |e: &StreamError| sink.lock().push(e.clone()));
    (handler, errors)
}

/// Bounded wait; with a paused clock a missing event fails fast instead of
/// hanging.
pub async fn next_event(events: &mut EventReceiver) -> ClientEvent {
    tokio::time::timeout(Duration::from_secs(600), events.recv())
        .await
        .expect("timed out waiting for a client event")
        .expect("event channel closed")
}

pub async fn wait_for(events: &mut EventReceiver, wanted: impl Fn(&ClientEvent) -> bool) -> Vec<ClientEvent> {
    let mut seen = Vec::new();
    loop {
        let event = next_event(events).await;
        let done = wanted(&event);
        seen.push(event);
        if done {
            return seen;
        }
    }
}

pub async fn next_stream_event(rx: &mut mpsc::UnboundedReceiver<StreamEvent>) -> StreamEvent {
    tokio::time::timeout(Duration::from_secs(600), rx.recv())
        .await
        .expect("timed out waiting for a stream event")
        .expect("handler dropped")
}

pub fn reconnect_schedule(events: &[ClientEvent]) -> Vec<(u32, Duration)> {
    events
        .iter()
        .filter_map(|e| match e {
            ClientEvent::Reconnecting { attempt, delay } => Some((*attempt, *delay)),
            _ => None,
        })
        .collect()
}
