/// file: src/events.rs
/// description: lifecycle events that decouple the stream client from presentation
use crate::types::Toast;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    Connecting { url: String },
    Connected { connection_id: String },
    Reconnecting { attempt: u32, delay: Duration },
    ConnectionFailed(String),
    Failed { attempts: u32 },
    Disconnected,
    Toast(Toast),
}

// Bounded so a stalled printer cannot grow memory without limit
const EVENT_CHANNEL_CAPACITY: usize = 1_024;

pub type EventSender = mpsc::Sender<ClientEvent>;
pub type EventReceiver = mpsc::Receiver<ClientEvent>;

pub fn create_event_channel() -> (EventSender, EventReceiver) {
    mpsc::channel(EVENT_CHANNEL_CAPACITY)
}

/// Fire-and-forget send; lifecycle events are dropped rather than awaited.
pub fn emit(sender: &EventSender, event: ClientEvent) {
    if let Err(e) = sender.try_send(event) {
        warn!("Dropping client event: {}", e);
    }
}
