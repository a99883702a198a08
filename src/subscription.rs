/// file: src/subscription.rs
/// description: enable-gated lifetime management for the stream client
use crate::{
    client::{ErrorHandler, EventHandler, StreamClient},
    error::StreamError,
    events::{ClientEvent, EventSender, emit},
};
use std::sync::Arc;
use tracing::{error, warn};

/// Connects while enabled, disconnects when disabled or dropped.
///
/// Owns exactly one handler pair for the client; each enable starts a fresh
/// episode with the attempt counter at zero.
pub struct StreamSubscription {
    client: Arc<StreamClient>,
    on_event: EventHandler,
    on_error: ErrorHandler,
    enabled: bool,
}

impl StreamSubscription {
    pub fn new(client: Arc<StreamClient>, on_event: EventHandler, event_sender: EventSender) -> Self {
        let on_error: ErrorHandler = Arc::new(move |e: &StreamError| {
            if e.is_auth() {
                error!("Notification stream authentication failed: {}", e);
            } else {
                warn!("Notification stream error: {}", e);
            }
            emit(&event_sender, ClientEvent::ConnectionFailed(e.to_string()));
        });
        Self {
            client,
            on_event,
            on_error,
            enabled: false,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if enabled == self.enabled {
            return;
        }
        self.enabled = enabled;
        if enabled {
            self.client
                .connect(self.on_event.clone(), Some(self.on_error.clone()));
        } else {
            self.client.disconnect();
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_connected(&self) -> bool {
        self.client.is_connected()
    }

    pub fn client(&self) -> &StreamClient {
        &self.client
    }
}

impl Drop for StreamSubscription {
    fn drop(&mut self) {
        if self.enabled {
            self.client.disconnect();
        }
    }
}
