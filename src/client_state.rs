/// file: src/client_state.rs
/// description: connection state machine and per-client counters
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting { attempt: u32, delay: Duration },
}

#[derive(Debug)]
pub struct ClientState {
    pub status: ConnectionState,
    pub connection_id: Option<String>,
    /// Attempts spent in the current backoff episode.
    pub reconnect_count: u32,
    pub total_reconnects: u64,
    pub total_messages_received: u64,
    pub malformed_frames: u64,
    pub connected_since: Option<Instant>,
    pub last_message_time: Option<Instant>,
    pub last_disconnection_time: Option<Instant>,
}

impl Default for ClientState {
    fn default() -> Self {
        Self {
            status: ConnectionState::Disconnected,
            connection_id: None,
            reconnect_count: 0,
            total_reconnects: 0,
            total_messages_received: 0,
            malformed_frames: 0,
            connected_since: None,
            last_message_time: None,
            last_disconnection_time: None,
        }
    }
}

impl ClientState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.status == ConnectionState::Connected
    }

    pub fn mark_connecting(&mut self) {
        self.status = ConnectionState::Connecting;
    }

    /// Returns the fresh connection id.
    pub fn mark_connected(&mut self) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        self.status = ConnectionState::Connected;
        self.connection_id = Some(id.clone());
        self.reconnect_count = 0;
        self.connected_since = Some(Instant::now());
        id
    }

    pub fn mark_reconnecting(&mut self, attempt: u32, delay: Duration) {
        if self.status == ConnectionState::Connected {
            self.last_disconnection_time = Some(Instant::now());
        }
        self.status = ConnectionState::Reconnecting { attempt, delay };
        self.reconnect_count = attempt;
        self.total_reconnects += 1;
        self.connection_id = None;
        self.connected_since = None;
    }

    pub fn record_message(&mut self) {
        self.last_message_time = Some(Instant::now());
        self.total_messages_received += 1;
    }

    pub fn record_malformed(&mut self) {
        self.malformed_frames += 1;
    }

    pub fn disconnect(&mut self) {
        if self.status == ConnectionState::Connected {
            self.last_disconnection_time = Some(Instant::now());
        }
        self.status = ConnectionState::Disconnected;
        self.connection_id = None;
        self.connected_since = None;
        self.reconnect_count = 0;
    }
}
