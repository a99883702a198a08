use crate::client_state::{ClientState, ConnectionState};
use anyhow::{Result, anyhow};
use metrics::{Counter, Gauge, counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::{net::SocketAddr, sync::LazyLock};
use tracing::{error, info};

// Global metrics
pub static STREAM_EVENTS_COUNTER: LazyLock<Counter> =
    LazyLock::new(|| counter!("clubs_stream_events_total"));
pub static CONTROL_FRAMES_COUNTER: LazyLock<Counter> =
    LazyLock::new(|| counter!("clubs_stream_control_frames_total"));
pub static MALFORMED_FRAMES_COUNTER: LazyLock<Counter> =
    LazyLock::new(|| counter!("clubs_stream_malformed_frames_total"));
pub static RECONNECT_COUNTER: LazyLock<Counter> =
    LazyLock::new(|| counter!("clubs_stream_reconnects_total"));
pub static LOCAL_EVENTS_COUNTER: LazyLock<Counter> =
    LazyLock::new(|| counter!("clubs_local_events_total"));
pub static CONNECTED_GAUGE: LazyLock<Gauge> = LazyLock::new(|| gauge!("clubs_stream_connected"));

pub async fn setup_metrics(port: u16) -> Result<()> {
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();

    let builder = PrometheusBuilder::new()
        .with_http_listener(addr)
        .add_global_label("service", "clubs-notify")
        .add_global_label("version", env!("CARGO_PKG_VERSION"));

    match builder.install() {
        Ok(()) => {
            info!(
                "Prometheus metrics server started on http://{}/metrics",
                addr
            );

            STREAM_EVENTS_COUNTER.absolute(0);
            CONTROL_FRAMES_COUNTER.absolute(0);
            MALFORMED_FRAMES_COUNTER.absolute(0);
            RECONNECT_COUNTER.absolute(0);
            LOCAL_EVENTS_COUNTER.absolute(0);
            CONNECTED_GAUGE.set(0.0);

            Ok(())
        }
        Err(e) => {
            error!("Failed to start metrics server: {}", e);
            Err(anyhow!("metrics server error: {e}"))
        }
    }
}

#[derive(Debug)]
pub struct HealthStatus {
    pub is_healthy: bool,
    pub connection_id: Option<String>,
    pub total_messages: u64,
    pub malformed_frames: u64,
    pub reconnect_count: u64,
    pub uptime: std::time::Duration,
}

impl HealthStatus {
    pub fn from_state(state: &ClientState) -> Self {
        Self {
            is_healthy: state.status == ConnectionState::Connected,
            connection_id: state.connection_id.clone(),
            total_messages: state.total_messages_received,
            malformed_frames: state.malformed_frames,
            reconnect_count: state.total_reconnects,
            uptime: state
                .connected_since
                .map(|since| since.elapsed())
                .unwrap_or_default(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "status": if self.is_healthy { "healthy" } else { "unhealthy" },
            "connection_id": self.connection_id,
            "total_messages": self.total_messages,
            "malformed_frames": self.malformed_frames,
            "reconnect_count": self.reconnect_count,
            "uptime_seconds": self.uptime.as_secs(),
            "timestamp": chrono::Utc::now()
        })
    }
}
