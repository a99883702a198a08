//! Real-time club notifications.
//!
//! Two independent pipelines feed one toast surface: the [`bus`] delivers
//! same-session events synchronously, and the [`client`] keeps an
//! authenticated server-sent-events stream open with bounded reconnects.

/// Membership REST calls.
pub mod api;
/// Bearer credential sources.
pub mod auth;
/// Reconnect backoff schedule.
pub mod backoff;
/// In-process publish/subscribe.
pub mod bus;
/// Command-line argument definitions.
pub mod cli;
/// Notification stream client and its reconnect state machine.
pub mod client;
/// Connection state and counters.
pub mod client_state;
/// Runtime configuration model.
pub mod config;
/// Routing of club events to toasts.
pub mod coordinator;
/// Error types used across the crate.
pub mod error;
/// Lifecycle events between client and UI.
pub mod events;
/// Terminal output formatters.
pub mod formatter;
/// Metrics and health status structures.
pub mod monitoring;
/// Line decoding for event-stream bodies.
pub mod sse;
/// Enable-gated stream subscription.
pub mod subscription;
/// Tracing/logging initialization.
pub mod tracing_setup;
/// Stream transport seam and its HTTP implementation.
pub mod transport;
/// Club event and toast data models.
pub mod types;
/// UI controller and presentation loop.
pub mod ui;

pub use error::{ClubsError, StreamError};
