use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "clubs-notify",
    about = "real-time club notifications: server stream listener and membership actions",
    version
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Backend base URL; the stream lives under /clubs/notifications/stream
    #[arg(short, long, env = "CLUBS_API_BASE_URL", default_value = "http://localhost:8000")]
    pub base_url: String,

    /// Bearer access token (falls back to the variable named by --token-env)
    #[arg(long)]
    pub token: Option<String>,

    /// Environment variable read for the access token on every connect
    #[arg(long, default_value = "CLUBS_ACCESS_TOKEN")]
    pub token_env: String,

    /// Id of the logged-in user, used to filter personal notifications
    #[arg(long, env = "CLUBS_USER_ID")]
    pub user_id: Option<i64>,

    /// Display name of the logged-in user, used for local join events
    #[arg(long, env = "CLUBS_USER_NAME")]
    pub user_name: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Output logs in JSON format
    #[arg(long)]
    pub json_logs: bool,

    /// Enable metrics server
    #[arg(long)]
    pub metrics: bool,

    /// Metrics server port
    #[arg(long, default_value = "9090")]
    pub metrics_port: u16,

    /// Timeout for opening the stream, in seconds
    #[arg(long, default_value = "10")]
    pub timeout: u64,

    /// Base reconnection delay in milliseconds, doubled on every attempt
    #[arg(long, default_value = "1000")]
    pub reconnect_delay_ms: u64,

    /// Maximum reconnection attempts per backoff episode
    #[arg(long, default_value = "5")]
    pub max_reconnects: u32,

    /// Random spread applied to each reconnection delay (0.0 - 1.0)
    #[arg(long, default_value = "0.0")]
    pub reconnect_jitter: f64,

    /// Output format: text, json, minimal
    #[arg(long, default_value = "text")]
    pub format: String,

    /// Disable colored output (useful for piping to files)
    #[arg(long)]
    pub no_color: bool,

    /// Quiet mode - only toasts and errors
    #[arg(long)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Listen to the notification stream until Ctrl+C (default)
    Listen,
    /// Join a club
    Join { club_id: i64 },
    /// Leave a club, or remove another member as admin
    Leave {
        club_id: i64,
        #[arg(long)]
        user_id: Option<i64>,
    },
    /// Accept a pending join request
    Accept { club_id: i64, request_id: i64 },
}
