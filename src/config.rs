/// file: src/config.rs
/// description: typed runtime configuration built from command-line arguments
use crate::cli::Args;
use anyhow::Result;
use std::time::Duration;
use url::Url;

pub const STREAM_PATH: &str = "/clubs/notifications/stream";

#[derive(Debug, Clone)]
pub struct Config {
    pub stream: StreamConfig,
    pub session: SessionConfig,
    pub metrics: MetricsConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone)]
pub struct StreamConfig {
    pub base_url: Url,
    pub stream_url: Url,
    pub connect_timeout: Duration,
    pub reconnect_delay: Duration,
    pub max_reconnects: u32,
    pub reconnect_jitter: f64,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub token: Option<String>,
    pub token_env: String,
    pub user_id: Option<i64>,
    pub user_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub format: String,
    pub colored: bool,
    pub quiet: bool,
}

impl StreamConfig {
    /// Defaults: 10s open timeout, 1s backoff base, 5 attempts, no jitter.
    pub fn new(base_url: &str) -> Result<Self, url::ParseError> {
        let base_url = Url::parse(base_url)?;
        let stream_url = stream_url(&base_url)?;
        Ok(Self {
            base_url,
            stream_url,
            connect_timeout: Duration::from_secs(10),
            reconnect_delay: Duration::from_secs(1),
            max_reconnects: 5,
            reconnect_jitter: 0.0,
        })
    }
}

/// Appends the stream path to the base, keeping any path prefix on it.
pub fn stream_url(base_url: &Url) -> Result<Url, url::ParseError> {
    let base = base_url.as_str().trim_end_matches('/');
    Url::parse(&format!("{base}{STREAM_PATH}"))
}

impl Config {
    pub fn from_args(args: &Args) -> Result<Self> {
        let mut stream = StreamConfig::new(&args.base_url)?;
        stream.connect_timeout = Duration::from_secs(args.timeout);
        stream.reconnect_delay = Duration::from_millis(args.reconnect_delay_ms);
        stream.max_reconnects = args.max_reconnects;
        stream.reconnect_jitter = args.reconnect_jitter;

        Ok(Config {
            stream,
            session: SessionConfig {
                token: args.token.clone(),
                token_env: args.token_env.clone(),
                user_id: args.user_id,
                user_name: args.user_name.clone(),
            },
            metrics: MetricsConfig {
                enabled: args.metrics,
                port: args.metrics_port,
            },
            output: OutputConfig {
                format: args.format.clone(),
                colored: !args.no_color,
                quiet: args.quiet,
            },
        })
    }
}
