/// file: src/ui.rs
/// description: terminal presentation layer fed by client events
use crate::{
    events::{ClientEvent, EventReceiver},
    formatter::{Colors, OutputFormat, ToastFormatter},
};
use std::time::Duration;
use tracing::debug;

pub struct UIController {
    event_receiver: EventReceiver,
    toast_formatter: ToastFormatter,
    colored: bool,
    quiet_mode: bool,
}

pub struct UIOptions {
    pub colored: bool,
    pub quiet: bool,
}

impl UIController {
    pub fn new(event_receiver: EventReceiver, format: OutputFormat, options: UIOptions) -> Self {
        Self {
            event_receiver,
            toast_formatter: ToastFormatter::new(format, options.colored),
            colored: options.colored,
            quiet_mode: options.quiet,
        }
    }

    /// Runs until every sender is gone.
    pub async fn run(&mut self) {
        while let Some(event) = self.event_receiver.recv().await {
            self.handle_event(event);
        }
        debug!(
            "UI loop finished after {} toasts",
            self.toast_formatter.toast_count()
        );
    }

    fn handle_event(&mut self, event: ClientEvent) {
        match event {
            ClientEvent::Connecting { url } => {
                self.print_connection_status("CONNECTING", &url);
            }
            ClientEvent::Connected { connection_id } => {
                self.print_connection_status("CONNECTED", &format!("ID: {}", connection_id));
            }
            ClientEvent::Reconnecting { attempt, delay } => {
                self.print_reconnect_info(delay, attempt);
            }
            ClientEvent::ConnectionFailed(error) => {
                self.print_error("STREAM ERROR", &error);
            }
            ClientEvent::Failed { attempts } => {
                self.print_error(
                    "CONNECTION FAILED",
                    &format!("Gave up after {} reconnection attempts", attempts),
                );
            }
            ClientEvent::Disconnected => {
                self.print_connection_status("DISCONNECTED", "Notification stream closed");
            }
            ClientEvent::Toast(toast) => {
                self.toast_formatter.print_toast(&toast);
            }
        }
    }

    fn paint<'a>(&self, code: &'a str) -> &'a str {
        if self.colored { code } else { "" }
    }

    fn print_connection_status(&self, status: &str, message: &str) {
        if self.quiet_mode {
            return;
        }

        let (color, symbol) = match status {
            "CONNECTING" => (Colors::BRIGHT_YELLOW, "*"),
            "CONNECTED" => (Colors::BRIGHT_GREEN, "+"),
            "DISCONNECTED" => (Colors::BRIGHT_RED, "X"),
            _ => (Colors::WHITE, "-"),
        };

        println!(
            "{}{}[{}]{} {} {}{}{}",
            self.paint(Colors::BOLD),
            self.paint(color),
            status,
            self.paint(Colors::RESET),
            symbol,
            self.paint(Colors::WHITE),
            message,
            self.paint(Colors::RESET)
        );
    }

    fn print_error(&self, error_type: &str, message: &str) {
        println!(
            "{}{}[{}]{} ! {}{}{}",
            self.paint(Colors::BOLD),
            self.paint(Colors::BRIGHT_RED),
            error_type,
            self.paint(Colors::RESET),
            self.paint(Colors::RED),
            message,
            self.paint(Colors::RESET)
        );
    }

    fn print_reconnect_info(&self, delay: Duration, attempt: u32) {
        if self.quiet_mode {
            return;
        }

        println!(
            "{}{}[RECONNECTING]{} > Attempt {} in {}ms...",
            self.paint(Colors::BOLD),
            self.paint(Colors::BRIGHT_MAGENTA),
            self.paint(Colors::RESET),
            attempt,
            delay.as_millis()
        );
    }
}
