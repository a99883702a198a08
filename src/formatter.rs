use crate::types::{Severity, Toast};

// ANSI color codes
pub struct Colors;

impl Colors {
    pub const RESET: &'static str = "\x1b[0m";
    pub const BOLD: &'static str = "\x1b[1m";
    pub const DIM: &'static str = "\x1b[2m";

    pub const RED: &'static str = "\x1b[31m";
    pub const WHITE: &'static str = "\x1b[37m";

    // Bright colors
    pub const BRIGHT_RED: &'static str = "\x1b[91m";
    pub const BRIGHT_GREEN: &'static str = "\x1b[92m";
    pub const BRIGHT_YELLOW: &'static str = "\x1b[93m";
    pub const BRIGHT_BLUE: &'static str = "\x1b[94m";
    pub const BRIGHT_MAGENTA: &'static str = "\x1b[95m";
    pub const BRIGHT_CYAN: &'static str = "\x1b[96m";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Minimal,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "minimal" => OutputFormat::Minimal,
            _ => OutputFormat::Text,
        }
    }
}

pub struct ToastFormatter {
    format: OutputFormat,
    colored: bool,
    toast_count: u64,
}

impl ToastFormatter {
    pub fn new(format: OutputFormat, colored: bool) -> Self {
        Self {
            format,
            colored,
            toast_count: 0,
        }
    }

    pub fn toast_count(&self) -> u64 {
        self.toast_count
    }

    pub fn print_toast(&mut self, toast: &Toast) {
        self.toast_count += 1;
        println!("{}", self.format_toast(toast));
    }

    pub fn format_toast(&self, toast: &Toast) -> String {
        match self.format {
            OutputFormat::Json => serde_json::json!({
                "severity": toast.severity,
                "title": toast.title,
                "description": toast.description,
                "duration_ms": toast.duration.map(|d| d.as_millis() as u64),
                "action": toast.action,
            })
            .to_string(),
            OutputFormat::Minimal => match &toast.description {
                Some(description) => format!("{} | {}", toast.title, description),
                None => toast.title.clone(),
            },
            OutputFormat::Text => self.format_text(toast),
        }
    }

    fn format_text(&self, toast: &Toast) -> String {
        let (label, color) = match toast.severity {
            Severity::Success => ("SUCCESS", Colors::BRIGHT_GREEN),
            Severity::Info => ("INFO", Colors::BRIGHT_BLUE),
            Severity::Error => ("ERROR", Colors::BRIGHT_RED),
        };

        let mut line = format!(
            "{}[{}]{} {}",
            self.paint(&format!("{}{}", Colors::BOLD, color)),
            label,
            self.paint(Colors::RESET),
            toast.title
        );
        if let Some(description) = &toast.description {
            line.push_str(&format!(
                " {}- {}{}",
                self.paint(Colors::DIM),
                description,
                self.paint(Colors::RESET)
            ));
        }
        if let Some(action) = &toast.action {
            line.push_str(&format!(
                " {}[{} -> {}]{}",
                self.paint(Colors::BRIGHT_CYAN),
                action.label,
                action.target,
                self.paint(Colors::RESET)
            ));
        }
        line
    }

    fn paint<'a>(&self, code: &'a str) -> &'a str {
        if self.colored { code } else { "" }
    }
}
