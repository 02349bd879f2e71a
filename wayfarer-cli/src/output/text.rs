//! Text output formatting with status colors.

use wayfarer_core::body::Body;
use wayfarer_core::models::response::Response;

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
    show_headers: bool,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool, show_headers: bool) -> Self {
        Self {
            use_colors,
            show_headers,
        }
    }

    /// Formats the full response: status line, headers (when enabled),
    /// links, and body.
    pub fn format_response(&self, response: &Response) -> String {
        let mut lines = Vec::new();

        lines.push(self.format_status_line(response));

        if self.show_headers {
            for (name, value) in &response.headers {
                lines.push(self.dim(&format!("{name}: {value}")));
            }
        }

        if !response.links.is_empty() {
            lines.push(String::new());
            for (rel, links) in &response.links {
                for link in links {
                    lines.push(format!("{} {}", self.cyan(&format!("{rel}:")), link.uri));
                }
            }
        }

        let body = self.format_body(response);
        if !body.is_empty() {
            lines.push(String::new());
            lines.push(body);
        }

        lines.join("\n")
    }

    /// Formats the body alone (quiet mode).
    pub fn format_body(&self, response: &Response) -> String {
        match &response.body {
            Body::Null => String::new(),
            Body::Raw(bytes) => String::from_utf8_lossy(bytes).into_owned(),
            body => {
                let value = serde_json::Value::from(body);
                serde_json::to_string_pretty(&value).unwrap_or_default()
            }
        }
    }

    fn format_status_line(&self, response: &Response) -> String {
        let status = format!("{} {}", response.proto, response.status);
        let colored = match response.status {
            200..=299 => self.color(GREEN, &status),
            300..=399 => self.color(CYAN, &status),
            400..=499 => self.color(YELLOW, &status),
            _ => self.color(RED, &status),
        };
        self.bold(&colored)
    }

    fn color(&self, code: &str, text: &str) -> String {
        if self.use_colors {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        self.color(BOLD, text)
    }

    fn dim(&self, text: &str) -> String {
        self.color(DIM, text)
    }

    fn cyan(&self, text: &str) -> String {
        self.color(CYAN, text)
    }
}
