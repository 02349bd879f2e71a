//! JSON output formatting for scripting.

use anyhow::Result;
use serde_json::json;
use wayfarer_core::models::response::Response;

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats the full response envelope as one JSON document.
    pub fn format_response(&self, response: &Response) -> Result<String> {
        let value = json!({
            "proto": response.proto,
            "status": response.status,
            "headers": response.headers,
            "links": response.links,
            "body": serde_json::Value::from(&response.body),
        });

        Ok(if self.pretty {
            serde_json::to_string_pretty(&value)?
        } else {
            serde_json::to_string(&value)?
        })
    }
}
