//! Output formatting for CLI.

mod json;
mod text;

pub use json::JsonFormatter;
pub use text::TextFormatter;

use anyhow::Result;
use wayfarer_core::models::response::Response;

use crate::{Cli, OutputFormat};

/// Renders a response to stdout according to the CLI flags.
pub fn render(response: &Response, cli: &Cli) -> Result<()> {
    match cli.format {
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format_response(response)?);
        }
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color, cli.verbose && !cli.quiet);
            let rendered = if cli.quiet {
                formatter.format_body(response)
            } else {
                formatter.format_response(response)
            };
            println!("{rendered}");
        }
    }
    Ok(())
}
