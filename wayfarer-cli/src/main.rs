// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! Wayfarer CLI - a hypermedia-aware client for HTTP APIs.
//!
//! # Examples
//!
//! ```bash
//! # GET against a configured API, default profile
//! wayfarer get myapi/users
//!
//! # GET a full URL, no configuration needed
//! wayfarer get https://api.example.com/users
//!
//! # Select a profile, add a header and a query parameter
//! wayfarer get myapi/users -p staging -H "X-Trace: on" -q "limit=10"
//!
//! # POST a JSON body
//! wayfarer post myapi/users '{"name": "alice"}'
//!
//! # Force a fresh fetch past the response cache
//! wayfarer get myapi/users --no-cache
//!
//! # Manage configured APIs
//! wayfarer api list
//! wayfarer api set myapi https://api.example.com
//!
//! # Drop all cached responses
//! wayfarer cache clear
//! ```

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{api, cache, request};

// ============================================================================
// CLI Definition
// ============================================================================

/// Wayfarer CLI - hypermedia-aware HTTP API client.
#[derive(Parser)]
#[command(name = "wayfarer")]
#[command(about = "A hypermedia-aware client for HTTP APIs")]
#[command(long_about = r#"
Wayfarer talks to HTTP APIs the way a browser follows links: responses are
decoded, hypermedia links are extracted from headers and bodies, and
paginated collections are merged transparently.

Targets are either full URLs or "<api>/<path>" shorthands against an API
configured with `wayfarer api set`.

Examples:
  wayfarer get myapi/users                 # Configured API
  wayfarer get https://api.example.com/u   # Full URL
  wayfarer post myapi/users '{"a": 1}'     # JSON body
  wayfarer get myapi/users --no-cache      # Skip the response cache
  wayfarer api list                        # Configured APIs
"#)]
#[command(version)]
#[command(author = "Wayfarer Contributors")]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Profile to use for the selected API.
    #[arg(long, short, global = true)]
    pub profile: Option<String>,

    /// Extra header ("Name: value"); repeatable.
    #[arg(long = "header", short = 'H', global = true)]
    pub headers: Vec<String>,

    /// Extra query parameter ("name=value"); repeatable.
    #[arg(long = "query", short = 'q', global = true)]
    pub query: Vec<String>,

    /// Bypass the response cache and invalidate any stored entry.
    #[arg(long, global = true)]
    pub no_cache: bool,

    /// Retries after the first attempt for idempotent requests.
    #[arg(long, default_value_t = 2, global = true)]
    pub retries: u32,

    /// Per-attempt timeout in seconds (0 = wait indefinitely).
    #[arg(long, default_value_t = 0, global = true)]
    pub timeout: u64,

    /// Skip server certificate verification.
    #[arg(long, global = true)]
    pub insecure: bool,

    /// Path to a PEM client certificate.
    #[arg(long, global = true)]
    pub cert: Option<PathBuf>,

    /// Path to the PEM private key for --cert.
    #[arg(long, global = true)]
    pub key: Option<PathBuf>,

    /// Path to a PEM CA certificate to trust.
    #[arg(long, global = true)]
    pub ca_cert: Option<PathBuf>,

    /// Do not follow next links / merge pages.
    #[arg(long, global = true)]
    pub no_paginate: bool,

    /// Exit non-zero on HTTP 4xx/5xx responses.
    #[arg(long, global = true)]
    pub fail: bool,

    /// Verbose output (show request/response detail and debug logs).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (body only, no logs).
    #[arg(long, global = true)]
    pub quiet: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Perform a GET request (paginated collections are merged).
    Get(request::RequestArgs),

    /// Perform a HEAD request.
    Head(request::RequestArgs),

    /// Perform a POST request.
    Post(request::RequestArgs),

    /// Perform a PUT request.
    Put(request::RequestArgs),

    /// Perform a PATCH request.
    Patch(request::RequestArgs),

    /// Perform a DELETE request.
    Delete(request::RequestArgs),

    /// Manage configured APIs.
    Api(api::ApiArgs),

    /// Manage the response cache.
    Cache(cache::CacheArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[repr(i32)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// General error.
    Error = 1,
    /// HTTP error status with --fail.
    HttpStatus = 2,
    /// Unknown API or profile.
    ConfigMissing = 3,
    /// Timeout.
    Timeout = 4,
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return; // No logging in quiet mode
    }

    let filter = if verbose {
        EnvFilter::new("wayfarer=debug,info")
    } else {
        EnvFilter::new("wayfarer=warn")
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Commands::Get(args) => request::run(reqwest::Method::GET, args, &cli).await,
        Commands::Head(args) => request::run(reqwest::Method::HEAD, args, &cli).await,
        Commands::Post(args) => request::run(reqwest::Method::POST, args, &cli).await,
        Commands::Put(args) => request::run(reqwest::Method::PUT, args, &cli).await,
        Commands::Patch(args) => request::run(reqwest::Method::PATCH, args, &cli).await,
        Commands::Delete(args) => request::run(reqwest::Method::DELETE, args, &cli).await,
        Commands::Api(args) => api::run(args, &cli).await,
        Commands::Cache(args) => cache::run(args, &cli).await,
    };

    std::process::exit(match result {
        Ok(code) => code as i32,
        Err(e) => {
            if !cli.quiet {
                eprintln!("Error: {e:#}");
            }
            ExitCode::Error as i32
        }
    });
}
