//! Request commands - the generic HTTP verbs.

use anyhow::{anyhow, Context, Result};
use clap::Args;
use reqwest::Method;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tracing::debug;
use url::Url;
use wayfarer_core::models::response::Response;
use wayfarer_core::{ApiProfile, TlsConfig};
use wayfarer_http::retry::RetryPolicy;
use wayfarer_http::{ApiClient, HttpError, Overrides};
use wayfarer_store::{ApiStore, ResponseCache, StoreError, TokenCache};

use crate::output;
use crate::{Cli, ExitCode};

/// Arguments for the request commands.
#[derive(Args)]
pub struct RequestArgs {
    /// Full URL or "<api>/<path>" shorthand.
    pub target: String,

    /// Request body; "-" reads from stdin.
    pub body: Option<String>,
}

/// Runs a request command and maps failures to exit codes.
pub async fn run(method: Method, args: &RequestArgs, cli: &Cli) -> Result<ExitCode> {
    match execute(method, args, cli).await {
        Ok(response) => {
            output::render(&response, cli)?;
            Ok(ExitCode::Success)
        }
        Err(e) => {
            if let Some(http) = e.downcast_ref::<HttpError>() {
                match http {
                    HttpError::Status(status) => {
                        if !cli.quiet {
                            eprintln!("Error: request failed with status {status}");
                        }
                        return Ok(ExitCode::HttpStatus);
                    }
                    HttpError::Timeout(d) => {
                        if !cli.quiet {
                            eprintln!("Error: request timed out after {d:?}");
                        }
                        return Ok(ExitCode::Timeout);
                    }
                    _ => {}
                }
            }
            if let Some(StoreError::UnknownApi(_) | StoreError::UnknownProfile { .. }) =
                e.downcast_ref::<StoreError>()
            {
                if !cli.quiet {
                    eprintln!("Error: {e}");
                }
                return Ok(ExitCode::ConfigMissing);
            }
            Err(e)
        }
    }
}

/// Builds the client for the invocation and performs the request.
async fn execute(method: Method, args: &RequestArgs, cli: &Cli) -> Result<Response> {
    let invocation = resolve_invocation(&args.target, cli).await?;
    let body_allowed = method != Method::GET && method != Method::HEAD;
    let body = read_body(args.body.as_deref(), body_allowed).await?;

    let overrides = Overrides {
        headers: parse_headers(&cli.headers)?,
        query: parse_query(&cli.query)?,
    };

    let tokens = TokenCache::load_default().await;
    let cache = Arc::new(ResponseCache::at_default_location());

    let mut builder = ApiClient::builder(invocation.base.clone())
        .overrides(overrides)
        .tls(invocation.tls.clone())
        .cache(cache)
        .no_cache(cli.no_cache)
        .retry(RetryPolicy::new(
            cli.retries,
            (cli.timeout > 0).then(|| Duration::from_secs(cli.timeout)),
        ))
        .paginate(!cli.no_paginate)
        .fail_on_status(cli.fail)
        .tokens(tokens, invocation.token_key.clone());
    if let Some(profile) = invocation.profile.clone() {
        builder = builder.profile(profile);
    }
    let client = builder.build().await;

    debug!(method = %method, target = %invocation.target, "Dispatching");
    let response = if method == Method::GET {
        client.get_parsed(&invocation.target).await?
    } else {
        client.request(method, &invocation.target, body).await?
    };
    Ok(response)
}

// ============================================================================
// Invocation Resolution
// ============================================================================

/// A resolved target: where to send the request and under which identity.
struct Invocation {
    base: Url,
    target: String,
    profile: Option<ApiProfile>,
    tls: TlsConfig,
    token_key: String,
}

/// Resolves a full URL or an `<api>/<path>` shorthand.
async fn resolve_invocation(target: &str, cli: &Cli) -> Result<Invocation> {
    let cli_tls = TlsConfig {
        insecure: cli.insecure,
        cert: cli.cert.clone(),
        key: cli.key.clone(),
        ca_cert: cli.ca_cert.clone(),
        hardware_token: None,
    };

    if target.contains("://") {
        let url = Url::parse(target).with_context(|| format!("invalid URL {target}"))?;
        let host = url.host_str().unwrap_or("unknown").to_string();
        return Ok(Invocation {
            base: url.clone(),
            target: url.to_string(),
            profile: None,
            tls: cli_tls,
            token_key: TokenCache::key(&host, cli.profile.as_deref()),
        });
    }

    let (api, path) = match target.split_once('/') {
        Some((api, path)) => (api, path),
        None => (target, ""),
    };

    let store = ApiStore::load_default().await;
    let config = store.get(api)?.clone();
    let profile = store.profile(api, cli.profile.as_deref())?.cloned();

    let base = profile
        .as_ref()
        .and_then(|p| p.base.clone())
        .unwrap_or_else(|| config.base.clone());
    let base = Url::parse(&base).with_context(|| format!("API {api} has invalid base {base}"))?;

    // TLS precedence, low to high: API, profile, CLI flags.
    let mut tls = config.tls.clone().unwrap_or_default();
    if let Some(profile_tls) = profile.as_ref().and_then(|p| p.tls.clone()) {
        tls = tls.overlay(&profile_tls);
    }
    let tls = tls.overlay(&cli_tls);

    Ok(Invocation {
        base,
        target: path.to_string(),
        profile,
        tls,
        token_key: TokenCache::key(api, cli.profile.as_deref()),
    })
}

// ============================================================================
// Input Parsing
// ============================================================================

/// Reads the body argument; `-` reads stdin to end.
async fn read_body(body: Option<&str>, allowed: bool) -> Result<Option<Vec<u8>>> {
    let Some(body) = body else {
        return Ok(None);
    };
    if !allowed {
        return Err(anyhow!("this method does not take a body"));
    }
    if body == "-" {
        let mut buf = Vec::new();
        tokio::io::stdin()
            .read_to_end(&mut buf)
            .await
            .context("reading body from stdin")?;
        Ok(Some(buf))
    } else {
        Ok(Some(body.as_bytes().to_vec()))
    }
}

/// Parses repeated `-H "Name: value"` flags.
fn parse_headers(raw: &[String]) -> Result<Vec<(String, String)>> {
    raw.iter()
        .map(|h| {
            let (name, value) = h
                .split_once(':')
                .ok_or_else(|| anyhow!("header {h:?} is not in \"Name: value\" form"))?;
            Ok((name.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Parses repeated `-q "name=value"` flags.
fn parse_query(raw: &[String]) -> Result<Vec<(String, String)>> {
    raw.iter()
        .map(|q| {
            let (name, value) = q
                .split_once('=')
                .ok_or_else(|| anyhow!("query {q:?} is not in \"name=value\" form"))?;
            Ok((name.trim().to_string(), value.to_string()))
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
