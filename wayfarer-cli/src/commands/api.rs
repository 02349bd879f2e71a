//! Api command - manage configured APIs.

use anyhow::Result;
use clap::{Args, Subcommand};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use wayfarer_core::{ApiConfig, ApiProfile};
use wayfarer_http::ApiClient;
use wayfarer_store::{
    default_apis_path, default_cache_dir, default_config_dir, ApiStore, FreshnessIndex,
    ResponseCache, TokenCache,
};

use crate::{output, Cli, ExitCode, OutputFormat};

/// Minimum freshness applied to description documents the origin serves
/// without cache directives.
const SPEC_MIN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Conventional location of an API's description document.
const SPEC_PATH: &str = "openapi.json";

/// Arguments for the api command.
#[derive(Args)]
pub struct ApiArgs {
    #[command(subcommand)]
    pub action: ApiAction,
}

/// Api subcommands.
#[derive(Subcommand)]
pub enum ApiAction {
    /// List configured APIs.
    List,

    /// Show one API's configuration.
    Show {
        /// API name.
        name: String,
    },

    /// Configure an API (creates an empty default profile).
    Set {
        /// API name.
        name: String,
        /// Base URL.
        base: String,
    },

    /// Remove a configured API.
    Remove {
        /// API name.
        name: String,
    },

    /// Fetch an API's description document (cached aggressively).
    Spec {
        /// API name.
        name: String,
    },

    /// Show configuration paths.
    Path,
}

/// Runs the api command.
pub async fn run(args: &ApiArgs, cli: &Cli) -> Result<ExitCode> {
    match &args.action {
        ApiAction::List => list(cli).await,
        ApiAction::Show { name } => show(name, cli).await,
        ApiAction::Set { name, base } => set(name, base).await,
        ApiAction::Remove { name } => remove(name).await,
        ApiAction::Spec { name } => spec(name, cli).await,
        ApiAction::Path => paths(cli),
    }
}

async fn list(cli: &Cli) -> Result<ExitCode> {
    let store = ApiStore::load_default().await;
    let names = store.names();

    match cli.format {
        OutputFormat::Json => {
            println!("{}", to_json(&names, cli.pretty)?);
        }
        OutputFormat::Text => {
            if names.is_empty() {
                println!("No APIs configured. Add one with: wayfarer api set <name> <base-url>");
            } else {
                for name in names {
                    // names() is sorted, so output is stable
                    if let Ok(config) = store.get(name) {
                        println!("{name:<20} {}", config.base);
                    }
                }
            }
        }
    }
    Ok(ExitCode::Success)
}

async fn show(name: &str, cli: &Cli) -> Result<ExitCode> {
    let store = ApiStore::load_default().await;
    let config = match store.get(name) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return Ok(ExitCode::ConfigMissing);
        }
    };

    match cli.format {
        OutputFormat::Json => println!("{}", to_json(config, cli.pretty)?),
        OutputFormat::Text => {
            println!("{name}");
            println!("  base: {}", config.base);
            let mut profiles: Vec<&String> = config.profiles.keys().collect();
            profiles.sort();
            for profile in profiles {
                println!("  profile: {profile}");
            }
            if config.tls.is_some() {
                println!("  tls: configured");
            }
        }
    }
    Ok(ExitCode::Success)
}

async fn set(name: &str, base: &str) -> Result<ExitCode> {
    // Validate the base before persisting anything
    url::Url::parse(base)?;

    let mut store = ApiStore::load_default().await;
    let existing = store.get(name).ok().cloned();

    let config = match existing {
        Some(mut config) => {
            config.base = base.to_string();
            config
        }
        None => ApiConfig {
            base: base.to_string(),
            profiles: HashMap::from([("default".to_string(), ApiProfile::default())]),
            tls: None,
        },
    };

    store.set(name, config).await?;
    info!(api = name, base, "API configured");
    println!("Configured {name} -> {base}");
    Ok(ExitCode::Success)
}

async fn remove(name: &str) -> Result<ExitCode> {
    let mut store = ApiStore::load_default().await;
    match store.remove(name).await {
        Ok(()) => {
            println!("Removed {name}");
            Ok(ExitCode::Success)
        }
        Err(e) => {
            eprintln!("Error: {e}");
            Ok(ExitCode::ConfigMissing)
        }
    }
}

/// Fetches the description document with the minimum-freshness floor, so a
/// directive-less origin response is still cached for [`SPEC_MIN_TTL`].
async fn spec(name: &str, cli: &Cli) -> Result<ExitCode> {
    let store = ApiStore::load_default().await;
    let config = match store.get(name) {
        Ok(config) => config.clone(),
        Err(e) => {
            eprintln!("Error: {e}");
            return Ok(ExitCode::ConfigMissing);
        }
    };

    let mut freshness = FreshnessIndex::load_default().await;

    let base = url::Url::parse(&config.base)?;
    let mut builder = ApiClient::builder(base)
        .cache(Arc::new(ResponseCache::at_default_location()))
        .no_cache(cli.no_cache)
        .min_ttl(SPEC_MIN_TTL)
        .paginate(false)
        .tokens(
            TokenCache::load_default().await,
            TokenCache::key(name, cli.profile.as_deref()),
        );
    if let Some(profile) = config.profile(cli.profile.as_deref()).cloned() {
        builder = builder.profile(profile);
    }
    let client = builder.build().await;

    // While the index says the document is fresh, the stored copy is
    // served outright and no client fetch happens at all.
    if freshness.is_fresh(name) {
        if let Some(response) = client.cached(reqwest::Method::GET, SPEC_PATH).await? {
            debug!(api = name, "Description document still fresh; serving stored copy");
            output::render(&response, cli)?;
            return Ok(ExitCode::Success);
        }
        debug!(api = name, "Freshness index fresh but no stored document; fetching");
    }

    let response = client.request(reqwest::Method::GET, SPEC_PATH, None).await?;
    if response.is_success() {
        freshness
            .set(name, chrono::Utc::now() + chrono::Duration::from_std(SPEC_MIN_TTL)?)
            .await?;
    }

    output::render(&response, cli)?;
    Ok(ExitCode::Success)
}

fn paths(cli: &Cli) -> Result<ExitCode> {
    match cli.format {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "config_dir": default_config_dir(),
                "apis": default_apis_path(),
                "cache_dir": default_cache_dir(),
            });
            println!("{}", to_json(&value, cli.pretty)?);
        }
        OutputFormat::Text => {
            println!("config dir: {}", default_config_dir().display());
            println!("apis file:  {}", default_apis_path().display());
            println!("cache dir:  {}", default_cache_dir().display());
        }
    }
    Ok(ExitCode::Success)
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String> {
    Ok(if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    })
}
