//! counselcache - offline-first caching gateway for the student risk
//! dashboard.
//!
//! The binary stands in for the hosting runtime: it registers the
//! dispatcher (install + activate), then routes requests through it,
//! queues student-record mutations while offline, and replays them on a
//! sync trigger.

mod config;
mod fetch;
mod net;
mod notify;
mod store;
mod sync;

use std::io::{self, Read};
use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::Url;
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use config::Config;
use fetch::{Dispatch, Dispatcher, FetchRequest};
use net::{HttpNetwork, Network};
use store::{CacheStore, DiskStore, MemoryStore};
use sync::{MutationQueue, SyncEngine, SYNC_TAG};

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  counselcache [--navigate] [--ephemeral] <url>...");
    eprintln!("        fetch URLs through the cache dispatcher");
    eprintln!("  counselcache --queue     queue a student-record mutation from stdin JSON");
    eprintln!("  counselcache --sync      replay queued mutations to the sync endpoint");
    eprintln!("  counselcache --push      preview the notification for a push payload on stdin");
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();
    info!("counselcache starting");

    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            warn!(error = %err, "Failed to load config, using defaults");
            Config::default()
        }
    };
    // Persist defaults on first run so they can be edited
    if let Err(err) = config.save() {
        debug!(error = %err, "Could not persist config");
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        print_usage();
        return Ok(());
    }

    match args[0].as_str() {
        "--sync" => run_sync(&config).await,
        "--queue" => queue_mutation(&config),
        "--push" => preview_push(&config),
        _ => run_fetch(&config, &args).await,
    }
}

/// Register the dispatcher and fetch each URL through it. Registration
/// failure is logged but never blocks: requests then bypass the cache
/// and go straight to the network.
async fn run_fetch(config: &Config, args: &[String]) -> Result<()> {
    let mut navigate = false;
    let mut ephemeral = false;
    let mut urls = Vec::new();
    for arg in args {
        match arg.as_str() {
            "--navigate" => navigate = true,
            "--ephemeral" => ephemeral = true,
            _ => urls.push(arg.clone()),
        }
    }

    let store: Arc<dyn CacheStore> = if ephemeral {
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(DiskStore::new(config.cache_dir()?.join("partitions"))?)
    };
    let network = Arc::new(HttpNetwork::new()?);
    let dispatcher = Dispatcher::new(store, network.clone(), config.clone());

    let registered = match dispatcher.register().await {
        Ok(()) => {
            info!(version = %dispatcher.config().version, "Dispatcher ready");
            true
        }
        Err(err) => {
            warn!(error = %err, "Registration failed, requests will bypass the cache");
            false
        }
    };

    for raw in &urls {
        let url: Url = raw.parse().with_context(|| format!("Invalid URL: {raw}"))?;
        let request = if navigate {
            FetchRequest::navigate(url)
        } else {
            FetchRequest::get(url)
        };

        let response = if registered {
            match dispatcher.fetch(&request).await? {
                Dispatch::Handled(response) => response,
                Dispatch::PassThrough => network.fetch(&request).await?,
            }
        } else {
            network.fetch(&request).await?
        };

        let content_type = response.header("content-type").unwrap_or("-");
        println!(
            "{} {} {} ({} bytes)",
            response.status,
            content_type,
            raw,
            response.body.len()
        );
        debug!(preview = %response.body_text().chars().take(120).collect::<String>(), "Body preview");
    }

    Ok(())
}

/// Queue one mutation (JSON object on stdin) for later replay.
fn queue_mutation(config: &Config) -> Result<()> {
    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;
    let body: serde_json::Value =
        serde_json::from_str(&input).context("stdin is not valid JSON")?;

    let queue = MutationQueue::new(config.cache_dir()?.join("sync"))?;
    let mutation = queue.push(body)?;
    println!("Queued mutation {} ({} pending)", mutation.id, queue.len()?);
    Ok(())
}

/// Replay every queued mutation to the configured sync endpoint.
async fn run_sync(config: &Config) -> Result<()> {
    let origin: Url = config
        .origin
        .parse()
        .with_context(|| format!("Invalid origin: {}", config.origin))?;
    let endpoint = origin
        .join(&config.sync_endpoint)
        .context("Invalid sync endpoint")?;

    let queue = MutationQueue::new(config.cache_dir()?.join("sync"))?;
    let network = Arc::new(HttpNetwork::new()?);
    let engine = SyncEngine::new(queue, network, endpoint);

    if engine.queue().is_empty()? {
        println!("Nothing queued");
        return Ok(());
    }

    let delivered = engine.on_sync(SYNC_TAG).await?;
    println!("Delivered {delivered} queued mutation(s)");
    Ok(())
}

/// Show the notification a push payload would produce, including where
/// each action would navigate.
fn preview_push(config: &Config) -> Result<()> {
    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;
    let payload = if input.trim().is_empty() {
        None
    } else {
        Some(input.as_bytes())
    };

    let notification = notify::on_push(payload, &config.notification);
    println!("{}: {}", notification.title, notification.body);
    println!(
        "  tag={} icon={} badge={} require_interaction={}",
        notification.tag, notification.icon, notification.badge, notification.require_interaction
    );
    for action in &notification.actions {
        match notify::on_notification_click(&action.action) {
            Some(notify::ClickAction::OpenWindow(route)) => {
                println!("  [{}] {} ({}) -> {}", action.action, action.title, action.icon, route)
            }
            None => println!("  [{}] {} ({})", action.action, action.title, action.icon),
        }
    }
    Ok(())
}
