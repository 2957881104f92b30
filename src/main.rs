//! Item Cache demo
//!
//! Runs a cache of feed items with auto-cleanup on the tokio runtime,
//! simulating a fetch loop and logging statistics until shutdown.

use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use item_cache::{Cache, CacheConfig, CacheKey};

/// A fetched content item, keyed by its canonical URL.
#[derive(Debug, Clone)]
struct ContentItem {
    url: String,
    title: String,
}

impl CacheKey for ContentItem {
    fn cache_key(&self) -> String {
        self.url.clone()
    }
}

/// Fills options left unset in the environment with demo values.
fn demo_config() -> CacheConfig {
    let mut config = CacheConfig::from_env();
    config.max_size.get_or_insert(100);
    config.max_age.get_or_insert(Duration::from_secs(30));
    config
        .auto_cleanup_interval
        .get_or_insert(Duration::from_secs(5));
    config
}

/// Entry point for the demo.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the cache; auto-cleanup runs on this runtime
/// 4. Insert and read items every second, logging stats as JSON
/// 5. Dispose the cache on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "item_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = demo_config();
    info!(
        "Configuration loaded: max_size={:?}, max_age={:?}, memory_limit_mb={:?}, cleanup_interval={:?}",
        config.max_size, config.max_age, config.memory_limit_mb, config.auto_cleanup_interval
    );

    let cache: Cache<ContentItem> = Cache::new(config).context("invalid cache configuration")?;
    info!(auto_cleanup = cache.auto_cleanup_active(), "Cache initialized");

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    let mut round: usize = 0;
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let batch = (round * 7..round * 7 + 10).map(|n| ContentItem {
                    url: format!("https://feeds.example.com/item/{}", n),
                    title: format!("Item {}", n),
                });
                cache.set_many(batch);

                // Re-read a few recent and a few long-gone items.
                for n in round.saturating_sub(3) * 7..round * 7 + 3 {
                    if let Some(item) = cache.get(&format!("https://feeds.example.com/item/{}", n)) {
                        tracing::trace!(title = %item.title, "hit");
                    }
                }

                let stats = serde_json::to_string(&cache.stats())?;
                info!("Stats: {}", stats);
                round += 1;
            }
            _ = &mut shutdown => break,
        }
    }

    cache.dispose();
    info!("Shutdown complete, {} entries dropped", cache.size());
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
