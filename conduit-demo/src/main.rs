use bytes::Bytes;
use conduit::legacy::{LegacyCache, LegacyCacheMulti};
use conduit::metrics::NoopMetrics;
use conduit::ports::{Cache, CacheItem, CacheMulti};
use conduit::{Context, LegacyToModern, ModernToLegacy};
use shared::config::Config;
use std::sync::Arc;
use std::time::Duration;
use storage_engine::{MemoryCache, MokaCache};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load environment variables
    match dotenvy::dotenv() {
        Ok(_) => info!("Loaded environment variables from .env file"),
        Err(_) => info!("No .env file found, using system environment variables"),
    }

    let config = Config::from_env();
    info!("Starting conduit demo with {:?}", config);

    // Modern backend driven from legacy call sites
    let moka: Arc<dyn Cache> = Arc::new(MokaCache::from_config("demo", &config));
    let legacy_view = Arc::new(ModernToLegacy::new(moka, Arc::new(NoopMetrics)));
    exercise_legacy(&legacy_view).await?;

    // Legacy backend driven from modern call sites
    let memory: Arc<dyn LegacyCache> = Arc::new(MemoryCache::new());
    let modern_view = LegacyToModern::with_config(memory, &config);
    exercise_modern(&modern_view).await?;

    legacy_view.close_async();
    if let Err(e) = legacy_view.wait_for_close(config.close_timeout).await {
        warn!("Legacy view did not close: {}", e);
    }
    if let Err(e) = modern_view
        .close(&Context::with_timeout(config.close_timeout))
        .await
    {
        warn!("Modern view did not close: {}", e);
    }

    info!("Conduit demo finished");
    Ok(())
}

async fn exercise_legacy(cache: &ModernToLegacy) -> Result<(), Box<dyn std::error::Error>> {
    cache.set("foo", Bytes::from("bar")).await?;
    info!("legacy get foo -> {:?}", cache.get("foo").await?);

    if let Err(e) = cache.add("foo", Bytes::from("baz")).await {
        info!("legacy add foo -> {}", e);
    }
    if let Err(e) = cache.get("missing").await {
        info!("legacy get missing -> {}", e);
    }

    cache
        .set_multi(vec![
            ("first".to_string(), Bytes::from("bar")),
            ("second".to_string(), Bytes::from("baz")),
        ])
        .await?;
    info!("legacy set_multi stored first and second");
    Ok(())
}

async fn exercise_modern(cache: &LegacyToModern) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::with_timeout(Duration::from_secs(1));

    cache
        .set(&ctx, "foo", Bytes::from("bar"), Some(Duration::from_secs(30)))
        .await?;
    info!("modern get foo -> {:?}", cache.get(&ctx, "foo").await?);

    if let Err(e) = cache.add(&ctx, "foo", Bytes::from("baz"), None).await {
        info!("modern add foo -> {}", e);
    }

    let multi = cache
        .set_multi(
            &ctx,
            vec![CacheItem::new("first", "bar", Some(Duration::from_secs(30)))],
        )
        .await;
    info!("modern set_multi -> {:?}", multi);
    Ok(())
}
