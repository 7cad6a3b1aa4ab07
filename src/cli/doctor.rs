//! CLI `doctor` command — check configuration and backing services.

use anyhow::Result;

use crate::completion;
use crate::config::{default_config_path, RapportConfig};
use crate::kv;

/// Probe the store and classifier and print a health report.
pub async fn doctor(config: &RapportConfig) -> Result<()> {
    let config_path = default_config_path();

    println!("Rapport Health Report");
    println!("=====================");
    println!();
    if config_path.exists() {
        println!("Config:            {}", config_path.display());
    } else {
        println!("Config:            built-in defaults ({} not found)", config_path.display());
    }
    println!("Listen address:    {}:{}", config.server.host, config.server.port);
    println!();

    println!("Store:");
    println!("  Backend:         {}", config.store.backend);
    println!("  Memory cap:      {} per user", config.store.memory_cap);
    println!("  Memory TTL:      {} days", config.store.memory_ttl_days);
    println!("  Mood TTL:        {} days", config.store.mood_ttl_days);
    match kv::create_store(&config.store) {
        Ok(store) => match store.ping().await {
            Ok(()) => println!("  Status:          OK"),
            Err(err) => println!("  Status:          UNREACHABLE ({err})"),
        },
        Err(err) => println!("  Status:          MISCONFIGURED ({err})"),
    }
    println!();

    println!("Classifier:");
    println!("  Provider:        {}", config.classifier.provider);
    if config.classifier.provider == "http" {
        println!("  Endpoint:        {}", config.classifier.endpoint);
        println!("  Model:           {}", config.classifier.model);
        println!("  Timeout:         {}s", config.classifier.timeout_secs);
        println!(
            "  Pacing:          {}ms between calls, {} per minute",
            config.classifier.min_interval_ms, config.classifier.per_minute_cap
        );
    }
    match completion::create_provider(&config.classifier) {
        Ok(None) => println!("  Status:          OK (offline lexicon)"),
        Ok(Some(_)) => println!("  Status:          OK (client ready; endpoint not probed)"),
        Err(err) => println!("  Status:          MISCONFIGURED ({err})"),
    }
    println!();

    println!("Mood:");
    println!("  Decay:           {} hours", config.mood.decay_hours);
    println!(
        "  Trend window:    {} days ({} recent)",
        config.mood.trend_window_days, config.mood.trend_recent_days
    );

    Ok(())
}
