// src/main.rs

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use scommand_builder::config::BuilderConfig;
use scommand_builder::{NodeToolInstaller, SCommandBuilder};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ==============================================================================
    // 1. Configuration & Environment
    // ==============================================================================

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = BuilderConfig::load()?;
    let registry = config.registry()?;

    // ==============================================================================
    // 2. Build-Step Log Collection
    // ==============================================================================

    let (log_tx, mut log_rx) = tokio::sync::mpsc::channel::<String>(100);
    let log_collector = tokio::spawn(async move {
        let mut logs = String::new();
        while let Some(line) = log_rx.recv().await {
            logs.push_str(&line);
        }
        logs
    });

    // ==============================================================================
    // 3. Dependency Injection & Assembly
    // ==============================================================================

    let mut builder = SCommandBuilder::new(config.server_url.clone(), Arc::new(NodeToolInstaller::new()));

    tracing::info!("⚙️ Resolving SCommand for {} on node '{}'", builder.url(), config.node.name);

    let result = builder.scommand_args(&registry, &config, &config.node, &log_tx).await;

    drop(log_tx);
    if let Ok(collected) = log_collector.await {
        eprint!("{}", collected);
    }

    // Only the redacted form is ever printed.
    println!("{}", result?);
    Ok(())
}
