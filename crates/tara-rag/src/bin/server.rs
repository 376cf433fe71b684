//! TARA server binary
//!
//! Run with: cargo run -p tara-rag --bin tara-server

use tara_rag::{config::TaraConfig, server::TaraServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tara_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║                           TARA                            ║
║        Teaching Assistant for Course Materials            ║
╚═══════════════════════════════════════════════════════════╝
"#
    );

    let config = TaraConfig::load()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Embeddings: {:?} ({} dimensions)", config.embeddings.provider, config.embeddings.dimensions);
    tracing::info!("  - LLM model: {}", config.llm.generate_model);
    tracing::info!("  - Analysis model: {}", config.analysis.model);
    tracing::info!(
        "  - Chunk size: {} (overlap {})",
        config.chunking.chunk_size,
        config.chunking.chunk_overlap
    );

    // Check Ollama
    tracing::info!("Checking Ollama at {}...", config.llm.base_url);
    let client = reqwest::Client::new();
    match client.get(format!("{}/api/tags", config.llm.base_url)).send().await {
        Ok(resp) if resp.status().is_success() => {
            tracing::info!("Ollama is running");
        }
        _ => {
            tracing::warn!("Ollama not available at {}", config.llm.base_url);
            tracing::warn!("Please start Ollama:");
            tracing::warn!("  1. Start: ollama serve");
            tracing::warn!(
                "  2. Pull models: ollama pull {} && ollama pull {}",
                config.llm.embed_model,
                config.llm.generate_model
            );
        }
    }

    let server = TaraServer::new(config)?;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  API Info: http://{}/api/info", server.address());
    println!("\nEndpoints:");
    println!("  POST /api/sessions                 - Start a session");
    println!("  POST /api/sessions/:id/documents   - Upload materials");
    println!("  POST /api/sessions/:id/ask         - Ask questions");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
