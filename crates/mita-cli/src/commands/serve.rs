//! Server command implementation

use anyhow::{Context, Result};

use mita_core::{BudgetDataSource, RecommendationEngine};
use mita_server::ServerConfig;

pub async fn cmd_serve(engine: RecommendationEngine, host: &str, port: u16) -> Result<()> {
    let config = ServerConfig::from_env();

    println!("🚀 Starting MITA budget server...");
    println!("   Listening: http://{}:{}", host, port);
    match engine.source() {
        Some(source) => println!("   Data collaborator: {}", source.host()),
        None => println!("   Data collaborator: none (defaults only)"),
    }
    if config.allowed_origins.is_empty() {
        println!("   CORS: same-origin only (set MITA_ALLOWED_ORIGINS to allow others)");
    } else {
        println!("   CORS: {}", config.allowed_origins.join(", "));
    }
    if host != "127.0.0.1" && host != "localhost" {
        println!();
        println!("   ⚠️  No authentication - keep this behind the API layer");
    }
    println!();

    mita_server::serve_with_config(engine, host, port, config)
        .await
        .context("Server failed")
}
