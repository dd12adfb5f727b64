//! Contig Curator - Collaborative Assembly Curation Backend
//!
//! This is the main entry point. Architecture:
//!
//! ```text
//! ┌──────────┐    ┌──────────┐    ┌──────────┐    ┌──────────┐
//! │  Config  │───▶│  Store   │───▶│ Workflow │───▶│ HTTP API │
//! │  (YAML)  │    │ (PG/mem) │    │ (FSM+CAS)│    │  (axum)  │
//! └──────────┘    └──────────┘    └──────────┘    └──────────┘
//! ```
//!
//! Workflow responsibilities:
//! - Transfer request state machine (reload, re-validate, conditional write)
//! - Project lock protocol
//! - Status-change notification fan-out

use std::sync::Arc;

use contig_curator::config::AppConfig;
use contig_curator::store::{CurationStore, MemoryStore, PgStore};
use contig_curator::transfer::api::{AppState, transfer_router};
use contig_curator::transfer::{LogSink, NotificationHub, TransferWorkflow};

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

/// Get port override from command line (--port argument)
fn get_port_override() -> Option<u16> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

async fn build_store(config: &AppConfig) -> anyhow::Result<Arc<dyn CurationStore>> {
    match &config.postgres_url {
        Some(url) => {
            tracing::info!("Connecting to PostgreSQL");
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(10)
                .connect(url)
                .await?;
            let store = PgStore::new(pool);
            store.setup_schema().await?;
            tracing::info!("PostgreSQL store ready");
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("No postgres_url configured; using in-memory store (volatile)");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let app_config = AppConfig::load(&env);
    let _log_guard = contig_curator::logging::init_logging(&app_config);

    tracing::info!(
        "Starting Contig Curator {} ({}) in {} mode",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env
    );

    let store = build_store(&app_config).await?;

    let mut hub = NotificationHub::new();
    hub.register(Arc::new(LogSink));

    let workflow = TransferWorkflow::new(store, hub);
    let state = Arc::new(AppState { workflow });
    let app = transfer_router(state);

    let port = get_port_override().unwrap_or(app_config.gateway.port);
    let addr = format!("{}:{}", app_config.gateway.host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);
    println!("🚀 Contig Curator listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
