//! trade-journal HTTP Server
//!
//! Axum-based server exposing the conversation endpoint the chat gateway
//! forwards events to, plus the periodic report scheduler.

mod handlers;
mod jobs;
mod state;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use journal_core::{ChatTransport, DialogueEngine, MemorySessionStore, SentimentAnalyzer, TradeStore};
use journal_runtime::{HuggingFaceClassifier, SupabaseStore, WebhookConfig, WebhookTransport};

use crate::handlers::{health_check, message_handler};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    // Persistence is required; refuse to serve conversations without it.
    let trades: Arc<dyn TradeStore> = Arc::new(SupabaseStore::from_env()?);
    if trades.health_check().await {
        tracing::info!("✓ Connected to Supabase");
    } else {
        tracing::warn!("⚠ Supabase not reachable - trade commits will fail");
    }

    // Classification is best-effort; a missing token just degrades quality.
    let classifier = Arc::new(HuggingFaceClassifier::from_env());
    if classifier.has_token() {
        tracing::info!("✓ HuggingFace token configured");
    } else {
        tracing::warn!("⚠ HUGGINGFACE_TOKEN not set - classification may be rate-limited");
    }

    let engine = Arc::new(DialogueEngine::new(
        Arc::new(MemorySessionStore::new()),
        trades.clone(),
        SentimentAnalyzer::new(classifier),
    ));

    // Periodic reports need an outbound transport; without one they stay off.
    match WebhookConfig::from_env() {
        Some(config) => {
            let transport: Arc<dyn ChatTransport> = Arc::new(WebhookTransport::from_config(config));
            let interval = jobs::interval_from_env();
            tracing::info!(interval_secs = interval, "✓ Periodic reports enabled");
            tokio::spawn(jobs::run_report_loop(trades.clone(), transport, interval));
        }
        None => {
            tracing::warn!("⚠ OUTBOUND_WEBHOOK_URL not set - periodic reports disabled");
        }
    }

    // Build application state
    let state = AppState {
        engine,
        trades,
    };

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let app = Router::new()
        .route("/health", get(health_check))
        .route("/api/message", post(message_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🤖 trade-journal server running on http://{}", addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health       - Health check");
    tracing::info!("  POST /api/message  - Inbound chat event");
    tracing::info!("");

    axum::serve(listener, app).await?;

    Ok(())
}
