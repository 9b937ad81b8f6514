use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use stt_relay::config::{EngineKind, DEFAULT_CONFIG_PATH};
use stt_relay::{
    create_router, AppState, Config, MockEngine, NatsEngine, RecognitionEngine, SessionRegistry,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stt-relay")]
#[command(about = "Multiplexes streaming transcription sessions onto a recognition engine")]
struct Args {
    /// Config file (defaults to config/stt-relay.toml if present)
    #[arg(long)]
    config: Option<String>,

    /// Listen port, overrides service.http.port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_optional(DEFAULT_CONFIG_PATH)?,
    };
    if let Some(port) = args.port {
        cfg.service.http.port = port;
    }

    info!("Loaded config: {}", cfg.service.name);
    info!(
        "Recognition: {:?} @ {} Hz, language {}, chunk size {} bytes",
        cfg.recognition.encoding,
        cfg.recognition.sample_rate_hertz,
        cfg.recognition.language_code,
        cfg.audio.chunk_size
    );

    let engine: Arc<dyn RecognitionEngine> = match cfg.engine.kind {
        EngineKind::Nats => Arc::new(
            NatsEngine::connect(&cfg.engine.nats_url, cfg.engine.subject_prefix.clone()).await?,
        ),
        EngineKind::Mock => {
            warn!("Using mock recognition engine: no transcripts will be produced");
            Arc::new(MockEngine::new())
        }
    };

    let registry = SessionRegistry::new(engine, cfg.recognition.clone());
    let app = create_router(AppState::new(registry.clone(), cfg.audio.chunk_size));

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("STT relay is listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    registry.shutdown().await;
    info!("STT relay stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
