//! jadoo API server.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use jadoo_api::{
    build_router, logging, parse_allowed_origins, AppConfig, AppState, ChatService,
    EnrichmentOptions, EnrichmentService, SearchService,
};
use jadoo_core::{EmbeddingBackend, ImageFetcher, ImageRepository, VisionBackend};
use jadoo_db::{log_pool_metrics, Database};
use jadoo_inference::{
    CloudVisionBackend, CloudVisionConfig, GeminiBackend, GeminiConfig, GlinerBackend,
    HttpImageFetcher, RetryPolicy,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let _log_guard = logging::init_logging();

    let config = AppConfig::from_env().context("Invalid configuration")?;
    let retry = RetryPolicy::new(config.service_max_retries);

    // Database
    let db = Database::connect(&config.database_url, &config.pool_config())
        .await
        .context("Failed to connect to database")?;
    if config.run_migrations {
        info!("Running database migrations");
        db.migrate().await.context("Failed to run migrations")?;
    }
    log_pool_metrics(&db.pool);

    // External services
    let mut gemini_config = GeminiConfig::new(&config.gemini_api_key)
        .with_base_url(&config.gemini_base_url)
        .with_retry(retry.clone());
    gemini_config.gen_model = config.gen_model.clone();
    gemini_config.embed_model = config.embed_model.clone();
    gemini_config.embed_dimension = config.embed_dimension;
    gemini_config.timeout_seconds = config.service_timeout_secs;
    let gemini = Arc::new(GeminiBackend::new(gemini_config)?);

    let mut vision_config = CloudVisionConfig::new(&config.vision_api_key)
        .with_base_url(&config.vision_base_url)
        .with_retry(retry.clone());
    vision_config.timeout_seconds = config.service_timeout_secs;
    let labels = Arc::new(CloudVisionBackend::new(vision_config)?);

    let fetcher: Arc<dyn ImageFetcher> = Arc::new(
        HttpImageFetcher::new(config.service_timeout_secs)?.with_retry(retry.clone()),
    );
    let repo: Arc<dyn ImageRepository> = Arc::new(db.images.clone());
    let vision: Arc<dyn VisionBackend> = gemini.clone();
    let embeddings: Arc<dyn EmbeddingBackend> = gemini;

    let mut enrichment = EnrichmentService::new(
        repo.clone(),
        labels,
        vision.clone(),
        embeddings.clone(),
        fetcher.clone(),
    )
    .with_options(EnrichmentOptions {
        stage_timeout: config.stage_timeout(),
        restrict_media_types: config.restrict_media_types,
        entity_threshold: config.entity_threshold,
    });
    match config.gliner_base_url.as_deref() {
        Some(url) => {
            info!(url, "Entity extraction enabled");
            enrichment = enrichment.with_ner(Arc::new(
                GlinerBackend::new(url.to_string())
                    .with_timeout_secs(config.service_timeout_secs)
                    .with_retry(retry),
            ));
        }
        None => info!("GLINER_BASE_URL not set, tags come from label detection only"),
    }

    let state = AppState {
        enrichment: Arc::new(enrichment),
        search: Arc::new(SearchService::new(repo, embeddings)),
        chat: Arc::new(ChatService::new(fetcher, vision).with_timeout(config.stage_timeout())),
    };

    let app = build_router(state, parse_allowed_origins(&config.allowed_origins));

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
}
