//! Router assembly and server lifecycle.

use std::sync::Arc;

use axum::{extract::State, routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::catalog::CatalogClient;
use crate::config::Config;
use crate::github::{GitHubAppAuth, SkillRequestWorkflow};
use crate::opencode_config::OpenCodeConfigFile;
use crate::resources::{AgentManager, McpManager, SkillManager};
use crate::util::http_client;

use super::agents as agents_api;
use super::catalog as catalog_api;
use super::mcp as mcp_api;
use super::skills as skills_api;
use super::types::{ActionResult, HealthResponse};
use super::validate as validate_api;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub catalog: Arc<CatalogClient>,
    pub skills: SkillManager,
    pub agents: AgentManager,
    pub mcp: McpManager,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let http = http_client();
        let catalog = Arc::new(CatalogClient::new(config.catalog_url.clone(), http.clone()));
        Self::with_catalog(config, catalog, http)
    }

    /// Build state around an existing catalog client (tests shorten its TTL).
    pub fn with_catalog(config: Config, catalog: Arc<CatalogClient>, http: reqwest::Client) -> Self {
        let auth = Arc::new(GitHubAppAuth::new(config.github.clone(), http.clone()));
        let requests = SkillRequestWorkflow::new(auth, config.catalog_repo.clone());

        Self {
            skills: SkillManager::new(&config.skills_dir, Arc::clone(&catalog), requests),
            agents: AgentManager::new(&config.agents_dir, Arc::clone(&catalog)),
            mcp: McpManager::new(
                OpenCodeConfigFile::new(&config.opencode_config_path),
                Arc::clone(&catalog),
                http,
            ),
            catalog,
            config,
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .nest("/api/catalog", catalog_api::routes())
        .nest("/api/skills", skills_api::routes())
        .nest("/api/agents", agents_api::routes())
        .nest("/api/mcp", mcp_api::routes())
        .nest("/api/validate", validate_api::routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!(
        skills = %config.skills_dir.display(),
        agents = %config.agents_dir.display(),
        opencode_config = %config.opencode_config_path.display(),
        catalog = %config.catalog_url,
        "Resource stores"
    );

    let state = Arc::new(AppState::new(config));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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

    tracing::info!("Shutdown signal received");
}

async fn health(State(state): State<Arc<AppState>>) -> ActionResult<HealthResponse> {
    ActionResult::ok(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        skill_requests_configured: state.config.github.is_configured(),
        catalog_url: state.catalog.base_url().to_string(),
    })
}
