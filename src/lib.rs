// Copyright 2025 Toolbridge Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

pub mod api;
pub mod auth;
pub mod cache;
pub mod clients;
pub mod config;
pub mod error;
pub mod mcp;
pub mod prompts;
pub mod tools;
pub mod validation;

use anyhow::{Context, Result};
use axum::{
    middleware as axum_middleware,
    routing::{delete, get},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api::{cache_admin, health, AppState, CredentialStatus};
use auth::{ApiKeyStore, AuthGate, RateLimiter};
use cache::ToolCache;
use clients::{DeepLClient, GeminiClient, JinaClient};
use config::ServerConfig;
use mcp::{McpHandler, McpServer};
use tools::{
    FetchTool, OptimizePromptTool, SearchTool, ToolRegistry, TranslateDeepLTool, TranslateTool,
};

/// Initialize the tracing subscriber. In stdio mode logs go to stderr so
/// they cannot corrupt the JSON protocol stream on stdout.
pub fn init_tracing(to_stderr: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "toolbridge=info,tower_http=info".into());

    if to_stderr {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Build the shared cache, tool registry, and app state from the config.
pub fn build_registry(config: &ServerConfig) -> Result<(Arc<ToolRegistry>, AppState)> {
    let cache = Arc::new(ToolCache::new(config.cache.redis_url.clone()));

    let credentials = CredentialStatus {
        jina: config.credentials.jina_api_key.is_some(),
        gemini: config.credentials.gemini_api_key.is_some(),
        deepl: config.credentials.deepl_api_key.is_some(),
    };

    let jina = config
        .credentials
        .jina_api_key
        .clone()
        .map(|key| JinaClient::new(key, config.clients.jina_timeout()))
        .transpose()
        .context("failed to build Jina client")?
        .map(|client| Arc::new(client) as Arc<dyn clients::ContentClient>);

    let gemini = config.credentials.gemini_api_key.clone().map(|key| {
        Arc::new(GeminiClient::new(
            key,
            config.clients.gemini_model.clone(),
            config.clients.gemini_timeout(),
        )) as Arc<dyn clients::GenerativeClient>
    });

    let deepl = config
        .credentials
        .deepl_api_key
        .clone()
        .map(|key| {
            DeepLClient::new(
                key,
                config.clients.deepl_api_url.clone(),
                config.clients.deepl_timeout(),
            )
        })
        .transpose()
        .context("failed to build DeepL client")?
        .map(|client| Arc::new(client) as Arc<dyn clients::TranslationClient>);

    let registry = Arc::new(ToolRegistry::new());
    registry
        .register(Arc::new(FetchTool::new(
            jina.clone(),
            cache.clone(),
            config.cache.fetch_ttl(),
        )))
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    registry
        .register(Arc::new(SearchTool::new(
            jina,
            cache.clone(),
            config.cache.search_ttl(),
        )))
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    registry
        .register(Arc::new(TranslateTool::new(gemini)))
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    registry
        .register(Arc::new(TranslateDeepLTool::new(deepl)))
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    registry
        .register(Arc::new(OptimizePromptTool::new()))
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    let state = AppState::new(cache, credentials);
    Ok((registry, state))
}

/// Run the HTTP server hosting MCP and the operational API.
pub async fn run_server(config: ServerConfig) -> Result<()> {
    tracing::info!("Starting Toolbridge Server");
    config.validate()?;

    let (registry, state) = build_registry(&config)?;

    tracing::info!(
        jina = state.credentials.jina,
        gemini = state.credentials.gemini,
        deepl = state.credentials.deepl,
        "Upstream credentials"
    );

    let gate = AuthGate {
        keys: Arc::new(ApiKeyStore::load(&config.auth.keys_file)),
        limiter: Arc::new(RateLimiter::new(auth::RateLimitConfig {
            max_requests: config.auth.rate_limit.max_requests,
            window: std::time::Duration::from_secs(config.auth.rate_limit.window_secs),
            enabled: config.auth.rate_limit.enabled,
            ..Default::default()
        })),
        enabled: config.auth.enabled,
    };

    let mcp_server = McpServer::new(registry);

    let admin_routes = Router::new()
        .route("/api/v1/cache/stats", get(cache_admin::cache_stats))
        .route("/api/v1/cache", delete(cache_admin::cache_clear))
        .layer(axum_middleware::from_fn_with_state(
            gate.clone(),
            auth::require_api_key,
        ))
        .with_state(state.clone());

    let app = Router::new()
        .route("/health", get(health::health_check))
        .with_state(state)
        .merge(admin_routes)
        .merge(
            mcp_server.router().layer(axum_middleware::from_fn_with_state(
                gate,
                auth::require_api_key,
            )),
        )
        .layer(if config.server.enable_cors {
            let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
            if config.server.cors_origins.is_empty() {
                tracing::warn!("CORS: Allowing all origins (development mode). Set cors_origins in production!");
            }
            cors.allow_origin(Any)
        } else {
            CorsLayer::new()
        })
        .layer(TraceLayer::new_for_http());

    let addr = config.socket_addr()?;
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Run the MCP handler over stdio, one JSON message per line. Used when a
/// desktop client spawns the server as a subprocess.
pub async fn run_stdio(config: ServerConfig) -> Result<()> {
    config.validate()?;
    let (registry, _state) = build_registry(&config)?;
    let handler = McpHandler::new(registry);

    mcp::transport::serve(mcp::transport::StdioTransport::new(), &handler).await?;
    Ok(())
}
