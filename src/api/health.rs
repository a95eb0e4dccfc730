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

use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;
use tracing::debug;

use crate::api::AppState;

/// Health check response structure
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub cache: CacheHealth,
    pub credentials: CredentialsHealth,
}

#[derive(Debug, Serialize)]
pub struct CacheHealth {
    pub backend: String,
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug, Serialize)]
pub struct CredentialsHealth {
    pub jina_configured: bool,
    pub gemini_configured: bool,
    pub deepl_configured: bool,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    debug!("Health check requested");

    let stats = state.cache.stats().await;

    let health = HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        cache: CacheHealth {
            backend: stats.backend.as_str().to_string(),
            hits: stats.hits,
            misses: stats.misses,
        },
        credentials: CredentialsHealth {
            jina_configured: state.credentials.jina,
            gemini_configured: state.credentials.gemini,
            deepl_configured: state.credentials.deepl,
        },
    };

    Json(health)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::CredentialStatus;
    use crate::cache::ToolCache;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_health_reports_cache_and_credentials() {
        let state = AppState::new(
            Arc::new(ToolCache::in_memory()),
            CredentialStatus {
                jina: true,
                gemini: false,
                deepl: false,
            },
        );

        let response = health_check(State(state)).await.into_response();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
    }
}
