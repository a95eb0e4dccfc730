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

//! Cache administration endpoints.

use axum::{extract::State, response::IntoResponse, Json};
use tracing::info;

use crate::api::AppState;

/// GET /api/v1/cache/stats
pub async fn cache_stats(State(state): State<AppState>) -> impl IntoResponse {
    let stats = state.cache.stats().await;
    Json(stats)
}

/// DELETE /api/v1/cache
pub async fn cache_clear(State(state): State<AppState>) -> impl IntoResponse {
    state.cache.clear().await;
    info!("Cache cleared by operator request");
    Json(serde_json::json!({"status": "cleared"}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::CredentialStatus;
    use crate::cache::{BackendState, ToolCache};
    use std::sync::Arc;
    use std::time::Duration;

    fn state() -> AppState {
        AppState::new(
            Arc::new(ToolCache::in_memory()),
            CredentialStatus {
                jina: false,
                gemini: false,
                deepl: false,
            },
        )
    }

    #[tokio::test]
    async fn test_clear_empties_cache() {
        let state = state();
        state
            .cache
            .set("k", "v", Duration::from_secs(60))
            .await;

        cache_clear(State(state.clone())).await;

        assert_eq!(state.cache.get("k").await, None);
        assert_eq!(state.cache.backend_state().await, BackendState::Memory);
    }
}
