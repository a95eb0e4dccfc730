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

//! API key authentication with JSON file persistence, plus the request
//! gate that combines key checks with rate limiting.

pub mod rate_limit;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use parking_lot::RwLock;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

pub use rate_limit::{extract_client_ip, RateLimitConfig, RateLimitResult, RateLimiter};

const API_KEY_LENGTH: usize = 32;
const MASK_VISIBLE_CHARS: usize = 8;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeyRecord {
    pub user: String,
    pub role: String,
    pub created: i64,
    pub last_used: Option<i64>,
    pub permissions: Vec<String>,
}

/// Key store backed by a JSON file. The in-memory map is authoritative; a
/// failed save logs and keeps serving from memory.
pub struct ApiKeyStore {
    path: PathBuf,
    keys: RwLock<HashMap<String, ApiKeyRecord>>,
}

impl ApiKeyStore {
    /// Load keys from `path`, creating the file with a default admin key
    /// when it does not exist yet.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let keys = match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<HashMap<String, ApiKeyRecord>>(&contents)
            {
                Ok(keys) => {
                    info!(count = keys.len(), "Loaded API keys");
                    keys
                }
                Err(e) => {
                    error!(error = %e, path = %path.display(), "Corrupt API key file, starting empty");
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };

        let store = Self {
            path,
            keys: RwLock::new(keys),
        };

        if store.keys.read().is_empty() {
            let admin_key = store.create_user(
                "admin",
                "admin",
                vec![
                    "read".to_string(),
                    "write".to_string(),
                    "admin".to_string(),
                ],
            );
            info!(key_prefix = &admin_key[..MASK_VISIBLE_CHARS], "Created default admin key");
        }

        store
    }

    fn generate_key() -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(API_KEY_LENGTH)
            .map(char::from)
            .collect()
    }

    fn save(&self) {
        let keys = self.keys.read();
        match serde_json::to_string_pretty(&*keys) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&self.path, json) {
                    error!(error = %e, path = %self.path.display(), "Failed to save API keys");
                }
            }
            Err(e) => error!(error = %e, "Failed to serialize API keys"),
        }
    }

    /// Validate a key, updating its last-used timestamp on success.
    pub fn validate(&self, api_key: &str) -> Option<ApiKeyRecord> {
        let record = {
            let mut keys = self.keys.write();
            let record = keys.get_mut(api_key)?;
            record.last_used = Some(Utc::now().timestamp());
            record.clone()
        };
        self.save();
        Some(record)
    }

    /// Create a user and return their new API key.
    pub fn create_user(&self, username: &str, role: &str, permissions: Vec<String>) -> String {
        let api_key = Self::generate_key();
        {
            let mut keys = self.keys.write();
            keys.insert(
                api_key.clone(),
                ApiKeyRecord {
                    user: username.to_string(),
                    role: role.to_string(),
                    created: Utc::now().timestamp(),
                    last_used: None,
                    permissions,
                },
            );
        }
        self.save();
        info!(user = username, role, "Created user");
        api_key
    }

    /// Revoke a key. Returns false when the key was not present.
    pub fn revoke(&self, api_key: &str) -> bool {
        let removed = {
            let mut keys = self.keys.write();
            keys.remove(api_key)
        };
        match removed {
            Some(record) => {
                self.save();
                info!(user = %record.user, "Revoked API key");
                true
            }
            None => false,
        }
    }

    /// List users with their keys masked down to a short prefix.
    pub fn list_users(&self) -> Vec<serde_json::Value> {
        let keys = self.keys.read();
        keys.iter()
            .map(|(key, record)| {
                let masked = format!("{}...", &key[..key.len().min(MASK_VISIBLE_CHARS)]);
                serde_json::json!({
                    "api_key": masked,
                    "user": record.user,
                    "role": record.role,
                    "created": record.created,
                    "last_used": record.last_used,
                    "permissions": record.permissions,
                })
            })
            .collect()
    }

    /// Admins hold every permission implicitly.
    pub fn has_permission(record: &ApiKeyRecord, permission: &str) -> bool {
        if record.role == "admin" {
            return true;
        }
        record.permissions.iter().any(|p| p == permission)
    }
}

/// Shared state for the authentication middleware.
#[derive(Clone)]
pub struct AuthGate {
    pub keys: Arc<ApiKeyStore>,
    pub limiter: Arc<RateLimiter>,
    pub enabled: bool,
}

/// Axum middleware enforcing the API key header and per-client rate
/// limits. Key checks are skipped when auth is disabled; rate limiting
/// always applies.
pub async fn require_api_key(
    State(gate): State<AuthGate>,
    request: Request,
    next: Next,
) -> Response {
    let headers = request.headers();

    let client_id = headers
        .get("X-API-Key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| extract_client_ip(headers))
        .unwrap_or_else(|| "anonymous".to_string());

    if let RateLimitResult::RateLimited { retry_after } =
        gate.limiter.check_rate_limit(&client_id)
    {
        warn!(client = %client_id, "Rate limit exceeded");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            [("Retry-After", retry_after.as_secs().to_string())],
            "rate limit exceeded",
        )
            .into_response();
    }

    if gate.enabled {
        let api_key = headers.get("X-API-Key").and_then(|v| v.to_str().ok());
        match api_key {
            Some(key) if gate.keys.validate(key).is_some() => {}
            _ => {
                warn!("Rejected request with missing or invalid API key");
                return (StatusCode::UNAUTHORIZED, "invalid or missing API key")
                    .into_response();
            }
        }
    }

    next.run(request).await
}
