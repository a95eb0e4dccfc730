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

//! Operational HTTP endpoints: health and cache administration.

pub mod cache_admin;
pub mod health;

use crate::cache::ToolCache;
use std::sync::Arc;
use std::time::Instant;

/// Which upstream credentials were present at startup. Tools with a
/// missing credential stay registered but report the gap on every call.
#[derive(Debug, Clone, Copy)]
pub struct CredentialStatus {
    pub jina: bool,
    pub gemini: bool,
    pub deepl: bool,
}

/// Shared state for the operational API routes.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<ToolCache>,
    pub credentials: CredentialStatus,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(cache: Arc<ToolCache>, credentials: CredentialStatus) -> Self {
        Self {
            cache,
            credentials,
            started_at: Instant::now(),
        }
    }
}
