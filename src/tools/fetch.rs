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

//! `fetch_content` tool.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::cache::{build_key, memoized, ToolCache};
use crate::clients::ContentClient;
use crate::error::ToolFailure;
use crate::tools::{required_str, McpTool, ToolError, ToolOutput};
use crate::validation::{validate_url, Rejection};

pub struct FetchTool {
    client: Option<Arc<dyn ContentClient>>,
    cache: Arc<ToolCache>,
    ttl: Duration,
    schema: Value,
}

impl FetchTool {
    pub fn new(
        client: Option<Arc<dyn ContentClient>>,
        cache: Arc<ToolCache>,
        ttl: Duration,
    ) -> Self {
        Self {
            client,
            cache,
            ttl,
            schema: json!({
                "type": "object",
                "properties": {
                    "url": {
                        "type": "string",
                        "description": "HTTP or HTTPS URL of the page to fetch"
                    }
                },
                "required": ["url"]
            }),
        }
    }

    async fn run(&self, url: &str) -> Result<String, ToolFailure> {
        validate_url(url)?;
        let client = self
            .client
            .as_ref()
            .ok_or(Rejection::MissingCredential("JINA_API_KEY"))?
            .clone();

        let key = build_key("fetch_content", &[url], &[]);
        let content = memoized(&self.cache, &key, self.ttl, || async move {
            client.fetch(url).await
        })
        .await?;

        if content.trim().is_empty() {
            return Ok("Warning: no content extracted from the URL".to_string());
        }
        Ok(content)
    }
}

#[async_trait]
impl McpTool for FetchTool {
    fn name(&self) -> &str {
        "fetch_content"
    }

    fn description(&self) -> &str {
        "Fetch a web page and return its readable content as text"
    }

    fn input_schema(&self) -> &Value {
        &self.schema
    }

    async fn execute(&self, params: Value) -> Result<ToolOutput, ToolError> {
        let url = required_str(&params, "url")?;
        match self.run(url).await {
            Ok(content) => {
                info!(url, bytes = content.len(), "fetch_content succeeded");
                Ok(ToolOutput::text(content))
            }
            Err(failure) => {
                warn!(url, error = %failure, "fetch_content failed");
                Ok(ToolOutput::text(failure.user_message()))
            }
        }
    }
}
