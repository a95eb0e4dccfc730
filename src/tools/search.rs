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

//! `search_web` tool.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::cache::{build_key, memoized, ToolCache};
use crate::clients::ContentClient;
use crate::error::ToolFailure;
use crate::tools::{required_str, McpTool, ToolError, ToolOutput};
use crate::validation::{validate_query, Rejection};

pub struct SearchTool {
    client: Option<Arc<dyn ContentClient>>,
    cache: Arc<ToolCache>,
    ttl: Duration,
    schema: Value,
}

impl SearchTool {
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
                    "query": {
                        "type": "string",
                        "description": "Search terms"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn run(&self, query: &str) -> Result<String, ToolFailure> {
        validate_query(query)?;
        let client = self
            .client
            .as_ref()
            .ok_or(Rejection::MissingCredential("JINA_API_KEY"))?
            .clone();

        let key = build_key("search_web", &[query], &[]);
        let results = memoized(&self.cache, &key, self.ttl, || async move {
            client.search(query).await
        })
        .await?;

        if results.trim().is_empty() {
            return Ok("No results found".to_string());
        }
        Ok(results)
    }
}

#[async_trait]
impl McpTool for SearchTool {
    fn name(&self) -> &str {
        "search_web"
    }

    fn description(&self) -> &str {
        "Search the web and return result titles, URLs, and summaries"
    }

    fn input_schema(&self) -> &Value {
        &self.schema
    }

    async fn execute(&self, params: Value) -> Result<ToolOutput, ToolError> {
        let query = required_str(&params, "query")?;
        match self.run(query).await {
            Ok(results) => {
                info!(query, "search_web succeeded");
                Ok(ToolOutput::text(results))
            }
            Err(failure) => {
                warn!(query, error = %failure, "search_web failed");
                Ok(ToolOutput::text(failure.user_message()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::fetch::tests::CountingContentClient;
    use std::sync::atomic::Ordering;

    fn tool_with(client: Arc<CountingContentClient>) -> SearchTool {
        SearchTool::new(
            Some(client),
            Arc::new(ToolCache::in_memory()),
            Duration::from_secs(60),
        )
    }

    #[tokio::test]
    async fn test_blocked_term_rejected_without_network_call() {
        let client = Arc::new(CountingContentClient::new("results"));
        let tool = tool_with(client.clone());
        let output = tool
            .execute(json!({"query": "leaked password dump"}))
            .await
            .unwrap();
        assert!(output.text.starts_with("Error:"));
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_query_rejected() {
        let client = Arc::new(CountingContentClient::new("results"));
        let tool = tool_with(client.clone());
        let output = tool.execute(json!({"query": "   "})).await.unwrap();
        assert!(output.text.starts_with("Error:"));
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_repeat_search_served_from_cache() {
        let client = Arc::new(CountingContentClient::new("top hits"));
        let tool = tool_with(client.clone());
        for _ in 0..2 {
            let output = tool
                .execute(json!({"query": "rust async runtime"}))
                .await
                .unwrap();
            assert_eq!(output.text, "top hits");
        }
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }
}
