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

// Integration tests driving the MCP handler through a full client session
// without any upstream credentials configured.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use toolbridge::cache::ToolCache;
use toolbridge::mcp::protocol::{JsonRpcId, JsonRpcRequest, JSONRPC_VERSION};
use toolbridge::mcp::McpHandler;
use toolbridge::tools::{FetchTool, OptimizePromptTool, SearchTool, ToolRegistry};

fn handler_without_credentials() -> McpHandler {
    let cache = Arc::new(ToolCache::in_memory());
    let registry = Arc::new(ToolRegistry::new());
    registry
        .register(Arc::new(FetchTool::new(
            None,
            cache.clone(),
            Duration::from_secs(1800),
        )))
        .unwrap();
    registry
        .register(Arc::new(SearchTool::new(
            None,
            cache,
            Duration::from_secs(900),
        )))
        .unwrap();
    registry
        .register(Arc::new(OptimizePromptTool::new()))
        .unwrap();
    McpHandler::new(registry)
}

fn request(id: i64, method: &str, params: serde_json::Value) -> JsonRpcRequest {
    JsonRpcRequest {
        jsonrpc: JSONRPC_VERSION.to_string(),
        method: method.to_string(),
        params: Some(params),
        id: JsonRpcId::Number(id),
    }
}

#[tokio::test]
async fn test_full_session_lifecycle() {
    let handler = handler_without_credentials();

    let init = handler
        .handle_request(request(
            1,
            "initialize",
            json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": {"name": "integration-test", "version": "1.0"}
            }),
        ))
        .await;
    let init_result = init.result.unwrap();
    assert_eq!(init_result["serverInfo"]["name"], "toolbridge");

    let list = handler.handle_request(request(2, "tools/list", json!({}))).await;
    let tools = list.result.unwrap();
    assert_eq!(tools["tools"].as_array().unwrap().len(), 3);

    let ping = handler.handle_request(request(3, "ping", json!({}))).await;
    assert_eq!(ping.result, Some(json!({})));
}

#[tokio::test]
async fn test_invalid_url_never_reaches_network() {
    // With no client configured, a networked call would report the missing
    // credential. An invalid URL must be rejected before that check, which
    // proves validation runs first.
    let handler = handler_without_credentials();

    let response = handler
        .handle_request(request(
            1,
            "tools/call",
            json!({"name": "fetch_content", "arguments": {"url": "not-a-url"}}),
        ))
        .await;

    assert!(response.error.is_none());
    let result = response.result.unwrap();
    let text = result["content"][0]["text"].as_str().unwrap();
    assert!(text.to_lowercase().contains("invalid"));
    assert!(!text.contains("JINA_API_KEY"));
}

#[tokio::test]
async fn test_missing_credential_surfaces_per_tool() {
    let handler = handler_without_credentials();

    let response = handler
        .handle_request(request(
            1,
            "tools/call",
            json!({"name": "search_web", "arguments": {"query": "rust web frameworks"}}),
        ))
        .await;

    let result = response.result.unwrap();
    let text = result["content"][0]["text"].as_str().unwrap();
    assert!(text.starts_with("Error:"));
    assert!(text.contains("JINA_API_KEY"));

    // Tools without upstream dependencies keep working.
    let response = handler
        .handle_request(request(
            2,
            "tools/call",
            json!({"name": "optimize_prompt", "arguments": {"content": "explain monads"}}),
        ))
        .await;
    let result = response.result.unwrap();
    let text = result["content"][0]["text"].as_str().unwrap();
    assert!(text.contains("explain monads"));
    assert!(!text.starts_with("Error:"));
}

#[tokio::test]
async fn test_schema_validation_rejects_wrong_types() {
    let handler = handler_without_credentials();

    let response = handler
        .handle_request(request(
            1,
            "tools/call",
            json!({"name": "fetch_content", "arguments": {"url": 123}}),
        ))
        .await;

    assert!(response.error.is_none());
    let result = response.result.unwrap();
    let text = result["content"][0]["text"].as_str().unwrap();
    assert!(text.starts_with("Error: invalid arguments"));
}
