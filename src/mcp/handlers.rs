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

//! MCP Request Handlers
//!
//! Handles JSON-RPC 2.0 requests for the MCP protocol.

use crate::mcp::protocol::*;
use crate::prompts::{render, PromptStyle};
use crate::tools::{ToolError, ToolRegistry};
use crate::validation::validate_prompt;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

/// MCP request handler
pub struct McpHandler {
    registry: Arc<ToolRegistry>,
}

impl McpHandler {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    /// Handle a JSON-RPC request
    pub async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        info!(method = %request.method, "MCP request received");

        match request.method.as_str() {
            // Health check (MCP protocol standard)
            "ping" => self.handle_ping(request.id).await,

            // Initialization
            "initialize" => self.handle_initialize(request.id, request.params).await,
            "initialized" => self.handle_initialized(request.id).await,

            // Tools
            "tools/list" => self.handle_tools_list(request.id).await,
            "tools/call" => self.handle_tools_call(request.id, request.params).await,

            // Prompts
            "prompts/list" => self.handle_prompts_list(request.id).await,
            "prompts/get" => self.handle_prompts_get(request.id, request.params).await,

            // Unknown method
            _ => {
                warn!(method = %request.method, "Unknown MCP method");
                JsonRpcResponse::error(request.id, JsonRpcError::method_not_found(&request.method))
            }
        }
    }

    /// Returns an empty object per MCP protocol specification
    async fn handle_ping(&self, id: JsonRpcId) -> JsonRpcResponse {
        JsonRpcResponse::success(id, json!({}))
    }

    async fn handle_initialize(
        &self,
        id: JsonRpcId,
        params: Option<serde_json::Value>,
    ) -> JsonRpcResponse {
        let _init_params: InitializeParams = match params {
            Some(p) => match serde_json::from_value(p) {
                Ok(params) => params,
                Err(e) => {
                    return JsonRpcResponse::error(
                        id,
                        JsonRpcError::invalid_params(format!("Invalid initialize params: {}", e)),
                    )
                }
            },
            None => {
                return JsonRpcResponse::error(
                    id,
                    JsonRpcError::invalid_params("Missing initialize params"),
                )
            }
        };

        let result = InitializeResult {
            protocol_version: MCP_PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                prompts: Some(PromptsCapability {
                    list_changed: false,
                }),
                tools: Some(ToolsCapability {
                    list_changed: false,
                }),
            },
            server_info: ServerInfo {
                name: "toolbridge".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        JsonRpcResponse::success(id, serde_json::to_value(result).unwrap())
    }

    async fn handle_initialized(&self, id: JsonRpcId) -> JsonRpcResponse {
        info!("MCP client initialized");
        JsonRpcResponse::success(id, json!({}))
    }

    async fn handle_tools_list(&self, id: JsonRpcId) -> JsonRpcResponse {
        let tools = self
            .registry
            .list()
            .into_iter()
            .map(|entry| Tool {
                name: entry.name,
                description: Some(entry.description),
                input_schema: entry.input_schema,
            })
            .collect();

        let result = ListToolsResult {
            tools,
            next_cursor: None,
        };

        JsonRpcResponse::success(id, serde_json::to_value(result).unwrap())
    }

    /// Tool-level problems come back as text content rather than JSON-RPC
    /// errors so an LLM caller can read and react to them. Only malformed
    /// request envelopes produce protocol errors.
    async fn handle_tools_call(
        &self,
        id: JsonRpcId,
        params: Option<serde_json::Value>,
    ) -> JsonRpcResponse {
        let call_params: CallToolParams = match params {
            Some(p) => match serde_json::from_value(p) {
                Ok(params) => params,
                Err(e) => {
                    return JsonRpcResponse::error(
                        id,
                        JsonRpcError::invalid_params(format!("Invalid tool call params: {}", e)),
                    )
                }
            },
            None => {
                return JsonRpcResponse::error(
                    id,
                    JsonRpcError::invalid_params("Missing tool call params"),
                )
            }
        };

        info!(tool = %call_params.name, "Executing MCP tool");

        let arguments = serde_json::Value::Object(
            call_params
                .arguments
                .into_iter()
                .collect::<serde_json::Map<String, serde_json::Value>>(),
        );

        let result = match self.registry.execute(&call_params.name, arguments).await {
            Ok(output) => CallToolResult::text(output.text),
            Err(ToolError::NotFound(name)) => {
                warn!(tool = %name, "Unknown tool requested");
                CallToolResult::text(format!("Unknown tool: {}", name))
            }
            Err(ToolError::InvalidParams(message)) => {
                CallToolResult::text(format!("Error: invalid arguments: {}", message))
            }
            Err(ToolError::Execution(message)) => {
                CallToolResult::text(format!("Error: {}", message))
            }
        };

        JsonRpcResponse::success(id, serde_json::to_value(result).unwrap())
    }

    async fn handle_prompts_list(&self, id: JsonRpcId) -> JsonRpcResponse {
        let prompts = vec![Prompt {
            name: "optimize_prompt".to_string(),
            description: Some(
                "Rewrite a prompt into a structured template for better responses".to_string(),
            ),
            arguments: Some(vec![
                PromptArgument {
                    name: "content".to_string(),
                    description: Some("The prompt text to optimize".to_string()),
                    required: Some(true),
                },
                PromptArgument {
                    name: "style".to_string(),
                    description: Some(
                        "Optimization style: 'comprehensive', 'simple', or 'technical'"
                            .to_string(),
                    ),
                    required: Some(false),
                },
            ]),
        }];

        let result = ListPromptsResult {
            prompts,
            next_cursor: None,
        };

        JsonRpcResponse::success(id, serde_json::to_value(result).unwrap())
    }

    async fn handle_prompts_get(
        &self,
        id: JsonRpcId,
        params: Option<serde_json::Value>,
    ) -> JsonRpcResponse {
        let get_params: GetPromptParams = match params {
            Some(p) => match serde_json::from_value(p) {
                Ok(params) => params,
                Err(e) => {
                    return JsonRpcResponse::error(
                        id,
                        JsonRpcError::invalid_params(format!("Invalid prompt params: {}", e)),
                    )
                }
            },
            None => {
                return JsonRpcResponse::error(
                    id,
                    JsonRpcError::invalid_params("Missing prompt params"),
                )
            }
        };

        let result = match get_params.name.as_str() {
            "optimize_prompt" => {
                let content = get_params
                    .arguments
                    .get("content")
                    .cloned()
                    .unwrap_or_default();
                let style = get_params
                    .arguments
                    .get("style")
                    .map(String::as_str)
                    .unwrap_or("comprehensive");

                if let Err(rejection) = validate_prompt(&content) {
                    return JsonRpcResponse::error(
                        id,
                        JsonRpcError::invalid_params(rejection.to_string()),
                    );
                }

                GetPromptResult {
                    description: Some("Optimized prompt".to_string()),
                    messages: vec![PromptMessage {
                        role: PromptRole::User,
                        content: PromptContent::Text {
                            text: render(PromptStyle::parse(style), &content),
                        },
                    }],
                }
            }

            _ => {
                return JsonRpcResponse::error(
                    id,
                    JsonRpcError::invalid_params(format!("Unknown prompt: {}", get_params.name)),
                )
            }
        };

        JsonRpcResponse::success(id, serde_json::to_value(result).unwrap())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ToolCache;
    use crate::tools::OptimizePromptTool;
    use std::time::Duration;

    fn handler_with_tools() -> McpHandler {
        let registry = Arc::new(ToolRegistry::new());
        registry
            .register(Arc::new(OptimizePromptTool::new()))
            .unwrap();
        registry
            .register(Arc::new(crate::tools::FetchTool::new(
                None,
                Arc::new(ToolCache::in_memory()),
                Duration::from_secs(60),
            )))
            .unwrap();
        McpHandler::new(registry)
    }

    fn request(method: &str, params: serde_json::Value) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.to_string(),
            params: Some(params),
            id: JsonRpcId::Number(1),
        }
    }

    #[tokio::test]
    async fn test_ping_returns_empty_object() {
        let handler = handler_with_tools();
        let response = handler.handle_request(request("ping", json!({}))).await;
        assert_eq!(response.result, Some(json!({})));
        assert!(response.error.is_none());
    }

    #[tokio::test]
    async fn test_initialize_reports_capabilities() {
        let handler = handler_with_tools();
        let response = handler
            .handle_request(request(
                "initialize",
                json!({
                    "protocolVersion": MCP_PROTOCOL_VERSION,
                    "capabilities": {},
                    "clientInfo": {"name": "test", "version": "0.0.1"}
                }),
            ))
            .await;
        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], MCP_PROTOCOL_VERSION);
        assert!(result["capabilities"]["tools"].is_object());
        assert!(result["capabilities"]["prompts"].is_object());
    }

    #[tokio::test]
    async fn test_tools_list_includes_registered_tools() {
        let handler = handler_with_tools();
        let response = handler
            .handle_request(request("tools/list", json!({})))
            .await;
        let result = response.result.unwrap();
        let names: Vec<&str> = result["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert!(names.contains(&"optimize_prompt"));
        assert!(names.contains(&"fetch_content"));
    }

    #[tokio::test]
    async fn test_unknown_tool_returns_text_not_protocol_error() {
        let handler = handler_with_tools();
        let response = handler
            .handle_request(request(
                "tools/call",
                json!({"name": "bogus", "arguments": {}}),
            ))
            .await;
        assert!(response.error.is_none());
        let result = response.result.unwrap();
        let text = result["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("Unknown tool"));
    }

    #[tokio::test]
    async fn test_tool_failure_surfaces_as_text() {
        let handler = handler_with_tools();
        let response = handler
            .handle_request(request(
                "tools/call",
                json!({"name": "fetch_content", "arguments": {"url": "not-a-url"}}),
            ))
            .await;
        assert!(response.error.is_none());
        let result = response.result.unwrap();
        let text = result["content"][0]["text"].as_str().unwrap();
        assert!(text.to_lowercase().contains("invalid"));
    }

    #[tokio::test]
    async fn test_unknown_method_is_protocol_error() {
        let handler = handler_with_tools();
        let response = handler
            .handle_request(request("resources/list", json!({})))
            .await;
        let error = response.error.unwrap();
        assert_eq!(error.code, -32601);
    }

    #[tokio::test]
    async fn test_prompts_get_renders_template() {
        let handler = handler_with_tools();
        let response = handler
            .handle_request(request(
                "prompts/get",
                json!({
                    "name": "optimize_prompt",
                    "arguments": {"content": "summarize this text", "style": "simple"}
                }),
            ))
            .await;
        let result = response.result.unwrap();
        let text = result["messages"][0]["content"]["text"].as_str().unwrap();
        assert!(text.contains("summarize this text"));
    }
}
