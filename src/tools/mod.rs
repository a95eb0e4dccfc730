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

//! Tool registry with JSON schema validation, plus the built-in tools.

pub mod fetch;
pub mod optimize_prompt;
pub mod search;
pub mod translate;
pub mod translate_deepl;

use async_trait::async_trait;
use dashmap::DashMap;
use jsonschema::JSONSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

pub use fetch::FetchTool;
pub use optimize_prompt::OptimizePromptTool;
pub use search::SearchTool;
pub use translate::TranslateTool;
pub use translate_deepl::TranslateDeepLTool;

/// Text produced by a tool call. Failures surface here as readable error
/// strings rather than protocol errors, so an LLM caller can see and react
/// to them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    pub text: String,
}

impl ToolOutput {
    pub fn text(value: impl Into<String>) -> Self {
        Self { text: value.into() }
    }
}

#[async_trait]
pub trait McpTool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn input_schema(&self) -> &Value;

    async fn execute(&self, params: Value) -> Result<ToolOutput, ToolError>;
}

/// Registry of the tools the server exposes.
pub struct ToolRegistry {
    tools: DashMap<String, Arc<dyn McpTool>>,
    validators: DashMap<String, JSONSchema>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: DashMap::new(),
            validators: DashMap::new(),
        }
    }

    pub fn register(&self, tool: Arc<dyn McpTool>) -> Result<(), RegistrationError> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(RegistrationError::DuplicateName(name));
        }

        let schema = tool.input_schema().clone();
        let validator = JSONSchema::options()
            .compile(&schema)
            .map_err(|e| RegistrationError::Schema(e.to_string()))?;
        self.validators.insert(name.clone(), validator);
        self.tools.insert(name, tool);
        Ok(())
    }

    pub fn list(&self) -> Vec<ToolListEntry> {
        self.tools
            .iter()
            .map(|entry| {
                let tool = entry.value();
                ToolListEntry {
                    name: tool.name().to_string(),
                    description: tool.description().to_string(),
                    input_schema: tool.input_schema().clone(),
                }
            })
            .collect()
    }

    pub async fn execute(&self, name: &str, params: Value) -> Result<ToolOutput, ToolError> {
        let tool = {
            let entry = self
                .tools
                .get(name)
                .ok_or_else(|| ToolError::NotFound(name.to_string()))?;
            Arc::clone(entry.value())
        };
        let validator = self
            .validators
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        if let Err(errors) = validator.validate(&params) {
            let message: String = errors
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ToolError::InvalidParams(message));
        }
        drop(validator);

        tool.execute(params).await
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolListEntry {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),
    #[error("Invalid tool params: {0}")]
    InvalidParams(String),
    #[error("Execution error: {0}")]
    Execution(String),
}

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("Duplicate tool name: {0}")]
    DuplicateName(String),
    #[error("Invalid schema: {0}")]
    Schema(String),
}

/// Pull a required string argument out of the params object.
pub(crate) fn required_str<'a>(params: &'a Value, field: &str) -> Result<&'a str, ToolError> {
    params
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::InvalidParams(format!("missing required field: {field}")))
}

pub(crate) fn optional_str<'a>(params: &'a Value, field: &str) -> Option<&'a str> {
    params.get(field).and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoTool {
        schema: Value,
    }

    impl EchoTool {
        fn new() -> Self {
            Self {
                schema: json!({
                    "type": "object",
                    "properties": {"message": {"type": "string"}},
                    "required": ["message"]
                }),
            }
        }
    }

    #[async_trait]
    impl McpTool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echoes the message back"
        }
        fn input_schema(&self) -> &Value {
            &self.schema
        }
        async fn execute(&self, params: Value) -> Result<ToolOutput, ToolError> {
            Ok(ToolOutput::text(required_str(&params, "message")?))
        }
    }

    #[tokio::test]
    async fn test_registered_tool_executes() {
        let registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool::new())).unwrap();
        let output = registry
            .execute("echo", json!({"message": "hi"}))
            .await
            .unwrap();
        assert_eq!(output.text, "hi");
    }

    #[tokio::test]
    async fn test_unknown_tool_is_not_found() {
        let registry = ToolRegistry::new();
        let err = registry.execute("nope", json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_schema_rejects_bad_params() {
        let registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool::new())).unwrap();
        let err = registry
            .execute("echo", json!({"message": 42}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidParams(_)));
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool::new())).unwrap();
        let err = registry.register(Arc::new(EchoTool::new())).unwrap_err();
        assert!(matches!(err, RegistrationError::DuplicateName(_)));
    }
}
