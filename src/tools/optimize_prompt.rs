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

//! `optimize_prompt` tool. Purely local template expansion, no upstream
//! call involved.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::error::ToolFailure;
use crate::prompts::{render, PromptStyle};
use crate::tools::{optional_str, required_str, McpTool, ToolError, ToolOutput};
use crate::validation::validate_prompt;

pub struct OptimizePromptTool {
    schema: Value,
}

impl OptimizePromptTool {
    pub fn new() -> Self {
        Self {
            schema: json!({
                "type": "object",
                "properties": {
                    "content": {
                        "type": "string",
                        "description": "Prompt text to optimize"
                    },
                    "style": {
                        "type": "string",
                        "description": "comprehensive, simple, or technical",
                        "default": "comprehensive"
                    }
                },
                "required": ["content"]
            }),
        }
    }

    fn run(&self, content: &str, style: &str) -> Result<String, ToolFailure> {
        validate_prompt(content)?;
        Ok(render(PromptStyle::parse(style), content))
    }
}

impl Default for OptimizePromptTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl McpTool for OptimizePromptTool {
    fn name(&self) -> &str {
        "optimize_prompt"
    }

    fn description(&self) -> &str {
        "Rewrite a prompt into a structured template for better model responses"
    }

    fn input_schema(&self) -> &Value {
        &self.schema
    }

    async fn execute(&self, params: Value) -> Result<ToolOutput, ToolError> {
        let content = required_str(&params, "content")?;
        let style = optional_str(&params, "style").unwrap_or("comprehensive");

        match self.run(content, style) {
            Ok(optimized) => {
                info!(style, "optimize_prompt succeeded");
                Ok(ToolOutput::text(optimized))
            }
            Err(failure) => {
                warn!(style, error = %failure, "optimize_prompt failed");
                Ok(ToolOutput::text(failure.user_message()))
            }
        }
    }
}
