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

//! `translate_text` tool, backed by a generative model.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::clients::GenerativeClient;
use crate::error::ToolFailure;
use crate::tools::{optional_str, required_str, McpTool, ToolError, ToolOutput};
use crate::validation::{validate_translation_text, Rejection, MAX_TEXT_LENGTH_TRANSLATE};

pub struct TranslateTool {
    client: Option<Arc<dyn GenerativeClient>>,
    schema: Value,
}

impl TranslateTool {
    pub fn new(client: Option<Arc<dyn GenerativeClient>>) -> Self {
        Self {
            client,
            schema: json!({
                "type": "object",
                "properties": {
                    "text": {
                        "type": "string",
                        "description": "Text to translate"
                    },
                    "source_language": {
                        "type": "string",
                        "description": "Source language name or 'auto' to detect",
                        "default": "auto"
                    },
                    "target_language": {
                        "type": "string",
                        "description": "Target language name, e.g. 'English'"
                    }
                },
                "required": ["text", "target_language"]
            }),
        }
    }

    async fn run(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, ToolFailure> {
        validate_translation_text(text, MAX_TEXT_LENGTH_TRANSLATE)?;
        if target.trim().is_empty() {
            return Err(Rejection::Empty("target_language").into());
        }
        let client = self
            .client
            .as_ref()
            .ok_or(Rejection::MissingCredential("GEMINI_API_KEY"))?;

        let prompt = format!(
            "Translate the following text from {source} to {target}. \
             Only return the translation, no explanations:\n\n{text}"
        );
        client.complete(&prompt).await
    }
}

#[async_trait]
impl McpTool for TranslateTool {
    fn name(&self) -> &str {
        "translate_text"
    }

    fn description(&self) -> &str {
        "Translate text between arbitrary languages using a generative model"
    }

    fn input_schema(&self) -> &Value {
        &self.schema
    }

    async fn execute(&self, params: Value) -> Result<ToolOutput, ToolError> {
        let text = required_str(&params, "text")?;
        let source = optional_str(&params, "source_language").unwrap_or("auto");
        let target = required_str(&params, "target_language")?;

        match self.run(text, source, target).await {
            Ok(translation) => {
                info!(source, target, "translate_text succeeded");
                Ok(ToolOutput::text(translation))
            }
            Err(failure) => {
                warn!(source, target, error = %failure, "translate_text failed");
                Ok(ToolOutput::text(failure.user_message()))
            }
        }
    }
}
