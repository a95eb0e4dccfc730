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

//! `translate_deepl` tool, restricted to DeepL's language codes.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::clients::TranslationClient;
use crate::error::ToolFailure;
use crate::tools::{optional_str, required_str, McpTool, ToolError, ToolOutput};
use crate::validation::{
    validate_language_pair, validate_translation_text, Rejection, MAX_TEXT_LENGTH_DEEPL,
};

pub struct TranslateDeepLTool {
    client: Option<Arc<dyn TranslationClient>>,
    schema: Value,
}

impl TranslateDeepLTool {
    pub fn new(client: Option<Arc<dyn TranslationClient>>) -> Self {
        Self {
            client,
            schema: json!({
                "type": "object",
                "properties": {
                    "text": {
                        "type": "string",
                        "description": "Text to translate"
                    },
                    "source_lang": {
                        "type": "string",
                        "description": "DeepL source language code, omit to auto-detect"
                    },
                    "target_lang": {
                        "type": "string",
                        "description": "DeepL target language code, e.g. 'DE' or 'PT-BR'"
                    }
                },
                "required": ["text", "target_lang"]
            }),
        }
    }

    async fn run(
        &self,
        text: &str,
        source: Option<&str>,
        target: &str,
    ) -> Result<String, ToolFailure> {
        validate_translation_text(text, MAX_TEXT_LENGTH_DEEPL)?;
        validate_language_pair(source, target)?;
        let client = self
            .client
            .as_ref()
            .ok_or(Rejection::MissingCredential("DEEPL_API_KEY"))?;

        client.translate(text, source, target).await
    }
}

#[async_trait]
impl McpTool for TranslateDeepLTool {
    fn name(&self) -> &str {
        "translate_deepl"
    }

    fn description(&self) -> &str {
        "Translate text with DeepL between supported language codes"
    }

    fn input_schema(&self) -> &Value {
        &self.schema
    }

    async fn execute(&self, params: Value) -> Result<ToolOutput, ToolError> {
        let text = required_str(&params, "text")?;
        let source = optional_str(&params, "source_lang");
        let target = required_str(&params, "target_lang")?;

        match self.run(text, source, target).await {
            Ok(translation) => {
                info!(target, "translate_deepl succeeded");
                Ok(ToolOutput::text(translation))
            }
            Err(failure) => {
                warn!(target, error = %failure, "translate_deepl failed");
                Ok(ToolOutput::text(failure.user_message()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingTranslationClient {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TranslationClient for CountingTranslationClient {
        async fn translate(
            &self,
            _text: &str,
            _source: Option<&str>,
            _target: &str,
        ) -> Result<String, ToolFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok("übersetzt".to_string())
        }
    }

    fn tool_and_client() -> (TranslateDeepLTool, Arc<CountingTranslationClient>) {
        let client = Arc::new(CountingTranslationClient {
            calls: AtomicUsize::new(0),
        });
        (TranslateDeepLTool::new(Some(client.clone())), client)
    }

    #[tokio::test]
    async fn test_invalid_source_code_rejected_without_network_call() {
        let (tool, client) = tool_and_client();
        let output = tool
            .execute(json!({
                "text": "hello",
                "source_lang": "INVALID",
                "target_lang": "DE"
            }))
            .await
            .unwrap();
        assert!(output.text.starts_with("Error:"));
        assert!(output.text.contains("source"));
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_same_source_and_target_rejected() {
        let (tool, client) = tool_and_client();
        let output = tool
            .execute(json!({
                "text": "hello",
                "source_lang": "en",
                "target_lang": "EN"
            }))
            .await
            .unwrap();
        assert!(output.text.starts_with("Error:"));
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_lowercase_codes_accepted() {
        let (tool, client) = tool_and_client();
        let output = tool
            .execute(json!({
                "text": "hello",
                "source_lang": "en",
                "target_lang": "de"
            }))
            .await
            .unwrap();
        assert_eq!(output.text, "übersetzt");
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_source_means_auto_detect() {
        let (tool, client) = tool_and_client();
        let output = tool
            .execute(json!({"text": "hello", "target_lang": "DE"}))
            .await
            .unwrap();
        assert_eq!(output.text, "übersetzt");
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }
}
