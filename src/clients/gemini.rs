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

//! Gemini client over the OpenAI-compatible endpoint.

use std::time::Duration;

use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use tracing::debug;

use crate::clients::GenerativeClient;
use crate::error::ToolFailure;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/openai/";
const DEFAULT_MODEL: &str = "gemini-1.5-flash";

pub struct GeminiClient {
    client: Client<OpenAIConfig>,
    model: String,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(api_key: String, model: Option<String>, timeout: Duration) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(GEMINI_API_BASE);
        Self {
            client: Client::with_config(config),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            timeout,
        }
    }
}

#[async_trait]
impl GenerativeClient for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String, ToolFailure> {
        debug!(model = %self.model, "gemini completion request");
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages([ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|err| ToolFailure::InternalUnexpected(err.to_string()))?
                .into()])
            .build()
            .map_err(|err| ToolFailure::InternalUnexpected(err.to_string()))?;

        let response = tokio::time::timeout(self.timeout, self.client.chat().create(request))
            .await
            .map_err(|_| ToolFailure::Timeout)?
            .map_err(map_openai_error)?;

        let text = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .unwrap_or_default();
        Ok(text)
    }
}

/// The OpenAI-compatible client does not expose HTTP status codes for API
/// errors, so classification falls back to message inspection.
fn map_openai_error(err: OpenAIError) -> ToolFailure {
    match err {
        OpenAIError::Reqwest(inner) => {
            if inner.is_timeout() {
                ToolFailure::Timeout
            } else {
                ToolFailure::TransportFailure(inner.to_string())
            }
        }
        OpenAIError::ApiError(api) => {
            let message = api.message.to_lowercase();
            if message.contains("quota") {
                ToolFailure::QuotaExceeded
            } else if message.contains("rate") {
                ToolFailure::RateLimited
            } else if message.contains("api key") || message.contains("unauthorized") {
                ToolFailure::Unauthorized
            } else {
                ToolFailure::UpstreamError {
                    detail: api.message,
                }
            }
        }
        other => ToolFailure::UpstreamError {
            detail: other.to_string(),
        },
    }
}
