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

//! Upstream service clients: Jina Reader, Gemini, and DeepL.

pub mod deepl;
pub mod gemini;
pub mod jina;

use async_trait::async_trait;

use crate::error::ToolFailure;

pub use deepl::DeepLClient;
pub use gemini::GeminiClient;
pub use jina::JinaClient;

/// Fetches readable content from the web.
#[async_trait]
pub trait ContentClient: Send + Sync {
    /// Retrieve a page as markdown-ish text.
    async fn fetch(&self, url: &str) -> Result<String, ToolFailure>;

    /// Run a web search and return result summaries.
    async fn search(&self, query: &str) -> Result<String, ToolFailure>;
}

/// Translates text between fixed language codes.
#[async_trait]
pub trait TranslationClient: Send + Sync {
    async fn translate(
        &self,
        text: &str,
        source: Option<&str>,
        target: &str,
    ) -> Result<String, ToolFailure>;
}

/// Runs free-form generation prompts.
#[async_trait]
pub trait GenerativeClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, ToolFailure>;
}

/// Map a transport-level reqwest error onto the failure taxonomy.
pub(crate) fn map_transport_error(err: reqwest::Error) -> ToolFailure {
    if err.is_timeout() {
        ToolFailure::Timeout
    } else {
        ToolFailure::TransportFailure(err.to_string())
    }
}

/// Map a non-success HTTP status onto the failure taxonomy. The response
/// body goes into the upstream detail so it reaches the logs but not the
/// caller.
pub(crate) fn map_status(status: reqwest::StatusCode, body: &str) -> ToolFailure {
    match status.as_u16() {
        401 | 403 => ToolFailure::Unauthorized,
        429 => ToolFailure::RateLimited,
        456 => ToolFailure::QuotaExceeded,
        _ => ToolFailure::UpstreamError {
            detail: format!("status {status}: {body}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            map_status(StatusCode::UNAUTHORIZED, ""),
            ToolFailure::Unauthorized
        ));
        assert!(matches!(
            map_status(StatusCode::TOO_MANY_REQUESTS, ""),
            ToolFailure::RateLimited
        ));
        assert!(matches!(
            map_status(StatusCode::from_u16(456).unwrap(), ""),
            ToolFailure::QuotaExceeded
        ));
        assert!(matches!(
            map_status(StatusCode::BAD_GATEWAY, "oops"),
            ToolFailure::UpstreamError { .. }
        ));
    }
}
