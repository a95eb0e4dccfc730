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

//! DeepL REST client.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::clients::{map_status, map_transport_error, TranslationClient};
use crate::error::ToolFailure;

pub const DEFAULT_API_URL: &str = "https://api-free.deepl.com/v2/translate";

pub struct DeepLClient {
    http: reqwest::Client,
    api_key: String,
    api_url: String,
}

#[derive(Deserialize)]
struct TranslateResponse {
    translations: Vec<Translation>,
}

#[derive(Deserialize)]
struct Translation {
    text: String,
}

impl DeepLClient {
    pub fn new(
        api_key: String,
        api_url: String,
        timeout: Duration,
    ) -> Result<Self, ToolFailure> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| ToolFailure::InternalUnexpected(err.to_string()))?;
        Ok(Self {
            http,
            api_key,
            api_url,
        })
    }
}

#[async_trait]
impl TranslationClient for DeepLClient {
    async fn translate(
        &self,
        text: &str,
        source: Option<&str>,
        target: &str,
    ) -> Result<String, ToolFailure> {
        debug!(target, "deepl translation request");
        let target = target.to_uppercase();
        let mut form = vec![
            ("auth_key", self.api_key.clone()),
            ("text", text.to_string()),
            ("target_lang", target),
        ];
        if let Some(source) = source {
            form.push(("source_lang", source.to_uppercase()));
        }

        let response = self
            .http
            .post(&self.api_url)
            .form(&form)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_status(status, &body));
        }

        let parsed: TranslateResponse = response
            .json()
            .await
            .map_err(|err| ToolFailure::UpstreamError {
                detail: format!("malformed response: {err}"),
            })?;
        parsed
            .translations
            .into_iter()
            .next()
            .map(|translation| translation.text)
            .ok_or_else(|| ToolFailure::UpstreamError {
                detail: "response contained no translations".to_string(),
            })
    }
}
