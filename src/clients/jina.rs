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

//! Jina Reader client for content fetch and web search.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::clients::{map_status, map_transport_error, ContentClient};
use crate::error::ToolFailure;

const READER_BASE: &str = "https://r.jina.ai/";
const SEARCH_BASE: &str = "https://s.jina.ai/";

pub struct JinaClient {
    http: reqwest::Client,
    api_key: String,
}

impl JinaClient {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, ToolFailure> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| ToolFailure::InternalUnexpected(err.to_string()))?;
        Ok(Self { http, api_key })
    }

    async fn read_response(
        &self,
        response: reqwest::Response,
    ) -> Result<String, ToolFailure> {
        let status = response.status();
        let body = response.text().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status(status, &body));
        }
        Ok(body)
    }
}

#[async_trait]
impl ContentClient for JinaClient {
    async fn fetch(&self, url: &str) -> Result<String, ToolFailure> {
        debug!(url, "fetching via jina reader");
        let response = self
            .http
            .get(format!("{READER_BASE}{url}"))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(map_transport_error)?;
        self.read_response(response).await
    }

    async fn search(&self, query: &str) -> Result<String, ToolFailure> {
        debug!(query, "searching via jina");
        let response = self
            .http
            .get(SEARCH_BASE)
            .query(&[("q", query)])
            .bearer_auth(&self.api_key)
            // Summaries only, skip full page bodies in search results.
            .header("X-Respond-With", "no-content")
            .send()
            .await
            .map_err(map_transport_error)?;
        self.read_response(response).await
    }
}
