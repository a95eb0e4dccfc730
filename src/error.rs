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

//! Failure taxonomy for tool dispatch.
//!
//! Every tool invocation ends in either a raw upstream payload or one of
//! these failure kinds. Failures never cross the tool boundary as errors:
//! the dispatch layer converts them to user-facing text via
//! [`ToolFailure::user_message`], and the technical detail stays in the log.

use crate::validation::Rejection;
use thiserror::Error;

/// Outcome classification for a failed tool call.
#[derive(Debug, Clone, Error)]
pub enum ToolFailure {
    /// Input rejected before any network call was attempted.
    #[error("validation rejected: {0}")]
    ValidationRejected(#[from] Rejection),

    /// The outbound call exceeded its bounded timeout.
    #[error("upstream request timed out")]
    Timeout,

    /// Upstream returned 401 — the configured credential was refused.
    #[error("upstream rejected the configured credential")]
    Unauthorized,

    /// Upstream returned 429.
    #[error("rate limited by upstream")]
    RateLimited,

    /// Provider-specific quota exhaustion (e.g. DeepL 456).
    #[error("upstream quota exhausted")]
    QuotaExceeded,

    /// Any other non-2xx response.
    #[error("upstream API error: {detail}")]
    UpstreamError { detail: String },

    /// Connection-level failure before an HTTP status was received.
    #[error("transport failure: {0}")]
    TransportFailure(String),

    /// Catch-all for failures that should not happen.
    #[error("unexpected internal error: {0}")]
    InternalUnexpected(String),
}

impl ToolFailure {
    /// Human-readable error string returned to the caller.
    ///
    /// Names the failure kind in plain language sufficient to act on
    /// (retry later, fix input, configure a credential) without exposing
    /// stack traces or upstream response bodies.
    pub fn user_message(&self) -> String {
        match self {
            ToolFailure::ValidationRejected(rejection) => format!("Error: {rejection}"),
            ToolFailure::Timeout => {
                "Error: the upstream request timed out. Try again later.".to_string()
            }
            ToolFailure::Unauthorized => {
                "Error: the upstream API rejected the configured credential (unauthorized). \
                 Check the API key."
                    .to_string()
            }
            ToolFailure::RateLimited => {
                "Error: rate limited by the upstream API. Retry after a short wait.".to_string()
            }
            ToolFailure::QuotaExceeded => {
                "Error: the upstream API quota is exhausted for this billing period.".to_string()
            }
            ToolFailure::UpstreamError { .. } => {
                "Error: the upstream API returned an error. Try again later.".to_string()
            }
            ToolFailure::TransportFailure(_) => {
                "Error: could not reach the upstream API (connection failure).".to_string()
            }
            ToolFailure::InternalUnexpected(_) => {
                "Error: an unexpected internal error occurred.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_names_the_kind() {
        assert!(ToolFailure::Timeout.user_message().contains("timed out"));
        assert!(ToolFailure::RateLimited.user_message().contains("rate limited"));
        assert!(ToolFailure::QuotaExceeded.user_message().contains("quota"));
        assert!(ToolFailure::Unauthorized.user_message().contains("unauthorized"));
    }

    #[test]
    fn test_upstream_detail_not_leaked_to_user() {
        let failure = ToolFailure::UpstreamError {
            detail: "500 internal: secret backend trace".to_string(),
        };
        assert!(!failure.user_message().contains("secret backend trace"));
    }
}
