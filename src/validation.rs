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

//! Per-tool input validation.
//!
//! Validation is detected and reported before any network call. Ordinary,
//! expected rejections are values, not exceptions: every validator returns
//! `Result<(), Rejection>` and the dispatch layer chooses the response path
//! from the tag.

use regex::Regex;
use std::net::IpAddr;
use std::sync::OnceLock;
use thiserror::Error;
use url::Url;

/// Maximum accepted URL length.
pub const MAX_URL_LENGTH: usize = 2_000;
/// Maximum accepted search query length.
pub const MAX_QUERY_LENGTH: usize = 500;
/// Maximum text length for Gemini translation.
pub const MAX_TEXT_LENGTH_TRANSLATE: usize = 10_000;
/// Maximum text length for DeepL translation.
pub const MAX_TEXT_LENGTH_DEEPL: usize = 5_000;
/// Maximum prompt length for prompt optimization.
pub const MAX_PROMPT_LENGTH: usize = 5_000;

/// Terms that must not appear in free-text queries.
pub const BLOCKED_QUERY_TERMS: &[&str] = &["password", "api_key", "token", "secret", "private_key"];

/// Language codes accepted by the DeepL translation tool.
pub const SUPPORTED_LANGUAGE_CODES: &[&str] = &[
    "AR", "BG", "CS", "DA", "DE", "EL", "EN", "EN-GB", "EN-US", "ES", "ET", "FI", "FR", "HU",
    "ID", "IT", "JA", "KO", "LT", "LV", "NB", "NL", "PL", "PT-BR", "PT-PT", "RO", "RU", "SK",
    "SL", "SV", "TR", "UK", "ZH", "ZH-HANS", "ZH-HANT",
];

/// A named reason a request was rejected before reaching the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("URL resolves to a private or internal address: {0}")]
    PrivateAddress(String),

    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{field} too long: {len} characters (maximum: {max})")]
    TooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("query contains a blocked term: {0}")]
    BlockedTerm(String),

    #[error("invalid source language: {0}")]
    UnsupportedSourceLanguage(String),

    #[error("invalid target language: {0}")]
    UnsupportedTargetLanguage(String),

    #[error("source and target language are the same: {0}")]
    SameLanguage(String),

    #[error("{0} is not configured; this tool is disabled")]
    MissingCredential(&'static str),
}

fn internal_suffix_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)\.(local|internal)$").expect("valid suffix pattern"))
}

fn is_private_host(host: &str) -> bool {
    let host = host.trim_end_matches('.');

    if host.eq_ignore_ascii_case("localhost") {
        return true;
    }

    if let Ok(ip) = host.trim_matches(['[', ']']).parse::<IpAddr>() {
        return match ip {
            IpAddr::V4(v4) => v4.is_loopback() || v4.is_private() || v4.is_unspecified(),
            IpAddr::V6(v6) => v6.is_loopback() || v6.is_unspecified(),
        };
    }

    internal_suffix_pattern().is_match(host)
}

/// Validate that a URL is well-formed, http(s), and not aimed at a
/// loopback or private-network address.
pub fn validate_url(url: &str) -> Result<(), Rejection> {
    if url.trim().is_empty() {
        return Err(Rejection::Empty("url"));
    }
    if url.len() > MAX_URL_LENGTH {
        return Err(Rejection::TooLong {
            field: "url",
            len: url.len(),
            max: MAX_URL_LENGTH,
        });
    }

    let parsed = Url::parse(url).map_err(|e| Rejection::InvalidUrl(format!("{url} ({e})")))?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(Rejection::InvalidUrl(format!(
                "unsupported scheme '{other}' (only http and https are allowed)"
            )))
        }
    }

    let host = parsed
        .host_str()
        .ok_or_else(|| Rejection::InvalidUrl(format!("{url} (missing host)")))?;

    if is_private_host(host) {
        return Err(Rejection::PrivateAddress(host.to_string()));
    }

    Ok(())
}

/// Validate a free-text search query: non-empty, bounded, no blocked terms.
pub fn validate_query(query: &str) -> Result<(), Rejection> {
    validate_free_text(query, "query", MAX_QUERY_LENGTH)
}

/// Validate a prompt submitted for optimization.
pub fn validate_prompt(prompt: &str) -> Result<(), Rejection> {
    validate_free_text(prompt, "prompt", MAX_PROMPT_LENGTH)
}

fn validate_free_text(text: &str, field: &'static str, max: usize) -> Result<(), Rejection> {
    if text.trim().is_empty() {
        return Err(Rejection::Empty(field));
    }
    if text.len() > max {
        return Err(Rejection::TooLong {
            field,
            len: text.len(),
            max,
        });
    }

    let lowered = text.to_lowercase();
    for term in BLOCKED_QUERY_TERMS {
        if lowered.contains(term) {
            return Err(Rejection::BlockedTerm((*term).to_string()));
        }
    }

    Ok(())
}

/// Validate a text body for translation. Blocked terms do not apply here:
/// translating a document that mentions "password" is legitimate.
pub fn validate_translation_text(text: &str, max: usize) -> Result<(), Rejection> {
    if text.trim().is_empty() {
        return Err(Rejection::Empty("text"));
    }
    if text.len() > max {
        return Err(Rejection::TooLong {
            field: "text",
            len: text.len(),
            max,
        });
    }
    Ok(())
}

/// Case-insensitive membership in the supported DeepL code set.
pub fn validate_language_code(code: &str) -> bool {
    let upper = code.to_ascii_uppercase();
    SUPPORTED_LANGUAGE_CODES.contains(&upper.as_str())
}

/// Validate a DeepL language pair. The source is optional (auto-detect);
/// when both codes are explicit, a pair translating a language onto itself
/// is rejected.
pub fn validate_language_pair(source: Option<&str>, target: &str) -> Result<(), Rejection> {
    if !validate_language_code(target) {
        return Err(Rejection::UnsupportedTargetLanguage(target.to_string()));
    }

    if let Some(source) = source {
        if !validate_language_code(source) {
            return Err(Rejection::UnsupportedSourceLanguage(source.to_string()));
        }
        if source.eq_ignore_ascii_case(target) {
            return Err(Rejection::SameLanguage(source.to_ascii_uppercase()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url_accepts_public_https() {
        assert!(validate_url("https://example.com/path?q=1").is_ok());
        assert!(validate_url("http://example.com").is_ok());
    }

    #[test]
    fn test_validate_url_rejects_malformed() {
        assert!(matches!(
            validate_url("not-a-url"),
            Err(Rejection::InvalidUrl(_))
        ));
        assert!(matches!(validate_url(""), Err(Rejection::Empty(_))));
    }

    #[test]
    fn test_validate_url_rejects_non_http_scheme() {
        assert!(matches!(
            validate_url("ftp://x.com"),
            Err(Rejection::InvalidUrl(_))
        ));
        assert!(matches!(
            validate_url("file:///etc/passwd"),
            Err(Rejection::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_validate_url_rejects_private_addresses() {
        for url in [
            "http://127.0.0.1",
            "http://localhost:8080/x",
            "http://0.0.0.0",
            "http://10.1.2.3/admin",
            "http://172.16.0.1",
            "http://192.168.1.1",
            "http://db.internal/query",
            "http://printer.local",
            "http://[::1]/",
        ] {
            assert!(
                matches!(validate_url(url), Err(Rejection::PrivateAddress(_))),
                "expected private rejection for {url}"
            );
        }
    }

    #[test]
    fn test_validate_url_length_limit() {
        let url = format!("https://example.com/{}", "a".repeat(MAX_URL_LENGTH));
        assert!(matches!(
            validate_url(&url),
            Err(Rejection::TooLong { field: "url", .. })
        ));
    }

    #[test]
    fn test_validate_query_blocked_terms() {
        assert!(validate_query("rust async runtime comparison").is_ok());
        assert!(matches!(
            validate_query("show me the admin PASSWORD"),
            Err(Rejection::BlockedTerm(_))
        ));
        assert!(matches!(
            validate_query("leaked api_key list"),
            Err(Rejection::BlockedTerm(_))
        ));
    }

    #[test]
    fn test_validate_query_empty_and_length() {
        assert!(matches!(validate_query("   "), Err(Rejection::Empty(_))));
        assert!(matches!(
            validate_query(&"x".repeat(MAX_QUERY_LENGTH + 1)),
            Err(Rejection::TooLong { .. })
        ));
    }

    #[test]
    fn test_validate_language_code_case_insensitive() {
        assert!(validate_language_code("PT-BR"));
        assert!(validate_language_code("pt-br"));
        assert!(validate_language_code("de"));
        assert!(!validate_language_code("XX"));
        assert!(!validate_language_code(""));
    }

    #[test]
    fn test_validate_language_pair() {
        assert!(validate_language_pair(Some("EN"), "PT-BR").is_ok());
        assert!(validate_language_pair(None, "DE").is_ok());
        assert!(matches!(
            validate_language_pair(Some("INVALID"), "DE"),
            Err(Rejection::UnsupportedSourceLanguage(_))
        ));
        assert!(matches!(
            validate_language_pair(Some("EN"), "YY"),
            Err(Rejection::UnsupportedTargetLanguage(_))
        ));
        assert!(matches!(
            validate_language_pair(Some("de"), "DE"),
            Err(Rejection::SameLanguage(_))
        ));
    }

    #[test]
    fn test_translation_text_allows_blocked_terms() {
        assert!(validate_translation_text("my password is strong", MAX_TEXT_LENGTH_DEEPL).is_ok());
        assert!(matches!(
            validate_translation_text("", MAX_TEXT_LENGTH_DEEPL),
            Err(Rejection::Empty(_))
        ));
    }
}
