//! Shared utility functions for backend adapters.

use vr_domain::error::Error;

/// Convert a [`reqwest::Error`] into the domain [`Error`] type.
///
/// Timeout errors map to [`Error::Timeout`]; everything else maps to
/// [`Error::Http`]. The request URL is stripped first because it carries
/// the `?key=` credential.
pub(crate) fn from_reqwest(e: reqwest::Error) -> Error {
    let timeout = e.is_timeout();
    let message = e.without_url().to_string();
    if timeout {
        Error::Timeout(message)
    } else {
        Error::Http(message)
    }
}

/// Redact API key from URL for safe logging.
pub(crate) fn redact_url_key(url: &str) -> String {
    if let Some(idx) = url.find("key=") {
        let prefix = &url[..idx + 4];
        let rest = &url[idx + 4..];
        let end = rest.find('&').unwrap_or(rest.len());
        format!("{prefix}[REDACTED]{}", &rest[end..])
    } else {
        url.to_string()
    }
}

/// Cap diagnostic text from the backend so error messages stay readable.
pub(crate) fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let head: String = value.chars().take(max_chars).collect();
    format!("{head}…")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_key_query_param() {
        let url = "https://example.test/v1beta/models/m:generateContent?key=AIzaSECRET&alt=json";
        let redacted = redact_url_key(url);
        assert!(!redacted.contains("SECRET"));
        assert!(redacted.ends_with("key=[REDACTED]&alt=json"));
    }

    #[test]
    fn url_without_key_is_unchanged() {
        assert_eq!(redact_url_key("https://example.test/x"), "https://example.test/x");
    }

    #[test]
    fn truncate_keeps_short_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("abcdefghij", 4), "abcd…");
    }
}
