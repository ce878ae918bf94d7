use regex::Regex;
use std::sync::LazyLock;

/// The portal renders its token as `<input ... name='csrfmiddlewaretoken' value='...'>`.
/// If this stops matching, the upstream markup changed.
pub const CSRF_TOKEN_PATTERN: &str = "csrfmiddlewaretoken' value='(.*?)'";

/// First `<table ...>` through the nearest `</table>`, across lines.
pub const TABLE_PATTERN: &str = "(?s)<table.*?</table>";

static CSRF_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(CSRF_TOKEN_PATTERN).expect("valid csrf token pattern"));

static TABLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(TABLE_PATTERN).expect("valid table pattern"));

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Page not recognized: no csrf token at {0}")]
    PageNotRecognized(String),
}

pub fn extract_csrf_token(html: &str, url: &str) -> Result<String, ParseError> {
    CSRF_TOKEN_RE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| ParseError::PageNotRecognized(url.to_string()))
}

pub fn extract_table(html: &str) -> Option<&str> {
    TABLE_RE.find(html).map(|m| m.as_str())
}
