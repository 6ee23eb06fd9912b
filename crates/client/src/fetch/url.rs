//! URL resolution for manifest paths and request identities.

use url::Url;

/// Error type for URL resolution failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Resolve a root- or base-relative path (or an absolute URL) against the
/// application's base URL.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Join against `base` (absolute inputs replace it)
/// 3. Reject anything that is not http(s)
/// 4. Remove fragment (#...), which never reaches the network
/// 5. Keep query string intact (do not reorder)
pub fn resolve(base: &Url, input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut resolved = base.join(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match resolved.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    resolved.set_fragment(None);

    Ok(resolved)
}

/// Whether two URLs share scheme, host and port.
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.origin() == b.origin()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("http://localhost:3000/").unwrap()
    }

    #[test]
    fn test_resolve_dot_relative() {
        let url = resolve(&base(), "./offline.html").unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/offline.html");
    }

    #[test]
    fn test_resolve_root() {
        let url = resolve(&base(), "./").unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/");
    }

    #[test]
    fn test_resolve_under_sub_path() {
        let base = Url::parse("https://reports.example.org/app/").unwrap();
        let url = resolve(&base, "./logo192.png").unwrap();
        assert_eq!(url.as_str(), "https://reports.example.org/app/logo192.png");

        let rooted = resolve(&base, "/favicon.ico").unwrap();
        assert_eq!(rooted.as_str(), "https://reports.example.org/favicon.ico");
    }

    #[test]
    fn test_resolve_absolute_passes_through() {
        let url = resolve(&base(), "https://cdn.example.com/font.woff2").unwrap();
        assert_eq!(url.host_str(), Some("cdn.example.com"));
    }

    #[test]
    fn test_resolve_removes_fragment_keeps_query() {
        let url = resolve(&base(), "/reports?month=2024-05#top").unwrap();
        assert_eq!(url.query(), Some("month=2024-05"));
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn test_resolve_trim_whitespace() {
        let url = resolve(&base(), "  /index.html  ").unwrap();
        assert_eq!(url.path(), "/index.html");
    }

    #[test]
    fn test_resolve_unsupported_scheme() {
        let result = resolve(&base(), "file:///etc/passwd");
        assert!(matches!(result, Err(UrlError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_resolve_empty() {
        assert!(matches!(resolve(&base(), ""), Err(UrlError::Empty)));
        assert!(matches!(resolve(&base(), "   "), Err(UrlError::Empty)));
    }

    #[test]
    fn test_same_origin() {
        let a = Url::parse("http://localhost:3000/index.html").unwrap();
        let b = Url::parse("http://localhost:3000/api/facilities").unwrap();
        let c = Url::parse("http://localhost:5000/index.html").unwrap();
        let d = Url::parse("https://localhost:3000/index.html").unwrap();
        assert!(same_origin(&a, &b));
        assert!(!same_origin(&a, &c));
        assert!(!same_origin(&a, &d));
    }
}
