//! URL validation and normalization utilities.

use log::warn;

use crate::config::MAX_URL_LENGTH;

/// Validates and normalizes a URL.
///
/// Adds https:// prefix if missing, then validates that the URL is
/// syntactically valid and uses http/https scheme. Rejects URLs longer than
/// `MAX_URL_LENGTH`. Logs a warning and returns None if the URL is invalid,
/// too long, or uses an unsupported scheme.
pub fn validate_and_normalize_url(url: &str) -> Option<String> {
    if url.len() > MAX_URL_LENGTH {
        warn!(
            "Rejecting URL exceeding maximum length ({} > {}): {}...",
            url.len(),
            MAX_URL_LENGTH,
            &url[..50.min(url.len())]
        );
        return None;
    }

    // Normalize: add https:// prefix if missing
    let normalized = if !url.starts_with("http://") && !url.starts_with("https://") {
        format!("https://{url}")
    } else {
        url.to_string()
    };

    if normalized.len() > MAX_URL_LENGTH {
        warn!(
            "Rejecting normalized URL exceeding maximum length ({} > {})",
            normalized.len(),
            MAX_URL_LENGTH,
        );
        return None;
    }

    // Validate: check syntax and scheme
    match url::Url::parse(&normalized) {
        Ok(parsed) => match parsed.scheme() {
            "http" | "https" => Some(normalized),
            _ => {
                warn!("Rejecting unsupported scheme for URL: {url}");
                None
            }
        },
        Err(_) => {
            warn!("Rejecting invalid URL: {url}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::validate_and_normalize_url;

    #[test]
    fn test_adds_https() {
        assert_eq!(
            validate_and_normalize_url("example.com"),
            Some("https://example.com".to_string())
        );
    }

    #[test]
    fn test_preserves_existing_scheme() {
        assert_eq!(
            validate_and_normalize_url("https://example.com"),
            Some("https://example.com".to_string())
        );
        assert_eq!(
            validate_and_normalize_url("http://example.com"),
            Some("http://example.com".to_string())
        );
    }

    #[test]
    fn test_rejects_invalid_url() {
        assert_eq!(validate_and_normalize_url("not a valid url!!!"), None);
        assert_eq!(validate_and_normalize_url(""), None);
    }

    #[test]
    fn test_preserves_path_and_query() {
        assert_eq!(
            validate_and_normalize_url("example.com/path?query=value"),
            Some("https://example.com/path?query=value".to_string())
        );
    }

    #[test]
    fn test_rejects_too_long_url() {
        let long_url = format!("https://example.com/{}", "a".repeat(2100));
        assert_eq!(validate_and_normalize_url(&long_url), None);
    }
}
