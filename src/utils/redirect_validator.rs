use log::{debug, warn};

/// Longest post-login redirect target accepted
pub const MAX_REDIRECT_LEN: usize = 2048;

// Encoded forms that decode to a scheme-relative or backslash path
const DANGEROUS_ENCODINGS: &[&str] = &["%2f", "%5c", "%00", "%0a", "%0d", "%09"];

/// Validate a post-authentication redirect target
///
/// Only same-origin relative paths survive: a single leading `/`, no scheme,
/// no backslash, no control characters, no path traversal and no encoded
/// separators. Anything else is dropped rather than rejected so the login
/// itself still succeeds.
#[must_use]
pub fn sanitize_redirect(redirect_url: &str) -> Option<String> {
    debug!("Validating post-authentication redirect URL ({} chars)", redirect_url.len());

    if redirect_url.is_empty() {
        return None;
    }

    if redirect_url.len() > MAX_REDIRECT_LEN {
        warn!("Excessively long redirect URL: {} characters", redirect_url.len());
        return None;
    }

    if !is_relative_url(redirect_url) {
        warn!("Dropping non-relative redirect target");
        return None;
    }

    if has_suspicious_patterns(redirect_url) {
        warn!("Dropping suspicious redirect target");
        return None;
    }

    Some(redirect_url.to_string())
}

/// Check if URL is relative (starts with /, not //, and has no scheme)
fn is_relative_url(url: &str) -> bool {
    url.starts_with('/') && !url.starts_with("//") && !url.contains(':')
}

fn has_suspicious_patterns(url: &str) -> bool {
    if url.chars().any(char::is_control) || url.contains('\\') || url.contains("..") {
        return true;
    }

    let lower = url.to_ascii_lowercase();
    DANGEROUS_ENCODINGS
        .iter()
        .any(|pattern| lower.contains(pattern))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legitimate_post_auth_redirects() {
        for url in ["/", "/dashboard", "/app/settings?tab=profile", "/search?q=rust#top"] {
            assert_eq!(sanitize_redirect(url).as_deref(), Some(url), "{url}");
        }
    }

    #[test]
    fn test_post_auth_open_redirects_blocked() {
        for url in [
            "https://evil.example",
            "//evil.example",
            "evil.example/path",
            "javascript:alert(1)",
            "/\\evil.example",
        ] {
            assert_eq!(sanitize_redirect(url), None, "{url}");
        }
    }

    #[test]
    fn test_post_auth_path_traversal_blocked() {
        assert_eq!(sanitize_redirect("/../../etc/passwd"), None);
        assert_eq!(sanitize_redirect("/app/../admin"), None);
    }

    #[test]
    fn test_post_auth_encoded_attacks_blocked() {
        for url in ["/%2F%2Fevil.example", "/%5cevil.example", "/path%0d%0aSet-Cookie:x", "/a%00b"] {
            assert_eq!(sanitize_redirect(url), None, "{url}");
        }
    }

    #[test]
    fn test_post_auth_control_characters_blocked() {
        assert_eq!(sanitize_redirect("/path\nnext"), None);
        assert_eq!(sanitize_redirect("/path\t"), None);
    }

    #[test]
    fn test_post_auth_long_redirect_blocked() {
        let long = format!("/{}", "a".repeat(MAX_REDIRECT_LEN));
        assert_eq!(sanitize_redirect(&long), None);
        assert_eq!(sanitize_redirect(""), None);
    }
}
