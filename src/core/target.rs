// src/core/target.rs

use url::Url;

use crate::error::PostureError;

/// Turns user input (`example.com`, `https://Example.com/path`, ...) into the
/// bare lower-case host used for scanning and as the history key.
pub fn normalize_target(raw: &str) -> Result<String, PostureError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PostureError::InvalidTarget("site parameter is empty".to_string()));
    }

    let input_with_scheme = if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
        format!("https://{}", trimmed)
    } else {
        trimmed.to_string()
    };

    Url::parse(&input_with_scheme)
        .ok()
        .and_then(|url| url.host_str().map(str::to_lowercase))
        .filter(|host| !host.is_empty())
        .ok_or_else(|| PostureError::InvalidTarget(format!("'{}' does not contain a host", trimmed)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_host_is_kept() {
        assert_eq!(normalize_target("example.com").unwrap(), "example.com");
    }

    #[test]
    fn url_is_reduced_to_lowercase_host() {
        assert_eq!(normalize_target("  https://WWW.Example.com/login?x=1 ").unwrap(), "www.example.com");
        assert_eq!(normalize_target("http://example.com:8443").unwrap(), "example.com");
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(normalize_target("   "), Err(PostureError::InvalidTarget(_))));
    }

    #[test]
    fn hostless_input_is_rejected() {
        assert!(matches!(normalize_target("https://"), Err(PostureError::InvalidTarget(_))));
        assert!(matches!(normalize_target("exa mple.com"), Err(PostureError::InvalidTarget(_))));
    }
}
