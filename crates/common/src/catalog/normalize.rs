//! Field normalization shared by every source
//!
//! None of these functions fail: bad input falls back to a safe value.

use sha2::{Digest, Sha256};
use tracing::debug;
use url::Url;

/// Prefix of ids built without hashing
pub const FALLBACK_ID_PREFIX: &str = "url-";

/// Length of a derived id in hex characters
pub const ID_HEX_LEN: usize = 40;

/// Query parameters that carry the destination of a search redirect
const REDIRECT_PARAMS: &[&str] = &["q", "url"];

/// Trimmed value, or `None` when empty
pub fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn is_search_engine_host(host: &str) -> bool {
    let host = host.trim_start_matches("www.");
    host.split('.').next() == Some("google")
}

fn is_web_url(candidate: &str) -> bool {
    Url::parse(candidate)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Unwrap a search-engine redirect (`https://www.google.com/url?q=<dest>`)
/// to its destination. Anything else is returned trimmed and unchanged.
pub fn unwrap_search_url(raw: &str) -> String {
    let raw = raw.trim();
    let Ok(parsed) = Url::parse(raw) else {
        return raw.to_string();
    };

    if !parsed.host_str().map(is_search_engine_host).unwrap_or(false) {
        return raw.to_string();
    }

    REDIRECT_PARAMS
        .iter()
        .find_map(|param| {
            parsed
                .query_pairs()
                .filter(|(key, _)| key.as_ref() == *param)
                .map(|(_, value)| value.into_owned())
                .find(|inner| is_web_url(inner))
        })
        .unwrap_or_else(|| raw.to_string())
}

/// Relative covers (`/images/x.png`) only resolve on the original host, so
/// they are dropped along with empty values.
pub fn clean_cover(raw: Option<&str>) -> String {
    match non_empty(raw) {
        Some(cover) if !cover.starts_with('/') => cover,
        _ => String::new(),
    }
}

/// Content-addressed id: first 20 bytes of SHA-256 over the URL, hex encoded
pub fn derive_id(drive_url: &str) -> String {
    let digest = Sha256::digest(drive_url.as_bytes());
    let mut buf = [0u8; ID_HEX_LEN];
    match hex::encode_to_slice(&digest[..ID_HEX_LEN / 2], &mut buf) {
        Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
        Err(e) => {
            debug!(error = %e, "Id hashing failed, using literal id");
            fallback_id(drive_url)
        }
    }
}

/// Id built from the URL literal, used when hashing is not an option
pub fn fallback_id(drive_url: &str) -> String {
    format!("{}{}", FALLBACK_ID_PREFIX, urlencoding::encode(drive_url))
}

/// Composite dedupe key. The separator cannot appear in a trimmed title or URL.
pub fn dedupe_key(drive_url: &str, title: &str) -> String {
    format!("{}\u{1f}{}", drive_url, title)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unwrap_google_redirect() {
        let wrapped = "https://www.google.com/url?sa=t&q=https%3A%2F%2Fdrive.google.com%2Ffile%2Fd%2Fabc%2Fview&usg=xyz";
        assert_eq!(
            unwrap_search_url(wrapped),
            "https://drive.google.com/file/d/abc/view"
        );
    }

    #[test]
    fn test_unwrap_regional_google_and_url_param() {
        let wrapped = "https://google.co.in/url?url=https://example.org/book.pdf";
        assert_eq!(unwrap_search_url(wrapped), "https://example.org/book.pdf");
    }

    #[test]
    fn test_unwrap_skips_empty_q_for_url_param() {
        assert_eq!(
            unwrap_search_url("https://www.google.com/url?q=&url=https://example.org/a.pdf"),
            "https://example.org/a.pdf"
        );
        assert_eq!(
            unwrap_search_url("https://www.google.com/url?q=books&url=ftp://example.org/a.pdf"),
            "https://www.google.com/url?q=books&url=ftp://example.org/a.pdf"
        );
    }

    #[test]
    fn test_plain_and_drive_urls_pass_through() {
        let drive = "https://drive.google.com/file/d/abc/view?usp=sharing";
        assert_eq!(unwrap_search_url(drive), drive);
        assert_eq!(unwrap_search_url("  https://example.org/a.pdf "), "https://example.org/a.pdf");
    }

    #[test]
    fn test_search_query_that_is_not_a_url_passes_through() {
        let search = "https://www.google.com/search?q=operating+systems+pdf";
        assert_eq!(unwrap_search_url(search), search);
    }

    #[test]
    fn test_malformed_url_passes_through() {
        assert_eq!(unwrap_search_url("not a url"), "not a url");
        assert_eq!(unwrap_search_url("http://[::1"), "http://[::1");
        assert_eq!(unwrap_search_url(""), "");
    }

    #[test]
    fn test_clean_cover() {
        assert_eq!(clean_cover(Some("/images/os.png")), "");
        assert_eq!(clean_cover(Some("  ")), "");
        assert_eq!(clean_cover(None), "");
        assert_eq!(
            clean_cover(Some("https://covers.example.org/os.png")),
            "https://covers.example.org/os.png"
        );
    }

    #[test]
    fn test_derive_id_is_stable() {
        let a = derive_id("https://drive.google.com/file/d/abc/view");
        let b = derive_id("https://drive.google.com/file/d/abc/view");
        let c = derive_id("https://drive.google.com/file/d/def/view");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), ID_HEX_LEN);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_fallback_id() {
        assert_eq!(
            fallback_id("https://a.org/x y"),
            "url-https%3A%2F%2Fa.org%2Fx%20y"
        );
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(Some("  Galvin ")), Some("Galvin".to_string()));
        assert_eq!(non_empty(Some("   ")), None);
        assert_eq!(non_empty(None), None);
    }
}
