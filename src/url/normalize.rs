//! Resolution of hrefs and image sources found on rendered pages

use crate::{UrlError, UrlResult};
use url::Url;

/// Parses an absolute URL
pub fn parse_absolute(url: &str) -> UrlResult<Url> {
    Url::parse(url).map_err(|e| UrlError::Parse(format!("{}: {}", url, e)))
}

/// Resolves a configured URL that may be relative to the course base URL
pub fn resolve_against_base(base_url: &str, url: &str) -> UrlResult<Url> {
    let base = parse_absolute(base_url)?;
    base.join(url)
        .map_err(|e| UrlError::Parse(format!("{}: {}", url, e)))
}

/// Resolves an anchor href to an absolute HTTP(S) URL
///
/// Returns None for links that can never be unit pages:
/// - `javascript:`, `mailto:`, `tel:` and `data:` schemes
/// - fragment-only links
/// - hrefs that fail to resolve or resolve to a non-HTTP scheme
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute) if absolute.scheme() == "http" || absolute.scheme() == "https" => {
            Some(absolute)
        }
        _ => None,
    }
}

/// Turns an image `src` into an absolute URL
///
/// Data URLs are returned unchanged. Protocol-relative sources get `https:`.
/// Anything unresolvable is returned as-is so the document keeps its reference.
pub fn absolutize_image_src(src: &str, page_url: &Url) -> String {
    let src = src.trim();

    if is_data_url(src) {
        return src.to_string();
    }

    if let Some(rest) = src.strip_prefix("//") {
        return format!("https://{}", rest);
    }

    match page_url.join(src) {
        Ok(absolute) => absolute.to_string(),
        Err(_) => src.to_string(),
    }
}

/// Returns true for inline `data:` URLs
pub fn is_data_url(src: &str) -> bool {
    src.as_bytes()
        .get(..5)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(b"data:"))
}
