//! Asset filename scheme
//!
//! `<original-stem-or-"image">_<8 hex chars of SHA-256(url)><ext>`. The hash is
//! taken over the URL string, not the bytes, so a URL always maps to the same
//! file across runs and two URLs sharing a base name never collide.

use crate::url::clean_filename;
use sha2::{Digest, Sha256};
use url::Url;

const DEFAULT_STEM: &str = "image";
const DEFAULT_EXTENSION: &str = ".png";
const HASH_CHARS: usize = 8;

/// Computes the local filename for a remote asset URL
pub fn asset_filename(remote_url: &str) -> String {
    let name = base_name(remote_url);
    let (stem, extension) = split_extension(&name);

    let stem = if stem.is_empty() {
        DEFAULT_STEM.to_string()
    } else {
        clean_filename(stem)
    };
    let extension = extension.unwrap_or(DEFAULT_EXTENSION);

    format!("{}_{}{}", stem, url_hash(remote_url), extension)
}

/// Short deterministic hash of the URL string
pub fn url_hash(remote_url: &str) -> String {
    let digest = Sha256::digest(remote_url.as_bytes());
    let mut encoded = hex::encode(digest);
    encoded.truncate(HASH_CHARS);
    encoded
}

/// Last non-empty path segment of the URL, ignoring query and fragment
fn base_name(remote_url: &str) -> String {
    if let Ok(parsed) = Url::parse(remote_url) {
        return parsed
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last().map(str::to_string))
            .unwrap_or_default();
    }

    let path = remote_url
        .split(|c| c == '?' || c == '#')
        .next()
        .unwrap_or_default();
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Splits `name` into stem and `.ext`; a leading dot does not start an extension
fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(index) if index > 0 && index + 1 < name.len() => {
            (&name[..index], Some(&name[index..]))
        }
        _ => (name, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_keeps_stem_and_extension() {
        let name = asset_filename("https://learn.microsoft.com/media/azure-portal.png");
        assert!(name.starts_with("azure-portal_"));
        assert!(name.ends_with(".png"));
        assert_eq!(name.len(), "azure-portal_".len() + 8 + ".png".len());
    }

    #[test]
    fn test_filename_defaults() {
        let no_ext = asset_filename("https://learn.microsoft.com/media/diagram");
        assert!(no_ext.starts_with("diagram_"));
        assert!(no_ext.ends_with(".png"));

        let no_name = asset_filename("https://learn.microsoft.com/");
        assert!(no_name.starts_with("image_"));
        assert!(no_name.ends_with(".png"));
    }

    #[test]
    fn test_query_does_not_leak_into_extension() {
        let name = asset_filename("https://cdn.example.com/a/photo.jpg?width=800");
        assert!(name.starts_with("photo_"));
        assert!(name.ends_with(".jpg"));
    }

    #[test]
    fn test_same_base_name_different_urls_do_not_collide() {
        let a = asset_filename("https://learn.microsoft.com/module-a/media/overview.png");
        let b = asset_filename("https://learn.microsoft.com/module-b/media/overview.png");
        assert_ne!(a, b);
    }

    #[test]
    fn test_filename_is_deterministic() {
        let url = "https://learn.microsoft.com/media/x.svg";
        assert_eq!(asset_filename(url), asset_filename(url));
        assert_eq!(url_hash(url).len(), 8);
        assert!(url_hash(url).chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("a.tar.gz"), ("a.tar", Some(".gz")));
        assert_eq!(split_extension(".hidden"), (".hidden", None));
        assert_eq!(split_extension("trailing."), ("trailing.", None));
        assert_eq!(split_extension("plain"), ("plain", None));
    }
}
