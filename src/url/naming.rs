//! Names derived from URLs and titles
//!
//! Module titles and archive filenames are pure functions of URL segments and
//! titles, so a re-crawl always lands on the same paths.

use url::Url;

const MAX_FILENAME_CHARS: usize = 100;

/// Characters that are not portable in filenames
const RESERVED_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Makes a title safe to use as a file or directory name
///
/// Reserved characters become `-`, whitespace runs become `_`, and the result
/// is truncated to 100 characters.
pub fn clean_filename(name: &str) -> String {
    let mut cleaned = String::with_capacity(name.len());
    let mut in_whitespace = false;

    for c in name.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                cleaned.push('_');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;

        if RESERVED_CHARS.contains(&c) {
            cleaned.push('-');
        } else {
            cleaned.push(c);
        }
    }

    cleaned.chars().take(MAX_FILENAME_CHARS).collect()
}

/// Returns the path segment that follows `marker` in a URL path
///
/// ```
/// use learn_archiver::url::module_slug;
/// use url::Url;
///
/// let url = Url::parse("https://learn.microsoft.com/en-us/training/modules/tour-azure-portal/2-azure-management/").unwrap();
/// assert_eq!(module_slug(&url, "modules"), Some("tour-azure-portal".to_string()));
/// ```
pub fn module_slug(url: &Url, marker: &str) -> Option<String> {
    let mut segments = url.path_segments()?;
    segments.find(|segment| *segment == marker)?;
    segments
        .next()
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
}

/// Derives a display title from a dashed URL slug
///
/// Dashes become spaces and each word is capitalised: `configure-vnet-peering`
/// becomes `Configure Vnet Peering`.
pub fn title_from_slug(slug: &str) -> String {
    slug.split('-')
        .filter(|word| !word.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Derives a unit title from the last non-empty path segment of its URL
pub fn unit_title_from_url(url: &Url) -> String {
    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last().map(str::to_string))
        .map(|slug| title_from_slug(&slug))
        .unwrap_or_else(|| url.to_string())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_filename() {
        assert_eq!(
            clean_filename("AZ-104: Prerequisites for Azure administrators"),
            "AZ-104-_Prerequisites_for_Azure_administrators"
        );
        assert_eq!(clean_filename("a/b\\c|d?e*f"), "a-b-c-d-e-f");
        assert_eq!(clean_filename("spaced   out\ttitle"), "spaced_out_title");
    }

    #[test]
    fn test_clean_filename_truncates() {
        let long = "x".repeat(150);
        assert_eq!(clean_filename(&long).chars().count(), 100);
    }

    #[test]
    fn test_module_slug() {
        let url = Url::parse(
            "https://learn.microsoft.com/en-us/training/modules/configure-vnet-peering/3-determine/?ns-enrollment-type=learningpath",
        )
        .unwrap();
        assert_eq!(
            module_slug(&url, "modules"),
            Some("configure-vnet-peering".to_string())
        );

        let trailing = Url::parse("https://learn.microsoft.com/en-us/training/modules/").unwrap();
        assert_eq!(module_slug(&trailing, "modules"), None);

        let other = Url::parse("https://learn.microsoft.com/en-us/training/paths/x/").unwrap();
        assert_eq!(module_slug(&other, "modules"), None);
    }

    #[test]
    fn test_title_from_slug() {
        assert_eq!(
            title_from_slug("configure-vnet-peering"),
            "Configure Vnet Peering"
        );
        assert_eq!(
            title_from_slug("create-azure-resource-manager-template-vs-code"),
            "Create Azure Resource Manager Template Vs Code"
        );
        assert_eq!(title_from_slug("RBAC"), "Rbac");
    }

    #[test]
    fn test_unit_title_from_url() {
        let url = Url::parse(
            "https://learn.microsoft.com/en-us/training/modules/tour-azure-portal/2-azure-management/?ns=1",
        )
        .unwrap();
        assert_eq!(unit_title_from_url(&url), "2 Azure Management");
    }
}
