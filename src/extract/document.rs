//! Unit and error document templates

use crate::structure::ASSET_LINK_PREFIX;
use html_escape::{encode_double_quoted_attribute, encode_text};

/// Opening tag of the secondary-rendition block; external tooling finds and
/// replaces the block by this marker
pub const TRANSLATION_PLACEHOLDER_MARKER: &str = r#"<div class="translation-placeholder">"#;

pub const SOURCE_INFO_MARKER: &str = r#"<div class="source-info">"#;
pub const MAIN_CONTENT_MARKER: &str = r#"<div class="main-content">"#;

const STYLESHEET: &str = "styles.css";

/// Metadata rendered into the source-attribution block
#[derive(Debug, Clone, Copy)]
pub struct UnitDocument<'a> {
    pub page_title: &'a str,
    pub unit_title: &'a str,
    pub unit_url: &'a str,
    pub course_title: &'a str,
}

impl UnitDocument<'_> {
    /// Wraps a sanitized content fragment in the archive template
    pub fn render(&self, fragment: &str) -> String {
        let page_title = if self.page_title.trim().is_empty() {
            self.unit_title
        } else {
            self.page_title
        };
        let url_attr = encode_double_quoted_attribute(self.unit_url);

        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{page_title}</title>
    <link rel="stylesheet" href="{prefix}{stylesheet}">
</head>
<body>
    {source_info}
        <h2>Course Information</h2>
        <p><strong>Unit:</strong> {unit_title}</p>
        <p><strong>Source:</strong> <a href="{url_attr}" target="_blank">{url_text}</a></p>
        <p><strong>Course:</strong> {course_title}</p>
    </div>

    {main_content}
{fragment}
    </div>

    {placeholder}
        <h2>Translation</h2>
        <p><em>Translation will be added here...</em></p>
    </div>
</body>
</html>
"#,
            page_title = encode_text(page_title),
            prefix = ASSET_LINK_PREFIX,
            stylesheet = STYLESHEET,
            source_info = SOURCE_INFO_MARKER,
            unit_title = encode_text(self.unit_title),
            url_attr = url_attr,
            url_text = encode_text(self.unit_url),
            course_title = encode_text(self.course_title),
            main_content = MAIN_CONTENT_MARKER,
            fragment = fragment,
            placeholder = TRANSLATION_PLACEHOLDER_MARKER,
        )
    }
}

/// Minimal document recording why a unit could not be archived
pub fn error_document(unit_url: &str, reason: &str) -> String {
    let reason = if reason.trim().is_empty() {
        "Unknown error"
    } else {
        reason
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Error</title></head>
<body>
    <h1>Error Extracting Content</h1>
    <p>Could not extract content from: <a href="{url_attr}">{url_text}</a></p>
    <p>Error: {reason}</p>
</body>
</html>
"#,
        url_attr = encode_double_quoted_attribute(unit_url),
        url_text = encode_text(unit_url),
        reason = encode_text(reason),
    )
}

/// Whether `document` was produced by [`error_document`]
pub fn is_error_document(document: &str) -> bool {
    document.contains("<h1>Error Extracting Content</h1>")
}
