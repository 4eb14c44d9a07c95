//! Generic tree transforms driven by the selector tables
//!
//! `scraper::Html` is not `Send`, so the tree never lives across an await:
//! `prepare_content` is one synchronous pass (locate, sanitize, list images,
//! serialize) and `rewrite_images` is a second one once the asset links are
//! known.

use crate::extract::rules::ExtractionRules;
use ego_tree::{NodeId, NodeRef};
use html_escape::{encode_double_quoted_attribute, encode_text};
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::HashMap;

pub const DEFAULT_IMAGE_ALT: &str = "Course content image";

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script", "style", "xmp", "iframe", "noembed", "noframes", "noscript",
];

/// Sanitized main content, before image rewriting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedContent {
    /// Inner HTML of the main content node
    pub fragment: String,
    /// Raw `src` values of every remaining image, in document order, deduplicated
    pub image_sources: Vec<String>,
    /// Number of nodes removed by the denylist
    pub removed: usize,
}

/// Locates the main content node and strips denylisted nodes from it
///
/// Returns `None` when no main content selector matches.
pub fn prepare_content(page_html: &str, rules: &ExtractionRules) -> Option<PreparedContent> {
    let mut document = Html::parse_document(page_html);

    let main_id = find_first(&document, rules.main_content())?.id();
    let removed = remove_matching(&mut document, main_id, rules.remove());

    let main = document.tree.get(main_id).and_then(ElementRef::wrap)?;
    let image_sources = image_sources(main);

    let mut fragment = String::new();
    for child in main.children() {
        write_node(child, None, &mut fragment);
    }

    Some(PreparedContent {
        fragment,
        image_sources,
        removed,
    })
}

/// First element matching the highest-priority selector that matches at all
pub fn find_first<'a>(document: &'a Html, selectors: &[Selector]) -> Option<ElementRef<'a>> {
    selectors
        .iter()
        .find_map(|selector| document.select(selector).next())
}

/// Detaches every descendant of `scope` matching any of `selectors`
///
/// # Returns
/// The number of matched nodes (nested matches are counted individually)
pub fn remove_matching(document: &mut Html, scope: NodeId, selectors: &[Selector]) -> usize {
    let doomed: Vec<NodeId> = match document.tree.get(scope).and_then(ElementRef::wrap) {
        Some(scope) => selectors
            .iter()
            .flat_map(|selector| scope.select(selector))
            .map(|element| element.id())
            .collect(),
        None => return 0,
    };

    for id in &doomed {
        if let Some(mut node) = document.tree.get_mut(*id) {
            node.detach();
        }
    }

    doomed.len()
}

/// Re-serializes `fragment` with every image pointed at its local link
///
/// `links` maps raw `src` values to replacements; sources without an entry
/// are kept. Missing `alt` text gets a generic description and every image
/// is marked for lazy loading.
pub fn rewrite_images(fragment: &str, links: &HashMap<String, String>) -> String {
    let parsed = Html::parse_fragment(fragment);
    let mut out = String::with_capacity(fragment.len());

    for child in parsed.root_element().children() {
        write_node(child, Some(links), &mut out);
    }

    out
}

fn image_sources(root: ElementRef<'_>) -> Vec<String> {
    let mut sources: Vec<String> = Vec::new();

    for node in root.descendants() {
        let src = node
            .value()
            .as_element()
            .filter(|element| element.name() == "img")
            .and_then(|element| element.attr("src"));

        if let Some(src) = src {
            if !src.is_empty() && !sources.iter().any(|known| known == src) {
                sources.push(src.to_string());
            }
        }
    }

    sources
}

fn write_node(node: NodeRef<'_, Node>, links: Option<&HashMap<String, String>>, out: &mut String) {
    match node.value() {
        Node::Text(text) => {
            let text: &str = text;
            if in_raw_text_element(node) {
                out.push_str(text);
            } else {
                out.push_str(&encode_text(text));
            }
        }
        Node::Comment(comment) => {
            let comment: &str = comment;
            out.push_str("<!--");
            out.push_str(comment);
            out.push_str("-->");
        }
        Node::Element(element) => {
            let name = element.name();
            let mut attrs: Vec<(String, String)> = element
                .attrs()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect();

            if name == "img" {
                if let Some(links) = links {
                    rewrite_image_attrs(&mut attrs, links);
                }
            }
            // Attribute storage order is not stable across parses
            attrs.sort();

            out.push('<');
            out.push_str(name);
            for (key, value) in &attrs {
                out.push(' ');
                out.push_str(key);
                out.push_str("=\"");
                out.push_str(&encode_double_quoted_attribute(value));
                out.push('"');
            }
            out.push('>');

            if VOID_ELEMENTS.contains(&name) {
                return;
            }

            for child in node.children() {
                write_node(child, links, out);
            }

            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
        _ => {
            for child in node.children() {
                write_node(child, links, out);
            }
        }
    }
}

fn in_raw_text_element(node: NodeRef<'_, Node>) -> bool {
    node.parent()
        .and_then(|parent| {
            parent
                .value()
                .as_element()
                .map(|element| RAW_TEXT_ELEMENTS.contains(&element.name()))
        })
        .unwrap_or(false)
}

fn rewrite_image_attrs(attrs: &mut Vec<(String, String)>, links: &HashMap<String, String>) {
    let Some(src_index) = attrs.iter().position(|(key, value)| key == "src" && !value.is_empty())
    else {
        return;
    };

    if let Some(link) = links.get(&attrs[src_index].1) {
        attrs[src_index].1 = link.clone();
    }

    set_attr(attrs, "alt", DEFAULT_IMAGE_ALT, false);
    set_attr(attrs, "loading", "lazy", true);
}

fn set_attr(attrs: &mut Vec<(String, String)>, key: &str, value: &str, overwrite: bool) {
    match attrs.iter_mut().find(|(k, _)| k == key) {
        Some((_, existing)) if overwrite || existing.is_empty() => *existing = value.to_string(),
        Some(_) => {}
        None => attrs.push((key.to_string(), value.to_string())),
    }
}
