//! URL handling module for Learn-Archiver
//!
//! This module resolves hrefs and image sources found on rendered pages, and
//! derives module titles and archive filenames from URLs and titles.

mod naming;
mod normalize;

pub use naming::{clean_filename, module_slug, title_from_slug, unit_title_from_url};
pub use normalize::{
    absolutize_image_src, is_data_url, parse_absolute, resolve_against_base, resolve_link,
};
