//! Discovery module for the course tree
//!
//! Learning-path pages only list their units after client-side rendering,
//! and never list module titles, so modules are inferred from unit URLs.

mod grouping;
mod links;

pub use grouping::{group_by_module, DiscoveredModule};
pub use links::{unit_links, DiscoveredUnit, UnitDiscovery};
