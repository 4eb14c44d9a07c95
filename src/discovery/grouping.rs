//! Module grouping of discovered units

use crate::discovery::links::DiscoveredUnit;
use crate::url::{module_slug, title_from_slug};

/// Units sharing one module URL segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredModule {
    pub slug: String,
    pub title: String,
    pub units: Vec<DiscoveredUnit>,
}

/// Partitions units into modules by the path segment after `marker`
///
/// Modules appear in the order their first unit was seen; units keep their
/// relative order. The title is derived from the slug, which only
/// approximates the title shown on the remote page. Units without a module
/// segment are dropped.
pub fn group_by_module(units: Vec<DiscoveredUnit>, marker: &str) -> Vec<DiscoveredModule> {
    let mut modules: Vec<DiscoveredModule> = Vec::new();

    for unit in units {
        let Some(slug) = module_slug(&unit.url, marker) else {
            tracing::debug!("No module segment in {}, skipping", unit.url);
            continue;
        };

        match modules.iter_mut().find(|module| module.slug == slug) {
            Some(module) => module.units.push(unit),
            None => modules.push(DiscoveredModule {
                title: title_from_slug(&slug),
                slug,
                units: vec![unit],
            }),
        }
    }

    modules
}
