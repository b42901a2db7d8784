//! Dependency resolution: turn a root item into an ordered, duplicate-free fetch plan.

use std::collections::{HashSet, VecDeque};
use tracing::{debug, warn};

use crate::catalog::{Catalog, ItemRecord};

/// Ordered, unique item identifiers, drained front to back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchPlan {
    items: VecDeque<String>,
}

impl FetchPlan {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }

    pub fn pop_front(&mut self) -> Option<String> {
        self.items.pop_front()
    }
}

impl Iterator for FetchPlan {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.pop_front()
    }
}

/// Result of one resolution pass.
#[derive(Debug, Default)]
pub struct Resolution {
    pub plan: FetchPlan,
    /// Identifiers referenced but absent from the catalog, in encounter order.
    pub misses: Vec<String>,
}

/// Resolve `root` and everything it requires.
///
/// Order is depth-first pre-order: an item comes before its dependencies,
/// and each dependency (with its own dependencies) comes before the next
/// sibling. Items already planned are skipped, which also breaks cycles.
pub fn resolve(catalog: &Catalog, root: &str) -> Resolution {
    Resolver::new(catalog).run(root)
}

struct Resolver<'a> {
    catalog: &'a Catalog,
    seen: HashSet<&'a str>,
    resolution: Resolution,
}

impl<'a> Resolver<'a> {
    fn new(catalog: &'a Catalog) -> Self {
        Self {
            catalog,
            seen: HashSet::new(),
            resolution: Resolution::default(),
        }
    }

    fn run(mut self, root: &str) -> Resolution {
        // Worklist of pending identifiers; top of the stack is visited next.
        let mut pending: Vec<String> = vec![root.to_string()];

        while let Some(id) = pending.pop() {
            let Some((key, record)) = self.lookup(&id) else {
                if !self.resolution.misses.contains(&id) {
                    warn!("Rom [{id}] not found in catalog");
                    self.resolution.misses.push(id);
                }
                continue;
            };
            if !self.seen.insert(key) {
                continue;
            }

            debug!("Queued [{key}] ({} dependencies)", record.requires.len());
            self.resolution.plan.items.push_back(key.to_string());
            pending.extend(record.requires.iter().rev().cloned());
        }

        self.resolution
    }

    fn lookup(&self, id: &str) -> Option<(&'a str, &'a ItemRecord)> {
        self.catalog.get_key_value(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(json: &str) -> Catalog {
        Catalog::from_json_str(json).unwrap()
    }

    fn ids(resolution: &Resolution) -> Vec<&str> {
        resolution.plan.iter().collect()
    }

    #[test]
    fn root_then_dependency() {
        let c = catalog(r#"{ "a": { "require": ["b"] }, "b": {} }"#);
        let r = resolve(&c, "a");
        assert_eq!(ids(&r), ["a", "b"]);
        assert!(r.misses.is_empty());
    }

    #[test]
    fn missing_root_gives_empty_plan() {
        let c = catalog(r#"{ "a": {} }"#);
        let r = resolve(&c, "missing");
        assert!(r.plan.is_empty());
        assert_eq!(r.misses, ["missing"]);
    }

    #[test]
    fn cycle_terminates_with_each_item_once() {
        let c = catalog(r#"{ "a": { "require": ["b"] }, "b": { "require": ["a"] } }"#);
        assert_eq!(ids(&resolve(&c, "a")), ["a", "b"]);
        assert_eq!(ids(&resolve(&c, "b")), ["b", "a"]);
    }

    #[test]
    fn self_reference() {
        let c = catalog(r#"{ "a": { "require": ["a"] } }"#);
        assert_eq!(ids(&resolve(&c, "a")), ["a"]);
    }

    #[test]
    fn depth_first_pre_order() {
        let c = catalog(
            r#"{
                "game": { "require": ["bios", "extra"] },
                "bios": { "require": ["firmware"] },
                "firmware": {},
                "extra": {}
            }"#,
        );
        assert_eq!(ids(&resolve(&c, "game")), ["game", "bios", "firmware", "extra"]);
    }

    #[test]
    fn diamond_is_deduplicated() {
        let c = catalog(
            r#"{
                "top": { "require": ["left", "right"] },
                "left": { "require": ["shared"] },
                "right": { "require": ["shared"] },
                "shared": {}
            }"#,
        );
        assert_eq!(ids(&resolve(&c, "top")), ["top", "left", "shared", "right"]);
    }

    #[test]
    fn both_legacy_fields_are_followed() {
        let both = catalog(
            r#"{
                "a": { "require": ["b"], "required": ["c", "ghost"] },
                "b": {}, "c": {}
            }"#,
        );
        let concatenated = catalog(
            r#"{
                "a": { "require": ["b", "c", "ghost"] },
                "b": {}, "c": {}
            }"#,
        );

        let r = resolve(&both, "a");
        assert_eq!(ids(&r), ids(&resolve(&concatenated, "a")));
        assert_eq!(ids(&r), ["a", "b", "c"]);
        assert_eq!(r.misses, ["ghost"]);
    }

    #[test]
    fn plan_only_contains_catalog_items() {
        let c = catalog(
            r#"{
                "a": { "require": ["x", "b", "y"] },
                "b": { "require": ["a", "z"] }
            }"#,
        );
        let r = resolve(&c, "a");
        let planned = ids(&r);
        assert_eq!(planned, ["a", "b"]);
        assert!(planned.iter().all(|id| c.contains(id)));
        assert_eq!(r.misses, ["x", "z", "y"]);
    }

    #[test]
    fn plan_drains_in_order() {
        let c = catalog(r#"{ "a": { "require": ["b", "c"] }, "b": {}, "c": {} }"#);
        let drained: Vec<String> = resolve(&c, "a").plan.collect();
        assert_eq!(drained, ["a", "b", "c"]);
    }
}
