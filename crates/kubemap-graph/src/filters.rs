use std::collections::HashSet;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{GraphEdge, Resource, ResourceNode};

/// Match a string against a wildcard pattern.
/// Supports: *prefix, suffix*, *substring* and exact match.
pub fn matches_pattern(text: &str, pattern: &str) -> bool {
    if pattern == "*" {
        return true;
    }
    if pattern.is_empty() {
        return text.is_empty();
    }

    let starts_with_wildcard = pattern.starts_with('*');
    let ends_with_wildcard = pattern.ends_with('*');

    match (starts_with_wildcard, ends_with_wildcard) {
        (true, true) => text.contains(&pattern[1..pattern.len() - 1]),
        (true, false) => text.ends_with(&pattern[1..]),
        (false, true) => text.starts_with(&pattern[..pattern.len() - 1]),
        (false, false) => text == pattern,
    }
}

/// Which resources of a snapshot make it into the map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
#[serde(rename_all = "camelCase")]
pub struct ResourceFilter {
    /// Namespaces to keep. Empty keeps every namespace.
    #[serde(default)]
    pub namespaces: Vec<String>,
    /// Kind patterns to drop, see [`matches_pattern`].
    #[serde(default)]
    pub exclude_kinds: Vec<String>,
}

impl ResourceFilter {
    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty() && self.exclude_kinds.is_empty()
    }

    /// Cluster-scoped resources pass any namespace filter.
    pub fn retains(&self, resource: &Resource) -> bool {
        let in_namespace = match resource.namespace() {
            Some(namespace) => self.namespaces.is_empty() || self.namespaces.iter().any(|ns| ns == namespace),
            None => true,
        };

        in_namespace
            && !self
                .exclude_kinds
                .iter()
                .any(|pattern| matches_pattern(&resource.kind, pattern))
    }

    /// Drop filtered nodes together with every edge touching one of them.
    pub fn apply(&self, nodes: Vec<ResourceNode>, edges: Vec<GraphEdge>) -> (Vec<ResourceNode>, Vec<GraphEdge>) {
        if self.is_empty() {
            return (nodes, edges);
        }

        let (kept, dropped): (Vec<_>, Vec<_>) = nodes
            .into_iter()
            .partition(|node| self.retains(&node.resource));
        let dropped: HashSet<String> = dropped.into_iter().map(|node| node.id).collect();

        let edge_count = edges.len();
        let edges: Vec<GraphEdge> = edges
            .into_iter()
            .filter(|edge| !dropped.contains(&edge.source) && !dropped.contains(&edge.target))
            .collect();

        debug!(
            "filter dropped {} node(s) and {} edge(s)",
            dropped.len(),
            edge_count - edges.len()
        );

        (kept, edges)
    }
}
