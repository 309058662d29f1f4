use std::cmp::Reverse;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::components::connected_components;
use crate::grouping::{GroupBy, group_by};
use crate::{GraphEdge, GraphNode, GroupNode, ROOT_ID, ResourceNode};

/// Options for [`build_tree`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
#[serde(rename_all = "camelCase")]
pub struct BuildOptions {
    #[serde(default)]
    pub group_by: Option<GroupBy>,
}

impl BuildOptions {
    pub fn grouped_by(criterion: GroupBy) -> Self {
        Self {
            group_by: Some(criterion),
        }
    }
}

/// Build the rooted resource map tree.
///
/// The result is always a [`GraphNode::Group`] with id [`ROOT_ID`]. Members of
/// every group are ordered heaviest first, see [`node_weight`].
pub fn build_tree(nodes: &[ResourceNode], edges: &[GraphEdge], options: BuildOptions) -> GraphNode {
    let mut members = connected_components(nodes, edges);

    if let Some(criterion) = options.group_by {
        members = group_by(members, criterion);
    }

    let mut root = GroupNode::new(ROOT_ID, ROOT_ID, members);
    sort_by_weight(&mut root);

    debug!(
        "built resource map with {} top-level node(s), grouping: {}",
        root.nodes.len(),
        options
            .group_by
            .map(GroupBy::as_str)
            .unwrap_or("none")
    );

    GraphNode::Group(root)
}

/// Ordering weight: generic groups outrank resource groups, which outrank single resources.
pub fn node_weight(node: &GraphNode) -> usize {
    match node {
        GraphNode::Group(group) => 100 + group.nodes.len(),
        GraphNode::ResourceGroup(group) => group.nodes.len(),
        GraphNode::Resource(_) => 1,
    }
}

// Stable, so equal weights keep their grouping order.
fn sort_by_weight(group: &mut GroupNode) {
    group.nodes.sort_by_key(|node| Reverse(node_weight(node)));
    for node in &mut group.nodes {
        if let GraphNode::Group(child) = node {
            sort_by_weight(child);
        }
    }
}

/// Number of nodes in the tree, counting `tree` itself and resources inside resource groups.
pub fn graph_size(tree: &GraphNode) -> usize {
    let mut size = 0;
    tree.walk(&mut |node| {
        size += match node {
            GraphNode::ResourceGroup(group) => 1 + group.nodes.len(),
            GraphNode::Group(_) | GraphNode::Resource(_) => 1,
        };
    });
    size
}
