//! Per-render collapse state.
//!
//! Every call produces a fresh tree. Only resource groups are ever collapsed;
//! the group chain holding the selection and, with `expand_all`, everything
//! else stays expanded.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::navigator::find_group_containing;
use crate::{GraphNode, GroupNode, ResourceGroupNode};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
#[serde(rename_all = "camelCase")]
pub struct CollapseOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_node_id: Option<String>,
    #[serde(default)]
    pub expand_all: bool,
}

impl CollapseOptions {
    pub fn expand_all() -> Self {
        Self {
            selected_node_id: None,
            expand_all: true,
        }
    }

    pub fn selecting(id: impl Into<String>) -> Self {
        Self {
            selected_node_id: Some(id.into()),
            expand_all: false,
        }
    }
}

/// Rewrite `tree` for rendering.
///
/// With a selection, the group containing it is located first. If that group is
/// not the root, the root keeps it as its only member.
pub fn collapse(tree: &GraphNode, options: &CollapseOptions) -> GraphNode {
    let selected = options
        .selected_node_id
        .as_deref()
        .and_then(|id| find_group_containing(tree, id));

    let rule = CollapseRule {
        selected_group: selected.map(GraphNode::id),
        expand_all: options.expand_all,
    };

    match (tree, selected) {
        (GraphNode::Group(root), Some(group)) if group.id() != root.id => {
            debug!("narrowing {} to selected group {}", root.id, group.id());
            GraphNode::Group(rule.apply_group(root, std::slice::from_ref(group)))
        }
        _ => rule.apply(tree),
    }
}

struct CollapseRule<'a> {
    selected_group: Option<&'a str>,
    expand_all: bool,
}

impl CollapseRule<'_> {
    fn is_collapsed(&self, group: &ResourceGroupNode) -> bool {
        !self.expand_all && self.selected_group != Some(group.id.as_str())
    }

    fn apply(&self, node: &GraphNode) -> GraphNode {
        match node {
            GraphNode::Resource(_) => node.clone(),
            GraphNode::ResourceGroup(group) => {
                let collapsed = self.is_collapsed(group);
                GraphNode::ResourceGroup(ResourceGroupNode {
                    id: group.id.clone(),
                    label: group.label.clone(),
                    nodes: group.nodes.clone(),
                    edges: if collapsed { Vec::new() } else { group.edges.clone() },
                    collapsed,
                })
            }
            GraphNode::Group(group) => GraphNode::Group(self.apply_group(group, &group.nodes)),
        }
    }

    // Generic groups stay expanded and keep their edges.
    fn apply_group(&self, group: &GroupNode, members: &[GraphNode]) -> GroupNode {
        GroupNode {
            id: group.id.clone(),
            label: group.label.clone(),
            nodes: members.iter().map(|member| self.apply(member)).collect(),
            edges: group.edges.clone(),
            collapsed: false,
        }
    }
}
