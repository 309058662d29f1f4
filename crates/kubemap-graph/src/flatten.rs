//! Compound-graph payload for layout engines.
//!
//! Nesting is expressed through `parent` ids instead of nested member lists.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{GraphEdge, GraphNode, ResourceNode};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
#[serde(rename_all = "camelCase")]
pub struct FlatNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default)]
    pub collapsed: bool,
    #[serde(default)]
    pub member_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl FlatNode {
    fn resource(node: &ResourceNode, parent: Option<&str>) -> Self {
        Self {
            id: node.id.clone(),
            node_type: "kubeObject".to_string(),
            label: node.name().to_string(),
            parent: parent.map(str::to_string),
            collapsed: false,
            member_count: 0,
            kind: Some(node.kind().to_string()),
            namespace: node.resource.namespace().map(str::to_string),
        }
    }

    fn group(node: &GraphNode, parent: Option<&str>) -> Self {
        Self {
            id: node.id().to_string(),
            node_type: node.type_name().to_string(),
            label: node.label().to_string(),
            parent: parent.map(str::to_string),
            collapsed: node.is_collapsed(),
            member_count: node.member_count(),
            kind: None,
            namespace: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
pub struct FlatGraph {
    pub nodes: Vec<FlatNode>,
    pub edges: Vec<GraphEdge>,
}

/// Flatten a (usually collapsed) tree.
///
/// The root itself is not emitted. Members of collapsed groups are skipped, and
/// an edge is kept only when both endpoints were emitted.
pub fn flatten(tree: &GraphNode) -> FlatGraph {
    let mut flattener = Flattener::default();
    match tree {
        GraphNode::Resource(_) => flattener.node(tree, None),
        GraphNode::ResourceGroup(_) | GraphNode::Group(_) => flattener.members(tree, None),
    }
    flattener.finish()
}

#[derive(Default)]
struct Flattener<'a> {
    nodes: Vec<FlatNode>,
    edges: Vec<&'a GraphEdge>,
}

impl<'a> Flattener<'a> {
    fn node(&mut self, node: &'a GraphNode, parent: Option<&str>) {
        match node {
            GraphNode::Resource(resource) => self.nodes.push(FlatNode::resource(resource, parent)),
            GraphNode::ResourceGroup(_) | GraphNode::Group(_) => {
                self.nodes.push(FlatNode::group(node, parent));
                self.members(node, Some(node.id()));
            }
        }
    }

    fn members(&mut self, group: &'a GraphNode, parent: Option<&str>) {
        if group.is_collapsed() {
            return;
        }
        self.edges.extend(group.edges());

        match group {
            GraphNode::Resource(_) => {}
            GraphNode::ResourceGroup(group) => {
                for member in &group.nodes {
                    self.nodes.push(FlatNode::resource(member, parent));
                }
            }
            GraphNode::Group(group) => {
                for member in &group.nodes {
                    self.node(member, parent);
                }
            }
        }
    }

    fn finish(self) -> FlatGraph {
        let emitted: HashSet<&str> = self.nodes.iter().map(|node| node.id.as_str()).collect();
        let mut seen = HashSet::new();
        let edges = self
            .edges
            .into_iter()
            .filter(|&edge| emitted.contains(edge.source.as_str()) && emitted.contains(edge.target.as_str()))
            .filter(|&edge| seen.insert(edge.id.as_str()))
            .cloned()
            .collect();

        FlatGraph {
            nodes: self.nodes,
            edges,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        BuildOptions, CollapseOptions, GroupBy, GroupNode, Resource, ResourceGroupNode, build_tree, collapse,
    };

    fn node(kind: &str, name: &str, namespace: &str) -> ResourceNode {
        ResourceNode::new(
            Resource::new(kind, name)
                .with_namespace(namespace)
                .with_uid(name),
        )
    }

    fn edge(source: &str, target: &str) -> GraphEdge {
        GraphEdge::new(format!("{source}-{target}"), source, target)
    }

    fn cluster_tree() -> GraphNode {
        let nodes = vec![
            node("Deployment", "web", "shop"),
            node("Pod", "web-0", "shop"),
            node("Service", "web-svc", "shop"),
            node("Node", "worker-1", ""),
        ];
        let edges = vec![edge("web", "web-0")];
        build_tree(&nodes, &edges, BuildOptions::grouped_by(GroupBy::Namespace))
    }

    fn ids(graph: &FlatGraph) -> Vec<&str> {
        graph.nodes.iter().map(|node| node.id.as_str()).collect()
    }

    #[test]
    fn test_flatten_collapsed_tree() {
        let tree = collapse(&cluster_tree(), &CollapseOptions::default());
        let flat = flatten(&tree);

        assert_eq!(ids(&flat), vec!["Namespace-shop", "group-web", "web-svc", "worker-1"]);
        assert!(flat.edges.is_empty());

        let group = &flat.nodes[1];
        assert_eq!(group.node_type, "kubeGroup");
        assert_eq!(group.parent.as_deref(), Some("Namespace-shop"));
        assert!(group.collapsed);
        assert_eq!(group.member_count, 2);

        let host = &flat.nodes[3];
        assert_eq!(host.parent, None);
        assert_eq!(host.kind.as_deref(), Some("Node"));
        assert_eq!(host.namespace, None);
    }

    #[test]
    fn test_flatten_expanded_tree() {
        let tree = collapse(&cluster_tree(), &CollapseOptions::expand_all());
        let flat = flatten(&tree);

        assert_eq!(
            ids(&flat),
            vec!["Namespace-shop", "group-web", "web", "web-0", "web-svc", "worker-1"]
        );
        assert_eq!(flat.nodes[2].parent.as_deref(), Some("group-web"));
        assert_eq!(flat.nodes[4].parent.as_deref(), Some("Namespace-shop"));
        assert_eq!(flat.edges, vec![edge("web", "web-0")]);
    }

    #[test]
    fn test_edges_deduplicated_and_dangling_dropped() {
        let group = GraphNode::ResourceGroup(ResourceGroupNode {
            id: "group-a".to_string(),
            label: "a".to_string(),
            nodes: vec![node("Pod", "a", "default"), node("Pod", "b", "default")],
            edges: vec![edge("a", "b"), edge("b", "ghost")],
            collapsed: false,
        });
        let mut root = GroupNode::new("root", "root", vec![group]);
        root.edges.push(edge("a", "b"));

        let flat = flatten(&GraphNode::Group(root));
        assert_eq!(flat.edges, vec![edge("a", "b")]);
    }

    #[test]
    fn test_flatten_wire_format() {
        let tree = collapse(&cluster_tree(), &CollapseOptions::default());
        let value = serde_json::to_value(flatten(&tree)).unwrap();

        let namespace = &value["nodes"][0];
        assert_eq!(namespace["type"], "group");
        assert_eq!(namespace["memberCount"], 2);
        assert!(namespace.get("parent").is_none());
        assert_eq!(value["nodes"][2]["kind"], "Service");
    }
}
