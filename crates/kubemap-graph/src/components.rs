//! Connected components of the resource relationship graph.
//!
//! Every edge touching a component is kept, including the ones that close a
//! cycle. Traversal only stops descending at nodes that were already visited.

use std::collections::HashSet;

use log::debug;

use crate::lookup::GraphLookup;
use crate::{GraphEdge, GraphNode, ResourceGroupNode, ResourceNode};

/// Workload kinds that name a component, most preferred first.
const MAIN_NODE_KINDS: [&str; 5] = ["Deployment", "ReplicaSet", "DaemonSet", "StatefulSet", "Job"];

/// Partition `nodes` into connected components, following edges in both directions.
///
/// A component with more than one node becomes a resource group with id
/// `group-<main node id>`; a lone node is returned as-is.
pub fn connected_components(nodes: &[ResourceNode], edges: &[GraphEdge]) -> Vec<GraphNode> {
    let lookup = GraphLookup::new(nodes, edges);
    let mut visited_nodes: HashSet<&str> = HashSet::with_capacity(nodes.len());
    let mut visited_edges: HashSet<&str> = HashSet::with_capacity(edges.len());
    let mut components = Vec::new();

    for node in nodes {
        if visited_nodes.contains(node.id.as_str()) {
            continue;
        }

        let (members, member_edges) =
            collect_component(&lookup, node, &mut visited_nodes, &mut visited_edges);
        components.extend(into_component(members, member_edges));
    }

    debug!(
        "found {} components in {} nodes and {} edges",
        components.len(),
        nodes.len(),
        edges.len()
    );

    components
}

/// Pick the node a component is named after: the first workload by kind priority,
/// falling back to the first node.
pub fn main_node(nodes: &[ResourceNode]) -> Option<&ResourceNode> {
    MAIN_NODE_KINDS
        .iter()
        .find_map(|kind| nodes.iter().find(|node| node.kind() == *kind))
        .or_else(|| nodes.first())
}

fn collect_component<'a>(
    lookup: &GraphLookup<'a>,
    start: &'a ResourceNode,
    visited_nodes: &mut HashSet<&'a str>,
    visited_edges: &mut HashSet<&'a str>,
) -> (Vec<ResourceNode>, Vec<GraphEdge>) {
    let mut members = Vec::new();
    let mut member_edges = Vec::new();
    let mut stack = vec![start];
    visited_nodes.insert(start.id.as_str());

    while let Some(node) = stack.pop() {
        members.push(node.clone());

        let outgoing = lookup
            .outgoing_edges(&node.id)
            .iter()
            .map(|&edge| (edge, edge.target.as_str()));
        let incoming = lookup
            .incoming_edges(&node.id)
            .iter()
            .map(|&edge| (edge, edge.source.as_str()));

        let pending = stack.len();
        for (edge, neighbour_id) in outgoing.chain(incoming) {
            if visited_edges.insert(edge.id.as_str()) {
                member_edges.push(edge.clone());
            }
            if let Some(neighbour) = lookup.node(neighbour_id) {
                if visited_nodes.insert(neighbour.id.as_str()) {
                    stack.push(neighbour);
                }
            }
        }
        // pop neighbours in edge order
        stack[pending..].reverse();
    }

    (members, member_edges)
}

fn into_component(mut members: Vec<ResourceNode>, edges: Vec<GraphEdge>) -> Option<GraphNode> {
    if members.len() == 1 {
        return members.pop().map(GraphNode::Resource);
    }

    let (id, label) = match main_node(&members) {
        Some(main) => (format!("group-{}", main.id), main.name().to_string()),
        None => return None,
    };

    Some(GraphNode::ResourceGroup(ResourceGroupNode {
        id,
        label,
        nodes: members,
        edges,
        collapsed: false,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Resource;
    use petgraph::algo::connected_components as petgraph_components;
    use petgraph::graph::UnGraph;
    use std::collections::HashMap;

    fn node(kind: &str, id: &str) -> ResourceNode {
        ResourceNode::new(Resource::new(kind, id).with_namespace("default").with_uid(id))
    }

    fn edge(source: &str, target: &str) -> GraphEdge {
        GraphEdge::new(format!("{source}-{target}"), source, target)
    }

    fn member_ids(component: &GraphNode) -> Vec<String> {
        match component {
            GraphNode::Resource(node) => vec![node.id.clone()],
            GraphNode::ResourceGroup(group) => group.nodes.iter().map(|n| n.id.clone()).collect(),
            GraphNode::Group(_) => panic!("components never contain generic groups"),
        }
    }

    fn edge_ids(component: &GraphNode) -> Vec<String> {
        component.edges().iter().map(|e| e.id.clone()).collect()
    }

    #[test]
    fn test_workload_chain_forms_one_group() {
        let nodes = vec![node("Deployment", "a"), node("ReplicaSet", "b"), node("Pod", "c")];
        let edges = vec![edge("a", "b"), edge("b", "c")];

        let components = connected_components(&nodes, &edges);
        assert_eq!(components.len(), 1);

        let GraphNode::ResourceGroup(group) = &components[0] else {
            panic!("expected a resource group, got {:?}", components[0]);
        };
        assert_eq!(group.id, "group-a");
        assert_eq!(group.label, "a");
        assert_eq!(member_ids(&components[0]), vec!["a", "b", "c"]);
        assert_eq!(edge_ids(&components[0]), vec!["a-b", "b-c"]);
        assert!(!group.collapsed);
    }

    #[test]
    fn test_cycle_keeps_every_edge() {
        let nodes = vec![node("Pod", "a"), node("Pod", "b"), node("Pod", "c")];
        let edges = vec![edge("a", "b"), edge("b", "c"), edge("c", "a")];

        let components = connected_components(&nodes, &edges);
        assert_eq!(components.len(), 1);

        let mut ids = edge_ids(&components[0]);
        ids.sort();
        assert_eq!(ids, vec!["a-b", "b-c", "c-a"]);
        assert_eq!(components[0].member_count(), 3);
    }

    #[test]
    fn test_singletons_are_not_wrapped() {
        let nodes = vec![node("Service", "svc"), node("Deployment", "a"), node("Pod", "b")];
        let edges = vec![edge("a", "b")];

        let components = connected_components(&nodes, &edges);
        assert_eq!(components.len(), 2);
        assert!(matches!(&components[0], GraphNode::Resource(n) if n.id == "svc"));
        assert!(matches!(&components[1], GraphNode::ResourceGroup(g) if g.id == "group-a"));
    }

    #[test]
    fn test_self_loops_and_multi_edges_recorded_once() {
        let nodes = vec![node("Pod", "a"), node("Pod", "b")];
        let edges = vec![
            GraphEdge::new("owner", "a", "b"),
            GraphEdge::new("volume", "a", "b"),
            GraphEdge::new("loop", "b", "b"),
        ];

        let components = connected_components(&nodes, &edges);
        assert_eq!(components.len(), 1);

        let mut ids = edge_ids(&components[0]);
        ids.sort();
        assert_eq!(ids, vec!["loop", "owner", "volume"]);
    }

    #[test]
    fn test_dangling_edge_recorded_but_not_followed() {
        let nodes = vec![node("Pod", "a"), node("Pod", "b")];
        let edges = vec![edge("a", "b"), edge("b", "ghost")];

        let components = connected_components(&nodes, &edges);
        assert_eq!(components.len(), 1);
        assert_eq!(member_ids(&components[0]), vec!["a", "b"]);
        assert_eq!(edge_ids(&components[0]), vec!["a-b", "b-ghost"]);
    }

    #[test]
    fn test_incoming_edges_join_components() {
        // b is reached from c only through an incoming edge
        let nodes = vec![node("Pod", "b"), node("Deployment", "c")];
        let edges = vec![edge("c", "b")];

        let components = connected_components(&nodes, &edges);
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].id(), "group-c");
        assert_eq!(member_ids(&components[0]), vec!["b", "c"]);
    }

    #[test]
    fn test_main_node_priority() {
        let nodes = vec![
            node("Pod", "pod"),
            node("Job", "job"),
            node("ReplicaSet", "rs"),
            node("StatefulSet", "sts"),
        ];
        assert_eq!(main_node(&nodes).map(|n| n.id.as_str()), Some("rs"));

        let pods = vec![node("Pod", "first"), node("Pod", "second")];
        assert_eq!(main_node(&pods).map(|n| n.id.as_str()), Some("first"));

        assert!(main_node(&[]).is_none());
    }

    #[test]
    fn test_membership_matches_petgraph() {
        let ids = ["a", "b", "c", "d", "e", "f", "g", "h"];
        let nodes: Vec<ResourceNode> = ids.iter().map(|id| node("Pod", id)).collect();
        let edges = vec![
            edge("a", "b"),
            edge("c", "b"),
            edge("d", "e"),
            edge("e", "f"),
            edge("f", "d"),
            edge("g", "g"),
        ];

        let components = connected_components(&nodes, &edges);

        let mut graph = UnGraph::<&str, ()>::new_undirected();
        let index: HashMap<&str, _> = ids.iter().map(|id| (*id, graph.add_node(*id))).collect();
        for e in &edges {
            graph.add_edge(index[e.source.as_str()], index[e.target.as_str()], ());
        }
        assert_eq!(components.len(), petgraph_components(&graph));

        let mut seen: Vec<String> = components.iter().flat_map(member_ids).collect();
        seen.sort();
        assert_eq!(seen, ids.iter().map(|id| id.to_string()).collect::<Vec<_>>());

        // every edge between two known nodes shows up exactly once, except on bare singletons
        let recorded: Vec<String> = components.iter().flat_map(edge_ids).collect();
        assert_eq!(recorded.len(), 5);
        assert!(!recorded.contains(&"g-g".to_string()));
    }
}
