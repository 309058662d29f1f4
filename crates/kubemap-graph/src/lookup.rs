use std::collections::HashMap;

use crate::{GraphEdge, ResourceNode};

/// Id-keyed indices over flat node and edge lists.
///
/// Edges are indexed by their endpoint ids whether or not a node with that id
/// exists. Duplicate node ids resolve to the last node given.
pub struct GraphLookup<'a> {
    nodes: HashMap<&'a str, &'a ResourceNode>,
    outgoing: HashMap<&'a str, Vec<&'a GraphEdge>>,
    incoming: HashMap<&'a str, Vec<&'a GraphEdge>>,
}

impl<'a> GraphLookup<'a> {
    pub fn new(nodes: &'a [ResourceNode], edges: &'a [GraphEdge]) -> Self {
        let mut by_id = HashMap::with_capacity(nodes.len());
        for node in nodes {
            by_id.insert(node.id.as_str(), node);
        }

        let mut outgoing: HashMap<&'a str, Vec<&'a GraphEdge>> = HashMap::new();
        let mut incoming: HashMap<&'a str, Vec<&'a GraphEdge>> = HashMap::new();
        for edge in edges {
            outgoing.entry(edge.source.as_str()).or_default().push(edge);
            incoming.entry(edge.target.as_str()).or_default().push(edge);
        }

        Self {
            nodes: by_id,
            outgoing,
            incoming,
        }
    }

    pub fn node(&self, id: &str) -> Option<&'a ResourceNode> {
        self.nodes.get(id).copied()
    }

    /// Edges whose source is `id`, in input order.
    pub fn outgoing_edges(&self, id: &str) -> &[&'a GraphEdge] {
        self.outgoing.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Edges whose target is `id`, in input order.
    pub fn incoming_edges(&self, id: &str) -> &[&'a GraphEdge] {
        self.incoming.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
