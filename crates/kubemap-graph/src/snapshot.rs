//! Resource snapshots as delivered by the listing layer.
//!
//! A snapshot is any JSON object with an `items` array of Kubernetes objects,
//! so `kubectl get all -A -o json` output can be used as-is. Edges are taken
//! from an optional `edges` array, or derived from owner references.

use std::collections::{HashMap, HashSet};

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::filters::ResourceFilter;
use crate::{GraphEdge, Resource, ResourceNode};

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Failed to parse snapshot: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Duplicate node id `{0}` in snapshot")]
    DuplicateNodeId(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
pub struct Snapshot {
    #[serde(default)]
    pub items: Vec<Resource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edges: Option<Vec<SnapshotEdge>>,
}

/// Relation as written in a snapshot; the id defaults to `<source>-<target>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
pub struct SnapshotEdge {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl From<SnapshotEdge> for GraphEdge {
    fn from(edge: SnapshotEdge) -> Self {
        let id = edge
            .id
            .unwrap_or_else(|| format!("{}-{}", edge.source, edge.target));
        GraphEdge {
            id,
            source: edge.source,
            target: edge.target,
            label: edge.label,
        }
    }
}

impl From<GraphEdge> for SnapshotEdge {
    fn from(edge: GraphEdge) -> Self {
        SnapshotEdge {
            id: Some(edge.id),
            source: edge.source,
            target: edge.target,
            label: edge.label,
        }
    }
}

impl Snapshot {
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Combine snapshots taken from several sources, in order.
    ///
    /// Each source keeps its own edges: an explicit edge list is taken as-is,
    /// otherwise the owner references of that source's items are resolved
    /// against the items of every source. Without any explicit list the merged
    /// snapshot leaves owner references for [`Snapshot::into_graph`].
    pub fn merge(parts: impl IntoIterator<Item = Snapshot>) -> Snapshot {
        let parts: Vec<Snapshot> = parts.into_iter().collect();
        if parts.iter().all(|part| part.edges.is_none()) {
            return Snapshot {
                items: parts.into_iter().flat_map(|part| part.items).collect(),
                edges: None,
            };
        }

        let nodes: Vec<ResourceNode> = parts
            .iter()
            .flat_map(|part| part.items.iter().cloned())
            .map(ResourceNode::new)
            .collect();

        let mut items: Vec<Resource> = Vec::with_capacity(nodes.len());
        let mut edges = Vec::new();
        for part in parts {
            let owned = &nodes[items.len()..items.len() + part.items.len()];
            match part.edges {
                Some(explicit) => edges.extend(explicit),
                None => edges.extend(owner_edges(&nodes, owned).into_iter().map(SnapshotEdge::from)),
            }
            items.extend(part.items);
        }

        Snapshot {
            items,
            edges: Some(edges),
        }
    }

    /// Convert to the node and edge lists the builder consumes.
    ///
    /// Fails on duplicate node ids, which the core does not guard against.
    pub fn into_graph(self, filter: &ResourceFilter) -> Result<(Vec<ResourceNode>, Vec<GraphEdge>), SnapshotError> {
        let mut seen = HashSet::with_capacity(self.items.len());
        let mut nodes = Vec::with_capacity(self.items.len());
        for resource in self.items {
            let node = ResourceNode::new(resource);
            if !seen.insert(node.id.clone()) {
                return Err(SnapshotError::DuplicateNodeId(node.id));
            }
            nodes.push(node);
        }

        let edges = match self.edges {
            Some(edges) => edges.into_iter().map(GraphEdge::from).collect(),
            None => owner_reference_edges(&nodes),
        };

        debug!("loaded snapshot with {} node(s) and {} edge(s)", nodes.len(), edges.len());
        Ok(filter.apply(nodes, edges))
    }
}

/// Owner → owned edges for every owner reference resolving to a node in `nodes`.
pub fn owner_reference_edges(nodes: &[ResourceNode]) -> Vec<GraphEdge> {
    owner_edges(nodes, nodes)
}

// Owners are looked up in `nodes`, references are read from `owned`.
fn owner_edges(nodes: &[ResourceNode], owned: &[ResourceNode]) -> Vec<GraphEdge> {
    let mut by_uid: HashMap<&str, &ResourceNode> = HashMap::with_capacity(nodes.len());
    for node in nodes {
        if let Some(uid) = node.resource.metadata.uid.as_deref() {
            by_uid.insert(uid, node);
        }
    }

    let mut edges = Vec::new();
    for node in owned {
        for reference in &node.resource.metadata.owner_references {
            let Some(owner) = by_uid.get(reference.uid.as_str()) else {
                trace!(
                    "owner {}/{} of {} is not in the snapshot",
                    reference.kind, reference.name, node.id
                );
                continue;
            };
            edges.push(
                GraphEdge::new(format!("{}-{}", owner.id, node.id), &owner.id, &node.id).with_label("owner"),
            );
        }
    }
    edges
}
