//! Graph model for the Kubernetes resource map.
//!
//! Resources and the relations between them arrive as flat lists. The builder
//! folds them into connected components, optionally groups those by namespace,
//! host node, instance label or kind, and returns a single rooted tree that the
//! collapse engine rewrites for every render.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub mod builder;
pub mod collapse;
pub mod components;
pub mod filters;
pub mod flatten;
pub mod grouping;
pub mod lookup;
pub mod navigator;
pub mod snapshot;

pub use builder::{BuildOptions, build_tree, graph_size};
pub use collapse::{CollapseOptions, collapse};
pub use components::{connected_components, main_node};
pub use filters::ResourceFilter;
pub use flatten::{FlatGraph, FlatNode, flatten};
pub use grouping::{GroupBy, GroupOptions, ParseGroupByError, group_by, group_by_property, group_key};
pub use lookup::GraphLookup;
pub use navigator::{find_group_containing, parent_of, path_to};
pub use snapshot::{Snapshot, SnapshotEdge, SnapshotError};

/// Id of the root group returned by [`build_tree`].
pub const ROOT_ID: &str = "root";

/// Label holding the name of the release/installation a workload belongs to.
pub const INSTANCE_LABEL: &str = "app.kubernetes.io/instance";

/// The part of a Kubernetes object the resource map reads.
///
/// Unknown fields are ignored, so items from `kubectl get -o json` deserialize as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default, skip_serializing_if = "ResourceSpec::is_empty")]
    pub spec: ResourceSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub owner_references: Vec<OwnerReference>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
#[serde(rename_all = "camelCase")]
pub struct OwnerReference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    pub kind: String,
    pub name: String,
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<bool>,
}

/// Spec fields used for grouping. Only Pods carry a `nodeName`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
#[serde(rename_all = "camelCase")]
pub struct ResourceSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_name: Option<String>,
}

impl ResourceSpec {
    pub fn is_empty(&self) -> bool {
        self.node_name.is_none()
    }
}

impl Resource {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            metadata: ObjectMeta {
                name: name.into(),
                ..ObjectMeta::default()
            },
            ..Self::default()
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.metadata.namespace = Some(namespace.into());
        self
    }

    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.metadata.uid = Some(uid.into());
        self
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_node_name(mut self, node_name: impl Into<String>) -> Self {
        self.spec.node_name = Some(node_name.into());
        self
    }

    pub fn with_owner(mut self, owner: &Resource) -> Self {
        if let Some(uid) = &owner.metadata.uid {
            self.metadata.owner_references.push(OwnerReference {
                api_version: owner.api_version.clone(),
                kind: owner.kind.clone(),
                name: owner.metadata.name.clone(),
                uid: uid.clone(),
                controller: Some(true),
            });
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn namespace(&self) -> Option<&str> {
        self.metadata.namespace.as_deref().filter(|ns| !ns.is_empty())
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.metadata.labels.get(key).map(String::as_str)
    }

    pub fn is_pod(&self) -> bool {
        self.kind == "Pod"
    }

    /// Name of the cluster node a Pod is scheduled on. Always `None` for other kinds.
    pub fn host_node(&self) -> Option<&str> {
        if self.is_pod() {
            self.spec.node_name.as_deref()
        } else {
            None
        }
    }

    /// Stable node id: the uid when the API assigned one, otherwise kind/namespace/name.
    pub fn node_id(&self) -> String {
        if let Some(uid) = self.metadata.uid.as_deref().filter(|uid| !uid.is_empty()) {
            return uid.to_string();
        }
        match self.namespace() {
            Some(namespace) => format!("{}/{}/{}", self.kind, namespace, self.name()),
            None => format!("{}/{}", self.kind, self.name()),
        }
    }
}

/// A single Kubernetes object in the map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
pub struct ResourceNode {
    pub id: String,
    pub resource: Arc<Resource>,
}

impl ResourceNode {
    pub fn new(resource: Resource) -> Self {
        Self {
            id: resource.node_id(),
            resource: Arc::new(resource),
        }
    }

    pub fn kind(&self) -> &str {
        &self.resource.kind
    }

    pub fn name(&self) -> &str {
        self.resource.name()
    }
}

/// Directed relation between two node ids (owner reference, volume claim, selector, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl GraphEdge {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// A connected component of resources, labelled after its main workload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
pub struct ResourceGroupNode {
    pub id: String,
    pub label: String,
    pub nodes: Vec<ResourceNode>,
    pub edges: Vec<GraphEdge>,
    #[serde(default)]
    pub collapsed: bool,
}

/// Nodes sharing a grouping key (namespace, host, kind, ...). Also used for the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
pub struct GroupNode {
    pub id: String,
    pub label: String,
    pub nodes: Vec<GraphNode>,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
    #[serde(default)]
    pub collapsed: bool,
}

impl GroupNode {
    pub fn new(id: impl Into<String>, label: impl Into<String>, nodes: Vec<GraphNode>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            nodes,
            edges: Vec::new(),
            collapsed: false,
        }
    }
}

/// Node of the resource map tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
#[serde(tag = "type")]
pub enum GraphNode {
    #[serde(rename = "kubeObject")]
    Resource(ResourceNode),
    #[serde(rename = "kubeGroup")]
    ResourceGroup(ResourceGroupNode),
    #[serde(rename = "group")]
    Group(GroupNode),
}

impl GraphNode {
    pub fn id(&self) -> &str {
        match self {
            GraphNode::Resource(node) => &node.id,
            GraphNode::ResourceGroup(group) => &group.id,
            GraphNode::Group(group) => &group.id,
        }
    }

    /// Display label. Resources are labelled by their object name.
    pub fn label(&self) -> &str {
        match self {
            GraphNode::Resource(node) => node.name(),
            GraphNode::ResourceGroup(group) => &group.label,
            GraphNode::Group(group) => &group.label,
        }
    }

    /// Wire tag of the variant.
    pub fn type_name(&self) -> &'static str {
        match self {
            GraphNode::Resource(_) => "kubeObject",
            GraphNode::ResourceGroup(_) => "kubeGroup",
            GraphNode::Group(_) => "group",
        }
    }

    pub fn is_group(&self) -> bool {
        match self {
            GraphNode::Resource(_) => false,
            GraphNode::ResourceGroup(_) | GraphNode::Group(_) => true,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        match self {
            GraphNode::Resource(_) => false,
            GraphNode::ResourceGroup(group) => group.collapsed,
            GraphNode::Group(group) => group.collapsed,
        }
    }

    pub fn member_count(&self) -> usize {
        match self {
            GraphNode::Resource(_) => 0,
            GraphNode::ResourceGroup(group) => group.nodes.len(),
            GraphNode::Group(group) => group.nodes.len(),
        }
    }

    pub fn edges(&self) -> &[GraphEdge] {
        match self {
            GraphNode::Resource(_) => &[],
            GraphNode::ResourceGroup(group) => &group.edges,
            GraphNode::Group(group) => &group.edges,
        }
    }

    /// Nested tree nodes. Members of a resource group are plain resources and are not listed here.
    pub fn children(&self) -> &[GraphNode] {
        match self {
            GraphNode::Group(group) => &group.nodes,
            GraphNode::Resource(_) | GraphNode::ResourceGroup(_) => &[],
        }
    }

    /// Whether a direct member of this node has the given id.
    pub fn has_member(&self, id: &str) -> bool {
        match self {
            GraphNode::Resource(_) => false,
            GraphNode::ResourceGroup(group) => group.nodes.iter().any(|node| node.id == id),
            GraphNode::Group(group) => group.nodes.iter().any(|node| node.id() == id),
        }
    }

    /// Visit this node and every nested tree node in depth-first pre-order.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a GraphNode)) {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }
}

impl From<ResourceNode> for GraphNode {
    fn from(node: ResourceNode) -> Self {
        GraphNode::Resource(node)
    }
}

impl From<ResourceGroupNode> for GraphNode {
    fn from(group: ResourceGroupNode) -> Self {
        GraphNode::ResourceGroup(group)
    }
}

impl From<GroupNode> for GraphNode {
    fn from(group: GroupNode) -> Self {
        GraphNode::Group(group)
    }
}
