//! Grouping of components by a shared property.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::components::main_node;
use crate::{GraphNode, GroupNode, INSTANCE_LABEL};

/// Property used to bundle components into groups. One criterion per build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    /// Kubernetes namespace.
    Namespace,
    /// Cluster node the Pods are scheduled on.
    Node,
    /// `app.kubernetes.io/instance` label.
    Instance,
    /// Resource kind.
    Crd,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown grouping `{0}`, expected one of: namespace, node, instance, crd")]
pub struct ParseGroupByError(pub String);

impl GroupBy {
    pub const ALL: [GroupBy; 4] = [GroupBy::Namespace, GroupBy::Node, GroupBy::Instance, GroupBy::Crd];

    pub fn as_str(self) -> &'static str {
        match self {
            GroupBy::Namespace => "namespace",
            GroupBy::Node => "node",
            GroupBy::Instance => "instance",
            GroupBy::Crd => "crd",
        }
    }

    /// Label prefix and single-member policy for this criterion.
    pub fn options(self) -> GroupOptions<'static> {
        match self {
            GroupBy::Namespace => GroupOptions::new("Namespace").allow_single_member_group(true),
            GroupBy::Node => GroupOptions::new("Node").allow_single_member_group(true),
            GroupBy::Instance => GroupOptions::new("Instance"),
            GroupBy::Crd => GroupOptions::new("CRD").allow_single_member_group(true),
        }
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupBy {
    type Err = ParseGroupByError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GroupBy::ALL
            .into_iter()
            .find(|criterion| criterion.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseGroupByError(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupOptions<'a> {
    /// Prefix for group ids (`<label>-<key>`) and labels (`<label>: <key>`).
    pub label: &'a str,
    /// Keep groups that end up with a single member instead of unwrapping them.
    pub allow_single_member_group: bool,
}

impl<'a> GroupOptions<'a> {
    pub fn new(label: &'a str) -> Self {
        Self {
            label,
            allow_single_member_group: false,
        }
    }

    pub fn allow_single_member_group(mut self, allow: bool) -> Self {
        self.allow_single_member_group = allow;
        self
    }
}

/// Grouping key of `node` under `criterion`; `None` leaves the node ungrouped.
///
/// Generic groups are never regrouped.
pub fn group_key(node: &GraphNode, criterion: GroupBy) -> Option<&str> {
    match (criterion, node) {
        (_, GraphNode::Group(_)) => None,

        (GroupBy::Namespace, GraphNode::ResourceGroup(group)) => {
            group.nodes.first().and_then(|member| member.resource.namespace())
        }
        (GroupBy::Namespace, GraphNode::Resource(node)) => node.resource.namespace(),

        (GroupBy::Node, GraphNode::ResourceGroup(group)) => group
            .nodes
            .iter()
            .find_map(|member| member.resource.host_node()),
        (GroupBy::Node, GraphNode::Resource(node)) => node.resource.host_node(),

        (GroupBy::Instance, GraphNode::ResourceGroup(group)) => {
            main_node(&group.nodes).and_then(|main| main.resource.label(INSTANCE_LABEL))
        }
        (GroupBy::Instance, GraphNode::Resource(node)) => node.resource.label(INSTANCE_LABEL),

        (GroupBy::Crd, GraphNode::ResourceGroup(group)) => group.nodes.first().map(|member| member.kind()),
        (GroupBy::Crd, GraphNode::Resource(node)) => Some(node.kind()),
    }
}

/// Bundle nodes that share a key into generic groups.
///
/// Keys are emitted in the order they are first encountered. Nodes without a key,
/// and single-member groups unless `allow_single_member_group` is set, are spliced
/// back into the result at their key's position.
pub fn group_by_property<F>(nodes: Vec<GraphNode>, accessor: F, options: &GroupOptions<'_>) -> Vec<GraphNode>
where
    F: Fn(&GraphNode) -> Option<&str>,
{
    let mut buckets: IndexMap<Option<String>, Vec<GraphNode>> = IndexMap::new();
    for node in nodes {
        let key = accessor(&node).map(str::to_string);
        buckets.entry(key).or_default().push(node);
    }

    let mut result = Vec::new();
    let mut groups = 0;
    for (key, members) in buckets {
        match key {
            Some(key) if members.len() > 1 || options.allow_single_member_group => {
                groups += 1;
                result.push(GraphNode::Group(GroupNode::new(
                    format!("{}-{key}", options.label),
                    format!("{}: {key}", options.label),
                    members,
                )));
            }
            key => {
                trace!("leaving {} node(s) ungrouped for key {key:?}", members.len());
                result.extend(members);
            }
        }
    }

    debug!("created {groups} {} group(s)", options.label);
    result
}

/// Group `nodes` with the accessor and options of `criterion`.
pub fn group_by(nodes: Vec<GraphNode>, criterion: GroupBy) -> Vec<GraphNode> {
    group_by_property(nodes, |node| group_key(node, criterion), &criterion.options())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Resource, ResourceGroupNode, ResourceNode};

    fn resource(kind: &str, name: &str, namespace: &str) -> ResourceNode {
        ResourceNode::new(
            Resource::new(kind, name)
                .with_namespace(namespace)
                .with_uid(name),
        )
    }

    fn workload(main: ResourceNode, rest: Vec<ResourceNode>) -> GraphNode {
        let mut nodes = rest;
        nodes.insert(0, main.clone());
        GraphNode::ResourceGroup(ResourceGroupNode {
            id: format!("group-{}", main.id),
            label: main.name().to_string(),
            nodes,
            edges: Vec::new(),
            collapsed: false,
        })
    }

    fn ids(nodes: &[GraphNode]) -> Vec<&str> {
        nodes.iter().map(GraphNode::id).collect()
    }

    #[test]
    fn test_parse_group_by() {
        assert_eq!("namespace".parse::<GroupBy>(), Ok(GroupBy::Namespace));
        assert_eq!("CRD".parse::<GroupBy>(), Ok(GroupBy::Crd));
        assert_eq!(
            "label".parse::<GroupBy>(),
            Err(ParseGroupByError("label".to_string()))
        );
        assert_eq!(GroupBy::Instance.to_string(), "instance");
    }

    #[test]
    fn test_group_by_namespace() {
        let nodes = vec![
            GraphNode::Resource(resource("Service", "web", "shop")),
            GraphNode::Resource(resource("Service", "api", "billing")),
            GraphNode::Resource(resource("ConfigMap", "settings", "shop")),
        ];

        let grouped = group_by(nodes, GroupBy::Namespace);
        assert_eq!(ids(&grouped), vec!["Namespace-shop", "Namespace-billing"]);
        assert_eq!(grouped[0].label(), "Namespace: shop");
        assert_eq!(ids(grouped[0].children()), vec!["web", "settings"]);
        // namespace groups are kept even with a single member
        assert_eq!(grouped[1].member_count(), 1);
    }

    #[test]
    fn test_absent_keys_return_input_unchanged() {
        let nodes = vec![
            GraphNode::Resource(resource("Service", "web", "shop")),
            GraphNode::Resource(resource("Deployment", "api", "shop")),
        ];

        let grouped = group_by(nodes.clone(), GroupBy::Node);
        assert_eq!(grouped, nodes);
    }

    #[test]
    fn test_single_member_groups_unwrapped_by_default() {
        let nodes = vec![
            GraphNode::Resource(resource("Service", "a", "x")),
            GraphNode::Resource(resource("Service", "b", "y")),
            GraphNode::Resource(resource("Service", "c", "x")),
        ];
        fn accessor(node: &GraphNode) -> Option<&str> {
            group_key(node, GroupBy::Namespace)
        }

        let grouped = group_by_property(nodes.clone(), accessor, &GroupOptions::new("Zone"));
        assert_eq!(ids(&grouped), vec!["Zone-x", "b"]);

        let grouped = group_by_property(
            nodes,
            accessor,
            &GroupOptions::new("Zone").allow_single_member_group(true),
        );
        assert_eq!(ids(&grouped), vec!["Zone-x", "Zone-y"]);
    }

    #[test]
    fn test_ungrouped_nodes_keep_first_seen_position() {
        let pod = |name: &str| {
            GraphNode::Resource(ResourceNode::new(
                Resource::new("Pod", name)
                    .with_namespace("shop")
                    .with_uid(name)
                    .with_node_name("worker-1"),
            ))
        };
        let nodes = vec![
            pod("p1"),
            GraphNode::Resource(resource("Service", "svc", "shop")),
            pod("p2"),
        ];

        let grouped = group_by(nodes, GroupBy::Node);
        assert_eq!(ids(&grouped), vec!["Node-worker-1", "svc"]);
        assert_eq!(ids(grouped[0].children()), vec!["p1", "p2"]);
    }

    #[test]
    fn test_keys_for_resource_groups() {
        let deployment = ResourceNode::new(
            Resource::new("Deployment", "web")
                .with_namespace("shop")
                .with_uid("d1")
                .with_label(INSTANCE_LABEL, "storefront"),
        );
        let replica_set = resource("ReplicaSet", "web-7f", "shop");
        let pod = ResourceNode::new(
            Resource::new("Pod", "web-7f-a")
                .with_namespace("shop")
                .with_uid("p1")
                .with_node_name("worker-2"),
        );
        // the replica set comes first in traversal order, the deployment is still main
        let group = GraphNode::ResourceGroup(ResourceGroupNode {
            id: "group-d1".to_string(),
            label: "web".to_string(),
            nodes: vec![replica_set, deployment, pod],
            edges: Vec::new(),
            collapsed: false,
        });

        assert_eq!(group_key(&group, GroupBy::Namespace), Some("shop"));
        assert_eq!(group_key(&group, GroupBy::Node), Some("worker-2"));
        assert_eq!(group_key(&group, GroupBy::Instance), Some("storefront"));
        assert_eq!(group_key(&group, GroupBy::Crd), Some("ReplicaSet"));
    }

    #[test]
    fn test_workload_without_pods_has_no_host() {
        let group = workload(
            resource("Deployment", "idle", "shop"),
            vec![resource("ReplicaSet", "idle-1", "shop")],
        );
        assert_eq!(group_key(&group, GroupBy::Node), None);
    }

    #[test]
    fn test_generic_groups_are_never_regrouped() {
        let group = GraphNode::Group(GroupNode::new(
            "Namespace-shop",
            "Namespace: shop",
            vec![GraphNode::Resource(resource("Service", "web", "shop"))],
        ));
        for criterion in GroupBy::ALL {
            assert_eq!(group_key(&group, criterion), None);
        }
    }

    #[test]
    fn test_group_by_instance_unwraps_single_members() {
        let release = |kind: &str, name: &str, instance: &str| {
            ResourceNode::new(
                Resource::new(kind, name)
                    .with_namespace("shop")
                    .with_uid(name)
                    .with_label(INSTANCE_LABEL, instance),
            )
        };
        let nodes = vec![
            workload(release("Deployment", "web", "storefront"), vec![resource("Pod", "web-0", "shop")]),
            workload(release("Deployment", "report", "batch"), vec![resource("Pod", "report-0", "shop")]),
            workload(release("Deployment", "cart", "storefront"), vec![resource("Pod", "cart-0", "shop")]),
            GraphNode::Resource(resource("Service", "web-svc", "shop")),
        ];

        let grouped = group_by(nodes, GroupBy::Instance);
        assert_eq!(ids(&grouped), vec!["Instance-storefront", "group-report", "web-svc"]);
        assert_eq!(grouped[0].label(), "Instance: storefront");
        assert_eq!(ids(grouped[0].children()), vec!["group-web", "group-cart"]);
        // a lone release is not wrapped in a one-member group
        assert!(matches!(&grouped[1], GraphNode::ResourceGroup(_)));
    }

    #[test]
    fn test_group_by_crd() {
        let nodes = vec![
            workload(resource("Deployment", "web", "shop"), vec![resource("Pod", "web-0", "shop")]),
            GraphNode::Resource(resource("Service", "web-svc", "shop")),
            workload(resource("Deployment", "api", "shop"), vec![resource("Pod", "api-0", "shop")]),
        ];

        let grouped = group_by(nodes, GroupBy::Crd);
        assert_eq!(ids(&grouped), vec!["CRD-Deployment", "CRD-Service"]);
        assert_eq!(ids(grouped[0].children()), vec!["group-web", "group-api"]);
    }
}
