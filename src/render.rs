//! Text renderings of a resource map tree.

use kubemap_graph::{
    GraphEdge, GraphNode, ResourceNode, connected_components, find_group_containing, flatten, graph_size,
    parent_of, path_to,
};
use serde::Deserialize;

/// Output format of `kubemap build`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Indented text tree with `[+]`/`[-]` markers
    #[default]
    Outline,
    /// The tree as JSON
    Json,
    /// Parent-linked nodes and edges as JSON
    Flat,
    /// Graphviz with one cluster per expanded group
    Dot,
}

impl OutputFormat {
    pub const NAMES: [&'static str; 4] = ["outline", "json", "flat", "dot"];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "outline" => Some(OutputFormat::Outline),
            "json" => Some(OutputFormat::Json),
            "flat" => Some(OutputFormat::Flat),
            "dot" => Some(OutputFormat::Dot),
            _ => None,
        }
    }
}

/// Render `tree` in `format`. The result always ends with a newline.
pub fn render(tree: &GraphNode, format: OutputFormat) -> Result<String, serde_json::Error> {
    Ok(match format {
        OutputFormat::Outline => to_outline(tree),
        OutputFormat::Dot => to_dot(tree),
        OutputFormat::Json => serde_json::to_string_pretty(tree)? + "\n",
        OutputFormat::Flat => serde_json::to_string_pretty(&flatten(tree))? + "\n",
    })
}

fn resource_name(resource: &ResourceNode) -> String {
    format!("{}/{}", resource.kind(), resource.name())
}

fn group_line(node: &GraphNode, indent: &str) -> String {
    let marker = if node.is_collapsed() { "[+]" } else { "[-]" };
    format!("{indent}{marker} {} ({})\n", node.label(), node.member_count())
}

pub fn to_outline(tree: &GraphNode) -> String {
    let mut output = String::new();
    outline_node(tree, 0, &mut output);
    output
}

fn outline_node(node: &GraphNode, depth: usize, output: &mut String) {
    let indent = "  ".repeat(depth);
    match node {
        GraphNode::Resource(resource) => {
            output.push_str(&format!("{indent}{}\n", resource_name(resource)));
        }
        GraphNode::ResourceGroup(group) => {
            output.push_str(&group_line(node, &indent));
            if !group.collapsed {
                for member in &group.nodes {
                    output.push_str(&format!("{indent}  {}\n", resource_name(member)));
                }
            }
        }
        GraphNode::Group(group) => {
            output.push_str(&group_line(node, &indent));
            if !group.collapsed {
                for member in &group.nodes {
                    outline_node(member, depth + 1, output);
                }
            }
        }
    }
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

fn dot_resource(resource: &ResourceNode, indent: &str) -> String {
    format!(
        "{indent}\"{}\" [label=\"{}\"];\n",
        escape(&resource.id),
        escape(&resource_name(resource))
    )
}

pub fn to_dot(tree: &GraphNode) -> String {
    let mut output = String::from("digraph resources {\n");
    output.push_str("    rankdir=LR;\n");

    render_dot_members(tree, 1, &mut output);

    for edge in flatten(tree).edges {
        output.push_str(&format!(
            "    \"{}\" -> \"{}\";\n",
            escape(&edge.source),
            escape(&edge.target)
        ));
    }

    output.push_str("}\n");
    output
}

fn render_dot_members(node: &GraphNode, indent_level: usize, output: &mut String) {
    let indent = "    ".repeat(indent_level);
    match node {
        GraphNode::Resource(resource) => output.push_str(&dot_resource(resource, &indent)),
        GraphNode::ResourceGroup(group) => {
            for member in &group.nodes {
                output.push_str(&dot_resource(member, &indent));
            }
        }
        GraphNode::Group(group) => {
            for member in &group.nodes {
                render_dot_node(member, indent_level, output);
            }
        }
    }
}

fn render_dot_node(node: &GraphNode, indent_level: usize, output: &mut String) {
    let indent = "    ".repeat(indent_level);
    match node {
        GraphNode::Resource(resource) => output.push_str(&dot_resource(resource, &indent)),
        GraphNode::ResourceGroup(_) | GraphNode::Group(_) if node.is_collapsed() => {
            output.push_str(&format!(
                "{indent}\"{}\" [label=\"{} ({})\", shape=box3d];\n",
                escape(node.id()),
                escape(node.label()),
                node.member_count()
            ));
        }
        GraphNode::ResourceGroup(_) | GraphNode::Group(_) => {
            output.push_str(&format!("{indent}subgraph \"cluster_{}\" {{\n", escape(node.id())));
            output.push_str(&format!("{indent}    label = \"{}\";\n", escape(node.label())));
            render_dot_members(node, indent_level + 1, output);
            output.push_str(&format!("{indent}}}\n"));
        }
    }
}

/// Where `id` sits in the tree, or `None` when it is not part of it.
pub fn to_location(tree: &GraphNode, id: &str) -> Option<String> {
    let path: Vec<&str> = path_to(tree, id)?.into_iter().map(GraphNode::label).collect();

    let mut output = format!("node: {id}\n");
    output.push_str(&format!("parent: {}\n", parent_of(tree, id).map_or("-", GraphNode::id)));
    output.push_str(&format!(
        "group: {}\n",
        find_group_containing(tree, id).map_or("-", GraphNode::id)
    ));
    output.push_str(&format!("path: {}\n", path.join(" > ")));
    Some(output)
}

/// Counts printed by `kubemap stats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MapStats {
    pub resources: usize,
    pub edges: usize,
    pub components: usize,
    pub resource_groups: usize,
    pub groups: usize,
    pub size: usize,
}

impl MapStats {
    /// `groups` counts generic groups below the root.
    pub fn collect(nodes: &[ResourceNode], edges: &[GraphEdge], tree: &GraphNode) -> Self {
        let mut stats = MapStats {
            resources: nodes.len(),
            edges: edges.len(),
            components: connected_components(nodes, edges).len(),
            size: graph_size(tree),
            ..MapStats::default()
        };

        for child in tree.children() {
            child.walk(&mut |node| match node {
                GraphNode::ResourceGroup(_) => stats.resource_groups += 1,
                GraphNode::Group(_) => stats.groups += 1,
                GraphNode::Resource(_) => {}
            });
        }
        stats
    }

    pub fn to_text(&self) -> String {
        format!(
            "resources: {}\nedges: {}\ncomponents: {}\nresource groups: {}\ngroups: {}\nsize: {}\n",
            self.resources, self.edges, self.components, self.resource_groups, self.groups, self.size
        )
    }
}
