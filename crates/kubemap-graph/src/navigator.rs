//! Read-only lookups over a built tree.

use crate::GraphNode;

/// The first group, in depth-first pre-order, with a direct member named `id`.
///
/// `None` for the root itself and for unknown ids.
pub fn parent_of<'a>(tree: &'a GraphNode, id: &str) -> Option<&'a GraphNode> {
    let mut stack = vec![tree];
    while let Some(node) = stack.pop() {
        if node.has_member(id) {
            return Some(node);
        }
        stack.extend(node.children().iter().rev());
    }
    None
}

/// The deepest group whose subtree holds `id`.
///
/// A group matches when it is `id` itself or when `id` is one of its direct
/// non-group members; otherwise its group members are searched in order.
pub fn find_group_containing<'a>(tree: &'a GraphNode, id: &str) -> Option<&'a GraphNode> {
    match tree {
        GraphNode::Resource(_) => None,
        GraphNode::ResourceGroup(group) => {
            (group.id == id || group.nodes.iter().any(|node| node.id == id)).then_some(tree)
        }
        GraphNode::Group(group) => {
            if group.id == id
                || group
                    .nodes
                    .iter()
                    .any(|node| !node.is_group() && node.id() == id)
            {
                return Some(tree);
            }
            group
                .nodes
                .iter()
                .find_map(|node| find_group_containing(node, id))
        }
    }
}

/// Groups from the root down to the direct parent of `id`.
///
/// Empty when `id` is the root, `None` when it is not in the tree.
pub fn path_to<'a>(tree: &'a GraphNode, id: &str) -> Option<Vec<&'a GraphNode>> {
    if tree.id() == id {
        return Some(Vec::new());
    }

    match tree {
        GraphNode::Resource(_) => None,
        GraphNode::ResourceGroup(group) => group
            .nodes
            .iter()
            .any(|node| node.id == id)
            .then(|| vec![tree]),
        GraphNode::Group(group) => group.nodes.iter().find_map(|node| {
            path_to(node, id).map(|mut path| {
                path.insert(0, tree);
                path
            })
        }),
    }
}
