//! WebAssembly entry points for the resource map front end.
//!
//! The presentation layer hands over a snapshot once per fetch and then asks
//! for a fresh render tree on every selection or expand-all change.

use kubemap_graph::{
    BuildOptions, CollapseOptions, GraphEdge, GraphNode, GroupBy, ResourceFilter, ResourceNode, Snapshot,
    SnapshotError, build_tree, collapse, find_group_containing, flatten, graph_size, parent_of,
};
use log::{Level, debug, warn};
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// Route `log` records to the browser console and install the panic hook.
#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging() {
    let _ = console_log::init_with_level(Level::Debug);
    console_error_panic_hook::set_once();
}

/// Resource map state owned on the WASM side.
#[wasm_bindgen]
pub struct MapProcessor {
    nodes: Vec<ResourceNode>,
    edges: Vec<GraphEdge>,
    tree: GraphNode,
}

impl MapProcessor {
    fn from_json(snapshot_json: &str) -> Result<Self, SnapshotError> {
        let (nodes, edges) = Snapshot::from_json(snapshot_json)?.into_graph(&ResourceFilter::default())?;
        let tree = build_tree(&nodes, &edges, BuildOptions::default());
        Ok(Self { nodes, edges, tree })
    }

    fn rebuild(&mut self, group_by: Option<&str>) -> &GraphNode {
        let group_by = group_by.and_then(|name| match name.parse::<GroupBy>() {
            Ok(criterion) => Some(criterion),
            Err(err) => {
                warn!("{err}, building ungrouped map");
                None
            }
        });

        self.tree = build_tree(&self.nodes, &self.edges, BuildOptions { group_by });
        &self.tree
    }

    fn collapsed(&self, selected_node_id: Option<String>, expand_all: bool) -> GraphNode {
        let options = CollapseOptions {
            selected_node_id,
            expand_all,
        };
        debug!("collapsing map with {options:?}");
        collapse(&self.tree, &options)
    }
}

#[wasm_bindgen]
impl MapProcessor {
    /// Create a processor from snapshot JSON; the initial tree is ungrouped.
    #[wasm_bindgen(constructor)]
    pub fn new(snapshot_json: &str) -> Result<MapProcessor, JsValue> {
        Self::from_json(snapshot_json).map_err(|err| js_sys::Error::new(&err.to_string()).into())
    }

    /// Rebuild the tree with the given grouping (`namespace`, `node`, `instance`, `crd`).
    pub fn build(&mut self, group_by: Option<String>) -> JsValue {
        to_js(self.rebuild(group_by.as_deref()))
    }

    /// Render tree for the current selection.
    pub fn collapse(&self, selected_node_id: Option<String>, expand_all: bool) -> JsValue {
        to_js(&self.collapsed(selected_node_id, expand_all))
    }

    /// Like `collapse`, flattened into parent-linked nodes and edges.
    pub fn flat(&self, selected_node_id: Option<String>, expand_all: bool) -> JsValue {
        to_js(&flatten(&self.collapsed(selected_node_id, expand_all)))
    }

    pub fn parent(&self, id: &str) -> JsValue {
        to_js(&parent_of(&self.tree, id))
    }

    #[wasm_bindgen(js_name = groupContaining)]
    pub fn group_containing(&self, id: &str) -> JsValue {
        to_js(&find_group_containing(&self.tree, id))
    }

    pub fn size(&self) -> usize {
        graph_size(&self.tree)
    }
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> JsValue {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .unwrap_or_else(|_| JsValue::NULL)
}
