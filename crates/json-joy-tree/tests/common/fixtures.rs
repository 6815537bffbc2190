use json_joy_tree::{NodeId, PathStep, Tree};
use serde_json::{json, Value};

/// A model `p` holding a child model `p2` and a plain array.
pub fn p_snapshot() -> Value {
    json!({
        "$modelId": "p",
        "p2": {"$modelId": "p2", "y": 12},
        "arr": [1, 2, 3],
    })
}

pub fn p_tree() -> (Tree, NodeId) {
    let mut tree = Tree::new();
    let root = tree.create_root(&p_snapshot()).unwrap();
    (tree, root)
}

pub fn steps(parts: &[&str]) -> Vec<PathStep> {
    parts.iter().map(|s| PathStep::from(*s)).collect()
}

pub fn node_at(tree: &Tree, root: NodeId, path: &[&str]) -> NodeId {
    tree.resolve_path(root, &steps(path))
        .node()
        .unwrap_or_else(|| panic!("{path:?} does not resolve to a node"))
}
