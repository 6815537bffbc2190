use json_joy_tree::{Patch, PathStep, Tree};
use proptest::prelude::*;
use serde_json::{json, Value};

fn json_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        (-50i64..50).prop_map(Value::from),
        "[a-z]{0,3}".prop_map(Value::from),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-c]", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

fn container() -> impl Strategy<Value = Value> {
    prop_oneof![
        prop::collection::btree_map("[a-c]", json_value(), 0..4)
            .prop_map(|m| Value::Object(m.into_iter().collect())),
        prop::collection::vec(json_value(), 0..4).prop_map(Value::Array),
    ]
}

fn key() -> BoxedStrategy<PathStep> {
    prop_oneof!["[a-c]".prop_map(PathStep::Key), (0usize..5).prop_map(PathStep::Index)].boxed()
}

/// Patches against `{"obj": {...}, "arr": [...]}`; many of them fail to
/// apply, which is fine.
fn patch() -> impl Strategy<Value = Patch> {
    let path = (prop_oneof![Just("obj"), Just("arr")], prop::collection::vec(key(), 0..3))
        .prop_map(|(head, rest)| {
            let mut path = vec![PathStep::from(head)];
            path.extend(rest);
            path
        })
        .boxed();
    prop_oneof![
        (path.clone(), json_value()).prop_map(|(p, v)| Patch::add(p, v)),
        path.clone().prop_map(Patch::remove),
        (path, json_value()).prop_map(|(p, v)| Patch::replace(p, v)),
        container().prop_map(|v| Patch::replace(vec![PathStep::from("obj")], v)),
    ]
}

proptest! {
    #[test]
    fn recorded_inverses_restore_the_snapshot(
        obj in container(),
        arr in prop::collection::vec(json_value(), 0..4),
        patches in prop::collection::vec(patch(), 1..12),
    ) {
        let mut tree = Tree::new();
        let root = tree.create_root(&json!({"obj": obj, "arr": arr})).unwrap();
        let before = tree.get_snapshot(root).unwrap();

        let recorder = tree.patch_recorder(true);
        for patch in &patches {
            let _ = tree.apply_patches(root, std::slice::from_ref(patch));
        }
        recorder.undo(&mut tree).unwrap();
        prop_assert_eq!(tree.get_snapshot(root).unwrap(), before);
    }

    #[test]
    fn root_paths_resolve_back_to_their_node(doc in container()) {
        let mut tree = Tree::new();
        let root = tree.create_root(&doc).unwrap();
        prop_assert_eq!(tree.get_snapshot(root).unwrap(), doc);
        for node in tree.deep_children(root) {
            let root_path = tree.get_root_path(node).unwrap();
            prop_assert_eq!(root_path.root, root);
            prop_assert_eq!(tree.resolve_path(root, &root_path.path).node(), Some(node));
            prop_assert_eq!(
                tree.get_parent_to_child_path(root, node).unwrap(),
                Some(root_path.path)
            );
        }
    }
}
