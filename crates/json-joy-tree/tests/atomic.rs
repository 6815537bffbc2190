mod common;

use common::fixtures::{node_at, p_snapshot, p_tree};
use common::init_tracing;
use json_joy_tree::{
    ActionContext, ActionMiddleware, ActionResult, Next, Tree, TreeError, TreeResult,
};
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;

fn boom() -> TreeError {
    TreeError::Action("boom".into())
}

#[test]
fn nested_actions_are_rolled_back_with_the_root() {
    init_tracing();
    let (mut tree, p) = p_tree();
    tree.add_atomic_middleware(p, "edit").unwrap();
    let p2 = node_at(&tree, p, &["p2"]);
    let arr = node_at(&tree, p, &["arr"]);

    let result = tree.run_action(p, "edit", vec![json!(1)], |tree| {
        tree.set(p, "flag", true)?;
        tree.run_action(p2, "bump", vec![], |tree| tree.set(p2, "y", 99))?;
        tree.run_action(arr, "grow", vec![], |tree| {
            tree.push_json(arr, &json!({"deep": [1]}))?;
            tree.splice(arr, 0, 1, vec![])
        })?;
        tree.delete(p, "p2")?;
        Err::<(), _>(boom())
    });

    assert_eq!(result, Err(boom()));
    assert_eq!(tree.get_snapshot(p).unwrap(), p_snapshot());
    assert!(tree.current_action_context().is_none());
}

#[test]
fn tracked_action_under_an_untracked_one_keeps_the_root_recording() {
    let mut tree = Tree::new();
    let model = tree.create_root(&json!({"x": 0})).unwrap();
    let other = tree.create_root(&json!({})).unwrap();
    tree.add_atomic_middleware(model, "edit").unwrap();

    let result = tree.run_action(model, "edit", vec![], |tree| {
        tree.run_action(other, "mid", vec![], |tree| {
            tree.run_action(model, "inner", vec![], |tree| tree.set(model, "y", 1))
        })?;
        tree.set(model, "x", 5)?;
        Err::<(), _>(boom())
    });

    assert_eq!(result, Err(boom()));
    assert_eq!(tree.get_snapshot(model).unwrap(), json!({"x": 0}));
}

#[test]
fn failing_nested_action_handled_by_the_root_is_kept() {
    let (mut tree, p) = p_tree();
    tree.add_atomic_middleware(p, "edit").unwrap();
    tree.run_action(p, "edit", vec![], |tree| {
        let inner = tree.run_action(p, "edit", vec![], |tree| {
            tree.set(p, "inner", 1)?;
            Err::<(), _>(boom())
        });
        assert_eq!(inner, Err(boom()));
        tree.set(p, "outer", 2)
    })
    .unwrap();
    let snap = tree.get_snapshot(p).unwrap();
    assert_eq!(snap["inner"], json!(1));
    assert_eq!(snap["outer"], json!(2));
}

#[test]
fn flow_rollback_skips_suspended_windows() {
    let (mut tree, p) = p_tree();
    tree.add_atomic_middleware(p, "load").unwrap();

    let mut flow = tree.start_flow(p, "load", vec![]).unwrap();
    tree.flow_step(&mut flow, |tree| tree.set(p, "loading", true)).unwrap();
    // between steps: not part of the flow
    tree.set(p, "unrelated", 1).unwrap();
    tree.flow_step(&mut flow, |tree| tree.set(p, "items", 3)).unwrap();

    assert_eq!(tree.finish_flow(flow, Err(boom())), Err(boom()));
    let mut expected = p_snapshot();
    expected["unrelated"] = json!(1);
    assert_eq!(tree.get_snapshot(p).unwrap(), expected);
}

#[test]
fn successful_flow_keeps_its_changes() {
    let (mut tree, p) = p_tree();
    tree.add_atomic_middleware(p, "load").unwrap();
    let mut flow = tree.start_flow(p, "load", vec![]).unwrap();
    tree.flow_step(&mut flow, |tree| tree.set(p, "items", 3)).unwrap();
    tree.finish_flow(flow, Ok(())).unwrap();
    assert_eq!(tree.get_snapshot(p).unwrap()["items"], json!(3));
}

#[test]
fn failed_replay_is_reported_with_the_original_error() {
    let (mut tree, p) = p_tree();
    tree.add_atomic_middleware(p, "load").unwrap();
    let arr = node_at(&tree, p, &["arr"]);

    let mut flow = tree.start_flow(p, "load", vec![]).unwrap();
    tree.flow_step(&mut flow, |tree| tree.push(arr, 4)).unwrap();
    // removed while the flow is suspended, so the inverse no longer resolves
    tree.delete(p, "arr").unwrap();

    let err = tree.finish_flow(flow, Err(boom())).unwrap_err();
    match &err {
        TreeError::RollbackFailure { source, .. } => {
            assert!(matches!(**source, TreeError::InvalidPath { .. }), "{source:?}");
        }
        other => panic!("expected a rollback failure, got {other:?}"),
    }
    assert_eq!(err.original(), &boom());
}

#[test]
fn atomic_composes_with_other_middlewares() {
    struct Audit(Rc<RefCell<Vec<String>>>);
    impl ActionMiddleware for Audit {
        fn call(&self, tree: &mut Tree, ctx: &Rc<ActionContext>, next: Next<'_>) -> ActionResult {
            let result = next.run(tree);
            let outcome = if result.is_ok() { "ok" } else { "err" };
            self.0.borrow_mut().push(format!("{} {outcome}", ctx.name));
            result
        }
    }

    let (mut tree, p) = p_tree();
    let log = Rc::new(RefCell::new(Vec::new()));
    tree.add_action_middleware(p, Audit(log.clone())).unwrap();
    tree.add_atomic_middleware(p, "edit").unwrap();

    let result: TreeResult<()> = tree.run_action(p, "edit", vec![], |tree| {
        tree.set(p, "x", 1)?;
        Err(boom())
    });
    assert!(result.is_err());
    assert_eq!(tree.get_snapshot(p).unwrap(), p_snapshot());
    assert_eq!(*log.borrow(), ["edit err"]);
}
