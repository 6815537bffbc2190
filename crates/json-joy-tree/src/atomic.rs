//! Atomic actions.
//!
//! [`AtomicMiddleware`] makes one action on one node all-or-nothing: when the
//! top-level invocation of that action fails, every mutation recorded while
//! it (or any action it called) was running is reverted by replaying the
//! inverse patches backwards. Mutations made while the action is suspended,
//! such as between flow steps, are not recorded and not reverted.

use std::rc::Rc;

use crate::action::{
    ActionContext, ActionMiddleware, ActionResult, ActionTrackingHooks, ActionTrackingMiddleware,
    DataKey, MiddlewareHandle, Next,
};
use crate::error::{TreeError, TreeResult};
use crate::node::{NodeId, NodeKind};
use crate::patch::PatchRecorder;
use crate::tree::Tree;

pub struct AtomicMiddleware {
    tracker: ActionTrackingMiddleware<AtomicHooks>,
}

struct AtomicHooks {
    model: NodeId,
    action_name: String,
    recorder_key: DataKey,
}

impl AtomicMiddleware {
    /// Fails with [`TreeError::InvalidTarget`] when `model` is not a tracked
    /// object node or `action_name` is empty.
    pub fn new(tree: &Tree, model: NodeId, action_name: &str) -> TreeResult<Self> {
        if action_name.is_empty() {
            return Err(TreeError::InvalidTarget("action name must not be empty".into()));
        }
        match tree.kind(model) {
            Ok(NodeKind::Object) => {}
            _ => {
                return Err(TreeError::InvalidTarget(format!(
                    "{model} is not a tracked object node"
                )))
            }
        }
        Ok(Self {
            tracker: ActionTrackingMiddleware::new(AtomicHooks {
                model,
                action_name: action_name.to_string(),
                recorder_key: DataKey::new(),
            }),
        })
    }

    pub fn model(&self) -> NodeId {
        self.tracker.hooks().model
    }

    pub fn action_name(&self) -> &str {
        &self.tracker.hooks().action_name
    }
}

impl ActionMiddleware for AtomicMiddleware {
    fn filter(&self, tree: &Tree, ctx: &Rc<ActionContext>) -> bool {
        self.tracker.filter(tree, ctx)
    }

    fn call(&self, tree: &mut Tree, ctx: &Rc<ActionContext>, next: Next<'_>) -> ActionResult {
        self.tracker.call(tree, ctx, next)
    }
}

impl AtomicHooks {
    fn recorder(&self, ctx: &Rc<ActionContext>) -> Option<PatchRecorder> {
        ctx.root_context().get_data(self.recorder_key)
    }
}

impl ActionTrackingHooks for AtomicHooks {
    fn filter(&self, _tree: &Tree, ctx: &Rc<ActionContext>) -> bool {
        let root = ctx.root_context();
        root.target == self.model && root.name == self.action_name
    }

    fn on_start(&self, tree: &mut Tree, ctx: &Rc<ActionContext>) {
        if ctx.is_root() {
            ctx.set_data(self.recorder_key, tree.patch_recorder(false));
        }
    }

    fn on_resume(&self, _tree: &mut Tree, ctx: &Rc<ActionContext>) {
        if let Some(recorder) = self.recorder(ctx) {
            recorder.set_recording(true);
        }
    }

    fn on_suspend(&self, _tree: &mut Tree, ctx: &Rc<ActionContext>) {
        if let Some(recorder) = self.recorder(ctx) {
            recorder.set_recording(false);
        }
    }

    fn on_finish(&self, tree: &mut Tree, ctx: &Rc<ActionContext>, result: ActionResult) -> ActionResult {
        if !ctx.is_root() {
            return result;
        }
        let Some(recorder) = ctx.remove_data::<PatchRecorder>(self.recorder_key) else {
            return result;
        };
        recorder.set_recording(false);
        let outcome = match result {
            Ok(()) => Ok(()),
            Err(original) => {
                tracing::debug!(
                    action = %self.action_name,
                    events = recorder.event_count(),
                    "rolling back atomic action"
                );
                match recorder.undo(tree) {
                    Ok(()) => {
                        tracing::debug!(action = %self.action_name, "rollback complete");
                        Err(original)
                    }
                    Err(source) => {
                        tracing::warn!(
                            action = %self.action_name,
                            error = %source,
                            "rollback failed; tree is partially restored"
                        );
                        Err(TreeError::RollbackFailure {
                            original: Box::new(original),
                            source: Box::new(source),
                        })
                    }
                }
            }
        };
        recorder.dispose();
        outcome
    }
}

impl Tree {
    /// Registers an [`AtomicMiddleware`] for `action_name` on `model`.
    pub fn add_atomic_middleware(
        &mut self,
        model: NodeId,
        action_name: &str,
    ) -> TreeResult<MiddlewareHandle> {
        let middleware = AtomicMiddleware::new(self, model, action_name)?;
        self.add_action_middleware(model, middleware)
    }
}
