//! Action tracking middleware.
//!
//! Turns the raw middleware protocol into lifecycle hooks:
//!
//! - sync action: `on_start`, `on_resume`, body, `on_suspend`, `on_finish`;
//! - flow spawn step: `on_start`, `on_resume`, `on_suspend`;
//! - flow resume step: `on_resume`, body, `on_suspend`;
//! - flow return/throw step: `on_resume`, `on_suspend`, then `on_finish`
//!   with the spawn context.
//!
//! While a tracked child runs, a running tracked parent is suspended and
//! resumed again when the child pauses.

use std::rc::Rc;

use super::context::{ActionContext, AsyncStepType, DataKey};
use super::middleware::{ActionMiddleware, ActionResult, Next};
use crate::tree::Tree;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionTrackingResult {
    Return,
    Throw,
}

impl ActionTrackingResult {
    pub fn of(result: &ActionResult) -> Self {
        match result {
            Ok(()) => ActionTrackingResult::Return,
            Err(_) => ActionTrackingResult::Throw,
        }
    }
}

pub trait ActionTrackingHooks {
    /// Decides tracking for sync actions and spawn steps. Later steps of a
    /// flow follow the decision made for their spawn step.
    fn filter(&self, _tree: &Tree, _ctx: &Rc<ActionContext>) -> bool {
        true
    }

    fn on_start(&self, _tree: &mut Tree, _ctx: &Rc<ActionContext>) {}

    fn on_resume(&self, _tree: &mut Tree, _ctx: &Rc<ActionContext>) {}

    fn on_suspend(&self, _tree: &mut Tree, _ctx: &Rc<ActionContext>) {}

    /// May replace the outcome of the action.
    fn on_finish(&self, _tree: &mut Tree, _ctx: &Rc<ActionContext>, result: ActionResult) -> ActionResult {
        result
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Started,
    Running,
    Suspended,
    Finished,
}

#[derive(Debug, Clone, Copy)]
struct Tracked {
    phase: Phase,
    parent_running: bool,
}

pub struct ActionTrackingMiddleware<H> {
    hooks: H,
    key: DataKey,
}

impl<H: ActionTrackingHooks> ActionTrackingMiddleware<H> {
    pub fn new(hooks: H) -> Self {
        Self {
            hooks,
            key: DataKey::new(),
        }
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    fn state(&self, ctx: &ActionContext) -> Option<Tracked> {
        ctx.get_data(self.key)
    }

    fn set_phase(&self, ctx: &ActionContext, phase: Phase) {
        let parent_running = self.state(ctx).is_some_and(|s| s.parent_running);
        ctx.set_data(self.key, Tracked { phase, parent_running });
    }

    fn start(&self, tree: &mut Tree, ctx: &Rc<ActionContext>) {
        self.set_phase(ctx, Phase::Started);
        self.hooks.on_start(tree, ctx);
    }

    /// Nearest ancestor context this middleware tracks. Untracked contexts in
    /// between (actions outside the subtree, filtered actions) are skipped.
    fn tracked_parent(&self, ctx: &ActionContext) -> Option<Rc<ActionContext>> {
        let mut current = ctx.parent_context.clone();
        while let Some(parent) = current {
            if self.state(&parent).is_some() {
                return Some(parent);
            }
            current = parent.parent_context.clone();
        }
        None
    }

    fn resume(&self, tree: &mut Tree, ctx: &Rc<ActionContext>) {
        let mut parent_running = false;
        if let Some(parent) = self.tracked_parent(ctx) {
            if self.state(&parent).is_some_and(|s| s.phase == Phase::Running) {
                parent_running = true;
                self.hooks.on_suspend(tree, &parent);
            }
        }
        ctx.set_data(
            self.key,
            Tracked {
                phase: Phase::Running,
                parent_running,
            },
        );
        self.hooks.on_resume(tree, ctx);
    }

    fn suspend(&self, tree: &mut Tree, ctx: &Rc<ActionContext>) {
        let parent_running = self.state(ctx).is_some_and(|s| s.parent_running);
        ctx.set_data(
            self.key,
            Tracked {
                phase: Phase::Suspended,
                parent_running: false,
            },
        );
        self.hooks.on_suspend(tree, ctx);
        if parent_running {
            if let Some(parent) = self.tracked_parent(ctx) {
                self.hooks.on_resume(tree, &parent);
            }
        }
    }

    fn run_resumed(&self, tree: &mut Tree, ctx: &Rc<ActionContext>, next: Next<'_>) -> ActionResult {
        self.resume(tree, ctx);
        let result = next.run(tree);
        self.suspend(tree, ctx);
        result
    }

    fn finish(&self, tree: &mut Tree, ctx: &Rc<ActionContext>, result: ActionResult) -> ActionResult {
        self.set_phase(ctx, Phase::Finished);
        self.hooks.on_finish(tree, ctx, result)
    }
}

impl<H: ActionTrackingHooks> ActionMiddleware for ActionTrackingMiddleware<H> {
    fn filter(&self, tree: &Tree, ctx: &Rc<ActionContext>) -> bool {
        match ctx.async_step_type {
            None | Some(AsyncStepType::Spawn) => {
                let accepted = self.hooks.filter(tree, ctx);
                if accepted {
                    self.set_phase(ctx, Phase::Idle);
                }
                accepted
            }
            Some(_) => self.state(&ctx.spawn_context()).is_some(),
        }
    }

    fn call(&self, tree: &mut Tree, ctx: &Rc<ActionContext>, next: Next<'_>) -> ActionResult {
        match ctx.async_step_type {
            None => {
                self.start(tree, ctx);
                let result = self.run_resumed(tree, ctx, next);
                self.finish(tree, ctx, result)
            }
            Some(AsyncStepType::Spawn) => {
                self.start(tree, ctx);
                self.run_resumed(tree, ctx, next)
            }
            Some(AsyncStepType::Resume) => self.run_resumed(tree, ctx, next),
            Some(AsyncStepType::Return | AsyncStepType::Throw) => {
                let result = self.run_resumed(tree, ctx, next);
                self.finish(tree, &ctx.spawn_context(), result)
            }
        }
    }
}
