//! Running actions and flows under a context.

use std::rc::Rc;

use serde_json::Value;

use super::context::{ActionContext, ActionType, AsyncStepType};
use super::middleware::{ActionResult, MiddlewareChain};
use crate::error::{TreeError, TreeResult};
use crate::node::NodeId;
use crate::tree::Tree;

/// A started flow: an asynchronous action split into explicit steps.
///
/// Obtained from [`Tree::start_flow`]; each [`Tree::flow_step`] continues it
/// and [`Tree::finish_flow`] ends it. Between steps the flow is suspended.
#[derive(Debug)]
pub struct Flow {
    name: String,
    target: NodeId,
    args: Vec<Value>,
    last_step: Rc<ActionContext>,
}

impl Flow {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    /// Context of the most recent step.
    pub fn last_step(&self) -> &Rc<ActionContext> {
        &self.last_step
    }
}

impl Tree {
    /// The context of the innermost running action, if any.
    pub fn current_action_context(&self) -> Option<Rc<ActionContext>> {
        self.current_context.clone()
    }

    /// Runs `f` as the synchronous action `name` on `target`.
    ///
    /// A fresh context is current while `f` runs, wrapped by every middleware
    /// that applies to `target`. The caller's context is restored afterwards
    /// on success and on error alike.
    pub fn run_action<R>(
        &mut self,
        target: NodeId,
        name: &str,
        args: Vec<Value>,
        f: impl FnOnce(&mut Tree) -> TreeResult<R>,
    ) -> TreeResult<R> {
        self.check_target(target)?;
        let ctx = ActionContext::new(
            name.to_string(),
            ActionType::Sync,
            None,
            target,
            args,
            self.current_context.clone(),
            None,
        );
        self.invoke_body(&ctx, f)
    }

    /// Starts the flow `name` on `target` (the spawn step).
    pub fn start_flow(&mut self, target: NodeId, name: &str, args: Vec<Value>) -> TreeResult<Flow> {
        self.check_target(target)?;
        let ctx = ActionContext::new(
            name.to_string(),
            ActionType::Async,
            Some(AsyncStepType::Spawn),
            target,
            args.clone(),
            self.current_context.clone(),
            None,
        );
        self.invoke(&ctx, &mut |_: &mut Tree| Ok(()))?;
        Ok(Flow {
            name: name.to_string(),
            target,
            args,
            last_step: ctx,
        })
    }

    /// Runs `f` as a resume step of `flow`.
    pub fn flow_step<R>(
        &mut self,
        flow: &mut Flow,
        f: impl FnOnce(&mut Tree) -> TreeResult<R>,
    ) -> TreeResult<R> {
        self.check_target(flow.target)?;
        let ctx = self.step_context(flow, AsyncStepType::Resume);
        flow.last_step = Rc::clone(&ctx);
        self.invoke_body(&ctx, f)
    }

    /// Ends `flow` with a return step when `outcome` is `Ok`, a throw step
    /// otherwise. Returns the outcome as seen through the middlewares.
    pub fn finish_flow(&mut self, flow: Flow, outcome: ActionResult) -> ActionResult {
        let step = if outcome.is_ok() {
            AsyncStepType::Return
        } else {
            AsyncStepType::Throw
        };
        let ctx = self.step_context(&flow, step);
        let mut outcome = Some(outcome);
        self.invoke(&ctx, &mut |_: &mut Tree| outcome.take().unwrap_or(Ok(())))
    }

    fn step_context(&self, flow: &Flow, step: AsyncStepType) -> Rc<ActionContext> {
        ActionContext::new(
            flow.name.clone(),
            ActionType::Async,
            Some(step),
            flow.target,
            flow.args.clone(),
            self.current_context.clone(),
            Some(Rc::clone(&flow.last_step)),
        )
    }

    fn check_target(&self, target: NodeId) -> TreeResult<()> {
        if self.config().check_targets {
            self.assert_tracked(target)?;
        }
        Ok(())
    }

    fn invoke_body<R>(
        &mut self,
        ctx: &Rc<ActionContext>,
        f: impl FnOnce(&mut Tree) -> TreeResult<R>,
    ) -> TreeResult<R> {
        let mut f = Some(f);
        let mut out = None;
        self.invoke(ctx, &mut |tree: &mut Tree| -> ActionResult {
            let f = f
                .take()
                .ok_or_else(|| TreeError::Action(format!("action `{}` ran twice", ctx.name)))?;
            out = Some(f(tree)?);
            Ok(())
        })?;
        out.ok_or_else(|| TreeError::Action(format!("action `{}` was skipped by a middleware", ctx.name)))
    }

    /// Makes `ctx` current, runs `base` through the middleware chain and
    /// restores the previous context.
    fn invoke(
        &mut self,
        ctx: &Rc<ActionContext>,
        base: &mut dyn FnMut(&mut Tree) -> ActionResult,
    ) -> ActionResult {
        let previous = self.current_context.replace(Rc::clone(ctx));
        let chain = MiddlewareChain::compose(self, ctx);
        tracing::debug!(
            action = %ctx.name,
            target = %ctx.target,
            step = ?ctx.async_step_type,
            middlewares = chain.len(),
            "action started"
        );
        let result = chain.run(self, ctx, base);
        self.current_context = previous;
        tracing::debug!(action = %ctx.name, ok = result.is_ok(), "action finished");
        result
    }
}
