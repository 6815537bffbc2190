//! Action middlewares.
//!
//! A middleware is registered for a subtree and wraps every action whose
//! target lies in that subtree. Middlewares that pass their filter are
//! composed into one chain around the action body. The first registered
//! middleware is the outermost.

use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use super::context::ActionContext;
use crate::error::{TreeError, TreeResult};
use crate::node::NodeId;
use crate::tree::Tree;

pub type ActionResult = Result<(), TreeError>;

pub trait ActionMiddleware {
    /// Whether this middleware wraps the action described by `ctx`.
    fn filter(&self, _tree: &Tree, _ctx: &Rc<ActionContext>) -> bool {
        true
    }

    /// Runs around the rest of the chain. Skipping `next` skips the action.
    fn call(&self, tree: &mut Tree, ctx: &Rc<ActionContext>, next: Next<'_>) -> ActionResult;
}

/// The remainder of a middleware chain.
pub struct Next<'a> {
    chain: &'a [Rc<dyn ActionMiddleware>],
    ctx: &'a Rc<ActionContext>,
    base: &'a mut dyn FnMut(&mut Tree) -> ActionResult,
}

impl Next<'_> {
    pub fn run(self, tree: &mut Tree) -> ActionResult {
        match self.chain.split_first() {
            Some((middleware, rest)) => middleware.call(
                tree,
                self.ctx,
                Next {
                    chain: rest,
                    ctx: self.ctx,
                    base: self.base,
                },
            ),
            None => (self.base)(tree),
        }
    }
}

/// Middlewares wrapping one action, outermost first.
pub struct MiddlewareChain {
    middlewares: Vec<Rc<dyn ActionMiddleware>>,
}

impl MiddlewareChain {
    /// Selects the middlewares registered on the target or one of its
    /// ancestors whose filter accepts `ctx`.
    pub fn compose(tree: &Tree, ctx: &Rc<ActionContext>) -> Self {
        let ancestors: Vec<NodeId> =
            std::iter::successors(Some(ctx.target), |n| tree.fast_get_parent(*n))
                .take(tree.parents.len() + 1)
                .collect();
        let middlewares = tree
            .middlewares
            .entries
            .iter()
            .filter(|r| ancestors.contains(&r.subtree_root))
            .map(|r| Rc::clone(&r.middleware))
            .filter(|m| m.filter(tree, ctx))
            .collect();
        MiddlewareChain { middlewares }
    }

    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    pub fn run(
        &self,
        tree: &mut Tree,
        ctx: &Rc<ActionContext>,
        base: &mut dyn FnMut(&mut Tree) -> ActionResult,
    ) -> ActionResult {
        Next {
            chain: &self.middlewares,
            ctx,
            base,
        }
        .run(tree)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MiddlewareHandle(u64);

struct Registered {
    handle: MiddlewareHandle,
    subtree_root: NodeId,
    middleware: Rc<dyn ActionMiddleware>,
}

#[derive(Default)]
pub(crate) struct MiddlewareRegistry {
    next_id: u64,
    entries: Vec<Registered>,
}

impl MiddlewareRegistry {
    /// Drops registrations whose subtree root was freed.
    pub(crate) fn forget_roots(&mut self, freed: &HashSet<NodeId>) {
        self.entries.retain(|r| {
            let keep = !freed.contains(&r.subtree_root);
            if !keep {
                tracing::debug!(handle = ?r.handle, subtree_root = %r.subtree_root, "action middleware dropped with its subtree");
            }
            keep
        });
    }
}

impl fmt::Debug for MiddlewareRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareRegistry")
            .field("registered", &self.entries.len())
            .finish()
    }
}

impl Tree {
    /// Registers `middleware` for every action targeting `subtree_root` or a
    /// node below it.
    pub fn add_action_middleware(
        &mut self,
        subtree_root: NodeId,
        middleware: impl ActionMiddleware + 'static,
    ) -> TreeResult<MiddlewareHandle> {
        self.assert_tracked(subtree_root)?;
        let registry = &mut self.middlewares;
        let handle = MiddlewareHandle(registry.next_id);
        registry.next_id += 1;
        registry.entries.push(Registered {
            handle,
            subtree_root,
            middleware: Rc::new(middleware),
        });
        tracing::debug!(%subtree_root, ?handle, "action middleware added");
        Ok(handle)
    }

    /// Returns `false` when the handle was already removed.
    pub fn remove_action_middleware(&mut self, handle: MiddlewareHandle) -> bool {
        let before = self.middlewares.entries.len();
        self.middlewares.entries.retain(|r| r.handle != handle);
        let removed = self.middlewares.entries.len() != before;
        if removed {
            tracing::debug!(?handle, "action middleware removed");
        }
        removed
    }
}
