//! Action contexts.
//!
//! Every action invocation, and every step of a flow, runs under its own
//! [`ActionContext`]. Contexts link to the context that was current when they
//! started (`parent_context`), to the previous step of the same flow, and to
//! the single top-level context of their call tree.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;

use crate::node::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionType {
    Sync,
    Async,
}

/// Step of a flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AsyncStepType {
    /// The flow was started.
    Spawn,
    /// The flow continued after a pause.
    Resume,
    /// The flow completed.
    Return,
    /// The flow failed.
    Throw,
}

/// Private key into [`ActionContext`] data. Two keys never compare equal
/// unless one is a copy of the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DataKey(u64);

impl DataKey {
    pub fn new() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        DataKey(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for DataKey {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ActionContext {
    pub name: String,
    pub action_type: ActionType,
    /// `None` for sync actions.
    pub async_step_type: Option<AsyncStepType>,
    pub target: NodeId,
    pub args: Vec<Value>,
    pub parent_context: Option<Rc<ActionContext>>,
    pub previous_async_step_context: Option<Rc<ActionContext>>,
    /// `None` when this context is its own root.
    root: Option<Rc<ActionContext>>,
    data: RefCell<HashMap<DataKey, Box<dyn Any>>>,
}

impl ActionContext {
    /// Builds a context and derives its root: the previous step's root for
    /// flow steps, the parent's root for nested calls, itself otherwise.
    pub(crate) fn new(
        name: String,
        action_type: ActionType,
        async_step_type: Option<AsyncStepType>,
        target: NodeId,
        args: Vec<Value>,
        parent_context: Option<Rc<ActionContext>>,
        previous_async_step_context: Option<Rc<ActionContext>>,
    ) -> Rc<Self> {
        let root = previous_async_step_context
            .as_ref()
            .or(parent_context.as_ref())
            .map(ActionContext::root_context);
        Rc::new(ActionContext {
            name,
            action_type,
            async_step_type,
            target,
            args,
            parent_context,
            previous_async_step_context,
            root,
            data: RefCell::new(HashMap::new()),
        })
    }

    pub fn root_context(self: &Rc<Self>) -> Rc<ActionContext> {
        match &self.root {
            Some(root) => Rc::clone(root),
            None => Rc::clone(self),
        }
    }

    pub fn is_root(&self) -> bool {
        self.root.is_none()
    }

    /// First step of the flow this context belongs to; `self` for sync
    /// actions and spawn steps.
    pub fn spawn_context(self: &Rc<Self>) -> Rc<ActionContext> {
        let mut current = Rc::clone(self);
        while let Some(prev) = current.previous_async_step_context.clone() {
            current = prev;
        }
        current
    }

    pub fn set_data<T: Any>(&self, key: DataKey, value: T) {
        self.data.borrow_mut().insert(key, Box::new(value));
    }

    pub fn get_data<T: Any + Clone>(&self, key: DataKey) -> Option<T> {
        self.data.borrow().get(&key)?.downcast_ref::<T>().cloned()
    }

    pub fn remove_data<T: Any>(&self, key: DataKey) -> Option<T> {
        let boxed = self.data.borrow_mut().remove(&key)?;
        boxed.downcast::<T>().ok().map(|b| *b)
    }
}

impl fmt::Debug for ActionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionContext")
            .field("name", &self.name)
            .field("action_type", &self.action_type)
            .field("async_step_type", &self.async_step_type)
            .field("target", &self.target)
            .field("args", &self.args)
            .field("has_parent", &self.parent_context.is_some())
            .field("is_root", &self.is_root())
            .finish()
    }
}
