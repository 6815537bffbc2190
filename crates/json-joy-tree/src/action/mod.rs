//! Actions, flows and the middleware chain around them.

pub mod context;
pub mod middleware;
pub mod tracking;
mod wrap;

pub use context::{ActionContext, ActionType, AsyncStepType, DataKey};
pub use middleware::{ActionMiddleware, ActionResult, MiddlewareChain, MiddlewareHandle, Next};
pub use tracking::{ActionTrackingHooks, ActionTrackingMiddleware, ActionTrackingResult};
pub use wrap::Flow;
