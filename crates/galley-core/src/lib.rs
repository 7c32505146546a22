//! Request dispatch for Galley.
//!
//! This crate turns a resolved route into running code:
//!
//! - [`DispatchContext`]: per-request state (bound parameters, status,
//!   shared key/value store) and the chain cursor
//! - [`Handler`] / [`HandlerChain`]: the units a route runs, in order
//! - [`ContextPool`]: a concurrent free list so contexts are reused
//! - [`Dispatcher`]: resolve plus run, with logging and metrics
//!
//! # Control flow
//!
//! ```text
//! acquire ──► reset ──► find ──► advance ──► handler 0 ──► advance ──► handler 1 ...
//!                                                │
//!                                       returns without advancing
//!                                                ▼
//!                                          chain stops ──► release
//! ```
//!
//! A handler continues the chain only by awaiting
//! [`DispatchContext::advance`]. There is no separate "next" object.

mod context;
mod dispatch;
mod handler;
mod pool;
mod request_id;

pub use context::{ChainStep, DispatchContext, Resolution};
pub use dispatch::Dispatcher;
pub use handler::{
    chain, handler_fn, method_not_allowed_chain, not_found_chain, BoxFuture, FnHandler, Handler,
    HandlerChain, MethodNotAllowedHandler, NotFoundHandler,
};
pub use pool::{ContextPool, PoolSettings, PooledContext};
pub use request_id::RequestId;
