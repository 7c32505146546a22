//! Handler trait and handler chains.
//!
//! A route resolves to a [`HandlerChain`]: middleware, the route handler and
//! any after-handlers, in the order they run. Handlers continue the chain by
//! awaiting [`DispatchContext::advance`]; a handler that returns without
//! advancing stops the chain there.
//!
//! # Example
//!
//! ```rust
//! use galley_core::{handler_fn, DispatchContext};
//!
//! let auth = handler_fn(|ctx: &mut DispatchContext| {
//!     Box::pin(async move {
//!         if ctx.contains("user") {
//!             ctx.advance().await;
//!         }
//!     })
//! });
//! # let _ = auth;
//! ```

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use http::StatusCode;

use crate::context::DispatchContext;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The ordered handlers installed for one route.
pub type HandlerChain = Arc<[Arc<dyn Handler>]>;

/// A unit of work in a handler chain.
///
/// Handlers receive exclusive access to the request's [`DispatchContext`] and
/// may suspend on I/O. To pass control to the next handler, await
/// [`DispatchContext::advance`].
pub trait Handler: Send + Sync + 'static {
    /// Returns a name for logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Runs the handler.
    fn call<'a>(&'a self, ctx: &'a mut DispatchContext) -> BoxFuture<'a, ()>;
}

/// Handler backed by a closure. Created by [`handler_fn`].
pub struct FnHandler<F> {
    f: F,
}

impl<F> fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler").finish_non_exhaustive()
    }
}

impl<F> Handler for FnHandler<F>
where
    F: for<'a> Fn(&'a mut DispatchContext) -> BoxFuture<'a, ()> + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        "fn"
    }

    fn call<'a>(&'a self, ctx: &'a mut DispatchContext) -> BoxFuture<'a, ()> {
        (self.f)(ctx)
    }
}

/// Wraps a closure returning a boxed future as a [`Handler`].
pub fn handler_fn<F>(f: F) -> FnHandler<F>
where
    F: for<'a> Fn(&'a mut DispatchContext) -> BoxFuture<'a, ()> + Send + Sync + 'static,
{
    FnHandler { f }
}

/// Collects handlers into a chain.
pub fn chain<I>(handlers: I) -> HandlerChain
where
    I: IntoIterator<Item = Arc<dyn Handler>>,
{
    handlers.into_iter().collect()
}

/// Sets 404 and stops the chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotFoundHandler;

impl Handler for NotFoundHandler {
    fn name(&self) -> &str {
        "not_found"
    }

    fn call<'a>(&'a self, ctx: &'a mut DispatchContext) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            ctx.set_status(StatusCode::NOT_FOUND);
        })
    }
}

/// Sets 405 and stops the chain. The allowed methods are already on the
/// context for the transport to render as an `Allow` header.
#[derive(Debug, Clone, Copy, Default)]
pub struct MethodNotAllowedHandler;

impl Handler for MethodNotAllowedHandler {
    fn name(&self) -> &str {
        "method_not_allowed"
    }

    fn call<'a>(&'a self, ctx: &'a mut DispatchContext) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            ctx.set_status(StatusCode::METHOD_NOT_ALLOWED);
        })
    }
}

/// The default chain for unmatched paths.
pub fn not_found_chain() -> HandlerChain {
    chain([Arc::new(NotFoundHandler) as Arc<dyn Handler>])
}

/// The default chain for paths matched under other methods.
pub fn method_not_allowed_chain() -> HandlerChain {
    chain([Arc::new(MethodNotAllowedHandler) as Arc<dyn Handler>])
}
