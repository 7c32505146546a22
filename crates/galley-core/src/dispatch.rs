//! Request dispatch.
//!
//! The [`Dispatcher`] owns the frozen route table and the context pool. Per
//! request it checks out a context, resolves the route into it and runs the
//! chain from the first handler.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use galley_router::{Lookup, Router};
use galley_telemetry::log_dispatch_complete;
use http::Method;
use tracing::{debug, info_span, Instrument};

use crate::context::{DispatchContext, Resolution};
use crate::handler::{method_not_allowed_chain, not_found_chain, HandlerChain};
use crate::pool::{ContextPool, PoolSettings, PooledContext};
use crate::request_id::RequestId;

/// Resolves requests against a frozen router and runs their chains.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use galley_core::{chain, handler_fn, DispatchContext, Dispatcher, Handler, HandlerChain, PoolSettings};
/// use galley_router::Router;
/// use http::{Method, StatusCode};
///
/// let hello: Arc<dyn Handler> = Arc::new(handler_fn(|ctx: &mut DispatchContext| {
///     Box::pin(async move { ctx.set_status(StatusCode::OK) })
/// }));
///
/// let mut builder = Router::<HandlerChain>::builder();
/// builder.insert(&Method::GET, "/hello/:name", chain([hello])).unwrap();
/// let dispatcher = Dispatcher::new(builder.build(), PoolSettings::default());
///
/// let ctx = tokio_test::block_on(dispatcher.dispatch(Method::GET, "/hello/world"));
/// assert_eq!(ctx.status(), Some(StatusCode::OK));
/// assert_eq!(ctx.param("name"), Some("world"));
/// ```
pub struct Dispatcher {
    router: Router<HandlerChain>,
    pool: ContextPool,
    not_found: HandlerChain,
    method_not_allowed: HandlerChain,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("router", &self.router)
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Creates a dispatcher with the default not-found and
    /// method-not-allowed chains.
    #[must_use]
    pub fn new(router: Router<HandlerChain>, settings: PoolSettings) -> Self {
        let pool = ContextPool::new(router.max_params(), settings);
        Self {
            router,
            pool,
            not_found: not_found_chain(),
            method_not_allowed: method_not_allowed_chain(),
        }
    }

    /// Replaces the chain run for unmatched paths.
    #[must_use]
    pub fn with_not_found(mut self, chain: HandlerChain) -> Self {
        self.not_found = chain;
        self
    }

    /// Replaces the chain run when the path matches under other methods.
    #[must_use]
    pub fn with_method_not_allowed(mut self, chain: HandlerChain) -> Self {
        self.method_not_allowed = chain;
        self
    }

    /// Returns the route table.
    #[must_use]
    pub fn router(&self) -> &Router<HandlerChain> {
        &self.router
    }

    /// Returns the context pool.
    #[must_use]
    pub fn pool(&self) -> &ContextPool {
        &self.pool
    }

    /// Checks out a context for [`Dispatcher::resolve`].
    #[must_use]
    pub fn acquire(&self) -> PooledContext {
        self.pool.acquire()
    }

    /// Resets `ctx` for a new request and resolves its route.
    pub fn resolve(&self, method: &Method, path: &str, ctx: &mut DispatchContext) -> Resolution {
        self.resolve_with_id(RequestId::new(), method, path, ctx)
    }

    /// Like [`Dispatcher::resolve`] with a caller-supplied request id.
    ///
    /// The lookup never fails: misses install the not-found chain and verb
    /// mismatches install the method-not-allowed chain.
    pub fn resolve_with_id(
        &self,
        request_id: RequestId,
        method: &Method,
        path: &str,
        ctx: &mut DispatchContext,
    ) -> Resolution {
        ctx.reset(request_id, method.clone(), path, Arc::clone(&self.not_found));

        match self.router.find(method, path, ctx.params_mut()) {
            Lookup::Found(m) => {
                ctx.bind_match(
                    Arc::clone(m.value),
                    Arc::clone(m.pattern),
                    Arc::clone(m.param_names),
                );
            }
            Lookup::MethodNotAllowed { methods, pattern } => {
                ctx.bind_method_not_allowed(
                    Arc::clone(&self.method_not_allowed),
                    Arc::clone(pattern),
                    methods,
                );
            }
            Lookup::NotFound => {}
        }

        debug!(
            request_id = %request_id,
            http.method = %method,
            http.path = path,
            http.route = ctx.pattern().unwrap_or_default(),
            outcome = ctx.resolution().as_str(),
            "Route resolved"
        );

        ctx.resolution()
    }

    /// Resolves and runs a request, returning the context for inspection.
    ///
    /// The returned guard goes back to the pool when dropped.
    pub async fn dispatch(&self, method: Method, path: &str) -> PooledContext {
        self.dispatch_with_id(RequestId::new(), method, path).await
    }

    /// Like [`Dispatcher::dispatch`] with a caller-supplied request id.
    pub async fn dispatch_with_id(
        &self,
        request_id: RequestId,
        method: Method,
        path: &str,
    ) -> PooledContext {
        let started = Instant::now();
        let mut ctx = self.pool.acquire();
        let resolution = self.resolve_with_id(request_id, &method, path, &mut ctx);

        let span = info_span!(
            "dispatch",
            request_id = %request_id,
            http.method = %method,
            http.path = path,
        );
        ctx.advance().instrument(span).await;

        let outcome = resolution.as_str();
        let status = ctx.status().map(|s| s.as_u16());
        log_dispatch_complete!(request_id, outcome, status);
        galley_telemetry::record_dispatch(outcome, started.elapsed());

        ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{chain, handler_fn, Handler};
    use galley_router::RouterBuilder;
    use http::StatusCode;

    fn status_handler(status: StatusCode) -> Arc<dyn Handler> {
        Arc::new(handler_fn(move |ctx: &mut DispatchContext| {
            Box::pin(async move {
                ctx.set_status(status);
                ctx.advance().await;
            })
        }))
    }

    fn dispatcher() -> Dispatcher {
        let mut builder = RouterBuilder::new();
        builder
            .insert(&Method::GET, "/users/:id", chain([status_handler(StatusCode::OK)]))
            .unwrap();
        builder
            .insert(&Method::PUT, "/users/:id", chain([status_handler(StatusCode::ACCEPTED)]))
            .unwrap();
        builder
            .insert(&Method::GET, "/static/*", chain([status_handler(StatusCode::OK)]))
            .unwrap();
        Dispatcher::new(builder.build(), PoolSettings::default())
    }

    #[tokio::test]
    async fn test_dispatch_matched_route() {
        let d = dispatcher();
        let ctx = d.dispatch(Method::GET, "/users/42").await;

        assert_eq!(ctx.resolution(), Resolution::Matched);
        assert_eq!(ctx.status(), Some(StatusCode::OK));
        assert_eq!(ctx.param("id"), Some("42"));
        assert_eq!(ctx.pattern(), Some("/users/:id"));
        assert!(ctx.is_complete());
    }

    #[tokio::test]
    async fn test_dispatch_not_found() {
        let d = dispatcher();
        let ctx = d.dispatch(Method::GET, "/nope").await;

        assert_eq!(ctx.resolution(), Resolution::NotFound);
        assert_eq!(ctx.status(), Some(StatusCode::NOT_FOUND));
        assert!(ctx.pattern().is_none());
    }

    #[tokio::test]
    async fn test_dispatch_method_not_allowed() {
        let d = dispatcher();
        let ctx = d.dispatch(Method::DELETE, "/users/42").await;

        assert_eq!(ctx.resolution(), Resolution::MethodNotAllowed);
        assert_eq!(ctx.status(), Some(StatusCode::METHOD_NOT_ALLOWED));
        assert_eq!(ctx.allowed_methods(), &[Method::GET, Method::PUT]);
        assert_eq!(ctx.param("id"), None);
    }

    #[tokio::test]
    async fn test_custom_not_found_chain() {
        let d = dispatcher().with_not_found(chain([status_handler(StatusCode::GONE)]));
        let ctx = d.dispatch(Method::GET, "/nope").await;
        assert_eq!(ctx.status(), Some(StatusCode::GONE));
    }

    #[tokio::test]
    async fn test_catch_all_param() {
        let d = dispatcher();
        let ctx = d.dispatch(Method::GET, "/static/a/b/c.png").await;
        assert_eq!(ctx.param("*"), Some("a/b/c.png"));
    }

    #[test]
    fn test_pool_reuse_does_not_leak_params() {
        let d = dispatcher();

        let mut first = d.acquire();
        d.resolve(&Method::GET, "/users/42", &mut first);
        assert_eq!(first.param("id"), Some("42"));
        first.release();

        let mut second = d.acquire();
        assert_eq!(d.pool().created(), 1);
        assert_eq!(second.param("id"), None);

        d.resolve(&Method::GET, "/nope", &mut second);
        assert_eq!(second.param("id"), None);
        assert_eq!(second.params().count(), 0);
    }

    #[test]
    fn test_resolve_with_id() {
        let d = dispatcher();
        let id = RequestId::new();
        let mut ctx = d.acquire();
        let resolution = d.resolve_with_id(id, &Method::PUT, "/users/1", &mut ctx);
        assert_eq!(resolution, Resolution::Matched);
        assert_eq!(ctx.request_id(), id);
    }

    #[test]
    fn test_pool_sized_for_router() {
        let d = dispatcher();
        assert_eq!(d.pool().param_capacity(), d.router().max_params());
    }
}
