//! Per-request dispatch context.
//!
//! The [`DispatchContext`] carries one request through its handler chain: the
//! resolved chain and cursor, bound path parameters, the status chosen by the
//! handlers, and a typed key/value store for passing data down the chain.
//!
//! Contexts are pooled (see [`ContextPool`](crate::ContextPool)) and reused
//! across requests, so every buffer here is cleared rather than reallocated.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use galley_router::{MethodTable, Params};
use http::{Method, StatusCode};

use crate::handler::{BoxFuture, Handler, HandlerChain};
use crate::request_id::RequestId;

/// How the router resolved the current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Resolution {
    /// A route matched path and method.
    Matched,
    /// No route matched the path.
    #[default]
    NotFound,
    /// The path matched, but not under the request method.
    MethodNotAllowed,
}

impl Resolution {
    /// Returns the label used in logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Matched => "matched",
            Self::NotFound => "not_found",
            Self::MethodNotAllowed => "method_not_allowed",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step of the chain iterator.
pub enum ChainStep {
    /// The next handler to run.
    Invoke(Arc<dyn Handler>),
    /// Every handler has been reached.
    Complete,
}

impl fmt::Debug for ChainStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invoke(handler) => f.debug_tuple("Invoke").field(&handler.name()).finish(),
            Self::Complete => f.write_str("Complete"),
        }
    }
}

/// Mutable per-request state, owned by a pool between requests.
pub struct DispatchContext {
    request_id: RequestId,
    method: Method,
    path: String,
    params: Params,
    param_names: Option<Arc<[String]>>,
    pattern: Option<Arc<str>>,
    resolution: Resolution,
    allowed: Vec<Method>,
    status: Option<StatusCode>,
    chain: Option<HandlerChain>,
    cursor: Option<usize>,
    state: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl fmt::Debug for DispatchContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchContext")
            .field("request_id", &self.request_id)
            .field("method", &self.method)
            .field("path", &self.path)
            .field("pattern", &self.pattern)
            .field("resolution", &self.resolution)
            .field("status", &self.status)
            .field("cursor", &self.cursor)
            .field("state_keys", &self.state.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl DispatchContext {
    /// Creates a context whose parameter slots hold `param_capacity` values.
    ///
    /// The capacity should be the router's
    /// [`max_params`](galley_router::Router::max_params).
    #[must_use]
    pub fn new(param_capacity: usize) -> Self {
        Self {
            request_id: RequestId::new(),
            method: Method::GET,
            path: String::new(),
            params: Params::with_capacity(param_capacity),
            param_names: None,
            pattern: None,
            resolution: Resolution::NotFound,
            allowed: Vec::new(),
            status: None,
            chain: None,
            cursor: None,
            state: HashMap::new(),
        }
    }

    /// Prepares the context for a new request.
    ///
    /// Everything from the previous request is cleared and `default_chain`
    /// (normally the not-found chain) is installed with the cursor before
    /// its first handler.
    pub fn reset(
        &mut self,
        request_id: RequestId,
        method: Method,
        path: &str,
        default_chain: HandlerChain,
    ) {
        self.request_id = request_id;
        self.method = method;
        self.path.clear();
        self.path.push_str(path);
        self.params.clear();
        self.param_names = None;
        self.pattern = None;
        self.resolution = Resolution::NotFound;
        self.allowed.clear();
        self.status = None;
        self.chain = Some(default_chain);
        self.cursor = None;
        self.state.clear();
    }

    /// Drops request-scoped values before the context goes back to the pool.
    pub(crate) fn recycle(&mut self) {
        self.chain = None;
        self.param_names = None;
        self.pattern = None;
        self.state.clear();
    }

    pub(crate) fn params_mut(&mut self) -> &mut Params {
        &mut self.params
    }

    pub(crate) fn bind_match(
        &mut self,
        chain: HandlerChain,
        pattern: Arc<str>,
        param_names: Arc<[String]>,
    ) {
        self.resolution = Resolution::Matched;
        self.chain = Some(chain);
        self.pattern = Some(pattern);
        self.param_names = Some(param_names);
        self.cursor = None;
    }

    pub(crate) fn bind_method_not_allowed(
        &mut self,
        chain: HandlerChain,
        pattern: Arc<str>,
        methods: &MethodTable<HandlerChain>,
    ) {
        self.resolution = Resolution::MethodNotAllowed;
        self.chain = Some(chain);
        self.pattern = Some(pattern);
        self.allowed.clear();
        methods.write_allowed(&mut self.allowed);
        self.cursor = None;
    }

    /// Replaces the chain and rewinds the cursor.
    ///
    /// Useful for hosts that divert a request to an error chain.
    pub fn install(&mut self, chain: HandlerChain) {
        self.chain = Some(chain);
        self.cursor = None;
    }

    /// Returns the request id.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the pattern the path matched, if any.
    #[must_use]
    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref()
    }

    /// Returns how the router resolved the request.
    #[must_use]
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Returns the methods the matched path accepts. Only populated for
    /// [`Resolution::MethodNotAllowed`].
    #[must_use]
    pub fn allowed_methods(&self) -> &[Method] {
        &self.allowed
    }

    /// Returns the status chosen by the handlers.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Sets the response status.
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    /// Returns the names of the current route's parameters.
    #[must_use]
    pub fn param_names(&self) -> &[String] {
        self.param_names.as_deref().unwrap_or_default()
    }

    /// Returns the value bound to parameter `name` in the current route.
    ///
    /// An unnamed catch-all is bound as `*`.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        let index = self.param_names().iter().position(|n| n == name)?;
        self.params.value(&self.path, index)
    }

    /// Iterates over `(name, value)` pairs of the current route.
    pub fn params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.param_names()
            .iter()
            .zip(self.params.iter())
            .filter_map(|(name, span)| span.slice(&self.path).map(|value| (name.as_str(), value)))
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn set<V>(&mut self, key: impl Into<String>, value: V)
    where
        V: Any + Send + Sync,
    {
        self.state.insert(key.into(), Box::new(value));
    }

    /// Returns the value under `key` if it has type `V`.
    #[must_use]
    pub fn get<V: Any>(&self, key: &str) -> Option<&V> {
        self.state.get(key).and_then(|v| v.downcast_ref::<V>())
    }

    /// Returns a mutable reference to the value under `key` if it has type `V`.
    pub fn get_mut<V: Any>(&mut self, key: &str) -> Option<&mut V> {
        self.state.get_mut(key).and_then(|v| v.downcast_mut::<V>())
    }

    /// Returns the value under `key` as a string slice, if it is a `String`
    /// or a `&'static str`.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        let value = self.state.get(key)?;
        value
            .downcast_ref::<String>()
            .map(String::as_str)
            .or_else(|| value.downcast_ref::<&'static str>().copied())
    }

    /// Removes and returns the value under `key`.
    pub fn remove(&mut self, key: &str) -> Option<Box<dyn Any + Send + Sync>> {
        self.state.remove(key)
    }

    /// Returns true if a value is stored under `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.state.contains_key(key)
    }

    /// Iterates over the stored keys in arbitrary order.
    pub fn state_keys(&self) -> impl Iterator<Item = &str> {
        self.state.keys().map(String::as_str)
    }

    /// Returns the index of the handler most recently reached, `None` before
    /// the first.
    #[must_use]
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Returns true once the cursor has moved past the last handler.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        let len = self.chain.as_ref().map_or(0, |c| c.len());
        self.cursor.is_some_and(|c| c >= len)
    }

    /// Moves the cursor forward and returns the handler it lands on.
    ///
    /// The cursor never moves backwards; stepping past the end keeps
    /// returning [`ChainStep::Complete`].
    pub fn step(&mut self) -> ChainStep {
        let len = self.chain.as_ref().map_or(0, |c| c.len());
        let next = self.cursor.map_or(0, |c| c + 1).min(len);
        self.cursor = Some(next);
        match &self.chain {
            Some(chain) if next < len => ChainStep::Invoke(Arc::clone(&chain[next])),
            _ => ChainStep::Complete,
        }
    }

    /// Runs the next handler in the chain.
    ///
    /// Handlers call this to pass control on; the future resolves once the
    /// rest of the chain has returned. Does nothing when the chain is
    /// complete.
    pub fn advance(&mut self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            if let ChainStep::Invoke(handler) = self.step() {
                handler.call(self).await;
            }
        })
    }
}
