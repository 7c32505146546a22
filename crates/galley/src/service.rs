//! The frozen application.

use std::collections::HashMap;

use galley_core::{Dispatcher, PooledContext, RequestId};
use http::Method;

use crate::path::fill_pattern;

/// A registered route, as listed by [`Service::routes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub(crate) method: Method,
    pub(crate) pattern: String,
    pub(crate) name: Option<String>,
}

impl RouteEntry {
    /// The HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The registration pattern, with its leading `/`.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The route name, if one was given.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// An immutable application ready to dispatch requests.
///
/// Built by [`App::build`](crate::App::build). Share it behind an `Arc` to
/// dispatch from many tasks.
#[derive(Debug)]
pub struct Service {
    name: String,
    dispatcher: Dispatcher,
    routes: Vec<RouteEntry>,
    names: HashMap<String, String>,
}

impl Service {
    pub(crate) fn new(
        name: String,
        dispatcher: Dispatcher,
        routes: Vec<RouteEntry>,
        names: HashMap<String, String>,
    ) -> Self {
        Self {
            name,
            dispatcher,
            routes,
            names,
        }
    }

    /// Returns the application name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the underlying dispatcher, for resolving into caller-owned
    /// contexts.
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Lists every route in registration order.
    #[must_use]
    pub fn routes(&self) -> &[RouteEntry] {
        &self.routes
    }

    /// Resolves and runs a request.
    ///
    /// The returned context holds the outcome and goes back to the pool when
    /// dropped.
    pub async fn dispatch(&self, method: Method, path: &str) -> PooledContext {
        self.dispatcher.dispatch(method, path).await
    }

    /// Like [`Service::dispatch`] with a caller-supplied request id.
    pub async fn dispatch_with_id(
        &self,
        request_id: RequestId,
        method: Method,
        path: &str,
    ) -> PooledContext {
        self.dispatcher
            .dispatch_with_id(request_id, method, path)
            .await
    }

    /// Builds a concrete path for a named route.
    ///
    /// Each `:name` segment and the catch-all take their value from
    /// `params`; an unnamed catch-all is keyed `"*"`. Returns `None` if the
    /// name is unknown or a value is missing. Values are inserted as given.
    #[must_use]
    pub fn url_for(&self, name: &str, params: &[(&str, &str)]) -> Option<String> {
        let pattern = self.names.get(name)?;
        fill_pattern(pattern, params)
    }
}
