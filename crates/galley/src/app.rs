//! Route registration.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use galley_config::GalleyConfig;
use galley_core::{chain, Dispatcher, Handler, HandlerChain, PoolSettings};
use galley_router::{is_known_method, RouteError, RouterBuilder, KNOWN_METHODS};
use galley_telemetry::log_route_registered;
use http::Method;
use tracing::{info, warn};

use crate::group::Group;
use crate::path::clean_path;
use crate::service::{RouteEntry, Service};

/// Application builder.
///
/// Collects middleware and routes, then freezes them into a [`Service`].
///
/// Each route's chain is fixed when the route is registered:
///
/// ```text
/// global before ++ group middleware ++ [route handler] ++ global after
/// ```
///
/// Middleware added later does not reach routes registered earlier.
///
/// # Example
///
/// ```rust
/// use galley::{handler_fn, App, DispatchContext};
/// use http::{Method, StatusCode};
///
/// let mut app = App::new();
/// app.get(
///     "/users/:id",
///     handler_fn(|ctx: &mut DispatchContext| {
///         Box::pin(async move { ctx.set_status(StatusCode::OK) })
///     }),
/// )
/// .name("user");
///
/// let service = app.build();
/// assert_eq!(service.url_for("user", &[("id", "7")]).as_deref(), Some("/users/7"));
/// ```
pub struct App {
    name: String,
    builder: RouterBuilder<HandlerChain>,
    before: Vec<Arc<dyn Handler>>,
    after: Vec<Arc<dyn Handler>>,
    routes: Vec<RouteEntry>,
    last: Vec<usize>,
    settings: PoolSettings,
    not_found: Option<HandlerChain>,
    method_not_allowed: Option<HandlerChain>,
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("name", &self.name)
            .field("routes", &self.routes.len())
            .field("before", &self.before.len())
            .field("after", &self.after.len())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    /// Creates an empty application with default pool settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: "galley".to_string(),
            builder: RouterBuilder::new(),
            before: Vec::new(),
            after: Vec::new(),
            routes: Vec::new(),
            last: Vec::new(),
            settings: PoolSettings::default(),
            not_found: None,
            method_not_allowed: None,
        }
    }

    /// Creates an application named and sized from configuration.
    ///
    /// Logging is not touched; see [`crate::init_logging`].
    #[must_use]
    pub fn from_config(config: &GalleyConfig) -> Self {
        let mut app = Self::new();
        app.name.clone_from(&config.app.name);
        app.settings = config.pool.settings();
        app
    }

    /// Overrides the context pool settings.
    pub fn pool_settings(&mut self, settings: PoolSettings) -> &mut Self {
        self.settings = settings;
        self
    }

    /// Adds a handler that runs before the route handler of every route
    /// registered after this call.
    pub fn use_middleware<H: Handler>(&mut self, handler: H) -> &mut Self {
        self.before.push(Arc::new(handler));
        self
    }

    /// Adds a handler that runs after the route handler of every route
    /// registered after this call.
    pub fn after<H: Handler>(&mut self, handler: H) -> &mut Self {
        self.after.push(Arc::new(handler));
        self
    }

    /// Replaces the chain run for unmatched paths.
    pub fn not_found<H: Handler>(&mut self, handler: H) -> &mut Self {
        self.not_found = Some(chain([Arc::new(handler) as Arc<dyn Handler>]));
        self
    }

    /// Replaces the chain run when a path matches only under other methods.
    pub fn method_not_allowed<H: Handler>(&mut self, handler: H) -> &mut Self {
        self.method_not_allowed = Some(chain([Arc::new(handler) as Arc<dyn Handler>]));
        self
    }

    /// Opens a route group under `prefix`.
    ///
    /// ```rust
    /// use galley::{handler_fn, App, DispatchContext};
    ///
    /// let noop = || handler_fn(|ctx: &mut DispatchContext| ctx.advance());
    ///
    /// let mut app = App::new();
    /// app.group("/api", |api| {
    ///     api.use_middleware(noop());
    ///     api.get("/users", noop());
    ///     api.group("v1", |v1| {
    ///         v1.get("/health", noop());
    ///     });
    /// });
    ///
    /// let service = app.build();
    /// let patterns: Vec<_> = service.routes().iter().map(|r| r.pattern().to_string()).collect();
    /// assert_eq!(patterns, ["/api/users", "/api/v1/health"]);
    /// ```
    pub fn group<F>(&mut self, prefix: &str, f: F) -> &mut Self
    where
        F: FnOnce(&mut Group<'_>),
    {
        let mut group = Group::new(self, clean_path(prefix), Vec::new());
        f(&mut group);
        self
    }

    /// Names the routes added by the most recent registration call.
    ///
    /// Names are used by [`Service::url_for`]. Reusing a name moves it to
    /// the new route.
    pub fn name(&mut self, name: &str) -> &mut Self {
        if self.last.is_empty() {
            warn!(route.name = name, "No route registered yet; name ignored");
            return self;
        }

        for entry in &mut self.routes {
            if entry.name.as_deref() == Some(name) {
                entry.name = None;
            }
        }
        for &i in &self.last {
            self.routes[i].name = Some(name.to_string());
        }
        self
    }

    verb_methods!();

    /// Registers one handler under several methods with extra middleware
    /// between the global before-handlers and the route handler.
    pub(crate) fn register_with(
        &mut self,
        methods: &[Method],
        path: &str,
        middleware: &[Arc<dyn Handler>],
        handler: Arc<dyn Handler>,
    ) -> Result<(), RouteError> {
        if let Some(unknown) = methods.iter().find(|m| !is_known_method(m)) {
            return Err(RouteError::UnknownMethod(unknown.to_string()));
        }

        let route_chain: HandlerChain = self
            .before
            .iter()
            .chain(middleware)
            .chain(std::iter::once(&handler))
            .chain(&self.after)
            .cloned()
            .collect();

        self.last.clear();
        for method in methods {
            self.builder
                .insert(method, path, Arc::clone(&route_chain))?;

            let pattern = if path.starts_with('/') {
                path.to_string()
            } else {
                format!("/{path}")
            };
            log_route_registered!(method, pattern);

            let index = match self
                .routes
                .iter()
                .position(|r| r.method == *method && r.pattern == pattern)
            {
                Some(i) => {
                    self.routes[i].name = None;
                    i
                }
                None => {
                    self.routes.push(RouteEntry {
                        method: method.clone(),
                        pattern,
                        name: None,
                    });
                    self.routes.len() - 1
                }
            };
            self.last.push(index);
        }

        Ok(())
    }

    fn register(
        &mut self,
        methods: &[Method],
        path: &str,
        handler: Arc<dyn Handler>,
    ) -> Result<(), RouteError> {
        self.register_with(methods, path, &[], handler)
    }

    /// Freezes the routes into a [`Service`].
    #[must_use]
    pub fn build(self) -> Service {
        let router = self.builder.build();
        info!(
            app = %self.name,
            routes = router.len(),
            max_params = router.max_params(),
            nodes = router.node_count(),
            "Route table built"
        );

        let mut dispatcher = Dispatcher::new(router, self.settings);
        if let Some(not_found) = self.not_found {
            dispatcher = dispatcher.with_not_found(not_found);
        }
        if let Some(method_not_allowed) = self.method_not_allowed {
            dispatcher = dispatcher.with_method_not_allowed(method_not_allowed);
        }

        let names: HashMap<String, String> = self
            .routes
            .iter()
            .filter_map(|r| r.name.clone().map(|n| (n, r.pattern.clone())))
            .collect();

        Service::new(self.name, dispatcher, self.routes, names)
    }
}
