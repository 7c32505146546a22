//! Route groups.

use std::fmt;
use std::sync::Arc;

use galley_core::Handler;
use galley_router::{RouteError, KNOWN_METHODS};
use http::Method;

use crate::app::App;
use crate::path::join_paths;

/// Routes sharing a path prefix and middleware.
///
/// Created by [`App::group`]. Route paths are joined to the prefix and
/// cleaned, so `//` collapses and `.` / `..` segments are resolved. Group
/// middleware runs after the application's before-handlers and before the
/// route handler. Nested groups inherit their parent's middleware.
pub struct Group<'a> {
    app: &'a mut App,
    prefix: String,
    middleware: Vec<Arc<dyn Handler>>,
}

impl fmt::Debug for Group<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Group")
            .field("prefix", &self.prefix)
            .field("middleware", &self.middleware.len())
            .finish_non_exhaustive()
    }
}

impl<'a> Group<'a> {
    pub(crate) fn new(app: &'a mut App, prefix: String, middleware: Vec<Arc<dyn Handler>>) -> Self {
        Self {
            app,
            prefix,
            middleware,
        }
    }

    /// Returns the cleaned prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Adds middleware for routes registered on this group after this call.
    pub fn use_middleware<H: Handler>(&mut self, handler: H) -> &mut Self {
        self.middleware.push(Arc::new(handler));
        self
    }

    /// Opens a nested group. Its prefix is joined to this one and it starts
    /// with a copy of this group's middleware.
    pub fn group<F>(&mut self, prefix: &str, f: F) -> &mut Self
    where
        F: FnOnce(&mut Group<'_>),
    {
        let prefix = join_paths(&self.prefix, prefix);
        let middleware = self.middleware.clone();
        let mut nested = Group::new(&mut *self.app, prefix, middleware);
        f(&mut nested);
        self
    }

    /// Names the routes added by the most recent registration call.
    pub fn name(&mut self, name: &str) -> &mut Self {
        self.app.name(name);
        self
    }

    verb_methods!();

    fn register(
        &mut self,
        methods: &[Method],
        path: &str,
        handler: Arc<dyn Handler>,
    ) -> Result<(), RouteError> {
        let full = join_paths(&self.prefix, path);
        self.app
            .register_with(methods, &full, &self.middleware, handler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use galley_core::{handler_fn, DispatchContext};

    fn noop() -> impl Handler {
        handler_fn(|ctx: &mut DispatchContext| ctx.advance())
    }

    fn patterns(app: App) -> Vec<String> {
        app.build()
            .routes()
            .iter()
            .map(|r| r.pattern().to_string())
            .collect()
    }

    #[test]
    fn test_group_joins_and_cleans() {
        let mut app = App::new();
        app.group("/api/", |g| {
            assert_eq!(g.prefix(), "/api");
            g.get("users", noop());
            g.get("//teams/./:id", noop());
            g.get("/v1/../health", noop());
            g.get("", noop());
        });

        assert_eq!(
            patterns(app),
            ["/api/users", "/api/teams/:id", "/api/health", "/api"]
        );
    }

    #[test]
    fn test_nested_groups() {
        let mut app = App::new();
        app.group("/api", |api| {
            api.group("/v1", |v1| {
                v1.group("admin", |admin| {
                    admin.delete("/users/:id", noop());
                });
            });
        });

        assert_eq!(patterns(app), ["/api/v1/admin/users/:id"]);
    }

    #[test]
    fn test_group_name_and_errors() {
        let mut app = App::new();
        app.group("/files", |g| {
            g.get("/*path", noop()).name("file");
            assert!(g.try_get("/:", noop()).is_err());
            assert!(g.try_route("PURGE", "/x", noop()).is_err());
        });

        let service = app.build();
        assert_eq!(
            service.url_for("file", &[("path", "a/b")]).as_deref(),
            Some("/files/a/b")
        );
    }
}
