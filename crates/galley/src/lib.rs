//! # Galley
//!
//! An HTTP request router built on a compressed radix trie.
//!
//! - Static, `:param` and trailing `*` catch-all segments, matched with
//!   static > param > catch-all precedence and backtracking
//! - Per-route handler chains with global and group middleware
//! - Pooled, reusable dispatch contexts
//! - Named routes and reverse routing
//!
//! ## Quick Start
//!
//! ```rust
//! use galley::{handler_fn, App, DispatchContext};
//! use http::{Method, StatusCode};
//!
//! let mut app = App::new();
//!
//! app.use_middleware(handler_fn(|ctx: &mut DispatchContext| {
//!     Box::pin(async move {
//!         ctx.set("user", String::from("ada"));
//!         ctx.advance().await;
//!     })
//! }));
//!
//! app.get("/users/:id", handler_fn(|ctx: &mut DispatchContext| {
//!     Box::pin(async move {
//!         assert_eq!(ctx.get_str("user"), Some("ada"));
//!         ctx.set_status(StatusCode::OK);
//!     })
//! }));
//!
//! let service = app.build();
//!
//! let ctx = tokio_test::block_on(service.dispatch(Method::GET, "/users/42"));
//! assert_eq!(ctx.status(), Some(StatusCode::OK));
//! assert_eq!(ctx.param("id"), Some("42"));
//! ```
//!
//! ## Architecture
//!
//! ```text
//!   App ── register ──► RouterBuilder<HandlerChain> ── build ──► Service
//!                                                                  │
//!   dispatch(method, path) ◄───────────────────────────────────────┘
//!     │
//!     ├─ ContextPool::acquire
//!     ├─ Router::find ──► Found / MethodNotAllowed / NotFound
//!     ├─ install chain
//!     └─ advance ──► middleware ──► handler ──► after ──► release
//! ```

#![doc(html_root_url = "https://docs.rs/galley/0.1.0")]

#[macro_use]
mod macros;

mod app;
mod group;
mod path;
mod service;

pub use app::App;
pub use group::Group;
pub use service::{RouteEntry, Service};

pub use galley_config as config;
pub use galley_core as core;
pub use galley_router as router;
pub use galley_telemetry as telemetry;

pub use galley_config::GalleyConfig;
pub use galley_core::{
    handler_fn, DispatchContext, Handler, HandlerChain, PooledContext, RequestId, Resolution,
};
pub use galley_router::RouteError;

/// Installs the global `tracing` subscriber described by `config.logging`.
///
/// No subscriber is installed when logging is disabled. Metric descriptions are
/// registered with whatever recorder the host has installed.
///
/// # Errors
///
/// Returns an error if the level is not a valid filter or a global
/// subscriber is already installed.
pub fn init_logging(config: &GalleyConfig) -> Result<(), galley_telemetry::TelemetryError> {
    galley_telemetry::init_logging(&config.logging.log_config())?;
    galley_telemetry::describe_metrics();
    Ok(())
}

/// Prelude module for convenient imports.
///
/// ```rust
/// use galley::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{App, Group, Service};
    pub use galley_core::{
        handler_fn, BoxFuture, DispatchContext, Handler, Resolution, RequestId,
    };
    pub use galley_router::RouteError;
}
