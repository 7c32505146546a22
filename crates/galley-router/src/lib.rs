//! Radix tree router for Galley.
//!
//! Routes are registered on a [`RouterBuilder`] and frozen into an immutable
//! [`Router`]. Lookups walk a compressed trie in O(path length), preferring
//! static children over parameters and parameters over catch-alls, and
//! backtrack to the last `/` boundary when a more specific branch dead-ends.
//!
//! The router is generic over the value stored per route, so it knows nothing
//! about handlers or request contexts.
//!
//! # Features
//!
//! - **Compressed trie**: shared prefixes are stored once and split on insert
//! - **Path parameters**: `/users/:id` binds one segment
//! - **Catch-all**: `/static/*` or `/files/*path` binds the rest of the path
//! - **Method tables**: one value per HTTP verb per route
//! - **No lookup allocation**: parameters are byte spans in a fixed-capacity slot array
//!
//! # Example
//!
//! ```rust
//! use galley_router::{Lookup, Router};
//! use http::Method;
//!
//! let mut builder = Router::builder();
//! builder.insert(&Method::GET, "/users", "listUsers").unwrap();
//! builder.insert(&Method::GET, "/users/:id", "getUser").unwrap();
//! builder.insert(&Method::GET, "/files/*path", "serveFile").unwrap();
//! let router = builder.build();
//!
//! let path = "/files/css/site.css";
//! let mut params = router.params();
//! match router.find(&Method::GET, path, &mut params) {
//!     Lookup::Found(m) => {
//!         assert_eq!(*m.value, "serveFile");
//!         assert_eq!(m.param_names[0], "path");
//!         assert_eq!(params.value(path, 0), Some("css/site.css"));
//!     }
//!     _ => unreachable!(),
//! }
//!
//! assert!(matches!(
//!     router.find(&Method::DELETE, "/users", &mut params),
//!     Lookup::MethodNotAllowed { .. }
//! ));
//! ```
//!
//! # Architecture
//!
//! Nodes live in an arena and refer to each other by index:
//!
//! ```text
//!               "/"
//!                │
//!        ┌───────┴────────┐
//!        │                │
//!     "users"         "files/"
//!     [GET]               │
//!        │               "*"
//!       "/"             [GET]
//!        │
//!       ":"
//!      [GET]
//! ```

mod error;
mod method_table;
mod node;
mod params;
mod router;

pub use error::RouteError;
pub use method_table::{is_known_method, MethodTable, KNOWN_METHODS};
pub use node::{Lookup, Match, NodeId, NodeKind, NodeRef};
pub use params::{Params, Span};
pub use router::{RouteInfo, Router, RouterBuilder};
