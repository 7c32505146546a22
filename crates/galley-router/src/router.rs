//! Route registration and lookup.
//!
//! Registration happens on a [`RouterBuilder`]. [`RouterBuilder::build`]
//! consumes it and returns a [`Router`], which has no mutation API and can be
//! shared across threads for lookups.

use std::fmt;
use std::sync::Arc;

use http::Method;

use crate::error::RouteError;
use crate::method_table::is_known_method;
use crate::node::{Leaf, Lookup, NodeKind, NodeRef, Tree};
use crate::params::Params;

/// A registered `(method, pattern)` pair, as reported by [`Router::routes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo<'a> {
    /// The HTTP method.
    pub method: Method,
    /// The registration pattern.
    pub pattern: &'a str,
}

/// Checks the pattern grammar before anything touches the tree, so a
/// rejected pattern leaves no branch nodes behind.
fn validate(pattern: &str) -> Result<(), RouteError> {
    let bytes = pattern.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b':' if matches!(bytes.get(i + 1), None | Some(b'/')) => {
                return Err(RouteError::EmptyParamName {
                    pattern: pattern.to_string(),
                });
            }
            b'*' => {
                if pattern[i + 1..].contains('/') {
                    return Err(RouteError::CatchAllNotLast {
                        pattern: pattern.to_string(),
                    });
                }
                return Ok(());
            }
            _ => {}
        }
    }
    Ok(())
}

/// Mutable route table used during bootstrap.
///
/// # Example
///
/// ```rust
/// use galley_router::{Lookup, RouterBuilder};
/// use http::Method;
///
/// let mut builder = RouterBuilder::new();
/// builder.insert(&Method::GET, "/users/:id", "getUser").unwrap();
/// builder.insert(&Method::GET, "/users/new", "newUser").unwrap();
/// let router = builder.build();
///
/// let mut params = router.params();
/// match router.find(&Method::GET, "/users/42", &mut params) {
///     Lookup::Found(m) => {
///         assert_eq!(*m.value, "getUser");
///         assert_eq!(params.value("/users/42", 0), Some("42"));
///     }
///     _ => unreachable!(),
/// }
/// ```
#[derive(Clone)]
pub struct RouterBuilder<T> {
    tree: Tree<T>,
    max_params: usize,
}

impl<T> Default for RouterBuilder<T> {
    fn default() -> Self {
        Self {
            tree: Tree::default(),
            max_params: 0,
        }
    }
}

impl<T> fmt::Debug for RouterBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterBuilder")
            .field("nodes", &self.tree.len())
            .field("max_params", &self.max_params)
            .finish()
    }
}

impl<T> RouterBuilder<T> {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `value` for `method` on `pattern`.
    ///
    /// Patterns are literal text with `:name` segments and an optional
    /// trailing `*` (or `*name`) catch-all. A missing leading `/` is added.
    /// Registering the same method and pattern again replaces the value.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty pattern, an extension method, an empty
    /// parameter name, or segments after a catch-all.
    pub fn insert(&mut self, method: &Method, pattern: &str, value: T) -> Result<(), RouteError> {
        if pattern.is_empty() {
            return Err(RouteError::EmptyPath);
        }
        if !is_known_method(method) {
            return Err(RouteError::UnknownMethod(method.to_string()));
        }

        let mut path = if pattern.starts_with('/') {
            pattern.to_string()
        } else {
            format!("/{pattern}")
        };
        validate(&path)?;

        let full: Arc<str> = Arc::from(path.as_str());
        let mut names: Vec<String> = Vec::new();
        let mut i = 0;

        while i < path.len() {
            match path.as_bytes()[i] {
                b':' => {
                    self.tree.insert(method, &path[..i], NodeKind::Static, None);

                    let start = i + 1;
                    let end = path[start..].find('/').map_or(path.len(), |k| start + k);
                    names.push(path[start..end].to_string());
                    path.replace_range(start..end, "");

                    if start == path.len() {
                        let leaf = self.leaf(value, full, names);
                        self.tree.insert(method, &path, NodeKind::Param, Some(leaf));
                        return Ok(());
                    }
                    self.tree.insert(method, &path[..start], NodeKind::Param, None);
                    i = start;
                }
                b'*' => {
                    self.tree.insert(method, &path[..i], NodeKind::Static, None);

                    let name = &path[i + 1..];
                    names.push(if name.is_empty() { "*" } else { name }.to_string());
                    path.truncate(i + 1);

                    let leaf = self.leaf(value, full, names);
                    self.tree.insert(method, &path, NodeKind::CatchAll, Some(leaf));
                    return Ok(());
                }
                _ => i += 1,
            }
        }

        let leaf = self.leaf(value, full, names);
        self.tree.insert(method, &path, NodeKind::Static, Some(leaf));
        Ok(())
    }

    fn leaf(&mut self, value: T, pattern: Arc<str>, names: Vec<String>) -> Leaf<T> {
        self.max_params = self.max_params.max(names.len());
        Leaf {
            value,
            pattern,
            param_names: names.into(),
        }
    }

    /// Returns the largest parameter count of any route registered so far.
    #[must_use]
    pub fn max_params(&self) -> usize {
        self.max_params
    }

    /// Freezes the table into an immutable [`Router`].
    #[must_use]
    pub fn build(self) -> Router<T> {
        let len = self.tree.nodes().map(|n| n.methods().iter().count()).sum();
        Router {
            tree: self.tree,
            max_params: self.max_params,
            len,
        }
    }
}

/// Immutable route table.
///
/// Built once by [`RouterBuilder::build`] and read concurrently afterwards.
#[derive(Clone)]
pub struct Router<T> {
    tree: Tree<T>,
    max_params: usize,
    len: usize,
}

impl<T> fmt::Debug for Router<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.len)
            .field("nodes", &self.tree.len())
            .field("max_params", &self.max_params)
            .finish()
    }
}

impl<T> Router<T> {
    /// Creates a builder.
    #[must_use]
    pub fn builder() -> RouterBuilder<T> {
        RouterBuilder::new()
    }

    /// Resolves `method` and `path`, binding parameter spans into `params`.
    ///
    /// `params` is cleared first. It should come from [`Router::params`] so
    /// that its capacity covers every route; a smaller slot array makes routes
    /// with more parameters unreachable.
    pub fn find<'a>(&'a self, method: &Method, path: &str, params: &mut Params) -> Lookup<'a, T> {
        self.tree.find(method, path, params)
    }

    /// Returns a slot array sized for the largest route.
    #[must_use]
    pub fn params(&self) -> Params {
        Params::with_capacity(self.max_params)
    }

    /// Returns the largest parameter count of any route.
    #[must_use]
    pub fn max_params(&self) -> usize {
        self.max_params
    }

    /// Returns the number of registered `(method, pattern)` pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no route is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of nodes in the tree.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.tree.len()
    }

    /// Returns the root node for inspection.
    #[must_use]
    pub fn root(&self) -> NodeRef<'_, T> {
        self.tree.root()
    }

    /// Lists every registered route.
    #[must_use]
    pub fn routes(&self) -> Vec<RouteInfo<'_>> {
        self.tree
            .nodes()
            .flat_map(|node| {
                node.methods().iter().map(move |(method, _)| RouteInfo {
                    method: method.clone(),
                    pattern: node.pattern(),
                })
            })
            .collect()
    }
}
