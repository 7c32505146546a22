//! Per-node HTTP method dispatch table.
//!
//! Every trie node that terminates a route owns a [`MethodTable`] mapping
//! each of the nine standard HTTP verbs to the value registered for it.

use http::Method;

/// The HTTP verbs a route can be registered under, in table order.
pub const KNOWN_METHODS: [Method; 9] = [
    Method::CONNECT,
    Method::DELETE,
    Method::GET,
    Method::HEAD,
    Method::OPTIONS,
    Method::PATCH,
    Method::POST,
    Method::PUT,
    Method::TRACE,
];

/// Returns the table slot for a method, or `None` for extension methods.
fn slot(method: &Method) -> Option<usize> {
    match *method {
        Method::CONNECT => Some(0),
        Method::DELETE => Some(1),
        Method::GET => Some(2),
        Method::HEAD => Some(3),
        Method::OPTIONS => Some(4),
        Method::PATCH => Some(5),
        Method::POST => Some(6),
        Method::PUT => Some(7),
        Method::TRACE => Some(8),
        _ => None,
    }
}

/// Returns true if `method` is one of the [`KNOWN_METHODS`].
#[must_use]
pub fn is_known_method(method: &Method) -> bool {
    slot(method).is_some()
}

/// Maps HTTP methods to registered values for a single trie node.
///
/// # Example
///
/// ```rust
/// use galley_router::MethodTable;
/// use http::Method;
///
/// let mut table = MethodTable::new();
/// table.set(&Method::GET, "listUsers");
/// table.set(&Method::POST, "createUser");
///
/// assert_eq!(table.get(&Method::GET), Some(&"listUsers"));
/// assert_eq!(table.get(&Method::DELETE), None);
/// assert_eq!(table.allowed_methods(), vec![Method::GET, Method::POST]);
/// ```
#[derive(Debug, Clone)]
pub struct MethodTable<T> {
    slots: [Option<T>; 9],
}

impl<T> Default for MethodTable<T> {
    fn default() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
        }
    }
}

impl<T> MethodTable<T> {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` for `method`, returning the value it replaced.
    ///
    /// Extension methods are ignored and handed back unchanged in `Err`.
    pub fn set(&mut self, method: &Method, value: T) -> Result<Option<T>, T> {
        match slot(method) {
            Some(i) => Ok(self.slots[i].replace(value)),
            None => Err(value),
        }
    }

    /// Returns the value registered for `method`.
    #[must_use]
    pub fn get(&self, method: &Method) -> Option<&T> {
        slot(method).and_then(|i| self.slots[i].as_ref())
    }

    /// Returns true if no method has a value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Returns the methods that have a value, in [`KNOWN_METHODS`] order.
    #[must_use]
    pub fn allowed_methods(&self) -> Vec<Method> {
        let mut methods = Vec::with_capacity(KNOWN_METHODS.len());
        self.write_allowed(&mut methods);
        methods
    }

    /// Appends the allowed methods to `out` without allocating a new vector.
    pub fn write_allowed(&self, out: &mut Vec<Method>) {
        out.extend(self.iter().map(|(method, _)| method.clone()));
    }

    /// Iterates over `(method, value)` pairs with a value present.
    pub fn iter(&self) -> impl Iterator<Item = (&Method, &T)> {
        KNOWN_METHODS
            .iter()
            .zip(&self.slots)
            .filter_map(|(m, v)| v.as_ref().map(|v| (m, v)))
    }
}
