//! Radix tree node implementation.
//!
//! The tree is stored as an arena: every node lives in one `Vec` and refers
//! to its children and parent by index. The parent link is a plain index and
//! owns nothing.
//!
//! Each node consumes a `prefix` of the request path. Static nodes hold
//! literal text, a Param node has the one-byte prefix `:` and consumes up to
//! the next `/`, and a CatchAll node has the prefix `*` and consumes the rest
//! of the path.

use std::borrow::Cow;
use std::sync::Arc;

use http::Method;
use smallvec::SmallVec;

use crate::method_table::MethodTable;
use crate::params::{Params, Span};

/// Index of a node inside the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// The root node, which always exists.
    pub const ROOT: Self = Self(0);

    /// Returns the raw arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Kind of path segment a node matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Literal text.
    Static,
    /// A `:name` segment, matching up to the next `/`.
    Param,
    /// A trailing `*`, matching the remainder of the path.
    CatchAll,
}

/// The payload attached to the node that terminates a route.
#[derive(Debug)]
pub(crate) struct Leaf<T> {
    pub value: T,
    pub pattern: Arc<str>,
    pub param_names: Arc<[String]>,
}

#[derive(Debug, Clone)]
pub(crate) struct Node<T> {
    kind: NodeKind,
    label: u8,
    prefix: Vec<u8>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    pattern: Arc<str>,
    param_names: Arc<[String]>,
    methods: MethodTable<T>,
}

impl<T> Node<T> {
    fn new(kind: NodeKind, prefix: &[u8], parent: Option<NodeId>) -> Self {
        Self {
            kind,
            label: prefix.first().copied().unwrap_or_default(),
            prefix: prefix.to_vec(),
            parent,
            children: Vec::new(),
            pattern: Arc::from(""),
            param_names: Arc::from(Vec::new()),
            methods: MethodTable::new(),
        }
    }

    fn attach(&mut self, method: &Method, leaf: Leaf<T>) {
        // The builder rejects extension methods before they get here.
        let _ = self.methods.set(method, leaf.value);
        self.pattern = leaf.pattern;
        if self.param_names.is_empty() {
            self.param_names = leaf.param_names;
        }
    }

    /// Parameter and catch-all alternatives are only tried after a `/`.
    fn is_segment_boundary(&self) -> bool {
        self.prefix.last() == Some(&b'/')
    }
}

/// Alternative branch remembered for backtracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Alternative {
    Param,
    CatchAll,
}

/// A point the lookup can resume from after a dead end.
#[derive(Debug, Clone, Copy)]
struct Marker {
    node: NodeId,
    pos: usize,
    next: Alternative,
    bound: usize,
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Descend,
    Param,
    CatchAll,
    Leaf,
    Backtrack,
}

/// Result of resolving a request path against the tree.
#[derive(Debug)]
pub enum Lookup<'a, T> {
    /// A route matched the path and method.
    Found(Match<'a, T>),
    /// The path matched a route registered only under other methods.
    ///
    /// This is the weakest outcome that still matched a path. A leaf without
    /// a value for the method does not end the lookup: backtracking goes on,
    /// and any other route that matches under the method wins. For example,
    /// with `POST /a/b` and `GET /a/*` registered, `GET /a/b` resolves to the
    /// catch-all. Only when no alternative matches is the first such leaf
    /// reported here.
    MethodNotAllowed {
        /// The method table of the matched route.
        methods: &'a MethodTable<T>,
        /// The pattern the path matched.
        pattern: &'a Arc<str>,
    },
    /// Nothing matched.
    NotFound,
}

impl<'a, T> Lookup<'a, T> {
    /// Returns true if a route matched.
    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// Returns the matched value, if any.
    #[must_use]
    pub fn value(&self) -> Option<&'a T> {
        match self {
            Self::Found(m) => Some(m.value),
            _ => None,
        }
    }
}

/// A successful route match.
///
/// Parameter values live in the [`Params`] passed to the lookup; they are
/// positionally correlated with `param_names`.
#[derive(Debug)]
pub struct Match<'a, T> {
    /// The value registered for the method.
    pub value: &'a T,
    /// The registration pattern, e.g. `/users/:id`.
    ///
    /// Patterns are kept per node, not per method. If the same path shape
    /// is registered again with different parameter names (`GET /u/:id`
    /// then `PUT /u/:uid`), this reports the latest pattern text for every
    /// method, while `param_names` keep the names from the first
    /// registration.
    pub pattern: &'a Arc<str>,
    /// Names of the bound parameters, in path order.
    pub param_names: &'a Arc<[String]>,
}

/// Length of the longest common prefix of `a` and `b`, in bytes.
///
/// Prefixes may end inside a multi-byte character; labels are bytes, so two
/// siblings never share a first byte.
fn longest_common_prefix(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// Arena holding every node of one router.
#[derive(Debug, Clone)]
pub(crate) struct Tree<T> {
    nodes: Vec<Node<T>>,
}

impl<T> Default for Tree<T> {
    fn default() -> Self {
        Self {
            nodes: vec![Node::new(NodeKind::Static, &[], None)],
        }
    }
}

impl<T> Tree<T> {
    fn node(&self, id: NodeId) -> &Node<T> {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node<T> {
        &mut self.nodes[id.0]
    }

    fn push(&mut self, node: Node<T>) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    fn child_with_label(&self, id: NodeId, label: u8) -> Option<NodeId> {
        self.node(id)
            .children
            .iter()
            .copied()
            .find(|&c| self.node(c).label == label)
    }

    fn static_child(&self, id: NodeId, label: u8) -> Option<NodeId> {
        self.node(id).children.iter().copied().find(|&c| {
            let child = self.node(c);
            child.kind == NodeKind::Static && child.label == label
        })
    }

    fn child_of_kind(&self, id: NodeId, kind: NodeKind) -> Option<NodeId> {
        self.node(id)
            .children
            .iter()
            .copied()
            .find(|&c| self.node(c).kind == kind)
    }

    fn add_child(&mut self, parent: NodeId, kind: NodeKind, prefix: &[u8]) -> NodeId {
        let child = self.push(Node::new(kind, prefix, Some(parent)));
        self.node_mut(parent).children.push(child);
        child
    }

    /// Splits `id` at byte `at`: the node keeps `prefix[..at]` and becomes a
    /// pure branch, and a new child takes over the suffix together with the
    /// old children and method table.
    fn split(&mut self, id: NodeId, at: usize) {
        let child_id = NodeId(self.nodes.len());
        let node = self.node_mut(id);
        let suffix = node.prefix.split_off(at);

        let mut child = Node::new(node.kind, &suffix, Some(id));
        child.children = std::mem::take(&mut node.children);
        child.methods = std::mem::take(&mut node.methods);
        child.pattern = std::mem::replace(&mut node.pattern, Arc::from(""));
        child.param_names = std::mem::replace(&mut node.param_names, Arc::from(Vec::new()));

        node.kind = NodeKind::Static;
        node.children.push(child_id);
        self.nodes.push(child);

        for i in 0..self.node(child_id).children.len() {
            let grandchild = self.node(child_id).children[i];
            self.node_mut(grandchild).parent = Some(child_id);
        }
    }

    /// Inserts `path` as a node of `kind`, attaching `leaf` for `method`
    /// when given. Without a leaf this only guarantees the path exists.
    pub(crate) fn insert(
        &mut self,
        method: &Method,
        path: &str,
        kind: NodeKind,
        leaf: Option<Leaf<T>>,
    ) {
        let mut id = NodeId::ROOT;
        let mut search = path.as_bytes();

        loop {
            let prefix_len = self.node(id).prefix.len();

            if prefix_len == 0 {
                // Fresh root adopts the whole path.
                let node = self.node_mut(id);
                node.label = search.first().copied().unwrap_or_default();
                node.prefix = search.to_vec();
                if let Some(leaf) = leaf {
                    node.kind = kind;
                    node.attach(method, leaf);
                }
                return;
            }

            let lcp = longest_common_prefix(search, &self.node(id).prefix);

            if lcp < prefix_len {
                self.split(id, lcp);
                if lcp == search.len() {
                    let node = self.node_mut(id);
                    node.kind = kind;
                    if let Some(leaf) = leaf {
                        node.attach(method, leaf);
                    }
                } else {
                    let child = self.add_child(id, kind, &search[lcp..]);
                    if let Some(leaf) = leaf {
                        self.node_mut(child).attach(method, leaf);
                    }
                }
                return;
            }

            if lcp < search.len() {
                search = &search[lcp..];
                if let Some(child) = self.child_with_label(id, search[0]) {
                    id = child;
                    continue;
                }
                let child = self.add_child(id, kind, search);
                if let Some(leaf) = leaf {
                    self.node_mut(child).attach(method, leaf);
                }
                return;
            }

            // Exact match: the node already represents this path.
            if let Some(leaf) = leaf {
                self.node_mut(id).attach(method, leaf);
            }
            return;
        }
    }

    /// Resolves `path` for `method`, writing parameter spans into `params`.
    ///
    /// Children are tried static first, then param, then catch-all. When a
    /// branch dead-ends the search resumes from the most recent marker; markers
    /// are only left at static nodes ending in `/`.
    pub(crate) fn find<'a>(
        &'a self,
        method: &Method,
        path: &str,
        params: &mut Params,
    ) -> Lookup<'a, T> {
        params.clear();

        let bytes = path.as_bytes();
        let mut markers: SmallVec<[Marker; 8]> = SmallVec::new();
        let mut fallback: Option<NodeId> = None;
        let mut id = NodeId::ROOT;
        let mut pos = 0;
        let mut step = Step::Descend;

        loop {
            match step {
                Step::Descend => {
                    let node = self.node(id);
                    if node.kind != NodeKind::Param {
                        let lcp = longest_common_prefix(&bytes[pos..], &node.prefix);
                        if lcp < node.prefix.len() {
                            step = Step::Backtrack;
                            continue;
                        }
                        pos += lcp;
                    }
                    if pos == bytes.len() {
                        step = Step::Leaf;
                        continue;
                    }
                    if let Some(child) = self.static_child(id, bytes[pos]) {
                        if let Some(next) = self.alternative_at(id) {
                            markers.push(Marker {
                                node: id,
                                pos,
                                next,
                                bound: params.len(),
                            });
                        }
                        id = child;
                        continue;
                    }
                    step = Step::Param;
                }

                Step::Param => {
                    let Some(child) = self.child_of_kind(id, NodeKind::Param) else {
                        step = Step::CatchAll;
                        continue;
                    };
                    let end = bytes[pos..]
                        .iter()
                        .position(|&b| b == b'/')
                        .map_or(bytes.len(), |i| pos + i);
                    let bound = params.len();
                    if !params.push(Span::new(pos, end)) {
                        step = Step::Backtrack;
                        continue;
                    }
                    if self.node(id).is_segment_boundary()
                        && self.child_of_kind(id, NodeKind::CatchAll).is_some()
                    {
                        markers.push(Marker {
                            node: id,
                            pos,
                            next: Alternative::CatchAll,
                            bound,
                        });
                    }
                    id = child;
                    pos = end;
                    step = Step::Descend;
                }

                Step::CatchAll => {
                    step = Step::Backtrack;
                    if let Some(child) = self.child_of_kind(id, NodeKind::CatchAll) {
                        if params.push(Span::new(pos, bytes.len())) {
                            id = child;
                            pos = bytes.len();
                            step = Step::Leaf;
                        }
                    }
                }

                Step::Leaf => {
                    let node = self.node(id);
                    if let Some(value) = node.methods.get(method) {
                        return self.found(id, value);
                    }
                    if !node.methods.is_empty() {
                        fallback.get_or_insert(id);
                    } else if let Some(any) = self.child_of_kind(id, NodeKind::CatchAll) {
                        // Directory-style lookup: the catch-all binds an empty value.
                        if params.push(Span::new(pos, pos)) {
                            let any_node = self.node(any);
                            if let Some(value) = any_node.methods.get(method) {
                                return self.found(any, value);
                            }
                            if !any_node.methods.is_empty() {
                                fallback.get_or_insert(any);
                            }
                            params.truncate(params.len() - 1);
                        }
                    }
                    step = Step::Backtrack;
                }

                Step::Backtrack => {
                    let Some(marker) = markers.pop() else {
                        return match fallback {
                            Some(leaf) => {
                                let node = self.node(leaf);
                                Lookup::MethodNotAllowed {
                                    methods: &node.methods,
                                    pattern: &node.pattern,
                                }
                            }
                            None => Lookup::NotFound,
                        };
                    };
                    id = marker.node;
                    pos = marker.pos;
                    params.truncate(marker.bound);
                    step = match marker.next {
                        Alternative::Param => Step::Param,
                        Alternative::CatchAll => Step::CatchAll,
                    };
                }
            }
        }
    }

    fn alternative_at(&self, id: NodeId) -> Option<Alternative> {
        if !self.node(id).is_segment_boundary() {
            return None;
        }
        if self.child_of_kind(id, NodeKind::Param).is_some() {
            Some(Alternative::Param)
        } else if self.child_of_kind(id, NodeKind::CatchAll).is_some() {
            Some(Alternative::CatchAll)
        } else {
            None
        }
    }

    fn found<'a>(&'a self, id: NodeId, value: &'a T) -> Lookup<'a, T> {
        let node = self.node(id);
        Lookup::Found(Match {
            value,
            pattern: &node.pattern,
            param_names: &node.param_names,
        })
    }

    /// Iterates over every node in arena order.
    pub(crate) fn nodes(&self) -> impl Iterator<Item = NodeRef<'_, T>> {
        (0..self.nodes.len()).map(move |i| NodeRef {
            tree: self,
            id: NodeId(i),
        })
    }

    pub(crate) fn root(&self) -> NodeRef<'_, T> {
        NodeRef {
            tree: self,
            id: NodeId::ROOT,
        }
    }
}

/// Read-only view of a node, for inspecting the shape of a built router.
pub struct NodeRef<'a, T> {
    tree: &'a Tree<T>,
    id: NodeId,
}

impl<T> Clone for NodeRef<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for NodeRef<'_, T> {}

impl<T> std::fmt::Debug for NodeRef<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("kind", &self.kind())
            .field("prefix", &self.prefix())
            .finish()
    }
}

impl<'a, T> NodeRef<'a, T> {
    fn inner(&self) -> &'a Node<T> {
        self.tree.node(self.id)
    }

    /// Returns the arena id of this node.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Returns the node kind.
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.inner().kind
    }

    /// Returns the first byte of the prefix.
    #[must_use]
    pub fn label(&self) -> u8 {
        self.inner().label
    }

    /// Returns the path text this node consumes.
    ///
    /// A split can leave a prefix ending mid-character, in which case the
    /// text is lossily decoded. [`NodeRef::prefix_bytes`] has the raw bytes.
    #[must_use]
    pub fn prefix(&self) -> Cow<'a, str> {
        String::from_utf8_lossy(&self.inner().prefix)
    }

    /// Returns the raw prefix bytes.
    #[must_use]
    pub fn prefix_bytes(&self) -> &'a [u8] {
        &self.inner().prefix
    }

    /// Returns the registration pattern, empty for pure branch nodes.
    #[must_use]
    pub fn pattern(&self) -> &'a str {
        &self.inner().pattern
    }

    /// Returns the parameter names bound along this route.
    #[must_use]
    pub fn param_names(&self) -> &'a [String] {
        &self.inner().param_names
    }

    /// Returns the method table of this node.
    #[must_use]
    pub fn methods(&self) -> &'a MethodTable<T> {
        &self.inner().methods
    }

    /// Returns the parent node, `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<NodeRef<'a, T>> {
        self.inner().parent.map(|id| NodeRef {
            tree: self.tree,
            id,
        })
    }

    /// Iterates over the children in insertion order.
    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a, T>> + 'a {
        let tree = self.tree;
        self.inner()
            .children
            .iter()
            .map(move |&id| NodeRef { tree, id })
    }

    /// Returns the child whose prefix is exactly `prefix`.
    #[must_use]
    pub fn child(&self, prefix: &str) -> Option<NodeRef<'a, T>> {
        self.children().find(|c| c.prefix_bytes() == prefix.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(value: &'static str, pattern: &str, names: &[&str]) -> Leaf<&'static str> {
        Leaf {
            value,
            pattern: Arc::from(pattern),
            param_names: names.iter().map(|n| (*n).to_string()).collect(),
        }
    }

    fn insert_static(tree: &mut Tree<&'static str>, path: &str, value: &'static str) {
        tree.insert(&Method::GET, path, NodeKind::Static, Some(leaf(value, path, &[])));
    }

    #[test]
    fn test_longest_common_prefix() {
        assert_eq!(longest_common_prefix(b"/users", b"/usage"), 3);
        assert_eq!(longest_common_prefix(b"/a", b"/a"), 2);
        assert_eq!(longest_common_prefix(b"", b"/a"), 0);
    }

    #[test]
    fn test_split_inside_multibyte_char() {
        // 'é' and 'è' share their first UTF-8 byte.
        assert_eq!(longest_common_prefix("/é".as_bytes(), "/è".as_bytes()), 2);

        let mut tree = Tree::default();
        insert_static(&mut tree, "/é", "e-acute");
        insert_static(&mut tree, "/è", "e-grave");

        let root = tree.root();
        assert_eq!(root.prefix_bytes(), b"/\xC3");
        assert_eq!(root.children().count(), 2);

        let mut params = Params::default();
        assert!(matches!(
            tree.find(&Method::GET, "/è", &mut params),
            Lookup::Found(Match { value: &"e-grave", .. })
        ));
    }

    #[test]
    fn test_root_adopts_first_path() {
        let mut tree = Tree::default();
        insert_static(&mut tree, "/users", "listUsers");

        let root = tree.root();
        assert_eq!(root.prefix(), "/users");
        assert_eq!(root.label(), b'/');
        assert_eq!(root.methods().get(&Method::GET), Some(&"listUsers"));
    }

    #[test]
    fn test_split_creates_branch() {
        let mut tree = Tree::default();
        insert_static(&mut tree, "/ab", "ab");
        insert_static(&mut tree, "/ac", "ac");

        let root = tree.root();
        assert_eq!(root.prefix(), "/a");
        assert!(root.methods().is_empty());

        let prefixes: Vec<_> = root.children().map(|c| c.prefix()).collect();
        assert_eq!(prefixes, vec!["b", "c"]);

        let b = root.child("b").unwrap();
        assert_eq!(b.methods().get(&Method::GET), Some(&"ab"));
        assert_eq!(b.parent().unwrap().id(), NodeId::ROOT);
    }

    #[test]
    fn test_split_at_exact_insert_point() {
        let mut tree = Tree::default();
        insert_static(&mut tree, "/users/all", "all");
        insert_static(&mut tree, "/users", "users");

        let root = tree.root();
        assert_eq!(root.prefix(), "/users");
        assert_eq!(root.methods().get(&Method::GET), Some(&"users"));
        assert_eq!(root.pattern(), "/users");

        let child = root.child("/all").unwrap();
        assert_eq!(child.methods().get(&Method::GET), Some(&"all"));
        assert_eq!(child.pattern(), "/users/all");
    }

    #[test]
    fn test_split_reparents_grandchildren() {
        let mut tree = Tree::default();
        insert_static(&mut tree, "/abc", "abc");
        insert_static(&mut tree, "/abcd", "abcd");
        insert_static(&mut tree, "/ax", "ax");

        let root = tree.root();
        assert_eq!(root.prefix(), "/a");
        let bc = root.child("bc").unwrap();
        let d = bc.child("d").unwrap();
        assert_eq!(d.parent().unwrap().id(), bc.id());
        assert_eq!(bc.parent().unwrap().id(), root.id());
    }

    #[test]
    fn test_find_static_and_miss() {
        let mut tree = Tree::default();
        insert_static(&mut tree, "/ab", "ab");
        insert_static(&mut tree, "/ac", "ac");

        let mut params = Params::with_capacity(0);
        assert!(matches!(
            tree.find(&Method::GET, "/ab", &mut params),
            Lookup::Found(Match { value: &"ab", .. })
        ));
        assert!(matches!(
            tree.find(&Method::GET, "/ac", &mut params),
            Lookup::Found(Match { value: &"ac", .. })
        ));
        assert!(matches!(
            tree.find(&Method::GET, "/a", &mut params),
            Lookup::NotFound
        ));
        assert!(matches!(
            tree.find(&Method::GET, "/abc", &mut params),
            Lookup::NotFound
        ));
    }

    #[test]
    fn test_find_on_empty_tree() {
        let tree: Tree<&str> = Tree::default();
        let mut params = Params::default();
        assert!(matches!(
            tree.find(&Method::GET, "/", &mut params),
            Lookup::NotFound
        ));
    }

    #[test]
    fn test_param_node_has_colon_prefix() {
        let mut tree = Tree::default();
        tree.insert(&Method::GET, "/users/", NodeKind::Static, None);
        tree.insert(
            &Method::GET,
            "/users/:",
            NodeKind::Param,
            Some(leaf("getUser", "/users/:id", &["id"])),
        );

        let param = tree.root().child(":").unwrap();
        assert_eq!(param.kind(), NodeKind::Param);
        assert_eq!(param.param_names(), ["id".to_string()]);

        let mut params = Params::with_capacity(1);
        match tree.find(&Method::GET, "/users/42", &mut params) {
            Lookup::Found(m) => {
                assert_eq!(*m.value, "getUser");
                assert_eq!(m.pattern.as_ref(), "/users/:id");
                assert_eq!(params.value("/users/42", 0), Some("42"));
            }
            other => panic!("expected match, got {other:?}"),
        }
    }

    #[test]
    fn test_exact_insert_keeps_first_param_names() {
        let mut tree = Tree::default();
        tree.insert(&Method::GET, "/u/", NodeKind::Static, None);
        tree.insert(&Method::GET, "/u/:", NodeKind::Param, Some(leaf("get", "/u/:id", &["id"])));
        tree.insert(&Method::PUT, "/u/:", NodeKind::Param, Some(leaf("put", "/u/:uid", &["uid"])));

        let param = tree.root().child(":").unwrap();
        assert_eq!(param.param_names(), ["id".to_string()]);
        assert_eq!(param.pattern(), "/u/:uid");
        assert_eq!(param.methods().get(&Method::PUT), Some(&"put"));
    }

    #[test]
    fn test_nodes_iterates_arena() {
        let mut tree = Tree::default();
        insert_static(&mut tree, "/ab", "ab");
        insert_static(&mut tree, "/ac", "ac");
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.nodes().count(), 3);
    }
}
