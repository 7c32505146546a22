//! Property tests for the shape of the built tree.
//!
//! Whatever mix of literal, `:name` and `*` patterns is registered, every
//! node must keep its label in sync with its prefix, point back at its real
//! parent, and own at most one param and one catch-all child.

use galley_router::{NodeKind, NodeRef, RouterBuilder};
use http::Method;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;

fn segment_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => "[abc]{1,3}",
        1 => "[xyz]{1,2}".prop_map(|name| format!(":{name}")),
    ]
}

fn tail_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => Just(String::new()),
        1 => Just("*".to_string()),
        1 => "[xyz]{1,2}".prop_map(|name| format!("*{name}")),
    ]
}

fn pattern_strategy() -> impl Strategy<Value = String> {
    (prop::collection::vec(segment_strategy(), 1..4), tail_strategy()).prop_map(
        |(segments, tail)| {
            let mut pattern = format!("/{}", segments.join("/"));
            if !tail.is_empty() {
                pattern.push('/');
                pattern.push_str(&tail);
            }
            pattern
        },
    )
}

/// Replaces `:name` segments with `v` and the catch-all with `r/s`. Neither
/// value can match a literal segment from the strategy alphabet.
fn concrete_path(pattern: &str) -> String {
    pattern
        .split('/')
        .map(|segment| match segment.as_bytes().first() {
            Some(b':') => "v",
            Some(b'*') => "r/s",
            _ => segment,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn check_node(node: NodeRef<'_, usize>, is_root: bool) -> Result<usize, TestCaseError> {
    let prefix = node.prefix_bytes();

    if is_root {
        prop_assert!(node.parent().is_none());
    } else {
        prop_assert!(!prefix.is_empty(), "empty prefix on {:?}", node);
    }
    if let Some(&first) = prefix.first() {
        prop_assert_eq!(node.label(), first, "label out of sync on {:?}", node);
    }

    match node.kind() {
        NodeKind::Param => prop_assert_eq!(prefix, b":"),
        NodeKind::CatchAll => {
            prop_assert_eq!(prefix, b"*");
            prop_assert_eq!(node.children().count(), 0);
        }
        NodeKind::Static => {}
    }

    let children: Vec<_> = node.children().collect();
    let params = children.iter().filter(|c| c.kind() == NodeKind::Param).count();
    let catch_alls = children.iter().filter(|c| c.kind() == NodeKind::CatchAll).count();
    prop_assert!(params <= 1, "{} param children under {:?}", params, node);
    prop_assert!(catch_alls <= 1, "{} catch-all children under {:?}", catch_alls, node);

    let mut static_labels: Vec<u8> = children
        .iter()
        .filter(|c| c.kind() == NodeKind::Static)
        .map(NodeRef::label)
        .collect();
    let before = static_labels.len();
    static_labels.sort_unstable();
    static_labels.dedup();
    prop_assert_eq!(static_labels.len(), before, "static siblings share a label under {:?}", node);

    let mut visited = 1;
    for child in children {
        let parent = child.parent().map(|p| p.id());
        prop_assert_eq!(parent, Some(node.id()), "wrong parent on {:?}", child);
        visited += check_node(child, false)?;
    }
    Ok(visited)
}

proptest! {
    #[test]
    fn tree_shape_holds_for_mixed_patterns(
        patterns in prop::collection::vec(pattern_strategy(), 1..30)
    ) {
        let mut builder = RouterBuilder::new();
        for (i, pattern) in patterns.iter().enumerate() {
            builder.insert(&Method::GET, pattern, i).unwrap();
        }
        let router = builder.build();

        let visited = check_node(router.root(), true)?;
        prop_assert_eq!(visited, router.node_count());
    }

    #[test]
    fn mixed_patterns_resolve_their_concrete_paths(
        patterns in prop::collection::vec(pattern_strategy(), 1..30)
    ) {
        let mut builder = RouterBuilder::new();
        for (i, pattern) in patterns.iter().enumerate() {
            builder.insert(&Method::GET, pattern, i).unwrap();
        }
        let router = builder.build();

        let mut params = router.params();
        for pattern in &patterns {
            let path = concrete_path(pattern);
            prop_assert!(
                router.find(&Method::GET, &path, &mut params).is_found(),
                "{} (from {}) did not resolve",
                path,
                pattern
            );
        }
    }
}
