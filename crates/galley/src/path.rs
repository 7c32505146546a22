//! Pattern path helpers for groups and reverse routing.

/// Returns the rooted, lexically clean form of `path`.
///
/// Empty and `.` segments are dropped, `..` removes the previous segment
/// (never climbing above the root) and the result has no trailing slash
/// unless it is the root itself.
pub(crate) fn clean_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }

    if segments.is_empty() {
        return "/".to_string();
    }

    let mut out = String::with_capacity(path.len() + 1);
    for segment in segments {
        out.push('/');
        out.push_str(segment);
    }
    out
}

/// Joins a group prefix and a route path, then cleans the result.
pub(crate) fn join_paths(prefix: &str, path: &str) -> String {
    clean_path(&format!("{prefix}/{path}"))
}

/// Substitutes parameter values into a registration pattern.
///
/// `:name` segments and the trailing `*` / `*name` catch-all are replaced
/// with the matching value from `params`. Returns `None` if any of them has
/// no value.
pub(crate) fn fill_pattern(pattern: &str, params: &[(&str, &str)]) -> Option<String> {
    let lookup = |name: &str| {
        params
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
    };

    let mut out = String::with_capacity(pattern.len());
    let mut rest = pattern;

    while let Some(i) = rest.find(|c: char| c == ':' || c == '*') {
        out.push_str(&rest[..i]);

        if rest.as_bytes()[i] == b'*' {
            let name = &rest[i + 1..];
            out.push_str(lookup(if name.is_empty() { "*" } else { name })?);
            return Some(out);
        }

        let after = &rest[i + 1..];
        let end = after.find('/').unwrap_or(after.len());
        out.push_str(lookup(&after[..end])?);
        rest = &after[end..];
    }

    out.push_str(rest);
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_path() {
        assert_eq!(clean_path(""), "/");
        assert_eq!(clean_path("/"), "/");
        assert_eq!(clean_path("//api//users/"), "/api/users");
        assert_eq!(clean_path("api/users"), "/api/users");
        assert_eq!(clean_path("/api/./users"), "/api/users");
        assert_eq!(clean_path("/api/v1/../v2/users"), "/api/v2/users");
        assert_eq!(clean_path("/../../users"), "/users");
        assert_eq!(clean_path("/users/:id/*path"), "/users/:id/*path");
    }

    #[test]
    fn test_join_paths() {
        assert_eq!(join_paths("/api", "/users"), "/api/users");
        assert_eq!(join_paths("/api/", "users"), "/api/users");
        assert_eq!(join_paths("/api", ""), "/api");
        assert_eq!(join_paths("", "/users"), "/users");
        assert_eq!(join_paths("/api/v1", "../health"), "/api/health");
    }

    #[test]
    fn test_fill_pattern_params() {
        assert_eq!(
            fill_pattern("/users/:id/posts/:post", &[("post", "7"), ("id", "42")]).as_deref(),
            Some("/users/42/posts/7")
        );
        assert_eq!(fill_pattern("/health", &[]).as_deref(), Some("/health"));
    }

    #[test]
    fn test_fill_pattern_catch_all() {
        assert_eq!(
            fill_pattern("/static/*", &[("*", "css/site.css")]).as_deref(),
            Some("/static/css/site.css")
        );
        assert_eq!(
            fill_pattern("/files/*path", &[("path", "a/b.txt")]).as_deref(),
            Some("/files/a/b.txt")
        );
    }

    #[test]
    fn test_fill_pattern_missing_param() {
        assert_eq!(fill_pattern("/users/:id", &[("name", "x")]), None);
        assert_eq!(fill_pattern("/static/*", &[]), None);
    }
}
