//! Route registration errors.
//!
//! These are programming mistakes found while the route table is being
//! built. Lookups never fail; they resolve to not-found or
//! method-not-allowed instead.

use thiserror::Error;

/// Errors raised while registering a route.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// The path pattern was empty.
    #[error("route path cannot be empty")]
    EmptyPath,

    /// The method is not one of the nine standard HTTP verbs.
    #[error("unknown HTTP method: {0}")]
    UnknownMethod(String),

    /// A `:` appeared without a parameter name after it.
    #[error("empty parameter name in route {pattern}")]
    EmptyParamName {
        /// The offending pattern.
        pattern: String,
    },

    /// Path segments followed a `*` catch-all.
    #[error("catch-all must be the last segment in route {pattern}")]
    CatchAllNotLast {
        /// The offending pattern.
        pattern: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(RouteError::EmptyPath.to_string(), "route path cannot be empty");
        assert_eq!(
            RouteError::UnknownMethod("PURGE".to_string()).to_string(),
            "unknown HTTP method: PURGE"
        );
        let err = RouteError::CatchAllNotLast {
            pattern: "/files/*/x".to_string(),
        };
        assert!(err.to_string().contains("/files/*/x"));
    }
}
