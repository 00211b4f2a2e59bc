//! Errors raised by the tree itself, as opposed to failures raised by tests.

use thiserror::Error;

/// Result type alias for tree operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A context's parent was dropped while the context itself is still alive.
    #[error("context `{0}` has been detached from its parent")]
    DetachedContext(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_names_the_context() {
        let err = Error::DetachedContext("and another thing".to_string());
        assert!(err.to_string().contains("`and another thing`"));
    }
}
