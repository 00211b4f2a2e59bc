//! Failures recorded against a context while its tests run.

use std::any::Any;

use thiserror::Error;

/// What went wrong during a single test run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureKind {
    /// An assertion on the environment did not hold.
    #[error("{0}")]
    Assertion(String),

    /// Setup, body or teardown panicked.
    #[error("panicked: {0}")]
    Panic(String),

    /// The tree was torn down underneath the test.
    #[error("{0}")]
    Detached(String),
}

/// A failure message, tagged with the name of the test that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{test}: {kind}")]
pub struct Failure {
    pub test: String,
    pub kind: FailureKind,
}

impl Failure {
    pub fn assertion(test: impl Into<String>, message: impl Into<String>) -> Self {
        Failure {
            test: test.into(),
            kind: FailureKind::Assertion(message.into()),
        }
    }

    pub(crate) fn panic(test: impl Into<String>, payload: &(dyn Any + Send)) -> Self {
        Failure {
            test: test.into(),
            kind: FailureKind::Panic(panic_message(payload)),
        }
    }

    pub(crate) fn detached(test: impl Into<String>, message: impl Into<String>) -> Self {
        Failure {
            test: test.into(),
            kind: FailureKind::Detached(message.into()),
        }
    }

    /// The message without the test name prefix.
    pub fn message(&self) -> String {
        self.kind.to_string()
    }

    pub fn is_assertion(&self) -> bool {
        matches!(self.kind, FailureKind::Assertion(_))
    }

    pub fn is_panic(&self) -> bool {
        matches!(self.kind, FailureKind::Panic(_))
    }
}

/// Extract a printable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
