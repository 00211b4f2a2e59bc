//! The per-test execution environment and its assertion primitives.

use std::fmt;
use std::ops::{Deref, DerefMut};

use crate::context::Context;
use crate::failure::Failure;

const DEFAULT_MESSAGE: &str = "assertion failed";

/// Scratch space for one test run.
///
/// A fresh environment is created for every test. The setup chain, the test
/// body and the teardown chain all run against the same environment, so any
/// field of the state `S` set by an ancestor's setup is visible (and mutable)
/// further down. The state is reachable through `Deref`/`DerefMut`:
///
/// ```rust
/// #[derive(Default)]
/// struct Person { name: String }
///
/// let root = jtest::Context::<Person>::new("Given a person", |cx| {
///     cx.setup(|env| env.name = "james".to_string());
///     cx.should("have a name", |env| env.assert_equal("james", env.name.as_str()));
/// });
/// root.run();
/// assert!(root.passed());
/// ```
///
/// Failed assertions never panic; they are recorded on the owning context
/// and the body keeps running.
pub struct Environment<'a, S = ()> {
    context: &'a Context<S>,
    test: &'a str,
    slot: usize,
    state: S,
}

impl<'a, S: Default + 'static> Environment<'a, S> {
    pub(crate) fn new(context: &'a Context<S>, test: &'a str, slot: usize) -> Self {
        Environment {
            context,
            test,
            slot,
            state: S::default(),
        }
    }
}

impl<'a, S> Environment<'a, S> {
    /// Name of the test this environment was created for.
    pub fn test_name(&self) -> &str {
        self.test
    }

    /// Name of the context that owns the running test.
    pub fn context_name(&self) -> &str {
        self.context.name()
    }

    /// Record `message` as a failure unless `expression` holds.
    ///
    /// An empty message is replaced by a generic placeholder.
    pub fn assert(&self, expression: bool, message: impl Into<String>) {
        if !expression {
            let message = message.into();
            if message.is_empty() {
                self.fail(DEFAULT_MESSAGE.to_string());
            } else {
                self.fail(message);
            }
        }
    }

    pub fn assert_not(&self, expression: bool, message: impl Into<String>) {
        self.assert(!expression, message);
    }

    /// Record a failure unless `expected == actual`.
    ///
    /// Both sides are rendered with `Debug`, so `"1"` and `1` stay distinct.
    pub fn assert_equal<E, A>(&self, expected: E, actual: A)
    where
        E: PartialEq<A> + fmt::Debug,
        A: fmt::Debug,
    {
        self.assert(
            expected == actual,
            format!("Expected {expected:?} but got {actual:?}"),
        );
    }

    pub fn assert_not_equal<E, A>(&self, expected: E, actual: A)
    where
        E: PartialEq<A> + fmt::Debug,
        A: fmt::Debug,
    {
        self.assert(
            expected != actual,
            format!("Expected {actual:?} not to equal {expected:?}"),
        );
    }

    /// Unconditionally record a failure.
    pub fn flunk(&self, message: impl Into<String>) {
        self.assert(false, message);
    }

    fn fail(&self, message: String) {
        tracing::trace!(context = %self.context.name(), test = %self.test, %message, "assertion failed");
        self.context.record(self.slot, Failure::assertion(self.test, message));
    }
}

impl<S> Deref for Environment<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.state
    }
}

impl<S> DerefMut for Environment<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.state
    }
}

impl<S: fmt::Debug> fmt::Debug for Environment<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("context", &self.context.name())
            .field("test", &self.test)
            .field("state", &self.state)
            .finish()
    }
}
