//! The context tree: declaration, setup cascade, execution and aggregation.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, trace, warn};

use crate::environment::Environment;
use crate::error::{Error, Result};
use crate::failure::Failure;
use crate::report::{Report, TestReport};
use crate::should::Test;

/// A setup, teardown or test body.
pub(crate) type Block<S> = Box<dyn for<'e> Fn(&mut Environment<'e, S>)>;

// ============================================================================
// Context
// ============================================================================

/// A named group of tests and nested contexts.
///
/// Contexts are built once, by running a builder closure against a
/// [`Scope`], and are then run any number of times.
///
/// ```rust
/// let root = jtest::Context::<()>::new("Given something", |cx| {
///     cx.should("work", |env| env.assert(true, "it works"));
///     cx.context("and another thing", |cx| {
///         cx.should("also work", |env| env.assert(false, "it does not"));
///     });
/// });
/// root.run();
///
/// assert!(!root.passed());
/// assert!(root.failures().is_empty());
/// ```
pub struct Context<S = ()> {
    name: String,
    key: String,
    parent: Option<Weak<Context<S>>>,
    setup: Option<Block<S>>,
    teardown: Option<Block<S>>,
    tests: Vec<Test<S>>,
    subcontexts: Vec<Rc<Context<S>>>,
    /// Failures paired with the position of the test that recorded them.
    failures: RefCell<Vec<(usize, Failure)>>,
}

impl<S: Default + 'static> Context<S> {
    /// Build a root context by running `body` against a fresh [`Scope`].
    ///
    /// A panic inside `body` propagates to the caller; there is no tree yet
    /// to record it against.
    pub fn new(name: impl Into<String>, body: impl FnOnce(&mut Scope<S>)) -> Rc<Self> {
        Self::build(name.into(), None, body)
    }

    fn build(
        name: String,
        parent: Option<Weak<Self>>,
        body: impl FnOnce(&mut Scope<S>),
    ) -> Rc<Self> {
        Rc::new_cyclic(|me| {
            let mut scope = Scope::new(me.clone());
            body(&mut scope);
            debug!(
                context = %name,
                tests = scope.tests.len(),
                subcontexts = scope.subcontexts.len(),
                "declared context"
            );
            Context {
                key: normalize(&name),
                name,
                parent,
                setup: scope.setup,
                teardown: scope.teardown,
                tests: scope.tests,
                subcontexts: scope.subcontexts,
                failures: RefCell::new(Vec::new()),
            }
        })
    }

    /// Run every test declared here, then every subcontext, in declaration order.
    ///
    /// Failures from the previous run of this context are cleared first.
    pub fn run(&self) {
        debug!(context = %self.name, "running context");
        self.failures.borrow_mut().clear();

        for test in &self.tests {
            test.run_in(self);
        }
        for subcontext in &self.subcontexts {
            subcontext.run();
        }
    }

    /// Apply the setup chain to `env`, root first.
    pub fn run_setups(&self, env: &mut Environment<'_, S>) -> Result<()> {
        if let Some(parent) = self.parent()? {
            parent.run_setups(env)?;
        }
        if let Some(setup) = &self.setup {
            trace!(context = %self.name, "applying setup");
            setup(env);
        }
        Ok(())
    }

    /// Apply the teardown chain to `env`, this context first and the root last.
    pub fn run_teardowns(&self, env: &mut Environment<'_, S>) -> Result<()> {
        if let Some(teardown) = &self.teardown {
            trace!(context = %self.name, "applying teardown");
            teardown(&mut *env);
        }
        if let Some(parent) = self.parent()? {
            parent.run_teardowns(env)?;
        }
        Ok(())
    }

    /// The parent context, `Ok(None)` for a root.
    fn parent(&self) -> Result<Option<Rc<Self>>> {
        match &self.parent {
            None => Ok(None),
            Some(parent) => parent
                .upgrade()
                .map(Some)
                .ok_or_else(|| Error::DetachedContext(self.name.clone())),
        }
    }

    /// Build a reporting snapshot of the subtree.
    pub fn report(&self) -> Report {
        let failures = self.failures.borrow();
        Report {
            name: self.name.clone(),
            tests: self
                .tests
                .iter()
                .enumerate()
                .map(|(slot, test)| TestReport {
                    name: test.name().to_string(),
                    failures: failures
                        .iter()
                        .filter(|(recorded, _)| *recorded == slot)
                        .map(|(_, failure)| failure.clone())
                        .collect(),
                })
                .collect(),
            contexts: self.subcontexts.iter().map(|c| c.report()).collect(),
        }
    }
}

impl<S> Context<S> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True when no test in this subtree has failed.
    pub fn passed(&self) -> bool {
        self.failures.borrow().is_empty() && self.subcontexts.iter().all(|c| c.passed())
    }

    /// Failures recorded by the tests declared directly in this context.
    pub fn failures(&self) -> Vec<Failure> {
        self.failures
            .borrow()
            .iter()
            .map(|(_, failure)| failure.clone())
            .collect()
    }

    /// Record a failure for the test at position `slot` in [`Context::tests`].
    pub(crate) fn record(&self, slot: usize, failure: Failure) {
        self.failures.borrow_mut().push((slot, failure));
    }

    /// Find a direct child by name. Whitespace in `name` is normalized the
    /// same way as declared names. A subcontext wins over a test with the
    /// same name; among siblings of one kind the latest declaration wins.
    pub fn lookup(&self, name: &str) -> Option<Child<'_, S>> {
        let key = normalize(name);
        self.subcontexts
            .iter()
            .rev()
            .find(|c| c.key == key)
            .map(Child::Context)
            .or_else(|| {
                self.tests
                    .iter()
                    .rev()
                    .find(|t| t.key() == key)
                    .map(Child::Test)
            })
    }

    pub fn subcontext(&self, name: &str) -> Option<&Rc<Context<S>>> {
        match self.lookup(name)? {
            Child::Context(context) => Some(context),
            Child::Test(_) => None,
        }
    }

    pub fn test(&self, name: &str) -> Option<&Test<S>> {
        let key = normalize(name);
        self.tests.iter().rev().find(|t| t.key() == key)
    }

    pub fn tests(&self) -> &[Test<S>] {
        &self.tests
    }

    pub fn subcontexts(&self) -> &[Rc<Context<S>>] {
        &self.subcontexts
    }

    /// Number of tests in the whole subtree.
    pub fn test_count(&self) -> usize {
        self.tests.len() + self.subcontexts.iter().map(|c| c.test_count()).sum::<usize>()
    }
}

impl<S> fmt::Debug for Context<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("name", &self.name)
            .field("tests", &self.tests)
            .field("subcontexts", &self.subcontexts)
            .field("failures", &self.failures.borrow())
            .finish_non_exhaustive()
    }
}

/// A direct child of a context, as returned by [`Context::lookup`].
#[derive(Debug)]
pub enum Child<'a, S> {
    Context(&'a Rc<Context<S>>),
    Test(&'a Test<S>),
}

// ============================================================================
// Scope — declaration-time handle
// ============================================================================

/// Declarations available while a context's builder closure runs.
pub struct Scope<S = ()> {
    owner: Weak<Context<S>>,
    setup: Option<Block<S>>,
    teardown: Option<Block<S>>,
    tests: Vec<Test<S>>,
    subcontexts: Vec<Rc<Context<S>>>,
}

impl<S: Default + 'static> Scope<S> {
    fn new(owner: Weak<Context<S>>) -> Self {
        Scope {
            owner,
            setup: None,
            teardown: None,
            tests: Vec::new(),
            subcontexts: Vec::new(),
        }
    }

    // ---- Contexts ------------------------------------------------------------

    /// Declare a nested context. It inherits this context's setup chain.
    pub fn context(
        &mut self,
        name: impl Into<String>,
        body: impl FnOnce(&mut Scope<S>),
    ) -> Rc<Context<S>> {
        let child = Context::build(name.into(), Some(self.owner.clone()), body);
        self.check_collision(&child.key);
        self.subcontexts.push(Rc::clone(&child));
        child
    }

    pub fn given(
        &mut self,
        name: impl Into<String>,
        body: impl FnOnce(&mut Scope<S>),
    ) -> Rc<Context<S>> {
        self.context(name, body)
    }

    // ---- Hooks ---------------------------------------------------------------

    /// Set the setup routine. A second call replaces the first.
    pub fn setup(&mut self, block: impl Fn(&mut Environment<'_, S>) + 'static) {
        if self.setup.replace(Box::new(block)).is_some() {
            trace!("setup replaced");
        }
    }

    /// Set the teardown routine. A second call replaces the first.
    pub fn teardown(&mut self, block: impl Fn(&mut Environment<'_, S>) + 'static) {
        if self.teardown.replace(Box::new(block)).is_some() {
            trace!("teardown replaced");
        }
    }

    // ---- Tests ---------------------------------------------------------------

    pub fn should(
        &mut self,
        name: impl Into<String>,
        body: impl Fn(&mut Environment<'_, S>) + 'static,
    ) {
        let slot = self.tests.len();
        let test = Test::new(name.into(), slot, self.owner.clone(), Box::new(body));
        self.check_collision(test.key());
        self.tests.push(test);
    }

    pub fn it(
        &mut self,
        name: impl Into<String>,
        body: impl Fn(&mut Environment<'_, S>) + 'static,
    ) {
        self.should(name, body);
    }

    fn check_collision(&self, key: &str) {
        let taken = self.subcontexts.iter().any(|c| c.key == key)
            || self.tests.iter().any(|t| t.key() == key);
        if taken {
            warn!(name = %key, "sibling name declared twice; lookup resolves to the latest");
        }
    }
}

/// Turn a display name into a lookup key: runs of whitespace become `_`.
pub(crate) fn normalize(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join("_")
}
