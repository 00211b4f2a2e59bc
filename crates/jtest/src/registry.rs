//! Thread-local registry of root contexts.
//!
//! Lets several files declare top-level contexts and have one `main` run
//! them all. Call [`reset`] between suite runs that share a thread.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use crate::context::{Context, Scope};
use crate::report::Report;

/// Object-safe view of a root context, whatever its state type.
pub trait Suite {
    fn name(&self) -> &str;
    fn run(&self);
    fn passed(&self) -> bool;
    fn report(&self) -> Report;
}

impl<S: Default + 'static> Suite for Context<S> {
    fn name(&self) -> &str {
        Context::name(self)
    }

    fn run(&self) {
        Context::run(self)
    }

    fn passed(&self) -> bool {
        Context::passed(self)
    }

    fn report(&self) -> Report {
        Context::report(self)
    }
}

thread_local! {
    static REGISTRY: RefCell<Vec<Rc<dyn Suite>>> = const { RefCell::new(Vec::new()) };
}

/// Build a root context and register it.
pub fn context<S: Default + 'static>(
    name: impl Into<String>,
    body: impl FnOnce(&mut Scope<S>),
) -> Rc<Context<S>> {
    let root = Context::new(name, body);
    register(root.clone());
    root
}

pub fn register(suite: Rc<dyn Suite>) {
    debug!(suite = %suite.name(), "registered");
    REGISTRY.with(|registry| registry.borrow_mut().push(suite));
}

/// Registered roots, in registration order.
pub fn suites() -> Vec<Rc<dyn Suite>> {
    REGISTRY.with(|registry| registry.borrow().clone())
}

pub fn len() -> usize {
    REGISTRY.with(|registry| registry.borrow().len())
}

pub fn is_empty() -> bool {
    len() == 0
}

/// Run every registered root. True when all of them passed.
pub fn run_all() -> bool {
    // Snapshot first so test code may register more roots while running.
    let suites = suites();
    for suite in &suites {
        suite.run();
    }
    suites.iter().all(|suite| suite.passed())
}

pub fn reports() -> Vec<Report> {
    suites().iter().map(|suite| suite.report()).collect()
}

/// Forget every registered root.
pub fn reset() {
    REGISTRY.with(|registry| registry.borrow_mut().clear());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Count {
        n: u32,
    }

    #[test]
    fn test_register_run_reset() {
        reset();
        assert!(is_empty());

        context::<()>("passing", |cx| {
            cx.should("work", |env| env.assert(true, ""));
        });
        context::<Count>("failing", |cx| {
            cx.setup(|env| env.n = 1);
            cx.should("count", |env| env.assert_equal(2, env.n));
        });
        assert_eq!(len(), 2);

        assert!(!run_all());
        let reports = reports();
        assert_eq!(reports[0].name, "passing");
        assert!(reports[0].passed());
        assert!(!reports[1].passed());

        reset();
        assert!(is_empty());
        assert!(run_all());
    }

    #[test]
    fn test_registering_an_existing_root() {
        reset();
        let root = Context::<()>::new("root", |cx| cx.should("work", |_| {}));
        register(root.clone());
        assert_eq!(suites()[0].name(), "root");
        assert!(run_all());
        reset();
    }
}
