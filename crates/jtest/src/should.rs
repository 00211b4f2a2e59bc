//! A single `should` block and how it runs.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::{Rc, Weak};

use tracing::{debug, warn};

use crate::context::{normalize, Block, Context};
use crate::environment::Environment;
use crate::error::Result;
use crate::failure::Failure;

/// A named test, owned by exactly one [`Context`].
pub struct Test<S = ()> {
    name: String,
    key: String,
    /// Position among the owning context's tests.
    slot: usize,
    context: Weak<Context<S>>,
    body: Block<S>,
}

impl<S> Test<S> {
    pub(crate) fn new(
        name: String,
        slot: usize,
        context: Weak<Context<S>>,
        body: Block<S>,
    ) -> Self {
        Test {
            key: normalize(&name),
            name,
            slot,
            context,
            body,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn key(&self) -> &str {
        &self.key
    }

    /// The owning context, if it is still alive.
    pub fn context(&self) -> Option<Rc<Context<S>>> {
        self.context.upgrade()
    }
}

impl<S: Default + 'static> Test<S> {
    /// Run this test on its own. Failures are appended to the owning
    /// context without clearing earlier ones.
    pub fn run(&self) {
        match self.context.upgrade() {
            Some(context) => self.run_in(&context),
            None => warn!(test = %self.name, "owning context is gone; test not run"),
        }
    }

    /// Fresh environment, setup chain root-first, body, then teardown chain.
    ///
    /// A panic anywhere in that sequence becomes a failure on `context`.
    pub(crate) fn run_in(&self, context: &Context<S>) {
        debug!(context = %context.name(), test = %self.name, "running test");
        let mut env = Environment::new(context, &self.name, self.slot);

        let outcome = catch_unwind(AssertUnwindSafe(|| -> Result<()> {
            context.run_setups(&mut env)?;
            (self.body)(&mut env);
            Ok(())
        }));
        if !self.settle(context, outcome) {
            return;
        }

        let outcome = catch_unwind(AssertUnwindSafe(|| context.run_teardowns(&mut env)));
        self.settle(context, outcome);
    }

    /// Record the outcome of one phase. Returns false if the tree is detached.
    fn settle(&self, context: &Context<S>, outcome: std::thread::Result<Result<()>>) -> bool {
        match outcome {
            Ok(Ok(())) => true,
            Ok(Err(err)) => {
                warn!(test = %self.name, error = %err, "setup chain broken");
                context.record(self.slot, Failure::detached(&self.name, err.to_string()));
                false
            }
            Err(payload) => {
                debug!(test = %self.name, "test panicked");
                context.record(self.slot, Failure::panic(&self.name, payload.as_ref()));
                true
            }
        }
    }
}

impl<S> fmt::Debug for Test<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Test")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use crate::Context;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Name {
        value: String,
    }

    #[test]
    fn test_panicking_body_is_recorded_not_propagated() {
        let root = Context::<()>::new("root", |cx| {
            cx.should("explode", |_| panic!("kaboom"));
            cx.should("still run", |env| env.flunk("ran after the panic"));
        });
        root.run();

        let failures = root.failures();
        assert_eq!(failures.len(), 2);
        assert!(failures[0].is_panic());
        assert_eq!(failures[0].message(), "panicked: kaboom");
        assert_eq!(failures[1].message(), "ran after the panic");
    }

    #[test]
    fn test_panicking_setup_is_recorded_against_the_test() {
        let root = Context::<Name>::new("root", |cx| {
            cx.setup(|_| panic!("setup broke"));
            cx.should("work", |env| env.assert_equal("never", env.value.as_str()));
        });
        root.run();

        let failures = root.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].test, "work");
        assert_eq!(failures[0].message(), "panicked: setup broke");
    }

    #[test]
    fn test_teardown_runs_after_failure_leaf_first() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let (outer, inner) = (Rc::clone(&log), Rc::clone(&log));

        let root = Context::<()>::new("root", move |cx| {
            cx.teardown(move |_| outer.borrow_mut().push("root teardown"));
            cx.context("child", move |cx| {
                cx.teardown(move |_| inner.borrow_mut().push("child teardown"));
                cx.should("explode", |_| panic!("kaboom"));
            });
        });
        root.run();

        assert_eq!(*log.borrow(), vec!["child teardown", "root teardown"]);
        assert!(!root.passed());
    }

    #[test]
    fn test_panicking_teardown_is_recorded_once() {
        let root = Context::<Name>::new("root", |cx| {
            cx.teardown(|env| {
                if env.value == "break" {
                    panic!("teardown broke");
                }
            });
            cx.should("break the teardown", |env| env.value = "break".to_string());
            cx.should("still run", |env| env.flunk("ran after the teardown panic"));
        });
        root.run();

        let failures = root.failures();
        assert_eq!(failures.len(), 2);
        assert_eq!(failures.iter().filter(|f| f.is_panic()).count(), 1);
        assert_eq!(failures[0].test, "break the teardown");
        assert_eq!(failures[0].message(), "panicked: teardown broke");
        assert_eq!(failures[1].test, "still run");
        assert_eq!(failures[1].message(), "ran after the teardown panic");
    }

    #[test]
    fn test_teardown_sees_body_state() {
        let seen = Rc::new(RefCell::new(String::new()));
        let sink = Rc::clone(&seen);

        let root = Context::<Name>::new("root", move |cx| {
            cx.setup(|env| env.value = "set up".to_string());
            cx.teardown(move |env| *sink.borrow_mut() = env.value.clone());
            cx.should("mutate", |env| env.value.push_str(" and changed"));
        });
        root.run();

        assert_eq!(*seen.borrow(), "set up and changed");
    }

    #[test]
    fn test_standalone_run_appends() {
        let root = Context::<()>::new("root", |cx| {
            cx.should("fail", |env| env.flunk("nope"));
        });
        let test = root.test("fail").unwrap();
        test.run();
        test.run();
        assert_eq!(root.failures().len(), 2);

        root.run();
        assert_eq!(root.failures().len(), 1);
    }
}
