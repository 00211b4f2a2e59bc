//! # jtest — a tiny hierarchical unit-test framework
//!
//! Declare nested contexts, give each an optional setup routine and some
//! `should` blocks, then run the whole tree and read back what failed.
//!
//! ## Quick example
//!
//! ```rust
//! #[derive(Default)]
//! struct World {
//!     name: String,
//! }
//!
//! let root = jtest::context::<World>("Given something", |cx| {
//!     cx.setup(|env| env.name = "james".to_string());
//!
//!     cx.should("see the setup", |env| {
//!         env.assert_equal("james", env.name.as_str());
//!     });
//!
//!     cx.context("and another thing", |cx| {
//!         cx.setup(|env| env.name.push_str(" is amazing"));
//!         cx.should("see both setups", |env| {
//!             env.assert_equal("james is amazing", env.name.as_str());
//!         });
//!     });
//! });
//!
//! root.run();
//! assert!(root.passed());
//! ```
//!
//! Every test gets a fresh [`Environment`]: the setup chain runs root first,
//! then the body. Assertions never panic; failures are collected on the
//! context that declared the test, and [`Context::passed`] walks the subtree.
//!
//! ## Features
//!
//! - `macros` (default) — the [`context!`] and [`main!`] DSL macros

extern crate self as jtest;

mod context;
mod environment;
mod error;
mod failure;
pub mod registry;
pub mod report;
pub mod runner;
mod should;

pub use context::{Child, Context, Scope};
pub use environment::Environment;
pub use error::{Error, Result};
pub use failure::{Failure, FailureKind};
pub use report::{Report, TestReport, Tally};
pub use runner::RunConfig;
pub use should::Test;

#[cfg(feature = "macros")]
pub use jtest_macros::{context, main};

use std::rc::Rc;
use std::time::Instant;

/// Build a root context. Shorthand for [`Context::new`].
pub fn context<S: Default + 'static>(
    name: impl Into<String>,
    body: impl FnOnce(&mut Scope<S>),
) -> Rc<Context<S>> {
    Context::new(name, body)
}

/// Build, run and print a single root context, then exit with status 1 if
/// anything failed.
///
/// Call it from `fn main()` in a test target with `harness = false`.
///
/// ```rust,no_run
/// fn main() {
///     let subject = "something";
///     jtest::run::<()>(format!("Given {subject}"), |cx| {
///         cx.should("work", |env| env.assert(true, ""));
///     });
/// }
/// ```
pub fn run<S: Default + 'static>(
    name: impl Into<String>,
    body: impl FnOnce(&mut Scope<S>),
) {
    runner::init_logging();
    let config = RunConfig::from_args();

    let root = Context::new(name, body);
    let start = Instant::now();
    root.run();

    let tally = runner::print_reports(&[root.report()], start.elapsed(), &config);
    if tally.failed > 0 {
        std::process::exit(1);
    }
}

/// Run every root in the [`registry`], print them, then exit with status 1
/// if anything failed.
pub fn run_registered() {
    runner::init_logging();
    let config = RunConfig::from_args();

    let start = Instant::now();
    let passed = registry::run_all();

    let tally = runner::print_reports(&registry::reports(), start.elapsed(), &config);
    if !passed || tally.failed > 0 {
        std::process::exit(1);
    }
}
