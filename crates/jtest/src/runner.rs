//! Console output for finished runs: an indented tree plus a summary.
//!
//! ```text
//! Given something
//!   ✓ work
//!   ✗ also work
//!       Expected 1 but got 2
//!   and another thing
//!     ✓ works too
//! ```

use std::time::Duration;

use tracing_subscriber::EnvFilter;

use crate::report::{Report, Tally};

/// Environment variable holding the log filter for the runner.
pub const LOG_ENV: &str = "JTEST_LOG";

// ============================================================================
// Configuration
// ============================================================================

/// Options for console output, parsed from the command line and environment.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Emit ANSI color codes.
    pub color: bool,
    /// Print only the summary, not the tree.
    pub quiet: bool,
}

impl RunConfig {
    /// Parse from the process args (compatible with `cargo test -- <args>`).
    pub fn from_args() -> Self {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let color = std::env::var_os("NO_COLOR").is_none()
            && std::io::IsTerminal::is_terminal(&std::io::stdout());
        Self::parse(&args, color)
    }

    /// Apply `args` on top of the detected color default. Unknown flags are ignored.
    pub fn parse(args: &[String], color: bool) -> Self {
        let mut config = RunConfig {
            color,
            quiet: false,
        };
        for arg in args {
            match arg.as_str() {
                "--no-color" => config.color = false,
                "--color" => config.color = true,
                "--quiet" | "-q" => config.quiet = true,
                _ => {}
            }
        }
        config
    }

    fn paint(&self, code: &str, s: &str) -> String {
        if self.color {
            format!("\x1b[{code}m{s}\x1b[0m")
        } else {
            s.to_string()
        }
    }

    fn green(&self, s: &str) -> String {
        self.paint("32", s)
    }

    fn red(&self, s: &str) -> String {
        self.paint("31", s)
    }

    fn bold(&self, s: &str) -> String {
        self.paint("1", s)
    }

    fn dim(&self, s: &str) -> String {
        self.paint("2", s)
    }
}

/// Install a `fmt` subscriber filtered by `JTEST_LOG`. Does nothing when the
/// variable is unset or a subscriber is already installed.
pub fn init_logging() {
    let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) else {
        return;
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

// ============================================================================
// Rendering
// ============================================================================

/// Render the tree for one report.
pub fn render_report(report: &Report, config: &RunConfig) -> String {
    let mut out = String::new();
    render_node(report, 0, config, &mut out);
    out
}

fn render_node(report: &Report, depth: usize, config: &RunConfig, out: &mut String) {
    let indent = "  ".repeat(depth);
    out.push_str(&format!("{indent}{}\n", config.bold(&report.name)));

    for test in &report.tests {
        if test.passed() {
            out.push_str(&format!("{indent}  {} {}\n", config.green("✓"), test.name));
            continue;
        }
        out.push_str(&format!(
            "{indent}  {} {}\n",
            config.red("✗"),
            config.red(&test.name)
        ));
        for failure in &test.failures {
            out.push_str(&format!("{indent}      {}\n", config.red(&failure.message())));
        }
    }

    for context in &report.contexts {
        render_node(context, depth + 1, config, out);
    }
}

/// Render the PASS/FAIL summary block.
pub fn render_summary(tally: &Tally, elapsed: Duration, config: &RunConfig) -> String {
    let elapsed_str = format!("{:.3}s", elapsed.as_secs_f64());

    let parts: Vec<String> = [
        (tally.passed > 0).then(|| config.green(&format!("{} passed", tally.passed))),
        (tally.failed > 0).then(|| config.red(&format!("{} failed", tally.failed))),
        (tally.total() == 0).then(|| config.dim("no tests")),
    ]
    .into_iter()
    .flatten()
    .collect();

    let summary = format!("{} ({})", parts.join(", "), config.dim(&elapsed_str));

    let mut out = String::from("\n");
    if tally.failed > 0 {
        out.push_str(&format!("{}\n{summary}\n\nFailures:\n", config.red("FAIL")));
        for (i, failure) in tally.failures.iter().enumerate() {
            out.push_str(&format!("  {}. {}\n", i + 1, failure));
        }
    } else {
        out.push_str(&format!("{}\n{summary}\n", config.green("PASS")));
    }
    out
}

/// Print every report and a combined summary to stdout. Returns the totals.
pub fn print_reports(reports: &[Report], elapsed: Duration, config: &RunConfig) -> Tally {
    let mut tally = Tally::default();
    if !config.quiet {
        println!();
    }
    for report in reports {
        if !config.quiet {
            print!("{}", render_report(report, config));
        }
        tally.merge(report.tally());
    }
    print!("{}", render_summary(&tally, elapsed, config));
    tally
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Context;
    use pretty_assertions::assert_eq;

    fn plain() -> RunConfig {
        RunConfig::default()
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_flags() {
        assert_eq!(
            RunConfig::parse(&args(&["--no-color", "-q"]), true),
            RunConfig {
                color: false,
                quiet: true
            }
        );
        assert!(RunConfig::parse(&args(&["--color"]), false).color);
        assert!(RunConfig::parse(&args(&["--nocapture", "filter"]), true).color);
    }

    #[test]
    fn test_render_tree() {
        let root = Context::<()>::new("Given something", |cx| {
            cx.should("work", |env| env.assert(true, ""));
            cx.should("also work", |env| env.assert_equal(1, 2));
            cx.context("and another thing", |cx| {
                cx.should("works too", |_| {});
            });
        });
        root.run();

        assert_eq!(
            render_report(&root.report(), &plain()),
            "Given something\n\
             \x20 ✓ work\n\
             \x20 ✗ also work\n\
             \x20     Expected 1 but got 2\n\
             \x20 and another thing\n\
             \x20   ✓ works too\n"
        );
    }

    #[test]
    fn test_render_summary() {
        let pass = Tally {
            passed: 2,
            failed: 0,
            failures: vec![],
        };
        assert_eq!(
            render_summary(&pass, Duration::from_millis(5), &plain()),
            "\nPASS\n2 passed (0.005s)\n"
        );

        let fail = Tally {
            passed: 1,
            failed: 1,
            failures: vec!["root > work: nope".to_string()],
        };
        assert_eq!(
            render_summary(&fail, Duration::ZERO, &plain()),
            "\nFAIL\n1 passed, 1 failed (0.000s)\n\nFailures:\n  1. root > work: nope\n"
        );

        let empty = Tally::default();
        assert!(render_summary(&empty, Duration::ZERO, &plain()).contains("no tests"));
    }

    #[test]
    fn test_color_codes() {
        let config = RunConfig {
            color: true,
            quiet: false,
        };
        assert_eq!(config.green("ok"), "\x1b[32mok\x1b[0m");
        assert_eq!(plain().red("no"), "no");
    }
}
