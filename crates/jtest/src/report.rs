//! Plain-data snapshots of a run, independent of the state type.

use crate::failure::Failure;

/// The outcome of one context and everything below it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub name: String,
    pub tests: Vec<TestReport>,
    pub contexts: Vec<Report>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestReport {
    pub name: String,
    pub failures: Vec<Failure>,
}

impl TestReport {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

impl Report {
    pub fn passed(&self) -> bool {
        self.tests.iter().all(TestReport::passed) && self.contexts.iter().all(Report::passed)
    }

    pub fn test_count(&self) -> usize {
        self.tests.len() + self.contexts.iter().map(Report::test_count).sum::<usize>()
    }

    /// Count passing and failing tests across the subtree.
    pub fn tally(&self) -> Tally {
        let mut tally = Tally::default();
        self.tally_into(&mut Vec::new(), &mut tally);
        tally
    }

    fn tally_into<'a>(&'a self, path: &mut Vec<&'a str>, tally: &mut Tally) {
        path.push(&self.name);
        for test in &self.tests {
            if test.passed() {
                tally.passed += 1;
                continue;
            }
            tally.failed += 1;
            let full_path = path
                .iter()
                .copied()
                .chain(std::iter::once(test.name.as_str()))
                .collect::<Vec<_>>()
                .join(" > ");
            for failure in &test.failures {
                tally.failures.push(format!("{full_path}: {}", failure.message()));
            }
        }
        for context in &self.contexts {
            context.tally_into(path, tally);
        }
        path.pop();
    }
}

/// Totals over one or more reports.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Tally {
    pub passed: usize,
    pub failed: usize,
    /// One line per failure message, prefixed by the `context > test` path.
    pub failures: Vec<String>,
}

impl Tally {
    pub fn merge(&mut self, other: Tally) {
        self.passed += other.passed;
        self.failed += other.failed;
        self.failures.extend(other.failures);
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed
    }
}
