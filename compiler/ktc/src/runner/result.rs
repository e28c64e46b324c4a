//! Assertion outcomes and per-file summaries.

use std::path::PathBuf;
use std::time::Duration;

/// Outcome of one assertion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    /// The assertion did not hold; the message says what was found.
    Failed(String),
}

impl Outcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, Outcome::Passed)
    }
}

#[derive(Clone, Debug)]
pub struct AssertionResult {
    pub line: usize,
    pub text: String,
    pub outcome: Outcome,
}

/// Results of one script file.
#[derive(Clone, Debug, Default)]
pub struct FileSummary {
    pub path: PathBuf,
    pub results: Vec<AssertionResult>,
    pub passed: usize,
    pub failed: usize,
    /// Errors that stopped the file (unreadable, bad declarations, ...).
    pub errors: Vec<String>,
    pub duration: Duration,
}

impl FileSummary {
    pub fn new(path: PathBuf) -> Self {
        FileSummary {
            path,
            ..Default::default()
        }
    }

    pub fn add_result(&mut self, result: AssertionResult) {
        if result.outcome.is_passed() {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
        self.results.push(result);
    }

    pub fn add_error(&mut self, error: String) {
        self.errors.push(error);
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0 || !self.errors.is_empty()
    }
}

/// Results of a whole run.
#[derive(Clone, Debug, Default)]
pub struct Summary {
    pub files: Vec<FileSummary>,
    pub passed: usize,
    pub failed: usize,
    /// Files that could not be run.
    pub error_files: usize,
    pub duration: Duration,
}

impl Summary {
    pub fn new() -> Self {
        Summary::default()
    }

    pub fn add_file(&mut self, file: FileSummary) {
        self.passed += file.passed;
        self.failed += file.failed;
        if !file.errors.is_empty() {
            self.error_files += 1;
        }
        self.files.push(file);
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0 || self.error_files > 0
    }

    /// 0 = all pass, 1 = failures or errors, 2 = nothing was checked.
    pub fn exit_code(&self) -> i32 {
        if self.total() == 0 && self.error_files == 0 {
            2
        } else {
            i32::from(self.has_failures())
        }
    }
}
