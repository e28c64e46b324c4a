//! Script execution.
//!
//! Each script gets its own [`TypeInterner`] and declarations; the name
//! interner is shared by every file of a run.

mod discovery;
mod eval;
mod result;

use std::path::{Path, PathBuf};
use std::time::Instant;

use kt_types::notation::load_script;
use kt_types::{EngineConfig, SharedInterner, TypeInterner};
use rayon::prelude::*;

use crate::error::ScriptError;
use crate::script::parse_script;
use eval::Evaluator;

pub use discovery::{discover_scripts, SCRIPT_EXTENSION};
pub use result::{AssertionResult, FileSummary, Outcome, Summary};

/// Configuration for the script runner.
#[derive(Clone, Debug)]
pub struct RunnerConfig {
    /// Only run assertions whose text contains this substring.
    pub filter: Option<String>,
    /// Report passing assertions too.
    pub verbose: bool,
    /// Run files in parallel.
    pub parallel: bool,
    /// Engine limits for every file.
    pub engine: EngineConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        RunnerConfig {
            filter: None,
            verbose: false,
            parallel: true,
            engine: EngineConfig::default(),
        }
    }
}

pub struct ScriptRunner {
    config: RunnerConfig,
    names: SharedInterner,
}

impl ScriptRunner {
    pub fn new() -> Self {
        Self::with_config(RunnerConfig::default())
    }

    pub fn with_config(config: RunnerConfig) -> Self {
        ScriptRunner {
            config,
            names: SharedInterner::new(),
        }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run every script under `paths` (files or directories).
    pub fn run(&self, paths: &[PathBuf]) -> Summary {
        let files: Vec<PathBuf> = paths
            .iter()
            .flat_map(|path| discover_scripts(path))
            .collect();
        tracing::debug!(files = files.len(), "discovered scripts");

        if self.config.parallel && files.len() > 1 {
            self.run_parallel(&files)
        } else {
            self.run_sequential(&files)
        }
    }

    fn run_sequential(&self, files: &[PathBuf]) -> Summary {
        let start = Instant::now();
        let mut summary = Summary::new();
        for file in files {
            summary.add_file(self.run_file(file));
        }
        summary.duration = start.elapsed();
        summary
    }

    /// Run files on a scoped pool, so no worker outlives the call.
    fn run_parallel(&self, files: &[PathBuf]) -> Summary {
        let start = Instant::now();

        let file_summaries = rayon::ThreadPoolBuilder::new()
            .stack_size(16 * 1024 * 1024)
            .build_scoped(rayon::ThreadBuilder::run, |pool| {
                pool.install(|| {
                    files
                        .par_iter()
                        .map(|file| self.run_file(file))
                        .collect::<Vec<_>>()
                })
            })
            .unwrap_or_else(|e| {
                tracing::warn!("failed to create thread pool ({e}), running sequentially");
                files.iter().map(|file| self.run_file(file)).collect()
            });

        let mut summary = Summary::new();
        for file_summary in file_summaries {
            summary.add_file(file_summary);
        }
        summary.duration = start.elapsed();
        summary
    }

    /// Read and run one script.
    pub fn run_file(&self, path: &Path) -> FileSummary {
        match std::fs::read_to_string(path) {
            Ok(source) => self.run_source(path, &source),
            Err(source) => {
                let mut summary = FileSummary::new(path.to_path_buf());
                summary.add_error(
                    ScriptError::Io {
                        path: path.to_path_buf(),
                        source,
                    }
                    .to_string(),
                );
                summary
            }
        }
    }

    /// Run a script already in memory; `path` only labels the results.
    #[tracing::instrument(level = "debug", skip_all, fields(path = %path.display()))]
    pub fn run_source(&self, path: &Path, source: &str) -> FileSummary {
        let start = Instant::now();
        let mut summary = FileSummary::new(path.to_path_buf());
        if let Err(err) = self.evaluate_into(source, &mut summary) {
            summary.add_error(err.to_string());
        }
        summary.duration = start.elapsed();
        summary
    }

    /// Errors in one assertion are recorded and the rest still run; only
    /// errors that stop the whole file are returned.
    fn evaluate_into(&self, source: &str, summary: &mut FileSummary) -> Result<(), ScriptError> {
        let script = parse_script(source)?;
        let interner = TypeInterner::new();
        let loaded = load_script(&script.declarations, &interner, self.names.clone())
            .map_err(|err| ScriptError::notation(source, 0, err))?;
        let engine = self.config.engine.clone();
        let evaluator = Evaluator::new(source, &interner, &loaded, engine);

        for assertion in &script.assertions {
            if let Some(filter) = &self.config.filter {
                if !assertion.text.contains(filter.as_str()) {
                    continue;
                }
            }
            match evaluator.evaluate(assertion) {
                Ok(outcome) => summary.add_result(AssertionResult {
                    line: assertion.line,
                    text: assertion.text.to_owned(),
                    outcome,
                }),
                Err(err) => summary.add_error(err.to_string()),
            }
        }
        Ok(())
    }
}

impl Default for ScriptRunner {
    fn default() -> Self {
        Self::new()
    }
}
