//! Runs the sample scripts under `tests/scripts` through the driver.

use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;

use ktc::commands::fmt_type;
use ktc::error::ScriptError;
use ktc::runner::{Outcome, RunnerConfig, ScriptRunner};

fn scripts_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("scripts")
}

fn failures(summary: &ktc::runner::Summary) -> Vec<String> {
    let mut found = Vec::new();
    for file in &summary.files {
        for error in &file.errors {
            found.push(format!("{}: {error}", file.path.display()));
        }
        for result in &file.results {
            if let Outcome::Failed(msg) = &result.outcome {
                found.push(format!(
                    "{}:{}: {} - {msg}",
                    file.path.display(),
                    result.line,
                    result.text
                ));
            }
        }
    }
    found
}

#[test]
fn sample_scripts_pass_in_parallel() {
    let summary = ScriptRunner::new().run(&[scripts_dir()]);
    assert_eq!(failures(&summary), Vec::<String>::new());
    assert_eq!(summary.files.len(), 5);
    assert!(summary.passed > 60, "only {} assertions ran", summary.passed);
    assert_eq!(summary.exit_code(), 0);
}

#[test]
fn sample_scripts_pass_sequentially_without_memoization() {
    let config = RunnerConfig {
        parallel: false,
        engine: kt_types::EngineConfig::default().with_memoization(false),
        ..RunnerConfig::default()
    };
    let parallel = ScriptRunner::new().run(&[scripts_dir()]);
    let sequential = ScriptRunner::with_config(config).run(&[scripts_dir()]);
    assert_eq!(failures(&sequential), Vec::<String>::new());
    assert_eq!(sequential.passed, parallel.passed);
}

#[test]
fn single_files_run_on_their_own() {
    let path = scripts_dir().join("bounds.ktt");
    let summary = ScriptRunner::new().run(&[path.clone()]);
    assert_eq!(summary.files.len(), 1);
    assert_eq!(summary.files[0].path, path);
    assert_eq!(failures(&summary), Vec::<String>::new());
}

#[test]
fn fmt_type_resolves_against_a_script() {
    let path = scripts_dir().join("subtyping.ktt");
    let rendered = fmt_type(&path, "Base_T<  out Comparable<*>>?").unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(rendered, "Base_T<out Comparable<*>>?");

    match fmt_type(&path, "Base_T<Missing>") {
        Err(ScriptError::Notation { line, col, .. }) => assert_eq!((line, col), (1, 8)),
        other => panic!("expected a notation error, got {other:?}"),
    }
    assert!(matches!(
        fmt_type(&scripts_dir().join("missing.ktt"), "Int"),
        Err(ScriptError::Io { .. })
    ));
}
