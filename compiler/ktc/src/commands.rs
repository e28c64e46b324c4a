//! The `check` and `fmt-type` commands.

use std::path::{Path, PathBuf};

use kt_types::notation::load_script;
use kt_types::{SharedInterner, TypeContext, TypeInterner};

use crate::error::ScriptError;
use crate::runner::{Outcome, RunnerConfig, ScriptRunner, Summary};
use crate::script::parse_script;

/// Run the scripts under `paths`, print the results and return the exit code.
pub fn check(paths: &[PathBuf], config: &RunnerConfig) -> i32 {
    if let Some(missing) = paths.iter().find(|path| !path.exists()) {
        eprintln!("Path not found: {}", missing.display());
        return 1;
    }

    let runner = ScriptRunner::with_config(config.clone());
    let summary = runner.run(paths);
    print_summary(&summary, config.verbose);
    summary.exit_code()
}

/// Resolve `ty` against the declarations of the script at `path` and
/// render it back in canonical form.
pub fn fmt_type(path: &Path, ty: &str) -> Result<String, ScriptError> {
    let source = std::fs::read_to_string(path).map_err(|source| ScriptError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let script = parse_script(&source)?;
    let interner = TypeInterner::new();
    let loaded = load_script(&script.declarations, &interner, SharedInterner::new())
        .map_err(|err| ScriptError::notation(&source, 0, err))?;
    let id = loaded
        .parse_type(&interner, ty)
        .map_err(|err| ScriptError::notation(ty, 0, err))?;
    Ok(TypeContext::new(&interner, &loaded.decls).format_type(id))
}

fn print_summary(summary: &Summary, verbose: bool) {
    for file in &summary.files {
        if file.total() == 0 && file.errors.is_empty() {
            continue;
        }

        if verbose || file.has_failures() {
            println!("\n{}", file.path.display());
        }
        for error in &file.errors {
            println!("  ERROR: {error}");
        }

        for result in &file.results {
            match &result.outcome {
                Outcome::Passed if verbose => {
                    println!("  PASS: {}: {}", result.line, result.text);
                }
                Outcome::Passed => {}
                Outcome::Failed(found) => {
                    println!("  FAIL: {}: {} - {found}", result.line, result.text);
                }
            }
        }
    }

    println!();
    println!("Assertion Summary:");
    println!(
        "  {} passed, {} failed, {} files with errors ({} total)",
        summary.passed,
        summary.failed,
        summary.error_files,
        summary.total()
    );
    println!("  Completed in {:.2?}", summary.duration);

    println!();
    if summary.has_failures() {
        println!("FAILED");
    } else if summary.total() == 0 {
        println!("NO ASSERTIONS FOUND");
    } else {
        println!("OK");
    }
}
