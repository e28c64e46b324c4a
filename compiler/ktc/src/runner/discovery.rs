//! Script discovery.

use std::fs;
use std::path::{Path, PathBuf};

/// Extension of type-assertion scripts.
pub const SCRIPT_EXTENSION: &str = "ktt";

/// Scripts under `path`: the file itself, or every `.ktt` file below a
/// directory, sorted by path.
pub fn discover_scripts(path: &Path) -> Vec<PathBuf> {
    if path.is_dir() {
        let mut files = Vec::new();
        discover_recursive(path, &mut files);
        files.sort();
        files
    } else if is_script(path) {
        vec![path.to_path_buf()]
    } else {
        vec![]
    }
}

fn discover_recursive(dir: &Path, files: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let hidden = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| name.starts_with('.') || name == "target");
        if hidden {
            continue;
        }

        if path.is_dir() {
            discover_recursive(&path, files);
        } else if is_script(&path) {
            files.push(path);
        }
    }
}

fn is_script(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == SCRIPT_EXTENSION)
}
