//! Driver for the `kt_types` engine.
//!
//! Runs `.ktt` type-assertion scripts: a declaration script with `assert`
//! lines that state subtyping, bounds, substitution, unification and
//! overload facts about the declared types.

pub mod commands;
pub mod error;
pub mod runner;
pub mod script;

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Does nothing unless `RUST_LOG` is set, e.g. `RUST_LOG=kt_types=trace`.
/// `KTC_LOG_TREE=1` renders spans as an indented tree instead of flat lines.
/// Output goes to stderr. Safe to call more than once.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};

        if std::env::var("RUST_LOG").is_err() {
            return;
        }
        let filter = EnvFilter::from_default_env();

        if std::env::var("KTC_LOG_TREE").is_ok_and(|v| v == "1") {
            let tree = tracing_tree::HierarchicalLayer::default()
                .with_indent_amount(2)
                .with_indent_lines(true)
                .with_targets(true);
            Registry::default().with(filter).with(tree).init();
        } else {
            Registry::default()
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_level(true)
                        .with_writer(std::io::stderr),
                )
                .with(filter)
                .init();
        }
    });
}
