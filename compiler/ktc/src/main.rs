//! `ktc`: run type-assertion scripts against the type engine.

use std::path::{Path, PathBuf};

use ktc::commands::{check, fmt_type};
use ktc::runner::RunnerConfig;

fn main() {
    ktc::init_tracing();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    match args[1].as_str() {
        "check" => {
            let mut config = RunnerConfig::default();
            let mut paths = Vec::new();

            for arg in args.iter().skip(2) {
                if let Some(filter) = arg.strip_prefix("--filter=") {
                    config.filter = Some(filter.to_string());
                } else if let Some(depth) = arg.strip_prefix("--unroll=") {
                    let Ok(depth) = depth.parse::<u32>() else {
                        eprintln!("error: --unroll expects a number, got `{depth}`");
                        std::process::exit(1);
                    };
                    config.engine = config.engine.with_supertype_unroll_depth(depth);
                } else if arg == "--no-memo" {
                    config.engine = config.engine.with_memoization(false);
                } else if arg == "--verbose" || arg == "-v" {
                    config.verbose = true;
                } else if arg == "--no-parallel" {
                    config.parallel = false;
                } else if arg.starts_with('-') {
                    eprintln!("error: unknown option `{arg}`");
                    std::process::exit(1);
                } else {
                    paths.push(PathBuf::from(arg));
                }
            }

            if paths.is_empty() {
                paths.push(PathBuf::from("."));
            }
            std::process::exit(check(&paths, &config));
        }
        "fmt-type" => {
            if args.len() < 4 {
                eprintln!("Usage: ktc fmt-type <script.ktt> <type>");
                std::process::exit(1);
            }
            match fmt_type(Path::new(&args[2]), &args[3]) {
                Ok(rendered) => println!("{rendered}"),
                Err(err) => {
                    eprintln!("error: {err}");
                    std::process::exit(1);
                }
            }
        }
        "help" | "--help" | "-h" => {
            print_usage();
        }
        "version" | "--version" | "-V" => {
            println!("ktc {}", env!("CARGO_PKG_VERSION"));
        }
        _ => {
            print_usage();
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    println!("ktc - type-assertion script runner");
    println!();
    println!("Usage: ktc <command> [options]");
    println!();
    println!("Commands:");
    println!("  check [paths...]           Run .ktt scripts (default: current directory)");
    println!("  fmt-type <script> <type>   Print a type in canonical form");
    println!("  help                       Show this message");
    println!("  version                    Show version");
    println!();
    println!("Check options:");
    println!("  --filter=<text>   Only run assertions containing <text>");
    println!("  --unroll=<n>      Supertype unroll depth for recursive hierarchies");
    println!("  --no-memo         Disable subtype memoization");
    println!("  --no-parallel     Run files one at a time");
    println!("  -v, --verbose     Also list passing assertions");
    println!();
    println!("Set RUST_LOG to enable tracing; KTC_LOG_TREE=1 for tree output.");
}
