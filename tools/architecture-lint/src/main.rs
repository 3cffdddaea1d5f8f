//! CLI entry point for the architecture lint.
//!
//! Usage: `architecture-lint [BACKEND_DIR]`. Without an argument the
//! `backend/` directory next to this tool's workspace is linted.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

fn default_backend_dir() -> PathBuf {
    // tools/architecture-lint -> workspace root
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("backend")
}

fn main() -> ExitCode {
    let backend_dir = std::env::args_os()
        .nth(1)
        .map_or_else(default_backend_dir, PathBuf::from);

    if !backend_dir.join("src").is_dir() {
        let _ = writeln!(
            io::stderr().lock(),
            "no backend sources under {}",
            backend_dir.display()
        );
        return ExitCode::FAILURE;
    }

    match architecture_lint::lint_backend_sources(&backend_dir) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let _ = write!(io::stderr().lock(), "{err}");
            ExitCode::FAILURE
        }
    }
}
