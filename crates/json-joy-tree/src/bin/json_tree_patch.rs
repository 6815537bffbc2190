//! `json-tree-patch`: apply a tree patch list to a document.
//!
//! Usage:
//!   json-tree-patch [--inverse] [--verbose] '<patch-array-json>'
//!
//! The document is read from stdin. With `--inverse` the patch list that
//! undoes the given one is printed instead of the patched document.

use std::io::{self, Read, Write};

use json_joy_tree::cli::{apply_json_patch, inverse_json_patch};
use tracing::Level;

fn main() {
    let mut inverse = false;
    let mut verbose = false;
    let mut patch = None;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--inverse" => inverse = true,
            "--verbose" | "-v" => verbose = true,
            _ if patch.is_none() => patch = Some(arg),
            _ => {}
        }
    }

    tracing_subscriber::fmt()
        .with_max_level(if verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(io::stderr)
        .init();

    let Some(patch) = patch else {
        eprintln!("First argument must be a JSON patch array.");
        std::process::exit(1);
    };

    let mut buf = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut buf) {
        eprintln!("{e}");
        std::process::exit(1);
    }

    let result = if inverse {
        inverse_json_patch(buf.trim(), &patch)
    } else {
        apply_json_patch(buf.trim(), &patch)
    };
    match result {
        Ok(out) => {
            let mut stdout = io::stdout();
            if let Err(e) = writeln!(stdout, "{out}") {
                eprintln!("{e}");
                std::process::exit(1);
            }
        }
        Err(e) => {
            tracing::debug!(error = ?e, "patch failed");
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
