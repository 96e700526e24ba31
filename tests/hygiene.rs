//! Hygiene — enforces coding standards at test time
//!
//! Scans the crate's production sources for antipatterns. Each pattern has a
//! budget (zero); if you must add one, fix an existing one first — the budget
//! never grows.

use std::fs;
use std::path::Path;

/// (pattern, budget). Panics and silent error loss are banned outright in
/// non-test code; invalid operations are boolean returns, I/O failures are
/// logged and surfaced.
const BUDGETS: &[(&str, usize)] = &[
    (".unwrap()", 0),
    (".expect(", 0),
    ("panic!(", 0),
    ("unreachable!(", 0),
    ("todo!(", 0),
    ("unimplemented!(", 0),
    ("let _ =", 0),
    (".ok()", 0),
    ("#[allow(dead_code)]", 0),
];

struct SourceFile {
    path: String,
    content: String,
}

/// Collect production `.rs` files from `src/`, excluding `*_test.rs` files.
fn source_files() -> Vec<SourceFile> {
    let mut files = Vec::new();
    collect_rs_files(Path::new("src"), &mut files);
    files
}

fn collect_rs_files(dir: &Path, out: &mut Vec<SourceFile>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_rs_files(&path, out);
        } else if path.extension().is_some_and(|e| e == "rs") {
            let path_str = path.to_string_lossy().to_string();
            if path_str.ends_with("_test.rs") {
                continue;
            }
            if let Ok(content) = fs::read_to_string(&path) {
                out.push(SourceFile { path: path_str, content });
            }
        }
    }
}

fn hits(files: &[SourceFile], pattern: &str) -> Vec<(String, usize)> {
    files
        .iter()
        .filter_map(|file| {
            let count = file
                .content
                .lines()
                .filter(|line| line.contains(pattern))
                .count();
            if count > 0 {
                Some((file.path.clone(), count))
            } else {
                None
            }
        })
        .collect()
}

#[test]
fn source_budgets_hold() {
    let files = source_files();
    assert!(!files.is_empty(), "no source files found; run from the crate root");
    let mut failures = Vec::new();
    for (pattern, budget) in BUDGETS {
        let found = hits(&files, pattern);
        let total: usize = found.iter().map(|(_, c)| c).sum();
        if total > *budget {
            let detail = found
                .iter()
                .map(|(path, count)| format!("  {path}: {count}"))
                .collect::<Vec<_>>()
                .join("\n");
            failures.push(format!(
                "`{pattern}` budget exceeded: found {total}, max {budget}\n{detail}"
            ));
        }
    }
    assert!(failures.is_empty(), "\n{}", failures.join("\n"));
}
