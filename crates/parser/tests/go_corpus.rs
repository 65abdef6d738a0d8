use go_syntax::walk::preorder_file;
use go_syntax::{parse_file, Mode};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// Parses every `.go` file under `$GO_SYNTAX_CORPUS` (e.g. `$GOROOT/src`).
///
/// `RUST_LOG=go_syntax=debug` shows per-file summaries.
#[test]
fn parses_go_corpus_if_configured() {
    let Some(root) = std::env::var_os("GO_SYNTAX_CORPUS") else {
        eprintln!("GO_SYNTAX_CORPUS not set; skipping corpus test");
        return;
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let mut total = 0usize;
    let mut nodes = 0usize;

    for entry in WalkDir::new(&root).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("go") {
            continue;
        }
        // testdata holds deliberately broken sources.
        if path.components().any(|c| c.as_os_str() == "testdata") {
            continue;
        }
        let Ok(src) = std::fs::read_to_string(path) else {
            continue;
        };

        total += 1;
        let name = path.to_string_lossy();
        let (file, errs) = parse_file(&name, &src, Mode::PARSE_COMMENTS);
        if !errs.is_empty() {
            for e in errs.iter().take(8) {
                eprintln!("  {e}");
            }
            panic!("{name}: {} errors after {total} files", errs.len());
        }
        let file = file.unwrap_or_else(|| panic!("{name}: no file"));
        nodes += preorder_file(&file).count();
    }

    eprintln!("Parsed {total} Go files ({nodes} nodes).");
}
