use goimpl_parser::parse_file;
use walkdir::WalkDir;

/// Parses every `.go` file under `$GOIMPL_CORPUS` (a GOROOT/src checkout works
/// well). Skipped when the variable is unset.
#[test]
fn parses_go_corpus_if_configured() {
    let Some(root) = std::env::var_os("GOIMPL_CORPUS") else {
        eprintln!("GOIMPL_CORPUS not set; skipping corpus test");
        return;
    };

    let root = root.to_string_lossy().to_string();
    let mut total = 0usize;
    let mut types = 0usize;

    for entry in WalkDir::new(&root).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("go") {
            continue;
        }
        // testdata holds deliberately broken sources.
        if path.to_string_lossy().contains("testdata") {
            continue;
        }

        let src = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(_) => continue,
        };
        total += 1;

        match parse_file(&src) {
            Ok(f) => types += f.type_specs().len(),
            Err(f) => {
                eprintln!("FAILED: {}", path.display());
                for d in f.diags.iter().take(8) {
                    eprintln!("  {:?} {:?}: {}", d.kind, d.span, d.message);
                }
                panic!("Go corpus parse failed after {total} files");
            }
        }
    }

    eprintln!("Parsed {total} Go files, {types} type declarations.");
}
