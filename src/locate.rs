//! Module Locator: finds a package directory and parses its Go files.

use std::path::{Path, PathBuf};

use goimpl_parser::ast::{ImportName, TypeSpec};
use goimpl_parser::{LineIndex, ParseFailure, ParsedFile};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::config::GoEnv;
use crate::error::{Error, Result};
use crate::imports::guess_name;
use crate::model::PkgPath;
use crate::prelude;
use crate::resolver::Resolver;

/// One parsed source file of a package.
#[derive(Debug)]
pub struct GoFile {
    pub path: PathBuf,
    pub src: String,
    pub parsed: ParsedFile,
    /// Qualifier → import path, as the file's import declarations define them.
    /// Imports without an alias are keyed by their guessed package name.
    pub imports: FxHashMap<String, PkgPath>,
    /// Imports written without an alias, in declaration order.
    pub unaliased: Vec<PkgPath>,
}

#[derive(Debug)]
pub struct Package {
    pub path: PkgPath,
    /// Name from the package clause.
    pub name: String,
    /// `None` for packages served from the prelude.
    pub dir: Option<PathBuf>,
    pub files: Vec<GoFile>,
}

impl Package {
    /// First declaration of `name` in file order.
    pub fn find_type(&self, name: &str) -> Option<(&GoFile, &TypeSpec)> {
        self.files
            .iter()
            .find_map(|f| f.parsed.find_type(name).map(|spec| (f, spec)))
    }

    fn from_sources(path: PkgPath, dir: Option<PathBuf>, sources: Vec<(PathBuf, String)>) -> Result<Self> {
        let mut files = Vec::with_capacity(sources.len());
        for (file, src) in sources {
            let parsed = goimpl_parser::parse_file(&src).map_err(|e| parse_error(&file, &src, &e))?;
            let (imports, unaliased) = file_imports(&parsed);
            files.push(GoFile {
                path: file,
                src,
                parsed,
                imports,
                unaliased,
            });
        }
        let name = files
            .first()
            .map(|f| f.parsed.package_name().to_string())
            .unwrap_or_default();
        Ok(Self {
            path,
            name,
            dir,
            files,
        })
    }
}

fn parse_error(file: &Path, src: &str, failure: &ParseFailure) -> Error {
    let (offset, message) = failure
        .first()
        .map_or((0, "syntax error".to_string()), |d| (d.span.start, d.message.clone()));
    let (line, col) = LineIndex::new(src).line_col(offset);
    Error::Parse {
        file: file.to_path_buf(),
        line,
        col,
        message,
    }
}

fn file_imports(parsed: &ParsedFile) -> (FxHashMap<String, PkgPath>, Vec<PkgPath>) {
    let mut out = FxHashMap::default();
    let mut unaliased = Vec::new();
    for spec in parsed.imports() {
        let path = parsed.resolve(spec.path);
        let qualifier = match spec.name {
            None => {
                unaliased.push(PkgPath::new(path));
                guess_name(path)
            }
            Some(ImportName::Name(alias)) => parsed.resolve(alias.sym).to_string(),
            // Blank imports bind nothing; dot imports are not followed.
            Some(ImportName::Blank(_) | ImportName::Dot(_)) => continue,
        };
        out.insert(qualifier, PkgPath::new(path));
    }
    (out, unaliased)
}

/// Loads the embedded prelude copy of `path`, if there is one.
pub fn load_prelude(path: &PkgPath) -> Option<Result<Package>> {
    let src = prelude::source(path.as_str())?;
    let file = PathBuf::from(format!("<prelude>/{path}/{}.go", guess_name(path.as_str())));
    Some(Package::from_sources(
        path.clone(),
        None,
        vec![(file, src.to_string())],
    ))
}

/// Resolves `path` and loads the package found there.
pub fn locate(resolver: &dyn Resolver, path: &PkgPath, tags: &BuildTags) -> Result<Package> {
    let dir = resolver
        .resolve(path.as_str())
        .ok_or_else(|| Error::PackageNotFound {
            path: path.to_string(),
        })?;
    load_dir(path.clone(), &dir, tags)
}

/// Parses every buildable, non-test Go file in `dir`, in file name order.
pub fn load_dir(path: PkgPath, dir: &Path, tags: &BuildTags) -> Result<Package> {
    let entries = std::fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        let is_file = entry.file_type().map(|t| t.is_file() || t.is_symlink()).unwrap_or(false);
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_file && tags.file_name_matches(&name) {
            names.push(name);
        }
    }
    names.sort();

    let mut sources = Vec::with_capacity(names.len());
    for name in names {
        let file = dir.join(&name);
        let src = std::fs::read_to_string(&file).map_err(|e| Error::io(&file, e))?;
        if !tags.constraints_match(&src) {
            trace!(file = %file.display(), "excluded by build constraint");
            continue;
        }
        sources.push((file, src));
    }
    if sources.is_empty() {
        return Err(Error::NoGoFiles {
            dir: dir.to_path_buf(),
        });
    }

    debug!(package = %path, dir = %dir.display(), files = sources.len(), "loading package");
    Package::from_sources(path, Some(dir.to_path_buf()), sources)
}

// =============================================================================
// Build constraints
// =============================================================================

const KNOWN_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "js", "linux",
    "nacl", "netbsd", "openbsd", "plan9", "solaris", "wasip1", "windows", "zos",
];

const KNOWN_ARCH: &[&str] = &[
    "386", "amd64", "amd64p32", "arm", "armbe", "arm64", "arm64be", "loong64", "mips", "mipsle",
    "mips64", "mips64le", "mips64p32", "mips64p32le", "ppc", "ppc64", "ppc64le", "riscv",
    "riscv64", "s390", "s390x", "sparc", "sparc64", "wasm",
];

const UNIX_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "linux",
    "netbsd", "openbsd", "solaris",
];

/// Target platform used to decide which files belong to a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTags {
    pub goos: String,
    pub goarch: String,
}

impl BuildTags {
    pub fn new(goos: impl Into<String>, goarch: impl Into<String>) -> Self {
        Self {
            goos: goos.into(),
            goarch: goarch.into(),
        }
    }

    pub fn from_env(env: &GoEnv) -> Self {
        let host = GoEnv::host();
        let pick = |v: &str, fallback: String| if v.is_empty() { fallback } else { v.to_string() };
        Self {
            goos: pick(&env.goos, host.goos),
            goarch: pick(&env.goarch, host.goarch),
        }
    }

    /// Whether the build tag `tag` is satisfied.
    pub fn has_tag(&self, tag: &str) -> bool {
        tag == self.goos
            || tag == self.goarch
            || (tag == "unix" && UNIX_OS.contains(&self.goos.as_str()))
            || (tag == "linux" && self.goos == "android")
            || (tag == "darwin" && self.goos == "ios")
            || (tag == "solaris" && self.goos == "illumos")
            || tag == "gc"
            || tag.starts_with("go1.")
    }

    /// Applies the go tool's file name rules: no tests, no `_`/`.` prefixes,
    /// and any `_GOOS`, `_GOARCH` or `_GOOS_GOARCH` suffix must match.
    pub fn file_name_matches(&self, name: &str) -> bool {
        let Some(stem) = name.strip_suffix(".go") else {
            return false;
        };
        if stem.ends_with("_test") || name.starts_with('_') || name.starts_with('.') {
            return false;
        }
        let Some((_, suffix)) = stem.split_once('_') else {
            return true;
        };
        let parts: Vec<&str> = suffix.split('_').collect();
        let n = parts.len();
        let is_os = |s: &str| KNOWN_OS.contains(&s);
        let is_arch = |s: &str| KNOWN_ARCH.contains(&s);

        if n >= 2 && is_os(parts[n - 2]) && is_arch(parts[n - 1]) {
            return self.has_tag(parts[n - 2]) && self.has_tag(parts[n - 1]);
        }
        if n >= 1 && (is_os(parts[n - 1]) || is_arch(parts[n - 1])) {
            return self.has_tag(parts[n - 1]);
        }
        true
    }

    /// Evaluates the file's `//go:build` line, if any. Only the header comment
    /// block before the package clause is consulted.
    pub fn constraints_match(&self, src: &str) -> bool {
        for line in src.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let Some(comment) = line.strip_prefix("//") else {
                break;
            };
            if let Some(expr) = comment.strip_prefix("go:build") {
                if !expr.is_empty() && !expr.starts_with(char::is_whitespace) {
                    continue;
                }
                return match eval_constraint(expr, self) {
                    Some(v) => v,
                    None => {
                        debug!(expr, "unparsable build constraint, keeping file");
                        true
                    }
                };
            }
        }
        true
    }
}

/// `None` on a malformed expression.
fn eval_constraint(expr: &str, tags: &BuildTags) -> Option<bool> {
    let toks = tokenize_constraint(expr)?;
    let mut p = ConstraintParser {
        toks: &toks,
        pos: 0,
        tags,
    };
    let v = p.or()?;
    (p.pos == toks.len()).then_some(v)
}

fn tokenize_constraint(expr: &str) -> Option<Vec<&str>> {
    let mut out = Vec::new();
    let mut rest = expr.trim();
    while !rest.is_empty() {
        let tok_len = if rest.starts_with("&&") || rest.starts_with("||") {
            2
        } else if rest.starts_with(['!', '(', ')']) {
            1
        } else {
            let n = rest
                .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '.'))
                .unwrap_or(rest.len());
            if n == 0 {
                return None;
            }
            n
        };
        out.push(&rest[..tok_len]);
        rest = rest[tok_len..].trim_start();
    }
    Some(out)
}

struct ConstraintParser<'a> {
    toks: &'a [&'a str],
    pos: usize,
    tags: &'a BuildTags,
}

impl<'a> ConstraintParser<'a> {
    fn peek(&self) -> Option<&'a str> {
        self.toks.get(self.pos).copied()
    }

    fn or(&mut self) -> Option<bool> {
        let mut v = self.and()?;
        while self.peek() == Some("||") {
            self.pos += 1;
            v |= self.and()?;
        }
        Some(v)
    }

    fn and(&mut self) -> Option<bool> {
        let mut v = self.not()?;
        while self.peek() == Some("&&") {
            self.pos += 1;
            v &= self.not()?;
        }
        Some(v)
    }

    fn not(&mut self) -> Option<bool> {
        match self.peek()? {
            "!" => {
                self.pos += 1;
                Some(!self.not()?)
            }
            "(" => {
                self.pos += 1;
                let v = self.or()?;
                (self.peek()? == ")").then_some(())?;
                self.pos += 1;
                Some(v)
            }
            "&&" | "||" | ")" => None,
            tag => {
                self.pos += 1;
                Some(self.tags.has_tag(tag))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linux() -> BuildTags {
        BuildTags::new("linux", "amd64")
    }

    #[test]
    fn file_names() {
        let t = linux();
        assert!(t.file_name_matches("reader.go"));
        assert!(t.file_name_matches("linux.go"));
        assert!(t.file_name_matches("file_linux.go"));
        assert!(t.file_name_matches("file_linux_amd64.go"));
        assert!(t.file_name_matches("file_amd64.go"));
        assert!(t.file_name_matches("zsys_unix.go"));
        assert!(!t.file_name_matches("file_windows.go"));
        assert!(!t.file_name_matches("file_linux_arm64.go"));
        assert!(!t.file_name_matches("file_arm64.go"));
        assert!(!t.file_name_matches("reader_test.go"));
        assert!(!t.file_name_matches("_gen.go"));
        assert!(!t.file_name_matches(".hidden.go"));
        assert!(!t.file_name_matches("notes.txt"));
    }

    #[test]
    fn build_lines() {
        let t = linux();
        assert!(t.constraints_match("package p\n"));
        assert!(t.constraints_match("//go:build linux\n\npackage p\n"));
        assert!(t.constraints_match("// Copyright\n\n//go:build unix && !windows\n\npackage p\n"));
        assert!(t.constraints_match("//go:build (darwin || linux) && go1.21\npackage p\n"));
        assert!(!t.constraints_match("//go:build ignore\n\npackage main\n"));
        assert!(!t.constraints_match("//go:build cgo\npackage p\n"));
        assert!(!t.constraints_match("//go:build !linux\npackage p\n"));
        // Only the header counts.
        assert!(t.constraints_match("package p\n//go:build ignore\n"));
        // Not a constraint.
        assert!(t.constraints_match("//go:buildx ignore\npackage p\n"));
    }

    #[test]
    fn malformed_constraints_keep_the_file() {
        assert_eq!(eval_constraint("linux &&", &linux()), None);
        assert_eq!(eval_constraint("(linux", &linux()), None);
        assert!(linux().constraints_match("//go:build linux &&\npackage p\n"));
    }

    #[test]
    fn nested_negation() {
        let t = linux();
        assert_eq!(eval_constraint("!(windows || darwin)", &t), Some(true));
        assert_eq!(eval_constraint("!!linux && amd64", &t), Some(true));
        assert_eq!(eval_constraint("linux && !(amd64 || arm64)", &t), Some(false));
    }
}
