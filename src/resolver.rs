//! Import path → package directory resolution.

use std::path::{Component, Path, PathBuf};
use std::process::Command;

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::config::GoEnv;

/// Maps import paths to the directories holding their sources.
pub trait Resolver {
    fn resolve(&self, import_path: &str) -> Option<PathBuf>;

    /// Import path of the package in `dir`, when it can be determined.
    fn import_path_of(&self, _dir: &Path) -> Option<String> {
        None
    }
}

/// Fixed import path table, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    packages: FxHashMap<String, PathBuf>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, import_path: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        self.insert(import_path, dir);
        self
    }

    pub fn insert(&mut self, import_path: impl Into<String>, dir: impl Into<PathBuf>) {
        self.packages.insert(import_path.into(), dir.into());
    }
}

impl Resolver for StaticResolver {
    fn resolve(&self, import_path: &str) -> Option<PathBuf> {
        self.packages.get(import_path).cloned()
    }

    fn import_path_of(&self, dir: &Path) -> Option<String> {
        self.packages
            .iter()
            .find(|(_, d)| d.as_path() == dir)
            .map(|(p, _)| p.clone())
    }
}

// =============================================================================
// go.mod
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplaceTarget {
    Dir(PathBuf),
    Module { path: String, version: String },
}

/// The directives of a `go.mod` file that affect where packages live.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoMod {
    pub module: String,
    /// `(module path, version)` in file order.
    pub require: Vec<(String, String)>,
    /// `(module path, target)`; version-qualified replacements are kept
    /// without their left-hand version.
    pub replace: Vec<(String, ReplaceTarget)>,
}

impl GoMod {
    /// Parses the directives of a `go.mod` file; unknown ones are ignored.
    /// Relative replacement directories are resolved against `root`.
    pub fn parse(src: &str, root: &Path) -> Self {
        let mut out = GoMod::default();
        let mut block: Option<String> = None;

        for raw in src.lines() {
            let line = raw.split("//").next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }

            if let Some(verb) = &block {
                if line == ")" {
                    block = None;
                } else {
                    let verb = verb.clone();
                    out.directive(&verb, line, root);
                }
                continue;
            }

            let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
            let rest = rest.trim();
            if rest == "(" {
                block = Some(verb.to_string());
            } else {
                out.directive(verb, rest, root);
            }
        }
        out
    }

    fn directive(&mut self, verb: &str, args: &str, root: &Path) {
        let fields: Vec<&str> = args.split_whitespace().map(unquote).collect();
        match (verb, fields.as_slice()) {
            ("module", [path, ..]) => self.module = path.to_string(),
            ("require", [path, version, ..]) => {
                self.require.push((path.to_string(), version.to_string()))
            }
            ("replace", _) => {
                let Some(arrow) = fields.iter().position(|f| *f == "=>") else {
                    return;
                };
                let (Some(from), Some(to)) = (fields.first(), fields.get(arrow + 1)) else {
                    return;
                };
                let target = match fields.get(arrow + 2) {
                    Some(version) => ReplaceTarget::Module {
                        path: to.to_string(),
                        version: version.to_string(),
                    },
                    None if to.starts_with("./") || to.starts_with("../") || Path::new(to).is_absolute() => {
                        ReplaceTarget::Dir(root.join(to))
                    }
                    None => return,
                };
                self.replace.push((from.to_string(), target));
            }
            _ => {}
        }
    }
}

fn unquote(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| s.strip_prefix('`').and_then(|s| s.strip_suffix('`')))
        .unwrap_or(s)
}

/// `rest` when `path` is `module` or below it.
fn strip_module<'p>(path: &'p str, module: &str) -> Option<&'p str> {
    if module.is_empty() {
        return None;
    }
    match path.strip_prefix(module)? {
        "" => Some(""),
        rest => rest.strip_prefix('/'),
    }
}

/// Module cache path encoding: upper-case letters become `!` + lower-case.
pub fn escape_module_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for c in path.chars() {
        if c.is_ascii_uppercase() {
            out.push('!');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn join_import(base: &Path, rest: &str) -> PathBuf {
    rest.split('/')
        .filter(|s| !s.is_empty())
        .fold(base.to_path_buf(), |p, seg| p.join(seg))
}

// =============================================================================
// GoEnvResolver
// =============================================================================

#[derive(Debug, Clone)]
struct MainModule {
    root: PathBuf,
    gomod: GoMod,
}

/// Resolves import paths the way the go tool does for a build in `src_dir`.
#[derive(Debug, Clone)]
pub struct GoEnvResolver {
    src_dir: Option<PathBuf>,
    module: Option<MainModule>,
    goroot: Option<PathBuf>,
    gopath: Vec<PathBuf>,
    modcache: Option<PathBuf>,
}

impl GoEnvResolver {
    pub fn new(env: &GoEnv, src_dir: Option<&Path>) -> Self {
        let start = src_dir
            .map(Path::to_path_buf)
            .or_else(|| std::env::current_dir().ok());
        let module = start.as_deref().and_then(find_main_module);
        if let Some(m) = &module {
            debug!(module = %m.gomod.module, root = %m.root.display(), "main module");
        }

        let goroot = env.goroot.clone().or_else(go_env_goroot);
        Self {
            src_dir: src_dir.map(Path::to_path_buf),
            module,
            goroot,
            gopath: env.gopath.clone(),
            modcache: env.module_cache(),
        }
    }

    fn candidates(&self, path: &str) -> Vec<PathBuf> {
        let mut out = Vec::new();

        if let Some(dir) = &self.src_dir {
            for ancestor in dir.ancestors() {
                out.push(join_import(&ancestor.join("vendor"), path));
            }
        }

        if let Some(m) = &self.module {
            for (from, target) in &m.gomod.replace {
                let Some(rest) = strip_module(path, from) else {
                    continue;
                };
                match target {
                    ReplaceTarget::Dir(dir) => out.push(join_import(dir, rest)),
                    ReplaceTarget::Module { path: to, version } => {
                        if let Some(cache) = &self.modcache {
                            let base = cache.join(format!("{}@{version}", escape_module_path(to)));
                            out.push(join_import(&base, rest));
                        }
                    }
                }
            }
            if let Some(rest) = strip_module(path, &m.gomod.module) {
                out.push(join_import(&m.root, rest));
            }
            out.push(join_import(&m.root.join("vendor"), path));
        }

        if let Some(root) = &self.goroot {
            let src = root.join("src");
            out.push(join_import(&src, path));
            out.push(join_import(&src.join("vendor"), path));
        }

        for gp in &self.gopath {
            out.push(join_import(&gp.join("src"), path));
        }

        if let (Some(m), Some(cache)) = (&self.module, &self.modcache) {
            let best = m
                .gomod
                .require
                .iter()
                .filter_map(|(module, version)| Some((module, version, strip_module(path, module)?)))
                .max_by_key(|(module, _, _)| module.len());
            if let Some((module, version, rest)) = best {
                let base = cache.join(format!("{}@{version}", escape_module_path(module)));
                out.push(join_import(&base, rest));
            }
        }

        // Non-standard layouts under the destination, only when nothing
        // real claims the path.
        if let Some(dir) = &self.src_dir {
            out.push(join_import(dir, path));
        }

        out
    }
}

impl Resolver for GoEnvResolver {
    fn resolve(&self, import_path: &str) -> Option<PathBuf> {
        if import_path.is_empty()
            || Path::new(import_path)
                .components()
                .any(|c| !matches!(c, Component::Normal(_)))
        {
            return None;
        }
        let found = self.candidates(import_path).into_iter().find(|c| c.is_dir());
        trace!(import_path, found = ?found, "resolve");
        found
    }

    fn import_path_of(&self, dir: &Path) -> Option<String> {
        let dir = dir.canonicalize().ok()?;
        let rel_path = |base: &Path| -> Option<String> {
            let base = base.canonicalize().ok()?;
            let rel = dir.strip_prefix(&base).ok()?;
            Some(
                rel.components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/"),
            )
        };

        if let Some(m) = &self.module {
            if let Some(rel) = rel_path(&m.root) {
                if !rel.split('/').any(|s| s == "vendor") {
                    return Some(if rel.is_empty() {
                        m.gomod.module.clone()
                    } else {
                        format!("{}/{rel}", m.gomod.module)
                    });
                }
            }
        }
        self.gopath
            .iter()
            .find_map(|gp| rel_path(&gp.join("src")))
            .filter(|rel| !rel.is_empty())
    }
}

fn find_main_module(start: &Path) -> Option<MainModule> {
    let start = start.canonicalize().unwrap_or_else(|_| start.to_path_buf());
    start.ancestors().find_map(|dir| {
        let src = std::fs::read_to_string(dir.join("go.mod")).ok()?;
        Some(MainModule {
            root: dir.to_path_buf(),
            gomod: GoMod::parse(&src, dir),
        })
    })
}

fn go_env_goroot() -> Option<PathBuf> {
    let out = Command::new("go").args(["env", "GOROOT"]).output().ok()?;
    if !out.status.success() {
        return None;
    }
    let s = String::from_utf8(out.stdout).ok()?;
    let s = s.trim();
    (!s.is_empty()).then(|| PathBuf::from(s))
}
