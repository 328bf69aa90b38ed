//! Package names and the import block of generated code.

use std::fmt;

use indexmap::IndexMap;
use rustc_hash::FxHashSet;

use crate::model::PkgPath;

/// Package name the go tool would assume for `path` when nothing better is
/// known: the last path element (or the one before a `/vN` major version),
/// without a `go-` prefix and cut at the first character that cannot appear
/// in an identifier, so `gopkg.in/yaml.v3` is `yaml` and `nats.go` is `nats`.
pub fn guess_name(path: &str) -> String {
    let mut elems = path.rsplit('/');
    let mut last = elems.next().unwrap_or(path);
    if is_major_version(last) {
        if let Some(parent) = elems.next() {
            last = parent;
        }
    }
    let last = last.strip_prefix("go-").unwrap_or(last);
    let end = last
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(last.len());
    match &last[..end] {
        "" => "pkg".to_string(),
        name => name.to_string(),
    }
}

fn is_major_version(elem: &str) -> bool {
    elem.strip_prefix('v')
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

/// One line of an import block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub path: PkgPath,
    /// Set when the name used in the code is not the one the path implies.
    pub alias: Option<String>,
}

impl fmt::Display for Import {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.alias {
            Some(alias) => write!(f, "{alias} {:?}", self.path.as_str()),
            None => write!(f, "{:?}", self.path.as_str()),
        }
    }
}

/// Qualifiers assigned to the packages a set of stubs refers to.
#[derive(Debug, Clone, Default)]
pub struct ImportSet {
    names: IndexMap<PkgPath, String>,
}

impl ImportSet {
    /// Assigns a qualifier to each package in `paths` (visited in sorted
    /// order). Preferred names come from `known`, then [`guess_name`]; a name
    /// already taken becomes `name2`, `name3`, …
    pub fn build<'a>(
        paths: impl IntoIterator<Item = &'a PkgPath>,
        known: &IndexMap<PkgPath, String>,
        reserved: &FxHashSet<String>,
    ) -> Self {
        let mut sorted: Vec<&PkgPath> = paths.into_iter().collect();
        sorted.sort();
        sorted.dedup();

        let mut taken: FxHashSet<String> = reserved.clone();
        let mut names = IndexMap::new();
        for path in sorted {
            let preferred = known
                .get(path)
                .cloned()
                .unwrap_or_else(|| guess_name(path.as_str()));
            let mut name = preferred.clone();
            let mut n = 2;
            while taken.contains(&name) {
                name = format!("{preferred}{n}");
                n += 1;
            }
            taken.insert(name.clone());
            names.insert(path.clone(), name);
        }
        Self { names }
    }

    pub fn qualifier(&self, path: &PkgPath) -> Option<&str> {
        self.names.get(path).map(String::as_str)
    }

    pub fn imports(&self) -> Vec<Import> {
        self.names
            .iter()
            .map(|(path, name)| Import {
                path: path.clone(),
                alias: (*name != guess_name(path.as_str())).then(|| name.clone()),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn guesses_package_names() {
        assert_eq!(guess_name("io"), "io");
        assert_eq!(guess_name("net/http"), "http");
        assert_eq!(guess_name("github.com/go-yaml/yaml"), "yaml");
        assert_eq!(guess_name("gopkg.in/yaml.v3"), "yaml");
        assert_eq!(guess_name("github.com/jackc/pgx/v5"), "pgx");
        assert_eq!(guess_name("github.com/mattn/go-sqlite3"), "sqlite3");
        assert_eq!(guess_name("example.com/my-lib"), "my");
        assert_eq!(guess_name("github.com/nats-io/nats.go"), "nats");
        assert_eq!(guess_name("github.com/segmentio/kafka-go/v2"), "kafka");
        assert_eq!(guess_name("example.com/v1"), "example");
        assert_eq!(guess_name("v2"), "v2");
    }

    #[test]
    fn colliding_names_get_numbered_aliases() {
        let paths = [
            PkgPath::new("math/rand"),
            PkgPath::new("crypto/rand"),
            PkgPath::new("io"),
            PkgPath::new("example.com/x/rand"),
        ];
        let set = ImportSet::build(&paths, &IndexMap::new(), &FxHashSet::default());
        assert_eq!(set.qualifier(&PkgPath::new("crypto/rand")), Some("rand"));
        assert_eq!(set.qualifier(&PkgPath::new("example.com/x/rand")), Some("rand2"));
        assert_eq!(set.qualifier(&PkgPath::new("math/rand")), Some("rand3"));

        let lines: Vec<String> = set.imports().iter().map(ToString::to_string).collect();
        assert_eq!(
            lines,
            [
                "\"crypto/rand\"",
                "rand2 \"example.com/x/rand\"",
                "\"io\"",
                "rand3 \"math/rand\"",
            ]
        );
    }

    #[test]
    fn known_names_win_over_guesses() {
        let path = PkgPath::new("gopkg.in/check.v1");
        let mut known = IndexMap::new();
        known.insert(path.clone(), "checkpkg".to_string());
        let set = ImportSet::build([&path], &known, &FxHashSet::default());
        assert_eq!(set.qualifier(&path), Some("checkpkg"));
        assert_eq!(set.imports()[0].alias.as_deref(), Some("checkpkg"));
    }
}
