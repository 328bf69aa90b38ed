//! Synthesized identifiers for parameters and receivers.

use rustc_hash::FxHashSet;

use crate::model::TypeExpr;

pub const GO_KEYWORDS: &[&str] = &[
    "break", "case", "chan", "const", "continue", "default", "defer", "else", "fallthrough",
    "for", "func", "go", "goto", "if", "import", "interface", "map", "package", "range",
    "return", "select", "struct", "switch", "type", "var",
];

/// Lower-cased first letter of `name`, skipping leading underscores.
pub fn initial(name: &str) -> String {
    name.chars()
        .find(|c| c.is_alphabetic())
        .map(|c| c.to_lowercase().collect())
        .unwrap_or_else(|| "v".to_string())
}

/// Base name for an unnamed parameter of type `ty`.
pub fn param_base(ty: &TypeExpr) -> String {
    match ty {
        TypeExpr::Named { pkg: None, name, .. } if name == "error" => "err".to_string(),
        TypeExpr::Named { name, .. } if name == "Context" => "ctx".to_string(),
        TypeExpr::Named { name, .. } | TypeExpr::TypeParam(name) => initial(name),
        TypeExpr::Pointer(elem) | TypeExpr::Slice(elem) | TypeExpr::Array { elem, .. } => {
            param_base(elem)
        }
        TypeExpr::Map { .. } => "m".to_string(),
        TypeExpr::Func(_) => "fn".to_string(),
        TypeExpr::Chan { .. } => "ch".to_string(),
        TypeExpr::Interface(_) => "v".to_string(),
        TypeExpr::Struct(_) => "s".to_string(),
    }
}

/// Identifiers in use within one method: declared names, qualifiers,
/// keywords and everything synthesized so far.
#[derive(Debug, Clone)]
pub struct NameSet {
    used: FxHashSet<String>,
}

impl Default for NameSet {
    fn default() -> Self {
        Self::new()
    }
}

impl NameSet {
    pub fn new() -> Self {
        Self {
            used: GO_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }

    pub fn reserve(&mut self, name: impl Into<String>) {
        self.used.insert(name.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.used.contains(name)
    }

    /// `base`, or `base1`, `base2`, … whichever is free first; the result is
    /// reserved.
    pub fn fresh(&mut self, base: &str) -> String {
        let mut name = base.to_string();
        let mut n = 1;
        while self.used.contains(&name) {
            name = format!("{base}{n}");
            n += 1;
        }
        self.used.insert(name.clone());
        name
    }
}
