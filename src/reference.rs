//! Parsing of the interface argument: `io.Reader`, `Iface`,
//! `github.com/x/y.Store[string, *T]`.

use std::path::Path;

use goimpl_parser::walk::collect_type_qualifiers;
use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::lower::{is_predeclared, Lowerer};
use crate::model::{PkgPath, TypeExpr, TypeName};

/// A parsed interface argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceRef {
    pub name: TypeName,
    pub args: Vec<TypeExpr>,
}

fn invalid(text: &str, reason: impl Into<String>) -> Error {
    Error::InvalidRef {
        text: text.to_string(),
        reason: reason.into(),
    }
}

fn is_ident(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c == '_' || unicode_ident::is_xid_start(c))
        && chars.all(unicode_ident::is_xid_continue)
}

impl InterfaceRef {
    /// Parses `text`. Unqualified names refer to `dest` unless they are
    /// predeclared; in type arguments, names in `type_params` refer to the
    /// receiver's own type parameters.
    pub fn parse(text: &str, dest: &PkgPath, type_params: &[String]) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(invalid(text, "empty"));
        }
        let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        if compact == "interface{}" {
            return Ok(Self {
                name: TypeName::universe("any"),
                args: Vec::new(),
            });
        }

        let (head, args_src) = match text.find('[') {
            Some(open) => {
                let inner = text[open + 1..]
                    .strip_suffix(']')
                    .ok_or_else(|| invalid(text, "unbalanced `[`"))?;
                (&text[..open], Some(inner))
            }
            None => (text, None),
        };

        let name = match head.rsplit_once('.') {
            Some((path, name)) => {
                if path.is_empty() || path.chars().any(|c| c.is_whitespace() || c == '"') {
                    return Err(invalid(text, "malformed package path"));
                }
                if !is_ident(name) {
                    return Err(invalid(text, format!("{name:?} is not an identifier")));
                }
                TypeName::new(PkgPath::new(path), name)
            }
            None if !is_ident(head) => {
                return Err(invalid(text, format!("{head:?} is not an identifier")));
            }
            None if is_predeclared(head) => TypeName::universe(head),
            None => TypeName::new(dest.clone(), head),
        };

        let args = match args_src {
            Some(src) => parse_args(text, src, dest, type_params)?,
            None => Vec::new(),
        };
        Ok(Self { name, args })
    }
}

/// Type arguments use the same syntax as Go source. A qualifier is taken to
/// be the import path itself, so only single-element paths like `time` can
/// appear there.
fn parse_args(
    text: &str,
    src: &str,
    dest: &PkgPath,
    type_params: &[String],
) -> Result<Vec<TypeExpr>> {
    let parsed = goimpl_parser::parse_type_list(src).map_err(|e| {
        invalid(
            text,
            e.first()
                .map_or_else(|| "bad type arguments".to_string(), |d| d.message.clone()),
        )
    })?;

    let mut imports = FxHashMap::default();
    for &ty in &parsed.types {
        for q in collect_type_qualifiers(&parsed.arena, ty) {
            let q = parsed.interner.resolve(q.sym);
            imports.insert(q.to_string(), PkgPath::new(q));
        }
    }

    let mut lowerer = Lowerer {
        arena: &parsed.arena,
        interner: &parsed.interner,
        src,
        file: Path::new("<command line>"),
        imports: &imports,
        home: dest.clone(),
        home_name: None,
        type_params: type_params.to_vec(),
        used: Vec::new(),
    };
    parsed.types.iter().map(|&ty| lowerer.type_expr(ty)).collect()
}
