//! Resolved, package-qualified view of Go interface declarations.
//!
//! Everything here is owned and independent of the syntax trees it was lowered
//! from, so method sets can outlive the packages that were parsed to build them.

use std::fmt;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;

pub use goimpl_parser::ast::ChanDir;

/// Import path identifying a package.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PkgPath(String);

impl PkgPath {
    const LOCAL: &'static str = ".";

    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// The destination package when it has no known import path.
    pub fn local() -> Self {
        Self(Self::LOCAL.to_string())
    }

    pub fn is_local(&self) -> bool {
        self.0 == Self::LOCAL
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PkgPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A declared type: `pkg: None` is the universe scope (`error`, `any`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeName {
    pub pkg: Option<PkgPath>,
    pub name: String,
}

impl TypeName {
    pub fn new(pkg: PkgPath, name: impl Into<String>) -> Self {
        Self {
            pkg: Some(pkg),
            name: name.into(),
        }
    }

    pub fn universe(name: impl Into<String>) -> Self {
        Self {
            pkg: None,
            name: name.into(),
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.pkg {
            Some(p) if !p.is_local() => write!(f, "{p}.{}", self.name),
            _ => f.write_str(&self.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArrayLen {
    /// Integer literal, or `...`.
    Literal(String),
    Const { pkg: Option<PkgPath>, name: String },
    /// A constant expression kept as written.
    Verbatim(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    /// A named type. `pkg: None` for predeclared types.
    Named {
        pkg: Option<PkgPath>,
        name: String,
        args: Vec<TypeExpr>,
    },
    TypeParam(String),
    Pointer(Box<TypeExpr>),
    Slice(Box<TypeExpr>),
    Array { len: ArrayLen, elem: Box<TypeExpr> },
    Map { key: Box<TypeExpr>, val: Box<TypeExpr> },
    Chan { dir: ChanDir, elem: Box<TypeExpr> },
    Func(Signature),
    Struct(Vec<StructField>),
    Interface(Vec<InterfaceMember>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructField {
    /// Empty for embedded fields.
    pub names: Vec<String>,
    pub ty: TypeExpr,
    pub tag: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterfaceMember {
    Method { name: String, sig: Signature },
    Embed(TypeExpr),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: Option<String>,
    pub ty: TypeExpr,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    pub params: Vec<Param>,
    pub results: Vec<Param>,
    /// The last parameter is `...T`; its `ty` is the element type `T`.
    pub variadic: bool,
}

pub(crate) type Subst = FxHashMap<String, TypeExpr>;

impl TypeExpr {
    pub fn named(pkg: Option<PkgPath>, name: impl Into<String>) -> Self {
        TypeExpr::Named {
            pkg,
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Replaces type parameters bound in `subst`.
    pub(crate) fn subst(&self, subst: &Subst) -> TypeExpr {
        if subst.is_empty() {
            return self.clone();
        }
        let boxed = |t: &TypeExpr| Box::new(t.subst(subst));
        match self {
            TypeExpr::TypeParam(name) => subst.get(name).cloned().unwrap_or_else(|| self.clone()),
            TypeExpr::Named { pkg, name, args } => TypeExpr::Named {
                pkg: pkg.clone(),
                name: name.clone(),
                args: args.iter().map(|a| a.subst(subst)).collect(),
            },
            TypeExpr::Pointer(t) => TypeExpr::Pointer(boxed(t)),
            TypeExpr::Slice(t) => TypeExpr::Slice(boxed(t)),
            TypeExpr::Array { len, elem } => TypeExpr::Array {
                len: len.clone(),
                elem: boxed(elem),
            },
            TypeExpr::Map { key, val } => TypeExpr::Map {
                key: boxed(key),
                val: boxed(val),
            },
            TypeExpr::Chan { dir, elem } => TypeExpr::Chan {
                dir: *dir,
                elem: boxed(elem),
            },
            TypeExpr::Func(sig) => TypeExpr::Func(sig.subst(subst)),
            TypeExpr::Struct(fields) => TypeExpr::Struct(
                fields
                    .iter()
                    .map(|f| StructField {
                        names: f.names.clone(),
                        ty: f.ty.subst(subst),
                        tag: f.tag.clone(),
                    })
                    .collect(),
            ),
            TypeExpr::Interface(members) => TypeExpr::Interface(
                members
                    .iter()
                    .map(|m| match m {
                        InterfaceMember::Method { name, sig } => InterfaceMember::Method {
                            name: name.clone(),
                            sig: sig.subst(subst),
                        },
                        InterfaceMember::Embed(t) => InterfaceMember::Embed(t.subst(subst)),
                    })
                    .collect(),
            ),
        }
    }

    /// Same type with every parameter name inside function types dropped and
    /// the predeclared aliases (`any`, `byte`, `rune`) replaced by the types
    /// they stand for.
    fn unnamed(&self) -> TypeExpr {
        match self {
            TypeExpr::Func(sig) => TypeExpr::Func(sig.unnamed()),
            TypeExpr::Named { pkg: None, name, .. } if name == "any" => {
                TypeExpr::Interface(Vec::new())
            }
            TypeExpr::Named { pkg: None, name, .. } if name == "byte" => {
                TypeExpr::named(None, "uint8")
            }
            TypeExpr::Named { pkg: None, name, .. } if name == "rune" => {
                TypeExpr::named(None, "int32")
            }
            TypeExpr::Named { pkg, name, args } => TypeExpr::Named {
                pkg: pkg.clone(),
                name: name.clone(),
                args: args.iter().map(TypeExpr::unnamed).collect(),
            },
            TypeExpr::Pointer(t) => TypeExpr::Pointer(Box::new(t.unnamed())),
            TypeExpr::Slice(t) => TypeExpr::Slice(Box::new(t.unnamed())),
            TypeExpr::Array { len, elem } => TypeExpr::Array {
                len: len.clone(),
                elem: Box::new(elem.unnamed()),
            },
            TypeExpr::Map { key, val } => TypeExpr::Map {
                key: Box::new(key.unnamed()),
                val: Box::new(val.unnamed()),
            },
            TypeExpr::Chan { dir, elem } => TypeExpr::Chan {
                dir: *dir,
                elem: Box::new(elem.unnamed()),
            },
            TypeExpr::Interface(members) => TypeExpr::Interface(
                members
                    .iter()
                    .map(|m| match m {
                        InterfaceMember::Method { name, sig } => InterfaceMember::Method {
                            name: name.clone(),
                            sig: sig.unnamed(),
                        },
                        InterfaceMember::Embed(t) => InterfaceMember::Embed(t.unnamed()),
                    })
                    .collect(),
            ),
            TypeExpr::TypeParam(_) | TypeExpr::Struct(_) => self.clone(),
        }
    }

    /// Every package this type refers to, in first-occurrence order.
    pub fn packages<'a>(&'a self, out: &mut Vec<&'a PkgPath>) {
        match self {
            TypeExpr::Named { pkg, args, .. } => {
                if let Some(p) = pkg {
                    note_package(out, p);
                }
                for a in args {
                    a.packages(out);
                }
            }
            TypeExpr::TypeParam(_) => {}
            TypeExpr::Pointer(t) | TypeExpr::Slice(t) => t.packages(out),
            TypeExpr::Array { len, elem } => {
                if let ArrayLen::Const { pkg: Some(p), .. } = len {
                    note_package(out, p);
                }
                elem.packages(out);
            }
            TypeExpr::Map { key, val } => {
                key.packages(out);
                val.packages(out);
            }
            TypeExpr::Chan { elem, .. } => elem.packages(out),
            TypeExpr::Func(sig) => sig.packages(out),
            TypeExpr::Struct(fields) => fields.iter().for_each(|f| f.ty.packages(out)),
            TypeExpr::Interface(members) => members.iter().for_each(|m| match m {
                InterfaceMember::Method { sig, .. } => sig.packages(out),
                InterfaceMember::Embed(t) => t.packages(out),
            }),
        }
    }
}

fn note_package<'a>(out: &mut Vec<&'a PkgPath>, p: &'a PkgPath) {
    if !out.contains(&p) {
        out.push(p);
    }
}

impl Signature {
    pub(crate) fn subst(&self, subst: &Subst) -> Signature {
        let params = |ps: &[Param]| {
            ps.iter()
                .map(|p| Param {
                    name: p.name.clone(),
                    ty: p.ty.subst(subst),
                })
                .collect()
        };
        Signature {
            params: params(&self.params),
            results: params(&self.results),
            variadic: self.variadic,
        }
    }

    /// The signature with parameter and result names removed, for structural
    /// comparison.
    pub fn unnamed(&self) -> Signature {
        let strip = |ps: &[Param]| {
            ps.iter()
                .map(|p| Param {
                    name: None,
                    ty: p.ty.unnamed(),
                })
                .collect()
        };
        Signature {
            params: strip(&self.params),
            results: strip(&self.results),
            variadic: self.variadic,
        }
    }

    pub fn same_shape(&self, other: &Signature) -> bool {
        self.unnamed() == other.unnamed()
    }

    pub fn packages<'a>(&'a self, out: &mut Vec<&'a PkgPath>) {
        for p in self.params.iter().chain(&self.results) {
            p.ty.packages(out);
        }
    }
}

/// A method as it will be stubbed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    pub name: String,
    pub sig: Signature,
    /// Doc comment lines, comment markers included.
    pub doc: Vec<String>,
    /// Interface that declares the method.
    pub origin: TypeName,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Embedded {
    /// `io.Reader`, `Container[T]`
    Named { target: TypeName, args: Vec<TypeExpr> },
    /// An inline `interface{ ... }` element.
    Literal(Box<InterfaceDecl>),
}

/// A lowered interface declaration: direct methods and embeddings, unflattened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceDecl {
    pub name: TypeName,
    pub type_params: Vec<String>,
    pub methods: Vec<Method>,
    pub embeds: Vec<Embedded>,
    /// Package name to use for each package the declaration mentions.
    pub package_names: Vec<(PkgPath, String)>,
}

impl InterfaceDecl {
    pub fn empty(name: TypeName) -> Self {
        Self {
            name,
            type_params: Vec::new(),
            methods: Vec::new(),
            embeds: Vec::new(),
            package_names: Vec::new(),
        }
    }
}

/// The flattened, deduplicated method set of an interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSet {
    pub iface: TypeName,
    pub methods: IndexMap<String, Method>,
    pub package_names: IndexMap<PkgPath, String>,
}

impl MethodSet {
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Packages referenced by any method signature, sorted by import path.
    pub fn packages(&self) -> Vec<&PkgPath> {
        let mut out = Vec::new();
        for m in self.methods.values() {
            m.sig.packages(&mut out);
        }
        out.sort();
        out
    }
}

/// The type receiving the generated methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receiver {
    pub name: Option<String>,
    pub pointer: bool,
    pub type_name: String,
    pub type_params: Vec<String>,
    /// Package the stubs are written into.
    pub package: PkgPath,
}

impl Receiver {
    /// Parses receiver text such as `f *File` or `s *Set[T]`.
    pub fn parse(text: &str, package: PkgPath) -> crate::Result<Self> {
        let parsed = goimpl_parser::parse_receiver(text).map_err(|e| crate::Error::Unrenderable {
            text: text.to_string(),
            reason: e
                .first()
                .map_or_else(|| "invalid receiver".to_string(), |d| d.message.clone()),
        })?;
        Ok(Self {
            name: parsed.name,
            pointer: parsed.pointer,
            type_name: parsed.type_name,
            type_params: parsed.type_params,
            package,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int() -> TypeExpr {
        TypeExpr::named(None, "int")
    }

    #[test]
    fn signatures_compare_without_names() {
        let a = Signature {
            params: vec![Param {
                name: Some("p".into()),
                ty: TypeExpr::Slice(Box::new(TypeExpr::named(None, "byte"))),
            }],
            results: vec![Param {
                name: Some("n".into()),
                ty: int(),
            }],
            variadic: false,
        };
        let mut b = a.unnamed();
        assert!(a.same_shape(&b));
        b.variadic = true;
        assert!(!a.same_shape(&b));
    }

    #[test]
    fn substitution_reaches_nested_types() {
        let mut subst = Subst::default();
        subst.insert("T".into(), int());
        let ty = TypeExpr::Map {
            key: Box::new(TypeExpr::named(None, "string")),
            val: Box::new(TypeExpr::Slice(Box::new(TypeExpr::TypeParam("T".into())))),
        };
        let want = TypeExpr::Map {
            key: Box::new(TypeExpr::named(None, "string")),
            val: Box::new(TypeExpr::Slice(Box::new(int()))),
        };
        assert_eq!(ty.subst(&subst), want);
    }

    #[test]
    fn predeclared_aliases_have_the_same_shape() {
        let one = |ty: TypeExpr| Signature {
            params: vec![Param {
                name: Some("v".into()),
                ty,
            }],
            results: Vec::new(),
            variadic: false,
        };
        let named = |n: &str| TypeExpr::named(None, n);
        let slice = |t: TypeExpr| TypeExpr::Slice(Box::new(t));

        assert!(one(named("any")).same_shape(&one(TypeExpr::Interface(Vec::new()))));
        assert!(one(slice(named("byte"))).same_shape(&one(slice(named("uint8")))));
        assert!(one(named("rune")).same_shape(&one(named("int32"))));
        assert!(!one(named("byte")).same_shape(&one(named("int8"))));
        // A package's own `byte` type is not the predeclared one.
        let own = TypeExpr::named(Some(PkgPath::new("example.com/p")), "byte");
        assert!(!one(own).same_shape(&one(named("uint8"))));
    }

    #[test]
    fn type_names_display_with_path() {
        assert_eq!(TypeName::new(PkgPath::new("net/http"), "Handler").to_string(), "net/http.Handler");
        assert_eq!(TypeName::new(PkgPath::local(), "Foo").to_string(), "Foo");
        assert_eq!(TypeName::universe("error").to_string(), "error");
    }
}
