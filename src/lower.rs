//! Lowering from syntax trees to the resolved model.
//!
//! Qualifiers are mapped through the declaring file's imports and unqualified
//! names are bound to type parameters, predeclared types or the declaring
//! package, so the result no longer depends on the file it came from.

use std::path::Path;

use goimpl_parser::ast::{
    self, AstArena, InterfaceElem, Interner, Results, Type, TypeId, TypeTerm,
};
use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::model::{
    ArrayLen, Embedded, InterfaceDecl, InterfaceMember, Method, Param, PkgPath, Signature,
    StructField, TypeExpr, TypeName,
};

pub const PREDECLARED: &[&str] = &[
    "any", "bool", "byte", "comparable", "complex64", "complex128", "error", "float32",
    "float64", "int", "int8", "int16", "int32", "int64", "rune", "string", "uint", "uint8",
    "uint16", "uint32", "uint64", "uintptr",
];

pub fn is_predeclared(name: &str) -> bool {
    PREDECLARED.contains(&name)
}

/// Name scope and syntax storage for lowering one declaration.
pub struct Lowerer<'a> {
    pub arena: &'a AstArena,
    pub interner: &'a Interner,
    pub src: &'a str,
    /// Reported in errors.
    pub file: &'a Path,
    /// Qualifier → import path.
    pub imports: &'a FxHashMap<String, PkgPath>,
    /// Package of unqualified, non-predeclared names.
    pub home: PkgPath,
    /// Package clause name of `home`, when known.
    pub home_name: Option<String>,
    pub type_params: Vec<String>,
    /// Package names actually referenced, in first-use order.
    pub used: Vec<(PkgPath, String)>,
}

/// Outcome of lowering a type declaration.
#[derive(Debug)]
pub enum Lowered {
    Interface(InterfaceDecl),
    /// Not an interface; carries a short description of what it is.
    Other(&'static str),
}

impl<'a> Lowerer<'a> {
    fn sym(&self, s: ast::Symbol) -> &'a str {
        self.interner.resolve(s)
    }

    fn note(&mut self, path: &PkgPath, name: &str) {
        if !self.used.iter().any(|(p, _)| p == path) {
            self.used.push((path.clone(), name.to_string()));
        }
    }

    fn qualifier(&mut self, q: ast::IdentName) -> Result<PkgPath> {
        let name = self.sym(q.sym);
        let path = self
            .imports
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownQualifier {
                qualifier: name.to_string(),
                file: self.file.to_path_buf(),
            })?;
        self.note(&path, name);
        Ok(path)
    }

    fn home_package(&mut self) -> PkgPath {
        let home = self.home.clone();
        if let Some(name) = self.home_name.clone() {
            self.note(&home, &name);
        }
        home
    }

    /// Lowers the type declaration `spec` named `name`.
    pub fn type_spec(&mut self, name: &TypeName, spec: &ast::TypeSpec) -> Result<Lowered> {
        let arena = self.arena;
        self.type_params = arena
            .type_param_names(spec.type_params)
            .map(|n| self.sym(n.sym).to_string())
            .collect();

        let mut decl = InterfaceDecl::empty(name.clone());
        decl.type_params = self.type_params.clone();

        let mut rhs = spec.typ;
        let found = loop {
            match arena.types[rhs] {
                Type::Paren { typ } => rhs = typ,
                Type::Interface { elems } => {
                    if !self.interface_body(name, elems, &mut decl)? {
                        return Ok(Lowered::Other("constraint interface"));
                    }
                    break None;
                }
                Type::Named { .. } => break self.named_rhs(rhs, &mut decl)?,
                Type::Pointer { .. } => break Some("pointer type"),
                Type::Array { .. } => break Some("array type"),
                Type::Slice { .. } => break Some("slice type"),
                Type::Map { .. } => break Some("map type"),
                Type::Chan { .. } => break Some("channel type"),
                Type::Struct { .. } => break Some("struct type"),
                Type::Func { .. } => break Some("function type"),
            }
        };
        if let Some(kind) = found {
            return Ok(Lowered::Other(kind));
        }

        decl.package_names = std::mem::take(&mut self.used);
        Ok(Lowered::Interface(decl))
    }

    /// `type I = pkg.J` and friends: the named type becomes the only embed.
    /// Returns the kind of type when it cannot be an interface.
    fn named_rhs(&mut self, rhs: TypeId, decl: &mut InterfaceDecl) -> Result<Option<&'static str>> {
        match self.type_expr(rhs)? {
            TypeExpr::Named { pkg: None, name, .. } if name == "any" => {}
            TypeExpr::Named { pkg: None, name, .. } if name == "error" => {
                decl.embeds.push(Embedded::Named {
                    target: TypeName::universe("error"),
                    args: Vec::new(),
                });
            }
            TypeExpr::Named { pkg: None, .. } => return Ok(Some("basic type")),
            TypeExpr::Named {
                pkg: Some(pkg),
                name,
                args,
            } => decl.embeds.push(Embedded::Named {
                target: TypeName::new(pkg, name),
                args,
            }),
            _ => return Ok(Some("type parameter")),
        }
        Ok(None)
    }

    /// Fills `decl` from interface elements. `false` when the interface has
    /// type-set elements and so only works as a constraint.
    fn interface_body(
        &mut self,
        owner: &TypeName,
        elems: ast::ListRef<InterfaceElem>,
        decl: &mut InterfaceDecl,
    ) -> Result<bool> {
        let arena = self.arena;
        for elem in arena.interface_elems(elems) {
            match *elem {
                InterfaceElem::Method { doc, name, sig } => {
                    let doc = match doc {
                        Some(group) => self.doc_lines(group),
                        None => Vec::new(),
                    };
                    decl.methods.push(Method {
                        name: self.sym(name.sym).to_string(),
                        sig: self.signature(sig)?,
                        doc,
                        origin: owner.clone(),
                    });
                }
                InterfaceElem::TypeElem(te) => {
                    let terms = arena.type_terms(te.terms);
                    let [TypeTerm::Type { typ }] = terms else {
                        return Ok(false);
                    };
                    let typ = self.unparen(*typ);
                    if let Type::Interface { elems } = arena.types[typ] {
                        let mut inner = InterfaceDecl::empty(owner.clone());
                        if !self.interface_body(owner, elems, &mut inner)? {
                            return Ok(false);
                        }
                        decl.embeds.push(Embedded::Literal(Box::new(inner)));
                        continue;
                    }
                    match self.type_expr(typ)? {
                        TypeExpr::Named { pkg: None, name, .. } if name == "any" => {}
                        TypeExpr::Named { pkg: None, name, .. } if name == "error" => {
                            decl.embeds.push(Embedded::Named {
                                target: TypeName::universe("error"),
                                args: Vec::new(),
                            })
                        }
                        TypeExpr::Named {
                            pkg: Some(pkg),
                            name,
                            args,
                        } => decl.embeds.push(Embedded::Named {
                            target: TypeName::new(pkg, name),
                            args,
                        }),
                        _ => return Ok(false),
                    }
                }
            }
        }
        Ok(true)
    }

    fn doc_lines(&self, group: ast::CommentGroupId) -> Vec<String> {
        let g = self.arena.comment_groups[group];
        self.arena
            .comments(g.comments)
            .iter()
            .map(|c| c.span.text(self.src).trim_end().to_string())
            .collect()
    }

    fn unparen(&self, mut id: TypeId) -> TypeId {
        while let Type::Paren { typ } = self.arena.types[id] {
            id = typ;
        }
        id
    }

    pub fn type_expr(&mut self, id: TypeId) -> Result<TypeExpr> {
        let arena = self.arena;
        Ok(match arena.types[id] {
            Type::Named { pkg, name, args } => {
                let n = self.sym(name.sym);
                let args = arena
                    .types_list(args)
                    .iter()
                    .map(|&a| self.type_expr(a))
                    .collect::<Result<Vec<_>>>()?;
                match pkg {
                    Some(q) => TypeExpr::Named {
                        pkg: Some(self.qualifier(q)?),
                        name: n.to_string(),
                        args,
                    },
                    None if self.type_params.iter().any(|p| p == n) => {
                        TypeExpr::TypeParam(n.to_string())
                    }
                    None if is_predeclared(n) => TypeExpr::Named {
                        pkg: None,
                        name: n.to_string(),
                        args,
                    },
                    None => TypeExpr::Named {
                        pkg: Some(self.home_package()),
                        name: n.to_string(),
                        args,
                    },
                }
            }
            Type::Pointer { elem } => TypeExpr::Pointer(Box::new(self.type_expr(elem)?)),
            Type::Slice { elem } => TypeExpr::Slice(Box::new(self.type_expr(elem)?)),
            Type::Array { len, elem } => TypeExpr::Array {
                len: self.array_len(len)?,
                elem: Box::new(self.type_expr(elem)?),
            },
            Type::Map { key, val } => TypeExpr::Map {
                key: Box::new(self.type_expr(key)?),
                val: Box::new(self.type_expr(val)?),
            },
            Type::Chan { dir, elem } => TypeExpr::Chan {
                dir,
                elem: Box::new(self.type_expr(elem)?),
            },
            Type::Func { sig } => TypeExpr::Func(self.signature(sig)?),
            Type::Struct { fields } => {
                let mut out = Vec::new();
                for &f in arena.fields_list(fields) {
                    let field = arena.fields[f];
                    out.push(StructField {
                        names: self.names(field.names),
                        ty: self.type_expr(field.typ)?,
                        tag: field.tag.map(|t| t.text(self.src).to_string()),
                    });
                }
                TypeExpr::Struct(out)
            }
            Type::Interface { elems } => {
                let mut out = Vec::new();
                for elem in arena.interface_elems(elems) {
                    match *elem {
                        InterfaceElem::Method { name, sig, .. } => {
                            out.push(InterfaceMember::Method {
                                name: self.sym(name.sym).to_string(),
                                sig: self.signature(sig)?,
                            })
                        }
                        InterfaceElem::TypeElem(te) => {
                            for term in arena.type_terms(te.terms) {
                                out.push(InterfaceMember::Embed(self.type_expr(term.typ())?));
                            }
                        }
                    }
                }
                TypeExpr::Interface(out)
            }
            Type::Paren { typ } => self.type_expr(typ)?,
        })
    }

    fn array_len(&mut self, len: ast::ArrayLen) -> Result<ArrayLen> {
        Ok(match len {
            ast::ArrayLen::Ellipsis(_) => ArrayLen::Literal("...".to_string()),
            ast::ArrayLen::Int(span) => ArrayLen::Literal(span.text(self.src).to_string()),
            ast::ArrayLen::Const { pkg, name } => {
                let name = self.sym(name.sym).to_string();
                let pkg = match pkg {
                    Some(q) => Some(self.qualifier(q)?),
                    None => Some(self.home_package()),
                };
                ArrayLen::Const { pkg, name }
            }
            ast::ArrayLen::Expr(span) => ArrayLen::Verbatim(span.text(self.src).to_string()),
        })
    }

    fn names(&self, r: ast::ListRef<ast::IdentName>) -> Vec<String> {
        self.arena
            .ident_names(r)
            .iter()
            .map(|n| self.sym(n.sym).to_string())
            .collect()
    }

    fn params(&mut self, fields: ast::ListRef<ast::FieldId>) -> Result<(Vec<Param>, bool)> {
        let mut out = Vec::new();
        let mut variadic = false;
        let arena = self.arena;
        for &f in arena.fields_list(fields) {
            let field = arena.fields[f];
            let ty = self.type_expr(field.typ)?;
            variadic = field.ellipsis_pos.is_some();
            let names = self.names(field.names);
            if names.is_empty() {
                out.push(Param { name: None, ty });
            } else {
                for name in names {
                    out.push(Param {
                        name: Some(name),
                        ty: ty.clone(),
                    });
                }
            }
        }
        Ok((out, variadic))
    }

    pub fn signature(&mut self, id: ast::SignatureId) -> Result<Signature> {
        let sig = self.arena.signatures[id];
        let (params, variadic) = self.params(sig.params)?;
        let results = match sig.results {
            None => Vec::new(),
            Some(Results::Params(fields)) => self.params(fields)?.0,
            Some(Results::Type(t)) => vec![Param {
                name: None,
                ty: self.type_expr(t)?,
            }],
        };
        Ok(Signature {
            params,
            results,
            variadic,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use goimpl_parser::parse_file;
    use pretty_assertions::assert_eq;

    fn lower(src: &str, name: &str) -> Result<Lowered> {
        let parsed = parse_file(src).unwrap();
        let spec = parsed.find_type(name).unwrap();
        let mut imports = FxHashMap::default();
        for (q, path) in [("io", "io"), ("ctx", "context"), ("rand", "math/rand")] {
            imports.insert(q.to_string(), PkgPath::new(path));
        }
        let home = PkgPath::new("example.com/store");
        let mut lowerer = Lowerer {
            arena: &parsed.arena,
            interner: &parsed.interner,
            src,
            file: Path::new("store.go"),
            imports: &imports,
            home: home.clone(),
            home_name: Some(parsed.package_name().to_string()),
            type_params: Vec::new(),
            used: Vec::new(),
        };
        lowerer.type_spec(&TypeName::new(home, name), spec)
    }

    fn interface(src: &str, name: &str) -> InterfaceDecl {
        match lower(src, name).unwrap() {
            Lowered::Interface(decl) => decl,
            Lowered::Other(what) => panic!("{name} lowered to {what}"),
        }
    }

    #[test]
    fn names_are_bound_to_their_packages() {
        let src = "package store\n\
            import \"io\"\n\
            type Store[K comparable] interface {\n\
            \t// Get loads one key.\n\
            \tGet(key K, w io.Writer) (*Item, error)\n\
            \tio.Closer\n\
            }\n";
        let decl = interface(src, "Store");
        assert_eq!(decl.type_params, ["K"]);
        assert_eq!(decl.methods.len(), 1);
        let get = &decl.methods[0];
        assert_eq!(get.doc, ["// Get loads one key."]);
        assert_eq!(get.sig.params[0].ty, TypeExpr::TypeParam("K".into()));
        assert_eq!(
            get.sig.params[1].ty,
            TypeExpr::named(Some(PkgPath::new("io")), "Writer")
        );
        assert_eq!(
            get.sig.results[0].ty,
            TypeExpr::Pointer(Box::new(TypeExpr::named(
                Some(PkgPath::new("example.com/store")),
                "Item"
            )))
        );
        assert_eq!(get.sig.results[1].ty, TypeExpr::named(None, "error"));
        assert_eq!(
            decl.embeds,
            [Embedded::Named {
                target: TypeName::new(PkgPath::new("io"), "Closer"),
                args: vec![],
            }]
        );
        let names: Vec<_> = decl.package_names.iter().map(|(p, n)| (p.as_str(), n.as_str())).collect();
        assert_eq!(names, [("io", "io"), ("example.com/store", "store")]);
    }

    #[test]
    fn grouped_parameters_are_expanded() {
        let src = "package store\ntype Swapper interface { Swap(i, j int); Log(format string, args ...any) }\n";
        let decl = interface(src, "Swapper");
        let swap = &decl.methods[0].sig;
        assert_eq!(swap.params.len(), 2);
        assert_eq!(swap.params[1].name.as_deref(), Some("j"));
        let log = &decl.methods[1].sig;
        assert!(log.variadic);
        assert!(!swap.variadic);
    }

    #[test]
    fn non_interfaces_are_described() {
        let src = "package store\n\
            type S struct{}\n\
            type F func()\n\
            type N int\n\
            type C interface { ~int | ~string }\n\
            type E interface { error }\n\
            type A = any\n\
            type P (map[string]int)\n\
            type Q = ((interface{ Ping() }))\n";
        assert!(matches!(lower(src, "S").unwrap(), Lowered::Other("struct type")));
        assert!(matches!(lower(src, "P").unwrap(), Lowered::Other("map type")));
        assert_eq!(interface(src, "Q").methods[0].name, "Ping");
        assert!(matches!(lower(src, "F").unwrap(), Lowered::Other("function type")));
        assert!(matches!(lower(src, "N").unwrap(), Lowered::Other("basic type")));
        assert!(matches!(lower(src, "C").unwrap(), Lowered::Other("constraint interface")));
        assert_eq!(interface(src, "E").embeds.len(), 1);
        assert!(interface(src, "A").methods.is_empty());
    }

    #[test]
    fn inline_interfaces_become_literal_embeds() {
        let src = "package store\ntype X interface { interface{ Ping() } }\n";
        let decl = interface(src, "X");
        let [Embedded::Literal(inner)] = decl.embeds.as_slice() else {
            panic!("{:?}", decl.embeds);
        };
        assert_eq!(inner.methods[0].name, "Ping");
    }

    #[test]
    fn unknown_qualifier_is_an_error() {
        let src = "package store\ntype X interface { Do(b bytes.Buffer) }\n";
        let err = lower(src, "X").unwrap_err();
        assert!(matches!(err, Error::UnknownQualifier { ref qualifier, .. } if qualifier == "bytes"));
    }

    #[test]
    fn array_lengths_keep_their_shape() {
        let src = "package store\ntype X interface { A(a [4]byte, b [N]byte, c [rand.N]int, d [N*2]int) }\n";
        let decl = interface(src, "X");
        let lens: Vec<_> = decl.methods[0]
            .sig
            .params
            .iter()
            .map(|p| match &p.ty {
                TypeExpr::Array { len, .. } => len.clone(),
                other => panic!("{other:?}"),
            })
            .collect();
        assert_eq!(lens[0], ArrayLen::Literal("4".into()));
        assert_eq!(
            lens[1],
            ArrayLen::Const { pkg: Some(PkgPath::new("example.com/store")), name: "N".into() }
        );
        assert_eq!(
            lens[2],
            ArrayLen::Const { pkg: Some(PkgPath::new("math/rand")), name: "N".into() }
        );
        assert_eq!(lens[3], ArrayLen::Verbatim("N*2".into()));
    }
}
