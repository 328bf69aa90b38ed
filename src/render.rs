//! Signature Renderer: Go source for one stub per method.

use std::fmt::Write as _;

use rustc_hash::FxHashSet;

use crate::config::StubBody;
use crate::error::{Error, Result};
use crate::imports::{Import, ImportSet};
use crate::model::{
    ArrayLen, ChanDir, InterfaceMember, Method, MethodSet, Param, PkgPath, Receiver, Signature,
    TypeExpr,
};
use crate::naming::{initial, param_base, NameSet};

/// Rendered stubs and the imports they need.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Generated {
    /// Sorted by import path.
    pub imports: Vec<Import>,
    pub stubs: String,
}

impl Generated {
    /// Final text, optionally preceded by the import declaration.
    pub fn to_source(&self, with_imports: bool) -> String {
        if self.stubs.is_empty() {
            return String::new();
        }
        let mut out = String::new();
        if with_imports {
            match self.imports.as_slice() {
                [] => {}
                [one] => {
                    let _ = writeln!(out, "import {one}\n");
                }
                many => {
                    out.push_str("import (\n");
                    for import in many {
                        let _ = writeln!(out, "\t{import}");
                    }
                    out.push_str(")\n\n");
                }
            }
        }
        out.push_str(&self.stubs);
        out
    }
}

/// Renders a stub for every method of `set` on `recv`.
pub fn render(set: &MethodSet, recv: &Receiver, body: StubBody) -> Result<Generated> {
    let dest = &recv.package;
    let foreign: Vec<&PkgPath> = set
        .packages()
        .into_iter()
        .filter(|p| !p.is_local() && *p != dest)
        .collect();

    let mut reserved: FxHashSet<String> = FxHashSet::default();
    reserved.insert(recv.type_name.clone());
    reserved.extend(recv.type_params.iter().cloned());
    let imports = ImportSet::build(foreign, &set.package_names, &reserved);

    let r = Renderer {
        imports: &imports,
        recv,
        body,
    };
    let mut stubs = Vec::with_capacity(set.len());
    for method in set.methods.values() {
        stubs.push(r.stub(method)?);
    }
    Ok(Generated {
        imports: imports.imports(),
        stubs: stubs.join("\n"),
    })
}

struct Renderer<'a> {
    imports: &'a ImportSet,
    recv: &'a Receiver,
    body: StubBody,
}

impl Renderer<'_> {
    fn stub(&self, method: &Method) -> Result<String> {
        let (recv_name, params, results) = self.names(&method.sig);

        let mut out = String::new();
        for line in &method.doc {
            out.push_str(line);
            out.push('\n');
        }

        out.push_str("func (");
        out.push_str(&recv_name);
        out.push(' ');
        if self.recv.pointer {
            out.push('*');
        }
        out.push_str(&self.recv.type_name);
        if !self.recv.type_params.is_empty() {
            let _ = write!(out, "[{}]", self.recv.type_params.join(", "));
        }
        out.push_str(") ");
        out.push_str(&method.name);

        let sig = Signature {
            params,
            results,
            variadic: method.sig.variadic,
        };
        self.signature(&mut out, &sig)?;
        out.push_str(" {\n");

        match self.body {
            StubBody::Panic => out.push_str("\tpanic(\"not implemented\") // TODO: Implement\n"),
            StubBody::ZeroReturn => {
                out.push_str("\t// TODO: implement\n");
                if sig.results.iter().any(|p| p.name.is_some()) {
                    out.push_str("\treturn\n");
                } else if !sig.results.is_empty() {
                    let zeros = sig
                        .results
                        .iter()
                        .map(|p| self.zero(&p.ty))
                        .collect::<Result<Vec<_>>>()?;
                    let _ = writeln!(out, "\treturn {}", zeros.join(", "));
                }
            }
        }
        out.push_str("}\n");
        Ok(out)
    }

    /// Receiver, parameter and result names for one stub.
    fn names(&self, sig: &Signature) -> (String, Vec<Param>, Vec<Param>) {
        let mut taken = NameSet::new();
        let mut packages = Vec::new();
        sig.packages(&mut packages);
        for p in packages {
            if let Some(q) = self.imports.qualifier(p) {
                taken.reserve(q);
            }
        }
        taken.reserve(self.recv.type_name.clone());
        for tp in &self.recv.type_params {
            taken.reserve(tp.clone());
        }
        let mut idents = Vec::new();
        for p in sig.params.iter().chain(&sig.results) {
            local_idents(&p.ty, &self.recv.package, &mut idents);
        }
        for ident in idents {
            taken.reserve(ident);
        }

        // A receiver name the caller wrote wins over declared parameter
        // names; a synthesized one yields to them.
        let given = self
            .recv
            .name
            .clone()
            .filter(|n| n != "_" && !taken.contains(n));
        if let Some(name) = &given {
            taken.reserve(name.clone());
        }

        // Declared names survive unless they shadow something the signature
        // or body needs.
        let mut keep = Vec::new();
        for p in sig.params.iter().chain(&sig.results) {
            if let Some(name) = &p.name {
                let ok = name == "_" || !taken.contains(name);
                if ok {
                    taken.reserve(name.clone());
                }
                keep.push(ok);
            }
        }

        let recv_name = match given {
            Some(name) => name,
            None => {
                let base = self
                    .recv
                    .name
                    .clone()
                    .unwrap_or_else(|| initial(&self.recv.type_name));
                if base == "_" {
                    base
                } else {
                    taken.fresh(&base)
                }
            }
        };

        let mut keep = keep.into_iter();
        let mut rename = |p: &Param, synthesize: bool| -> Param {
            let name = match &p.name {
                Some(name) if keep.next().unwrap_or(true) => Some(name.clone()),
                Some(name) => Some(taken.fresh(name)),
                None if synthesize => Some(taken.fresh(&param_base(&p.ty))),
                None => None,
            };
            Param {
                name,
                ty: p.ty.clone(),
            }
        };
        let params = sig.params.iter().map(|p| rename(p, true)).collect();
        let results = sig.results.iter().map(|p| rename(p, false)).collect();
        (recv_name, params, results)
    }

    fn qualify(&self, out: &mut String, pkg: Option<&PkgPath>, name: &str) -> Result<()> {
        match pkg {
            Some(p) if !p.is_local() && *p != self.recv.package => {
                let q = self.imports.qualifier(p).ok_or_else(|| Error::Unrenderable {
                    text: format!("{p}.{name}"),
                    reason: "package has no import name".to_string(),
                })?;
                out.push_str(q);
                out.push('.');
            }
            _ => {}
        }
        out.push_str(name);
        Ok(())
    }

    fn ty(&self, out: &mut String, t: &TypeExpr) -> Result<()> {
        match t {
            TypeExpr::Named { pkg, name, args } => {
                self.qualify(out, pkg.as_ref(), name)?;
                if !args.is_empty() {
                    out.push('[');
                    for (i, a) in args.iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        self.ty(out, a)?;
                    }
                    out.push(']');
                }
            }
            TypeExpr::TypeParam(name) => {
                if !self.recv.type_params.contains(name) {
                    return Err(Error::Unrenderable {
                        text: name.clone(),
                        reason: format!(
                            "type parameter is not declared by receiver type {}",
                            self.recv.type_name
                        ),
                    });
                }
                out.push_str(name);
            }
            TypeExpr::Pointer(elem) => {
                out.push('*');
                self.ty(out, elem)?;
            }
            TypeExpr::Slice(elem) => {
                out.push_str("[]");
                self.ty(out, elem)?;
            }
            TypeExpr::Array { len, elem } => {
                out.push('[');
                match len {
                    ArrayLen::Literal(s) | ArrayLen::Verbatim(s) => out.push_str(s),
                    ArrayLen::Const { pkg, name } => self.qualify(out, pkg.as_ref(), name)?,
                }
                out.push(']');
                self.ty(out, elem)?;
            }
            TypeExpr::Map { key, val } => {
                out.push_str("map[");
                self.ty(out, key)?;
                out.push(']');
                self.ty(out, val)?;
            }
            TypeExpr::Chan { dir, elem } => {
                out.push_str(match dir {
                    ChanDir::Both => "chan ",
                    ChanDir::Send => "chan<- ",
                    ChanDir::Recv => "<-chan ",
                });
                // `chan (<-chan T)` needs the parentheses to keep its meaning.
                let wrap = *dir != ChanDir::Recv
                    && matches!(**elem, TypeExpr::Chan { dir: ChanDir::Recv, .. });
                if wrap {
                    out.push('(');
                }
                self.ty(out, elem)?;
                if wrap {
                    out.push(')');
                }
            }
            TypeExpr::Func(sig) => {
                out.push_str("func");
                self.signature(out, sig)?;
            }
            TypeExpr::Struct(fields) => {
                if fields.is_empty() {
                    out.push_str("struct{}");
                    return Ok(());
                }
                out.push_str("struct { ");
                for (i, f) in fields.iter().enumerate() {
                    if i > 0 {
                        out.push_str("; ");
                    }
                    if !f.names.is_empty() {
                        out.push_str(&f.names.join(", "));
                        out.push(' ');
                    }
                    self.ty(out, &f.ty)?;
                    if let Some(tag) = &f.tag {
                        out.push(' ');
                        out.push_str(tag);
                    }
                }
                out.push_str(" }");
            }
            TypeExpr::Interface(members) => {
                if members.is_empty() {
                    out.push_str("interface{}");
                    return Ok(());
                }
                out.push_str("interface { ");
                for (i, m) in members.iter().enumerate() {
                    if i > 0 {
                        out.push_str("; ");
                    }
                    match m {
                        InterfaceMember::Method { name, sig } => {
                            out.push_str(name);
                            self.signature(out, sig)?;
                        }
                        InterfaceMember::Embed(t) => self.ty(out, t)?,
                    }
                }
                out.push_str(" }");
            }
        }
        Ok(())
    }

    fn params(&self, out: &mut String, params: &[Param], variadic: bool) -> Result<()> {
        out.push('(');
        for (i, p) in params.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            if let Some(name) = &p.name {
                out.push_str(name);
                out.push(' ');
            }
            if variadic && i + 1 == params.len() {
                out.push_str("...");
            }
            self.ty(out, &p.ty)?;
        }
        out.push(')');
        Ok(())
    }

    fn signature(&self, out: &mut String, sig: &Signature) -> Result<()> {
        self.params(out, &sig.params, sig.variadic)?;
        match sig.results.as_slice() {
            [] => {}
            [Param { name: None, ty }] => {
                out.push(' ');
                self.ty(out, ty)?;
            }
            results => {
                out.push(' ');
                self.params(out, results, false)?;
            }
        }
        Ok(())
    }

    fn zero(&self, t: &TypeExpr) -> Result<String> {
        let literal = match t {
            TypeExpr::Named { pkg: None, name, .. } => match name.as_str() {
                "bool" => Some("false"),
                "string" => Some("\"\""),
                "error" | "any" => Some("nil"),
                "int" | "int8" | "int16" | "int32" | "int64" | "uint" | "uint8" | "uint16"
                | "uint32" | "uint64" | "uintptr" | "byte" | "rune" | "float32" | "float64"
                | "complex64" | "complex128" => Some("0"),
                _ => None,
            },
            TypeExpr::Pointer(_)
            | TypeExpr::Slice(_)
            | TypeExpr::Map { .. }
            | TypeExpr::Chan { .. }
            | TypeExpr::Func(_)
            | TypeExpr::Interface(_) => Some("nil"),
            _ => None,
        };
        if let Some(lit) = literal {
            return Ok(lit.to_string());
        }
        let mut out = String::from("*new(");
        self.ty(&mut out, t)?;
        out.push(')');
        Ok(out)
    }
}

/// Unqualified type names appearing in `t`.
fn local_idents(t: &TypeExpr, dest: &PkgPath, out: &mut Vec<String>) {
    match t {
        TypeExpr::Named { pkg, name, args } => {
            if pkg.as_ref().map_or(true, |p| p.is_local() || p == dest) {
                out.push(name.clone());
            }
            args.iter().for_each(|a| local_idents(a, dest, out));
        }
        TypeExpr::TypeParam(name) => out.push(name.clone()),
        TypeExpr::Pointer(e) | TypeExpr::Slice(e) | TypeExpr::Array { elem: e, .. } => {
            local_idents(e, dest, out)
        }
        TypeExpr::Chan { elem, .. } => local_idents(elem, dest, out),
        TypeExpr::Map { key, val } => {
            local_idents(key, dest, out);
            local_idents(val, dest, out);
        }
        TypeExpr::Func(sig) => sig
            .params
            .iter()
            .chain(&sig.results)
            .for_each(|p| local_idents(&p.ty, dest, out)),
        TypeExpr::Struct(fields) => fields.iter().for_each(|f| local_idents(&f.ty, dest, out)),
        TypeExpr::Interface(members) => members.iter().for_each(|m| match m {
            InterfaceMember::Method { sig, .. } => sig
                .params
                .iter()
                .chain(&sig.results)
                .for_each(|p| local_idents(&p.ty, dest, out)),
            InterfaceMember::Embed(t) => local_idents(t, dest, out),
        }),
    }
}
