//! Method-Set Flattener: expands embedded interfaces into one method set.

use indexmap::map::Entry;
use indexmap::IndexMap;
use tracing::trace;

use crate::error::{Error, Result};
use crate::lookup::Workspace;
use crate::model::{Embedded, InterfaceDecl, Method, MethodSet, Subst, TypeExpr, TypeName};

/// Flattens `root` instantiated with `args`.
///
/// Methods are ordered depth-first: an interface's own methods come before
/// the methods of the interfaces it embeds, and embeddings are visited in
/// declaration order. A method reached along several paths is kept once when
/// every path agrees on its signature.
pub fn flatten(ws: &mut Workspace<'_>, root: &TypeName, args: &[TypeExpr]) -> Result<MethodSet> {
    let mut flat = Flattener {
        ws,
        stack: Vec::new(),
        set: MethodSet {
            iface: root.clone(),
            methods: IndexMap::new(),
            package_names: IndexMap::new(),
        },
    };
    flat.named(root, args)?;
    Ok(flat.set)
}

struct Flattener<'w, 'r> {
    ws: &'w mut Workspace<'r>,
    /// Interfaces on the current embedding path.
    stack: Vec<TypeName>,
    set: MethodSet,
}

impl Flattener<'_, '_> {
    fn named(&mut self, name: &TypeName, args: &[TypeExpr]) -> Result<()> {
        if self.stack.contains(name) {
            let mut chain: Vec<String> = self.stack.iter().map(ToString::to_string).collect();
            chain.push(name.to_string());
            return Err(Error::Cycle { chain });
        }
        let decl = self.ws.find_interface(name)?;
        let subst = bind(&decl, args)?;

        self.stack.push(name.clone());
        self.decl(&decl, &subst)?;
        self.stack.pop();
        Ok(())
    }

    fn decl(&mut self, decl: &InterfaceDecl, subst: &Subst) -> Result<()> {
        for (path, name) in &decl.package_names {
            self.set
                .package_names
                .entry(path.clone())
                .or_insert_with(|| name.clone());
        }
        for method in &decl.methods {
            self.add(Method {
                name: method.name.clone(),
                sig: method.sig.subst(subst),
                doc: method.doc.clone(),
                origin: method.origin.clone(),
            })?;
        }
        for embed in &decl.embeds {
            match embed {
                Embedded::Named { target, args } => {
                    let args: Vec<TypeExpr> = args.iter().map(|a| a.subst(subst)).collect();
                    trace!(from = %decl.name, to = %target, "embedded");
                    self.named(target, &args)?;
                }
                Embedded::Literal(inner) => self.decl(inner, subst)?,
            }
        }
        Ok(())
    }

    fn add(&mut self, method: Method) -> Result<()> {
        match self.set.methods.entry(method.name.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(method);
            }
            Entry::Occupied(existing) => {
                let existing = existing.get();
                if !existing.sig.same_shape(&method.sig) {
                    return Err(Error::Conflict {
                        method: method.name,
                        first: existing.origin.to_string(),
                        second: method.origin.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Binds the type parameters of `decl` to `args`. Without arguments the
/// parameters stay as they are.
fn bind(decl: &InterfaceDecl, args: &[TypeExpr]) -> Result<Subst> {
    if args.is_empty() {
        return Ok(Subst::default());
    }
    if args.len() != decl.type_params.len() {
        return Err(Error::TypeArgs {
            name: decl.name.to_string(),
            expected: decl.type_params.len(),
            found: args.len(),
        });
    }
    Ok(decl
        .type_params
        .iter()
        .cloned()
        .zip(args.iter().cloned())
        .collect())
}
