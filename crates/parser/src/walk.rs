use crate::ast::*;

// Core traits
pub trait Walk<'ast> {
    fn walk<V: Visitor<'ast> + ?Sized>(&self, a: &'ast AstArena, v: &mut V);
}

pub trait Visitor<'ast> {
    #[inline(always)]
    fn visit_source_file(&mut self, a: &'ast AstArena, f: &'ast SourceFile) {
        f.walk(a, self);
    }

    #[inline(always)]
    fn visit_type(&mut self, a: &'ast AstArena, id: TypeId) {
        a.types[id].walk(a, self);
    }

    #[inline(always)]
    fn visit_field(&mut self, a: &'ast AstArena, id: FieldId) {
        a.fields[id].walk(a, self);
    }

    #[inline(always)]
    fn visit_signature(&mut self, a: &'ast AstArena, id: SignatureId) {
        a.signatures[id].walk(a, self);
    }

    #[inline(always)]
    fn visit_type_param_decl(&mut self, a: &'ast AstArena, id: TypeParamDeclId) {
        a.type_param_decls[id].walk(a, self);
    }

    #[inline(always)]
    fn visit_comment_group(&mut self, a: &'ast AstArena, id: CommentGroupId) {
        a.comment_groups[id].walk(a, self);
    }
}

macro_rules! impl_walk_for_ids {
    ($($id:ty => $visit:ident),* $(,)?) => {
        $(
            impl<'ast> Walk<'ast> for $id {
                #[inline(always)]
                fn walk<V: Visitor<'ast> + ?Sized>(&self, a: &'ast AstArena, v: &mut V) {
                    v.$visit(a, *self);
                }
            }
        )*
    };
}

impl_walk_for_ids! {
    TypeId => visit_type,
    FieldId => visit_field,
    SignatureId => visit_signature,
    TypeParamDeclId => visit_type_param_decl,
    CommentGroupId => visit_comment_group,
}

pub trait ListSlice<T> {
    fn slice(&self, r: ListRef<T>) -> &[T];
}

impl<'ast, T> Walk<'ast> for ListRef<T>
where
    AstArena: ListSlice<T>,
    T: Walk<'ast>,
{
    #[inline(always)]
    fn walk<V: Visitor<'ast> + ?Sized>(&self, a: &'ast AstArena, v: &mut V) {
        for item in a.slice(*self) {
            item.walk(a, v);
        }
    }
}

macro_rules! impl_list_slice {
    ($($t:ty => $getter:ident),* $(,)?) => {
        $(
            impl ListSlice<$t> for AstArena {
                #[inline(always)]
                fn slice(&self, r: ListRef<$t>) -> &[$t] {
                    self.$getter(r)
                }
            }
        )*
    };
}

impl_list_slice! {
    IdentName => ident_names,
    TypeId => types_list,
    FieldId => fields_list,
    ImportSpec => imports,
    TypeSpec => type_specs,
    TypeTerm => type_terms,
    InterfaceElem => interface_elems,
    TypeParamDeclId => type_param_decl_ids,
    Comment => comments,
}

impl<'ast, T: Walk<'ast>> Walk<'ast> for Option<T> {
    #[inline(always)]
    fn walk<V: Visitor<'ast> + ?Sized>(&self, a: &'ast AstArena, v: &mut V) {
        if let Some(x) = self {
            x.walk(a, v);
        }
    }
}

// Leaf types
macro_rules! impl_walk_noop {
    ($($ty:ty),* $(,)?) => {
        $(
            impl<'ast> Walk<'ast> for $ty {
                #[inline(always)]
                fn walk<V: Visitor<'ast> + ?Sized>(&self, _: &'ast AstArena, _: &mut V) {}
            }
        )*
    };
}

impl_walk_noop! {
    Span,
    Symbol,
    bool,
    ChanDir,
    CommentKind,
}

// =============================================================================
// Visitors
// =============================================================================

/// Collects every package qualifier (`io` in `io.Reader`) referenced below a node,
/// in first-occurrence order and without duplicates.
#[derive(Debug, Default)]
pub struct QualifierCollector {
    pub qualifiers: Vec<IdentName>,
}

impl QualifierCollector {
    fn note(&mut self, q: IdentName) {
        if !self.qualifiers.iter().any(|seen| seen.sym == q.sym) {
            self.qualifiers.push(q);
        }
    }
}

impl<'ast> Visitor<'ast> for QualifierCollector {
    fn visit_type(&mut self, a: &'ast AstArena, id: TypeId) {
        match a.types[id] {
            Type::Named { pkg: Some(q), .. } => self.note(q),
            Type::Array {
                len: ArrayLen::Const { pkg: Some(q), .. },
                ..
            } => self.note(q),
            _ => {}
        }
        a.types[id].walk(a, self);
    }
}

/// Qualifiers used by the type declaration `spec`, type parameters included.
pub fn collect_qualifiers(a: &AstArena, spec: &TypeSpec) -> Vec<IdentName> {
    let mut c = QualifierCollector::default();
    spec.walk(a, &mut c);
    c.qualifiers
}

/// Qualifiers used by a single type expression.
pub fn collect_type_qualifiers(a: &AstArena, ty: TypeId) -> Vec<IdentName> {
    let mut c = QualifierCollector::default();
    c.visit_type(a, ty);
    c.qualifiers
}
