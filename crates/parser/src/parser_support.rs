use crate::ast::{self, Span, TypeElem};

/// One comma-separated entry of a parameter-like list, before grouping.
///
/// `names` holds the leading identifier when the entry was `name Type`, or the
/// lone identifier when the entry was just `x` (which is a name or a type
/// depending on the rest of the list, so `typ` stays `None`).
#[derive(Clone, Debug)]
pub struct ParamDecl {
    pub names: Vec<ast::IdentName>,
    pub ellipsis_pos: Option<Span>,
    pub typ: Option<ast::TypeId>,
    pub span: Span,
}

/// Groups parameter entries following Go's rule: bare identifiers are names
/// when some later entry has a type (`a, b int`), otherwise each is a type
/// (`int, string`).
pub fn resolve_param_list(arena: &mut ast::AstArena, params: Vec<ParamDecl>) -> Vec<ast::FieldId> {
    let mut out = Vec::new();
    let mut pending_names: Vec<ast::IdentName> = Vec::new();
    let mut pending_start: Option<u32> = None;

    for param in params {
        if let Some(typ) = param.typ {
            let mut names = std::mem::take(&mut pending_names);
            names.extend(param.names);

            let names_ref = if names.is_empty() {
                ast::ListRef::EMPTY
            } else {
                arena.list_ident_names(names)
            };
            let start = pending_start.take().unwrap_or(param.span.start);
            let span = Span {
                start,
                end: param.span.end,
            };
            let field = ast::Field {
                names: names_ref,
                ellipsis_pos: param.ellipsis_pos,
                typ,
                tag: None,
                is_embed: false,
            };
            out.push(arena.fields.alloc(field, span));
        } else {
            if pending_names.is_empty() {
                pending_start = Some(param.span.start);
            }
            pending_names.extend(param.names);
        }
    }

    for name in pending_names {
        let typ = named_type_from_ident(arena, name);
        let field = ast::Field {
            names: ast::ListRef::EMPTY,
            ellipsis_pos: None,
            typ,
            tag: None,
            is_embed: false,
        };
        out.push(arena.fields.alloc(field, name.pos));
    }

    out
}

/// Groups type parameter entries (`K, V any`, `T interface{ M() }`) into
/// declarations. A trailing group without a constraint keeps an empty one.
pub fn resolve_type_param_list(
    arena: &mut ast::AstArena,
    params: Vec<(ast::IdentName, Option<TypeElem>)>,
) -> Vec<ast::TypeParamDeclId> {
    let mut out = Vec::new();
    let mut pending: Vec<ast::IdentName> = Vec::new();

    for (name, constraint) in params {
        pending.push(name);
        if let Some(constraint) = constraint {
            let span = pending[0].pos.to(name.pos);
            let names = arena.list_ident_names(std::mem::take(&mut pending));
            out.push(
                arena
                    .type_param_decls
                    .alloc(ast::TypeParamDecl { names, constraint }, span),
            );
        }
    }

    if !pending.is_empty() {
        let span = pending[0].pos.to(pending[pending.len() - 1].pos);
        let names = arena.list_ident_names(pending);
        let constraint = TypeElem {
            terms: ast::ListRef::EMPTY,
        };
        out.push(
            arena
                .type_param_decls
                .alloc(ast::TypeParamDecl { names, constraint }, span),
        );
    }

    out
}

pub fn named_type_from_ident(arena: &mut ast::AstArena, name: ast::IdentName) -> ast::TypeId {
    arena.types.alloc(
        ast::Type::Named {
            pkg: None,
            name,
            args: ast::ListRef::EMPTY,
        },
        name.pos,
    )
}
