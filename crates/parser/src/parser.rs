//! Recursive-descent parser for Go declarations.
//!
//! Parses the package clause, imports and type declarations completely;
//! `func`, `var` and `const` declarations are skipped by bracket balancing up
//! to their terminating semicolon.

use crate::ast::*;
use crate::error::{Diag, LineIndex, ParseFailure};
use crate::lexer::{Lexer, Tok};
use crate::parser_support::{resolve_param_list, resolve_type_param_list, ParamDecl};

type PResult<T> = Result<T, Diag>;

/// A parsed source file together with the storage its nodes live in.
#[derive(Debug)]
pub struct ParsedFile {
    pub arena: AstArena,
    pub interner: Interner,
    pub file: SourceFile,
}

impl ParsedFile {
    #[inline]
    pub fn resolve(&self, sym: Symbol) -> &str {
        self.interner.resolve(sym)
    }

    /// Package name from the package clause.
    pub fn package_name(&self) -> &str {
        self.resolve(self.file.name.sym)
    }

    pub fn imports(&self) -> &[ImportSpec] {
        self.arena.imports(self.file.imports)
    }

    pub fn type_specs(&self) -> &[TypeSpec] {
        self.arena.type_specs(self.file.types)
    }

    /// Source text of each comment in a doc group, markers included.
    pub fn comment_lines<'s>(&self, src: &'s str, group: CommentGroupId) -> Vec<&'s str> {
        let group = self.arena.comment_groups[group];
        self.arena
            .comments(group.comments)
            .iter()
            .map(|c| c.span.text(src).trim_end())
            .collect()
    }

    /// First top-level type declaration named `name`.
    pub fn find_type(&self, name: &str) -> Option<&TypeSpec> {
        let sym = self.interner.get(name)?;
        self.type_specs().iter().find(|spec| spec.name.sym == sym)
    }
}

/// Comma-separated type expressions parsed on their own (generic type arguments).
#[derive(Debug)]
pub struct ParsedTypes {
    pub arena: AstArena,
    pub interner: Interner,
    pub types: Vec<TypeId>,
}

/// A method receiver: `f *File`, `File`, `s *Set[T]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReceiver {
    pub name: Option<String>,
    pub pointer: bool,
    pub type_name: String,
    pub type_params: Vec<String>,
}

pub fn parse_file(src: &str) -> Result<ParsedFile, ParseFailure> {
    let mut p = Parser::new(src)?;
    match p.source_file() {
        Ok(file) => Ok(ParsedFile {
            arena: p.arena,
            interner: p.interner,
            file,
        }),
        Err(d) => Err(ParseFailure { diags: vec![d] }),
    }
}

pub fn parse_type_list(src: &str) -> Result<ParsedTypes, ParseFailure> {
    let mut p = Parser::new(src)?;
    let fail = |d| ParseFailure { diags: vec![d] };

    let mut types = Vec::new();
    while !p.at_end() {
        types.push(p.parse_type().map_err(fail)?);
        if !p.eat(Tok::Comma) {
            break;
        }
    }
    p.finish().map_err(fail)?;
    if types.is_empty() {
        return Err(fail(Diag::parse(Span::empty_at(0), "expected type")));
    }

    Ok(ParsedTypes {
        arena: p.arena,
        interner: p.interner,
        types,
    })
}

pub fn parse_receiver(src: &str) -> Result<ParsedReceiver, ParseFailure> {
    let mut p = Parser::new(src)?;
    p.receiver().map_err(|d| ParseFailure { diags: vec![d] })
}

// =============================================================================
// Parser state
// =============================================================================

struct Parser<'src> {
    src: &'src str,
    toks: Vec<(usize, Tok<'src>, usize)>,
    pos: usize,
    comments: Vec<Comment>,
    lines: LineIndex,
    arena: AstArena,
    interner: Interner,
}

#[inline]
const fn starts_type(t: Tok<'_>) -> bool {
    matches!(
        t,
        Tok::Ident(_)
            | Tok::Star
            | Tok::LBrack
            | Tok::LParen
            | Tok::KwFunc
            | Tok::KwMap
            | Tok::KwChan
            | Tok::KwStruct
            | Tok::KwInterface
            | Tok::Arrow
    )
}

impl<'src> Parser<'src> {
    fn new(src: &'src str) -> Result<Self, ParseFailure> {
        let mut lx = Lexer::new(src);
        let toks: Vec<_> = lx.by_ref().collect();
        let diags = lx.take_diags();
        if !diags.is_empty() {
            return Err(ParseFailure { diags });
        }
        Ok(Self {
            src,
            toks,
            pos: 0,
            comments: lx.take_comments(),
            lines: LineIndex::new(src),
            arena: AstArena::new(),
            interner: Interner::new(),
        })
    }

    // -------------------------------------------------------------------------
    // Token helpers
    // -------------------------------------------------------------------------

    #[inline]
    fn peek(&self) -> Option<Tok<'src>> {
        self.peek_at(0)
    }

    #[inline]
    fn peek_at(&self, n: usize) -> Option<Tok<'src>> {
        self.toks.get(self.pos + n).map(|&(_, t, _)| t)
    }

    #[inline]
    fn at(&self, t: Tok<'_>) -> bool {
        self.peek() == Some(t)
    }

    #[inline]
    fn at_end(&self) -> bool {
        // An injected ';' at EOF does not count as content.
        match self.peek() {
            None => true,
            Some(Tok::Semi) => self.pos + 1 == self.toks.len() && self.span().is_empty(),
            _ => false,
        }
    }

    #[inline]
    fn span(&self) -> Span {
        match self.toks.get(self.pos) {
            Some(&(s, _, e)) => Span::new(s, e),
            None => Span::empty_at(self.src.len()),
        }
    }

    #[inline]
    fn prev_end(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.toks.get(i))
            .map_or(0, |&(_, _, e)| e)
    }

    #[inline]
    fn bump(&mut self) -> Span {
        let sp = self.span();
        if self.pos < self.toks.len() {
            self.pos += 1;
        }
        sp
    }

    #[inline]
    fn eat(&mut self, t: Tok<'_>) -> bool {
        if self.at(t) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn describe(&self) -> String {
        match self.peek() {
            None => "EOF".to_string(),
            Some(Tok::Semi) if self.span().is_empty() => "newline".to_string(),
            Some(t) => format!("`{t}`"),
        }
    }

    fn err_expected(&self, what: &str) -> Diag {
        Diag::parse(self.span(), format!("expected {what}, found {}", self.describe()))
    }

    fn expect(&mut self, t: Tok<'_>, what: &str) -> PResult<Span> {
        if self.at(t) {
            Ok(self.bump())
        } else {
            Err(self.err_expected(what))
        }
    }

    fn expect_ident(&mut self) -> PResult<IdentName> {
        match self.peek() {
            Some(Tok::Ident(s)) => {
                let pos = self.bump();
                Ok(IdentName {
                    sym: self.interner.intern(s),
                    pos,
                })
            }
            _ => Err(self.err_expected("identifier")),
        }
    }

    /// Statement terminator; may be omitted before a closing `)` or `}` and at EOF.
    fn expect_semi(&mut self) -> PResult<()> {
        match self.peek() {
            Some(Tok::Semi) => {
                self.bump();
                Ok(())
            }
            None | Some(Tok::RParen) | Some(Tok::RBrace) => Ok(()),
            _ => Err(self.err_expected("`;` or newline")),
        }
    }

    fn finish(&mut self) -> PResult<()> {
        self.eat(Tok::Semi);
        match self.peek() {
            None => Ok(()),
            _ => Err(self.err_expected("end of input")),
        }
    }

    /// Index (relative to `pos`) of the `]` matching the `[` at relative `open`.
    fn matching_bracket(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        let mut n = open;
        loop {
            match self.peek_at(n)? {
                Tok::LBrack | Tok::LParen | Tok::LBrace => depth += 1,
                Tok::RBrack | Tok::RParen | Tok::RBrace => {
                    depth = depth.checked_sub(1)?;
                    if depth == 0 {
                        return Some(n);
                    }
                }
                _ => {}
            }
            n += 1;
        }
    }

    /// For `Ident [` at relative offset `open - 1`: true when the brackets hold
    /// type arguments (`List[int]`) rather than start an array/slice type after
    /// a field or parameter name (`buf [4]byte`, `xs []int`).
    fn bracket_is_type_args(&self, open: usize) -> bool {
        if self.peek_at(open + 1) == Some(Tok::RBrack) {
            return false;
        }
        match self.matching_bracket(open) {
            Some(close) => !self.peek_at(close + 1).is_some_and(starts_type),
            None => false,
        }
    }

    // -------------------------------------------------------------------------
    // Doc comments
    // -------------------------------------------------------------------------

    /// Comment group ending on the line directly above the token at `start`,
    /// with no token in between.
    fn doc_before(&mut self, start: usize) -> Option<CommentGroupId> {
        let floor = self.prev_end() as u32;
        let start = start as u32;
        let hi = self.comments.partition_point(|c| c.span.end <= start);
        let lo = self.comments[..hi].partition_point(|c| c.span.start < floor);
        if lo == hi {
            return None;
        }

        let mut expect_line = self.lines.line(start);
        let mut first = hi;
        for i in (lo..hi).rev() {
            let c = self.comments[i];
            let end_line = self.lines.line(c.span.end.saturating_sub(1));
            if end_line + 1 != expect_line {
                break;
            }
            first = i;
            expect_line = self.lines.line(c.span.start);
        }
        if first == hi {
            return None;
        }

        let group: Vec<Comment> = self.comments[first..hi].to_vec();
        let span = group[0].span.to(group[group.len() - 1].span);
        let comments = self.arena.list_comments(group);
        Some(self.arena.comment_groups.alloc(CommentGroup { comments }, span))
    }

    // -------------------------------------------------------------------------
    // Source file
    // -------------------------------------------------------------------------

    fn source_file(&mut self) -> PResult<SourceFile> {
        while self.eat(Tok::Semi) {}
        let package_pos = self.expect(Tok::KwPackage, "`package`")?;
        let name = self.expect_ident()?;
        self.expect_semi()?;

        let mut imports = Vec::new();
        while self.eat(Tok::KwImport) {
            if self.eat(Tok::LParen) {
                while !self.at(Tok::RParen) && self.peek().is_some() {
                    imports.push(self.import_spec()?);
                    self.expect_semi()?;
                }
                self.expect(Tok::RParen, "`)`")?;
            } else {
                imports.push(self.import_spec()?);
            }
            self.expect_semi()?;
        }

        let mut types = Vec::new();
        loop {
            match self.peek() {
                None => break,
                Some(Tok::Semi) => {
                    self.bump();
                }
                Some(Tok::KwType) => {
                    self.type_decl(&mut types)?;
                    self.expect_semi()?;
                }
                Some(Tok::KwFunc | Tok::KwVar | Tok::KwConst) => {
                    self.skip_decl()?;
                    self.expect_semi()?;
                }
                Some(Tok::KwImport) => {
                    return Err(Diag::parse(
                        self.span(),
                        "imports must appear before other declarations",
                    ))
                }
                Some(_) => return Err(self.err_expected("declaration")),
            }
        }

        Ok(SourceFile {
            package_pos,
            name,
            imports: self.arena.list_imports(imports),
            types: self.arena.list_type_specs(types),
        })
    }

    fn import_spec(&mut self) -> PResult<ImportSpec> {
        let name = match self.peek() {
            Some(Tok::Dot) => Some(ImportName::Dot(self.bump())),
            Some(Tok::Ident("_")) => Some(ImportName::Blank(self.bump())),
            Some(Tok::Ident(_)) => Some(ImportName::Name(self.expect_ident()?)),
            _ => None,
        };
        match self.peek() {
            Some(Tok::StringLit(lit) | Tok::RawStringLit(lit)) => {
                let path_pos = self.bump();
                let unquoted = lit.get(1..lit.len().saturating_sub(1)).unwrap_or("");
                Ok(ImportSpec {
                    name,
                    path: self.interner.intern(unquoted),
                    path_pos,
                })
            }
            _ => Err(self.err_expected("import path")),
        }
    }

    /// Skips a `func`/`var`/`const` declaration, stopping before its terminator.
    fn skip_decl(&mut self) -> PResult<()> {
        let start = self.span();
        let mut depth = 0usize;
        loop {
            match self.peek() {
                None => return Ok(()),
                Some(Tok::LParen | Tok::LBrack | Tok::LBrace) => depth += 1,
                Some(Tok::RParen | Tok::RBrack | Tok::RBrace) => {
                    depth = depth
                        .checked_sub(1)
                        .ok_or_else(|| Diag::parse(self.span(), "unbalanced closing bracket"))?;
                }
                Some(Tok::Semi) if depth == 0 => return Ok(()),
                _ => {}
            }
            self.bump();
            if self.peek().is_none() && depth > 0 {
                return Err(Diag::parse(start, "unterminated declaration"));
            }
        }
    }

    // -------------------------------------------------------------------------
    // Type declarations
    // -------------------------------------------------------------------------

    fn type_decl(&mut self, out: &mut Vec<TypeSpec>) -> PResult<()> {
        let doc = self.doc_before(self.span().start as usize);
        self.expect(Tok::KwType, "`type`")?;
        if self.eat(Tok::LParen) {
            while !self.at(Tok::RParen) && self.peek().is_some() {
                let doc = self.doc_before(self.span().start as usize);
                out.push(self.type_spec(doc)?);
                self.expect_semi()?;
            }
            self.expect(Tok::RParen, "`)`")?;
        } else {
            out.push(self.type_spec(doc)?);
        }
        Ok(())
    }

    fn type_spec(&mut self, doc: Option<CommentGroupId>) -> PResult<TypeSpec> {
        let name = self.expect_ident()?;
        let type_params = if self.at(Tok::LBrack) && self.looks_like_type_params() {
            self.type_params()?
        } else {
            ListRef::EMPTY
        };
        let alias = self.eat(Tok::Assign);
        let typ = self.parse_type()?;
        Ok(TypeSpec {
            doc,
            name,
            type_params,
            typ,
            alias,
        })
    }

    /// At `type Name [`: a type parameter list or the start of an array type?
    fn looks_like_type_params(&self) -> bool {
        match (self.peek_at(1), self.peek_at(2)) {
            (Some(Tok::Ident(_)), Some(Tok::Star)) => {
                !matches!(self.peek_at(3), Some(Tok::IntLit(_)))
            }
            (Some(Tok::Ident(_)), Some(next)) => matches!(
                next,
                Tok::Ident(_)
                    | Tok::Comma
                    | Tok::KwInterface
                    | Tok::KwFunc
                    | Tok::KwMap
                    | Tok::KwChan
                    | Tok::KwStruct
                    | Tok::Tilde
                    | Tok::LBrack
                    | Tok::LParen
                    | Tok::Arrow
            ),
            _ => false,
        }
    }

    fn type_params(&mut self) -> PResult<ListRef<TypeParamDeclId>> {
        self.expect(Tok::LBrack, "`[`")?;
        let mut entries = Vec::new();
        loop {
            let name = self.expect_ident()?;
            let constraint = if self.at(Tok::Comma) || self.at(Tok::RBrack) {
                None
            } else {
                Some(self.type_elem()?)
            };
            entries.push((name, constraint));
            if !self.eat(Tok::Comma) || self.at(Tok::RBrack) {
                break;
            }
        }
        self.expect(Tok::RBrack, "`]`")?;
        let ids = resolve_type_param_list(&mut self.arena, entries);
        Ok(self.arena.list_type_param_decl_ids(ids))
    }

    fn type_elem(&mut self) -> PResult<TypeElem> {
        let mut terms = Vec::new();
        loop {
            let term = if self.at(Tok::Tilde) {
                let tilde_pos = self.bump();
                TypeTerm::Tilde {
                    tilde_pos,
                    typ: self.parse_type()?,
                }
            } else {
                TypeTerm::Type {
                    typ: self.parse_type()?,
                }
            };
            terms.push(term);
            if !self.eat(Tok::Pipe) {
                break;
            }
        }
        Ok(TypeElem {
            terms: self.arena.list_type_terms(terms),
        })
    }

    // -------------------------------------------------------------------------
    // Types
    // -------------------------------------------------------------------------

    fn alloc_type(&mut self, typ: Type, start: Span) -> TypeId {
        let span = Span::new(start.start as usize, self.prev_end());
        self.arena.types.alloc(typ, span)
    }

    fn parse_type(&mut self) -> PResult<TypeId> {
        let start = self.span();
        match self.peek() {
            Some(Tok::Ident(_)) => self.type_name(),
            Some(Tok::Star) => {
                self.bump();
                let elem = self.parse_type()?;
                Ok(self.alloc_type(Type::Pointer { elem }, start))
            }
            Some(Tok::LBrack) => {
                self.bump();
                if self.eat(Tok::RBrack) {
                    let elem = self.parse_type()?;
                    return Ok(self.alloc_type(Type::Slice { elem }, start));
                }
                let len = self.array_len()?;
                self.expect(Tok::RBrack, "`]`")?;
                let elem = self.parse_type()?;
                Ok(self.alloc_type(Type::Array { len, elem }, start))
            }
            Some(Tok::KwMap) => {
                self.bump();
                self.expect(Tok::LBrack, "`[`")?;
                let key = self.parse_type()?;
                self.expect(Tok::RBrack, "`]`")?;
                let val = self.parse_type()?;
                Ok(self.alloc_type(Type::Map { key, val }, start))
            }
            Some(Tok::KwChan) => {
                self.bump();
                let dir = if self.eat(Tok::Arrow) {
                    ChanDir::Send
                } else {
                    ChanDir::Both
                };
                let elem = self.parse_type()?;
                Ok(self.alloc_type(Type::Chan { dir, elem }, start))
            }
            Some(Tok::Arrow) => {
                self.bump();
                self.expect(Tok::KwChan, "`chan`")?;
                let elem = self.parse_type()?;
                Ok(self.alloc_type(
                    Type::Chan {
                        dir: ChanDir::Recv,
                        elem,
                    },
                    start,
                ))
            }
            Some(Tok::KwFunc) => {
                self.bump();
                let sig = self.signature()?;
                Ok(self.alloc_type(Type::Func { sig }, start))
            }
            Some(Tok::KwStruct) => self.struct_type(),
            Some(Tok::KwInterface) => self.interface_type(),
            Some(Tok::LParen) => {
                self.bump();
                let typ = self.parse_type()?;
                self.expect(Tok::RParen, "`)`")?;
                Ok(self.alloc_type(Type::Paren { typ }, start))
            }
            _ => Err(self.err_expected("type")),
        }
    }

    fn type_name(&mut self) -> PResult<TypeId> {
        let start = self.span();
        let first = self.expect_ident()?;
        let (pkg, name) = if self.eat(Tok::Dot) {
            (Some(first), self.expect_ident()?)
        } else {
            (None, first)
        };
        let args = if self.at(Tok::LBrack) {
            self.type_args()?
        } else {
            ListRef::EMPTY
        };
        Ok(self.alloc_type(Type::Named { pkg, name, args }, start))
    }

    fn type_args(&mut self) -> PResult<ListRef<TypeId>> {
        self.expect(Tok::LBrack, "`[`")?;
        let mut args = Vec::new();
        while !self.at(Tok::RBrack) {
            args.push(self.parse_type()?);
            if !self.eat(Tok::Comma) {
                break;
            }
        }
        self.expect(Tok::RBrack, "`]`")?;
        if args.is_empty() {
            return Err(Diag::parse(self.span(), "empty type argument list"));
        }
        Ok(self.arena.list_types(args))
    }

    /// After `[` of an array type; leaves the closing `]` in place.
    fn array_len(&mut self) -> PResult<ArrayLen> {
        match (self.peek(), self.peek_at(1)) {
            (Some(Tok::Ellipsis), _) => return Ok(ArrayLen::Ellipsis(self.bump())),
            (Some(Tok::IntLit(_)), Some(Tok::RBrack)) => return Ok(ArrayLen::Int(self.bump())),
            (Some(Tok::Ident(_)), Some(Tok::RBrack)) => {
                let name = self.expect_ident()?;
                return Ok(ArrayLen::Const { pkg: None, name });
            }
            (Some(Tok::Ident(_)), Some(Tok::Dot))
                if matches!(self.peek_at(2), Some(Tok::Ident(_)))
                    && self.peek_at(3) == Some(Tok::RBrack) =>
            {
                let pkg = self.expect_ident()?;
                self.bump();
                let name = self.expect_ident()?;
                return Ok(ArrayLen::Const {
                    pkg: Some(pkg),
                    name,
                });
            }
            _ => {}
        }

        let start = self.span();
        let mut depth = 0usize;
        loop {
            match self.peek() {
                None => return Err(self.err_expected("`]`")),
                Some(Tok::RBrack) if depth == 0 => break,
                Some(Tok::LBrack | Tok::LParen | Tok::LBrace) => depth += 1,
                Some(Tok::RBrack | Tok::RParen | Tok::RBrace) => {
                    depth = depth
                        .checked_sub(1)
                        .ok_or_else(|| self.err_expected("`]`"))?;
                }
                _ => {}
            }
            self.bump();
        }
        if self.prev_end() <= start.start as usize {
            return Err(self.err_expected("array length"));
        }
        Ok(ArrayLen::Expr(Span::new(start.start as usize, self.prev_end())))
    }

    // -------------------------------------------------------------------------
    // Signatures
    // -------------------------------------------------------------------------

    fn signature(&mut self) -> PResult<SignatureId> {
        let start = self.span();
        let params = self.params()?;
        let results = match self.peek() {
            Some(Tok::LParen) => Some(Results::Params(self.params()?)),
            Some(t) if starts_type(t) => Some(Results::Type(self.parse_type()?)),
            _ => None,
        };
        let span = Span::new(start.start as usize, self.prev_end());
        Ok(self
            .arena
            .signatures
            .alloc(Signature { params, results }, span))
    }

    fn params(&mut self) -> PResult<ListRef<FieldId>> {
        self.expect(Tok::LParen, "`(`")?;
        let mut entries = Vec::new();
        while !self.at(Tok::RParen) {
            entries.push(self.param_entry()?);
            if !self.eat(Tok::Comma) {
                break;
            }
        }
        self.expect(Tok::RParen, "`)`")?;
        let fields = resolve_param_list(&mut self.arena, entries);
        Ok(self.arena.list_fields(fields))
    }

    fn param_entry(&mut self) -> PResult<ParamDecl> {
        let start = self.span();
        let mut names = Vec::new();
        let mut ellipsis_pos = None;

        let typ = match (self.peek(), self.peek_at(1)) {
            (Some(Tok::Ident(_)), Some(Tok::Dot)) => Some(self.parse_type()?),
            (Some(Tok::Ident(_)), Some(Tok::Comma | Tok::RParen | Tok::Semi) | None) => {
                names.push(self.expect_ident()?);
                None
            }
            (Some(Tok::Ident(_)), Some(Tok::LBrack)) if self.bracket_is_type_args(1) => {
                Some(self.parse_type()?)
            }
            (Some(Tok::Ident(_)), _) => {
                names.push(self.expect_ident()?);
                if self.at(Tok::Ellipsis) {
                    ellipsis_pos = Some(self.bump());
                }
                Some(self.parse_type()?)
            }
            (Some(Tok::Ellipsis), _) => {
                ellipsis_pos = Some(self.bump());
                Some(self.parse_type()?)
            }
            _ => Some(self.parse_type()?),
        };

        Ok(ParamDecl {
            names,
            ellipsis_pos,
            typ,
            span: Span::new(start.start as usize, self.prev_end()),
        })
    }

    // -------------------------------------------------------------------------
    // Struct and interface bodies
    // -------------------------------------------------------------------------

    fn struct_type(&mut self) -> PResult<TypeId> {
        let start = self.expect(Tok::KwStruct, "`struct`")?;
        self.expect(Tok::LBrace, "`{`")?;
        let mut fields = Vec::new();
        while !self.at(Tok::RBrace) && self.peek().is_some() {
            fields.push(self.struct_field()?);
            self.expect_semi()?;
        }
        self.expect(Tok::RBrace, "`}`")?;
        let fields = self.arena.list_fields(fields);
        Ok(self.alloc_type(Type::Struct { fields }, start))
    }

    fn struct_field(&mut self) -> PResult<FieldId> {
        let start = self.span();
        let embedded = match (self.peek(), self.peek_at(1)) {
            (Some(Tok::Star), _) => true,
            (
                Some(Tok::Ident(_)),
                Some(
                    Tok::Semi | Tok::RBrace | Tok::Dot | Tok::StringLit(_) | Tok::RawStringLit(_),
                )
                | None,
            ) => true,
            (Some(Tok::Ident(_)), Some(Tok::LBrack)) => self.bracket_is_type_args(1),
            _ => false,
        };

        let (names, typ) = if embedded {
            let typ = if self.at(Tok::Star) {
                let star = self.bump();
                let elem = self.type_name()?;
                self.alloc_type(Type::Pointer { elem }, star)
            } else {
                self.type_name()?
            };
            (ListRef::EMPTY, typ)
        } else {
            let mut names = vec![self.expect_ident()?];
            while self.eat(Tok::Comma) {
                names.push(self.expect_ident()?);
            }
            let typ = self.parse_type()?;
            (self.arena.list_ident_names(names), typ)
        };

        let tag = match self.peek() {
            Some(Tok::StringLit(_) | Tok::RawStringLit(_)) => Some(self.bump()),
            _ => None,
        };

        let span = Span::new(start.start as usize, self.prev_end());
        Ok(self.arena.fields.alloc(
            Field {
                names,
                ellipsis_pos: None,
                typ,
                tag,
                is_embed: embedded,
            },
            span,
        ))
    }

    fn interface_type(&mut self) -> PResult<TypeId> {
        let start = self.expect(Tok::KwInterface, "`interface`")?;
        self.expect(Tok::LBrace, "`{`")?;
        let mut elems = Vec::new();
        while !self.at(Tok::RBrace) && self.peek().is_some() {
            let elem = match (self.peek(), self.peek_at(1)) {
                (Some(Tok::Ident(_)), Some(Tok::LParen)) => {
                    let doc = self.doc_before(self.span().start as usize);
                    let name = self.expect_ident()?;
                    let sig = self.signature()?;
                    InterfaceElem::Method { doc, name, sig }
                }
                _ => InterfaceElem::TypeElem(self.type_elem()?),
            };
            elems.push(elem);
            self.expect_semi()?;
        }
        self.expect(Tok::RBrace, "`}`")?;
        let elems = self.arena.list_interface_elems(elems);
        Ok(self.alloc_type(Type::Interface { elems }, start))
    }

    // -------------------------------------------------------------------------
    // Receivers
    // -------------------------------------------------------------------------

    fn receiver(&mut self) -> PResult<ParsedReceiver> {
        if self.at_end() {
            return Err(Diag::parse(self.span(), "empty receiver"));
        }
        let mut entries = Vec::new();
        while !self.at_end() {
            entries.push(self.param_entry()?);
            if !self.eat(Tok::Comma) {
                break;
            }
        }
        self.finish()?;

        let fields = resolve_param_list(&mut self.arena, entries);
        let [field] = fields.as_slice() else {
            return Err(Diag::parse(
                Span::new(0, self.src.len()),
                "receiver must declare exactly one parameter",
            ));
        };
        let field = self.arena.fields[*field];
        let names = self.arena.ident_names(field.names);
        if names.len() > 1 || field.ellipsis_pos.is_some() {
            return Err(Diag::parse(
                self.arena.fields.span(fields[0]),
                "receiver must declare exactly one parameter",
            ));
        }
        let name = names.first().map(|n| self.interner.resolve(n.sym).to_string());

        let mut typ = field.typ;
        while let Type::Paren { typ: inner } = self.arena.types[typ] {
            typ = inner;
        }
        let (pointer, base) = match self.arena.types[typ] {
            Type::Pointer { elem } => (true, elem),
            _ => (false, typ),
        };
        let bad = |p: &Self| {
            Diag::parse(
                p.arena.types.span(base),
                "receiver type must be a type name, optionally with type parameters",
            )
        };
        let Type::Named {
            pkg: None,
            name: type_name,
            args,
        } = self.arena.types[base]
        else {
            return Err(bad(self));
        };

        let mut type_params = Vec::new();
        for &arg in self.arena.types_list(args) {
            match self.arena.types[arg] {
                Type::Named {
                    pkg: None,
                    name,
                    args,
                } if args.is_empty() => type_params.push(self.interner.resolve(name.sym).to_string()),
                _ => return Err(bad(self)),
            }
        }

        Ok(ParsedReceiver {
            name,
            pointer,
            type_name: self.interner.resolve(type_name.sym).to_string(),
            type_params,
        })
    }
}
