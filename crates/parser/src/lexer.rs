use crate::ast::{Comment, CommentKind, Span};
use crate::error::{Diag, LexError, LexErrorKind};
use logos::{Lexer as LogosLexer, Logos};
use std::ops::Range;

// =============================================================================
// 0. Shared helpers
// =============================================================================

#[inline(always)]
const fn first_newline_offset(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if matches!(bytes[i], b'\n' | b'\r') {
            return Some(i);
        }
        i += 1;
    }

    None
}

#[inline(always)]
const fn is_dec_digit(b: u8) -> bool {
    b.is_ascii_digit()
}

#[inline(always)]
const fn is_number_tail(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'.'
}

// =============================================================================
// 1. Block comment scanner
// =============================================================================

#[inline]
fn lex_block_comment(lex: &mut LogosLexer<'_, RawTok>) -> Result<(), LexErrorKind> {
    use memchr::memchr;

    let rem = lex.remainder().as_bytes();
    let mut search_start = 0;

    while let Some(star_pos) = memchr(b'*', &rem[search_start..]) {
        let abs_pos = search_start + star_pos;
        if rem.get(abs_pos + 1) == Some(&b'/') {
            lex.bump(abs_pos + 2);
            return Ok(());
        }
        search_start = abs_pos + 1;
    }

    lex.bump(rem.len());
    Err(LexErrorKind::UnterminatedComment)
}

// =============================================================================
// 2. Numeric literals
// =============================================================================
//
// Declarations only ever need the text of a literal (array lengths), so the
// scanner munches the maximal literal and classifies it; it does not check
// digit validity per base.

mod num {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum NumKind {
        Int,
        Float,
        Imag,
    }

    /// Maximal munch: digits, letters, `_`, `.`, and a sign right after an exponent marker.
    pub fn lex_number(lex: &mut LogosLexer<'_, super::RawTok>) -> Result<(), LexErrorKind> {
        let start = lex.slice().as_bytes();
        let hex = start.len() >= 2 && start[0] == b'0' && matches!(start[1], b'x' | b'X');
        let rem = lex.remainder().as_bytes();

        let mut prev = *start.last().unwrap_or(&b'0');
        let mut hex = hex;
        let mut i = 0;
        while i < rem.len() {
            let b = rem[i];
            let exp_sign = matches!(b, b'+' | b'-')
                && (matches!(prev, b'p' | b'P') || (!hex && matches!(prev, b'e' | b'E')));
            if !(is_number_tail(b) || exp_sign) {
                break;
            }
            // `1..` never occurs in Go; stop before a second dot so `x[1:]`-style
            // slicing and method values on literals stay intact.
            if b == b'.' && rem.get(i + 1) == Some(&b'.') {
                break;
            }
            if i == 0 && start.len() == 1 && start[0] == b'0' && matches!(b, b'x' | b'X') {
                hex = true;
            }
            prev = b;
            i += 1;
        }
        lex.bump(i);
        Ok(())
    }

    pub fn classify_number(lit: &[u8]) -> Result<NumKind, LexErrorKind> {
        let (body, imag) = match lit.split_last() {
            Some((b'i', rest)) => (rest, true),
            _ => (lit, false),
        };
        if body.is_empty() || body.last() == Some(&b'_') {
            return Err(LexErrorKind::InvalidNumber);
        }
        if body.windows(2).any(|w| w == b"__") {
            return Err(LexErrorKind::InvalidNumber);
        }

        let prefixed = body.len() >= 2 && body[0] == b'0' && body[1].is_ascii_alphabetic();
        if prefixed {
            let digits = &body[2..];
            if digits.is_empty() || !digits.iter().any(|b| b.is_ascii_hexdigit()) {
                return Err(LexErrorKind::InvalidNumber);
            }
        } else if !body.iter().any(|&b| is_dec_digit(b)) {
            return Err(LexErrorKind::InvalidNumber);
        }

        let is_hex = prefixed && matches!(body[1], b'x' | b'X');
        let is_float = body.contains(&b'.')
            || body.iter().any(|&b| matches!(b, b'p' | b'P'))
            || (!is_hex && body.iter().any(|&b| matches!(b, b'e' | b'E')));

        Ok(if imag {
            NumKind::Imag
        } else if is_float {
            NumKind::Float
        } else {
            NumKind::Int
        })
    }
}

// =============================================================================
// 3. Token Definition (RawTok)
// =============================================================================

#[repr(u8)]
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(error = LexErrorKind)]
#[logos(skip r"[ \t\f]+")]
#[rustfmt::skip]
enum RawTok {
    #[token("\u{FEFF}")] Bom,

    // Trivia
    #[regex(r"\r\n|\n|\r")] Newline,
    #[regex(r"//[^\n\r]*")] LineComment,
    #[token("/*", lex_block_comment)] BlockComment,

    // Keywords (before Ident)
    #[token("break")] KwBreak,
    #[token("case")] KwCase,
    #[token("chan")] KwChan,
    #[token("const")] KwConst,
    #[token("continue")] KwContinue,
    #[token("default")] KwDefault,
    #[token("defer")] KwDefer,
    #[token("else")] KwElse,
    #[token("fallthrough")] KwFallthrough,
    #[token("for")] KwFor,
    #[token("func")] KwFunc,
    #[token("go")] KwGo,
    #[token("goto")] KwGoto,
    #[token("if")] KwIf,
    #[token("import")] KwImport,
    #[token("interface")] KwInterface,
    #[token("map")] KwMap,
    #[token("package")] KwPackage,
    #[token("range")] KwRange,
    #[token("return")] KwReturn,
    #[token("select")] KwSelect,
    #[token("struct")] KwStruct,
    #[token("switch")] KwSwitch,
    #[token("type")] KwType,
    #[token("var")] KwVar,

    #[regex(r"[_\p{L}][_\p{L}\p{Nd}]*")] Ident,

    #[regex(r"[0-9]|\.[0-9]", num::lex_number)] Number,

    #[regex(r"`[^`]*`")] RawString,
    #[regex(r#""([^"\\\n\r]|\\.)*""#)] String,
    #[regex(r"'([^'\\\n\r]|\\.)+'")] Rune,

    // Operators the declaration grammar looks at
    #[token("...")] Ellipsis,
    #[token("<-")] Arrow,
    #[token("=")] Assign,
    #[token("*")] Star,
    #[token("~")] Tilde,
    #[token("|")] Pipe,
    #[token("++")] Inc,
    #[token("--")] Dec,

    // Everything else is opaque to the parser
    #[token("<<=")] #[token(">>=")] #[token("&^=")] #[token("+=")] #[token("-=")]
    #[token("*=")] #[token("/=")] #[token("%=")] #[token("&=")] #[token("|=")]
    #[token("^=")] #[token("<<")] #[token(">>")] #[token("&^")] #[token("&&")]
    #[token("||")] #[token("==")] #[token("!=")] #[token("<=")] #[token(">=")]
    #[token(":=")] #[token("+")] #[token("-")] #[token("/")] #[token("%")]
    #[token("&")] #[token("^")] #[token("!")] #[token("<")] #[token(">")]
    Op,

    // Delimiters
    #[token("(")] LParen,
    #[token(")")] RParen,
    #[token("[")] LBrack,
    #[token("]")] RBrack,
    #[token("{")] LBrace,
    #[token("}")] RBrace,
    #[token(",")] Comma,
    #[token(";")] Semi,
    #[token(":")] Colon,
    #[token(".")] Dot,

    // Catch-all (lowest priority)
    #[regex(r".", priority = 0)] Error,
}

// =============================================================================
// 4. Lookup tables
// =============================================================================

macro_rules! gen_lookup_table {
    (bool, $size:expr, $($variant:ident),* $(,)?) => {{
        let mut table = [false; $size];
        $(table[RawTok::$variant as usize] = true;)*
        table
    }};
}

const SEMI_INSERT_TABLE: [bool; 256] = gen_lookup_table!(
    bool,
    256,
    Ident,
    Number,
    Rune,
    String,
    RawString,
    KwBreak,
    KwContinue,
    KwFallthrough,
    KwReturn,
    Inc,
    Dec,
    RParen,
    RBrack,
    RBrace,
);

impl RawTok {
    #[inline(always)]
    const fn can_insert_semicolon(self) -> bool {
        SEMI_INSERT_TABLE[self as usize]
    }

    #[inline]
    fn to_token<'src>(self, slice: &'src str) -> Tok<'src> {
        match self {
            Self::Ident => Tok::Ident(slice),
            Self::Rune => Tok::RuneLit(slice),
            Self::String => Tok::StringLit(slice),
            Self::RawString => Tok::RawStringLit(slice),

            Self::KwBreak => Tok::KwBreak,
            Self::KwCase => Tok::KwCase,
            Self::KwChan => Tok::KwChan,
            Self::KwConst => Tok::KwConst,
            Self::KwContinue => Tok::KwContinue,
            Self::KwDefault => Tok::KwDefault,
            Self::KwDefer => Tok::KwDefer,
            Self::KwElse => Tok::KwElse,
            Self::KwFallthrough => Tok::KwFallthrough,
            Self::KwFor => Tok::KwFor,
            Self::KwFunc => Tok::KwFunc,
            Self::KwGo => Tok::KwGo,
            Self::KwGoto => Tok::KwGoto,
            Self::KwIf => Tok::KwIf,
            Self::KwImport => Tok::KwImport,
            Self::KwInterface => Tok::KwInterface,
            Self::KwMap => Tok::KwMap,
            Self::KwPackage => Tok::KwPackage,
            Self::KwRange => Tok::KwRange,
            Self::KwReturn => Tok::KwReturn,
            Self::KwSelect => Tok::KwSelect,
            Self::KwStruct => Tok::KwStruct,
            Self::KwSwitch => Tok::KwSwitch,
            Self::KwType => Tok::KwType,
            Self::KwVar => Tok::KwVar,

            Self::Ellipsis => Tok::Ellipsis,
            Self::Arrow => Tok::Arrow,
            Self::Assign => Tok::Assign,
            Self::Star => Tok::Star,
            Self::Tilde => Tok::Tilde,
            Self::Pipe => Tok::Pipe,
            Self::Inc | Self::Dec | Self::Op => Tok::Op(slice),

            Self::LParen => Tok::LParen,
            Self::RParen => Tok::RParen,
            Self::LBrack => Tok::LBrack,
            Self::RBrack => Tok::RBrack,
            Self::LBrace => Tok::LBrace,
            Self::RBrace => Tok::RBrace,
            Self::Comma => Tok::Comma,
            Self::Semi => Tok::Semi,
            Self::Colon => Tok::Colon,
            Self::Dot => Tok::Dot,

            // Handled by the wrapper before conversion.
            Self::Number
            | Self::Bom
            | Self::Newline
            | Self::LineComment
            | Self::BlockComment
            | Self::Error => Tok::Error,
        }
    }
}

// =============================================================================
// 5. Public Token Definition (zero-copy)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tok<'input> {
    Ident(&'input str),
    IntLit(&'input str),
    FloatLit(&'input str),
    ImagLit(&'input str),
    RuneLit(&'input str),
    StringLit(&'input str),
    RawStringLit(&'input str),

    // Keywords
    KwBreak,
    KwCase,
    KwChan,
    KwConst,
    KwContinue,
    KwDefault,
    KwDefer,
    KwElse,
    KwFallthrough,
    KwFor,
    KwFunc,
    KwGo,
    KwGoto,
    KwIf,
    KwImport,
    KwInterface,
    KwMap,
    KwPackage,
    KwRange,
    KwReturn,
    KwSelect,
    KwStruct,
    KwSwitch,
    KwType,
    KwVar,

    // Operators the declaration grammar distinguishes
    Ellipsis,
    Arrow,
    Assign,
    Star,
    Tilde,
    Pipe,
    /// Any other operator, by its text.
    Op(&'input str),

    // Delimiters
    LParen,
    RParen,
    LBrack,
    RBrack,
    LBrace,
    RBrace,
    Comma,
    Semi,
    Colon,
    Dot,

    Error,
}

impl<'input> std::fmt::Display for Tok<'input> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tok::Ident(s)
            | Tok::IntLit(s)
            | Tok::FloatLit(s)
            | Tok::ImagLit(s)
            | Tok::RuneLit(s)
            | Tok::StringLit(s)
            | Tok::RawStringLit(s)
            | Tok::Op(s) => f.write_str(s),
            Tok::Ellipsis => f.write_str("..."),
            Tok::Arrow => f.write_str("<-"),
            Tok::Assign => f.write_str("="),
            Tok::Star => f.write_str("*"),
            Tok::Tilde => f.write_str("~"),
            Tok::Pipe => f.write_str("|"),
            Tok::LParen => f.write_str("("),
            Tok::RParen => f.write_str(")"),
            Tok::LBrack => f.write_str("["),
            Tok::RBrack => f.write_str("]"),
            Tok::LBrace => f.write_str("{"),
            Tok::RBrace => f.write_str("}"),
            Tok::Comma => f.write_str(","),
            Tok::Semi => f.write_str(";"),
            Tok::Colon => f.write_str(":"),
            Tok::Dot => f.write_str("."),
            Tok::Error => f.write_str("<error>"),
            kw => {
                let dbg = format!("{kw:?}");
                f.write_str(&dbg.trim_start_matches("Kw").to_ascii_lowercase())
            }
        }
    }
}

// =============================================================================
// 6. Lexer wrapper: semicolon insertion + comment capture + diags
// =============================================================================

pub struct Lexer<'src> {
    logos: LogosLexer<'src, RawTok>,
    pending: Option<(usize, Tok<'src>, usize)>,
    diags: Vec<Diag>,
    comments: Vec<Comment>,
    last_can_insert_semi: bool,
    src_len: usize,
    eof_done: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(input: &'src str) -> Self {
        Self {
            logos: RawTok::lexer(input),
            pending: None,
            diags: Vec::new(),
            comments: Vec::new(),
            last_can_insert_semi: false,
            src_len: input.len(),
            eof_done: false,
        }
    }

    pub fn take_diags(&mut self) -> Vec<Diag> {
        std::mem::take(&mut self.diags)
    }

    /// Comments seen so far, in source order.
    pub fn take_comments(&mut self) -> Vec<Comment> {
        std::mem::take(&mut self.comments)
    }

    #[inline]
    fn push_lex_diag(&mut self, kind: LexErrorKind, span: Range<usize>) {
        let sp = Span::from_range(span);
        self.diags.push(LexError { kind, span: sp }.diag());
    }

    #[inline]
    fn emit_semi_at(&mut self, pos: usize) {
        self.pending = Some((pos, Tok::Semi, pos));
    }

    #[inline]
    fn handle_trivia(&mut self, raw: RawTok, span: &Range<usize>, slice: &str) -> bool {
        match raw {
            RawTok::Newline => {
                if self.last_can_insert_semi {
                    self.last_can_insert_semi = false;
                    self.emit_semi_at(span.start);
                }
                true
            }
            RawTok::LineComment => {
                self.comments.push(Comment {
                    kind: CommentKind::Line,
                    span: Span::from_range(span.clone()),
                });
                true
            }
            RawTok::BlockComment => {
                self.comments.push(Comment {
                    kind: CommentKind::Block,
                    span: Span::from_range(span.clone()),
                });
                if self.last_can_insert_semi {
                    if let Some(off) = first_newline_offset(slice) {
                        self.last_can_insert_semi = false;
                        self.emit_semi_at(span.start + off);
                    }
                }
                true
            }
            _ => false,
        }
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = (usize, Tok<'src>, usize);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            // 1) Injected ';' first
            if let Some(tok) = self.pending.take() {
                return Some(tok);
            }

            // 2) Hard EOF
            if self.eof_done {
                return None;
            }

            // 3) Next raw token
            match self.logos.next() {
                None => {
                    // Don't return yet: a pending ';' may have been queued.
                    self.handle_eof();
                    continue;
                }
                Some(Err(kind)) => return self.handle_lex_error(kind),
                Some(Ok(raw)) => {
                    if let Some(item) = self.handle_raw_token(raw) {
                        return Some(item);
                    }
                }
            }
        }
    }
}

impl<'src> Lexer<'src> {
    #[inline]
    fn handle_eof(&mut self) {
        self.eof_done = true;
        if self.last_can_insert_semi {
            self.last_can_insert_semi = false;
            self.emit_semi_at(self.src_len);
        }
    }

    #[inline]
    fn handle_lex_error(&mut self, kind: LexErrorKind) -> Option<(usize, Tok<'src>, usize)> {
        let span = self.logos.span();
        // An unterminated block comment still ends a line for semicolon purposes.
        if kind == LexErrorKind::UnterminatedComment {
            self.comments.push(Comment {
                kind: CommentKind::Block,
                span: Span::from_range(span.clone()),
            });
        }
        self.push_lex_diag(kind, span.clone());
        self.last_can_insert_semi = false;
        Some((span.start, Tok::Error, span.end))
    }

    /// `None` means the raw token was trivia and nothing is emitted.
    #[inline]
    fn handle_raw_token(&mut self, raw: RawTok) -> Option<(usize, Tok<'src>, usize)> {
        let span = self.logos.span();
        let slice = self.logos.slice();

        if raw == RawTok::Bom {
            if span.start == 0 {
                return None;
            }
            self.push_lex_diag(LexErrorKind::InvalidToken, span.clone());
            self.last_can_insert_semi = false;
            return Some((span.start, Tok::Error, span.end));
        }

        if self.handle_trivia(raw, &span, slice) {
            return None;
        }

        if raw == RawTok::Error {
            self.push_lex_diag(LexErrorKind::InvalidToken, span.clone());
            self.last_can_insert_semi = false;
            return Some((span.start, Tok::Error, span.end));
        }

        if raw == RawTok::Number {
            return Some(self.handle_number_token(span, slice));
        }

        self.last_can_insert_semi = raw.can_insert_semicolon();
        Some((span.start, raw.to_token(slice), span.end))
    }

    #[inline]
    fn handle_number_token(
        &mut self,
        span: Range<usize>,
        slice: &'src str,
    ) -> (usize, Tok<'src>, usize) {
        match num::classify_number(slice.as_bytes()) {
            Ok(kind) => {
                self.last_can_insert_semi = true;
                let tok = match kind {
                    num::NumKind::Int => Tok::IntLit(slice),
                    num::NumKind::Float => Tok::FloatLit(slice),
                    num::NumKind::Imag => Tok::ImagLit(slice),
                };
                (span.start, tok, span.end)
            }
            Err(kind) => {
                self.push_lex_diag(kind, span.clone());
                self.last_can_insert_semi = false;
                (span.start, Tok::Error, span.end)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::num::{classify_number, NumKind};

    #[test]
    fn classifies_number_shapes() {
        assert_eq!(classify_number(b"42"), Ok(NumKind::Int));
        assert_eq!(classify_number(b"0x1F"), Ok(NumKind::Int));
        assert_eq!(classify_number(b"1_000"), Ok(NumKind::Int));
        assert_eq!(classify_number(b"0xBEEF"), Ok(NumKind::Int));
        assert_eq!(classify_number(b"1.5e-3"), Ok(NumKind::Float));
        assert_eq!(classify_number(b".5"), Ok(NumKind::Float));
        assert_eq!(classify_number(b"0x1p-2"), Ok(NumKind::Float));
        assert_eq!(classify_number(b"2i"), Ok(NumKind::Imag));
        assert!(classify_number(b"1_").is_err());
        assert!(classify_number(b"0x").is_err());
        assert!(classify_number(b"1__0").is_err());
    }
}
