use goimpl_parser::ast::CommentKind;
use goimpl_parser::lexer::{Lexer, Tok};
use pretty_assertions::assert_eq;

fn injected_semis(input: &str) -> Vec<usize> {
    Lexer::new(input)
        .filter_map(|(s, t, e)| (matches!(t, Tok::Semi) && s == e).then_some(s))
        .collect()
}

fn tok_name(t: &Tok<'_>) -> String {
    match t {
        Tok::Ident(_) => "IDENT".into(),
        Tok::IntLit(_) => "INT".into(),
        Tok::FloatLit(_) => "FLOAT".into(),
        Tok::ImagLit(_) => "IMAG".into(),
        Tok::RuneLit(_) => "CHAR".into(),
        Tok::StringLit(_) | Tok::RawStringLit(_) => "STRING".into(),
        Tok::Error => "ERROR".into(),
        other => other.to_string(),
    }
}

fn lex_names(input: &str) -> String {
    Lexer::new(input)
        .map(|(_, t, _)| tok_name(&t))
        .collect::<Vec<_>>()
        .join(" ")
}

#[rustfmt::skip]
const SEMICOLON_TESTS: &[(&str, &str)] = &[
    ("", ""),
    ("\u{FEFF};", ";"),
    (";", ";"),

    ("foo\n", "IDENT ;"),
    ("123\n", "INT ;"),
    ("1.2\n", "FLOAT ;"),
    ("'x'\n", "CHAR ;"),
    ("\"x\"\n", "STRING ;"),
    ("`x`\n", "STRING ;"),

    ("*\n", "*"),
    ("|\n", "|"),
    ("~\n", "~"),
    ("<-\n", "<-"),
    ("=\n", "="),
    ("...\n", "..."),
    ("++\n", "++ ;"),
    ("--\n", "-- ;"),
    ("&&\n", "&&"),
    (":=\n", ":="),

    ("(\n", "("),
    ("[\n", "["),
    ("{\n", "{"),
    (",\n", ","),
    (".\n", "."),
    (")\n", ") ;"),
    ("]\n", "] ;"),
    ("}\n", "} ;"),

    ("break\n", "break ;"),
    ("continue\n", "continue ;"),
    ("fallthrough\n", "fallthrough ;"),
    ("return\n", "return ;"),
    ("chan\n", "chan"),
    ("func\n", "func"),
    ("interface\n", "interface"),
    ("map\n", "map"),
    ("struct\n", "struct"),
    ("type\n", "type"),

    ("foo//comment\n", "IDENT ;"),
    ("foo//comment", "IDENT ;"),
    ("foo/*comment*/\n", "IDENT ;"),
    ("foo/*\n*/", "IDENT ;"),
    ("foo    /*\n*/    ", "IDENT ;"),

    ("package main\n\nfunc main() {\n\tif {\n\t\treturn /* */ }\n}\n",
     "package IDENT ; func IDENT ( ) { if { return } ; } ;"),
    ("package main", "package IDENT ;"),
];

#[test]
fn semicolon_table() {
    for &(input, want) in SEMICOLON_TESTS {
        assert_eq!(lex_names(input), want, "input=<<{input}>>");

        // Trailing newlines never change the token stream.
        let mut trimmed = input;
        while let Some(t) = trimmed.strip_suffix('\n') {
            trimmed = t;
            assert_eq!(lex_names(trimmed), want, "input=<<{trimmed}>>");
        }
    }
}

#[test]
fn comment_newline_equivalence() {
    assert_eq!(
        injected_semis("x/*\n*/y").len(),
        injected_semis("x\ny").len()
    );
}

#[test]
fn semicolon_insertion_windows_newline_crlf() {
    assert_eq!(injected_semis("x\r\ny"), vec![1, 4]);
}

#[test]
fn block_comment_newline_does_not_insert_after_keyword() {
    assert_eq!(injected_semis("if/*\n*/x"), vec![8]);
}

#[test]
fn line_comment_before_crlf() {
    let src = "x//c\r\ny";
    let cr_pos = src.find('\r').unwrap();
    assert_eq!(injected_semis(src), vec![cr_pos, src.len()]);
}

#[test]
fn method_line_gets_semicolon_after_results() {
    let src = "Read(p []byte) (n int, err error)\nClose() error\n";
    let names = lex_names(src);
    assert_eq!(
        names,
        "IDENT ( IDENT [ ] IDENT ) ( IDENT IDENT , IDENT IDENT ) ; IDENT ( ) IDENT ;"
    );
}

#[test]
fn comments_are_captured_with_kind() {
    let src = "// doc\n/* block */ x\n";
    let mut lx = Lexer::new(src);
    for _ in lx.by_ref() {}
    let comments = lx.take_comments();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0].kind, CommentKind::Line);
    assert_eq!(comments[0].span.text(src), "// doc");
    assert_eq!(comments[1].kind, CommentKind::Block);
    assert_eq!(comments[1].span.text(src), "/* block */");
}

#[test]
fn unterminated_block_comment_is_diagnosed() {
    let mut lx = Lexer::new("x /* never closed");
    for _ in lx.by_ref() {}
    assert_eq!(lx.take_diags().len(), 1);
}
