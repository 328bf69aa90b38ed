use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use goimpl::{generate_with, Config, GoEnv, StaticResolver, StubBody};
use goimpl_parser::{parse_file, Lexer};
use std::hint::black_box as bb;

// =============================================================================
// Corpus
// =============================================================================

const SMALL_INTERFACE: &str = r#"
package store

type Getter interface {
    Get(key string) ([]byte, error)
}
"#;

const MEDIUM_MIXED: &str = r#"
package geometry

import "fmt"

// Shape is anything with an area.
type Shape interface {
    fmt.Stringer
    Area() float64
    Perimeter() float64
}

type Point struct {
    X, Y float64
}

func (p Point) Abs() float64 {
    return sqrt(p.X*p.X + p.Y*p.Y)
}

func (p *Point) Scale(f float64) {
    p.X = p.X * f
    p.Y = p.Y * f
}

type Rectangle struct {
    Width, Height float64
}

func (r Rectangle) Area() float64 {
    return r.Width * r.Height
}
"#;

const LARGE_BODIES: &str = r#"
package compiler

import (
    "fmt"
    "io"
    "strings"
)

type TokenKind int

const (
    TokEOF TokenKind = iota
    TokIdent
    TokNumber
    TokString
)

type Token struct {
    Kind TokenKind
    Text string
    Line int
}

type Source interface {
    io.RuneScanner
    Pos() (line, col int)
    Name() string
}

type Lexer struct {
    input  []byte
    pos    int
    line   int
    tokens []Token
}

func NewLexer(source string) *Lexer {
    return &Lexer{
        input: []byte(source),
        pos:   0,
        line:  1,
    }
}

func (l *Lexer) NextToken() Token {
    if l.pos >= len(l.input) {
        return Token{Kind: TokEOF, Line: l.line}
    }

    ch := l.input[l.pos]
    if isLetter(ch) {
        return l.readIdent()
    }
    if isDigit(ch) {
        return l.readNumber()
    }

    l.pos++
    return Token{Kind: TokIdent, Text: string(ch), Line: l.line}
}

func (l *Lexer) readIdent() Token {
    start := l.pos
    for l.pos < len(l.input) && isLetter(l.input[l.pos]) {
        l.pos++
    }
    return Token{
        Kind: TokIdent,
        Text: strings.ToLower(string(l.input[start:l.pos])),
        Line: l.line,
    }
}

func (l *Lexer) readNumber() Token {
    start := l.pos
    for l.pos < len(l.input) && isDigit(l.input[l.pos]) {
        l.pos++
    }
    return Token{
        Kind: TokNumber,
        Text: fmt.Sprint(string(l.input[start:l.pos])),
        Line: l.line,
    }
}

func isLetter(ch byte) bool {
    return (ch >= 'a' && ch <= 'z') || (ch >= 'A' && ch <= 'Z') || ch == '_'
}

func isDigit(ch byte) bool {
    return ch >= '0' && ch <= '9'
}
"#;

const CORPORA: [(&str, &str); 3] = [
    ("small", SMALL_INTERFACE),
    ("medium", MEDIUM_MIXED),
    ("large", LARGE_BODIES),
];

/// `n` interfaces, each embedding the previous one, so flattening the last
/// walks the whole chain.
fn embedding_chain(n: usize) -> String {
    let mut src = String::from("package chain\n\nimport \"io\"\n\ntype I0 interface {\n\tio.ReadWriteCloser\n}\n");
    for i in 1..n {
        src.push_str(&format!(
            "\n// I{i} adds M{i}.\ntype I{i} interface {{\n\tI{prev}\n\tM{i}(ctx [{i}]byte, v ...any) (n int, err error)\n}}\n",
            prev = i - 1
        ));
    }
    src
}

// =============================================================================
// Benchmark 1: Lexer
// =============================================================================

fn bench_lexer(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer");

    for (name, input) in CORPORA {
        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_with_input(BenchmarkId::new("iterate", name), &input, |b, &input| {
            b.iter(|| {
                let mut acc: u64 = 0;
                for (l, _, r) in Lexer::new(bb(input)) {
                    acc = acc.wrapping_add(l as u64).wrapping_add(r as u64);
                }
                bb(acc)
            });
        });

        group.bench_with_input(BenchmarkId::new("with_comments", name), &input, |b, &input| {
            b.iter(|| {
                let mut lex = Lexer::new(bb(input));
                let n = lex.by_ref().count();
                bb((n, lex.take_comments()))
            });
        });
    }

    group.finish();
}

// =============================================================================
// Benchmark 2: Parser (type declarations kept, bodies skipped)
// =============================================================================

fn bench_parse_file(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_file");

    for (name, input) in CORPORA {
        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), &input, |b, &input| {
            b.iter(|| bb(parse_file(bb(input)).map(|f| f.type_specs().len())));
        });
    }

    for &n in &[10usize, 100, 500] {
        let src = embedding_chain(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("interfaces", n), &src, |b, src| {
            b.iter(|| bb(parse_file(bb(src)).map(|f| f.type_specs().len())));
        });
    }

    group.finish();
}

// =============================================================================
// Benchmark 3: End to end (locate, flatten, render)
// =============================================================================

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");

    group.bench_function("prelude_read_write_closer", |b| {
        let resolver = StaticResolver::new();
        let config = Config {
            src_dir: None,
            body: StubBody::ZeroReturn,
            env: GoEnv::host(),
        };
        b.iter(|| bb(generate_with(&resolver, "f *File", "io.ReadWriteCloser", &config)));
    });

    for &n in &[10usize, 100] {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("chain.go"), embedding_chain(n)).expect("write corpus");
        let resolver = StaticResolver::new().with("example.com/chain", dir.path());
        let config = Config {
            src_dir: None,
            body: StubBody::ZeroReturn,
            env: GoEnv::host(),
        };
        let iface = format!("example.com/chain.I{}", n - 1);

        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("embedding_chain", n), &iface, |b, iface| {
            b.iter_batched(
                || (),
                |()| bb(generate_with(&resolver, "c *Chain", iface, &config)),
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_lexer, bench_parse_file, bench_generate);
criterion_main!(benches);
