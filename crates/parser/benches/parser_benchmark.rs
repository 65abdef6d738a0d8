use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use go_syntax::lexer::{Lexer, ScanMode};
use go_syntax::walk::preorder_file;
use go_syntax::{constraint, parse_file, Mode};
use std::hint::black_box as bb;

// =============================================================================
// Corpus
// =============================================================================

const SMALL_HELLO_WORLD: &str = r#"
package main

func main() {
    println("Hello, World!")
}
"#;

const MEDIUM_STRUCT_METHODS: &str = r#"
package geometry

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

func (r *Rectangle) Grow(delta float64) {
    r.Width += delta
    r.Height += delta
}
"#;

const LARGE_COMPLEX: &str = r#"
// Package compiler is a toy.
package compiler

import (
    "fmt"
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

type Stack[T any] struct {
    items []T
}

func (s *Stack[T]) Push(v T) { s.items = append(s.items, v) }

func (s *Stack[T]) Pop() (v T, ok bool) {
    if len(s.items) == 0 {
        return v, false
    }
    v, s.items = s.items[len(s.items)-1], s.items[:len(s.items)-1]
    return v, true
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
    switch {
    case isLetter(ch):
        return l.readIdent()
    case isDigit(ch):
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
    return Token{Kind: TokIdent, Text: string(l.input[start:l.pos]), Line: l.line}
}

func (l *Lexer) readNumber() Token {
    start := l.pos
    for l.pos < len(l.input) && isDigit(l.input[l.pos]) {
        l.pos++
    }
    return Token{Kind: TokNumber, Text: string(l.input[start:l.pos]), Line: l.line}
}

func Describe(toks []Token) string {
    var b strings.Builder
    for i, t := range toks {
        if i > 0 {
            b.WriteString(", ")
        }
        fmt.Fprintf(&b, "%d:%q", t.Kind, t.Text)
    }
    return b.String()
}

func isLetter(ch byte) bool {
    return (ch >= 'a' && ch <= 'z') || (ch >= 'A' && ch <= 'Z') || ch == '_'
}

func isDigit(ch byte) bool {
    return ch >= '0' && ch <= '9'
}
"#;

const CORPORA: [(&str, &str); 3] = [
    ("small", SMALL_HELLO_WORLD),
    ("medium", MEDIUM_STRUCT_METHODS),
    ("large", LARGE_COMPLEX),
];

/// `LARGE_COMPLEX` with its declarations repeated `n` times under fresh names.
fn scaled_source(n: usize) -> String {
    let body = LARGE_COMPLEX.split_once("\n)\n").map_or(LARGE_COMPLEX, |(_, rest)| rest);
    let mut src = String::from("package compiler\n\nimport (\n    \"fmt\"\n    \"strings\"\n)\n");
    for i in 0..n {
        let mut decls = body.to_string();
        for name in ["Token", "Lexer", "Stack", "Describe", "isLetter", "isDigit"] {
            decls = decls.replace(name, &format!("{name}{i}"));
        }
        src.push_str(&decls);
    }
    src
}

// =============================================================================
// Lexer
// =============================================================================

fn bench_lexer(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer");

    for (name, input) in CORPORA {
        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_with_input(BenchmarkId::new("tokens", name), &input, |b, &input| {
            b.iter(|| bb(Lexer::new(bb(input)).count()));
        });
        group.bench_with_input(BenchmarkId::new("tokens_and_comments", name), &input, |b, &input| {
            b.iter(|| bb(Lexer::with_mode(bb(input), 1, ScanMode::COMMENTS).count()));
        });
    }

    group.finish();
}

// =============================================================================
// Parser
// =============================================================================

fn bench_parser(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser");

    for (name, input) in CORPORA {
        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_with_input(BenchmarkId::new("parse_file", name), &input, |b, &input| {
            b.iter(|| bb(parse_file("bench.go", bb(input), Mode::PARSE_COMMENTS)));
        });
        group.bench_with_input(BenchmarkId::new("parse_file_no_resolve", name), &input, |b, &input| {
            b.iter(|| bb(parse_file("bench.go", bb(input), Mode::SKIP_OBJECT_RESOLUTION)));
        });
    }

    group.finish();
}

fn bench_walk(c: &mut Criterion) {
    let (file, _) = parse_file("bench.go", LARGE_COMPLEX, Mode::PARSE_COMMENTS);
    let Some(file) = file else {
        return;
    };
    c.bench_function("preorder_large", |b| b.iter(|| bb(preorder_file(&file).count())));
}

fn bench_scalability(c: &mut Criterion) {
    let mut group = c.benchmark_group("scalability");

    for &n in &[1usize, 10, 50, 200] {
        let src = scaled_source(n);
        group.throughput(Throughput::Bytes(src.len() as u64));
        group.bench_with_input(BenchmarkId::new("parse_file", n), &src, |b, src| {
            b.iter(|| bb(parse_file("bench.go", bb(src), Mode::empty())));
        });
    }

    group.finish();
}

fn bench_constraints(c: &mut Criterion) {
    let lines = [
        "//go:build linux && amd64",
        "//go:build (darwin || freebsd) && !cgo && go1.21",
        "// +build linux,386 darwin,!cgo",
    ];
    c.bench_function("constraint_parse", |b| {
        b.iter(|| {
            for line in lines {
                let _ = bb(constraint::parse(bb(line)));
            }
        })
    });
}

criterion_group!(benches, bench_lexer, bench_parser, bench_walk, bench_scalability, bench_constraints);
criterion_main!(benches);
