use go_syntax::ast::{AstArena, Decl, Expr, ExprId, FuncDecl, GenDecl, Spec, Stmt, StmtId};
use go_syntax::{parse_expr, parse_file, File, Mode, Token};
use pretty_assertions::assert_eq;

fn parse(src: &str) -> File {
    let (file, errs) = parse_file("x.go", src, Mode::PARSE_COMMENTS);
    assert!(errs.is_empty(), "unexpected errors: {errs}");
    file.expect("file")
}

fn first_error(src: &str) -> String {
    let (_, errs) = parse_file("x.go", src, Mode::empty());
    match errs.iter().next() {
        Some(e) => e.to_string(),
        None => panic!("expected an error for {src:?}"),
    }
}

fn gen_decl(file: &File, i: usize) -> GenDecl {
    match file.arena.decls[file.decls[i]] {
        Decl::Gen(g) => g,
        ref other => panic!("decl {i}: expected GenDecl, got {other:?}"),
    }
}

fn func_decl(file: &File, i: usize) -> FuncDecl {
    match file.arena.decls[file.decls[i]] {
        Decl::Func(f) => f,
        ref other => panic!("decl {i}: expected FuncDecl, got {other:?}"),
    }
}

fn body_stmts(file: &File, i: usize) -> Vec<StmtId> {
    let body = func_decl(file, i).body.expect("body");
    let block = file.arena.block(body).expect("block");
    file.arena.list(block.list).to_vec()
}

/// Fully parenthesized rendering of an expression tree.
fn render(a: &AstArena, x: ExprId) -> String {
    let list = |xs: &[ExprId]| xs.iter().map(|&e| render(a, e)).collect::<Vec<_>>().join(", ");
    match a.exprs[x] {
        Expr::Ident(i) => a.ident_name(i).to_string(),
        Expr::BasicLit(lit) => a.lit_value(&lit).to_string(),
        Expr::Binary { x, op, y, .. } => format!("({} {op} {})", render(a, x), render(a, y)),
        Expr::Unary { op, x, .. } => format!("({op}{})", render(a, x)),
        Expr::Star { x, .. } => format!("(*{})", render(a, x)),
        Expr::Paren { x, .. } => format!("[{}]", render(a, x)),
        Expr::Selector { x, sel } => format!("{}.{}", render(a, x), a.ident_name(sel)),
        Expr::Call { fun, args, .. } => format!("{}({})", render(a, fun), list(a.list(args))),
        Expr::Index { x, index, .. } => format!("{}[{}]", render(a, x), render(a, index)),
        Expr::IndexList { x, indices, .. } => format!("{}[{}]", render(a, x), list(a.list(indices))),
        ref other => format!("{other:?}"),
    }
}

#[test]
fn binary_precedence_and_associativity() {
    let cases = [
        ("a || b && c == d + e * f", "(a || (b && (c == (d + (e * f)))))"),
        ("a + b * c", "(a + (b * c))"),
        ("a - b - c", "((a - b) - c)"),
        ("x << 1 | y", "((x << 1) | y)"),
        ("-x * y", "((-x) * y)"),
        ("*p.f + 1", "((*p.f) + 1)"),
        ("<-ch == v", "((<-ch) == v)"),
        ("(a + b) * c", "([(a + b)] * c)"),
        ("f(a, b...)[i] &^ m[k1, k2]", "(f(a, b)[i] &^ m[k1, k2])"),
    ];
    for (src, want) in cases {
        let x = parse_expr(src).unwrap_or_else(|e| panic!("{src}: {e}"));
        assert_eq!(render(&x.arena, x.root), want, "{src}");
    }
}

#[test]
fn grouped_const_declaration() {
    let file = parse("package p\nconst (\n\ta = iota\n\tb\n)\n");
    assert_eq!(file.decls.len(), 1);

    let g = gen_decl(&file, 0);
    assert_eq!(g.tok, Token::Const);
    assert_eq!(file.position(g.lparen).to_string(), "x.go:2:7");
    assert_eq!(file.position(g.rparen).to_string(), "x.go:5:1");

    let specs = file.arena.list(g.specs);
    assert_eq!(specs.len(), 2);
    match file.arena.specs[specs[1]] {
        Spec::Value(v) => {
            assert_eq!(file.arena.list(v.names).len(), 1);
            assert!(v.typ.is_none());
            assert!(v.values.is_empty());
        }
        ref other => panic!("expected ValueSpec, got {other:?}"),
    }
}

#[test]
fn one_line_group() {
    let file = parse("package p\nconst ( A = 1; B = 2 )\n");
    let g = gen_decl(&file, 0);
    assert_eq!(file.arena.list(g.specs).len(), 2);
    assert_eq!(file.position(g.rparen).to_string(), "x.go:2:22");
}

#[test]
fn empty_groups_are_accepted() {
    let file = parse("package p\nvar ()\nconst ()\n");
    assert_eq!(file.decls.len(), 2);
    for i in 0..2 {
        let g = gen_decl(&file, i);
        assert!(g.specs.is_empty());
        assert!(g.lparen.is_valid() && g.rparen.is_valid());
    }
    let g = gen_decl(&file, 0);
    assert_eq!(file.position(g.rparen).to_string(), "x.go:2:6");
    assert_eq!(file.node_end(go_syntax::ast::Node::Decl(file.decls[0])), g.rparen + 1);
}

#[test]
fn ungrouped_declaration_has_no_parens() {
    let file = parse("package p\nvar x, y int = 1, 2\n");
    let g = gen_decl(&file, 0);
    assert!(!g.lparen.is_valid());
    assert!(!g.rparen.is_valid());
    assert_eq!(file.arena.list(g.specs).len(), 1);
}

#[test]
fn doc_and_line_comments() {
    let src = "package p

// F does things.
func F() {}

// Detached.

func G() {}

var x int // trailing
";
    let file = parse(src);
    let a = &file.arena;

    let f = func_decl(&file, 0);
    assert_eq!(a.comment_text(f.doc.expect("doc on F")), "F does things.\n");
    assert!(func_decl(&file, 1).doc.is_none());

    let g = gen_decl(&file, 2);
    match a.specs[a.list(g.specs)[0]] {
        Spec::Value(v) => assert_eq!(a.comment_text(v.comment.expect("line comment")), "trailing\n"),
        ref other => panic!("expected ValueSpec, got {other:?}"),
    }
    assert_eq!(file.comments.len(), 3);
}

#[test]
fn comments_are_dropped_without_parse_comments() {
    let (file, errs) = parse_file("x.go", "package p\n// F.\nfunc F() {}\n", Mode::empty());
    assert!(errs.is_empty());
    let file = file.unwrap();
    assert!(file.comments.is_empty());
    assert!(func_decl(&file, 0).doc.is_none());
}

#[test]
fn type_parameter_or_array_length() {
    let src = "package p
type A [N]int
type L[T any] []T
type P[T *C] int
type Q[T *C,] int
type U[T int | string] struct{}
";
    let file = parse(src);
    let type_params = |i: usize| match file.arena.specs[file.arena.list(gen_decl(&file, i).specs)[0]] {
        Spec::Type(t) => t.type_params.map(|tp| file.arena.num_fields(tp)),
        ref other => panic!("expected TypeSpec, got {other:?}"),
    };
    assert_eq!(type_params(0), None);
    assert_eq!(type_params(1), Some(1));
    assert_eq!(type_params(2), None);
    assert_eq!(type_params(3), Some(1));
    assert_eq!(type_params(4), Some(1));
}

#[test]
fn generic_functions_and_instantiation() {
    let src = "package p
func Map[T, U any](xs []T, f func(T) U) []U { return nil }
var _ = Map[int, string]
var _ = m[k]
";
    let file = parse(src);
    let f = func_decl(&file, 0);
    match file.arena.exprs[f.typ] {
        Expr::FuncType { type_params, params, results, .. } => {
            assert_eq!(type_params.map(|tp| file.arena.num_fields(tp)), Some(2));
            assert_eq!(file.arena.num_fields(params), 2);
            assert_eq!(results.map(|r| file.arena.num_fields(r)), Some(1));
        }
        ref other => panic!("expected FuncType, got {other:?}"),
    }

    let value = |i: usize| match file.arena.specs[file.arena.list(gen_decl(&file, i).specs)[0]] {
        Spec::Value(v) => file.arena.list(v.values)[0],
        ref other => panic!("expected ValueSpec, got {other:?}"),
    };
    assert!(matches!(file.arena.exprs[value(1)], Expr::IndexList { .. }));
    assert!(matches!(file.arena.exprs[value(2)], Expr::Index { .. }));
}

#[test]
fn composite_literals_in_control_clauses() {
    let src = "package p
func f() {
	if x == (T{}) {}
	for _, v := range []int{1, 2} { _ = v }
	switch (S{a: 1}).a {}
}
";
    let file = parse(src);
    let stmts = body_stmts(&file, 0);
    assert_eq!(stmts.len(), 3);
    assert!(matches!(file.arena.stmts[stmts[0]], Stmt::If { .. }));
    assert!(matches!(file.arena.stmts[stmts[1]], Stmt::Range { .. }));
    assert!(matches!(file.arena.stmts[stmts[2]], Stmt::Switch { .. }));

    assert_eq!(
        first_error("package p\nfunc f() {\n\tif x == T{} {}\n}\n"),
        "x.go:3:14: expected ';', found '{'"
    );
}

#[test]
fn range_clause_forms() {
    let src = "package p
func f(ch chan int, m map[string]int) {
	for range ch {}
	for k := range m {}
	for k, v = range m {}
	for i := 0; i < 3; i++ {}
}
";
    let file = parse(src);
    let a = &file.arena;
    let stmts = body_stmts(&file, 0);

    let range = |s: StmtId| match a.stmts[s] {
        Stmt::Range { key, value, tok, .. } => (key.is_some(), value.is_some(), tok),
        ref other => panic!("expected RangeStmt, got {other:?}"),
    };
    assert_eq!(range(stmts[0]), (false, false, Token::Illegal));
    assert_eq!(range(stmts[1]), (true, false, Token::Define));
    assert_eq!(range(stmts[2]), (true, true, Token::Assign));
    match a.stmts[stmts[3]] {
        Stmt::For { init, cond, post, .. } => {
            assert!(init.is_some() && cond.is_some() && post.is_some());
        }
        ref other => panic!("expected ForStmt, got {other:?}"),
    }
}

#[test]
fn error_messages() {
    let cases = [
        ("package p\nfunc f() { go f }\n", "x.go:2:16: expression in go must be function call"),
        ("package p\nfunc f() { if {} }\n", "x.go:2:15: missing condition in if statement"),
        ("package p\nimport 42\n", "x.go:2:8: import path must be a string"),
        ("package p\nfunc f() { x := }\n", "x.go:2:17: expected operand, found '}'"),
        ("package p\nfunc f() { x := range y }\n", "x.go:2:17: expected operand, found 'range'"),
        ("package p\nfunc f() { if x := range y {} }\n", "x.go:2:20: expected operand, found 'range'"),
        ("package p\nfunc f() { a[1:2:] }\n", "x.go:2:17: final index required in 3-index slice"),
        ("package p\nfunc (r T) m[P any]() {}\n", "x.go:2:13: method must have no type parameters"),
        ("package p\nvar x int\nimport \"fmt\"\n", "x.go:3:1: imports must appear before other declarations"),
        ("package p\nfunc f() { f(a, b\n) }\n", "x.go:2:18: missing ',' before newline in argument list"),
        ("package p\nfunc main()\n{\n}\n", "x.go:3:1: unexpected semicolon or newline before {"),
    ];
    for (src, want) in cases {
        assert_eq!(first_error(src), want, "{src:?}");
    }
}

#[test]
fn blank_package_name() {
    let src = "package _\n";
    let (_, errs) = parse_file("x.go", src, Mode::empty());
    assert!(errs.is_empty());
    let (file, errs) = parse_file("x.go", src, Mode::BLANK_PACKAGE_NAME_INVALID);
    assert!(file.is_none());
    assert_eq!(errs.len(), 1);
    assert!(errs.to_string().ends_with("invalid package name _"), "{errs}");
}

#[test]
fn partial_modes_stop_early() {
    let src = "package p\nimport \"fmt\"\nfunc f() {}\n";
    let (file, _) = parse_file("x.go", src, Mode::PACKAGE_CLAUSE_ONLY);
    assert!(file.unwrap().decls.is_empty());
    let (file, _) = parse_file("x.go", src, Mode::IMPORTS_ONLY);
    let file = file.unwrap();
    assert_eq!(file.decls.len(), 1);
    assert_eq!(file.imports.len(), 1);
}
