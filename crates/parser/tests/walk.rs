use go_syntax::ast::{AstArena, Decl, Expr, ExprId, Node, Stmt};
use go_syntax::walk::{children, inspect, inspect_file, preorder, preorder_file, walk_children, walk_file, Visitor};
use go_syntax::{parse_file, File, Mode};
use pretty_assertions::assert_eq;

const SRC: &str = r#"package p

import (
	"fmt"
	str "strings"
)

type (
	List[T any] struct {
		next *List[T]
		val  T `json:"val"`
	}
	Stringer interface {
		String() string
		~int | ~string
	}
)

const (
	a, b = iota, iota * 2
	c
)

var m = map[string][]int{"x": {1, 2}, "y": nil}

func (l *List[T]) Len() (n int) {
	for e := l; e != nil; e = e.next {
		n++
	}
	return
}

func f(xs ...int) int {
	var arr [...]int = [...]int{1, 2, 3}
	ch := make(chan<- int, 1)
	ch <- arr[0]
	s := xs[1:2:3]
	g := func(x int) bool { return x > 0 }
	switch v := interface{}(s).(type) {
	case []int:
		_ = v
	default:
	}
	select {
	case ch <- 1:
	default:
	}
loop:
	for i, x := range xs {
		if i > 0 && g(x) {
			continue loop
		} else if x < 0 {
			break
		}
		defer fmt.Println(str.ToUpper("x"), -x)
	}
	go func() {}()
	return len(xs)
}
"#;

fn parse() -> File {
    let (file, errs) = parse_file("x.go", SRC, Mode::empty());
    assert!(errs.is_empty(), "{errs}");
    file.expect("file")
}

#[test]
fn child_spans_nest_inside_parents() {
    let file = parse();
    let a = &file.arena;
    let mut checked = 0;
    for node in preorder_file(&file) {
        let (pos, end) = (a.pos(node), a.end(node));
        assert!(pos.is_valid() && pos <= end, "{node:?}: bad span");
        for child in children(a, node) {
            let (cpos, cend) = (a.pos(child), a.end(child));
            assert!(
                pos <= cpos && cend <= end,
                "{child:?} at {} .. {} escapes {node:?} at {} .. {}",
                file.position(cpos),
                file.position(cend),
                file.position(pos),
                file.position(end),
            );
            checked += 1;
        }
    }
    assert!(checked > 100, "only {checked} edges");
}

#[test]
fn siblings_come_in_source_order() {
    let file = parse();
    let a = &file.arena;
    for node in preorder_file(&file) {
        // The signature of a declaration starts at `func`, before the receiver and name.
        if matches!(node, Node::Decl(d) if matches!(a.decls[d], Decl::Func(_))) {
            continue;
        }
        let kids = children(a, node);
        for pair in kids.windows(2) {
            assert!(a.end(pair[0]) <= a.pos(pair[1]), "{:?} after {:?}", pair[1], pair[0]);
        }
    }
}

#[test]
fn preorder_matches_inspect() {
    let file = parse();
    let mut inspected = Vec::new();
    inspect_file(&file, |n| {
        inspected.push(n);
        true
    });
    let iterated: Vec<Node> = preorder_file(&file).collect();
    assert_eq!(inspected, iterated);
    assert!(!iterated.iter().any(|n| matches!(n, Node::Expr(x) if matches!(file.arena.exprs[*x], Expr::Ident(_)))));
}

#[test]
fn inspect_prunes_subtrees() {
    let (file, _) = parse_file("x.go", "package p\nvar a = b\nfunc f() { c := d }\n", Mode::empty());
    let file = file.unwrap();
    let mut names = Vec::new();
    inspect_file(&file, |n| match n {
        Node::Ident(id) => {
            names.push(file.ident_name(id).to_string());
            true
        }
        Node::Decl(d) => !matches!(file.arena.decls[d], Decl::Func(_)),
        _ => true,
    });
    assert_eq!(names, ["p", "a", "b"]);
}

#[test]
fn inspect_from_an_expression() {
    let x = go_syntax::parse_expr("f(a, g(b))").unwrap();
    let mut seen = Vec::new();
    inspect(&x.arena, Node::Expr(x.root), |n| {
        if let Node::Ident(id) = n {
            seen.push(x.arena.ident_name(id).to_string());
        }
        true
    });
    assert_eq!(seen, ["f", "a", "g", "b"]);

    let all: Vec<_> = preorder(&x.arena, Node::Expr(x.root)).collect();
    assert_eq!(all.len(), 6);
}

#[test]
fn children_of_an_assignment() {
    let (file, _) = parse_file("x.go", "package p\nfunc f() { x, y = 1, z }\n", Mode::empty());
    let file = file.unwrap();
    let a = &file.arena;
    let assign = preorder_file(&file)
        .find(|n| matches!(n, Node::Stmt(s) if matches!(a.stmts[*s], Stmt::Assign { .. })))
        .expect("assignment");
    let kids: Vec<_> = children(a, assign)
        .into_iter()
        .map(|n| match n {
            Node::Ident(id) => a.ident_name(id).to_string(),
            Node::Expr(x) => match a.exprs[x] {
                Expr::BasicLit(lit) => a.lit_value(&lit).to_string(),
                _ => "?".to_string(),
            },
            _ => "?".to_string(),
        })
        .collect();
    assert_eq!(kids, ["x", "y", "1", "z"]);
}

/// Counts calls, but not the ones inside function literals.
struct CallCounter {
    calls: usize,
}

impl<'ast> Visitor<'ast> for CallCounter {
    fn visit_expr(&mut self, a: &'ast AstArena, id: ExprId) {
        match a.exprs[id] {
            Expr::FuncLit { .. } => {}
            Expr::Call { .. } => {
                self.calls += 1;
                walk_children(self, a, Node::Expr(id));
            }
            _ => walk_children(self, a, Node::Expr(id)),
        }
    }
}

#[test]
fn visitor_overrides_control_descent() {
    let file = parse();
    let mut v = CallCounter { calls: 0 };
    walk_file(&mut v, &file);
    // make, interface{}(s), g(x), fmt.Println, str.ToUpper, func(){}(), len
    assert_eq!(v.calls, 7);
}
