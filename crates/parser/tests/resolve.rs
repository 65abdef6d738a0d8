use go_syntax::ast::IdentId;
use go_syntax::scope::{DeclRef, ObjKind};
use go_syntax::{parse_file, resolve_file, File, Mode};
use pretty_assertions::assert_eq;

fn parse(src: &str) -> (File, Vec<String>) {
    let (file, errs) = parse_file("x.go", src, Mode::DECLARATION_ERRORS);
    let msgs = errs.iter().map(|e| e.to_string()).collect();
    (file.expect("file parses"), msgs)
}

fn idents(file: &File, name: &str) -> Vec<IdentId> {
    file.arena.idents.ids().filter(|&i| file.ident_name(i) == name).collect()
}

fn unresolved(file: &File) -> Vec<&str> {
    file.unresolved.iter().map(|&i| file.ident_name(i)).collect()
}

#[test]
fn shadowing_never_crosses_blocks() {
    let (file, errs) = parse("package p\nfunc f(x int) { x := 1; { x := 2; _ = x }; _ = x }\n");
    assert!(errs.is_empty(), "{errs:?}");
    let obj = |i: IdentId| file.arena.idents[i].obj();
    let xs = idents(&file, "x");
    assert_eq!(obj(xs[3]), obj(xs[2]));
    assert_eq!(obj(xs[4]), obj(xs[1]));
    assert_ne!(obj(xs[2]), obj(xs[1]));
}

#[test]
fn declaration_errors() {
    let (_, errs) = parse("package p\nfunc f() {\n\tx := 1\n\tx := 2\n\t_ = x\n}\n");
    assert_eq!(errs, ["x.go:4:2: no new variables on left side of :="]);

    let (_, errs) = parse("package p\nfunc f() {\n\tvar x int\n\tvar x int\n}\n");
    assert_eq!(errs, ["x.go:4:6: x redeclared in this block\n\tprevious declaration at x.go:3:6"]);
}

#[test]
fn unresolved_reported_once() {
    let (file, errs) = parse("package p\nfunc f() { use(undef); use(undef); _ = undef }\n");
    assert!(errs.is_empty());
    assert_eq!(unresolved(&file), ["use", "undef"]);
    for i in idents(&file, "undef") {
        assert!(file.arena.idents[i].obj().is_none());
    }
}

#[test]
fn object_kinds() {
    let src = "package p
import \"fmt\"
const C = 1
type T int
var V T
func F() {
L:
	for {
		break L
	}
}
func (T) M() {}
func init() {}
";
    let (file, errs) = parse(src);
    assert!(errs.is_empty(), "{errs:?}");
    let kind = |name: &str| {
        let id = idents(&file, name)[0];
        let o = file.arena.idents[id].obj().expect(name);
        file.scopes.objects[o].kind
    };
    assert_eq!(kind("C"), ObjKind::Con);
    assert_eq!(kind("T"), ObjKind::Typ);
    assert_eq!(kind("V"), ObjKind::Var);
    assert_eq!(kind("F"), ObjKind::Fun);
    assert_eq!(kind("L"), ObjKind::Lbl);
    assert_eq!(ObjKind::Lbl.to_string(), "label");

    // Methods and init functions are never declared.
    let scope = &file.scopes.scopes[file.scope.unwrap()];
    let names: Vec<_> = scope.objects().into_iter().map(|(s, _)| file.arena.symbols.resolve(s)).collect();
    assert_eq!(names, ["C", "T", "V", "F"]);
    assert!(scope.outer.is_none());
    for name in ["M", "init"] {
        assert!(file.arena.idents[idents(&file, name)[0]].obj().is_none(), "{name}");
    }
    let f = file.arena.idents[idents(&file, "F")[0]].obj().unwrap();
    assert!(matches!(file.scopes.objects[f].decl, DeclRef::Func(_)));
    // The import name is left for the package-level pass.
    assert_eq!(unresolved(&file), ["int"]);
}

#[test]
fn object_positions() {
    let (file, _) = parse("package p\nfunc f(a, b int) (r int) {\n\tc, d := a, b\n\t_, _ = c, d\n\treturn\n}\n");
    let pos_of = |name: &str| {
        let id = idents(&file, name)[0];
        let o = file.arena.idents[id].obj().expect(name);
        file.position(file.scopes.objects[o].pos(&file.arena)).to_string()
    };
    assert_eq!(pos_of("b"), "x.go:2:11");
    assert_eq!(pos_of("r"), "x.go:2:19");
    assert_eq!(pos_of("d"), "x.go:3:5");
}

/// Resolving within a file and reconciling the leftovers against the
/// package are separate steps; this does the second one by hand.
#[test]
fn package_level_reconciliation() {
    let (a, _) = parse("package p\nfunc f() { g(); h() }\n");
    let (b, _) = parse("package p\nfunc g() {}\n");
    let b_scope = &b.scopes.scopes[b.scope.unwrap()];

    let still_missing: Vec<_> = a
        .unresolved
        .iter()
        .map(|&i| a.ident_name(i))
        .filter(|name| b.arena.symbols.get(name).and_then(|s| b_scope.lookup(s)).is_none())
        .collect();
    assert_eq!(still_missing, ["h"]);
}

#[test]
fn re_resolving_replaces_previous_results() {
    let (mut file, _) = parse("package p\nvar a = b\n");
    let first = file.scope;
    let mut msgs = Vec::new();
    resolve_file(&mut file, |pos, msg| msgs.push(format!("{pos}: {msg}")));
    assert!(msgs.is_empty());
    assert_eq!(unresolved(&file), ["b"]);
    assert!(file.scope.is_some());
    assert_eq!(file.scopes.scopes.len(), 1);
    assert!(first.is_some());
}

#[test]
fn skipped_resolution_leaves_identifiers_unbound() {
    let (file, _) = parse_file("x.go", "package p\nvar a int\nvar b = a\n", Mode::SKIP_OBJECT_RESOLUTION);
    let file = file.unwrap();
    assert!(file.arena.idents.ids().all(|i| file.arena.idents[i].obj().is_none()));
}
