//! Object resolution.
//!
//! A second pass over a parsed file: it opens a scope for every block that
//! introduces bindings, declares names as they come into scope and binds
//! each referring [`Ident`] to the [`Object`](crate::scope::Object) that
//! declares it. Names with no declaration in the file are collected once each
//! in `File::unresolved`; they may be declared in another file of the package
//! or be imports and predeclared identifiers.

use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::ast::*;
use crate::error::{Bailout, PResult};
use crate::parser::MAX_NEST_LEV;
use crate::position::{Pos, PosFile, Position};
use crate::scope::{DeclRef, ObjData, ObjKind, ScopeArena, ScopeId};
use crate::stack::ensure_sufficient_stack;
use crate::token::Token;
use crate::walk::{walk_children, Visitor};
use crate::File;

/// Deepest scope nesting accepted before resolution is abandoned.
pub const MAX_SCOPE_DEPTH: usize = MAX_NEST_LEV;

/// Sink for declaration errors.
pub(crate) type DeclErr<'h> = &'h mut dyn FnMut(Pos, String);

/// Resolves `file` in place, replacing any earlier resolution.
///
/// Sets the bindings of its identifiers, `file.scope` and `file.unresolved`.
/// Declaration errors are passed to `handler`; they never stop the walk.
/// If scopes nest too deeply the bailout is reported to `handler` as well
/// and the file is left unresolved.
pub fn resolve_file(file: &mut File, mut handler: impl FnMut(Position, String)) {
    clear_bindings(&file.arena);
    file.scopes = ScopeArena::new();
    file.scope = None;
    file.unresolved.clear();

    let pos_file = &file.pos_file;
    let mut report = |pos: Pos, msg: String| handler(pos_file.position(pos), msg);
    let sink: DeclErr<'_> = &mut report;
    let res = resolve(&file.arena, &file.decls, &mut file.scopes, pos_file, Some(sink));
    match res {
        Ok((scope, unresolved)) => {
            file.scope = Some(scope);
            file.unresolved = unresolved;
        }
        Err(b) => {
            clear_bindings(&file.arena);
            handler(file.pos_file.position(b.pos), b.msg.to_string());
        }
    }
}

fn clear_bindings(a: &AstArena) {
    for id in a.idents.ids() {
        a.idents[id].obj.set(Binding::None);
    }
}

/// Resolves the declarations of one file into `scopes`; returns the package
/// scope and the identifiers left unresolved.
pub(crate) fn resolve<'r>(
    a: &AstArena,
    decls: &[DeclId],
    scopes: &'r mut ScopeArena,
    file: &'r PosFile,
    decl_err: Option<DeclErr<'r>>,
) -> PResult<(ScopeId, Vec<IdentId>)> {
    let pkg_scope = scopes.new_scope(None);
    let mut r = Resolver {
        a,
        scopes,
        file,
        decl_err,
        blank: a.symbols.get("_"),
        pkg_scope,
        top_scope: pkg_scope,
        label_scope: None,
        target_stack: Vec::new(),
        depth: 1,
        unresolved: Vec::new(),
        bailout: None,
    };

    for &d in decls {
        r.visit_decl(a, d);
        if let Some(b) = r.bailout.take() {
            debug!(target: "go_syntax::resolver", depth = r.depth, "{}", b.msg);
            return Err(b);
        }
    }
    debug_assert_eq!(r.top_scope, pkg_scope, "unbalanced scopes");
    debug_assert!(r.label_scope.is_none(), "unbalanced label scopes");

    // Everything local is known now; the rest can only be package-level.
    let mut seen = FxHashSet::default();
    let mut unresolved = Vec::new();
    for ident in std::mem::take(&mut r.unresolved) {
        let id = &a.idents[ident];
        match r.scopes.scopes[pkg_scope].lookup(id.name) {
            Some(obj) => id.obj.set(Binding::Object(obj)),
            None => {
                id.obj.set(Binding::None);
                if seen.insert(id.name) {
                    unresolved.push(ident);
                }
            }
        }
    }
    debug!(
        target: "go_syntax::resolver",
        file = file.name(),
        declared = r.scopes.scopes[pkg_scope].len(),
        unresolved = unresolved.len(),
        "resolved file"
    );
    Ok((pkg_scope, unresolved))
}

struct Resolver<'ast, 'r> {
    a: &'ast AstArena,
    scopes: &'r mut ScopeArena,
    file: &'r PosFile,
    decl_err: Option<DeclErr<'r>>,
    blank: Option<Symbol>,

    pkg_scope: ScopeId,
    top_scope: ScopeId,
    /// Labels of the innermost function body.
    label_scope: Option<ScopeId>,
    /// Branch targets per function body, checked when the body is done.
    target_stack: Vec<Vec<IdentId>>,
    depth: usize,

    unresolved: Vec<IdentId>,
    bailout: Option<Bailout>,
}

impl<'ast> Visitor<'ast> for Resolver<'ast, '_> {
    fn visit_ident(&mut self, _: &'ast AstArena, id: IdentId) {
        if self.bailout.is_none() {
            self.resolve(id, true);
        }
    }

    fn visit_expr(&mut self, _: &'ast AstArena, id: ExprId) {
        if self.bailout.is_none() {
            ensure_sufficient_stack(|| self.expr(id));
        }
    }

    fn visit_stmt(&mut self, _: &'ast AstArena, id: StmtId) {
        if self.bailout.is_none() {
            ensure_sufficient_stack(|| self.stmt(id));
        }
    }

    fn visit_decl(&mut self, _: &'ast AstArena, id: DeclId) {
        if self.bailout.is_none() {
            self.decl(id);
        }
    }
}

impl<'ast> Resolver<'ast, '_> {
    // ---------------------------------------------------------------------
    // Scopes

    fn open_scope(&mut self, pos: Pos) -> bool {
        if self.depth >= MAX_SCOPE_DEPTH {
            self.bailout.get_or_insert(Bailout {
                pos,
                msg: "exceeded max scope depth during object resolution",
            });
            return false;
        }
        self.depth += 1;
        self.top_scope = self.scopes.new_scope(Some(self.top_scope));
        true
    }

    fn close_scope(&mut self) {
        self.depth -= 1;
        if let Some(outer) = self.scopes.scopes[self.top_scope].outer {
            self.top_scope = outer;
        }
    }

    /// Runs `f` inside a new scope; `f` is skipped if the scope cannot be opened.
    fn scoped(&mut self, pos: Pos, f: impl FnOnce(&mut Self)) {
        if self.open_scope(pos) {
            f(self);
            self.close_scope();
        }
    }

    fn open_label_scope(&mut self) {
        self.label_scope = Some(self.scopes.new_scope(self.label_scope));
        self.target_stack.push(Vec::new());
    }

    fn close_label_scope(&mut self) {
        let a = self.a;
        let (Some(scope), Some(targets)) = (self.label_scope, self.target_stack.pop()) else {
            return;
        };
        for ident in targets {
            let id = &a.idents[ident];
            match self.scopes.scopes[scope].lookup(id.name) {
                Some(obj) => id.obj.set(Binding::Object(obj)),
                None => self.error(id.name_pos, format!("label {} undefined", a.ident_name(ident))),
            }
        }
        self.label_scope = self.scopes.scopes[scope].outer;
    }

    fn error(&mut self, pos: Pos, msg: String) {
        if let Some(h) = self.decl_err.as_mut() {
            h(pos, msg);
        }
    }

    // ---------------------------------------------------------------------
    // Declaring and resolving

    fn declare(&mut self, decl: DeclRef, data: ObjData, scope: ScopeId, kind: ObjKind, idents: &[IdentId]) {
        let a = self.a;
        for &ident in idents {
            let id = &a.idents[ident];
            debug_assert_eq!(id.obj.get(), Binding::None, "identifier already declared or resolved");
            let obj = self.scopes.new_object(kind, id.name, decl, data);
            // Receiver type parameters only shadow; they are never referenced.
            if !matches!(decl, DeclRef::Ident(_)) {
                id.obj.set(Binding::Object(obj));
            }
            if Some(id.name) == self.blank {
                continue;
            }
            trace!(target: "go_syntax::resolver", "declaring {} ({kind})", a.ident_name(ident));
            if let Some(alt) = self.scopes.scopes[scope].insert(id.name, obj) {
                let mut msg = format!("{} redeclared in this block", a.ident_name(ident));
                let prev = self.scopes.objects[alt].pos(a);
                if prev.is_valid() {
                    msg.push_str(&format!("\n\tprevious declaration at {}", self.file.position(prev)));
                }
                self.error(id.name_pos, msg);
            }
        }
    }

    /// `:=` declares the identifiers on the left that are new to the
    /// current scope; the others are assignments to the existing objects.
    fn short_var_decl(&mut self, stmt: StmtId, lhs: &[ExprId]) {
        let a = self.a;
        let mut fresh = 0;
        for &x in lhs {
            let Expr::Ident(ident) = a.exprs[x] else {
                continue;
            };
            let id = &a.idents[ident];
            debug_assert_eq!(id.obj.get(), Binding::None, "identifier already declared or resolved");
            let obj = self
                .scopes
                .new_object(ObjKind::Var, id.name, DeclRef::Assign(stmt), ObjData::None);
            id.obj.set(Binding::Object(obj));
            if Some(id.name) == self.blank {
                continue;
            }
            match self.scopes.scopes[self.top_scope].insert(id.name, obj) {
                Some(alt) => id.obj.set(Binding::Object(alt)),
                None => fresh += 1,
            }
        }
        if fresh == 0 {
            if let Some(&first) = lhs.first() {
                self.error(a.expr_pos(first), "no new variables on left side of :=".into());
            }
        }
    }

    /// Binds `ident` to the innermost declaration of its name. Misses are
    /// queued for the package-scope pass when `collect` is set.
    fn resolve(&mut self, ident: IdentId, collect: bool) {
        let a = self.a;
        let id = &a.idents[ident];
        debug_assert_eq!(id.obj.get(), Binding::None, "identifier already declared or resolved");
        if Some(id.name) == self.blank {
            return;
        }
        if let Some(obj) = self.scopes.lookup(self.top_scope, id.name) {
            trace!(target: "go_syntax::resolver", "resolved {}", a.ident_name(ident));
            if !matches!(self.scopes.objects[obj].decl, DeclRef::Ident(_)) {
                id.obj.set(Binding::Object(obj));
            }
            return;
        }
        if collect {
            id.obj.set(Binding::Unresolved);
            self.unresolved.push(ident);
        }
    }

    // ---------------------------------------------------------------------
    // Walking

    fn walk_exprs(&mut self, list: ListRef<ExprId>) {
        let a = self.a;
        for &x in a.list(list) {
            self.visit_expr(a, x);
        }
    }

    fn walk_stmts(&mut self, list: ListRef<StmtId>) {
        let a = self.a;
        for &s in a.list(list) {
            self.visit_stmt(a, s);
        }
    }

    fn walk_opt_stmt(&mut self, s: Option<StmtId>) {
        if let Some(s) = s {
            self.visit_stmt(self.a, s);
        }
    }

    /// The statements of a switch or select body, without a scope of their own.
    fn walk_clauses(&mut self, body: StmtId) {
        match self.a.block(body) {
            Some(b) => self.walk_stmts(b.list),
            None => self.visit_stmt(self.a, body),
        }
    }

    fn resolve_list(&mut self, list: Option<FieldListId>) {
        let a = self.a;
        let Some(list) = list else { return };
        for &f in a.list(a.field_lists[list].list) {
            self.visit_expr(a, a.fields[f].typ);
        }
    }

    fn declare_list(&mut self, list: Option<FieldListId>, kind: ObjKind) {
        let a = self.a;
        let Some(list) = list else { return };
        for &f in a.list(a.field_lists[list].list) {
            self.declare(DeclRef::Field(f), ObjData::None, self.top_scope, kind, a.list(a.fields[f].names));
        }
    }

    fn walk_field_list(&mut self, list: FieldListId, kind: ObjKind) {
        self.resolve_list(Some(list));
        self.declare_list(Some(list), kind);
    }

    /// Type parameters are declared first so constraints may refer to them.
    fn walk_tparams(&mut self, list: FieldListId) {
        self.declare_list(Some(list), ObjKind::Typ);
        self.resolve_list(Some(list));
    }

    fn walk_func_type(&mut self, typ: ExprId) {
        if let Expr::FuncType { params, results, .. } = self.a.exprs[typ] {
            self.resolve_list(Some(params));
            self.resolve_list(results);
            self.declare_list(Some(params), ObjKind::Var);
            self.declare_list(results, ObjKind::Var);
        }
    }

    /// A function body: a block nested in the signature scope, with its own labels.
    fn walk_body(&mut self, body: Option<StmtId>) {
        let Some(body) = body else { return };
        self.open_label_scope();
        self.visit_stmt(self.a, body);
        self.close_label_scope();
    }

    /// Receiver type parameters (`func (r *T[P]) m()`) are declared before
    /// the rest of the receiver type is resolved.
    fn walk_recv(&mut self, recv: Option<FieldListId>) {
        let a = self.a;
        let Some(recv) = recv else { return };
        let Some((&first, rest)) = a.list(a.field_lists[recv].list).split_first() else {
            return;
        };

        let mut typ = a.fields[first].typ;
        if let Expr::Star { x, .. } = a.exprs[typ] {
            typ = x;
        }
        let mut declare: SmallVec<[ExprId; 4]> = SmallVec::new();
        let mut resolve: SmallVec<[ExprId; 4]> = SmallVec::new();
        match a.exprs[typ] {
            Expr::Index { x, index, .. } => {
                declare.push(index);
                resolve.push(x);
            }
            Expr::IndexList { x, indices, .. } => {
                declare.extend_from_slice(a.list(indices));
                resolve.push(x);
            }
            _ => resolve.push(typ),
        }
        for x in declare {
            match a.exprs[x] {
                Expr::Ident(id) => self.declare(DeclRef::Ident(id), ObjData::None, self.top_scope, ObjKind::Typ, &[id]),
                _ => resolve.push(x),
            }
        }
        for x in resolve {
            self.visit_expr(a, x);
        }
        // Extra receivers are an error already; resolve them anyway.
        for &f in rest {
            self.visit_expr(a, a.fields[f].typ);
        }
    }

    // ---------------------------------------------------------------------
    // Nodes

    fn expr(&mut self, id: ExprId) {
        let a = self.a;
        match a.exprs[id] {
            Expr::Ident(i) => self.resolve(i, true),
            Expr::FuncLit { typ, body } => self.scoped(a.expr_pos(id), |r| {
                r.walk_func_type(typ);
                r.walk_body(Some(body));
            }),
            // Qualified names are not resolved.
            Expr::Selector { x, .. } => self.visit_expr(a, x),
            Expr::StructType { fields, .. } => {
                self.scoped(a.expr_pos(id), |r| r.walk_field_list(fields, ObjKind::Var))
            }
            Expr::FuncType { .. } => self.scoped(a.expr_pos(id), |r| r.walk_func_type(id)),
            Expr::InterfaceType { methods, .. } => {
                self.scoped(a.expr_pos(id), |r| r.walk_field_list(methods, ObjKind::Fun))
            }
            Expr::CompositeLit { typ, elts, .. } => {
                if let Some(typ) = typ {
                    self.visit_expr(a, typ);
                }
                for &e in a.list(elts) {
                    match a.exprs[e] {
                        Expr::KeyValue { key, value, .. } => {
                            // A key may be a field name; misses are not collected.
                            match a.exprs[key] {
                                Expr::Ident(k) => self.resolve(k, false),
                                _ => self.visit_expr(a, key),
                            }
                            self.visit_expr(a, value);
                        }
                        _ => self.visit_expr(a, e),
                    }
                }
            }
            _ => walk_children(self, a, Node::Expr(id)),
        }
    }

    fn stmt(&mut self, id: StmtId) {
        let a = self.a;
        let pos = a.stmt_pos(id);
        match a.stmts[id] {
            Stmt::Labeled { label, stmt, .. } => {
                if let Some(scope) = self.label_scope {
                    self.declare(DeclRef::Labeled(id), ObjData::None, scope, ObjKind::Lbl, &[label]);
                }
                self.visit_stmt(a, stmt);
            }
            Stmt::Assign { lhs, tok, rhs, .. } => {
                self.walk_exprs(rhs);
                if tok == Token::Define {
                    self.short_var_decl(id, a.list(lhs));
                } else {
                    self.walk_exprs(lhs);
                }
            }
            Stmt::Branch { tok, label, .. } => {
                if tok != Token::Fallthrough {
                    if let (Some(label), Some(targets)) = (label, self.target_stack.last_mut()) {
                        targets.push(label);
                    }
                }
            }
            Stmt::Block(b) => self.scoped(pos, |r| r.walk_stmts(b.list)),
            Stmt::If {
                init,
                cond,
                body,
                else_,
                ..
            } => self.scoped(pos, |r| {
                r.walk_opt_stmt(init);
                r.visit_expr(a, cond);
                r.visit_stmt(a, body);
                r.walk_opt_stmt(else_);
            }),
            Stmt::CaseClause { list, body, .. } => {
                self.walk_exprs(list);
                self.scoped(pos, |r| r.walk_stmts(body));
            }
            Stmt::Switch { init, tag, body, .. } => self.scoped(pos, |r| {
                r.walk_opt_stmt(init);
                if let Some(tag) = tag {
                    r.visit_expr(a, tag);
                }
                r.walk_clauses(body);
            }),
            Stmt::TypeSwitch { init, assign, body, .. } => match init {
                Some(init) => self.scoped(pos, |r| {
                    r.visit_stmt(a, init);
                    r.type_switch_guard(assign, body);
                }),
                None => self.type_switch_guard(assign, body),
            },
            Stmt::CommClause { comm, body, .. } => self.scoped(pos, |r| {
                r.walk_opt_stmt(comm);
                r.walk_stmts(body);
            }),
            Stmt::Select { body, .. } => self.walk_clauses(body),
            Stmt::For {
                init, cond, post, body, ..
            } => self.scoped(pos, |r| {
                r.walk_opt_stmt(init);
                if let Some(cond) = cond {
                    r.visit_expr(a, cond);
                }
                r.walk_opt_stmt(post);
                r.visit_stmt(a, body);
            }),
            Stmt::Range {
                key, value, tok, x, body, ..
            } => self.scoped(pos, |r| {
                r.visit_expr(a, x);
                let lhs: SmallVec<[ExprId; 2]> = key.into_iter().chain(value).collect();
                if tok == Token::Define {
                    for &e in &lhs {
                        let e = a.unparen(e);
                        if !matches!(a.exprs[e], Expr::Ident(_)) {
                            r.visit_expr(a, e);
                        }
                    }
                    if !lhs.is_empty() {
                        r.short_var_decl(id, &lhs);
                    }
                } else {
                    for &e in &lhs {
                        r.visit_expr(a, e);
                    }
                }
                r.visit_stmt(a, body);
            }),
            _ => walk_children(self, a, Node::Stmt(id)),
        }
    }

    /// The guard `x := y.(type)` gets a scope of its own, visible to the clauses.
    fn type_switch_guard(&mut self, assign: StmtId, body: StmtId) {
        let a = self.a;
        self.scoped(a.stmt_pos(assign), |r| {
            r.visit_stmt(a, assign);
            r.walk_clauses(body);
        });
    }

    fn decl(&mut self, id: DeclId) {
        let a = self.a;
        match a.decls[id] {
            Decl::Bad { .. } => {}
            Decl::Gen(g) => match g.tok {
                Token::Const | Token::Var => {
                    let kind = if g.tok == Token::Var { ObjKind::Var } else { ObjKind::Con };
                    for (iota, &s) in a.list(g.specs).iter().enumerate() {
                        let Spec::Value(spec) = a.specs[s] else { continue };
                        self.walk_exprs(spec.values);
                        if let Some(typ) = spec.typ {
                            self.visit_expr(a, typ);
                        }
                        self.declare(
                            DeclRef::Spec(s),
                            ObjData::Iota(iota),
                            self.top_scope,
                            kind,
                            a.list(spec.names),
                        );
                    }
                }
                Token::Type => {
                    for &s in a.list(g.specs) {
                        let Spec::Type(spec) = a.specs[s] else { continue };
                        // The type name is in scope within its own definition.
                        self.declare(DeclRef::Spec(s), ObjData::None, self.top_scope, ObjKind::Typ, &[spec.name]);
                        match spec.type_params {
                            Some(tparams) => self.scoped(a.spec_pos(s), |r| {
                                r.walk_tparams(tparams);
                                r.visit_expr(a, spec.typ);
                            }),
                            None => self.visit_expr(a, spec.typ),
                        }
                    }
                }
                // Import names belong to the file block and are left to the
                // package-level pass of the caller.
                _ => {}
            },
            Decl::Func(f) => {
                let (tparams, params, results) = match a.exprs[f.typ] {
                    Expr::FuncType {
                        type_params,
                        params,
                        results,
                        ..
                    } => (type_params, Some(params), results),
                    _ => (None, None, None),
                };
                self.scoped(a.decl_pos(id), |r| {
                    r.walk_recv(f.recv);
                    if let Some(tparams) = tparams {
                        r.walk_tparams(tparams);
                    }
                    // Resolve every type before declaring, so duplicate names
                    // are reported at the later declaration.
                    r.resolve_list(params);
                    r.resolve_list(results);
                    r.declare_list(f.recv, ObjKind::Var);
                    r.declare_list(params, ObjKind::Var);
                    r.declare_list(results, ObjKind::Var);
                    r.walk_body(f.body);
                });
                if f.recv.is_none() && a.ident_name(f.name) != "init" {
                    self.declare(DeclRef::Func(id), ObjData::None, self.pkg_scope, ObjKind::Fun, &[f.name]);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::Object;
    use crate::{parse_file, Mode};

    fn parse(src: &str) -> (File, Vec<String>) {
        let (file, errs) = parse_file("x.go", src, Mode::DECLARATION_ERRORS | Mode::ALL_ERRORS);
        let msgs = errs.iter().map(|e| e.msg.clone()).collect();
        (file.expect("file parses"), msgs)
    }

    /// Every identifier named `name`, in source order.
    fn idents(file: &File, name: &str) -> Vec<IdentId> {
        file.arena
            .idents
            .ids()
            .filter(|&i| file.arena.ident_name(i) == name)
            .collect()
    }

    fn obj(file: &File, id: IdentId) -> Option<&Object> {
        file.arena.idents[id].obj().map(|o| &file.scopes.objects[o])
    }

    #[test]
    fn inner_block_shadows() {
        let (file, errs) = parse("package p\nfunc f(x int) { x := 1; { x := 2; _ = x }; _ = x }\n");
        assert!(errs.is_empty(), "{errs:?}");
        let xs = idents(&file, "x");
        // param, outer :=, inner :=, inner use, outer use
        assert_eq!(xs.len(), 5);
        let outer = file.arena.idents[xs[1]].obj();
        let inner = file.arena.idents[xs[2]].obj();
        assert_ne!(outer, inner);
        assert_eq!(file.arena.idents[xs[3]].obj(), inner);
        assert_eq!(file.arena.idents[xs[4]].obj(), outer);
        assert_ne!(file.arena.idents[xs[0]].obj(), outer);
    }

    #[test]
    fn no_new_variables() {
        let (_, errs) = parse("package p\nfunc f() { x := 1; x := 2; _ = x }\n");
        assert_eq!(errs, ["no new variables on left side of :="]);

        let (_, errs) = parse("package p\nfunc f() { x := 1; x, y := 2, 3; _, _ = x, y }\n");
        assert!(errs.is_empty(), "{errs:?}");
    }

    #[test]
    fn redeclared_in_block() {
        let (file, errs) = parse("package p\nfunc f() {\n\tvar x int\n\tvar x int\n\t_ = x\n}\n");
        assert_eq!(errs, ["x redeclared in this block\n\tprevious declaration at x.go:3:6"]);
        // The first declaration stays in effect.
        let xs = idents(&file, "x");
        assert_eq!(file.arena.idents[xs[2]].obj(), file.arena.idents[xs[0]].obj());
    }

    #[test]
    fn blank_is_never_bound() {
        let (_, errs) = parse("package p\nvar _ int\nvar _ string\nfunc f() { _ := 1 }\n");
        assert_eq!(errs, ["no new variables on left side of :="]);
    }

    #[test]
    fn unresolved_once_per_name() {
        let (file, _) = parse("package p\nfunc f() { g(); g(); h() }\n");
        let names: Vec<_> = file.unresolved.iter().map(|&i| file.arena.ident_name(i)).collect();
        assert_eq!(names, ["g", "h"]);
        for i in idents(&file, "g") {
            assert_eq!(file.arena.idents[i].obj.get(), Binding::None);
        }
    }

    #[test]
    fn package_level_forward_references() {
        let (file, _) = parse("package p\nfunc f() T { return g() }\nfunc g() T { return T{} }\ntype T struct{}\n");
        assert!(file.unresolved.is_empty());
        let t = idents(&file, "T");
        let decl = file.arena.idents[*t.last().unwrap()].obj();
        assert!(decl.is_some());
        assert!(t.iter().all(|&i| file.arena.idents[i].obj() == decl));
        let scope = file.scope.unwrap();
        assert_eq!(file.scopes.scopes[scope].len(), 3);
    }

    #[test]
    fn iota_is_spec_index() {
        let (file, _) = parse("package p\nconst (\n\tA = iota\n\tB\n\tC, D = 1, 2\n)\n");
        let d = obj(&file, idents(&file, "D")[0]).unwrap();
        assert_eq!(d.kind, ObjKind::Con);
        assert_eq!(d.data, ObjData::Iota(2));
        assert!(file.unresolved.iter().any(|&i| file.arena.ident_name(i) == "iota"));
    }

    #[test]
    fn labels() {
        let (file, errs) = parse("package p\nfunc f() {\nL:\n\tfor {\n\t\tbreak L\n\t}\n\tgoto M\n}\n");
        assert_eq!(errs, ["label M undefined"]);
        let ls = idents(&file, "L");
        assert_eq!(obj(&file, ls[1]).map(|o| o.kind), Some(ObjKind::Lbl));
        assert_eq!(file.arena.idents[ls[0]].obj(), file.arena.idents[ls[1]].obj());
    }

    #[test]
    fn labels_do_not_cross_function_literals() {
        let (_, errs) = parse("package p\nfunc f() {\nL:\n\t_ = func() { goto L }\n}\n");
        assert_eq!(errs, ["label L undefined"]);
    }

    #[test]
    fn composite_literal_keys_not_collected() {
        let (file, _) = parse("package p\ntype T struct{ A int }\nvar v = T{A: 1}\n");
        let names: Vec<_> = file.unresolved.iter().map(|&i| file.arena.ident_name(i)).collect();
        assert_eq!(names, ["int"]);
        let a = idents(&file, "A");
        assert_eq!(file.arena.idents[a[1]].obj.get(), Binding::None);
    }

    #[test]
    fn receiver_type_params_shadow_but_stay_unbound() {
        let (file, errs) = parse("package p\ntype T[P any] struct{}\nfunc (t T[P]) m(p P) {}\n");
        assert!(errs.is_empty(), "{errs:?}");
        let ps = idents(&file, "P");
        // type param, receiver type param, parameter type
        assert_eq!(ps.len(), 3);
        assert!(file.arena.idents[ps[1]].obj().is_none());
        assert!(file.arena.idents[ps[2]].obj().is_none());
        assert!(file.unresolved.iter().all(|&i| file.arena.ident_name(i) != "P"));
    }

    #[test]
    fn result_named_like_param_is_redeclared() {
        let (_, errs) = parse("package p\nfunc f(a int) (a int) { return }\n");
        assert_eq!(errs.len(), 1);
        assert!(errs[0].starts_with("a redeclared in this block"));
    }

    #[test]
    fn type_switch_guard_scope() {
        let src = "package p\nfunc f(y any) {\n\tswitch x := y.(type) {\n\tcase int:\n\t\t_ = x\n\t}\n}\n";
        let (file, errs) = parse(src);
        assert!(errs.is_empty(), "{errs:?}");
        let xs = idents(&file, "x");
        let guard = obj(&file, xs[0]).unwrap();
        assert!(matches!(guard.decl, DeclRef::Assign(_)));
        assert_eq!(file.arena.idents[xs[1]].obj(), file.arena.idents[xs[0]].obj());
    }

    #[test]
    fn range_declares_key_and_value() {
        let (file, errs) = parse("package p\nfunc f(s []int) {\n\tfor i, v := range s {\n\t\t_, _ = i, v\n\t}\n}\n");
        assert!(errs.is_empty(), "{errs:?}");
        let v = idents(&file, "v");
        let o = obj(&file, v[0]).unwrap();
        assert!(matches!(o.decl, DeclRef::Assign(_)));
        assert_eq!(file.position(o.pos(&file.arena)).to_string(), "x.go:3:9");
        assert_eq!(file.arena.idents[v[1]].obj(), file.arena.idents[v[0]].obj());
    }

    #[test]
    fn declaration_errors_need_mode() {
        let (_, errs) = parse_file("x.go", "package p\nvar a int\nvar a int\n", Mode::empty());
        assert!(errs.is_empty());
    }

    #[test]
    fn resolve_file_is_repeatable() {
        let (mut file, _) = parse("package p\nvar a int\nvar a int\nfunc f() { _ = b }\n");
        let mut msgs = Vec::new();
        resolve_file(&mut file, |pos, msg| msgs.push(format!("{pos}: {msg}")));
        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].starts_with("x.go:3:5: a redeclared in this block"));
        let names: Vec<_> = file.unresolved.iter().map(|&i| file.arena.ident_name(i)).collect();
        assert_eq!(names, ["int", "b"]);
    }
}
