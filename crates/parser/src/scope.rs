//! Lexical scopes and declared objects.
//!
//! Scopes and objects live in a [`ScopeArena`] owned by the parsed file; a
//! scope refers to its enclosing scope by id, so the chain never owns the
//! tree and the tree never owns the chain.

use rustc_hash::FxHashMap;
use std::fmt;

use crate::ast::{Arena, AstArena, DeclId, FieldId, Id, IdentId, Node, SpecId, StmtId, Symbol};
use crate::position::Pos;

pub type ScopeId = Id<Scope>;
pub type ObjId = Id<Object>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjKind {
    Bad,
    /// Package (import name).
    Pkg,
    Con,
    Typ,
    Var,
    Fun,
    Lbl,
}

impl fmt::Display for ObjKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ObjKind::Bad => "bad",
            ObjKind::Pkg => "package",
            ObjKind::Con => "const",
            ObjKind::Typ => "type",
            ObjKind::Var => "var",
            ObjKind::Fun => "func",
            ObjKind::Lbl => "label",
        })
    }
}

/// The node that declared an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclRef {
    None,
    /// Parameter, result, receiver, struct field or interface method.
    Field(FieldId),
    /// `ImportSpec`, `ValueSpec` or `TypeSpec`.
    Spec(SpecId),
    Func(DeclId),
    /// Labeled statement.
    Labeled(StmtId),
    /// `:=` assignment: plain, type switch guard, or the `range` clause
    /// (which points at the `Range` statement).
    Assign(StmtId),
    /// Receiver type parameter, declared by identifier only.
    Ident(IdentId),
}

/// Extra information attached to an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjData {
    #[default]
    None,
    /// Index of the spec within its `const`/`var` group (the `iota` value).
    Iota(usize),
}

/// A named language entity: constant, type, variable, function, label or package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Object {
    pub kind: ObjKind,
    pub name: Symbol,
    pub decl: DeclRef,
    pub data: ObjData,
}

/// Name to object bindings of one lexical block.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    pub outer: Option<ScopeId>,
    objects: FxHashMap<Symbol, ObjId>,
}

impl Scope {
    pub fn lookup(&self, name: Symbol) -> Option<ObjId> {
        self.objects.get(&name).copied()
    }

    /// Binds `name` unless already bound; returns the previous binding if any.
    pub fn insert(&mut self, name: Symbol, obj: ObjId) -> Option<ObjId> {
        match self.objects.get(&name) {
            Some(&prev) => Some(prev),
            None => {
                self.objects.insert(name, obj);
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Bindings sorted by object id, i.e. declaration order.
    pub fn objects(&self) -> Vec<(Symbol, ObjId)> {
        let mut v: Vec<_> = self.objects.iter().map(|(&s, &o)| (s, o)).collect();
        v.sort_by_key(|&(_, o)| o);
        v
    }
}

#[derive(Debug, Default)]
pub struct ScopeArena {
    pub scopes: Arena<Scope>,
    pub objects: Arena<Object>,
}

impl ScopeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_scope(&mut self, outer: Option<ScopeId>) -> ScopeId {
        self.scopes.alloc(Scope {
            outer,
            objects: FxHashMap::default(),
        })
    }

    pub fn new_object(&mut self, kind: ObjKind, name: Symbol, decl: DeclRef, data: ObjData) -> ObjId {
        self.objects.alloc(Object {
            kind,
            name,
            decl,
            data,
        })
    }

    /// Innermost binding of `name` starting at `scope`.
    pub fn lookup(&self, mut scope: ScopeId, name: Symbol) -> Option<ObjId> {
        loop {
            let s = &self.scopes[scope];
            if let Some(obj) = s.lookup(name) {
                return Some(obj);
            }
            scope = s.outer?;
        }
    }
}

impl Object {
    /// Source position of the declared name, or `Pos::NONE`.
    pub fn pos(&self, ast: &AstArena) -> Pos {
        let named = |ids: &[IdentId]| {
            ids.iter()
                .copied()
                .find(|&i| ast.idents[i].name == self.name)
                .map_or(Pos::NONE, |i| ast.idents[i].name_pos)
        };
        match self.decl {
            DeclRef::None => Pos::NONE,
            DeclRef::Field(f) => named(ast.list(ast.fields[f].names)),
            DeclRef::Spec(s) => match &ast.specs[s] {
                crate::ast::Spec::Import(spec) => match spec.name {
                    Some(n) => ast.idents[n].name_pos,
                    None => ast.expr_pos(spec.path),
                },
                crate::ast::Spec::Value(spec) => named(ast.list(spec.names)),
                crate::ast::Spec::Type(spec) => ast.idents[spec.name].name_pos,
            },
            DeclRef::Func(d) => match &ast.decls[d] {
                crate::ast::Decl::Func(f) => ast.idents[f.name].name_pos,
                _ => Pos::NONE,
            },
            DeclRef::Labeled(s) => match ast.stmts[s] {
                crate::ast::Stmt::Labeled { label, .. } => ast.idents[label].name_pos,
                _ => Pos::NONE,
            },
            DeclRef::Assign(s) => match ast.stmts[s] {
                crate::ast::Stmt::Assign { lhs, .. } => ast
                    .list(lhs)
                    .iter()
                    .find_map(|&x| match ast.exprs[x] {
                        crate::ast::Expr::Ident(i) if ast.idents[i].name == self.name => {
                            Some(ast.idents[i].name_pos)
                        }
                        _ => None,
                    })
                    .unwrap_or(Pos::NONE),
                crate::ast::Stmt::Range { key, value, .. } => key
                    .into_iter()
                    .chain(value)
                    .find_map(|x| match ast.exprs[x] {
                        crate::ast::Expr::Ident(i) if ast.idents[i].name == self.name => {
                            Some(ast.idents[i].name_pos)
                        }
                        _ => None,
                    })
                    .unwrap_or(Pos::NONE),
                _ => ast.pos(Node::Stmt(s)),
            },
            DeclRef::Ident(i) => ast.idents[i].name_pos,
        }
    }
}
