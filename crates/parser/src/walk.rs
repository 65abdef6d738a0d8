//! Depth-first traversal of the syntax tree.
//!
//! [`Walk`] is derived per node type (`#[derive(WalkAst)]`) and visits the
//! children of a node in source order; a [`Visitor`] decides what happens at
//! each child. The default visitor methods descend, so an override that does
//! not call [`walk_children`] prunes that subtree.

use crate::ast::*;
use crate::position::Pos;
use crate::token::Token;
use crate::File;

pub trait Walk<'ast> {
    fn walk<V: Visitor<'ast> + ?Sized>(&self, a: &'ast AstArena, v: &mut V);
}

pub trait Visitor<'ast> {
    #[inline]
    fn visit_comment(&mut self, a: &'ast AstArena, id: CommentId) {
        a.comments[id].walk(a, self);
    }

    #[inline]
    fn visit_comment_group(&mut self, a: &'ast AstArena, id: CommentGroupId) {
        a.comment_groups[id].walk(a, self);
    }

    #[inline]
    fn visit_ident(&mut self, a: &'ast AstArena, id: IdentId) {
        a.idents[id].walk(a, self);
    }

    #[inline]
    fn visit_field(&mut self, a: &'ast AstArena, id: FieldId) {
        a.fields[id].walk(a, self);
    }

    #[inline]
    fn visit_field_list(&mut self, a: &'ast AstArena, id: FieldListId) {
        a.field_lists[id].walk(a, self);
    }

    #[inline]
    fn visit_expr(&mut self, a: &'ast AstArena, id: ExprId) {
        a.exprs[id].walk(a, self);
    }

    #[inline]
    fn visit_stmt(&mut self, a: &'ast AstArena, id: StmtId) {
        a.stmts[id].walk(a, self);
    }

    #[inline]
    fn visit_spec(&mut self, a: &'ast AstArena, id: SpecId) {
        a.specs[id].walk(a, self);
    }

    #[inline]
    fn visit_decl(&mut self, a: &'ast AstArena, id: DeclId) {
        a.decls[id].walk(a, self);
    }
}

macro_rules! impl_walk_for_ids {
    ($($id:ty => $visit:ident),* $(,)?) => {
        $(
            impl<'ast> Walk<'ast> for $id {
                #[inline]
                fn walk<V: Visitor<'ast> + ?Sized>(&self, a: &'ast AstArena, v: &mut V) {
                    v.$visit(a, *self);
                }
            }
        )*
    };
}

impl_walk_for_ids! {
    CommentId => visit_comment,
    CommentGroupId => visit_comment_group,
    IdentId => visit_ident,
    FieldId => visit_field,
    FieldListId => visit_field_list,
    ExprId => visit_expr,
    StmtId => visit_stmt,
    SpecId => visit_spec,
    DeclId => visit_decl,
}

impl<'ast, T> Walk<'ast> for ListRef<T>
where
    AstArena: ListSlice<T>,
    T: Walk<'ast> + 'ast,
{
    #[inline]
    fn walk<V: Visitor<'ast> + ?Sized>(&self, a: &'ast AstArena, v: &mut V) {
        for item in a.list(*self) {
            item.walk(a, v);
        }
    }
}

impl<'ast, T: Walk<'ast>> Walk<'ast> for Option<T> {
    #[inline]
    fn walk<V: Visitor<'ast> + ?Sized>(&self, a: &'ast AstArena, v: &mut V) {
        if let Some(x) = self {
            x.walk(a, v);
        }
    }
}

// Leaves.
macro_rules! impl_walk_noop {
    ($($ty:ty),* $(,)?) => {
        $(
            impl<'ast> Walk<'ast> for $ty {
                #[inline]
                fn walk<V: Visitor<'ast> + ?Sized>(&self, _: &'ast AstArena, _: &mut V) {}
            }
        )*
    };
}

impl_walk_noop! {
    Pos,
    Token,
    Symbol,
    BasicLit,
    ChanDir,
    bool,
    Box<str>,
}

/// Dispatches `node` to the matching visitor method.
pub fn walk<'ast, V: Visitor<'ast> + ?Sized>(v: &mut V, a: &'ast AstArena, node: Node) {
    match node {
        Node::Comment(id) => v.visit_comment(a, id),
        Node::CommentGroup(id) => v.visit_comment_group(a, id),
        Node::Ident(id) => v.visit_ident(a, id),
        Node::Field(id) => v.visit_field(a, id),
        Node::FieldList(id) => v.visit_field_list(a, id),
        Node::Expr(id) => v.visit_expr(a, id),
        Node::Stmt(id) => v.visit_stmt(a, id),
        Node::Spec(id) => v.visit_spec(a, id),
        Node::Decl(id) => v.visit_decl(a, id),
    }
}

/// Visits the direct children of `node`, without visiting `node` itself.
pub fn walk_children<'ast, V: Visitor<'ast> + ?Sized>(v: &mut V, a: &'ast AstArena, node: Node) {
    match node {
        Node::Comment(id) => a.comments[id].walk(a, v),
        Node::CommentGroup(id) => a.comment_groups[id].walk(a, v),
        Node::Ident(id) => a.idents[id].walk(a, v),
        Node::Field(id) => a.fields[id].walk(a, v),
        Node::FieldList(id) => a.field_lists[id].walk(a, v),
        Node::Expr(id) => a.exprs[id].walk(a, v),
        Node::Stmt(id) => a.stmts[id].walk(a, v),
        Node::Spec(id) => a.specs[id].walk(a, v),
        Node::Decl(id) => a.decls[id].walk(a, v),
    }
}

/// Walks a whole file: package doc, package name, then every declaration.
///
/// Free-floating comments are not part of the traversal.
pub fn walk_file<'ast, V: Visitor<'ast> + ?Sized>(v: &mut V, file: &'ast File) {
    let a = &file.arena;
    if let Some(doc) = file.doc {
        v.visit_comment_group(a, doc);
    }
    v.visit_ident(a, file.name);
    for &d in &file.decls {
        v.visit_decl(a, d);
    }
}

/// The node an expression id stands for: identifiers surface as `Node::Ident`.
#[inline]
fn expr_node(a: &AstArena, id: ExprId) -> Node {
    match a.exprs[id] {
        Expr::Ident(i) => Node::Ident(i),
        _ => Node::Expr(id),
    }
}

struct Inspector<F>(F);

impl<F> Inspector<F>
where
    F: FnMut(Node) -> bool,
{
    #[inline]
    fn enter<'ast>(&mut self, a: &'ast AstArena, node: Node) {
        if (self.0)(node) {
            walk_children(self, a, node);
        }
    }
}

impl<'ast, F> Visitor<'ast> for Inspector<F>
where
    F: FnMut(Node) -> bool,
{
    fn visit_comment(&mut self, a: &'ast AstArena, id: CommentId) {
        self.enter(a, Node::Comment(id));
    }

    fn visit_comment_group(&mut self, a: &'ast AstArena, id: CommentGroupId) {
        self.enter(a, Node::CommentGroup(id));
    }

    fn visit_ident(&mut self, a: &'ast AstArena, id: IdentId) {
        self.enter(a, Node::Ident(id));
    }

    fn visit_field(&mut self, a: &'ast AstArena, id: FieldId) {
        self.enter(a, Node::Field(id));
    }

    fn visit_field_list(&mut self, a: &'ast AstArena, id: FieldListId) {
        self.enter(a, Node::FieldList(id));
    }

    fn visit_expr(&mut self, a: &'ast AstArena, id: ExprId) {
        match a.exprs[id] {
            Expr::Ident(i) => self.visit_ident(a, i),
            _ => self.enter(a, Node::Expr(id)),
        }
    }

    fn visit_stmt(&mut self, a: &'ast AstArena, id: StmtId) {
        self.enter(a, Node::Stmt(id));
    }

    fn visit_spec(&mut self, a: &'ast AstArena, id: SpecId) {
        self.enter(a, Node::Spec(id));
    }

    fn visit_decl(&mut self, a: &'ast AstArena, id: DeclId) {
        self.enter(a, Node::Decl(id));
    }
}

/// Calls `f` for `node` and, while `f` returns `true`, for every descendant
/// in depth-first source order. Returning `false` skips the children.
pub fn inspect<F>(a: &AstArena, node: Node, f: F)
where
    F: FnMut(Node) -> bool,
{
    let node = match node {
        Node::Expr(id) => expr_node(a, id),
        other => other,
    };
    let mut ins = Inspector(f);
    ins.enter(a, node);
}

/// [`inspect`] over every node [`walk_file`] reaches.
pub fn inspect_file<F>(file: &File, f: F)
where
    F: FnMut(Node) -> bool,
{
    let mut ins = Inspector(f);
    walk_file(&mut ins, file);
}

/// Direct children of `node` in source order.
pub fn children(a: &AstArena, node: Node) -> Vec<Node> {
    let mut out = Vec::new();
    walk_children(&mut ChildSink(&mut out), a, node);
    out
}

/// Depth-first pre-order iterator; see [`preorder`].
pub struct Preorder<'ast> {
    arena: &'ast AstArena,
    stack: Vec<Node>,
}

impl Iterator for Preorder<'_> {
    type Item = Node;

    fn next(&mut self) -> Option<Node> {
        let node = self.stack.pop()?;
        let start = self.stack.len();
        walk_children(&mut ChildSink(&mut self.stack), self.arena, node);
        self.stack[start..].reverse();
        Some(node)
    }
}

/// Pushes children straight onto the pre-order stack.
struct ChildSink<'s>(&'s mut Vec<Node>);

impl<'ast> Visitor<'ast> for ChildSink<'_> {
    fn visit_comment(&mut self, _: &'ast AstArena, id: CommentId) {
        self.0.push(Node::Comment(id));
    }

    fn visit_comment_group(&mut self, _: &'ast AstArena, id: CommentGroupId) {
        self.0.push(Node::CommentGroup(id));
    }

    fn visit_ident(&mut self, _: &'ast AstArena, id: IdentId) {
        self.0.push(Node::Ident(id));
    }

    fn visit_field(&mut self, _: &'ast AstArena, id: FieldId) {
        self.0.push(Node::Field(id));
    }

    fn visit_field_list(&mut self, _: &'ast AstArena, id: FieldListId) {
        self.0.push(Node::FieldList(id));
    }

    fn visit_expr(&mut self, a: &'ast AstArena, id: ExprId) {
        self.0.push(expr_node(a, id));
    }

    fn visit_stmt(&mut self, _: &'ast AstArena, id: StmtId) {
        self.0.push(Node::Stmt(id));
    }

    fn visit_spec(&mut self, _: &'ast AstArena, id: SpecId) {
        self.0.push(Node::Spec(id));
    }

    fn visit_decl(&mut self, _: &'ast AstArena, id: DeclId) {
        self.0.push(Node::Decl(id));
    }
}

/// Every node of the subtree rooted at `root`, in the order [`inspect`]
/// would report them. Identifier expressions are yielded as `Node::Ident`.
pub fn preorder(a: &AstArena, root: Node) -> Preorder<'_> {
    let root = match root {
        Node::Expr(id) => expr_node(a, id),
        other => other,
    };
    Preorder {
        arena: a,
        stack: vec![root],
    }
}

/// [`preorder`] over the nodes [`walk_file`] reaches; the file itself is not yielded.
pub fn preorder_file(file: &File) -> Preorder<'_> {
    let a = &file.arena;
    let mut stack: Vec<Node> = file.decls.iter().rev().map(|&d| Node::Decl(d)).collect();
    stack.push(Node::Ident(file.name));
    if let Some(doc) = file.doc {
        stack.push(Node::CommentGroup(doc));
    }
    Preorder { arena: a, stack }
}
