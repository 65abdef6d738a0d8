//! # Go syntax tree
//!
//! Arena-allocated nodes in the shape of Go's own AST: three closed node
//! families (`Expr`, `Stmt`, `Decl`) plus `Spec`, and the auxiliary nodes
//! `Ident`, `Field`, `FieldList`, `Comment` and `CommentGroup`.
//!
//! - **Nodes** live in typed arenas (`Arena<T>`) and are referenced by `Id<T>`.
//! - **Lists** live in centralized buffers (`ExtraData`) behind `ListRef<T>`.
//! - **Names** and literal values are interned (`Symbol`).
//! - **Positions** are raw [`Pos`] values; `pos()`/`end()` are derived from
//!   node fields on demand and never stored separately.
//!
//! Walking lives in `crate::walk`; `#[derive(WalkAst)]` generates the
//! per-node child order.

use ast_derive::WalkAst;
use core::cell::Cell;
use core::marker::PhantomData;
use core::ops::{Index, IndexMut};
use smallvec::SmallVec;
use std::collections::hash_map::RandomState;
use std::collections::HashMap;
use std::hash::{BuildHasher, BuildHasherDefault, Hasher};

use crate::position::Pos;
use crate::scope::ObjId;
use crate::token::Token;

// =============================================================================
// Core Foundation Types
// =============================================================================

/// Type-safe index of an arena-allocated node.
#[repr(transparent)]
pub struct Id<T> {
    raw: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Copy for Id<T> {}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T> Eq for Id<T> {}

impl<T> PartialOrd for Id<T> {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Id<T> {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl<T> core::hash::Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<T> core::fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "#{}", self.raw)
    }
}

impl<T> Id<T> {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self {
            raw,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub const fn to_usize(&self) -> usize {
        self.raw as usize
    }

    #[inline]
    pub const fn raw(&self) -> u32 {
        self.raw
    }
}

/// Typed reference into a centralized list buffer.
#[derive(Debug)]
pub struct ListRef<T> {
    start: u32,
    len: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Copy for ListRef<T> {}

impl<T> PartialEq for ListRef<T> {
    fn eq(&self, other: &Self) -> bool {
        (self.start, self.len) == (other.start, other.len)
    }
}

impl<T> Eq for ListRef<T> {}

impl<T> Clone for ListRef<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Default for ListRef<T> {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl<T> ListRef<T> {
    pub const EMPTY: Self = Self {
        start: 0,
        len: 0,
        _marker: PhantomData,
    };

    #[inline]
    pub const fn new(start: u32, len: u32) -> Self {
        Self {
            start,
            len,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    const fn range(&self) -> core::ops::Range<usize> {
        self.start as usize..(self.start + self.len) as usize
    }
}

// =============================================================================
// Symbol Interning
// =============================================================================

/// Interned string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Symbol(u32);

impl Symbol {
    #[inline]
    pub const fn from_raw(v: u32) -> Self {
        Self(v)
    }

    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

/// Identity hasher for pre-hashed `u64` bucket keys.
#[derive(Default)]
struct U64IdentityHasher(u64);

impl Hasher for U64IdentityHasher {
    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 = self.0.rotate_left(8) ^ u64::from(b);
        }
    }

    #[inline]
    fn write_u64(&mut self, i: u64) {
        self.0 = i;
    }

    #[inline]
    fn finish(&self) -> u64 {
        self.0
    }
}

type U64IdentityBuild = BuildHasherDefault<U64IdentityHasher>;

/// String interner: each distinct string is stored once.
#[derive(Debug, Default)]
pub struct Interner {
    strings: Vec<Box<str>>,
    buckets: HashMap<u64, SmallVec<[Symbol; 1]>, U64IdentityBuild>,
    state: RandomState,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, s: &str) -> Symbol {
        let h = self.state.hash_one(s);
        let entry = self.buckets.entry(h).or_default();
        for &sym in entry.iter() {
            if &*self.strings[sym.0 as usize] == s {
                return sym;
            }
        }
        let sym = Symbol(self.strings.len() as u32);
        self.strings.push(s.into());
        entry.push(sym);
        sym
    }

    /// Symbol for `s` if it was interned before.
    pub fn get(&self, s: &str) -> Option<Symbol> {
        let h = self.state.hash_one(s);
        self.buckets
            .get(&h)?
            .iter()
            .copied()
            .find(|sym| &*self.strings[sym.0 as usize] == s)
    }

    #[inline]
    pub fn resolve(&self, sym: Symbol) -> &str {
        &self.strings[sym.0 as usize]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

// =============================================================================
// Arena Allocation
// =============================================================================

#[derive(Debug)]
pub struct Arena<T> {
    data: Vec<T>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self { data: Vec::new() }
    }
}

impl<T> Arena<T> {
    #[inline]
    pub fn alloc(&mut self, node: T) -> Id<T> {
        let id = Id::from_raw(self.data.len() as u32);
        self.data.push(node);
        id
    }

    #[inline]
    pub fn get(&self, id: Id<T>) -> &T {
        &self.data[id.to_usize()]
    }

    #[inline]
    pub fn get_mut(&mut self, id: Id<T>) -> &mut T {
        &mut self.data[id.to_usize()]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = Id<T>> {
        (0..self.data.len() as u32).map(Id::from_raw)
    }
}

impl<T> Index<Id<T>> for Arena<T> {
    type Output = T;
    fn index(&self, id: Id<T>) -> &T {
        self.get(id)
    }
}

impl<T> IndexMut<Id<T>> for Arena<T> {
    fn index_mut(&mut self, id: Id<T>) -> &mut T {
        self.get_mut(id)
    }
}

// =============================================================================
// Node IDs
// =============================================================================

pub type ExprId = Id<Expr>;
pub type StmtId = Id<Stmt>;
pub type DeclId = Id<Decl>;
pub type SpecId = Id<Spec>;
pub type IdentId = Id<Ident>;
pub type FieldId = Id<Field>;
pub type FieldListId = Id<FieldList>;
pub type CommentId = Id<Comment>;
pub type CommentGroupId = Id<CommentGroup>;

// =============================================================================
// Centralized List Storage
// =============================================================================

#[derive(Debug, Default)]
pub struct ExtraData {
    pub exprs: Vec<ExprId>,
    pub stmts: Vec<StmtId>,
    pub specs: Vec<SpecId>,
    pub idents: Vec<IdentId>,
    pub fields: Vec<FieldId>,
    pub comments: Vec<CommentId>,
}

/// Central arena holding every node, list buffer and interned string of one file.
#[derive(Debug, Default)]
pub struct AstArena {
    pub exprs: Arena<Expr>,
    pub stmts: Arena<Stmt>,
    pub decls: Arena<Decl>,
    pub specs: Arena<Spec>,
    pub idents: Arena<Ident>,
    pub fields: Arena<Field>,
    pub field_lists: Arena<FieldList>,
    pub comments: Arena<Comment>,
    pub comment_groups: Arena<CommentGroup>,
    pub extras: ExtraData,
    pub symbols: Interner,
}

/// Lists that can be resolved against the arena's buffers.
pub trait ListSlice<T> {
    fn slice(&self, r: ListRef<T>) -> &[T];
}

macro_rules! impl_lists {
    ($($t:ty => $buf:ident, $builder:ident);* $(;)?) => {
        impl AstArena {
            $(
                pub fn $builder(&mut self, items: impl IntoIterator<Item = $t>) -> ListRef<$t> {
                    Self::push_list(&mut self.extras.$buf, items)
                }
            )*
        }
        $(
            impl ListSlice<$t> for AstArena {
                #[inline]
                fn slice(&self, r: ListRef<$t>) -> &[$t] {
                    &self.extras.$buf[r.range()]
                }
            }
        )*
    };
}

impl_lists! {
    ExprId => exprs, list_exprs;
    StmtId => stmts, list_stmts;
    SpecId => specs, list_specs;
    IdentId => idents, list_idents;
    FieldId => fields, list_fields;
    CommentId => comments, list_comments;
}

impl AstArena {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn push_list<T>(buf: &mut Vec<T>, items: impl IntoIterator<Item = T>) -> ListRef<T> {
        let start = buf.len();
        buf.extend(items);
        ListRef::new(start as u32, (buf.len() - start) as u32)
    }

    /// Resolves any list reference.
    #[inline]
    pub fn list<T>(&self, r: ListRef<T>) -> &[T]
    where
        Self: ListSlice<T>,
    {
        self.slice(r)
    }

    pub fn new_ident(&mut self, pos: Pos, name: &str) -> IdentId {
        let name = self.symbols.intern(name);
        self.idents.alloc(Ident::new(pos, name))
    }

    #[inline]
    pub fn ident_name(&self, id: IdentId) -> &str {
        self.symbols.resolve(self.idents[id].name)
    }

    /// Whether the identifier starts with an upper-case letter.
    pub fn is_exported(&self, id: IdentId) -> bool {
        crate::token::is_exported(self.ident_name(id))
    }

    #[inline]
    pub fn lit_value(&self, lit: &BasicLit) -> &str {
        self.symbols.resolve(lit.value)
    }

    /// The block statement behind a body id.
    pub fn block(&self, id: StmtId) -> Option<&BlockStmt> {
        match &self.stmts[id] {
            Stmt::Block(b) => Some(b),
            _ => None,
        }
    }

    /// `x` with all enclosing parentheses removed.
    pub fn unparen(&self, mut x: ExprId) -> ExprId {
        while let Expr::Paren { x: inner, .. } = self.exprs[x] {
            x = inner;
        }
        x
    }

    /// Number of parameters/fields a field list declares (anonymous fields count as one).
    pub fn num_fields(&self, list: FieldListId) -> usize {
        self.list(self.field_lists[list].list)
            .iter()
            .map(|&f| self.list(self.fields[f].names).len().max(1))
            .sum()
    }

    /// Text of a comment group with markers, leading blank lines and trailing
    /// spaces removed; lines are joined with `\n` and end in `\n`.
    pub fn comment_text(&self, group: CommentGroupId) -> String {
        let mut lines: Vec<&str> = Vec::new();
        for &c in self.list(self.comment_groups[group].list) {
            let text = &*self.comments[c].text;
            if let Some(rest) = text.strip_prefix("//") {
                lines.push(rest.strip_prefix(' ').unwrap_or(rest));
            } else if let Some(body) = text.strip_prefix("/*") {
                lines.extend(body.strip_suffix("*/").unwrap_or(body).lines());
            }
        }
        let mut out = String::new();
        let mut blank_run = 0usize;
        for line in lines.iter().map(|l| l.trim_end()) {
            if line.is_empty() {
                if !out.is_empty() {
                    blank_run += 1;
                }
                continue;
            }
            if blank_run > 0 {
                out.push('\n');
                blank_run = 0;
            }
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

// =============================================================================
// Comments
// =============================================================================

/// A single `//` or `/* */` comment; `text` includes the markers.
#[derive(Debug, Clone, PartialEq, Eq, WalkAst)]
pub struct Comment {
    pub slash: Pos,
    pub text: Box<str>,
}

/// A run of adjacent comments with no blank line or token in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct CommentGroup {
    pub list: ListRef<CommentId>,
}

// =============================================================================
// Identifiers, fields
// =============================================================================

/// Resolution state of an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Binding {
    #[default]
    None,
    /// Transient marker while a reference waits for the package-scope pass.
    Unresolved,
    Object(ObjId),
}

#[derive(Debug, Clone, PartialEq, Eq, WalkAst)]
pub struct Ident {
    pub name_pos: Pos,
    pub name: Symbol,
    #[walk(skip)]
    pub obj: Cell<Binding>,
}

impl Ident {
    pub fn new(name_pos: Pos, name: Symbol) -> Self {
        Self {
            name_pos,
            name,
            obj: Cell::new(Binding::None),
        }
    }

    /// Declaring object, once resolved.
    pub fn obj(&self) -> Option<ObjId> {
        match self.obj.get() {
            Binding::Object(o) => Some(o),
            _ => None,
        }
    }
}

/// A parameter, result, struct field, embedded field or interface element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct Field {
    pub doc: Option<CommentGroupId>,
    pub names: ListRef<IdentId>,
    pub typ: ExprId,
    pub tag: Option<ExprId>,
    pub comment: Option<CommentGroupId>,
}

/// Parenthesized, braced or bracketed list of fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct FieldList {
    pub opening: Pos,
    pub list: ListRef<FieldId>,
    pub closing: Pos,
}

// =============================================================================
// Expressions and types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BasicLit {
    pub value_pos: Pos,
    /// `Token::Int`, `Float`, `Imag`, `Char` or `String`.
    pub kind: Token,
    pub value: Symbol,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChanDir {
    #[default]
    Both,
    Send,
    Recv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum Expr {
    /// Placeholder for an expression containing syntax errors.
    Bad { from: Pos, to: Pos },
    Ident(IdentId),
    BasicLit(BasicLit),
    /// `func(...) {...}`; `typ` is a `FuncType`, `body` a block.
    FuncLit { typ: ExprId, body: StmtId },
    CompositeLit {
        typ: Option<ExprId>,
        lbrace: Pos,
        elts: ListRef<ExprId>,
        rbrace: Pos,
        incomplete: bool,
    },
    Paren { lparen: Pos, x: ExprId, rparen: Pos },
    Selector { x: ExprId, sel: IdentId },
    Index { x: ExprId, lbrack: Pos, index: ExprId, rbrack: Pos },
    /// `x[a, b, ...]`: instantiation with several type arguments.
    IndexList {
        x: ExprId,
        lbrack: Pos,
        indices: ListRef<ExprId>,
        rbrack: Pos,
    },
    Slice {
        x: ExprId,
        lbrack: Pos,
        low: Option<ExprId>,
        high: Option<ExprId>,
        max: Option<ExprId>,
        slice3: bool,
        rbrack: Pos,
    },
    /// `x.(T)`; `typ` is `None` for `x.(type)`.
    TypeAssert {
        x: ExprId,
        lparen: Pos,
        typ: Option<ExprId>,
        rparen: Pos,
    },
    Call {
        fun: ExprId,
        lparen: Pos,
        args: ListRef<ExprId>,
        /// Position of a trailing `...`, or `Pos::NONE`.
        ellipsis: Pos,
        rparen: Pos,
    },
    /// `*x`: dereference or pointer type.
    Star { star: Pos, x: ExprId },
    Unary { op_pos: Pos, op: Token, x: ExprId },
    Binary { x: ExprId, op_pos: Pos, op: Token, y: ExprId },
    KeyValue { key: ExprId, colon: Pos, value: ExprId },

    /// `[len]elt`; `len` is `None` for slices and an `Ellipsis` for `[...]T`.
    ArrayType {
        lbrack: Pos,
        len: Option<ExprId>,
        elt: ExprId,
    },
    StructType {
        struct_pos: Pos,
        fields: FieldListId,
        incomplete: bool,
    },
    /// `func` position is `Pos::NONE` for method signatures and function declarations parsed without it.
    FuncType {
        func: Pos,
        type_params: Option<FieldListId>,
        params: FieldListId,
        results: Option<FieldListId>,
    },
    InterfaceType {
        interface: Pos,
        methods: FieldListId,
        incomplete: bool,
    },
    MapType { map: Pos, key: ExprId, value: ExprId },
    ChanType {
        begin: Pos,
        /// Position of `<-`, or `Pos::NONE`.
        arrow: Pos,
        dir: ChanDir,
        value: ExprId,
    },
    /// `...T` in parameter lists, or `...` in `[...]T`.
    Ellipsis { ellipsis: Pos, elt: Option<ExprId> },
}

// =============================================================================
// Statements
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct BlockStmt {
    pub lbrace: Pos,
    pub list: ListRef<StmtId>,
    /// May be missing after a syntax error.
    pub rbrace: Pos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum Stmt {
    Bad { from: Pos, to: Pos },
    Decl(DeclId),
    /// `implicit` is set when the `;` was a newline or `}`.
    Empty { semicolon: Pos, implicit: bool },
    Labeled { label: IdentId, colon: Pos, stmt: StmtId },
    Expr { x: ExprId },
    Send { chan: ExprId, arrow: Pos, value: ExprId },
    IncDec { x: ExprId, tok_pos: Pos, tok: Token },
    Assign {
        lhs: ListRef<ExprId>,
        tok_pos: Pos,
        tok: Token,
        rhs: ListRef<ExprId>,
    },
    Go { go: Pos, call: ExprId },
    Defer { defer: Pos, call: ExprId },
    Return { return_pos: Pos, results: ListRef<ExprId> },
    /// `break`, `continue`, `goto` or `fallthrough`.
    Branch {
        tok_pos: Pos,
        tok: Token,
        label: Option<IdentId>,
    },
    Block(BlockStmt),
    If {
        if_pos: Pos,
        init: Option<StmtId>,
        cond: ExprId,
        body: StmtId,
        else_: Option<StmtId>,
    },
    /// `case x, y:` or `default:` (empty `list`).
    CaseClause {
        case: Pos,
        list: ListRef<ExprId>,
        colon: Pos,
        body: ListRef<StmtId>,
    },
    Switch {
        switch: Pos,
        init: Option<StmtId>,
        tag: Option<ExprId>,
        body: StmtId,
    },
    /// `assign` is `x := y.(type)` or the expression statement `y.(type)`.
    TypeSwitch {
        switch: Pos,
        init: Option<StmtId>,
        assign: StmtId,
        body: StmtId,
    },
    /// `comm` is `None` for `default:`.
    CommClause {
        case: Pos,
        comm: Option<StmtId>,
        colon: Pos,
        body: ListRef<StmtId>,
    },
    Select { select: Pos, body: StmtId },
    For {
        for_pos: Pos,
        init: Option<StmtId>,
        cond: Option<ExprId>,
        post: Option<StmtId>,
        body: StmtId,
    },
    /// `tok` is `Token::Illegal` when there is no key (`for range x`).
    Range {
        for_pos: Pos,
        key: Option<ExprId>,
        value: Option<ExprId>,
        tok_pos: Pos,
        tok: Token,
        range: Pos,
        x: ExprId,
        body: StmtId,
    },
}

// =============================================================================
// Specs and declarations
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct ImportSpec {
    pub doc: Option<CommentGroupId>,
    /// Local package name, `.` or `_`.
    pub name: Option<IdentId>,
    /// `BasicLit` string.
    pub path: ExprId,
    pub comment: Option<CommentGroupId>,
    /// End of the spec (overrides `path` end if valid).
    pub end_pos: Pos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct ValueSpec {
    pub doc: Option<CommentGroupId>,
    pub names: ListRef<IdentId>,
    pub typ: Option<ExprId>,
    pub values: ListRef<ExprId>,
    pub comment: Option<CommentGroupId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct TypeSpec {
    pub doc: Option<CommentGroupId>,
    pub name: IdentId,
    pub type_params: Option<FieldListId>,
    /// Position of `=` for aliases, else `Pos::NONE`.
    pub assign: Pos,
    pub typ: ExprId,
    pub comment: Option<CommentGroupId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum Spec {
    Import(ImportSpec),
    Value(ValueSpec),
    Type(TypeSpec),
}

/// `import`, `const`, `type` or `var` declaration.
///
/// `tok` determines the variant of every spec: `Import` under `import`,
/// `Value` under `const`/`var`, `Type` under `type`. A parenthesized group
/// may be empty (`var ()` is valid Go); an ungrouped declaration has exactly
/// one spec and invalid `lparen`/`rparen`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct GenDecl {
    pub doc: Option<CommentGroupId>,
    pub tok_pos: Pos,
    pub tok: Token,
    pub lparen: Pos,
    pub specs: ListRef<SpecId>,
    pub rparen: Pos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct FuncDecl {
    pub doc: Option<CommentGroupId>,
    pub recv: Option<FieldListId>,
    pub name: IdentId,
    /// `FuncType`; its `func` position is the `func` keyword.
    pub typ: ExprId,
    pub body: Option<StmtId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum Decl {
    Bad { from: Pos, to: Pos },
    Gen(GenDecl),
    Func(FuncDecl),
}

// =============================================================================
// Node handle and source ranges
// =============================================================================

/// Handle to any node in an [`AstArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Node {
    Comment(CommentId),
    CommentGroup(CommentGroupId),
    Ident(IdentId),
    Field(FieldId),
    FieldList(FieldListId),
    Expr(ExprId),
    Stmt(StmtId),
    Decl(DeclId),
    Spec(SpecId),
}

impl AstArena {
    /// Start of `node`.
    pub fn pos(&self, node: Node) -> Pos {
        match node {
            Node::Comment(id) => self.comments[id].slash,
            Node::CommentGroup(id) => self
                .list(self.comment_groups[id].list)
                .first()
                .map_or(Pos::NONE, |&c| self.comments[c].slash),
            Node::Ident(id) => self.idents[id].name_pos,
            Node::Field(id) => self.field_pos(id),
            Node::FieldList(id) => self.field_list_pos(id),
            Node::Expr(id) => self.expr_pos(id),
            Node::Stmt(id) => self.stmt_pos(id),
            Node::Decl(id) => self.decl_pos(id),
            Node::Spec(id) => self.spec_pos(id),
        }
    }

    /// Position immediately after `node`.
    pub fn end(&self, node: Node) -> Pos {
        match node {
            Node::Comment(id) => {
                let c = &self.comments[id];
                c.slash + c.text.len()
            }
            Node::CommentGroup(id) => self
                .list(self.comment_groups[id].list)
                .last()
                .map_or(Pos::NONE, |&c| self.end(Node::Comment(c))),
            Node::Ident(id) => self.ident_end(id),
            Node::Field(id) => self.field_end(id),
            Node::FieldList(id) => self.field_list_end(id),
            Node::Expr(id) => self.expr_end(id),
            Node::Stmt(id) => self.stmt_end(id),
            Node::Decl(id) => self.decl_end(id),
            Node::Spec(id) => self.spec_end(id),
        }
    }

    #[inline]
    pub fn ident_end(&self, id: IdentId) -> Pos {
        let ident = &self.idents[id];
        ident.name_pos + self.symbols.resolve(ident.name).len()
    }

    pub fn field_pos(&self, id: FieldId) -> Pos {
        let f = &self.fields[id];
        match self.list(f.names).first() {
            Some(&name) => self.idents[name].name_pos,
            None => self.expr_pos(f.typ),
        }
    }

    pub fn field_end(&self, id: FieldId) -> Pos {
        let f = &self.fields[id];
        match f.tag {
            Some(tag) => self.expr_end(tag),
            None => self.expr_end(f.typ),
        }
    }

    pub fn field_list_pos(&self, id: FieldListId) -> Pos {
        let fl = &self.field_lists[id];
        if fl.opening.is_valid() {
            return fl.opening;
        }
        self.list(fl.list)
            .first()
            .map_or(Pos::NONE, |&f| self.field_pos(f))
    }

    pub fn field_list_end(&self, id: FieldListId) -> Pos {
        let fl = &self.field_lists[id];
        if fl.closing.is_valid() {
            return fl.closing + 1;
        }
        self.list(fl.list)
            .last()
            .map_or(Pos::NONE, |&f| self.field_end(f))
    }

    pub fn expr_pos(&self, id: ExprId) -> Pos {
        match self.exprs[id] {
            Expr::Bad { from, .. } => from,
            Expr::Ident(i) => self.idents[i].name_pos,
            Expr::BasicLit(lit) => lit.value_pos,
            Expr::FuncLit { typ, .. } => self.expr_pos(typ),
            Expr::CompositeLit { typ, lbrace, .. } => typ.map_or(lbrace, |t| self.expr_pos(t)),
            Expr::Paren { lparen, .. } => lparen,
            Expr::Selector { x, .. }
            | Expr::Index { x, .. }
            | Expr::IndexList { x, .. }
            | Expr::Slice { x, .. }
            | Expr::TypeAssert { x, .. }
            | Expr::Binary { x, .. } => self.expr_pos(x),
            Expr::Call { fun, .. } => self.expr_pos(fun),
            Expr::Star { star, .. } => star,
            Expr::Unary { op_pos, .. } => op_pos,
            Expr::KeyValue { key, .. } => self.expr_pos(key),
            Expr::ArrayType { lbrack, .. } => lbrack,
            Expr::StructType { struct_pos, .. } => struct_pos,
            Expr::FuncType { func, params, .. } => {
                if func.is_valid() {
                    func
                } else {
                    self.field_list_pos(params)
                }
            }
            Expr::InterfaceType { interface, .. } => interface,
            Expr::MapType { map, .. } => map,
            Expr::ChanType { begin, .. } => begin,
            Expr::Ellipsis { ellipsis, .. } => ellipsis,
        }
    }

    pub fn expr_end(&self, id: ExprId) -> Pos {
        match self.exprs[id] {
            Expr::Bad { to, .. } => to,
            Expr::Ident(i) => self.ident_end(i),
            Expr::BasicLit(lit) => lit.value_pos + self.lit_value(&lit).len(),
            Expr::FuncLit { body, .. } => self.stmt_end(body),
            Expr::CompositeLit { rbrace, .. } => rbrace + 1,
            Expr::Paren { rparen, .. } => rparen + 1,
            Expr::Selector { sel, .. } => self.ident_end(sel),
            Expr::Index { rbrack, .. }
            | Expr::IndexList { rbrack, .. }
            | Expr::Slice { rbrack, .. } => rbrack + 1,
            Expr::TypeAssert { rparen, .. } | Expr::Call { rparen, .. } => rparen + 1,
            Expr::Star { x, .. } | Expr::Unary { x, .. } => self.expr_end(x),
            Expr::Binary { y, .. } => self.expr_end(y),
            Expr::KeyValue { value, .. } => self.expr_end(value),
            Expr::ArrayType { elt, .. } => self.expr_end(elt),
            Expr::StructType { fields, .. } => self.field_list_end(fields),
            Expr::FuncType {
                params, results, ..
            } => self.field_list_end(results.unwrap_or(params)),
            Expr::InterfaceType { methods, .. } => self.field_list_end(methods),
            Expr::MapType { value, .. } | Expr::ChanType { value, .. } => self.expr_end(value),
            Expr::Ellipsis { ellipsis, elt } => elt.map_or(ellipsis + 3, |e| self.expr_end(e)),
        }
    }

    pub fn stmt_pos(&self, id: StmtId) -> Pos {
        match self.stmts[id] {
            Stmt::Bad { from, .. } => from,
            Stmt::Decl(d) => self.decl_pos(d),
            Stmt::Empty { semicolon, .. } => semicolon,
            Stmt::Labeled { label, .. } => self.idents[label].name_pos,
            Stmt::Expr { x } | Stmt::IncDec { x, .. } => self.expr_pos(x),
            Stmt::Send { chan, .. } => self.expr_pos(chan),
            Stmt::Assign { lhs, tok_pos, .. } => self
                .list(lhs)
                .first()
                .map_or(tok_pos, |&x| self.expr_pos(x)),
            Stmt::Go { go, .. } => go,
            Stmt::Defer { defer, .. } => defer,
            Stmt::Return { return_pos, .. } => return_pos,
            Stmt::Branch { tok_pos, .. } => tok_pos,
            Stmt::Block(b) => b.lbrace,
            Stmt::If { if_pos, .. } => if_pos,
            Stmt::CaseClause { case, .. } | Stmt::CommClause { case, .. } => case,
            Stmt::Switch { switch, .. } | Stmt::TypeSwitch { switch, .. } => switch,
            Stmt::Select { select, .. } => select,
            Stmt::For { for_pos, .. } | Stmt::Range { for_pos, .. } => for_pos,
        }
    }

    pub fn stmt_end(&self, id: StmtId) -> Pos {
        match self.stmts[id] {
            Stmt::Bad { to, .. } => to,
            Stmt::Decl(d) => self.decl_end(d),
            Stmt::Empty {
                semicolon,
                implicit,
            } => {
                if implicit {
                    semicolon
                } else {
                    semicolon + 1
                }
            }
            Stmt::Labeled { stmt, .. } => self.stmt_end(stmt),
            Stmt::Expr { x } => self.expr_end(x),
            Stmt::Send { value, .. } => self.expr_end(value),
            Stmt::IncDec { tok_pos, .. } => tok_pos + 2,
            Stmt::Assign { rhs, tok_pos, tok, .. } => self
                .list(rhs)
                .last()
                .map_or(tok_pos + tok.as_str().len(), |&x| self.expr_end(x)),
            Stmt::Go { call, .. } | Stmt::Defer { call, .. } => self.expr_end(call),
            Stmt::Return {
                return_pos,
                results,
            } => self
                .list(results)
                .last()
                .map_or(return_pos + 6, |&x| self.expr_end(x)),
            Stmt::Branch {
                tok_pos,
                tok,
                label,
            } => label.map_or(tok_pos + tok.as_str().len(), |l| self.ident_end(l)),
            Stmt::Block(b) => {
                if b.rbrace.is_valid() {
                    b.rbrace + 1
                } else {
                    self.list(b.list)
                        .last()
                        .map_or(b.lbrace + 1, |&s| self.stmt_end(s))
                }
            }
            Stmt::If { body, else_, .. } => self.stmt_end(else_.unwrap_or(body)),
            Stmt::CaseClause { colon, body, .. } | Stmt::CommClause { colon, body, .. } => self
                .list(body)
                .last()
                .map_or(colon + 1, |&s| self.stmt_end(s)),
            Stmt::Switch { body, .. }
            | Stmt::TypeSwitch { body, .. }
            | Stmt::Select { body, .. }
            | Stmt::For { body, .. }
            | Stmt::Range { body, .. } => self.stmt_end(body),
        }
    }

    pub fn spec_pos(&self, id: SpecId) -> Pos {
        match &self.specs[id] {
            Spec::Import(s) => match s.name {
                Some(n) => self.idents[n].name_pos,
                None => self.expr_pos(s.path),
            },
            Spec::Value(s) => self
                .list(s.names)
                .first()
                .map_or(Pos::NONE, |&n| self.idents[n].name_pos),
            Spec::Type(s) => self.idents[s.name].name_pos,
        }
    }

    pub fn spec_end(&self, id: SpecId) -> Pos {
        match &self.specs[id] {
            Spec::Import(s) => {
                if s.end_pos.is_valid() {
                    s.end_pos
                } else {
                    self.expr_end(s.path)
                }
            }
            Spec::Value(s) => {
                if let Some(&v) = self.list(s.values).last() {
                    self.expr_end(v)
                } else if let Some(t) = s.typ {
                    self.expr_end(t)
                } else {
                    self.list(s.names)
                        .last()
                        .map_or(Pos::NONE, |&n| self.ident_end(n))
                }
            }
            Spec::Type(s) => self.expr_end(s.typ),
        }
    }

    pub fn decl_pos(&self, id: DeclId) -> Pos {
        match &self.decls[id] {
            Decl::Bad { from, .. } => *from,
            Decl::Gen(g) => g.tok_pos,
            Decl::Func(f) => self.expr_pos(f.typ),
        }
    }

    pub fn decl_end(&self, id: DeclId) -> Pos {
        match &self.decls[id] {
            Decl::Bad { to, .. } => *to,
            Decl::Gen(g) => {
                if g.rparen.is_valid() {
                    g.rparen + 1
                } else {
                    self.list(g.specs)
                        .first()
                        .map_or(g.tok_pos + g.tok.as_str().len(), |&s| self.spec_end(s))
                }
            }
            Decl::Func(f) => match f.body {
                Some(body) => self.stmt_end(body),
                None => self.expr_end(f.typ),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interner_dedups() {
        let mut i = Interner::new();
        let a = i.intern("foo");
        let b = i.intern("bar");
        assert_eq!(i.intern("foo"), a);
        assert_ne!(a, b);
        assert_eq!(i.resolve(b), "bar");
        assert_eq!(i.get("bar"), Some(b));
        assert_eq!(i.get("baz"), None);
    }

    #[test]
    fn binary_span_derives_from_operands() {
        let mut a = AstArena::new();
        let x = a.new_ident(Pos::from_raw(1), "x");
        let y = a.new_ident(Pos::from_raw(5), "yy");
        let xe = a.exprs.alloc(Expr::Ident(x));
        let ye = a.exprs.alloc(Expr::Ident(y));
        let bin = a.exprs.alloc(Expr::Binary {
            x: xe,
            op_pos: Pos::from_raw(3),
            op: Token::Add,
            y: ye,
        });
        assert_eq!(a.pos(Node::Expr(bin)), Pos::from_raw(1));
        assert_eq!(a.end(Node::Expr(bin)), Pos::from_raw(7));
        assert!(!a.is_exported(x));
    }

    #[test]
    fn comment_text_strips_markers() {
        let mut a = AstArena::new();
        let c1 = a.comments.alloc(Comment {
            slash: Pos::from_raw(1),
            text: "// Hello world.".into(),
        });
        let c2 = a.comments.alloc(Comment {
            slash: Pos::from_raw(17),
            text: "/* more\n   text */".into(),
        });
        let list = a.list_comments([c1, c2]);
        let g = a.comment_groups.alloc(CommentGroup { list });
        assert_eq!(a.comment_text(g), "Hello world.\n more\n   text\n");
    }
}
