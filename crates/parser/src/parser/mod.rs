//! Recursive-descent Go parser.
//!
//! One method per production, split by family: `types`, `expr`, `stmt` and
//! `decl`. Parse errors are recorded and followed by resynchronization; only
//! the error ceiling and the nesting ceiling abort the parse, by returning a
//! [`Bailout`] that `?` carries up to the entry point.

mod decl;
mod expr;
mod stmt;
mod types;

use bitflags::bitflags;
use smallvec::SmallVec;
use tracing::trace;

use crate::ast::*;
use crate::constraint;
use crate::error::{Bailout, ErrorList, PResult};
use crate::lexer::{Lexer, ScanMode};
use crate::position::{Pos, PosFile};
use crate::stack::ensure_sufficient_stack;
use crate::token::Token;

bitflags! {
    /// Parser configuration; each option toggles one bit.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Mode: u16 {
        /// Stop after the package clause.
        const PACKAGE_CLAUSE_ONLY = 1 << 0;
        /// Stop after the import declarations.
        const IMPORTS_ONLY = 1 << 1;
        /// Keep comments and attach doc/line comments to nodes.
        const PARSE_COMMENTS = 1 << 2;
        /// Emit a `tracing` event for every production.
        const TRACE = 1 << 3;
        /// Report declaration errors found during object resolution.
        const DECLARATION_ERRORS = 1 << 4;
        /// Report every error: no same-line filtering, no error ceiling.
        const SPURIOUS_ERRORS = 1 << 5;
        /// Do not run the resolver.
        const SKIP_OBJECT_RESOLUTION = 1 << 6;
        /// Report `package _` as an error.
        const BLANK_PACKAGE_NAME_INVALID = 1 << 7;
        const ALL_ERRORS = Self::SPURIOUS_ERRORS.bits();
    }
}

/// Distinct-line errors recorded before the parse is abandoned.
pub const MAX_ERRORS: usize = 10;

/// Deepest syntactic nesting accepted before the parse is abandoned.
pub const MAX_NEST_LEV: usize = 100_000;

/// Tokens that may start a statement; a recovery point inside blocks.
fn stmt_start(tok: Token) -> bool {
    use Token::*;
    matches!(
        tok,
        Break | Const | Continue | Defer | Fallthrough | For | Go | Goto | If | Return | Select | Switch | Type | Var
    )
}

/// Tokens that start a top-level declaration.
fn decl_start(tok: Token) -> bool {
    matches!(tok, Token::Import | Token::Const | Token::Type | Token::Var)
}

/// Tokens that end an expression.
fn expr_end(tok: Token) -> bool {
    use Token::*;
    matches!(tok, Comma | Colon | Semicolon | RParen | RBrack | RBrace)
}

/// Temporary list storage while a production is being built.
type Items<T> = SmallVec<[T; 8]>;

pub(crate) struct Parser<'src> {
    pub(crate) file: PosFile,
    pub(crate) errors: ErrorList,
    lexer: Lexer<'src>,
    mode: Mode,
    indent: usize,

    pub(crate) a: AstArena,
    comments: Vec<CommentGroupId>,
    lead_comment: Option<CommentGroupId>,
    line_comment: Option<CommentGroupId>,
    /// Still before the first non-comment token.
    top: bool,
    go_version: Option<String>,

    pos: Pos,
    tok: Token,
    lit: &'src str,

    sync_pos: Pos,
    sync_cnt: usize,

    /// < 0 in control clauses, >= 0 in expressions.
    expr_lev: i32,
    /// Parsing the right-hand side of an assignment or similar.
    in_rhs: bool,
    imports: Vec<SpecId>,
    nest_lev: usize,
}

impl<'src> Parser<'src> {
    pub(crate) fn new(filename: &str, src: &'src str, mode: Mode) -> Self {
        let file = PosFile::new(filename, 1, src);
        let mut p = Parser {
            lexer: Lexer::with_mode(src, file.base(), ScanMode::COMMENTS),
            file,
            errors: ErrorList::new(),
            mode,
            indent: 0,
            a: AstArena::new(),
            comments: Vec::new(),
            lead_comment: None,
            line_comment: None,
            top: true,
            go_version: None,
            pos: Pos::NONE,
            tok: Token::Illegal,
            lit: "",
            sync_pos: Pos::NONE,
            sync_cnt: 0,
            expr_lev: 0,
            in_rhs: false,
            imports: Vec::new(),
            nest_lev: 0,
        };
        p.next();
        p
    }

    // ---------------------------------------------------------------------
    // Tracing

    #[inline]
    fn tracing(&self) -> bool {
        self.mode.contains(Mode::TRACE)
    }

    fn trace_line(&self, what: &str) {
        let pos = self.file.position(self.pos);
        trace!(target: "go_syntax::parser", "{:5}:{:3}: {}{}", pos.line, pos.column, ". ".repeat(self.indent), what);
    }

    /// Runs one production, bracketing it with trace events in `TRACE` mode.
    #[inline]
    fn traced<T>(&mut self, name: &'static str, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        if !self.tracing() {
            return f(self);
        }
        self.trace_line(&format!("{name} ("));
        self.indent += 1;
        let r = f(self);
        self.indent -= 1;
        self.trace_line(")");
        r
    }

    // ---------------------------------------------------------------------
    // Nesting

    fn inc_nest_lev(&mut self) -> PResult<()> {
        self.nest_lev += 1;
        if self.nest_lev > MAX_NEST_LEV {
            self.error(self.pos, "exceeded max nesting depth")?;
            return Err(Bailout {
                pos: self.pos,
                msg: "",
            });
        }
        Ok(())
    }

    /// Runs a production that counts toward the nesting ceiling.
    #[inline]
    fn nested<T>(&mut self, name: &'static str, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        self.inc_nest_lev()?;
        let r = ensure_sufficient_stack(|| self.traced(name, f));
        self.nest_lev -= 1;
        r
    }

    // ---------------------------------------------------------------------
    // Scanning

    /// Advances to the next token, recording comments but not grouping them.
    fn next0(&mut self) {
        if self.tracing() && self.pos.is_valid() {
            let s = self.tok.as_str();
            if self.tok.is_literal() {
                self.trace_line(&format!("{s} {}", self.lit));
            } else if self.tok.is_operator() || self.tok.is_keyword() {
                self.trace_line(&format!("\"{s}\""));
            } else {
                self.trace_line(s);
            }
        }

        loop {
            let (pos, tok, lit) = self.lexer.next_token();
            for e in self.lexer.take_errors() {
                let epos = self.file.position(e.pos);
                self.errors.add(epos, e.kind.to_string());
            }
            self.pos = pos;
            self.tok = tok;
            self.lit = lit;
            if tok == Token::Comment {
                if self.top && lit.starts_with("//go:build") {
                    if let Ok(x) = constraint::parse(lit) {
                        self.go_version = constraint::go_version(&x);
                    }
                }
                if !self.mode.contains(Mode::PARSE_COMMENTS) {
                    continue;
                }
            } else {
                self.top = false;
            }
            break;
        }
    }

    /// Consumes one comment; returns it with the line its text ends on.
    fn consume_comment(&mut self) -> (CommentId, usize) {
        let mut endline = self.file.line(self.pos);
        if self.lit.as_bytes().get(1) == Some(&b'*') {
            endline += memchr::memchr_iter(b'\n', self.lit.as_bytes()).count();
        }
        let id = self.a.comments.alloc(Comment {
            slash: self.pos,
            text: self.lit.into(),
        });
        self.next0();
        (id, endline)
    }

    /// Consumes comments that are at most `n` lines apart into one group.
    fn consume_comment_group(&mut self, n: usize) -> (CommentGroupId, usize) {
        let mut list: Items<CommentId> = SmallVec::new();
        let mut endline = self.file.line(self.pos);
        while self.tok == Token::Comment && self.file.line(self.pos) <= endline + n {
            let (c, end) = self.consume_comment();
            list.push(c);
            endline = end;
        }
        let list = self.a.list_comments(list);
        let group = self.a.comment_groups.alloc(CommentGroup { list });
        self.comments.push(group);
        (group, endline)
    }

    /// Advances to the next non-comment token.
    ///
    /// A comment group on the same line as the previous token, with nothing
    /// after it on that line, becomes the line comment. The last group that
    /// ends on the line right before the next token becomes the lead comment.
    fn next(&mut self) {
        self.lead_comment = None;
        self.line_comment = None;
        let prev = self.pos;
        self.next0();

        if self.tok == Token::Comment {
            let mut comment = None;
            if self.file.line(self.pos) == self.file.line(prev) {
                let (group, endline) = self.consume_comment_group(0);
                if self.file.line(self.pos) != endline || matches!(self.tok, Token::Semicolon | Token::Eof) {
                    self.line_comment = Some(group);
                }
                comment = Some(group);
            }

            let mut endline: Option<usize> = None;
            while self.tok == Token::Comment {
                let (group, end) = self.consume_comment_group(1);
                comment = Some(group);
                endline = Some(end);
            }

            if let Some(end) = endline {
                if end + 1 == self.file.line(self.pos) {
                    self.lead_comment = comment;
                }
            }
        }
    }

    // ---------------------------------------------------------------------
    // Errors

    pub(crate) fn error(&mut self, pos: Pos, msg: impl Into<String>) -> PResult<()> {
        let msg = msg.into();
        if self.tracing() {
            self.trace_line(&format!("error: {msg}"));
        }
        let epos = self.file.position(pos);
        if !self.mode.contains(Mode::ALL_ERRORS) {
            if self.errors.last().is_some_and(|e| e.pos.line == epos.line) {
                return Ok(());
            }
            if self.errors.len() >= MAX_ERRORS {
                return Err(Bailout { pos, msg: "" });
            }
        }
        self.errors.add(epos, msg);
        Ok(())
    }

    fn error_expected(&mut self, pos: Pos, what: &str) -> PResult<()> {
        let mut msg = format!("expected {what}");
        if pos == self.pos {
            if self.tok == Token::Semicolon && self.lit == "\n" {
                msg.push_str(", found newline");
            } else if self.tok.is_literal() {
                msg.push_str(", found ");
                msg.push_str(self.lit);
            } else {
                msg.push_str(&format!(", found '{}'", self.tok));
            }
        }
        self.error(pos, msg)
    }

    fn expect(&mut self, tok: Token) -> PResult<Pos> {
        let pos = self.pos;
        if self.tok != tok {
            self.error_expected(pos, &format!("'{tok}'"))?;
        }
        self.next();
        Ok(pos)
    }

    /// Like `expect`, but yields `Pos::NONE` if `tok` is missing.
    fn expect2(&mut self, tok: Token) -> PResult<Pos> {
        let pos = if self.tok == tok {
            self.pos
        } else {
            self.error_expected(self.pos, &format!("'{tok}'"))?;
            Pos::NONE
        };
        self.next();
        Ok(pos)
    }

    /// Like `expect`, with a clearer message for a missing comma before a newline.
    fn expect_closing(&mut self, tok: Token, context: &str) -> PResult<Pos> {
        if self.tok != tok && self.tok == Token::Semicolon && self.lit == "\n" {
            self.error(self.pos, format!("missing ',' before newline in {context}"))?;
            self.next();
        }
        self.expect(tok)
    }

    /// Consumes a statement terminator and returns the applicable line comment.
    fn expect_semi(&mut self) -> PResult<Option<CommentGroupId>> {
        if matches!(self.tok, Token::RParen | Token::RBrace) {
            return Ok(None);
        }
        match self.tok {
            Token::Comma | Token::Semicolon => {
                if self.tok == Token::Comma {
                    self.error_expected(self.pos, "';'")?;
                }
                // The lexer yields a line-ending comment after the
                // terminator, automatic or not.
                self.next();
                Ok(self.line_comment)
            }
            _ => {
                self.error_expected(self.pos, "';'")?;
                self.advance(stmt_start)?;
                Ok(None)
            }
        }
    }

    /// Whether a list continues: true at `,`, and also (after an error) when
    /// neither `,` nor `follow` is next.
    fn at_comma(&mut self, context: &str, follow: Token) -> PResult<bool> {
        if self.tok == Token::Comma {
            return Ok(true);
        }
        if self.tok != follow {
            let mut msg = String::from("missing ','");
            if self.tok == Token::Semicolon && self.lit == "\n" {
                msg.push_str(" before newline");
            }
            self.error(self.pos, format!("{msg} in {context}"))?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Skips tokens until one in `to` (or EOF).
    ///
    /// Stops in place at most ten times at the same sync position; after
    /// that at least one token is consumed so recovery always progresses.
    fn advance(&mut self, to: fn(Token) -> bool) -> PResult<()> {
        while self.tok != Token::Eof {
            if to(self.tok) {
                if self.pos == self.sync_pos && self.sync_cnt < 10 {
                    self.sync_cnt += 1;
                    return Ok(());
                }
                if self.pos > self.sync_pos {
                    self.sync_pos = self.pos;
                    self.sync_cnt = 0;
                    return Ok(());
                }
            }
            self.next();
        }
        Ok(())
    }

    /// `pos` if it lies within the file, else the end-of-file position.
    fn safe_pos(&self, pos: Pos) -> Pos {
        let end = self.file.pos(self.file.size());
        if pos.raw() < self.file.base() || pos > end {
            end
        } else {
            pos
        }
    }

    // ---------------------------------------------------------------------
    // Node helpers

    #[inline]
    fn alloc_expr(&mut self, e: Expr) -> ExprId {
        self.a.exprs.alloc(e)
    }

    #[inline]
    fn alloc_stmt(&mut self, s: Stmt) -> StmtId {
        self.a.stmts.alloc(s)
    }

    fn bad_expr(&mut self, from: Pos, to: Pos) -> ExprId {
        self.alloc_expr(Expr::Bad { from, to })
    }

    fn ident_expr(&mut self, id: IdentId) -> ExprId {
        self.alloc_expr(Expr::Ident(id))
    }

    /// The identifier behind an expression, if it is one.
    fn as_ident(&self, x: ExprId) -> Option<IdentId> {
        match self.a.exprs[x] {
            Expr::Ident(i) => Some(i),
            _ => None,
        }
    }

    fn field_list(&mut self, opening: Pos, fields: Items<FieldId>, closing: Pos) -> FieldListId {
        let list = self.a.list_fields(fields);
        self.a.field_lists.alloc(FieldList { opening, list, closing })
    }

    fn anon_field(&mut self, typ: ExprId, comment: Option<CommentGroupId>) -> FieldId {
        self.a.fields.alloc(Field {
            doc: None,
            names: ListRef::EMPTY,
            typ,
            tag: None,
            comment,
        })
    }

    // ---------------------------------------------------------------------
    // Identifiers

    fn parse_ident(&mut self) -> PResult<IdentId> {
        let pos = self.pos;
        if self.tok == Token::Ident {
            let id = self.a.new_ident(pos, self.lit);
            self.next();
            return Ok(id);
        }
        self.expect(Token::Ident)?;
        Ok(self.a.new_ident(pos, "_"))
    }

    fn parse_ident_list(&mut self) -> PResult<ListRef<IdentId>> {
        self.traced("IdentList", |p| {
            let mut list: Items<IdentId> = SmallVec::new();
            list.push(p.parse_ident()?);
            while p.tok == Token::Comma {
                p.next();
                list.push(p.parse_ident()?);
            }
            Ok(p.a.list_idents(list))
        })
    }
}

/// Parses `src` as one expression.
pub(crate) fn parse_expr_in(p: &mut Parser<'_>) -> PResult<ExprId> {
    let x = p.parse_rhs()?;
    // A trailing newline was turned into a semicolon; anything else is extra.
    if p.tok == Token::Semicolon && p.lit == "\n" {
        p.next();
    }
    p.expect(Token::Eof)?;
    Ok(x)
}
