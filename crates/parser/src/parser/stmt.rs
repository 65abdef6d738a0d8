//! Statements and blocks.

use smallvec::SmallVec;

use super::{Items, Parser, stmt_start};
use crate::ast::*;
use crate::error::PResult;
use crate::position::Pos;
use crate::token::Token;

/// Whether `parse_simple_stmt` may accept a labeled statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SimpleMode {
    Basic,
    LabelOk,
}

/// `lhs := range x`, `lhs = range x` or `range x`, before the loop body is known.
struct RangeClause {
    lhs: Items<ExprId>,
    tok_pos: Pos,
    tok: Token,
    range: Pos,
    x: ExprId,
}

/// What may follow `for`: a simple statement or a range clause.
enum ForHeader {
    Stmt(StmtId),
    Range(RangeClause),
}

fn is_assign_op(tok: Token) -> bool {
    use Token::*;
    matches!(
        tok,
        Define
            | Assign
            | AddAssign
            | SubAssign
            | MulAssign
            | QuoAssign
            | RemAssign
            | AndAssign
            | OrAssign
            | XorAssign
            | ShlAssign
            | ShrAssign
            | AndNotAssign
    )
}

impl<'src> Parser<'src> {
    fn parse_simple_stmt(&mut self, mode: SimpleMode) -> PResult<StmtId> {
        self.traced("SimpleStmt", |p| {
            let x = p.parse_list(false)?;
            if is_assign_op(p.tok) {
                let (tok_pos, tok) = (p.pos, p.tok);
                p.next();
                return p.parse_assign_rhs(x, tok_pos, tok);
            }
            p.finish_simple_stmt(x, mode)
        })
    }

    /// The statement after `for` when it does not start with `range`.
    fn parse_for_header(&mut self) -> PResult<ForHeader> {
        self.traced("SimpleStmt", |p| {
            let x = p.parse_list(false)?;
            if !is_assign_op(p.tok) {
                return Ok(ForHeader::Stmt(p.finish_simple_stmt(x, SimpleMode::Basic)?));
            }
            let (tok_pos, tok) = (p.pos, p.tok);
            p.next();
            if p.tok == Token::Range && matches!(tok, Token::Define | Token::Assign) {
                let range = p.pos;
                p.next();
                let y = p.parse_rhs()?;
                return Ok(ForHeader::Range(RangeClause {
                    lhs: x,
                    tok_pos,
                    tok,
                    range,
                    x: y,
                }));
            }
            Ok(ForHeader::Stmt(p.parse_assign_rhs(x, tok_pos, tok)?))
        })
    }

    /// The right-hand side of an assignment whose operator was just consumed.
    fn parse_assign_rhs(&mut self, x: Items<ExprId>, tok_pos: Pos, tok: Token) -> PResult<StmtId> {
        let y = self.parse_list(true)?;
        let lhs = self.a.list_exprs(x);
        let rhs = self.a.list_exprs(y);
        Ok(self.alloc_stmt(Stmt::Assign {
            lhs,
            tok_pos,
            tok,
            rhs,
        }))
    }

    /// A simple statement other than an assignment, given its leading list.
    fn finish_simple_stmt(&mut self, x: Items<ExprId>, mode: SimpleMode) -> PResult<StmtId> {
        let x0 = x[0];
        if x.len() > 1 {
            // Continue with the first expression.
            let pos = self.a.expr_pos(x0);
            self.error_expected(pos, "1 expression")?;
        }

        let s = match self.tok {
            Token::Colon => {
                let colon = self.pos;
                self.next();
                match self.as_ident(x0) {
                    Some(label) if mode == SimpleMode::LabelOk => {
                        // The label's scope is the enclosing function body.
                        let stmt = self.parse_stmt()?;
                        self.alloc_stmt(Stmt::Labeled { label, colon, stmt })
                    }
                    _ => {
                        // Reported at the colon: the token that made the
                        // label illegal may sit anywhere before it.
                        self.error(colon, "illegal label declaration")?;
                        let from = self.a.expr_pos(x0);
                        self.alloc_stmt(Stmt::Bad { from, to: colon + 1 })
                    }
                }
            }
            Token::Arrow => {
                let arrow = self.pos;
                self.next();
                let value = self.parse_rhs()?;
                self.alloc_stmt(Stmt::Send {
                    chan: x0,
                    arrow,
                    value,
                })
            }
            Token::Inc | Token::Dec => {
                let s = Stmt::IncDec {
                    x: x0,
                    tok_pos: self.pos,
                    tok: self.tok,
                };
                self.next();
                self.alloc_stmt(s)
            }
            _ => self.alloc_stmt(Stmt::Expr { x: x0 }),
        };
        Ok(s)
    }

    /// The expression of an expression statement; anything else is an error.
    fn make_expr(&mut self, s: Option<StmtId>, want: &str) -> PResult<Option<ExprId>> {
        let Some(s) = s else {
            return Ok(None);
        };
        let found = match self.a.stmts[s] {
            Stmt::Expr { x } => return Ok(Some(x)),
            Stmt::Assign { .. } => "assignment",
            _ => "simple statement",
        };
        let pos = self.a.stmt_pos(s);
        self.error(
            pos,
            format!("expected {want}, found {found} (missing parentheses around composite literal?)"),
        )?;
        let to = self.safe_pos(self.a.stmt_end(s));
        Ok(Some(self.bad_expr(pos, to)))
    }

    fn parse_call_expr(&mut self, call_type: &str) -> PResult<Option<ExprId>> {
        self.traced("CallExpr", |p| {
            // Could be a conversion: (some type)(x)
            let mut x = p.parse_rhs()?;
            let t = p.a.unparen(x);
            if t != x {
                let pos = p.a.expr_pos(x);
                p.error(pos, format!("expression in {call_type} must not be parenthesized"))?;
                x = t;
            }
            match p.a.exprs[x] {
                Expr::Call { .. } => Ok(Some(x)),
                // Already reported.
                Expr::Bad { .. } => Ok(None),
                _ => {
                    let pos = p.safe_pos(p.a.expr_end(x));
                    p.error(pos, format!("expression in {call_type} must be function call"))?;
                    Ok(None)
                }
            }
        })
    }

    fn parse_go_stmt(&mut self) -> PResult<StmtId> {
        self.traced("GoStmt", |p| {
            let go = p.expect(Token::Go)?;
            let call = p.parse_call_expr("go")?;
            p.expect_semi()?;
            Ok(match call {
                Some(call) => p.alloc_stmt(Stmt::Go { go, call }),
                None => p.alloc_stmt(Stmt::Bad { from: go, to: go + 2 }),
            })
        })
    }

    fn parse_defer_stmt(&mut self) -> PResult<StmtId> {
        self.traced("DeferStmt", |p| {
            let defer = p.expect(Token::Defer)?;
            let call = p.parse_call_expr("defer")?;
            p.expect_semi()?;
            Ok(match call {
                Some(call) => p.alloc_stmt(Stmt::Defer { defer, call }),
                None => p.alloc_stmt(Stmt::Bad {
                    from: defer,
                    to: defer + 5,
                }),
            })
        })
    }

    fn parse_return_stmt(&mut self) -> PResult<StmtId> {
        self.traced("ReturnStmt", |p| {
            let return_pos = p.pos;
            p.expect(Token::Return)?;
            let mut x: Items<ExprId> = SmallVec::new();
            if p.tok != Token::Semicolon && p.tok != Token::RBrace {
                x = p.parse_list(true)?;
            }
            p.expect_semi()?;
            let results = p.a.list_exprs(x);
            Ok(p.alloc_stmt(Stmt::Return { return_pos, results }))
        })
    }

    fn parse_branch_stmt(&mut self, tok: Token) -> PResult<StmtId> {
        self.traced("BranchStmt", |p| {
            let tok_pos = p.expect(tok)?;
            let mut label = None;
            if tok != Token::Fallthrough && p.tok == Token::Ident {
                label = Some(p.parse_ident()?);
            }
            p.expect_semi()?;
            Ok(p.alloc_stmt(Stmt::Branch { tok_pos, tok, label }))
        })
    }

    fn parse_if_header(&mut self) -> PResult<(Option<StmtId>, ExprId)> {
        if self.tok == Token::LBrace {
            self.error(self.pos, "missing condition in if statement")?;
            return Ok((None, self.bad_expr(self.pos, self.pos)));
        }

        let prev_lev = self.expr_lev;
        self.expr_lev = -1;

        let mut init = None;
        if self.tok != Token::Semicolon {
            // Accept a variable declaration, but complain.
            if self.tok == Token::Var {
                self.next();
                self.error(self.pos, "var declaration not allowed in if initializer")?;
            }
            init = Some(self.parse_simple_stmt(SimpleMode::Basic)?);
        }

        let mut cond_stmt = None;
        // Position and literal of the semicolon after the init statement.
        let mut semi: Option<(Pos, &str)> = None;
        if self.tok != Token::LBrace {
            if self.tok == Token::Semicolon {
                semi = Some((self.pos, self.lit));
                self.next();
            } else {
                self.expect(Token::Semicolon)?;
            }
            if self.tok != Token::LBrace {
                cond_stmt = Some(self.parse_simple_stmt(SimpleMode::Basic)?);
            }
        } else {
            cond_stmt = init.take();
        }

        let mut cond = None;
        if cond_stmt.is_some() {
            cond = self.make_expr(cond_stmt, "boolean expression")?;
        } else if let Some((pos, lit)) = semi {
            if lit == "\n" {
                self.error(pos, "unexpected newline, expecting { after if clause")?;
            } else {
                self.error(pos, "missing condition in if statement")?;
            }
        }

        let cond = match cond {
            Some(c) => c,
            None => self.bad_expr(self.pos, self.pos),
        };
        self.expr_lev = prev_lev;
        Ok((init, cond))
    }

    fn parse_if_stmt(&mut self) -> PResult<StmtId> {
        self.nested("IfStmt", |p| {
            let if_pos = p.expect(Token::If)?;
            let (init, cond) = p.parse_if_header()?;
            let body = p.parse_block_stmt()?;

            let mut else_ = None;
            if p.tok == Token::Else {
                p.next();
                match p.tok {
                    Token::If => else_ = Some(p.parse_if_stmt()?),
                    Token::LBrace => {
                        else_ = Some(p.parse_block_stmt()?);
                        p.expect_semi()?;
                    }
                    _ => {
                        p.error_expected(p.pos, "if statement or block")?;
                        else_ = Some(p.alloc_stmt(Stmt::Bad {
                            from: p.pos,
                            to: p.pos,
                        }));
                    }
                }
            } else {
                p.expect_semi()?;
            }

            Ok(p.alloc_stmt(Stmt::If {
                if_pos,
                init,
                cond,
                body,
                else_,
            }))
        })
    }

    fn parse_type_list(&mut self) -> PResult<Items<ExprId>> {
        self.traced("TypeList", |p| {
            let mut list: Items<ExprId> = SmallVec::new();
            list.push(p.parse_type()?);
            while p.tok == Token::Comma {
                p.next();
                list.push(p.parse_type()?);
            }
            Ok(list)
        })
    }

    fn parse_case_clause(&mut self, type_switch: bool) -> PResult<StmtId> {
        self.traced("CaseClause", |p| {
            let case = p.pos;
            let mut list: Items<ExprId> = SmallVec::new();
            if p.tok == Token::Case {
                p.next();
                list = if type_switch {
                    p.parse_type_list()?
                } else {
                    p.parse_list(true)?
                };
            } else {
                p.expect(Token::Default)?;
            }
            let colon = p.expect(Token::Colon)?;
            let body = p.parse_stmt_list()?;
            let list = p.a.list_exprs(list);
            let body = p.a.list_stmts(body);
            Ok(p.alloc_stmt(Stmt::CaseClause {
                case,
                list,
                colon,
                body,
            }))
        })
    }

    fn is_type_switch_assert(&self, x: ExprId) -> bool {
        matches!(self.a.exprs[x], Expr::TypeAssert { typ: None, .. })
    }

    /// `x.(type)` or `v := x.(type)`; `v = x.(type)` is accepted with an error.
    fn is_type_switch_guard(&mut self, s: Option<StmtId>) -> PResult<bool> {
        let Some(s) = s else {
            return Ok(false);
        };
        match self.a.stmts[s] {
            Stmt::Expr { x } => Ok(self.is_type_switch_assert(x)),
            Stmt::Assign { lhs, tok_pos, tok, rhs } => {
                let (lhs, rhs) = (self.a.list(lhs), self.a.list(rhs));
                if lhs.len() != 1 || rhs.len() != 1 || !self.is_type_switch_assert(rhs[0]) {
                    return Ok(false);
                }
                match tok {
                    Token::Define => Ok(true),
                    Token::Assign => {
                        self.error(tok_pos, "expected ':=', found '='")?;
                        Ok(true)
                    }
                    _ => Ok(false),
                }
            }
            _ => Ok(false),
        }
    }

    fn parse_switch_stmt(&mut self) -> PResult<StmtId> {
        self.traced("SwitchStmt", |p| {
            let switch = p.expect(Token::Switch)?;
            let (mut s1, mut s2) = (None, None);
            if p.tok != Token::LBrace {
                let prev_lev = p.expr_lev;
                p.expr_lev = -1;
                if p.tok != Token::Semicolon {
                    s2 = Some(p.parse_simple_stmt(SimpleMode::Basic)?);
                }
                if p.tok == Token::Semicolon {
                    p.next();
                    s1 = s2.take();
                    if p.tok != Token::LBrace {
                        // A type switch guard may declare a variable in
                        // addition to one declared by the init statement:
                        //
                        //	switch t := 0; t := x.(T) { ... }
                        s2 = Some(p.parse_simple_stmt(SimpleMode::Basic)?);
                    }
                }
                p.expr_lev = prev_lev;
            }

            let type_switch = p.is_type_switch_guard(s2)?;
            let lbrace = p.expect(Token::LBrace)?;
            let mut list: Items<StmtId> = SmallVec::new();
            while matches!(p.tok, Token::Case | Token::Default) {
                list.push(p.parse_case_clause(type_switch)?);
            }
            let rbrace = p.expect(Token::RBrace)?;
            p.expect_semi()?;
            let list = p.a.list_stmts(list);
            let body = p.alloc_stmt(Stmt::Block(BlockStmt { lbrace, list, rbrace }));

            if type_switch {
                if let Some(assign) = s2 {
                    return Ok(p.alloc_stmt(Stmt::TypeSwitch {
                        switch,
                        init: s1,
                        assign,
                        body,
                    }));
                }
            }
            let tag = p.make_expr(s2, "switch expression")?;
            Ok(p.alloc_stmt(Stmt::Switch {
                switch,
                init: s1,
                tag,
                body,
            }))
        })
    }

    fn parse_comm_clause(&mut self) -> PResult<StmtId> {
        self.traced("CommClause", |p| {
            let case = p.pos;
            let mut comm = None;
            if p.tok == Token::Case {
                p.next();
                let mut lhs = p.parse_list(false)?;
                let lhs0 = lhs[0];
                if p.tok == Token::Arrow {
                    // send
                    if lhs.len() > 1 {
                        let pos = p.a.expr_pos(lhs0);
                        p.error_expected(pos, "1 expression")?;
                    }
                    let arrow = p.pos;
                    p.next();
                    let value = p.parse_rhs()?;
                    comm = Some(p.alloc_stmt(Stmt::Send {
                        chan: lhs0,
                        arrow,
                        value,
                    }));
                } else if matches!(p.tok, Token::Assign | Token::Define) {
                    // receive with assignment
                    let tok = p.tok;
                    if lhs.len() > 2 {
                        let pos = p.a.expr_pos(lhs0);
                        p.error_expected(pos, "1 or 2 expressions")?;
                        lhs.truncate(2);
                    }
                    let tok_pos = p.pos;
                    p.next();
                    let rhs = p.parse_rhs()?;
                    let lhs = p.a.list_exprs(lhs);
                    let rhs = p.a.list_exprs([rhs]);
                    comm = Some(p.alloc_stmt(Stmt::Assign {
                        lhs,
                        tok_pos,
                        tok,
                        rhs,
                    }));
                } else {
                    // a single receive operation
                    if lhs.len() > 1 {
                        let pos = p.a.expr_pos(lhs0);
                        p.error_expected(pos, "1 expression")?;
                    }
                    comm = Some(p.alloc_stmt(Stmt::Expr { x: lhs0 }));
                }
            } else {
                p.expect(Token::Default)?;
            }

            let colon = p.expect(Token::Colon)?;
            let body = p.parse_stmt_list()?;
            let body = p.a.list_stmts(body);
            Ok(p.alloc_stmt(Stmt::CommClause {
                case,
                comm,
                colon,
                body,
            }))
        })
    }

    fn parse_select_stmt(&mut self) -> PResult<StmtId> {
        self.traced("SelectStmt", |p| {
            let select = p.expect(Token::Select)?;
            let lbrace = p.expect(Token::LBrace)?;
            let mut list: Items<StmtId> = SmallVec::new();
            while matches!(p.tok, Token::Case | Token::Default) {
                list.push(p.parse_comm_clause()?);
            }
            let rbrace = p.expect(Token::RBrace)?;
            p.expect_semi()?;
            let list = p.a.list_stmts(list);
            let body = p.alloc_stmt(Stmt::Block(BlockStmt { lbrace, list, rbrace }));
            Ok(p.alloc_stmt(Stmt::Select { select, body }))
        })
    }

    fn parse_for_stmt(&mut self) -> PResult<StmtId> {
        self.traced("ForStmt", |p| {
            let for_pos = p.expect(Token::For)?;
            let (mut s1, mut s2, mut s3) = (None, None, None);
            let mut range = None;

            if p.tok != Token::LBrace {
                let prev_lev = p.expr_lev;
                p.expr_lev = -1;
                if p.tok != Token::Semicolon {
                    if p.tok == Token::Range {
                        // for range x
                        let range_pos = p.pos;
                        p.next();
                        let x = p.parse_rhs()?;
                        range = Some(RangeClause {
                            lhs: SmallVec::new(),
                            tok_pos: Pos::NONE,
                            tok: Token::Illegal,
                            range: range_pos,
                            x,
                        });
                    } else {
                        match p.parse_for_header()? {
                            ForHeader::Stmt(s) => s2 = Some(s),
                            ForHeader::Range(r) => range = Some(r),
                        }
                    }
                }
                if range.is_none() && p.tok == Token::Semicolon {
                    p.next();
                    s1 = s2.take();
                    if p.tok != Token::Semicolon {
                        s2 = Some(p.parse_simple_stmt(SimpleMode::Basic)?);
                    }
                    p.expect_semi()?;
                    if p.tok != Token::LBrace {
                        s3 = Some(p.parse_simple_stmt(SimpleMode::Basic)?);
                    }
                }
                p.expr_lev = prev_lev;
            }

            let body = p.parse_block_stmt()?;
            p.expect_semi()?;

            if let Some(r) = range {
                let (key, value) = match r.lhs.as_slice() {
                    [] => (None, None),
                    [k] => (Some(*k), None),
                    [k, v] => (Some(*k), Some(*v)),
                    [.., last] => {
                        let pos = p.a.expr_pos(*last);
                        p.error_expected(pos, "at most 2 expressions")?;
                        let to = p.safe_pos(p.a.stmt_end(body));
                        return Ok(p.alloc_stmt(Stmt::Bad { from: for_pos, to }));
                    }
                };
                return Ok(p.alloc_stmt(Stmt::Range {
                    for_pos,
                    key,
                    value,
                    tok_pos: r.tok_pos,
                    tok: r.tok,
                    range: r.range,
                    x: r.x,
                    body,
                }));
            }

            let cond = p.make_expr(s2, "boolean or range expression")?;
            Ok(p.alloc_stmt(Stmt::For {
                for_pos,
                init: s1,
                cond,
                post: s3,
                body,
            }))
        })
    }

    pub(super) fn parse_stmt(&mut self) -> PResult<StmtId> {
        self.nested("Statement", |p| {
            use Token::*;
            let s = match p.tok {
                Const | Type | Var => {
                    let decl = p.parse_decl(stmt_start)?;
                    p.alloc_stmt(Stmt::Decl(decl))
                }
                // operands, composite types and unary operators
                Ident | Int | Float | Imag | Char | String | Func | LParen | LBrack | Struct | Map | Chan
                | Interface | Add | Sub | Mul | And | Xor | Arrow | Not => {
                    let s = p.parse_simple_stmt(SimpleMode::LabelOk)?;
                    // A labeled statement already consumed its terminator.
                    if !matches!(p.a.stmts[s], Stmt::Labeled { .. }) {
                        p.expect_semi()?;
                    }
                    s
                }
                Go => p.parse_go_stmt()?,
                Defer => p.parse_defer_stmt()?,
                Return => p.parse_return_stmt()?,
                Break | Continue | Goto | Fallthrough => p.parse_branch_stmt(p.tok)?,
                LBrace => {
                    let s = p.parse_block_stmt()?;
                    p.expect_semi()?;
                    s
                }
                If => p.parse_if_stmt()?,
                Switch => p.parse_switch_stmt()?,
                Select => p.parse_select_stmt()?,
                For => p.parse_for_stmt()?,
                Semicolon => {
                    let s = Stmt::Empty {
                        semicolon: p.pos,
                        implicit: p.lit == "\n",
                    };
                    p.next();
                    p.alloc_stmt(s)
                }
                // A semicolon may be omitted before a closing "}".
                RBrace => p.alloc_stmt(Stmt::Empty {
                    semicolon: p.pos,
                    implicit: true,
                }),
                _ => {
                    let pos = p.pos;
                    p.error_expected(pos, "statement")?;
                    p.advance(stmt_start)?;
                    p.alloc_stmt(Stmt::Bad { from: pos, to: p.pos })
                }
            };
            Ok(s)
        })
    }

    pub(super) fn parse_stmt_list(&mut self) -> PResult<Items<StmtId>> {
        self.traced("StatementList", |p| {
            let mut list: Items<StmtId> = SmallVec::new();
            while !matches!(p.tok, Token::Case | Token::Default | Token::RBrace | Token::Eof) {
                list.push(p.parse_stmt()?);
            }
            Ok(list)
        })
    }

    /// A function body.
    pub(super) fn parse_body(&mut self) -> PResult<StmtId> {
        self.traced("Body", |p| p.parse_braced_stmts())
    }

    pub(super) fn parse_block_stmt(&mut self) -> PResult<StmtId> {
        self.traced("BlockStmt", |p| p.parse_braced_stmts())
    }

    fn parse_braced_stmts(&mut self) -> PResult<StmtId> {
        let lbrace = self.expect(Token::LBrace)?;
        let list = self.parse_stmt_list()?;
        let rbrace = self.expect2(Token::RBrace)?;
        let list = self.a.list_stmts(list);
        Ok(self.alloc_stmt(Stmt::Block(BlockStmt { lbrace, list, rbrace })))
    }
}
