//! Operands, primary expressions, unary and binary expressions.

use smallvec::SmallVec;

use super::{Items, Parser, stmt_start};
use crate::ast::*;
use crate::error::PResult;
use crate::position::Pos;
use crate::stack::ensure_sufficient_stack;
use crate::token::{LOWEST_PREC, Token};

/// Whether `x` is a (possibly parenthesized) type element: a type literal,
/// a `~T` term, or a union containing one.
pub(super) fn is_type_elem(a: &AstArena, x: ExprId) -> bool {
    ensure_sufficient_stack(|| match a.exprs[x] {
        Expr::ArrayType { .. }
        | Expr::StructType { .. }
        | Expr::FuncType { .. }
        | Expr::InterfaceType { .. }
        | Expr::MapType { .. }
        | Expr::ChanType { .. } => true,
        Expr::Binary { x, y, .. } => is_type_elem(a, x) || is_type_elem(a, y),
        Expr::Unary { op, .. } => op == Token::Tilde,
        Expr::Paren { x, .. } => is_type_elem(a, x),
        _ => false,
    })
}

impl<'src> Parser<'src> {
    fn parse_operand(&mut self) -> PResult<ExprId> {
        self.traced("Operand", |p| {
            match p.tok {
                Token::Ident => {
                    let ident = p.parse_ident()?;
                    return Ok(p.ident_expr(ident));
                }
                Token::Int | Token::Float | Token::Imag | Token::Char | Token::String => {
                    let value = p.a.symbols.intern(p.lit);
                    let lit = p.alloc_expr(Expr::BasicLit(BasicLit {
                        value_pos: p.pos,
                        kind: p.tok,
                        value,
                    }));
                    p.next();
                    return Ok(lit);
                }
                Token::LParen => {
                    let lparen = p.pos;
                    p.next();
                    p.expr_lev += 1;
                    // Types may be parenthesized: (some type)
                    let x = p.parse_rhs()?;
                    p.expr_lev -= 1;
                    let rparen = p.expect(Token::RParen)?;
                    return Ok(p.alloc_expr(Expr::Paren { lparen, x, rparen }));
                }
                Token::Func => return p.parse_func_type_or_lit(),
                _ => {}
            }

            // A type for a composite literal or conversion; trailing type
            // arguments are left to the primary expression.
            if let Some(typ) = p.try_ident_or_type()? {
                return Ok(typ);
            }

            let pos = p.pos;
            p.error_expected(pos, "operand")?;
            p.advance(stmt_start)?;
            Ok(p.bad_expr(pos, p.pos))
        })
    }

    fn parse_func_type_or_lit(&mut self) -> PResult<ExprId> {
        self.traced("FuncTypeOrLit", |p| {
            let typ = p.parse_func_type()?;
            if p.tok != Token::LBrace {
                return Ok(typ);
            }
            p.expr_lev += 1;
            let body = p.parse_body()?;
            p.expr_lev -= 1;
            Ok(p.alloc_expr(Expr::FuncLit { typ, body }))
        })
    }

    fn parse_selector(&mut self, x: ExprId) -> PResult<ExprId> {
        self.traced("Selector", |p| {
            let sel = p.parse_ident()?;
            Ok(p.alloc_expr(Expr::Selector { x, sel }))
        })
    }

    fn parse_type_assertion(&mut self, x: ExprId) -> PResult<ExprId> {
        self.traced("TypeAssertion", |p| {
            let lparen = p.expect(Token::LParen)?;
            let typ = if p.tok == Token::Type {
                // type switch guard
                p.next();
                None
            } else {
                Some(p.parse_type()?)
            };
            let rparen = p.expect(Token::RParen)?;
            Ok(p.alloc_expr(Expr::TypeAssert {
                x,
                lparen,
                typ,
                rparen,
            }))
        })
    }

    fn parse_index_or_slice_or_instance(&mut self, x: ExprId) -> PResult<ExprId> {
        self.traced("IndexOrSliceOrInstance", |p| {
            let lbrack = p.expect(Token::LBrack)?;
            if p.tok == Token::RBrack {
                // x[]: accepted, with a complaint
                p.error_expected(p.pos, "operand")?;
                let rbrack = p.pos;
                p.next();
                let index = p.bad_expr(rbrack, rbrack);
                return Ok(p.alloc_expr(Expr::Index {
                    x,
                    lbrack,
                    index,
                    rbrack,
                }));
            }

            p.expr_lev += 1;
            let mut args: Items<ExprId> = SmallVec::new();
            let mut index: [Option<ExprId>; 3] = [None; 3];
            let mut colons = [Pos::NONE; 2];
            if p.tok != Token::Colon {
                // Index or instantiation; a type here does not put us in type context.
                index[0] = Some(p.parse_rhs()?);
            }
            let mut ncolons = 0usize;
            match p.tok {
                Token::Colon => {
                    while p.tok == Token::Colon && ncolons < colons.len() {
                        colons[ncolons] = p.pos;
                        ncolons += 1;
                        p.next();
                        if !matches!(p.tok, Token::Colon | Token::RBrack | Token::Eof) {
                            index[ncolons] = Some(p.parse_rhs()?);
                        }
                    }
                }
                Token::Comma => {
                    args.extend(index[0]);
                    while p.tok == Token::Comma {
                        p.next();
                        if p.tok != Token::RBrack && p.tok != Token::Eof {
                            args.push(p.parse_type()?);
                        }
                    }
                }
                _ => {}
            }
            p.expr_lev -= 1;
            let rbrack = p.expect(Token::RBrack)?;

            if ncolons > 0 {
                let slice3 = ncolons == 2;
                if slice3 {
                    if index[1].is_none() {
                        p.error(colons[0], "middle index required in 3-index slice")?;
                        index[1] = Some(p.bad_expr(colons[0] + 1, colons[1]));
                    }
                    if index[2].is_none() {
                        p.error(colons[1], "final index required in 3-index slice")?;
                        index[2] = Some(p.bad_expr(colons[1] + 1, rbrack));
                    }
                }
                return Ok(p.alloc_expr(Expr::Slice {
                    x,
                    lbrack,
                    low: index[0],
                    high: index[1],
                    max: index[2],
                    slice3,
                    rbrack,
                }));
            }

            if args.is_empty() {
                let index = match index[0] {
                    Some(i) => i,
                    None => p.bad_expr(lbrack + 1, rbrack),
                };
                return Ok(p.alloc_expr(Expr::Index {
                    x,
                    lbrack,
                    index,
                    rbrack,
                }));
            }
            Ok(p.pack_index_expr(x, lbrack, args, rbrack))
        })
    }

    fn parse_call_or_conversion(&mut self, fun: ExprId) -> PResult<ExprId> {
        self.traced("CallOrConversion", |p| {
            let lparen = p.expect(Token::LParen)?;
            p.expr_lev += 1;
            let mut list: Items<ExprId> = SmallVec::new();
            let mut ellipsis = Pos::NONE;
            while p.tok != Token::RParen && p.tok != Token::Eof && !ellipsis.is_valid() {
                // Builtins may take a type: make(some type, ...)
                list.push(p.parse_rhs()?);
                if p.tok == Token::Ellipsis {
                    ellipsis = p.pos;
                    p.next();
                }
                if !p.at_comma("argument list", Token::RParen)? {
                    break;
                }
                p.next();
            }
            p.expr_lev -= 1;
            let rparen = p.expect_closing(Token::RParen, "argument list")?;
            let args = p.a.list_exprs(list);
            Ok(p.alloc_expr(Expr::Call {
                fun,
                lparen,
                args,
                ellipsis,
                rparen,
            }))
        })
    }

    fn parse_value(&mut self) -> PResult<ExprId> {
        self.traced("Element", |p| {
            if p.tok == Token::LBrace {
                return p.parse_literal_value(None);
            }
            p.parse_expr()
        })
    }

    fn parse_element(&mut self) -> PResult<ExprId> {
        self.traced("Element", |p| {
            let x = p.parse_value()?;
            if p.tok == Token::Colon {
                let colon = p.pos;
                p.next();
                let value = p.parse_value()?;
                return Ok(p.alloc_expr(Expr::KeyValue { key: x, colon, value }));
            }
            Ok(x)
        })
    }

    pub(super) fn parse_literal_value(&mut self, typ: Option<ExprId>) -> PResult<ExprId> {
        self.nested("LiteralValue", |p| {
            let lbrace = p.expect(Token::LBrace)?;
            let mut elts: Items<ExprId> = SmallVec::new();
            p.expr_lev += 1;
            while p.tok != Token::RBrace && p.tok != Token::Eof {
                elts.push(p.parse_element()?);
                if !p.at_comma("composite literal", Token::RBrace)? {
                    break;
                }
                p.next();
            }
            p.expr_lev -= 1;
            let rbrace = p.expect_closing(Token::RBrace, "composite literal")?;
            let elts = p.a.list_exprs(elts);
            Ok(p.alloc_expr(Expr::CompositeLit {
                typ,
                lbrace,
                elts,
                rbrace,
                incomplete: false,
            }))
        })
    }

    /// Operand followed by any number of selectors, index/slice expressions,
    /// calls and composite literal bodies. Each suffix counts as one level
    /// of nesting.
    pub(super) fn parse_primary_expr(&mut self, x: Option<ExprId>) -> PResult<ExprId> {
        self.traced("PrimaryExpr", |p| {
            let x = match x {
                Some(x) => x,
                None => p.parse_operand()?,
            };
            let base = p.nest_lev;
            let r = p.primary_suffixes(x);
            p.nest_lev = base;
            r
        })
    }

    fn primary_suffixes(&mut self, mut x: ExprId) -> PResult<ExprId> {
        loop {
            self.inc_nest_lev()?;
            x = match self.tok {
                Token::Period => {
                    self.next();
                    match self.tok {
                        Token::Ident => self.parse_selector(x)?,
                        Token::LParen => self.parse_type_assertion(x)?,
                        _ => {
                            let pos = self.pos;
                            self.error_expected(pos, "selector or type assertion")?;
                            // Leave a closing brace for the enclosing block.
                            if self.tok != Token::RBrace {
                                self.next();
                            }
                            let sel = self.a.new_ident(pos, "_");
                            self.alloc_expr(Expr::Selector { x, sel })
                        }
                    }
                }
                Token::LBrack => self.parse_index_or_slice_or_instance(x)?,
                Token::LParen => self.parse_call_or_conversion(x)?,
                Token::LBrace => {
                    // Composite literal body or the block of a statement.
                    let t = self.a.unparen(x);
                    match self.a.exprs[t] {
                        Expr::Bad { .. }
                        | Expr::Ident(_)
                        | Expr::Selector { .. }
                        | Expr::Index { .. }
                        | Expr::IndexList { .. } => {
                            if self.expr_lev < 0 {
                                return Ok(x);
                            }
                        }
                        Expr::ArrayType { .. } | Expr::StructType { .. } | Expr::MapType { .. } => {}
                        _ => return Ok(x),
                    }
                    if t != x {
                        let pos = self.a.expr_pos(t);
                        self.error(pos, "cannot parenthesize type in composite literal")?;
                    }
                    self.parse_literal_value(Some(x))?
                }
                _ => return Ok(x),
            };
        }
    }

    pub(super) fn parse_unary_expr(&mut self) -> PResult<ExprId> {
        self.nested("UnaryExpr", |p| match p.tok {
            Token::Add | Token::Sub | Token::Not | Token::Xor | Token::And | Token::Tilde => {
                let (op_pos, op) = (p.pos, p.tok);
                p.next();
                let x = p.parse_unary_expr()?;
                Ok(p.alloc_expr(Expr::Unary { op_pos, op, x }))
            }
            Token::Arrow => {
                // Channel type or receive expression.
                let arrow = p.pos;
                p.next();
                let x = p.parse_unary_expr()?;
                if matches!(p.a.exprs[x], Expr::ChanType { .. }) {
                    // (<-type): move the arrow into the channel type chain.
                    p.reassociate_recv_chan(x, arrow)?;
                    return Ok(x);
                }
                Ok(p.alloc_expr(Expr::Unary {
                    op_pos: arrow,
                    op: Token::Arrow,
                    x,
                }))
            }
            Token::Mul => {
                // Pointer type or dereference.
                let star = p.pos;
                p.next();
                let x = p.parse_unary_expr()?;
                Ok(p.alloc_expr(Expr::Star { star, x }))
            }
            _ => p.parse_primary_expr(None),
        })
    }

    /// `<- chan T` becomes `<-chan T`; `<- chan<- T` becomes `<-chan (<-chan T)`.
    fn reassociate_recv_chan(&mut self, typ: ExprId, arrow: Pos) -> PResult<()> {
        let mut arrow = arrow;
        let mut dir = ChanDir::Send;
        let mut cur = Some(typ);
        while let Some(id) = cur {
            if dir != ChanDir::Send {
                break;
            }
            let Expr::ChanType {
                arrow: typ_arrow,
                dir: typ_dir,
                value,
                ..
            } = self.a.exprs[id]
            else {
                break;
            };
            if typ_dir == ChanDir::Recv {
                // (<-type) is (<-(<-chan T))
                self.error_expected(typ_arrow, "'chan'")?;
            }
            if let Expr::ChanType { begin, arrow: a, dir: d, .. } = &mut self.a.exprs[id] {
                *begin = arrow;
                *a = arrow;
                *d = ChanDir::Recv;
            }
            arrow = typ_arrow;
            dir = typ_dir;
            cur = match self.a.exprs[value] {
                Expr::ChanType { .. } => Some(value),
                _ => None,
            };
        }
        if dir == ChanDir::Send {
            self.error_expected(arrow, "channel type")?;
        }
        Ok(())
    }

    /// The current operator and its precedence; `=` reads as `==` on a right-hand side.
    fn tok_prec(&self) -> (Token, u8) {
        let tok = if self.in_rhs && self.tok == Token::Assign {
            Token::Eql
        } else {
            self.tok
        };
        (tok, tok.precedence())
    }

    pub(super) fn parse_binary_expr(&mut self, x: Option<ExprId>, prec1: u8) -> PResult<ExprId> {
        self.traced("BinaryExpr", |p| {
            let x = match x {
                Some(x) => x,
                None => p.parse_unary_expr()?,
            };
            let base = p.nest_lev;
            let r = p.binary_operands(x, prec1);
            p.nest_lev = base;
            r
        })
    }

    fn binary_operands(&mut self, mut x: ExprId, prec1: u8) -> PResult<ExprId> {
        loop {
            self.inc_nest_lev()?;
            let (op, oprec) = self.tok_prec();
            if oprec < prec1 {
                return Ok(x);
            }
            let op_pos = self.expect(op)?;
            let y = self.parse_binary_expr(None, oprec + 1)?;
            x = self.alloc_expr(Expr::Binary { x, op_pos, op, y });
        }
    }

    /// An expression or a type.
    pub(super) fn parse_expr(&mut self) -> PResult<ExprId> {
        self.traced("Expression", |p| p.parse_binary_expr(None, LOWEST_PREC + 1))
    }

    pub(super) fn parse_rhs(&mut self) -> PResult<ExprId> {
        let old = self.in_rhs;
        self.in_rhs = true;
        let x = self.parse_expr();
        self.in_rhs = old;
        x
    }

    pub(super) fn parse_list(&mut self, in_rhs: bool) -> PResult<Items<ExprId>> {
        let old = self.in_rhs;
        self.in_rhs = in_rhs;
        let list = self.parse_expr_list();
        self.in_rhs = old;
        list
    }

    fn parse_expr_list(&mut self) -> PResult<Items<ExprId>> {
        self.traced("ExpressionList", |p| {
            let mut list: Items<ExprId> = SmallVec::new();
            list.push(p.parse_expr()?);
            while p.tok == Token::Comma {
                p.next();
                list.push(p.parse_expr()?);
            }
            Ok(list)
        })
    }
}
