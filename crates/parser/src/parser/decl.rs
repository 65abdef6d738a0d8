//! Declarations, specs and the source file.

use smallvec::SmallVec;

use super::expr::is_type_elem;
use super::{Items, Mode, Parser, decl_start, expr_end};
use crate::ast::*;
use crate::error::PResult;
use crate::position::Pos;
use crate::stack::ensure_sufficient_stack;
use crate::token::{LOWEST_PREC, Token};

/// Everything the file production yields, before resolution.
pub(crate) struct FileParts {
    pub(crate) doc: Option<CommentGroupId>,
    pub(crate) package: Pos,
    pub(crate) name: IdentId,
    pub(crate) decls: Vec<DeclId>,
    pub(crate) imports: Vec<SpecId>,
    pub(crate) comments: Vec<CommentGroupId>,
    pub(crate) go_version: Option<String>,
}

impl<'src> Parser<'src> {
    fn parse_import_spec(&mut self, doc: Option<CommentGroupId>) -> PResult<Spec> {
        self.traced("ImportSpec", |p| {
            let name = match p.tok {
                Token::Ident => Some(p.parse_ident()?),
                Token::Period => {
                    let dot = p.a.new_ident(p.pos, ".");
                    p.next();
                    Some(dot)
                }
                _ => None,
            };

            let pos = p.pos;
            let mut path = "";
            if p.tok == Token::String {
                path = p.lit;
                p.next();
            } else if p.tok.is_literal() {
                p.error(pos, "import path must be a string")?;
                p.next();
            } else {
                p.error(pos, "missing import path")?;
                p.advance(expr_end)?;
            }
            let comment = p.expect_semi()?;

            let value = p.a.symbols.intern(path);
            let path = p.alloc_expr(Expr::BasicLit(BasicLit {
                value_pos: pos,
                kind: Token::String,
                value,
            }));
            Ok(Spec::Import(ImportSpec {
                doc,
                name,
                path,
                comment,
                end_pos: Pos::NONE,
            }))
        })
    }

    fn parse_value_spec(&mut self, doc: Option<CommentGroupId>, keyword: Token) -> PResult<Spec> {
        self.traced("ValueSpec", |p| {
            let names = p.parse_ident_list()?;
            let mut typ = None;
            let mut values: Items<ExprId> = SmallVec::new();
            if keyword == Token::Const {
                // Type and values stay optional for more tolerant parsing.
                if !matches!(p.tok, Token::Eof | Token::Semicolon | Token::RParen) {
                    typ = p.try_ident_or_type()?;
                    if p.tok == Token::Assign {
                        p.next();
                        values = p.parse_list(true)?;
                    }
                }
            } else {
                if p.tok != Token::Assign {
                    typ = Some(p.parse_type()?);
                }
                if p.tok == Token::Assign {
                    p.next();
                    values = p.parse_list(true)?;
                }
            }
            let comment = p.expect_semi()?;
            let values = p.a.list_exprs(values);
            Ok(Spec::Value(ValueSpec {
                doc,
                names,
                typ,
                values,
                comment,
            }))
        })
    }

    /// The rest of `type name[...` once the bracket is known to open a type
    /// parameter list whose first entry is `name0` (with type `typ0`, if any).
    /// Yields the type parameters, the `=` position and the type.
    fn parse_generic_type(
        &mut self,
        opening: Pos,
        name0: IdentId,
        typ0: Option<ExprId>,
    ) -> PResult<(FieldListId, Pos, ExprId)> {
        self.traced("GenericType", |p| {
            let list = p.parse_parameter_list(Some(name0), typ0, Token::RBrack)?;
            let closing = p.expect(Token::RBrack)?;
            let type_params = p.field_list(opening, list, closing);
            // Whether aliases may have type parameters is not decided here.
            let mut assign = Pos::NONE;
            if p.tok == Token::Assign {
                assign = p.pos;
                p.next();
            }
            let typ = p.parse_type()?;
            Ok((type_params, assign, typ))
        })
    }

    fn parse_type_spec(&mut self, doc: Option<CommentGroupId>) -> PResult<Spec> {
        self.traced("TypeSpec", |p| {
            let name = p.parse_ident()?;
            let mut type_params = None;
            let mut assign = Pos::NONE;

            let typ = if p.tok == Token::LBrack {
                // An array or slice type, or a type parameter list.
                let lbrack = p.pos;
                p.next();
                if p.tok == Token::Ident {
                    // Parse an expression x and analyze it. A name followed by
                    // "[" starts a slice or array constraint (P []E), since an
                    // index expression is never a valid array length.
                    let ident = p.parse_ident()?;
                    let mut x = p.ident_expr(ident);
                    if p.tok != Token::LBrack {
                        p.expr_lev += 1;
                        let lhs = p.parse_primary_expr(Some(x))?;
                        x = p.parse_binary_expr(Some(lhs), LOWEST_PREC + 1)?;
                        p.expr_lev -= 1;
                    }
                    // A lone name followed by "]" is an array length; a type
                    // that could also be an expression is a constraint if a
                    // comma follows.
                    let force = p.tok == Token::Comma;
                    match p.extract_name(x, force) {
                        (Some(pname), ptype) if ptype.is_some() || p.tok != Token::RBrack => {
                            let (tparams, eq, typ) = p.parse_generic_type(lbrack, pname, ptype)?;
                            type_params = Some(tparams);
                            assign = eq;
                            typ
                        }
                        _ => p.parse_array_type(lbrack, Some(x))?,
                    }
                } else {
                    p.parse_array_type(lbrack, None)?
                }
            } else {
                if p.tok == Token::Assign {
                    assign = p.pos;
                    p.next();
                }
                p.parse_type()?
            };

            let comment = p.expect_semi()?;
            Ok(Spec::Type(TypeSpec {
                doc,
                name,
                type_params,
                assign,
                typ,
                comment,
            }))
        })
    }

    /// Splits `x` into `name expr` when `expr` is a type element (or when
    /// `force` is set). A plain name yields `(Some(name), None)`; failure
    /// yields `(None, Some(x))`.
    ///
    /// ```text
    /// x          force  name  expr
    /// P*[]int    any    P     *[]int
    /// P*E        true   P     *E
    /// P*E        false  -     P*E
    /// P([]int)   any    P     ([]int)
    /// P*E|F|~G   any    P     *E|F|~G
    /// P*E|F|G    false  -     P*E|F|G
    /// ```
    fn extract_name(&mut self, x: ExprId, force: bool) -> (Option<IdentId>, Option<ExprId>) {
        ensure_sufficient_stack(|| match self.a.exprs[x] {
            Expr::Ident(name) => (Some(name), None),
            Expr::Binary {
                x: bx,
                op_pos,
                op: Token::Mul,
                y,
            } => match self.as_ident(bx) {
                Some(name) if force || is_type_elem(&self.a, y) => {
                    // name *y
                    let star = self.alloc_expr(Expr::Star { star: op_pos, x: y });
                    (Some(name), Some(star))
                }
                _ => (None, Some(x)),
            },
            Expr::Binary {
                x: bx,
                op_pos,
                op: Token::Or,
                y,
            } => {
                let force = force || is_type_elem(&self.a, y);
                match self.extract_name(bx, force) {
                    (Some(name), Some(lhs)) => {
                        // name lhs|y
                        let union = self.alloc_expr(Expr::Binary {
                            x: lhs,
                            op_pos,
                            op: Token::Or,
                            y,
                        });
                        (Some(name), Some(union))
                    }
                    _ => (None, Some(x)),
                }
            }
            Expr::Call {
                fun,
                lparen,
                args,
                ellipsis,
                rparen,
            } => {
                let single = match self.a.list(args) {
                    &[arg] => Some(arg),
                    _ => None,
                };
                match (self.as_ident(fun), single) {
                    (Some(name), Some(arg))
                        if !ellipsis.is_valid() && (force || is_type_elem(&self.a, arg)) =>
                    {
                        // name (arg); the parentheses are kept
                        let paren = self.alloc_expr(Expr::Paren { lparen, x: arg, rparen });
                        (Some(name), Some(paren))
                    }
                    _ => (None, Some(x)),
                }
            }
            _ => (None, Some(x)),
        })
    }

    fn parse_spec(&mut self, doc: Option<CommentGroupId>, keyword: Token) -> PResult<SpecId> {
        let spec = match keyword {
            Token::Import => {
                let spec = self.parse_import_spec(doc)?;
                let id = self.a.specs.alloc(spec);
                self.imports.push(id);
                return Ok(id);
            }
            Token::Type => self.parse_type_spec(doc)?,
            _ => self.parse_value_spec(doc, keyword)?,
        };
        Ok(self.a.specs.alloc(spec))
    }

    fn parse_gen_decl(&mut self, keyword: Token) -> PResult<DeclId> {
        self.traced("GenDecl", |p| {
            let doc = p.lead_comment;
            let tok_pos = p.expect(keyword)?;
            let (mut lparen, mut rparen) = (Pos::NONE, Pos::NONE);
            let mut list: Items<SpecId> = SmallVec::new();
            if p.tok == Token::LParen {
                lparen = p.pos;
                p.next();
                while p.tok != Token::RParen && p.tok != Token::Eof {
                    let doc = p.lead_comment;
                    list.push(p.parse_spec(doc, keyword)?);
                }
                rparen = p.expect(Token::RParen)?;
                p.expect_semi()?;
            } else {
                list.push(p.parse_spec(None, keyword)?);
            }
            let specs = p.a.list_specs(list);
            Ok(p.a.decls.alloc(Decl::Gen(GenDecl {
                doc,
                tok_pos,
                tok: keyword,
                lparen,
                specs,
                rparen,
            })))
        })
    }

    fn parse_func_decl(&mut self) -> PResult<DeclId> {
        self.traced("FunctionDecl", |p| {
            let doc = p.lead_comment;
            let func = p.expect(Token::Func)?;

            let mut recv = None;
            if p.tok == Token::LParen {
                let (_, r) = p.parse_parameters(false)?;
                recv = Some(r);
            }

            let name = p.parse_ident()?;
            let (mut type_params, params) = p.parse_parameters(true)?;
            if let (Some(_), Some(tp)) = (recv, type_params) {
                // Parsed anyway for the better error message and recovery.
                let opening = p.a.field_lists[tp].opening;
                p.error(opening, "method must have no type parameters")?;
                type_params = None;
            }
            let results = p.parse_result()?;

            let mut body = None;
            match p.tok {
                Token::LBrace => {
                    body = Some(p.parse_body()?);
                    p.expect_semi()?;
                }
                Token::Semicolon => {
                    p.next();
                    if p.tok == Token::LBrace {
                        // opening { of the body on the next line
                        p.error(p.pos, "unexpected semicolon or newline before {")?;
                        body = Some(p.parse_body()?);
                        p.expect_semi()?;
                    }
                }
                _ => {
                    p.expect_semi()?;
                }
            }

            let typ = p.alloc_expr(Expr::FuncType {
                func,
                type_params,
                params,
                results,
            });
            Ok(p.a.decls.alloc(Decl::Func(FuncDecl {
                doc,
                recv,
                name,
                typ,
                body,
            })))
        })
    }

    /// A declaration; on failure, skips to a token accepted by `sync`.
    pub(super) fn parse_decl(&mut self, sync: fn(Token) -> bool) -> PResult<DeclId> {
        self.traced("Declaration", |p| match p.tok {
            Token::Import | Token::Const | Token::Var | Token::Type => p.parse_gen_decl(p.tok),
            Token::Func => p.parse_func_decl(),
            _ => {
                let pos = p.pos;
                p.error_expected(pos, "declaration")?;
                p.advance(sync)?;
                Ok(p.a.decls.alloc(Decl::Bad { from: pos, to: p.pos }))
            }
        })
    }

    /// The whole file. `None` when the input does not even start like Go:
    /// errors before the first token or in the package clause.
    pub(crate) fn parse_file(&mut self) -> PResult<Option<FileParts>> {
        self.traced("File", |p| {
            if !p.errors.is_empty() {
                return Ok(None);
            }

            // package clause
            let doc = p.lead_comment;
            let package = p.expect(Token::Package)?;
            // The package name does not appear in any scope.
            let name = p.parse_ident()?;
            if p.mode.contains(Mode::BLANK_PACKAGE_NAME_INVALID) && p.a.ident_name(name) == "_" {
                p.error(p.pos, "invalid package name _")?;
            }
            p.expect_semi()?;

            if !p.errors.is_empty() {
                return Ok(None);
            }

            let mut decls = Vec::new();
            if !p.mode.contains(Mode::PACKAGE_CLAUSE_ONLY) {
                while p.tok == Token::Import {
                    decls.push(p.parse_gen_decl(Token::Import)?);
                }

                if !p.mode.contains(Mode::IMPORTS_ONLY) {
                    let mut prev = Token::Import;
                    while p.tok != Token::Eof {
                        // Late imports are still accepted, with a complaint.
                        if p.tok == Token::Import && prev != Token::Import {
                            p.error(p.pos, "imports must appear before other declarations")?;
                        }
                        prev = p.tok;
                        decls.push(p.parse_decl(decl_start)?);
                    }
                }
            }

            Ok(Some(FileParts {
                doc,
                package,
                name,
                decls,
                imports: std::mem::take(&mut p.imports),
                comments: std::mem::take(&mut p.comments),
                go_version: p.go_version.take(),
            }))
        })
    }
}
