//! Type productions, parameter lists and type-parameter disambiguation.

use smallvec::SmallVec;

use super::{Items, Parser, expr_end};
use crate::ast::*;
use crate::error::PResult;
use crate::position::Pos;
use crate::token::Token;

/// A parameter while its list is still being analyzed.
#[derive(Clone, Copy)]
struct Param {
    name: Option<IdentId>,
    typ: Option<ExprId>,
}

impl<'src> Parser<'src> {
    pub(super) fn parse_type(&mut self) -> PResult<ExprId> {
        self.traced("Type", |p| match p.try_ident_or_type()? {
            Some(typ) => Ok(typ),
            None => {
                let pos = p.pos;
                p.error_expected(pos, "type")?;
                p.advance(expr_end)?;
                Ok(p.bad_expr(pos, p.pos))
            }
        })
    }

    pub(super) fn parse_qualified_ident(&mut self, ident: Option<IdentId>) -> PResult<ExprId> {
        self.traced("QualifiedIdent", |p| {
            let typ = p.parse_type_name(ident)?;
            if p.tok == Token::LBrack {
                return p.parse_type_instance(typ);
            }
            Ok(typ)
        })
    }

    /// `name` or `pkg.name`; a plain identifier is not resolved here.
    pub(super) fn parse_type_name(&mut self, ident: Option<IdentId>) -> PResult<ExprId> {
        self.traced("TypeName", |p| {
            let ident = match ident {
                Some(i) => i,
                None => p.parse_ident()?,
            };
            let x = p.ident_expr(ident);
            if p.tok == Token::Period {
                p.next();
                let sel = p.parse_ident()?;
                return Ok(p.alloc_expr(Expr::Selector { x, sel }));
            }
            Ok(x)
        })
    }

    /// `[` is consumed at `lbrack`; `len` is an already parsed array length.
    pub(super) fn parse_array_type(&mut self, lbrack: Pos, len: Option<ExprId>) -> PResult<ExprId> {
        self.traced("ArrayType", |p| {
            let mut len = len;
            if len.is_none() {
                p.expr_lev += 1;
                if p.tok == Token::Ellipsis {
                    len = Some(p.alloc_expr(Expr::Ellipsis {
                        ellipsis: p.pos,
                        elt: None,
                    }));
                    p.next();
                } else if p.tok != Token::RBrack {
                    len = Some(p.parse_rhs()?);
                }
                p.expr_lev -= 1;
            }
            if p.tok == Token::Comma {
                // Accepted in type parameter lists only.
                p.error(p.pos, "unexpected comma; expecting ]")?;
                p.next();
            }
            p.expect(Token::RBrack)?;
            let elt = p.parse_type()?;
            Ok(p.alloc_expr(Expr::ArrayType { lbrack, len, elt }))
        })
    }

    /// After `x [`: either a field `x` of array/slice type, or the embedded
    /// instantiated type `x[P, ...]`. The name is returned only in the first case.
    pub(super) fn parse_array_field_or_type_instance(
        &mut self,
        x: IdentId,
    ) -> PResult<(Option<IdentId>, ExprId)> {
        self.traced("ArrayFieldOrTypeInstance", |p| {
            let lbrack = p.expect(Token::LBrack)?;
            let mut trailing_comma = Pos::NONE;
            let mut args: Items<ExprId> = SmallVec::new();
            if p.tok != Token::RBrack {
                p.expr_lev += 1;
                args.push(p.parse_rhs()?);
                while p.tok == Token::Comma {
                    let comma = p.pos;
                    p.next();
                    if p.tok == Token::RBrack {
                        trailing_comma = comma;
                        break;
                    }
                    args.push(p.parse_rhs()?);
                }
                p.expr_lev -= 1;
            }
            let rbrack = p.expect(Token::RBrack)?;

            if args.is_empty() {
                // x []E
                let elt = p.parse_type()?;
                let typ = p.alloc_expr(Expr::ArrayType { lbrack, len: None, elt });
                return Ok((Some(x), typ));
            }

            if args.len() == 1 {
                if let Some(elt) = p.try_ident_or_type()? {
                    // x [P]E
                    if trailing_comma.is_valid() {
                        p.error(trailing_comma, "unexpected comma; expecting ]")?;
                    }
                    let typ = p.alloc_expr(Expr::ArrayType {
                        lbrack,
                        len: Some(args[0]),
                        elt,
                    });
                    return Ok((Some(x), typ));
                }
            }

            // x[P], x[P1, P2], ...
            let base = p.ident_expr(x);
            Ok((None, p.pack_index_expr(base, lbrack, args, rbrack)))
        })
    }

    fn parse_field_decl(&mut self) -> PResult<FieldId> {
        self.traced("FieldDecl", |p| {
            let doc = p.lead_comment;
            let mut names: Items<IdentId> = SmallVec::new();

            let typ = match p.tok {
                Token::Ident => {
                    let name = p.parse_ident()?;
                    if matches!(p.tok, Token::Period | Token::String | Token::Semicolon | Token::RBrace) {
                        // embedded type
                        if p.tok == Token::Period {
                            p.parse_qualified_ident(Some(name))?
                        } else {
                            p.ident_expr(name)
                        }
                    } else {
                        // name1, name2, ... T
                        names.push(name);
                        while p.tok == Token::Comma {
                            p.next();
                            names.push(p.parse_ident()?);
                        }
                        // Either an embedded T[P1, P2] or a field of type []E / [P]E.
                        if names.len() == 1 && p.tok == Token::LBrack {
                            let (name, typ) = p.parse_array_field_or_type_instance(name)?;
                            if name.is_none() {
                                names.clear();
                            }
                            typ
                        } else {
                            p.parse_type()?
                        }
                    }
                }
                Token::Mul => {
                    let star = p.pos;
                    p.next();
                    let x = if p.tok == Token::LParen {
                        // *(T)
                        p.error(p.pos, "cannot parenthesize embedded type")?;
                        p.next();
                        let x = p.parse_qualified_ident(None)?;
                        if p.tok == Token::RParen {
                            p.next();
                        }
                        x
                    } else {
                        p.parse_qualified_ident(None)?
                    };
                    p.alloc_expr(Expr::Star { star, x })
                }
                Token::LParen => {
                    p.error(p.pos, "cannot parenthesize embedded type")?;
                    p.next();
                    let typ = if p.tok == Token::Mul {
                        // (*T)
                        let star = p.pos;
                        p.next();
                        let x = p.parse_qualified_ident(None)?;
                        p.alloc_expr(Expr::Star { star, x })
                    } else {
                        // (T)
                        p.parse_qualified_ident(None)?
                    };
                    if p.tok == Token::RParen {
                        p.next();
                    }
                    typ
                }
                _ => {
                    let pos = p.pos;
                    p.error_expected(pos, "field name or embedded type")?;
                    p.advance(expr_end)?;
                    p.bad_expr(pos, p.pos)
                }
            };

            let mut tag = None;
            if p.tok == Token::String {
                let value = p.a.symbols.intern(p.lit);
                tag = Some(p.alloc_expr(Expr::BasicLit(BasicLit {
                    value_pos: p.pos,
                    kind: Token::String,
                    value,
                })));
                p.next();
            }

            let comment = p.expect_semi()?;
            let names = p.a.list_idents(names);
            Ok(p.a.fields.alloc(Field {
                doc,
                names,
                typ,
                tag,
                comment,
            }))
        })
    }

    fn parse_struct_type(&mut self) -> PResult<ExprId> {
        self.traced("StructType", |p| {
            let struct_pos = p.expect(Token::Struct)?;
            let lbrace = p.expect(Token::LBrace)?;
            let mut list: Items<FieldId> = SmallVec::new();
            // A field cannot start with '(', but parse_field_decl reports that itself.
            while matches!(p.tok, Token::Ident | Token::Mul | Token::LParen) {
                list.push(p.parse_field_decl()?);
            }
            let rbrace = p.expect(Token::RBrace)?;
            let fields = p.field_list(lbrace, list, rbrace);
            Ok(p.alloc_expr(Expr::StructType {
                struct_pos,
                fields,
                incomplete: false,
            }))
        })
    }

    fn parse_pointer_type(&mut self) -> PResult<ExprId> {
        self.traced("PointerType", |p| {
            let star = p.expect(Token::Mul)?;
            let x = p.parse_type()?;
            Ok(p.alloc_expr(Expr::Star { star, x }))
        })
    }

    fn parse_dots_type(&mut self) -> PResult<ExprId> {
        self.traced("DotsType", |p| {
            let ellipsis = p.expect(Token::Ellipsis)?;
            let elt = p.parse_type()?;
            Ok(p.alloc_expr(Expr::Ellipsis {
                ellipsis,
                elt: Some(elt),
            }))
        })
    }

    fn parse_param_decl(&mut self, name: Option<IdentId>, type_sets_ok: bool) -> PResult<Param> {
        self.traced("ParamDecl", |p| {
            let mut f = Param { name: None, typ: None };
            if name.is_none() && type_sets_ok && p.tok == Token::Tilde {
                // "~" ...
                f.typ = Some(p.embedded_elem(None)?);
                return Ok(f);
            }

            if name.is_some() || p.tok == Token::Ident {
                f.name = match name {
                    Some(n) => Some(n),
                    None => Some(p.parse_ident()?),
                };
                match p.tok {
                    Token::Ident
                    | Token::Mul
                    | Token::Arrow
                    | Token::Func
                    | Token::Chan
                    | Token::Map
                    | Token::Struct
                    | Token::Interface
                    | Token::LParen => {
                        // name type
                        f.typ = Some(p.parse_type()?);
                    }
                    Token::LBrack => {
                        // name "[" type1, ..., typeN "]" or name "[" n "]" type
                        if let Some(n) = f.name {
                            let (n, typ) = p.parse_array_field_or_type_instance(n)?;
                            f.name = n;
                            f.typ = Some(typ);
                        }
                    }
                    Token::Ellipsis => {
                        // name "..." type; no "|" may follow
                        f.typ = Some(p.parse_dots_type()?);
                        return Ok(f);
                    }
                    Token::Period => {
                        // name "." ...
                        f.typ = Some(p.parse_qualified_ident(f.name)?);
                        f.name = None;
                    }
                    Token::Tilde if type_sets_ok => {
                        f.typ = Some(p.embedded_elem(None)?);
                        return Ok(f);
                    }
                    Token::Or if type_sets_ok => {
                        let first = f.name.take().map(|n| p.ident_expr(n));
                        f.typ = Some(p.embedded_elem(first)?);
                        return Ok(f);
                    }
                    _ => {}
                }
            } else {
                match p.tok {
                    Token::Mul
                    | Token::Arrow
                    | Token::Func
                    | Token::LBrack
                    | Token::Chan
                    | Token::Map
                    | Token::Struct
                    | Token::Interface
                    | Token::LParen => {
                        f.typ = Some(p.parse_type()?);
                    }
                    Token::Ellipsis => {
                        // "..." type, always accepted
                        f.typ = Some(p.parse_dots_type()?);
                        return Ok(f);
                    }
                    _ => {
                        p.error_expected(p.pos, "')'")?;
                        p.advance(expr_end)?;
                    }
                }
            }

            // [name] type "|"
            if type_sets_ok && p.tok == Token::Or {
                if let Some(typ) = f.typ {
                    f.typ = Some(p.embedded_elem(Some(typ))?);
                }
            }
            Ok(f)
        })
    }

    /// Parameters up to (not including) `closing`. `name0`/`typ0` are an
    /// already consumed first name and type.
    pub(super) fn parse_parameter_list(
        &mut self,
        name0: Option<IdentId>,
        typ0: Option<ExprId>,
        closing: Token,
    ) -> PResult<Items<FieldId>> {
        self.traced("ParameterList", |p| {
            // Type parameters are the only parameter list closed by ']'.
            let tparams = closing == Token::RBrack;

            let pos0 = match (name0, typ0) {
                (Some(n), _) => p.a.idents[n].name_pos,
                (None, Some(t)) => p.a.expr_pos(t),
                (None, None) => p.pos,
            };

            let mut list: Vec<Param> = Vec::new();
            let mut named = 0usize; // parameters with an explicit name and type
            let mut typed = 0usize; // parameters with an explicit type

            let (mut name0, mut typ0) = (name0, typ0);
            while name0.is_some() || (p.tok != closing && p.tok != Token::Eof) {
                let par = match typ0 {
                    Some(mut t) => {
                        if tparams {
                            t = p.embedded_elem(Some(t))?;
                        }
                        Param { name: name0, typ: Some(t) }
                    }
                    None => p.parse_param_decl(name0, tparams)?,
                };
                name0 = None;
                typ0 = None;
                if par.name.is_some() || par.typ.is_some() {
                    list.push(par);
                    if par.name.is_some() && par.typ.is_some() {
                        named += 1;
                    }
                    if par.typ.is_some() {
                        typed += 1;
                    }
                }
                if !p.at_comma("parameter list", closing)? {
                    break;
                }
                p.next();
            }

            if list.is_empty() {
                return Ok(SmallVec::new());
            }

            // Distribute parameter types.
            if named == 0 {
                // All unnamed: the names found are type names.
                for par in &mut list {
                    if let Some(n) = par.name.take() {
                        par.typ = Some(p.ident_expr(n));
                    }
                }
                if tparams {
                    let (err_pos, msg) = if named == typed {
                        (p.pos, String::from("missing type constraint"))
                    } else {
                        let mut msg = String::from("missing type parameter name");
                        if list.len() == 1 {
                            msg.push_str(" or invalid array length");
                        }
                        (pos0, msg)
                    };
                    p.error(err_pos, msg)?;
                }
            } else if named != list.len() {
                // Some named: all must be named.
                let mut err_pos = Pos::NONE;
                let mut typ: Option<ExprId> = None;
                for par in list.iter_mut().rev() {
                    if let Some(t) = par.typ {
                        typ = Some(t);
                        if par.name.is_none() {
                            err_pos = p.a.expr_pos(t);
                            par.name = Some(p.a.new_ident(err_pos, "_"));
                        }
                    } else if typ.is_some() {
                        par.typ = typ;
                    } else if let Some(n) = par.name {
                        // Only a name, and no type to its right.
                        err_pos = p.a.idents[n].name_pos;
                        par.typ = Some(p.bad_expr(err_pos, p.pos));
                    }
                }
                if err_pos.is_valid() {
                    // named == typed: trailing parameters lack a type.
                    // Otherwise some parameter lacks a name.
                    let msg = if named == typed {
                        err_pos = p.pos;
                        if tparams {
                            String::from("missing type constraint")
                        } else {
                            String::from("missing parameter type")
                        }
                    } else if tparams {
                        let mut msg = String::from("missing type parameter name");
                        if list.len() == 1 {
                            msg.push_str(" or invalid array length");
                        }
                        msg
                    } else {
                        String::from("missing parameter name")
                    };
                    p.error(err_pos, msg)?;
                }
            }

            let mut params: Items<FieldId> = SmallVec::new();
            if named == 0 {
                // Types only: one field each.
                for par in &list {
                    if let Some(typ) = par.typ {
                        params.push(p.anon_field(typ, None));
                    }
                }
                return Ok(params);
            }

            // Group consecutive names sharing one type into a single field.
            let mut names: Items<IdentId> = SmallVec::new();
            let mut typ: Option<ExprId> = None;
            for par in &list {
                if par.typ != typ {
                    if let (false, Some(t)) = (names.is_empty(), typ) {
                        params.push(p.named_field(&mut names, t));
                    }
                    typ = par.typ;
                }
                if let Some(n) = par.name {
                    names.push(n);
                }
            }
            if let (false, Some(t)) = (names.is_empty(), typ) {
                params.push(p.named_field(&mut names, t));
            }
            Ok(params)
        })
    }

    fn named_field(&mut self, names: &mut Items<IdentId>, typ: ExprId) -> FieldId {
        let names = self.a.list_idents(names.drain(..));
        self.a.fields.alloc(Field {
            doc: None,
            names,
            typ,
            tag: None,
            comment: None,
        })
    }

    /// Optional `[type params]` followed by `(params)`.
    pub(super) fn parse_parameters(
        &mut self,
        accept_tparams: bool,
    ) -> PResult<(Option<FieldListId>, FieldListId)> {
        self.traced("Parameters", |p| {
            let mut tparams = None;
            if accept_tparams && p.tok == Token::LBrack {
                let opening = p.pos;
                p.next();
                let list = p.parse_parameter_list(None, None, Token::RBrack)?;
                let rbrack = p.expect(Token::RBrack)?;
                let fl = p.field_list(opening, list, rbrack);
                if p.a.num_fields(fl) == 0 {
                    p.error(rbrack, "empty type parameter list")?;
                } else {
                    tparams = Some(fl);
                }
            }

            let opening = p.expect(Token::LParen)?;
            let fields = if p.tok != Token::RParen {
                p.parse_parameter_list(None, None, Token::RParen)?
            } else {
                SmallVec::new()
            };
            let rparen = p.expect(Token::RParen)?;
            let params = p.field_list(opening, fields, rparen);
            Ok((tparams, params))
        })
    }

    pub(super) fn parse_result(&mut self) -> PResult<Option<FieldListId>> {
        self.traced("Result", |p| {
            if p.tok == Token::LParen {
                let (_, results) = p.parse_parameters(false)?;
                return Ok(Some(results));
            }
            match p.try_ident_or_type()? {
                Some(typ) => {
                    let field = p.anon_field(typ, None);
                    Ok(Some(p.field_list(Pos::NONE, SmallVec::from_elem(field, 1), Pos::NONE)))
                }
                None => Ok(None),
            }
        })
    }

    pub(super) fn parse_func_type(&mut self) -> PResult<ExprId> {
        self.traced("FuncType", |p| {
            let func = p.expect(Token::Func)?;
            let (tparams, params) = p.parse_parameters(true)?;
            if let Some(tp) = tparams {
                let pos = p.a.field_list_pos(tp);
                p.error(pos, "function type must have no type parameters")?;
            }
            let results = p.parse_result()?;
            Ok(p.alloc_expr(Expr::FuncType {
                func,
                type_params: None,
                params,
                results,
            }))
        })
    }

    /// A method or embedded element of an interface; the line comment is
    /// attached by the caller.
    fn parse_method_spec(&mut self) -> PResult<Field> {
        self.traced("MethodSpec", |p| {
            let doc = p.lead_comment;
            let mut idents = ListRef::EMPTY;
            let x = p.parse_type_name(None)?;
            let typ = match p.as_ident(x) {
                Some(ident) if p.tok == Token::LBrack => {
                    // generic method or embedded instantiated type
                    let lbrack = p.pos;
                    p.next();
                    p.expr_lev += 1;
                    let arg = p.parse_expr()?;
                    p.expr_lev -= 1;
                    match p.as_ident(arg) {
                        Some(name0) if p.tok != Token::Comma && p.tok != Token::RBrack => {
                            // m[T any]: parsed for recovery, then rejected.
                            p.parse_parameter_list(Some(name0), None, Token::RBrack)?;
                            p.expect(Token::RBrack)?;
                            p.error(lbrack, "interface method must have no type parameters")?;
                            let (_, params) = p.parse_parameters(false)?;
                            let results = p.parse_result()?;
                            idents = p.a.list_idents([ident]);
                            p.alloc_expr(Expr::FuncType {
                                func: Pos::NONE,
                                type_params: None,
                                params,
                                results,
                            })
                        }
                        _ => {
                            // embedded instantiated type
                            let mut list: Items<ExprId> = SmallVec::from_elem(arg, 1);
                            if p.at_comma("type argument list", Token::RBrack)? {
                                p.expr_lev += 1;
                                p.next();
                                while p.tok != Token::RBrack && p.tok != Token::Eof {
                                    list.push(p.parse_type()?);
                                    if !p.at_comma("type argument list", Token::RBrack)? {
                                        break;
                                    }
                                    p.next();
                                }
                                p.expr_lev -= 1;
                            }
                            let rbrack = p.expect_closing(Token::RBrack, "type argument list")?;
                            p.pack_index_expr(x, lbrack, list, rbrack)
                        }
                    }
                }
                Some(ident) if p.tok == Token::LParen => {
                    // ordinary method
                    let (_, params) = p.parse_parameters(false)?;
                    let results = p.parse_result()?;
                    idents = p.a.list_idents([ident]);
                    p.alloc_expr(Expr::FuncType {
                        func: Pos::NONE,
                        type_params: None,
                        params,
                        results,
                    })
                }
                Some(_) => x,
                None => {
                    // embedded, possibly instantiated type
                    if p.tok == Token::LBrack {
                        p.parse_type_instance(x)?
                    } else {
                        x
                    }
                }
            };
            Ok(Field {
                doc,
                names: idents,
                typ,
                tag: None,
                comment: None,
            })
        })
    }

    /// A union of terms `t1 | t2 | ...`, optionally starting from `x`.
    pub(super) fn embedded_elem(&mut self, x: Option<ExprId>) -> PResult<ExprId> {
        self.traced("EmbeddedElem", |p| {
            let mut x = match x {
                Some(x) => x,
                None => p.embedded_term()?,
            };
            while p.tok == Token::Or {
                let op_pos = p.pos;
                p.next();
                let y = p.embedded_term()?;
                x = p.alloc_expr(Expr::Binary {
                    x,
                    op_pos,
                    op: Token::Or,
                    y,
                });
            }
            Ok(x)
        })
    }

    fn embedded_term(&mut self) -> PResult<ExprId> {
        self.traced("EmbeddedTerm", |p| {
            if p.tok == Token::Tilde {
                let op_pos = p.pos;
                p.next();
                let x = p.parse_type()?;
                return Ok(p.alloc_expr(Expr::Unary {
                    op_pos,
                    op: Token::Tilde,
                    x,
                }));
            }
            match p.try_ident_or_type()? {
                Some(t) => Ok(t),
                None => {
                    let pos = p.pos;
                    p.error_expected(pos, "~ term or type")?;
                    p.advance(expr_end)?;
                    Ok(p.bad_expr(pos, p.pos))
                }
            }
        })
    }

    fn parse_interface_type(&mut self) -> PResult<ExprId> {
        self.traced("InterfaceType", |p| {
            let interface = p.expect(Token::Interface)?;
            let lbrace = p.expect(Token::LBrace)?;
            let mut list: Items<FieldId> = SmallVec::new();

            loop {
                let field = match p.tok {
                    Token::Ident => {
                        let mut f = p.parse_method_spec()?;
                        if f.names.is_empty() {
                            f.typ = p.embedded_elem(Some(f.typ))?;
                        }
                        f.comment = p.expect_semi()?;
                        f
                    }
                    Token::Tilde => {
                        let typ = p.embedded_elem(None)?;
                        let comment = p.expect_semi()?;
                        Field {
                            doc: None,
                            names: ListRef::EMPTY,
                            typ,
                            tag: None,
                            comment,
                        }
                    }
                    _ => match p.try_ident_or_type()? {
                        Some(t) => {
                            let typ = p.embedded_elem(Some(t))?;
                            let comment = p.expect_semi()?;
                            Field {
                                doc: None,
                                names: ListRef::EMPTY,
                                typ,
                                tag: None,
                                comment,
                            }
                        }
                        None => break,
                    },
                };
                list.push(p.a.fields.alloc(field));
            }

            let rbrace = p.expect(Token::RBrace)?;
            let methods = p.field_list(lbrace, list, rbrace);
            Ok(p.alloc_expr(Expr::InterfaceType {
                interface,
                methods,
                incomplete: false,
            }))
        })
    }

    fn parse_map_type(&mut self) -> PResult<ExprId> {
        self.traced("MapType", |p| {
            let map = p.expect(Token::Map)?;
            p.expect(Token::LBrack)?;
            let key = p.parse_type()?;
            p.expect(Token::RBrack)?;
            let value = p.parse_type()?;
            Ok(p.alloc_expr(Expr::MapType { map, key, value }))
        })
    }

    fn parse_chan_type(&mut self) -> PResult<ExprId> {
        self.traced("ChanType", |p| {
            let begin = p.pos;
            let mut dir = ChanDir::Both;
            let mut arrow = Pos::NONE;
            if p.tok == Token::Chan {
                p.next();
                if p.tok == Token::Arrow {
                    arrow = p.pos;
                    p.next();
                    dir = ChanDir::Send;
                }
            } else {
                arrow = p.expect(Token::Arrow)?;
                p.expect(Token::Chan)?;
                dir = ChanDir::Recv;
            }
            let value = p.parse_type()?;
            Ok(p.alloc_expr(Expr::ChanType {
                begin,
                arrow,
                dir,
                value,
            }))
        })
    }

    /// `typ[T1, T2, ...]`
    pub(super) fn parse_type_instance(&mut self, typ: ExprId) -> PResult<ExprId> {
        self.traced("TypeInstance", |p| {
            let opening = p.expect(Token::LBrack)?;
            p.expr_lev += 1;
            let mut list: Items<ExprId> = SmallVec::new();
            while p.tok != Token::RBrack && p.tok != Token::Eof {
                list.push(p.parse_type()?);
                if !p.at_comma("type argument list", Token::RBrack)? {
                    break;
                }
                p.next();
            }
            p.expr_lev -= 1;

            let closing = p.expect_closing(Token::RBrack, "type argument list")?;

            if list.is_empty() {
                p.error_expected(closing, "type argument list")?;
                let index = p.bad_expr(opening + 1, closing);
                return Ok(p.alloc_expr(Expr::Index {
                    x: typ,
                    lbrack: opening,
                    index,
                    rbrack: closing,
                }));
            }
            Ok(p.pack_index_expr(typ, opening, list, closing))
        })
    }

    /// `x[i]` for one index, `x[i, j, ...]` otherwise.
    pub(super) fn pack_index_expr(
        &mut self,
        x: ExprId,
        lbrack: Pos,
        exprs: Items<ExprId>,
        rbrack: Pos,
    ) -> ExprId {
        match exprs.as_slice() {
            [index] => self.alloc_expr(Expr::Index {
                x,
                lbrack,
                index: *index,
                rbrack,
            }),
            _ => {
                let indices = self.a.list_exprs(exprs);
                self.alloc_expr(Expr::IndexList {
                    x,
                    lbrack,
                    indices,
                    rbrack,
                })
            }
        }
    }

    /// Any type, or `None` (consuming nothing) if no type starts here.
    pub(super) fn try_ident_or_type(&mut self) -> PResult<Option<ExprId>> {
        self.nested("IdentOrType", |p| {
            let typ = match p.tok {
                Token::Ident => {
                    let typ = p.parse_type_name(None)?;
                    if p.tok == Token::LBrack {
                        p.parse_type_instance(typ)?
                    } else {
                        typ
                    }
                }
                Token::LBrack => {
                    let lbrack = p.expect(Token::LBrack)?;
                    p.parse_array_type(lbrack, None)?
                }
                Token::Struct => p.parse_struct_type()?,
                Token::Mul => p.parse_pointer_type()?,
                Token::Func => p.parse_func_type()?,
                Token::Interface => p.parse_interface_type()?,
                Token::Map => p.parse_map_type()?,
                Token::Chan | Token::Arrow => p.parse_chan_type()?,
                Token::LParen => {
                    let lparen = p.pos;
                    p.next();
                    let x = p.parse_type()?;
                    let rparen = p.expect(Token::RParen)?;
                    p.alloc_expr(Expr::Paren { lparen, x, rparen })
                }
                _ => return Ok(None),
            };
            Ok(Some(typ))
        })
    }
}
