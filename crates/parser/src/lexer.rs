use bitflags::bitflags;
use logos::{Lexer as LogosLexer, Logos};
use memchr::{memchr, memmem};

use crate::error::LexErrorKind;
use crate::position::Pos;
use crate::token::Token;

// =============================================================================
// 0. Shared helpers
// =============================================================================

/// A lexical error recorded by a logos callback: byte offset + kind.
type RawDiag = (usize, LexErrorKind);

#[inline(always)]
const fn lower(b: u8) -> u8 {
    b | 0x20
}

#[inline(always)]
const fn is_decimal(b: u8) -> bool {
    b.is_ascii_digit()
}

#[inline(always)]
const fn is_hex(b: u8) -> bool {
    b.is_ascii_hexdigit()
}

#[inline(always)]
const fn digit_val(b: u8) -> u32 {
    match b {
        b'0'..=b'9' => (b - b'0') as u32,
        b'a'..=b'f' => (b - b'a' + 10) as u32,
        b'A'..=b'F' => (b - b'A' + 10) as u32,
        _ => 16,
    }
}

#[inline(always)]
const fn utf8_len(lead: u8) -> usize {
    match lead {
        0x00..=0x7F => 1,
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        _ => 4,
    }
}

/// `U+0040 '@'` rendering of the character starting at `src[at..]`.
fn describe_char(src: &str, at: usize) -> String {
    match src.get(at..).and_then(|s| s.chars().next()) {
        Some(c) => format!("U+{:04X} '{}'", c as u32, c),
        None => "EOF".to_string(),
    }
}

/// After a block comment ending at `i`, reports whether only whitespace and
/// further comments remain on the line.
fn line_ends_after(src: &[u8], mut i: usize) -> bool {
    loop {
        while matches!(src.get(i), Some(b' ' | b'\t' | b'\r')) {
            i += 1;
        }
        match (src.get(i), src.get(i + 1)) {
            (None, _) | (Some(b'\n'), _) => return true,
            (Some(b'/'), Some(b'/')) => return true,
            (Some(b'/'), Some(b'*')) => {
                let body = &src[i + 2..];
                match memmem::find(body, b"*/") {
                    Some(end) if memchr(b'\n', &body[..end]).is_none() => i += 2 + end + 2,
                    _ => return true,
                }
            }
            _ => return false,
        }
    }
}

// =============================================================================
// 1. Comments
// =============================================================================

fn lex_line_comment(lex: &mut LogosLexer<'_, RawTok>) {
    let rem = lex.remainder().as_bytes();
    let mut len = memchr(b'\n', rem).unwrap_or(rem.len());
    if len > 0 && rem[len - 1] == b'\r' {
        len -= 1;
    }
    lex.bump(len);
}

fn lex_block_comment(lex: &mut LogosLexer<'_, RawTok>) {
    let rem = lex.remainder().as_bytes();
    match memmem::find(rem, b"*/") {
        Some(end) => lex.bump(end + 2),
        None => {
            let start = lex.span().start;
            lex.bump(rem.len());
            lex.extras.push((start, LexErrorKind::UnterminatedComment));
        }
    }
}

// =============================================================================
// 2. String, raw string and rune literals
// =============================================================================

/// Validates one escape sequence; `i` points just past the backslash.
/// Returns the index after the sequence (or at the offending byte).
fn scan_escape(src: &str, mut i: usize, quote: u8, diags: &mut Vec<RawDiag>) -> (usize, bool) {
    let bytes = src.as_bytes();
    let start = i - 1;
    let (mut n, base, max) = match bytes.get(i) {
        Some(b'a' | b'b' | b'f' | b'n' | b'r' | b't' | b'v' | b'\\') => return (i + 1, true),
        Some(&c) if c == quote => return (i + 1, true),
        Some(b'0'..=b'7') => (3, 8, 255),
        Some(b'x') => {
            i += 1;
            (2, 16, 255)
        }
        Some(b'u') => {
            i += 1;
            (4, 16, 0x10_FFFF)
        }
        Some(b'U') => {
            i += 1;
            (8, 16, 0x10_FFFF)
        }
        Some(b'\n') | None => {
            diags.push((start, LexErrorKind::UnterminatedEscape));
            return (i, false);
        }
        Some(_) => {
            diags.push((start, LexErrorKind::UnknownEscape));
            return (i, false);
        }
    };

    let mut x: u32 = 0;
    while n > 0 {
        let d = bytes.get(i).map_or(16, |&b| digit_val(b));
        if d >= base {
            let kind = match bytes.get(i) {
                None | Some(b'\n') => LexErrorKind::UnterminatedEscape,
                Some(_) => LexErrorKind::IllegalEscapeChar(describe_char(src, i)),
            };
            diags.push((i, kind));
            return (i, false);
        }
        x = x * base + d;
        i += 1;
        n -= 1;
    }

    if x > max || (0xD800..0xE000).contains(&x) {
        diags.push((start, LexErrorKind::InvalidCodePoint));
        return (i, false);
    }
    (i, true)
}

fn lex_string(lex: &mut LogosLexer<'_, RawTok>) {
    let src = lex.source();
    let bytes = src.as_bytes();
    let start = lex.span().start;
    let mut i = lex.span().end;
    loop {
        match bytes.get(i) {
            Some(b'"') => {
                i += 1;
                break;
            }
            Some(b'\n') | None => {
                lex.extras.push((start, LexErrorKind::UnterminatedString));
                break;
            }
            Some(b'\\') => i = scan_escape(src, i + 1, b'"', &mut lex.extras).0,
            Some(&b) => i += utf8_len(b),
        }
    }
    lex.bump(i - lex.span().end);
}

fn lex_raw_string(lex: &mut LogosLexer<'_, RawTok>) {
    let rem = lex.remainder().as_bytes();
    match memchr(b'`', rem) {
        Some(end) => lex.bump(end + 1),
        None => {
            let start = lex.span().start;
            lex.bump(rem.len());
            lex.extras.push((start, LexErrorKind::UnterminatedRawString));
        }
    }
}

fn lex_rune(lex: &mut LogosLexer<'_, RawTok>) {
    let src = lex.source();
    let bytes = src.as_bytes();
    let start = lex.span().start;
    let mut i = lex.span().end;
    let mut n = 0usize;
    let mut valid = true;
    loop {
        match bytes.get(i) {
            Some(b'\n') | None => {
                if valid {
                    lex.extras.push((start, LexErrorKind::UnterminatedRune));
                    valid = false;
                }
                break;
            }
            Some(b'\'') => {
                i += 1;
                break;
            }
            Some(b'\\') => {
                n += 1;
                let (next, ok) = scan_escape(src, i + 1, b'\'', &mut lex.extras);
                valid &= ok;
                i = next;
            }
            Some(&b) => {
                n += 1;
                i += utf8_len(b);
            }
        }
    }
    if valid && n != 1 {
        lex.extras.push((start, LexErrorKind::IllegalRune));
    }
    lex.bump(i - lex.span().end);
}

// =============================================================================
// 3. Numbers
// =============================================================================

fn litname(prefix: u8) -> &'static str {
    match prefix {
        b'x' => "hexadecimal literal",
        b'o' | b'0' => "octal literal",
        b'b' => "binary literal",
        _ => "decimal literal",
    }
}

/// Consumes digits of `base` plus `_`. Bit 0 of the result: saw a digit;
/// bit 1: saw a separator. Records the first digit invalid for `base`.
fn scan_digits(src: &[u8], i: &mut usize, base: u32, invalid: &mut Option<usize>) -> u8 {
    let mut digsep = 0;
    while let Some(&b) = src.get(*i) {
        let ok = if base <= 10 { is_decimal(b) } else { is_hex(b) };
        if b == b'_' {
            digsep |= 2;
        } else if ok {
            if base <= 10 && digit_val(b) >= base && invalid.is_none() {
                *invalid = Some(*i);
            }
            digsep |= 1;
        } else {
            break;
        }
        *i += 1;
    }
    digsep
}

/// Index of the first misplaced `_` in a number literal, if any.
fn invalid_sep(lit: &[u8]) -> Option<usize> {
    let mut x1 = b' ';
    let mut d = b'.';
    let mut i = 0;
    if lit.len() >= 2 && lit[0] == b'0' {
        x1 = lower(lit[1]);
        if matches!(x1, b'x' | b'o' | b'b') {
            d = b'0';
            i = 2;
        }
    }
    while i < lit.len() {
        let p = d;
        d = lit[i];
        if d == b'_' {
            if p != b'0' {
                return Some(i);
            }
        } else if is_decimal(d) || (x1 == b'x' && is_hex(d)) {
            d = b'0';
        } else {
            if p == b'_' {
                return Some(i - 1);
            }
            d = b'.';
        }
        i += 1;
    }
    (d == b'_').then(|| lit.len() - 1)
}

/// Maximal-munch number scanner with Go's diagnostics.
fn lex_number(lex: &mut LogosLexer<'_, RawTok>) -> Token {
    let src = lex.source().as_bytes();
    let start = lex.span().start;
    let at = |i: usize| src.get(i).copied().unwrap_or(0);

    let mut i = start;
    let mut tok = Token::Illegal;
    let mut base = 10;
    let mut prefix = 0u8;
    let mut digsep = 0u8;
    let mut invalid = None;
    let mut diags: Vec<RawDiag> = Vec::new();

    if at(i) != b'.' {
        tok = Token::Int;
        if at(i) == b'0' {
            i += 1;
            match lower(at(i)) {
                b'x' => (base, prefix, i) = (16, b'x', i + 1),
                b'o' => (base, prefix, i) = (8, b'o', i + 1),
                b'b' => (base, prefix, i) = (2, b'b', i + 1),
                _ => (base, prefix, digsep) = (8, b'0', 1),
            }
        }
        digsep |= scan_digits(src, &mut i, base, &mut invalid);
    }

    if at(i) == b'.' {
        tok = Token::Float;
        if prefix == b'o' || prefix == b'b' {
            diags.push((i, LexErrorKind::InvalidNumber(format!("invalid radix point in {}", litname(prefix)))));
        }
        i += 1;
        digsep |= scan_digits(src, &mut i, base, &mut invalid);
    }

    if digsep & 1 == 0 {
        diags.push((i, LexErrorKind::InvalidNumber(format!("{} has no digits", litname(prefix)))));
    }

    let e = lower(at(i));
    if e == b'e' || e == b'p' {
        if e == b'e' && prefix != 0 && prefix != b'0' {
            diags.push((i, LexErrorKind::InvalidNumber(format!("'{}' exponent requires decimal mantissa", at(i) as char))));
        } else if e == b'p' && prefix != b'x' {
            diags.push((i, LexErrorKind::InvalidNumber(format!("'{}' exponent requires hexadecimal mantissa", at(i) as char))));
        }
        i += 1;
        tok = Token::Float;
        if matches!(at(i), b'+' | b'-') {
            i += 1;
        }
        let ds = scan_digits(src, &mut i, 10, &mut None);
        digsep |= ds;
        if ds & 1 == 0 {
            diags.push((i, LexErrorKind::InvalidNumber("exponent has no digits".into())));
        }
    } else if prefix == b'x' && tok == Token::Float {
        diags.push((i, LexErrorKind::InvalidNumber("hexadecimal mantissa requires a 'p' exponent".into())));
    }

    if at(i) == b'i' {
        tok = Token::Imag;
        i += 1;
    }

    let lit = &src[start..i];
    if tok == Token::Int {
        if let Some(bad) = invalid {
            let msg = format!("invalid digit '{}' in {}", src[bad] as char, litname(prefix));
            diags.push((bad, LexErrorKind::InvalidNumber(msg)));
        }
    }
    if digsep & 2 != 0 {
        if let Some(off) = invalid_sep(lit) {
            diags.push((start + off, LexErrorKind::InvalidNumber("'_' must separate successive digits".into())));
        }
    }

    lex.bump(i - lex.span().end);
    lex.extras.extend(diags);
    tok
}

// =============================================================================
// 4. Raw token definition (logos DFA)
// =============================================================================

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(error = LexErrorKind)]
#[logos(extras = Vec<RawDiag>)]
#[logos(skip r"[ \t\r]+")]
#[rustfmt::skip]
enum RawTok {
    #[token("\u{FEFF}")] Bom,
    #[token("\n")] Newline,
    #[token("//", lex_line_comment)] LineComment,
    #[token("/*", lex_block_comment)] BlockComment,

    #[token("break")] Break,
    #[token("case")] Case,
    #[token("chan")] Chan,
    #[token("const")] Const,
    #[token("continue")] Continue,
    #[token("default")] Default,
    #[token("defer")] Defer,
    #[token("else")] Else,
    #[token("fallthrough")] Fallthrough,
    #[token("for")] For,
    #[token("func")] Func,
    #[token("go")] Go,
    #[token("goto")] Goto,
    #[token("if")] If,
    #[token("import")] Import,
    #[token("interface")] Interface,
    #[token("map")] Map,
    #[token("package")] Package,
    #[token("range")] Range,
    #[token("return")] Return,
    #[token("select")] Select,
    #[token("struct")] Struct,
    #[token("switch")] Switch,
    #[token("type")] Type,
    #[token("var")] Var,

    #[regex(r"[_\p{L}][_\p{L}\p{Nd}]*")] Ident,
    #[regex(r"[0-9]|\.[0-9]", lex_number)] Number(Token),
    #[token("\"", lex_string)] String,
    #[token("`", lex_raw_string)] RawString,
    #[token("'", lex_rune)] Rune,

    #[token("...")] Ellipsis,
    #[token("<<=")] ShlAssign,
    #[token(">>=")] ShrAssign,
    #[token("&^=")] AndNotAssign,
    #[token("+=")] AddAssign,
    #[token("-=")] SubAssign,
    #[token("*=")] MulAssign,
    #[token("/=")] QuoAssign,
    #[token("%=")] RemAssign,
    #[token("&=")] AndAssign,
    #[token("|=")] OrAssign,
    #[token("^=")] XorAssign,
    #[token("<<")] Shl,
    #[token(">>")] Shr,
    #[token("&^")] AndNot,
    #[token("&&")] LAnd,
    #[token("||")] LOr,
    #[token("==")] Eql,
    #[token("!=")] Neq,
    #[token("<=")] Leq,
    #[token(">=")] Geq,
    #[token("++")] Inc,
    #[token("--")] Dec,
    #[token(":=")] Define,
    #[token("<-")] Arrow,
    #[token("=")] Assign,
    #[token("+")] Add,
    #[token("-")] Sub,
    #[token("*")] Mul,
    #[token("/")] Quo,
    #[token("%")] Rem,
    #[token("&")] And,
    #[token("|")] Or,
    #[token("^")] Xor,
    #[token("~")] Tilde,
    #[token("!")] Not,
    #[token("<")] Lss,
    #[token(">")] Gtr,
    #[token("(")] LParen,
    #[token(")")] RParen,
    #[token("[")] LBrack,
    #[token("]")] RBrack,
    #[token("{")] LBrace,
    #[token("}")] RBrace,
    #[token(",")] Comma,
    #[token(";")] Semicolon,
    #[token(":")] Colon,
    #[token(".")] Period,

    #[regex(r".", priority = 0)] Illegal,
}

impl RawTok {
    /// Token class for non-trivia raw tokens.
    const fn token(self) -> Token {
        macro_rules! same {
            ($($v:ident),* $(,)?) => {
                match self {
                    $(RawTok::$v => Token::$v,)*
                    RawTok::Number(tok) => tok,
                    RawTok::RawString => Token::String,
                    RawTok::Rune => Token::Char,
                    RawTok::LineComment | RawTok::BlockComment => Token::Comment,
                    RawTok::Bom | RawTok::Newline => Token::Illegal,
                }
            };
        }
        same! {
            Break, Case, Chan, Const, Continue, Default, Defer, Else, Fallthrough, For, Func, Go,
            Goto, If, Import, Interface, Map, Package, Range, Return, Select, Struct, Switch, Type,
            Var, Ident, String, Ellipsis, ShlAssign, ShrAssign, AndNotAssign, AddAssign, SubAssign,
            MulAssign, QuoAssign, RemAssign, AndAssign, OrAssign, XorAssign, Shl, Shr, AndNot, LAnd,
            LOr, Eql, Neq, Leq, Geq, Inc, Dec, Define, Arrow, Assign, Add, Sub, Mul, Quo, Rem, And,
            Or, Xor, Tilde, Not, Lss, Gtr, LParen, RParen, LBrack, RBrack, LBrace, RBrace, Comma,
            Semicolon, Colon, Period, Illegal,
        }
    }
}

/// Tokens after which a newline becomes a semicolon.
#[inline]
const fn ends_statement(tok: Token) -> bool {
    matches!(
        tok,
        Token::Ident
            | Token::Int
            | Token::Float
            | Token::Imag
            | Token::Char
            | Token::String
            | Token::Break
            | Token::Continue
            | Token::Fallthrough
            | Token::Return
            | Token::Inc
            | Token::Dec
            | Token::RParen
            | Token::RBrack
            | Token::RBrace
    )
}

// =============================================================================
// 5. Lexer wrapper: positions, semicolon insertion, comments, diagnostics
// =============================================================================

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ScanMode: u8 {
        /// Return comments as `Token::Comment`.
        const COMMENTS = 1 << 0;
    }
}

/// A lexical diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub pos: Pos,
    pub kind: LexErrorKind,
}

pub type Scanned<'src> = (Pos, Token, &'src str);

/// Pull-style Go lexer.
///
/// `next_token` never fails: malformed input yields `Token::Illegal` or a literal
/// token plus a recorded [`LexError`]. After the end of input it keeps
/// returning `Token::Eof`.
pub struct Lexer<'src> {
    logos: LogosLexer<'src, RawTok>,
    base: u32,
    mode: ScanMode,
    pending: Option<Scanned<'src>>,
    insert_semi: bool,
    eof: bool,
    errors: Vec<LexError>,
}

impl<'src> Lexer<'src> {
    /// Lexer over `input` with comments dropped and positions based at 1.
    pub fn new(input: &'src str) -> Self {
        Self::with_mode(input, 1, ScanMode::empty())
    }

    pub fn with_mode(input: &'src str, base: u32, mode: ScanMode) -> Self {
        Self {
            logos: RawTok::lexer(input),
            base: base.max(1),
            mode,
            pending: None,
            insert_semi: false,
            eof: false,
            errors: Vec::new(),
        }
    }

    pub fn take_errors(&mut self) -> Vec<LexError> {
        std::mem::take(&mut self.errors)
    }

    #[inline]
    fn pos(&self, offset: usize) -> Pos {
        Pos::from_raw(self.base) + offset
    }

    fn error(&mut self, offset: usize, kind: LexErrorKind) {
        let pos = self.pos(offset);
        self.errors.push(LexError { pos, kind });
    }

    fn drain_extras(&mut self) {
        if self.logos.extras.is_empty() {
            return;
        }
        for (offset, kind) in std::mem::take(&mut self.logos.extras) {
            self.error(offset, kind);
        }
    }

    /// Returns the next token with its position and source text.
    ///
    /// Automatically inserted semicolons carry the literal `"\n"`.
    pub fn next_token(&mut self) -> Scanned<'src> {
        loop {
            if let Some(tok) = self.pending.take() {
                return tok;
            }
            let src_len = self.logos.source().len();
            if self.eof {
                return (self.pos(src_len), Token::Eof, "");
            }

            let next = self.logos.next();
            self.drain_extras();
            let span = self.logos.span();
            let slice = self.logos.slice();
            let pos = self.pos(span.start);

            let raw = match next {
                None => {
                    self.eof = true;
                    if std::mem::take(&mut self.insert_semi) {
                        return (self.pos(src_len), Token::Semicolon, "\n");
                    }
                    continue;
                }
                Some(Ok(raw)) => raw,
                Some(Err(_)) => {
                    let what = describe_char(self.logos.source(), span.start);
                    self.error(span.start, LexErrorKind::IllegalChar(what));
                    return (pos, Token::Illegal, slice);
                }
            };

            match raw {
                RawTok::Bom => {
                    if span.start == 0 {
                        continue;
                    }
                    self.error(span.start, LexErrorKind::IllegalBom);
                    return (pos, Token::Illegal, slice);
                }
                RawTok::Newline => {
                    if std::mem::take(&mut self.insert_semi) {
                        return (pos, Token::Semicolon, "\n");
                    }
                }
                RawTok::LineComment | RawTok::BlockComment => {
                    let keep = self.mode.contains(ScanMode::COMMENTS);
                    let ends_line = raw == RawTok::LineComment
                        || memchr(b'\n', slice.as_bytes()).is_some()
                        || line_ends_after(self.logos.source().as_bytes(), span.end);
                    if self.insert_semi && ends_line {
                        self.insert_semi = false;
                        if keep {
                            self.pending = Some((pos, Token::Comment, slice));
                        }
                        return (pos, Token::Semicolon, "\n");
                    }
                    if keep {
                        return (pos, Token::Comment, slice);
                    }
                }
                RawTok::Illegal => {
                    let what = describe_char(self.logos.source(), span.start);
                    self.error(span.start, LexErrorKind::IllegalChar(what));
                    return (pos, Token::Illegal, slice);
                }
                _ => {
                    let tok = raw.token();
                    self.insert_semi = ends_statement(tok);
                    return (pos, tok, slice);
                }
            }
        }
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Scanned<'src>;

    /// Like [`Lexer::next_token`], but stops at the end of input.
    fn next(&mut self) -> Option<Self::Item> {
        match self.next_token() {
            (_, Token::Eof, _) => None,
            tok => Some(tok),
        }
    }
}
