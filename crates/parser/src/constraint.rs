//! Build constraint lines: `//go:build` expressions and legacy `// +build` lines.
//!
//! [`parse`] accepts a single line of either form and yields an [`Expr`] tree
//! that can be evaluated against a tag predicate, printed back in `//go:build`
//! syntax, or downgraded with [`plus_build_lines`].

use std::fmt;

use thiserror::Error;

/// Most `!`/atom productions accepted in one `//go:build` expression.
pub const MAX_SIZE: usize = 1000;

/// Most `&&`/`||` operators accepted in one `// +build` line.
pub const MAX_OLD_SIZE: usize = 100;

/// A boolean build-tag expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Tag(String),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

fn tag(s: &str) -> Expr {
    Expr::Tag(s.to_string())
}

fn not(x: Expr) -> Expr {
    Expr::Not(Box::new(x))
}

fn and(x: Expr, y: Expr) -> Expr {
    Expr::And(Box::new(x), Box::new(y))
}

fn or(x: Expr, y: Expr) -> Expr {
    Expr::Or(Box::new(x), Box::new(y))
}

impl Expr {
    /// Evaluates the expression, asking `ok` whether each tag is satisfied.
    ///
    /// Both operands of `&&` and `||` are always evaluated, so `ok` sees
    /// every tag in the expression.
    pub fn eval(&self, mut ok: impl FnMut(&str) -> bool) -> bool {
        self.eval_with(&mut ok)
    }

    fn eval_with(&self, ok: &mut dyn FnMut(&str) -> bool) -> bool {
        match self {
            Expr::Tag(t) => ok(t),
            Expr::Not(x) => !x.eval_with(ok),
            Expr::And(x, y) => {
                let xok = x.eval_with(ok);
                let yok = y.eval_with(ok);
                xok && yok
            }
            Expr::Or(x, y) => {
                let xok = x.eval_with(ok);
                let yok = y.eval_with(ok);
                xok || yok
            }
        }
    }
}

/// `//go:build` spelling. Mixed `&&`/`||` operands are always parenthesized.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Tag(t) => f.write_str(t),
            Expr::Not(x) => match **x {
                Expr::And(..) | Expr::Or(..) => write!(f, "!({x})"),
                _ => write!(f, "!{x}"),
            },
            Expr::And(x, y) => {
                write_arg(f, x, matches!(**x, Expr::Or(..)))?;
                f.write_str(" && ")?;
                write_arg(f, y, matches!(**y, Expr::Or(..)))
            }
            Expr::Or(x, y) => {
                write_arg(f, x, matches!(**x, Expr::And(..)))?;
                f.write_str(" || ")?;
                write_arg(f, y, matches!(**y, Expr::And(..)))
            }
        }
    }
}

fn write_arg(f: &mut fmt::Formatter<'_>, x: &Expr, paren: bool) -> fmt::Result {
    if paren {
        write!(f, "({x})")
    } else {
        write!(f, "{x}")
    }
}

/// A malformed `//go:build` expression; `offset` is a byte offset into the
/// expression text after the `//go:build` prefix.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{err}")]
pub struct SyntaxError {
    pub offset: usize,
    pub err: String,
}

fn syntax(offset: usize, err: impl Into<String>) -> SyntaxError {
    SyntaxError {
        offset,
        err: err.into(),
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PlusBuildError {
    #[error("expression too complex for // +build lines")]
    TooComplex,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("not a build constraint")]
    NotConstraint,
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    TooComplex(#[from] PlusBuildError),
}

/// Parses one `//go:build` or `// +build` line. A single trailing newline is allowed.
pub fn parse(line: &str) -> Result<Expr, ParseError> {
    if let Some(text) = split_go_build(line) {
        return Ok(parse_expr(text)?);
    }
    if let Some(text) = split_plus_build(line) {
        return Ok(parse_plus_build_expr(text)?);
    }
    Err(ParseError::NotConstraint)
}

pub fn is_go_build(line: &str) -> bool {
    split_go_build(line).is_some()
}

pub fn is_plus_build(line: &str) -> bool {
    split_plus_build(line).is_some()
}

/// `line` without one trailing newline, or `None` if it spans several lines.
fn single_line(line: &str) -> Option<&str> {
    let line = line.strip_suffix('\n').unwrap_or(line);
    if memchr::memchr(b'\n', line.as_bytes()).is_some() {
        return None;
    }
    Some(line)
}

/// The text after a prefix, which must be followed by whitespace or nothing.
fn after_keyword(rest: &str) -> Option<&str> {
    let trim = rest.trim();
    if rest.len() == trim.len() && !rest.is_empty() {
        // "//go:buildx": a different directive
        return None;
    }
    Some(trim)
}

fn split_go_build(line: &str) -> Option<&str> {
    let line = single_line(line)?;
    if !line.starts_with("//go:build") {
        return None;
    }
    let rest = &line.trim()["//go:build".len()..];
    after_keyword(rest)
}

fn split_plus_build(line: &str) -> Option<&str> {
    let line = single_line(line)?;
    // The space is optional: "//+build" counts too.
    let rest = line.strip_prefix("//")?.trim();
    let rest = rest.strip_prefix("+build")?;
    after_keyword(rest)
}

fn is_tag_char(c: char) -> bool {
    c.is_alphabetic() || c.is_numeric() || c == '_' || c == '.'
}

fn is_valid_tag(word: &str) -> bool {
    !word.is_empty() && word.chars().all(is_tag_char)
}

struct ExprParser<'s> {
    s: &'s str,
    /// Next read offset.
    i: usize,
    /// Last token read; empty at the end of input.
    tok: &'s str,
    is_tag: bool,
    /// Start of the last token.
    pos: usize,
    size: usize,
}

type SResult<T> = Result<T, SyntaxError>;

fn parse_expr(text: &str) -> Result<Expr, SyntaxError> {
    let mut p = ExprParser {
        s: text,
        i: 0,
        tok: "",
        is_tag: false,
        pos: 0,
        size: 0,
    };
    let x = p.or()?;
    if !p.tok.is_empty() {
        return Err(syntax(p.pos, format!("unexpected token {}", p.tok)));
    }
    Ok(x)
}

impl<'s> ExprParser<'s> {
    fn or(&mut self) -> SResult<Expr> {
        let mut x = self.and()?;
        while self.tok == "||" {
            x = or(x, self.and()?);
        }
        Ok(x)
    }

    fn and(&mut self) -> SResult<Expr> {
        let mut x = self.not()?;
        while self.tok == "&&" {
            x = and(x, self.not()?);
        }
        Ok(x)
    }

    fn not(&mut self) -> SResult<Expr> {
        self.size += 1;
        if self.size > MAX_SIZE {
            return Err(syntax(self.pos, "build expression too large"));
        }
        self.lex()?;
        if self.tok == "!" {
            self.lex()?;
            if self.tok == "!" {
                return Err(syntax(self.pos, "double negation not allowed"));
            }
            return Ok(not(self.atom()?));
        }
        self.atom()
    }

    /// The first token is already in `tok`.
    fn atom(&mut self) -> SResult<Expr> {
        if self.tok == "(" {
            let pos = self.pos;
            let x = self.or().map_err(|mut e| {
                if e.err == "unexpected end of expression" {
                    e.err = "missing close paren".into();
                }
                e
            })?;
            if self.tok != ")" {
                return Err(syntax(pos, "missing close paren"));
            }
            self.lex()?;
            return Ok(x);
        }

        if !self.is_tag {
            if self.tok.is_empty() {
                return Err(syntax(self.pos, "unexpected end of expression"));
            }
            return Err(syntax(self.pos, format!("unexpected token {}", self.tok)));
        }
        let t = tag(self.tok);
        self.lex()?;
        Ok(t)
    }

    fn lex(&mut self) -> SResult<()> {
        self.is_tag = false;
        let bytes = self.s.as_bytes();
        while self.i < bytes.len() && (bytes[self.i] == b' ' || bytes[self.i] == b'\t') {
            self.i += 1;
        }
        if self.i >= bytes.len() {
            self.tok = "";
            self.pos = self.i;
            return Ok(());
        }

        match bytes[self.i] {
            b'(' | b')' | b'!' => {
                self.pos = self.i;
                self.i += 1;
                self.tok = &self.s[self.pos..self.i];
                return Ok(());
            }
            c @ (b'&' | b'|') => {
                if bytes.get(self.i + 1) != Some(&c) {
                    return Err(syntax(self.i, format!("invalid syntax at {}", c as char)));
                }
                self.pos = self.i;
                self.i += 2;
                self.tok = &self.s[self.pos..self.i];
                return Ok(());
            }
            _ => {}
        }

        let rest = &self.s[self.i..];
        let len = rest.find(|c: char| !is_tag_char(c)).unwrap_or(rest.len());
        if len == 0 {
            let c = rest.chars().next().unwrap_or('\u{FFFD}');
            return Err(syntax(self.i, format!("invalid syntax at {c}")));
        }
        self.pos = self.i;
        self.i += len;
        self.tok = &self.s[self.pos..self.i];
        self.is_tag = true;
        Ok(())
    }
}

/// Legacy syntax: space-separated options are OR'ed, the comma-separated
/// terms of an option are AND'ed. Invalid terms become the tag `ignore`.
fn parse_plus_build_expr(text: &str) -> Result<Expr, PlusBuildError> {
    let mut size = 0usize;
    let mut x: Option<Expr> = None;
    for clause in text.split_whitespace() {
        let mut y: Option<Expr> = None;
        for lit in clause.split(',') {
            let z = if lit.starts_with("!!") || lit == "!" {
                tag("ignore")
            } else {
                let (neg, word) = match lit.strip_prefix('!') {
                    Some(w) => (true, w),
                    None => (false, lit),
                };
                let z = if is_valid_tag(word) { tag(word) } else { tag("ignore") };
                if neg {
                    not(z)
                } else {
                    z
                }
            };
            y = Some(match y {
                None => z,
                Some(y) => {
                    size += 1;
                    if size > MAX_OLD_SIZE {
                        return Err(PlusBuildError::TooComplex);
                    }
                    and(y, z)
                }
            });
        }
        let Some(y) = y else { continue };
        x = Some(match x {
            None => y,
            Some(x) => {
                size += 1;
                if size > MAX_OLD_SIZE {
                    return Err(PlusBuildError::TooComplex);
                }
                or(x, y)
            }
        });
    }
    Ok(x.unwrap_or_else(|| tag("ignore")))
}

/// The minimum Go version `x` requires, like `go1.21`; `None` when it
/// requires none. Under `||` the lower bound wins; a negated tag implies nothing.
pub fn go_version(x: &Expr) -> Option<String> {
    match min_version(x, true) {
        v if v < 0 => None,
        0 => Some("go1".to_string()),
        v => Some(format!("go1.{v}")),
    }
}

/// Minimum minor version accepted by `z` (9 for go1.9), or -1.
/// `positive` is false under an odd number of negations.
fn min_version(z: &Expr, positive: bool) -> i64 {
    match z {
        Expr::And(x, y) => {
            let (a, b) = (min_version(x, positive), min_version(y, positive));
            if positive {
                a.max(b)
            } else {
                a.min(b)
            }
        }
        Expr::Or(x, y) => {
            let (a, b) = (min_version(x, positive), min_version(y, positive));
            if positive {
                a.min(b)
            } else {
                a.max(b)
            }
        }
        Expr::Not(x) => min_version(x, !positive),
        Expr::Tag(t) => {
            if !positive {
                return -1;
            }
            if t == "go1" {
                return 0;
            }
            t.split_once("go1.")
                .and_then(|(_, v)| v.parse::<i64>().ok())
                .unwrap_or(-1)
        }
    }
}

/// Rewrites `x` as equivalent `// +build` lines, all of which must hold.
///
/// Negations are pushed down to the tags first; expressions that still do
/// not fit the AND of ORs of ANDs of literals shape are rejected.
pub fn plus_build_lines(x: &Expr) -> Result<Vec<String>, PlusBuildError> {
    let x = push_not(x, false);

    let mut split: Vec<Vec<Vec<&Expr>>> = Vec::new();
    for or_term in split_and(&x) {
        let mut ands = Vec::new();
        for and_term in split_or(or_term) {
            let mut lits = Vec::new();
            for lit in split_and(and_term) {
                match lit {
                    Expr::Tag(_) | Expr::Not(_) => lits.push(lit),
                    _ => return Err(PlusBuildError::TooComplex),
                }
            }
            ands.push(lits);
        }
        split.push(ands);
    }

    // Without any real OR, one line with every literal is enough.
    if split.iter().all(|ors| ors.len() <= 1) {
        let lits: Vec<&Expr> = split.into_iter().flat_map(|ors| ors.into_iter().flatten()).collect();
        split = vec![vec![lits]];
    }

    let lines = split
        .iter()
        .map(|ors| {
            let mut line = String::from("// +build");
            for ands in ors {
                line.push(' ');
                let clause: Vec<String> = ands.iter().map(|lit| lit.to_string()).collect();
                line.push_str(&clause.join(","));
            }
            line
        })
        .collect();
    Ok(lines)
}

fn push_not(x: &Expr, negate: bool) -> Expr {
    match x {
        Expr::Not(inner) => match **inner {
            Expr::Tag(_) if !negate => x.clone(),
            _ => push_not(inner, !negate),
        },
        Expr::Tag(_) => {
            if negate {
                not(x.clone())
            } else {
                x.clone()
            }
        }
        Expr::And(a, b) => {
            let (a, b) = (push_not(a, negate), push_not(b, negate));
            if negate {
                or(a, b)
            } else {
                and(a, b)
            }
        }
        Expr::Or(a, b) => {
            let (a, b) = (push_not(a, negate), push_not(b, negate));
            if negate {
                and(a, b)
            } else {
                or(a, b)
            }
        }
    }
}

fn split_and(x: &Expr) -> Vec<&Expr> {
    let mut list = Vec::new();
    collect_split(x, &mut list, true);
    list
}

fn split_or(x: &Expr) -> Vec<&Expr> {
    let mut list = Vec::new();
    collect_split(x, &mut list, false);
    list
}

fn collect_split<'x>(x: &'x Expr, list: &mut Vec<&'x Expr>, at_and: bool) {
    match x {
        Expr::And(a, b) if at_and => {
            collect_split(a, list, at_and);
            collect_split(b, list, at_and);
        }
        Expr::Or(a, b) if !at_and => {
            collect_split(a, list, at_and);
            collect_split(b, list, at_and);
        }
        _ => list.push(x),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(tags: &'static [&'static str]) -> impl FnMut(&str) -> bool {
        move |t| tags.iter().any(|x| *x == t)
    }

    #[test]
    fn go_build_eval() {
        let x = parse("//go:build linux && !cgo").unwrap();
        assert!(x.eval(set(&["linux"])));
        assert!(!x.eval(set(&["linux", "cgo"])));
        assert!(!x.eval(set(&[])));
    }

    #[test]
    fn eval_visits_every_tag() {
        let x = parse("//go:build a || b").unwrap();
        let mut seen = Vec::new();
        assert!(x.eval(|t| {
            seen.push(t.to_string());
            t == "a"
        }));
        assert_eq!(seen, ["a", "b"]);
    }

    #[test]
    fn display_minimal_parens() {
        let cases = [
            ("//go:build (a || b) && c", "(a || b) && c"),
            ("//go:build a || (b && c)", "a || (b && c)"),
            ("//go:build a && b || c", "(a && b) || c"),
            ("//go:build !(a)", "!a"),
            ("//go:build !(a && b)", "!(a && b)"),
            ("//go:build ((a))", "a"),
        ];
        for (line, want) in cases {
            assert_eq!(parse(line).unwrap().to_string(), want, "{line}");
        }
    }

    #[test]
    fn syntax_errors() {
        let cases = [
            ("//go:build !!x", "double negation not allowed"),
            ("//go:build (x", "missing close paren"),
            ("//go:build x)", "unexpected token )"),
            ("//go:build x &", "invalid syntax at &"),
            ("//go:build x &&", "unexpected end of expression"),
            ("//go:build", "unexpected end of expression"),
            ("//go:build x y", "unexpected token y"),
        ];
        for (line, want) in cases {
            match parse(line) {
                Err(ParseError::Syntax(e)) => assert_eq!(e.err, want, "{line}"),
                other => panic!("{line}: {other:?}"),
            }
        }
    }

    #[test]
    fn too_large() {
        let text = vec!["x"; MAX_SIZE + 1].join(" && ");
        let err = parse(&format!("//go:build {text}")).unwrap_err();
        assert_eq!(err.to_string(), "build expression too large");
    }

    #[test]
    fn line_recognition() {
        assert!(is_go_build("//go:build linux"));
        assert!(is_go_build("//go:build linux\n"));
        assert!(is_go_build("//go:build"));
        assert!(!is_go_build("//go:buildlinux"));
        assert!(!is_go_build("//go:build a\n//go:build b"));
        assert!(!is_go_build("// go:build linux"));

        assert!(is_plus_build("// +build linux"));
        assert!(is_plus_build("//+build linux"));
        assert!(is_plus_build("// +build"));
        assert!(!is_plus_build("// +buildx"));
        assert_eq!(parse("// hello"), Err(ParseError::NotConstraint));
    }

    #[test]
    fn plus_build_semantics() {
        let x = parse("// +build linux,386 darwin,!cgo").unwrap();
        assert_eq!(x.to_string(), "(linux && 386) || (darwin && !cgo)");
        assert_eq!(parse("// +build !!x").unwrap().to_string(), "ignore");
        assert_eq!(parse("// +build").unwrap().to_string(), "ignore");
        assert_eq!(parse("// +build a-b").unwrap().to_string(), "ignore");
    }

    #[test]
    fn plus_build_too_complex() {
        let text = vec!["x"; MAX_OLD_SIZE + 2].join(" ");
        assert_eq!(
            parse(&format!("// +build {text}")),
            Err(ParseError::TooComplex(PlusBuildError::TooComplex))
        );
    }

    #[test]
    fn go_versions() {
        let cases = [
            ("//go:build go1.21", Some("go1.21")),
            ("//go:build go1", Some("go1")),
            ("//go:build linux", None),
            ("//go:build go1.18 && go1.20", Some("go1.20")),
            ("//go:build go1.18 || go1.20", Some("go1.18")),
            ("//go:build go1.18 || linux", None),
            ("//go:build !go1.18", None),
            ("//go:build !(!go1.19 || linux)", Some("go1.19")),
            ("//go:build !(!go1.19 && linux)", None),
            ("//go:build !!go1.19", None),
        ];
        for (line, want) in cases {
            match parse(line) {
                Ok(x) => assert_eq!(go_version(&x).as_deref(), want, "{line}"),
                Err(_) => assert!(want.is_none(), "{line}"),
            }
        }
    }

    #[test]
    fn plus_build_lines_rewrite() {
        let cases: [(&str, &[&str]); 4] = [
            ("x", &["// +build x"]),
            ("x && !y", &["// +build x,!y"]),
            ("x || y && z", &["// +build x y,z"]),
            ("(x || y) && z", &["// +build x y", "// +build z"]),
        ];
        for (text, want) in cases {
            let x = parse(&format!("//go:build {text}")).unwrap();
            assert_eq!(plus_build_lines(&x).unwrap(), want, "{text}");
        }

        let x = parse("//go:build !(x || y)").unwrap();
        assert_eq!(plus_build_lines(&x).unwrap(), ["// +build !x,!y"]);

        let x = parse("//go:build (a && (b || c)) || d").unwrap();
        assert_eq!(plus_build_lines(&x), Err(PlusBuildError::TooComplex));
    }
}
