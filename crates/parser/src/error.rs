use std::fmt;

use thiserror::Error;

use crate::position::{Pos, Position};

/// Lexical error classes reported by the lexer.
///
/// The lexer keeps going after any of these; the offending literal is still
/// returned with its token class.
#[derive(Debug, Error, Clone, PartialEq, Eq, Default)]
pub enum LexErrorKind {
    #[default]
    #[error("invalid token")]
    InvalidToken,
    #[error("invalid character {0}")]
    IllegalChar(String),
    #[error("illegal byte order mark")]
    IllegalBom,
    #[error("comment not terminated")]
    UnterminatedComment,
    #[error("string literal not terminated")]
    UnterminatedString,
    #[error("raw string literal not terminated")]
    UnterminatedRawString,
    #[error("rune literal not terminated")]
    UnterminatedRune,
    #[error("escape sequence not terminated")]
    UnterminatedEscape,
    #[error("unknown escape sequence")]
    UnknownEscape,
    #[error("escape sequence is invalid Unicode code point")]
    InvalidCodePoint,
    #[error("illegal character {0} in escape sequence")]
    IllegalEscapeChar(String),
    #[error("illegal rune literal")]
    IllegalRune,
    #[error("{0}")]
    InvalidNumber(String),
}

/// A positioned diagnostic.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{pos}: {msg}")]
pub struct Error {
    pub pos: Position,
    pub msg: String,
}

/// Ordered list of diagnostics for one parse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorList(Vec<Error>);

impl ErrorList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, pos: Position, msg: impl Into<String>) {
        self.0.push(Error { pos, msg: msg.into() });
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&Error> {
        self.0.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Error> {
        self.0.iter()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Sorts by filename, line, column, then message.
    pub fn sort(&mut self) {
        self.0.sort_by(|a, b| {
            (&a.pos.filename, a.pos.line, a.pos.column, &a.msg)
                .cmp(&(&b.pos.filename, b.pos.line, b.pos.column, &b.msg))
        });
    }

    /// Sorts the list and keeps only the first error per line.
    pub fn remove_multiples(&mut self) {
        self.sort();
        let mut last: Option<(String, usize)> = None;
        self.0.retain(|e| {
            let key = (e.pos.filename.clone(), e.pos.line);
            if last.as_ref() == Some(&key) {
                return false;
            }
            last = Some(key);
            true
        });
    }

    /// `Ok(())` when empty, otherwise the list itself.
    pub fn err(self) -> Result<(), ErrorList> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    pub fn into_vec(self) -> Vec<Error> {
        self.0
    }
}

impl fmt::Display for ErrorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.len() {
            0 => f.write_str("no errors"),
            1 => write!(f, "{}", self.0[0]),
            2 => write!(f, "{} (and 1 more error)", self.0[0]),
            n => write!(f, "{} (and {} more errors)", self.0[0], n - 1),
        }
    }
}

impl std::error::Error for ErrorList {}

impl IntoIterator for ErrorList {
    type Item = Error;
    type IntoIter = std::vec::IntoIter<Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ErrorList {
    type Item = &'a Error;
    type IntoIter = std::slice::Iter<'a, Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Abort signal for a whole parse or resolve.
///
/// `msg` is empty when the abort follows an already recorded error (the
/// error ceiling); otherwise it is recorded at `pos` by the entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bailout {
    pub pos: Pos,
    pub msg: &'static str,
}

pub type PResult<T> = Result<T, Bailout>;

#[cfg(test)]
mod tests {
    use super::*;

    fn at(line: usize, column: usize) -> Position {
        Position {
            filename: "x.go".into(),
            offset: 0,
            line,
            column,
        }
    }

    #[test]
    fn sort_and_dedup_per_line() {
        let mut list = ErrorList::new();
        list.add(at(3, 1), "c");
        list.add(at(1, 5), "b");
        list.add(at(1, 2), "a");
        list.remove_multiples();
        let msgs: Vec<_> = list.iter().map(|e| e.msg.as_str()).collect();
        assert_eq!(msgs, ["a", "c"]);
        assert_eq!(list.to_string(), "x.go:1:2: a (and 1 more error)");
    }

    #[test]
    fn empty_list_is_ok() {
        assert!(ErrorList::new().err().is_ok());
    }
}
