//! Compact source positions and the per-file line table.
//!
//! A [`Pos`] is an opaque offset into a file's position range: the file
//! occupies `[base, base + size]`, so `pos = base + byte_offset`. The zero
//! value is [`Pos::NONE`]. [`PosFile`] maps positions back to line/column.

use std::fmt;
use std::ops::{Add, Sub};

/// Compact source position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Pos(u32);

impl Pos {
    /// "No position".
    pub const NONE: Pos = Pos(0);

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Pos(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl Add<usize> for Pos {
    type Output = Pos;

    #[inline]
    fn add(self, rhs: usize) -> Pos {
        Pos(self.0.saturating_add(u32::try_from(rhs).unwrap_or(u32::MAX)))
    }
}

impl Sub<usize> for Pos {
    type Output = Pos;

    #[inline]
    fn sub(self, rhs: usize) -> Pos {
        Pos(self.0.saturating_sub(u32::try_from(rhs).unwrap_or(u32::MAX)))
    }
}

/// Resolved source location.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    pub filename: String,
    /// Byte offset, starting at 0.
    pub offset: usize,
    /// Line number, starting at 1 (0 means invalid).
    pub line: usize,
    /// Byte column, starting at 1.
    pub column: usize,
}

impl Position {
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.line > 0
    }
}

impl fmt::Display for Position {
    /// Renders `file:line:column`, `file:line`, `line:column`, `file` or `-`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = self.filename.clone();
        if self.is_valid() {
            if !out.is_empty() {
                out.push(':');
            }
            out.push_str(&self.line.to_string());
            if self.column != 0 {
                out.push(':');
                out.push_str(&self.column.to_string());
            }
        }
        if out.is_empty() {
            out.push('-');
        }
        f.write_str(&out)
    }
}

/// Line table for one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PosFile {
    name: String,
    base: u32,
    size: u32,
    /// Byte offset of the first character of each line; `lines[0] == 0`.
    lines: Vec<u32>,
}

impl PosFile {
    /// Builds the line table for `src`, placing the file at `base` (>= 1).
    pub fn new(name: impl Into<String>, base: u32, src: &str) -> Self {
        let bytes = src.as_bytes();
        let mut lines = Vec::with_capacity(bytes.len() / 32 + 1);
        lines.push(0);
        for nl in memchr::memchr_iter(b'\n', bytes) {
            lines.push((nl + 1) as u32);
        }
        // A trailing newline does not start a new (empty) line.
        if lines.len() > 1 && *lines.last().unwrap_or(&0) as usize == bytes.len() {
            lines.pop();
        }
        Self {
            name: name.into(),
            base: base.max(1),
            size: bytes.len() as u32,
            lines,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn base(&self) -> u32 {
        self.base
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size as usize
    }

    #[inline]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Position for byte `offset` (clamped to the file size).
    #[inline]
    pub fn pos(&self, offset: usize) -> Pos {
        let off = (offset as u32).min(self.size);
        Pos(self.base + off)
    }

    /// Byte offset of `p` (clamped into the file).
    #[inline]
    pub fn offset(&self, p: Pos) -> usize {
        p.0.saturating_sub(self.base).min(self.size) as usize
    }

    /// Start position of 1-based `line`.
    pub fn line_start(&self, line: usize) -> Pos {
        match line.checked_sub(1).and_then(|i| self.lines.get(i)) {
            Some(&off) => Pos(self.base + off),
            None => Pos::NONE,
        }
    }

    /// 1-based line of `p`, or 0 for an invalid position.
    pub fn line(&self, p: Pos) -> usize {
        if !p.is_valid() {
            return 0;
        }
        let off = self.offset(p) as u32;
        self.lines.partition_point(|&start| start <= off)
    }

    pub fn position(&self, p: Pos) -> Position {
        if !p.is_valid() {
            return Position::default();
        }
        let offset = self.offset(p);
        let line = self.line(p);
        let start = self.lines[line - 1] as usize;
        Position {
            filename: self.name.clone(),
            offset,
            line,
            column: offset - start + 1,
        }
    }

    /// Joins 1-based `line` with the following one. Returns false if there is
    /// no following line.
    pub fn merge_line(&mut self, line: usize) -> bool {
        if line == 0 || line >= self.lines.len() {
            return false;
        }
        self.lines.remove(line);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_and_column() {
        let f = PosFile::new("a.go", 1, "package p\n\nfunc f() {}\n");
        assert_eq!(f.line_count(), 3);
        let p = f.pos(11);
        let pos = f.position(p);
        assert_eq!((pos.line, pos.column), (3, 1));
        assert_eq!(pos.to_string(), "a.go:3:1");
        assert_eq!(f.position(f.pos(8)).to_string(), "a.go:1:9");
    }

    #[test]
    fn invalid_position_renders_dash() {
        let f = PosFile::new("", 1, "x");
        assert_eq!(f.position(Pos::NONE).to_string(), "-");
        assert_eq!(f.line(Pos::NONE), 0);
    }

    #[test]
    fn merge_line_joins_following_line() {
        let mut f = PosFile::new("m.go", 1, "a\nb\nc");
        assert!(f.merge_line(1));
        assert_eq!(f.line(f.pos(2)), 1);
        assert_eq!(f.line(f.pos(4)), 2);
        assert!(!f.merge_line(2));
    }
}
