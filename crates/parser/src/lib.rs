//! Go source front end: lexer, recursive-descent parser and object resolver.
//!
//! - The lexer is built on Logos and performs Go's automatic semicolon insertion.
//! - [`parse_file`] builds an arena-allocated syntax tree with error recovery
//!   and, unless disabled, resolves identifiers to their declarations.
//! - [`constraint`] parses `//go:build` and `// +build` lines.

pub mod ast;
pub mod constraint;
pub mod error;
pub mod lexer;
mod parser;
pub mod position;
pub mod resolver;
pub mod scope;
mod stack;
pub mod token;
pub mod walk;

use tracing::debug;

use crate::ast::{AstArena, CommentGroupId, DeclId, ExprId, IdentId, Node, SpecId};
use crate::parser::Parser;
use crate::resolver::DeclErr;
use crate::scope::{ScopeArena, ScopeId};

// Re-exports for convenience
pub use error::{Error, ErrorList};
pub use lexer::Lexer;
pub use parser::{Mode, MAX_ERRORS, MAX_NEST_LEV};
pub use position::{Pos, PosFile, Position};
pub use resolver::{resolve_file, MAX_SCOPE_DEPTH};
pub use token::Token;

/// A parsed Go source file together with everything its ids refer to.
#[derive(Debug)]
pub struct File {
    /// Package documentation.
    pub doc: Option<CommentGroupId>,
    /// Position of the `package` keyword.
    pub package: Pos,
    pub name: IdentId,
    pub decls: Vec<DeclId>,
    /// Start and end of the whole source.
    pub file_start: Pos,
    pub file_end: Pos,
    /// Import specs of the file, in source order.
    pub imports: Vec<SpecId>,
    /// Every comment group, in source order (empty unless `PARSE_COMMENTS`).
    pub comments: Vec<CommentGroupId>,
    /// Minimum Go version from the file's `//go:build` line, like `go1.21`.
    pub go_version: Option<String>,
    /// Package-level scope; `None` until resolved.
    pub scope: Option<ScopeId>,
    /// Identifiers declared nowhere in the file, one per name.
    pub unresolved: Vec<IdentId>,

    pub arena: AstArena,
    pub scopes: ScopeArena,
    pub pos_file: PosFile,
}

impl File {
    #[inline]
    pub fn ident_name(&self, id: IdentId) -> &str {
        self.arena.ident_name(id)
    }

    #[inline]
    pub fn position(&self, pos: Pos) -> Position {
        self.pos_file.position(pos)
    }

    /// Position of the `package` keyword.
    pub fn pos(&self) -> Pos {
        self.package
    }

    /// End of the last declaration, or of the package name.
    pub fn end(&self) -> Pos {
        match self.decls.last() {
            Some(&d) => self.arena.decl_end(d),
            None => self.arena.ident_end(self.name),
        }
    }

    #[inline]
    pub fn node_pos(&self, node: Node) -> Pos {
        self.arena.pos(node)
    }

    #[inline]
    pub fn node_end(&self, node: Node) -> Pos {
        self.arena.end(node)
    }
}

/// Parses the source of one Go file.
///
/// Returns the file whenever the package clause could be parsed, even if
/// there were errors elsewhere; `None` if it could not, or if the parse was
/// abandoned. The error list is sorted by position.
pub fn parse_file(filename: &str, src: &str, mode: Mode) -> (Option<File>, ErrorList) {
    let mut p = Parser::new(filename, src, mode);
    let parsed = p.parse_file();
    let mut errors = std::mem::take(&mut p.errors);
    let arena = std::mem::take(&mut p.a);
    let pos_file = p.file.clone();

    let mut file = match parsed {
        Ok(Some(parts)) => Some(File {
            doc: parts.doc,
            package: parts.package,
            name: parts.name,
            decls: parts.decls,
            file_start: pos_file.pos(0),
            file_end: pos_file.pos(pos_file.size()),
            imports: parts.imports,
            comments: parts.comments,
            go_version: parts.go_version,
            scope: None,
            unresolved: Vec::new(),
            arena,
            scopes: ScopeArena::new(),
            pos_file,
        }),
        Ok(None) => None,
        Err(b) => {
            debug!(target: "go_syntax::parser", file = filename, "parse abandoned: {}", b.msg);
            if !b.msg.is_empty() {
                errors.add(pos_file.position(b.pos), b.msg);
            }
            None
        }
    };

    let mut bailed = false;
    if let Some(f) = file.as_mut() {
        if !mode.contains(Mode::SKIP_OBJECT_RESOLUTION) {
            let mut report = |pos: Pos, msg: String| errors.add(f.pos_file.position(pos), msg);
            let decl_err: Option<DeclErr<'_>> = if mode.contains(Mode::DECLARATION_ERRORS) {
                Some(&mut report)
            } else {
                None
            };
            match resolver::resolve(&f.arena, &f.decls, &mut f.scopes, &f.pos_file, decl_err) {
                Ok((scope, unresolved)) => {
                    f.scope = Some(scope);
                    f.unresolved = unresolved;
                }
                Err(b) => {
                    errors.add(f.pos_file.position(b.pos), b.msg);
                    bailed = true;
                }
            }
        }
    }
    if bailed {
        file = None;
    }

    errors.sort();
    debug!(
        target: "go_syntax::parser",
        file = filename,
        decls = file.as_ref().map_or(0, |f| f.decls.len()),
        errors = errors.len(),
        "parsed file"
    );
    (file, errors)
}

/// A single parsed expression and the arena that holds it.
#[derive(Debug)]
pub struct ParsedExpr {
    pub root: ExprId,
    pub arena: AstArena,
    pub pos_file: PosFile,
}

impl ParsedExpr {
    #[inline]
    pub fn position(&self, pos: Pos) -> Position {
        self.pos_file.position(pos)
    }
}

/// Parses `src` as one expression; anything after it is an error.
pub fn parse_expr_from(filename: &str, src: &str, mode: Mode) -> (Option<ParsedExpr>, ErrorList) {
    let mut p = Parser::new(filename, src, mode);
    let parsed = parser::parse_expr_in(&mut p);
    let mut errors = std::mem::take(&mut p.errors);
    let arena = std::mem::take(&mut p.a);
    let pos_file = p.file.clone();

    let expr = match parsed {
        Ok(root) => Some(ParsedExpr { root, arena, pos_file }),
        Err(b) => {
            if !b.msg.is_empty() {
                errors.add(pos_file.position(b.pos), b.msg);
            }
            None
        }
    };
    errors.sort();
    (expr, errors)
}

/// Convenience wrapper: parses an expression with no file name, failing on any error.
pub fn parse_expr(src: &str) -> Result<ParsedExpr, ErrorList> {
    match parse_expr_from("", src, Mode::empty()) {
        (Some(x), errors) if errors.is_empty() => Ok(x),
        (_, errors) => Err(errors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Decl, Expr, Spec};

    #[test]
    fn file_summary() {
        let src = "//go:build go1.21\n\n// Package p is here.\npackage p\n\nimport \"fmt\"\n\nfunc main() { fmt.Println() }\n";
        let (file, errs) = parse_file("p.go", src, Mode::PARSE_COMMENTS);
        assert!(errs.is_empty(), "{errs}");
        let file = file.unwrap();
        assert_eq!(file.ident_name(file.name), "p");
        assert_eq!(file.go_version.as_deref(), Some("go1.21"));
        assert_eq!(file.imports.len(), 1);
        assert_eq!(file.comments.len(), 2);
        assert_eq!(file.arena.comment_text(file.doc.unwrap()), "Package p is here.\n");
        assert_eq!(file.position(file.pos()).to_string(), "p.go:4:1");
        assert_eq!(file.end(), file.file_end - 1);
        assert!(matches!(file.arena.decls[file.decls[1]], Decl::Func(_)));
        match file.arena.specs[file.imports[0]] {
            Spec::Import(spec) => assert!(matches!(file.arena.exprs[spec.path], Expr::BasicLit(_))),
            _ => panic!("import spec expected"),
        }
        let names: Vec<_> = file.unresolved.iter().map(|&i| file.ident_name(i)).collect();
        assert_eq!(names, ["fmt"]);
    }

    #[test]
    fn missing_package_clause() {
        let (file, errs) = parse_file("x.go", "func f() {}\n", Mode::empty());
        assert!(file.is_none());
        assert_eq!(errs.to_string(), "x.go:1:1: expected 'package', found 'func'");
    }

    #[test]
    fn skip_object_resolution() {
        let (file, _) = parse_file("x.go", "package p\nvar x = y\n", Mode::SKIP_OBJECT_RESOLUTION);
        let file = file.unwrap();
        assert!(file.scope.is_none());
        assert!(file.unresolved.is_empty());
    }

    #[test]
    fn expression_entry_point() {
        let x = parse_expr("a + b*c").unwrap();
        match x.arena.exprs[x.root] {
            Expr::Binary { op, y, .. } => {
                assert_eq!(op, Token::Add);
                assert!(matches!(x.arena.exprs[y], Expr::Binary { op: Token::Mul, .. }));
            }
            ref other => panic!("unexpected {other:?}"),
        }

        let errs = parse_expr("a b").unwrap_err();
        assert_eq!(errs.to_string(), "1:3: expected 'EOF', found b");
    }
}
