use go_syntax::lexer::{Lexer, ScanMode};
use go_syntax::Token;

fn lex_names(input: &str) -> String {
    Lexer::with_mode(input, 1, ScanMode::COMMENTS)
        .map(|(_, t, _)| t.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

fn check_semi_case(input: &str, want: &str) {
    let got = lex_names(input);
    assert_eq!(got, want, "input=<<{input}>>");
}

struct SemiCase {
    input: &'static str,
    want: &'static str,
}

#[rustfmt::skip]
const SEMICOLON_TESTS: &[SemiCase] = &[
    SemiCase { input: "", want: "" },
    SemiCase { input: "\u{FEFF};", want: ";" }, // leading BOM is skipped
    SemiCase { input: ";", want: ";" },

    SemiCase { input: "foo\n", want: "IDENT ;" },
    SemiCase { input: "123\n", want: "INT ;" },
    SemiCase { input: "1.2\n", want: "FLOAT ;" },
    SemiCase { input: "1i\n", want: "IMAG ;" },
    SemiCase { input: "'x'\n", want: "CHAR ;" },
    SemiCase { input: "\"x\"\n", want: "STRING ;" },
    SemiCase { input: "`x`\n", want: "STRING ;" },

    SemiCase { input: "+\n", want: "+" },
    SemiCase { input: "&^\n", want: "&^" },
    SemiCase { input: "<<=\n", want: "<<=" },
    SemiCase { input: "&&\n", want: "&&" },
    SemiCase { input: "<-\n", want: "<-" },
    SemiCase { input: "++\n", want: "++ ;" },
    SemiCase { input: "--\n", want: "-- ;" },
    SemiCase { input: ":=\n", want: ":=" },
    SemiCase { input: "...\n", want: "..." },
    SemiCase { input: "~\n", want: "~" },

    SemiCase { input: "(\n", want: "(" },
    SemiCase { input: "[\n", want: "[" },
    SemiCase { input: "{\n", want: "{" },
    SemiCase { input: ",\n", want: "," },
    SemiCase { input: ".\n", want: "." },
    SemiCase { input: ")\n", want: ") ;" },
    SemiCase { input: "]\n", want: "] ;" },
    SemiCase { input: "}\n", want: "} ;" },

    SemiCase { input: "break\n", want: "break ;" },
    SemiCase { input: "continue\n", want: "continue ;" },
    SemiCase { input: "fallthrough\n", want: "fallthrough ;" },
    SemiCase { input: "return\n", want: "return ;" },
    SemiCase { input: "if\n", want: "if" },
    SemiCase { input: "func\n", want: "func" },

    // At end of input a semicolon is still inserted.
    SemiCase { input: "foo", want: "IDENT ;" },
    SemiCase { input: "foo\n\n", want: "IDENT ;" },
    SemiCase { input: "x\n\ny", want: "IDENT ; IDENT ;" },

    // A comment that ends the line is seen after the semicolon.
    SemiCase { input: "foo//comment\n", want: "IDENT ; COMMENT" },
    SemiCase { input: "foo//comment", want: "IDENT ; COMMENT" },
    SemiCase { input: "foo/*comment*/\n", want: "IDENT ; COMMENT" },
    SemiCase { input: "foo/*c*/ /*d*/\n", want: "IDENT ; COMMENT COMMENT" },
    SemiCase { input: "foo/*c*/ //d\n", want: "IDENT ; COMMENT COMMENT" },
    SemiCase { input: "foo/*\n*/", want: "IDENT ; COMMENT" },
    SemiCase { input: "foo /* a\nb */ x", want: "IDENT ; COMMENT IDENT ;" },
    SemiCase { input: "foo/*comment*/ bar\n", want: "IDENT COMMENT IDENT ;" },
    SemiCase { input: "return // c\n", want: "return ; COMMENT" },

    // No semicolon is pending after an operator.
    SemiCase { input: "+ //c\n", want: "+ COMMENT" },
    SemiCase { input: "/* c */ foo\n", want: "COMMENT IDENT ;" },
];

#[test]
fn semicolon_insertion_table() {
    for c in SEMICOLON_TESTS {
        check_semi_case(c.input, c.want);
    }
}

#[test]
fn comments_dropped_without_mode() {
    let got: Vec<_> = Lexer::new("foo // c\nbar /* d */\n").map(|(_, t, _)| t).collect();
    assert_eq!(got, [Token::Ident, Token::Semicolon, Token::Ident, Token::Semicolon]);
}

#[test]
fn inserted_semicolon_literal_and_position() {
    let toks: Vec<_> = Lexer::new("x\ny; z").map(|(p, t, l)| (p.raw(), t, l)).collect();
    assert_eq!(
        toks,
        [
            (1, Token::Ident, "x"),
            (2, Token::Semicolon, "\n"),
            (3, Token::Ident, "y"),
            (4, Token::Semicolon, ";"),
            (6, Token::Ident, "z"),
            (7, Token::Semicolon, "\n"),
        ]
    );
}

#[test]
fn eof_is_sticky() {
    let mut lx = Lexer::new("a");
    assert_eq!(lx.next_token().1, Token::Ident);
    assert_eq!(lx.next_token().1, Token::Semicolon);
    for _ in 0..3 {
        let (pos, tok, lit) = lx.next_token();
        assert_eq!((pos.raw(), tok, lit), (2, Token::Eof, ""));
    }
}

#[test]
fn bom_after_start_is_an_error() {
    let mut lx = Lexer::new("a\u{FEFF}");
    let toks: Vec<_> = lx.by_ref().map(|(_, t, _)| t).collect();
    assert_eq!(toks, [Token::Ident, Token::Illegal, Token::Semicolon]);
    assert_eq!(lx.take_errors()[0].kind.to_string(), "illegal byte order mark");
}
