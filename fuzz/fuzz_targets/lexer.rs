#![no_main]

use go_syntax::lexer::{Lexer, ScanMode};
use go_syntax::Token;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let s = String::from_utf8_lossy(data);
    let mut lx = Lexer::with_mode(&s, 1, ScanMode::COMMENTS);

    let mut last_real_end = 0usize;
    let mut steps = 0usize;
    let max_steps = s.len().saturating_mul(4) + 64;

    for (pos, tok, lit) in lx.by_ref() {
        let start = pos.raw() as usize - 1;
        // Automatic semicolons carry "\n" but cover no source text.
        let injected = tok == Token::Semicolon && lit == "\n";
        let end = if injected { start } else { start + lit.len() };

        assert!(end <= s.len());
        assert!(start >= last_real_end);
        if !injected {
            assert_eq!(&s[start..end], lit);
            last_real_end = end;
        }

        steps += 1;
        assert!(steps <= max_steps);
    }
    let _ = lx.take_errors();
});
