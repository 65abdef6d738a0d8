use go_syntax::lexer::{Lexer, ScanMode};
use go_syntax::Token;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]
    #[test]
    fn never_panics_and_progresses(s in "(?s).{0,200}") {
        let lx = Lexer::with_mode(&s, 1, ScanMode::COMMENTS);

        // Base 1: offsets are raw positions minus one.
        let mut last_real_end = 0usize;
        let max_steps = s.len().saturating_mul(4) + 64;

        for (steps, (pos, tok, lit)) in lx.enumerate() {
            let start = pos.raw() as usize - 1;
            let injected_semi = tok == Token::Semicolon && lit == "\n";
            let end = if injected_semi { start } else { start + lit.len() };

            // 1) spans must be in-bounds and match the source text
            prop_assert!(end <= s.len(), "end out of bounds: ({start},{end}) tok={tok:?} input={s:?}");
            if !injected_semi {
                prop_assert_eq!(&s[start..end], lit);
            }

            // 2) tokens never move backwards
            prop_assert!(
                start >= last_real_end,
                "token moved backwards: start={start} < {last_real_end} tok={tok:?} input={s:?}"
            );
            if !injected_semi {
                last_real_end = end;
            }

            // 3) anti-hang guard
            prop_assert!(
                steps <= max_steps,
                "too many steps (possible hang): steps={steps} max_steps={max_steps} input={s:?}"
            );
        }
    }

    #[test]
    fn identifiers_round_trip(s in "[a-zA-Z_][a-zA-Z0-9_]{0,12}") {
        let toks: Vec<_> = Lexer::new(&s).collect();
        prop_assert_eq!(toks[0].1, Token::lookup(&s));
        prop_assert_eq!(toks[0].2, s.as_str());
    }
}
