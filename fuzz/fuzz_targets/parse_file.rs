#![no_main]

use go_syntax::walk::preorder_file;
use go_syntax::{parse_file, Mode};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(src) = std::str::from_utf8(data) else {
        return;
    };
    let (file, errs) = parse_file("fuzz.go", src, Mode::PARSE_COMMENTS | Mode::DECLARATION_ERRORS);
    match file {
        Some(file) => {
            let _ = preorder_file(&file).count();
        }
        None => assert!(!errs.is_empty()),
    }
});
