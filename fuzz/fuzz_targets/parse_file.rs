#![no_main]

use goimpl_parser::{parse_file, parse_receiver, parse_type_list};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let s = String::from_utf8_lossy(data);
    if let Ok(parsed) = parse_file(&s) {
        for spec in parsed.type_specs() {
            let span = parsed.arena.types.span(spec.typ);
            assert!(span.end as usize <= s.len());
        }
    }
    let _ = parse_receiver(&s);
    let _ = parse_type_list(&s);
});
