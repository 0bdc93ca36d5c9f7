#![no_main]

use libfuzzer_sys::fuzz_target;
use olcschema::{format_definition, parse_definition};

fuzz_target!(|data: &[u8]| {
    if let Ok(definition) = std::str::from_utf8(data) {
        // The formatter accepts anything
        let _ = format_definition(definition);

        // A rendered definition keeps its OID
        if let Ok(parsed) = parse_definition(definition) {
            if let Ok(reparsed) = parse_definition(&parsed.to_string()) {
                assert_eq!(reparsed.oid, parsed.oid);
            }
        }
    }
});
