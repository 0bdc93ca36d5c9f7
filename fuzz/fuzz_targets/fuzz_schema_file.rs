#![no_main]

use libfuzzer_sys::fuzz_target;
use olcschema::SchemaDefinitionFile;

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        // Both readers must reject malformed files without panicking
        let _ = SchemaDefinitionFile::parse_schema(content);
        let _ = SchemaDefinitionFile::parse_ldif(content);
    }
});
