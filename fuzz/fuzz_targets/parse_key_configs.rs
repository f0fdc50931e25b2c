#![no_main]

use libfuzzer_sys::fuzz_target;
use oblivious_http::KeyConfigSet;

fuzz_target!(|data: &[u8]| {
    if let Ok(set) = KeyConfigSet::parse(data) {
        // Anything that parses must survive a serialize/parse cycle.
        let again = KeyConfigSet::parse(&set.serialize()).expect("reparse");
        assert_eq!(again.serialize(), set.serialize());
        assert_eq!(again.preferred_config(), set.preferred_config());
    }
});
