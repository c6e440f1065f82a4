//! Fuzz test for query string decoding
//!
//! Feeds arbitrary UTF-8 to `RequestParams::from_query` looking for panics
//! and for decoded keys that escape canonicalization.
//!
//! Run with: cargo +nightly fuzz run query_string_fuzz -- -max_total_time=60

#![no_main]

use autoscope_core::{RequestParams, ScopeError, Value};
use libfuzzer_sys::fuzz_target;

fn assert_trimmed_keys(value: &Value) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                assert_eq!(key.trim(), key, "Nested key should be trimmed");
                assert_trimmed_keys(nested);
            }
        }
        Value::Array(items) => items.iter().for_each(assert_trimmed_keys),
        _ => {}
    }
}

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        match RequestParams::from_query(input) {
            Ok(params) => {
                for (key, value) in params.iter() {
                    assert!(!key.is_empty(), "Top-level keys should never be empty");
                    assert_eq!(key.trim(), key, "Top-level key should be trimmed");
                    assert_trimmed_keys(value);
                }
            }
            // Decoding failures are always malformed-params errors
            Err(ScopeError::Params(_)) => {}
            Err(other) => panic!("Unexpected error kind: {other}"),
        }
    }
});
