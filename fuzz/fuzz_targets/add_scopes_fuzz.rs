//! Fuzz test for the full scope pipeline
//!
//! Decodes arbitrary query strings and applies them to the demo catalog.
//! Scope application must never panic, and unknown or unrelated `type`
//! values must never surface as errors.
//!
//! Run with: cargo +nightly fuzz run add_scopes_fuzz -- -max_total_time=60

#![no_main]

use autoscope_core::{RequestParams, ScopeError};
use autoscope_engine::add_scopes_to_all;
use autoscope_storage::demo::blog_catalog;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(params) = RequestParams::from_query(input) else {
        return;
    };
    let Ok(catalog) = blog_catalog() else {
        return;
    };

    for name in ["Post", "User", "Admin"] {
        let Ok(model) = catalog.model(name) else {
            continue;
        };
        match add_scopes_to_all(&model, &catalog, &params) {
            Ok(scope) => {
                // Execution should succeed on any composed query
                assert!(scope.records().is_ok(), "Composed query failed to execute");
            }
            Err(ScopeError::Params(_)) | Err(ScopeError::Collection(_)) => {}
            Err(other) => panic!("Unexpected error kind: {other}"),
        }
    }
});
