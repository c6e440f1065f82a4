//! Property-Based Tests for Scope Application
//!
//! Properties:
//! - Applying the same parameters twice yields equal collections
//! - Parameters that name no declared scope leave the collection unchanged
//! - Scopes declared on one model never apply to another
//! - Concurrent applications over one catalog agree with a serial one

use autoscope_core::RequestParams;
use autoscope_engine::add_scopes_to_all;
use autoscope_registry::{DefaultScope, ScopedModel};
use autoscope_test_utils::fixtures::scope_suite_catalog;
use autoscope_test_utils::generators::{arb_page_value, arb_string_value};
use proptest::prelude::*;
use serde_json::{json, Value};

// ============================================================================
// ARBITRATORS
// ============================================================================

/// Request parameters drawn from the suite's Post scopes.
fn arb_post_params() -> impl Strategy<Value = Value> {
    (
        proptest::option::of(arb_string_value()),
        proptest::option::of(prop::collection::vec(1u64..8, 0..4)),
        any::<bool>(),
        proptest::option::of(arb_page_value()),
    )
        .prop_map(|(user_id, ids, static_flag, per_page)| {
            let mut params = serde_json::Map::new();
            if let Some(user_id) = user_id {
                params.insert("user_id_scope".into(), json!({ "user_id": user_id }));
            }
            if let Some(ids) = ids {
                params.insert("vararg_scope".into(), json!({ "ids": ids }));
            }
            params.insert("no_param_scope".into(), Value::Bool(static_flag));
            if let Some(per_page) = per_page {
                params.insert("per_page".into(), per_page);
            }
            Value::Object(params)
        })
}

fn arb_foreign_key() -> impl Strategy<Value = String> {
    "[a-z]{1,10}".prop_filter("must not name a Post scope", |key| {
        !matches!(
            key.as_str(),
            "all" | "first" | "last" | "ids" | "type" | "page" | "blah"
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_application_is_deterministic(raw in arb_post_params()) {
        let catalog = scope_suite_catalog();
        let post = catalog.model("Post").unwrap();
        let params = RequestParams::from_json(raw).unwrap();

        let first = add_scopes_to_all(&post, &catalog, &params).unwrap();
        let second = add_scopes_to_all(&post, &catalog, &params).unwrap();

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.ids().unwrap(), second.ids().unwrap());
    }

    #[test]
    fn prop_unknown_keys_are_ignored(key in arb_foreign_key(), value in arb_string_value()) {
        let catalog = scope_suite_catalog();
        let post = catalog.model("Post").unwrap();
        prop_assume!(!post.scope_registry().contains(&key) && key != "per_page");

        let params = RequestParams::new().with(key, value);
        let scope = add_scopes_to_all(&post, &catalog, &params).unwrap();
        prop_assert_eq!(scope, post.all().unwrap());
    }

    #[test]
    fn prop_post_scopes_do_not_leak_to_user(raw in arb_post_params()) {
        let catalog = scope_suite_catalog();
        let user = catalog.model("User").unwrap();
        let mut params = RequestParams::from_json(raw).unwrap();
        params.insert("per_page", Value::Null);

        let scope = add_scopes_to_all(&user, &catalog, &params).unwrap();
        prop_assert_eq!(scope, user.all().unwrap());
    }
}

#[test]
fn concurrent_application_matches_serial() {
    let catalog = scope_suite_catalog();
    let post = catalog.model("Post").unwrap();
    let requests: Vec<RequestParams> = (1..=6u64)
        .map(|n| {
            RequestParams::from_json(json!({
                "user_id_scope": { "user_id": (n % 2) + 1 },
                "vararg_scope": { "ids": [n, n + 1, n + 2] },
                "page": 1,
            }))
            .unwrap()
        })
        .collect();

    let serial: Vec<Vec<u64>> = requests
        .iter()
        .map(|p| add_scopes_to_all(&post, &catalog, p).unwrap().ids().unwrap())
        .collect();

    let concurrent: Vec<Vec<u64>> = std::thread::scope(|s| {
        let handles: Vec<_> = requests
            .iter()
            .map(|p| {
                let post = &post;
                let catalog = &catalog;
                s.spawn(move || add_scopes_to_all(post, catalog, p).unwrap().ids().unwrap())
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(serial, concurrent);
}
