//! End-to-end scope application against the in-memory catalog.

use autoscope_core::{AutoscopeConfig, Collection, RequestParams, TypeDescriptor};
use autoscope_engine::{add_scopes, add_scopes_to_all, ScopeEngine};
use autoscope_registry::{DefaultScope, ScopedModel};
use autoscope_test_utils::assertions::{
    assert_collection_error, assert_ids, assert_invalid_pagination, assert_params_error,
    assert_where_value,
};
use autoscope_test_utils::fixtures::{blog_catalog, params, scope_suite_catalog};
use serde_json::json;

// ============================================================================
// TYPE FILTER
// ============================================================================

#[test]
fn type_filter_merges_with_existing_conditions() {
    let catalog = scope_suite_catalog();
    let user = catalog.model("User").unwrap();
    let dans = user.all().unwrap().where_eq("name", json!("Dan"));

    let scope = add_scopes(&user, &catalog, &params(json!({ "type": "Admin" })), dans).unwrap();

    assert_eq!(scope.model_type().name(), "Admin");
    assert_eq!(
        serde_json::Value::Object(scope.where_values()),
        json!({ "name": "Dan", "type": ["Admin"] })
    );
    assert_ids(&scope, &[2]);
}

#[test]
fn type_filter_from_unfiltered_collection() {
    let catalog = scope_suite_catalog();
    let user = catalog.model("User").unwrap();

    let scope = add_scopes_to_all(&user, &catalog, &params(json!({ "type": "Admin" }))).unwrap();
    assert_where_value(&scope, "type", json!(["Admin"]));
    assert_ids(&scope, &[2, 3]);
}

#[test]
fn type_filter_ignores_unknown_and_unrelated_types() {
    let catalog = scope_suite_catalog();
    let user = catalog.model("User").unwrap();
    let original = user.all().unwrap().where_eq("name", json!("Dan"));

    for requested in ["InvalidClass", "Post", "User", ""] {
        let scope = add_scopes(
            &user,
            &catalog,
            &params(json!({ "type": requested })),
            original.clone(),
        )
        .unwrap();
        assert_eq!(scope, original, "type={requested:?} should be ignored");
    }
}

// ============================================================================
// STATIC AND DYNAMIC SCOPES
// ============================================================================

#[test]
fn bare_method_matches_direct_call() {
    let catalog = scope_suite_catalog();
    let post = catalog.model("Post").unwrap();

    let via_params = add_scopes_to_all(&post, &catalog, &params(json!({ "blah": true }))).unwrap();
    let direct = post.call("blah", &[]).unwrap();

    assert_eq!(via_params, direct);
    assert_ids(&via_params, &[3]);
}

#[test]
fn protected_scope_is_unreachable_from_params() {
    let catalog = scope_suite_catalog();
    let post = catalog.model("Post").unwrap();
    let all = post.all().unwrap();

    let scope = add_scopes(
        &post,
        &catalog,
        &params(json!({ "protected_scope_test": { "user_id": "1" } })),
        all.clone(),
    )
    .unwrap();
    assert_eq!(scope, all);
    assert_ids(&post.call("protected_scope_test", &[json!(1)]).unwrap(), &[2, 4, 6]);
}

#[test]
fn dynamic_scopes_filter_records() {
    let catalog = scope_suite_catalog();
    let post = catalog.model("Post").unwrap();

    let scope = add_scopes_to_all(
        &post,
        &catalog,
        &params(json!({
            "blank_arg_scope": { "user_id": "" },
            "user_id_scope": { "user_id": "2" },
            "vararg_scope": { "ids": ["1", "3", "4", "5"] },
        })),
    )
    .unwrap();

    assert_where_value(&scope, "user_id", json!("2"));
    assert_ids(&scope, &[1, 3, 5]);
}

#[test]
fn two_param_scope_and_static_scope() {
    let catalog = scope_suite_catalog();
    let post = catalog.model("Post").unwrap();

    let scope = add_scopes_to_all(
        &post,
        &catalog,
        &params(json!({
            "no_param_scope": "1",
            "two_param_scope": { "id1": "2", "id2": "3" },
        })),
    )
    .unwrap();
    assert_ids(&scope, &[2]);
}

#[test]
fn ids_shortcut_and_builtins() {
    let catalog = scope_suite_catalog();
    let post = catalog.model("Post").unwrap();

    let scope = add_scopes_to_all(&post, &catalog, &params(json!({ "ids": ["2", "5", "6"] }))).unwrap();
    assert_ids(&scope, &[2, 5, 6]);

    let scope = add_scopes_to_all(&post, &catalog, &params(json!({ "ids": "4" }))).unwrap();
    assert_ids(&scope, &[4]);

    let scope = add_scopes_to_all(&post, &catalog, &params(json!({ "last": true }))).unwrap();
    assert_ids(&scope, &[6]);
}

#[test]
fn malformed_arguments_are_errors() {
    let catalog = scope_suite_catalog();
    let post = catalog.model("Post").unwrap();

    assert_params_error(&add_scopes_to_all(
        &post,
        &catalog,
        &params(json!({ "two_param_scope": "1,2" })),
    ));
    assert_params_error(&add_scopes_to_all(
        &post,
        &catalog,
        &params(json!({ "vararg_scope": { "ids": "1" } })),
    ));
}

#[test]
fn registry_out_of_sync_with_collection_surfaces() {
    let catalog = scope_suite_catalog();
    let post = catalog.model("Post").unwrap();
    post.scope_registry()
        .declare("ghost", autoscope_core::Signature::new())
        .unwrap();

    assert_collection_error(&add_scopes_to_all(&post, &catalog, &params(json!({ "ghost": 1 }))));
}

// ============================================================================
// PAGINATION
// ============================================================================

#[test]
fn pagination_selects_a_page() {
    let catalog = scope_suite_catalog();
    let post = catalog.model("Post").unwrap();

    let scope = add_scopes_to_all(
        &post,
        &catalog,
        &params(json!({ "page": "2", "per_page": "4" })),
    )
    .unwrap();
    assert_ids(&scope, &[5, 6]);

    let scope = add_scopes_to_all(&post, &catalog, &params(json!({ "page": 2 }))).unwrap();
    assert!(scope.records().unwrap().is_empty());
}

#[test]
fn pagination_is_clamped_by_config() {
    let catalog = scope_suite_catalog();
    let post = catalog.model("Post").unwrap();
    let engine = ScopeEngine::for_model(&post, &catalog).with_config(AutoscopeConfig {
        default_page: 1,
        default_per_page: 20,
        max_per_page: Some(2),
    });

    let scope = engine
        .add_scopes(&params(json!({ "per_page": 50 })), post.all().unwrap())
        .unwrap();
    assert_ids(&scope, &[1, 2]);
}

#[test]
fn invalid_pagination_is_an_error() {
    let catalog = scope_suite_catalog();
    let post = catalog.model("Post").unwrap();

    assert_invalid_pagination(
        &add_scopes_to_all(&post, &catalog, &params(json!({ "per_page": "0" }))),
        "per_page",
    );
}

// ============================================================================
// QUERY STRINGS
// ============================================================================

#[test]
fn query_string_end_to_end() {
    let catalog = blog_catalog().unwrap();
    let post = catalog.model("Post").unwrap();
    let params = RequestParams::from_query(
        "published=1&by_user[user_id]=1&with_ids[ids][]=3&with_ids[ids][]=6&with_ids[ids][]=9&recent=true",
    )
    .unwrap();

    let scope = add_scopes_to_all(&post, &catalog, &params).unwrap();
    assert_ids(&scope, &[6]);
}

#[test]
fn query_string_type_and_inherited_scope() {
    let catalog = blog_catalog().unwrap();
    let user = catalog.model("User").unwrap();
    let params = RequestParams::from_query("type=Admin&by_name[name]=Dan").unwrap();

    let scope = add_scopes_to_all(&user, &catalog, &params).unwrap();
    assert_eq!(scope.model_type(), &TypeDescriptor::new("Admin"));
    assert_ids(&scope, &[3]);
}
