//! Scope Explainer Binary
//!
//! Applies a query string to the seeded demo catalog and prints the
//! resulting query plan and records as JSON.
//!
//! Usage:
//!   cargo run -p autoscope-engine --features explain --bin autoscope-explain -- [MODEL] '<query-string>'
//!
//! Example:
//!   cargo run -p autoscope-engine --features explain --bin autoscope-explain -- Post 'published=1&by_user[user_id]=2&per_page=3'

use autoscope_core::{AutoscopeConfig, RequestParams, ScopeResult};
use autoscope_engine::{init_tracing, ScopeEngine, TelemetryConfig};
use autoscope_registry::DefaultScope;
use autoscope_storage::demo::blog_catalog;
use serde_json::json;

fn explain(model: &str, query: &str) -> ScopeResult<serde_json::Value> {
    let config = AutoscopeConfig::from_env();
    config.validate()?;

    let catalog = blog_catalog()?;
    let model = catalog.model(model)?;
    let params = RequestParams::from_query(query)?;

    let scoped = ScopeEngine::for_model(&model, &catalog)
        .with_config(config)
        .add_scopes(&params, model.all()?)?;

    Ok(json!({
        "params": params,
        "plan": scoped.plan(),
        "where": scoped.where_values(),
        "records": scoped.records()?,
    }))
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (model, query) = match args.as_slice() {
        [query] => ("Post", query.as_str()),
        [model, query] => (model.as_str(), query.as_str()),
        _ => {
            eprintln!("Usage: autoscope-explain [MODEL] '<query-string>'");
            eprintln!();
            eprintln!("Models: Post, User, Admin (default: Post)");
            std::process::exit(2);
        }
    };

    if let Err(e) = init_tracing(&TelemetryConfig::from_env()) {
        eprintln!("Failed to initialize tracing: {}", e);
        std::process::exit(1);
    }

    let value = match explain(model, query) {
        Ok(value) => value,
        Err(e) => {
            tracing::error!(error = %e, model = %model, "Failed to apply scopes");
            eprintln!("Failed to apply scopes: {}", e);
            std::process::exit(1);
        }
    };

    match serde_json::to_string_pretty(&value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Failed to serialize output: {}", e);
            std::process::exit(1);
        }
    }
}
