//! A small seeded blog catalog for demos and examples

use crate::catalog::Catalog;
use crate::filter::{FilterExpr, FilterOperator};
use crate::query::SortDirection;
use crate::record::Record;
use autoscope_core::{is_present, ScopeResult, Signature, Value};

/// Posts, users, and an `Admin` subtype of `User`, with a handful of rows.
///
/// `Post` exposes `published`, `by_user(user_id)`, `with_ids(*ids)`,
/// `between(from, to)`, `titled(title, exact?)` and the bare method
/// `recent`. `by_user_and_ids` is defined but not exposed.
pub fn blog_catalog() -> ScopeResult<Catalog> {
    let catalog = Catalog::builder()
        .model("Post", |m| {
            m.scope("published", Signature::new(), |q, _| {
                Ok(q.where_eq("published", Value::Bool(true)))
            })
            .scope("by_user", Signature::new().req("user_id"), |q, args| {
                Ok(q.where_eq("user_id", args[0].clone()))
            })
            .scope("with_ids", Signature::new().rest("ids"), |q, args| {
                Ok(q.where_in("id", args.to_vec()))
            })
            .scope("between", Signature::new().req("from").req("to"), |q, args| {
                Ok(q
                    .filter(FilterExpr::new("id", FilterOperator::Gte, args[0].clone()))
                    .filter(FilterExpr::new("id", FilterOperator::Lte, args[1].clone())))
            })
            .scope(
                "titled",
                Signature::new().req("title").opt("exact"),
                |q, args| match args.get(1) {
                    Some(exact) if is_present(exact) && exact != "false" => {
                        Ok(q.where_eq("title", args[0].clone()))
                    }
                    _ => Ok(q.filter(FilterExpr::contains("title", args[0].clone()))),
                },
            )
            .protected_scope(
                "by_user_and_ids",
                Signature::new().req("user_id").rest("ids"),
                |q, args| {
                    Ok(q
                        .where_eq("user_id", args[0].clone())
                        .where_in("id", args[1..].to_vec()))
                },
            )
            .bare_method("recent", |q| Ok(q.order_by("id", SortDirection::Desc)))
        })
        .model("User", |m| {
            m.scope("by_name", Signature::new().req("name"), |q, args| {
                Ok(q.where_eq("name", args[0].clone()))
            })
        })
        .subtype("Admin", "User", |m| {
            m.inherit_scopes()
                .scope("with_role", Signature::new().req("role"), |q, args| {
                    Ok(q.where_eq("role", args[0].clone()))
                })
        })
        .build()?;

    catalog.insert_all([
        Record::new("User").with("name", "Dan"),
        Record::new("User").with("name", "Bob"),
        Record::new("Admin").with("name", "Dan").with("role", "owner"),
        Record::new("Admin").with("name", "Eve").with("role", "editor"),
    ])?;

    catalog.insert_all((1..=12).map(|n| {
        Record::new("Post")
            .with("title", format!("Post number {n}"))
            .with("user_id", (n % 3) + 1)
            .with("published", n % 2 == 0)
    }))?;

    tracing::debug!(models = ?catalog.model_names(), "Seeded demo catalog");
    Ok(catalog)
}
