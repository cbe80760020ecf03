//! Integration tests for expression resolution against a built index.

use std::collections::HashMap;

use groundsql::grounding::ExpressionResolver;

#[test]
fn resolves_join_condition_through_aliases() {
    let mut resolver = ExpressionResolver::new();
    resolver.set_alias("`shop.analytics.orders`", "orders");
    resolver.set_alias("`shop.analytics.users`", "users");

    let mappings = HashMap::from([
        ("orders.user_id".to_string(), "orders.user_id".to_string()),
        ("users.id".to_string(), "users.id".to_string()),
    ]);

    let resolved = resolver.resolve(
        "${orders.user_id} = ${users.id}",
        "`shop.analytics.users`",
        "users",
        &mappings,
    );
    assert_eq!(resolved, "orders.user_id = users.id");
}

#[test]
fn short_aliases_flow_through_mappings() {
    let mut resolver = ExpressionResolver::new();
    resolver.set_alias("users", "u");

    let mappings = HashMap::from([("users.id".to_string(), "u.id".to_string())]);

    assert_eq!(
        resolver.resolve("${TABLE}.created_at", "users", "users", &mappings),
        "u.created_at"
    );
    assert_eq!(
        resolver.resolve("${users.id} IS NOT NULL", "users", "users", &mappings),
        "u.id IS NOT NULL"
    );
}

#[test]
fn bare_references_default_to_the_owning_view() {
    let resolver = ExpressionResolver::new();
    let mappings = HashMap::from([("orders.amount".to_string(), "orders.amount".to_string())]);

    assert_eq!(
        resolver.resolve("SUM(${amount})", "orders", "orders", &mappings),
        "SUM(orders.amount)"
    );
}

#[test]
fn unresolved_references_survive_verbatim() {
    let resolver = ExpressionResolver::new();
    let resolved = resolver.resolve(
        "${TABLE}.total / ${ghost.rate}",
        "orders",
        "orders",
        &HashMap::new(),
    );
    assert_eq!(resolved, "orders.total / ${ghost.rate}");
}

#[test]
fn aliases_do_not_leak_between_resolvers() {
    let mut first = ExpressionResolver::new();
    first.set_alias("orders", "o");

    let second = ExpressionResolver::new();
    assert_eq!(
        second.resolve("${TABLE}.id", "orders", "orders", &HashMap::new()),
        "orders.id"
    );
}

#[test]
fn referenced_fields_collects_qualified_and_bare_names() {
    let resolver = ExpressionResolver::new();
    let refs = resolver
        .referenced_fields("${orders.user_id} = ${users.id} AND ${TABLE}.flag AND ${status}");

    assert!(refs.contains("orders.user_id"));
    assert!(refs.contains("users.id"));
    assert!(refs.contains("status"));
    assert!(!refs.contains("TABLE"));
}
