//! Integration tests for the grounding index.

use groundsql::grounding::GroundingIndex;
use groundsql::lookml::{parse_model_source, parse_view_source};
use groundsql::metadata::{StaticMetadataProvider, TableMetadata};
use groundsql::model::Project;

fn fixture_project() -> Project {
    let model = parse_model_source(
        "sales",
        r#"
        connection: "warehouse"

        explore: orders {
          join: users {
            type: left_outer
            sql_on: ${orders.user_id} = ${users.id} ;;
            relationship: many_to_one
          }
        }
        "#,
    )
    .unwrap();

    let views = parse_view_source(
        r#"
        view: orders {
          sql_table_name: `shop.analytics.orders` ;;

          dimension: id {
            primary_key: yes
            type: number
            sql: ${TABLE}.id ;;
          }

          dimension: user_id {
            type: number
            sql: ${TABLE}.user_id ;;
          }

          dimension: status {
            type: string
            description: "Fulfillment status of the order"
            sql: ${TABLE}.status ;;
          }

          dimension_group: created {
            type: time
            timeframes: [date, week, month]
            sql: ${TABLE}.created_at ;;
          }

          measure: order_count {
            type: count
            sql: COUNT(${TABLE}.id) ;;
          }

          measure: total_revenue {
            type: sum
            description: "Total revenue across orders"
            sql: SUM(${TABLE}.amount) ;;
          }
        }

        view: users {
          sql_table_name: `shop.analytics.users` ;;

          dimension: id {
            primary_key: yes
            type: number
            sql: ${TABLE}.id ;;
          }

          dimension: email {
            type: string
            hidden: yes
            sql: ${TABLE}.email ;;
          }

          dimension: region {
            type: string
            description: "Sales region the user belongs to"
            sql: ${TABLE}.region ;;
          }
        }
        "#,
    )
    .unwrap();

    let mut project = Project::default();
    for view in views {
        project.views.insert(view.name.clone(), view);
    }
    project.models.insert("sales".to_string(), model);
    project
}

fn fixture_provider() -> StaticMetadataProvider {
    StaticMetadataProvider::from_tables([
        TableMetadata::new("orders")
            .with_column("id", "INT64", Some("Order identifier"))
            .with_column("user_id", "INT64", None)
            .with_column("status", "STRING", None)
            .with_column("created_at", "TIMESTAMP", None)
            .with_column("amount", "NUMERIC", None),
        TableMetadata::new("users")
            .with_column("id", "INT64", None)
            .with_column("region", "STRING", None),
    ])
}

async fn fixture_index() -> GroundingIndex {
    GroundingIndex::build(fixture_project(), &fixture_provider())
        .await
        .unwrap()
}

#[tokio::test]
async fn builds_explores_with_joined_fields() {
    let index = fixture_index().await;

    let explore = index.explore("sales.orders").unwrap();
    assert_eq!(explore.base_view, "orders");
    assert!(explore.available_fields.contains_key("orders.status"));
    assert!(explore.available_fields.contains_key("users.region"));
    assert_eq!(explore.join_graph.len(), 1);
    assert_eq!(
        explore.join_conditions["users"],
        "${orders.user_id} = ${users.id}"
    );
}

#[tokio::test]
async fn qualified_names_are_unique_keys() {
    let index = fixture_index().await;

    for explore in index.explores().values() {
        for (key, field) in &explore.available_fields {
            assert_eq!(key, &field.qualified_name());
        }
    }
}

#[tokio::test]
async fn hidden_fields_are_excluded() {
    let index = fixture_index().await;

    let explore = index.explore("sales.orders").unwrap();
    assert!(!explore.available_fields.contains_key("users.email"));
}

#[tokio::test]
async fn simple_column_references_are_enriched_with_metadata() {
    let index = fixture_index().await;
    let explore = index.explore("sales.orders").unwrap();

    let id = &explore.available_fields["orders.id"];
    assert_eq!(id.column_type.as_deref(), Some("INT64"));
    assert_eq!(id.column_description.as_deref(), Some("Order identifier"));

    // Computed expressions get no enrichment.
    let revenue = &explore.available_fields["orders.total_revenue"];
    assert!(revenue.column_type.is_none());
}

#[tokio::test]
async fn index_builds_without_metadata() {
    let index = GroundingIndex::build(fixture_project(), &StaticMetadataProvider::default())
        .await
        .unwrap();

    let explore = index.explore("sales.orders").unwrap();
    assert!(explore.available_fields["orders.id"].column_type.is_none());
}

#[tokio::test]
async fn explores_are_scored_by_field_name_matches() {
    let index = fixture_index().await;

    let terms = vec!["revenue".to_string()];
    let scored = index.find_relevant_explores(&terms);
    assert_eq!(scored.len(), 1);
    assert_eq!(scored[0].0, "sales.orders");
    assert!(scored[0].1 > 0.0);

    let none = index.find_relevant_explores(&["zebra".to_string()]);
    assert!(none.is_empty());
}

#[tokio::test]
async fn fields_are_ranked_by_name_match_over_glossary() {
    let index = fixture_index().await;

    let terms = vec!["count".to_string(), "users".to_string()];
    let ranked = index.find_relevant_fields("sales.orders", &terms);
    assert!(!ranked.is_empty());
    assert_eq!(ranked[0].0.name, "order_count");

    for window in ranked.windows(2) {
        assert!(window[0].1 >= window[1].1);
    }
}

#[tokio::test]
async fn glossary_terms_come_from_descriptions() {
    let index = fixture_index().await;

    // "fulfillment" appears only in the status dimension's description.
    let terms = vec!["fulfillment".to_string()];
    let ranked = index.find_relevant_fields("sales.orders", &terms);
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].0.qualified_name(), "orders.status");
    assert_eq!(ranked[0].1, 1.0);
}

#[tokio::test]
async fn unknown_explore_yields_no_fields() {
    let index = fixture_index().await;
    let ranked = index.find_relevant_fields("sales.missing", &["count".to_string()]);
    assert!(ranked.is_empty());
}
