//! Integration tests for the query planner.

use groundsql::grounding::GroundingIndex;
use groundsql::lookml::{parse_model_source, parse_view_source};
use groundsql::metadata::StaticMetadataProvider;
use groundsql::model::Project;
use groundsql::planner::{PlanError, QueryPlanner};

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

          dimension: region {
            type: string
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

async fn fixture_index() -> GroundingIndex {
    GroundingIndex::build(fixture_project(), &StaticMetadataProvider::default())
        .await
        .unwrap()
}

#[tokio::test]
async fn selects_explore_and_fields_by_relevance() {
    let index = fixture_index().await;
    let planner = QueryPlanner::new(&index);

    let plan = planner.plan("total revenue by region", 100).unwrap();

    assert_eq!(plan.explore_name, "sales.orders");
    assert_eq!(plan.fields[0].name, "total_revenue");
    assert!(plan.fields.iter().any(|f| f.qualified_name() == "users.region"));
    assert!(plan.has_aggregation);
    assert_eq!(plan.limit, 100);
}

#[tokio::test]
async fn required_joins_follow_selected_fields() {
    let index = fixture_index().await;
    let planner = QueryPlanner::new(&index);

    let plan = planner.plan("total revenue by region", 100).unwrap();
    assert_eq!(plan.required_joins.len(), 1);
    assert!(plan.required_joins.contains("users"));

    let base_only = planner.plan("order status", 100).unwrap();
    assert!(base_only.required_joins.is_empty());
}

#[tokio::test]
async fn max_joins_caps_the_join_set() {
    let index = fixture_index().await;
    let planner = QueryPlanner::new(&index).with_max_joins(0);

    let plan = planner.plan("total revenue by region", 100).unwrap();
    assert!(plan.required_joins.is_empty());
}

#[tokio::test]
async fn limit_comes_from_the_request_when_spelled() {
    let index = fixture_index().await;
    let planner = QueryPlanner::new(&index);

    assert_eq!(planner.plan("top 7 orders by status", 100).unwrap().limit, 7);
    assert_eq!(planner.plan("first 12 users", 100).unwrap().limit, 12);
    assert_eq!(
        planner.plan("orders limit 3", 100).unwrap().limit,
        3
    );
    assert_eq!(planner.plan("order status", 25).unwrap().limit, 25);
}

#[tokio::test]
async fn unmatched_request_falls_back_to_leading_fields() {
    let index = fixture_index().await;
    let planner = QueryPlanner::new(&index);

    let plan = planner.plan("zzz qqq", 50).unwrap();

    assert_eq!(plan.explore_name, "sales.orders");
    assert_eq!(plan.fields.len(), 5);
    assert_eq!(plan.fields[0].qualified_name(), "orders.id");
    assert_eq!(plan.limit, 50);
}

#[tokio::test]
async fn aggregation_only_selection_gains_a_grouping_dimension() {
    let index = fixture_index().await;
    let planner = QueryPlanner::new(&index);

    let plan = planner.plan("count", 100).unwrap();

    assert_eq!(plan.fields[0].name, "order_count");
    assert!(plan.fields.iter().any(|f| !f.is_measure()));
    assert!(plan.has_aggregation);
}

#[tokio::test]
async fn relative_time_filter_targets_a_selected_temporal_field() {
    let index = fixture_index().await;
    let planner = QueryPlanner::new(&index);

    let plan = planner
        .plan("revenue by created in the last 30 days", 100)
        .unwrap();

    assert_eq!(
        plan.filters,
        vec!["DATE_DIFF(CURRENT_DATE(), DATE(orders.created), DAY) <= 30"]
    );

    let yearly = planner.plan("revenue by created this year", 100).unwrap();
    assert_eq!(
        yearly.filters,
        vec!["EXTRACT(YEAR FROM orders.created) = EXTRACT(YEAR FROM CURRENT_DATE())"]
    );
}

#[tokio::test]
async fn no_time_filter_without_a_temporal_field() {
    let index = fixture_index().await;
    let planner = QueryPlanner::new(&index);

    let plan = planner.plan("order status in the last 30 days", 100).unwrap();
    assert!(plan.filters.is_empty());
}

#[tokio::test]
async fn empty_index_is_a_plan_error() {
    let index = GroundingIndex::build(Project::default(), &StaticMetadataProvider::default())
        .await
        .unwrap();
    let planner = QueryPlanner::new(&index);

    let result = planner.plan("anything", 100);
    assert!(matches!(result, Err(PlanError::NoExplores)));
}
