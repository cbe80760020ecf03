//! Integration tests for SQL assembly.

use groundsql::grounding::GroundingIndex;
use groundsql::lookml::{parse_model_source, parse_view_source};
use groundsql::metadata::StaticMetadataProvider;
use groundsql::model::Project;
use groundsql::planner::{QueryPlan, QueryPlanner};
use groundsql::sql::{enforce_limit, BuildError, SqlBuilder};

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
          join: notes {
            type: left_outer
            sql_on: ${orders.id} = ${notes.order_id} ;;
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

          measure: total_revenue {
            type: sum
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

        view: notes {
          dimension: order_id {
            type: number
            sql: ${TABLE}.order_id ;;
          }

          dimension: body {
            type: string
            sql: ${TABLE}.body ;;
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
async fn builds_a_joined_aggregate_query() {
    let index = fixture_index().await;
    let planner = QueryPlanner::new(&index);
    let plan = planner.plan("total revenue by region", 100).unwrap();

    let sql = SqlBuilder::new(&index).build(&plan).unwrap();

    assert_eq!(
        sql,
        "SELECT\n  SUM(orders.amount) AS total_revenue,\n  users.region AS region\n\
         FROM `shop.analytics.orders` AS orders\n\
         LEFT JOIN `shop.analytics.users` AS users ON orders.user_id = users.id\n\
         GROUP BY 2\n\
         LIMIT 100"
    );
}

#[tokio::test]
async fn table_aliases_are_lowercased_view_names() {
    let index = fixture_index().await;
    let planner = QueryPlanner::new(&index);
    let plan = planner.plan("user region", 100).unwrap();

    let sql = SqlBuilder::new(&index).build(&plan).unwrap();

    assert!(sql.contains("FROM `shop.analytics.orders` AS orders"));
    assert!(sql.contains("AS users ON orders.user_id = users.id"));
}

#[tokio::test]
async fn group_by_uses_positional_ordinals() {
    let index = fixture_index().await;
    let planner = QueryPlanner::new(&index);
    let plan = planner
        .plan("total revenue by region and user_id", 100)
        .unwrap();

    let sql = SqlBuilder::new(&index).build(&plan).unwrap();

    let group_by_line = sql
        .lines()
        .find(|line| line.starts_with("GROUP BY"))
        .unwrap();
    let ordinals: Vec<usize> = group_by_line
        .trim_start_matches("GROUP BY")
        .split(',')
        .map(|s| s.trim().parse().unwrap())
        .collect();

    // Every non-aggregated select position appears exactly once, in order.
    let expected: Vec<usize> = plan
        .fields
        .iter()
        .enumerate()
        .filter(|(_, f)| !f.is_measure())
        .map(|(i, _)| i + 1)
        .collect();
    assert_eq!(ordinals, expected);
}

#[tokio::test]
async fn no_group_by_without_aggregation() {
    let index = fixture_index().await;
    let planner = QueryPlanner::new(&index);
    let plan = planner.plan("user region", 100).unwrap();
    assert!(!plan.has_aggregation);

    let sql = SqlBuilder::new(&index).build(&plan).unwrap();
    assert!(!sql.contains("GROUP BY"));
}

#[tokio::test]
async fn joined_view_without_table_ref_is_fatal() {
    let index = fixture_index().await;
    let planner = QueryPlanner::new(&index);
    let plan = planner.plan("note body", 100).unwrap();
    assert!(plan.required_joins.contains("notes"));

    let result = SqlBuilder::new(&index).build(&plan);
    assert_eq!(
        result.unwrap_err(),
        BuildError::MissingTableRef {
            view: "notes".to_string()
        }
    );
}

#[tokio::test]
async fn prebuilt_sql_passes_through_verbatim() {
    let index = fixture_index().await;
    let plan = QueryPlan::prebuilt("sales.orders", "  SELECT 1 FROM t LIMIT 5\n");

    let sql = SqlBuilder::new(&index).build(&plan).unwrap();
    assert_eq!(sql, "SELECT 1 FROM t LIMIT 5");
}

#[tokio::test]
async fn unknown_explore_is_an_error() {
    let index = fixture_index().await;
    let mut plan = QueryPlan::prebuilt("sales.missing", "SELECT 1");
    plan.prebuilt_sql = None;

    let result = SqlBuilder::new(&index).build(&plan);
    assert!(matches!(result, Err(BuildError::UnknownExplore { .. })));
}

#[test]
fn enforce_limit_appends_and_is_idempotent() {
    let once = enforce_limit("SELECT region FROM users", 100);
    assert_eq!(once, "SELECT region FROM users\nLIMIT 100");
    assert_eq!(enforce_limit(&once, 100), once);
    assert_eq!(
        enforce_limit("SELECT region FROM users LIMIT 10", 100),
        "SELECT region FROM users LIMIT 10"
    );
}
