//! Integration tests for parsing a model repository from disk.

use std::fs;

use groundsql::lookml::{parse_project, ParseError};
use groundsql::model::{DimensionType, JoinKind};
use tempfile::tempdir;

const MODEL_SOURCE: &str = r#"
connection: "warehouse"
include: "*.view.lkml"

explore: orders {
  join: users {
    type: left_outer
    sql_on: ${orders.user_id} = ${users.id} ;;
    relationship: many_to_one
  }
}
"#;

const ORDERS_VIEW_SOURCE: &str = r#"
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

  dimension_group: created {
    type: time
    timeframes: [date, week, month]
    sql: ${TABLE}.created_at ;;
  }

  measure: order_count {
    type: count
    sql: COUNT(${TABLE}.id) ;;
  }
}
"#;

const USERS_VIEW_SOURCE: &str = r#"
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
}
"#;

#[test]
fn parses_repository_with_models_and_views() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("sales.model.lkml"), MODEL_SOURCE).unwrap();
    fs::write(dir.path().join("orders.view.lkml"), ORDERS_VIEW_SOURCE).unwrap();
    fs::write(dir.path().join("users.view.lkml"), USERS_VIEW_SOURCE).unwrap();

    let project = parse_project(dir.path()).unwrap();

    assert_eq!(project.models.len(), 1);
    assert_eq!(project.views.len(), 2);

    let model = &project.models["sales"];
    assert_eq!(model.connection.as_deref(), Some("warehouse"));
    assert_eq!(model.include, vec!["*.view.lkml"]);

    let explore = &model.explores["orders"];
    assert_eq!(explore.base_view(), "orders");
    assert_eq!(explore.joins.len(), 1);
    assert_eq!(explore.joins[0].kind, JoinKind::LeftOuter);
    assert_eq!(
        explore.joins[0].sql_on.as_deref(),
        Some("${orders.user_id} = ${users.id}")
    );

    let orders = &project.views["orders"];
    assert_eq!(
        orders.sql_table_name.as_deref(),
        Some("`shop.analytics.orders`")
    );
    assert_eq!(orders.primary_key.as_deref(), Some("id"));
    assert_eq!(orders.dimensions.len(), 3);
    assert_eq!(orders.measures.len(), 1);

    let created = &orders.dimensions["created"];
    assert_eq!(created.dimension_type, DimensionType::Time);
    assert_eq!(created.timeframes, vec!["date", "week", "month"]);

    let email = &project.views["users"].dimensions["email"];
    assert!(email.hidden);
}

#[test]
fn walks_nested_directories() {
    let dir = tempdir().unwrap();
    let nested = dir.path().join("views").join("core");
    fs::create_dir_all(&nested).unwrap();
    fs::write(dir.path().join("sales.model.lkml"), MODEL_SOURCE).unwrap();
    fs::write(nested.join("users.view.lkml"), USERS_VIEW_SOURCE).unwrap();

    let project = parse_project(dir.path()).unwrap();
    assert!(project.views.contains_key("users"));
}

#[test]
fn skips_malformed_files_and_keeps_the_rest() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("users.view.lkml"), USERS_VIEW_SOURCE).unwrap();
    fs::write(
        dir.path().join("broken.view.lkml"),
        "view: broken { dimension: id {",
    )
    .unwrap();

    let project = parse_project(dir.path()).unwrap();
    assert!(project.views.contains_key("users"));
    assert!(!project.views.contains_key("broken"));
}

#[test]
fn ignores_unrelated_files() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("users.view.lkml"), USERS_VIEW_SOURCE).unwrap();
    fs::write(dir.path().join("README.md"), "# not a model").unwrap();

    let project = parse_project(dir.path()).unwrap();
    assert_eq!(project.views.len(), 1);
}

#[test]
fn empty_repository_is_an_error() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("README.md"), "# nothing here").unwrap();

    let result = parse_project(dir.path());
    assert!(matches!(result, Err(ParseError::EmptyProject(_))));
}

#[test]
fn missing_repository_is_an_error() {
    let result = parse_project(std::path::Path::new("/nonexistent/model/repo"));
    assert!(matches!(result, Err(ParseError::RepositoryNotFound(_))));
}

#[test]
fn model_name_comes_from_the_file_name() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("finance.model.lkml"), "connection: dwh").unwrap();

    let project = parse_project(dir.path()).unwrap();
    assert!(project.models.contains_key("finance"));
}
