//! End-to-end tests for the query converter.

use std::sync::Arc;

use insta::assert_snapshot;
use semql::catalog::{Catalog, InMemoryCatalog};
use semql::compile::{CompileError, QueryConverter};
use semql::config::Settings;
use semql::model::{
    Aggregation, DefaultMetric, ModelSchema, QueryRequest, SchemaElement,
};
use semql::semantic::{DefaultMetricPolicy, SynthesizedMetric};
use semql::corrector::limit_value;
use semql::sql::{self, parse_statement};

fn sales_schema() -> ModelSchema {
    ModelSchema::new(1, "sales", "sales", "dw.sales")
        .with_dimension(SchemaElement::new("region", "region_code"))
        .with_dimension(SchemaElement::new("channel", "channel_code"))
        .with_dimension(SchemaElement::new("order_day", "order_dt"))
        .with_metric(SchemaElement::new("revenue", "revenue_amt"))
        .with_full_path("/retail/sales")
}

fn converter_with(schema: ModelSchema, database_type: Option<&str>) -> QueryConverter {
    let catalog = InMemoryCatalog::new();
    catalog.register(schema, database_type.map(String::from));
    QueryConverter::new(Arc::new(catalog))
}

#[test]
fn test_dimension_only_request_gets_count_metric() {
    let converter = converter_with(sales_schema(), None);
    let statement = converter
        .compile(&QueryRequest::new(1, "select region, channel from sales"))
        .unwrap();

    let table = statement.logical_table.as_ref().unwrap();
    assert_eq!(table.metrics, vec!["sales_internal_cnt"]);
    assert_eq!(table.dimensions, vec!["region", "channel"]);
    assert_eq!(statement.sql.matches("COUNT(1) AS sales_internal_cnt").count(), 1);
    assert_snapshot!(statement.sql, @"SELECT region_code, channel_code FROM (SELECT region_code, channel_code, COUNT(1) AS sales_internal_cnt FROM dw.sales GROUP BY region_code, channel_code) AS sales LIMIT 1000");
}

#[test]
fn test_configured_default_metric_rule() {
    let schema = sales_schema().with_default_metric(DefaultMetric {
        name: Some("regions".to_string()),
        aggregation: Aggregation::CountDistinct,
        column: Some("region".to_string()),
    });
    let statement = converter_with(schema, None)
        .compile(&QueryRequest::new(1, "select channel from sales"))
        .unwrap();

    assert_eq!(
        statement.logical_table.unwrap().metrics,
        vec!["regions"]
    );
    assert!(statement
        .sql
        .contains("COUNT(DISTINCT region_code) AS regions"));
}

#[derive(Debug)]
struct FixedPolicy;

impl DefaultMetricPolicy for FixedPolicy {
    fn synthesize(&self, _schema: &ModelSchema, dimensions: &[String]) -> SynthesizedMetric {
        SynthesizedMetric {
            name: format!("rows_by_{}", dimensions.len()),
            expr: "COUNT(*)".to_string(),
        }
    }
}

#[test]
fn test_pluggable_default_metric_policy() {
    let statement = converter_with(sales_schema(), None)
        .with_default_metric_policy(FixedPolicy)
        .compile(&QueryRequest::new(1, "select region from sales"))
        .unwrap();
    assert!(statement.sql.contains("COUNT(*) AS rows_by_1"));
}

#[test]
fn test_metric_request_has_no_synthesized_metric() {
    let statement = converter_with(sales_schema(), None)
        .compile(&QueryRequest::new(
            1,
            "select region, sum(revenue) from sales group by region",
        ))
        .unwrap();
    assert!(statement.has_aggregation);
    assert!(!statement.sql.contains("internal_cnt"));
    assert_eq!(statement.logical_table.unwrap().metrics, vec!["revenue"]);
}

#[test]
fn test_name_declared_twice_resolves_to_metric() {
    let schema = sales_schema().with_dimension(SchemaElement::new("revenue", "revenue_dim"));
    let request = QueryRequest::new(1, "select region, revenue from sales");

    for _ in 0..20 {
        let statement = converter_with(schema.clone(), None).compile(&request).unwrap();
        let table = statement.logical_table.as_ref().unwrap();
        assert_eq!(table.metrics, vec!["revenue"]);
        assert_eq!(table.dimensions, vec!["region"]);
        assert_eq!(
            statement.sql,
            "SELECT region_code, revenue_amt FROM (SELECT region_code, SUM(revenue_amt) AS revenue_amt \
             FROM dw.sales GROUP BY region_code) AS sales LIMIT 1000"
        );
    }
}

#[test]
fn test_unregistered_model_is_empty() {
    let converter = converter_with(sales_schema(), None);
    let statement = converter
        .compile(&QueryRequest::new(99, "select region from sales"))
        .unwrap();
    assert!(statement.is_empty());
    assert!(statement.logical_table.is_none());
}

#[test]
fn test_convert_without_schemas_is_empty() {
    let converter = converter_with(sales_schema(), None);
    let statement = converter
        .convert(&QueryRequest::new(1, "select region from sales"), &[])
        .unwrap();
    assert!(statement.is_empty());
}

#[test]
fn test_malformed_sql_is_an_error() {
    let converter = converter_with(sales_schema(), None);
    let err = converter
        .compile(&QueryRequest::new(1, "select region from sales where"))
        .unwrap_err();
    match err {
        CompileError::MalformedInput { sql, message } => {
            assert_eq!(sql, "select region from sales where");
            assert!(!message.is_empty());
        }
    }
}

#[test]
fn test_limit_bounded_by_ceiling() {
    let settings = Settings::from_toml_str("[compiler]\nlimit_ceiling = 50\n").unwrap();
    let catalog = InMemoryCatalog::new();
    catalog.register(sales_schema(), None);
    let converter = QueryConverter::from_settings(Arc::new(catalog), &settings);

    for input in [
        "select region from sales",
        "select region from sales limit 10",
        "select region from sales limit 100000",
    ] {
        let statement = converter.compile(&QueryRequest::new(1, input)).unwrap();
        let parsed = parse_statement(&statement.sql).unwrap();
        let limit = limit_value(sql::query(&parsed).unwrap()).unwrap();
        assert!(limit <= 50, "{} -> {}", input, statement.sql);
    }
}

#[test]
fn test_engine_functions_applied() {
    let converter = converter_with(sales_schema(), Some("ClickHouse"));
    let statement = converter
        .compile(&QueryRequest::new(
            1,
            "select region from sales where year(order_day) = 2023",
        ))
        .unwrap();
    assert!(statement.sql.contains("toYear(order_dt) = 2023"), "{}", statement.sql);
    assert!(statement.warnings.is_empty());
}

#[test]
fn test_filter_fields_are_appended_and_rewritten() {
    let converter = converter_with(sales_schema(), Some("mysql"));
    let statement = converter
        .compile(&QueryRequest::new(
            1,
            "select region from sales where revenue > 10 order by channel desc limit 5",
        ))
        .unwrap();
    assert!(
        statement
            .sql
            .starts_with("SELECT region_code, revenue_amt, channel_code FROM (SELECT region_code, channel_code, SUM(revenue_amt) AS revenue_amt"),
        "{}",
        statement.sql
    );
    assert!(statement.sql.ends_with("WHERE revenue_amt > 10 ORDER BY channel_code DESC LIMIT 5"));
}

#[test]
fn test_unknown_identifier_warns() {
    let statement = converter_with(sales_schema(), None)
        .compile(&QueryRequest::new(1, "select region, mystery from sales"))
        .unwrap();
    assert!(!statement.is_empty());
    assert!(statement
        .warnings
        .iter()
        .any(|w| w.stage == "planner" && w.message.contains("mystery")));
}

#[test]
fn test_snapshot_isolation_across_replace() {
    let catalog = Arc::new(InMemoryCatalog::new());
    catalog.register(sales_schema(), None);
    let snapshot = catalog.schema(1).unwrap();

    catalog.replace(ModelSchema::new(1, "sales", "sales", "dw.sales_v2"));

    let converter = QueryConverter::new(catalog.clone());
    let request = QueryRequest::new(1, "select region from sales");
    let old = converter.convert(&request, &[snapshot]).unwrap();
    let new = converter.compile(&request).unwrap();

    assert!(old.sql.contains("FROM dw.sales GROUP BY"));
    assert!(new.sql.contains("FROM dw.sales_v2"));
}
