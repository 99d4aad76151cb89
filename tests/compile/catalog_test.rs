//! Tests for catalog files and snapshots.

use std::fs;
use std::path::PathBuf;

use semql::catalog::{Catalog, CatalogError, InMemoryCatalog};
use semql::model::{Aggregation, DataType, ElementKind};

const CATALOG_TOML: &str = r#"
[[models]]
id = 1
name = "歌曲库"
biz_name = "song"
source_table = "dw.song_lib"
full_path = "/music/song"
database_type = "mysql"

[[models.dimensions]]
name = "歌手名"
technical_name = "singer_name"

[[models.dimensions]]
name = "发布日期"
technical_name = "publish_date"
data_type = "date"

[[models.metrics]]
name = "播放量"
technical_name = "play_count"
aggregation = "sum"

[models.default_metric]
aggregation = "count_distinct"
column = "singer_name"

[models.internal_columns]
sys_imp_date = "imp_date"

[[models]]
id = 2
name = "orders"
biz_name = "orders"
source_table = "dw.orders"
"#;

const CATALOG_JSON: &str = r#"{
  "models": [
    {
      "id": 5,
      "name": "sales",
      "biz_name": "sales",
      "source_table": "dw.sales",
      "database_type": "clickhouse",
      "metrics": [
        { "name": "revenue", "technical_name": "revenue_amt", "aggregation": "avg" }
      ]
    }
  ]
}"#;

fn temp_file(name: &str, content: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("semql_{}_{}", std::process::id(), name));
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_load_toml_catalog() {
    let catalog = InMemoryCatalog::from_toml_str(CATALOG_TOML).unwrap();
    assert_eq!(catalog.model_ids(), vec![1, 2]);

    let song = catalog.schema(1).unwrap();
    assert_eq!(song.full_path.as_deref(), Some("/music/song"));
    assert_eq!(song.dimensions[1].data_type, DataType::Date);
    assert_eq!(song.metrics[0].aggregation, Some(Aggregation::Sum));
    assert_eq!(
        song.default_metric.as_ref().unwrap().aggregation,
        Aggregation::CountDistinct
    );
    assert_eq!(song.internal_column_expr("sys_imp_date"), "imp_date");
    assert_eq!(song.find("singer_name").unwrap().0, ElementKind::Dimension);
    assert_eq!(catalog.database_type(1).as_deref(), Some("mysql"));

    assert!(catalog.schema(2).unwrap().is_empty());
    assert_eq!(catalog.database_type(2), None);
}

#[test]
fn test_load_json_catalog() {
    let catalog = InMemoryCatalog::from_json_str(CATALOG_JSON).unwrap();
    let sales = catalog.schema(5).unwrap();
    assert_eq!(sales.metrics[0].aggregation, Some(Aggregation::Avg));
    assert_eq!(catalog.database_type(5).as_deref(), Some("clickhouse"));
}

#[test]
fn test_from_file_chooses_format_by_extension() {
    let toml_path = temp_file("catalog.toml", CATALOG_TOML);
    let json_path = temp_file("catalog.json", CATALOG_JSON);
    let yaml_path = temp_file("catalog.yaml", "models: []");

    assert_eq!(InMemoryCatalog::from_file(&toml_path).unwrap().len(), 2);
    assert_eq!(InMemoryCatalog::from_file(&json_path).unwrap().len(), 1);
    assert!(matches!(
        InMemoryCatalog::from_file(&yaml_path),
        Err(CatalogError::UnsupportedFormat(_))
    ));
    assert!(matches!(
        InMemoryCatalog::from_file("/nonexistent/semql/catalog.toml"),
        Err(CatalogError::FileNotFound(_))
    ));

    for path in [toml_path, json_path, yaml_path] {
        let _ = fs::remove_file(path);
    }
}

#[test]
fn test_invalid_catalog_is_an_error() {
    assert!(matches!(
        InMemoryCatalog::from_toml_str("[[models]]\nid = \"one\"\n"),
        Err(CatalogError::Toml(_))
    ));
    assert!(matches!(
        InMemoryCatalog::from_json_str("{\"models\": [{}]}"),
        Err(CatalogError::Json(_))
    ));
}

#[test]
fn test_catalog_is_shareable_across_threads() {
    let catalog = std::sync::Arc::new(InMemoryCatalog::from_toml_str(CATALOG_TOML).unwrap());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let catalog = catalog.clone();
            std::thread::spawn(move || catalog.schema(1).map(|s| s.source_table.clone()))
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap().as_deref(), Some("dw.song_lib"));
    }
}
