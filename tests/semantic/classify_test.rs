//! Tests for metric / dimension classification.

use semql::model::{ModelSchema, SchemaElement};
use semql::semantic::classify;
use semql::sql::{all_fields, parse_statement};

fn song_schema() -> ModelSchema {
    ModelSchema::new(1, "歌曲库", "song", "dw.song_lib")
        .with_dimension(SchemaElement::new("歌曲名", "song_name"))
        .with_dimension(SchemaElement::new("歌手名", "singer_name"))
        .with_dimension(SchemaElement::new("发布日期", "publish_date"))
        .with_metric(SchemaElement::new("播放量", "play_count"))
}

fn classify_sql(sql: &str, schema: &ModelSchema) -> (Vec<String>, Vec<String>) {
    let fields = all_fields(&parse_statement(sql).unwrap());
    let result = classify(&fields, schema, sql);
    (result.metrics, result.dimensions)
}

#[test]
fn test_song_library_fields() {
    let (metrics, dimensions) = classify_sql(
        "select 歌曲名 from 歌曲库 where 歌手名 = '邓紫棋' and sys_imp_date = '2023-08-09' \
         and 未知字段 = 1 order by 播放量 desc",
        &song_schema(),
    );
    assert_eq!(metrics, vec!["播放量"]);
    assert_eq!(dimensions, vec!["歌曲名", "歌手名", "sys_imp_date"]);
}

#[test]
fn test_sets_are_disjoint_for_overlapping_schemas() {
    let schemas = [
        song_schema(),
        song_schema().with_dimension(SchemaElement::new("播放量", "play_count_bucket")),
        song_schema().with_metric(SchemaElement::new("歌手名", "singer_cnt")),
        song_schema().with_metric(SchemaElement::new("SONG_NAME", "x")),
    ];
    let sql = "select 歌曲名, 歌手名, song_name, 播放量, play_count_bucket from 歌曲库";

    for schema in &schemas {
        let (metrics, dimensions) = classify_sql(sql, schema);
        for metric in &metrics {
            assert!(
                !dimensions.contains(metric),
                "{} classified as both in {:?} / {:?}",
                metric,
                metrics,
                dimensions
            );
        }
    }
}

#[test]
fn test_internal_columns_from_text() {
    let (_, dimensions) = classify_sql(
        "select 歌曲名 from 歌曲库 where SYS_IMP_WEEK = '2023-32'",
        &song_schema(),
    );
    assert_eq!(dimensions, vec!["歌曲名", "sys_imp_week"]);
}

#[test]
fn test_empty_schema_yields_empty_sets() {
    let empty = ModelSchema::new(1, "歌曲库", "song", "dw.song_lib");
    let (metrics, dimensions) = classify_sql(
        "select 歌曲名 from 歌曲库 where sys_imp_date = '2023-08-09'",
        &empty,
    );
    assert!(metrics.is_empty());
    assert!(dimensions.is_empty());
}
