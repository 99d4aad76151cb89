//! Tests for the full corrector pipeline.

use insta::assert_snapshot;
use semql::corrector::{
    Correction, CorrectionContext, Corrector, CorrectorPipeline, LimitCorrector,
};
use semql::dialect::EngineType;

const SONG_SQL: &str = "select 歌曲名 from 歌曲库 where datediff('day', 发布日期, '2023-08-09') <= 1 \
    and 歌手名 = '邓紫棋' and sys_imp_date = '2023-08-09' and 歌曲发布时 = '2023-08-01' \
    order by 播放量 desc limit 11";

#[test]
fn test_song_library_example() {
    let (sql, warnings) = CorrectorPipeline::standard(1000).correct_sql(SONG_SQL, None);
    assert!(warnings.is_empty());
    assert_eq!(
        sql,
        "SELECT 歌曲名, 歌手名, 播放量, 歌曲发布时, 发布日期 FROM 歌曲库 \
         WHERE datediff('day', 发布日期, '2023-08-09') <= 1 AND 歌手名 = '邓紫棋' \
         AND sys_imp_date = '2023-08-09' AND 歌曲发布时 = '2023-08-01' \
         ORDER BY 播放量 DESC LIMIT 11"
    );
}

#[test]
fn test_pipeline_reaches_fixed_point() {
    let pipeline = CorrectorPipeline::standard(1000);
    for engine in [None, Some(EngineType::MySql), Some(EngineType::ClickHouse)] {
        let (once, _) = pipeline.correct_sql(SONG_SQL, engine);
        let (twice, _) = pipeline.correct_sql(&once, engine);
        assert_eq!(once, twice);
    }
}

#[test]
fn test_limit_never_exceeds_ceiling() {
    let pipeline = CorrectorPipeline::standard(100);
    for sql in [
        "select a from t",
        "select a from t limit 5000",
        "select a from t limit 100",
        "select a from t limit 7 offset 3",
    ] {
        let (corrected, _) = pipeline.correct_sql(sql, None);
        let mut ctx = CorrectionContext::new(corrected.clone());
        // A second limit pass must find nothing to change.
        let outcome = LimitCorrector::new(100).correct(&mut ctx).unwrap();
        assert_eq!(outcome, Correction::Unchanged, "{}", corrected);
    }
}

#[test]
fn test_mysql_engine_in_pipeline() {
    let (sql, _) = CorrectorPipeline::standard(1000).correct_sql(
        "select a from t where datediff('day', d, '2023-08-09') <= 1",
        Some(EngineType::MySql),
    );
    assert_snapshot!(sql, @"SELECT a, d FROM t WHERE DATEDIFF('2023-08-09', d) <= 1 LIMIT 1000");
}

#[test]
fn test_unparsable_sql_is_returned_with_warnings() {
    let (sql, warnings) = CorrectorPipeline::standard(1000).correct_sql("select a from", None);
    assert_eq!(sql, "select a from");
    assert_eq!(warnings.len(), 3);
    let stages: Vec<_> = warnings.iter().map(|w| w.stage.as_str()).collect();
    assert_eq!(stages, vec!["select_field_append", "keyword_case", "limit"]);
}

#[test]
fn test_stages_compose_on_unrelated_clauses() {
    let pipeline = CorrectorPipeline::standard(1000);
    let (sql, _) = pipeline.correct_sql("select a from t where b = 1 limit 99999", None);
    assert_eq!(sql, "SELECT a, b FROM t WHERE b = 1 LIMIT 1000");

    let (sql, _) = pipeline.correct_sql("select a, b from t where b = 1", None);
    assert_eq!(sql, "SELECT a, b FROM t WHERE b = 1 LIMIT 1000");
}
