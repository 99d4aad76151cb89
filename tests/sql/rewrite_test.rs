//! Tests for column rewriting over the full expression tree.

use regex::Regex;
use semql::sql::{parse_statement, rewrite_fields, FieldNameMap};

fn technical_to_business() -> FieldNameMap {
    [
        ("singer_name", "歌手名"),
        ("play_count", "播放量"),
        ("publish_date", "发布日期"),
    ]
    .into_iter()
    .collect()
}

fn rewrite(sql: &str, map: &FieldNameMap) -> String {
    let mut statement = parse_statement(sql).unwrap();
    rewrite_fields(&mut statement, map);
    statement.to_string()
}

#[test]
fn test_rewrite_every_clause() {
    let sql = rewrite(
        "SELECT singer_name, SUM(play_count) FROM songs \
         WHERE publish_date >= '2023-08-01' GROUP BY singer_name ORDER BY SUM(play_count) DESC",
        &technical_to_business(),
    );
    assert_eq!(
        sql,
        "SELECT 歌手名, SUM(播放量) FROM songs WHERE 发布日期 >= '2023-08-01' \
         GROUP BY 歌手名 ORDER BY SUM(播放量) DESC"
    );
}

#[test]
fn test_rewrite_nested_expressions() {
    let sql = rewrite(
        "SELECT CASE WHEN play_count > 10 THEN singer_name ELSE 'x' END FROM t \
         WHERE (play_count + 1) * 2 > 5 AND singer_name IN (SELECT singer_name FROM u)",
        &technical_to_business(),
    );
    assert_eq!(
        sql,
        "SELECT CASE WHEN 播放量 > 10 THEN 歌手名 ELSE 'x' END FROM t \
         WHERE (播放量 + 1) * 2 > 5 AND 歌手名 IN (SELECT 歌手名 FROM u)"
    );
}

#[test]
fn test_no_technical_names_remain_outside_literals() {
    let map = technical_to_business();
    let sql = rewrite(
        "SELECT t.singer_name, max(play_count) AS best FROM t \
         WHERE datediff('day', publish_date, '2023-08-09') <= 1 AND singer_name <> 'play_count'",
        &map,
    );
    let without_literals = sql.replace("'play_count'", "");
    for (technical, _) in map.iter() {
        assert!(
            !without_literals.contains(technical),
            "{} left in {}",
            technical,
            sql
        );
    }
    assert!(sql.contains("t.歌手名"));
    assert!(sql.contains("AS best"));
}

#[test]
fn test_rewrite_complete_across_all_clauses() {
    let map = technical_to_business();
    let sql = rewrite(
        "SELECT singer_name, publish_date, SUM(play_count) AS plays, \
         COALESCE(MAX(play_count), 0) FROM songs \
         WHERE singer_name IN ('singer_name', 'x') \
         AND datediff('day', publish_date, '2023-08-09') <= 1 \
         AND UPPER(TRIM(singer_name)) LIKE 'play_count%' \
         GROUP BY singer_name, publish_date \
         HAVING SUM(play_count) > 10 \
         ORDER BY ABS(SUM(play_count)) DESC, publish_date",
        &map,
    );

    let literal = Regex::new("'[^']*'").unwrap();
    let outside_literals = literal.replace_all(&sql, "''");
    for (technical, business) in map.iter() {
        assert!(
            !outside_literals.contains(technical),
            "{} left in {}",
            technical,
            sql
        );
        assert!(outside_literals.contains(business));
    }

    let literals: Vec<&str> = literal.find_iter(&sql).map(|m| m.as_str()).collect();
    assert_eq!(
        literals,
        vec!["'singer_name'", "'x'", "'day'", "'2023-08-09'", "'play_count%'"]
    );
    assert!(sql.contains("GROUP BY 歌手名, 发布日期"));
    assert!(sql.contains("ORDER BY ABS(SUM(播放量)) DESC, 发布日期"));
}

#[test]
fn test_rewrite_is_case_insensitive_and_reversible() {
    let map = technical_to_business();
    let business = rewrite("SELECT SINGER_NAME FROM t WHERE Play_Count > 1", &map);
    assert_eq!(business, "SELECT 歌手名 FROM t WHERE 播放量 > 1");

    let technical = rewrite(&business, &map.inverse());
    assert_eq!(technical, "SELECT singer_name FROM t WHERE play_count > 1");
}

#[test]
fn test_unmapped_columns_pass_through() {
    let sql = rewrite(
        "SELECT other, sys_imp_date FROM t",
        &technical_to_business(),
    );
    assert_eq!(sql, "SELECT other, sys_imp_date FROM t");
}
