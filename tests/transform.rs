#[path = "common/mod.rs"]
mod common;

use common::*;
use reshare_etl::{
    combine, normalize, parse_list, read_table, CombineMethod, Combined, Exporter, ListColumn, Post,
};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use time::Month;

/// Export a small session: posts 1..=3, reshares of post 1 (two) and post 3 (one).
fn export_session(dir: &std::path::Path) -> (PathBuf, PathBuf) {
    let exporter = Exporter::new(dir).with_date(fixed_date());
    let posts: Vec<Post> = vec![post(1, 2), bare_post(2, 0), post(3, 1)];
    let mut map = BTreeMap::new();
    map.insert(1, vec![reshare_of(&posts[0], 100, "carol"), reshare_of(&posts[0], 101, "dave")]);
    map.insert(3, vec![reshare_of(&posts[2], 300, "erin")]);
    (
        exporter.export_posts("rust", &posts).unwrap(),
        exporter.export_reshares("rust", &map).unwrap(),
    )
}

/// Rows written by the exporter come back with their lists intact and in
/// order; an empty list comes back as `None`.
#[test]
fn export_then_read_recovers_lists() {
    let tmp = tempfile::tempdir().unwrap();
    let (posts_path, _) = export_session(tmp.path());

    let rows = read_table(&posts_path).unwrap();
    assert_eq!(rows.len(), 3);

    assert_eq!(rows[0].mentions, Some(vec!["alice".to_string(), "bob".to_string()]));
    assert_eq!(rows[0].hashtags, Some(vec!["rust".to_string(), "etl".to_string()]));
    assert_eq!(rows[1].mentions, None);
    assert_eq!(rows[1].hashtags, None);

    assert_eq!(rows[0].created_at.year(), 2018);
    assert_eq!(rows[0].created_at.month(), Month::October);
    assert_eq!(rows[0].profile_created_at.year(), 2011);
    assert_eq!(rows[0].description, "writes \"code\", drinks coffee");
    assert!(!rows[0].is_reshare);
    assert_eq!(rows[0].search_key.as_deref(), Some("rust"));
}

/// Reshare rows are flagged by their "RT" prefix and keep the origin id.
#[test]
fn reshare_rows_are_flagged() {
    let tmp = tempfile::tempdir().unwrap();
    let (_, reshares_path) = export_session(tmp.path());

    let rows = read_table(&reshares_path).unwrap();
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|r| r.is_reshare));
    let origins: Vec<Option<u64>> = rows.iter().map(|r| r.original_post_id).collect();
    assert_eq!(origins, vec![Some(1), Some(1), Some(3)]);
}

/// Files written by the older dataframe-based exporter: a leading unnamed
/// index column, Python-repr list cells, capitalized booleans, and no RT_of_ID.
#[test]
fn reads_legacy_dataframe_export() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("TW_legacy_2020-01-01.csv");
    let csv = "\
,tweet_id,creation_date,full_text,mentions,entities_hashtags,user_name,user_screen_name,user_id,location,description,protected,followers_count,friends_count,profile_created_at,retweet_count,favourite_count,search_key
0,11,Wed Oct 10 20:19:24 +0000 2018,hello world,\"['alice', 'bob']\",\"['rust', 'etl']\",Ann,ann,5,,,False,1,2,Sat Jan 01 00:00:00 +0000 2011,4,0,rust
1,12,Wed Oct 10 20:19:24 +0000 2018,RT @ann: hello,[],[],Ben,ben,6,Oslo,,True,1,2,Sat Jan 01 00:00:00 +0000 2011,4,0,rust
";
    fs::write(&path, csv).unwrap();

    let rows = read_table(&path).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].post_id, 11);
    assert_eq!(rows[0].mentions, Some(vec!["alice".to_string(), "bob".to_string()]));
    assert_eq!(rows[0].hashtags, Some(vec!["rust".to_string(), "etl".to_string()]));
    assert!(!rows[0].protected);
    assert_eq!(rows[0].original_post_id, None);
    assert_eq!(rows[1].mentions, None);
    assert!(rows[1].protected);
    assert!(rows[1].is_reshare);
}

/// Normalizing the serialized form of a normalized row changes nothing.
#[test]
fn normalize_is_idempotent() {
    let tmp = tempfile::tempdir().unwrap();
    let (posts_path, reshares_path) = export_session(tmp.path());

    for path in [posts_path, reshares_path] {
        for row in read_table(&path).unwrap() {
            let again = normalize(row.to_raw()).unwrap();
            assert_eq!(again, row);
            let third = normalize(again.to_raw()).unwrap();
            assert_eq!(third, row);
        }
    }
}

#[test]
fn list_cells_parse_both_formats() {
    assert_eq!(parse_list(r#"["a","b c"]"#, ListColumn::Mentions), Some(vec!["a".into(), "b c".into()]));
    assert_eq!(parse_list("['a', 'b']", ListColumn::Mentions), Some(vec!["a".into(), "b".into()]));
    assert_eq!(parse_list("['x', 'y_2']", ListColumn::Hashtags), Some(vec!["x".into(), "y_2".into()]));
    assert_eq!(parse_list("[]", ListColumn::Hashtags), None);
    assert_eq!(parse_list("", ListColumn::Mentions), None);
}

/// Stacking keeps every row of both tables.
#[test]
fn concat_row_count_is_sum() {
    let tmp = tempfile::tempdir().unwrap();
    let (posts_path, reshares_path) = export_session(tmp.path());

    let combined = combine(&posts_path, &reshares_path, CombineMethod::Concat).unwrap();
    assert_eq!(combined.len(), 3 + 3);
    let Combined::Stacked(rows) = &combined else { panic!("expected stacked output") };
    assert!(rows[..3].iter().all(|r| !r.is_reshare));
    assert!(rows[3..].iter().all(|r| r.is_reshare));
}

/// Joining keeps each post exactly once, whatever the number of reshares
/// pointing at it; unmatched posts carry no reshares.
#[test]
fn join_keeps_each_post_once() {
    let tmp = tempfile::tempdir().unwrap();
    let (posts_path, reshares_path) = export_session(tmp.path());

    let combined = combine(&posts_path, &reshares_path, CombineMethod::Join).unwrap();
    let Combined::Joined(rows) = &combined else { panic!("expected joined output") };

    let ids: Vec<u64> = rows.iter().map(|r| r.post.post_id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    let counts: Vec<usize> = rows.iter().map(|r| r.reshares.len()).collect();
    assert_eq!(counts, vec![2, 0, 1]);
    assert!(rows[0].reshares.iter().all(|r| r.original_post_id == Some(1)));
}

#[test]
fn unknown_combine_method_is_rejected() {
    assert_eq!("concat".parse::<CombineMethod>().unwrap(), CombineMethod::Concat);
    assert_eq!(" JOIN ".parse::<CombineMethod>().unwrap(), CombineMethod::Join);
    let err = "merge".parse::<CombineMethod>().unwrap_err();
    assert!(err.to_string().contains("merge"));
}

/// Combined output can be written as NDJSON and as CSV for both methods.
#[test]
fn combined_output_writers() {
    let tmp = tempfile::tempdir().unwrap();
    let (posts_path, reshares_path) = export_session(tmp.path());

    let joined = combine(&posts_path, &reshares_path, CombineMethod::Join).unwrap();
    let out = tmp.path().join("joined.ndjson");
    assert_eq!(joined.write_ndjson(&out).unwrap(), 3);
    let lines = read_lines(&out);
    assert_eq!(lines.len(), 3);
    let first: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
    assert_eq!(first["post_id"], 1);
    assert_eq!(first["reshares"].as_array().unwrap().len(), 2);

    // flat join: one line per pair, plus one line for post 2 with empty rt_ cells
    let flat = tmp.path().join("joined.csv");
    assert_eq!(joined.write_csv(&flat).unwrap(), 2 + 1 + 1);
    let mut rdr = csv::Reader::from_path(&flat).unwrap();
    let header: Vec<String> = rdr.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(header.len(), 36);
    assert_eq!(header[0], "tweet_id");
    assert_eq!(header[18], "rt_tweet_id");
    let pairs: Vec<(String, String)> = rdr
        .records()
        .map(|r| {
            let r = r.unwrap();
            (r[0].to_string(), r[18].to_string())
        })
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("1".to_string(), "100".to_string()),
            ("1".to_string(), "101".to_string()),
            ("2".to_string(), String::new()),
            ("3".to_string(), "300".to_string()),
        ]
    );

    let stacked = combine(&posts_path, &reshares_path, CombineMethod::Concat).unwrap();
    let csv_out = tmp.path().join("stacked.csv");
    assert_eq!(stacked.write_csv(&csv_out).unwrap(), 6);
    // the stacked CSV reads back like any export
    let back = read_table(&csv_out).unwrap();
    assert_eq!(back.len(), 6);
    assert_eq!(back.iter().filter(|r| r.is_reshare).count(), 3);
}
