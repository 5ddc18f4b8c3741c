//! Read exported tables back, normalize them, and combine posts with reshares.

use crate::cells::{encode_opt_list, parse_list, ListColumn};
use crate::date::{format_rfc3339, parse_timestamp};
use crate::export::RESHARE_COLUMNS;
use crate::ndjson::NdjsonWriter;
use crate::util::{create_with_backoff, init_tracing_once, open_with_backoff, replace_file_atomic_backoff, tmp_path_for};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::str::FromStr;
use time::OffsetDateTime;

/// One exported row as stored on disk. Columns not listed here (such as a
/// leading unnamed index column) are ignored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    pub tweet_id: u64,
    pub creation_date: String,
    #[serde(default)]
    pub full_text: String,
    #[serde(default)]
    pub mentions: String,
    #[serde(default)]
    pub entities_hashtags: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub user_screen_name: String,
    pub user_id: u64,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub protected: String,
    #[serde(default)]
    pub followers_count: u64,
    #[serde(default)]
    pub friends_count: u64,
    pub profile_created_at: String,
    #[serde(default)]
    pub retweet_count: u64,
    #[serde(default)]
    pub favourite_count: u64,
    #[serde(rename = "RT_of_ID", default)]
    pub rt_of_id: Option<u64>,
    #[serde(default)]
    pub search_key: Option<String>,
}

impl RawRow {
    /// Cells in `RESHARE_COLUMNS` order (the union of both table layouts).
    pub fn to_record(&self) -> Vec<String> {
        vec![
            self.tweet_id.to_string(),
            self.creation_date.clone(),
            self.full_text.clone(),
            self.mentions.clone(),
            self.entities_hashtags.clone(),
            self.user_name.clone(),
            self.user_screen_name.clone(),
            self.user_id.to_string(),
            self.location.clone(),
            self.description.clone(),
            self.protected.clone(),
            self.followers_count.to_string(),
            self.friends_count.to_string(),
            self.profile_created_at.clone(),
            self.retweet_count.to_string(),
            self.favourite_count.to_string(),
            self.rt_of_id.map(|id| id.to_string()).unwrap_or_default(),
            self.search_key.clone().unwrap_or_default(),
        ]
    }
}

/// A row with parsed timestamps, restored lists, and the derived reshare flag.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NormalizedRow {
    pub post_id: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub full_text: String,
    pub mentions: Option<Vec<String>>,
    pub hashtags: Option<Vec<String>>,
    pub user_name: String,
    pub user_screen_name: String,
    pub user_id: u64,
    pub location: String,
    pub description: String,
    pub protected: bool,
    pub followers_count: u64,
    pub friends_count: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub profile_created_at: OffsetDateTime,
    pub reshare_count: u64,
    pub favorite_count: u64,
    pub original_post_id: Option<u64>,
    pub search_key: Option<String>,
    pub is_reshare: bool,
}

impl NormalizedRow {
    /// Back to the on-disk form; `normalize(row.to_raw())` yields `row` again.
    pub fn to_raw(&self) -> RawRow {
        RawRow {
            tweet_id: self.post_id,
            creation_date: format_rfc3339(self.created_at),
            full_text: self.full_text.clone(),
            mentions: encode_opt_list(self.mentions.as_deref()),
            entities_hashtags: encode_opt_list(self.hashtags.as_deref()),
            user_name: self.user_name.clone(),
            user_screen_name: self.user_screen_name.clone(),
            user_id: self.user_id,
            location: self.location.clone(),
            description: self.description.clone(),
            protected: self.protected.to_string(),
            followers_count: self.followers_count,
            friends_count: self.friends_count,
            profile_created_at: format_rfc3339(self.profile_created_at),
            retweet_count: self.reshare_count,
            favourite_count: self.favorite_count,
            rt_of_id: self.original_post_id,
            search_key: self.search_key.clone(),
        }
    }
}

fn parse_flag(s: &str) -> Result<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" | "" => Ok(false),
        other => Err(anyhow!("invalid boolean '{other}'")),
    }
}

/// Parse timestamps and list cells and derive `is_reshare` (text starts with "RT").
pub fn normalize(raw: RawRow) -> Result<NormalizedRow> {
    let created_at = parse_timestamp(&raw.creation_date).context("creation_date")?;
    let profile_created_at = parse_timestamp(&raw.profile_created_at).context("profile_created_at")?;
    let protected = parse_flag(&raw.protected).context("protected")?;

    Ok(NormalizedRow {
        post_id: raw.tweet_id,
        created_at,
        is_reshare: raw.full_text.starts_with("RT"),
        mentions: parse_list(&raw.mentions, ListColumn::Mentions),
        hashtags: parse_list(&raw.entities_hashtags, ListColumn::Hashtags),
        full_text: raw.full_text,
        user_name: raw.user_name,
        user_screen_name: raw.user_screen_name,
        user_id: raw.user_id,
        location: raw.location,
        description: raw.description,
        protected,
        followers_count: raw.followers_count,
        friends_count: raw.friends_count,
        profile_created_at,
        reshare_count: raw.retweet_count,
        favorite_count: raw.favourite_count,
        original_post_id: raw.rt_of_id,
        search_key: raw.search_key.filter(|s| !s.is_empty()),
    })
}

/// Headers left behind by dataframe writers (index columns).
fn is_artifact_column(name: &str) -> bool {
    let name = name.trim();
    name.is_empty() || name.starts_with("Unnamed")
}

/// Read an exported CSV and normalize every row.
pub fn read_table(path: &Path) -> Result<Vec<NormalizedRow>> {
    let file = open_with_backoff(path, 16, 50).with_context(|| format!("open {}", path.display()))?;
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(BufReader::new(file));

    let dropped: Vec<String> = rdr
        .headers()
        .with_context(|| format!("read header of {}", path.display()))?
        .iter()
        .filter(|h| is_artifact_column(h))
        .map(|h| h.to_string())
        .collect();
    if !dropped.is_empty() {
        tracing::debug!("{}: dropping index columns {:?}", path.display(), dropped);
    }

    let mut rows = Vec::new();
    for (i, rec) in rdr.deserialize::<RawRow>().enumerate() {
        let raw = rec.with_context(|| format!("{}: row {}", path.display(), i + 1))?;
        rows.push(normalize(raw).with_context(|| format!("{}: row {}", path.display(), i + 1))?);
    }
    Ok(rows)
}

/// How reshare rows are combined with post rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CombineMethod {
    /// Reshare rows stacked beneath post rows.
    Concat,
    /// Each post row once, with the reshares that reference it.
    Join,
}

impl CombineMethod {
    pub const ALL: [CombineMethod; 2] = [CombineMethod::Concat, CombineMethod::Join];
}

impl fmt::Display for CombineMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CombineMethod::Concat => "concat",
            CombineMethod::Join => "join",
        })
    }
}

impl FromStr for CombineMethod {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "concat" => Ok(CombineMethod::Concat),
            "join" => Ok(CombineMethod::Join),
            other => Err(anyhow!("unsupported combine method '{other}' (expected concat or join)")),
        }
    }
}

/// A post with the reshares whose `RT_of_ID` points at it (empty when none).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct JoinedRow {
    #[serde(flatten)]
    pub post: NormalizedRow,
    pub reshares: Vec<NormalizedRow>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Combined {
    Stacked(Vec<NormalizedRow>),
    Joined(Vec<JoinedRow>),
}

impl Combined {
    pub fn len(&self) -> usize {
        match self {
            Combined::Stacked(rows) => rows.len(),
            Combined::Joined(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn method(&self) -> CombineMethod {
        match self {
            Combined::Stacked(_) => CombineMethod::Concat,
            Combined::Joined(_) => CombineMethod::Join,
        }
    }

    /// One JSON object per output row.
    pub fn write_ndjson(&self, path: &Path) -> Result<usize> {
        let mut w = NdjsonWriter::create(path).with_context(|| format!("create {}", path.display()))?;
        match self {
            Combined::Stacked(rows) => rows.iter().try_for_each(|r| w.write_value(r))?,
            Combined::Joined(rows) => rows.iter().try_for_each(|r| w.write_value(r))?,
        }
        w.finish()?;
        Ok(self.len())
    }

    /// Stacked rows in the reshare column layout plus `is_reshare`.
    ///
    /// Joined rows are flattened left-join style: one line per (post, reshare)
    /// pair, post columns first and the reshare's columns prefixed with `rt_`.
    /// A post without reshares gets one line with the `rt_` cells empty.
    pub fn write_csv(&self, path: &Path) -> Result<usize> {
        let tmp = tmp_path_for(path);
        let file = create_with_backoff(&tmp, 16, 50).with_context(|| format!("create {}", tmp.display()))?;
        let mut w = csv::Writer::from_writer(BufWriter::new(file));

        let mut n = 0usize;
        match self {
            Combined::Stacked(rows) => {
                let mut header: Vec<&str> = RESHARE_COLUMNS.to_vec();
                header.push("is_reshare");
                w.write_record(&header)?;
                for row in rows {
                    let mut rec = row.to_raw().to_record();
                    rec.push(row.is_reshare.to_string());
                    w.write_record(&rec)?;
                    n += 1;
                }
            }
            Combined::Joined(rows) => {
                let header: Vec<String> = RESHARE_COLUMNS
                    .iter()
                    .map(|c| c.to_string())
                    .chain(RESHARE_COLUMNS.iter().map(|c| format!("rt_{c}")))
                    .collect();
                w.write_record(&header)?;
                for joined in rows {
                    let post = joined.post.to_raw().to_record();
                    if joined.reshares.is_empty() {
                        let blank = vec![String::new(); RESHARE_COLUMNS.len()];
                        w.write_record(post.iter().chain(blank.iter()))?;
                        n += 1;
                        continue;
                    }
                    for r in &joined.reshares {
                        let rt = r.to_raw().to_record();
                        w.write_record(post.iter().chain(rt.iter()))?;
                        n += 1;
                    }
                }
            }
        }
        w.flush().with_context(|| format!("flush {}", tmp.display()))?;
        drop(w);
        replace_file_atomic_backoff(&tmp, path)?;
        Ok(n)
    }
}

/// Read both exports, normalize them, and combine with `method`.
pub fn combine(posts_path: &Path, reshares_path: &Path, method: CombineMethod) -> Result<Combined> {
    init_tracing_once();
    let posts = read_table(posts_path)?;
    let reshares = read_table(reshares_path)?;
    tracing::info!(
        "Read {} posts from {} and {} reshares from {}",
        posts.len(),
        posts_path.display(),
        reshares.len(),
        reshares_path.display()
    );

    let combined = match method {
        CombineMethod::Concat => {
            let mut rows = posts;
            rows.extend(reshares);
            Combined::Stacked(rows)
        }
        CombineMethod::Join => {
            let mut by_origin: ahash::AHashMap<u64, Vec<NormalizedRow>> = ahash::AHashMap::new();
            let mut orphans = 0usize;
            for r in reshares {
                match r.original_post_id {
                    Some(id) => by_origin.entry(id).or_default().push(r),
                    None => orphans += 1,
                }
            }
            if orphans > 0 {
                tracing::warn!("{} reshare rows have no RT_of_ID and cannot be joined", orphans);
            }
            let rows = posts
                .into_iter()
                .map(|post| {
                    let reshares = by_origin.get(&post.post_id).cloned().unwrap_or_default();
                    JoinedRow { post, reshares }
                })
                .collect();
            Combined::Joined(rows)
        }
    };
    tracing::info!("Combined with '{}': {} rows", method, combined.len());
    Ok(combined)
}
