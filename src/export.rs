//! Fixed-column CSV export of collected posts and reshares.

use crate::cells::encode_list;
use crate::date::today;
use crate::model::Post;
use crate::paths::{export_file_name, ExportKind};
use crate::util::{create_with_backoff, replace_file_atomic_backoff, tmp_path_for};
use anyhow::{bail, Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use time::Date;

/// Header of a post table.
pub const POST_COLUMNS: [&str; 17] = [
    "tweet_id", "creation_date", "full_text", "mentions", "entities_hashtags",
    "user_name", "user_screen_name", "user_id", "location", "description",
    "protected", "followers_count", "friends_count", "profile_created_at",
    "retweet_count", "favourite_count", "search_key",
];

/// Header of a reshare table: post columns plus the original post id.
pub const RESHARE_COLUMNS: [&str; 18] = [
    "tweet_id", "creation_date", "full_text", "mentions", "entities_hashtags",
    "user_name", "user_screen_name", "user_id", "location", "description",
    "protected", "followers_count", "friends_count", "profile_created_at",
    "retweet_count", "favourite_count", "RT_of_ID", "search_key",
];

/// Flat projection of one post or reshare.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportRow {
    pub post_id: u64,
    pub created_at: String,
    pub full_text: String,
    pub mentions: Vec<String>,
    pub hashtags: Vec<String>,
    pub user_name: String,
    pub user_screen_name: String,
    pub user_id: u64,
    pub location: String,
    pub description: String,
    pub protected: bool,
    pub followers_count: u64,
    pub friends_count: u64,
    pub profile_created_at: String,
    pub reshare_count: u64,
    pub favorite_count: u64,
    pub original_post_id: Option<u64>,
    pub search_key: String,
}

impl ExportRow {
    pub fn from_post(post: &Post, search_key: &str) -> Self {
        Self {
            post_id: post.id,
            created_at: post.created_at.clone(),
            full_text: post.body().to_string(),
            mentions: post.mention_handles(),
            hashtags: post.hashtag_texts(),
            user_name: post.user.name.clone(),
            user_screen_name: post.user.screen_name.clone(),
            user_id: post.user.id,
            location: post.user.location.clone().unwrap_or_default(),
            description: post.user.description.clone().unwrap_or_default(),
            protected: post.user.protected,
            followers_count: post.user.followers_count,
            friends_count: post.user.friends_count,
            profile_created_at: post.user.created_at.clone(),
            reshare_count: post.retweet_count,
            favorite_count: post.favorite_count,
            original_post_id: None,
            search_key: search_key.to_string(),
        }
    }

    /// Reshare row; the embedded original wins over the id it was fetched for.
    pub fn from_reshare(reshare: &Post, fetched_for: u64, search_key: &str) -> Self {
        let mut row = Self::from_post(reshare, search_key);
        row.original_post_id = Some(reshare.original_id().unwrap_or(fetched_for));
        row
    }

    /// Cells in `POST_COLUMNS` order, or `RESHARE_COLUMNS` order when `with_origin`.
    pub fn to_record(&self, with_origin: bool) -> Vec<String> {
        let mut rec = vec![
            self.post_id.to_string(),
            self.created_at.clone(),
            self.full_text.clone(),
            encode_list(&self.mentions),
            encode_list(&self.hashtags),
            self.user_name.clone(),
            self.user_screen_name.clone(),
            self.user_id.to_string(),
            self.location.clone(),
            self.description.clone(),
            self.protected.to_string(),
            self.followers_count.to_string(),
            self.friends_count.to_string(),
            self.profile_created_at.clone(),
            self.reshare_count.to_string(),
            self.favorite_count.to_string(),
        ];
        if with_origin {
            rec.push(self.original_post_id.map(|id| id.to_string()).unwrap_or_default());
        }
        rec.push(self.search_key.clone());
        rec
    }
}

/// Writes post/reshare tables into a fixed output directory.
#[derive(Clone, Debug)]
pub struct Exporter {
    out_dir: PathBuf,
    date: Option<Date>,
}

impl Exporter {
    pub fn new(out_dir: impl AsRef<Path>) -> Self {
        Self { out_dir: out_dir.as_ref().to_path_buf(), date: None }
    }

    /// Pin the date used in file names (defaults to today).
    pub fn with_date(mut self, date: Date) -> Self {
        self.date = Some(date);
        self
    }

    pub fn out_dir(&self) -> &Path { &self.out_dir }

    pub fn path_for(&self, kind: ExportKind, search_key: &str) -> PathBuf {
        let date = self.date.unwrap_or_else(today);
        self.out_dir.join(export_file_name(kind, search_key, date))
    }

    /// One row per post → `TW_<key>_<date>.csv`.
    pub fn export_posts(&self, search_key: &str, posts: &[Post]) -> Result<PathBuf> {
        let rows = posts.iter().map(|p| ExportRow::from_post(p, search_key));
        let path = self.path_for(ExportKind::Posts, search_key);
        let n = write_table(&path, &POST_COLUMNS, rows, false)?;
        tracing::info!("Wrote {} post rows to {}", n, path.display());
        Ok(path)
    }

    /// One row per reshare → `RT_<key>_<date>.csv`. Fails when no post was
    /// queried for reshares; queried posts with no reshares give a header-only table.
    pub fn export_reshares(&self, search_key: &str, reshares: &BTreeMap<u64, Vec<Post>>) -> Result<PathBuf> {
        if reshares.is_empty() {
            bail!("No reshares to write as CSV.");
        }
        let rows = reshares
            .iter()
            .flat_map(|(id, list)| list.iter().map(move |r| ExportRow::from_reshare(r, *id, search_key)));
        let path = self.path_for(ExportKind::Reshares, search_key);
        let n = write_table(&path, &RESHARE_COLUMNS, rows, true)?;
        tracing::info!("Wrote {} reshare rows to {}", n, path.display());
        Ok(path)
    }
}

/// Write header + rows to a temp sibling of `path`, then move it into place.
fn write_table(
    path: &Path,
    header: &[&str],
    rows: impl Iterator<Item = ExportRow>,
    with_origin: bool,
) -> Result<usize> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let tmp = tmp_path_for(path);
    let file = create_with_backoff(&tmp, 16, 50).with_context(|| format!("create {}", tmp.display()))?;

    let mut w = csv::Writer::from_writer(BufWriter::new(file));
    w.write_record(header)?;
    let mut n = 0usize;
    for row in rows {
        w.write_record(row.to_record(with_origin))?;
        n += 1;
    }
    w.flush().with_context(|| format!("flush {}", tmp.display()))?;
    drop(w);

    replace_file_atomic_backoff(&tmp, path)?;
    Ok(n)
}
