use crate::date::{date_stamp, parse_date_stamp};
use crate::util::file_safe_key;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use time::Date;
use walkdir::WalkDir;

/// Type of exported table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportKind {
    Posts,    // TW_<key>_<date>.csv
    Reshares, // RT_<key>_<date>.csv
}

impl ExportKind {
    pub fn prefix(self) -> &'static str {
        match self {
            ExportKind::Posts => "TW",
            ExportKind::Reshares => "RT",
        }
    }
}

pub fn export_file_name(kind: ExportKind, search_key: &str, date: Date) -> String {
    format!("{}_{}_{}.csv", kind.prefix(), file_safe_key(search_key), date_stamp(date))
}

/// Post and reshare files exported for the same key on the same day.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExportPair {
    pub posts: Option<PathBuf>,
    pub reshares: Option<PathBuf>,
}

impl ExportPair {
    pub fn is_complete(&self) -> bool {
        self.posts.is_some() && self.reshares.is_some()
    }
}

/// Scan `dir` (not recursive) for exported CSVs, keyed by (file-safe key, date).
pub fn discover_exports(dir: &Path) -> BTreeMap<(String, Date), ExportPair> {
    let mut map: BTreeMap<(String, Date), ExportPair> = BTreeMap::new();
    if !dir.exists() {
        return map;
    }
    let Ok(re) = Regex::new(r"^(TW|RT)_(.+)_(\d{4}-\d{2}-\d{2})\.csv$") else {
        return map;
    };
    for ent in WalkDir::new(dir).min_depth(1).max_depth(1).into_iter().flatten() {
        if !ent.file_type().is_file() {
            continue;
        }
        let Some(name) = ent.file_name().to_str() else { continue };
        let Some(caps) = re.captures(name) else { continue };
        let Some(date) = parse_date_stamp(&caps[3]) else { continue };
        let pair = map.entry((caps[2].to_string(), date)).or_default();
        let path = ent.path().to_path_buf();
        match &caps[1] {
            "TW" => pair.posts = Some(path),
            _ => pair.reshares = Some(path),
        }
    }
    map
}
