mod api;
mod cells;
mod collector;
mod config;
mod date;
mod export;
mod model;
mod ndjson;
mod oauth;
mod paths;
mod progress;
mod transform;
mod twitter;
mod util;

pub use crate::api::{ApiError, SearchApi, SearchRequest};
pub use crate::collector::{CollectError, Collector, ReshareSummary, SessionState};
pub use crate::config::{
    credentials_path_from_env, data_dir_from_env, CollectOptions, Credentials, ResultMode, MAX_PAGE_SIZE,
};
pub use crate::model::{Author, Entities, Hashtag, Mention, Post};
pub use crate::twitter::{TwitterClient, DEFAULT_BASE_URL};

// export side
pub use crate::export::{ExportRow, Exporter, POST_COLUMNS, RESHARE_COLUMNS};
pub use crate::paths::{discover_exports, export_file_name, ExportKind, ExportPair};

// transform side
pub use crate::cells::{encode_list, parse_list, ListColumn};
pub use crate::transform::{combine, normalize, read_table, CombineMethod, Combined, JoinedRow, NormalizedRow, RawRow};

// shared helpers for binaries and tests
pub use crate::date::{date_stamp, parse_api_timestamp, parse_timestamp, today};
pub use crate::ndjson::NdjsonWriter;
pub use crate::oauth::{authorization_header_with, sign as oauth_sign};
pub use crate::util::init_tracing_once;
