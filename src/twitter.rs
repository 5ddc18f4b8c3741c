//! Blocking `SearchApi` implementation over the v1.1 REST endpoints.

use crate::api::{ApiError, SearchApi, SearchRequest};
use crate::config::Credentials;
use crate::model::{Post, SearchResponse};
use crate::oauth::{authorization_header, encode_pairs};
use reqwest::blocking::Client;
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.twitter.com/1.1";

/// Reshare listings are capped at 100 per post by the API.
const RESHARES_PER_POST: usize = 100;

pub struct TwitterClient {
    http: Client,
    creds: Credentials,
    base_url: String,
}

impl TwitterClient {
    pub fn new(creds: Credentials) -> Result<Self, ApiError> {
        Self::with_base_url(creds, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(creds: Credentials, base_url: impl Into<String>) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .gzip(true)
            .user_agent(concat!("reshare-etl/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Transient(e.to_string()))?;
        Ok(Self { http, creds, base_url: base_url.into().trim_end_matches('/').to_string() })
    }

    fn get<T: DeserializeOwned>(&self, path: &str, query: &[(String, String)]) -> Result<T, ApiError> {
        let url = format!("{}/{}", self.base_url, path);
        let auth = authorization_header("GET", &url, query, &self.creds)
            .map_err(|e| ApiError::Unauthorized(e.to_string()))?;

        // The query string must be encoded exactly as it was signed.
        let full = if query.is_empty() { url } else { format!("{url}?{}", encode_pairs(query)) };
        tracing::debug!("GET {}", full);

        let resp = self
            .http
            .get(&full)
            .header(AUTHORIZATION, auth)
            .send()
            .map_err(|e| ApiError::Transient(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(classify(status, body));
        }
        resp.json::<T>().map_err(|e| ApiError::Decode(e.to_string()))
    }
}

fn classify(status: StatusCode, body: String) -> ApiError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited,
        StatusCode::UNAUTHORIZED => ApiError::Unauthorized(body),
        StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => ApiError::Unavailable(body),
        s if s.is_server_error() => ApiError::Transient(format!("{s}: {body}")),
        s => ApiError::Http { status: s.as_u16(), body },
    }
}

impl SearchApi for TwitterClient {
    fn verify_credentials(&self) -> Result<(), ApiError> {
        let query = vec![("skip_status".to_string(), "true".to_string())];
        self.get::<serde_json::Value>("account/verify_credentials.json", &query)
            .map(|_| ())
    }

    fn search_page(&self, req: &SearchRequest) -> Result<Vec<Post>, ApiError> {
        let mut query = vec![
            ("q".to_string(), req.query.clone()),
            ("lang".to_string(), req.language.clone()),
            ("result_type".to_string(), req.result_mode.as_query_value().to_string()),
            ("count".to_string(), req.count.to_string()),
            ("tweet_mode".to_string(), "extended".to_string()),
        ];
        if let Some(max_id) = req.max_id {
            query.push(("max_id".to_string(), max_id.to_string()));
        }
        let page: SearchResponse = self.get("search/tweets.json", &query)?;
        Ok(page.statuses)
    }

    fn reshares_of(&self, post_id: u64) -> Result<Vec<Post>, ApiError> {
        let query = vec![
            ("count".to_string(), RESHARES_PER_POST.to_string()),
            ("tweet_mode".to_string(), "extended".to_string()),
        ];
        self.get(&format!("statuses/retweets/{post_id}.json"), &query)
    }
}
