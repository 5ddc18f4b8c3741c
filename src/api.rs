//! The seam between the collector and the remote search service.

use crate::config::ResultMode;
use crate::model::Post;
use thiserror::Error;

/// Errors surfaced by a `SearchApi` implementation.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("rate limited by the API")]
    RateLimited,

    #[error("transient API failure: {0}")]
    Transient(String),

    /// The requested resource is gone, protected, or otherwise not served.
    #[error("resource unavailable: {0}")]
    Unavailable(String),

    #[error("credentials rejected: {0}")]
    Unauthorized(String),

    #[error("could not decode API response: {0}")]
    Decode(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
}

impl ApiError {
    /// Errors worth waiting out and retrying at the same position.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::RateLimited | ApiError::Transient(_))
    }
}

/// One page request of a keyword search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub language: String,
    pub result_mode: ResultMode,
    pub count: usize,
    /// Only return posts with an id at or below this one.
    pub max_id: Option<u64>,
}

/// Minimal surface the collector needs from the remote service.
pub trait SearchApi {
    fn verify_credentials(&self) -> Result<(), ApiError>;

    /// Fetch one page of search results. An empty page means no more results.
    fn search_page(&self, req: &SearchRequest) -> Result<Vec<Post>, ApiError>;

    /// Reshares of a single post.
    fn reshares_of(&self, post_id: u64) -> Result<Vec<Post>, ApiError>;
}

impl<T: SearchApi + ?Sized> SearchApi for &T {
    fn verify_credentials(&self) -> Result<(), ApiError> {
        (**self).verify_credentials()
    }
    fn search_page(&self, req: &SearchRequest) -> Result<Vec<Post>, ApiError> {
        (**self).search_page(req)
    }
    fn reshares_of(&self, post_id: u64) -> Result<Vec<Post>, ApiError> {
        (**self).reshares_of(post_id)
    }
}
