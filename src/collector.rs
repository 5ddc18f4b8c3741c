//! Collection session: search pagination with cooldown-and-resume, then
//! per-post reshare fetching for posts inside the reshare-count band.

use crate::api::{ApiError, SearchApi, SearchRequest};
use crate::config::CollectOptions;
use crate::model::Post;
use crate::progress::ProgressScope;
use crate::util::init_tracing_once;
use std::collections::BTreeMap;
use std::fmt;
use std::thread::sleep;
use thiserror::Error;

/// Session lifecycle. `Uninitialized` is only seen by a failed `connect`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionState {
    Uninitialized,
    Authenticated,
    PostsCollected,
    ResharesCollected,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::Authenticated => "authenticated",
            SessionState::PostsCollected => "posts collected",
            SessionState::ResharesCollected => "reshares collected",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("authentication failed: {0}")]
    Authentication(#[source] ApiError),

    #[error("cannot {op} in state '{state}'")]
    InvalidState { op: &'static str, state: SessionState },

    #[error("reshares were already collected for this session")]
    AlreadyCollected,

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Outcome of `collect_reshares`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReshareSummary {
    /// Posts inside the band whose reshares were requested.
    pub posts_queried: usize,
    /// Posts skipped after a non-retryable failure.
    pub posts_failed: usize,
    pub reshares: usize,
}

pub struct Collector<A: SearchApi> {
    api: A,
    opts: CollectOptions,
    state: SessionState,
    cursor: Option<u64>,
    posts: Vec<Post>,
    reshares: BTreeMap<u64, Vec<Post>>,
}

impl<A: SearchApi> Collector<A> {
    /// Verify credentials and open a session.
    pub fn connect(api: A, opts: CollectOptions) -> Result<Self, CollectError> {
        init_tracing_once();
        if let Err(e) = api.verify_credentials() {
            tracing::error!("Authentication failed: {}", e);
            return Err(CollectError::Authentication(e));
        }
        tracing::info!("Authentication OK");
        if opts.lower_limit > opts.upper_limit {
            tracing::warn!(
                "Reshare band [{}, {}] is empty; no reshares will be collected.",
                opts.lower_limit,
                opts.upper_limit
            );
        }
        Ok(Self {
            api,
            opts,
            state: SessionState::Authenticated,
            cursor: None,
            posts: Vec::new(),
            reshares: BTreeMap::new(),
        })
    }

    pub fn state(&self) -> SessionState { self.state }
    pub fn options(&self) -> &CollectOptions { &self.opts }
    pub fn posts(&self) -> &[Post] { &self.posts }
    pub fn reshares(&self) -> &BTreeMap<u64, Vec<Post>> { &self.reshares }
    pub fn search_key(&self) -> &str { &self.opts.search_key }

    pub fn reshare_total(&self) -> usize {
        self.reshares.values().map(Vec::len).sum()
    }

    /// Paginate the keyword search until `target_count` posts are held or the
    /// results run out. Returns the number of posts collected by this call.
    ///
    /// Rate-limit and transient errors sleep `cooldown` and retry the same page.
    /// Any other API error ends the call; posts gathered so far stay in the session.
    pub fn collect_posts(&mut self) -> Result<usize, CollectError> {
        if self.state != SessionState::Authenticated {
            return Err(CollectError::InvalidState { op: "collect posts", state: self.state });
        }

        let target = self.opts.target_count;
        let start_len = self.posts.len();
        let pb = ProgressScope::count("Collecting posts", target as u64, self.opts.progress);

        while self.posts.len() < target {
            let want = (target - self.posts.len()).min(self.opts.page_size);
            let req = SearchRequest {
                query: self.opts.search_key.clone(),
                language: self.opts.language.clone(),
                result_mode: self.opts.result_mode,
                count: want,
                max_id: self.cursor,
            };

            let page = match self.api.search_page(&req) {
                Ok(page) => page,
                Err(e) if e.is_retryable() => {
                    tracing::warn!("Going to sleep for {:?}: {}", self.opts.cooldown, e);
                    pb.println(format!("cooling down: {e}"));
                    sleep(self.opts.cooldown);
                    continue;
                }
                Err(e) => {
                    tracing::error!("Search failed after {} posts: {}", self.posts.len(), e);
                    self.state = SessionState::PostsCollected;
                    pb.finish("Search aborted");
                    return Err(e.into());
                }
            };

            if page.is_empty() {
                tracing::info!("Search exhausted after {} posts.", self.posts.len());
                break;
            }

            // Next page: everything strictly older than the oldest post seen.
            let next = page.iter().map(|p| p.id).min().and_then(|id| id.checked_sub(1));
            tracing::debug!("page of {} posts, next max_id {:?}", page.len(), next);
            self.take_page(page, want, &pb);
            match next {
                Some(n) => self.cursor = Some(n),
                None => break,
            }
        }

        self.state = SessionState::PostsCollected;
        let added = self.posts.len() - start_len;
        pb.finish(format!("{added} posts collected"));
        tracing::info!("{} posts collected for '{}'.", added, self.opts.search_key);
        Ok(added)
    }

    fn take_page(&mut self, page: Vec<Post>, want: usize, pb: &ProgressScope) {
        let before = self.posts.len();
        self.posts.extend(page.into_iter().take(want));
        pb.inc((self.posts.len() - before) as u64);
    }

    /// Fetch reshares for every collected post whose reshare count lies inside
    /// `[lower_limit, upper_limit]`. Each in-band post gets a mapping entry even
    /// if its fetch fails; failures are logged and skipped.
    ///
    /// With no posts (or `upper_limit == 0`) there is nothing to do: a warning is
    /// logged and an empty summary returned. A second call is an error.
    pub fn collect_reshares(&mut self) -> Result<ReshareSummary, CollectError> {
        match self.state {
            SessionState::ResharesCollected => return Err(CollectError::AlreadyCollected),
            SessionState::PostsCollected => {}
            state if self.posts.is_empty() => {
                tracing::warn!("No posts to get reshares from (state '{}'). Run collect_posts() first.", state);
                return Ok(ReshareSummary::default());
            }
            state => return Err(CollectError::InvalidState { op: "collect reshares", state }),
        }
        if self.posts.is_empty() || self.opts.upper_limit == 0 {
            tracing::warn!("List of posts to get reshares from is empty or the upper limit is 0; nothing to do.");
            return Ok(ReshareSummary::default());
        }

        let (lower, upper) = (self.opts.lower_limit, self.opts.upper_limit);
        let in_band: Vec<u64> = self
            .posts
            .iter()
            .filter(|p| p.in_band(lower, upper))
            .map(|p| p.id)
            .collect();

        let pb = ProgressScope::count("Collecting reshares", in_band.len() as u64, self.opts.progress);
        let mut summary = ReshareSummary::default();

        for id in in_band {
            self.reshares.entry(id).or_default();
            summary.posts_queried += 1;
            loop {
                match self.api.reshares_of(id) {
                    Ok(list) => {
                        summary.reshares += list.len();
                        self.reshares.entry(id).or_default().extend(list);
                        break;
                    }
                    Err(ApiError::RateLimited) => {
                        tracing::warn!("Rate limited on post {}; sleeping {:?}", id, self.opts.cooldown);
                        sleep(self.opts.cooldown);
                    }
                    Err(e) => {
                        tracing::warn!("Post {} is probably no longer available. Skipping: {}", id, e);
                        summary.posts_failed += 1;
                        break;
                    }
                }
            }
            pb.inc(1);
        }

        self.state = SessionState::ResharesCollected;
        pb.finish(format!("{} reshares collected", summary.reshares));
        tracing::info!(
            "{} reshares collected from {} posts ({} skipped).",
            summary.reshares,
            summary.posts_queried,
            summary.posts_failed
        );
        Ok(summary)
    }
}
