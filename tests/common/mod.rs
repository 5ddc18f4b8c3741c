#![allow(dead_code)]

use reshare_etl::{ApiError, Author, Entities, Hashtag, Mention, Post, SearchApi, SearchRequest};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use time::{Date, Month};

/// Wednesday, matching the weekday in the API string.
pub const POST_CREATED: &str = "Wed Oct 10 20:19:24 +0000 2018";
pub const ACCOUNT_CREATED: &str = "Sat Jan 01 00:00:00 +0000 2011";

pub fn fixed_date() -> Date {
    Date::from_calendar_date(2024, Month::March, 5).unwrap()
}

pub fn author(id: u64, handle: &str) -> Author {
    Author {
        id,
        name: format!("User {handle}"),
        screen_name: handle.to_string(),
        location: Some("Berlin, Germany".to_string()),
        description: Some("writes \"code\", drinks coffee".to_string()),
        protected: false,
        followers_count: 120,
        friends_count: 80,
        created_at: ACCOUNT_CREATED.to_string(),
    }
}

/// Original post with two mentions and two hashtags.
pub fn post(id: u64, reshare_count: u64) -> Post {
    Post {
        id,
        created_at: POST_CREATED.to_string(),
        full_text: Some(format!("post {id} about rust, etl and more @alice @bob #rust #etl")),
        text: None,
        entities: Entities {
            user_mentions: vec![
                Mention { screen_name: "alice".into() },
                Mention { screen_name: "bob".into() },
            ],
            hashtags: vec![Hashtag { text: "rust".into() }, Hashtag { text: "etl".into() }],
        },
        user: author(1000 + id, &format!("author{id}")),
        retweet_count: reshare_count,
        favorite_count: 3,
        retweeted_status: None,
    }
}

/// Post with no entities at all.
pub fn bare_post(id: u64, reshare_count: u64) -> Post {
    let mut p = post(id, reshare_count);
    p.full_text = Some(format!("plain post {id}"));
    p.entities = Entities::default();
    p
}

/// Reshare as returned by the retweet listing (`text`, embedded original).
pub fn reshare_of(original: &Post, id: u64, handle: &str) -> Post {
    Post {
        id,
        created_at: POST_CREATED.to_string(),
        full_text: None,
        text: Some(format!("RT @{}: {}", original.user.screen_name, original.body())),
        entities: Entities {
            user_mentions: vec![Mention { screen_name: original.user.screen_name.clone() }],
            hashtags: original.entities.hashtags.clone(),
        },
        user: author(5000 + id, handle),
        retweet_count: original.retweet_count,
        favorite_count: 0,
        retweeted_status: Some(Box::new(original.clone())),
    }
}

/// Scripted in-memory search service.
#[derive(Default)]
pub struct FakeApi {
    pub auth_fails: bool,
    pub posts: Vec<Post>,
    pub reshares: HashMap<u64, Vec<Post>>,
    /// Post ids whose reshare listing fails as unavailable.
    pub unavailable: HashSet<u64>,
    /// Errors returned instead of a page, keyed by 0-based search call index.
    pub search_errors: RefCell<BTreeMap<usize, ApiError>>,
    /// Post ids whose first reshare request is rate limited.
    pub reshare_rate_limited_once: RefCell<HashSet<u64>>,
    pub search_calls: RefCell<Vec<SearchRequest>>,
    pub reshare_calls: RefCell<Vec<u64>>,
}

impl FakeApi {
    pub fn with_posts(posts: Vec<Post>) -> Self {
        Self { posts, ..Default::default() }
    }

    pub fn fail_search_call(self, idx: usize, err: ApiError) -> Self {
        self.search_errors.borrow_mut().insert(idx, err);
        self
    }

    pub fn queried_reshares(&self) -> Vec<u64> {
        self.reshare_calls.borrow().clone()
    }
}

impl SearchApi for FakeApi {
    fn verify_credentials(&self) -> Result<(), ApiError> {
        if self.auth_fails {
            Err(ApiError::Unauthorized("Could not authenticate you.".into()))
        } else {
            Ok(())
        }
    }

    fn search_page(&self, req: &SearchRequest) -> Result<Vec<Post>, ApiError> {
        let idx = {
            let mut calls = self.search_calls.borrow_mut();
            calls.push(req.clone());
            calls.len() - 1
        };
        if let Some(err) = self.search_errors.borrow_mut().remove(&idx) {
            return Err(err);
        }
        let mut page: Vec<Post> = self
            .posts
            .iter()
            .filter(|p| req.max_id.map_or(true, |max| p.id <= max))
            .cloned()
            .collect();
        page.sort_by(|a, b| b.id.cmp(&a.id));
        page.truncate(req.count);
        Ok(page)
    }

    fn reshares_of(&self, post_id: u64) -> Result<Vec<Post>, ApiError> {
        self.reshare_calls.borrow_mut().push(post_id);
        if self.reshare_rate_limited_once.borrow_mut().remove(&post_id) {
            return Err(ApiError::RateLimited);
        }
        if self.unavailable.contains(&post_id) {
            return Err(ApiError::Unavailable("No status found with that ID.".into()));
        }
        Ok(self.reshares.get(&post_id).cloned().unwrap_or_default())
    }
}

/// Read a text file line-by-line into strings.
pub fn read_lines(path: &Path) -> Vec<String> {
    let f = File::open(path).unwrap();
    let r = BufReader::new(f);
    r.lines().map(|l| l.unwrap()).filter(|s| !s.is_empty()).collect()
}
